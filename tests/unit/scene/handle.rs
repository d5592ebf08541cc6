use super::*;
use crate::scene::model::SlideImage;

#[test]
fn publish_wraps_and_evaluates_motion() {
    let mut handle = SceneHandle::new(PromoScene::default(), AnimationClock::default());
    let frame = handle.publish(125);
    assert_eq!(frame.clock(), 5);
    assert_eq!(handle.clock().value(), 5);
    assert_eq!(
        frame.motion.wave_offsets.len(),
        "LINK ALTERNATIF".chars().count()
    );
}

#[test]
fn edits_do_not_leak_into_older_snapshots() {
    let mut handle = SceneHandle::new(PromoScene::default(), AnimationClock::default());
    let before = handle.snapshot();
    handle.edit(|s| {
        s.right_panel.images.push(SlideImage {
            url: "a.png".to_owned(),
            name: String::new(),
        })
    });
    assert!(before.scene.right_panel.images.is_empty());
    assert_eq!(handle.scene().right_panel.images.len(), 1);
}
