use super::*;

#[test]
fn link_rows_drop_blank_entries_and_keep_order() {
    let scene = PromoScene {
        text1: "a.com".to_owned(),
        text2: "   ".to_owned(),
        additional_texts: vec!["b.com".to_owned(), String::new(), "c.com".to_owned()],
        ..PromoScene::default()
    };
    assert_eq!(scene.link_rows(), vec!["a.com", "b.com", "c.com"]);
}

#[test]
fn resource_urls_are_deduplicated() {
    let mut scene = PromoScene::default();
    scene.background = "bg.png".to_owned();
    scene.site.logo = "logo.png".to_owned();
    scene.right_panel.images = vec![
        SlideImage {
            url: "bg.png".to_owned(),
            name: String::new(),
        },
        SlideImage {
            url: "s1.png".to_owned(),
            name: "one".to_owned(),
        },
    ];
    assert_eq!(scene.resource_urls(), vec!["bg.png", "logo.png", "s1.png"]);
}

#[test]
fn parses_partial_json_with_defaults() {
    let scene = PromoScene::from_json_str(
        r##"{
            "site": { "id": "galaxy", "name": "Galaxy 77" },
            "theme": {
                "primary": "#ff00ff",
                "secondary": "#00ff00",
                "background": "#0a0a0a",
                "accent": "#ff0080"
            },
            "text1": "one.example"
        }"##,
    )
    .unwrap();
    assert_eq!(scene.site.name, "Galaxy 77");
    assert_eq!(scene.theme.primary, Rgb8::new(255, 0, 255));
    assert_eq!(scene.header_text, "LINK ALTERNATIF");
    assert_eq!(scene.link_rows(), vec!["one.example", "www.example2.com"]);
}

#[test]
fn rejects_blank_site_name_and_bad_colors() {
    assert!(PromoScene::from_json_str(r#"{ "site": { "id": "x", "name": " " } }"#).is_err());
    let err = PromoScene::from_json_str(r#"{ "theme": { "primary": "red" } }"#).unwrap_err();
    assert!(err.to_string().contains("serialization error:"));
}
