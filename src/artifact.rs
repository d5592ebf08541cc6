//! Output file naming.

/// Descriptor inserted between the slug and the dimensions when none is configured.
pub const DEFAULT_DESCRIPTOR: &str = "link-alternatif";

/// Lowercase `name` and replace every run of whitespace with a single `-`.
///
/// Leading and trailing whitespace also become `-`.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_ws = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_ws {
                out.push('-');
            }
            in_ws = true;
        } else {
            out.extend(c.to_lowercase());
            in_ws = false;
        }
    }
    out
}

/// `<slug(name)>-<descriptor>-<width>x<height>.<ext>`
pub fn artifact_filename(name: &str, descriptor: &str, width: u32, height: u32, ext: &str) -> String {
    format!("{}-{descriptor}-{width}x{height}.{ext}", slug(name))
}
