use rust_embed::Embed;

#[derive(Embed)]
#[folder = "assets/"]
struct BundledAssets;

/// Read a bundled asset as UTF-8 text.
pub(crate) fn bundled_text(name: &str) -> Option<String> {
    let file = BundledAssets::get(name)?;
    std::str::from_utf8(file.data.as_ref())
        .ok()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_assets_are_present() {
        assert!(bundled_text("words.json").is_some());
        assert!(bundled_text("achievements.toml").is_some());
        assert!(bundled_text("missing.txt").is_none());
    }
}
