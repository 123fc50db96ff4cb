//! Detection of UDIM / UV-tile tokens in file names.

use std::sync::LazyLock;

use regex::Regex;

/// Alternatives, tried together and matched leftmost-first:
/// numeric `_u<N>_v<N>`, literal `<UDIM>`, literal `<UVTILE>`, and the
/// `_u<U>_v<V>` placeholder form. The `u`/`v` letters are case-insensitive.
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(_[uU]\d*_[vV]\d*)|(<UDIM>)|(<UVTILE>)|(_[uU]<U>_[vV]<V>)")
        .expect("tile tag pattern is valid")
});

/// The compiled tile tag pattern.
pub fn tag_pattern() -> &'static Regex {
    &TAG_PATTERN
}

/// A tile token found in a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceTag {
    /// The matched token, e.g. `<UDIM>` or `_u1_v2`.
    pub matched: String,
    /// Text before the token.
    pub prefix: String,
    /// Text after the token.
    pub suffix: String,
}

impl SequenceTag {
    /// Check if another tag belongs to the same sequence.
    pub fn same_sequence(&self, other: &SequenceTag) -> bool {
        self.prefix == other.prefix && self.suffix == other.suffix
    }

    /// Check if a file name is a member of this tag's sequence.
    pub fn matches_name(&self, name: &str) -> bool {
        detect_tag(name).is_some_and(|tag| self.same_sequence(&tag))
    }
}

impl std::fmt::Display for SequenceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]{}", self.prefix, self.matched, self.suffix)
    }
}

/// Find the first tile token anywhere in `name`.
pub fn detect_tag(name: &str) -> Option<SequenceTag> {
    let m = TAG_PATTERN.find(name)?;
    Some(SequenceTag {
        matched: m.as_str().to_string(),
        prefix: name[..m.start()].to_string(),
        suffix: name[m.end()..].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_udim() {
        let tag = detect_tag("wall_<UDIM>.exr").unwrap();
        assert_eq!(tag.matched, "<UDIM>");
        assert_eq!(tag.prefix, "wall_");
        assert_eq!(tag.suffix, ".exr");
    }

    #[test]
    fn test_detect_udim_without_digits() {
        let tag = detect_tag("<UDIM>").unwrap();
        assert_eq!(tag.matched, "<UDIM>");
        assert!(tag.prefix.is_empty());
        assert!(tag.suffix.is_empty());
    }

    #[test]
    fn test_detect_uvtile() {
        let tag = detect_tag("rock.<UVTILE>.tif").unwrap();
        assert_eq!(tag.matched, "<UVTILE>");
        assert_eq!(tag.prefix, "rock.");
    }

    #[test]
    fn test_detect_numeric_tile() {
        let tag = detect_tag("wall_u1_v2.png").unwrap();
        assert_eq!(tag.matched, "_u1_v2");
        assert_eq!(tag.prefix, "wall");
        assert_eq!(tag.suffix, ".png");

        let upper = detect_tag("wall_U10_V3.png").unwrap();
        assert_eq!(upper.matched, "_U10_V3");
        assert!(tag.same_sequence(&upper));
    }

    #[test]
    fn test_detect_placeholder_tile() {
        let tag = detect_tag("skin_u<U>_v<V>.tx").unwrap();
        assert_eq!(tag.matched, "_u<U>_v<V>");
        assert_eq!(tag.prefix, "skin");
        assert_eq!(tag.suffix, ".tx");
    }

    #[test]
    fn test_no_tag() {
        assert!(detect_tag("wall.png").is_none());
        assert!(detect_tag("uv_layout.png").is_none());
        assert!(detect_tag("<udim>.png").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let tag = detect_tag("a_u1_v1_<UDIM>.png").unwrap();
        assert_eq!(tag.matched, "_u1_v1");
        assert_eq!(tag.suffix, "_<UDIM>.png");
    }

    #[test]
    fn test_matches_name() {
        let tag = detect_tag("wall_<UDIM>.exr").unwrap();
        assert!(!tag.matches_name("wall_1001.exr"));
        let tile = detect_tag("wall_u1_v1.exr").unwrap();
        assert!(tile.matches_name("wall_u2_v1.exr"));
        assert!(!tile.matches_name("floor_u2_v1.exr"));
        assert!(!tile.matches_name("wall_u2_v1.png"));
    }
}
