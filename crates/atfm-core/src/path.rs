//! Helpers for path strings as stored on scene nodes.
//!
//! Scene values are plain strings that may use either separator, so these
//! helpers work on `&str` rather than `Path`.

/// Replace every `\` with `/`.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Split a path into segments on whichever separator it contains.
///
/// `/` wins when both are present. A path with no separator is a single segment.
pub fn split_segments(path: &str) -> Vec<&str> {
    if path.contains('/') {
        path.split('/').collect()
    } else if path.contains('\\') {
        path.split('\\').collect()
    } else {
        vec![path]
    }
}

/// The last segment of a path (its file name), accepting either separator.
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Split a normalized path at its last `/` into `(directory, file name)`.
///
/// Returns `None` when the path has no separator.
pub fn split_parent(path: &str) -> Option<(&str, &str)> {
    path.rsplit_once('/')
}

/// Join a directory and a file name with `/`.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Strip trailing separators, keeping a lone root `/`.
pub fn trim_trailing(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() && !path.is_empty() {
        &path[..1]
    } else {
        trimmed
    }
}

/// Check whether `dir` is `root` or lies below it on a segment boundary.
///
/// Both sides are separator-normalized first.
pub fn is_within(dir: &str, root: &str) -> bool {
    let dir = normalize_separators(dir);
    let root = normalize_separators(root);
    let dir = trim_trailing(&dir);
    let root = trim_trailing(&root);

    if dir == root {
        return true;
    }
    if root == "/" {
        return dir.starts_with('/');
    }
    dir.strip_prefix(root)
        .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_segments() {
        assert_eq!(split_segments("/a/b/c.png"), vec!["", "a", "b", "c.png"]);
        assert_eq!(split_segments("C:\\a\\c.png"), vec!["C:", "a", "c.png"]);
        assert_eq!(split_segments("c.png"), vec!["c.png"]);
    }

    #[test]
    fn test_file_name_mixed_separators() {
        assert_eq!(file_name("C:\\proj/tex\\wall.png"), "wall.png");
        assert_eq!(file_name("wall.png"), "wall.png");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/proj", "a.png"), "/proj/a.png");
        assert_eq!(join("/proj/", "a.png"), "/proj/a.png");
        assert_eq!(join("", "a.png"), "a.png");
    }

    #[test]
    fn test_is_within() {
        assert!(is_within("/proj/sourceimages", "/proj/sourceimages"));
        assert!(is_within("/proj/sourceimages/wood", "/proj/sourceimages/"));
        assert!(is_within("C:\\proj\\sourceimages\\wood", "C:/proj/sourceimages"));
        assert!(!is_within("/proj/sourceimages_old", "/proj/sourceimages"));
        assert!(!is_within("/proj", "/proj/sourceimages"));
    }
}
