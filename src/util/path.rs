//! Mapping between entry identifiers and paths under the store root.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving `.` and `..` components without filesystem access.
pub fn normalize(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                components.pop();
            }
            Component::CurDir => {}
            other => components.push(other),
        }
    }
    components.iter().collect()
}

/// Check if `path` is contained within `root` after normalization.
pub fn is_within(path: &Path, root: &Path) -> bool {
    normalize(path).starts_with(normalize(root))
}

/// File path of the entry named `name`: `<root>/<name><suffix>`.
pub fn entry_path(root: &Path, name: &str, suffix: &str) -> PathBuf {
    root.join(format!("{}{}", name, suffix))
}

/// Entry identifier for a file under `root`, or `None` when the file does not
/// carry `suffix` or is not below `root`.
pub fn entry_name(root: &Path, file: &Path, suffix: &str) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;
    let joined = relative_name(relative)?;
    let stem = joined.strip_suffix(suffix)?;
    if stem.is_empty() || stem.ends_with('/') {
        return None;
    }
    Some(stem.to_string())
}

/// Slash-joined form of a relative path (`work/aws`), independent of platform separator.
pub fn relative_name(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_dotdot() {
        assert_eq!(normalize(Path::new("/a/b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/a/./b")), PathBuf::from("/a/b"));
    }

    #[test]
    fn test_is_within() {
        assert!(is_within(Path::new("/store/web/x.gpg"), Path::new("/store")));
        assert!(!is_within(Path::new("/store/../etc/passwd"), Path::new("/store")));
    }

    #[test]
    fn test_entry_path_nested() {
        assert_eq!(
            entry_path(Path::new("/store"), "web/example.com", ".gpg"),
            PathBuf::from("/store/web/example.com.gpg")
        );
    }

    #[test]
    fn test_entry_name_strips_suffix() {
        let root = Path::new("/store");
        assert_eq!(
            entry_name(root, Path::new("/store/web/example.com.gpg"), ".gpg"),
            Some("web/example.com".to_string())
        );
        assert_eq!(entry_name(root, Path::new("/store/readme.txt"), ".gpg"), None);
        assert_eq!(entry_name(root, Path::new("/other/x.gpg"), ".gpg"), None);
        assert_eq!(entry_name(root, Path::new("/store/.gpg"), ".gpg"), None);
    }

    #[test]
    fn test_relative_name_rejects_parent_components() {
        assert_eq!(relative_name(Path::new("a/b")), Some("a/b".to_string()));
        assert_eq!(relative_name(Path::new("../a")), None);
    }
}
