// paths.rs: Path resolution and containment checks.
//
// A target is resolved in three steps: made absolute against the working
// directory, stripped of `.`/`..` lexically, then canonicalized through its
// deepest existing ancestor. The last step follows symlinks even when the
// leaf does not exist yet, so a link pointing out of the root is caught.

use std::path::{Component, Path, PathBuf};

/// Resolve `path` to an absolute, normalized, symlink-free form.
pub fn resolve(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    canonicalize_lenient(&normalize_lexically(&absolute))
}

/// Remove `.` and `..` components without touching the filesystem.
///
/// `..` never climbs above the root component.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let at_root = matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                );
                if !at_root {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize the longest existing prefix of `path` and re-append the rest.
fn canonicalize_lenient(path: &Path) -> PathBuf {
    let mut existing = path.to_path_buf();
    let mut missing: Vec<PathBuf> = Vec::new();

    loop {
        if let Ok(canonical) = existing.canonicalize() {
            let mut out = canonical;
            for part in missing.iter().rev() {
                out.push(part);
            }
            return out;
        }
        match (existing.file_name(), existing.parent()) {
            (Some(name), Some(parent)) => {
                missing.push(PathBuf::from(name));
                existing = parent.to_path_buf();
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Whether `path` equals `root` or lies below it (component-wise).
pub fn is_within(root: &Path, path: &Path) -> bool {
    path.starts_with(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn lexical_normalization_drops_dots() {
        assert_eq!(
            normalize_lexically(Path::new("/a/./b/../c")),
            PathBuf::from("/a/c")
        );
        assert_eq!(normalize_lexically(Path::new("/../..")), PathBuf::from("/"));
    }

    #[test]
    fn prefix_sharing_sibling_is_not_within() {
        // "/tmp/project-evil" starts with the string "/tmp/project" but is
        // not inside it.
        assert!(!is_within(
            Path::new("/tmp/project"),
            Path::new("/tmp/project-evil/x")
        ));
        assert!(is_within(Path::new("/tmp/project"), Path::new("/tmp/project")));
    }

    #[test]
    fn resolve_handles_missing_leaf() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let resolved = resolve(&dir.path().join("not/yet/there.txt"));
        assert_eq!(resolved, root.join("not/yet/there.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn resolve_follows_symlink_out_of_root() {
        let outside = tempdir().unwrap();
        let project = tempdir().unwrap();
        let link = project.path().join("escape");
        std::os::unix::fs::symlink(outside.path(), &link).unwrap();

        let root = project.path().canonicalize().unwrap();
        let resolved = resolve(&link.join("secret.txt"));
        assert!(!is_within(&root, &resolved));
        assert!(resolved.starts_with(outside.path().canonicalize().unwrap()));
    }
}
