// walk.rs: File collection shared by the scanners.
//
// Directory walks go through `glob` with an escaped base path. `glob` yields
// each directory's entries in alphabetical order, so the walk is
// deterministic and can stop as soon as enough files were accepted.
//
// `**` descends into symlinked directories. Every candidate is therefore
// canonicalized and dropped unless it still lies under the canonical walk
// directory; symlinked leaf files are skipped outright.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Regular files below `dir`, in walk order, never leaving `dir`.
fn walk(dir: &Path) -> impl Iterator<Item = PathBuf> {
    let pattern = format!("{}/**/*", glob::Pattern::escape(&dir.to_string_lossy()));
    let base = fs::canonicalize(dir).ok();
    let entries = match (glob::glob(&pattern), &base) {
        (Ok(paths), Some(_)) => Some(paths),
        (Ok(_), None) => None,
        (Err(e), _) => {
            tracing::warn!("cannot walk {}: {}", dir.display(), e);
            None
        }
    };

    entries
        .into_iter()
        .flatten()
        .filter_map(Result::ok)
        .filter(move |p| {
            let regular = fs::symlink_metadata(p)
                .map(|m| m.file_type().is_file())
                .unwrap_or(false);
            regular && within_dir(p, base.as_deref())
        })
}

fn within_dir(path: &Path, base: Option<&Path>) -> bool {
    match (fs::canonicalize(path), base) {
        (Ok(real), Some(base)) if real.starts_with(base) => true,
        (Ok(real), _) => {
            tracing::debug!("skipping {} (resolves to {})", path.display(), real.display());
            false
        }
        (Err(_), _) => false,
    }
}

/// Files to scan: `target` itself when it is a file, otherwise the files
/// below it. The walk stops after `max_files` accepted entries.
pub(crate) fn collect(
    target: &Path,
    max_files: usize,
    accept: impl Fn(&Path) -> bool,
) -> Vec<PathBuf> {
    if target.is_file() {
        return if accept(target) {
            vec![target.to_path_buf()]
        } else {
            Vec::new()
        };
    }
    let mut files: Vec<PathBuf> = walk(target)
        .filter(|p| accept(p))
        .take(max_files)
        .collect();
    files.sort();
    files
}

/// Whether the file at `path` is no larger than `max_bytes`.
pub(crate) fn within_size(path: &Path, max_bytes: u64) -> bool {
    fs::metadata(path)
        .map(|m| m.len() <= max_bytes)
        .unwrap_or(false)
}

/// Lower-cased extension with its leading dot, e.g. `.rs`.
pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

/// File contents with invalid UTF-8 replaced.
pub(crate) fn read_text_lossy(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// How a file is named in a report: relative to a directory target, or by
/// file name when the target was the file itself.
pub(crate) fn display_name(path: &Path, target: &Path) -> String {
    if target.is_dir() {
        if let Ok(rel) = path.strip_prefix(target) {
            return rel.display().to_string();
        }
    }
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
