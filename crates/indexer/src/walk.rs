use std::path::{Path, PathBuf};
use tracing::debug;

/// Walk a directory recursively and collect every file, skipping hidden
/// entries and well-known junk directories. No extension filtering happens
/// here; the dispatcher decides what each file is.
pub fn walk_media_dir(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk_recursive(root, &mut files);
    files
}

fn walk_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let read_dir = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "cannot read directory");
            return;
        }
    };

    for entry in read_dir.flatten() {
        let path = entry.path();
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        if name.starts_with('.') {
            debug!(path = %path.display(), "skipping hidden entry");
            continue;
        }

        if path.is_dir() {
            // Skip known junk directories
            if name == "@eaDir" || name == "#recycle" {
                continue;
            }
            walk_recursive(&path, files);
        } else {
            files.push(path);
        }
    }
}
