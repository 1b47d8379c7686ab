use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::EtlError;

/// Every `*.<extension>` file below `root`, as absolute paths.
///
/// A missing root, or one that is not a directory, yields no files. Hidden
/// files are skipped, as a shell glob would.
pub fn discover_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>, EtlError> {
    if !root.is_dir() {
        debug!("{} is not a directory, nothing to load", root.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| EtlError::Walk {
            root: root.to_path_buf(),
            source,
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        let matches = path
            .extension()
            .map(|ext| ext.to_string_lossy() == extension)
            .unwrap_or(false);

        if matches && !hidden {
            let absolute = std::path::absolute(path).map_err(|source| EtlError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            files.push(absolute);
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn test_discover_json_files() {
        let dir = tempdir().unwrap();

        File::create(dir.path().join("TRAAAAW128F429D538.json")).unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();
        File::create(dir.path().join("upper.JSON")).unwrap();
        File::create(dir.path().join(".hidden.json")).unwrap();

        fs::create_dir_all(dir.path().join("A/B/C")).unwrap();
        File::create(dir.path().join("A/B/C/TRABCEI128F424C983.json")).unwrap();
        fs::create_dir(dir.path().join("dir.json")).unwrap();

        let files = discover_files(dir.path(), "json").unwrap();

        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.is_absolute()));
        assert!(files
            .iter()
            .any(|f| f.ends_with("A/B/C/TRABCEI128F424C983.json")));
        assert!(files.iter().any(|f| f.ends_with("TRAAAAW128F429D538.json")));
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = tempdir().unwrap();
        let files = discover_files(&dir.path().join("absent"), "json").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_file_root_is_empty() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("events.json");
        File::create(&root).unwrap();

        let files = discover_files(&root, "json").unwrap();
        assert!(files.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_a_walk_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        File::create(locked.join("song.json")).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores directory permissions
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = discover_files(dir.path(), "json");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        match result {
            Err(EtlError::Walk { root, .. }) => assert_eq!(root, dir.path()),
            other => panic!("expected walk error, got {:?}", other),
        }
    }

    #[test]
    fn test_traversal_order_is_stable() {
        let dir = tempdir().unwrap();
        for name in ["b.json", "a.json", "c.json"] {
            File::create(dir.path().join(name)).unwrap();
        }

        let first = discover_files(dir.path(), "json").unwrap();
        let second = discover_files(dir.path(), "json").unwrap();

        assert_eq!(first, second);
        assert!(first[0].ends_with("a.json"));
        assert!(first[2].ends_with("c.json"));
    }
}
