use crate::error::{DeployError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Every non-directory entry beneath `dir_path`, as absolute paths.
///
/// Entries come back in directory-listing order, depth first, so the files of a
/// subdirectory sit together at that subdirectory's position in its parent.
/// Symlinks are not followed; a link is reported like any other file.
pub fn walk_files(dir_path: &Path) -> Result<Vec<PathBuf>> {
    let root = std::path::absolute(dir_path).map_err(|source| DeployError::Open {
        path: dir_path.to_path_buf(),
        source,
    })?;

    let metadata = std::fs::metadata(&root).map_err(|source| DeployError::Open {
        path: root.clone(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(DeployError::NotADirectory(root));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&root).min_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_nested_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("file1.html"), "<html><body></body></html>").unwrap();
        fs::create_dir_all(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("css").join("file2.css"), "body { background: red; }").unwrap();

        let files: HashSet<PathBuf> = walk_files(dir.path()).unwrap().into_iter().collect();

        let expected: HashSet<PathBuf> = [
            dir.path().join("file1.html"),
            dir.path().join("css").join("file2.css"),
        ]
        .into_iter()
        .collect();
        assert_eq!(files, expected);
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b/c")).unwrap();

        assert!(walk_files(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn every_file_once_at_any_depth() {
        let dir = tempdir().unwrap();
        let deep = dir.path().join("a/b/c/d");
        fs::create_dir_all(&deep).unwrap();
        fs::write(deep.join("leaf.txt"), "x").unwrap();
        fs::write(dir.path().join("a/mid.txt"), "y").unwrap();

        let files = walk_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.contains(&deep.join("leaf.txt")));
        assert!(files.contains(&dir.path().join("a/mid.txt")));
        assert!(files.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn subdirectory_files_are_contiguous() {
        let dir = tempdir().unwrap();
        for sub in ["left", "right"] {
            fs::create_dir(dir.path().join(sub)).unwrap();
            for name in ["1.txt", "2.txt", "3.txt"] {
                fs::write(dir.path().join(sub).join(name), name).unwrap();
            }
        }
        fs::write(dir.path().join("top.txt"), "top").unwrap();

        let files = walk_files(dir.path()).unwrap();
        assert_eq!(files.len(), 7);

        for sub in ["left", "right"] {
            let positions: Vec<usize> = files
                .iter()
                .enumerate()
                .filter(|(_, p)| p.starts_with(dir.path().join(sub)))
                .map(|(i, _)| i)
                .collect();
            assert_eq!(positions.len(), 3);
            assert_eq!(positions[2] - positions[0], 2, "{sub} files split up: {files:?}");
        }
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let err = walk_files(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, DeployError::Open { .. }));
    }

    #[test]
    fn file_root_is_an_error() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        let err = walk_files(&file).unwrap_err();
        assert!(matches!(err, DeployError::NotADirectory(_)));
    }
}
