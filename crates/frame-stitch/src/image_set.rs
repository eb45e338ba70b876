use std::path::{Path, PathBuf};

use crate::error::StitchError;

/// A lexicographically ordered list of image files sharing an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSet {
    dir: PathBuf,
    paths: Vec<PathBuf>,
}

impl ImageSet {
    /// List the images in `dir` whose extension matches `extension` (case-insensitive).
    ///
    /// # Arguments
    ///
    /// * `dir` - The directory to scan, not recursively.
    /// * `extension` - The extension without the leading dot, e.g. `"png"`.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::EmptySet`] if no file matches.
    pub fn discover(dir: impl AsRef<Path>, extension: &str) -> Result<Self, StitchError> {
        let dir = dir.as_ref().to_path_buf();
        let entries = std::fs::read_dir(&dir).map_err(|e| StitchError::Io(dir.clone(), e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StitchError::Io(dir.clone(), e))?.path();
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(extension));
            if matches && path.is_file() {
                paths.push(path);
            }
        }

        if paths.is_empty() {
            return Err(StitchError::EmptySet(dir, extension.to_string()));
        }
        paths.sort();

        log::debug!("found {} .{} images in {}", paths.len(), extension, dir.display());
        Ok(Self { dir, paths })
    }

    /// The scanned directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The image paths in order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Number of images in the set.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the set is empty. Always false for a discovered set.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_sorts_and_filters() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        for name in ["b.png", "a.PNG", "c.jpg", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"")?;
        }
        std::fs::create_dir(dir.path().join("nested.png"))?;

        let set = ImageSet::discover(dir.path(), "png")?;
        let names = set
            .paths()
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a.PNG", "b.png"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.dir(), dir.path());
        Ok(())
    }

    #[test]
    fn test_discover_empty() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("frame.jpg"), b"")?;

        assert!(matches!(
            ImageSet::discover(dir.path(), "png"),
            Err(StitchError::EmptySet(_, ext)) if ext == "png"
        ));
        assert!(matches!(
            ImageSet::discover(dir.path().join("missing"), "png"),
            Err(StitchError::Io(..))
        ));
        Ok(())
    }
}
