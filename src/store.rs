//! File access for slide import paths.
//!
//! The [`SlideStore`] trait is the seam between the mutation engine and the
//! filesystem. [`DiskStore`] is the production implementation: it resolves
//! host import paths (`./stories/slides/3.mdx`) against the project root and
//! refuses any path that would leave it.
//!
//! Writes go to a sibling temp file first and are renamed into place, so a
//! failed write never leaves a half-written slide behind.

use crate::naming;
use crate::slide::SlideError;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Storage operations the mutation engine needs, keyed by import path.
pub trait SlideStore {
    /// Read a slide file's full source.
    fn read(&self, import_path: &str) -> Result<String, SlideError>;

    /// Overwrite an existing slide file.
    fn write(&self, import_path: &str, contents: &str) -> Result<(), SlideError>;

    /// Create a new slide file. Fails if the file already exists.
    fn create(&self, import_path: &str, contents: &str) -> Result<(), SlideError>;

    /// Delete a slide file.
    fn remove(&self, import_path: &str) -> Result<(), SlideError>;

    /// Slide numbers of the `N.ext` files present in `slides_dir`.
    fn slide_numbers(&self, slides_dir: &str, extension: &str) -> Result<Vec<u32>, SlideError>;
}

/// Slide files on the local filesystem, rooted at the project directory.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an import path to a filesystem path under the root.
    pub fn resolve(&self, import_path: &str) -> Result<PathBuf, SlideError> {
        let normalized = import_path.replace('\\', "/");
        let relative = Path::new(normalized.trim_start_matches("./"));
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(SlideError::OutsideRoot(import_path.to_string()));
                }
            }
        }
        if resolved == self.root {
            return Err(SlideError::OutsideRoot(import_path.to_string()));
        }
        Ok(resolved)
    }
}

fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));
    let result = (|| {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;
        fs::rename(&tmp, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

impl SlideStore for DiskStore {
    fn read(&self, import_path: &str) -> Result<String, SlideError> {
        let path = self.resolve(import_path)?;
        fs::read_to_string(&path).map_err(|e| SlideError::io(import_path, e))
    }

    fn write(&self, import_path: &str, contents: &str) -> Result<(), SlideError> {
        let path = self.resolve(import_path)?;
        if !path.is_file() {
            return Err(SlideError::io(
                import_path,
                io::Error::new(io::ErrorKind::NotFound, "slide file does not exist"),
            ));
        }
        write_atomic(&path, contents).map_err(|e| SlideError::io(import_path, e))
    }

    fn create(&self, import_path: &str, contents: &str) -> Result<(), SlideError> {
        let path = self.resolve(import_path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SlideError::io(import_path, e))?;
        }
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| SlideError::io(import_path, e))?;
        file.write_all(contents.as_bytes())
            .map_err(|e| SlideError::io(import_path, e))
    }

    fn remove(&self, import_path: &str) -> Result<(), SlideError> {
        let path = self.resolve(import_path)?;
        fs::remove_file(&path).map_err(|e| SlideError::io(import_path, e))
    }

    fn slide_numbers(&self, slides_dir: &str, extension: &str) -> Result<Vec<u32>, SlideError> {
        let dir = self.resolve(slides_dir)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut numbers = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| SlideError::io(slides_dir, e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if let Some(number) = naming::parse_slide_number(&name, extension) {
                numbers.push(number);
            }
        }
        numbers.sort_unstable();
        Ok(numbers)
    }
}
