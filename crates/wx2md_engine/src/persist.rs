use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use wx_logging::wx_debug;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("refusing to write {0:?}: not a plain file name")]
    InvalidFilename(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Create `dir` (and parents) unless it already exists as a directory.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PersistError::OutputDir(format!(
            "{} is not a directory",
            dir.display()
        ))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))
        }
        Err(err) => Err(PersistError::OutputDir(err.to_string())),
    }
}

/// Writes files into one directory. Each file is staged in a temp file next
/// to its target and renamed into place, so readers never see partial output.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        self.write_bytes(filename, content.as_bytes())
    }

    pub fn write_bytes(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        let target = self.target(filename)?;
        ensure_output_dir(&self.dir)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;

        wx_debug!("Wrote {} ({} bytes)", target.display(), content.len());
        Ok(target)
    }

    /// Writes every `(filename, bytes)` pair; stops at the first failure.
    pub fn write_all<'a, I>(&self, files: I) -> Result<Vec<PathBuf>, PersistError>
    where
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        files
            .into_iter()
            .map(|(name, bytes)| self.write_bytes(name, bytes))
            .collect()
    }

    fn target(&self, filename: &str) -> Result<PathBuf, PersistError> {
        Ok(self.dir.join(plain_file_name(filename)?))
    }
}

/// `filename` when it names one entry directly inside a directory, with no
/// separators or parent references on any platform.
pub(crate) fn plain_file_name(filename: &str) -> Result<&str, PersistError> {
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !filename.contains(['/', '\\']) => Ok(filename),
        _ => Err(PersistError::InvalidFilename(filename.to_string())),
    }
}
