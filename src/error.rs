use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileprobeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No such file: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not a plain file: {}", .0.display())]
    NotAPlainFile(PathBuf),

    #[error("Output format error: {0}")]
    Format(String),
}

impl FileprobeError {
    /// Attaches `path` to an I/O error, turning `ENOENT` into [`FileprobeError::NotFound`].
    pub fn from_io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            FileprobeError::NotFound(path.into())
        } else {
            FileprobeError::Io(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, FileprobeError>;
