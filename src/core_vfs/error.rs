use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VfsError {
    #[error("No such file or directory: {0}")]
    NotFound(String),

    #[error("Not a regular file: {0}")]
    NotAFile(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Directory not empty: {0}")]
    DirectoryNotEmpty(String),

    #[error("Path is outside of the allowed area: {0}")]
    OutsideRoot(String),

    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl VfsError {
    /// Every storage failure is reported to the client as 550.
    pub fn to_ftp_response(&self) -> String {
        let reason = match self {
            VfsError::NotFound(_) => "File or directory does not exist.",
            VfsError::NotAFile(_) => "Not a regular file.",
            VfsError::NotADirectory(_) => "Not a directory.",
            VfsError::AlreadyExists(_) => "File or directory already exists.",
            VfsError::DirectoryNotEmpty(_) => "Directory not empty.",
            VfsError::OutsideRoot(_) => "Path is outside of the allowed area.",
            VfsError::InvalidName(_) => "Invalid file name.",
            VfsError::Io(_) => "Requested action not taken.",
        };
        format!("550 {}\r\n", reason)
    }
}

pub type VfsResult<T> = Result<T, VfsError>;
