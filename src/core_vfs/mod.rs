//! Virtual filesystem driven by the FTP commands.
//!
//! A session navigates one [`Vfs`] instance. Which implementation it gets is
//! decided once per server by [`StorageFactory::probe`], never per call.

pub mod cursor;
pub mod document_backend;
pub mod error;
pub mod memory_provider;
pub mod path_backend;
pub mod provider;

use crate::config::{ServerConfig, StorageKind};
use crate::constants::PROBE_FILE_NAME;
use crate::core_log::StatusSink;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

pub use cursor::VfsPath;
pub use document_backend::DocumentFs;
pub use error::{VfsError, VfsResult};
pub use memory_provider::MemoryProvider;
pub use path_backend::PathFs;
pub use provider::{DocumentHandle, DocumentInfo, DocumentProvider};

pub type ByteReader = Box<dyn AsyncRead + Send + Unpin>;
pub type ByteWriter = Box<dyn AsyncWrite + Send + Unpin>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
    pub modified: DateTime<Local>,
}

impl DirectoryEntry {
    pub fn permissions(&self) -> &'static str {
        match self.kind {
            EntryKind::Directory => "drwxr-xr-x",
            EntryKind::File => "-rw-r--r--",
        }
    }

    /// Formats the entry as one `LIST` line, without the line terminator.
    pub fn to_list_line(&self) -> String {
        format!(
            "{} 1 owner group {} {} {}",
            self.permissions(),
            self.size,
            self.modified.format("%b %d %H:%M"),
            self.name
        )
    }
}

/// Navigation and I/O contract shared by every storage backend.
///
/// `name` arguments may be bare names or paths, absolute or relative to the
/// current directory; they are normalised like [`Vfs::cd`] and never leave root.
#[async_trait]
pub trait Vfs: Send + Sync {
    /// Current directory, always absolute.
    fn pwd(&self) -> String;

    /// Moves the cursor. On failure the cursor is left where it was.
    async fn cd(&mut self, arg: &str) -> VfsResult<()>;

    async fn entries(&self) -> VfsResult<Vec<DirectoryEntry>>;

    /// Current directory as `LIST` lines; an unreadable directory lists as empty.
    async fn list(&self) -> Vec<String> {
        match self.entries().await {
            Ok(entries) => entries.iter().map(DirectoryEntry::to_list_line).collect(),
            Err(e) => {
                warn!("Failed to read directory {}: {}", self.pwd(), e);
                Vec::new()
            }
        }
    }

    async fn mkdir(&self, name: &str) -> VfsResult<()>;

    /// Removes an empty directory.
    async fn rmdir(&self, name: &str) -> VfsResult<()>;

    async fn delete(&self, name: &str) -> VfsResult<()>;

    /// Renames `from` to `to`, replacing an existing file (or empty directory) at `to`.
    async fn rename(&self, from: &str, to: &str) -> VfsResult<()>;

    async fn open_read(&self, name: &str) -> VfsResult<ByteReader>;

    /// Creates the file if absent, truncates it otherwise.
    async fn open_write(&self, name: &str) -> VfsResult<ByteWriter>;

    async fn size(&self, name: &str) -> VfsResult<u64>;
}

/// Builds one [`Vfs`] per session over the backend chosen at startup.
#[derive(Clone)]
pub enum StorageFactory {
    Path(PathBuf),
    Document(Arc<dyn DocumentProvider>),
}

impl StorageFactory {
    /// Selects the backend for the whole server.
    ///
    /// With [`StorageKind::Auto`] the root directory is probed with a real
    /// write; when direct access fails the server falls back to the
    /// sandboxed document store and says so on `status`, since uploads then
    /// live only in memory.
    pub async fn probe(config: &ServerConfig, status: &StatusSink) -> VfsResult<Self> {
        match config.storage {
            StorageKind::Path => {
                let root = prepare_root(&config.root_dir).await?;
                Ok(StorageFactory::Path(root))
            }
            StorageKind::Document => Ok(Self::memory()),
            StorageKind::Auto => match probe_root(&config.root_dir).await {
                Ok(root) => {
                    info!("Direct path access available at {}", root.display());
                    Ok(StorageFactory::Path(root))
                }
                Err(e) => {
                    let message = format!(
                        "No direct access to {} ({}), using the in-memory document store; uploads are lost on stop",
                        config.root_dir.display(),
                        e
                    );
                    warn!("{}", message);
                    status.emit(message);
                    Ok(Self::memory())
                }
            },
        }
    }

    pub fn memory() -> Self {
        StorageFactory::Document(Arc::new(MemoryProvider::new()))
    }

    pub fn open(&self) -> Box<dyn Vfs> {
        match self {
            StorageFactory::Path(root) => Box::new(PathFs::new(root.clone())),
            StorageFactory::Document(provider) => Box::new(DocumentFs::new(Arc::clone(provider))),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            StorageFactory::Path(root) => format!("path storage at {}", root.display()),
            StorageFactory::Document(_) => "document storage".to_string(),
        }
    }
}

async fn prepare_root(root: &Path) -> VfsResult<PathBuf> {
    tokio::fs::create_dir_all(root).await?;
    let root = tokio::fs::canonicalize(root).await?;
    Ok(root)
}

async fn probe_root(root: &Path) -> VfsResult<PathBuf> {
    let root = prepare_root(root).await?;
    let probe = root.join(PROBE_FILE_NAME);
    tokio::fs::write(&probe, b"probe").await?;
    let read_back = tokio::fs::read(&probe).await;
    tokio::fs::remove_file(&probe).await?;
    if read_back? != b"probe" {
        return Err(VfsError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "probe file content mismatch",
        )));
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_log::status_channel;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn entry(name: &str, kind: EntryKind, size: u64) -> DirectoryEntry {
        DirectoryEntry {
            name: name.to_string(),
            kind,
            size,
            modified: Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 0).unwrap(),
        }
    }

    #[test]
    fn test_list_line_format() {
        let file = entry("notes.txt", EntryKind::File, 42);
        assert_eq!(
            file.to_list_line(),
            "-rw-r--r-- 1 owner group 42 Mar 07 09:05 notes.txt"
        );

        let dir = entry("Camera", EntryKind::Directory, 4096);
        assert_eq!(
            dir.to_list_line(),
            "drwxr-xr-x 1 owner group 4096 Mar 07 09:05 Camera"
        );
    }

    #[tokio::test]
    async fn test_auto_probe_selects_path_backend() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = ServerConfig::default();
        config.root_dir = temp_dir.path().join("share");

        let (status, mut rx) = status_channel();
        let factory = StorageFactory::probe(&config, &status).await.unwrap();
        assert!(matches!(factory, StorageFactory::Path(_)));
        assert!(rx.try_recv().is_err());
        assert!(config.root_dir.is_dir());
        assert!(!config.root_dir.join(PROBE_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn test_auto_probe_falls_back_to_documents() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let mut config = ServerConfig::default();
        config.root_dir = blocker.join("share");

        let (status, mut rx) = status_channel();
        let factory = StorageFactory::probe(&config, &status).await.unwrap();
        assert!(matches!(factory, StorageFactory::Document(_)));
        let message = rx.try_recv().unwrap();
        assert!(message.contains("in-memory document store"), "{}", message);
    }

    #[tokio::test]
    async fn test_forced_document_storage() {
        let mut config = ServerConfig::default();
        config.storage = StorageKind::Document;
        let factory = StorageFactory::probe(&config, &StatusSink::disabled())
            .await
            .unwrap();
        let vfs = factory.open();
        assert_eq!(vfs.pwd(), "/");
        assert!(vfs.list().await.is_empty());
    }
}
