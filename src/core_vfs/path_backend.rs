use crate::core_vfs::cursor::VfsPath;
use crate::core_vfs::error::{VfsError, VfsResult};
use crate::core_vfs::{ByteReader, ByteWriter, DirectoryEntry, EntryKind, Vfs};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use log::{debug, warn};
use std::fs::Metadata;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Direct-path backend: an ordinary directory tree under `root`.
pub struct PathFs {
    root: PathBuf,
    cwd: VfsPath,
}

impl PathFs {
    /// `root` is expected to be canonical already.
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            cwd: VfsPath::root(),
        }
    }

    fn real_path(&self, path: &VfsPath) -> PathBuf {
        path.segments()
            .iter()
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }

    /// Resolves `name` against the cursor and checks the result stays under root.
    async fn locate(&self, name: &str) -> VfsResult<(VfsPath, PathBuf)> {
        let vpath = self.cwd.resolve(name);
        let real = self.real_path(&vpath);
        self.check_inside(&real).await?;
        Ok((vpath, real))
    }

    /// Like [`PathFs::locate`] but refuses the root itself, for operations on a named entry.
    async fn locate_entry(&self, name: &str) -> VfsResult<(VfsPath, PathBuf)> {
        if name.trim().is_empty() {
            return Err(VfsError::InvalidName(name.to_string()));
        }
        let (vpath, real) = self.locate(name).await?;
        if vpath.is_root() {
            return Err(VfsError::InvalidName(name.to_string()));
        }
        Ok((vpath, real))
    }

    async fn check_inside(&self, real: &Path) -> VfsResult<()> {
        let resolved = match fs::canonicalize(real).await {
            Ok(path) => path,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // A dangling link would be followed by a later create.
                if let Ok(link) = fs::symlink_metadata(real).await {
                    if link.file_type().is_symlink() {
                        warn!("Refusing dangling symlink: {:?}", real);
                        return Err(VfsError::OutsideRoot(real.display().to_string()));
                    }
                }
                // Not created yet: the parent decides.
                match real.parent() {
                    Some(parent) => match fs::canonicalize(parent).await {
                        Ok(path) => path,
                        Err(_) => return Ok(()),
                    },
                    None => return Ok(()),
                }
            }
            Err(e) => return Err(e.into()),
        };

        if !resolved.starts_with(&self.root) {
            warn!("Path is outside of the allowed area: {:?}", resolved);
            return Err(VfsError::OutsideRoot(real.display().to_string()));
        }
        Ok(())
    }

    async fn metadata(&self, real: &Path, vpath: &VfsPath) -> VfsResult<Metadata> {
        fs::metadata(real).await.map_err(|e| io_error(e, vpath))
    }

    async fn is_empty_dir(real: &Path) -> VfsResult<bool> {
        let mut entries = fs::read_dir(real).await?;
        Ok(entries.next_entry().await?.is_none())
    }

    /// Clears the way for a rename onto `real`.
    async fn remove_existing(&self, real: &Path, vpath: &VfsPath) -> VfsResult<()> {
        let metadata = match fs::metadata(real).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        if metadata.is_dir() {
            if !Self::is_empty_dir(real).await? {
                return Err(VfsError::DirectoryNotEmpty(vpath.to_string()));
            }
            fs::remove_dir(real).await?;
        } else {
            fs::remove_file(real).await?;
        }
        debug!("Replaced existing {} during rename", vpath);
        Ok(())
    }
}

fn io_error(e: io::Error, vpath: &VfsPath) -> VfsError {
    match e.kind() {
        ErrorKind::NotFound => VfsError::NotFound(vpath.to_string()),
        _ => VfsError::Io(e),
    }
}

fn modified_time(metadata: &Metadata) -> DateTime<Local> {
    metadata
        .modified()
        .map(DateTime::<Local>::from)
        .unwrap_or_else(|_| Local::now())
}

#[async_trait]
impl Vfs for PathFs {
    fn pwd(&self) -> String {
        self.cwd.to_string()
    }

    async fn cd(&mut self, arg: &str) -> VfsResult<()> {
        let (vpath, real) = self.locate(arg).await?;
        let metadata = self.metadata(&real, &vpath).await?;
        if !metadata.is_dir() {
            return Err(VfsError::NotADirectory(vpath.to_string()));
        }
        self.cwd = vpath;
        Ok(())
    }

    async fn entries(&self) -> VfsResult<Vec<DirectoryEntry>> {
        let dir = self.real_path(&self.cwd);
        let mut read_dir = fs::read_dir(&dir)
            .await
            .map_err(|e| io_error(e, &self.cwd))?;

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let metadata = match fs::metadata(entry.path()).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(
                        "Failed to get metadata for entry: {:?}, error: {:?}",
                        entry.path(),
                        e
                    );
                    continue;
                }
            };

            entries.push(DirectoryEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind: if metadata.is_dir() {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                },
                size: metadata.len(),
                modified: modified_time(&metadata),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn mkdir(&self, name: &str) -> VfsResult<()> {
        let (vpath, real) = self.locate_entry(name).await?;
        if fs::metadata(&real).await.is_ok() {
            return Err(VfsError::AlreadyExists(vpath.to_string()));
        }
        fs::create_dir(&real).await.map_err(|e| io_error(e, &vpath))
    }

    async fn rmdir(&self, name: &str) -> VfsResult<()> {
        let (vpath, real) = self.locate_entry(name).await?;
        let metadata = self.metadata(&real, &vpath).await?;
        if !metadata.is_dir() {
            return Err(VfsError::NotADirectory(vpath.to_string()));
        }
        if !Self::is_empty_dir(&real).await? {
            return Err(VfsError::DirectoryNotEmpty(vpath.to_string()));
        }
        fs::remove_dir(&real).await.map_err(|e| io_error(e, &vpath))
    }

    async fn delete(&self, name: &str) -> VfsResult<()> {
        let (vpath, real) = self.locate_entry(name).await?;
        let metadata = self.metadata(&real, &vpath).await?;
        if !metadata.is_file() {
            return Err(VfsError::NotAFile(vpath.to_string()));
        }
        fs::remove_file(&real).await.map_err(|e| io_error(e, &vpath))
    }

    async fn rename(&self, from: &str, to: &str) -> VfsResult<()> {
        let (from_vpath, from_real) = self.locate_entry(from).await?;
        let (to_vpath, to_real) = self.locate_entry(to).await?;
        self.metadata(&from_real, &from_vpath).await?;

        if from_vpath == to_vpath {
            return Ok(());
        }
        if to_vpath.segments().starts_with(from_vpath.segments()) {
            return Err(VfsError::InvalidName(to_vpath.to_string()));
        }

        self.remove_existing(&to_real, &to_vpath).await?;
        fs::rename(&from_real, &to_real)
            .await
            .map_err(|e| io_error(e, &to_vpath))
    }

    async fn open_read(&self, name: &str) -> VfsResult<ByteReader> {
        let (vpath, real) = self.locate_entry(name).await?;
        let metadata = self.metadata(&real, &vpath).await?;
        if !metadata.is_file() {
            return Err(VfsError::NotAFile(vpath.to_string()));
        }
        let file = fs::File::open(&real)
            .await
            .map_err(|e| io_error(e, &vpath))?;
        Ok(Box::new(file))
    }

    async fn open_write(&self, name: &str) -> VfsResult<ByteWriter> {
        let (vpath, real) = self.locate_entry(name).await?;
        if let Ok(metadata) = fs::metadata(&real).await {
            if metadata.is_dir() {
                return Err(VfsError::NotAFile(vpath.to_string()));
            }
        }
        let file = fs::File::create(&real)
            .await
            .map_err(|e| io_error(e, &vpath))?;
        Ok(Box::new(file))
    }

    async fn size(&self, name: &str) -> VfsResult<u64> {
        let (vpath, real) = self.locate_entry(name).await?;
        let metadata = self.metadata(&real, &vpath).await?;
        if !metadata.is_file() {
            return Err(VfsError::NotAFile(vpath.to_string()));
        }
        Ok(metadata.len())
    }
}
