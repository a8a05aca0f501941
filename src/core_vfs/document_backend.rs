use crate::core_vfs::cursor::VfsPath;
use crate::core_vfs::error::{VfsError, VfsResult};
use crate::core_vfs::provider::{DocumentHandle, DocumentInfo, DocumentProvider};
use crate::core_vfs::{ByteReader, ByteWriter, DirectoryEntry, EntryKind, Vfs};
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

/// A named entry resolved down to its parent directory handle.
struct Located {
    vpath: VfsPath,
    parent: DocumentInfo,
    leaf: String,
    existing: Option<DocumentInfo>,
}

/// Document-handle backend.
///
/// The cursor keeps both the display path and the handle of the current
/// directory; every lookup walks the provider by segment name.
pub struct DocumentFs {
    provider: Arc<dyn DocumentProvider>,
    cwd: VfsPath,
    cwd_handle: DocumentHandle,
}

impl DocumentFs {
    pub fn new(provider: Arc<dyn DocumentProvider>) -> Self {
        let cwd_handle = provider.root();
        Self {
            provider,
            cwd: VfsPath::root(),
            cwd_handle,
        }
    }

    async fn child(&self, dir: DocumentHandle, name: &str) -> VfsResult<Option<DocumentInfo>> {
        let children = self.provider.children(dir).await?;
        Ok(children.into_iter().find(|info| info.name == name))
    }

    async fn walk(&self, path: &VfsPath) -> VfsResult<DocumentInfo> {
        let mut current = self.provider.info(self.provider.root()).await?;
        for segment in path.segments() {
            if !current.is_dir {
                return Err(VfsError::NotADirectory(path.to_string()));
            }
            current = self
                .child(current.handle, segment)
                .await?
                .ok_or_else(|| VfsError::NotFound(path.to_string()))?;
        }
        Ok(current)
    }

    async fn locate_entry(&self, name: &str) -> VfsResult<Located> {
        let vpath = self.cwd.resolve(name);
        let leaf = match vpath.file_name() {
            Some(leaf) if !name.trim().is_empty() => leaf.to_string(),
            _ => return Err(VfsError::InvalidName(name.to_string())),
        };

        let parent_path = vpath.parent();
        let parent = self.walk(&parent_path).await?;
        if !parent.is_dir {
            return Err(VfsError::NotADirectory(parent_path.to_string()));
        }
        let existing = self.child(parent.handle, &leaf).await?;

        Ok(Located {
            vpath,
            parent,
            leaf,
            existing,
        })
    }

    fn existing(located: &Located) -> VfsResult<&DocumentInfo> {
        located
            .existing
            .as_ref()
            .ok_or_else(|| VfsError::NotFound(located.vpath.to_string()))
    }

    async fn existing_file(&self, name: &str) -> VfsResult<DocumentInfo> {
        let located = self.locate_entry(name).await?;
        let info = Self::existing(&located)?;
        if info.is_dir {
            return Err(VfsError::NotAFile(located.vpath.to_string()));
        }
        Ok(info.clone())
    }

    async fn ensure_empty(&self, dir: &DocumentInfo, vpath: &VfsPath) -> VfsResult<()> {
        if !self.provider.children(dir.handle).await?.is_empty() {
            return Err(VfsError::DirectoryNotEmpty(vpath.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Vfs for DocumentFs {
    fn pwd(&self) -> String {
        self.cwd.to_string()
    }

    async fn cd(&mut self, arg: &str) -> VfsResult<()> {
        let vpath = self.cwd.resolve(arg);
        let target = self.walk(&vpath).await?;
        if !target.is_dir {
            return Err(VfsError::NotADirectory(vpath.to_string()));
        }
        self.cwd = vpath;
        self.cwd_handle = target.handle;
        Ok(())
    }

    async fn entries(&self) -> VfsResult<Vec<DirectoryEntry>> {
        let mut entries: Vec<DirectoryEntry> = self
            .provider
            .children(self.cwd_handle)
            .await?
            .into_iter()
            .map(|info| DirectoryEntry {
                name: info.name,
                kind: if info.is_dir {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                },
                size: info.size,
                modified: info.modified,
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn mkdir(&self, name: &str) -> VfsResult<()> {
        let located = self.locate_entry(name).await?;
        if located.existing.is_some() {
            return Err(VfsError::AlreadyExists(located.vpath.to_string()));
        }
        self.provider
            .create_directory(located.parent.handle, &located.leaf)
            .await?;
        Ok(())
    }

    async fn rmdir(&self, name: &str) -> VfsResult<()> {
        let located = self.locate_entry(name).await?;
        let info = Self::existing(&located)?;
        if !info.is_dir {
            return Err(VfsError::NotADirectory(located.vpath.to_string()));
        }
        self.ensure_empty(info, &located.vpath).await?;
        self.provider.delete(info.handle).await
    }

    async fn delete(&self, name: &str) -> VfsResult<()> {
        let info = self.existing_file(name).await?;
        self.provider.delete(info.handle).await
    }

    async fn rename(&self, from: &str, to: &str) -> VfsResult<()> {
        let source = self.locate_entry(from).await?;
        let source_info = Self::existing(&source)?.clone();
        let target = self.locate_entry(to).await?;

        if source.vpath == target.vpath {
            return Ok(());
        }
        if target.vpath.segments().starts_with(source.vpath.segments()) {
            return Err(VfsError::InvalidName(target.vpath.to_string()));
        }

        if let Some(existing) = &target.existing {
            if existing.is_dir {
                self.ensure_empty(existing, &target.vpath).await?;
            }
            debug!("Replacing existing {} during rename", target.vpath);
            self.provider.delete(existing.handle).await?;
        }

        self.provider
            .rename(source_info.handle, target.parent.handle, &target.leaf)
            .await
    }

    async fn open_read(&self, name: &str) -> VfsResult<ByteReader> {
        let info = self.existing_file(name).await?;
        self.provider.open_read(info.handle).await
    }

    async fn open_write(&self, name: &str) -> VfsResult<ByteWriter> {
        let located = self.locate_entry(name).await?;
        let handle = match &located.existing {
            Some(info) if info.is_dir => {
                return Err(VfsError::NotAFile(located.vpath.to_string()));
            }
            Some(info) => info.handle,
            None => {
                self.provider
                    .create_file(located.parent.handle, &located.leaf)
                    .await?
            }
        };
        self.provider.open_write(handle).await
    }

    async fn size(&self, name: &str) -> VfsResult<u64> {
        Ok(self.existing_file(name).await?.size)
    }
}
