use crate::core_vfs::error::VfsResult;
use crate::core_vfs::{ByteReader, ByteWriter};
use async_trait::async_trait;
use chrono::{DateTime, Local};

/// Opaque reference to a document or directory inside a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(pub u64);

#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub handle: DocumentHandle,
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: DateTime<Local>,
}

/// Handle-based storage API.
///
/// Nothing here takes a path: callers walk the tree from [`DocumentProvider::root`]
/// by listing children and matching display names.
#[async_trait]
pub trait DocumentProvider: Send + Sync {
    fn root(&self) -> DocumentHandle;

    async fn info(&self, doc: DocumentHandle) -> VfsResult<DocumentInfo>;

    async fn children(&self, dir: DocumentHandle) -> VfsResult<Vec<DocumentInfo>>;

    async fn create_directory(&self, parent: DocumentHandle, name: &str)
        -> VfsResult<DocumentHandle>;

    async fn create_file(&self, parent: DocumentHandle, name: &str) -> VfsResult<DocumentHandle>;

    /// Deletes a document; directories go with everything below them.
    async fn delete(&self, doc: DocumentHandle) -> VfsResult<()>;

    /// Moves `doc` under `new_parent` with the display name `new_name`.
    async fn rename(
        &self,
        doc: DocumentHandle,
        new_parent: DocumentHandle,
        new_name: &str,
    ) -> VfsResult<()>;

    async fn open_read(&self, doc: DocumentHandle) -> VfsResult<ByteReader>;

    /// Opens `doc` for writing from offset zero, discarding previous content.
    async fn open_write(&self, doc: DocumentHandle) -> VfsResult<ByteWriter>;
}
