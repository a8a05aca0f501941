use crate::core_vfs::error::{VfsError, VfsResult};
use crate::core_vfs::provider::{DocumentHandle, DocumentInfo, DocumentProvider};
use crate::core_vfs::{ByteReader, ByteWriter};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;

#[derive(Debug)]
struct FileData {
    bytes: Vec<u8>,
    modified: DateTime<Local>,
}

#[derive(Debug)]
enum NodeKind {
    Directory(Vec<DocumentHandle>),
    File(Arc<Mutex<FileData>>),
}

#[derive(Debug)]
struct Node {
    name: String,
    parent: Option<DocumentHandle>,
    kind: NodeKind,
    modified: DateTime<Local>,
}

#[derive(Debug)]
struct Tree {
    nodes: HashMap<DocumentHandle, Node>,
    next_id: u64,
}

const ROOT: DocumentHandle = DocumentHandle(0);

impl Tree {
    fn node(&self, doc: DocumentHandle) -> VfsResult<&Node> {
        self.nodes
            .get(&doc)
            .ok_or_else(|| VfsError::NotFound(format!("document #{}", doc.0)))
    }

    fn info(&self, doc: DocumentHandle) -> VfsResult<DocumentInfo> {
        let node = self.node(doc)?;
        let (is_dir, size, modified) = match &node.kind {
            NodeKind::Directory(_) => (true, 0, node.modified),
            NodeKind::File(data) => {
                let data = data.lock();
                (false, data.bytes.len() as u64, data.modified)
            }
        };
        Ok(DocumentInfo {
            handle: doc,
            name: node.name.clone(),
            is_dir,
            size,
            modified,
        })
    }

    fn children_of(&self, dir: DocumentHandle) -> VfsResult<&Vec<DocumentHandle>> {
        let node = self.node(dir)?;
        match &node.kind {
            NodeKind::Directory(children) => Ok(children),
            NodeKind::File(_) => Err(VfsError::NotADirectory(node.name.clone())),
        }
    }

    fn children_mut(&mut self, dir: DocumentHandle) -> VfsResult<&mut Vec<DocumentHandle>> {
        let node = self
            .nodes
            .get_mut(&dir)
            .ok_or_else(|| VfsError::NotFound(format!("document #{}", dir.0)))?;
        match &mut node.kind {
            NodeKind::Directory(children) => Ok(children),
            NodeKind::File(_) => Err(VfsError::NotADirectory(node.name.clone())),
        }
    }

    fn find_child(&self, dir: DocumentHandle, name: &str) -> VfsResult<Option<DocumentHandle>> {
        Ok(self
            .children_of(dir)?
            .iter()
            .copied()
            .find(|child| self.nodes.get(child).map(|n| n.name.as_str()) == Some(name)))
    }

    fn insert(&mut self, parent: DocumentHandle, name: &str, kind: NodeKind) -> VfsResult<DocumentHandle> {
        validate_name(name)?;
        if self.find_child(parent, name)?.is_some() {
            return Err(VfsError::AlreadyExists(name.to_string()));
        }

        self.next_id += 1;
        let handle = DocumentHandle(self.next_id);
        let now = Local::now();
        self.nodes.insert(
            handle,
            Node {
                name: name.to_string(),
                parent: Some(parent),
                kind,
                modified: now,
            },
        );
        self.children_mut(parent)?.push(handle);
        self.touch(parent, now);
        Ok(handle)
    }

    fn touch(&mut self, doc: DocumentHandle, when: DateTime<Local>) {
        if let Some(node) = self.nodes.get_mut(&doc) {
            node.modified = when;
        }
    }

    fn detach(&mut self, doc: DocumentHandle) -> VfsResult<()> {
        let parent = self.node(doc)?.parent;
        if let Some(parent) = parent {
            self.children_mut(parent)?.retain(|child| *child != doc);
            self.touch(parent, Local::now());
        }
        Ok(())
    }

    fn is_ancestor(&self, ancestor: DocumentHandle, mut doc: DocumentHandle) -> bool {
        loop {
            if doc == ancestor {
                return true;
            }
            match self.nodes.get(&doc).and_then(|n| n.parent) {
                Some(parent) => doc = parent,
                None => return false,
            }
        }
    }

    fn file_data(&self, doc: DocumentHandle) -> VfsResult<Arc<Mutex<FileData>>> {
        let node = self.node(doc)?;
        match &node.kind {
            NodeKind::File(data) => Ok(Arc::clone(data)),
            NodeKind::Directory(_) => Err(VfsError::NotAFile(node.name.clone())),
        }
    }
}

fn validate_name(name: &str) -> VfsResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(VfsError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// In-process document tree, used when the device offers no direct path access.
///
/// Content lives in memory for the lifetime of the provider.
#[derive(Debug)]
pub struct MemoryProvider {
    tree: Mutex<Tree>,
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProvider {
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            ROOT,
            Node {
                name: String::new(),
                parent: None,
                kind: NodeKind::Directory(Vec::new()),
                modified: Local::now(),
            },
        );
        Self {
            tree: Mutex::new(Tree { nodes, next_id: 0 }),
        }
    }
}

#[async_trait]
impl DocumentProvider for MemoryProvider {
    fn root(&self) -> DocumentHandle {
        ROOT
    }

    async fn info(&self, doc: DocumentHandle) -> VfsResult<DocumentInfo> {
        self.tree.lock().info(doc)
    }

    async fn children(&self, dir: DocumentHandle) -> VfsResult<Vec<DocumentInfo>> {
        let tree = self.tree.lock();
        tree.children_of(dir)?
            .iter()
            .map(|child| tree.info(*child))
            .collect()
    }

    async fn create_directory(
        &self,
        parent: DocumentHandle,
        name: &str,
    ) -> VfsResult<DocumentHandle> {
        self.tree
            .lock()
            .insert(parent, name, NodeKind::Directory(Vec::new()))
    }

    async fn create_file(&self, parent: DocumentHandle, name: &str) -> VfsResult<DocumentHandle> {
        let data = FileData {
            bytes: Vec::new(),
            modified: Local::now(),
        };
        self.tree
            .lock()
            .insert(parent, name, NodeKind::File(Arc::new(Mutex::new(data))))
    }

    async fn delete(&self, doc: DocumentHandle) -> VfsResult<()> {
        if doc == ROOT {
            return Err(VfsError::InvalidName("/".to_string()));
        }
        let mut tree = self.tree.lock();
        tree.detach(doc)?;

        let mut pending = vec![doc];
        while let Some(current) = pending.pop() {
            if let Some(node) = tree.nodes.remove(&current) {
                if let NodeKind::Directory(children) = node.kind {
                    pending.extend(children);
                }
            }
        }
        Ok(())
    }

    async fn rename(
        &self,
        doc: DocumentHandle,
        new_parent: DocumentHandle,
        new_name: &str,
    ) -> VfsResult<()> {
        validate_name(new_name)?;
        if doc == ROOT {
            return Err(VfsError::InvalidName("/".to_string()));
        }

        let mut tree = self.tree.lock();
        tree.node(doc)?;
        tree.children_of(new_parent)?;
        if tree.is_ancestor(doc, new_parent) {
            return Err(VfsError::InvalidName(new_name.to_string()));
        }
        if let Some(existing) = tree.find_child(new_parent, new_name)? {
            if existing != doc {
                return Err(VfsError::AlreadyExists(new_name.to_string()));
            }
        }

        tree.detach(doc)?;
        tree.children_mut(new_parent)?.push(doc);
        tree.touch(new_parent, Local::now());
        if let Some(node) = tree.nodes.get_mut(&doc) {
            node.name = new_name.to_string();
            node.parent = Some(new_parent);
        }
        Ok(())
    }

    async fn open_read(&self, doc: DocumentHandle) -> VfsResult<ByteReader> {
        let data = self.tree.lock().file_data(doc)?;
        let snapshot = data.lock().bytes.clone();
        Ok(Box::new(Cursor::new(snapshot)))
    }

    async fn open_write(&self, doc: DocumentHandle) -> VfsResult<ByteWriter> {
        let data = self.tree.lock().file_data(doc)?;
        {
            let mut data = data.lock();
            data.bytes.clear();
            data.modified = Local::now();
        }
        Ok(Box::new(MemoryWriter { data }))
    }
}

/// Appends straight into the shared file buffer.
struct MemoryWriter {
    data: Arc<Mutex<FileData>>,
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize, io::Error>> {
        let mut data = self.data.lock();
        data.bytes.extend_from_slice(buf);
        data.modified = Local::now();
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_create_and_list_children() {
        let provider = MemoryProvider::new();
        let root = provider.root();
        let music = provider.create_directory(root, "Music").await.unwrap();
        provider.create_file(root, "a.txt").await.unwrap();
        provider.create_file(music, "song.mp3").await.unwrap();

        let names: Vec<String> = provider
            .children(root)
            .await
            .unwrap()
            .into_iter()
            .map(|info| info.name)
            .collect();
        assert_eq!(names, vec!["Music", "a.txt"]);
        assert_eq!(provider.children(music).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_names_rejected() {
        let provider = MemoryProvider::new();
        let root = provider.root();
        provider.create_file(root, "a.txt").await.unwrap();
        assert!(matches!(
            provider.create_directory(root, "a.txt").await,
            Err(VfsError::AlreadyExists(_))
        ));
        assert!(matches!(
            provider.create_file(root, "x/y").await,
            Err(VfsError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_write_truncates_and_read_snapshots() {
        let provider = MemoryProvider::new();
        let doc = provider.create_file(provider.root(), "f.bin").await.unwrap();

        let mut writer = provider.open_write(doc).await.unwrap();
        writer.write_all(b"first version").await.unwrap();
        writer.shutdown().await.unwrap();

        let mut writer = provider.open_write(doc).await.unwrap();
        writer.write_all(b"second").await.unwrap();
        writer.shutdown().await.unwrap();

        let mut content = Vec::new();
        provider
            .open_read(doc)
            .await
            .unwrap()
            .read_to_end(&mut content)
            .await
            .unwrap();
        assert_eq!(content, b"second");
        assert_eq!(provider.info(doc).await.unwrap().size, 6);
    }

    #[tokio::test]
    async fn test_delete_directory_removes_subtree() {
        let provider = MemoryProvider::new();
        let root = provider.root();
        let dir = provider.create_directory(root, "d").await.unwrap();
        let file = provider.create_file(dir, "inner").await.unwrap();

        provider.delete(dir).await.unwrap();
        assert!(provider.children(root).await.unwrap().is_empty());
        assert!(matches!(
            provider.info(file).await,
            Err(VfsError::NotFound(_))
        ));
        assert!(provider.delete(root).await.is_err());
    }

    #[tokio::test]
    async fn test_rename_moves_between_directories() {
        let provider = MemoryProvider::new();
        let root = provider.root();
        let a = provider.create_directory(root, "a").await.unwrap();
        let b = provider.create_directory(root, "b").await.unwrap();
        let file = provider.create_file(a, "x").await.unwrap();

        provider.rename(file, b, "y").await.unwrap();
        assert!(provider.children(a).await.unwrap().is_empty());
        let moved = provider.children(b).await.unwrap();
        assert_eq!(moved[0].name, "y");
        assert_eq!(moved[0].handle, file);
    }

    #[tokio::test]
    async fn test_rename_into_own_subtree_rejected() {
        let provider = MemoryProvider::new();
        let root = provider.root();
        let a = provider.create_directory(root, "a").await.unwrap();
        let inner = provider.create_directory(a, "inner").await.unwrap();
        assert!(provider.rename(a, inner, "a").await.is_err());
    }
}
