//! Collaborator contract for replica storage access

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Access to the replicas' underlying storage.
///
/// The heal pipeline touches storage only through this trait; volume
/// mounting, xattr syscalls and unlink live behind it. Implementations
/// must be shareable across worker tasks.
pub trait ReplicaStore: Send + Sync {
    /// Fetch a named attribute. `Ok(None)` means the attribute or the
    /// file itself is absent.
    fn get_attr(&self, path: &Path, name: &str) -> Result<Option<Vec<u8>>>;

    /// Write a named attribute.
    fn set_attr(&self, path: &Path, name: &str, value: &[u8]) -> Result<()>;

    /// Whether a copy exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Remove the copy at `path`.
    fn remove(&self, path: &Path) -> Result<()>;

    /// Refresh `path`, surfacing a post-heal existence confirmation.
    fn touch(&self, path: &Path) -> Result<()>;

    /// Content digest of the copy at `path`, `None` when absent.
    fn digest(&self, path: &Path) -> Result<Option<[u8; 32]>>;
}

#[derive(Debug, Default, Clone)]
struct MemoryFile {
    content: Vec<u8>,
    attrs: HashMap<String, Vec<u8>>,
}

/// In-memory `ReplicaStore` for tests and embedding.
///
/// Paths are treated as opaque keys; there is no directory structure.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RwLock<HashMap<PathBuf, MemoryFile>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a file with the given content, replacing any existing copy
    /// and its attributes.
    pub fn put_file(&self, path: impl Into<PathBuf>, content: &[u8]) {
        self.files.write().insert(
            path.into(),
            MemoryFile {
                content: content.to_vec(),
                attrs: HashMap::new(),
            },
        );
    }

    /// Content of the file at `path`, `None` when absent.
    pub fn file_content(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.read().get(path).map(|f| f.content.clone())
    }
}

impl ReplicaStore for MemoryStore {
    fn get_attr(&self, path: &Path, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .files
            .read()
            .get(path)
            .and_then(|f| f.attrs.get(name).cloned()))
    }

    fn set_attr(&self, path: &Path, name: &str, value: &[u8]) -> Result<()> {
        let mut files = self.files.write();
        let file = files
            .get_mut(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))?;
        file.attrs.insert(name.to_owned(), value.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().contains_key(path)
    }

    fn remove(&self, path: &Path) -> Result<()> {
        self.files
            .write()
            .remove(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))?;
        Ok(())
    }

    fn touch(&self, path: &Path) -> Result<()> {
        if !self.exists(path) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such file").into());
        }
        Ok(())
    }

    fn digest(&self, path: &Path) -> Result<Option<[u8; 32]>> {
        Ok(self
            .files
            .read()
            .get(path)
            .map(|f| Sha256::digest(&f.content).into()))
    }
}
