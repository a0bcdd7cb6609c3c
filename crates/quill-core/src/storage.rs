use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use tracing::info;
use uuid::Uuid;

/// Where uploaded images go. Implementations pick a fresh, collision-resistant
/// name and return it as the stable reference stored with the record.
pub trait FileStore: Send + Sync {
    fn put(&self, bytes: &[u8], extension: &str) -> Result<String>;

    /// Removing an unknown reference is not an error.
    fn remove(&self, reference: &str) -> Result<()>;
}

fn fresh_name(extension: &str) -> String {
    format!("{}.{}", Uuid::new_v4(), extension)
}

/// Flat directory of uploads, one file per reference.
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn path_of(&self, reference: &str) -> PathBuf {
        self.dir.join(reference)
    }
}

impl FileStore for DiskStore {
    fn put(&self, bytes: &[u8], extension: &str) -> Result<String> {
        let name = fresh_name(extension);
        fs::write(self.path_of(&name), bytes)?;
        Ok(name)
    }

    fn remove(&self, reference: &str) -> Result<()> {
        match fs::remove_file(self.path_of(reference)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Keeps uploads in a map. Handy for tests and throwaway instances.
#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn get(&self, reference: &str) -> Option<Vec<u8>> {
        self.files.lock().ok()?.get(reference).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.lock().map(|files| files.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FileStore for MemoryStore {
    fn put(&self, bytes: &[u8], extension: &str) -> Result<String> {
        let name = fresh_name(extension);
        self.files
            .lock()
            .map_err(|e| anyhow!("upload map poisoned: {}", e))?
            .insert(name.clone(), bytes.to_vec());
        Ok(name)
    }

    fn remove(&self, reference: &str) -> Result<()> {
        self.files
            .lock()
            .map_err(|e| anyhow!("upload map poisoned: {}", e))?
            .remove(reference);
        Ok(())
    }
}
