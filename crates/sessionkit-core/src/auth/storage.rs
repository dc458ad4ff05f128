use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;

/// Key the token is stored under in either tier
pub const TOKEN_KEY: &str = "auth_token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageTier {
    /// Survives restarts; used when the user asks to be remembered
    Durable,
    /// Cleared when the session ends
    Session,
}

impl StorageTier {
    pub fn for_remember(remember: bool) -> Self {
        if remember {
            StorageTier::Durable
        } else {
            StorageTier::Session
        }
    }

    pub fn other(self) -> Self {
        match self {
            StorageTier::Durable => StorageTier::Session,
            StorageTier::Session => StorageTier::Durable,
        }
    }
}

/// Key/value string storage backing one tier.
pub trait TokenStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// In-process storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl TokenStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.lock().remove(key);
        Ok(())
    }
}

/// JSON object on disk. The file is deleted once it holds no items.
///
/// The file is owner-only and its directory is restricted to the owner on
/// every write, so give it a directory of its own.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read storage file {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse storage file {}", self.path.display()))
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if map.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path)?;
            }
            return Ok(());
        }
        let parent = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = parent {
            create_private_dir(dir)?;
        }
        let parent = parent.unwrap_or_else(|| std::path::Path::new("."));

        // Temp files are created owner-only (0600 on unix); persisting
        // replaces the old file atomically.
        let mut file = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
        serde_json::to_writer_pretty(&mut file, map)?;
        file.persist(&self.path)
            .with_context(|| format!("Failed to write storage file {}", self.path.display()))?;
        Ok(())
    }
}

/// Create `dir` (and missing ancestors) readable by the owner only.
#[cfg(unix)]
fn create_private_dir(dir: &std::path::Path) -> Result<()> {
    use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))
        .with_context(|| format!("Failed to restrict permissions on {}", dir.display()))
}

#[cfg(not(unix))]
fn create_private_dir(dir: &std::path::Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))
}

impl TokenStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.read_map()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock();
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock();
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}
