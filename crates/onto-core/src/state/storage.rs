//! Storage backends for sync state
//!
//! Two implementations of [`StateStorage`]: an in-memory map for tests
//! and transient hosts, and a directory of TOML documents for durable
//! setups. The file backend writes atomically (temp file + rename) under
//! an exclusive lock and reads under a shared lock, so a crashed writer
//! never leaves a half-written record behind.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use fs2::FileExt;

use onto_backend::{StateStorage, StorageError};

type StorageResult<T> = std::result::Result<T, StorageError>;

/// In-memory key/value storage
#[derive(Default)]
pub struct MemoryStorage {
    map: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw value directly, bypassing the state layer's encoding
    ///
    /// Lets tests plant stale or foreign-written records.
    pub async fn seed(&self, key: &str, value: &str) -> StorageResult<()> {
        self.write(key, value).await
    }
}

#[async_trait]
impl StateStorage for MemoryStorage {
    async fn read(&self, key: &str) -> StorageResult<Option<String>> {
        let map = self
            .map
            .read()
            .map_err(|_| StorageError::new("storage lock poisoned"))?;
        Ok(map.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut map = self
            .map
            .write()
            .map_err(|_| StorageError::new("storage lock poisoned"))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let mut map = self
            .map
            .write()
            .map_err(|_| StorageError::new("storage lock poisoned"))?;
        map.remove(key);
        Ok(())
    }

    async fn keys(&self) -> StorageResult<Vec<String>> {
        let map = self
            .map
            .read()
            .map_err(|_| StorageError::new("storage lock poisoned"))?;
        Ok(map.keys().cloned().collect())
    }
}

/// One TOML document per key under a directory
///
/// Keys are source ids and may contain characters that are not filename
/// safe; they are escaped reversibly so `keys()` can report the original
/// ids.
pub struct FileStorage {
    dir: PathBuf,
}

const STATE_EXT: &str = "toml";

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{STATE_EXT}", escape_key(key)))
    }
}

#[async_trait]
impl StateStorage for FileStorage {
    async fn read(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        read_locked(&path).map(Some)
    }

    async fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        fs::create_dir_all(&self.dir)?;
        write_locked(&self.path_for(key), value)
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    async fn keys(&self) -> StorageResult<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(stem) = name.strip_suffix(&format!(".{STATE_EXT}")) {
                keys.push(unescape_key(stem));
            }
        }
        keys.sort();
        Ok(keys)
    }
}

fn read_locked(path: &Path) -> StorageResult<String> {
    let file = File::open(path)?;
    file.lock_shared()?;
    // Read through the locked handle to avoid a TOCTOU race
    let mut content = String::new();
    (&file).read_to_string(&mut content)?;
    Ok(content)
}

fn write_locked(path: &Path, content: &str) -> StorageResult<()> {
    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    lock_file.lock_exclusive()?;

    let tmp = path.with_extension("tmp");
    {
        let mut out = File::create(&tmp)?;
        out.write_all(content.as_bytes())?;
        out.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    // Lock released when lock_file drops
    Ok(())
}

/// Escape a key into a filename-safe form, reversibly
///
/// Alphanumerics, `-`, `_`, and `.` pass through; everything else
/// becomes `%XX` on its UTF-8 bytes.
fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn unescape_key(escaped: &str) -> String {
    let mut bytes = Vec::with_capacity(escaped.len());
    let mut chars = escaped.bytes();
    while let Some(b) = chars.next() {
        if b == b'%' {
            let hi = chars.next();
            let lo = chars.next();
            if let (Some(hi), Some(lo)) = (hi, lo)
                && let (Some(hi), Some(lo)) = (hex_val(hi), hex_val(lo))
            {
                bytes.push(hi * 16 + lo);
                continue;
            }
            bytes.push(b);
        } else {
            bytes.push(b);
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[tokio::test]
    async fn memory_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.read("k").await.unwrap(), None);
        storage.write("k", "v").await.unwrap();
        assert_eq!(storage.read("k").await.unwrap().as_deref(), Some("v"));
        storage.remove("k").await.unwrap();
        assert_eq!(storage.read("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_roundtrip() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        assert_eq!(storage.read("feed").await.unwrap(), None);
        storage.write("feed", "last_checksum = \"abc\"").await.unwrap();
        assert_eq!(
            storage.read("feed").await.unwrap().as_deref(),
            Some("last_checksum = \"abc\"")
        );

        storage.write("feed", "last_checksum = \"def\"").await.unwrap();
        assert_eq!(
            storage.read("feed").await.unwrap().as_deref(),
            Some("last_checksum = \"def\"")
        );

        storage.remove("feed").await.unwrap();
        assert_eq!(storage.read("feed").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_keys_survive_escaping() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.write("https://example.com/a b", "x").await.unwrap();
        storage.write("plain", "y").await.unwrap();

        let keys = storage.keys().await.unwrap();
        assert_eq!(keys, ["https://example.com/a b", "plain"]);
    }

    #[tokio::test]
    async fn missing_dir_lists_no_keys() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("never-created"));
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[test]
    fn escape_is_reversible() {
        for key in ["simple", "with space", "https://x/y?z=1", "unicode-é"] {
            assert_eq!(unescape_key(&escape_key(key)), key);
        }
    }
}
