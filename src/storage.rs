use anyhow::{anyhow, Context};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use tracing::warn;

/// Cache local durable : chaînes JSON indexées par clé, synchrones.
pub trait LocalCache {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    /// Écrit de manière atomique.
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}

/// Un fichier `<clé>.json` par clé dans un répertoire.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    dir: PathBuf,
}

impl JsonFileCache {
    pub fn open<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating cache directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }
}

/// Nom de fichier injectif : `[A-Za-z0-9-]` tels quels, tout autre octet (y compris `_`)
/// devient `_XX` en hexadécimal.
fn file_stem(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("_{byte:02X}"));
        }
    }
    out
}

impl LocalCache for JsonFileCache {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("reading {}", path.display())),
        }
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.path_for(key);
        let mut tmp = NamedTempFile::new_in(&self.dir).with_context(|| "creating temp file")?;
        tmp.write_all(value.as_bytes())?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).with_context(|| "atomic rename")?;
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("removing {}", path.display())),
        }
    }
}

/// Cache en mémoire ; les clones partagent le même contenu.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, String>) -> T,
    ) -> anyhow::Result<T> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory cache poisoned"))?;
        Ok(f(&mut guard))
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.with_entries(|m| m.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.with_entries(|m| {
            m.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.with_entries(|m| {
            m.remove(key);
        })
    }
}

/// Charge une valeur typée ; absente, illisible ou corrompue, on repart du défaut.
pub fn load_or_default<T, C>(cache: &C, key: &str) -> T
where
    T: DeserializeOwned + Default,
    C: LocalCache + ?Sized,
{
    let raw = match cache.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(err) => {
            warn!(key, error = %err, "local cache unreadable, using defaults");
            return T::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            warn!(key, error = %err, "corrupted local cache entry, using defaults");
            T::default()
        }
    }
}

pub fn save_json<T, C>(cache: &C, key: &str, value: &T) -> anyhow::Result<()>
where
    T: Serialize,
    C: LocalCache + ?Sized,
{
    let json = serde_json::to_string(value).with_context(|| format!("serializing {key}"))?;
    cache.set(key, &json)
}
