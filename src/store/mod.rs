//! # Store Module - Data Persistence Layer
//!
//! Persistence for the wardbot collections. Both stores (house listings and
//! to-dos) keep their full state in memory and rewrite a single JSON snapshot
//! file after every mutation; load is one full-file parse at startup.
//!
//! The snapshot boundary is the [`SnapshotStore`] trait so the stores can be
//! constructed against [`JsonSnapshot`] (durable, atomic writes under a file
//! lock) in production and [`MemorySnapshot`] in tests.
//!
//! ```text
//! data/
//! ├── houses.json     ← district → ordered listing array
//! └── todo.json       ← ordered to-do array
//! ```
//!
//! Writes are last-writer-wins whole-file replacements. There is no journal
//! or partial-write recovery; the data is cheap to rebuild and the atomic
//! rename keeps the file from ever being seen half-written.

use anyhow::{anyhow, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub mod listings;
pub mod todos;

/// Timestamp (de)serialization in the snapshot wire format: `YYYY-MM-DD HH:MM:SS`.
pub(crate) mod stamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&dt.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(de)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Whole-snapshot persistence seam for a store's collection type.
///
/// `load` runs once at store construction; `save` runs after every mutation.
/// A missing backing file is not an error: it yields `T::default()`.
pub trait SnapshotStore<T>: Send
where
    T: Serialize + DeserializeOwned + Default,
{
    fn load(&self) -> Result<T>;
    fn save(&self, data: &T) -> Result<()>;
}

/// Durable JSON snapshot file.
pub struct JsonSnapshot {
    path: PathBuf,
}

impl JsonSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write content to the snapshot path with exclusive locking and an
    /// atomic temp-file + rename so readers never observe a torn file.
    fn write_file_locked(path: &Path, content: &str) -> Result<()> {
        use std::fs::{self, File, OpenOptions};
        use std::io::Write;

        // Open (or create) the destination to hold an exclusive lock for the
        // duration of the replacement.
        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        lock_file.lock_exclusive()?;

        // Unique temp file in the same directory so the rename stays on one
        // filesystem.
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let base = path.file_name().and_then(|s| s.to_str()).unwrap_or("snapshot.json");
        let mut counter = 0u32;
        let tmp_path = loop {
            let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(mut tmp) => {
                    tmp.write_all(content.as_bytes())?;
                    tmp.flush()?;
                    let _ = tmp.sync_all();
                    break candidate;
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    counter = counter.saturating_add(1);
                    continue;
                }
                Err(e) => return Err(anyhow!("failed to create temp file for atomic write: {e}")),
            }
        };

        fs::rename(&tmp_path, path)?;

        // Fsync the directory to persist the rename (best-effort).
        if let Ok(dir_file) = File::open(dir) {
            let _ = dir_file.sync_all();
        }

        drop(lock_file);
        Ok(())
    }
}

impl<T> SnapshotStore<T> for JsonSnapshot
where
    T: Serialize + DeserializeOwned + Default,
{
    fn load(&self) -> Result<T> {
        match std::fs::read_to_string(&self.path) {
            Ok(data) => {
                // Guard against any accidental leading NULs
                let cleaned = data.trim_start_matches('\0');
                serde_json::from_str(cleaned)
                    .map_err(|e| anyhow!("failed to parse {}: {e}", self.path.display()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(anyhow!("failed reading {}: {e}", self.path.display())),
        }
    }

    fn save(&self, data: &T) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let content = serde_json::to_string_pretty(data)
            .map_err(|e| anyhow!("failed to serialize {}: {e}", self.path.display()))?;
        Self::write_file_locked(&self.path, &content)
    }
}

/// In-memory snapshot used by tests and the `MemorySnapshot`-backed dry runs.
/// Holds the serialized form so load/save exercise the same serde path as the
/// file adapter.
#[derive(Default)]
pub struct MemorySnapshot {
    cell: Mutex<Option<String>>,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the snapshot with pre-serialized JSON, as if the file existed.
    pub fn with_contents(json: &str) -> Self {
        Self {
            cell: Mutex::new(Some(json.to_string())),
        }
    }
}

impl<T> SnapshotStore<T> for MemorySnapshot
where
    T: Serialize + DeserializeOwned + Default,
{
    fn load(&self) -> Result<T> {
        let guard = self.cell.lock().map_err(|_| anyhow!("snapshot mutex poisoned"))?;
        match guard.as_deref() {
            Some(json) => serde_json::from_str(json).map_err(|e| anyhow!("failed to parse snapshot: {e}")),
            None => Ok(T::default()),
        }
    }

    fn save(&self, data: &T) -> Result<()> {
        let json = serde_json::to_string(data)?;
        let mut guard = self.cell.lock().map_err(|_| anyhow!("snapshot mutex poisoned"))?;
        *guard = Some(json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn json_snapshot_missing_file_yields_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let snap = JsonSnapshot::new(dir.path().join("absent.json"));
        let loaded: Vec<String> = snap.load().expect("load");
        assert!(loaded.is_empty());
    }

    #[test]
    fn json_snapshot_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let snap = JsonSnapshot::new(dir.path().join("map.json"));
        let mut data = BTreeMap::new();
        data.insert("a".to_string(), vec![1, 2, 3]);
        snap.save(&data).expect("save");
        let loaded: BTreeMap<String, Vec<i32>> = snap.load().expect("load");
        assert_eq!(loaded, data);
    }

    #[test]
    fn memory_snapshot_round_trips() {
        let snap = MemorySnapshot::new();
        let data = vec!["one".to_string(), "two".to_string()];
        SnapshotStore::save(&snap, &data).expect("save");
        let loaded: Vec<String> = snap.load().expect("load");
        assert_eq!(loaded, data);
    }
}
