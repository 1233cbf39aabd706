use model::cursor::CursorPosition;
use std::{collections::HashMap, path::Path, sync::Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Failed to open state store: {0}")]
    Open(#[source] sled::Error),

    #[error("State read/write failure: {0}")]
    Storage(#[from] sled::Error),

    #[error("Failed to encode state payload: {0}")]
    Encode(#[from] bincode::Error),

    #[error("State store lock poisoned")]
    Poisoned,
}

/// Durable record of per-partition progress between runs.
///
/// `load_global` reads the single pre-partitioning cursor older deployments
/// wrote; it seeds partitions that have no per-partition entry yet.
pub trait StateStore: Send + Sync {
    fn load_partition(&self, key: &str) -> Result<Option<CursorPosition>, StateError>;
    fn save_partition(&self, key: &str, position: CursorPosition) -> Result<(), StateError>;
    fn load_global(&self) -> Result<Option<CursorPosition>, StateError>;
}

const GLOBAL_KEY: &str = "cursor:global";

pub struct SledStateStore {
    db: sled::Db,
}

impl SledStateStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StateError> {
        let db = sled::open(path).map_err(StateError::Open)?;
        Ok(Self { db })
    }

    #[inline]
    fn partition_key(key: &str) -> String {
        format!("partition:{key}")
    }

    /// Writes the legacy single-cursor position. Kept for seeding stores
    /// migrated from pre-partitioned deployments.
    pub fn save_global(&self, position: CursorPosition) -> Result<(), StateError> {
        let bytes = bincode::serialize(&position)?;
        self.db.insert(GLOBAL_KEY, bytes)?;
        Ok(())
    }
}

impl StateStore for SledStateStore {
    fn load_partition(&self, key: &str) -> Result<Option<CursorPosition>, StateError> {
        match self.db.get(Self::partition_key(key))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save_partition(&self, key: &str, position: CursorPosition) -> Result<(), StateError> {
        let bytes = bincode::serialize(&position)?;
        self.db.insert(Self::partition_key(key), bytes)?;
        Ok(())
    }

    fn load_global(&self) -> Result<Option<CursorPosition>, StateError> {
        match self.db.get(GLOBAL_KEY)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }
}

/// In-memory store for stateless runs and tests.
#[derive(Default)]
pub struct MemoryStateStore {
    partitions: Mutex<HashMap<String, CursorPosition>>,
    global: Option<CursorPosition>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_global(position: CursorPosition) -> Self {
        Self {
            partitions: Mutex::new(HashMap::new()),
            global: Some(position),
        }
    }

    /// Current position of a partition, for inspection.
    pub fn partition(&self, key: &str) -> Option<CursorPosition> {
        self.partitions.lock().ok()?.get(key).copied()
    }
}

impl StateStore for MemoryStateStore {
    fn load_partition(&self, key: &str) -> Result<Option<CursorPosition>, StateError> {
        let partitions = self.partitions.lock().map_err(|_| StateError::Poisoned)?;
        Ok(partitions.get(key).copied())
    }

    fn save_partition(&self, key: &str, position: CursorPosition) -> Result<(), StateError> {
        let mut partitions = self.partitions.lock().map_err(|_| StateError::Poisoned)?;
        partitions.insert(key.to_string(), position);
        Ok(())
    }

    fn load_global(&self) -> Result<Option<CursorPosition>, StateError> {
        Ok(self.global)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn sled_round_trips_partition_positions() {
        let dir = tempdir().unwrap();
        let store = SledStateStore::open(dir.path()).unwrap();

        let key = r#"{"campaign_id":123}"#;
        assert!(store.load_partition(key).unwrap().is_none());

        store
            .save_partition(key, CursorPosition::SyncedThrough(date(2023, 1, 31)))
            .unwrap();
        assert_eq!(
            store.load_partition(key).unwrap(),
            Some(CursorPosition::SyncedThrough(date(2023, 1, 31)))
        );
    }

    #[test]
    fn sled_global_position_is_separate_from_partitions() {
        let dir = tempdir().unwrap();
        let store = SledStateStore::open(dir.path()).unwrap();

        store
            .save_global(CursorPosition::SyncedThrough(date(2022, 12, 31)))
            .unwrap();

        assert_eq!(
            store.load_global().unwrap(),
            Some(CursorPosition::SyncedThrough(date(2022, 12, 31)))
        );
        assert!(store.load_partition("global").unwrap().is_none());
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStateStore::new();
        store
            .save_partition("p", CursorPosition::SyncedThrough(date(2023, 2, 28)))
            .unwrap();
        assert_eq!(
            store.load_partition("p").unwrap(),
            Some(CursorPosition::SyncedThrough(date(2023, 2, 28)))
        );
        assert!(store.load_global().unwrap().is_none());
    }
}
