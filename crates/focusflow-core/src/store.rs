use anyhow::Result;
use focusflow_models::{SessionRecord, VideoId};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::resolver;

/// Durable storage boundary: a single key-value slot holding the serialized
/// history collection. Absent on first run is normal, not an error.
pub trait HistoryStorage: Send + Sync {
    fn read(&self) -> Result<Option<Vec<u8>>>;
    fn write(&self, bytes: &[u8]) -> Result<()>;
}

impl<T: HistoryStorage + ?Sized> HistoryStorage for std::sync::Arc<T> {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        (**self).read()
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }
}

/// File-backed storage: one JSON document at a fixed path.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HistoryStorage for FileStorage {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        if !self.path.exists() {
            debug!("history file {:?} does not exist (first run)", self.path);
            return Ok(None);
        }
        Ok(Some(std::fs::read(&self.path)?))
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }
}

/// In-memory storage used by tests.
#[derive(Default)]
pub struct MemoryStorage {
    bytes: Mutex<Option<Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Mutex::new(Some(bytes)),
        }
    }
}

impl HistoryStorage for MemoryStorage {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        Ok(self
            .bytes
            .lock()
            .map_err(|_| anyhow::anyhow!("storage mutex poisoned"))?
            .clone())
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        *self
            .bytes
            .lock()
            .map_err(|_| anyhow::anyhow!("storage mutex poisoned"))? = Some(bytes.to_vec());
        Ok(())
    }
}

/// The ordered history collection plus its write-through persistence.
///
/// Ordering is descending `last_played` (most recent first); uniqueness is
/// enforced on the canonical identity derived from each record's URL.
/// Records whose URL does not resolve coexist without dedup guarantees and
/// are matched by record id instead.
///
/// Every successful mutation persists the full collection synchronously.
/// A failed write is logged and tolerated: losing durability is preferred
/// over blocking the user.
pub struct HistoryStore {
    records: Vec<SessionRecord>,
    storage: Box<dyn HistoryStorage>,
}

impl HistoryStore {
    /// Hydrate the collection from durable storage.
    ///
    /// A missing slot means first run (empty collection). Unreadable or
    /// malformed stored data is logged and ignored, also starting empty; the
    /// corrupt bytes stay on disk untouched.
    pub fn open(storage: Box<dyn HistoryStorage>) -> Self {
        let mut store = Self {
            records: Vec::new(),
            storage,
        };
        match store.storage.read() {
            Ok(Some(bytes)) => {
                if let Err(e) = store.hydrate(&bytes) {
                    warn!("ignoring stored history: {}", e);
                } else {
                    info!("loaded {} history records", store.records.len());
                }
            }
            Ok(None) => {}
            Err(e) => warn!("failed to read stored history, starting empty: {:#}", e),
        }
        store
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, record_id: &str) -> Option<&SessionRecord> {
        self.records.iter().find(|r| r.id == record_id)
    }

    /// Linear scan re-resolving each stored record's URL. Identity is derived,
    /// not stored, so different URL spellings of the same video match.
    pub fn find_by_video_id(&self, id: &VideoId) -> Option<&SessionRecord> {
        self.records
            .iter()
            .find(|r| resolver::resolve(&r.url).as_ref() == Some(id))
    }

    /// Insert or replace by canonical identity, then move to the front.
    ///
    /// When an existing record resolves to the same video, it is replaced in
    /// place and keeps its record id. Records with unresolvable URLs are
    /// replaced by record id. Returns the id of the stored record. This is
    /// the single path that triggers persistence for in-place mutations.
    pub fn upsert(&mut self, mut record: SessionRecord) -> String {
        match resolver::resolve(&record.url) {
            Some(video_id) => {
                if let Some(pos) = self
                    .records
                    .iter()
                    .position(|r| resolver::resolve(&r.url).as_ref() == Some(&video_id))
                {
                    let existing = self.records.remove(pos);
                    record.id = existing.id;
                }
            }
            None => {
                if let Some(pos) = self.records.iter().position(|r| r.id == record.id) {
                    self.records.remove(pos);
                }
            }
        }
        let id = record.id.clone();
        self.records.insert(0, record);
        // Stable sort, so the fresh insert stays in front of records with an
        // equal timestamp.
        self.records
            .sort_by(|a, b| b.last_played.cmp(&a.last_played));
        self.persist();
        id
    }

    /// Delete by record id; no-op if absent. The store holds no notion of
    /// "active", so clearing activation is the caller's responsibility.
    pub fn remove(&mut self, record_id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != record_id);
        let removed = self.records.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    /// Bulk replacement used by import. All-or-nothing: any ill-formed record
    /// rejects the whole batch and leaves the collection untouched.
    pub fn replace_all(&mut self, records: Vec<SessionRecord>) -> Result<usize, CoreError> {
        if let Some(bad) = records.iter().find(|r| !r.is_well_formed()) {
            return Err(CoreError::MalformedHistory(format!(
                "record {:?} has missing id or negative progress/duration",
                bad.id
            )));
        }
        self.records = normalize(records);
        self.persist();
        Ok(self.records.len())
    }

    /// Parse a user-supplied byte blob and replace the collection with it.
    pub fn import(&mut self, bytes: &[u8]) -> Result<usize, CoreError> {
        let records = parse_history(bytes)?;
        self.replace_all(records)
    }

    /// Serialize the collection to the wire shape (a JSON array of records).
    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&self.records)?)
    }

    /// Replace the in-memory collection from serialized bytes without
    /// persisting. Corrupt or non-array input fails with `MalformedHistory`
    /// and leaves the prior collection intact.
    pub fn hydrate(&mut self, bytes: &[u8]) -> Result<(), CoreError> {
        let records = parse_history(bytes)?;
        if let Some(bad) = records.iter().find(|r| !r.is_well_formed()) {
            return Err(CoreError::MalformedHistory(format!(
                "record {:?} has missing id or negative progress/duration",
                bad.id
            )));
        }
        self.records = normalize(records);
        Ok(())
    }

    fn persist(&self) {
        let bytes = match self.serialize() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("failed to serialize history, skipping persist: {:#}", e);
                return;
            }
        };
        match self.storage.write(&bytes) {
            Ok(()) => debug!("persisted {} history records", self.records.len()),
            Err(e) => warn!("failed to persist history, continuing in memory: {:#}", e),
        }
    }
}

fn parse_history(bytes: &[u8]) -> Result<Vec<SessionRecord>, CoreError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|e| CoreError::MalformedHistory(e.to_string()))?;
    if !value.is_array() {
        return Err(CoreError::MalformedHistory(
            "expected a JSON array of session records".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| CoreError::MalformedHistory(e.to_string()))
}

/// Sort by recency and drop later duplicates by canonical identity, so the
/// uniqueness invariant holds even for hand-edited import files.
fn normalize(mut records: Vec<SessionRecord>) -> Vec<SessionRecord> {
    records.sort_by(|a, b| b.last_played.cmp(&a.last_played));
    let mut seen: Vec<VideoId> = Vec::new();
    let mut result = Vec::with_capacity(records.len());
    for record in records {
        match resolver::resolve(&record.url) {
            Some(id) => {
                if seen.contains(&id) {
                    debug!("dropping duplicate history record for {}", id);
                    continue;
                }
                seen.push(id);
                result.push(record);
            }
            None => result.push(record),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn record(id: &str, url: &str, offset_secs: i64) -> SessionRecord {
        SessionRecord::new(
            id.to_string(),
            url.to_string(),
            "Focus Session".to_string(),
            Utc.timestamp_millis_opt(1_700_000_000_000).unwrap() + Duration::seconds(offset_secs),
        )
    }

    fn empty_store() -> HistoryStore {
        HistoryStore::open(Box::new(MemoryStorage::new()))
    }

    #[test]
    fn test_upsert_inserts_at_front() {
        let mut store = empty_store();
        store.upsert(record("a", "https://youtu.be/aaaaaaaaaaa", 0));
        store.upsert(record("b", "https://youtu.be/bbbbbbbbbbb", 10));
        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[0].id, "b");
    }

    #[test]
    fn test_upsert_is_idempotent_by_canonical_identity() {
        let mut store = empty_store();
        store.upsert(record("a", "https://youtu.be/aaaaaaaaaaa", 0));
        store.upsert(record("b", "https://youtu.be/bbbbbbbbbbb", 10));
        // Same video as "a", different spelling, newer timestamp.
        let id = store.upsert(record(
            "c",
            "https://www.youtube.com/watch?v=aaaaaaaaaaa&list=x",
            20,
        ));
        assert_eq!(store.len(), 2);
        // Replacement preserves the original record id and moves to front.
        assert_eq!(id, "a");
        assert_eq!(store.records()[0].id, "a");
        assert_eq!(store.records()[0].url, "https://www.youtube.com/watch?v=aaaaaaaaaaa&list=x");
    }

    #[test]
    fn test_collection_stays_sorted_by_recency() {
        let mut store = empty_store();
        store.upsert(record("a", "https://youtu.be/aaaaaaaaaaa", 30));
        store.upsert(record("b", "https://youtu.be/bbbbbbbbbbb", 10));
        store.upsert(record("c", "https://youtu.be/ccccccccccc", 20));
        let times: Vec<_> = store.records().iter().map(|r| r.last_played).collect();
        assert!(times.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(store.records()[0].id, "a");
    }

    #[test]
    fn test_unresolvable_urls_coexist_and_update_by_record_id() {
        let mut store = empty_store();
        store.upsert(record("x", "not a link", 0));
        store.upsert(record("y", "also not a link", 1));
        assert_eq!(store.len(), 2);
        let mut edit = store.get("x").unwrap().clone();
        edit.notes = "hello".to_string();
        edit.last_played = edit.last_played + Duration::seconds(5);
        store.upsert(edit);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("x").unwrap().notes, "hello");
    }

    #[test]
    fn test_find_by_video_id_matches_across_spellings() {
        let mut store = empty_store();
        store.upsert(record("a", "https://www.youtube.com/watch?v=aaaaaaaaaaa", 0));
        let id = VideoId::parse("aaaaaaaaaaa").unwrap();
        assert_eq!(store.find_by_video_id(&id).unwrap().id, "a");
        assert!(store.find_by_video_id(&VideoId::parse("zzzzzzzzzzz").unwrap()).is_none());
    }

    #[test]
    fn test_remove_is_noop_for_unknown_id() {
        let mut store = empty_store();
        store.upsert(record("a", "https://youtu.be/aaaaaaaaaaa", 0));
        assert!(!store.remove("nope"));
        assert!(store.remove("a"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_write_through_persistence() {
        let storage = std::sync::Arc::new(MemoryStorage::new());
        {
            let mut store = HistoryStore::open(Box::new(storage.clone()));
            store.upsert(record("a", "https://youtu.be/aaaaaaaaaaa", 0));
        }
        // The upsert alone must have written the full collection.
        assert!(storage.read().unwrap().is_some());
        let store = HistoryStore::open(Box::new(storage));
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].id, "a");
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("history.json");
        {
            let mut store = HistoryStore::open(Box::new(FileStorage::new(&path)));
            store.upsert(record("a", "https://youtu.be/aaaaaaaaaaa", 0));
        }
        let store = HistoryStore::open(Box::new(FileStorage::new(&path)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_open_tolerates_corrupt_storage() {
        let store = HistoryStore::open(Box::new(MemoryStorage::with_contents(
            b"{ not json".to_vec(),
        )));
        assert!(store.is_empty());
    }

    #[test]
    fn test_open_tolerates_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let store = HistoryStore::open(Box::new(FileStorage::new(&path)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_import_rejects_non_array() {
        let mut store = empty_store();
        store.upsert(record("a", "https://youtu.be/aaaaaaaaaaa", 0));
        let before = store.serialize().unwrap();

        let err = store.import(br#"{"id": "x"}"#).unwrap_err();
        assert!(matches!(err, CoreError::MalformedHistory(_)));
        assert_eq!(store.serialize().unwrap(), before);
    }

    #[test]
    fn test_import_rejects_garbage_bytes() {
        let mut store = empty_store();
        let before = store.serialize().unwrap();
        assert!(store.import(b"\xff\xfe not json").is_err());
        assert_eq!(store.serialize().unwrap(), before);
    }

    #[test]
    fn test_replace_all_rejects_ill_formed_records() {
        let mut store = empty_store();
        store.upsert(record("a", "https://youtu.be/aaaaaaaaaaa", 0));
        let before = store.serialize().unwrap();

        let mut bad = record("b", "https://youtu.be/bbbbbbbbbbb", 1);
        bad.progress = -5.0;
        let err = store.replace_all(vec![bad]).unwrap_err();
        assert!(matches!(err, CoreError::MalformedHistory(_)));
        assert_eq!(store.serialize().unwrap(), before);
    }

    #[test]
    fn test_import_accepts_exported_blob() {
        let mut store = empty_store();
        store.upsert(record("a", "https://youtu.be/aaaaaaaaaaa", 0));
        store.upsert(record("b", "https://youtu.be/bbbbbbbbbbb", 10));
        let blob = store.serialize().unwrap();

        let mut other = empty_store();
        assert_eq!(other.import(&blob).unwrap(), 2);
        assert_eq!(other.serialize().unwrap(), blob);
    }

    #[test]
    fn test_import_dedups_by_canonical_identity() {
        let mut store = empty_store();
        let records = vec![
            record("a", "https://youtu.be/aaaaaaaaaaa", 0),
            record("b", "https://www.youtube.com/watch?v=aaaaaaaaaaa", 10),
        ];
        let blob = serde_json::to_vec(&records).unwrap();
        assert_eq!(store.import(&blob).unwrap(), 1);
        // The more recent spelling wins.
        assert_eq!(store.records()[0].id, "b");
    }
}
