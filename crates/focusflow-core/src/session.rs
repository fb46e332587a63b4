use chrono::Utc;
use focusflow_models::SessionRecord;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::CoreError;
use crate::resolver;
use crate::store::HistoryStore;

/// Title given to freshly created records until the user renames them.
pub const DEFAULT_TITLE: &str = "Focus Session";

/// Partial update applied to the active record. Unset fields are left alone.
#[derive(Debug, Default, Clone)]
pub struct SessionPatch {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub progress: Option<f64>,
    pub duration: Option<f64>,
    pub completed: Option<bool>,
}

/// Owns the "currently active item" and orchestrates every user-facing
/// mutation: loading a link (resolve, find-or-create, activate), in-place
/// updates, selection from history, and deletion. The history store never
/// knows which record is active.
pub struct SessionController {
    store: HistoryStore,
    active: Option<String>,
}

impl SessionController {
    pub fn new(store: HistoryStore) -> Self {
        Self {
            store,
            active: None,
        }
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&SessionRecord> {
        self.active.as_deref().and_then(|id| self.store.get(id))
    }

    pub fn clear_active(&mut self) {
        self.active = None;
    }

    /// Resolve a raw link and activate the matching record, creating one if
    /// this video has never been loaded before.
    ///
    /// On resolution failure the active session is cleared and the store left
    /// untouched. A resumed record keeps its notes, progress and title; both
    /// paths bump `last_played` and re-persist through the upsert path, which
    /// moves the record to the front.
    pub fn load_link(&mut self, raw: &str) -> Result<&SessionRecord, CoreError> {
        let Some(video_id) = resolver::resolve(raw) else {
            self.active = None;
            return Err(CoreError::InvalidLink);
        };

        let now = Utc::now();
        let record = match self.store.find_by_video_id(&video_id) {
            Some(existing) => {
                debug!("resuming existing session for {}", video_id);
                let mut resumed = existing.clone();
                resumed.last_played = now;
                resumed
            }
            None => {
                info!("creating new session for {}", video_id);
                // New records store the canonical watch URL, not the raw
                // pasted string.
                SessionRecord::new(
                    Uuid::new_v4().to_string(),
                    video_id.watch_url(),
                    DEFAULT_TITLE.to_string(),
                    now,
                )
            }
        };

        let id = self.store.upsert(record);
        self.active = Some(id.clone());
        self.store
            .get(&id)
            .ok_or(CoreError::RecordNotFound(id))
    }

    /// Merge the given fields into the active record, bump `last_played`, and
    /// persist. No-op when there is no active session.
    pub fn apply_update(&mut self, patch: SessionPatch) {
        let Some(active_id) = self.active.clone() else {
            debug!("update ignored, no active session");
            return;
        };
        let Some(existing) = self.store.get(&active_id) else {
            self.active = None;
            return;
        };

        let mut updated = existing.clone();
        if let Some(title) = patch.title {
            updated.title = title;
        }
        if let Some(notes) = patch.notes {
            updated.notes = notes;
        }
        if let Some(progress) = patch.progress {
            updated.progress = progress.max(0.0);
        }
        if let Some(duration) = patch.duration {
            updated.duration = duration.max(0.0);
        }
        if let Some(completed) = patch.completed {
            updated.completed = completed;
        }
        updated.last_played = Utc::now();
        self.store.upsert(updated);
    }

    /// Activate a stored record directly (the user picked it from history).
    /// Bumps recency through the same upsert path as `load_link`.
    pub fn select_existing(&mut self, record_id: &str) -> Result<&SessionRecord, CoreError> {
        let Some(existing) = self.store.get(record_id) else {
            return Err(CoreError::RecordNotFound(record_id.to_string()));
        };
        let mut resumed = existing.clone();
        resumed.last_played = Utc::now();
        let id = self.store.upsert(resumed);
        self.active = Some(id.clone());
        self.store
            .get(&id)
            .ok_or(CoreError::RecordNotFound(id))
    }

    /// Delete a record; clears activation if it was the active one.
    pub fn delete_record(&mut self, record_id: &str) -> bool {
        let removed = self.store.remove(record_id);
        if self.active.as_deref() == Some(record_id) {
            self.active = None;
        }
        removed
    }

    /// Replace the whole history from a user-supplied blob (all-or-nothing).
    /// Activation is dropped if the active record did not survive the import.
    pub fn import(&mut self, bytes: &[u8]) -> Result<usize, CoreError> {
        let count = self.store.import(bytes)?;
        if let Some(id) = self.active.as_deref() {
            if self.store.get(id).is_none() {
                self.active = None;
            }
        }
        Ok(count)
    }

    pub fn export(&self) -> anyhow::Result<Vec<u8>> {
        self.store.serialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;

    fn controller() -> SessionController {
        SessionController::new(HistoryStore::open(Box::new(MemoryStorage::new())))
    }

    #[test]
    fn test_load_link_creates_new_record() {
        let mut ctl = controller();
        let record = ctl.load_link("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(record.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(record.title, DEFAULT_TITLE);
        assert_eq!(record.progress, 0.0);
        assert!(!record.completed);
        assert_eq!(ctl.store().len(), 1);
        assert!(ctl.active().is_some());
    }

    #[test]
    fn test_load_same_video_again_resumes_existing() {
        let mut ctl = controller();
        let first_id = ctl.load_link("https://youtu.be/dQw4w9WgXcQ").unwrap().id.clone();
        let first_played = ctl.active().unwrap().last_played;

        ctl.apply_update(SessionPatch {
            notes: Some("important".to_string()),
            ..Default::default()
        });

        let resumed = ctl
            .load_link("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=x")
            .unwrap();
        assert_eq!(resumed.id, first_id);
        assert_eq!(resumed.notes, "important");
        assert!(resumed.last_played >= first_played);
        assert_eq!(ctl.store().len(), 1);
    }

    #[test]
    fn test_load_invalid_link_clears_active_and_leaves_store() {
        let mut ctl = controller();
        ctl.load_link("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert!(ctl.active().is_some());

        let err = ctl.load_link("definitely not a link").unwrap_err();
        assert!(matches!(err, CoreError::InvalidLink));
        assert!(ctl.active().is_none());
        assert_eq!(ctl.store().len(), 1);
    }

    #[test]
    fn test_apply_update_without_active_session_is_noop() {
        let mut ctl = controller();
        let before = ctl.store().serialize().unwrap();
        ctl.apply_update(SessionPatch {
            notes: Some("hi".to_string()),
            ..Default::default()
        });
        assert_eq!(ctl.store().serialize().unwrap(), before);
    }

    #[test]
    fn test_apply_update_clamps_negative_progress() {
        let mut ctl = controller();
        ctl.load_link("https://youtu.be/dQw4w9WgXcQ").unwrap();
        ctl.apply_update(SessionPatch {
            progress: Some(-10.0),
            ..Default::default()
        });
        assert_eq!(ctl.active().unwrap().progress, 0.0);
    }

    #[test]
    fn test_select_existing_activates_and_bumps_recency() {
        let mut ctl = controller();
        let first = ctl.load_link("https://youtu.be/aaaaaaaaaaa").unwrap().id.clone();
        ctl.load_link("https://youtu.be/bbbbbbbbbbb").unwrap();
        assert_ne!(ctl.active_id(), Some(first.as_str()));

        ctl.select_existing(&first).unwrap();
        assert_eq!(ctl.active_id(), Some(first.as_str()));
        assert_eq!(ctl.store().records()[0].id, first);
    }

    #[test]
    fn test_select_unknown_record_fails() {
        let mut ctl = controller();
        assert!(matches!(
            ctl.select_existing("nope"),
            Err(CoreError::RecordNotFound(_))
        ));
    }

    #[test]
    fn test_delete_active_record_clears_activation() {
        let mut ctl = controller();
        let id = ctl.load_link("https://youtu.be/dQw4w9WgXcQ").unwrap().id.clone();
        assert!(ctl.delete_record(&id));
        assert!(ctl.active().is_none());
        assert!(ctl.store().is_empty());
    }

    #[test]
    fn test_delete_other_record_keeps_activation() {
        let mut ctl = controller();
        let first = ctl.load_link("https://youtu.be/aaaaaaaaaaa").unwrap().id.clone();
        let second = ctl.load_link("https://youtu.be/bbbbbbbbbbb").unwrap().id.clone();
        assert!(ctl.delete_record(&first));
        assert_eq!(ctl.active_id(), Some(second.as_str()));
    }

    #[test]
    fn test_import_drops_dangling_activation() {
        let mut ctl = controller();
        ctl.load_link("https://youtu.be/aaaaaaaaaaa").unwrap();
        let blob = {
            let mut other = controller();
            other.load_link("https://youtu.be/bbbbbbbbbbb").unwrap();
            other.export().unwrap()
        };
        assert_eq!(ctl.import(&blob).unwrap(), 1);
        assert!(ctl.active().is_none());
    }
}
