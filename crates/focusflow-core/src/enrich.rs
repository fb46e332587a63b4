use focusflow_models::{SessionRecord, StudyAidKind};
use tracing::{debug, warn};

/// Lifecycle of the asynchronous study-aid request for the active session.
///
/// Tagged state rather than boolean flags, so the staleness guard is a plain
/// tag comparison. `Ready.text` is ephemeral display state; it is never
/// merged into the persisted notes field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EnrichmentState {
    #[default]
    Idle,
    Requesting {
        session_id: String,
        kind: StudyAidKind,
        seq: u64,
    },
    Ready {
        session_id: String,
        kind: StudyAidKind,
        text: String,
    },
    Failed {
        session_id: String,
        reason: String,
    },
}

/// Proof that a request was started, stamped with the session it was issued
/// for. Handed back on completion so the result can be matched against the
/// session that is active by then.
#[derive(Debug, Clone)]
pub struct EnrichmentTicket {
    session_id: String,
    kind: StudyAidKind,
    seq: u64,
}

impl EnrichmentTicket {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn kind(&self) -> StudyAidKind {
        self.kind
    }
}

/// Single-flight coordinator for study-aid generation.
///
/// The external call itself lives behind the provider boundary; this type is
/// the synchronous bookkeeping around it. At most one request is in flight at
/// a time: a second trigger while one is `Requesting` is ignored, not queued.
/// There is no explicit cancellation; a result arriving for a session that is
/// no longer active is discarded (logical cancellation).
#[derive(Debug, Default)]
pub struct EnrichmentCoordinator {
    state: EnrichmentState,
    next_seq: u64,
}

impl EnrichmentCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EnrichmentState {
        &self.state
    }

    pub fn is_requesting(&self) -> bool {
        matches!(self.state, EnrichmentState::Requesting { .. })
    }

    /// Back to `Idle`. Called whenever the active session changes; any
    /// outstanding ticket becomes stale and its result will be discarded.
    pub fn reset(&mut self) {
        self.state = EnrichmentState::Idle;
    }

    /// Start a request for the given record. Returns `None` when a request is
    /// already in flight (single-flight suppression); the caller makes no
    /// external call in that case.
    pub fn begin(&mut self, record: &SessionRecord, kind: StudyAidKind) -> Option<EnrichmentTicket> {
        if self.is_requesting() {
            debug!("study aid request already in flight, ignoring trigger");
            return None;
        }
        self.next_seq += 1;
        let ticket = EnrichmentTicket {
            session_id: record.id.clone(),
            kind,
            seq: self.next_seq,
        };
        self.state = EnrichmentState::Requesting {
            session_id: ticket.session_id.clone(),
            kind,
            seq: ticket.seq,
        };
        Some(ticket)
    }

    /// Record the outcome of a completed request.
    ///
    /// Staleness guard: the outcome is applied only if this ticket's request
    /// is still the outstanding one and the session it was issued for is
    /// still the active one. Otherwise it is discarded and `false` is
    /// returned. Failures are terminal (`Failed`); nothing retries
    /// automatically.
    pub fn finish(
        &mut self,
        ticket: EnrichmentTicket,
        outcome: Result<String, String>,
        active_id: Option<&str>,
    ) -> bool {
        let outstanding = matches!(
            self.state,
            EnrichmentState::Requesting { seq, .. } if seq == ticket.seq
        );
        if !outstanding {
            debug!(
                "discarding enrichment result for session {}: request superseded",
                ticket.session_id
            );
            return false;
        }
        if active_id != Some(ticket.session_id.as_str()) {
            debug!(
                "discarding enrichment result for session {}: no longer active",
                ticket.session_id
            );
            self.state = EnrichmentState::Idle;
            return false;
        }

        self.state = match outcome {
            Ok(text) => EnrichmentState::Ready {
                session_id: ticket.session_id,
                kind: ticket.kind,
                text,
            },
            Err(reason) => {
                warn!(
                    "study aid generation failed for session {}: {}",
                    ticket.session_id, reason
                );
                EnrichmentState::Failed {
                    session_id: ticket.session_id,
                    reason,
                }
            }
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: &str) -> SessionRecord {
        SessionRecord::new(
            id.to_string(),
            "https://youtu.be/aaaaaaaaaaa".to_string(),
            "Focus Session".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn test_successful_generation() {
        let mut coord = EnrichmentCoordinator::new();
        let ticket = coord.begin(&record("s1"), StudyAidKind::Quiz).unwrap();
        assert!(coord.is_requesting());

        assert!(coord.finish(ticket, Ok("Q1: ...".to_string()), Some("s1")));
        match coord.state() {
            EnrichmentState::Ready { session_id, kind, text } => {
                assert_eq!(session_id, "s1");
                assert_eq!(*kind, StudyAidKind::Quiz);
                assert_eq!(text, "Q1: ...");
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_second_trigger_while_requesting_is_ignored() {
        let mut coord = EnrichmentCoordinator::new();
        let rec = record("s1");
        let ticket = coord.begin(&rec, StudyAidKind::Quiz).unwrap();
        // One external call only: the second trigger yields no ticket.
        assert!(coord.begin(&rec, StudyAidKind::Quiz).is_none());
        assert!(coord.begin(&rec, StudyAidKind::Plan).is_none());
        assert!(coord.finish(ticket, Ok("done".to_string()), Some("s1")));
    }

    #[test]
    fn test_stale_result_after_active_session_changed() {
        let mut coord = EnrichmentCoordinator::new();
        let ticket = coord.begin(&record("s1"), StudyAidKind::Summary).unwrap();

        // Active session switched to s2 while the request was in flight.
        assert!(!coord.finish(ticket, Ok("stale".to_string()), Some("s2")));
        assert_eq!(*coord.state(), EnrichmentState::Idle);
    }

    #[test]
    fn test_stale_result_after_reset() {
        let mut coord = EnrichmentCoordinator::new();
        let ticket = coord.begin(&record("s1"), StudyAidKind::Plan).unwrap();
        coord.reset();

        assert!(!coord.finish(ticket, Ok("stale".to_string()), Some("s1")));
        assert_eq!(*coord.state(), EnrichmentState::Idle);
    }

    #[test]
    fn test_old_result_does_not_clobber_newer_request() {
        let mut coord = EnrichmentCoordinator::new();
        let old = coord.begin(&record("s1"), StudyAidKind::Plan).unwrap();
        coord.reset();
        let newer = coord.begin(&record("s2"), StudyAidKind::Quiz).unwrap();

        // The old request's completion must leave the newer request running.
        assert!(!coord.finish(old, Ok("old".to_string()), Some("s2")));
        assert!(coord.is_requesting());
        assert!(coord.finish(newer, Ok("new".to_string()), Some("s2")));
    }

    #[test]
    fn test_failure_is_terminal() {
        let mut coord = EnrichmentCoordinator::new();
        let ticket = coord.begin(&record("s1"), StudyAidKind::Quiz).unwrap();
        assert!(coord.finish(ticket, Err("provider unavailable".to_string()), Some("s1")));
        match coord.state() {
            EnrichmentState::Failed { reason, .. } => {
                assert_eq!(reason, "provider unavailable");
            }
            other => panic!("unexpected state {:?}", other),
        }
        // A new request may be started afterwards; nothing retries on its own.
        assert!(coord.begin(&record("s1"), StudyAidKind::Quiz).is_some());
    }

    #[test]
    fn test_no_active_session_discards_result() {
        let mut coord = EnrichmentCoordinator::new();
        let ticket = coord.begin(&record("s1"), StudyAidKind::Quiz).unwrap();
        assert!(!coord.finish(ticket, Ok("text".to_string()), None));
        assert_eq!(*coord.state(), EnrichmentState::Idle);
    }
}
