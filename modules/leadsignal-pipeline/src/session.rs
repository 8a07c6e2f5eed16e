//! Session registry — the one shared mutable structure in the pipeline.
//!
//! Writes come only from the single orchestrator task owning a session id;
//! reads happen concurrently through copy-on-read snapshots. A session is
//! inserted before its id is ever handed out, so a freshly returned id is
//! always queryable even if the first poll races the run task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::events::{ProgressEvent, ProgressKind, SessionStatus};

/// Resident-session ceiling. Terminal sessions are evicted oldest-first when
/// the registry grows past this; running sessions are never evicted.
const MAX_RESIDENT_SESSIONS: usize = 1000;

#[derive(Debug, Clone)]
struct Session {
    status: SessionStatus,
    created_at: DateTime<Utc>,
    last_updated_at: DateTime<Utc>,
    seq: u32,
    events: Vec<ProgressEvent>,
}

impl Session {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            status: SessionStatus::Running,
            created_at: now,
            last_updated_at: now,
            seq: 0,
            events: Vec::new(),
        }
    }
}

/// Consistent point-in-time view of one session, as returned to pollers.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    /// Overall progress derived from the latest countable event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f32>,
    /// Rough remaining-time estimate, only while running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<u64>,
    pub events: Vec<ProgressEvent>,
}

#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
    ttl: Duration,
}

impl SessionRegistry {
    /// `ttl` bounds how long a terminal session stays resident.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Create a session and return its id. The session is resident and
    /// pollable before this returns.
    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let mut sessions = self.inner.write().await;

        if sessions.len() >= MAX_RESIDENT_SESSIONS {
            evict_oldest_terminal(&mut sessions);
        }
        sessions.insert(id, Session::new(Utc::now()));

        debug!(session_id = %id, "Session created");
        id
    }

    /// Append an event to a running session. Events arriving after a
    /// terminal event are dropped; a terminal event flips the status.
    pub async fn append(&self, id: Uuid, kind: ProgressKind) {
        let mut sessions = self.inner.write().await;
        let Some(session) = sessions.get_mut(&id) else {
            warn!(session_id = %id, "Append to unknown session dropped");
            return;
        };
        if session.status.is_terminal() {
            warn!(session_id = %id, "Event after terminal state dropped");
            return;
        }

        let now = Utc::now();
        match kind {
            ProgressKind::Completed { .. } => session.status = SessionStatus::Completed,
            ProgressKind::Error { .. } => session.status = SessionStatus::Failed,
            _ => {}
        }
        session.events.push(ProgressEvent {
            seq: session.seq,
            ts: now,
            kind,
        });
        session.seq += 1;
        session.last_updated_at = now;
    }

    /// Copy-on-read snapshot. `None` is the first-class not-found outcome
    /// for unknown or evicted session ids.
    pub async fn snapshot(&self, id: Uuid) -> Option<SessionSnapshot> {
        let sessions = self.inner.read().await;
        let session = sessions.get(&id)?;

        let progress = session
            .events
            .iter()
            .rev()
            .find_map(|e| e.kind.fraction());
        let eta_seconds = match (session.status, progress) {
            (SessionStatus::Running, Some(f)) if f > 0.0 && f < 1.0 => {
                let elapsed = (Utc::now() - session.created_at).num_seconds().max(0) as f32;
                Some((elapsed * (1.0 - f) / f) as u64)
            }
            _ => None,
        };

        Some(SessionSnapshot {
            session_id: id,
            status: session.status,
            created_at: session.created_at,
            last_updated_at: session.last_updated_at,
            progress,
            eta_seconds,
            events: session.events.clone(),
        })
    }

    /// Drop terminal sessions older than the retention window.
    /// Returns how many were evicted.
    pub async fn evict_expired(&self) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::hours(1));
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !(s.status.is_terminal() && s.last_updated_at < cutoff));
        before - sessions.len()
    }

    /// Start the background eviction sweeper.
    pub fn spawn_eviction_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await; // first tick is immediate
            loop {
                ticker.tick().await;
                let evicted = registry.evict_expired().await;
                if evicted > 0 {
                    info!(evicted, "Evicted expired sessions");
                }
            }
        })
    }
}

fn evict_oldest_terminal(sessions: &mut HashMap<Uuid, Session>) {
    let oldest = sessions
        .iter()
        .filter(|(_, s)| s.status.is_terminal())
        .min_by_key(|(_, s)| s.last_updated_at)
        .map(|(id, _)| *id);
    if let Some(id) = oldest {
        sessions.remove(&id);
        warn!(session_id = %id, "Session cap reached, evicted oldest terminal session");
    }
}

/// Write handle for the one task driving a session: the registry plus the
/// owned session id. Collaborators that report progress receive this.
#[derive(Clone)]
pub struct SessionHandle {
    registry: SessionRegistry,
    id: Uuid,
}

impl SessionHandle {
    pub fn new(registry: SessionRegistry, id: Uuid) -> Self {
        Self { registry, id }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn emit(&self, kind: ProgressKind) {
        self.registry.append(self.id, kind).await;
    }

    /// Terminal failure: emits the `error` event that ends the session.
    pub async fn fail(&self, message: String) {
        tracing::error!(session_id = %self.id, message, "Pipeline run failed");
        self.emit(ProgressKind::Error { message }).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(n: usize) -> ProgressKind {
        ProgressKind::ProfilesFound { count: n }
    }

    #[tokio::test]
    async fn created_session_is_immediately_queryable() {
        let registry = SessionRegistry::new(Duration::from_secs(3600));
        let id = registry.create().await;

        let snapshot = registry.snapshot(id).await.expect("session must exist");
        assert_eq!(snapshot.status, SessionStatus::Running);
        assert!(snapshot.events.is_empty());
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let registry = SessionRegistry::new(Duration::from_secs(3600));
        assert!(registry.snapshot(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn events_are_sequenced_in_order() {
        let registry = SessionRegistry::new(Duration::from_secs(3600));
        let id = registry.create().await;

        for n in 0..5 {
            registry.append(id, kind(n)).await;
        }

        let snapshot = registry.snapshot(id).await.unwrap();
        let seqs: Vec<u32> = snapshot.events.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn appends_after_terminal_are_dropped() {
        let registry = SessionRegistry::new(Duration::from_secs(3600));
        let id = registry.create().await;

        registry
            .append(
                id,
                ProgressKind::Error {
                    message: "boom".to_string(),
                },
            )
            .await;
        registry.append(id, kind(1)).await;

        let snapshot = registry.snapshot(id).await.unwrap();
        assert_eq!(snapshot.status, SessionStatus::Failed);
        assert_eq!(snapshot.events.len(), 1);
        assert!(snapshot.events.last().unwrap().kind.is_terminal());
    }

    #[tokio::test]
    async fn snapshot_is_a_prefix_of_later_snapshot() {
        let registry = SessionRegistry::new(Duration::from_secs(3600));
        let id = registry.create().await;

        registry.append(id, kind(1)).await;
        let early = registry.snapshot(id).await.unwrap();

        registry.append(id, kind(2)).await;
        registry.append(id, kind(3)).await;
        let late = registry.snapshot(id).await.unwrap();

        assert!(early.events.len() <= late.events.len());
        assert_eq!(
            early.events[..],
            late.events[..early.events.len()],
            "earlier snapshot must be a prefix of the later one"
        );
    }

    #[tokio::test]
    async fn eviction_removes_only_old_terminal_sessions() {
        let registry = SessionRegistry::new(Duration::from_secs(0));
        let terminal = registry.create().await;
        let running = registry.create().await;

        registry
            .append(
                terminal,
                ProgressKind::Completed {
                    total_leads: 0,
                    message: "done".to_string(),
                },
            )
            .await;

        let evicted = registry.evict_expired().await;
        assert_eq!(evicted, 1);
        assert!(registry.snapshot(terminal).await.is_none());
        assert!(registry.snapshot(running).await.is_some());
    }
}
