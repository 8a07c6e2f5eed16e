//! Progress events — the pollable timeline of one generation session.
//!
//! Events are append-only while a session runs; exactly one `completed` or
//! `error` event exists per session and it is always the last one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use leadsignal_common::{Grade, SourceMethod};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }
}

/// One observation of pipeline advancement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub seq: u32,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: ProgressKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressKind {
    Started {
        method: SourceMethod,
    },
    SourceSearchStarted {
        message: String,
    },
    ProfilesFound {
        count: usize,
    },
    EnrichmentStarted {
        total: usize,
    },
    ProfileEnriched {
        index: usize,
        total: usize,
        name: String,
    },
    /// Enrichment failed or partially failed; the run continues with
    /// whatever it has. Warning-flavored, not terminal.
    EnrichmentDegraded {
        message: String,
        enriched: usize,
    },
    ProcessingStarted {
        total: usize,
    },
    ScoringStarted {
        total: usize,
    },
    LeadScored {
        index: usize,
        total: usize,
        name: String,
        score: u8,
        grade: Grade,
    },
    PersistingStarted {
        count: usize,
    },
    PersistingCompleted {
        count: usize,
    },
    /// Liveness signal while a long provider call is pending.
    Heartbeat {
        stage: String,
    },
    Completed {
        total_leads: usize,
        message: String,
    },
    Error {
        message: String,
    },
}

impl ProgressKind {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressKind::Completed { .. } | ProgressKind::Error { .. })
    }

    /// Coarse overall progress fraction for this event, when one can be
    /// derived. Heartbeats carry no progress information.
    pub fn fraction(&self) -> Option<f32> {
        fn ratio(index: usize, total: usize) -> f32 {
            if total == 0 {
                1.0
            } else {
                index as f32 / total as f32
            }
        }

        match self {
            ProgressKind::Started { .. } => Some(0.02),
            ProgressKind::SourceSearchStarted { .. } => Some(0.05),
            ProgressKind::ProfilesFound { .. } => Some(0.30),
            ProgressKind::EnrichmentStarted { .. } => Some(0.30),
            ProgressKind::ProfileEnriched { index, total, .. } => {
                Some(0.30 + 0.20 * ratio(*index, *total))
            }
            ProgressKind::EnrichmentDegraded { .. } => Some(0.50),
            ProgressKind::ProcessingStarted { .. } => Some(0.52),
            ProgressKind::ScoringStarted { .. } => Some(0.55),
            ProgressKind::LeadScored { index, total, .. } => {
                Some(0.55 + 0.35 * ratio(*index, *total))
            }
            ProgressKind::PersistingStarted { .. } => Some(0.92),
            ProgressKind::PersistingCompleted { .. } => Some(0.98),
            ProgressKind::Heartbeat { .. } => None,
            ProgressKind::Completed { .. } | ProgressKind::Error { .. } => Some(1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_snake_case_tag() {
        let event = ProgressEvent {
            seq: 3,
            ts: Utc::now(),
            kind: ProgressKind::ProfilesFound { count: 7 },
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "profiles_found");
        assert_eq!(json["count"], 7);
        assert_eq!(json["seq"], 3);
    }

    #[test]
    fn terminal_kinds() {
        assert!(ProgressKind::Completed {
            total_leads: 0,
            message: String::new()
        }
        .is_terminal());
        assert!(ProgressKind::Error {
            message: String::new()
        }
        .is_terminal());
        assert!(!ProgressKind::Heartbeat {
            stage: "sourcing".to_string()
        }
        .is_terminal());
    }

    #[test]
    fn lead_scored_fraction_advances_with_index() {
        let early = ProgressKind::LeadScored {
            index: 1,
            total: 10,
            name: String::new(),
            score: 80,
            grade: Grade::A,
        };
        let late = ProgressKind::LeadScored {
            index: 10,
            total: 10,
            name: String::new(),
            score: 80,
            grade: Grade::A,
        };
        assert!(early.fraction().unwrap() < late.fraction().unwrap());
        assert!(late.fraction().unwrap() <= 0.95);
    }
}
