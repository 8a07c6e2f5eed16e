//! Pipeline orchestrator — drives one generation session through
//! sourcing, optional enrichment, normalization, scoring, and persistence,
//! emitting a progress event after every significant unit of work.
//!
//! Stage failure semantics: sourcing and persistence are mandatory (their
//! failure ends the session with a terminal `error` event); enrichment
//! degrades to the unenriched candidate set; per-lead scoring failures are
//! absorbed by the scorer. Zero sourced candidates is a successful run
//! with `total_leads: 0`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::time::{interval_at, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use apify_client::{ApifyClient, RetryPolicy};
use leadsignal_common::{Config, IcpConfig, LeadSignalError, SearchParams, SourceMethod};

use crate::events::ProgressKind;
use crate::normalize::normalize;
use crate::scorer::{IcpScorer, LeadScorer};
use crate::session::{SessionHandle, SessionRegistry};
use crate::sources::{profile_refs, ApifyLeadSource, ApifyProfileEnricher, LeadSource, ProfileEnricher};
use crate::store::{LeadStore, PgLeadStore};

/// Liveness cadence while a provider call is pending.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Injected collaborator handles, shared by all concurrent runs. None of
/// them hold per-session state.
pub struct PipelineDeps {
    pub source: Arc<dyn LeadSource>,
    pub enricher: Arc<dyn ProfileEnricher>,
    pub scorer: Arc<dyn LeadScorer>,
    pub store: Arc<dyn LeadStore>,
}

#[derive(Clone)]
pub struct LeadPipeline {
    deps: Arc<PipelineDeps>,
    registry: SessionRegistry,
}

impl LeadPipeline {
    pub fn new(deps: PipelineDeps, registry: SessionRegistry) -> Self {
        Self {
            deps: Arc::new(deps),
            registry,
        }
    }

    /// Wire the production collaborators from config.
    pub fn from_config(config: &Config, pool: PgPool, registry: SessionRegistry) -> Self {
        let apify = Arc::new(ApifyClient::new(config.apify_api_key.clone()));
        let policy = RetryPolicy::default();

        Self::new(
            PipelineDeps {
                source: Arc::new(ApifyLeadSource::new(apify.clone(), policy)),
                enricher: Arc::new(ApifyProfileEnricher::new(apify, policy)),
                scorer: Arc::new(IcpScorer::new(&config.anthropic_api_key)),
                store: Arc::new(PgLeadStore::new(pool)),
            },
            registry,
        )
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Validate inputs, create a session, and spawn the run task. Returns
    /// the session id immediately; validation failure creates no session
    /// and performs no network I/O.
    pub async fn start(&self, params: SearchParams) -> Result<Uuid, LeadSignalError> {
        validate(&params)?;

        let icp = match self.deps.store.active_icp().await {
            Ok(Some(icp)) => icp,
            Ok(None) => {
                info!("No ICP configured, scoring against the default profile");
                IcpConfig::default()
            }
            Err(e) => {
                warn!(error = %e, "ICP lookup failed, scoring against the default profile");
                IcpConfig::default()
            }
        };

        let id = self.registry.create().await;
        let session = SessionHandle::new(self.registry.clone(), id);
        let deps = self.deps.clone();

        tokio::spawn(async move {
            run(deps, session, params, icp).await;
        });

        Ok(id)
    }
}

fn validate(params: &SearchParams) -> Result<(), LeadSignalError> {
    if params.role_terms.iter().all(|t| t.trim().is_empty()) {
        return Err(LeadSignalError::Validation(
            "at least one role term is required".to_string(),
        ));
    }
    if params.location_terms.iter().all(|t| t.trim().is_empty()) {
        return Err(LeadSignalError::Validation(
            "at least one location term is required".to_string(),
        ));
    }
    Ok(())
}

async fn run(deps: Arc<PipelineDeps>, session: SessionHandle, params: SearchParams, icp: IcpConfig) {
    info!(session_id = %session.id(), method = %params.method, "Pipeline run starting");
    session
        .emit(ProgressKind::Started {
            method: params.method,
        })
        .await;

    // --- Source ---
    session
        .emit(ProgressKind::SourceSearchStarted {
            message: describe_search(&params),
        })
        .await;

    let sourced = with_heartbeat(&session, "sourcing", deps.source.search(&params)).await;
    let mut candidates = match sourced {
        Ok(candidates) => candidates,
        Err(e) => {
            // Sourcing is mandatory; nothing downstream without it.
            session.fail(format!("Lead sourcing failed: {e}")).await;
            return;
        }
    };
    session
        .emit(ProgressKind::ProfilesFound {
            count: candidates.len(),
        })
        .await;

    // --- Enrich (search-derived method only; degrades, never aborts) ---
    let refs = if params.method == SourceMethod::SearchEnrich {
        profile_refs(&candidates)
    } else {
        Vec::new()
    };
    if !refs.is_empty() {
        session
            .emit(ProgressKind::EnrichmentStarted { total: refs.len() })
            .await;

        match with_heartbeat(&session, "enrichment", deps.enricher.enrich(&refs)).await {
            Ok(enriched) => {
                let total = enriched.len();
                for (i, profile) in enriched.iter().enumerate() {
                    session
                        .emit(ProgressKind::ProfileEnriched {
                            index: i + 1,
                            total,
                            name: normalize(profile, params.method).full_name,
                        })
                        .await;
                }
                if total < refs.len() {
                    session
                        .emit(ProgressKind::EnrichmentDegraded {
                            message: format!("Enriched {total} of {} profiles", refs.len()),
                            enriched: total,
                        })
                        .await;
                }
                candidates = enriched;
            }
            Err(e) => {
                warn!(session_id = %session.id(), error = %e, "Enrichment failed, continuing unenriched");
                session
                    .emit(ProgressKind::EnrichmentDegraded {
                        message: format!(
                            "Enrichment failed, continuing with unenriched search results: {e}"
                        ),
                        enriched: 0,
                    })
                    .await;
            }
        }
    }

    // --- Normalize ---
    session
        .emit(ProgressKind::ProcessingStarted {
            total: candidates.len(),
        })
        .await;
    let mut leads: Vec<_> = candidates
        .iter()
        .map(|c| normalize(c, params.method))
        .collect();

    // --- Score ---
    session
        .emit(ProgressKind::ScoringStarted { total: leads.len() })
        .await;
    deps.scorer.score_batch(&mut leads, &icp, &session).await;

    // --- Persist ---
    session
        .emit(ProgressKind::PersistingStarted { count: leads.len() })
        .await;
    if let Err(e) = deps.store.save_batch(session.id(), &leads).await {
        // A run whose results cannot be saved is a failed run; the caller
        // has no other way to retrieve the leads.
        session.fail(format!("Failed to persist leads: {e}")).await;
        return;
    }
    session
        .emit(ProgressKind::PersistingCompleted { count: leads.len() })
        .await;

    info!(session_id = %session.id(), total = leads.len(), "Pipeline run completed");
    session
        .emit(ProgressKind::Completed {
            total_leads: leads.len(),
            message: format!("Generated {} leads", leads.len()),
        })
        .await;
}

fn describe_search(params: &SearchParams) -> String {
    format!(
        "Searching for {} in {}",
        params.role_terms.join(", "),
        params.location_terms.join(", ")
    )
}

/// Drive a provider future while appending heartbeat events on a fixed
/// tick, so a polling client always observes liveness during long waits.
async fn with_heartbeat<T>(
    session: &SessionHandle,
    stage: &str,
    fut: impl Future<Output = T>,
) -> T {
    tokio::pin!(fut);
    let mut ticker = interval_at(Instant::now() + HEARTBEAT_INTERVAL, HEARTBEAT_INTERVAL);

    loop {
        tokio::select! {
            out = &mut fut => return out,
            _ = ticker.tick() => {
                session
                    .emit(ProgressKind::Heartbeat {
                        stage: stage.to_string(),
                    })
                    .await;
            }
        }
    }
}
