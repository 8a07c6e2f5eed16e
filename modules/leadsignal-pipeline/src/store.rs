//! Persistence collaborator — whole-batch lead writes and the ICP read.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE leads (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     session_id UUID NOT NULL,
//!     first_name TEXT NOT NULL DEFAULT '',
//!     last_name TEXT NOT NULL DEFAULT '',
//!     full_name TEXT NOT NULL DEFAULT '',
//!     email TEXT NOT NULL DEFAULT '',
//!     title TEXT NOT NULL DEFAULT '',
//!     seniority TEXT NOT NULL DEFAULT '',
//!     company_name TEXT NOT NULL DEFAULT '',
//!     company_industry TEXT NOT NULL DEFAULT '',
//!     company_size TEXT NOT NULL DEFAULT '',
//!     company_location TEXT NOT NULL DEFAULT '',
//!     profile_url TEXT NOT NULL DEFAULT '',
//!     source_method TEXT NOT NULL,
//!     score INT,
//!     grade TEXT,
//!     rationale TEXT,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT now()
//! );
//!
//! CREATE TABLE icp_configs (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     config JSONB NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
//! );
//! ```

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use leadsignal_common::{IcpConfig, NormalizedLead};

/// Storage boundary for the pipeline. The batch persists or fails as a
/// whole; no partial-batch semantics.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn save_batch(&self, session_id: Uuid, leads: &[NormalizedLead]) -> Result<()>;

    /// Most recently updated ICP configuration, if any has been saved.
    async fn active_icp(&self) -> Result<Option<IcpConfig>>;
}

pub struct PgLeadStore {
    pool: PgPool,
}

impl PgLeadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadStore for PgLeadStore {
    async fn save_batch(&self, session_id: Uuid, leads: &[NormalizedLead]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for lead in leads {
            sqlx::query(
                r#"
                INSERT INTO leads (
                    session_id, first_name, last_name, full_name, email,
                    title, seniority, company_name, company_industry,
                    company_size, company_location, profile_url,
                    source_method, score, grade, rationale
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
                "#,
            )
            .bind(session_id)
            .bind(&lead.first_name)
            .bind(&lead.last_name)
            .bind(&lead.full_name)
            .bind(&lead.email)
            .bind(&lead.title)
            .bind(&lead.seniority)
            .bind(&lead.company_name)
            .bind(&lead.company_industry)
            .bind(&lead.company_size)
            .bind(&lead.company_location)
            .bind(&lead.profile_url)
            .bind(lead.source_method.to_string())
            .bind(lead.score.as_ref().map(|s| s.score as i32))
            .bind(lead.score.as_ref().map(|s| s.grade.to_string()))
            .bind(lead.score.as_ref().map(|s| s.rationale.clone()))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(session_id = %session_id, count = leads.len(), "Persisted lead batch");
        Ok(())
    }

    async fn active_icp(&self) -> Result<Option<IcpConfig>> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT config FROM icp_configs ORDER BY updated_at DESC LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((config,)) => Ok(Some(serde_json::from_value(config)?)),
            None => Ok(None),
        }
    }
}
