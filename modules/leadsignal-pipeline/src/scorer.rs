//! ICP scorer — one model call per lead, absorb-and-continue on failure.
//!
//! Scoring is best-effort enrichment: any failure (transport, non-JSON
//! response, missing keys, unknown grade) yields the default failure score
//! instead of propagating, so a single bad item never aborts the batch.

use std::sync::{Arc, OnceLock};

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use ai_client::util::strip_code_blocks;
use ai_client::Claude;
use leadsignal_common::{Grade, IcpConfig, LeadScore, NormalizedLead};

use crate::events::ProgressKind;
use crate::session::SessionHandle;

const SCORING_MODEL: &str = "claude-haiku-4-5-20251001";

const SCORING_SYSTEM_PROMPT: &str = "You are a sales development analyst. You score sales \
prospects against an Ideal Customer Profile and respond with a single JSON object only, \
no prose and no markdown fences.";

const SCORING_PROMPT_TEMPLATE: &str = r#"Score this prospect against the Ideal Customer Profile.

## Ideal Customer Profile: {{icp_name}}
Target industries ({{weight_industry}}% of score): {{target_industries}}
Target titles ({{weight_title}}% of score): {{target_titles}}
Target company sizes ({{weight_company_size}}% of score): {{target_company_sizes}}
Target locations ({{weight_location}}% of score): {{target_locations}}

## Prospect
Name: {{lead_name}}
Title: {{lead_title}}
Seniority: {{lead_seniority}}
Company: {{lead_company}}
Industry: {{lead_industry}}
Company size: {{lead_company_size}}
Location: {{lead_location}}

Respond with exactly this JSON shape:
{"score": <integer 0-100>, "grade": "<A+|A|B+|B|C+|C|D+|D>", "rationale": "<one or two sentences>"}"#;

/// Substitute `{{name}}` placeholders. Placeholders with no corresponding
/// value are swept to empty string, never left literal.
pub fn render_prompt(template: &str, vars: &[(&str, String)]) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }

    let re = PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{[a-z_]+\}\}").expect("placeholder regex"));
    re.replace_all(&out, "").into_owned()
}

/// Single-shot prompt-in / text-out seam over the scoring model.
#[async_trait]
pub trait ScoreModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

#[async_trait]
impl ScoreModel for Claude {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.chat_completion(system, user).await
    }
}

/// Batch-facing scoring strategy consumed by the orchestrator. Sequential
/// by default to keep provider rate limits predictable; a replacement
/// implementation may parallelize with a bounded limit without the state
/// machine changing.
#[async_trait]
pub trait LeadScorer: Send + Sync {
    /// Score one lead. Never fails; failures become the default score.
    async fn score(&self, lead: &NormalizedLead, icp: &IcpConfig) -> LeadScore;

    /// Score a batch in place, emitting a `lead_scored` event after each
    /// lead so a client polling mid-batch sees incremental progress.
    async fn score_batch(
        &self,
        leads: &mut [NormalizedLead],
        icp: &IcpConfig,
        session: &SessionHandle,
    ) {
        let total = leads.len();
        for (i, lead) in leads.iter_mut().enumerate() {
            let score = self.score(lead, icp).await;
            session
                .emit(ProgressKind::LeadScored {
                    index: i + 1,
                    total,
                    name: lead.full_name.clone(),
                    score: score.score,
                    grade: score.grade,
                })
                .await;
            lead.score = Some(score);
        }
    }
}

/// What the scoring model returns for one lead.
#[derive(Debug, Deserialize)]
struct ScoreResponse {
    score: f64,
    grade: String,
    rationale: String,
}

pub struct IcpScorer {
    model: Arc<dyn ScoreModel>,
}

impl IcpScorer {
    pub fn new(anthropic_api_key: &str) -> Self {
        Self {
            model: Arc::new(Claude::new(anthropic_api_key, SCORING_MODEL)),
        }
    }

    /// Build over any model seam (used by tests with a fake).
    pub fn with_model(model: Arc<dyn ScoreModel>) -> Self {
        Self { model }
    }

    fn render(lead: &NormalizedLead, icp: &IcpConfig) -> String {
        let vars = [
            ("icp_name", icp.name.clone()),
            ("weight_industry", icp.weights.industry.to_string()),
            ("weight_title", icp.weights.title.to_string()),
            ("weight_company_size", icp.weights.company_size.to_string()),
            ("weight_location", icp.weights.location.to_string()),
            ("target_industries", icp.target_industries.join(", ")),
            ("target_titles", icp.target_titles.join(", ")),
            ("target_company_sizes", icp.target_company_sizes.join(", ")),
            ("target_locations", icp.target_locations.join(", ")),
            ("lead_name", lead.full_name.clone()),
            ("lead_title", lead.title.clone()),
            ("lead_seniority", lead.seniority.clone()),
            ("lead_company", lead.company_name.clone()),
            ("lead_industry", lead.company_industry.clone()),
            ("lead_company_size", lead.company_size.clone()),
            ("lead_location", lead.company_location.clone()),
        ];
        render_prompt(SCORING_PROMPT_TEMPLATE, &vars)
    }

    /// Defensive parse of the model response. Any shape problem is None,
    /// which the caller turns into the default failure score.
    fn parse_score(raw: &str) -> Option<LeadScore> {
        let body = strip_code_blocks(raw);
        let response: ScoreResponse = serde_json::from_str(body).ok()?;

        let score = response.score.clamp(0.0, 100.0).round() as u8;
        let grade = Grade::parse(&response.grade)?;

        Some(LeadScore {
            score,
            grade,
            rationale: response.rationale,
        })
    }
}

#[async_trait]
impl LeadScorer for IcpScorer {
    async fn score(&self, lead: &NormalizedLead, icp: &IcpConfig) -> LeadScore {
        let prompt = Self::render(lead, icp);

        match self.model.complete(SCORING_SYSTEM_PROMPT, &prompt).await {
            Ok(raw) => match Self::parse_score(&raw) {
                Some(score) => {
                    debug!(lead = %lead.full_name, score = score.score, grade = %score.grade, "Lead scored");
                    score
                }
                None => {
                    warn!(lead = %lead.full_name, "Unparseable scoring response, applying failure score");
                    LeadScore::scoring_failed()
                }
            },
            Err(e) => {
                warn!(lead = %lead.full_name, error = %e, "Scoring call failed, applying failure score");
                LeadScore::scoring_failed()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_named_placeholders() {
        let out = render_prompt(
            "Hello {{name}}, you work at {{company}}.",
            &[
                ("name", "Ada".to_string()),
                ("company", "Acme".to_string()),
            ],
        );
        assert_eq!(out, "Hello Ada, you work at Acme.");
    }

    #[test]
    fn render_sweeps_unresolved_placeholders() {
        let out = render_prompt("Industry: {{lead_industry}}.", &[]);
        assert_eq!(out, "Industry: .");
        assert!(!out.contains("{{"));
    }

    #[test]
    fn parse_accepts_plain_and_fenced_json() {
        let plain = r#"{"score": 85, "grade": "A", "rationale": "Strong fit"}"#;
        let fenced = format!("```json\n{plain}\n```");

        for raw in [plain, fenced.as_str()] {
            let score = IcpScorer::parse_score(raw).unwrap();
            assert_eq!(score.score, 85);
            assert_eq!(score.grade, Grade::A);
        }
    }

    #[test]
    fn parse_clamps_out_of_range_scores() {
        let raw = r#"{"score": 140, "grade": "A+", "rationale": "x"}"#;
        assert_eq!(IcpScorer::parse_score(raw).unwrap().score, 100);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(IcpScorer::parse_score("not json at all").is_none());
        assert!(IcpScorer::parse_score(r#"{"score": 10}"#).is_none());
        assert!(IcpScorer::parse_score(r#"{"score": 10, "grade": "Z", "rationale": "x"}"#).is_none());
    }
}
