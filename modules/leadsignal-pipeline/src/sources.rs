//! Sourcing and enrichment seams over the Apify actors.
//!
//! Both collaborators share the submit / poll-until-terminal / fetch shape
//! and the same `RetryPolicy`; the orchestrator decides what a timeout or
//! job failure means for the session.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use apify_client::{ApifyClient, LeadSearchInput, RetryPolicy};
use leadsignal_common::{SearchParams, SourceMethod};

/// Sources raw candidate records for a run.
#[async_trait]
pub trait LeadSource: Send + Sync {
    async fn search(&self, params: &SearchParams) -> apify_client::Result<Vec<Value>>;
}

/// Enriches discovered profile references into full records.
#[async_trait]
pub trait ProfileEnricher: Send + Sync {
    async fn enrich(&self, profile_urls: &[String]) -> apify_client::Result<Vec<Value>>;
}

pub struct ApifyLeadSource {
    client: Arc<ApifyClient>,
    policy: RetryPolicy,
}

impl ApifyLeadSource {
    pub fn new(client: Arc<ApifyClient>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }
}

#[async_trait]
impl LeadSource for ApifyLeadSource {
    async fn search(&self, params: &SearchParams) -> apify_client::Result<Vec<Value>> {
        match params.method {
            SourceMethod::Broker => {
                let input = LeadSearchInput {
                    person_titles: params.role_terms.clone(),
                    person_locations: params.location_terms.clone(),
                    organization_industries: params.industry_terms.clone(),
                    organization_num_employees_ranges: params.company_size_buckets.clone(),
                    total_records: params.result_limit(),
                };
                self.client.search_leads(&input, &self.policy).await
            }
            SourceMethod::SearchEnrich => {
                let queries = profile_search_queries(params);
                let results = self
                    .client
                    .search_profiles(&queries, params.result_limit(), &self.policy)
                    .await?;
                // Loose candidate shape; the normalizer owns field mapping.
                Ok(results
                    .into_iter()
                    .map(|r| {
                        serde_json::json!({
                            "name": r.title,
                            "url": r.url,
                            "headline": r.description,
                        })
                    })
                    .collect())
            }
        }
    }
}

pub struct ApifyProfileEnricher {
    client: Arc<ApifyClient>,
    policy: RetryPolicy,
}

impl ApifyProfileEnricher {
    pub fn new(client: Arc<ApifyClient>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }
}

#[async_trait]
impl ProfileEnricher for ApifyProfileEnricher {
    async fn enrich(&self, profile_urls: &[String]) -> apify_client::Result<Vec<Value>> {
        self.client.enrich_profiles(profile_urls, &self.policy).await
    }
}

/// One search-engine query per role/location pair, restricted to public
/// profile pages.
fn profile_search_queries(params: &SearchParams) -> Vec<String> {
    let industries = if params.industry_terms.is_empty() {
        String::new()
    } else {
        format!(" {}", params.industry_terms.join(" "))
    };

    let mut queries = Vec::new();
    for role in &params.role_terms {
        for location in &params.location_terms {
            queries.push(format!(
                "site:linkedin.com/in \"{role}\" \"{location}\"{industries}"
            ));
        }
    }
    queries
}

/// Pull enrichable profile URLs out of discovered candidates. Only
/// well-formed http(s) profile links survive.
pub fn profile_refs(candidates: &[Value]) -> Vec<String> {
    let refs: Vec<String> = candidates
        .iter()
        .filter_map(|c| c.get("url").and_then(Value::as_str))
        .filter(|raw| {
            url::Url::parse(raw)
                .map(|u| {
                    (u.scheme() == "http" || u.scheme() == "https")
                        && u.path().starts_with("/in/")
                })
                .unwrap_or(false)
        })
        .map(str::to_string)
        .collect();

    debug!(total = candidates.len(), usable = refs.len(), "Extracted profile refs");
    refs
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn queries_cover_role_location_pairs() {
        let params = SearchParams {
            method: SourceMethod::SearchEnrich,
            role_terms: vec!["COO".to_string(), "VP Ops".to_string()],
            location_terms: vec!["Texas".to_string()],
            industry_terms: Vec::new(),
            company_size_buckets: Vec::new(),
            result_limit: None,
        };

        let queries = profile_search_queries(&params);
        assert_eq!(queries.len(), 2);
        assert!(queries[0].contains("site:linkedin.com/in"));
        assert!(queries[0].contains("\"COO\""));
        assert!(queries[0].contains("\"Texas\""));
    }

    #[test]
    fn profile_refs_keep_only_valid_profile_urls() {
        let candidates = vec![
            json!({"url": "https://www.linkedin.com/in/jane-doe"}),
            json!({"url": "https://example.com/pricing"}),
            json!({"url": "not a url"}),
            json!({"name": "no url at all"}),
        ];

        let refs = profile_refs(&candidates);
        assert_eq!(refs, vec!["https://www.linkedin.com/in/jane-doe"]);
    }
}
