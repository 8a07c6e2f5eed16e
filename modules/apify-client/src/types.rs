use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Polling ---

/// How often and how long to poll an actor run for a terminal state.
/// The same policy value is reused by lead sourcing and profile enrichment.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Upper bound on total time spent polling under this policy.
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

impl Default for RetryPolicy {
    /// 2s x 30 attempts, a ~60s polling ceiling.
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 30,
        }
    }
}

// --- Lead search (broker method) ---

/// Input for the code_crafter/apollo-io-scraper actor. Empty parameter
/// lists are omitted entirely so the actor never receives an empty filter.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LeadSearchInput {
    #[serde(rename = "personTitles", skip_serializing_if = "Vec::is_empty")]
    pub person_titles: Vec<String>,
    #[serde(rename = "personLocations", skip_serializing_if = "Vec::is_empty")]
    pub person_locations: Vec<String>,
    #[serde(
        rename = "organizationIndustries",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub organization_industries: Vec<String>,
    #[serde(
        rename = "organizationNumEmployeesRanges",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub organization_num_employees_ranges: Vec<String>,
    #[serde(rename = "totalRecords")]
    pub total_records: u32,
}

// --- Profile discovery (search-engine method) ---

/// Input for the apify/google-search-scraper actor.
#[derive(Debug, Clone, Serialize)]
pub struct GoogleSearchInput {
    /// Newline-separated search queries.
    pub queries: String,
    #[serde(rename = "resultsPerPage")]
    pub results_per_page: u32,
    #[serde(rename = "maxPagesPerQuery")]
    pub max_pages_per_query: u32,
}

/// One result page from the Google search actor dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleSearchPage {
    #[serde(rename = "searchQuery")]
    pub search_query: Option<serde_json::Value>,
    #[serde(rename = "organicResults", default)]
    pub organic_results: Vec<OrganicResult>,
}

/// A single organic search hit: the profile reference handed to enrichment.
#[derive(Debug, Clone, Deserialize)]
pub struct OrganicResult {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

// --- Profile enrichment ---

/// Input for the dev_fusion/linkedin-profile-scraper actor.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileEnrichInput {
    #[serde(rename = "profileUrls")]
    pub profile_urls: Vec<String>,
}

// --- Run metadata ---

/// Wrapper for Apify API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Apify actor run metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct RunData {
    pub id: String,
    pub status: String,
    #[serde(rename = "defaultDatasetId")]
    pub default_dataset_id: String,
    #[serde(rename = "startedAt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "finishedAt")]
    pub finished_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filters_are_omitted() {
        let input = LeadSearchInput {
            person_titles: vec!["Operations Manager".to_string()],
            person_locations: vec!["Texas".to_string()],
            organization_industries: Vec::new(),
            organization_num_employees_ranges: Vec::new(),
            total_records: 25,
        };

        let json = serde_json::to_value(&input).unwrap();
        let obj = json.as_object().unwrap();

        assert!(obj.contains_key("personTitles"));
        assert!(obj.contains_key("personLocations"));
        assert!(!obj.contains_key("organizationIndustries"));
        assert!(!obj.contains_key("organizationNumEmployeesRanges"));
        assert_eq!(obj["totalRecords"], 25);
    }

    #[test]
    fn default_policy_ceiling_is_one_minute() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 30);
        assert_eq!(policy.ceiling(), Duration::from_secs(60));
    }

    #[test]
    fn search_page_tolerates_missing_organic_results() {
        let page: GoogleSearchPage = serde_json::from_str(r#"{"searchQuery": "x"}"#).unwrap();
        assert!(page.organic_results.is_empty());
    }
}
