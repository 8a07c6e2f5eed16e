pub mod error;
pub mod types;

pub use error::{ApifyError, Result};
pub use types::{
    ApiResponse, GoogleSearchInput, GoogleSearchPage, LeadSearchInput, OrganicResult,
    ProfileEnrichInput, RetryPolicy, RunData,
};

use serde::de::DeserializeOwned;
use serde::Serialize;

const BASE_URL: &str = "https://api.apify.com/v2";

/// Actor ID for code_crafter/apollo-io-scraper.
const LEAD_SEARCH_SCRAPER: &str = "jXjMwDp6yQdNBqWRY";

/// Actor ID for apify/google-search-scraper.
const GOOGLE_SEARCH_SCRAPER: &str = "nFJndFXA5zjCTuudP";

/// Actor ID for dev_fusion/linkedin-profile-scraper.
const PROFILE_DETAIL_SCRAPER: &str = "2SyF0bVxmgGr8IVCZ";

pub struct ApifyClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl ApifyClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    /// Start an actor run. Returns immediately with run metadata.
    pub async fn start_actor_run<I: Serialize>(&self, actor_id: &str, input: &I) -> Result<RunData> {
        let url = format!("{}/acts/{}/runs", self.base_url, actor_id);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let api_resp: ApiResponse<RunData> = resp.json().await?;
        Ok(api_resp.data)
    }

    /// Fetch current run metadata without waiting.
    pub async fn run_status(&self, run_id: &str) -> Result<RunData> {
        let url = format!("{}/actor-runs/{}", self.base_url, run_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let api_resp: ApiResponse<RunData> = resp.json().await?;
        Ok(api_resp.data)
    }

    /// Poll a run until it reaches a terminal state, bounded by the policy.
    /// Exceeding the attempt bound is `Timeout`; the provider reporting
    /// FAILED/ABORTED/TIMED-OUT is `RunFailed`. Neither is retryable here.
    pub async fn poll_run(&self, run_id: &str, policy: &RetryPolicy) -> Result<RunData> {
        for attempt in 0..policy.max_attempts {
            let run = self.run_status(run_id).await?;
            match run.status.as_str() {
                "SUCCEEDED" => return Ok(run),
                "FAILED" | "ABORTED" | "TIMED-OUT" => {
                    return Err(ApifyError::RunFailed(run.status));
                }
                _ => {
                    tracing::debug!(
                        run_id,
                        status = %run.status,
                        attempt = attempt + 1,
                        "Run still in progress"
                    );
                    tokio::time::sleep(policy.interval).await;
                }
            }
        }

        Err(ApifyError::Timeout {
            attempts: policy.max_attempts,
        })
    }

    /// Fetch dataset items from a completed run. An empty dataset is valid.
    pub async fn dataset_items<T: DeserializeOwned>(&self, dataset_id: &str) -> Result<Vec<T>> {
        let url = format!(
            "{}/datasets/{}/items?format=json",
            self.base_url, dataset_id
        );
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let items: Vec<T> = resp.json().await?;
        Ok(items)
    }

    /// Structured lead search end-to-end: start run, poll, fetch raw records.
    /// Records are returned in provider-native shape for downstream
    /// normalization.
    pub async fn search_leads(
        &self,
        input: &LeadSearchInput,
        policy: &RetryPolicy,
    ) -> Result<Vec<serde_json::Value>> {
        tracing::info!(
            titles = input.person_titles.len(),
            locations = input.person_locations.len(),
            limit = input.total_records,
            "Starting lead search run"
        );

        let run = self.start_actor_run(LEAD_SEARCH_SCRAPER, input).await?;
        tracing::info!(run_id = %run.id, "Apify run started, polling for completion");

        let completed = self.poll_run(&run.id, policy).await?;
        let records: Vec<serde_json::Value> =
            self.dataset_items(&completed.default_dataset_id).await?;
        tracing::info!(count = records.len(), "Fetched lead records");

        Ok(records)
    }

    /// Web-search profile discovery end-to-end: start run, poll, fetch the
    /// organic results of every search page.
    pub async fn search_profiles(
        &self,
        queries: &[String],
        results_per_page: u32,
        policy: &RetryPolicy,
    ) -> Result<Vec<OrganicResult>> {
        let input = GoogleSearchInput {
            queries: queries.join("\n"),
            results_per_page,
            max_pages_per_query: 1,
        };

        tracing::info!(queries = queries.len(), "Starting profile discovery run");

        let run = self.start_actor_run(GOOGLE_SEARCH_SCRAPER, &input).await?;
        tracing::info!(run_id = %run.id, "Apify run started, polling for completion");

        let completed = self.poll_run(&run.id, policy).await?;
        let pages: Vec<GoogleSearchPage> =
            self.dataset_items(&completed.default_dataset_id).await?;

        let results: Vec<OrganicResult> = pages
            .into_iter()
            .flat_map(|p| p.organic_results)
            .collect();
        tracing::info!(count = results.len(), "Fetched profile search results");

        Ok(results)
    }

    /// Profile enrichment end-to-end: start run, poll, fetch raw profiles.
    pub async fn enrich_profiles(
        &self,
        profile_urls: &[String],
        policy: &RetryPolicy,
    ) -> Result<Vec<serde_json::Value>> {
        let input = ProfileEnrichInput {
            profile_urls: profile_urls.to_vec(),
        };

        tracing::info!(profiles = profile_urls.len(), "Starting enrichment run");

        let run = self.start_actor_run(PROFILE_DETAIL_SCRAPER, &input).await?;
        tracing::info!(run_id = %run.id, "Apify run started, polling for completion");

        let completed = self.poll_run(&run.id, policy).await?;
        let profiles: Vec<serde_json::Value> =
            self.dataset_items(&completed.default_dataset_id).await?;
        tracing::info!(count = profiles.len(), "Fetched enriched profiles");

        Ok(profiles)
    }
}
