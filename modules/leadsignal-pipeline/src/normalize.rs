//! Profile normalizer — maps provider-native scrape records into the
//! canonical lead shape.
//!
//! Raw records arrive loosely typed and with field names that vary by
//! actor (Apollo-style snake_case, LinkedIn-scraper camelCase, nested
//! organization objects). Normalization is total: missing fields become
//! empty strings, never errors, and downstream scoring deprioritizes thin
//! records.

use serde_json::Value;

use leadsignal_common::{LeadScore, NormalizedLead, SourceMethod};

/// Normalize one raw scrape record. Pure, total, and idempotent over its
/// own serialized output.
pub fn normalize(raw: &Value, method: SourceMethod) -> NormalizedLead {
    let first_name = str_at(raw, &["first_name", "firstName", "first"]);
    let last_name = str_at(raw, &["last_name", "lastName", "last"]);

    let mut full_name = str_at(raw, &["full_name", "name", "fullName"]);
    if full_name.is_empty() {
        full_name = format!("{first_name} {last_name}").trim().to_string();
    }

    let company_size = {
        let s = str_at(raw, &["company_size", "companySize"]);
        if s.is_empty() {
            num_at(
                raw,
                &[
                    "/organization/estimated_num_employees",
                    "estimated_num_employees",
                    "employees",
                ],
            )
            .map(size_bucket)
            .unwrap_or_default()
        } else {
            s
        }
    };

    let mut company_location = str_at(
        raw,
        &[
            "company_location",
            "/organization/location",
            "location",
            "addressWithCountry",
        ],
    );
    if company_location.is_empty() {
        let parts: Vec<String> = ["city", "state", "country"]
            .into_iter()
            .map(|k| str_at(raw, &[k]))
            .filter(|s| !s.is_empty())
            .collect();
        company_location = parts.join(", ");
    }

    NormalizedLead {
        first_name,
        last_name,
        full_name,
        email: str_at(raw, &["email", "email_address", "emailAddress"]),
        title: str_at(raw, &["title", "headline", "job_title", "jobTitle", "position"]),
        seniority: str_at(raw, &["seniority"]),
        company_name: str_at(
            raw,
            &["company_name", "/organization/name", "companyName", "company"],
        ),
        company_industry: str_at(
            raw,
            &["company_industry", "/organization/industry", "industry"],
        ),
        company_size,
        company_location,
        profile_url: str_at(
            raw,
            &[
                "profile_url",
                "linkedin_url",
                "linkedinUrl",
                "profileUrl",
                "url",
            ],
        ),
        source_method: method,
        score: raw
            .get("score")
            .and_then(|v| serde_json::from_value::<LeadScore>(v.clone()).ok()),
    }
}

/// First non-empty string at any of the given keys. Keys starting with `/`
/// are JSON pointers into nested objects.
fn str_at(raw: &Value, keys: &[&str]) -> String {
    for key in keys {
        let found = if key.starts_with('/') {
            raw.pointer(key)
        } else {
            raw.get(key)
        };
        if let Some(Value::String(s)) = found {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }
    String::new()
}

/// First numeric value at any of the given keys.
fn num_at(raw: &Value, keys: &[&str]) -> Option<u64> {
    for key in keys {
        let found = if key.starts_with('/') {
            raw.pointer(key)
        } else {
            raw.get(key)
        };
        if let Some(n) = found.and_then(Value::as_u64) {
            return Some(n);
        }
    }
    None
}

/// Map an employee count to the bucket vocabulary used in search filters.
fn size_bucket(employees: u64) -> String {
    let bucket = match employees {
        0..=10 => "1-10",
        11..=50 => "11-50",
        51..=200 => "51-200",
        201..=1000 => "201-1000",
        1001..=5000 => "1001-5000",
        _ => "5001+",
    };
    bucket.to_string()
}
