use serde::{Deserialize, Serialize};

// --- Sourcing ---

/// How a lead entered the pipeline: a structured broker search, or a generic
/// web search followed by per-profile enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMethod {
    Broker,
    SearchEnrich,
}

impl std::fmt::Display for SourceMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceMethod::Broker => write!(f, "broker"),
            SourceMethod::SearchEnrich => write!(f, "search_enrich"),
        }
    }
}

/// Normalized search parameters supplied when a generation run starts.
/// `role_terms` and `location_terms` are required; everything else is
/// optional and omitted from provider queries when empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    pub method: SourceMethod,
    pub role_terms: Vec<String>,
    pub location_terms: Vec<String>,
    #[serde(default)]
    pub industry_terms: Vec<String>,
    #[serde(default)]
    pub company_size_buckets: Vec<String>,
    pub result_limit: Option<u32>,
}

impl SearchParams {
    /// Default cap on records requested from a provider per run.
    pub const DEFAULT_RESULT_LIMIT: u32 = 25;

    pub fn result_limit(&self) -> u32 {
        self.result_limit.unwrap_or(Self::DEFAULT_RESULT_LIMIT)
    }
}

// --- Leads ---

/// Letter grade assigned by the ICP scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "D+")]
    DPlus,
    #[serde(rename = "D")]
    D,
}

impl Grade {
    /// Parse a grade string from the scoring model. Tolerates surrounding
    /// whitespace and lowercase; anything else is None.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "A+" => Some(Grade::APlus),
            "A" => Some(Grade::A),
            "B+" => Some(Grade::BPlus),
            "B" => Some(Grade::B),
            "C+" => Some(Grade::CPlus),
            "C" => Some(Grade::C),
            "D+" => Some(Grade::DPlus),
            "D" => Some(Grade::D),
            _ => None,
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::DPlus => "D+",
            Grade::D => "D",
        };
        write!(f, "{s}")
    }
}

/// Result of scoring one lead against the ICP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadScore {
    /// 0-100 fit score.
    pub score: u8,
    pub grade: Grade,
    pub rationale: String,
}

impl LeadScore {
    /// Score applied when the model call or response parse fails, so a bad
    /// item never aborts the batch.
    pub fn scoring_failed() -> Self {
        Self {
            score: 0,
            grade: Grade::D,
            rationale: "Error during scoring".to_string(),
        }
    }
}

/// Canonical lead shape used from normalization onward. Raw scrape records
/// never leak past the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLead {
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub title: String,
    pub seniority: String,
    pub company_name: String,
    pub company_industry: String,
    pub company_size: String,
    pub company_location: String,
    pub profile_url: String,
    pub source_method: SourceMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<LeadScore>,
}

// --- ICP configuration ---

/// Relative weights (0-100) for each scoring criterion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcpWeights {
    pub industry: u8,
    pub title: u8,
    pub company_size: u8,
    pub location: u8,
}

impl Default for IcpWeights {
    fn default() -> Self {
        Self {
            industry: 30,
            title: 35,
            company_size: 20,
            location: 15,
        }
    }
}

/// Ideal Customer Profile: weighted target criteria used to render the
/// scoring prompt. Read-only to the pipeline; supplied once at session start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcpConfig {
    pub name: String,
    pub target_industries: Vec<String>,
    pub target_titles: Vec<String>,
    pub target_company_sizes: Vec<String>,
    pub target_locations: Vec<String>,
    #[serde(default)]
    pub weights: IcpWeights,
}

impl Default for IcpConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            target_industries: vec!["Software".to_string(), "Business Services".to_string()],
            target_titles: vec![
                "Operations Manager".to_string(),
                "Head of Operations".to_string(),
                "COO".to_string(),
            ],
            target_company_sizes: vec!["11-50".to_string(), "51-200".to_string()],
            target_locations: vec!["United States".to_string()],
            weights: IcpWeights::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_parse_tolerates_case_and_whitespace() {
        assert_eq!(Grade::parse(" a+ "), Some(Grade::APlus));
        assert_eq!(Grade::parse("B"), Some(Grade::B));
        assert_eq!(Grade::parse("F"), None);
        assert_eq!(Grade::parse(""), None);
    }

    #[test]
    fn grade_serde_uses_letter_forms() {
        assert_eq!(serde_json::to_string(&Grade::APlus).unwrap(), r#""A+""#);
        let g: Grade = serde_json::from_str(r#""D+""#).unwrap();
        assert_eq!(g, Grade::DPlus);
    }

    #[test]
    fn search_params_default_limit() {
        let params = SearchParams {
            method: SourceMethod::Broker,
            role_terms: vec!["CTO".to_string()],
            location_terms: vec!["Austin".to_string()],
            industry_terms: Vec::new(),
            company_size_buckets: Vec::new(),
            result_limit: None,
        };
        assert_eq!(params.result_limit(), SearchParams::DEFAULT_RESULT_LIMIT);
    }
}
