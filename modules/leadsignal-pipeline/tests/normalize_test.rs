//! Normalizer tests: provider-native JSON shapes → NormalizedLead.
//!
//! Each test: hand-craft a raw record → normalize() → assert. No I/O.

use serde_json::json;

use leadsignal_common::SourceMethod;
use leadsignal_pipeline::normalize::normalize;

#[test]
fn apollo_shape_maps_to_canonical_fields() {
    let raw = json!({
        "first_name": "Jane",
        "last_name": "Doe",
        "email": "jane@acme.com",
        "title": "Operations Manager",
        "seniority": "manager",
        "organization": {
            "name": "Acme",
            "industry": "Software",
            "estimated_num_employees": 120,
            "location": "Austin, Texas"
        },
        "linkedin_url": "https://www.linkedin.com/in/jane-doe"
    });

    let lead = normalize(&raw, SourceMethod::Broker);

    assert_eq!(lead.first_name, "Jane");
    assert_eq!(lead.full_name, "Jane Doe");
    assert_eq!(lead.email, "jane@acme.com");
    assert_eq!(lead.title, "Operations Manager");
    assert_eq!(lead.company_name, "Acme");
    assert_eq!(lead.company_industry, "Software");
    assert_eq!(lead.company_size, "51-200");
    assert_eq!(lead.company_location, "Austin, Texas");
    assert_eq!(lead.profile_url, "https://www.linkedin.com/in/jane-doe");
    assert_eq!(lead.source_method, SourceMethod::Broker);
    assert!(lead.score.is_none());
}

#[test]
fn linkedin_scraper_shape_maps_to_canonical_fields() {
    let raw = json!({
        "firstName": "John",
        "lastName": "Smith",
        "headline": "COO at Globex",
        "companyName": "Globex",
        "companySize": "201-1000",
        "addressWithCountry": "Dallas, Texas, United States",
        "linkedinUrl": "https://www.linkedin.com/in/john-smith"
    });

    let lead = normalize(&raw, SourceMethod::SearchEnrich);

    assert_eq!(lead.full_name, "John Smith");
    assert_eq!(lead.title, "COO at Globex");
    assert_eq!(lead.company_name, "Globex");
    assert_eq!(lead.company_size, "201-1000");
    assert_eq!(lead.company_location, "Dallas, Texas, United States");
    assert_eq!(lead.source_method, SourceMethod::SearchEnrich);
}

#[test]
fn empty_record_normalizes_without_error() {
    let lead = normalize(&json!({}), SourceMethod::Broker);

    assert_eq!(lead.first_name, "");
    assert_eq!(lead.full_name, "");
    assert_eq!(lead.email, "");
    assert_eq!(lead.company_name, "");
    assert!(lead.score.is_none());
}

#[test]
fn full_name_composes_from_a_single_name_part() {
    let only_first = normalize(&json!({"first_name": "Jane"}), SourceMethod::Broker);
    assert_eq!(only_first.full_name, "Jane");

    let only_last = normalize(&json!({"last_name": "Doe"}), SourceMethod::Broker);
    assert_eq!(only_last.full_name, "Doe");
}

#[test]
fn pre_joined_full_name_wins_over_composition() {
    let raw = json!({"name": "Dr. Jane Doe", "first_name": "Jane", "last_name": "Doe"});
    let lead = normalize(&raw, SourceMethod::Broker);
    assert_eq!(lead.full_name, "Dr. Jane Doe");
}

#[test]
fn city_state_country_compose_when_no_location_field() {
    let raw = json!({"city": "Austin", "state": "Texas", "country": "United States"});
    let lead = normalize(&raw, SourceMethod::Broker);
    assert_eq!(lead.company_location, "Austin, Texas, United States");
}

#[test]
fn normalization_is_idempotent() {
    let raws = vec![
        json!({
            "first_name": "Jane",
            "last_name": "Doe",
            "title": "Operations Manager",
            "organization": {"name": "Acme", "estimated_num_employees": 7}
        }),
        json!({"firstName": "John", "companyName": "Globex"}),
        json!({}),
    ];

    for raw in raws {
        let once = normalize(&raw, SourceMethod::Broker);
        let reserialized = serde_json::to_value(&once).unwrap();
        let twice = normalize(&reserialized, SourceMethod::Broker);
        assert_eq!(once, twice, "normalize(normalize(x)) must equal normalize(x)");
    }
}

#[test]
fn scoring_fields_survive_renormalization() {
    let raw = json!({
        "full_name": "Jane Doe",
        "score": {"score": 85, "grade": "A", "rationale": "Strong fit"}
    });

    let lead = normalize(&raw, SourceMethod::Broker);
    let score = lead.score.expect("score must carry through");
    assert_eq!(score.score, 85);
    assert_eq!(score.rationale, "Strong fit");
}
