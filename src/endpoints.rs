//! Static knowledge about the remote API surface: paths, bulk enrichment
//! endpoints, partner batch limits and the known option values.

use crate::errors::AppError;
use crate::models::{EntityType, OperationKind};

/// Identifiers per match call.
pub const MATCH_CHUNK_SIZE: usize = 50;
/// IDs per bulk enrichment call.
pub const ENRICH_CHUNK_SIZE: usize = 50;
/// IDs per events call.
pub const EVENTS_CHUNK_SIZE: usize = 40;
/// Server-side cap on `page_size` for fetch.
pub const MAX_PAGE_SIZE: u64 = 100;

const BUSINESS_ENRICHMENTS: &[(&str, &str)] = &[
    ("firmographics", "/v1/businesses/firmographics/bulk_enrich"),
    ("technographics", "/v1/businesses/technographics/bulk_enrich"),
    (
        "company_ratings",
        "/v1/businesses/company_ratings_by_employees/bulk_enrich",
    ),
    (
        "financial_metrics",
        "/v1/businesses/financial_indicators/bulk_enrich",
    ),
    (
        "funding_and_acquisitions",
        "/v1/businesses/funding_and_acquisition/bulk_enrich",
    ),
    (
        "challenges",
        "/v1/businesses/pc_business_challenges_10k/bulk_enrich",
    ),
    (
        "competitive_landscape",
        "/v1/businesses/pc_competitive_landscape_10k/bulk_enrich",
    ),
    ("strategic_insights", "/v1/businesses/pc_strategy_10k/bulk_enrich"),
    ("workforce_trends", "/v1/businesses/workforce_trends/bulk_enrich"),
    ("linkedin_posts", "/v1/businesses/linkedin_posts/bulk_enrich"),
    ("website_changes", "/v1/businesses/website_changes/bulk_enrich"),
    (
        "website_keywords",
        "/v1/businesses/company_website_keywords/bulk_enrich",
    ),
];

const PROSPECT_ENRICHMENTS: &[(&str, &str)] = &[
    (
        "contacts",
        "/v1/prospects/contacts_information/bulk_enrich",
    ),
    ("linkedin_posts", "/v1/prospects/linkedin_posts/bulk_enrich"),
    ("profiles", "/v1/prospects/profiles/bulk_enrich"),
];

pub const BUSINESS_EVENT_TYPES: &[&str] = &[
    "ipo_announcement",
    "new_funding_round",
    "new_investment",
    "merger_and_acquisitions",
    "new_product",
    "new_office",
    "closing_office",
    "new_partnership",
    "employee_joined_company",
    "company_award",
    "outages_and_security_breaches",
    "cost_cutting",
    "lawsuits_and_legal_issues",
    "hiring_in_engineering_department",
    "hiring_in_sales_department",
    "hiring_in_marketing_department",
    "increase_in_engineering_department",
    "increase_in_sales_department",
    "increase_in_marketing_department",
    "increase_in_all_departments",
    "decrease_in_engineering_department",
    "decrease_in_sales_department",
    "decrease_in_all_departments",
    "increase_in_operations_department",
];

pub const PROSPECT_EVENT_TYPES: &[&str] = &[
    "prospect_changed_role",
    "prospect_changed_company",
    "prospect_job_start_anniversary",
];

pub const AUTOCOMPLETE_FIELDS: &[&str] = &[
    "country",
    "country_code",
    "region_country_code",
    "google_category",
    "naics_category",
    "linkedin_category",
    "company_tech_stack_tech",
    "company_tech_stack_categories",
    "job_title",
    "company_size",
    "company_revenue",
    "number_of_locations",
    "company_age",
    "job_department",
    "job_level",
    "city_region_country",
    "company_name",
    "business_intent_topics",
];

fn enrichment_table(entity_type: EntityType) -> &'static [(&'static str, &'static str)] {
    match entity_type {
        EntityType::Businesses => BUSINESS_ENRICHMENTS,
        EntityType::Prospects => PROSPECT_ENRICHMENTS,
    }
}

/// Looks up the bulk endpoint for an enrichment key.
pub fn enrichment_endpoint(
    entity_type: EntityType,
    enrichment: &str,
) -> Result<&'static str, AppError> {
    enrichment_table(entity_type)
        .iter()
        .find(|(key, _)| *key == enrichment)
        .map(|(_, path)| *path)
        .ok_or_else(|| {
            AppError::UnknownEnrichmentType(format!(
                "'{}' is not available for {}",
                enrichment, entity_type
            ))
        })
}

/// The only enrichment whose endpoint accepts `parameters`.
pub const WEBSITE_KEYWORDS_ENRICHMENT: &str = "website_keywords";

/// Whether the bulk endpoint for `enrichment` takes a `parameters` object.
pub fn accepts_parameters(entity_type: EntityType, enrichment: &str) -> bool {
    entity_type == EntityType::Businesses && enrichment == WEBSITE_KEYWORDS_ENRICHMENT
}

/// Enrichment keys available for an entity type.
pub fn enrichment_keys(entity_type: EntityType) -> Vec<&'static str> {
    enrichment_table(entity_type).iter().map(|(k, _)| *k).collect()
}

pub fn event_types(entity_type: EntityType) -> &'static [&'static str] {
    match entity_type {
        EntityType::Businesses => BUSINESS_EVENT_TYPES,
        EntityType::Prospects => PROSPECT_EVENT_TYPES,
    }
}

pub fn match_path(entity_type: EntityType) -> String {
    format!("/v1/{}/match", entity_type)
}

pub fn fetch_path(entity_type: EntityType) -> String {
    format!("/v1/{}", entity_type)
}

pub fn events_path(entity_type: EntityType) -> String {
    format!("/v1/{}/events", entity_type)
}

pub const AUTOCOMPLETE_PATH: &str = "/v1/businesses/autocomplete";

pub const CREDENTIALS_TEST_PATH: &str = "/credit-service/credits/all_credits";

/// Reference documentation for an operation and entity type.
pub fn docs_url(operation: OperationKind, entity_type: EntityType) -> &'static str {
    use EntityType::*;
    use OperationKind::*;
    match (operation, entity_type) {
        (Match, Businesses) => "https://developers.explorium.ai/reference/match_businesses",
        (Match, Prospects) => "https://developers.explorium.ai/reference/match_prospects-1",
        (Enrich, Businesses) => {
            "https://developers.explorium.ai/reference/businesses_enrichments"
        }
        (Enrich, Prospects) => "https://developers.explorium.ai/reference/prospects_enrichments",
        (Fetch, Businesses) => "https://developers.explorium.ai/reference/fetch_businesses",
        (Fetch, Prospects) => "https://developers.explorium.ai/reference/fetch_prospects",
        (Events, Businesses) => {
            "https://developers.explorium.ai/reference/fetch_businesses_events"
        }
        (Events, Prospects) => {
            "https://developers.explorium.ai/reference/fetch_prospects_events-1"
        }
        (Autocomplete, _) => "https://developers.explorium.ai/reference/businesses_autocomplete",
    }
}
