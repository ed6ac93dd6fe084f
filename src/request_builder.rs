//! Turns host-supplied parameters into typed operation requests.
//!
//! Every builder accepts either structured fields (fixed collections shaped
//! `{group: [{field: value}, ...]}`, plain lists, scalars) or, when
//! `use_json_input` is set, a raw JSON body in `json_input`. Validation
//! happens here so that no HTTP call is made for a malformed request.

use crate::endpoints::{self, MAX_PAGE_SIZE, WEBSITE_KEYWORDS_ENRICHMENT};
use crate::errors::AppError;
use crate::json_utils::{self, exclude_empty_values, is_present};
use crate::models::{
    AutocompleteRequest, BusinessIdentifier, EnrichmentRequest, EntityType, EventsRequest,
    FetchMode, FetchRequest, MatchRequest, NodeParameters, ProspectIdentifier,
};
use serde_json::{json, Map, Value};
use std::collections::HashSet;

pub const JSON_INPUT_FIELD: &str = "json_input";
pub const ADDITIONAL_FILTERS_FIELD: &str = "additional_filters";

const DEFAULT_FETCH_SIZE: u64 = 50;
const MAX_FETCH_SIZE: u64 = 10_000;

/// Read-only view over one item's parameters.
#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    inner: &'a NodeParameters,
}

impl<'a> Params<'a> {
    pub fn new(inner: &'a NodeParameters) -> Self {
        Self { inner }
    }

    pub fn raw(&self, name: &str) -> Option<&'a Value> {
        self.inner.get(name)
    }

    /// Non-blank string (numbers are stringified).
    pub fn string(&self, name: &str) -> Option<String> {
        self.raw(name).and_then(value_to_string)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.raw(name)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn u64(&self, name: &str) -> Result<Option<u64>, AppError> {
        match self.raw(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value_to_u64(value).map(Some).ok_or_else(|| {
                AppError::ValidationError(format!("'{}' must be a positive integer", name))
            }),
        }
    }

    /// A list given as an array or a comma-separated string.
    pub fn strings(&self, name: &str) -> Vec<String> {
        match self.raw(name) {
            Some(value) => value_to_strings(value),
            None => Vec::new(),
        }
    }

    /// Entries of a fixed collection, accepting `{name: [..]}` or `[..]`.
    pub fn collection(&self, name: &str) -> Vec<&'a Map<String, Value>> {
        let entries = match self.raw(name) {
            Some(Value::Object(outer)) => outer.get(name).and_then(Value::as_array),
            Some(Value::Array(list)) => Some(list),
            _ => None,
        };
        entries
            .map(|list| list.iter().filter_map(Value::as_object).collect())
            .unwrap_or_default()
    }

    /// Non-blank values of one field across a fixed collection.
    pub fn collection_strings(&self, name: &str, field: &str) -> Vec<String> {
        match self.raw(name) {
            Some(Value::Array(list)) if list.iter().all(|v| !v.is_object()) => {
                list.iter().filter_map(value_to_string).collect()
            }
            _ => self
                .collection(name)
                .into_iter()
                .filter_map(|entry| entry.get(field).and_then(value_to_string))
                .collect(),
        }
    }

    pub fn entity_type(&self) -> Result<EntityType, AppError> {
        match self.string("type") {
            Some(raw) => raw.parse(),
            None => Ok(EntityType::Businesses),
        }
    }

    pub fn use_json_input(&self) -> bool {
        self.bool("use_json_input").unwrap_or(false)
    }

    /// The JSON override body, when JSON mode is selected.
    pub fn json_body(&self) -> Result<Option<Map<String, Value>>, AppError> {
        if !self.use_json_input() {
            return Ok(None);
        }
        let raw = self.raw(JSON_INPUT_FIELD).ok_or_else(|| {
            AppError::ValidationError(format!(
                "'{}' is required when use_json_input is enabled",
                JSON_INPUT_FIELD
            ))
        })?;
        match json_utils::json_param(JSON_INPUT_FIELD, raw)? {
            Value::Object(map) => Ok(Some(map)),
            _ => Err(AppError::InvalidInput(format!(
                "'{}' must be a JSON object",
                JSON_INPUT_FIELD
            ))),
        }
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_to_strings(value: &Value) -> Vec<String> {
    match value {
        Value::Array(list) => list.iter().filter_map(value_to_string).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        other => value_to_string(other).into_iter().collect(),
    }
}

fn value_to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn dedup(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values.into_iter().filter(|v| seen.insert(v.clone())).collect()
}

// ============ Match ============

fn business_identifier(entry: &Map<String, Value>) -> Option<BusinessIdentifier> {
    let id = BusinessIdentifier {
        name: entry.get("name").and_then(value_to_string),
        domain: entry.get("domain").and_then(value_to_string),
    };
    (id.name.is_some() || id.domain.is_some()).then_some(id)
}

fn prospect_identifier(entry: &Map<String, Value>) -> Option<ProspectIdentifier> {
    let field = |key: &str| entry.get(key).and_then(value_to_string);
    let id = ProspectIdentifier {
        email: field("email"),
        phone_number: field("phone_number"),
        full_name: field("full_name"),
        company_name: field("company_name"),
        linkedin: field("linkedin"),
        business_id: field("business_id"),
    };
    let has_any = [
        &id.email,
        &id.phone_number,
        &id.full_name,
        &id.company_name,
        &id.linkedin,
        &id.business_id,
    ]
    .iter()
    .any(|f| f.is_some());
    has_any.then_some(id)
}

/// Builds a match request, dropping identifiers whose fields are all blank.
pub fn build_match(params: &NodeParameters) -> Result<MatchRequest, AppError> {
    let params = Params::new(params);
    let entity_type = params.entity_type()?;
    let key = entity_type.match_key();

    let entries: Vec<Map<String, Value>> = match params.json_body()? {
        Some(body) => body
            .get(key)
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(Value::as_object).cloned().collect())
            .unwrap_or_default(),
        None => params.collection(key).into_iter().cloned().collect(),
    };

    let request = match entity_type {
        EntityType::Businesses => {
            MatchRequest::Businesses(entries.iter().filter_map(business_identifier).collect())
        }
        EntityType::Prospects => {
            MatchRequest::Prospects(entries.iter().filter_map(prospect_identifier).collect())
        }
    };

    if request.is_empty() {
        return Err(AppError::ValidationError(format!(
            "At least one {} must have an identifier",
            entity_type.singular()
        )));
    }
    Ok(request)
}

// ============ Enrich ============

/// Builds a bulk enrichment request and resolves every enrichment key.
pub fn build_enrichment(params: &NodeParameters) -> Result<EnrichmentRequest, AppError> {
    let params = Params::new(params);
    let entity_type = params.entity_type()?;

    let enrichments = dedup(params.strings("enrichment"));
    if enrichments.is_empty() {
        return Err(AppError::ValidationError(
            "At least one enrichment type must be selected".to_string(),
        ));
    }
    for enrichment in &enrichments {
        endpoints::enrichment_endpoint(entity_type, enrichment)?;
    }

    let (ids, parameters) = match params.json_body()? {
        Some(body) => {
            let ids = body
                .get(entity_type.ids_key())
                .map(value_to_strings)
                .unwrap_or_default();
            let parameters = body
                .get("parameters")
                .and_then(Value::as_object)
                .map(exclude_empty_values)
                .filter(|p| !p.is_empty());
            (ids, parameters)
        }
        None => {
            let ids = params.collection_strings(entity_type.ids_key(), "id");
            let keywords = params.collection_strings("keywords", "keyword");
            let parameters = (!keywords.is_empty()).then(|| {
                let mut p = Map::new();
                p.insert("keywords".to_string(), json!(keywords));
                p
            });
            (ids, parameters)
        }
    };

    if ids.is_empty() {
        return Err(AppError::ValidationError(format!(
            "At least one {} ID is required",
            entity_type.singular()
        )));
    }

    if enrichments.iter().any(|e| e == WEBSITE_KEYWORDS_ENRICHMENT) {
        let has_keywords = parameters
            .as_ref()
            .and_then(|p| p.get("keywords"))
            .map(is_present)
            .unwrap_or(false);
        if !has_keywords {
            return Err(AppError::ValidationError(
                "At least one keyword is required for website keywords enrichment".to_string(),
            ));
        }
    }

    Ok(EnrichmentRequest {
        entity_type,
        enrichments,
        ids,
        parameters: parameters.filter(|p| !p.is_empty()),
    })
}

// ============ Fetch ============

/// One optional filter group of the structured fetch form.
struct FilterRule {
    /// Parameter (fixed collection) name.
    param: &'static str,
    /// Field inside each collection entry.
    field: &'static str,
    /// Key in the outgoing `filters` map.
    filter_key: &'static str,
}

const fn rule(param: &'static str, field: &'static str, filter_key: &'static str) -> FilterRule {
    FilterRule {
        param,
        field,
        filter_key,
    }
}

const BUSINESS_FILTERS: &[FilterRule] = &[
    rule("country_code", "code", "country_code"),
    rule("region_country_code", "code", "region_country_code"),
    rule("city_region_country", "location", "city_region_country"),
    rule("company_size", "size", "company_size"),
    rule("company_revenue", "range", "company_revenue"),
    rule("company_age", "range", "company_age"),
    rule("google_category", "category", "google_category"),
    rule("naics_category", "code", "naics_category"),
    rule("linkedin_category", "category", "linkedin_category"),
    rule(
        "company_tech_stack_category",
        "category",
        "company_tech_stack_category",
    ),
    rule("company_tech_stack_tech", "tech", "company_tech_stack_tech"),
    rule("company_name", "name", "company_name"),
    rule("number_of_locations", "range", "number_of_locations"),
    rule("website_keywords", "keyword", "website_keywords"),
];

const PROSPECT_FILTERS: &[FilterRule] = &[
    rule("business_id", "id", "business_id"),
    rule("job_level", "level", "job_level"),
    rule("job_department", "department", "job_department"),
    rule("country_code_prospect", "code", "country_code"),
    rule("company_country_code", "code", "company_country_code"),
    rule("company_size_prospects", "size", "company_size"),
    rule("company_revenue_prospects", "range", "company_revenue"),
];

const PROSPECT_FLAGS: &[&str] = &["has_email", "has_phone_number"];

/// Builds the sparse `filters` map from the structured filter groups.
pub fn build_filters(
    entity_type: EntityType,
    params: &NodeParameters,
) -> Result<Map<String, Value>, AppError> {
    let params = Params::new(params);
    let mut filters = Map::new();

    let rules = match entity_type {
        EntityType::Businesses => BUSINESS_FILTERS,
        EntityType::Prospects => PROSPECT_FILTERS,
    };
    for rule in rules {
        let values = params.collection_strings(rule.param, rule.field);
        if !values.is_empty() {
            filters.insert(rule.filter_key.to_string(), json!({ "values": values }));
        }
    }

    match entity_type {
        EntityType::Businesses => {
            let topics = params.collection_strings("business_intent_topics", "topic");
            if !topics.is_empty() {
                let mut filter = Map::new();
                filter.insert("topics".to_string(), json!(topics));
                if let Some(level) = params.string("business_intent_topics_topic_intent_level") {
                    filter.insert("topic_intent_level".to_string(), json!(level));
                }
                filters.insert("business_intent_topics".to_string(), Value::Object(filter));
            }
        }
        EntityType::Prospects => {
            let titles = params.collection_strings("job_title", "title");
            if !titles.is_empty() {
                let mut filter = Map::new();
                filter.insert("values".to_string(), json!(titles));
                if params.bool("include_related_job_titles").unwrap_or(false) {
                    filter.insert("include_related_job_titles".to_string(), json!(true));
                }
                filters.insert("job_title".to_string(), Value::Object(filter));
            }
            for flag in PROSPECT_FLAGS {
                if params.bool(flag).unwrap_or(false) {
                    filters.insert(flag.to_string(), json!({ "value": true }));
                }
            }
        }
    }

    if let Some(raw) = params.raw(ADDITIONAL_FILTERS_FIELD) {
        match json_utils::json_param(ADDITIONAL_FILTERS_FIELD, raw)? {
            Value::Object(additional) => {
                for (key, value) in additional {
                    filters.insert(key, value);
                }
            }
            Value::Null => {}
            _ => {
                return Err(AppError::InvalidInput(format!(
                    "'{}' must be a JSON object",
                    ADDITIONAL_FILTERS_FIELD
                )))
            }
        }
    }

    Ok(filters)
}

fn check_range(name: &str, value: u64, max: u64) -> Result<u64, AppError> {
    if value == 0 || value > max {
        return Err(AppError::ValidationError(format!(
            "'{}' must be between 1 and {}",
            name, max
        )));
    }
    Ok(value)
}

/// Builds a fetch request. `page_size` never exceeds the server-side cap;
/// auto-pagination sets it to the cap or `size`, whichever is smaller.
pub fn build_fetch(params: &NodeParameters) -> Result<FetchRequest, AppError> {
    let reader = Params::new(params);
    let entity_type = reader.entity_type()?;
    let auto_paginate = reader.bool("auto_paginate").unwrap_or(false);
    let extract_data = reader.bool("extract_data").unwrap_or(false);

    let body = reader.json_body()?;
    let source = match &body {
        Some(body) => Params::new(body),
        None => reader,
    };

    let mode = match source.string("mode") {
        Some(raw) => raw.parse::<FetchMode>()?,
        None => FetchMode::default(),
    };
    let size = check_range(
        "size",
        source.u64("size")?.unwrap_or(DEFAULT_FETCH_SIZE),
        MAX_FETCH_SIZE,
    )?;
    let page_size = if auto_paginate {
        MAX_PAGE_SIZE.min(size)
    } else {
        let page_size = source.u64("page_size")?.unwrap_or(MAX_PAGE_SIZE.min(size));
        check_range("page_size", page_size, MAX_PAGE_SIZE)?
    };
    let page = source.u64("page")?.unwrap_or(1).max(1);

    let filters = match &body {
        Some(body) => match body.get("filters") {
            Some(Value::Object(filters)) => exclude_empty_values(filters),
            Some(Value::Null) | None => Map::new(),
            Some(_) => {
                return Err(AppError::InvalidInput(
                    "'filters' must be a JSON object".to_string(),
                ))
            }
        },
        None => build_filters(entity_type, params)?,
    };
    let exclude = Some(source.strings("exclude")).filter(|e| !e.is_empty());

    Ok(FetchRequest {
        entity_type,
        mode,
        size,
        page_size,
        page,
        filters,
        exclude,
        auto_paginate,
        extract_data,
    })
}

// ============ Events ============

pub fn build_events(params: &NodeParameters) -> Result<EventsRequest, AppError> {
    let reader = Params::new(params);
    let entity_type = reader.entity_type()?;

    let body = reader.json_body()?;
    let (ids, source) = match &body {
        Some(body) => {
            let source = Params::new(body);
            (source.strings(entity_type.ids_key()), source)
        }
        None => (reader.collection_strings(entity_type.ids_key(), "id"), reader),
    };

    if ids.is_empty() {
        return Err(AppError::ValidationError(format!(
            "At least one {} ID is required",
            entity_type.singular()
        )));
    }
    let event_types = dedup(source.strings("event_types"));
    if event_types.is_empty() {
        return Err(AppError::ValidationError(
            "At least one event type is required".to_string(),
        ));
    }

    Ok(EventsRequest {
        entity_type,
        ids,
        event_types,
        timestamp_from: source.string("timestamp_from"),
        timestamp_to: source.string("timestamp_to"),
    })
}

// ============ Autocomplete ============

/// Builds the autocomplete list. Per-entry `field` checks happen in
/// [`validate_autocomplete`] right before each call.
pub fn build_autocomplete(params: &NodeParameters) -> Result<Vec<AutocompleteRequest>, AppError> {
    let reader = Params::new(params);
    let entries: Vec<Map<String, Value>> = match reader.json_body()? {
        Some(body) => body
            .get("autocomplete_requests")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(Value::as_object).cloned().collect())
            .unwrap_or_default(),
        None => reader
            .collection("autocomplete_fields")
            .into_iter()
            .cloned()
            .collect(),
    };

    let requests: Vec<AutocompleteRequest> = entries
        .iter()
        .map(|entry| AutocompleteRequest {
            field: entry.get("field").and_then(value_to_string).unwrap_or_default(),
            query: entry.get("query").and_then(value_to_string).unwrap_or_default(),
        })
        .collect();

    if requests.is_empty() {
        return Err(AppError::ValidationError(
            "At least one autocomplete request is required".to_string(),
        ));
    }
    Ok(requests)
}

pub fn validate_autocomplete(request: &AutocompleteRequest) -> Result<(), AppError> {
    if request.field.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Each autocomplete request must have a field".to_string(),
        ));
    }
    Ok(())
}
