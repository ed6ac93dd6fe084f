use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// ============ Operation & Entity Kinds ============

/// Kind of entity an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Businesses,
    Prospects,
}

impl EntityType {
    /// Path segment and parameter value (`businesses` / `prospects`).
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Businesses => "businesses",
            EntityType::Prospects => "prospects",
        }
    }

    /// Identity key of an enriched record (`business_id` / `prospect_id`).
    pub fn id_key(&self) -> &'static str {
        match self {
            EntityType::Businesses => "business_id",
            EntityType::Prospects => "prospect_id",
        }
    }

    /// Request field carrying a list of IDs (`business_ids` / `prospect_ids`).
    pub fn ids_key(&self) -> &'static str {
        match self {
            EntityType::Businesses => "business_ids",
            EntityType::Prospects => "prospect_ids",
        }
    }

    /// Request field carrying identifiers to match.
    pub fn match_key(&self) -> &'static str {
        match self {
            EntityType::Businesses => "businesses_to_match",
            EntityType::Prospects => "prospects_to_match",
        }
    }

    /// Singular noun used in validation messages.
    pub fn singular(&self) -> &'static str {
        match self {
            EntityType::Businesses => "company",
            EntityType::Prospects => "prospect",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "businesses" | "business" => Ok(EntityType::Businesses),
            "prospects" | "prospect" => Ok(EntityType::Prospects),
            other => Err(AppError::ValidationError(format!(
                "Unknown entity type '{}', expected 'businesses' or 'prospects'",
                other
            ))),
        }
    }
}

/// The five operations exposed by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Match,
    Enrich,
    Fetch,
    Events,
    Autocomplete,
}

impl OperationKind {
    pub const ALL: [OperationKind; 5] = [
        OperationKind::Match,
        OperationKind::Enrich,
        OperationKind::Fetch,
        OperationKind::Events,
        OperationKind::Autocomplete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Match => "match",
            OperationKind::Enrich => "enrich",
            OperationKind::Fetch => "fetch",
            OperationKind::Events => "events",
            OperationKind::Autocomplete => "autocomplete",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OperationKind::Match => {
                "Find and match businesses or prospects to get their Explorium IDs"
            }
            OperationKind::Enrich => "Add additional data to existing records",
            OperationKind::Fetch => "Retrieve records with filters and pagination",
            OperationKind::Events => "Get business or prospect events",
            OperationKind::Autocomplete => "Get field suggestions and autocomplete values",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationKind::ALL
            .into_iter()
            .find(|op| op.as_str() == s.trim())
            .ok_or_else(|| AppError::UnknownOperation(s.to_string()))
    }
}

// ============ Match ============

/// Loose identification of a company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessIdentifier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// Loose identification of a person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProspectIdentifier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_id: Option<String>,
}

/// Identifiers to resolve to canonical IDs, all non-blank after building.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchRequest {
    Businesses(Vec<BusinessIdentifier>),
    Prospects(Vec<ProspectIdentifier>),
}

impl MatchRequest {
    pub fn entity_type(&self) -> EntityType {
        match self {
            MatchRequest::Businesses(_) => EntityType::Businesses,
            MatchRequest::Prospects(_) => EntityType::Prospects,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            MatchRequest::Businesses(list) => list.len(),
            MatchRequest::Prospects(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identifiers as JSON values, in request order.
    pub fn identifiers(&self) -> Vec<Value> {
        match self {
            MatchRequest::Businesses(list) => list
                .iter()
                .filter_map(|b| serde_json::to_value(b).ok())
                .collect(),
            MatchRequest::Prospects(list) => list
                .iter()
                .filter_map(|p| serde_json::to_value(p).ok())
                .collect(),
        }
    }
}

// ============ Enrich ============

/// Bulk enrichment of a list of entity IDs.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentRequest {
    pub entity_type: EntityType,
    /// Enrichment keys, deduplicated, in the order selected.
    pub enrichments: Vec<String>,
    pub ids: Vec<String>,
    /// Website keywords parameters, sent on every chunk of that enrichment only.
    pub parameters: Option<Map<String, Value>>,
}

/// One merged entity across all enrichment responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedEntity {
    /// `business_id` or `prospect_id`, depending on the entity type.
    pub id_key: String,
    /// The ID exactly as the API returned it.
    pub id: Value,
    pub data: Map<String, Value>,
    /// Any other top-level fields of the first-seen item.
    pub extra: Map<String, Value>,
}

impl EnrichedEntity {
    /// Record in the API's own shape: `{<id_key>: id, data: {...}, ...}`.
    pub fn to_value(&self) -> Value {
        let mut record = self.extra.clone();
        record.insert(self.id_key.clone(), self.id.clone());
        record.insert("data".to_string(), Value::Object(self.data.clone()));
        Value::Object(record)
    }
}

/// Outcome of one enrichment type's call(s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentOutcome {
    pub enrichment_type: String,
    pub response: Option<Value>,
    #[serde(rename = "hasData")]
    pub has_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final output of the enrich operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichResult {
    #[serde(rename = "enrichmentsResponse")]
    pub enrichments_response: Vec<EnrichmentOutcome>,
    #[serde(serialize_with = "serialize_entities")]
    pub enriched_data: Vec<EnrichedEntity>,
}

fn serialize_entities<S>(entities: &[EnrichedEntity], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeSeq;
    let mut seq = serializer.serialize_seq(Some(entities.len()))?;
    for entity in entities {
        seq.serialize_element(&entity.to_value())?;
    }
    seq.end()
}

// ============ Fetch ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    #[default]
    Full,
    Preview,
}

impl FromStr for FetchMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "full" => Ok(FetchMode::Full),
            "preview" => Ok(FetchMode::Preview),
            other => Err(AppError::ValidationError(format!(
                "Unknown fetch mode '{}', expected 'full' or 'preview'",
                other
            ))),
        }
    }
}

/// Filtered, paginated listing of businesses or prospects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchRequest {
    #[serde(skip)]
    pub entity_type: EntityType,
    pub mode: FetchMode,
    pub size: u64,
    pub page_size: u64,
    pub page: u64,
    pub filters: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
    /// Loop over pages until `size` rows are collected.
    #[serde(skip)]
    pub auto_paginate: bool,
    /// Emit each row as its own record instead of one record per page.
    #[serde(skip)]
    pub extract_data: bool,
}

/// Mutable state of the auto-pagination loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationCursor {
    pub current_page: u64,
    pub fetched_count: u64,
    pub target_count: u64,
}

// ============ Events ============

#[derive(Debug, Clone, PartialEq)]
pub struct EventsRequest {
    pub entity_type: EntityType,
    pub ids: Vec<String>,
    pub event_types: Vec<String>,
    pub timestamp_from: Option<String>,
    pub timestamp_to: Option<String>,
}

// ============ Autocomplete ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutocompleteRequest {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub query: String,
}

// ============ Host Envelope ============

/// Named parameters of one input item, as supplied by the host.
pub type NodeParameters = Map<String, Value>;

/// Body of `POST /api/v1/execute/:operation`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecuteRequest {
    /// Overrides the configured continue-on-failure mode.
    #[serde(default)]
    pub continue_on_fail: Option<bool>,
    /// One parameter map per input item.
    #[serde(default)]
    pub items: Vec<NodeParameters>,
}
