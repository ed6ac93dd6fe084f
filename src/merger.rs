use crate::errors::AppError;
use crate::json_utils::response_rows;
use crate::models::{EnrichResult, EnrichedEntity, EnrichmentOutcome, EntityType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// What to do when one enrichment type's call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentFailurePolicy {
    /// Record the failure inline and run the remaining enrichment types.
    #[default]
    Continue,
    /// Fail the whole operation on the first failure.
    Abort,
}

impl FromStr for EnrichmentFailurePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(EnrichmentFailurePolicy::Continue),
            "abort" => Ok(EnrichmentFailurePolicy::Abort),
            other => Err(AppError::ValidationError(format!(
                "Unknown enrichment failure policy '{}', expected 'continue' or 'abort'",
                other
            ))),
        }
    }
}

/// String and numeric IDs match on their textual form.
fn lookup_key(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Folds the responses of several enrichment types into one entity-keyed list.
#[derive(Debug)]
pub struct EnrichmentMerger {
    entity_type: EntityType,
    outcomes: Vec<EnrichmentOutcome>,
    entities: Vec<EnrichedEntity>,
}

impl EnrichmentMerger {
    pub fn new(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            outcomes: Vec::new(),
            entities: Vec::new(),
        }
    }

    /// Merges response rows into the entity list.
    ///
    /// Rows for a known ID shallow-merge their `data` into the existing
    /// record (later values win). Unknown IDs are appended in first-seen
    /// order. A non-object `data` is stored under the enrichment name.
    pub fn merge_items(&mut self, enrichment: &str, items: &[Value]) {
        let id_key = self.entity_type.id_key();

        for item in items {
            let Some(fields) = item.as_object() else {
                tracing::warn!("{}: skipping non-object row", enrichment);
                continue;
            };
            let Some(id) = fields.get(id_key) else {
                tracing::warn!("{}: skipping row without {}", enrichment, id_key);
                continue;
            };
            let Some(key) = lookup_key(id) else {
                tracing::warn!("{}: skipping row with a non-scalar {}", enrichment, id_key);
                continue;
            };

            let data = match fields.get("data") {
                Some(Value::Object(data)) => data.clone(),
                Some(Value::Null) | None => Map::new(),
                Some(other) => {
                    let mut wrapped = Map::new();
                    wrapped.insert(enrichment.to_string(), other.clone());
                    wrapped
                }
            };

            let existing = self
                .entities
                .iter_mut()
                .find(|e| lookup_key(&e.id).as_deref() == Some(key.as_str()));
            match existing {
                Some(existing) => existing.data.extend(data),
                None => {
                    let extra = fields
                        .iter()
                        .filter(|(k, _)| k.as_str() != id_key && k.as_str() != "data")
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
                    self.entities.push(EnrichedEntity {
                        id_key: id_key.to_string(),
                        id: id.clone(),
                        data,
                        extra,
                    });
                }
            }
        }
    }

    /// Records a successful enrichment call and merges its rows.
    pub fn record_success(&mut self, enrichment: &str, response: Value) {
        let rows = response_rows(&response);
        let has_data = !rows.is_empty();
        self.merge_items(enrichment, rows);
        self.outcomes.push(EnrichmentOutcome {
            enrichment_type: enrichment.to_string(),
            response: Some(response),
            has_data,
            error: None,
        });
    }

    /// Records a failed enrichment call without touching the entity list.
    pub fn record_failure(&mut self, enrichment: &str, error: &AppError) {
        tracing::warn!("Enrichment '{}' failed: {}", enrichment, error);
        self.outcomes.push(EnrichmentOutcome {
            enrichment_type: enrichment.to_string(),
            response: None,
            has_data: false,
            error: Some(error.to_string()),
        });
    }

    pub fn entities(&self) -> &[EnrichedEntity] {
        &self.entities
    }

    pub fn finish(self) -> EnrichResult {
        EnrichResult {
            enrichments_response: self.outcomes,
            enriched_data: self.entities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_same_entity_across_enrichments() {
        let mut merger = EnrichmentMerger::new(EntityType::Businesses);
        merger.record_success(
            "firmographics",
            json!({"data": [
                {"business_id": "b1", "data": {"name": "Acme", "size": "11-50"}},
                {"business_id": "b2", "data": {"name": "Globex"}}
            ]}),
        );
        merger.record_success(
            "technographics",
            json!({"data": [
                {"business_id": "b2", "data": {"tech": ["rust"]}},
                {"business_id": "b1", "data": {"size": "51-200", "tech": ["go"]}}
            ]}),
        );

        let result = merger.finish();
        assert_eq!(result.enriched_data.len(), 2);
        assert_eq!(result.enriched_data[0].id, json!("b1"));
        assert_eq!(
            Value::Object(result.enriched_data[0].data.clone()),
            json!({"name": "Acme", "size": "51-200", "tech": ["go"]})
        );
        assert_eq!(result.enriched_data[1].data["tech"], json!(["rust"]));
        assert_eq!(result.enrichments_response.len(), 2);
        assert!(result.enrichments_response.iter().all(|o| o.has_data));
    }

    #[test]
    fn test_record_failure_keeps_entities() {
        let mut merger = EnrichmentMerger::new(EntityType::Prospects);
        merger.record_success(
            "contacts",
            json!({"data": [{"prospect_id": "p1", "data": {"email": "a@b.co"}}]}),
        );
        merger.record_failure(
            "profiles",
            &AppError::UpstreamError {
                status: 500,
                body: None,
            },
        );

        let result = merger.finish();
        assert_eq!(result.enriched_data.len(), 1);
        let failed = &result.enrichments_response[1];
        assert_eq!(failed.enrichment_type, "profiles");
        assert!(failed.response.is_none());
        assert!(!failed.has_data);
        assert_eq!(
            failed.error.as_deref(),
            Some("Request failed with status: 500.")
        );
    }

    #[test]
    fn test_non_object_data_is_keyed_by_enrichment() {
        let mut merger = EnrichmentMerger::new(EntityType::Businesses);
        merger.merge_items(
            "linkedin_posts",
            &[json!({"business_id": "b1", "data": [{"post": 1}]}), json!("junk")],
        );
        assert_eq!(merger.entities()[0].data["linkedin_posts"], json!([{"post": 1}]));
    }

    #[test]
    fn test_numeric_ids_keep_their_type() {
        let mut merger = EnrichmentMerger::new(EntityType::Businesses);
        merger.merge_items("firmographics", &[json!({"business_id": 42, "data": {"a": 1}})]);
        merger.merge_items("technographics", &[json!({"business_id": 42, "data": {"b": 2}})]);

        let result = serde_json::to_value(merger.finish()).unwrap();
        let enriched = result["enriched_data"].as_array().unwrap();
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0]["business_id"], json!(42));
        assert_eq!(enriched[0]["data"], json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_empty_response_has_no_data() {
        let mut merger = EnrichmentMerger::new(EntityType::Businesses);
        merger.record_success("website_changes", json!({"data": []}));
        let result = merger.finish();
        assert!(!result.enrichments_response[0].has_data);
        assert!(result.enriched_data.is_empty());
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(
            "ABORT".parse::<EnrichmentFailurePolicy>().unwrap(),
            EnrichmentFailurePolicy::Abort
        );
        assert!("retry".parse::<EnrichmentFailurePolicy>().is_err());
    }
}
