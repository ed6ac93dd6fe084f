use crate::batching::dispatch_chunked;
use crate::endpoints::{
    self, AUTOCOMPLETE_PATH, ENRICH_CHUNK_SIZE, EVENTS_CHUNK_SIZE, MATCH_CHUNK_SIZE,
};
use crate::errors::{AppError, ResultExt};
use crate::explorium_client::{HttpRequest, HttpTransport};
use crate::json_utils::concat_responses;
use crate::merger::{EnrichmentFailurePolicy, EnrichmentMerger};
use crate::models::{
    AutocompleteRequest, EnrichmentRequest, EventsRequest, FetchRequest, MatchRequest,
    NodeParameters, OperationKind,
};
use crate::pagination::PaginationDriver;
use crate::request_builder;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Runs the five operations against an injected transport.
///
/// Every call is awaited before the next one is issued. Records are appended
/// to the caller's output list as soon as they are available, so a failure
/// part-way through leaves the earlier records in place.
#[derive(Clone)]
pub struct ExploriumService {
    transport: Arc<dyn HttpTransport>,
    failure_policy: EnrichmentFailurePolicy,
}

impl ExploriumService {
    pub fn new(transport: Arc<dyn HttpTransport>, failure_policy: EnrichmentFailurePolicy) -> Self {
        Self {
            transport,
            failure_policy,
        }
    }

    /// Builds and runs one operation for one input item.
    pub async fn run(
        &self,
        operation: OperationKind,
        params: &NodeParameters,
        out: &mut Vec<Value>,
    ) -> Result<(), AppError> {
        match operation {
            OperationKind::Match => {
                let request = request_builder::build_match(params)?;
                self.match_entities(&request, out).await
            }
            OperationKind::Enrich => {
                let request = request_builder::build_enrichment(params)?;
                self.enrich(&request, out).await
            }
            OperationKind::Fetch => {
                let request = request_builder::build_fetch(params)?;
                self.fetch(&request, out).await
            }
            OperationKind::Events => {
                let request = request_builder::build_events(params)?;
                self.events(&request, out).await
            }
            OperationKind::Autocomplete => {
                let requests = request_builder::build_autocomplete(params)?;
                self.autocomplete(&requests, out).await
            }
        }
    }

    /// Resolves identifiers to canonical IDs, 50 identifiers per call.
    pub async fn match_entities(
        &self,
        request: &MatchRequest,
        out: &mut Vec<Value>,
    ) -> Result<(), AppError> {
        let entity_type = request.entity_type();
        let identifiers = request.identifiers();
        tracing::info!("Matching {} {}", identifiers.len(), entity_type);

        let path = endpoints::match_path(entity_type);
        let responses = dispatch_chunked(
            self.transport.as_ref(),
            &identifiers,
            MATCH_CHUNK_SIZE,
            "match",
            |chunk| {
                let mut body = Map::new();
                body.insert(entity_type.match_key().to_string(), json!(chunk));
                HttpRequest::post(path.clone(), Value::Object(body))
            },
        )
        .await?;

        out.push(concat_responses(responses));
        Ok(())
    }

    /// Runs each enrichment type in turn and merges the rows by entity ID.
    pub async fn enrich(
        &self,
        request: &EnrichmentRequest,
        out: &mut Vec<Value>,
    ) -> Result<(), AppError> {
        let entity_type = request.entity_type;
        let mut merger = EnrichmentMerger::new(entity_type);
        tracing::info!(
            "Enriching {} {} with {:?}",
            request.ids.len(),
            entity_type,
            request.enrichments
        );

        for enrichment in &request.enrichments {
            let path = endpoints::enrichment_endpoint(entity_type, enrichment)?;
            let parameters = request
                .parameters
                .as_ref()
                .filter(|_| endpoints::accepts_parameters(entity_type, enrichment));
            let result = dispatch_chunked(
                self.transport.as_ref(),
                &request.ids,
                ENRICH_CHUNK_SIZE,
                enrichment,
                |chunk| {
                    let mut body = Map::new();
                    body.insert(entity_type.ids_key().to_string(), json!(chunk));
                    if let Some(parameters) = parameters {
                        body.insert("parameters".to_string(), Value::Object(parameters.clone()));
                    }
                    HttpRequest::post(path, Value::Object(body))
                },
            )
            .await;

            match result {
                Ok(responses) => {
                    merger.record_success(enrichment, concat_responses(responses));
                    tracing::debug!(
                        "{} merged, {} entities so far",
                        enrichment,
                        merger.entities().len()
                    );
                }
                Err(e) if self.failure_policy == EnrichmentFailurePolicy::Continue => {
                    merger.record_failure(enrichment, &e)
                }
                Err(e) => {
                    return Err::<(), _>(e).context(format!("enrichment '{}'", enrichment))
                }
            }
        }

        let result = merger.finish();
        tracing::info!(
            "Enrichment finished: {} entities, {} enrichment responses",
            result.enriched_data.len(),
            result.enrichments_response.len()
        );
        out.push(serde_json::to_value(&result)?);
        Ok(())
    }

    /// Lists records, paginating client-side when requested.
    pub async fn fetch(&self, request: &FetchRequest, out: &mut Vec<Value>) -> Result<(), AppError> {
        tracing::info!(
            "Fetching {} (size {}, page_size {}, auto_paginate {})",
            request.entity_type,
            request.size,
            request.page_size,
            request.auto_paginate
        );
        PaginationDriver::new(self.transport.as_ref(), request)
            .run(out)
            .await?;
        Ok(())
    }

    /// Fetches events, 40 IDs per call.
    pub async fn events(&self, request: &EventsRequest, out: &mut Vec<Value>) -> Result<(), AppError> {
        let entity_type = request.entity_type;
        tracing::info!(
            "Fetching {:?} events for {} {}",
            request.event_types,
            request.ids.len(),
            entity_type
        );

        let path = endpoints::events_path(entity_type);
        let responses = dispatch_chunked(
            self.transport.as_ref(),
            &request.ids,
            EVENTS_CHUNK_SIZE,
            "events",
            |chunk| {
                let mut body = Map::new();
                body.insert(entity_type.ids_key().to_string(), json!(chunk));
                body.insert("event_types".to_string(), json!(request.event_types));
                if let Some(from) = &request.timestamp_from {
                    body.insert("timestamp_from".to_string(), json!(from));
                }
                if let Some(to) = &request.timestamp_to {
                    body.insert("timestamp_to".to_string(), json!(to));
                }
                HttpRequest::post(path.clone(), Value::Object(body))
            },
        )
        .await?;

        out.push(concat_responses(responses));
        Ok(())
    }

    /// One GET per request; a request without a field fails before its call.
    pub async fn autocomplete(
        &self,
        requests: &[AutocompleteRequest],
        out: &mut Vec<Value>,
    ) -> Result<(), AppError> {
        for (index, request) in requests.iter().enumerate() {
            request_builder::validate_autocomplete(request)
                .with_context(|| format!("autocomplete request {}", index + 1))?;

            let query = vec![
                ("field".to_string(), request.field.clone()),
                ("query".to_string(), request.query.clone()),
            ];
            let response = self
                .transport
                .send(HttpRequest::get(AUTOCOMPLETE_PATH, query))
                .await?;
            out.push(response);
        }
        Ok(())
    }
}
