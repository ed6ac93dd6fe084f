/// Integration tests with a mocked Explorium API
/// Tests the complete operation workflows without hitting the real service
use rust_explorium_api::config::Config;
use rust_explorium_api::errors::AppError;
use rust_explorium_api::executor::execute_operation;
use rust_explorium_api::explorium_client::ReqwestTransport;
use rust_explorium_api::merger::EnrichmentFailurePolicy;
use rust_explorium_api::models::NodeParameters;
use rust_explorium_api::services::ExploriumService;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Helper function to create a service against the mock server
fn create_test_service(base_url: String, policy: EnrichmentFailurePolicy) -> ExploriumService {
    let config = Config::with_base_url(base_url, "test_key");
    let transport = ReqwestTransport::new(&config).unwrap();
    ExploriumService::new(Arc::new(transport), policy)
}

fn item(value: Value) -> NodeParameters {
    value.as_object().cloned().unwrap()
}

fn request_json(request: &Request) -> Value {
    serde_json::from_slice(&request.body).unwrap()
}

/// Answers a bulk enrichment call with one row per requested business ID.
struct EchoBusinessIds {
    field: &'static str,
}

impl Respond for EchoBusinessIds {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body = request_json(request);
        let rows: Vec<Value> = body["business_ids"]
            .as_array()
            .unwrap()
            .iter()
            .map(|id| json!({"business_id": id, "data": {self.field: id}}))
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({ "data": rows }))
    }
}

/// Fails every call after the first `ok_calls`.
struct FailAfter {
    ok_calls: usize,
    calls: AtomicUsize,
}

impl Respond for FailAfter {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.ok_calls {
            ResponseTemplate::new(200).set_body_json(json!({"data": [{"event_id": n}]}))
        } else {
            ResponseTemplate::new(500).set_body_json(json!({"detail": "partner limit"}))
        }
    }
}

#[tokio::test]
async fn test_enrich_chunks_and_merges_by_entity() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/businesses/firmographics/bulk_enrich"))
        .and(header("api_key", "test_key"))
        .respond_with(EchoBusinessIds { field: "name" })
        .expect(3)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/businesses/technographics/bulk_enrich"))
        .respond_with(EchoBusinessIds { field: "tech" })
        .expect(3)
        .mount(&mock_server)
        .await;

    let service = create_test_service(mock_server.uri(), EnrichmentFailurePolicy::Continue);
    let ids: Vec<String> = (0..120).map(|i| format!("b{:03}", i)).collect();
    let items = vec![item(json!({
        "type": "businesses",
        "enrichment": ["firmographics", "technographics"],
        "business_ids": ids.iter().map(|id| json!({"id": id})).collect::<Vec<_>>()
    }))];

    let records = execute_operation(&service, "enrich", &items, false)
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    let enriched = records[0]["enriched_data"].as_array().unwrap();
    assert_eq!(enriched.len(), 120);
    assert_eq!(enriched[0]["business_id"], json!("b000"));
    assert_eq!(enriched[119]["business_id"], json!("b119"));
    assert_eq!(enriched[57]["data"], json!({"name": "b057", "tech": "b057"}));
    let responses = records[0]["enrichmentsResponse"].as_array().unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["enrichment_type"], json!("firmographics"));
    assert_eq!(responses[0]["response"]["data"].as_array().unwrap().len(), 120);
}

#[tokio::test]
async fn test_enrich_website_keywords_sends_parameters_on_every_chunk() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/businesses/company_website_keywords/bulk_enrich"))
        .and(body_partial_json(json!({"parameters": {"keywords": ["cloud"]}})))
        .respond_with(EchoBusinessIds { field: "hit" })
        .expect(2)
        .mount(&mock_server)
        .await;

    let service = create_test_service(mock_server.uri(), EnrichmentFailurePolicy::Abort);
    let ids: Vec<String> = (0..51).map(|i| format!("b{}", i)).collect();
    let items = vec![item(json!({
        "type": "businesses",
        "enrichment": "website_keywords",
        "use_json_input": true,
        "json_input": json!({"business_ids": ids, "parameters": {"keywords": ["cloud"]}}).to_string()
    }))];

    let records = execute_operation(&service, "enrich", &items, false)
        .await
        .unwrap();

    assert_eq!(records[0]["enriched_data"].as_array().unwrap().len(), 51);
}

#[tokio::test]
async fn test_enrich_partial_failure_is_recorded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/prospects/contacts_information/bulk_enrich"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({"detail": "no credits"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/prospects/profiles/bulk_enrich"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"prospect_id": "p1", "data": {"job_title": "CTO"}}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = create_test_service(mock_server.uri(), EnrichmentFailurePolicy::Continue);
    let items = vec![item(json!({
        "type": "prospects",
        "enrichment": ["contacts", "profiles"],
        "prospect_ids": {"prospect_ids": [{"id": "p1"}]}
    }))];

    let records = execute_operation(&service, "enrich", &items, false)
        .await
        .unwrap();

    let outcomes = records[0]["enrichmentsResponse"].as_array().unwrap();
    assert_eq!(outcomes[0]["response"], Value::Null);
    assert_eq!(outcomes[0]["hasData"], json!(false));
    let error = outcomes[0]["error"].as_str().unwrap();
    assert!(error.contains("Request failed with status: 402."));
    assert!(error.contains("no credits"));
    assert_eq!(records[0]["enriched_data"][0]["prospect_id"], json!("p1"));
}

#[tokio::test]
async fn test_unknown_enrichment_fails_before_any_call() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = create_test_service(mock_server.uri(), EnrichmentFailurePolicy::Continue);
    let items = vec![item(json!({
        "type": "prospects",
        "enrichment": ["contacts", "firmographics"],
        "prospect_ids": [{"id": "p1"}]
    }))];

    let err = execute_operation(&service, "enrich", &items, false)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UnknownEnrichmentType(_)));
}

#[tokio::test]
async fn test_fetch_auto_paginate_truncates_last_page() {
    let mock_server = MockServer::start().await;

    let page = |start: usize, count: usize| -> Vec<Value> {
        (start..start + count)
            .map(|i| json!({"business_id": format!("b{}", i)}))
            .collect()
    };

    Mock::given(method("POST"))
        .and(path("/v1/businesses"))
        .and(body_partial_json(json!({"page": 1, "page_size": 100})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": page(0, 100),
            "total_results": 5000
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/businesses"))
        .and(body_partial_json(json!({"page": 2, "page_size": 100})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": page(100, 100),
            "total_results": 105
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = create_test_service(mock_server.uri(), EnrichmentFailurePolicy::Continue);
    let items = vec![item(json!({
        "type": "businesses",
        "mode": "preview",
        "size": 120,
        "page_size": 25,
        "auto_paginate": true,
        "extract_data": true,
        "country_code": {"country_code": [{"code": "us"}]}
    }))];

    let records = execute_operation(&service, "fetch", &items, false)
        .await
        .unwrap();

    assert_eq!(records.len(), 105);
    assert_eq!(records[0]["business_id"], json!("b0"));
    assert_eq!(records[104]["business_id"], json!("b104"));
}

#[tokio::test]
async fn test_fetch_additional_filters_override_structured() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/prospects"))
        .and(body_partial_json(json!({
            "mode": "full",
            "filters": {
                "company_size": {"values": ["501-1000"]},
                "has_email": {"value": true}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"prospect_id": "p1"}],
            "total_results": 1
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = create_test_service(mock_server.uri(), EnrichmentFailurePolicy::Continue);
    let items = vec![item(json!({
        "type": "prospects",
        "mode": "full",
        "size": 10,
        "has_email": true,
        "company_size_prospects": {"company_size_prospects": [{"size": "1-10"}]},
        "additional_filters": "{\"company_size\": {\"values\": [\"501-1000\"]}}"
    }))];

    let records = execute_operation(&service, "fetch", &items, false)
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["total_results"], json!(1));
}

#[tokio::test]
async fn test_events_chunk_failure_aborts_remaining_chunks() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/businesses/events"))
        .and(body_partial_json(json!({"event_types": ["new_funding_round"]})))
        .respond_with(FailAfter {
            ok_calls: 1,
            calls: AtomicUsize::new(0),
        })
        .expect(2)
        .mount(&mock_server)
        .await;

    let service = create_test_service(mock_server.uri(), EnrichmentFailurePolicy::Continue);
    let ids: Vec<Value> = (0..100).map(|i| json!({"id": format!("b{}", i)})).collect();
    let items = vec![item(json!({
        "type": "businesses",
        "business_ids": ids,
        "event_types": ["new_funding_round"]
    }))];

    let err = execute_operation(&service, "events", &items, false)
        .await
        .unwrap_err();

    assert!(matches!(err.root(), AppError::UpstreamError { status: 500, .. }));
    assert!(err.to_string().contains("events chunk 2/3"));
}

#[tokio::test]
async fn test_match_prospects_in_chunks_of_fifty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/prospects/match"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "matched_prospects": [{"prospect_id": "p"}],
            "total_matches": 1
        })))
        .expect(2)
        .mount(&mock_server)
        .await;

    let service = create_test_service(mock_server.uri(), EnrichmentFailurePolicy::Continue);
    let prospects: Vec<Value> = (0..60)
        .map(|i| json!({"email": format!("user{}@example.com", i), "linkedin": ""}))
        .collect();
    let items = vec![item(json!({
        "type": "prospects",
        "prospects_to_match": {"prospects_to_match": prospects}
    }))];

    let records = execute_operation(&service, "match", &items, false)
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["matched_prospects"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_autocomplete_sends_field_and_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/businesses/autocomplete"))
        .and(query_param("field", "country"))
        .and(query_param("query", "united"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [{"query": "united states", "value": "us"}]})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = create_test_service(mock_server.uri(), EnrichmentFailurePolicy::Continue);
    let items = vec![item(json!({
        "autocomplete_fields": {"autocomplete_fields": [
            {"field": "country", "query": "united"},
            {"field": "", "query": "orphan"}
        ]}
    }))];

    let records = execute_operation(&service, "autocomplete", &items, true)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["data"][0]["value"], json!("us"));
    assert!(records[1]["error"]
        .as_str()
        .unwrap()
        .contains("must have a field"));
}

#[tokio::test]
async fn test_verify_credentials_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/credit-service/credits/all_credits"))
        .and(header("api_key", "test_key"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let config = Config::with_base_url(mock_server.uri(), "test_key");
    let transport = ReqwestTransport::new(&config).unwrap();

    let result = transport.verify_credentials().await;

    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}
