//! Explorium Business Data API Library
//!
//! This library turns operation parameters into calls against the Explorium
//! business-data API (match, enrich, fetch, events, autocomplete), batching
//! large ID lists, merging multi-endpoint enrichment results and paginating
//! fetches. The binary exposes the operations over HTTP.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core request assembly, batching, merging and pagination.
//! - `integrations`: External service integrations.
//! - `batching`: Chunked, sequential dispatch of ID lists.
//! - `config`: Configuration management.
//! - `endpoints`: Remote API paths, enrichment endpoints and batch limits.
//! - `errors`: Error handling types.
//! - `executor`: Runs an operation over a list of input items.
//! - `explorium_client`: HTTP transport trait and reqwest implementation.
//! - `handlers`: HTTP request handlers.
//! - `json_utils`: JSON cleaning, parsing and merge helpers.
//! - `merger`: Entity-keyed merge of enrichment responses.
//! - `models`: Core data models.
//! - `pagination`: Fetch pagination driver.
//! - `request_builder`: Parameter to request translation and validation.
//! - `services`: Operation runner.

pub mod api;
pub mod core;
pub mod integrations;

pub mod batching;
pub mod config;
pub mod endpoints;
pub mod errors;
pub mod executor;
pub mod explorium_client;
pub mod handlers;
pub mod json_utils;
pub mod merger;
pub mod models;
pub mod pagination;
pub mod request_builder;
pub mod services;
