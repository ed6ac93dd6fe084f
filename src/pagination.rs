use crate::endpoints::fetch_path;
use crate::errors::{AppError, ResultExt};
use crate::explorium_client::{HttpRequest, HttpTransport};
use crate::json_utils::response_rows;
use crate::models::{FetchRequest, PaginationCursor};
use serde_json::{json, Value};

/// Drives the fetch endpoint, either for a single page or, with
/// `auto_paginate`, page after page until `size` rows are collected.
pub struct PaginationDriver<'a> {
    transport: &'a dyn HttpTransport,
    request: &'a FetchRequest,
}

impl<'a> PaginationDriver<'a> {
    pub fn new(transport: &'a dyn HttpTransport, request: &'a FetchRequest) -> Self {
        Self { transport, request }
    }

    fn page_request(&self, page: u64) -> Result<HttpRequest, AppError> {
        let mut body = serde_json::to_value(self.request)?;
        body["page"] = json!(page);
        body["page_size"] = json!(self.request.page_size);
        Ok(HttpRequest::post(fetch_path(self.request.entity_type), body))
    }

    fn emit(&self, mut response: Value, rows: Vec<Value>, out: &mut Vec<Value>) {
        if self.request.extract_data {
            out.extend(rows);
        } else {
            if response.get("data").is_some() {
                response["data"] = Value::Array(rows);
            }
            out.push(response);
        }
    }

    /// Runs the fetch and appends its records to `out`.
    ///
    /// Returns the final cursor; for a single-page fetch it reflects that one page.
    pub async fn run(&self, out: &mut Vec<Value>) -> Result<PaginationCursor, AppError> {
        let mut cursor = PaginationCursor {
            current_page: self.request.page,
            fetched_count: 0,
            target_count: self.request.size,
        };

        if !self.request.auto_paginate {
            let response = self.transport.send(self.page_request(cursor.current_page)?).await?;
            let rows = response_rows(&response).to_vec();
            cursor.fetched_count = rows.len() as u64;
            self.emit(response, rows, out);
            return Ok(cursor);
        }

        loop {
            let response = self
                .transport
                .send(self.page_request(cursor.current_page)?)
                .await
                .with_context(|| format!("fetch page {}", cursor.current_page))?;

            let mut rows = response_rows(&response).to_vec();
            if rows.is_empty() {
                tracing::debug!("Page {} is empty, stopping", cursor.current_page);
                break;
            }

            if let Some(total) = response.get("total_results").and_then(Value::as_u64) {
                cursor.target_count = cursor.target_count.min(total);
            }

            let remaining = cursor.target_count.saturating_sub(cursor.fetched_count);
            if remaining == 0 {
                break;
            }
            // The last page can carry more rows than were asked for.
            if rows.len() as u64 > remaining {
                tracing::debug!(
                    "Page {} returned {} rows, keeping {}",
                    cursor.current_page,
                    rows.len(),
                    remaining
                );
                rows.truncate(remaining as usize);
            }

            cursor.fetched_count += rows.len() as u64;
            self.emit(response, rows, out);

            if cursor.fetched_count >= cursor.target_count {
                break;
            }
            cursor.current_page += 1;
        }

        tracing::info!(
            "Fetched {} of {} {} over {} page(s)",
            cursor.fetched_count,
            cursor.target_count,
            self.request.entity_type,
            cursor.current_page - self.request.page + 1
        );
        Ok(cursor)
    }
}
