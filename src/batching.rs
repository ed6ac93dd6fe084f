use crate::errors::{AppError, ResultExt};
use crate::explorium_client::{HttpRequest, HttpTransport};
use serde_json::Value;

/// Number of calls needed to send `len` items at `limit` per call.
pub fn chunk_count(len: usize, limit: usize) -> usize {
    len.div_ceil(limit.max(1))
}

/// Splits `items` into consecutive slices of at most `limit` elements.
pub fn chunk_ids<T>(items: &[T], limit: usize) -> Vec<&[T]> {
    items.chunks(limit.max(1)).collect()
}

/// Sends one request per chunk, strictly in order, awaiting each response
/// before building the next request.
///
/// `build` receives the chunk and must re-attach any per-request metadata.
/// The first failing chunk aborts the remaining ones.
pub async fn dispatch_chunked<T, F>(
    transport: &dyn HttpTransport,
    items: &[T],
    limit: usize,
    label: &str,
    mut build: F,
) -> Result<Vec<Value>, AppError>
where
    F: FnMut(&[T]) -> HttpRequest,
{
    let chunks = chunk_ids(items, limit);
    let total = chunks.len();
    let mut responses = Vec::with_capacity(total);

    for (index, chunk) in chunks.into_iter().enumerate() {
        tracing::debug!(
            "{}: sending chunk {}/{} ({} items)",
            label,
            index + 1,
            total,
            chunk.len()
        );
        let response = transport
            .send(build(chunk))
            .await
            .with_context(|| format!("{} chunk {}/{}", label, index + 1, total))?;
        responses.push(response);
    }

    Ok(responses)
}
