//! Host-level execution: one operation over a list of input items.

use crate::errors::AppError;
use crate::json_utils::merge_json_inputs;
use crate::models::{NodeParameters, OperationKind};
use crate::request_builder::{Params, JSON_INPUT_FIELD};
use crate::services::ExploriumService;
use serde_json::{json, Value};

/// Item flag asking for every item's `json_input` to be deep-merged into a
/// single request.
pub const MERGE_INPUT_ITEMS_FIELD: &str = "merge_input_items";

fn error_record(error: &AppError) -> Value {
    json!({ "error": error.to_string() })
}

/// Collapses all items into one when the first item asks for it.
fn merged_items(items: &[NodeParameters]) -> Result<Option<NodeParameters>, AppError> {
    let first = match items.first() {
        Some(first) => first,
        None => return Ok(None),
    };
    let reader = Params::new(first);
    if !(reader.use_json_input() && reader.bool(MERGE_INPUT_ITEMS_FIELD).unwrap_or(false)) {
        return Ok(None);
    }

    let inputs: Vec<Value> = items
        .iter()
        .filter_map(|item| item.get(JSON_INPUT_FIELD).cloned())
        .collect();
    let merged = merge_json_inputs(JSON_INPUT_FIELD, &inputs)?;
    tracing::debug!(
        "Merged json_input of {} items into {} keys",
        items.len(),
        merged.len()
    );

    let mut params = first.clone();
    params.insert(JSON_INPUT_FIELD.to_string(), Value::Object(merged));
    Ok(Some(params))
}

/// Runs `operation` for each input item, in order, and returns the output records.
///
/// With `continue_on_fail`, an item that fails contributes the records it
/// produced before failing followed by `{error: message}`, and the
/// remaining items still run. Without it the first failure is returned.
pub async fn execute_operation(
    service: &ExploriumService,
    operation: &str,
    items: &[NodeParameters],
    continue_on_fail: bool,
) -> Result<Vec<Value>, AppError> {
    let mut output = Vec::new();

    let operation: OperationKind = match operation.parse() {
        Ok(op) => op,
        Err(e) if continue_on_fail => {
            output.push(error_record(&e));
            return Ok(output);
        }
        Err(e) => return Err(e),
    };

    if items.is_empty() {
        let e = AppError::ValidationError(format!(
            "Operation {} cannot be executed without input items",
            operation
        ));
        if continue_on_fail {
            output.push(error_record(&e));
            return Ok(output);
        }
        return Err(e);
    }

    let merged = match merged_items(items) {
        Ok(merged) => merged,
        Err(e) if continue_on_fail => {
            output.push(error_record(&e));
            return Ok(output);
        }
        Err(e) => return Err(e),
    };
    let items: Vec<&NodeParameters> = match &merged {
        Some(params) => vec![params],
        None => items.iter().collect(),
    };

    for (index, params) in items.into_iter().enumerate() {
        let mut records = Vec::new();
        match service.run(operation, params, &mut records).await {
            Ok(()) => output.append(&mut records),
            Err(e) => {
                if e.is_input_error() {
                    tracing::warn!("Item {} of {} rejected: {}", index, operation, e);
                } else {
                    tracing::error!("Item {} of {} failed: {}", index, operation, e);
                }
                if !continue_on_fail {
                    return Err(e);
                }
                output.append(&mut records);
                output.push(error_record(&e));
            }
        }
    }

    Ok(output)
}
