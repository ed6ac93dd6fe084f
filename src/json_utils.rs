use crate::errors::AppError;
use serde_json::{Map, Value};

/// Whether a value carries information: not null, not `false`, not a blank
/// string, not an empty array or object.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}

/// Drops absent and blank entries from an object.
pub fn exclude_empty_values(obj: &Map<String, Value>) -> Map<String, Value> {
    obj.iter()
        .filter(|(_, v)| is_present(v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Parses a raw JSON input field.
pub fn parse_json_input(field: &str, raw: &str) -> Result<Value, AppError> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::InvalidInput(format!("'{}' is not valid JSON: {}", field, e)))
}

/// A parameter that may arrive either as a JSON string or already parsed.
pub fn json_param(field: &str, value: &Value) -> Result<Value, AppError> {
    match value {
        Value::String(raw) if raw.trim().is_empty() => Ok(Value::Object(Map::new())),
        Value::String(raw) => parse_json_input(field, raw),
        other => Ok(other.clone()),
    }
}

/// Recursively merges `source` into `target`.
///
/// Objects merge key by key. When the existing value is an array, the
/// incoming value is appended (arrays are extended element-wise). Any other
/// collision is overwritten by the incoming value.
pub fn deep_merge(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, incoming) in source {
        match (target.get_mut(key), incoming) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            (Some(Value::Array(existing)), Value::Array(incoming)) => {
                existing.extend(incoming.iter().cloned());
            }
            (Some(Value::Array(existing)), scalar) => {
                existing.push(scalar.clone());
            }
            _ => {
                target.insert(key.clone(), incoming.clone());
            }
        }
    }
}

/// Deep-merges JSON objects supplied across several input items.
pub fn merge_json_inputs(field: &str, inputs: &[Value]) -> Result<Map<String, Value>, AppError> {
    let mut merged = Map::new();
    for input in inputs {
        match json_param(field, input)? {
            Value::Object(obj) => deep_merge(&mut merged, &obj),
            Value::Null => {}
            other => {
                return Err(AppError::InvalidInput(format!(
                    "'{}' must be a JSON object, got {}",
                    field,
                    type_name(&other)
                )))
            }
        }
    }
    if merged.is_empty() {
        return Err(AppError::EmptyInput(format!(
            "'{}' produced an empty object across all input items",
            field
        )));
    }
    Ok(merged)
}

/// Combines the responses of a chunked call into one envelope.
///
/// Top-level arrays are concatenated in chunk order; every other key takes
/// the value of the latest chunk that carried it.
pub fn concat_responses(responses: Vec<Value>) -> Value {
    let mut iter = responses.into_iter();
    let first = match iter.next() {
        Some(first) => first,
        None => return Value::Null,
    };
    let mut combined = match first {
        Value::Object(map) => map,
        other => {
            let mut rest: Vec<Value> = vec![other];
            rest.extend(iter);
            return Value::Array(rest);
        }
    };
    for response in iter {
        let Value::Object(map) = response else {
            continue;
        };
        for (key, value) in map {
            match (combined.get_mut(&key), value) {
                (Some(Value::Array(existing)), Value::Array(more)) => existing.extend(more),
                (_, value) => {
                    combined.insert(key, value);
                }
            }
        }
    }
    Value::Object(combined)
}

/// The `data` rows of a response envelope, or an empty slice.
pub fn response_rows(response: &Value) -> &[Value] {
    response
        .get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_exclude_empty_values() {
        let cleaned = exclude_empty_values(&obj(json!({
            "name": "  ",
            "domain": "microsoft.com",
            "email": null,
            "flag": false,
            "n": 0
        })));
        assert_eq!(Value::Object(cleaned), json!({"domain": "microsoft.com", "n": 0}));
    }

    #[test]
    fn test_parse_json_input_rejects_garbage() {
        let err = parse_json_input("body", "{not json").unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_deep_merge_recurses_and_appends() {
        let mut target = obj(json!({
            "filters": {"country_code": {"values": ["us"]}},
            "business_ids": ["a"],
            "size": 10
        }));
        deep_merge(
            &mut target,
            &obj(json!({
                "filters": {"company_size": {"values": ["1-10"]}},
                "business_ids": "b",
                "size": 20
            })),
        );

        assert_eq!(
            Value::Object(target),
            json!({
                "filters": {
                    "country_code": {"values": ["us"]},
                    "company_size": {"values": ["1-10"]}
                },
                "business_ids": ["a", "b"],
                "size": 20
            })
        );
    }

    #[test]
    fn test_merge_json_inputs_empty_is_error() {
        let err = merge_json_inputs("json_input", &[json!("{}"), json!({})]).unwrap_err();
        assert!(matches!(err, AppError::EmptyInput(_)));

        let merged =
            merge_json_inputs("json_input", &[json!("{\"a\": [1]}"), json!({"a": [2]})]).unwrap();
        assert_eq!(merged["a"], json!([1, 2]));
    }

    #[test]
    fn test_concat_responses() {
        let combined = concat_responses(vec![
            json!({"response_context": {"n": 1}, "data": [{"id": 1}]}),
            json!({"response_context": {"n": 2}, "data": [{"id": 2}]}),
        ]);
        assert_eq!(combined["data"], json!([{"id": 1}, {"id": 2}]));
        assert_eq!(combined["response_context"], json!({"n": 2}));
        assert_eq!(concat_responses(vec![]), Value::Null);
    }
}
