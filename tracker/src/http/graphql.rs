//! GraphQL envelope handling and edge/node extraction

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::errors::ApiError;

/// Request body sent to the endpoint
#[derive(Debug, Serialize)]
pub struct GraphqlRequest<'a> {
    pub query: &'a str,
    pub variables: Value,
}

/// Response envelope
#[derive(Debug, Deserialize)]
pub struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<Value>,

    #[serde(default)]
    pub errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}

const AUTH_MARKERS: [&str; 5] = [
    "not authorized",
    "unauthorized",
    "unauthenticated",
    "authentication",
    "forbidden",
];

/// Unwrap the `data` payload. Any reported error fails the whole response,
/// even when partial data came along with it.
pub fn into_data(response: GraphqlResponse) -> Result<Value, ApiError> {
    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        return Err(classify_errors(&errors));
    }

    match response.data {
        Some(Value::Null) | None => Err(ApiError::MalformedResponse(
            "response carries no data".to_string(),
        )),
        Some(data) => Ok(data),
    }
}

pub fn classify_errors(errors: &[GraphqlError]) -> ApiError {
    let message = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");

    let lowered = message.to_lowercase();
    if AUTH_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        ApiError::Unauthorized(message)
    } else {
        ApiError::MalformedResponse(message)
    }
}

fn lookup<'a>(data: &'a Value, path: &[&str]) -> Result<&'a Value, ApiError> {
    path.iter().try_fold(data, |value, field| {
        value
            .get(field)
            .filter(|v| !v.is_null())
            .ok_or_else(|| ApiError::MalformedResponse(format!("missing field `{}`", path.join("."))))
    })
}

/// Decode every element of a JSON array. Elements that fail to decode are
/// skipped so one odd record does not hide its siblings.
fn decode_each<T: DeserializeOwned>(items: &[Value], what: &str) -> Vec<T> {
    items
        .iter()
        .filter_map(|item| match T::deserialize(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!("Skipping undecodable {}: {}", what, e);
                None
            }
        })
        .collect()
}

/// Extract `<path>.edges[].node` as a list of `T`
pub fn nodes<T: DeserializeOwned>(data: &Value, path: &[&str]) -> Result<Vec<T>, ApiError> {
    let connection = lookup(data, path)?;
    let edges = connection
        .get("edges")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::MalformedResponse(format!("`{}` has no edges", path.join("."))))?;

    let nodes: Vec<Value> = edges
        .iter()
        .filter_map(|edge| edge.get("node").cloned())
        .collect();

    Ok(decode_each(&nodes, path.last().copied().unwrap_or("node")))
}

/// Extract a plain list found at `path`
pub fn list<T: DeserializeOwned>(data: &Value, path: &[&str]) -> Result<Vec<T>, ApiError> {
    let items = lookup(data, path)?
        .as_array()
        .ok_or_else(|| ApiError::MalformedResponse(format!("`{}` is not a list", path.join("."))))?;

    Ok(decode_each(items, path.last().copied().unwrap_or("item")))
}
