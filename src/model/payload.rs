use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, ViewerError};

use super::types::{FilteredMetabolites, ParticipatingReaction};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawNode {
    pub(super) id: String,
    #[serde(default)]
    pub(super) name: Option<String>,
    #[serde(default, alias = "group", alias = "type")]
    pub(super) kind: Option<String>,
    #[serde(default)]
    pub(super) color: Option<String>,
    #[serde(default, alias = "activity_max")]
    pub(super) activity_max: Option<f64>,
    #[serde(default, alias = "activity_sum")]
    pub(super) activity_sum: Option<f64>,
    #[serde(default, alias = "activity_avg")]
    pub(super) activity_avg: Option<f64>,
    #[serde(default)]
    pub(super) subsystems: Option<Vec<String>>,
    #[serde(default)]
    pub(super) reactions: Option<Vec<ParticipatingReaction>>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawLink {
    pub(super) source: String,
    pub(super) target: String,
    #[serde(default)]
    pub(super) flux: Option<f64>,
    #[serde(default, alias = "flux_signed")]
    pub(super) flux_signed: Option<f64>,
    #[serde(default, alias = "coeff")]
    pub(super) coefficient: Option<f64>,
    #[serde(default)]
    pub(super) color: Option<String>,
}

#[derive(Clone, Debug)]
pub(super) struct RawFluxGraph {
    pub(super) nodes: Vec<RawNode>,
    pub(super) links: Vec<RawLink>,
    pub(super) max_flux: f64,
    pub(super) subsystems: Vec<String>,
    pub(super) is_oversized_model: bool,
}

#[derive(Clone, Debug)]
pub(super) struct RawCorrelationGraph {
    pub(super) nodes: Vec<RawNode>,
    pub(super) links: Vec<RawLink>,
    pub(super) correlation_matrix: BTreeMap<String, BTreeMap<String, f64>>,
    pub(super) subsystems: Vec<String>,
    pub(super) filtered_metabolites: FilteredMetabolites,
    pub(super) is_oversized_model: bool,
}

/// Extracts the backend's `error` indicator, if the body carries one.
pub(super) fn backend_error(object: &serde_json::Map<String, Value>) -> Option<String> {
    match object.get("error")? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

fn parse_object(raw: &[u8]) -> Result<serde_json::Map<String, Value>> {
    let parsed: Value = serde_json::from_slice(raw)
        .map_err(|error| ViewerError::payload(format!("response is not valid JSON: {error}")))?;
    let Value::Object(object) = parsed else {
        return Err(ViewerError::payload("response is not a JSON object"));
    };

    if let Some(message) = backend_error(&object) {
        return Err(ViewerError::Payload(message));
    }

    Ok(object)
}

fn required_array<T: for<'de> Deserialize<'de>>(
    object: &serde_json::Map<String, Value>,
    key: &str,
) -> Result<Vec<T>> {
    let value = object
        .get(key)
        .ok_or_else(|| ViewerError::payload(format!("missing `{key}` array")))?;
    if !value.is_array() {
        return Err(ViewerError::payload(format!("`{key}` is not an array")));
    }
    Vec::<T>::deserialize(value)
        .map_err(|error| ViewerError::payload(format!("invalid `{key}` entries: {error}")))
}

fn optional<T: for<'de> Deserialize<'de> + Default>(
    object: &serde_json::Map<String, Value>,
    keys: &[&str],
) -> Result<T> {
    let Some(value) = keys.iter().find_map(|key| object.get(*key)) else {
        return Ok(T::default());
    };
    if value.is_null() {
        return Ok(T::default());
    }
    T::deserialize(value)
        .map_err(|error| ViewerError::payload(format!("invalid `{}`: {error}", keys[0])))
}

pub(super) fn parse_flux_graph(raw: &[u8]) -> Result<RawFluxGraph> {
    let object = parse_object(raw)?;

    let max_flux: f64 = optional(&object, &["maxFlux", "max_flux"])?;
    if !max_flux.is_finite() || max_flux < 0.0 {
        return Err(ViewerError::payload(format!("invalid maxFlux {max_flux}")));
    }

    Ok(RawFluxGraph {
        nodes: required_array(&object, "nodes")?,
        links: required_array(&object, "links")?,
        max_flux,
        subsystems: optional(&object, &["subsystems"])?,
        is_oversized_model: optional(&object, &["isOversizedModel", "is_oversized_model"])?,
    })
}

pub(super) fn parse_correlation_graph(raw: &[u8]) -> Result<RawCorrelationGraph> {
    let object = parse_object(raw)?;

    let sparse: BTreeMap<String, BTreeMap<String, Option<f64>>> =
        optional(&object, &["correlationMatrix", "correlation_matrix"])?;

    let mut correlation_matrix = BTreeMap::new();
    for (column, rows) in sparse {
        let mut cells = BTreeMap::new();
        for (row, value) in rows {
            let value = value.unwrap_or(0.0);
            if !value.is_finite() || value < 0.0 {
                return Err(ViewerError::payload(format!(
                    "correlation count for {column}/{row} must be a non-negative number, got {value}"
                )));
            }
            cells.insert(row, value);
        }
        correlation_matrix.insert(column, cells);
    }

    Ok(RawCorrelationGraph {
        nodes: required_array(&object, "nodes")?,
        links: required_array(&object, "links")?,
        correlation_matrix,
        subsystems: optional(&object, &["subsystems"])?,
        filtered_metabolites: optional(&object, &["filteredMetabolites", "filtered_metabolites"])?,
        is_oversized_model: optional(&object, &["isOversizedModel", "is_oversized_model"])?,
    })
}
