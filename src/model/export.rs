use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, ViewerError};

use super::transport::{Transport, build_url};
use super::types::{CorrelationData, CorrelationTable, FilteredMetabolites};

const CORRELATION_EXPORT_PATH: &str = "/export-correlation-matrix";
const RESULTS_EXPORT_PATH: &str = "/export-results";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CorrelationExportRequest<'a> {
    correlation_matrix: &'a CorrelationTable,
    filtered_metabolites: &'a FilteredMetabolites,
    subsystems: &'a [String],
}

/// State of a solved flux-balance run, as handed over by the solver page.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunState {
    pub objective_value: Option<f64>,
    pub objective_function: Option<String>,
    pub fluxes: BTreeMap<String, f64>,
    pub constraints: Vec<ConstraintRow>,
    pub constraint_details: Vec<serde_json::Value>,
    pub kpis: KpiSummary,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConstraintRow {
    pub reaction: String,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KpiSummary {
    pub biomass: Option<f64>,
    pub atp: Option<f64>,
    pub total_flux: Option<f64>,
    pub active_reactions: Option<u64>,
}

/// Posts export requests and returns the spreadsheet bytes.
#[derive(Clone)]
pub struct ExportClient {
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl ExportClient {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
        }
    }

    pub fn export_correlation_matrix(
        &self,
        correlation: &CorrelationData,
        subsystems: &[String],
    ) -> Result<Vec<u8>> {
        let body = serde_json::to_vec(&CorrelationExportRequest {
            correlation_matrix: &correlation.table,
            filtered_metabolites: &correlation.filtered_metabolites,
            subsystems,
        })
        .map_err(|error| ViewerError::Export(format!("could not encode request: {error}")))?;

        self.post(CORRELATION_EXPORT_PATH, body)
    }

    pub fn export_results(&self, run: &RunState) -> Result<Vec<u8>> {
        let body = serde_json::to_vec(run)
            .map_err(|error| ViewerError::Export(format!("could not encode request: {error}")))?;

        self.post(RESULTS_EXPORT_PATH, body)
    }

    fn post(&self, path: &str, body: Vec<u8>) -> Result<Vec<u8>> {
        let url = build_url(&self.base_url, path, &[]);
        let response = self
            .transport
            .post_json(&url, body)
            .map_err(|error| ViewerError::Export(error.to_string()))?;

        if !response.is_success() {
            warn!(%url, status = response.status, "export rejected");
            return Err(ViewerError::Export(format!(
                "{url} answered HTTP {} {}",
                response.status, response.status_text
            )));
        }

        info!(%url, bytes = response.body.len(), "export received");
        Ok(response.body)
    }
}
