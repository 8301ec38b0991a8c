use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Result, ViewerError};

use super::payload::{
    RawLink, RawNode, backend_error, parse_correlation_graph, parse_flux_graph,
};
use super::transport::{HttpResponse, Transport, build_url};
use super::types::{
    CorrelationData, CorrelationTable, GraphSnapshot, Link, Node, NodeIdx, NodeKind, NodeMetrics,
    SnapshotFlavor,
};

const FLUX_GRAPH_PATH: &str = "/graph-data";
const CORRELATION_GRAPH_PATH: &str = "/graph-data-correlation";
const FALLBACK_NODE_COLOR: &str = "#888888";
const FALLBACK_LINK_COLOR: &str = "#999999";

/// Fetches graph payloads and turns them into immutable snapshots.
pub struct GraphDataStore {
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl GraphDataStore {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
        }
    }

    pub fn load(
        &self,
        flavor: SnapshotFlavor,
        run_id: &str,
        subsystem: Option<&str>,
    ) -> Result<GraphSnapshot> {
        let url = match flavor {
            SnapshotFlavor::Flux => {
                let mut query = vec![("runId", run_id)];
                if let Some(subsystem) = subsystem.filter(|name| !name.is_empty()) {
                    query.push(("subsystem", subsystem));
                }
                build_url(&self.base_url, FLUX_GRAPH_PATH, &query)
            }
            SnapshotFlavor::Correlation => {
                build_url(&self.base_url, CORRELATION_GRAPH_PATH, &[("runId", run_id)])
            }
        };

        info!(%url, ?flavor, "loading graph snapshot");
        let response = self.transport.get(&url)?;
        let body = successful_body(&url, response)?;

        let snapshot = match flavor {
            SnapshotFlavor::Flux => flux_snapshot_from_bytes(&body)?,
            SnapshotFlavor::Correlation => correlation_snapshot_from_bytes(&body)?,
        };

        info!(
            nodes = snapshot.node_count(),
            links = snapshot.link_count(),
            max_metric = snapshot.max_metric(),
            oversized = snapshot.is_oversized_model(),
            "graph snapshot ready"
        );
        Ok(snapshot)
    }
}

fn successful_body(url: &str, response: HttpResponse) -> Result<Vec<u8>> {
    if response.is_success() {
        return Ok(response.body);
    }

    // The backend reports bad run ids as 4xx with a JSON error body.
    let backend_message = serde_json::from_slice::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|value| value.as_object().and_then(backend_error));

    match backend_message {
        Some(message) => Err(ViewerError::Payload(message)),
        None => Err(ViewerError::fetch(
            url,
            format!("HTTP {} {}", response.status, response.status_text),
        )),
    }
}

pub fn flux_snapshot_from_bytes(raw: &[u8]) -> Result<GraphSnapshot> {
    let graph = parse_flux_graph(raw)?;
    let nodes = graph.nodes.into_iter().map(build_node).collect::<Vec<_>>();

    let mut snapshot = assemble(
        SnapshotFlavor::Flux,
        nodes,
        graph.links,
        graph.subsystems,
        graph.is_oversized_model,
        None,
    )?;

    let link_max = snapshot
        .links
        .iter()
        .map(|link| link.flux)
        .fold(0.0_f64, f64::max);
    snapshot.max_metric = graph.max_flux.max(link_max);
    Ok(snapshot)
}

pub fn correlation_snapshot_from_bytes(raw: &[u8]) -> Result<GraphSnapshot> {
    let graph = parse_correlation_graph(raw)?;
    let nodes = graph.nodes.into_iter().map(build_node).collect::<Vec<_>>();

    let correlation = CorrelationData {
        table: CorrelationTable::new(graph.correlation_matrix),
        filtered_metabolites: graph.filtered_metabolites,
    };

    let mut snapshot = assemble(
        SnapshotFlavor::Correlation,
        nodes,
        graph.links,
        graph.subsystems,
        graph.is_oversized_model,
        Some(correlation),
    )?;

    snapshot.max_metric = snapshot
        .nodes
        .iter()
        .filter(|node| node.kind == NodeKind::Metabolite)
        .map(Node::activity_max)
        .fold(0.0_f64, f64::max);
    Ok(snapshot)
}

fn build_node(raw: RawNode) -> Node {
    let kind = raw
        .kind
        .as_deref()
        .map(NodeKind::parse)
        .unwrap_or_else(|| NodeKind::Other(String::new()));

    let metrics = if kind == NodeKind::Metabolite
        && (raw.activity_max.is_some() || raw.subsystems.is_some() || raw.reactions.is_some())
    {
        NodeMetrics::Metabolite {
            activity_max: raw.activity_max.unwrap_or(0.0).max(0.0),
            activity_sum: raw.activity_sum.unwrap_or(0.0),
            activity_avg: raw.activity_avg.unwrap_or(0.0),
            subsystems: raw.subsystems.unwrap_or_default(),
            reactions: raw.reactions.unwrap_or_default(),
        }
    } else {
        NodeMetrics::None
    };

    Node {
        display_name: raw
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| raw.id.clone()),
        id: raw.id,
        kind,
        color: raw.color.unwrap_or_else(|| FALLBACK_NODE_COLOR.to_owned()),
        metrics,
    }
}

fn assemble(
    flavor: SnapshotFlavor,
    nodes: Vec<Node>,
    raw_links: Vec<RawLink>,
    subsystems: Vec<String>,
    is_oversized_model: bool,
    correlation: Option<CorrelationData>,
) -> Result<GraphSnapshot> {
    let mut index_by_id = HashMap::with_capacity(nodes.len());
    for (index, node) in nodes.iter().enumerate() {
        if index_by_id.insert(node.id.clone(), NodeIdx(index)).is_some() {
            return Err(ViewerError::payload(format!("duplicate node id `{}`", node.id)));
        }
    }

    let resolve = |id: &str, role: &str| {
        index_by_id.get(id).copied().ok_or_else(|| {
            ViewerError::payload(format!("link {role} `{id}` does not match any node"))
        })
    };

    let mut links = Vec::with_capacity(raw_links.len());
    let mut incident = vec![Vec::new(); nodes.len()];
    for raw in raw_links {
        let source = resolve(&raw.source, "source")?;
        let target = resolve(&raw.target, "target")?;
        let flux_signed = raw.flux_signed.unwrap_or(0.0);
        let flux = raw.flux.unwrap_or(flux_signed.abs()).abs();
        if !flux.is_finite() || !flux_signed.is_finite() {
            return Err(ViewerError::payload(format!(
                "link {} -> {} has a non-finite flux",
                raw.source, raw.target
            )));
        }

        let link_index = links.len();
        incident[source.0].push(link_index);
        if target != source {
            incident[target.0].push(link_index);
        }

        links.push(Link {
            source,
            target,
            flux,
            flux_signed,
            coefficient: raw.coefficient.unwrap_or(0.0),
            color: raw
                .color
                .unwrap_or_else(|| FALLBACK_LINK_COLOR.to_owned()),
        });
    }

    debug!(nodes = nodes.len(), links = links.len(), "snapshot assembled");

    Ok(GraphSnapshot {
        flavor,
        nodes,
        links,
        index_by_id,
        incident,
        max_metric: 0.0,
        subsystems,
        is_oversized_model,
        correlation,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct CannedTransport {
        response: Result<HttpResponse>,
        requested: Mutex<Vec<String>>,
    }

    impl Transport for CannedTransport {
        fn get(&self, url: &str) -> Result<HttpResponse> {
            self.requested.lock().unwrap().push(url.to_owned());
            self.response.clone()
        }

        fn post_json(&self, _url: &str, _body: Vec<u8>) -> Result<HttpResponse> {
            unreachable!("loads never post")
        }
    }

    fn canned(status: u16, body: &str) -> Arc<CannedTransport> {
        Arc::new(CannedTransport {
            response: Ok(HttpResponse {
                status,
                status_text: String::new(),
                body: body.as_bytes().to_vec(),
            }),
            requested: Mutex::new(Vec::new()),
        })
    }

    const FLUX_BODY: &str = r##"{
        "nodes": [
            {"id": "R1", "name": "PFK", "kind": "reaction", "color": "#f0f921"},
            {"id": "R2", "kind": "reaction", "color": "#0d0887"},
            {"id": "atp_c", "kind": "metabolite", "color": "#1f77b4"}
        ],
        "links": [
            {"source": "atp_c", "target": "R1", "flux": 10, "fluxSigned": 10, "coefficient": -1, "color": "#f0f921"},
            {"source": "R2", "target": "atp_c", "flux": 2, "fluxSigned": -2, "coefficient": 1, "color": "#0d0887"}
        ],
        "maxFlux": 10,
        "subsystems": ["Glycolysis"]
    }"##;

    #[test]
    fn load_builds_index_and_incident_lists() {
        let transport = canned(200, FLUX_BODY);
        let store = GraphDataStore::new("http://backend", transport.clone());
        let snapshot = store
            .load(SnapshotFlavor::Flux, "run-1", Some("Glycolysis"))
            .unwrap();

        assert_eq!(
            transport.requested.lock().unwrap().as_slice(),
            ["http://backend/graph-data?runId=run-1&subsystem=Glycolysis"]
        );
        let atp = snapshot.node_by_id("atp_c").unwrap();
        assert_eq!(snapshot.incident_links(atp), &[0, 1]);
        assert_eq!(snapshot.links()[0].source, atp);
        assert_eq!(snapshot.max_metric(), 10.0);
        assert_eq!(snapshot.node(NodeIdx(0)).unwrap().display_name, "PFK");
        assert_eq!(snapshot.node(NodeIdx(1)).unwrap().display_name, "R2");
    }

    #[test]
    fn dangling_link_endpoint_is_a_payload_error() {
        let body = r#"{"nodes": [{"id": "R1", "kind": "reaction"}],
                       "links": [{"source": "ghost", "target": "R1", "flux": 1}],
                       "maxFlux": 1}"#;
        let error = flux_snapshot_from_bytes(body.as_bytes()).unwrap_err();
        assert!(matches!(error, ViewerError::Payload(message) if message.contains("ghost")));
    }

    #[test]
    fn max_metric_covers_links_beyond_reported_max() {
        let body = r#"{"nodes": [{"id": "a", "kind": "reaction"}, {"id": "b", "kind": "metabolite"}],
                       "links": [{"source": "a", "target": "b", "flux": 7}],
                       "maxFlux": 3}"#;
        let snapshot = flux_snapshot_from_bytes(body.as_bytes()).unwrap();
        assert_eq!(snapshot.max_metric(), 7.0);
    }

    #[test]
    fn correlation_max_metric_uses_metabolite_activity() {
        let body = r#"{
            "nodes": [
                {"id": "glc", "kind": "metabolite", "activityMax": 4.5, "subsystems": ["A"]},
                {"id": "pyr", "kind": "metabolite", "activityMax": 1.5, "subsystems": ["A"]},
                {"id": "A", "kind": "subsystem"}
            ],
            "links": [{"source": "glc", "target": "A"}, {"source": "pyr", "target": "A"}],
            "correlationMatrix": {"A": {"A": 2}},
            "subsystems": ["A"]
        }"#;
        let snapshot = correlation_snapshot_from_bytes(body.as_bytes()).unwrap();
        assert_eq!(snapshot.max_metric(), 4.5);
        assert_eq!(snapshot.link_metric(&snapshot.links()[1]), 1.5);
        assert_eq!(snapshot.correlation().unwrap().table.value("A", "A"), 2.0);
    }

    #[test]
    fn http_error_with_json_body_is_payload_error() {
        let store = GraphDataStore::new(
            "http://backend",
            canned(400, r#"{"error": "invalid or expired run id"}"#),
        );
        let error = store.load(SnapshotFlavor::Flux, "nope", None).unwrap_err();
        assert_eq!(error, ViewerError::Payload("invalid or expired run id".into()));
    }

    #[test]
    fn http_error_without_body_is_fetch_error() {
        let store = GraphDataStore::new("http://backend", canned(502, "bad gateway"));
        let error = store
            .load(SnapshotFlavor::Correlation, "run", None)
            .unwrap_err();
        assert!(matches!(error, ViewerError::Fetch { .. }));
    }
}
