use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(pub usize);

impl NodeIdx {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Reaction,
    Metabolite,
    Subsystem,
    Other(String),
}

impl NodeKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "reaction" | "rxn" => Self::Reaction,
            "metabolite" => Self::Metabolite,
            "subsystem" => Self::Subsystem,
            _ => Self::Other(raw.to_owned()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Reaction => "Rxn",
            Self::Metabolite => "Metabolite",
            Self::Subsystem => "Subsystem",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SnapshotFlavor {
    /// Reactions and metabolites joined by stoichiometric links, weighted by flux.
    Flux,
    /// Metabolites joined to the subsystems they belong to, weighted by activity.
    Correlation,
}

impl SnapshotFlavor {
    pub fn metric_label(self) -> &'static str {
        match self {
            Self::Flux => "flux",
            Self::Correlation => "activity",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ParticipatingReaction {
    pub id: String,
    #[serde(default)]
    pub flux: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeMetrics {
    None,
    Metabolite {
        activity_max: f64,
        activity_sum: f64,
        activity_avg: f64,
        subsystems: Vec<String>,
        reactions: Vec<ParticipatingReaction>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: String,
    pub display_name: String,
    pub kind: NodeKind,
    pub color: String,
    pub metrics: NodeMetrics,
}

impl Node {
    pub fn activity_max(&self) -> f64 {
        match &self.metrics {
            NodeMetrics::Metabolite { activity_max, .. } => *activity_max,
            NodeMetrics::None => 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    pub source: NodeIdx,
    pub target: NodeIdx,
    pub flux: f64,
    pub flux_signed: f64,
    pub coefficient: f64,
    pub color: String,
}

impl Link {
    pub fn other_end(&self, node: NodeIdx) -> NodeIdx {
        if self.source == node {
            self.target
        } else {
            self.source
        }
    }
}

/// Sparse subsystem x subsystem counts, keyed column first.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CorrelationTable {
    columns: BTreeMap<String, BTreeMap<String, f64>>,
}

impl CorrelationTable {
    pub fn new(columns: BTreeMap<String, BTreeMap<String, f64>>) -> Self {
        Self { columns }
    }

    /// Count stored under `column` for `row`; absent entries read as zero.
    pub fn value(&self, column: &str, row: &str) -> f64 {
        self.columns
            .get(column)
            .and_then(|entries| entries.get(row))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FilteredMetabolites {
    List(Vec<String>),
    BySubsystem(BTreeMap<String, Vec<String>>),
}

impl Default for FilteredMetabolites {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CorrelationData {
    pub table: CorrelationTable,
    pub filtered_metabolites: FilteredMetabolites,
}

/// One immutable load result. Replaced wholesale, never patched.
#[derive(Clone, Debug)]
pub struct GraphSnapshot {
    pub(crate) flavor: SnapshotFlavor,
    pub(crate) nodes: Vec<Node>,
    pub(crate) links: Vec<Link>,
    pub(crate) index_by_id: HashMap<String, NodeIdx>,
    pub(crate) incident: Vec<Vec<usize>>,
    pub(crate) max_metric: f64,
    pub(crate) subsystems: Vec<String>,
    pub(crate) is_oversized_model: bool,
    pub(crate) correlation: Option<CorrelationData>,
}

impl GraphSnapshot {
    pub fn flavor(&self) -> SnapshotFlavor {
        self.flavor
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, idx: NodeIdx) -> Option<&Node> {
        self.nodes.get(idx.0)
    }

    pub fn node_by_id(&self, id: &str) -> Option<NodeIdx> {
        self.index_by_id.get(id).copied()
    }

    /// Link indices touching `idx`, in payload order.
    pub fn incident_links(&self, idx: NodeIdx) -> &[usize] {
        self.incident.get(idx.0).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn max_metric(&self) -> f64 {
        self.max_metric
    }

    pub fn subsystems(&self) -> &[String] {
        &self.subsystems
    }

    pub fn is_oversized_model(&self) -> bool {
        self.is_oversized_model
    }

    pub fn correlation(&self) -> Option<&CorrelationData> {
        self.correlation.as_ref()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// The per-link quantity that thresholds and weights are computed from.
    pub fn link_metric(&self, link: &Link) -> f64 {
        match self.flavor {
            SnapshotFlavor::Flux => link.flux,
            SnapshotFlavor::Correlation => {
                let source = &self.nodes[link.source.0];
                let target = &self.nodes[link.target.0];
                if source.kind == NodeKind::Metabolite {
                    source.activity_max()
                } else if target.kind == NodeKind::Metabolite {
                    target.activity_max()
                } else {
                    0.0
                }
            }
        }
    }
}
