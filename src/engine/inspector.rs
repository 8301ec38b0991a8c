use std::collections::HashSet;

use crate::model::{
    GraphSnapshot, NodeIdx, NodeKind, NodeMetrics, ParticipatingReaction, SnapshotFlavor,
};

pub const DEFAULT_FAN_OUT: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FluxDirection {
    Forward,
    Reverse,
}

impl FluxDirection {
    pub fn of(flux_signed: f64) -> Self {
        if flux_signed >= 0.0 {
            Self::Forward
        } else {
            Self::Reverse
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Reverse => "reverse",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FluxNeighbor {
    pub id: String,
    pub kind: NodeKind,
    pub flux_signed: f64,
    pub abs_flux: f64,
    pub direction: FluxDirection,
    pub coefficient: f64,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InspectorSummary {
    FluxNeighborhood {
        id: String,
        name: String,
        kind: NodeKind,
        inputs: Vec<FluxNeighbor>,
        outputs: Vec<FluxNeighbor>,
    },
    Metabolite {
        id: String,
        subsystems: Vec<String>,
        activity_max: f64,
        activity_sum: f64,
        activity_avg: f64,
        reactions: Vec<ParticipatingReaction>,
    },
    Subsystem {
        id: String,
        connected_metabolites: Vec<String>,
        correlation_row: Vec<(String, f64)>,
    },
    Fallback {
        id: String,
    },
}

impl InspectorSummary {
    pub fn node_id(&self) -> &str {
        match self {
            Self::FluxNeighborhood { id, .. }
            | Self::Metabolite { id, .. }
            | Self::Subsystem { id, .. }
            | Self::Fallback { id } => id,
        }
    }

    pub fn ranked_len(&self) -> usize {
        match self {
            Self::FluxNeighborhood {
                inputs, outputs, ..
            } => inputs.len() + outputs.len(),
            _ => 0,
        }
    }
}

/// Summarizes the neighbourhood of `idx`. Unknown nodes and kinds get a fallback.
pub fn inspect(snapshot: &GraphSnapshot, idx: NodeIdx, fan_out: usize) -> InspectorSummary {
    let Some(node) = snapshot.node(idx) else {
        return InspectorSummary::Fallback {
            id: format!("#{}", idx.index()),
        };
    };

    match (snapshot.flavor(), &node.kind) {
        (SnapshotFlavor::Flux, NodeKind::Reaction | NodeKind::Metabolite) => {
            flux_neighborhood(snapshot, idx, fan_out)
        }
        (SnapshotFlavor::Correlation, NodeKind::Metabolite) => metabolite_summary(snapshot, idx),
        (SnapshotFlavor::Correlation, NodeKind::Subsystem) => subsystem_summary(snapshot, idx),
        _ => InspectorSummary::Fallback {
            id: node.id.clone(),
        },
    }
}

fn flux_neighborhood(snapshot: &GraphSnapshot, idx: NodeIdx, fan_out: usize) -> InspectorSummary {
    let node = &snapshot.nodes()[idx.index()];

    let mut ranked = snapshot
        .incident_links(idx)
        .iter()
        .map(|&link_index| {
            let link = &snapshot.links()[link_index];
            let neighbor = &snapshot.nodes()[link.other_end(idx).index()];
            FluxNeighbor {
                id: neighbor.id.clone(),
                kind: neighbor.kind.clone(),
                flux_signed: link.flux_signed,
                abs_flux: link.flux_signed.abs(),
                direction: FluxDirection::of(link.flux_signed),
                coefficient: link.coefficient,
                color: link.color.clone(),
            }
        })
        .collect::<Vec<_>>();

    // Stable sort keeps payload order among equal fluxes.
    ranked.sort_by(|a, b| b.abs_flux.total_cmp(&a.abs_flux));
    ranked.truncate(fan_out);

    let (inputs, rest): (Vec<_>, Vec<_>) = ranked
        .into_iter()
        .partition(|neighbor| neighbor.coefficient < 0.0);
    let outputs = rest
        .into_iter()
        .filter(|neighbor| neighbor.coefficient > 0.0)
        .collect();

    InspectorSummary::FluxNeighborhood {
        id: node.id.clone(),
        name: node.display_name.clone(),
        kind: node.kind.clone(),
        inputs,
        outputs,
    }
}

fn metabolite_summary(snapshot: &GraphSnapshot, idx: NodeIdx) -> InspectorSummary {
    let node = &snapshot.nodes()[idx.index()];

    let (activity_max, activity_sum, activity_avg, subsystems, mut reactions) = match &node.metrics
    {
        NodeMetrics::Metabolite {
            activity_max,
            activity_sum,
            activity_avg,
            subsystems,
            reactions,
        } => (
            *activity_max,
            *activity_sum,
            *activity_avg,
            subsystems.clone(),
            reactions.clone(),
        ),
        NodeMetrics::None => (0.0, 0.0, 0.0, Vec::new(), Vec::new()),
    };

    reactions.sort_by(|a, b| b.flux.abs().total_cmp(&a.flux.abs()));

    InspectorSummary::Metabolite {
        id: node.id.clone(),
        subsystems,
        activity_max,
        activity_sum,
        activity_avg,
        reactions,
    }
}

fn subsystem_summary(snapshot: &GraphSnapshot, idx: NodeIdx) -> InspectorSummary {
    let node = &snapshot.nodes()[idx.index()];

    let mut seen = HashSet::new();
    let connected_metabolites = snapshot
        .incident_links(idx)
        .iter()
        .map(|&link_index| &snapshot.nodes()[snapshot.links()[link_index].other_end(idx).index()])
        .filter(|neighbor| neighbor.kind == NodeKind::Metabolite)
        .filter(|neighbor| seen.insert(neighbor.id.as_str()))
        .map(|neighbor| neighbor.id.clone())
        .collect();

    let correlation_row = snapshot
        .subsystems()
        .iter()
        .map(|column| {
            let value = snapshot
                .correlation()
                .map(|data| data.table.value(column, &node.id))
                .unwrap_or(0.0);
            (column.clone(), value)
        })
        .collect();

    InspectorSummary::Subsystem {
        id: node.id.clone(),
        connected_metabolites,
        correlation_row,
    }
}
