//! Snapshot builders shared by unit tests.

use serde_json::{Value, json};

use crate::model::{GraphSnapshot, correlation_snapshot_from_bytes, flux_snapshot_from_bytes};

/// `links` are `(source, target, flux, flux_signed, coefficient)`.
pub(crate) fn flux_snapshot(
    nodes: &[(&str, &str)],
    links: &[(&str, &str, f64, f64, f64)],
    max_flux: f64,
) -> GraphSnapshot {
    let nodes = nodes
        .iter()
        .map(|(id, kind)| json!({"id": id, "name": id, "kind": kind, "color": "#1f77b4"}))
        .collect::<Vec<_>>();
    let links = links
        .iter()
        .map(|(source, target, flux, signed, coefficient)| {
            json!({
                "source": source,
                "target": target,
                "flux": flux,
                "fluxSigned": signed,
                "coefficient": coefficient,
                "color": "#f0f921",
            })
        })
        .collect::<Vec<_>>();

    let body = json!({"nodes": nodes, "links": links, "maxFlux": max_flux, "subsystems": []});
    flux_snapshot_from_bytes(body.to_string().as_bytes()).expect("fixture payload is valid")
}

/// `metabolites` are `(id, activity_max, subsystems)`; one link per membership.
pub(crate) fn correlation_snapshot(
    metabolites: &[(&str, f64, &[&str])],
    subsystems: &[&str],
) -> GraphSnapshot {
    correlation_snapshot_with_table(metabolites, subsystems, json!({}))
}

pub(crate) fn correlation_snapshot_with_table(
    metabolites: &[(&str, f64, &[&str])],
    subsystems: &[&str],
    table: Value,
) -> GraphSnapshot {
    let mut nodes = metabolites
        .iter()
        .map(|(id, activity, members)| {
            json!({
                "id": id,
                "kind": "metabolite",
                "activityMax": activity,
                "activitySum": activity * 2.0,
                "activityAvg": activity / 2.0,
                "subsystems": members,
                "reactions": [],
            })
        })
        .collect::<Vec<_>>();
    nodes.extend(
        subsystems
            .iter()
            .map(|id| json!({"id": id, "kind": "subsystem", "color": "#1b7fc1"})),
    );

    let links = metabolites
        .iter()
        .flat_map(|(id, _, members)| {
            members
                .iter()
                .map(move |subsystem| json!({"source": id, "target": subsystem}))
        })
        .collect::<Vec<_>>();

    let body = json!({
        "nodes": nodes,
        "links": links,
        "correlationMatrix": table,
        "subsystems": subsystems,
        "filteredMetabolites": metabolites.iter().map(|(id, _, _)| *id).collect::<Vec<_>>(),
    });
    correlation_snapshot_from_bytes(body.to_string().as_bytes())
        .expect("fixture payload is valid")
}
