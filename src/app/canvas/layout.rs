use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use crate::model::{GraphSnapshot, NodeKind};
use crate::util::stable_pair;

use super::quadtree::{QuadNode, Repulsion};

const BARNES_HUT_THETA: f32 = 0.72;

/// Node placement computed ahead of time, off the UI thread.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CanvasLayout {
    pub(super) positions: Vec<Vec2>,
    pub(super) radii: Vec<f32>,
}

impl CanvasLayout {
    pub fn for_snapshot(snapshot: &GraphSnapshot) -> Self {
        let ids = snapshot
            .nodes()
            .iter()
            .map(|node| node.id.as_str())
            .collect::<Vec<_>>();
        let radii = snapshot
            .nodes()
            .iter()
            .map(|node| node_radius(&node.kind))
            .collect::<Vec<_>>();
        let edges = snapshot
            .links()
            .iter()
            .map(|link| (link.source.index(), link.target.index()))
            .collect::<Vec<_>>();

        let positions = force_layout(&ids, &edges, &radii, iteration_budget(ids.len()));
        Self { positions, radii }
    }

    pub fn node_count(&self) -> usize {
        self.positions.len()
    }
}

/// Each iteration costs about `n log n`; big graphs get fewer of them.
pub(super) fn iteration_budget(node_count: usize) -> usize {
    let n = node_count.max(2) as f64;
    let cost = n * n.log2();
    ((4_000_000.0 / cost) as usize).clamp(30, 180)
}

pub(super) fn node_radius(kind: &NodeKind) -> f32 {
    match kind {
        NodeKind::Reaction => 5.0,
        NodeKind::Metabolite => 3.5,
        NodeKind::Subsystem => 10.0,
        NodeKind::Other(_) => 4.0,
    }
}

pub(super) fn force_layout(
    node_ids: &[&str],
    edges: &[(usize, usize)],
    node_radii: &[f32],
    iterations: usize,
) -> Vec<Vec2> {
    let n = node_ids.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![Vec2::ZERO];
    }

    let base_radius = (n as f32).sqrt() * 40.0;
    let mut positions = node_ids
        .iter()
        .enumerate()
        .map(|(index, id)| {
            let angle = (index as f32 / n as f32) * TAU;
            let (jx, jy) = stable_pair(id);
            let jitter = vec2(jx * 30.0, jy * 30.0);
            let radial = vec2(angle.cos(), angle.sin()) * base_radius;
            radial + jitter
        })
        .collect::<Vec<_>>();

    let area = (base_radius * 2.0).powi(2);
    let k = (area / n as f32).sqrt().max(12.0);
    let mut temperature = (k * 4.0).max(60.0);
    let radius_of = |index: usize| node_radii.get(index).copied().unwrap_or(4.0);
    let repulsion = Repulsion {
        strength: k * k,
        theta: BARNES_HUT_THETA,
    };
    let mut disp = vec![Vec2::ZERO; n];

    for _ in 0..iterations {
        disp.fill(Vec2::ZERO);

        let Some(tree) = QuadNode::build(&positions) else {
            break;
        };
        for (index, force) in disp.iter_mut().enumerate() {
            let mut overlap = |other: usize, direction: Vec2, distance: f32| {
                let min_distance = (radius_of(index) + radius_of(other)) * 2.5;
                if distance < min_distance {
                    *force += direction * (min_distance - distance) * 2.0;
                }
            };
            let mut pushed = Vec2::ZERO;
            tree.accumulate_repulsion(index, &positions, repulsion, &mut overlap, &mut pushed);
            *force += pushed;
        }

        for &(from, to) in edges {
            if from >= n || to >= n || from == to {
                continue;
            }

            let delta = positions[from] - positions[to];
            let distance = delta.length().max(0.5);
            let direction = delta / distance;

            let ideal_length = k + (radius_of(from) + radius_of(to)) * 2.0;
            let force = (distance - ideal_length) * 0.2;

            disp[from] -= direction * force;
            disp[to] += direction * force;
        }

        for (position, d) in positions.iter_mut().zip(&mut disp) {
            *d -= *position * 0.002;
            let length = d.length();
            if length > 0.0 {
                *position += *d / length * length.min(temperature) * 0.9;
            }
        }

        temperature *= 0.955;
        if temperature < 0.5 {
            break;
        }
    }

    positions
}
