//! The force-directed graph surface and the capability the controller drives.

use std::sync::Arc;

use eframe::egui::{Color32, Vec2};

use crate::engine::LinkWeight;
use crate::error::{Result, ViewerError};
use crate::model::{GraphSnapshot, NodeIdx};

use super::render_utils::{hex_or, node_fill};

mod draw;
mod interaction;
mod layout;
mod quadtree;

pub use layout::CanvasLayout;

const CANVAS: &str = "graph canvas";

/// Everything the view controller needs from a renderer.
///
/// Calls that arrive before [`GraphRenderer::set_graph_data`] has supplied a
/// graph, or whose slices do not line up with it, fail with
/// [`ViewerError::MissingAnchor`].
pub trait GraphRenderer {
    /// Placement for a snapshot. Built on the load worker, never on the UI
    /// thread.
    type Layout: Send + 'static;

    fn prepare_layout(snapshot: &GraphSnapshot) -> Self::Layout;
    fn set_graph_data(&mut self, snapshot: Arc<GraphSnapshot>, layout: Self::Layout);
    fn set_node_visibility(&mut self, visible: &[bool]) -> Result<()>;
    fn set_link_visibility(&mut self, visible: &[bool]) -> Result<()>;
    fn set_visual_weights(&mut self, weights: &[LinkWeight]) -> Result<()>;
    fn set_labels_visible(&mut self, visible: bool);
    fn set_selected_node(&mut self, selected: Option<NodeIdx>);
    /// Returns the node clicked since the last call, if any.
    fn take_clicked_node(&mut self) -> Option<NodeIdx>;
}

pub struct GraphCanvas {
    snapshot: Option<Arc<GraphSnapshot>>,
    positions: Vec<Vec2>,
    radii: Vec<f32>,
    node_colors: Vec<Color32>,
    link_colors: Vec<Color32>,
    node_visible: Vec<bool>,
    link_visible: Vec<bool>,
    weights: Vec<LinkWeight>,
    labels_visible: bool,
    selected: Option<NodeIdx>,
    clicked: Option<NodeIdx>,
    pan: Vec2,
    zoom: f32,
    fit_pending: bool,
    particle_clock: f64,
}

impl Default for GraphCanvas {
    fn default() -> Self {
        Self {
            snapshot: None,
            positions: Vec::new(),
            radii: Vec::new(),
            node_colors: Vec::new(),
            link_colors: Vec::new(),
            node_visible: Vec::new(),
            link_visible: Vec::new(),
            weights: Vec::new(),
            labels_visible: true,
            selected: None,
            clicked: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            fit_pending: false,
            particle_clock: 0.0,
        }
    }
}

impl GraphCanvas {
    pub fn has_graph(&self) -> bool {
        self.snapshot.is_some()
    }

    fn anchored(&self, len: usize, expected: impl Fn(&GraphSnapshot) -> usize) -> Result<()> {
        match &self.snapshot {
            Some(snapshot) if expected(snapshot) == len => Ok(()),
            _ => Err(ViewerError::MissingAnchor(CANVAS)),
        }
    }
}

impl GraphRenderer for GraphCanvas {
    type Layout = CanvasLayout;

    fn prepare_layout(snapshot: &GraphSnapshot) -> CanvasLayout {
        let layout = CanvasLayout::for_snapshot(snapshot);
        tracing::debug!(
            nodes = snapshot.node_count(),
            links = snapshot.link_count(),
            "laid out graph"
        );
        layout
    }

    fn set_graph_data(&mut self, snapshot: Arc<GraphSnapshot>, layout: CanvasLayout) {
        let CanvasLayout { positions, radii } = if layout.node_count() == snapshot.node_count() {
            layout
        } else {
            tracing::warn!(
                expected = snapshot.node_count(),
                got = layout.node_count(),
                "layout does not match the graph, recomputing"
            );
            Self::prepare_layout(&snapshot)
        };

        let flavor = snapshot.flavor();
        self.node_colors = snapshot
            .nodes()
            .iter()
            .map(|node| node_fill(flavor, &node.kind, &node.color))
            .collect();
        self.link_colors = snapshot
            .links()
            .iter()
            .map(|link| hex_or(&link.color, Color32::from_gray(153)))
            .collect();
        self.node_visible = vec![true; snapshot.node_count()];
        self.link_visible = vec![true; snapshot.link_count()];
        self.weights = vec![
            LinkWeight {
                width: 1.0,
                particles: 0,
                particle_speed: 0.0,
            };
            snapshot.link_count()
        ];
        self.positions = positions;
        self.radii = radii;
        self.selected = None;
        self.clicked = None;
        self.fit_pending = true;
        self.snapshot = Some(snapshot);
    }

    fn set_node_visibility(&mut self, visible: &[bool]) -> Result<()> {
        self.anchored(visible.len(), GraphSnapshot::node_count)?;
        self.node_visible.clear();
        self.node_visible.extend_from_slice(visible);
        Ok(())
    }

    fn set_link_visibility(&mut self, visible: &[bool]) -> Result<()> {
        self.anchored(visible.len(), GraphSnapshot::link_count)?;
        self.link_visible.clear();
        self.link_visible.extend_from_slice(visible);
        Ok(())
    }

    fn set_visual_weights(&mut self, weights: &[LinkWeight]) -> Result<()> {
        self.anchored(weights.len(), GraphSnapshot::link_count)?;
        self.weights.clear();
        self.weights.extend_from_slice(weights);
        Ok(())
    }

    fn set_labels_visible(&mut self, visible: bool) {
        self.labels_visible = visible;
    }

    fn set_selected_node(&mut self, selected: Option<NodeIdx>) {
        self.selected = selected;
    }

    fn take_clicked_node(&mut self) -> Option<NodeIdx> {
        self.clicked.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::flux_snapshot;

    #[test]
    fn updates_before_graph_data_are_rejected() {
        let mut canvas = GraphCanvas::default();
        assert_eq!(
            canvas.set_node_visibility(&[true]),
            Err(ViewerError::MissingAnchor(CANVAS))
        );
        assert!(canvas.set_visual_weights(&[]).is_err());
    }

    fn two_node_graph() -> GraphSnapshot {
        flux_snapshot(
            &[("R1", "reaction"), ("M", "metabolite")],
            &[("M", "R1", 1.0, 1.0, -1.0)],
            1.0,
        )
    }

    fn loaded_canvas(snapshot: GraphSnapshot) -> GraphCanvas {
        let layout = GraphCanvas::prepare_layout(&snapshot);
        let mut canvas = GraphCanvas::default();
        canvas.set_graph_data(Arc::new(snapshot), layout);
        canvas
    }

    #[test]
    fn visibility_must_match_the_current_graph() {
        let mut canvas = loaded_canvas(two_node_graph());

        assert!(canvas.set_node_visibility(&[true, false]).is_ok());
        assert!(canvas.set_link_visibility(&[false]).is_ok());
        assert!(canvas.set_link_visibility(&[false, true]).is_err());
        assert_eq!(canvas.node_visible, vec![true, false]);
        assert_eq!(canvas.link_visible, vec![false]);
    }

    #[test]
    fn prepared_positions_are_installed_as_given() {
        let snapshot = two_node_graph();
        let mut layout = GraphCanvas::prepare_layout(&snapshot);
        layout.positions = vec![Vec2::new(-40.0, 0.0), Vec2::new(40.0, 0.0)];

        let mut canvas = GraphCanvas::default();
        canvas.set_graph_data(Arc::new(snapshot), layout);
        assert_eq!(canvas.positions, vec![Vec2::new(-40.0, 0.0), Vec2::new(40.0, 0.0)]);
        assert_eq!(canvas.radii, vec![5.0, 3.5]);
    }

    #[test]
    fn mismatched_layout_is_recomputed() {
        let mut canvas = GraphCanvas::default();
        canvas.set_graph_data(Arc::new(two_node_graph()), CanvasLayout::default());
        assert_eq!(canvas.positions.len(), 2);
        assert_eq!(canvas.radii.len(), 2);
    }

    #[test]
    fn flux_metabolites_use_the_metabolite_fill() {
        let canvas = loaded_canvas(two_node_graph());
        assert_eq!(canvas.node_colors[1], super::super::render_utils::METABOLITE_FILL);
    }
}
