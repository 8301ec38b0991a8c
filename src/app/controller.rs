//! View state machine shared by the flux and correlation windows.
//!
//! The controller owns the current snapshot, the user's view settings and the
//! inspector panel. It never performs I/O: loads are handed out as
//! [`LoadRequest`]s and their outcomes come back through
//! [`ViewController::complete_load`], tagged with the request id so that a
//! late answer to a superseded request is dropped. The renderer's layout is
//! prepared alongside the snapshot by whoever runs the load.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, trace, warn};

use crate::config::VisualTuning;
use crate::engine::{
    CorrelationMatrix, FilterOptions, InspectorSummary, VisibilityFrame, build_correlation_matrix,
    compute_visibility, inspect,
};
use crate::error::{Result, ViewerError};
use crate::model::{GraphSnapshot, NodeIdx, SnapshotFlavor};

use super::canvas::GraphRenderer;

pub type RequestId = u64;

pub const OVERSIZED_ADVISORY: &str =
    "Large model: only active reactions are shown. Raise the threshold to thin the graph further.";

#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    /// Raw slider value in `[0, 1]`.
    pub threshold: f64,
    pub labels_on: bool,
    pub selected_subsystem: Option<String>,
    pub active_only: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            labels_on: true,
            selected_subsystem: None,
            active_only: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Phase {
    Idle,
    Loading { request: RequestId },
    Ready,
    Error(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewEvent {
    Start,
    Reload,
    SubsystemChanged(Option<String>),
    ThresholdChanged(f64),
    LabelsToggled,
    ActiveOnlyToggled,
    NodeClicked(NodeIdx),
}

/// A fetch the shell should run and report back.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadRequest {
    pub id: RequestId,
    pub flavor: SnapshotFlavor,
    pub run_id: String,
    pub subsystem: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PanelContent {
    Placeholder,
    Summary(InspectorSummary),
    Error(String),
}

/// A loaded snapshot paired with the layout its renderer will draw it with.
pub struct PreparedGraph<L> {
    snapshot: GraphSnapshot,
    layout: L,
}

impl<L> PreparedGraph<L> {
    pub fn prepare<R: GraphRenderer<Layout = L>>(snapshot: GraphSnapshot) -> Self {
        let layout = R::prepare_layout(&snapshot);
        Self { snapshot, layout }
    }

    pub fn snapshot(&self) -> &GraphSnapshot {
        &self.snapshot
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Advisory {
    pub message: String,
    pub expires_at: Instant,
}

pub struct ViewController<R> {
    run_id: String,
    flavor: SnapshotFlavor,
    tuning: VisualTuning,
    state: ViewState,
    phase: Phase,
    last_request: RequestId,
    snapshot: Option<Arc<GraphSnapshot>>,
    /// Subsystem filter the installed snapshot was fetched with.
    loaded_subsystem: Option<String>,
    frame: Option<VisibilityFrame>,
    matrix: Option<Arc<CorrelationMatrix>>,
    panel: PanelContent,
    selected_node: Option<NodeIdx>,
    advisory: Option<Advisory>,
    advisory_shown: bool,
    renderer: R,
}

impl<R: GraphRenderer> ViewController<R> {
    pub fn new(
        run_id: impl Into<String>,
        flavor: SnapshotFlavor,
        tuning: VisualTuning,
        renderer: R,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            flavor,
            tuning,
            state: ViewState::default(),
            phase: Phase::Idle,
            last_request: 0,
            snapshot: None,
            loaded_subsystem: None,
            frame: None,
            matrix: None,
            panel: PanelContent::Placeholder,
            selected_node: None,
            advisory: None,
            advisory_shown: false,
            renderer,
        }
    }

    /// Applies a user event; returns a load to run when one is needed.
    pub fn handle(&mut self, event: ViewEvent) -> Option<LoadRequest> {
        match event {
            ViewEvent::Start | ViewEvent::Reload => Some(self.issue_load()),
            ViewEvent::SubsystemChanged(subsystem) => {
                if self.flavor == SnapshotFlavor::Correlation {
                    debug!("subsystem filter does not apply to the correlation view");
                    return None;
                }
                let subsystem = subsystem.filter(|name| !name.is_empty());
                if self.phase == Phase::Ready && subsystem == self.loaded_subsystem {
                    self.state.selected_subsystem = subsystem;
                    return None;
                }
                self.state.selected_subsystem = subsystem;
                Some(self.issue_load())
            }
            ViewEvent::ThresholdChanged(value) => {
                let value = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
                self.state.threshold = value;
                self.refilter();
                None
            }
            ViewEvent::LabelsToggled => {
                self.state.labels_on = !self.state.labels_on;
                self.renderer.set_labels_visible(self.state.labels_on);
                None
            }
            ViewEvent::ActiveOnlyToggled => {
                self.state.active_only = !self.state.active_only;
                self.refilter();
                None
            }
            ViewEvent::NodeClicked(idx) => {
                self.select_node(idx);
                None
            }
        }
    }

    /// Feeds back the outcome of a load. Returns `false` when the outcome
    /// belongs to a request that has since been superseded.
    pub fn complete_load(
        &mut self,
        request: RequestId,
        result: Result<PreparedGraph<R::Layout>>,
        now: Instant,
    ) -> bool {
        if self.phase != (Phase::Loading { request }) {
            warn!(request, latest = self.last_request, "discarding stale load result");
            return false;
        }

        match result {
            Ok(prepared) => {
                let snapshot = prepared.snapshot();
                info!(
                    request,
                    nodes = snapshot.node_count(),
                    links = snapshot.link_count(),
                    oversized = snapshot.is_oversized_model(),
                    "graph loaded"
                );
                self.install(prepared, now);
                true
            }
            Err(err) => {
                error!(request, %err, "graph load failed");
                let message = err.to_string();
                self.phase = Phase::Error(message.clone());
                self.panel = PanelContent::Error(message);
                true
            }
        }
    }

    /// Expires the advisory once its time is up.
    pub fn tick(&mut self, now: Instant) {
        if self
            .advisory
            .as_ref()
            .is_some_and(|advisory| now >= advisory.expires_at)
        {
            debug!("advisory expired");
            self.advisory = None;
        }
    }

    /// Forwards a click the renderer recorded since the last frame.
    pub fn poll_renderer(&mut self) {
        if let Some(idx) = self.renderer.take_clicked_node() {
            self.select_node(idx);
        }
    }

    pub fn advisory_remaining(&self, now: Instant) -> Option<Duration> {
        self.advisory
            .as_ref()
            .map(|advisory| advisory.expires_at.saturating_duration_since(now))
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn flavor(&self) -> SnapshotFlavor {
        self.flavor
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn snapshot(&self) -> Option<&Arc<GraphSnapshot>> {
        self.snapshot.as_ref()
    }

    pub fn loaded_subsystem(&self) -> Option<&str> {
        self.loaded_subsystem.as_deref()
    }

    pub fn frame(&self) -> Option<&VisibilityFrame> {
        self.frame.as_ref()
    }

    pub fn matrix(&self) -> Option<&Arc<CorrelationMatrix>> {
        self.matrix.as_ref()
    }

    pub fn panel(&self) -> &PanelContent {
        &self.panel
    }

    pub fn selected_node(&self) -> Option<NodeIdx> {
        self.selected_node
    }

    pub fn advisory(&self) -> Option<&Advisory> {
        self.advisory.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    fn issue_load(&mut self) -> LoadRequest {
        self.last_request += 1;
        let request = LoadRequest {
            id: self.last_request,
            flavor: self.flavor,
            run_id: self.run_id.clone(),
            subsystem: match self.flavor {
                SnapshotFlavor::Flux => self.state.selected_subsystem.clone(),
                SnapshotFlavor::Correlation => None,
            },
        };
        if let Phase::Loading { request: previous } = self.phase {
            debug!(previous, next = request.id, "superseding in-flight load");
        }
        self.phase = Phase::Loading {
            request: request.id,
        };
        request
    }

    fn install(&mut self, prepared: PreparedGraph<R::Layout>, now: Instant) {
        let PreparedGraph { snapshot, layout } = prepared;
        if snapshot.is_oversized_model() {
            self.state.active_only = true;
            if !self.advisory_shown {
                self.advisory_shown = true;
                self.advisory = Some(Advisory {
                    message: OVERSIZED_ADVISORY.to_owned(),
                    expires_at: now + self.tuning.advisory_duration,
                });
            }
        }

        let snapshot = Arc::new(snapshot);
        self.matrix = match (snapshot.flavor(), snapshot.correlation()) {
            (SnapshotFlavor::Correlation, Some(correlation)) => Some(Arc::new(
                build_correlation_matrix(snapshot.subsystems(), &correlation.table),
            )),
            _ => None,
        };

        self.renderer.set_graph_data(Arc::clone(&snapshot), layout);
        self.renderer.set_labels_visible(self.state.labels_on);
        self.renderer.set_selected_node(None);
        self.snapshot = Some(snapshot);
        self.loaded_subsystem = self.state.selected_subsystem.clone();
        self.selected_node = None;
        self.panel = PanelContent::Placeholder;
        self.phase = Phase::Ready;
        self.refilter();
    }

    fn refilter(&mut self) {
        let Some(snapshot) = &self.snapshot else {
            trace!("no snapshot to filter yet");
            return;
        };

        let frame = compute_visibility(
            snapshot,
            self.state.threshold,
            FilterOptions {
                active_only: self.state.active_only,
            },
            self.tuning.curve(snapshot.flavor()),
        );
        debug!(
            threshold = frame.threshold,
            nodes = frame.visible_node_count(),
            links = frame.visible_link_count(),
            "visibility recomputed"
        );

        let pushed = self
            .renderer
            .set_node_visibility(&frame.node_visible)
            .and_then(|()| self.renderer.set_link_visibility(&frame.link_visible))
            .and_then(|()| self.renderer.set_visual_weights(&frame.weights));
        swallow_missing_anchor(pushed);

        self.frame = Some(frame);
    }

    fn select_node(&mut self, idx: NodeIdx) {
        let Some(snapshot) = &self.snapshot else {
            trace!(?idx, "click before any graph was loaded");
            return;
        };
        let summary = inspect(snapshot, idx, self.tuning.inspector_fan_out);
        debug!(node = summary.node_id(), "node inspected");

        self.selected_node = Some(idx);
        self.renderer.set_selected_node(Some(idx));
        self.panel = PanelContent::Summary(summary);
    }
}

fn swallow_missing_anchor(result: Result<()>) {
    match result {
        Ok(()) => {}
        Err(ViewerError::MissingAnchor(anchor)) => {
            trace!(anchor, "renderer not ready, skipping update");
        }
        Err(err) => warn!(%err, "renderer rejected update"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{LinkWeight, WeightCurve};
    use crate::test_fixtures::{correlation_snapshot_with_table, flux_snapshot};

    use serde_json::json;

    #[derive(Default)]
    struct RecordingRenderer {
        graph: Option<Arc<GraphSnapshot>>,
        graphs_set: usize,
        laid_out_nodes: Option<usize>,
        node_visible: Vec<bool>,
        link_visible: Vec<bool>,
        weights: Vec<LinkWeight>,
        labels: Option<bool>,
        selected: Option<NodeIdx>,
        clicked: Option<NodeIdx>,
    }

    impl GraphRenderer for RecordingRenderer {
        type Layout = usize;

        fn prepare_layout(snapshot: &GraphSnapshot) -> usize {
            snapshot.node_count()
        }

        fn set_graph_data(&mut self, snapshot: Arc<GraphSnapshot>, layout: usize) {
            self.graph = Some(snapshot);
            self.graphs_set += 1;
            self.laid_out_nodes = Some(layout);
        }

        fn set_node_visibility(&mut self, visible: &[bool]) -> Result<()> {
            self.graph.as_ref().ok_or(ViewerError::MissingAnchor("test"))?;
            self.node_visible = visible.to_vec();
            Ok(())
        }

        fn set_link_visibility(&mut self, visible: &[bool]) -> Result<()> {
            self.graph.as_ref().ok_or(ViewerError::MissingAnchor("test"))?;
            self.link_visible = visible.to_vec();
            Ok(())
        }

        fn set_visual_weights(&mut self, weights: &[LinkWeight]) -> Result<()> {
            self.graph.as_ref().ok_or(ViewerError::MissingAnchor("test"))?;
            self.weights = weights.to_vec();
            Ok(())
        }

        fn set_labels_visible(&mut self, visible: bool) {
            self.labels = Some(visible);
        }

        fn set_selected_node(&mut self, selected: Option<NodeIdx>) {
            self.selected = selected;
        }

        fn take_clicked_node(&mut self) -> Option<NodeIdx> {
            self.clicked.take()
        }
    }

    /// Accepts graphs but never gets far enough to take updates.
    #[derive(Default)]
    struct DetachedRenderer {
        updates_refused: usize,
    }

    impl GraphRenderer for DetachedRenderer {
        type Layout = ();

        fn prepare_layout(_snapshot: &GraphSnapshot) {}

        fn set_graph_data(&mut self, _snapshot: Arc<GraphSnapshot>, _layout: ()) {}

        fn set_node_visibility(&mut self, _visible: &[bool]) -> Result<()> {
            self.updates_refused += 1;
            Err(ViewerError::MissingAnchor("detached"))
        }

        fn set_link_visibility(&mut self, _visible: &[bool]) -> Result<()> {
            self.updates_refused += 1;
            Err(ViewerError::MissingAnchor("detached"))
        }

        fn set_visual_weights(&mut self, _weights: &[LinkWeight]) -> Result<()> {
            self.updates_refused += 1;
            Err(ViewerError::MissingAnchor("detached"))
        }

        fn set_labels_visible(&mut self, _visible: bool) {}

        fn set_selected_node(&mut self, _selected: Option<NodeIdx>) {}

        fn take_clicked_node(&mut self) -> Option<NodeIdx> {
            None
        }
    }

    fn ready(snapshot: GraphSnapshot) -> Result<PreparedGraph<usize>> {
        Ok(PreparedGraph::prepare::<RecordingRenderer>(snapshot))
    }

    fn flux_controller() -> ViewController<RecordingRenderer> {
        ViewController::new(
            "run-7",
            SnapshotFlavor::Flux,
            VisualTuning::default(),
            RecordingRenderer::default(),
        )
    }

    fn two_edge_graph() -> GraphSnapshot {
        flux_snapshot(
            &[("R1", "reaction"), ("R2", "reaction"), ("M", "metabolite")],
            &[("M", "R1", 10.0, 10.0, -1.0), ("R2", "M", 2.0, 2.0, 1.0)],
            10.0,
        )
    }

    fn oversized_graph() -> GraphSnapshot {
        let body = json!({
            "nodes": [
                {"id": "R1", "kind": "reaction"},
                {"id": "M", "kind": "metabolite"},
            ],
            "links": [
                {"source": "M", "target": "R1", "flux": 0.0, "fluxSigned": 0.0, "coefficient": -1.0},
            ],
            "maxFlux": 1.0,
            "isOversizedModel": true,
        });
        crate::model::flux_snapshot_from_bytes(body.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn start_issues_a_load_for_the_run() {
        let mut controller = flux_controller();
        let request = controller.handle(ViewEvent::Start).unwrap();

        assert_eq!(request.run_id, "run-7");
        assert_eq!(request.flavor, SnapshotFlavor::Flux);
        assert_eq!(request.subsystem, None);
        assert_eq!(controller.phase(), &Phase::Loading { request: request.id });
    }

    #[test]
    fn stale_results_are_discarded() {
        let mut controller = flux_controller();
        let first = controller.handle(ViewEvent::Start).unwrap();
        let second = controller
            .handle(ViewEvent::SubsystemChanged(Some("Glycolysis".into())))
            .unwrap();
        assert_eq!(second.subsystem.as_deref(), Some("Glycolysis"));

        let now = Instant::now();
        assert!(!controller.complete_load(first.id, ready(two_edge_graph()), now));
        assert!(controller.snapshot().is_none());
        assert_eq!(controller.phase(), &Phase::Loading { request: second.id });

        assert!(controller.complete_load(second.id, ready(two_edge_graph()), now));
        assert_eq!(controller.phase(), &Phase::Ready);
        assert_eq!(controller.renderer().graphs_set, 1);
        assert_eq!(controller.renderer().laid_out_nodes, Some(3));
    }

    #[test]
    fn a_result_cannot_be_applied_twice() {
        let mut controller = flux_controller();
        let request = controller.handle(ViewEvent::Start).unwrap();
        let now = Instant::now();
        assert!(controller.complete_load(request.id, ready(two_edge_graph()), now));
        assert!(!controller.complete_load(request.id, ready(two_edge_graph()), now));
        assert_eq!(controller.renderer().graphs_set, 1);
    }

    #[test]
    fn threshold_changes_refilter_in_place() {
        let mut controller = flux_controller();
        let request = controller.handle(ViewEvent::Start).unwrap();
        controller.complete_load(request.id, ready(two_edge_graph()), Instant::now());
        assert_eq!(controller.renderer().link_visible, vec![true, true]);

        assert_eq!(controller.handle(ViewEvent::ThresholdChanged(0.5)), None);
        assert_eq!(controller.renderer().link_visible, vec![true, false]);
        assert_eq!(controller.renderer().weights[1].particles, 0);
        assert_eq!(controller.state().threshold, 0.5);
        assert_eq!(controller.phase(), &Phase::Ready);
        assert_eq!(controller.renderer().graphs_set, 1);
    }

    #[test]
    fn filter_events_before_any_graph_are_harmless() {
        let mut controller = flux_controller();
        assert_eq!(controller.handle(ViewEvent::ThresholdChanged(0.3)), None);
        assert_eq!(controller.handle(ViewEvent::ActiveOnlyToggled), None);
        assert_eq!(controller.handle(ViewEvent::NodeClicked(NodeIdx(0))), None);
        assert!(controller.frame().is_none());
        assert_eq!(controller.panel(), &PanelContent::Placeholder);
    }

    #[test]
    fn labels_toggle_reaches_the_renderer() {
        let mut controller = flux_controller();
        controller.handle(ViewEvent::LabelsToggled);
        assert_eq!(controller.renderer().labels, Some(false));
        assert!(!controller.state().labels_on);
    }

    #[test]
    fn errors_fill_the_panel_and_retry_recovers() {
        let mut controller = flux_controller();
        let request = controller.handle(ViewEvent::Start).unwrap();
        let failure = ViewerError::Payload("Run not found".into());
        controller.complete_load(request.id, Err(failure.clone()), Instant::now());

        assert_eq!(controller.phase(), &Phase::Error(failure.to_string()));
        assert_eq!(controller.panel(), &PanelContent::Error(failure.to_string()));

        let retry = controller.handle(ViewEvent::Reload).unwrap();
        assert!(retry.id > request.id);
        controller.complete_load(retry.id, ready(two_edge_graph()), Instant::now());
        assert_eq!(controller.phase(), &Phase::Ready);
        assert_eq!(controller.panel(), &PanelContent::Placeholder);
    }

    #[test]
    fn oversized_models_force_active_only_with_one_advisory() {
        let mut controller = flux_controller();
        let start = Instant::now();
        let first = controller.handle(ViewEvent::Start).unwrap();
        controller.complete_load(first.id, ready(oversized_graph()), start);

        assert!(controller.state().active_only);
        assert_eq!(controller.renderer().link_visible, vec![false]);
        let advisory = controller.advisory().unwrap();
        assert_eq!(advisory.message, OVERSIZED_ADVISORY);
        assert_eq!(controller.advisory_remaining(start), Some(Duration::from_secs(6)));

        controller.tick(start + Duration::from_secs(5));
        assert!(controller.advisory().is_some());
        controller.tick(start + Duration::from_secs(6));
        assert!(controller.advisory().is_none());

        let second = controller.handle(ViewEvent::Reload).unwrap();
        controller.complete_load(
            second.id,
            ready(oversized_graph()),
            start + Duration::from_secs(7),
        );
        assert!(controller.advisory().is_none());
        assert!(controller.state().active_only);
    }

    #[test]
    fn clicks_fill_the_inspector() {
        let mut controller = flux_controller();
        let request = controller.handle(ViewEvent::Start).unwrap();
        controller.complete_load(request.id, ready(two_edge_graph()), Instant::now());

        let metabolite = controller.snapshot().unwrap().node_by_id("M").unwrap();
        controller.renderer_mut().clicked = Some(metabolite);
        controller.poll_renderer();

        assert_eq!(controller.selected_node(), Some(metabolite));
        assert_eq!(controller.renderer().selected, Some(metabolite));
        match controller.panel() {
            PanelContent::Summary(InspectorSummary::FluxNeighborhood { id, inputs, outputs, .. }) => {
                assert_eq!(id, "M");
                assert_eq!(inputs.len(), 1);
                assert_eq!(outputs.len(), 1);
            }
            other => panic!("unexpected panel {other:?}"),
        }
    }

    #[test]
    fn unchanged_subsystem_does_not_reload() {
        let mut controller = flux_controller();
        let request = controller
            .handle(ViewEvent::SubsystemChanged(Some("TCA".into())))
            .unwrap();
        controller.complete_load(request.id, ready(two_edge_graph()), Instant::now());

        assert_eq!(controller.handle(ViewEvent::SubsystemChanged(Some("TCA".into()))), None);
        let cleared = controller.handle(ViewEvent::SubsystemChanged(None)).unwrap();
        assert_eq!(cleared.subsystem, None);
    }

    #[test]
    fn failed_subsystem_load_can_be_retried_by_reselecting() {
        let mut controller = flux_controller();
        let start = controller.handle(ViewEvent::Start).unwrap();
        controller.complete_load(start.id, ready(two_edge_graph()), Instant::now());

        let filtered = controller
            .handle(ViewEvent::SubsystemChanged(Some("TCA".into())))
            .unwrap();
        let failure = ViewerError::fetch("http://backend/graph-data", "timed out");
        controller.complete_load(filtered.id, Err(failure), Instant::now());
        assert!(matches!(controller.phase(), Phase::Error(_)));
        assert_eq!(controller.loaded_subsystem(), None);

        let retry = controller
            .handle(ViewEvent::SubsystemChanged(Some("TCA".into())))
            .unwrap();
        assert_eq!(retry.subsystem.as_deref(), Some("TCA"));
        controller.complete_load(retry.id, ready(two_edge_graph()), Instant::now());
        assert_eq!(controller.loaded_subsystem(), Some("TCA"));
    }

    #[test]
    fn returning_to_the_shown_subsystem_while_loading_still_reloads() {
        let mut controller = flux_controller();
        let start = controller.handle(ViewEvent::Start).unwrap();
        controller.complete_load(start.id, ready(two_edge_graph()), Instant::now());

        controller.handle(ViewEvent::SubsystemChanged(Some("TCA".into())));
        let back = controller.handle(ViewEvent::SubsystemChanged(None)).unwrap();
        assert_eq!(back.subsystem, None);
        assert_eq!(controller.phase(), &Phase::Loading { request: back.id });
    }

    #[test]
    fn renderer_without_anchor_leaves_the_view_ready() {
        let mut controller = ViewController::new(
            "run-7",
            SnapshotFlavor::Flux,
            VisualTuning::default(),
            DetachedRenderer::default(),
        );
        let request = controller.handle(ViewEvent::Start).unwrap();
        let prepared = PreparedGraph::prepare::<DetachedRenderer>(two_edge_graph());
        assert!(controller.complete_load(request.id, Ok(prepared), Instant::now()));
        assert_eq!(controller.phase(), &Phase::Ready);

        assert_eq!(controller.handle(ViewEvent::ThresholdChanged(0.5)), None);
        assert_eq!(controller.phase(), &Phase::Ready);
        assert_eq!(controller.frame().unwrap().link_visible, vec![true, false]);
        assert_eq!(controller.renderer().updates_refused, 2);
    }

    #[test]
    fn correlation_view_builds_the_matrix_once_per_snapshot() {
        let mut controller = ViewController::new(
            "run-7",
            SnapshotFlavor::Correlation,
            VisualTuning::default(),
            RecordingRenderer::default(),
        );
        let request = controller.handle(ViewEvent::Start).unwrap();
        assert_eq!(controller.handle(ViewEvent::SubsystemChanged(Some("A".into()))), None);

        let snapshot = correlation_snapshot_with_table(
            &[("glc", 4.0, &["A"]), ("pyr", 2.0, &["B"])],
            &["A", "B"],
            json!({"A": {"A": 0.0, "B": 3.0}, "B": {"A": 3.0, "B": 0.0}}),
        );
        controller.complete_load(request.id, ready(snapshot), Instant::now());

        let matrix = Arc::clone(controller.matrix().unwrap());
        assert_eq!(matrix.size(), 2);
        assert_eq!(matrix.value(0, 1), 3.0);

        controller.handle(ViewEvent::ThresholdChanged(0.9));
        assert!(Arc::ptr_eq(&matrix, controller.matrix().unwrap()));
        assert_eq!(
            controller.renderer().weights[0].width,
            WeightCurve::CORRELATION.weight(1.0).width
        );
    }
}
