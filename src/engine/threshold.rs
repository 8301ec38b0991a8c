use crate::model::{GraphSnapshot, NodeIdx, NodeKind, SnapshotFlavor};

/// Maps a normalized metric `n` to stroke width, particle count and speed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightCurve {
    pub width_base: f64,
    pub width_scale: f64,
    pub particle_base: f64,
    pub particle_scale: f64,
    pub speed_base: f64,
    pub speed_scale: f64,
}

impl WeightCurve {
    pub const FLUX: Self = Self {
        width_base: 1.5,
        width_scale: 6.0,
        particle_base: 1.0,
        particle_scale: 4.0,
        speed_base: 0.002,
        speed_scale: 0.03,
    };

    pub const CORRELATION: Self = Self {
        width_base: 0.0,
        width_scale: 1.5,
        particle_base: 1.0,
        particle_scale: 3.0,
        speed_base: 0.002,
        speed_scale: 0.03,
    };

    pub fn weight(&self, normalized: f64) -> LinkWeight {
        let n = normalized.clamp(0.0, 1.0);
        LinkWeight {
            width: (self.width_base + self.width_scale * n) as f32,
            particles: (self.particle_base + self.particle_scale * n).round().max(0.0) as u32,
            particle_speed: (self.speed_base + self.speed_scale * n) as f32,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkWeight {
    pub width: f32,
    pub particles: u32,
    pub particle_speed: f32,
}

impl LinkWeight {
    fn hidden(self) -> Self {
        Self {
            particles: 0,
            particle_speed: 0.0,
            ..self
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Additionally require a strictly positive metric.
    pub active_only: bool,
}

/// Per-node and per-link decisions for one (snapshot, threshold) pair.
#[derive(Clone, Debug, PartialEq)]
pub struct VisibilityFrame {
    pub sensitivity: f64,
    pub threshold: f64,
    pub node_visible: Vec<bool>,
    pub link_visible: Vec<bool>,
    pub weights: Vec<LinkWeight>,
}

impl VisibilityFrame {
    pub fn visible_node_count(&self) -> usize {
        self.node_visible.iter().filter(|visible| **visible).count()
    }

    pub fn visible_link_count(&self) -> usize {
        self.link_visible.iter().filter(|visible| **visible).count()
    }

    pub fn is_node_visible(&self, idx: NodeIdx) -> bool {
        self.node_visible.get(idx.index()).copied().unwrap_or(false)
    }
}

/// Quadratic smoothing of the raw slider value; thresholds always use this.
pub fn smoothed_threshold(sensitivity: f64) -> f64 {
    let s = if sensitivity.is_finite() {
        sensitivity.clamp(0.0, 1.0)
    } else {
        0.0
    };
    s * s
}

/// `metric / max_metric`, or `None` when there is nothing to normalize by.
pub fn normalized_metric(metric: f64, max_metric: f64) -> Option<f64> {
    if max_metric > 0.0 && max_metric.is_finite() {
        Some(metric / max_metric)
    } else {
        None
    }
}

fn passes(metric: f64, max_metric: f64, threshold: f64, options: FilterOptions) -> bool {
    if options.active_only && metric <= 0.0 {
        return false;
    }
    normalized_metric(metric, max_metric).is_some_and(|n| n >= threshold)
}

pub fn compute_visibility(
    snapshot: &GraphSnapshot,
    sensitivity: f64,
    options: FilterOptions,
    curve: &WeightCurve,
) -> VisibilityFrame {
    let threshold = smoothed_threshold(sensitivity);
    let max_metric = snapshot.max_metric();

    let mut link_visible = Vec::with_capacity(snapshot.link_count());
    let mut weights = Vec::with_capacity(snapshot.link_count());
    for link in snapshot.links() {
        let metric = snapshot.link_metric(link);
        let visible = passes(metric, max_metric, threshold, options);
        let weight = curve.weight(normalized_metric(metric, max_metric).unwrap_or(0.0));

        link_visible.push(visible);
        weights.push(if visible { weight } else { weight.hidden() });
    }

    let has_visible_link = |idx: usize| {
        snapshot
            .incident_links(NodeIdx(idx))
            .iter()
            .any(|&link| link_visible[link])
    };

    let node_visible = snapshot
        .nodes()
        .iter()
        .enumerate()
        .map(|(idx, node)| match (snapshot.flavor(), &node.kind) {
            (SnapshotFlavor::Flux, _) => has_visible_link(idx),
            (SnapshotFlavor::Correlation, NodeKind::Metabolite) => {
                passes(node.activity_max(), max_metric, threshold, options)
            }
            (SnapshotFlavor::Correlation, NodeKind::Subsystem) => has_visible_link(idx),
            (SnapshotFlavor::Correlation, _) => true,
        })
        .collect();

    VisibilityFrame {
        sensitivity,
        threshold,
        node_visible,
        link_visible,
        weights,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::test_fixtures::{correlation_snapshot, flux_snapshot};

    fn flux_pair() -> GraphSnapshot {
        flux_snapshot(
            &[("R1", "reaction"), ("R2", "reaction"), ("M", "metabolite")],
            &[("M", "R1", 10.0, 10.0, -1.0), ("R2", "M", 2.0, 2.0, 1.0)],
            10.0,
        )
    }

    #[test]
    fn slider_is_squared_and_clamped() {
        assert_relative_eq!(smoothed_threshold(0.5), 0.25);
        assert_eq!(smoothed_threshold(-3.0), 0.0);
        assert_eq!(smoothed_threshold(2.0), 1.0);
        assert_eq!(smoothed_threshold(f64::NAN), 0.0);
    }

    #[test]
    fn half_slider_keeps_only_the_strong_edge() {
        let snapshot = flux_pair();
        let frame = compute_visibility(&snapshot, 0.5, FilterOptions::default(), &WeightCurve::FLUX);

        assert_eq!(frame.link_visible, vec![true, false]);
        let metabolite = snapshot.node_by_id("M").unwrap();
        let weak_reaction = snapshot.node_by_id("R2").unwrap();
        assert!(frame.is_node_visible(metabolite));
        assert!(!frame.is_node_visible(weak_reaction));
    }

    #[test]
    fn extremes_of_the_slider() {
        let snapshot = flux_snapshot(
            &[("R1", "reaction"), ("R2", "reaction"), ("M", "metabolite")],
            &[
                ("M", "R1", 10.0, 10.0, -1.0),
                ("R2", "M", 2.0, -2.0, 1.0),
                ("M", "R2", 0.0, 0.0, -1.0),
            ],
            10.0,
        );
        let opts = FilterOptions::default();

        let open = compute_visibility(&snapshot, 0.0, opts, &WeightCurve::FLUX);
        assert!(open.link_visible.iter().all(|visible| *visible));

        let closed = compute_visibility(&snapshot, 1.0, opts, &WeightCurve::FLUX);
        assert_eq!(closed.link_visible, vec![true, false, false]);

        let active = compute_visibility(&snapshot, 0.0, FilterOptions { active_only: true }, &WeightCurve::FLUX);
        assert_eq!(active.link_visible, vec![true, true, false]);
    }

    #[test]
    fn raising_the_slider_never_reveals_edges() {
        let snapshot = flux_snapshot(
            &[("R1", "reaction"), ("R2", "reaction"), ("R3", "reaction"), ("M", "metabolite")],
            &[
                ("M", "R1", 0.4, 0.4, -1.0),
                ("R2", "M", 3.3, -3.3, 1.0),
                ("M", "R3", 9.1, 9.1, -1.0),
                ("R3", "M", 0.0, 0.0, 1.0),
            ],
            9.1,
        );
        let mut previous: Option<VisibilityFrame> = None;
        for step in 0..=40 {
            let s = step as f64 / 40.0;
            let frame = compute_visibility(&snapshot, s, FilterOptions::default(), &WeightCurve::FLUX);
            if let Some(previous) = &previous {
                for (before, after) in previous.link_visible.iter().zip(&frame.link_visible) {
                    assert!(*before || !*after, "edge appeared when s rose to {s}");
                }
                for (before, after) in previous.node_visible.iter().zip(&frame.node_visible) {
                    assert!(*before || !*after, "node appeared when s rose to {s}");
                }
            }
            previous = Some(frame);
        }
    }

    #[test]
    fn zero_max_metric_hides_everything() {
        let snapshot = flux_snapshot(
            &[("R1", "reaction"), ("M", "metabolite")],
            &[("M", "R1", 0.0, 0.0, -1.0)],
            0.0,
        );
        let frame = compute_visibility(&snapshot, 0.0, FilterOptions::default(), &WeightCurve::FLUX);
        assert_eq!(frame.visible_link_count(), 0);
        assert_eq!(frame.visible_node_count(), 0);
        assert_eq!(frame.weights[0].particles, 0);
    }

    #[test]
    fn flux_weights_follow_the_curve() {
        let snapshot = flux_pair();
        let frame = compute_visibility(&snapshot, 0.0, FilterOptions::default(), &WeightCurve::FLUX);

        assert_relative_eq!(frame.weights[0].width, 7.5);
        assert_eq!(frame.weights[0].particles, 5);
        assert_relative_eq!(frame.weights[0].particle_speed, 0.032);

        assert_relative_eq!(frame.weights[1].width, 2.7, epsilon = 1e-6);
        assert_eq!(frame.weights[1].particles, 2);
    }

    #[test]
    fn hidden_links_carry_no_particles() {
        let snapshot = flux_pair();
        let frame = compute_visibility(&snapshot, 0.9, FilterOptions::default(), &WeightCurve::FLUX);
        assert!(!frame.link_visible[1]);
        assert_eq!(frame.weights[1].particles, 0);
        assert_eq!(frame.weights[1].particle_speed, 0.0);
    }

    #[test]
    fn correlation_subsystems_follow_their_metabolites() {
        let snapshot = correlation_snapshot(
            &[("glc", 8.0, &["A"]), ("pyr", 1.0, &["B"])],
            &["A", "B", "C"],
        );
        let frame = compute_visibility(&snapshot, 0.5, FilterOptions::default(), &WeightCurve::CORRELATION);

        let visible = |id: &str| frame.is_node_visible(snapshot.node_by_id(id).unwrap());
        assert!(visible("glc"));
        assert!(!visible("pyr"));
        assert!(visible("A"));
        assert!(!visible("B"));
        assert!(!visible("C"));

        assert_relative_eq!(frame.weights[0].width, 1.5);
        assert_eq!(frame.weights[0].particles, 4);
    }
}
