use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 12;
const MAX_DEPTH: usize = 10;

#[derive(Clone, Copy)]
struct QuadBounds {
    center: Vec2,
    half_extent: f32,
}

impl QuadBounds {
    fn from_points(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);

        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }

        if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
            return None;
        }

        let span = (max - min).max(vec2(1.0, 1.0));
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span.max_elem() * 0.5 + 1.0,
        })
    }

    fn contains(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half_extent
            && (point.y - self.center.y).abs() <= self.half_extent
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let offset = match quadrant {
            0 => vec2(-quarter, -quarter),
            1 => vec2(quarter, -quarter),
            2 => vec2(-quarter, quarter),
            _ => vec2(quarter, quarter),
        };

        Self {
            center: self.center + offset,
            half_extent: quarter,
        }
    }

    fn quadrant_for(self, point: Vec2) -> usize {
        match (point.x >= self.center.x, point.y >= self.center.y) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        }
    }

    fn side_length(self) -> f32 {
        self.half_extent * 2.0
    }
}

/// Barnes-Hut tree over node positions. Far cells act as one body at
/// their centre of mass, so a repulsion pass costs about `n log n`.
pub(super) struct QuadNode {
    bounds: QuadBounds,
    center_of_mass: Vec2,
    mass: f32,
    indices: Vec<usize>,
    children: [Option<Box<QuadNode>>; 4],
}

/// Coefficients of one repulsion pass.
#[derive(Clone, Copy)]
pub(super) struct Repulsion {
    /// Force at distance `d` is `strength / d`.
    pub(super) strength: f32,
    /// Cells with `side / distance` below this are approximated.
    pub(super) theta: f32,
}

impl QuadNode {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let bounds = QuadBounds::from_points(positions)?;
        let indices = (0..positions.len()).collect::<Vec<_>>();
        Some(Self::build_node(bounds, indices, positions, 0))
    }

    fn build_node(bounds: QuadBounds, indices: Vec<usize>, positions: &[Vec2], depth: usize) -> Self {
        let mass = indices.len() as f32;
        let mut center_of_mass = indices
            .iter()
            .fold(Vec2::ZERO, |sum, &index| sum + positions[index]);
        if mass > 0.0 {
            center_of_mass /= mass;
        }

        let mut node = Self {
            bounds,
            center_of_mass,
            mass,
            indices,
            children: std::array::from_fn(|_| None),
        };

        if depth >= MAX_DEPTH || node.indices.len() <= LEAF_CAPACITY {
            return node;
        }

        let mut buckets = std::array::from_fn::<_, 4, _>(|_| Vec::new());
        for &index in &node.indices {
            buckets[bounds.quadrant_for(positions[index])].push(index);
        }

        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return node;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            node.children[quadrant] = Some(Box::new(Self::build_node(
                bounds.child(quadrant),
                bucket,
                positions,
                depth + 1,
            )));
        }
        node.indices.clear();
        node
    }

    fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    /// Adds the repulsion every other node exerts on `index`. Within leaves
    /// the sum is exact and `overlap` is called for each close neighbour.
    pub(super) fn accumulate_repulsion(
        &self,
        index: usize,
        positions: &[Vec2],
        params: Repulsion,
        overlap: &mut impl FnMut(usize, Vec2, f32),
        force: &mut Vec2,
    ) {
        if self.mass <= 0.0 {
            return;
        }

        let point = positions[index];

        if self.is_leaf() {
            for &other in &self.indices {
                if other == index {
                    continue;
                }
                let delta = point - positions[other];
                let distance = delta.length().max(0.5);
                let direction = delta / distance;
                *force += direction * (params.strength / distance);
                overlap(other, direction, distance);
            }
            return;
        }

        let delta = point - self.center_of_mass;
        let distance = delta.length().max(0.5);
        let can_approximate = !self.bounds.contains(point)
            && self.bounds.side_length() / distance < params.theta
            && self.mass > 1.0;

        if can_approximate {
            *force += delta / distance * (params.strength * self.mass / distance);
            return;
        }

        for child in self.children.iter().flatten() {
            child.accumulate_repulsion(index, positions, params, overlap, force);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact_repulsion(index: usize, positions: &[Vec2], strength: f32) -> Vec2 {
        positions
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != index)
            .fold(Vec2::ZERO, |sum, (_, other)| {
                let delta = positions[index] - *other;
                let distance = delta.length().max(0.5);
                sum + delta / distance * (strength / distance)
            })
    }

    #[test]
    fn far_clusters_are_approximated_closely() {
        let mut positions = vec![vec2(-2_000.0, 0.0)];
        for row in 0..20 {
            for col in 0..20 {
                positions.push(vec2(col as f32 * 5.0, row as f32 * 5.0));
            }
        }
        let tree = QuadNode::build(&positions).unwrap();
        let params = Repulsion {
            strength: 1_000.0,
            theta: 0.72,
        };

        let mut approx_force = Vec2::ZERO;
        tree.accumulate_repulsion(0, &positions, params, &mut |_, _, _| {}, &mut approx_force);
        let exact = exact_repulsion(0, &positions, params.strength);

        let error = (approx_force - exact).length() / exact.length();
        assert!(error < 0.05, "relative error {error}");
    }

    #[test]
    fn small_sets_stay_in_one_exact_leaf() {
        let positions = [vec2(0.0, 0.0), vec2(3.0, 0.0), vec2(0.0, 4.0)];
        let tree = QuadNode::build(&positions).unwrap();
        assert!(tree.is_leaf());

        let mut neighbours = Vec::new();
        let mut force = Vec2::ZERO;
        let params = Repulsion {
            strength: 12.0,
            theta: 0.72,
        };
        tree.accumulate_repulsion(
            0,
            &positions,
            params,
            &mut |other, _, distance| neighbours.push((other, distance)),
            &mut force,
        );

        assert_eq!(neighbours, vec![(1, 3.0), (2, 4.0)]);
        assert_eq!(force, exact_repulsion(0, &positions, 12.0));
    }

    #[test]
    fn non_finite_positions_build_no_tree() {
        assert!(QuadNode::build(&[vec2(f32::NAN, 0.0)]).is_none());
        assert!(QuadNode::build(&[]).is_none());
    }
}
