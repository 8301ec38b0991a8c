use eframe::egui::{self, Pos2, Rect, Ui, Vec2};

use super::super::render_utils::{circle_visible, screen_to_world};
use super::GraphCanvas;

impl GraphCanvas {
    pub(super) fn handle_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.02, 8.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    pub(super) fn handle_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Primary)
            || response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    /// Centers the laid-out graph and zooms so it fills `rect`.
    pub(super) fn fit_to(&mut self, rect: Rect) {
        self.fit_pending = false;
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for position in &self.positions {
            min = min.min(*position);
            max = max.max(*position);
        }
        if !min.x.is_finite() || !max.x.is_finite() {
            self.pan = Vec2::ZERO;
            self.zoom = 1.0;
            return;
        }

        let extent = (max - min).max(Vec2::splat(1.0));
        let usable = rect.size() * 0.9;
        self.zoom = (usable.x / extent.x).min(usable.y / extent.y).clamp(0.02, 4.0);
        self.pan = -((min + max) * 0.5) * self.zoom;
    }

    /// The visible node under the pointer, nearest first.
    pub(super) fn hovered_index(
        &self,
        ui: &Ui,
        rect: Rect,
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) -> Option<usize> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        if !rect.contains(pointer) {
            return None;
        }

        (0..screen_positions.len())
            .filter(|&index| self.node_visible.get(index).copied().unwrap_or(false))
            .filter(|&index| circle_visible(rect, screen_positions[index], screen_radii[index]))
            .filter_map(|index| {
                let distance = screen_positions[index].distance(pointer);
                // small nodes get a little slack so they stay clickable
                (distance <= screen_radii[index].max(5.0)).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }
}
