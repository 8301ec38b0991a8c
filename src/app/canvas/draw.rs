use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Stroke, Ui, vec2};

use crate::model::{NodeIdx, SnapshotFlavor};

use super::super::render_utils::{
    blend_color, circle_visible, dim_color, draw_background, segment_in_rect, world_to_screen,
};
use super::GraphCanvas;

const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const HOVER_COLOR: Color32 = Color32::from_rgb(255, 164, 101);
const PARTICLE_COLOR: Color32 = Color32::from_rgba_premultiplied(235, 235, 235, 220);
/// Particle speeds are fractions of a link per frame at this rate.
const REFERENCE_FPS: f64 = 60.0;

impl GraphCanvas {
    pub fn show(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        if self.fit_pending {
            self.fit_to(rect);
        }
        self.handle_zoom(ui, rect, &response);
        self.handle_pan(&response);

        draw_background(&painter, rect, self.pan, self.zoom);

        let Some(snapshot) = self.snapshot.clone() else {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No graph loaded",
                FontId::proportional(14.0),
                Color32::from_gray(180),
            );
            return;
        };

        let frame_delta = ui.input(|input| input.stable_dt).clamp(1.0 / 240.0, 1.0 / 10.0);
        self.particle_clock += f64::from(frame_delta);

        let pan = self.pan;
        let zoom = self.zoom;
        let screen_positions = self
            .positions
            .iter()
            .map(|world| world_to_screen(rect, pan, zoom, *world))
            .collect::<Vec<_>>();
        let screen_radii = self
            .radii
            .iter()
            .map(|radius| (radius * zoom.powf(0.5)).clamp(2.0, 30.0))
            .collect::<Vec<_>>();

        let hovered = self.hovered_index(ui, rect, &screen_positions, &screen_radii);
        if hovered.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }
        if response.clicked_by(egui::PointerButton::Primary)
            && let Some(index) = hovered
        {
            self.clicked = Some(NodeIdx(index));
        }

        let focus = hovered.or(self.selected.map(NodeIdx::index));
        let neighbor_of_focus = |link_index: usize| {
            focus.is_some_and(|focus| {
                snapshot
                    .links()
                    .get(link_index)
                    .is_some_and(|link| link.source.index() == focus || link.target.index() == focus)
            })
        };

        let zoom_sqrt = zoom.sqrt();
        let arrows = snapshot.flavor() == SnapshotFlavor::Flux;
        let mut animating = false;

        for (index, link) in snapshot.links().iter().enumerate() {
            if !self.link_visible.get(index).copied().unwrap_or(false) {
                continue;
            }
            let start = screen_positions[link.source.index()];
            let end = screen_positions[link.target.index()];
            if !segment_in_rect(rect, start, end, 4.0) {
                continue;
            }

            let weight = self.weights[index];
            let base = self.link_colors[index];
            let color = if neighbor_of_focus(index) {
                blend_color(base, HOVER_COLOR, 0.35)
            } else if focus.is_some() {
                dim_color(base, 0.55)
            } else {
                base
            };
            let width = (weight.width * zoom_sqrt).clamp(0.4, 14.0);
            painter.line_segment([start, end], Stroke::new(width, color));

            if arrows {
                draw_arrow_head(&painter, start, end, screen_radii[link.target.index()], color, zoom_sqrt);
            }

            if weight.particles > 0 && weight.particle_speed > 0.0 {
                animating = true;
                let travelled = self.particle_clock * REFERENCE_FPS * f64::from(weight.particle_speed);
                let particle_radius = (1.6 * zoom_sqrt).clamp(1.0, 3.5);
                for particle in 0..weight.particles {
                    let offset = f64::from(particle) / f64::from(weight.particles);
                    let t = (travelled + offset).fract() as f32;
                    painter.circle_filled(start + (end - start) * t, particle_radius, PARTICLE_COLOR);
                }
            }
        }

        for (index, node) in snapshot.nodes().iter().enumerate() {
            if !self.node_visible.get(index).copied().unwrap_or(false) {
                continue;
            }
            let position = screen_positions[index];
            let radius = screen_radii[index];
            if !circle_visible(rect, position, radius) {
                continue;
            }

            let is_selected = self.selected.map(NodeIdx::index) == Some(index);
            let base = self.node_colors[index];
            let color = if hovered == Some(index) {
                HOVER_COLOR
            } else if is_selected {
                SELECTED_COLOR
            } else {
                base
            };

            painter.circle_filled(position, radius, color);
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
            );
            if is_selected {
                painter.circle_stroke(
                    position,
                    radius + 4.0,
                    Stroke::new(1.6, Color32::from_rgba_unmultiplied(245, 206, 93, 160)),
                );
            }

            if self.labels_visible || hovered == Some(index) || is_selected {
                painter.text(
                    position + vec2(radius + 4.0, 0.0),
                    Align2::LEFT_CENTER,
                    node.display_name.as_str(),
                    FontId::proportional(11.0),
                    Color32::from_gray(230),
                );
            }
        }

        if let Some(index) = hovered
            && let Some(node) = snapshot.node(NodeIdx(index))
        {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!("{}  |  {}  |  {}", node.display_name, node.kind.label(), node.id),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if animating || response.dragged() {
            ui.ctx().request_repaint();
        }
    }
}

fn draw_arrow_head(
    painter: &egui::Painter,
    start: Pos2,
    end: Pos2,
    target_radius: f32,
    color: Color32,
    zoom_sqrt: f32,
) {
    let delta = end - start;
    let length = delta.length();
    if length <= target_radius + 1.0 {
        return;
    }
    let direction = delta / length;
    let tip = end - direction * target_radius;
    let size = (3.8 * zoom_sqrt).clamp(2.5, 8.0);
    let normal = vec2(-direction.y, direction.x);
    let back = tip - direction * size;
    painter.add(egui::Shape::convex_polygon(
        vec![tip, back + normal * size * 0.5, back - normal * size * 0.5],
        color,
        Stroke::NONE,
    ));
}
