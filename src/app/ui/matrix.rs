use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Ui, vec2};

use crate::engine::CorrelationMatrix;
use crate::util::format_count;

use super::super::FluxGraphApp;
use super::super::render_utils::viridis;

const LABEL_MARGIN: f32 = 150.0;
const COLORBAR_WIDTH: f32 = 16.0;

impl FluxGraphApp {
    pub(in crate::app) fn draw_matrix_window(&mut self, ctx: &egui::Context) {
        if !self.show_matrix {
            return;
        }
        let Some(matrix) = self.controller.matrix().cloned() else {
            return;
        };

        let mut open = self.show_matrix;
        egui::Window::new("Subsystem correlation")
            .open(&mut open)
            .default_size([720.0, 640.0])
            .resizable(true)
            .show(ctx, |ui| {
                if matrix.size() == 0 {
                    ui.label("No subsystems to compare.");
                    return;
                }
                ui.small(format!(
                    "{} subsystems, colour clipped at {}",
                    matrix.size(),
                    format_count(matrix.clip_limit)
                ));
                egui::ScrollArea::both()
                    .id_salt("matrix_scroll")
                    .show(ui, |ui| draw_heatmap(ui, &matrix));
            });
        self.show_matrix = open;
    }
}

fn draw_heatmap(ui: &mut Ui, matrix: &CorrelationMatrix) {
    let n = matrix.size();
    let layout = matrix.layout;
    let total = vec2(
        layout.width + LABEL_MARGIN + COLORBAR_WIDTH * 4.0,
        layout.height + LABEL_MARGIN,
    );
    let (rect, response) = ui.allocate_exact_size(total, Sense::hover());
    let painter = ui.painter_at(rect);

    let grid = Rect::from_min_size(
        rect.min + vec2(LABEL_MARGIN, 0.0),
        vec2(layout.width, layout.height),
    );
    let cell = vec2(grid.width() / n as f32, grid.height() / n as f32);
    let font = FontId::proportional(layout.tick_font_size);

    for row in 0..n {
        for column in 0..n {
            let min = grid.min + vec2(column as f32 * cell.x, row as f32 * cell.y);
            painter.rect_filled(
                Rect::from_min_size(min, cell),
                0.0,
                viridis(matrix.color_position(row, column)),
            );
        }
    }

    for annotation in &matrix.annotations {
        let center = grid.min
            + vec2(
                (annotation.column as f32 + 0.5) * cell.x,
                (annotation.row as f32 + 0.5) * cell.y,
            );
        painter.text(
            center,
            Align2::CENTER_CENTER,
            annotation.text.as_str(),
            font.clone(),
            Color32::WHITE,
        );
    }

    for (index, label) in matrix.labels.iter().enumerate() {
        let y = grid.top() + (index as f32 + 0.5) * cell.y;
        painter.text(
            Pos2::new(grid.left() - 6.0, y),
            Align2::RIGHT_CENTER,
            label.as_str(),
            font.clone(),
            Color32::from_gray(220),
        );

        let x = grid.left() + (index as f32 + 0.5) * cell.x;
        let galley = painter.layout_no_wrap(label.clone(), font.clone(), Color32::from_gray(220));
        let anchor = Pos2::new(x, grid.bottom() + 6.0);
        painter.add(
            egui::epaint::TextShape::new(anchor, galley, Color32::from_gray(220))
                .with_angle(std::f32::consts::FRAC_PI_4),
        );
    }

    let bar = Rect::from_min_size(
        Pos2::new(grid.right() + COLORBAR_WIDTH, grid.top()),
        vec2(COLORBAR_WIDTH, grid.height()),
    );
    let steps = 48;
    let step_height = bar.height() / steps as f32;
    for step in 0..steps {
        let t = 1.0 - step as f32 / (steps - 1) as f32;
        painter.rect_filled(
            Rect::from_min_size(
                Pos2::new(bar.left(), bar.top() + step as f32 * step_height),
                vec2(bar.width(), step_height + 0.5),
            ),
            0.0,
            viridis(t),
        );
    }
    painter.rect_stroke(bar, 0.0, Stroke::new(1.0, Color32::from_gray(90)), egui::StrokeKind::Outside);
    painter.text(
        bar.right_top() + vec2(4.0, 0.0),
        Align2::LEFT_TOP,
        format_count(matrix.clip_limit),
        FontId::proportional(11.0),
        Color32::from_gray(220),
    );
    painter.text(
        bar.right_bottom() + vec2(4.0, 0.0),
        Align2::LEFT_BOTTOM,
        "0",
        FontId::proportional(11.0),
        Color32::from_gray(220),
    );

    if let Some(pointer) = response.hover_pos()
        && grid.contains(pointer)
    {
        let column = (((pointer.x - grid.left()) / cell.x) as usize).min(n - 1);
        let row = (((pointer.y - grid.top()) / cell.y) as usize).min(n - 1);
        if let Some(text) = matrix.hover_text(row, column) {
            response.on_hover_text_at_pointer(text);
        }
    }
}
