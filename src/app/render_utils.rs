use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::model::{NodeKind, SnapshotFlavor};

const PLASMA_STOPS: [(f32, [u8; 3]); 6] = [
    (0.00, [0x0d, 0x08, 0x87]),
    (0.15, [0x6a, 0x00, 0xa8]),
    (0.35, [0xb1, 0x2a, 0x90]),
    (0.55, [0xe1, 0x64, 0x62]),
    (0.75, [0xfc, 0xa6, 0x36]),
    (1.00, [0xf0, 0xf9, 0x21]),
];

const VIRIDIS_STOPS: [(f32, [u8; 3]); 5] = [
    (0.00, [0x44, 0x01, 0x54]),
    (0.25, [0x3b, 0x52, 0x8b]),
    (0.50, [0x21, 0x90, 0x8d]),
    (0.75, [0x5d, 0xc9, 0x63]),
    (1.00, [0xfd, 0xe7, 0x25]),
];

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) const METABOLITE_FILL: Color32 = Color32::from_rgb(0x00, 0xcc, 0x44);

/// Backend `#rrggbb` colour, or `fallback` when it does not parse.
pub(super) fn hex_or(raw: &str, fallback: Color32) -> Color32 {
    Color32::from_hex(raw.trim()).unwrap_or(fallback)
}

/// Fill for a node. The flux view paints every metabolite the same green.
pub(super) fn node_fill(flavor: SnapshotFlavor, kind: &NodeKind, raw: &str) -> Color32 {
    match (flavor, kind) {
        (SnapshotFlavor::Flux, NodeKind::Metabolite) => METABOLITE_FILL,
        _ => hex_or(raw, Color32::from_gray(136)),
    }
}

fn gradient(stops: &[(f32, [u8; 3])], t: f32) -> Color32 {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    for pair in stops.windows(2) {
        let (start, low) = pair[0];
        let (end, high) = pair[1];
        if t <= end {
            let amount = if end > start { (t - start) / (end - start) } else { 0.0 };
            return blend_color(
                Color32::from_rgb(low[0], low[1], low[2]),
                Color32::from_rgb(high[0], high[1], high[2]),
                amount,
            );
        }
    }
    let [r, g, b] = stops[stops.len() - 1].1;
    Color32::from_rgb(r, g, b)
}

pub(super) fn plasma(t: f32) -> Color32 {
    gradient(&PLASMA_STOPS, t)
}

pub(super) fn viridis(t: f32) -> Color32 {
    gradient(&VIRIDIS_STOPS, t)
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn segment_in_rect(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}
