use eframe::egui::{self, Key, Response, RichText, Sense, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::engine::smoothed_threshold;
use crate::model::SnapshotFlavor;
use crate::util::format_flux;

use super::super::render_utils::plasma;
use super::super::{CORRELATION_EXPORT_FILE, FluxGraphApp, RESULTS_EXPORT_FILE, ViewEvent};

const SLIDER_KEY_BASE_RATE: f32 = 10.0;
const SLIDER_KEY_ACCEL_PER_SEC: f32 = 9.0;
const SLIDER_KEY_ACCEL_MAX: f32 = 40.0;
const SLIDER_KEY_STEP: f32 = 0.005;

#[derive(Clone, Copy, Default)]
struct SliderKeyHoldState {
    positive_secs: f32,
    negative_secs: f32,
}

fn slider_key_accel_multiplier(hold_secs: f32) -> f32 {
    let ramp = hold_secs * SLIDER_KEY_ACCEL_PER_SEC;
    (1.0 + ramp + ramp * ramp * 0.15).min(SLIDER_KEY_ACCEL_MAX)
}

/// Holding an arrow key on the focused slider speeds up over time.
fn apply_slider_arrow_acceleration(
    ui: &Ui,
    response: &Response,
    value: &mut f32,
    min: f32,
    max: f32,
    step: f32,
) -> bool {
    let state_id = response.id.with("arrow_key_hold_state");
    let mut hold_state = ui.ctx().data(|data| {
        data.get_temp::<SliderKeyHoldState>(state_id)
            .unwrap_or_default()
    });

    if !response.has_focus() {
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, SliderKeyHoldState::default()));
        return false;
    }

    let (delta_time, increase_down, decrease_down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });

    hold_state.positive_secs = if increase_down {
        hold_state.positive_secs + delta_time
    } else {
        0.0
    };
    hold_state.negative_secs = if decrease_down {
        hold_state.negative_secs + delta_time
    } else {
        0.0
    };
    ui.ctx()
        .data_mut(|data| data.insert_temp(state_id, hold_state));

    let direction = (increase_down as i8) - (decrease_down as i8);
    if direction == 0 {
        return false;
    }

    let hold_secs = if direction > 0 {
        hold_state.positive_secs
    } else {
        hold_state.negative_secs
    };
    let speed = SLIDER_KEY_BASE_RATE * slider_key_accel_multiplier(hold_secs);
    let old_value = *value;
    *value = (*value + direction as f32 * step * speed * delta_time).clamp(min, max);
    ui.ctx().request_repaint();

    (*value - old_value).abs() > f32::EPSILON
}

fn fuzzy_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Subsystems matching `query`, best match first. An empty query keeps the
/// backend order.
pub(in crate::app) fn rank_subsystems<'a>(subsystems: &'a [String], query: &str) -> Vec<&'a str> {
    let query = query.trim();
    if query.is_empty() {
        return subsystems.iter().map(String::as_str).collect();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = subsystems
        .iter()
        .filter_map(|name| fuzzy_score(&matcher, name, query).map(|score| (score, name.as_str())))
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, name)| name).collect()
}

impl FluxGraphApp {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("View Controls");
        ui.separator();
        ui.add_space(4.0);

        self.draw_threshold(ui);
        ui.separator();

        let labels_on = self.controller.state().labels_on;
        let labels_text = if labels_on { "Labels: ON" } else { "Labels: OFF" };
        if ui
            .button(labels_text)
            .on_hover_text("Show or hide node names on the canvas.")
            .clicked()
        {
            self.dispatch(ViewEvent::LabelsToggled);
        }

        let mut active_only = self.controller.state().active_only;
        if ui
            .checkbox(&mut active_only, "Active only")
            .on_hover_text("Hide links whose metric is zero.")
            .changed()
        {
            self.dispatch(ViewEvent::ActiveOnlyToggled);
        }

        if self.controller.flavor() == SnapshotFlavor::Flux {
            ui.separator();
            self.draw_subsystem_picker(ui);
        } else {
            ui.checkbox(&mut self.show_matrix, "Show subsystem matrix");
        }

        ui.separator();
        self.draw_legend(ui);

        ui.separator();
        self.draw_exports(ui);
    }

    fn draw_threshold(&mut self, ui: &mut Ui) {
        let metric = self.controller.flavor().metric_label();
        ui.label(RichText::new(format!("Minimum {metric}")).strong());

        let response = ui
            .add(egui::Slider::new(&mut self.slider_value, 0.0..=1.0).show_value(false))
            .on_hover_text("Hide links below this share of the largest value. Applied on release.");
        let keyed = apply_slider_arrow_acceleration(
            ui,
            &response,
            &mut self.slider_value,
            0.0,
            1.0,
            SLIDER_KEY_STEP,
        );

        ui.label(format!("Threshold: {:.4}", self.slider_value));
        ui.small(format!(
            "links need {metric} / max ≥ {:.4}",
            smoothed_threshold(f64::from(self.slider_value))
        ));

        let committed = response.drag_stopped() || keyed || (response.changed() && !response.dragged());
        if committed {
            self.dispatch(ViewEvent::ThresholdChanged(f64::from(self.slider_value)));
        }
    }

    fn draw_subsystem_picker(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Subsystem").strong());
        ui.add(
            egui::TextEdit::singleline(&mut self.subsystem_query)
                .hint_text("fuzzy search"),
        );

        let selected = self.controller.state().selected_subsystem.clone();
        let subsystems = self
            .controller
            .snapshot()
            .map(|snapshot| snapshot.subsystems().to_vec())
            .unwrap_or_default();
        let ranked = rank_subsystems(&subsystems, &self.subsystem_query);

        let mut picked = None;
        egui::ScrollArea::vertical()
            .id_salt("subsystem_picker")
            .max_height(220.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                if ui.selectable_label(selected.is_none(), "All subsystems").clicked() {
                    picked = Some(None);
                }
                for name in ranked {
                    let is_selected = selected.as_deref() == Some(name);
                    if ui.selectable_label(is_selected, name).clicked() {
                        picked = Some(Some(name.to_owned()));
                    }
                }
            });

        if let Some(choice) = picked {
            self.dispatch(ViewEvent::SubsystemChanged(choice));
        }
    }

    fn draw_legend(&self, ui: &mut Ui) {
        let metric = self.controller.flavor().metric_label();
        ui.label(RichText::new(format!("{metric} scale")).strong());

        let width = ui.available_width().min(240.0);
        let (rect, _) = ui.allocate_exact_size(vec2(width, 14.0), Sense::hover());
        let painter = ui.painter_at(rect);
        let slices = 64;
        let slice_width = rect.width() / slices as f32;
        for slice in 0..slices {
            let t = slice as f32 / (slices - 1) as f32;
            let left = rect.left() + slice as f32 * slice_width;
            painter.rect_filled(
                egui::Rect::from_min_size(egui::pos2(left, rect.top()), vec2(slice_width + 0.5, rect.height())),
                0.0,
                plasma(t),
            );
        }

        let max_metric = self
            .controller
            .snapshot()
            .map(|snapshot| snapshot.max_metric())
            .unwrap_or(0.0);
        ui.horizontal(|ui| {
            ui.small("0.0");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.small(format_flux(max_metric));
            });
        });
    }

    fn draw_exports(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Export").strong());
        let idle = !self.export_in_flight();

        if self.controller.flavor() == SnapshotFlavor::Correlation {
            let correlation = self.controller.snapshot().and_then(|snapshot| {
                snapshot
                    .correlation()
                    .map(|data| (data.clone(), snapshot.subsystems().to_vec()))
            });
            let clicked = ui
                .add_enabled(idle && correlation.is_some(), egui::Button::new("Correlation matrix (.xlsx)"))
                .on_disabled_hover_text("Load a correlation graph first.")
                .clicked();
            if clicked && let Some((data, subsystems)) = correlation {
                self.spawn_export(CORRELATION_EXPORT_FILE, move |exporter| {
                    exporter.export_correlation_matrix(&data, &subsystems)
                });
            }
        }

        let run_state = self.run_state.clone();
        let clicked = ui
            .add_enabled(idle && run_state.is_some(), egui::Button::new("Run results (.xlsx)"))
            .on_disabled_hover_text("Start with --run-state to enable result export.")
            .clicked();
        if clicked && let Some(run_state) = run_state {
            self.spawn_export(RESULTS_EXPORT_FILE, move |exporter| exporter.export_results(&run_state));
        }

        if !idle {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.small("exporting...");
            });
        }
    }
}
