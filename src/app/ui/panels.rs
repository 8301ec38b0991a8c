use eframe::egui::{self, Align, Align2, Color32, Context, Layout, RichText, Ui, vec2};

use crate::model::SnapshotFlavor;

use super::super::{FluxGraphApp, Notice, Phase, ViewEvent};

impl FluxGraphApp {
    pub(in crate::app) fn draw_top_bar(&mut self, ui: &mut Ui) {
        let mut reload = false;

        ui.horizontal(|ui| {
            ui.heading("fluxgraph");
            ui.separator();
            let view = match self.controller.flavor() {
                SnapshotFlavor::Flux => "flux network",
                SnapshotFlavor::Correlation => "metabolite correlation",
            };
            ui.label(view);
            ui.label(format!("run: {}", self.controller.run_id()));
            if let Some(subsystem) = self.controller.loaded_subsystem() {
                ui.label(format!("subsystem: {subsystem}"));
            }

            let loading = matches!(self.controller.phase(), Phase::Loading { .. });
            reload = ui
                .add_enabled(!loading, egui::Button::new("Reload"))
                .clicked();
            if loading {
                ui.spinner();
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if let (Some(snapshot), Some(frame)) =
                    (self.controller.snapshot(), self.controller.frame())
                {
                    ui.label(format!(
                        "nodes {}/{}  links {}/{}",
                        frame.visible_node_count(),
                        snapshot.node_count(),
                        frame.visible_link_count(),
                        snapshot.link_count()
                    ));
                }
            });
        });

        if reload {
            self.dispatch(ViewEvent::Reload);
        }
    }

    pub(in crate::app) fn draw_central(&mut self, ui: &mut Ui) {
        let has_graph = self.controller.renderer().has_graph();

        match self.controller.phase().clone() {
            Phase::Idle | Phase::Loading { .. } if !has_graph => {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Loading graph...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            }
            Phase::Error(message) if !has_graph => {
                let mut retry = false;
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Failed to load the graph");
                    ui.add_space(6.0);
                    ui.label(message.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
                if retry {
                    self.dispatch(ViewEvent::Reload);
                }
            }
            _ => self.controller.renderer_mut().show(ui),
        }
    }

    pub(in crate::app) fn draw_advisory(&self, ctx: &Context) {
        let Some(advisory) = self.controller.advisory() else {
            return;
        };

        egui::Area::new(egui::Id::new("oversized_advisory"))
            .anchor(Align2::CENTER_TOP, vec2(0.0, 56.0))
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style())
                    .fill(Color32::from_rgb(58, 46, 20))
                    .show(ui, |ui| {
                        ui.label(RichText::new(advisory.message.as_str()).color(Color32::from_rgb(250, 214, 120)));
                    });
            });
    }

    pub(in crate::app) fn draw_notice(&mut self, ctx: &Context) {
        let Some(notice) = &self.notice else {
            return;
        };

        let (title, body, color) = match notice {
            Notice::Saved(path) => (
                "Export saved",
                format!("Wrote {}", path.display()),
                Color32::from_gray(230),
            ),
            Notice::Failed(message) => (
                "Export failed",
                message.clone(),
                Color32::from_rgb(230, 110, 100),
            ),
        };

        let mut dismissed = false;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.colored_label(color, body);
                ui.add_space(8.0);
                dismissed = ui.button("OK").clicked();
            });

        if dismissed {
            self.notice = None;
        }
    }
}
