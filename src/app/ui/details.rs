use eframe::egui::{self, Color32, RichText, Sense, Ui, vec2};

use crate::engine::{FluxNeighbor, InspectorSummary};
use crate::model::{NodeKind, ParticipatingReaction, SnapshotFlavor};
use crate::util::{format_count, format_flux};

use super::super::render_utils::node_fill;
use super::super::{FluxGraphApp, PanelContent};

fn color_swatch(ui: &mut Ui, kind: &NodeKind, color: &str) {
    let (rect, _) = ui.allocate_exact_size(vec2(10.0, 10.0), Sense::hover());
    let fill = node_fill(SnapshotFlavor::Flux, kind, color);
    ui.painter().rect_filled(rect, 2.0, fill);
}

fn coefficient_sign(coefficient: f64) -> &'static str {
    if coefficient < 0.0 { "-" } else { "+" }
}

fn neighbor_rows(ui: &mut Ui, title: &str, neighbors: &[FluxNeighbor]) {
    ui.label(RichText::new(title).strong());
    if neighbors.is_empty() {
        ui.weak("none");
        return;
    }

    for neighbor in neighbors {
        ui.horizontal(|ui| {
            color_swatch(ui, &neighbor.kind, &neighbor.color);
            let kind = match neighbor.kind {
                NodeKind::Reaction => "Rxn",
                _ => "Metabolite",
            };
            ui.label(format!("{kind} {}", neighbor.id));
        });
        ui.small(format!(
            "coef {}  flux {}  {}",
            coefficient_sign(neighbor.coefficient),
            format_flux(neighbor.flux_signed),
            neighbor.direction.label()
        ));
    }
}

fn reaction_rows(ui: &mut Ui, reactions: &[ParticipatingReaction]) {
    if reactions.is_empty() {
        ui.weak("no active reactions");
        return;
    }

    egui::ScrollArea::vertical()
        .id_salt("metabolite_reactions")
        .max_height(320.0)
        .auto_shrink([false, true])
        .show(ui, |ui| {
            for reaction in reactions {
                ui.label(format!("{}  {}", reaction.id, format_flux(reaction.flux)));
            }
        });
}

impl FluxGraphApp {
    pub(in crate::app) fn draw_inspector(&self, ui: &mut Ui) {
        ui.heading("Inspector");
        ui.add_space(6.0);

        let summary = match self.controller.panel() {
            PanelContent::Placeholder => {
                ui.label("Click a node to inspect it.");
                return;
            }
            PanelContent::Error(message) => {
                ui.colored_label(Color32::from_rgb(230, 110, 100), message.as_str());
                return;
            }
            PanelContent::Summary(summary) => summary,
        };

        match summary {
            InspectorSummary::FluxNeighborhood {
                id,
                name,
                kind,
                inputs,
                outputs,
            } => {
                ui.label(RichText::new(name.as_str()).strong());
                ui.small(format!("{} · {id}", kind.label()));
                ui.separator();
                neighbor_rows(ui, "Inputs", inputs);
                ui.separator();
                neighbor_rows(ui, "Outputs", outputs);
            }
            InspectorSummary::Metabolite {
                id,
                subsystems,
                activity_max,
                activity_sum,
                activity_avg,
                reactions,
            } => {
                ui.label(RichText::new(id.as_str()).strong());
                ui.small("Metabolite");
                ui.separator();
                if subsystems.is_empty() {
                    ui.label("Subsystems: none");
                } else {
                    ui.label(format!("Subsystems: {}", subsystems.join(", ")));
                }
                ui.label(format!("Max activity: {}", format_count(*activity_max)));
                ui.label(format!("Total activity: {}", format_count(*activity_sum)));
                ui.label(format!("Mean activity: {}", format_count(*activity_avg)));
                ui.separator();
                ui.label(RichText::new("Reactions by |flux|").strong());
                reaction_rows(ui, reactions);
            }
            InspectorSummary::Subsystem {
                id,
                connected_metabolites,
                correlation_row,
            } => {
                ui.label(RichText::new(id.as_str()).strong());
                ui.small("Subsystem");
                ui.separator();
                ui.label(RichText::new("Connected metabolites").strong());
                if connected_metabolites.is_empty() {
                    ui.weak("none");
                } else {
                    ui.label(connected_metabolites.join(", "));
                }
                ui.separator();
                ui.label(RichText::new("Shared metabolites").strong());
                egui::Grid::new("subsystem_correlation_row")
                    .striped(true)
                    .show(ui, |ui| {
                        for (other, count) in correlation_row {
                            ui.label(other.as_str());
                            ui.label(format_count(*count));
                            ui.end_row();
                        }
                    });
            }
            InspectorSummary::Fallback { id } => {
                ui.label(RichText::new(id.as_str()).strong());
                ui.weak("No further details for this node.");
            }
        }
    }
}
