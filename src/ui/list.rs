use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use quakewatch::color::magnitude_color;
use quakewatch::data::time::{format_relative, now_ms};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Event list (bottom panel)
// ---------------------------------------------------------------------------

/// Render the filtered, sorted event list as a table.
pub fn event_table(ui: &mut Ui, state: &mut AppState) {
    ui.heading("📋 Earthquake List");

    let view = state.session.view();
    if view.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            if state.session.raw_events().is_empty() {
                ui.label("No earthquakes loaded.");
            } else if state.session.params().location.is_empty() {
                ui.label("No earthquakes found with the current filters.");
            } else {
                ui.label("No earthquakes found with the current filters. Try adjusting your search terms.");
            }
        });
        return;
    }

    let now = now_ms();
    let selected_id = state.session.selection().map(|e| e.id.clone());
    let mut clicked: Option<String> = None;

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .sense(egui::Sense::click())
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::exact(48.0))
        .column(Column::remainder().at_least(200.0))
        .column(Column::auto().at_least(90.0))
        .column(Column::auto().at_least(70.0))
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Mag");
            });
            header.col(|ui| {
                ui.strong("Location");
            });
            header.col(|ui| {
                ui.strong("When");
            });
            header.col(|ui| {
                ui.strong("Depth");
            });
        })
        .body(|body| {
            body.rows(22.0, view.len(), |mut row| {
                let event = &view[row.index()];
                row.set_selected(selected_id.as_deref() == Some(event.id.as_str()));

                row.col(|ui| {
                    ui.label(
                        RichText::new(format!("{:.1}", event.magnitude))
                            .strong()
                            .color(magnitude_color(event.magnitude)),
                    );
                });
                row.col(|ui| {
                    ui.label(&event.title);
                });
                row.col(|ui| {
                    ui.label(format_relative(event.occurred_at_ms, now));
                });
                row.col(|ui| {
                    let depth = event
                        .coordinates
                        .depth_km
                        .map_or_else(|| "–".to_string(), |d| format!("{d:.1} km"));
                    ui.label(depth);
                });

                if row.response().clicked() {
                    clicked = Some(event.id.clone());
                }
            });
        });

    if let Some(id) = clicked {
        state.toggle_selection(&id);
    }
}
