use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use quakewatch::color::{generate_palette, magnitude_color};
use quakewatch::data::export::StatsTable;
use quakewatch::data::model::{SortKey, TimeRange};
use quakewatch::data::time::format_local;
use quakewatch::session::FeedStatus;

use crate::state::{AppState, MAGNITUDE_FLOORS};
use crate::ui::plot;

/// Number of regions listed under "Top Regions".
const TOP_REGIONS: usize = 5;

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Export magnitude stats…").clicked() {
                state.export_dialog(StatsTable::Bands);
                ui.close_menu();
            }
            if ui.button("Export region stats…").clicked() {
                state.export_dialog(StatsTable::Regions);
                ui.close_menu();
            }
        });

        ui.separator();

        let current = state.session.params().time_range;
        let mut selected = current;
        egui::ComboBox::from_id_salt("time_range")
            .selected_text(current.label())
            .show_ui(ui, |ui: &mut Ui| {
                for range in TimeRange::ALL {
                    ui.selectable_value(&mut selected, range, range.label());
                }
            });
        if selected != current {
            state.set_time_range(selected);
        }

        if state.session.is_loading() {
            ui.spinner();
        } else if ui.button("⟳ Refresh").clicked() {
            state.refresh();
        }

        ui.separator();

        match state.session.status() {
            FeedStatus::Idle => {}
            FeedStatus::Loading if state.session.raw_events().is_empty() => {
                ui.label("Loading earthquake data…");
            }
            _ => {
                ui.label(format!(
                    "Showing {} of {} earthquakes",
                    state.session.view().len(),
                    state.session.raw_events().len()
                ));
            }
        }
        if !state.session.params().location.is_empty() {
            ui.label(format!("• Filtered by: {}", state.session.params().location));
        }

        if let Some(err) = state.session.error() {
            ui.separator();
            ui.label(RichText::new(format!("Error: {err}")).color(Color32::RED));
        }
        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(msg);
        }
    });
}

// ---------------------------------------------------------------------------
// Left side panel – filters and statistics
// ---------------------------------------------------------------------------

/// Render the left panel: search and filter controls, then the dashboard.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            filter_section(ui, state);
            ui.separator();
            stats_section(ui, state);
            ui.separator();
            selection_section(ui, state);
        });
}

fn filter_section(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Search & Filter");

    let response = ui.add(
        egui::TextEdit::singleline(&mut state.search_input)
            .hint_text("Search by location, country..."),
    );
    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
        state.apply_search();
    }
    ui.horizontal(|ui: &mut Ui| {
        if ui.button("🔍 Search").clicked() {
            state.apply_search();
        }
        if ui.button("🗑 Clear").clicked() {
            state.clear_filters();
        }
    });

    let floor = state.session.params().magnitude_floor;
    let floor_label = MAGNITUDE_FLOORS
        .iter()
        .find(|(v, _)| *v == floor)
        .map_or_else(|| format!("{floor:.1}+"), |(_, label)| label.to_string());
    let mut new_floor = floor;
    egui::ComboBox::from_id_salt("magnitude_floor")
        .selected_text(floor_label)
        .show_ui(ui, |ui: &mut Ui| {
            for (value, label) in MAGNITUDE_FLOORS {
                ui.selectable_value(&mut new_floor, value, label);
            }
        });
    if new_floor != floor {
        state.set_magnitude_floor(new_floor);
    }

    let sort = state.session.params().sort_key;
    let mut new_sort = sort;
    egui::ComboBox::from_id_salt("sort_key")
        .selected_text(sort.label())
        .show_ui(ui, |ui: &mut Ui| {
            for key in [SortKey::Time, SortKey::Magnitude] {
                ui.selectable_value(&mut new_sort, key, key.label());
            }
        });
    if new_sort != sort {
        state.set_sort_key(new_sort);
    }

    ui.checkbox(&mut state.notifications, "🔔 Enable Notifications");
}

fn stats_section(ui: &mut Ui, state: &mut AppState) {
    let range = state.session.params().time_range;
    ui.heading(format!("Statistics – {}", range.label()));

    let stats = state.session.stats();
    egui::Grid::new("stat_cards")
        .num_columns(2)
        .spacing([16.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("Total Earthquakes");
            ui.strong(stats.total.to_string());
            ui.end_row();

            ui.label("Average Magnitude");
            ui.strong(format!("{:.1}", stats.average_magnitude));
            ui.end_row();

            ui.label("Last Hour");
            ui.strong(stats.recent_count.to_string());
            ui.end_row();

            ui.label("Strongest");
            match &stats.strongest {
                Some(e) => ui.strong(format!("{:.1}", e.magnitude)),
                None => ui.strong("N/A"),
            };
            ui.end_row();
        });

    ui.add_space(6.0);
    ui.strong("Magnitude Distribution");
    plot::band_chart(ui, stats);

    ui.add_space(6.0);
    ui.strong("Top Regions");
    let top = stats.top_regions(TOP_REGIONS);
    if top.is_empty() {
        ui.label("No data.");
    }
    let colours = generate_palette(top.len());
    for ((region, count), colour) in top.iter().zip(colours) {
        ui.horizontal(|ui: &mut Ui| {
            ui.label(RichText::new("■").color(colour));
            ui.label(*region);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui: &mut Ui| {
                ui.label(count.to_string());
            });
        });
    }

    if let Some(strongest) = stats.strongest.clone() {
        ui.add_space(6.0);
        ui.strong("💥 Strongest Earthquake");
        ui.label(
            RichText::new(format!("{:.1}", strongest.magnitude))
                .size(22.0)
                .color(magnitude_color(strongest.magnitude)),
        );
        ui.label(&strongest.title);
        ui.label(&strongest.place);
        ui.label(format_local(strongest.occurred_at_ms));
        if ui.small_button("Show").clicked() {
            state.session.select(Some(strongest));
        }
    }
}

fn selection_section(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Selected");
    let Some(event) = state.session.selection().cloned() else {
        ui.label("Click an event in the list or on the map.");
        return;
    };

    ui.label(
        RichText::new(format!("M {:.1}", event.magnitude))
            .strong()
            .color(magnitude_color(event.magnitude)),
    );
    ui.label(&event.title);
    ui.label(&event.place);
    ui.label(format_local(event.occurred_at_ms));
    let c = event.coordinates;
    let depth = c
        .depth_km
        .map_or_else(|| "unknown depth".to_string(), |d| format!("{d:.1} km deep"));
    ui.label(format!("{:.3}°, {:.3}° · {depth}", c.latitude, c.longitude));
    if !state.session.view().iter().any(|e| e.id == event.id) {
        ui.label(RichText::new("Hidden by current filters").italics());
    }
    if !event.url.is_empty() {
        ui.hyperlink_to("More details", &event.url);
    }
    if ui.small_button("Clear selection").clicked() {
        state.session.select(None);
    }
}
