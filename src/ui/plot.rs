use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Plot, PlotPoints, Points};

use quakewatch::color::{band_color, magnitude_color, marker_radius};
use quakewatch::data::model::{MagnitudeBand, StatsSummary};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Event map (central panel)
// ---------------------------------------------------------------------------

/// Longitude/latitude scatter of the filtered events. Clicking near a marker
/// selects that event.
pub fn event_map(ui: &mut Ui, state: &mut AppState) {
    if state.session.raw_events().is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            if state.session.is_loading() {
                ui.spinner();
            } else {
                ui.heading("No earthquakes to show");
            }
        });
        return;
    }

    let view = state.session.view();
    let selected = state.session.selection();

    let response = Plot::new("event_map")
        .data_aspect(1.0)
        .include_x(-180.0)
        .include_x(180.0)
        .include_y(-90.0)
        .include_y(90.0)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for event in view {
                let c = event.coordinates;
                let marker = Points::new(PlotPoints::new(vec![[c.longitude, c.latitude]]))
                    .name(&event.title)
                    .radius(marker_radius(event.magnitude))
                    .color(magnitude_color(event.magnitude))
                    .filled(true);
                plot_ui.points(marker);
            }

            // Ring the selection, even when filters hide it from the list.
            if let Some(sel) = selected {
                let c = sel.coordinates;
                plot_ui.points(
                    Points::new(PlotPoints::new(vec![[c.longitude, c.latitude]]))
                        .radius(marker_radius(sel.magnitude) + 4.0)
                        .color(Color32::WHITE)
                        .filled(false),
                );
            }

            if plot_ui.response().clicked() {
                plot_ui.pointer_coordinate().and_then(|pos| {
                    view.iter()
                        .map(|e| {
                            let dx = e.coordinates.longitude - pos.x;
                            let dy = e.coordinates.latitude - pos.y;
                            (e, dx * dx + dy * dy)
                        })
                        .min_by(|a, b| a.1.total_cmp(&b.1))
                        .filter(|(_, dist2)| *dist2 <= 4.0)
                        .map(|(e, _)| e.id.clone())
                })
            } else {
                None
            }
        });

    if let Some(id) = response.inner {
        state.session.select_id(&id);
    }
}

// ---------------------------------------------------------------------------
// Magnitude histogram (side panel)
// ---------------------------------------------------------------------------

/// Bar chart of event counts per magnitude band, strongest band first.
pub fn band_chart(ui: &mut Ui, stats: &StatsSummary) {
    let bars: Vec<Bar> = MagnitudeBand::ALL
        .iter()
        .enumerate()
        .map(|(i, band)| {
            Bar::new(i as f64, stats.band_count(*band) as f64)
                .name(band.label())
                .fill(band_color(*band))
                .width(0.7)
        })
        .collect();

    Plot::new("band_chart")
        .height(120.0)
        .show_x(false)
        .show_y(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .x_axis_formatter(|mark, _range| {
            let idx = mark.value.round();
            MagnitudeBand::ALL
                .iter()
                .enumerate()
                .find(|(i, _)| *i as f64 == idx)
                .map(|(_, band)| band.label().to_string())
                .unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}
