use eframe::egui;

use crate::state::{AppState, RECOMPUTE_INTERVAL};
use crate::ui::{list, panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct QuakeWatchApp {
    pub state: AppState,
}

impl QuakeWatchApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for QuakeWatchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll();

        // Relative times and the "last hour" count move with the clock.
        ctx.request_repaint_after(RECOMPUTE_INTERVAL);

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters + statistics ----
        egui::SidePanel::left("stats_panel")
            .default_width(280.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: event list ----
        egui::TopBottomPanel::bottom("event_list")
            .default_height(280.0)
            .resizable(true)
            .show(ctx, |ui| {
                list::event_table(ui, &mut self.state);
            });

        // ---- Central panel: map ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::event_map(ui, &mut self.state);
        });
    }
}
