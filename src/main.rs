mod app;
mod state;
mod ui;

use std::sync::Arc;

use anyhow::{Context, Result};
use app::QuakeWatchApp;
use eframe::egui;
use quakewatch::config::FeedConfig;
use quakewatch::data::feed::source_from_config;
use quakewatch::worker::FetchWorker;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();

    let config = FeedConfig::from_env().context("reading feed configuration")?;
    let source = source_from_config(&config).context("creating feed source")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "QuakeWatch – Earthquake Monitor",
        options,
        Box::new(move |cc| {
            let ctx = cc.egui_ctx.clone();
            let worker = FetchWorker::new(Arc::from(source)).with_wakeup(move || ctx.request_repaint());
            Ok(Box::new(QuakeWatchApp::new(AppState::new(worker))))
        }),
    )
    .map_err(|e| anyhow::anyhow!("running UI: {e}"))
}
