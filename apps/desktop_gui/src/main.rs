mod backend_bridge;
mod config;
mod controller;
mod ui;

use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::config::{load_settings, CliArgs};
use crate::controller::events::UiEvent;
use crate::ui::DirectoryApp;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    let settings = load_settings(&args)?;
    let backend_config = settings.backend_config()?;
    tracing::info!(
        database_url = %backend_config.database_url,
        endpoint = %backend_config.endpoint,
        results = backend_config.options.results,
        "starting user directory"
    );

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(backend_config, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("User Directory")
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([360.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "User Directory",
        options,
        Box::new(|_cc| Ok(Box::new(DirectoryApp::new(cmd_tx, ui_rx)))),
    )
    .map_err(|err| anyhow::anyhow!("desktop ui exited with error: {err}"))
}
