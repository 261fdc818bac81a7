//! Serial Plotter - Main Entry Point
//!
//! Opens the configured serial port, waits for the first frame and then
//! plots every field live until the window is closed.

use anyhow::Context;
use serial_plotter::{
    frontend::{PlotterApp, WINDOW_TITLE},
    PlotSession, PlotterConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,serial_plotter=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Serial Plotter");

    let config = PlotterConfig::from_environment().context("Failed to load configuration")?;
    tracing::info!(
        "Plotting {} at {} baud, pattern {:?}, {} samples",
        config.serial.port,
        config.serial.baud,
        config.capture.pattern,
        config.capture.history_length
    );

    let mut session = PlotSession::new(config)?;
    session
        .start()
        .with_context(|| format!("Failed to start plotting on {}", session.port()))?;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 540.0])
            .with_min_inner_size([480.0, 320.0])
            .with_title(WINDOW_TITLE),
        ..Default::default()
    };

    eframe::run_native(
        WINDOW_TITLE,
        native_options,
        Box::new(|cc| Ok(Box::new(PlotterApp::new(cc, session)))),
    )
    .map_err(|e| anyhow::anyhow!("Window error: {}", e))?;

    tracing::info!("Shutting down...");
    Ok(())
}
