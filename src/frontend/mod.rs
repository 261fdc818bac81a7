//! Frontend for the serial plotter
//!
//! The window is the rendering side of a [`PlotSession`]: it owns the tick
//! timer, pulls the updated windows from the session on every tick and hands
//! them to the [`SeriesPlot`]. A device failure stops the ticking and is
//! shown in the status bar; the session is stopped when the window closes.

pub mod plot;

pub use plot::SeriesPlot;

use crate::session::PlotSession;
use std::time::{Duration, Instant};

/// Window title
pub const WINDOW_TITLE: &str = "Serial Plotter";

/// eframe application around a running [`PlotSession`]
pub struct PlotterApp {
    session: PlotSession,
    plot: SeriesPlot,
    tick_interval: Duration,
    last_tick: Option<Instant>,
    fault: Option<String>,
}

impl PlotterApp {
    /// Create the app for a session that has already been started
    pub fn new(_cc: &eframe::CreationContext<'_>, session: PlotSession) -> Self {
        let plot = SeriesPlot::new(session.labels(), session.history().capacity());
        let tick_interval = session.config().session.tick_interval();

        Self {
            session,
            plot,
            tick_interval,
            last_tick: None,
            fault: None,
        }
    }

    /// Run one tick if the interval has elapsed
    fn maybe_tick(&mut self) {
        if self.fault.is_some() {
            return;
        }
        if self
            .last_tick
            .is_some_and(|last| last.elapsed() < self.tick_interval)
        {
            return;
        }
        self.last_tick = Some(Instant::now());

        match self.session.tick() {
            Ok(sequences) => self.plot.update(sequences),
            Err(e) => {
                tracing::error!("Plotting stopped: {}", e);
                self.fault = Some(e.to_string());
            }
        }
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        let stats = self.session.reader_stats();
        ui.horizontal(|ui| {
            ui.label(format!(
                "{} @ {} baud",
                self.session.port(),
                self.session.config().serial.baud
            ));
            ui.separator();
            ui.label(self.session.state().to_string());
            ui.separator();
            ui.label(format!(
                "{} lines, {} frames ({:.0}% matched)",
                stats.lines_read,
                stats.frames_matched,
                stats.match_rate()
            ));

            if let Some(fault) = &self.fault {
                ui.separator();
                ui.colored_label(egui::Color32::RED, fault);
            }
        });
    }
}

impl eframe::App for PlotterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.maybe_tick();

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.status_bar(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(WINDOW_TITLE);
            self.plot.show(ui);
        });

        if self.fault.is_none() {
            ctx.request_repaint_after(self.tick_interval);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(e) = self.session.stop() {
            tracing::warn!("Session ended with error: {}", e);
        }
    }
}
