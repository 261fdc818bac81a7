//! Line chart of the per-field history windows
//!
//! The x axis is the sample index inside the window (`0..history_length`),
//! so the chart keeps a fixed width and scrolls as ticks shift samples in.

use crate::history::{plot_points, Sequence};
use egui::Ui;
use egui_plot::{Corner, Legend, Line, Plot, PlotPoints};

/// Rendered state of the chart, refreshed once per tick
#[derive(Debug, Clone)]
pub struct SeriesPlot {
    labels: Vec<String>,
    series: Vec<Vec<[f64; 2]>>,
    width: usize,
    /// Line width in points
    pub line_width: f32,
    pub show_grid: bool,
}

impl SeriesPlot {
    /// Create a chart for the given field labels and window width
    pub fn new(labels: Vec<String>, width: usize) -> Self {
        Self {
            series: vec![Vec::new(); labels.len()],
            labels,
            width,
            line_width: 1.5,
            show_grid: true,
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Points currently drawn for each field
    pub fn series(&self) -> &[Vec<[f64; 2]>] {
        &self.series
    }

    /// Replace the drawn points with the latest window contents
    pub fn update<'a>(&mut self, sequences: impl IntoIterator<Item = Sequence<'a>>) {
        self.series = sequences.into_iter().map(plot_points).collect();
    }

    /// Draw the chart into the given UI
    pub fn show(&self, ui: &mut Ui) {
        Plot::new("serial_plot")
            .legend(Legend::default().position(Corner::LeftTop))
            .x_axis_label("Time")
            .y_axis_label("Values")
            .include_x(0.0)
            .include_x(self.width as f64)
            .show_grid(self.show_grid)
            .show(ui, |plot_ui| {
                for (label, points) in self.labels.iter().zip(&self.series) {
                    let line = Line::new(label.as_str(), PlotPoints::from(points.clone()))
                        .width(self.line_width);
                    plot_ui.line(line);
                }
            });
    }
}
