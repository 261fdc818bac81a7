//! # Serial Plotter
//!
//! Live plotting of numeric fields streamed as text lines over a serial port.
//! Each line is matched against a regular expression; the captured tokens
//! become the fields of one frame. A background thread keeps the latest frame,
//! and a timer-driven session samples it into fixed-length rolling windows
//! that the chart draws.
//!
//! ## Architecture
//!
//! - **Backend**: Reader thread owning the serial link ([`backend`])
//! - **Matcher**: Regex-based frame extraction ([`matcher`])
//! - **History**: Zero-filled rolling windows per field ([`history`])
//! - **Session**: Start/tick/stop lifecycle ([`session`])
//! - **Frontend**: eframe/egui window with egui_plot lines ([`frontend`])
//!
//! ## Example
//!
//! ```ignore
//! use serial_plotter::{PlotSession, PlotterConfig};
//!
//! let mut config = PlotterConfig::default();
//! config.serial.port = "/dev/ttyUSB0".to_string();
//!
//! let mut session = PlotSession::new(config)?;
//! session.start()?;
//! let windows = session.tick()?;
//! session.stop()?;
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod frontend;
pub mod history;
pub mod matcher;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use backend::{SerialLink, SerialPortLink, SharedSnapshot};
pub use config::PlotterConfig;
pub use error::{PlotterError, Result};
pub use frontend::PlotterApp;
pub use history::{HistoryBuffer, HistoryWindow, Sequence};
pub use matcher::FrameMatcher;
pub use session::PlotSession;
pub use types::{ReaderStats, SessionState};
