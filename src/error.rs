//! Error handling for the serial plotter
//!
//! This module defines the error type shared by the reader, the history
//! buffers and the plot session, plus a Result alias.
//!
//! # Taxonomy
//!
//! - Parse gaps ([`PlotterError::Parse`]) are recoverable and never end a session
//! - Device failures ([`PlotterError::DeviceIo`], [`PlotterError::Serial`],
//!   [`PlotterError::FrameShapeChanged`]) stop the reader
//! - Lifecycle misuse ([`PlotterError::Precondition`]) is a programmer error
//! - A silent device ([`PlotterError::StartupTimeout`]) aborts `start()`

use std::time::Duration;
use thiserror::Error;

/// Main error type for serial plotter operations
#[derive(Error, Debug)]
pub enum PlotterError {
    /// The serial connection failed while reading
    #[error("Device I/O error on {port}: {source}")]
    DeviceIo {
        port: String,
        #[source]
        source: std::io::Error,
    },

    /// The serial port could not be opened or configured
    #[error("Serial port error on {port}: {source}")]
    Serial {
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// No frame arrived within the startup window
    #[error("No data received from {port} after {:.1}s", .elapsed.as_secs_f64())]
    StartupTimeout { port: String, elapsed: Duration },

    /// Invalid lifecycle transition or buffer misuse
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// A token could not be converted to a number
    #[error("Field {field}: cannot parse {token:?} as a number")]
    Parse { field: usize, token: String },

    /// The device changed the number of fields per frame mid-session
    #[error("Frame shape changed: expected {expected} fields, found {found}")]
    FrameShapeChanged { expected: usize, found: usize },

    /// The capture pattern does not compile
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Errors related to configuration loading
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The reader thread panicked instead of returning
    #[error("Serial reader thread panicked")]
    ReaderPanicked,

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PlotterError>,
    },
}

impl PlotterError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PlotterError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        PlotterError::Precondition(message.into())
    }

    /// Whether this error ends the reader (as opposed to a skipped frame)
    pub fn is_fatal(&self) -> bool {
        match self {
            PlotterError::Parse { .. } => false,
            PlotterError::WithContext { source, .. } => source.is_fatal(),
            _ => true,
        }
    }
}

/// Result type alias for serial plotter operations
pub type Result<T> = std::result::Result<T, PlotterError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
