//! Backend module for serial acquisition
//!
//! The serial connection is read on its own thread so that the render loop
//! never blocks on the device. The only state shared with the render side is
//! the [`SharedSnapshot`] holding the most recent frame.
//!
//! # Components
//!
//! - [`SerialLink`] / [`SerialPortLink`] - Line-oriented device access
//! - [`SerialReader`] - Reader loop that keeps the snapshot current
//! - [`ReaderHandle`] - Stop flag and join handle for a running reader
//! - [`SharedSnapshot`] - Latest parsed frame, replaced as a whole

pub mod link;
pub mod reader;

pub use link::{available_ports, decode_line, SerialLink, SerialPortLink};
pub use reader::{ReaderHandle, SerialReader};

use crate::error::{PlotterError, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Latest successfully matched frame, shared by the reader and the session
///
/// The reader publishes whole frames; readers of the snapshot always see a
/// complete frame. Once a frame has been published, every later frame must
/// have the same number of fields.
#[derive(Debug, Clone, Default)]
pub struct SharedSnapshot {
    inner: Arc<Mutex<Vec<String>>>,
}

impl SharedSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current frame
    ///
    /// Empty frames are ignored. A frame whose width differs from the
    /// established one is rejected and the snapshot is left unchanged.
    pub fn publish(&self, tokens: Vec<String>) -> Result<()> {
        if tokens.is_empty() {
            return Ok(());
        }

        let mut current = self.lock();
        if !current.is_empty() && current.len() != tokens.len() {
            return Err(PlotterError::FrameShapeChanged {
                expected: current.len(),
                found: tokens.len(),
            });
        }

        *current = tokens;
        Ok(())
    }

    /// Copy of the current frame (empty until the first publish)
    pub fn load(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Number of fields, zero until the first publish
    pub fn field_count(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        // Writers only ever assign a complete Vec, so a poisoned guard still
        // holds a consistent frame
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
