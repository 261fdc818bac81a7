//! Plot session lifecycle
//!
//! A [`PlotSession`] ties the serial reader to the history buffers:
//!
//! ```text
//! Idle --start()--> Starting --first frame--> Running --stop()--> Stopping --> Stopped
//!                      |                         |
//!                      +-- timeout / fault ------+-- device fault (next tick) --> Stopped
//! ```
//!
//! `start()` blocks, polling the shared snapshot, until the device sends its
//! first matching frame. That frame fixes the number of fields. After that
//! the caller drives [`PlotSession::tick`] from its own timer; each tick
//! samples the latest frame and advances every field by exactly one value.
//!
//! # Example
//!
//! ```ignore
//! use serial_plotter::{PlotSession, PlotterConfig};
//!
//! let mut session = PlotSession::new(PlotterConfig::default())?;
//! session.start()?;
//! loop {
//!     for (label, seq) in session.labels().iter().zip(session.tick()?) {
//!         draw(label, seq);
//!     }
//!     std::thread::sleep(session.config().session.tick_interval());
//! }
//! ```

use crate::backend::{ReaderHandle, SerialLink, SerialPortLink, SerialReader, SharedSnapshot};
use crate::config::{PlotterConfig, SerialSettings};
use crate::error::{PlotterError, Result};
use crate::history::{HistoryBuffer, Sequence};
use crate::matcher::FrameMatcher;
use crate::types::{ReaderStats, SessionState};
use std::sync::Arc;
use std::time::Instant;

/// Reader lifecycle plus per-field history for one device
pub struct PlotSession {
    config: PlotterConfig,
    matcher: Arc<FrameMatcher>,
    state: SessionState,
    snapshot: SharedSnapshot,
    history: HistoryBuffer,
    reader: Option<ReaderHandle>,
    last_stats: ReaderStats,
}

impl PlotSession {
    /// Create an idle session; validates the config and compiles the pattern
    pub fn new(config: PlotterConfig) -> Result<Self> {
        config.validate()?;
        let matcher = Arc::new(FrameMatcher::new(&config.capture.pattern)?);
        let history = HistoryBuffer::new(config.capture.history_length);

        Ok(Self {
            config,
            matcher,
            state: SessionState::Idle,
            snapshot: SharedSnapshot::new(),
            history,
            reader: None,
            last_stats: ReaderStats::default(),
        })
    }

    pub fn config(&self) -> &PlotterConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn port(&self) -> &str {
        &self.config.serial.port
    }

    /// Field labels, fixed once the session is running
    pub fn labels(&self) -> Vec<String> {
        self.history.labels()
    }

    pub fn field_count(&self) -> usize {
        self.history.field_count()
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// Reader counters (live while running, final after stop)
    pub fn reader_stats(&self) -> ReaderStats {
        self.reader
            .as_ref()
            .map_or(self.last_stats, ReaderHandle::stats)
    }

    /// Open the configured serial port and wait for the first frame
    pub fn start(&mut self) -> Result<()> {
        self.start_with(|settings| {
            let link: Box<dyn SerialLink> = Box::new(SerialPortLink::open(settings)?);
            Ok(link)
        })
    }

    /// Like [`start`](Self::start), with the caller providing the link
    pub fn start_with<F>(&mut self, connect: F) -> Result<()>
    where
        F: FnOnce(&SerialSettings) -> Result<Box<dyn SerialLink>>,
    {
        if self.state != SessionState::Idle {
            return Err(PlotterError::precondition(format!(
                "start() requires an idle session, state is {}",
                self.state
            )));
        }

        self.state = SessionState::Starting;
        tracing::info!(
            "Starting session on {} at {} baud",
            self.config.serial.port,
            self.config.serial.baud
        );

        let link = match connect(&self.config.serial) {
            Ok(link) => link,
            Err(e) => {
                self.state = SessionState::Stopped;
                return Err(e);
            }
        };

        let reader = SerialReader::new(
            self.config.serial.port.clone(),
            link,
            self.matcher.clone(),
            self.snapshot.clone(),
        )
        .with_settle_delay(self.config.serial.settle_delay());

        match reader.spawn() {
            Ok(handle) => self.reader = Some(handle),
            Err(e) => {
                self.state = SessionState::Stopped;
                return Err(e);
            }
        }

        let field_count = match self.wait_for_first_frame() {
            Ok(count) => count,
            Err(e) => {
                // A reader that died first has the more useful error
                let reader_outcome = self.shutdown_reader();
                self.state = SessionState::Stopped;
                return Err(reader_outcome.err().unwrap_or(e));
            }
        };

        self.history.initialize(field_count)?;
        self.state = SessionState::Running;
        tracing::info!(
            "Session running on {} with {} fields",
            self.config.serial.port,
            field_count
        );
        Ok(())
    }

    /// Sample the latest frame into the history and return every field's window
    ///
    /// Ticks are a sampling clock: if no new frame arrived since the last
    /// tick, the previous values are appended again. A frame with a token
    /// that is not a number is skipped for this tick and the windows are
    /// returned unchanged. A reader that died since the last tick ends the
    /// session and its error is returned here.
    pub fn tick(&mut self) -> Result<Vec<Sequence<'_>>> {
        if self.state != SessionState::Running {
            return Err(PlotterError::precondition(format!(
                "tick() requires a running session, state is {}",
                self.state
            )));
        }

        if self.reader.as_ref().map_or(true, ReaderHandle::is_finished) {
            self.state = SessionState::Stopping;
            let outcome = self.shutdown_reader();
            self.state = SessionState::Stopped;
            tracing::warn!("Session on {} ended by reader exit", self.config.serial.port);
            return Err(outcome.err().unwrap_or_else(|| {
                PlotterError::precondition("serial reader exited while running")
            }));
        }

        let tokens = self.snapshot.load();
        if let Err(e) = self.history.append_tokens(&tokens) {
            if e.is_fatal() {
                return Err(e);
            }
            tracing::trace!("Skipping tick: {}", e);
        }

        self.history.sequences()
    }

    /// Stop the reader, close the device and move to `Stopped`
    ///
    /// Calling this on a stopped session does nothing. If the reader failed
    /// and no tick has reported it yet, shutdown still completes and the
    /// failure is returned.
    pub fn stop(&mut self) -> Result<()> {
        match self.state {
            SessionState::Stopped => return Ok(()),
            SessionState::Idle => {
                return Err(PlotterError::precondition(
                    "stop() called on a session that was never started",
                ))
            }
            _ => {}
        }

        self.state = SessionState::Stopping;
        let outcome = self.shutdown_reader();
        self.state = SessionState::Stopped;
        tracing::info!("Session on {} stopped", self.config.serial.port);
        outcome
    }

    fn wait_for_first_frame(&self) -> Result<usize> {
        let started = Instant::now();
        let timeout = self.config.session.startup_timeout();
        let poll = self.config.session.startup_poll();

        loop {
            let count = self.snapshot.field_count();
            if count > 0 {
                tracing::debug!(
                    "First frame after {:.2}s",
                    started.elapsed().as_secs_f64()
                );
                return Ok(count);
            }

            if self.reader.as_ref().map_or(true, ReaderHandle::is_finished) {
                return Err(PlotterError::precondition(
                    "serial reader exited before the first frame",
                ));
            }

            let elapsed = started.elapsed();
            if timeout.is_some_and(|limit| elapsed >= limit) {
                return Err(PlotterError::StartupTimeout {
                    port: self.config.serial.port.clone(),
                    elapsed,
                });
            }

            std::thread::sleep(poll);
        }
    }

    /// Signal and join the reader, keeping its final counters
    fn shutdown_reader(&mut self) -> Result<()> {
        let Some(reader) = self.reader.take() else {
            return Ok(());
        };

        reader.request_stop();
        self.last_stats = reader.stats();
        reader.join()
    }
}

impl Drop for PlotSession {
    fn drop(&mut self) {
        if self.state.is_active() {
            if let Err(e) = self.stop() {
                tracing::warn!("Session on {} ended with error: {}", self.config.serial.port, e);
            }
        }
    }
}
