//! Serial reader thread
//!
//! The reader owns the [`SerialLink`] for its whole life. It waits for the
//! device to settle, flushes whatever was queued before the session began,
//! then reads lines until asked to stop:
//!
//! - A timed-out read changes nothing and the loop goes round again
//! - A line that matches the pattern replaces the shared snapshot
//! - A line that does not match is skipped
//! - A device error ends the thread and is returned through [`ReaderHandle::join`]
//!
//! Cancellation is cooperative: the stop flag is checked once per iteration,
//! so shutdown latency is bounded by the link's read timeout.

use crate::backend::{SerialLink, SharedSnapshot};
use crate::error::{PlotterError, Result};
use crate::matcher::FrameMatcher;
use crate::types::{ReaderCounters, ReaderStats};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Longest single sleep while settling, so a stop request is seen promptly
const SETTLE_SLICE: Duration = Duration::from_millis(20);

/// Reader loop state, moved onto its own thread by [`SerialReader::spawn`]
pub struct SerialReader {
    port: String,
    link: Box<dyn SerialLink>,
    matcher: Arc<FrameMatcher>,
    snapshot: SharedSnapshot,
    counters: Arc<ReaderCounters>,
    running: Arc<AtomicBool>,
    settle_delay: Duration,
}

impl SerialReader {
    /// Create a reader for an already opened link
    pub fn new(
        port: impl Into<String>,
        link: Box<dyn SerialLink>,
        matcher: Arc<FrameMatcher>,
        snapshot: SharedSnapshot,
    ) -> Self {
        Self {
            port: port.into(),
            link,
            matcher,
            snapshot,
            counters: Arc::new(ReaderCounters::new()),
            running: Arc::new(AtomicBool::new(true)),
            settle_delay: Duration::ZERO,
        }
    }

    /// Wait this long before flushing the input queue
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Shared counters, readable while the reader runs
    pub fn counters(&self) -> Arc<ReaderCounters> {
        self.counters.clone()
    }

    /// Start the reader on a named background thread
    pub fn spawn(self) -> Result<ReaderHandle> {
        let running = self.running.clone();
        let counters = self.counters.clone();

        let thread = std::thread::Builder::new()
            .name("serial-reader".to_string())
            .spawn(move || self.run())?;

        Ok(ReaderHandle {
            running,
            counters,
            thread,
        })
    }

    /// Run the reader loop on the current thread until stopped or failed
    ///
    /// The link is dropped (closing the device) when this returns.
    pub fn run(mut self) -> Result<()> {
        tracing::info!(
            "Serial reader started on {} (pattern {:?})",
            self.port,
            self.matcher.as_str()
        );

        let result = self.read_loop();
        match &result {
            Ok(()) => tracing::info!(
                "Serial reader on {} stopped ({} lines read)",
                self.port,
                self.counters.snapshot().lines_read
            ),
            Err(e) => tracing::error!("Serial reader on {} failed: {}", self.port, e),
        }
        result
    }

    fn read_loop(&mut self) -> Result<()> {
        self.settle();
        if !self.is_running() {
            return Ok(());
        }

        self.link.clear_input()?;
        tracing::debug!("Flushed stale input on {}", self.port);

        while self.is_running() {
            let Some(line) = self.link.read_line()? else {
                continue;
            };
            self.handle_line(&line)?;
        }

        Ok(())
    }

    fn handle_line(&self, line: &str) -> Result<()> {
        let tokens = self.matcher.extract(line);
        if tokens.is_empty() {
            self.counters.record_skip();
            tracing::trace!("Skipping unmatched line: {:?}", line);
            return Ok(());
        }

        self.counters.record_match();
        self.snapshot.publish(tokens)
    }

    fn settle(&self) {
        let deadline = Instant::now() + self.settle_delay;
        while self.is_running() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            std::thread::sleep(remaining.min(SETTLE_SLICE));
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Control handle for a spawned [`SerialReader`]
pub struct ReaderHandle {
    running: Arc<AtomicBool>,
    counters: Arc<ReaderCounters>,
    thread: JoinHandle<Result<()>>,
}

impl ReaderHandle {
    /// Ask the reader to exit at its next iteration
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the reader thread has returned (stopped or failed)
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    pub fn stats(&self) -> ReaderStats {
        self.counters.snapshot()
    }

    /// Wait for the reader thread and return how it ended
    pub fn join(self) -> Result<()> {
        self.thread.join().map_err(|_| PlotterError::ReaderPanicked)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::link::MockSerialLink;
    use mockall::Sequence;

    fn io_error() -> PlotterError {
        PlotterError::DeviceIo {
            port: "mock".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged"),
        }
    }

    fn scripted(lines: Vec<Option<&'static str>>) -> MockSerialLink {
        let mut link = MockSerialLink::new();
        let mut seq = Sequence::new();
        link.expect_clear_input()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        for line in lines {
            link.expect_read_line()
                .times(1)
                .in_sequence(&mut seq)
                .returning(move || Ok(line.map(str::to_string)));
        }
        link.expect_read_line()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(io_error()));
        link
    }

    fn reader(link: MockSerialLink) -> (SerialReader, SharedSnapshot) {
        let snapshot = SharedSnapshot::new();
        let reader = SerialReader::new(
            "mock",
            Box::new(link),
            Arc::new(FrameMatcher::default()),
            snapshot.clone(),
        );
        (reader, snapshot)
    }

    #[test]
    fn test_unmatched_lines_keep_last_frame() {
        let (reader, snapshot) = reader(scripted(vec![
            Some("{1.0}{2.0}"),
            None,
            Some("garbage"),
        ]));
        let counters = reader.counters();

        let err = reader.run().unwrap_err();
        assert!(matches!(err, PlotterError::DeviceIo { .. }));
        assert_eq!(snapshot.load(), vec!["1.0", "2.0"]);

        let stats = counters.snapshot();
        assert_eq!(stats.lines_read, 2);
        assert_eq!(stats.frames_matched, 1);
        assert_eq!(stats.lines_skipped, 1);
    }

    #[test]
    fn test_latest_frame_wins() {
        let (reader, snapshot) = reader(scripted(vec![Some("{1}"), Some("{2}"), Some("{3}")]));
        assert!(reader.run().is_err());
        assert_eq!(snapshot.load(), vec!["3"]);
    }

    #[test]
    fn test_width_change_is_fatal() {
        let mut link = MockSerialLink::new();
        link.expect_clear_input().returning(|| Ok(()));
        let mut seq = Sequence::new();
        link.expect_read_line()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Some("{1}{2}".to_string())));
        link.expect_read_line()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Some("{1}".to_string())));

        let (reader, snapshot) = reader(link);
        let err = reader.run().unwrap_err();
        assert!(matches!(
            err,
            PlotterError::FrameShapeChanged {
                expected: 2,
                found: 1
            }
        ));
        assert_eq!(snapshot.field_count(), 2);
    }

    #[test]
    fn test_clear_failure_is_fatal() {
        let mut link = MockSerialLink::new();
        link.expect_clear_input().times(1).returning(|| Err(io_error()));
        link.expect_read_line().never();

        let (reader, _) = reader(link);
        assert!(reader.run().is_err());
    }

    #[test]
    fn test_stop_during_settle_skips_flush() {
        let mut link = MockSerialLink::new();
        link.expect_clear_input().never();
        link.expect_read_line().never();

        let (reader, _) = reader(link);
        let handle = reader
            .with_settle_delay(Duration::from_secs(30))
            .spawn()
            .unwrap();

        handle.request_stop();
        assert!(handle.join().is_ok());
    }

    #[test]
    fn test_flush_waits_for_settle_delay() {
        let settle = Duration::from_millis(60);
        let cleared_at = Arc::new(std::sync::Mutex::new(None));

        let mut link = MockSerialLink::new();
        let recorded = cleared_at.clone();
        link.expect_clear_input().times(1).returning(move || {
            *recorded.lock().unwrap() = Some(Instant::now());
            Ok(())
        });
        link.expect_read_line().returning(|| Err(io_error()));

        let (reader, _) = reader(link);
        let spawned_at = Instant::now();
        let handle = reader.with_settle_delay(settle).spawn().unwrap();
        assert!(handle.join().is_err());

        let cleared_at = cleared_at.lock().unwrap().expect("flush never ran");
        assert!(cleared_at.duration_since(spawned_at) >= settle);
    }

    #[test]
    fn test_stop_flag_ends_loop() {
        let mut link = MockSerialLink::new();
        link.expect_clear_input().returning(|| Ok(()));
        link.expect_read_line().returning(|| {
            std::thread::sleep(Duration::from_millis(5));
            Ok(None)
        });

        let (reader, snapshot) = reader(link);
        let handle = reader.spawn().unwrap();
        std::thread::sleep(Duration::from_millis(30));
        assert!(!handle.is_finished());

        handle.request_stop();
        assert!(handle.join().is_ok());
        assert!(snapshot.is_empty());
    }
}
