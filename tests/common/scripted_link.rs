//! Channel-driven serial link for exercising the reader without hardware

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use serial_plotter::{PlotterError, Result, SerialLink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What the fake device does next
pub enum LinkEvent {
    Line(String),
    Fail(std::io::ErrorKind),
}

/// Device side: lets a test push lines or errors into a [`ScriptedLink`]
#[derive(Clone)]
pub struct LinkController {
    tx: Sender<LinkEvent>,
    cleared: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl LinkController {
    pub fn send_line(&self, line: &str) {
        let _ = self.tx.send(LinkEvent::Line(line.to_string()));
    }

    pub fn fail(&self) {
        let _ = self.tx.send(LinkEvent::Fail(std::io::ErrorKind::BrokenPipe));
    }

    /// Whether the reader has flushed the input queue
    pub fn is_cleared(&self) -> bool {
        self.cleared.load(Ordering::SeqCst)
    }

    /// Whether the link has been dropped, i.e. the connection closed
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Wait for the flush, then send `line`, from a helper thread
    pub fn send_after_clear(&self, line: &'static str) -> std::thread::JoinHandle<()> {
        let controller = self.clone();
        std::thread::spawn(move || {
            if super::wait_until(|| controller.is_cleared()) {
                controller.send_line(line);
            }
        })
    }

    /// Wait for the flush, then fail the link, from a helper thread
    pub fn fail_after_clear(&self) -> std::thread::JoinHandle<()> {
        let controller = self.clone();
        std::thread::spawn(move || {
            if super::wait_until(|| controller.is_cleared()) {
                controller.fail();
            }
        })
    }
}

/// Reader side of the fake device
pub struct ScriptedLink {
    rx: Receiver<LinkEvent>,
    read_timeout: Duration,
    cleared: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

/// Create a connected link/controller pair
pub fn scripted_link(read_timeout: Duration) -> (ScriptedLink, LinkController) {
    let (tx, rx) = unbounded();
    let cleared = Arc::new(AtomicBool::new(false));
    let closed = Arc::new(AtomicBool::new(false));

    let link = ScriptedLink {
        rx,
        read_timeout,
        cleared: cleared.clone(),
        closed: closed.clone(),
    };
    let controller = LinkController {
        tx,
        cleared,
        closed,
    };
    (link, controller)
}

impl SerialLink for ScriptedLink {
    fn clear_input(&mut self) -> Result<()> {
        let stale = self.rx.try_iter().count();
        if stale > 0 {
            tracing::debug!("Discarded {} stale events", stale);
        }
        self.cleared.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        match self.rx.recv_timeout(self.read_timeout) {
            Ok(LinkEvent::Line(line)) => Ok(Some(line)),
            Ok(LinkEvent::Fail(kind)) => Err(PlotterError::DeviceIo {
                port: "scripted".to_string(),
                source: std::io::Error::new(kind, "scripted device failure"),
            }),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(self.read_timeout);
                Ok(None)
            }
        }
    }
}

impl Drop for ScriptedLink {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
