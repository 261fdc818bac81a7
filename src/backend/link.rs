//! Serial link abstraction
//!
//! The reader talks to the device through the [`SerialLink`] trait so that
//! tests can drive it with scripted lines. [`SerialPortLink`] is the real
//! implementation on top of the `serialport` crate.

use crate::config::SerialSettings;
use crate::error::{PlotterError, Result};
use serialport::{ClearBuffer, SerialPort};
use std::io::{ErrorKind, Read};

/// Bytes requested from the port per read
const READ_CHUNK: usize = 256;

/// Longest partial line kept while waiting for its terminator
pub const MAX_PENDING: usize = 4096;

/// Line-oriented access to a serial device
#[cfg_attr(test, mockall::automock)]
pub trait SerialLink: Send {
    /// Discard everything already queued on the input side
    fn clear_input(&mut self) -> Result<()>;

    /// Read one line without its terminator
    ///
    /// Returns `Ok(None)` when the read timed out or no complete line is
    /// available yet. Errors are device failures and end the reader.
    fn read_line(&mut self) -> Result<Option<String>>;
}

/// [`SerialLink`] over an open `serialport` handle
///
/// Each [`SerialLink::read_line`] call performs at most one bounded read, so
/// a device that streams bytes without ever sending `\n` cannot hold the
/// caller longer than one read timeout.
pub struct SerialPortLink {
    port_name: String,
    port: Box<dyn SerialPort>,
    /// Received bytes not yet returned as a line
    pending: Vec<u8>,
}

impl SerialPortLink {
    /// Open and configure the port named in `settings`
    pub fn open(settings: &SerialSettings) -> Result<Self> {
        let port = serialport::new(&settings.port, settings.baud)
            .timeout(settings.read_timeout())
            .open()
            .map_err(|source| {
                let known = available_ports();
                if known.is_empty() {
                    tracing::warn!("No serial ports detected");
                } else {
                    tracing::warn!("Available serial ports: {}", known.join(", "));
                }
                PlotterError::Serial {
                    port: settings.port.clone(),
                    source,
                }
            })?;

        tracing::info!("Opened {} at {} baud", settings.port, settings.baud);
        Ok(Self::from_port(settings.port.clone(), port))
    }

    /// Wrap a port that is already open and configured
    pub fn from_port(port_name: impl Into<String>, port: Box<dyn SerialPort>) -> Self {
        Self {
            port_name: port_name.into(),
            port,
            pending: Vec::with_capacity(READ_CHUNK),
        }
    }

    /// Split the first complete line off `pending`
    fn take_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let rest = self.pending.split_off(end + 1);
        let line = decode_line(&self.pending);
        self.pending = rest;
        Some(line)
    }

    fn device_error(&self, source: std::io::Error) -> PlotterError {
        PlotterError::DeviceIo {
            port: self.port_name.clone(),
            source,
        }
    }
}

impl SerialLink for SerialPortLink {
    fn clear_input(&mut self) -> Result<()> {
        self.pending.clear();
        self.port
            .clear(ClearBuffer::Input)
            .map_err(|source| PlotterError::Serial {
                port: self.port_name.clone(),
                source,
            })
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        // A previous chunk may have carried several lines
        if let Some(line) = self.take_line() {
            return Ok(Some(line));
        }

        let mut chunk = [0u8; READ_CHUNK];
        match self.port.read(&mut chunk) {
            Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                return Ok(None)
            }
            Err(e) => return Err(self.device_error(e)),
        }

        if let Some(line) = self.take_line() {
            return Ok(Some(line));
        }
        if self.pending.len() > MAX_PENDING {
            tracing::trace!(
                "Dropping {} bytes without a line terminator from {}",
                self.pending.len(),
                self.port_name
            );
            self.pending.clear();
        }
        Ok(None)
    }
}

/// Decode raw line bytes, dropping the `\n` / `\r\n` terminator
pub fn decode_line(bytes: &[u8]) -> String {
    let line = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

/// Names of the serial ports the OS reports, for diagnostics
pub fn available_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            tracing::debug!("Port enumeration failed: {}", e);
            Vec::new()
        }
    }
}
