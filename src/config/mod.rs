//! Configuration module for the serial plotter
//!
//! Configuration is read from a TOML file. Every field is optional; anything
//! left out takes the default listed below.
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyACM0"
//! baud = 115200
//! read_timeout_ms = 100
//! settle_delay_ms = 1000
//!
//! [capture]
//! pattern = '\{(.*?)\}'
//! history_length = 100
//!
//! [session]
//! tick_interval_ms = 10
//! startup_timeout_ms = 10000   # 0 waits forever
//! startup_poll_ms = 100
//! ```
//!
//! # Config Location
//!
//! The binary looks for the file named by `SERIAL_PLOTTER_CONFIG`, then for
//! `plotter.toml` in the platform data directory under [`APP_ID`]:
//!
//! - **Linux**: `~/.local/share/dev.serial-plotter/`
//! - **macOS**: `~/Library/Application Support/dev.serial-plotter/`
//! - **Windows**: `%APPDATA%\dev.serial-plotter\`
//!
//! `SERIAL_PLOTTER_PORT` and `SERIAL_PLOTTER_BAUD` override the file.

use crate::error::{PlotterError, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for data directories
pub const APP_ID: &str = "dev.serial-plotter";

/// Config filename inside the app data directory
pub const CONFIG_FILE: &str = "plotter.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "SERIAL_PLOTTER_CONFIG";

/// Environment variable overriding the serial port
pub const PORT_ENV: &str = "SERIAL_PLOTTER_PORT";

/// Environment variable overriding the baud rate
pub const BAUD_ENV: &str = "SERIAL_PLOTTER_BAUD";

/// Default serial device
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";

/// Default baud rate
pub const DEFAULT_BAUD: u32 = 115_200;

/// Default number of samples kept per field
pub const DEFAULT_HISTORY_LENGTH: usize = 100;

/// Default capture pattern: brace-delimited tokens
pub const DEFAULT_PATTERN: &str = r"\{(.*?)\}";

/// Default render cadence in milliseconds
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 10;

/// Default per-read timeout; also bounds shutdown latency
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 100;

/// Default delay before the input queue is flushed
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;

/// Default time to wait for the first frame
pub const DEFAULT_STARTUP_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval while waiting for the first frame
pub const DEFAULT_STARTUP_POLL_MS: u64 = 100;

// ==================== Config Location ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn default_config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Settings ====================

/// Serial connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Device path or port name (e.g. `/dev/ttyACM0`, `COM3`)
    pub port: String,

    /// Baud rate
    pub baud: u32,

    /// Timeout of a single line read in milliseconds
    pub read_timeout_ms: u64,

    /// Delay before discarding stale input, in milliseconds
    pub settle_delay_ms: u64,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud: DEFAULT_BAUD,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        }
    }
}

impl SerialSettings {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Frame capture settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Regular expression; the first capture group (or whole match) is a field
    pub pattern: String,

    /// Number of samples kept per field
    pub history_length: usize,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            history_length: DEFAULT_HISTORY_LENGTH,
        }
    }
}

/// Session timing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Render cadence in milliseconds
    pub tick_interval_ms: u64,

    /// How long `start()` waits for the first frame; 0 waits forever
    pub startup_timeout_ms: u64,

    /// Sleep between checks for the first frame
    pub startup_poll_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            startup_timeout_ms: DEFAULT_STARTUP_TIMEOUT_MS,
            startup_poll_ms: DEFAULT_STARTUP_POLL_MS,
        }
    }
}

impl SessionSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Startup bound, or `None` when waiting is unbounded
    pub fn startup_timeout(&self) -> Option<Duration> {
        (self.startup_timeout_ms > 0).then(|| Duration::from_millis(self.startup_timeout_ms))
    }

    pub fn startup_poll(&self) -> Duration {
        Duration::from_millis(self.startup_poll_ms.max(1))
    }
}

/// Complete plotter configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotterConfig {
    pub serial: SerialSettings,
    pub capture: CaptureSettings,
    pub session: SessionSettings,
}

impl PlotterConfig {
    /// Parse a configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| PlotterError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PlotterError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::from_toml_str(&content).with_context(|| format!("{:?}", path))
    }

    /// Resolve the configuration the way the binary does
    ///
    /// An explicit `SERIAL_PLOTTER_CONFIG` file must load; the default file is
    /// optional. Environment overrides are applied last.
    pub fn from_environment() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(PathBuf::from(path))?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => {
                    tracing::info!("Loading config from {:?}", path);
                    Self::load(path)?
                }
                None => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `SERIAL_PLOTTER_PORT` / `SERIAL_PLOTTER_BAUD` style overrides
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(PORT_ENV).filter(|p| !p.trim().is_empty()) {
            self.serial.port = port.trim().to_string();
        }

        if let Some(baud) = lookup(BAUD_ENV) {
            self.serial.baud = baud.trim().parse().map_err(|_| {
                PlotterError::Config(format!("{} is not a baud rate: {:?}", BAUD_ENV, baud))
            })?;
        }

        self.validate()
    }

    /// Check value ranges and that the pattern compiles
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.trim().is_empty() {
            return Err(PlotterError::Config("serial.port must not be empty".to_string()));
        }
        if self.serial.baud == 0 {
            return Err(PlotterError::Config("serial.baud must be positive".to_string()));
        }
        if self.serial.read_timeout_ms == 0 {
            return Err(PlotterError::Config(
                "serial.read_timeout_ms must be positive".to_string(),
            ));
        }
        if self.capture.history_length == 0 {
            return Err(PlotterError::Config(
                "capture.history_length must be at least 1".to_string(),
            ));
        }
        if self.session.tick_interval_ms == 0 {
            return Err(PlotterError::Config(
                "session.tick_interval_ms must be positive".to_string(),
            ));
        }
        if let Some(timeout) = self.session.startup_timeout() {
            if timeout <= self.serial.settle_delay() {
                return Err(PlotterError::Config(format!(
                    "session.startup_timeout_ms ({}) must exceed serial.settle_delay_ms ({})",
                    self.session.startup_timeout_ms, self.serial.settle_delay_ms
                )));
            }
        }

        regex::Regex::new(&self.capture.pattern)?;
        Ok(())
    }
}
