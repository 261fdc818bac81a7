//! Rolling per-field history
//!
//! Each field gets a [`HistoryWindow`] holding exactly `capacity` samples.
//! Windows start filled with zeros so the plot has a fixed width from the
//! first tick; every append evicts the oldest sample.
//!
//! The window set is created lazily: [`HistoryBuffer::initialize`] runs once,
//! when the first frame reveals how many fields the device sends.

use crate::error::{PlotterError, Result};
use std::collections::VecDeque;

/// Ordered, restartable view over a window's samples (oldest first)
///
/// The iterator borrows the window and is `Clone`, so a renderer can walk it
/// as many times as it needs without the buffer keeping any cursor state.
pub type Sequence<'a> = std::iter::Copied<std::collections::vec_deque::Iter<'a, f64>>;

/// Fixed-capacity FIFO of samples for one field
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl HistoryWindow {
    /// Create a window pre-filled with `capacity` zeros
    pub fn new(capacity: usize) -> Self {
        let mut values = VecDeque::with_capacity(capacity);
        values.resize(capacity, 0.0);
        Self { values, capacity }
    }

    /// Push a sample, evicting the oldest one
    pub fn push(&mut self, value: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.values.len() >= self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Most recent sample
    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    /// Samples in append order
    pub fn iter(&self) -> Sequence<'_> {
        self.values.iter().copied()
    }

}

/// Pair each sample with its position in the window
pub fn plot_points(sequence: Sequence<'_>) -> Vec<[f64; 2]> {
    sequence
        .enumerate()
        .map(|(i, v)| [i as f64, v])
        .collect()
}

/// The set of windows, one per field index
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    capacity: usize,
    windows: Option<Vec<HistoryWindow>>,
}

impl HistoryBuffer {
    /// Create an uninitialized buffer set; windows will hold `capacity` samples
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            windows: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_initialized(&self) -> bool {
        self.windows.is_some()
    }

    /// Number of fields, zero before initialization
    pub fn field_count(&self) -> usize {
        self.windows.as_ref().map_or(0, Vec::len)
    }

    /// Allocate one window per field
    ///
    /// Field count is fixed for the life of the session, so a second call is
    /// rejected rather than resizing.
    pub fn initialize(&mut self, field_count: usize) -> Result<()> {
        if let Some(windows) = &self.windows {
            return Err(PlotterError::precondition(format!(
                "history already initialized with {} fields",
                windows.len()
            )));
        }
        if field_count == 0 {
            return Err(PlotterError::precondition(
                "history needs at least one field",
            ));
        }

        self.windows = Some(
            (0..field_count)
                .map(|_| HistoryWindow::new(self.capacity))
                .collect(),
        );
        tracing::debug!(
            "History initialized: {} fields x {} samples",
            field_count,
            self.capacity
        );
        Ok(())
    }

    /// Append one sample to a field's window
    pub fn append(&mut self, field: usize, value: f64) -> Result<()> {
        self.window_mut(field)?.push(value);
        Ok(())
    }

    /// Append one sample to every field
    pub fn append_frame(&mut self, values: &[f64]) -> Result<()> {
        let windows = self.windows_mut()?;
        if values.len() != windows.len() {
            return Err(PlotterError::FrameShapeChanged {
                expected: windows.len(),
                found: values.len(),
            });
        }

        for (window, &value) in windows.iter_mut().zip(values) {
            window.push(value);
        }
        Ok(())
    }

    /// Convert a frame's tokens and append them
    ///
    /// All tokens are converted before any window is touched: if one token is
    /// not a number the whole frame is rejected with [`PlotterError::Parse`]
    /// and every window stays as it was.
    pub fn append_tokens<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<()> {
        let values = parse_fields(tokens)?;
        self.append_frame(&values)
    }

    /// The current contents of a field's window, oldest first
    pub fn sequence(&self, field: usize) -> Result<Sequence<'_>> {
        Ok(self.window(field)?.iter())
    }

    /// Every field's sequence, in field order
    pub fn sequences(&self) -> Result<Vec<Sequence<'_>>> {
        Ok(self.windows()?.iter().map(HistoryWindow::iter).collect())
    }

    /// A field's samples as `[index, value]` pairs for the chart
    pub fn plot_points(&self, field: usize) -> Result<Vec<[f64; 2]>> {
        Ok(plot_points(self.sequence(field)?))
    }

    /// A field's window
    pub fn window(&self, field: usize) -> Result<&HistoryWindow> {
        let windows = self.windows()?;
        let count = windows.len();
        windows.get(field).ok_or_else(|| {
            PlotterError::precondition(format!("field {} out of range (0..{})", field, count))
        })
    }

    /// Labels for the fields: `Num 0`, `Num 1`, ...
    pub fn labels(&self) -> Vec<String> {
        (0..self.field_count()).map(field_label).collect()
    }

    fn windows(&self) -> Result<&[HistoryWindow]> {
        self.windows
            .as_deref()
            .ok_or_else(|| PlotterError::precondition("history not initialized"))
    }

    fn windows_mut(&mut self) -> Result<&mut [HistoryWindow]> {
        self.windows
            .as_deref_mut()
            .ok_or_else(|| PlotterError::precondition("history not initialized"))
    }

    fn window_mut(&mut self, field: usize) -> Result<&mut HistoryWindow> {
        let windows = self.windows_mut()?;
        let count = windows.len();
        windows.get_mut(field).ok_or_else(|| {
            PlotterError::precondition(format!("field {} out of range (0..{})", field, count))
        })
    }
}

/// Display label for a field index
pub fn field_label(field: usize) -> String {
    format!("Num {}", field)
}

/// Convert textual tokens to numbers, failing on the first bad token
pub fn parse_fields<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<f64>> {
    tokens
        .iter()
        .enumerate()
        .map(|(field, token)| {
            let token = token.as_ref();
            token.trim().parse::<f64>().map_err(|_| PlotterError::Parse {
                field,
                token: token.to_string(),
            })
        })
        .collect()
}
