//! Integration tests for matching and buffering without a device
//!
//! Frames go through the matcher, the shared snapshot and the history buffer
//! exactly as the reader and a tick would move them.

mod common;

use serial_plotter::history::parse_fields;
use serial_plotter::{FrameMatcher, HistoryBuffer, PlotterError, SharedSnapshot};

#[test]
fn test_brace_frame_into_three_sample_windows() {
    let matcher = FrameMatcher::new(r"\{(.*?)\}").unwrap();
    let snapshot = SharedSnapshot::new();

    let tokens = matcher.extract("a:{0.5},b:{1.25}");
    assert_eq!(tokens, vec!["0.5", "1.25"]);
    snapshot.publish(tokens).unwrap();

    let mut history = HistoryBuffer::new(3);
    history.initialize(snapshot.field_count()).unwrap();
    history.append_tokens(&snapshot.load()).unwrap();

    let windows: Vec<Vec<f64>> = history
        .sequences()
        .unwrap()
        .into_iter()
        .map(|seq| seq.collect())
        .collect();
    assert_eq!(windows, vec![vec![0.0, 0.0, 0.5], vec![0.0, 0.0, 1.25]]);
}

#[test]
fn test_unmatched_line_leaves_snapshot() {
    let matcher = FrameMatcher::default();
    let snapshot = SharedSnapshot::new();
    snapshot.publish(matcher.extract("{3.5}")).unwrap();

    snapshot.publish(matcher.extract("garbage")).unwrap();
    assert_eq!(snapshot.load(), vec!["3.5"]);
}

#[test]
fn test_window_keeps_last_n_values() {
    let mut history = HistoryBuffer::new(4);
    history.initialize(1).unwrap();
    for v in 1..=10 {
        history.append(0, v as f64).unwrap();
    }

    let values: Vec<f64> = history.sequence(0).unwrap().collect();
    assert_eq!(values, vec![7.0, 8.0, 9.0, 10.0]);
    common::assert_float_eq(history.window(0).unwrap().latest().unwrap(), 10.0, 1e-12);
}

#[test]
fn test_history_lifecycle_preconditions() {
    let mut history = HistoryBuffer::new(5);
    assert!(!history.is_initialized());
    assert!(history.sequences().is_err());

    history.initialize(3).unwrap();
    assert_eq!(history.field_count(), 3);
    assert!(matches!(history.initialize(3), Err(PlotterError::Precondition(_))));
    assert!(matches!(history.initialize(4), Err(PlotterError::Precondition(_))));
}

#[test]
fn test_numeric_conversion_errors_name_the_field() {
    let err = parse_fields(&["1", "2", "n/a"]).unwrap_err();
    match err {
        PlotterError::Parse { field, token } => {
            assert_eq!(field, 2);
            assert_eq!(token, "n/a");
        }
        other => panic!("expected parse error, got {other}"),
    }
}
