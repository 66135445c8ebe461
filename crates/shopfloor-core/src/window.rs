//! Time windows centred on a point, for range queries around the playhead.

/// A half-open `[start, end)` range of simulation time.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

/// A window of `width` minutes centred on `point`. The start never goes
/// below zero; the end is not shifted to compensate.
pub fn time_window(point: f64, width: f64) -> TimeWindow {
    let half = width / 2.0;
    TimeWindow {
        start: (point - half).max(0.0),
        end: point + half,
    }
}
