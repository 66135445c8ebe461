//! Transport progress interpolation for renderers.

use crate::transport::Transport;

/// Fraction of the journey completed at `clock`, always in `[0, 1]`.
///
/// An unfinished transport (no end time yet) reports 0, and a transport with
/// a non-positive duration reports 1. Pure; does not depend on any engine.
pub fn progress(transport: &Transport, clock: f64) -> f64 {
    let Some(end) = transport.end_time else {
        return 0.0;
    };
    let duration = end - transport.start_time;
    if duration <= 0.0 {
        return 1.0;
    }
    let fraction = (clock - transport.start_time) / duration;
    if fraction.is_nan() {
        return 0.0;
    }
    fraction.clamp(0.0, 1.0)
}
