//! Musical-grid snapping
//!
//! Quantizes a time to the tempo grid in beats space. The threshold is
//! forward-biased: only the top 10% of a grid cell rounds up to the
//! next line, everything else rounds down. Carried over unchanged from
//! the original crossfade editor; both region creation and region drag
//! snap through this one function so the bias is uniform.

use chop_core::tempo::TempoMap;
use chop_core::types::{Beats, Seconds};

/// Fraction of a grid cell at which snapping flips to the next line
pub const SNAP_FORWARD_BIAS: f64 = 0.9;

/// Snap a time to the musical grid
///
/// `grid_size` is the grid spacing in beats; non-positive spacing
/// passes the time through unchanged.
pub fn snap_time_to_grid(time: Seconds, tempo: &dyn TempoMap, grid_size: Beats) -> Seconds {
    if grid_size <= 0.0 {
        return time;
    }

    let beats = tempo.beats_at_time(time);
    let previous_line = (beats / grid_size).floor() * grid_size;
    let next_line = previous_line + grid_size;
    let fraction_to_next = (beats - previous_line) / grid_size;

    let snapped = if fraction_to_next >= SNAP_FORWARD_BIAS {
        next_line
    } else {
        previous_line
    };
    tempo.time_at_beats(snapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chop_core::tempo::ConstantTempo;

    #[test]
    fn test_snap_rounds_down_below_bias() {
        // 120 BPM, quarter-beat grid: 1.1s = 2.2 beats, 80% into the
        // 2.0..2.25 cell, below the bias -> snaps back to 2.0 beats = 1.0s
        let tempo = ConstantTempo::new(120.0);
        let snapped = snap_time_to_grid(1.1, &tempo, 0.25);
        assert!((snapped - 1.0).abs() < 1e-9, "snapped={}", snapped);
    }

    #[test]
    fn test_snap_rounds_up_in_top_tenth() {
        // 2.24 beats is 96% of the way to 2.25 -> rounds up
        let tempo = ConstantTempo::new(120.0);
        let time = tempo.time_at_beats(2.24);
        let snapped = snap_time_to_grid(time, &tempo, 0.25);
        assert!((snapped - tempo.time_at_beats(2.25)).abs() < 1e-9);
    }

    #[test]
    fn test_snap_is_idempotent() {
        let tempo = ConstantTempo::new(174.0);
        for t in [0.0, 0.37, 1.1, 4.999, 12.3] {
            let once = snap_time_to_grid(t, &tempo, 0.25);
            let twice = snap_time_to_grid(once, &tempo, 0.25);
            assert!((twice - once).abs() < 1e-9, "t={} once={} twice={}", t, once, twice);
        }
    }

    #[test]
    fn test_grid_line_stays_put() {
        let tempo = ConstantTempo::new(120.0);
        let on_line = tempo.time_at_beats(3.0);
        assert!((snap_time_to_grid(on_line, &tempo, 0.25) - on_line).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_grid_passes_through() {
        let tempo = ConstantTempo::new(120.0);
        assert_eq!(snap_time_to_grid(1.234, &tempo, 0.0), 1.234);
        assert_eq!(snap_time_to_grid(1.234, &tempo, -1.0), 1.234);
    }
}
