//! Tempo map query interface
//!
//! The crossfade editor only needs the time↔beats conversion pair; where
//! those numbers come from (tag metadata, beat detection, a warped tempo
//! map) is the host's business. [`ConstantTempo`] covers the common
//! fixed-BPM case.

use crate::types::{Beats, Seconds};

/// Time↔beats conversion contract
pub trait TempoMap {
    /// Convert a time position to a beat position
    fn beats_at_time(&self, time: Seconds) -> Beats;

    /// Convert a beat position to a time position
    fn time_at_beats(&self, beats: Beats) -> Seconds;
}

/// Fixed-BPM tempo map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantTempo {
    bpm: f64,
}

impl ConstantTempo {
    /// Create a constant tempo map
    ///
    /// Non-positive BPM values are clamped to a minimal tempo so the
    /// conversions stay finite.
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm: bpm.max(1.0),
        }
    }

    /// Duration of one beat in seconds
    #[inline]
    pub fn beat_duration(&self) -> Seconds {
        60.0 / self.bpm
    }

    /// The tempo in beats per minute
    #[inline]
    pub fn bpm(&self) -> f64 {
        self.bpm
    }
}

impl Default for ConstantTempo {
    /// 120 BPM, the house default
    fn default() -> Self {
        Self::new(120.0)
    }
}

impl TempoMap for ConstantTempo {
    fn beats_at_time(&self, time: Seconds) -> Beats {
        time / self.beat_duration()
    }

    fn time_at_beats(&self, beats: Beats) -> Seconds {
        beats * self.beat_duration()
    }
}
