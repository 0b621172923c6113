//! Common types for the Chop crossfade engine
//!
//! This module contains the fundamental value types shared by the curve,
//! region, and tempo modules: time units, the crossfade side tag, and the
//! transition gap constant.

/// Time position or duration in seconds
pub type Seconds = f64;

/// Musical position or duration in beats
pub type Beats = f64;

/// Automation curve value (crossfader position, 0.0 = B deck, 1.0 = A deck)
pub type CurveValue = f64;

/// Gap between a region boundary and its guard breakpoint, in seconds.
///
/// Each region boundary is bracketed by a breakpoint this far outside the
/// region at the opposite side's value, so the crossfader jumps in ~5ms
/// instead of ramping across the whole neighboring span.
pub const CROSSFADE_GAP: Seconds = 0.005;

/// Which deck a crossfade region routes to
///
/// The two states are mutually exclusive: an A-side region holds the
/// crossfader at 1.0 for its whole span, a B-side region holds it at 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// Crossfader value this side pins the curve to
    #[inline]
    pub fn value(&self) -> CurveValue {
        match self {
            Side::A => 1.0,
            Side::B => 0.0,
        }
    }

    /// The other side
    #[inline]
    pub fn opposite(&self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// Display name for logs and UI labels
    pub fn name(&self) -> &'static str {
        match self {
            Side::A => "A",
            Side::B => "B",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_values() {
        assert_eq!(Side::A.value(), 1.0);
        assert_eq!(Side::B.value(), 0.0);
        assert_eq!(Side::A.opposite(), Side::B);
        assert_eq!(Side::B.opposite(), Side::A);
        assert_eq!(Side::A.opposite().value(), 0.0);
    }

    #[test]
    fn test_side_display() {
        assert_eq!(Side::A.to_string(), "A");
        assert_eq!(Side::B.to_string(), "B");
    }
}
