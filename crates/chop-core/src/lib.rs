//! Chop Core - Crossfade region engine shared by the Chop editing tools
//!
//! Owns the breakpoint automation curve, the region ledger that keeps
//! regions and curve breakpoints in lockstep, and the tempo-map query
//! interface used for musical-grid math. All editing happens on a single
//! thread; the render path only reads the curve between edits.

pub mod config;
pub mod curve;
pub mod region;
pub mod tempo;
pub mod types;

pub use types::*;
