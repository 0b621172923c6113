//! Chop Edit - Timeline interaction layer for the crossfade editor
//!
//! Translates pointer gestures and the zoom/scroll window into region
//! ledger operations: screen-to-time mapping, musical-grid snapping,
//! and the press/drag/release gesture sequencing. Pure logic, no
//! painting; a frontend feeds it pointer x coordinates and view
//! updates, then repaints off the ledger's change events.

pub mod config;
pub mod controller;
pub mod snap;
pub mod view;

pub use config::EditorConfig;
pub use controller::TimelineController;
pub use view::{ViewBounds, ViewWindow};
