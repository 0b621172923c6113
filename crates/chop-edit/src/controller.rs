//! Timeline interaction controller
//!
//! Sequences pointer gestures into region ledger calls. A primary press
//! either grabs the A-side region under the pointer or carves a new
//! one-beat region and grabs that; dragging moves the grabbed region
//! (overlapping targets are rejected by the ledger and the region stays
//! put); a double press deletes the region under the pointer.
//!
//! Gesture math never errors: times are clamped to >= 0 and an unbound
//! ledger turns every gesture into a no-op.

use chop_core::region::RegionLedger;
use chop_core::tempo::TempoMap;
use chop_core::types::{Seconds, Side};

use crate::config::EditorConfig;
use crate::snap::snap_time_to_grid;
use crate::view::ViewWindow;

/// In-progress drag: the grabbed region and the pointer's offset from
/// its start, so the region doesn't jump to the pointer on grab
#[derive(Debug, Clone, Copy)]
struct DragState {
    region: usize,
    offset: Seconds,
}

/// Drives the region ledger from pointer input and view state
pub struct TimelineController<T: TempoMap> {
    ledger: RegionLedger,
    tempo: T,
    view: ViewWindow,
    snap_enabled: bool,
    drag: Option<DragState>,
}

impl<T: TempoMap> TimelineController<T> {
    /// Create a controller over a ledger
    pub fn new(ledger: RegionLedger, tempo: T, view: ViewWindow) -> Self {
        Self {
            ledger,
            tempo,
            view,
            snap_enabled: true,
            drag: None,
        }
    }

    /// Apply editor configuration (snap flag, grid spacing)
    pub fn apply_config(&mut self, config: &EditorConfig) {
        self.snap_enabled = config.snap_to_grid;
        self.view.set_grid_size(config.grid_size_beats);
    }

    /// Push a view/zoom state update
    pub fn set_view(&mut self, view: ViewWindow) {
        self.view = view;
    }

    /// Current view window
    pub fn view(&self) -> &ViewWindow {
        &self.view
    }

    /// Enable or disable grid snapping
    pub fn set_snap_to_grid(&mut self, enabled: bool) {
        self.snap_enabled = enabled;
    }

    /// Whether grid snapping is enabled
    pub fn snap_enabled(&self) -> bool {
        self.snap_enabled
    }

    /// Read access to the ledger (for painting and assertions)
    pub fn ledger(&self) -> &RegionLedger {
        &self.ledger
    }

    /// Mutable access to the ledger (host-driven edits, persistence)
    pub fn ledger_mut(&mut self) -> &mut RegionLedger {
        &mut self.ledger
    }

    /// Region index currently grabbed by a drag, if any
    pub fn selected(&self) -> Option<usize> {
        self.drag.map(|d| d.region)
    }

    /// Snap a time to the musical grid using the view's grid spacing
    pub fn snap_time_to_grid(&self, time: Seconds) -> Seconds {
        snap_time_to_grid(time, &self.tempo, self.view.grid_size())
    }

    /// Primary pointer press at screen x
    ///
    /// Inside an existing A-side region: grab it for dragging.
    /// Otherwise: snap (if enabled), carve a new one-beat A-side region
    /// there, and grab that.
    pub fn press(&mut self, x: f64) {
        let time = self.view.time_at_x(x).max(0.0);

        if let Some(index) = self.a_side_region_at(time) {
            let start = self.ledger.regions()[index].start;
            self.drag = Some(DragState {
                region: index,
                offset: time - start,
            });
            log::debug!("controller: grabbed region {} at {:.3}", index, time);
            return;
        }

        let mut start = if self.snap_enabled {
            self.snap_time_to_grid(time)
        } else {
            time
        };
        start = start.max(0.0);
        let end = self.tempo.time_at_beats(self.tempo.beats_at_time(start) + 1.0);

        let before = self.ledger.regions().len();
        self.ledger.add_region(start, end, Side::A, 1.0);
        if self.ledger.regions().len() > before {
            // Drag the fresh region from wherever the pointer landed in it
            self.drag = Some(DragState {
                region: before,
                offset: (time - start).max(0.0),
            });
        }
    }

    /// Pointer moved while pressed
    ///
    /// Rejected moves (overlap) leave the region exactly where it was;
    /// there is no partial update to roll back.
    pub fn drag(&mut self, x: f64) {
        let Some(drag) = self.drag else {
            return;
        };

        let time = self.view.time_at_x(x);
        let mut candidate = time - drag.offset;
        if self.snap_enabled {
            candidate = self.snap_time_to_grid(candidate);
        }
        candidate = candidate.max(0.0);

        let _ = self.ledger.move_region(drag.region, candidate);
    }

    /// Pointer released: end the drag and drop the selection
    pub fn release(&mut self) {
        self.drag = None;
    }

    /// Double press at screen x: delete the region under the pointer
    pub fn double_press(&mut self, x: f64) {
        let time = self.view.time_at_x(x).max(0.0);
        if let Some(index) = self.ledger.index_at_time(time) {
            self.ledger.remove_region(index);
            self.drag = None;
        }
    }

    /// Delete the currently grabbed region, if any
    pub fn delete_selected(&mut self) {
        if let Some(drag) = self.drag.take() {
            self.ledger.remove_region(drag.region);
        }
    }

    fn a_side_region_at(&self, time: Seconds) -> Option<usize> {
        self.ledger
            .regions()
            .iter()
            .position(|r| r.side == Side::A && r.contains(time))
    }
}
