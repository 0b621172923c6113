//! Breakpoint automation curve
//!
//! An ordered `(time, value)` breakpoint sequence sampled by the audio
//! render path. The editing side addresses breakpoints through
//! generation-tagged [`PointId`] handles backed by an indirection table,
//! so a handle stays valid while unrelated points are inserted or
//! removed; the render/visualization side reads through the plain index
//! surface ([`BreakpointCurve::point_time`], [`BreakpointCurve::value_at`]).
//!
//! The sequence is kept sorted by time at all times; `value_at` relies
//! on that order. Mutation allocates and shifts array contents, so it is
//! not real-time safe and must stay off the audio thread.

use crate::types::{CurveValue, Seconds};

/// Interpolation applied between a breakpoint and its predecessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurveShape {
    /// Hold the previous value until this breakpoint's time
    Step,
    /// Linear ramp from the previous breakpoint
    #[default]
    Linear,
}

/// Stable handle to a breakpoint
///
/// Encodes a slot in the curve's indirection table plus a generation
/// counter. A stale handle (its point was removed, even if the slot was
/// reused) resolves to `None` everywhere instead of aliasing another
/// point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointId {
    slot: u32,
    generation: u32,
}

/// One breakpoint in the curve
#[derive(Debug, Clone, Copy)]
struct Breakpoint {
    time: Seconds,
    value: CurveValue,
    shape: CurveShape,
    /// Back-reference into the slot table
    slot: u32,
}

#[derive(Debug, Clone, Copy)]
struct SlotEntry {
    /// Current position in the points vec (meaningless while free)
    position: usize,
    generation: u32,
    occupied: bool,
}

/// Read seam for the render path and visualizers
///
/// Renderers sample through this trait so they never see the editing
/// surface (handles, range removal) at all.
pub trait CurveSource {
    /// Sample the curve at a time position
    fn value_at(&self, time: Seconds) -> CurveValue;

    /// Number of breakpoints currently in the curve
    fn num_points(&self) -> usize;
}

/// Ordered breakpoint sequence with stable point handles
#[derive(Debug, Clone, Default)]
pub struct BreakpointCurve {
    /// Breakpoints sorted by time (non-decreasing)
    points: Vec<Breakpoint>,
    slots: Vec<SlotEntry>,
    /// Free slot indices available for reuse
    free: Vec<u32>,
}

impl BreakpointCurve {
    /// Create an empty curve
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────
    // Handle surface (editing side)
    // ─────────────────────────────────────────────────────────────

    /// Insert a breakpoint, keeping the sequence sorted by time
    ///
    /// Among points with equal times, the new point lands after the
    /// existing ones, so repeated inserts at one time keep their call
    /// order. Returns a handle that stays valid until the point is
    /// removed.
    pub fn insert(&mut self, time: Seconds, value: CurveValue, shape: CurveShape) -> PointId {
        let position = self.points.partition_point(|p| p.time <= time);

        let slot = match self.free.pop() {
            Some(slot) => {
                let entry = &mut self.slots[slot as usize];
                entry.position = position;
                entry.occupied = true;
                slot
            }
            None => {
                let slot = self.slots.len() as u32;
                self.slots.push(SlotEntry {
                    position,
                    generation: 0,
                    occupied: true,
                });
                slot
            }
        };

        // Later points shift right by one
        for p in &self.points[position..] {
            self.slots[p.slot as usize].position += 1;
        }

        self.points.insert(
            position,
            Breakpoint {
                time,
                value,
                shape,
                slot,
            },
        );

        PointId {
            slot,
            generation: self.slots[slot as usize].generation,
        }
    }

    /// Remove the breakpoint behind a handle
    ///
    /// Returns false (and changes nothing) if the handle is stale.
    pub fn remove(&mut self, id: PointId) -> bool {
        let Some(position) = self.position(id) else {
            return false;
        };
        self.remove_at(position);
        true
    }

    /// Resolve a handle to its current position in the sequence
    pub fn position(&self, id: PointId) -> Option<usize> {
        let entry = self.slots.get(id.slot as usize)?;
        if entry.occupied && entry.generation == id.generation {
            Some(entry.position)
        } else {
            None
        }
    }

    /// Time of the breakpoint behind a handle
    pub fn time_of(&self, id: PointId) -> Option<Seconds> {
        self.position(id).map(|pos| self.points[pos].time)
    }

    /// Value of the breakpoint behind a handle
    pub fn value_of(&self, id: PointId) -> Option<CurveValue> {
        self.position(id).map(|pos| self.points[pos].value)
    }

    /// Remove every breakpoint whose time lies in `[from, to]` inclusive
    ///
    /// Returns the number of points removed. Handles to the removed
    /// points become stale; all other handles stay valid.
    pub fn remove_in_range(&mut self, from: Seconds, to: Seconds) -> usize {
        if to < from {
            return 0;
        }
        let start = self.points.partition_point(|p| p.time < from);
        let end = self.points.partition_point(|p| p.time <= to);
        if start == end {
            return 0;
        }

        let freed: Vec<u32> = self.points[start..end].iter().map(|p| p.slot).collect();
        for slot in freed {
            self.release_slot(slot);
        }
        self.points.drain(start..end);
        self.reindex_from(start);
        end - start
    }

    // ─────────────────────────────────────────────────────────────
    // Index surface (render / visualization side)
    // ─────────────────────────────────────────────────────────────

    /// Insert a breakpoint and return its current index
    ///
    /// Index-based counterpart of [`BreakpointCurve::insert`] for
    /// callers that do not track handles. The index is only valid until
    /// the next mutation.
    pub fn add_point(&mut self, time: Seconds, value: CurveValue, shape: CurveShape) -> usize {
        let id = self.insert(time, value, shape);
        self.position(id).unwrap_or(0)
    }

    /// Remove the breakpoint at an index
    ///
    /// Returns false if the index is out of range.
    pub fn remove_point(&mut self, index: usize) -> bool {
        if index >= self.points.len() {
            return false;
        }
        self.remove_at(index);
        true
    }

    /// Time of the breakpoint at an index
    pub fn point_time(&self, index: usize) -> Option<Seconds> {
        self.points.get(index).map(|p| p.time)
    }

    /// Value of the breakpoint at an index
    pub fn point_value(&self, index: usize) -> Option<CurveValue> {
        self.points.get(index).map(|p| p.value)
    }

    /// Check if the curve has no breakpoints
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Remove all breakpoints
    pub fn clear(&mut self) {
        self.points.clear();
        self.slots.clear();
        self.free.clear();
    }

    // ─────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────

    fn remove_at(&mut self, position: usize) {
        let removed = self.points.remove(position);
        self.release_slot(removed.slot);
        // Later points shift left by one
        for p in &self.points[position..] {
            self.slots[p.slot as usize].position -= 1;
        }
    }

    fn release_slot(&mut self, slot: u32) {
        let entry = &mut self.slots[slot as usize];
        entry.occupied = false;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(slot);
    }

    /// Rewrite slot positions for every point at or after `start`
    fn reindex_from(&mut self, start: usize) {
        for (i, p) in self.points.iter().enumerate().skip(start) {
            self.slots[p.slot as usize].position = i;
        }
    }
}

impl CurveSource for BreakpointCurve {
    /// Sample the curve at a time position
    ///
    /// Before the first breakpoint the first value holds; after the
    /// last, the last value holds. In between, the shape of the
    /// breakpoint being approached decides between a hold and a linear
    /// ramp. An empty curve samples as 0.0 (crossfader at B).
    fn value_at(&self, time: Seconds) -> CurveValue {
        if self.points.is_empty() {
            return 0.0;
        }
        let after = self.points.partition_point(|p| p.time <= time);
        if after == 0 {
            return self.points[0].value;
        }
        if after == self.points.len() {
            return self.points[after - 1].value;
        }

        let prev = &self.points[after - 1];
        let next = &self.points[after];
        match next.shape {
            CurveShape::Step => prev.value,
            CurveShape::Linear => {
                let span = next.time - prev.time;
                if span <= 0.0 {
                    return next.value;
                }
                let frac = (time - prev.time) / span;
                prev.value + (next.value - prev.value) * frac
            }
        }
    }

    fn num_points(&self) -> usize {
        self.points.len()
    }
}
