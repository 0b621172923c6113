//! Region ledger - keeps crossfade regions and curve breakpoints in lockstep
//!
//! A region is a logical timeline segment tagged A-side or B-side. Each
//! region owns up to four breakpoints in the automation curve:
//!
//! ```text
//!   pre_gap        start              end        post_gap
//!   start-GAP      start              end        end+GAP
//!   opposite       side value         side value opposite
//! ```
//!
//! The gap points give a near-vertical transition in and out of the
//! region instead of a slow ramp from whatever the neighbors hold. The
//! `pre_gap` point is omitted when the region starts at (or before)
//! time zero.
//!
//! Regions reference their breakpoints through stable [`PointId`]
//! handles, so removing or moving one region never invalidates another
//! region's bookkeeping. The ledger is the sole writer of the curve;
//! it is an edit-thread structure, and curve mutation is not real-time
//! safe. Observers poll the [`LedgerAtomics`] revision counter or
//! subscribe to [`RegionChange`] events, both of which fire once per
//! logical operation after the mutation is complete.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam::channel::{unbounded, Receiver, Sender};
use thiserror::Error;

use crate::curve::{BreakpointCurve, CurveShape, PointId};
use crate::types::{Seconds, Side, CROSSFADE_GAP};

/// Why a `move_region` call left the ledger untouched
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejected {
    /// The target span would overlap another region
    #[error("target span overlaps region {other}")]
    Overlap {
        /// Index of the region in the way
        other: usize,
    },
    /// The ledger is not bound to a curve
    #[error("ledger is not bound to a curve")]
    Unbound,
    /// No region exists at the given index
    #[error("no region at index {index}")]
    InvalidIndex {
        /// The offending index
        index: usize,
    },
}

/// Change notification sent once per logical ledger operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionChange {
    /// A region was appended at this index
    Added(usize),
    /// The region at this index was removed
    Removed(usize),
    /// The region at this index was moved
    Moved(usize),
    /// All regions and breakpoints were removed
    Cleared,
}

/// The four breakpoint slots a region owns
///
/// `pre_gap` is `None` for regions starting at time zero; the other
/// slots are `None` only on a detached region (unbound ledger).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegionPoints {
    pub pre_gap: Option<PointId>,
    pub start: Option<PointId>,
    pub end: Option<PointId>,
    pub post_gap: Option<PointId>,
}

impl RegionPoints {
    /// Iterate over the occupied slots
    pub fn iter(&self) -> impl Iterator<Item = PointId> {
        [self.pre_gap, self.start, self.end, self.post_gap]
            .into_iter()
            .flatten()
    }

    /// Number of occupied slots (3 or 4 for a bound region)
    pub fn count(&self) -> usize {
        self.iter().count()
    }
}

/// A crossfade region on the timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    /// Region start in seconds (strictly less than `end`)
    pub start: Seconds,
    /// Region end in seconds
    pub end: Seconds,
    /// Which deck the region routes to
    pub side: Side,
    /// Partial-mix amount in [0, 1]; reserved, editing always uses 1.0
    pub mix: f64,
    /// Handles to the breakpoints this region owns
    pub points: RegionPoints,
}

impl Region {
    /// Check whether a time falls inside this region (inclusive bounds)
    #[inline]
    pub fn contains(&self, time: Seconds) -> bool {
        time >= self.start && time <= self.end
    }

    /// Region length in seconds
    #[inline]
    pub fn length(&self) -> Seconds {
        self.end - self.start
    }
}

/// Lock-free ledger state for UI access
///
/// The edit thread bumps `revision` once per completed mutation, so a
/// UI or render thread can detect "something changed" without taking a
/// lock (same pattern as the deck atomics in the player engine).
#[derive(Debug, Default)]
pub struct LedgerAtomics {
    revision: AtomicU64,
    region_count: AtomicUsize,
}

impl LedgerAtomics {
    /// Monotonic mutation counter (lock-free)
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Current number of regions (lock-free)
    #[inline]
    pub fn region_count(&self) -> usize {
        self.region_count.load(Ordering::Relaxed)
    }
}

/// Owns the region list and the automation curve breakpoints behind it
///
/// Constructed either bound to a curve or unbound; every operation on
/// an unbound ledger is a silent no-op, mirroring an editor open with
/// no automatable parameter behind it.
pub struct RegionLedger {
    curve: Option<BreakpointCurve>,
    regions: Vec<Region>,
    atomics: Arc<LedgerAtomics>,
    subscribers: Vec<Sender<RegionChange>>,
}

impl RegionLedger {
    /// Create a ledger over an automation curve
    pub fn bound(curve: BreakpointCurve) -> Self {
        Self {
            curve: Some(curve),
            regions: Vec::new(),
            atomics: Arc::new(LedgerAtomics::default()),
            subscribers: Vec::new(),
        }
    }

    /// Create a ledger with no curve behind it; all operations no-op
    pub fn unbound() -> Self {
        Self {
            curve: None,
            regions: Vec::new(),
            atomics: Arc::new(LedgerAtomics::default()),
            subscribers: Vec::new(),
        }
    }

    /// Whether a curve is bound
    #[inline]
    pub fn is_bound(&self) -> bool {
        self.curve.is_some()
    }

    /// Read access to the curve (render/visualization side)
    pub fn curve(&self) -> Option<&BreakpointCurve> {
        self.curve.as_ref()
    }

    /// Shared handle to the lock-free state
    pub fn atomics(&self) -> Arc<LedgerAtomics> {
        Arc::clone(&self.atomics)
    }

    /// Subscribe to region-set change events
    ///
    /// One event per logical operation. Dropped receivers are pruned on
    /// the next send.
    pub fn subscribe(&mut self) -> Receiver<RegionChange> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Read-only view of the region list (insertion order)
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// First region containing the given time, if any
    pub fn region_at_time(&self, time: Seconds) -> Option<&Region> {
        self.regions.iter().find(|r| r.contains(time))
    }

    /// Index of the first region containing the given time, if any
    pub fn index_at_time(&self, time: Seconds) -> Option<usize> {
        self.regions.iter().position(|r| r.contains(time))
    }

    /// Carve a new region into the timeline
    ///
    /// Any breakpoints already inside `[start-GAP, end+GAP]` are removed
    /// first: a new region always wins over stale points in its span.
    /// No overlap check is made against existing regions; that policy
    /// lives with the caller (the interaction controller checks on
    /// drag, not on creation).
    ///
    /// `start >= end` is a caller error and is rejected with a warning
    /// rather than producing an inverted region.
    pub fn add_region(&mut self, start: Seconds, end: Seconds, side: Side, mix: f64) {
        let Some(curve) = self.curve.as_mut() else {
            return;
        };
        if start >= end {
            log::warn!(
                "ledger: rejecting inverted region {:.3}..{:.3}",
                start,
                end
            );
            return;
        }

        let stale = curve.remove_in_range(start - CROSSFADE_GAP, end + CROSSFADE_GAP);
        if stale > 0 {
            log::debug!("ledger: new region replaced {} stale breakpoints", stale);
        }

        let points = Self::write_points(curve, start, end, side);
        self.regions.push(Region {
            start,
            end,
            side,
            mix: mix.clamp(0.0, 1.0),
            points,
        });

        let index = self.regions.len() - 1;
        log::info!(
            "ledger: added {}-side region {} at {:.3}..{:.3}",
            side,
            index,
            start,
            end
        );
        self.committed(RegionChange::Added(index));
    }

    /// Remove a region and its breakpoints
    ///
    /// Out-of-range indices are ignored with a warning. Other regions'
    /// point handles are stable and stay untouched.
    pub fn remove_region(&mut self, index: usize) {
        let Some(curve) = self.curve.as_mut() else {
            return;
        };
        if index >= self.regions.len() {
            log::warn!("ledger: remove_region index {} out of range", index);
            return;
        }

        let region = self.regions.remove(index);
        for id in region.points.iter() {
            curve.remove(id);
        }

        log::info!(
            "ledger: removed region {} ({:.3}..{:.3})",
            index,
            region.start,
            region.end
        );
        self.committed(RegionChange::Removed(index));
    }

    /// Drag a region to a new start time, keeping its length
    ///
    /// The move is rejected (no state change) when the target span
    /// would overlap any other region: start inside the other, end
    /// inside the other, or fully encompassing it. Regions touching
    /// exactly at a boundary do not overlap. On acceptance the region's
    /// breakpoints are physically relocated so the curve stays sorted
    /// by time.
    ///
    /// Callers may ignore the result; a rejected move is equally
    /// observable as "nothing changed".
    pub fn move_region(&mut self, index: usize, new_start: Seconds) -> Result<(), MoveRejected> {
        if !self.is_bound() {
            return Err(MoveRejected::Unbound);
        }
        if index >= self.regions.len() {
            return Err(MoveRejected::InvalidIndex { index });
        }

        let length = self.regions[index].length();
        let new_end = new_start + length;

        for (i, other) in self.regions.iter().enumerate() {
            if i == index {
                continue;
            }
            let start_inside = new_start >= other.start && new_start < other.end;
            let end_inside = new_end > other.start && new_end <= other.end;
            let encompasses = new_start <= other.start && new_end >= other.end;
            if start_inside || end_inside || encompasses {
                log::debug!(
                    "ledger: move of region {} to {:.3} rejected, overlaps region {}",
                    index,
                    new_start,
                    i
                );
                return Err(MoveRejected::Overlap { other: i });
            }
        }

        let curve = self.curve.as_mut().ok_or(MoveRejected::Unbound)?;
        let old_points = self.regions[index].points;
        for id in old_points.iter() {
            curve.remove(id);
        }

        let side = self.regions[index].side;
        let points = Self::write_points(curve, new_start, new_end, side);

        let region = &mut self.regions[index];
        region.start = new_start;
        region.end = new_end;
        region.points = points;

        log::debug!(
            "ledger: moved region {} to {:.3}..{:.3}",
            index,
            new_start,
            new_end
        );
        self.committed(RegionChange::Moved(index));
        Ok(())
    }

    /// Remove every region and every breakpoint
    pub fn clear_regions(&mut self) {
        let Some(curve) = self.curve.as_mut() else {
            return;
        };

        let count = self.regions.len();
        curve.clear();
        self.regions.clear();

        log::info!("ledger: cleared {} regions", count);
        self.committed(RegionChange::Cleared);
    }

    /// Total breakpoints currently owned by regions
    ///
    /// Equals the curve's point count whenever the ledger invariants
    /// hold; exposed so integrations can assert that.
    pub fn owned_point_count(&self) -> usize {
        self.regions.iter().map(|r| r.points.count()).sum()
    }

    /// Write the 3-4 breakpoints for a region span, in time order
    ///
    /// The pre-gap guard is omitted when the region starts at or before
    /// time zero (there is nothing before it to guard against).
    fn write_points(
        curve: &mut BreakpointCurve,
        start: Seconds,
        end: Seconds,
        side: Side,
    ) -> RegionPoints {
        let this = side.value();
        let other = side.opposite().value();

        let pre_gap = (start > 0.0)
            .then(|| curve.insert(start - CROSSFADE_GAP, other, CurveShape::Linear));
        let start_point = curve.insert(start, this, CurveShape::Linear);
        let end_point = curve.insert(end, this, CurveShape::Linear);
        let post_gap = curve.insert(end + CROSSFADE_GAP, other, CurveShape::Linear);

        RegionPoints {
            pre_gap,
            start: Some(start_point),
            end: Some(end_point),
            post_gap: Some(post_gap),
        }
    }

    /// Publish a completed mutation: bump atomics, notify subscribers
    fn committed(&mut self, change: RegionChange) {
        self.atomics
            .region_count
            .store(self.regions.len(), Ordering::Relaxed);
        self.atomics.revision.fetch_add(1, Ordering::Release);
        self.subscribers.retain(|tx| tx.send(change).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::CurveSource;

    fn ledger() -> RegionLedger {
        RegionLedger::bound(BreakpointCurve::new())
    }

    fn curve_times(ledger: &RegionLedger) -> Vec<Seconds> {
        let curve = ledger.curve().unwrap();
        (0..curve.num_points())
            .map(|i| curve.point_time(i).unwrap())
            .collect()
    }

    #[test]
    fn test_add_region_point_layout() {
        // A-side region 2.0..3.0 on an empty curve: exactly the
        // bracketed four-point pattern
        let mut ledger = ledger();
        ledger.add_region(2.0, 3.0, Side::A, 1.0);

        let curve = ledger.curve().unwrap();
        assert_eq!(curve.num_points(), 4);
        assert_eq!(curve.point_time(0), Some(1.995));
        assert_eq!(curve.point_value(0), Some(0.0));
        assert_eq!(curve.point_time(1), Some(2.0));
        assert_eq!(curve.point_value(1), Some(1.0));
        assert_eq!(curve.point_time(2), Some(3.0));
        assert_eq!(curve.point_value(2), Some(1.0));
        assert_eq!(curve.point_time(3), Some(3.005));
        assert_eq!(curve.point_value(3), Some(0.0));
    }

    #[test]
    fn test_region_at_zero_skips_pre_gap() {
        let mut ledger = ledger();
        ledger.add_region(0.0, 1.0, Side::A, 1.0);

        let region = &ledger.regions()[0];
        assert_eq!(region.points.pre_gap, None);
        assert_eq!(region.points.count(), 3);
        assert_eq!(ledger.curve().unwrap().num_points(), 3);
    }

    #[test]
    fn test_point_count_invariant() {
        // After any sequence of non-overlapping adds, curve points ==
        // sum of per-region point counts (4, or 3 for a region at zero)
        let mut ledger = ledger();
        ledger.add_region(0.0, 1.0, Side::A, 1.0);
        ledger.add_region(2.0, 3.0, Side::B, 1.0);
        ledger.add_region(4.0, 5.5, Side::A, 1.0);

        assert_eq!(ledger.owned_point_count(), 3 + 4 + 4);
        assert_eq!(
            ledger.curve().unwrap().num_points(),
            ledger.owned_point_count()
        );
    }

    #[test]
    fn test_add_remove_roundtrip() {
        let mut ledger = ledger();
        ledger.add_region(0.0, 1.0, Side::A, 1.0);
        ledger.add_region(4.0, 5.0, Side::B, 1.0);
        let before = curve_times(&ledger);
        let first_points = ledger.regions()[0].points;

        ledger.add_region(2.0, 3.0, Side::A, 1.0);
        ledger.remove_region(2);

        assert_eq!(curve_times(&ledger), before);
        assert_eq!(ledger.regions().len(), 2);
        // Stable handles: the surviving regions' bookkeeping is untouched
        assert_eq!(ledger.regions()[0].points, first_points);
        assert_eq!(
            ledger.curve().unwrap().num_points(),
            ledger.owned_point_count()
        );
    }

    #[test]
    fn test_remove_middle_region_keeps_others_consistent() {
        let mut ledger = ledger();
        ledger.add_region(1.0, 2.0, Side::A, 1.0);
        ledger.add_region(3.0, 4.0, Side::B, 1.0);
        ledger.add_region(5.0, 6.0, Side::A, 1.0);

        ledger.remove_region(1);

        let curve = ledger.curve().unwrap();
        assert_eq!(curve.num_points(), 8);
        // Remaining regions' handles still resolve to their own times
        let last = &ledger.regions()[1];
        assert_eq!(curve.time_of(last.points.start.unwrap()), Some(5.0));
        assert_eq!(curve.time_of(last.points.end.unwrap()), Some(6.0));
        assert_eq!(curve.time_of(last.points.post_gap.unwrap()), Some(6.005));
    }

    #[test]
    fn test_overlapping_add_wins() {
        // Ledger-level adds do not overlap-check; the newer region's
        // span swallows the older region's breakpoints in range
        let mut ledger = ledger();
        ledger.add_region(1.0, 2.0, Side::A, 1.0);
        ledger.add_region(1.5, 2.5, Side::B, 1.0);

        assert_eq!(ledger.regions().len(), 2);
        // Old region lost its end + post_gap points (1.995 pre-gap of
        // nothing: 0.995 and 1.0 survive, 2.0 and 2.005 were in range)
        let old = &ledger.regions()[0];
        let curve = ledger.curve().unwrap();
        assert!(curve.time_of(old.points.start.unwrap()).is_some());
        assert_eq!(curve.time_of(old.points.end.unwrap()), None);
        assert_eq!(curve.time_of(old.points.post_gap.unwrap()), None);
    }

    #[test]
    fn test_move_region_accepted() {
        let mut ledger = ledger();
        ledger.add_region(1.0, 2.0, Side::A, 1.0);

        assert_eq!(ledger.move_region(0, 4.0), Ok(()));
        let region = &ledger.regions()[0];
        assert_eq!(region.start, 4.0);
        assert_eq!(region.end, 5.0);

        assert_eq!(curve_times(&ledger), vec![3.995, 4.0, 5.0, 5.005]);
    }

    #[test]
    fn test_move_relocates_points_in_time_order() {
        // Moving the first region past the second: its breakpoints must
        // end up physically after the other region's in the sequence
        let mut ledger = ledger();
        ledger.add_region(1.0, 2.0, Side::A, 1.0);
        ledger.add_region(3.0, 4.0, Side::B, 1.0);

        assert_eq!(ledger.move_region(0, 6.0), Ok(()));
        let times = curve_times(&ledger);
        let mut sorted = times.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(times, sorted);
        assert_eq!(times, vec![2.995, 3.0, 4.0, 4.005, 5.995, 6.0, 7.0, 7.005]);
    }

    #[test]
    fn test_move_rejected_on_overlap() {
        // Regions [0,1] A and [2,3] B; moving the first to 1.5 makes
        // [1.5,2.5], whose end lands inside [2,3]: rejected, unchanged
        let mut ledger = ledger();
        ledger.add_region(0.0, 1.0, Side::A, 1.0);
        ledger.add_region(2.0, 3.0, Side::B, 1.0);
        let before_times = curve_times(&ledger);
        let before_region = ledger.regions()[0];

        assert_eq!(
            ledger.move_region(0, 1.5),
            Err(MoveRejected::Overlap { other: 1 })
        );
        assert_eq!(curve_times(&ledger), before_times);
        assert_eq!(ledger.regions()[0], before_region);
    }

    #[test]
    fn test_move_rejected_when_encompassing() {
        let mut ledger = ledger();
        ledger.add_region(0.0, 5.0, Side::A, 1.0);
        ledger.add_region(7.0, 8.0, Side::B, 1.0);

        // [6.5, 11.5] fully contains [7, 8]
        assert_eq!(
            ledger.move_region(0, 6.5),
            Err(MoveRejected::Overlap { other: 1 })
        );
    }

    #[test]
    fn test_move_allows_touching_boundaries() {
        let mut ledger = ledger();
        ledger.add_region(0.0, 1.0, Side::A, 1.0);
        ledger.add_region(2.0, 3.0, Side::B, 1.0);

        // [1,2] touches [2,3] exactly at the boundary: legal
        assert_eq!(ledger.move_region(0, 1.0), Ok(()));
        assert_eq!(ledger.regions()[0].end, 2.0);
    }

    #[test]
    fn test_clear_regions() {
        let mut ledger = ledger();
        ledger.add_region(0.0, 1.0, Side::A, 1.0);
        ledger.add_region(2.0, 3.0, Side::B, 1.0);
        ledger.add_region(4.0, 5.0, Side::A, 1.0);

        ledger.clear_regions();
        assert!(ledger.regions().is_empty());
        assert_eq!(ledger.curve().unwrap().num_points(), 0);
    }

    #[test]
    fn test_region_at_time() {
        let mut ledger = ledger();
        ledger.add_region(1.0, 2.0, Side::A, 1.0);
        ledger.add_region(3.0, 4.0, Side::B, 1.0);

        assert_eq!(ledger.region_at_time(1.5).map(|r| r.side), Some(Side::A));
        assert_eq!(ledger.region_at_time(3.0).map(|r| r.side), Some(Side::B));
        assert_eq!(ledger.index_at_time(3.5), Some(1));
        assert!(ledger.region_at_time(2.5).is_none());
    }

    #[test]
    fn test_inverted_region_rejected() {
        let mut ledger = ledger();
        ledger.add_region(3.0, 2.0, Side::A, 1.0);
        assert!(ledger.regions().is_empty());
        assert_eq!(ledger.curve().unwrap().num_points(), 0);
    }

    #[test]
    fn test_unbound_ledger_noops() {
        let mut ledger = RegionLedger::unbound();
        ledger.add_region(1.0, 2.0, Side::A, 1.0);
        ledger.remove_region(0);
        ledger.clear_regions();
        assert_eq!(ledger.move_region(0, 1.0), Err(MoveRejected::Unbound));
        assert!(ledger.regions().is_empty());
        assert_eq!(ledger.atomics().revision(), 0);
    }

    #[test]
    fn test_revision_and_events() {
        let mut ledger = ledger();
        let atomics = ledger.atomics();
        let rx = ledger.subscribe();

        ledger.add_region(1.0, 2.0, Side::A, 1.0);
        ledger.move_region(0, 3.0).unwrap();
        ledger.remove_region(0);
        ledger.clear_regions();

        assert_eq!(atomics.revision(), 4);
        assert_eq!(atomics.region_count(), 0);
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                RegionChange::Added(0),
                RegionChange::Moved(0),
                RegionChange::Removed(0),
                RegionChange::Cleared,
            ]
        );
    }

    #[test]
    fn test_mix_is_clamped() {
        let mut ledger = ledger();
        ledger.add_region(1.0, 2.0, Side::A, 1.8);
        ledger.add_region(3.0, 4.0, Side::B, -0.5);
        assert_eq!(ledger.regions()[0].mix, 1.0);
        assert_eq!(ledger.regions()[1].mix, 0.0);
    }

    #[test]
    fn test_curve_samples_inside_region() {
        let mut ledger = ledger();
        ledger.add_region(2.0, 3.0, Side::A, 1.0);
        let curve = ledger.curve().unwrap();
        assert_eq!(curve.value_at(2.5), 1.0);
        assert_eq!(curve.value_at(1.0), 0.0);
        assert_eq!(curve.value_at(4.0), 0.0);
    }
}
