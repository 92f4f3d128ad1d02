// Copyright 2026 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Multi-pointer gesture session tracking over a fixed slot arena.
//!
//! [`PointerTracker`] consumes one [`TouchEvent`] at a time and maintains a
//! gesture session across it: which contacts are down, where each started,
//! where each is now, and the timing needed to recognize taps. Transitions
//! are reported as a returned [`GestureEvents`] batch rather than through
//! registered listeners, so consumers own the tracker and the tracker owns
//! nothing back.
//!
//! ## Session lifecycle
//!
//! 1. The first contact down resets the arena and begins a session.
//! 2. Additional contacts extend the session in place; they never restart it.
//! 3. Every move produces an [`GestureEvent::Update`], even with zero
//!    displacement.
//! 4. A release compacts the arena; the session continues while contacts
//!    remain and ends when the last one lifts or the host cancels.
//!
//! [`PointerTracker::restart_gesture`] re-anchors every slot's start position
//! to its current one without tearing the session down. Transform layers use
//! this to absorb a programmatic matrix correction (such as a bounds clamp)
//! without the next delta computation producing a visual jump.

use kurbo::Point;
use smallvec::SmallVec;

use crate::event::{PointerId, TouchEvent, TouchPhase};
use crate::metrics::GestureMetrics;

/// Maximum number of simultaneously tracked contacts.
pub const MAX_POINTERS: usize = 10;

/// Two releases of the same slot within this window on both the press-press
/// and release-release deltas count as a repeated tap.
const TAP_REPEAT_WINDOW_MS: u64 = 500;

/// Notifications produced while processing one touch event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureEvent {
    /// A gesture session started, or was re-anchored by a restart.
    Begin,
    /// Tracked positions changed while a session is in progress.
    Update,
    /// The session ended: last release, cancel, or a restart rebase.
    End,
    /// A repeated tap was recognized.
    Click {
        /// Number of contacts present at the recognizing release.
        taps: usize,
        /// Release position of the recognizing contact, in view coordinates.
        position: Point,
    },
}

/// Batch of notifications produced while processing one touch event.
pub type GestureEvents = SmallVec<[GestureEvent; 4]>;

/// Policy hook consulted before a move may start a session on its own.
///
/// The default policy always allows the start.
pub type StartPolicy = fn(&PointerTracker) -> bool;

#[derive(Clone, Copy, Debug)]
struct PointerSlot {
    id: Option<PointerId>,
    start: Point,
    current: Point,
    start_time: u64,
    current_time: u64,
}

impl PointerSlot {
    const EMPTY: Self = Self {
        id: None,
        start: Point::ZERO,
        current: Point::ZERO,
        start_time: 0,
        current_time: 0,
    };
}

/// Timing snapshot of the previous completed tap at a slot position.
///
/// Kept by slot position rather than contact id so that the next contact
/// landing in the same position can complete a repeated tap, and preserved
/// across session resets for the same reason.
#[derive(Clone, Copy, Debug)]
struct TapTimes {
    start_ms: u64,
    current_ms: u64,
}

/// Multi-pointer gesture state machine.
///
/// Tracks up to [`MAX_POINTERS`] contacts in a fixed slot arena: slots
/// `[0, count)` are live, slots at or above `count` are empty. Releasing a
/// contact shifts the slots above it down by one, so the lowest slots always
/// hold the live contacts in press order.
#[derive(Clone, Debug)]
pub struct PointerTracker {
    slots: [PointerSlot; MAX_POINTERS],
    tap_history: [Option<TapTimes>; MAX_POINTERS],
    count: usize,
    in_progress: bool,
    start_policy: StartPolicy,
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerTracker {
    /// Creates an idle tracker with the always-allow start policy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: [PointerSlot::EMPTY; MAX_POINTERS],
            tap_history: [None; MAX_POINTERS],
            count: 0,
            in_progress: false,
            start_policy: |_| true,
        }
    }

    /// Number of contacts recognized at the last press/release transition.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns `true` while a gesture session is in progress.
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    /// Sets the policy consulted before a move may start a session.
    pub fn set_start_policy(&mut self, policy: StartPolicy) {
        self.start_policy = policy;
    }

    /// Start position of a live slot, or `None` past the live range.
    #[must_use]
    pub fn start_position(&self, slot: usize) -> Option<Point> {
        (slot < self.count).then(|| self.slots[slot].start)
    }

    /// Current position of a live slot, or `None` past the live range.
    #[must_use]
    pub fn current_position(&self, slot: usize) -> Option<Point> {
        (slot < self.count).then(|| self.slots[slot].current)
    }

    /// Host id of the contact in a live slot, or `None` past the live range.
    #[must_use]
    pub fn pointer_id(&self, slot: usize) -> Option<PointerId> {
        if slot < self.count {
            self.slots[slot].id
        } else {
            None
        }
    }

    /// Start positions of the live slots, in slot order.
    pub fn start_positions(&self) -> impl Iterator<Item = Point> + '_ {
        self.slots[..self.count].iter().map(|s| s.start)
    }

    /// Current positions of the live slots, in slot order.
    pub fn current_positions(&self) -> impl Iterator<Item = Point> + '_ {
        self.slots[..self.count].iter().map(|s| s.current)
    }

    /// Stateless view deriving pan/pinch/rotate deltas from the live slots.
    #[must_use]
    pub fn metrics(&self) -> GestureMetrics<'_> {
        GestureMetrics::new(self)
    }

    /// Processes one touch event and returns the resulting notifications.
    ///
    /// Malformed input (an unknown pointer id, an action index past the
    /// pointer list, a press beyond capacity) is absorbed as a per-slot
    /// no-op; this method never panics.
    pub fn handle_event(&mut self, event: &TouchEvent) -> GestureEvents {
        let mut out = GestureEvents::new();
        match event.phase {
            TouchPhase::Down => {
                self.reset();
                let Some(pressed) = event.action_pointer() else {
                    return out;
                };
                self.slots[0] = PointerSlot {
                    id: Some(pressed.id),
                    start: pressed.position,
                    current: pressed.position,
                    start_time: event.time_ms,
                    current_time: event.time_ms,
                };
                self.count = 1;
                self.in_progress = true;
                out.push(GestureEvent::Begin);
            }
            TouchPhase::PointerDown => {
                // A mid-session press extends the session in place.
                let Some(pressed) = event.action_pointer() else {
                    return out;
                };
                if self.slot_of(pressed.id).is_none() && self.count < MAX_POINTERS {
                    self.slots[self.count] = PointerSlot {
                        id: Some(pressed.id),
                        start: pressed.position,
                        current: pressed.position,
                        start_time: event.time_ms,
                        current_time: event.time_ms,
                    };
                    self.count += 1;
                }
            }
            TouchPhase::Move => {
                self.update_positions(event);
                if !self.in_progress && self.count > 0 && (self.start_policy)(self) {
                    self.in_progress = true;
                    out.push(GestureEvent::Begin);
                }
                if self.in_progress {
                    out.push(GestureEvent::Update);
                }
            }
            TouchPhase::Up | TouchPhase::PointerUp => {
                self.handle_release(event, &mut out);
            }
            TouchPhase::Cancel => {
                if self.in_progress {
                    out.push(GestureEvent::End);
                }
                self.reset();
            }
        }
        out
    }

    /// Re-anchors the in-progress session so the next deltas start from zero.
    ///
    /// Emits [`GestureEvent::End`] then [`GestureEvent::Begin`] and rebases
    /// every live slot's start position to its current one. A no-op when no
    /// session is in progress; calling it repeatedly is harmless since the
    /// rebase is idempotent.
    pub fn restart_gesture(&mut self) -> GestureEvents {
        let mut out = GestureEvents::new();
        if !self.in_progress {
            return out;
        }
        out.push(GestureEvent::End);
        for slot in &mut self.slots[..self.count] {
            slot.start = slot.current;
        }
        out.push(GestureEvent::Begin);
        out
    }

    fn slot_of(&self, id: PointerId) -> Option<usize> {
        self.slots[..self.count].iter().position(|s| s.id == Some(id))
    }

    fn update_positions(&mut self, event: &TouchEvent) {
        for slot in &mut self.slots[..self.count] {
            let Some(id) = slot.id else { continue };
            if let Some(p) = event.find_pointer(id) {
                slot.current = p.position;
                slot.current_time = event.time_ms;
            }
        }
    }

    fn handle_release(&mut self, event: &TouchEvent, out: &mut GestureEvents) {
        let was_in_progress = self.in_progress;
        self.update_positions(event);

        if event.phase == TouchPhase::Up || self.count <= 1 {
            self.final_release(event, out);
        } else {
            self.partial_release(event, out);
        }

        if !(was_in_progress && self.count > 0) {
            if was_in_progress {
                out.push(GestureEvent::End);
            }
            self.reset();
        }
    }

    /// Last contact lifted: evaluate the tap window against the previous tap
    /// at the same slot position, then let the caller tear the session down.
    fn final_release(&mut self, event: &TouchEvent, out: &mut GestureEvents) {
        let idx = event
            .action_pointer()
            .and_then(|p| self.slot_of(p.id))
            .unwrap_or(0);
        let slot = self.slots[idx];
        if slot.id.is_some() {
            let repeat = self.tap_repeat(idx, &slot);
            self.record_tap(idx, &slot);
            if repeat {
                out.push(GestureEvent::Click {
                    taps: event.pointer_count().max(1),
                    position: slot.current,
                });
            }
        }
        self.count = 0;
    }

    /// A contact lifted while others remain: complete its tap, compact the
    /// arena, and re-anchor the survivors.
    fn partial_release(&mut self, event: &TouchEvent, out: &mut GestureEvents) {
        let Some(idx) = event.action_pointer().and_then(|p| self.slot_of(p.id)) else {
            return;
        };
        let released = self.slots[idx];
        let repeat = self.tap_repeat(idx, &released);
        self.record_tap(idx, &released);

        // Shift the slots above the released one down. Tap history stays
        // keyed by slot position so the next contact landing there can still
        // complete a repeated tap.
        for i in idx..self.count - 1 {
            self.slots[i] = self.slots[i + 1];
        }
        self.count -= 1;
        self.slots[self.count] = PointerSlot::EMPTY;

        if repeat {
            out.push(GestureEvent::Click {
                taps: event.pointer_count(),
                position: released.current,
            });
            // The remaining contacts of this multi-contact tap will lift
            // next; clear their history so those releases cannot fire a
            // second, lower-count click.
            for history in &mut self.tap_history[..self.count] {
                *history = None;
            }
        }

        // Re-anchor the survivors so the centroid shift from the lifted
        // contact cannot show up as a translation jump on the next update.
        for slot in &mut self.slots[..self.count] {
            slot.start = slot.current;
        }
    }

    fn tap_repeat(&self, idx: usize, slot: &PointerSlot) -> bool {
        self.tap_history[idx].is_some_and(|prev| {
            slot.start_time.saturating_sub(prev.start_ms) < TAP_REPEAT_WINDOW_MS
                && slot.current_time.saturating_sub(prev.current_ms) < TAP_REPEAT_WINDOW_MS
        })
    }

    fn record_tap(&mut self, idx: usize, slot: &PointerSlot) {
        self.tap_history[idx] = Some(TapTimes {
            start_ms: slot.start_time,
            current_ms: slot.current_time,
        });
    }

    /// Clears the session. Tap history deliberately survives so the next
    /// session can complete a repeated tap.
    fn reset(&mut self) {
        self.slots = [PointerSlot::EMPTY; MAX_POINTERS];
        self.count = 0;
        self.in_progress = false;
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Vec2};

    use crate::event::TouchEvent;

    use super::{GestureEvent, PointerTracker};

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn first_down_begins_session() {
        let mut tracker = PointerTracker::new();
        let events = tracker.handle_event(&TouchEvent::down(1, pt(10.0, 10.0), 0));
        assert_eq!(events.as_slice(), [GestureEvent::Begin].as_slice());
        assert_eq!(tracker.count(), 1);
        assert!(tracker.is_in_progress());
        assert_eq!(tracker.start_position(0), Some(pt(10.0, 10.0)));
    }

    #[test]
    fn secondary_down_extends_without_restart() {
        let mut tracker = PointerTracker::new();
        tracker.handle_event(&TouchEvent::down(1, pt(0.0, 0.0), 0));
        let events = tracker.handle_event(&TouchEvent::pointer_down(
            [(1, pt(0.0, 0.0)), (2, pt(100.0, 0.0))],
            1,
            10,
        ));
        assert!(events.is_empty());
        assert_eq!(tracker.count(), 2);
        assert!(tracker.is_in_progress());
        assert_eq!(tracker.pointer_id(1), Some(2));
    }

    #[test]
    fn every_move_fires_update_even_with_zero_displacement() {
        let mut tracker = PointerTracker::new();
        tracker.handle_event(&TouchEvent::down(1, pt(5.0, 5.0), 0));
        let events = tracker.handle_event(&TouchEvent::moved([(1, pt(5.0, 5.0))], 16));
        assert_eq!(events.as_slice(), [GestureEvent::Update].as_slice());
    }

    #[test]
    fn unknown_pointer_id_is_a_no_op_for_slots() {
        let mut tracker = PointerTracker::new();
        tracker.handle_event(&TouchEvent::down(1, pt(5.0, 5.0), 0));
        let events = tracker.handle_event(&TouchEvent::moved([(9, pt(50.0, 50.0))], 16));
        // Session still updates, but the tracked position is untouched.
        assert_eq!(events.as_slice(), [GestureEvent::Update].as_slice());
        assert_eq!(tracker.current_position(0), Some(pt(5.0, 5.0)));
    }

    #[test]
    fn release_compacts_slots_and_reanchors_survivors() {
        let mut tracker = PointerTracker::new();
        tracker.handle_event(&TouchEvent::down(1, pt(0.0, 0.0), 0));
        tracker.handle_event(&TouchEvent::pointer_down(
            [(1, pt(0.0, 0.0)), (2, pt(100.0, 0.0))],
            1,
            5,
        ));
        tracker.handle_event(&TouchEvent::pointer_down(
            [(1, pt(0.0, 0.0)), (2, pt(100.0, 0.0)), (3, pt(0.0, 100.0))],
            2,
            10,
        ));
        tracker.handle_event(&TouchEvent::moved(
            [(1, pt(10.0, 0.0)), (2, pt(110.0, 0.0)), (3, pt(10.0, 100.0))],
            20,
        ));

        // Release the middle contact; the arena compacts around it.
        let events = tracker.handle_event(&TouchEvent::pointer_up(
            [(1, pt(10.0, 0.0)), (2, pt(110.0, 0.0)), (3, pt(10.0, 100.0))],
            1,
            30,
        ));
        assert!(events.is_empty());
        assert_eq!(tracker.count(), 2);
        assert_eq!(tracker.pointer_id(0), Some(1));
        assert_eq!(tracker.pointer_id(1), Some(3));
        // Survivors are re-anchored: the next deltas start from zero.
        assert_eq!(tracker.start_position(0), Some(pt(10.0, 0.0)));
        assert_eq!(tracker.start_position(1), Some(pt(10.0, 100.0)));
        assert!(tracker.is_in_progress());
    }

    #[test]
    fn final_up_ends_session_and_resets() {
        let mut tracker = PointerTracker::new();
        tracker.handle_event(&TouchEvent::down(1, pt(0.0, 0.0), 0));
        let events = tracker.handle_event(&TouchEvent::up(1, pt(0.0, 0.0), 40));
        assert_eq!(events.as_slice(), [GestureEvent::End].as_slice());
        assert_eq!(tracker.count(), 0);
        assert!(!tracker.is_in_progress());
    }

    #[test]
    fn cancel_resets_cleanly_and_next_session_is_fresh() {
        let mut tracker = PointerTracker::new();
        tracker.handle_event(&TouchEvent::down(1, pt(0.0, 0.0), 0));
        tracker.handle_event(&TouchEvent::moved([(1, pt(40.0, 40.0))], 16));
        let events = tracker.handle_event(&TouchEvent::cancel(20));
        assert_eq!(events.as_slice(), [GestureEvent::End].as_slice());
        assert_eq!(tracker.count(), 0);
        assert!(!tracker.is_in_progress());

        // No residue: the next session's deltas come only from its own events.
        tracker.handle_event(&TouchEvent::down(5, pt(100.0, 100.0), 1000));
        tracker.handle_event(&TouchEvent::moved([(5, pt(110.0, 100.0))], 1016));
        assert_eq!(tracker.metrics().translation(), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn double_tap_fires_click_on_second_release() {
        let mut tracker = PointerTracker::new();
        tracker.handle_event(&TouchEvent::down(1, pt(50.0, 50.0), 0));
        let first = tracker.handle_event(&TouchEvent::up(1, pt(50.0, 50.0), 50));
        assert_eq!(first.as_slice(), [GestureEvent::End].as_slice());

        tracker.handle_event(&TouchEvent::down(1, pt(50.0, 50.0), 200));
        let second = tracker.handle_event(&TouchEvent::up(1, pt(51.0, 50.0), 250));
        assert_eq!(
            second.as_slice(),
            [
                GestureEvent::Click {
                    taps: 1,
                    position: pt(51.0, 50.0)
                },
                GestureEvent::End,
            ]
            .as_slice()
        );
    }

    #[test]
    fn slow_second_tap_does_not_click() {
        let mut tracker = PointerTracker::new();
        tracker.handle_event(&TouchEvent::down(1, pt(50.0, 50.0), 0));
        tracker.handle_event(&TouchEvent::up(1, pt(50.0, 50.0), 50));

        tracker.handle_event(&TouchEvent::down(1, pt(50.0, 50.0), 1000));
        let events = tracker.handle_event(&TouchEvent::up(1, pt(50.0, 50.0), 1050));
        assert_eq!(events.as_slice(), [GestureEvent::End].as_slice());
    }

    #[test]
    fn two_finger_repeat_tap_clicks_with_two_taps() {
        let mut tracker = PointerTracker::new();

        // First two-finger tap: no click yet, just the timing record.
        tracker.handle_event(&TouchEvent::down(1, pt(40.0, 40.0), 0));
        tracker.handle_event(&TouchEvent::pointer_down(
            [(1, pt(40.0, 40.0)), (2, pt(60.0, 40.0))],
            1,
            10,
        ));
        let r1 = tracker.handle_event(&TouchEvent::pointer_up(
            [(1, pt(40.0, 40.0)), (2, pt(60.0, 40.0))],
            1,
            60,
        ));
        assert!(r1.is_empty());
        let r2 = tracker.handle_event(&TouchEvent::up(1, pt(40.0, 40.0), 70));
        assert_eq!(r2.as_slice(), [GestureEvent::End].as_slice());

        // Second two-finger tap within the repeat window: the first lifting
        // contact recognizes the pattern with the full contact count.
        tracker.handle_event(&TouchEvent::down(1, pt(40.0, 40.0), 300));
        tracker.handle_event(&TouchEvent::pointer_down(
            [(1, pt(40.0, 40.0)), (2, pt(60.0, 40.0))],
            1,
            310,
        ));
        let r3 = tracker.handle_event(&TouchEvent::pointer_up(
            [(1, pt(40.0, 40.0)), (2, pt(60.0, 40.0))],
            1,
            360,
        ));
        assert_eq!(
            r3.as_slice(),
            [GestureEvent::Click {
                taps: 2,
                position: pt(60.0, 40.0)
            }]
            .as_slice()
        );

        // The trailing single-contact lift must not fire a second click.
        let r4 = tracker.handle_event(&TouchEvent::up(1, pt(40.0, 40.0), 370));
        assert_eq!(r4.as_slice(), [GestureEvent::End].as_slice());
    }

    #[test]
    fn restart_rebases_deltas_without_losing_the_session() {
        let mut tracker = PointerTracker::new();
        tracker.handle_event(&TouchEvent::down(1, pt(100.0, 100.0), 0));
        tracker.handle_event(&TouchEvent::moved([(1, pt(150.0, 130.0))], 16));
        assert_eq!(tracker.metrics().translation(), Vec2::new(50.0, 30.0));

        let events = tracker.restart_gesture();
        assert_eq!(
            events.as_slice(),
            [GestureEvent::End, GestureEvent::Begin].as_slice()
        );
        assert!(tracker.is_in_progress());
        assert_eq!(tracker.metrics().translation(), Vec2::ZERO);

        // Later motion is measured from the rebased anchor.
        tracker.handle_event(&TouchEvent::moved([(1, pt(160.0, 130.0))], 32));
        assert_eq!(tracker.metrics().translation(), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn restart_when_idle_is_a_no_op() {
        let mut tracker = PointerTracker::new();
        assert!(tracker.restart_gesture().is_empty());
    }

    #[test]
    fn presses_beyond_capacity_are_absorbed() {
        let mut tracker = PointerTracker::new();
        tracker.handle_event(&TouchEvent::down(0, pt(0.0, 0.0), 0));
        for extra in 1..super::MAX_POINTERS + 3 {
            let id = extra as u64;
            tracker.handle_event(&TouchEvent::pointer_down(
                (0..=id).map(|i| (i, pt(i as f64, 0.0))),
                extra,
                1,
            ));
        }
        assert_eq!(tracker.count(), super::MAX_POINTERS);
    }
}
