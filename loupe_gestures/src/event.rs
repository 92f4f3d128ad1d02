// Copyright 2026 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Normalized touch-event model consumed by [`PointerTracker`](crate::PointerTracker).
//!
//! Hosts translate their platform input (Android `MotionEvent`, web pointer
//! events, and so on) into this representation before feeding the tracker.
//! The model mirrors the common host conventions: a release event still
//! carries the releasing contact in its pointer list, identified by
//! [`TouchEvent::action_index`].

use kurbo::Point;
use smallvec::SmallVec;

/// Host-assigned identifier for one physical contact.
///
/// An id is only stable while its contact stays pressed; hosts may reuse ids
/// for later contacts.
pub type PointerId = u64;

/// Phase of a touch event within a contact sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchPhase {
    /// The first contact of a fresh sequence went down.
    Down,
    /// An additional contact went down while others are already pressed.
    PointerDown,
    /// One or more contacts moved.
    Move,
    /// The last remaining contact was released.
    Up,
    /// A contact was released while others remain pressed.
    PointerUp,
    /// The host aborted the sequence; all contacts are gone.
    Cancel,
}

/// One contact's state within a [`TouchEvent`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchPoint {
    /// Host-assigned id, stable while this contact is pressed.
    pub id: PointerId,
    /// Position in view coordinates.
    pub position: Point,
}

impl TouchPoint {
    /// Creates a touch point from an id and a view-space position.
    #[must_use]
    pub fn new(id: PointerId, position: Point) -> Self {
        Self { id, position }
    }
}

/// A single normalized touch event.
///
/// Events for one gesture arrive in temporal order on a single thread; the
/// tracker processes each fully before the next is accepted.
#[derive(Clone, Debug, PartialEq)]
pub struct TouchEvent {
    /// What happened.
    pub phase: TouchPhase,
    /// Index into [`Self::pointers`] of the contact that triggered a press or
    /// release. Ignored for [`TouchPhase::Move`] and [`TouchPhase::Cancel`].
    pub action_index: usize,
    /// All contacts known to the host at this event, in host index order.
    ///
    /// For [`TouchPhase::Up`] and [`TouchPhase::PointerUp`] this still
    /// includes the releasing contact.
    pub pointers: SmallVec<[TouchPoint; 4]>,
    /// Timestamp in milliseconds on the host's monotonic clock.
    pub time_ms: u64,
}

impl TouchEvent {
    /// First contact of a sequence going down.
    #[must_use]
    pub fn down(id: PointerId, position: Point, time_ms: u64) -> Self {
        Self {
            phase: TouchPhase::Down,
            action_index: 0,
            pointers: SmallVec::from_slice(&[TouchPoint::new(id, position)]),
            time_ms,
        }
    }

    /// An additional contact going down mid-sequence.
    ///
    /// `pointers` lists every pressed contact including the new one;
    /// `action_index` identifies the new contact within that list.
    #[must_use]
    pub fn pointer_down(
        pointers: impl IntoIterator<Item = (PointerId, Point)>,
        action_index: usize,
        time_ms: u64,
    ) -> Self {
        Self {
            phase: TouchPhase::PointerDown,
            action_index,
            pointers: collect_pointers(pointers),
            time_ms,
        }
    }

    /// One or more contacts moved; `pointers` lists every pressed contact.
    #[must_use]
    pub fn moved(pointers: impl IntoIterator<Item = (PointerId, Point)>, time_ms: u64) -> Self {
        Self {
            phase: TouchPhase::Move,
            action_index: 0,
            pointers: collect_pointers(pointers),
            time_ms,
        }
    }

    /// The last remaining contact released.
    #[must_use]
    pub fn up(id: PointerId, position: Point, time_ms: u64) -> Self {
        Self {
            phase: TouchPhase::Up,
            action_index: 0,
            pointers: SmallVec::from_slice(&[TouchPoint::new(id, position)]),
            time_ms,
        }
    }

    /// A contact released while others remain pressed.
    ///
    /// `pointers` still includes the releasing contact; `action_index`
    /// identifies it within that list.
    #[must_use]
    pub fn pointer_up(
        pointers: impl IntoIterator<Item = (PointerId, Point)>,
        action_index: usize,
        time_ms: u64,
    ) -> Self {
        Self {
            phase: TouchPhase::PointerUp,
            action_index,
            pointers: collect_pointers(pointers),
            time_ms,
        }
    }

    /// The host aborted the sequence.
    #[must_use]
    pub fn cancel(time_ms: u64) -> Self {
        Self {
            phase: TouchPhase::Cancel,
            action_index: 0,
            pointers: SmallVec::new(),
            time_ms,
        }
    }

    /// Number of contacts this event reports.
    #[must_use]
    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    /// Looks up a contact by its host-assigned id.
    #[must_use]
    pub fn find_pointer(&self, id: PointerId) -> Option<&TouchPoint> {
        self.pointers.iter().find(|p| p.id == id)
    }

    /// The contact that triggered this press or release, if any.
    #[must_use]
    pub fn action_pointer(&self) -> Option<&TouchPoint> {
        self.pointers.get(self.action_index)
    }
}

fn collect_pointers(
    pointers: impl IntoIterator<Item = (PointerId, Point)>,
) -> SmallVec<[TouchPoint; 4]> {
    pointers
        .into_iter()
        .map(|(id, position)| TouchPoint::new(id, position))
        .collect()
}
