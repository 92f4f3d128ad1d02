// Copyright 2026 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stateless derivation of gesture deltas from a tracker's live slots.
//!
//! [`GestureMetrics`] is a borrowed view over a
//! [`PointerTracker`](crate::PointerTracker); every quantity is recomputed
//! from the slot arena on each call and nothing is cached across events.
//! Scale and rotation are measured between slot 0 and the centroid of all
//! tracked contacts. With exactly two contacts the centroid sits at the
//! midpoint, so the ratio and angle match the plain pairwise measurement;
//! with more contacts the centroid keeps both quantities well defined.

use kurbo::{Point, Vec2};

use crate::tracker::PointerTracker;

/// Distances below this are treated as degenerate when deriving scale and
/// rotation. Returning the identity value instead of dividing keeps
/// `NaN`/`Inf` out of downstream matrices, where a single bad component
/// would corrupt every later composition.
const DEGENERATE_DISTANCE: f64 = 1e-9;

/// Pure derivation layer over a tracker's current slot set.
///
/// Obtained from [`PointerTracker::metrics`].
#[derive(Clone, Copy, Debug)]
pub struct GestureMetrics<'a> {
    tracker: &'a PointerTracker,
}

impl<'a> GestureMetrics<'a> {
    pub(crate) fn new(tracker: &'a PointerTracker) -> Self {
        Self { tracker }
    }

    /// Point about which scale and rotation apply: the centroid of the
    /// tracked start positions.
    #[must_use]
    pub fn pivot(&self) -> Point {
        self.start_centroid()
    }

    /// Mean displacement of the tracked contacts since the session anchor.
    #[must_use]
    pub fn translation(&self) -> Vec2 {
        self.current_centroid() - self.start_centroid()
    }

    /// Ratio of the current reference distance to the one at the anchor.
    ///
    /// `1.0` with fewer than two contacts, and `1.0` when either distance is
    /// degenerate (contacts starting or ending on the same point).
    #[must_use]
    pub fn scale(&self) -> f64 {
        let Some((start_vec, current_vec)) = self.reference_vectors() else {
            return 1.0;
        };
        let start_dist = start_vec.hypot();
        let current_dist = current_vec.hypot();
        if start_dist < DEGENERATE_DISTANCE || current_dist < DEGENERATE_DISTANCE {
            return 1.0;
        }
        current_dist / start_dist
    }

    /// Signed rotation of the reference vector since the anchor, in radians.
    ///
    /// `0.0` with fewer than two contacts or degenerate geometry.
    #[must_use]
    pub fn rotation(&self) -> f64 {
        let Some((start_vec, current_vec)) = self.reference_vectors() else {
            return 0.0;
        };
        if start_vec.hypot() < DEGENERATE_DISTANCE || current_vec.hypot() < DEGENERATE_DISTANCE {
            return 0.0;
        }
        current_vec.atan2() - start_vec.atan2()
    }

    /// Slot 0 → centroid vectors at the session anchor and now.
    fn reference_vectors(&self) -> Option<(Vec2, Vec2)> {
        if self.tracker.count() < 2 {
            return None;
        }
        let anchor_start = self.tracker.start_position(0)?;
        let anchor_current = self.tracker.current_position(0)?;
        Some((
            self.start_centroid() - anchor_start,
            self.current_centroid() - anchor_current,
        ))
    }

    fn start_centroid(&self) -> Point {
        centroid(self.tracker.start_positions())
    }

    fn current_centroid(&self) -> Point {
        centroid(self.tracker.current_positions())
    }
}

fn centroid(points: impl Iterator<Item = Point>) -> Point {
    let mut sum = Vec2::ZERO;
    let mut n = 0_usize;
    for p in points {
        sum += p.to_vec2();
        n += 1;
    }
    if n == 0 {
        Point::ZERO
    } else {
        (sum / n as f64).to_point()
    }
}
