// Copyright 2026 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The transform engine: gesture deltas in, clamped affine matrix out.
//!
//! [`TransformEngine`] keeps two matrices: the committed one (the state at
//! the end of the last gesture) and the active one (committed plus the
//! deltas of the gesture in flight). Every gesture update rebuilds the
//! active matrix from scratch: translate, scale about the gesture pivot,
//! rotate about the gesture pivot, then clamp. When a clamp has to move the
//! matrix, the engine asks the tracker to re-anchor the in-flight gesture so
//! the next update measures deltas from the corrected baseline; without the
//! rebase the following move would snap the image right back and the
//! correction would be visible as a jump.

use kurbo::{Affine, Point, Rect, Vec2};
use smallvec::SmallVec;

use loupe_gestures::{GestureEvent, PointerTracker, StartPolicy, TouchEvent};

/// Multiplicative zoom applied per recognized tap step.
const TAP_ZOOM_STEP: f64 = 2.0;

/// Lower bound on the configurable minimum scale. A zero minimum would let
/// the active matrix degenerate and lose invertibility.
const MIN_SCALE_FLOOR: f64 = 1e-3;

/// Corrections below this are ignored so floating point dust cannot
/// retrigger the bounds clamp and its gesture rebase.
const CLAMP_SLACK: f64 = 1e-9;

/// Notifications produced while processing one touch event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransformEvent {
    /// The active transform changed; apply this matrix when drawing.
    Transformed(Affine),
    /// A tap pattern was recognized, after any tap-to-zoom was applied.
    Click {
        /// Number of contacts participating in the tap.
        taps: usize,
    },
}

/// Batch of notifications produced while processing one touch event.
pub type TransformEvents = SmallVec<[TransformEvent; 4]>;

/// Abstract surface a host holds to drive and observe an image transform.
///
/// [`TransformEngine`] is the stock implementation; hosts that need to swap
/// behaviors (for example, a fixed-transform stub in tests) can provide
/// their own.
pub trait Transformable {
    /// Enables or disables event handling as a whole.
    fn set_enabled(&mut self, enabled: bool);
    /// Returns `true` when events are being handled.
    fn is_enabled(&self) -> bool;
    /// The x-axis scale component of the active matrix.
    fn scale_factor(&self) -> f64;
    /// The active matrix at call time.
    fn transform(&self) -> Affine;
    /// Sets the bounds of the unscaled image content.
    fn set_object_bounds(&mut self, bounds: Rect);
    /// Sets the bounds of the display viewport.
    fn set_view_bounds(&mut self, bounds: Rect);
    /// Processes one touch event and returns the resulting notifications.
    fn handle_event(&mut self, event: &TouchEvent) -> TransformEvents;
}

/// Gesture-driven affine transform engine with minimum-scale and bounds
/// clamping.
///
/// The engine owns its [`PointerTracker`] and is the only thing driving it;
/// consumers interact exclusively through [`TransformEngine::handle_event`]
/// and the configuration surface.
#[derive(Clone, Debug)]
pub struct TransformEngine {
    tracker: PointerTracker,
    /// State committed at the end of the last gesture.
    previous: Affine,
    /// Committed state plus the in-flight gesture's deltas. Equal to
    /// `previous` whenever no gesture is in progress.
    active: Affine,
    object_bounds: Rect,
    view_bounds: Rect,
    min_scale: f64,
    enabled: bool,
    translation_enabled: bool,
    scale_enabled: bool,
    rotation_enabled: bool,
}

impl Default for TransformEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformEngine {
    /// Creates an engine at the identity transform with every feature
    /// enabled and a minimum scale of `1.0`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tracker: PointerTracker::new(),
            previous: Affine::IDENTITY,
            active: Affine::IDENTITY,
            object_bounds: Rect::ZERO,
            view_bounds: Rect::ZERO,
            min_scale: 1.0,
            enabled: true,
            translation_enabled: true,
            scale_enabled: true,
            rotation_enabled: true,
        }
    }

    /// Read access to the owned gesture tracker.
    #[must_use]
    pub fn tracker(&self) -> &PointerTracker {
        &self.tracker
    }

    /// Forwards a start policy to the owned tracker.
    pub fn set_start_policy(&mut self, policy: StartPolicy) {
        self.tracker.set_start_policy(policy);
    }

    /// Returns `true` when events are being handled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables event handling as a whole.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns `true` when gesture translation is applied.
    #[must_use]
    pub fn is_translation_enabled(&self) -> bool {
        self.translation_enabled
    }

    /// Enables or disables gesture translation.
    pub fn set_translation_enabled(&mut self, enabled: bool) {
        self.translation_enabled = enabled;
    }

    /// Returns `true` when gesture scaling (and tap-to-zoom) is applied.
    #[must_use]
    pub fn is_scale_enabled(&self) -> bool {
        self.scale_enabled
    }

    /// Enables or disables gesture scaling and tap-to-zoom.
    pub fn set_scale_enabled(&mut self, enabled: bool) {
        self.scale_enabled = enabled;
    }

    /// Returns `true` when gesture rotation is applied.
    #[must_use]
    pub fn is_rotation_enabled(&self) -> bool {
        self.rotation_enabled
    }

    /// Enables or disables gesture rotation.
    pub fn set_rotation_enabled(&mut self, enabled: bool) {
        self.rotation_enabled = enabled;
    }

    /// The minimum allowed scale factor.
    #[must_use]
    pub fn min_scale(&self) -> f64 {
        self.min_scale
    }

    /// Sets the minimum allowed scale factor.
    ///
    /// Values at or below zero are raised to a small positive floor so the
    /// active matrix always stays invertible.
    pub fn set_min_scale(&mut self, min_scale: f64) {
        self.min_scale = min_scale.max(MIN_SCALE_FLOOR);
    }

    /// Bounds of the unscaled image content.
    #[must_use]
    pub fn object_bounds(&self) -> Rect {
        self.object_bounds
    }

    /// Sets the bounds of the unscaled image content.
    pub fn set_object_bounds(&mut self, bounds: Rect) {
        self.object_bounds = bounds;
    }

    /// Bounds of the display viewport.
    #[must_use]
    pub fn view_bounds(&self) -> Rect {
        self.view_bounds
    }

    /// Sets the bounds of the display viewport.
    pub fn set_view_bounds(&mut self, bounds: Rect) {
        self.view_bounds = bounds;
    }

    /// The active matrix at call time.
    #[must_use]
    pub fn transform(&self) -> Affine {
        self.active
    }

    /// The x-axis scale component of the active matrix.
    ///
    /// Measured as the length of the image of the unit x-vector, which
    /// matches the plain x-scale when no rotation is applied and stays
    /// meaningful when one is.
    #[must_use]
    pub fn scale_factor(&self) -> f64 {
        scale_component(self.active)
    }

    /// Processes one touch event and returns the resulting notifications.
    ///
    /// Returns an empty batch when the engine is disabled.
    pub fn handle_event(&mut self, event: &TouchEvent) -> TransformEvents {
        let mut out = TransformEvents::new();
        if !self.enabled {
            return out;
        }
        for gesture in self.tracker.handle_event(event) {
            match gesture {
                GestureEvent::Begin => {}
                GestureEvent::Update => {
                    self.recompose();
                    out.push(TransformEvent::Transformed(self.active));
                }
                GestureEvent::End => {
                    self.previous = self.active;
                }
                GestureEvent::Click { taps, position } => {
                    if self.apply_tap_zoom(taps, position) {
                        out.push(TransformEvent::Transformed(self.active));
                    }
                    out.push(TransformEvent::Click { taps });
                }
            }
        }
        out
    }

    /// Maps a view-space point into the image's normalized unit square.
    ///
    /// Uses the active matrix at call time, independent of any in-flight
    /// gesture. `None` when the object bounds are empty.
    #[must_use]
    pub fn view_to_object(&self, view_point: Point) -> Option<Point> {
        if self.object_bounds.width() <= 0.0 || self.object_bounds.height() <= 0.0 {
            return None;
        }
        let object_point = self.active.inverse() * view_point;
        Some(Point::new(
            (object_point.x - self.object_bounds.x0) / self.object_bounds.width(),
            (object_point.y - self.object_bounds.y0) / self.object_bounds.height(),
        ))
    }

    /// Maps a point in the image's normalized unit square into view space.
    ///
    /// Uses the active matrix at call time. `None` when the object bounds
    /// are empty.
    #[must_use]
    pub fn object_to_view(&self, object_point: Point) -> Option<Point> {
        if self.object_bounds.width() <= 0.0 || self.object_bounds.height() <= 0.0 {
            return None;
        }
        let absolute = Point::new(
            self.object_bounds.x0 + object_point.x * self.object_bounds.width(),
            self.object_bounds.y0 + object_point.y * self.object_bounds.height(),
        );
        Some(self.active * absolute)
    }

    /// Rebuilds the active matrix from the committed one plus the in-flight
    /// gesture's deltas, then applies the scale and translation clamps.
    fn recompose(&mut self) {
        let metrics = self.tracker.metrics();
        let pivot = metrics.pivot();
        let translation = metrics.translation();
        let scale = metrics.scale();
        let rotation = metrics.rotation();

        let mut matrix = self.previous;
        if self.translation_enabled {
            matrix = Affine::translate(translation) * matrix;
        }
        if self.scale_enabled {
            matrix = scale_about(scale, pivot) * matrix;
        }
        if self.rotation_enabled {
            matrix = Affine::rotate_about(rotation, pivot) * matrix;
        }
        self.active = matrix;

        self.limit_scale(pivot);
        self.limit_translation();
    }

    /// Applies one tap-to-zoom step: one contact steps in, two step out,
    /// three reset to the base scale. Returns `true` when the matrix
    /// changed.
    fn apply_tap_zoom(&mut self, taps: usize, position: Point) -> bool {
        if !self.scale_enabled {
            return false;
        }
        let current = self.scale_factor();
        let factor = match taps {
            1 => TAP_ZOOM_STEP,
            2 => TAP_ZOOM_STEP.recip(),
            3 if current > 0.0 => current.recip(),
            _ => return false,
        };
        self.active = scale_about(factor, position) * self.active;
        self.limit_scale(position);
        self.limit_translation();
        // A tap is not part of any in-flight gesture; commit immediately so
        // the next update cannot rebuild from a stale baseline and drop the
        // zoom.
        self.previous = self.active;
        true
    }

    /// Scales the active matrix back up to the minimum scale when the
    /// gesture pushed it below, pivoted where the gesture is pivoted.
    ///
    /// The current scale is measured from the matrix as it stands after the
    /// full composition, not from any pre-gesture value.
    fn limit_scale(&mut self, pivot: Point) {
        let current = scale_component(self.active);
        if current > 0.0 && current < self.min_scale {
            self.active = scale_about(self.min_scale / current, pivot) * self.active;
        }
    }

    /// Clamps the mapped content into the viewport: centered on an axis
    /// where it is smaller, never revealing empty space where it is larger.
    ///
    /// When a correction is applied, the tracker is asked to re-anchor the
    /// in-flight gesture; its `End` commits the corrected matrix so later
    /// deltas build on the clamped baseline.
    fn limit_translation(&mut self) {
        if self.object_bounds.width() <= 0.0
            || self.object_bounds.height() <= 0.0
            || self.view_bounds.width() <= 0.0
            || self.view_bounds.height() <= 0.0
        {
            return;
        }
        let mapped = self.active.transform_rect_bbox(self.object_bounds);
        let dx = axis_correction(
            mapped.x0,
            mapped.width(),
            self.view_bounds.x0,
            self.view_bounds.width(),
        );
        let dy = axis_correction(
            mapped.y0,
            mapped.height(),
            self.view_bounds.y0,
            self.view_bounds.height(),
        );
        if dx.abs() > CLAMP_SLACK || dy.abs() > CLAMP_SLACK {
            self.active = Affine::translate(Vec2::new(dx, dy)) * self.active;
            for event in self.tracker.restart_gesture() {
                if event == GestureEvent::End {
                    self.previous = self.active;
                }
            }
        }
    }
}

impl Transformable for TransformEngine {
    fn set_enabled(&mut self, enabled: bool) {
        Self::set_enabled(self, enabled);
    }

    fn is_enabled(&self) -> bool {
        Self::is_enabled(self)
    }

    fn scale_factor(&self) -> f64 {
        Self::scale_factor(self)
    }

    fn transform(&self) -> Affine {
        Self::transform(self)
    }

    fn set_object_bounds(&mut self, bounds: Rect) {
        Self::set_object_bounds(self, bounds);
    }

    fn set_view_bounds(&mut self, bounds: Rect) {
        Self::set_view_bounds(self, bounds);
    }

    fn handle_event(&mut self, event: &TouchEvent) -> TransformEvents {
        Self::handle_event(self, event)
    }
}

/// Uniform scale about an anchor point.
fn scale_about(scale: f64, anchor: Point) -> Affine {
    Affine::translate(anchor.to_vec2()) * Affine::scale(scale) * Affine::translate(-anchor.to_vec2())
}

/// Length of the image of the unit x-vector under `matrix`.
fn scale_component(matrix: Affine) -> f64 {
    let [a, b, ..] = matrix.as_coeffs();
    Vec2::new(a, b).hypot()
}

/// Offset to add on one axis so the mapped content is centered when smaller
/// than the view, or fully covers the view when larger.
fn axis_correction(content_min: f64, content_extent: f64, view_min: f64, view_extent: f64) -> f64 {
    let slack = view_extent - content_extent;
    let desired = if slack > 0.0 {
        view_min + slack / 2.0
    } else {
        content_min.clamp(view_min + slack, view_min)
    };
    desired - content_min
}
