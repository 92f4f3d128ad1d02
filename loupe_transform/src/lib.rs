// Copyright 2026 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Loupe Transform: gesture-driven affine transform engine for image viewers.
//!
//! This crate turns the gesture sessions tracked by `loupe_gestures` into a
//! single running [`kurbo::Affine`] suitable for drawing a pannable,
//! zoomable, rotatable image. It focuses on:
//! - Composing pan/pinch/rotate deltas onto a committed base matrix on every
//!   gesture update.
//! - Enforcing a minimum scale so the matrix stays invertible.
//! - Clamping translation so a large image never reveals empty space and a
//!   small image stays centered.
//! - Tap-to-zoom stepping.
//! - Mapping points between view space and the image's normalized unit
//!   square.
//!
//! It does **not** decode, render, or lay out anything. Callers are expected
//! to:
//! - Feed normalized [`loupe_gestures::TouchEvent`]s into
//!   [`TransformEngine::handle_event`].
//! - Apply the matrix carried by each [`TransformEvent::Transformed`] when
//!   drawing.
//! - Keep [`TransformEngine::set_view_bounds`] and
//!   [`TransformEngine::set_object_bounds`] in sync with layout and the
//!   displayed image.
//!
//! ## Minimal example
//!
//! ```rust
//! use kurbo::{Point, Rect};
//! use loupe_gestures::TouchEvent;
//! use loupe_transform::{TransformEngine, TransformEvent};
//!
//! let mut engine = TransformEngine::new();
//! engine.set_object_bounds(Rect::new(0.0, 0.0, 1000.0, 1000.0));
//! engine.set_view_bounds(Rect::new(0.0, 0.0, 500.0, 500.0));
//!
//! // Drag one finger up and to the left.
//! engine.handle_event(&TouchEvent::down(1, Point::new(100.0, 100.0), 0));
//! let events = engine.handle_event(&TouchEvent::moved([(1, Point::new(60.0, 80.0))], 16));
//!
//! match events.as_slice() {
//!     [TransformEvent::Transformed(matrix)] => {
//!         // The image pans by the finger's displacement.
//!         assert_eq!(*matrix * Point::ZERO, Point::new(-40.0, -20.0));
//!     }
//!     other => panic!("unexpected events: {other:?}"),
//! }
//! ```
//!
//! ## Design notes
//!
//! - The engine owns its [`loupe_gestures::PointerTracker`] and drives it;
//!   feedback flows the other way only through
//!   [`loupe_gestures::PointerTracker::restart_gesture`], which re-anchors
//!   the in-flight gesture whenever a clamp moves the matrix out from under
//!   it.
//! - Updates always rebuild from the committed matrix plus the whole-gesture
//!   deltas, so floating point error does not accumulate across moves.
//! - All angles are radians; all coordinates are view-space `f64`.
//!
//! This crate is `no_std`.

#![no_std]

mod engine;

pub use engine::{TransformEngine, TransformEvent, TransformEvents, Transformable};
