// Copyright 2026 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Loupe Gestures: multi-pointer gesture tracking for image viewers.
//!
//! This crate provides a small, headless state machine that consumes a stream
//! of normalized touch events and tracks up to [`MAX_POINTERS`] simultaneous
//! contacts. It focuses on:
//! - Per-contact slot tracking (start/current position and timing).
//! - Gesture session lifecycle: begin, per-move updates, end, cancel.
//! - Tap recognition from inter-event timing.
//! - Pure derivation of pan/pinch/rotate deltas over the tracked contacts.
//!
//! It does **not** own any rendering or transform state. Callers are expected
//! to:
//! - Normalize platform input into [`TouchEvent`] values.
//! - Feed them to [`PointerTracker::handle_event`] one at a time.
//! - Interpret the returned [`GestureEvent`] batch, typically by reading
//!   [`GestureMetrics`] on every update and composing a transform at a higher
//!   layer (for example, `loupe_transform`).
//!
//! ## Minimal example
//!
//! ```rust
//! use kurbo::{Point, Vec2};
//! use loupe_gestures::{GestureEvent, PointerTracker, TouchEvent};
//!
//! let mut tracker = PointerTracker::new();
//!
//! // One finger lands at (100, 100) and drags to (150, 130).
//! tracker.handle_event(&TouchEvent::down(1, Point::new(100.0, 100.0), 0));
//! let events = tracker.handle_event(&TouchEvent::moved([(1, Point::new(150.0, 130.0))], 16));
//! assert_eq!(events.as_slice(), [GestureEvent::Update].as_slice());
//!
//! // The metrics view derives the pan delta from the live slots.
//! let metrics = tracker.metrics();
//! assert_eq!(metrics.translation(), Vec2::new(50.0, 30.0));
//! assert_eq!(metrics.scale(), 1.0);
//! ```
//!
//! ## Design notes
//!
//! - Contacts live in a fixed-capacity slot arena; per-event work is bounded
//!   and allocation-free.
//! - The tracker reports transitions as returned event batches instead of
//!   invoking registered listeners, keeping ownership acyclic: consumers hold
//!   the tracker, never the other way around.
//! - Scale and rotation are measured between slot 0 and the centroid of all
//!   tracked contacts, which reduces to the pairwise case for two contacts
//!   and stays meaningful beyond.
//!
//! This crate is `no_std`.

#![no_std]

mod event;
mod metrics;
mod tracker;

pub use event::{PointerId, TouchEvent, TouchPhase, TouchPoint};
pub use metrics::GestureMetrics;
pub use tracker::{GestureEvent, GestureEvents, PointerTracker, StartPolicy, MAX_POINTERS};
