// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Zoom and pan state applied on top of the fitted content rectangle.
//!
//! Container coordinates are pixels relative to the container's top-left
//! corner. The content rectangle is drawn at
//! `offset + translate + content_px * scale`, with the transform origin at
//! the rectangle's top-left corner.

use super::geometry::{denormalize_coordinates, normalize_coordinates, ViewportRect};
use crate::models::annotation::Point;
use nalgebra::{Point2, Vector2};

pub const MIN_SCALE: f64 = 0.2;
pub const MAX_SCALE: f64 = 5.0;

/// Zoom ratio applied per wheel notch.
pub const WHEEL_ZOOM_STEP: f64 = 1.1;

/// Zoom ratio applied per zoom button press.
pub const BUTTON_ZOOM_STEP: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Wheel convention: scrolling up (negative delta) zooms in.
    pub fn from_wheel(delta_y: f64) -> Option<Self> {
        if delta_y < 0.0 {
            Some(ZoomDirection::In)
        } else if delta_y > 0.0 {
            Some(ZoomDirection::Out)
        } else {
            None
        }
    }
}

/// Current zoom/pan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    pub scale: f64,
    pub translate: Vector2<f64>,
}

impl Default for TransformState {
    fn default() -> Self {
        Self::identity()
    }
}

impl TransformState {
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            translate: Vector2::zeros(),
        }
    }

    /// Back to scale 1 with no translation.
    pub fn reset(&mut self) {
        *self = Self::identity();
    }

    /// Zoom by `step` keeping the content point under `anchor` fixed.
    pub fn zoom_at(
        &mut self,
        anchor: Point2<f64>,
        direction: ZoomDirection,
        step: f64,
        rect: &ViewportRect,
    ) {
        let proposed = match direction {
            ZoomDirection::In => self.scale * step,
            ZoomDirection::Out => self.scale / step,
        };
        let new_scale = proposed.clamp(MIN_SCALE, MAX_SCALE);
        let ratio = new_scale / self.scale;
        let offset = rect.origin().coords;
        let anchor = anchor.coords;

        self.translate = anchor - (anchor - self.translate - offset) * ratio - offset;
        self.scale = new_scale;
        log::debug!(
            "Zoom {:?} to {:.3}, translate ({:.1}, {:.1})",
            direction,
            self.scale,
            self.translate.x,
            self.translate.y
        );
    }

    /// Zoom around the center of the content rectangle.
    pub fn zoom_centered(&mut self, direction: ZoomDirection, rect: &ViewportRect) {
        let center = rect.origin() + rect.size() / 2.0;
        self.zoom_at(center, direction, BUTTON_ZOOM_STEP, rect);
    }

    /// Handle one wheel event. A zero delta leaves the state untouched.
    pub fn zoom_wheel(&mut self, anchor: Point2<f64>, delta_y: f64, rect: &ViewportRect) {
        if let Some(direction) = ZoomDirection::from_wheel(delta_y) {
            self.zoom_at(anchor, direction, WHEEL_ZOOM_STEP, rect);
        }
    }

    pub fn pan_by(&mut self, delta: Vector2<f64>) {
        self.translate += delta;
    }

    /// Map a content pixel (unzoomed, relative to the rectangle) to the container.
    pub fn content_to_screen(&self, content: Point2<f64>, rect: &ViewportRect) -> Point2<f64> {
        rect.origin() + self.translate + content.coords * self.scale
    }

    /// Map a container pixel to normalized content coordinates.
    ///
    /// Returns `None` when the rectangle is degenerate.
    pub fn screen_to_normalized(&self, screen: Point2<f64>, rect: &ViewportRect) -> Option<Point> {
        if !rect.is_ready() {
            return None;
        }
        let in_wrapper = screen - rect.origin() - self.translate;
        let unzoomed = Point2::from(in_wrapper / self.scale);
        Some(normalize_coordinates(unzoomed, rect))
    }

    /// Inverse of [`TransformState::screen_to_normalized`].
    pub fn normalized_to_screen(&self, point: &Point, rect: &ViewportRect) -> Option<Point2<f64>> {
        if !rect.is_ready() {
            return None;
        }
        let content = denormalize_coordinates(point, rect);
        Some(self.content_to_screen(content, rect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> ViewportRect {
        ViewportRect::fit((1000.0, 600.0), (400, 300))
    }

    #[test]
    fn test_roundtrip_through_transforms() {
        let rect = rect();
        let transforms = [
            TransformState::identity(),
            TransformState {
                scale: 2.5,
                translate: Vector2::new(-120.0, 33.0),
            },
            TransformState {
                scale: MIN_SCALE,
                translate: Vector2::new(400.0, -80.5),
            },
        ];
        let points = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.25, 0.75),
            Point::new(0.9, 0.1),
        ];

        for transform in transforms {
            for p in points {
                let screen = transform.normalized_to_screen(&p, &rect).unwrap();
                let back = transform.screen_to_normalized(screen, &rect).unwrap();
                assert!((back.x - p.x).abs() < 1e-9);
                assert!((back.y - p.y).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let rect = rect();
        let mut transform = TransformState::identity();
        let anchor = Point2::new(620.0, 210.0);
        let before = transform.screen_to_normalized(anchor, &rect).unwrap();

        transform.zoom_wheel(anchor, -1.0, &rect);
        transform.zoom_wheel(anchor, -1.0, &rect);
        transform.zoom_wheel(Point2::new(300.0, 300.0), 1.0, &rect);
        transform.zoom_wheel(Point2::new(300.0, 300.0), -1.0, &rect);

        let after = transform.screen_to_normalized(anchor, &rect).unwrap();
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
        assert!((transform.scale - 1.21).abs() < 1e-9);
    }

    #[test]
    fn test_scale_stays_clamped() {
        let rect = rect();
        let mut transform = TransformState::identity();
        for _ in 0..100 {
            transform.zoom_at(Point2::new(10.0, 10.0), ZoomDirection::In, WHEEL_ZOOM_STEP, &rect);
            assert!(transform.scale <= MAX_SCALE);
        }
        assert_eq!(transform.scale, MAX_SCALE);

        for _ in 0..100 {
            transform.zoom_centered(ZoomDirection::Out, &rect);
            assert!(transform.scale >= MIN_SCALE);
        }
        assert_eq!(transform.scale, MIN_SCALE);
    }

    #[test]
    fn test_clamped_zoom_does_not_drift() {
        let rect = rect();
        let mut transform = TransformState {
            scale: MAX_SCALE,
            translate: Vector2::new(12.0, -7.0),
        };
        transform.zoom_at(Point2::new(500.0, 300.0), ZoomDirection::In, 1.1, &rect);
        assert_eq!(transform.translate, Vector2::new(12.0, -7.0));
    }

    #[test]
    fn test_button_zoom_keeps_center_fixed() {
        let rect = rect();
        let mut transform = TransformState::identity();
        transform.zoom_centered(ZoomDirection::In, &rect);

        let center = rect.origin() + rect.size() / 2.0;
        let normalized = transform.screen_to_normalized(center, &rect).unwrap();
        assert!((normalized.x - 0.5).abs() < 1e-9);
        assert!((normalized.y - 0.5).abs() < 1e-9);
        assert!((transform.scale - BUTTON_ZOOM_STEP).abs() < 1e-9);
    }

    #[test]
    fn test_reset_restores_identity() {
        let mut transform = TransformState::identity();
        transform.zoom_wheel(Point2::new(50.0, 50.0), -3.0, &rect());
        transform.pan_by(Vector2::new(15.0, -4.0));
        transform.reset();
        assert_eq!(transform.scale, 1.0);
        assert_eq!(transform.translate, Vector2::zeros());
    }

    #[test]
    fn test_zero_wheel_delta_is_ignored() {
        let mut transform = TransformState::identity();
        transform.zoom_wheel(Point2::new(50.0, 50.0), 0.0, &rect());
        assert_eq!(transform, TransformState::identity());
    }

    #[test]
    fn test_degenerate_rect_has_no_mapping() {
        let transform = TransformState::identity();
        let empty = ViewportRect::default();
        assert!(transform.screen_to_normalized(Point2::new(1.0, 1.0), &empty).is_none());
        assert!(transform.normalized_to_screen(&Point::new(0.5, 0.5), &empty).is_none());
    }
}
