// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module fits media inside its container and provides conversions
//! between content pixel coordinates and normalized coordinates.

use crate::models::annotation::Point;
use nalgebra::{Point2, Vector2};

/// Letterboxed content rectangle within the container, in container pixels.
///
/// Always recomputed from the current container and media sizes; every
/// normalized coordinate is relative to it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportRect {
    pub width: f64,
    pub height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl ViewportRect {
    /// Largest centered rectangle with the media's aspect ratio that fits
    /// in the container. Returns the zero rectangle when any size is zero.
    pub fn fit(container: (f64, f64), media: (u32, u32)) -> Self {
        let (container_w, container_h) = container;
        let (media_w, media_h) = (media.0 as f64, media.1 as f64);
        if container_w <= 0.0 || container_h <= 0.0 || media_w <= 0.0 || media_h <= 0.0 {
            return Self::default();
        }

        let media_aspect = media_w / media_h;
        let container_aspect = container_w / container_h;

        let (width, height) = if media_aspect < container_aspect {
            // Media is taller - fit to height
            (container_h * media_aspect, container_h)
        } else {
            // Media is wider - fit to width
            (container_w, container_w / media_aspect)
        };

        Self {
            width,
            height,
            offset_x: (container_w - width) / 2.0,
            offset_y: (container_h - height) / 2.0,
        }
    }

    /// Overlays may only be rendered when the rectangle has an area.
    pub fn is_ready(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn origin(&self) -> Point2<f64> {
        Point2::new(self.offset_x, self.offset_y)
    }

    pub fn size(&self) -> Vector2<f64> {
        Vector2::new(self.width, self.height)
    }
}

/// Convert content pixel coordinates to normalized coordinates (0.0 to 1.0).
pub fn normalize_coordinates(pixel: Point2<f64>, rect: &ViewportRect) -> Point {
    Point {
        x: pixel.x / rect.width,
        y: pixel.y / rect.height,
    }
}

/// Convert normalized coordinates to content pixel coordinates.
pub fn denormalize_coordinates(point: &Point, rect: &ViewportRect) -> Point2<f64> {
    Point2::new(point.x * rect.width, point.y * rect.height)
}

/// Scale `(width, height)` so it fits within `max_dim` on both axes.
pub fn fit_within(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    let scale = (max_dim as f64 / width as f64).min(max_dim as f64 / height as f64);
    (
        ((width as f64 * scale).round() as u32).max(1),
        ((height as f64 * scale).round() as u32).max(1),
    )
}
