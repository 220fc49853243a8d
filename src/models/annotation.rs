// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Freehand annotation data structures.
//!
//! This module defines normalized points and the strokes a user draws
//! over the media. Strokes are stored relative to the fitted content
//! rectangle so they follow the image through pan, zoom and resizes.

use serde::{Deserialize, Serialize};

/// An RGB color triple.
pub type Rgb = [u8; 3];

/// A 2D point with normalized coordinates (0.0 to 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One continuous freehand path captured between pointer-down and pointer-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub points: Vec<Point>,
    pub color: Rgb,
}

impl Stroke {
    /// Create a stroke starting at the given point.
    pub fn new(start: Point, color: Rgb) -> Self {
        Self {
            points: vec![start],
            color,
        }
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }
}

/// Ordered list of strokes for the session.
///
/// At most the last stroke is open. Points are only appended while it is
/// open; once finished, a stroke is never mutated again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrokeSet {
    strokes: Vec<Stroke>,
    open: bool,
}

impl StrokeSet {
    /// Build a set of already finished strokes (e.g. from an imported file).
    pub fn from_strokes(strokes: Vec<Stroke>) -> Self {
        Self {
            strokes,
            open: false,
        }
    }

    /// Open a new stroke. Any stroke still open is finished first.
    pub fn begin(&mut self, start: Point, color: Rgb) {
        self.finish();
        self.strokes.push(Stroke::new(start, color));
        self.open = true;
    }

    /// Append a sample to the open stroke. Returns false when no stroke is open.
    pub fn extend(&mut self, point: Point) -> bool {
        if !self.open {
            return false;
        }
        match self.strokes.last_mut() {
            Some(stroke) => {
                stroke.points.push(point);
                true
            }
            None => false,
        }
    }

    /// Close the open stroke, if any.
    pub fn finish(&mut self) {
        if self.open {
            if let Some(stroke) = self.strokes.last() {
                log::debug!("Finished stroke with {} points", stroke.point_count());
            }
        }
        self.open = false;
    }

    pub fn is_drawing(&self) -> bool {
        self.open
    }

    /// Remove every stroke.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.open = false;
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }
}
