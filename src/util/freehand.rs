// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Outline generation for freehand strokes.
//!
//! A stroke's samples become a closed outline polygon: the centerline is
//! offset by the stroke radius on both sides and capped with half circles.
//! The same geometry is also emitted as triangles so it can be filled as a
//! mesh on screen or rasterized into an image.

use nalgebra::{Point2, Vector2};
use std::f64::consts::PI;

/// Segments used for a full circle (dots and corner joins).
const CIRCLE_SEGMENTS: usize = 16;

/// Segments used for an end cap.
const CAP_SEGMENTS: usize = 8;

/// Samples closer than this are treated as duplicates.
const MIN_SAMPLE_DISTANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlineOptions {
    /// Stroke diameter in pixels at full pressure.
    pub size: f64,
    /// How much pressure narrows the stroke; 0 keeps a constant width.
    pub thinning: f64,
    /// Synthetic pressure applied to every sample.
    pub pressure: f64,
}

impl Default for OutlineOptions {
    fn default() -> Self {
        Self {
            size: 8.0,
            thinning: 0.0,
            pressure: 0.5,
        }
    }
}

impl OutlineOptions {
    pub fn with_size(size: f64) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn radius(&self) -> f64 {
        self.size * (0.5 - self.thinning * (0.5 - self.pressure))
    }
}

pub type Triangle = [Point2<f64>; 3];

/// Filled outline of one stroke.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrokeOutline {
    /// Closed outline, first point not repeated.
    pub polygon: Vec<Point2<f64>>,
    pub triangles: Vec<Triangle>,
}

impl StrokeOutline {
    pub fn is_empty(&self) -> bool {
        self.polygon.is_empty()
    }

    /// Map every vertex, e.g. from content pixels to screen pixels.
    pub fn map(&self, f: impl Fn(Point2<f64>) -> Point2<f64>) -> Self {
        Self {
            polygon: self.polygon.iter().map(|p| f(*p)).collect(),
            triangles: self.triangles.iter().map(|t| t.map(&f)).collect(),
        }
    }
}

fn perpendicular(v: Vector2<f64>) -> Vector2<f64> {
    Vector2::new(-v.y, v.x)
}

fn direction(angle: f64) -> Vector2<f64> {
    Vector2::new(angle.cos(), angle.sin())
}

/// Arc around `center` from `start_angle` sweeping `sweep` radians, inclusive.
fn arc(center: Point2<f64>, radius: f64, start_angle: f64, sweep: f64, segments: usize) -> Vec<Point2<f64>> {
    (0..=segments)
        .map(|i| center + direction(start_angle + sweep * i as f64 / segments as f64) * radius)
        .collect()
}

fn fan(center: Point2<f64>, rim: &[Point2<f64>], triangles: &mut Vec<Triangle>) {
    for pair in rim.windows(2) {
        triangles.push([center, pair[0], pair[1]]);
    }
}

fn dedup_samples(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut samples: Vec<Point2<f64>> = Vec::with_capacity(points.len());
    for point in points {
        match samples.last() {
            Some(last) if (point - last).norm() < MIN_SAMPLE_DISTANCE => {}
            _ => samples.push(*point),
        }
    }
    samples
}

/// Build the outline for a stroke whose samples are in pixels.
pub fn stroke_outline(points: &[Point2<f64>], options: &OutlineOptions) -> StrokeOutline {
    let samples = dedup_samples(points);
    let radius = options.radius();
    let mut outline = StrokeOutline::default();

    if samples.is_empty() || radius <= 0.0 {
        return outline;
    }

    if samples.len() == 1 {
        let rim = arc(samples[0], radius, 0.0, 2.0 * PI, CIRCLE_SEGMENTS);
        fan(samples[0], &rim, &mut outline.triangles);
        outline.polygon = rim[..CIRCLE_SEGMENTS].to_vec();
        return outline;
    }

    let segments: Vec<Vector2<f64>> = samples
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).normalize())
        .collect();

    // Tangent at each sample: average of the adjoining segment directions.
    let tangents: Vec<Vector2<f64>> = (0..samples.len())
        .map(|i| {
            let before = if i > 0 { segments[i - 1] } else { segments[0] };
            let after = segments.get(i).copied().unwrap_or(before);
            let sum = before + after;
            if sum.norm() < 1e-9 {
                before
            } else {
                sum.normalize()
            }
        })
        .collect();

    let left: Vec<Point2<f64>> = samples
        .iter()
        .zip(&tangents)
        .map(|(p, t)| p + perpendicular(*t) * radius)
        .collect();
    let right: Vec<Point2<f64>> = samples
        .iter()
        .zip(&tangents)
        .map(|(p, t)| p - perpendicular(*t) * radius)
        .collect();

    for i in 0..samples.len() - 1 {
        outline.triangles.push([left[i], right[i], left[i + 1]]);
        outline.triangles.push([right[i], right[i + 1], left[i + 1]]);
    }

    // Round joins where the path turns back on itself.
    for i in 1..samples.len() - 1 {
        if segments[i - 1].dot(&segments[i]) < 0.0 {
            let rim = arc(samples[i], radius, 0.0, 2.0 * PI, CIRCLE_SEGMENTS);
            fan(samples[i], &rim, &mut outline.triangles);
        }
    }

    let first = samples[0];
    let last = samples[samples.len() - 1];
    let start_angle = perpendicular(tangents[0]).y.atan2(perpendicular(tangents[0]).x);
    let end_normal = -perpendicular(tangents[tangents.len() - 1]);
    let end_angle = end_normal.y.atan2(end_normal.x);

    // Start cap sweeps from the left side, around the back, to the right side.
    let start_cap = arc(first, radius, start_angle, PI, CAP_SEGMENTS);
    // End cap sweeps from the right side, around the front, to the left side.
    let end_cap = arc(last, radius, end_angle, PI, CAP_SEGMENTS);
    fan(first, &start_cap, &mut outline.triangles);
    fan(last, &end_cap, &mut outline.triangles);

    outline.polygon.extend(right.iter().copied());
    outline.polygon.extend(end_cap[1..CAP_SEGMENTS].iter().copied());
    outline.polygon.extend(left.iter().rev().copied());
    outline.polygon.extend(start_cap[1..CAP_SEGMENTS].iter().copied());
    outline
}
