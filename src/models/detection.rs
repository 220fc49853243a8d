// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Detection overlay primitives.
//!
//! A detection batch is homogeneous: every record in it has the kind
//! selected by the active [`DetectType`]. Positional fields of 2D records
//! are normalized to the content rectangle; 3D boxes are expressed in
//! camera-relative metric units.

use super::annotation::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of detection requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DetectType {
    #[default]
    #[serde(rename = "2D bounding boxes")]
    Boxes2D,
    #[serde(rename = "Segmentation masks")]
    Masks,
    #[serde(rename = "Points")]
    Points,
    #[serde(rename = "3D bounding boxes")]
    Boxes3D,
}

impl DetectType {
    pub const ALL: [DetectType; 4] = [
        DetectType::Boxes2D,
        DetectType::Masks,
        DetectType::Points,
        DetectType::Boxes3D,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DetectType::Boxes2D => "2D bounding boxes",
            DetectType::Masks => "Segmentation masks",
            DetectType::Points => "Points",
            DetectType::Boxes3D => "3D bounding boxes",
        }
    }

    /// File-name friendly identifier.
    pub fn slug(self) -> &'static str {
        match self {
            DetectType::Boxes2D => "boxes_2d",
            DetectType::Masks => "masks",
            DetectType::Points => "points",
            DetectType::Boxes3D => "boxes_3d",
        }
    }
}

impl fmt::Display for DetectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Axis-aligned 2D box in normalized coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Box2D {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub label: String,
}

impl Box2D {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Strict containment test, edges excluded.
    pub fn contains(&self, point: &Point) -> bool {
        point.x > self.x
            && point.x < self.x + self.width
            && point.y > self.y
            && point.y < self.y + self.height
    }
}

/// 2D box with a segmentation mask raster.
///
/// `mask` is the service's payload (usually a PNG data URL) kept verbatim;
/// it is decoded only when recolored for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskBox {
    #[serde(flatten)]
    pub bounds: Box2D,
    pub mask: String,
}

/// Single labelled keypoint in normalized coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPoint {
    pub x: f64,
    pub y: f64,
    pub label: String,
}

/// Oriented cuboid: center, full extents and roll-pitch-yaw in radians.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Box3D {
    pub center: [f64; 3],
    pub size: [f64; 3],
    pub roll_pitch_yaw: [f64; 3],
    pub label: String,
}

/// One atomic, homogeneous set of detections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "records", rename_all = "snake_case")]
pub enum DetectionBatch {
    Boxes2D(Vec<Box2D>),
    Masks(Vec<MaskBox>),
    Points(Vec<KeyPoint>),
    Boxes3D(Vec<Box3D>),
}

impl DetectionBatch {
    pub fn detect_type(&self) -> DetectType {
        match self {
            DetectionBatch::Boxes2D(_) => DetectType::Boxes2D,
            DetectionBatch::Masks(_) => DetectType::Masks,
            DetectionBatch::Points(_) => DetectType::Points,
            DetectionBatch::Boxes3D(_) => DetectType::Boxes3D,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DetectionBatch::Boxes2D(boxes) => boxes.len(),
            DetectionBatch::Masks(masks) => masks.len(),
            DetectionBatch::Points(points) => points.len(),
            DetectionBatch::Boxes3D(boxes) => boxes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rectangles that take part in reveal-on-hover, in document order.
    pub fn hover_rects(&self) -> Vec<&Box2D> {
        match self {
            DetectionBatch::Boxes2D(boxes) => boxes.iter().collect(),
            DetectionBatch::Masks(masks) => masks.iter().map(|m| &m.bounds).collect(),
            DetectionBatch::Points(_) | DetectionBatch::Boxes3D(_) => Vec::new(),
        }
    }

    /// Index of the smallest box that contains the point.
    pub fn hovered_index(&self, point: &Point) -> Option<usize> {
        self.hover_rects()
            .into_iter()
            .enumerate()
            .filter(|(_, rect)| rect.contains(point))
            .min_by(|(_, a), (_, b)| a.area().total_cmp(&b.area()))
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(x: f64, y: f64, w: f64, h: f64) -> Box2D {
        Box2D {
            x,
            y,
            width: w,
            height: h,
            label: String::new(),
        }
    }

    #[test]
    fn test_hovered_index_prefers_smallest_box() {
        let batch = DetectionBatch::Boxes2D(vec![
            boxed(0.0, 0.0, 1.0, 1.0),
            boxed(0.4, 0.4, 0.2, 0.2),
            boxed(0.8, 0.8, 0.1, 0.1),
        ]);
        assert_eq!(batch.hovered_index(&Point::new(0.5, 0.5)), Some(1));
        assert_eq!(batch.hovered_index(&Point::new(0.2, 0.2)), Some(0));
        assert_eq!(batch.hovered_index(&Point::new(1.5, 0.5)), None);
    }

    #[test]
    fn test_points_never_hover() {
        let batch = DetectionBatch::Points(vec![KeyPoint {
            x: 0.5,
            y: 0.5,
            label: "p".to_string(),
        }]);
        assert_eq!(batch.hovered_index(&Point::new(0.5, 0.5)), None);
    }

    #[test]
    fn test_detect_type_serde_names() {
        let json = serde_json::to_string(&DetectType::Masks).unwrap();
        assert_eq!(json, "\"Segmentation masks\"");
        let parsed: DetectType = serde_json::from_str("\"3D bounding boxes\"").unwrap();
        assert_eq!(parsed, DetectType::Boxes3D);
    }
}
