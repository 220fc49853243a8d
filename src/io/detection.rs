// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Detection response parsing and normalization.
//!
//! Raw service output is stripped of an optional Markdown code fence,
//! parsed as JSON and converted into a [`DetectionBatch`] of the requested
//! type. Validation is all-or-nothing: one malformed record rejects the
//! whole batch.

use crate::error::DetectionError;
use crate::models::detection::{Box2D, Box3D, DetectType, DetectionBatch, KeyPoint, MaskBox};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Service coordinates are integers scaled to 0..1000.
const COORDINATE_SCALE: f64 = 1000.0;

#[derive(Deserialize)]
struct RawBox2D {
    box_2d: [f64; 4],
    label: String,
}

#[derive(Deserialize)]
struct RawMask {
    box_2d: [f64; 4],
    label: String,
    mask: String,
}

#[derive(Deserialize)]
struct RawPoint {
    point: [f64; 2],
    label: String,
}

#[derive(Deserialize)]
struct RawBox3D {
    box_3d: [f64; 9],
    label: String,
}

/// `[ymin, xmin, ymax, xmax]` in 0..1000 to a normalized box.
fn box_from_corners(corners: [f64; 4], label: String) -> Box2D {
    let [ymin, xmin, ymax, xmax] = corners;
    Box2D {
        x: xmin / COORDINATE_SCALE,
        y: ymin / COORDINATE_SCALE,
        width: (xmax - xmin) / COORDINATE_SCALE,
        height: (ymax - ymin) / COORDINATE_SCALE,
        label,
    }
}

impl From<RawBox2D> for Box2D {
    fn from(raw: RawBox2D) -> Self {
        box_from_corners(raw.box_2d, raw.label)
    }
}

impl From<RawMask> for MaskBox {
    fn from(raw: RawMask) -> Self {
        MaskBox {
            bounds: box_from_corners(raw.box_2d, raw.label),
            mask: raw.mask,
        }
    }
}

impl From<RawPoint> for KeyPoint {
    fn from(raw: RawPoint) -> Self {
        let [y, x] = raw.point;
        KeyPoint {
            x: x / COORDINATE_SCALE,
            y: y / COORDINATE_SCALE,
            label: raw.label,
        }
    }
}

impl From<RawBox3D> for Box3D {
    fn from(raw: RawBox3D) -> Self {
        let b = raw.box_3d;
        Box3D {
            center: [b[0], b[1], b[2]],
            size: [b[3], b[4], b[5]],
            roll_pitch_yaw: [b[6].to_radians(), b[7].to_radians(), b[8].to_radians()],
            label: raw.label,
        }
    }
}

/// Remove one surrounding Markdown code fence (with optional language tag).
///
/// Text that is not fenced, or whose fence is empty, is returned trimmed.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"));
    let Some(inner) = inner else {
        return trimmed;
    };
    let body = inner
        .trim_start_matches(|c: char| c.is_alphanumeric() || c == '_')
        .trim();
    if body.is_empty() {
        trimmed
    } else {
        body
    }
}

/// Convert every element or reject the batch at the first failure.
fn convert_all<R, T>(items: &[Value]) -> Result<Vec<T>, DetectionError>
where
    R: DeserializeOwned,
    T: From<R>,
{
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            R::deserialize(item)
                .map(T::from)
                .map_err(|err| DetectionError::Shape {
                    index: Some(index),
                    reason: err.to_string(),
                })
        })
        .collect()
}

/// Validate a parsed response and convert it to a batch of `detect_type`.
pub fn normalize(value: &Value, detect_type: DetectType) -> Result<DetectionBatch, DetectionError> {
    let items = value.as_array().ok_or_else(|| DetectionError::Shape {
        index: None,
        reason: format!("expected a JSON array for {detect_type}"),
    })?;

    let batch = match detect_type {
        DetectType::Boxes2D => DetectionBatch::Boxes2D(convert_all::<RawBox2D, _>(items)?),
        DetectType::Points => DetectionBatch::Points(convert_all::<RawPoint, _>(items)?),
        DetectType::Boxes3D => DetectionBatch::Boxes3D(convert_all::<RawBox3D, _>(items)?),
        DetectType::Masks => {
            let mut masks: Vec<MaskBox> = convert_all::<RawMask, _>(items)?;
            // Largest first, so smaller masks are painted on top.
            masks.sort_by(|a, b| b.bounds.area().total_cmp(&a.bounds.area()));
            DetectionBatch::Masks(masks)
        }
    };
    Ok(batch)
}

/// Parse raw service text into a batch of `detect_type`.
pub fn parse_response(text: &str, detect_type: DetectType) -> Result<DetectionBatch, DetectionError> {
    let body = strip_code_fence(text);
    let value: Value =
        serde_json::from_str(body).map_err(|err| DetectionError::parse(err.to_string(), body))?;
    let batch = normalize(&value, detect_type)?;
    log::info!("Parsed {} {} from response", batch.len(), detect_type);
    Ok(batch)
}
