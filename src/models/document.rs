// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Overlay document management.
//!
//! This module defines the serializable snapshot of a session: the media
//! it refers to, the strokes drawn over it and the current detections.

use super::annotation::{Stroke, StrokeSet};
use super::detection::{DetectType, DetectionBatch};
use serde::{Deserialize, Serialize};

/// Complete overlay data for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayDocument {
    pub media_file: String,
    pub frame_width: u32,
    pub frame_height: u32,
    pub detect_type: DetectType,
    pub fov_degrees: f64,
    #[serde(default)]
    pub strokes: Vec<Stroke>,
    #[serde(default)]
    pub detections: Option<DetectionBatch>,
}

impl OverlayDocument {
    /// Create an empty document for the given media file and dimensions.
    pub fn new(media_file: String, frame_width: u32, frame_height: u32) -> Self {
        Self {
            media_file,
            frame_width,
            frame_height,
            detect_type: DetectType::default(),
            fov_degrees: 60.0,
            strokes: Vec::new(),
            detections: None,
        }
    }
}

/// Mutable overlay state of a session: strokes plus the current batch.
///
/// Detections are replaced wholesale; strokes persist until cleared.
#[derive(Debug, Clone, Default)]
pub struct OverlayState {
    pub strokes: StrokeSet,
    detections: Option<DetectionBatch>,
}

impl OverlayState {
    pub fn detections(&self) -> Option<&DetectionBatch> {
        self.detections.as_ref()
    }

    /// Drop every detection (request start, request failure, media change).
    pub fn clear_detections(&mut self) {
        self.detections = None;
    }

    /// Install a freshly normalized batch.
    pub fn replace_detections(&mut self, batch: DetectionBatch) {
        self.detections = Some(batch);
    }

    /// Reset the whole overlay for a new session.
    pub fn reset(&mut self) {
        self.strokes.clear();
        self.detections = None;
    }
}
