// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data models for strokes, detections and overlay documents.

pub mod annotation;
pub mod detection;
pub mod document;
