// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometry, projection and raster helpers.

pub mod freehand;
pub mod geometry;
pub mod mask;
pub mod projection;
pub mod transform;
