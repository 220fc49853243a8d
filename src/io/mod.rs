// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for media, detection responses and overlay documents.

pub mod detection;
pub mod media;
pub mod serialization;
pub mod service;
