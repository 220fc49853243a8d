// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Spatia - Spatial annotation viewer
//!
//! A cross-platform desktop application that overlays machine-generated
//! detections (2D boxes, segmentation masks, points and oriented 3D boxes)
//! on an image and lets the user pan, zoom and freehand-annotate it.

mod app;
mod config;
mod error;
mod io;
mod models;
mod ui;
mod util;

use anyhow::Result;
use app::SpatiaApp;
use config::Settings;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let settings = Settings::load_or_default();

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Spatia - Spatial annotation viewer"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Spatia",
        options,
        Box::new(|_cc| Ok(Box::new(SpatiaApp::new(settings)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
