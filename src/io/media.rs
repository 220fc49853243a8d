// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media file loading and frame preparation.
//!
//! This module loads images for display and turns the displayed frame,
//! with the user's strokes baked in, into the image payload of a
//! detection request.

use crate::models::annotation::Stroke;
use crate::util::freehand::{stroke_outline, OutlineOptions, Triangle};
use crate::util::geometry::fit_within;
use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use image::{imageops::FilterType, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point as ImagePoint;
use nalgebra::Point2;
use std::io::Cursor;
use std::path::Path;

/// A decoded image ready for texture upload.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: RgbaImage,
}

/// Load an image file as RGBA.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let image = image::open(path)
        .with_context(|| format!("Failed to decode {}", path.display()))?
        .to_rgba8();
    Ok(LoadedImage {
        width: image.width(),
        height: image.height(),
        pixels: image,
    })
}

/// Triangle vertices snapped to the pixel grid, or `None` when snapping
/// collapses two of them.
fn pixel_triangle(triangle: &Triangle) -> Option<[ImagePoint<i32>; 3]> {
    let snapped = triangle.map(|v| ImagePoint::new(v.x.round() as i32, v.y.round() as i32));
    let [a, b, c] = snapped;
    (a != b && b != c && a != c).then_some(snapped)
}

/// Paint strokes (normalized coordinates) onto an image in place.
pub fn bake_strokes(image: &mut RgbaImage, strokes: &[Stroke], options: &OutlineOptions) {
    let (width, height) = (image.width() as f64, image.height() as f64);
    for stroke in strokes {
        let pixels: Vec<Point2<f64>> = stroke
            .points
            .iter()
            .map(|p| Point2::new(p.x * width, p.y * height))
            .collect();
        let outline = stroke_outline(&pixels, options);
        let color = Rgba([stroke.color[0], stroke.color[1], stroke.color[2], 255]);
        for polygon in outline.triangles.iter().filter_map(pixel_triangle) {
            draw_polygon_mut(image, &polygon, color);
        }
    }
}

/// Resize the frame to fit `max_dim` and bake the strokes into it.
pub fn prepare_frame(
    frame: &RgbaImage,
    strokes: &[Stroke],
    max_dim: u32,
    options: &OutlineOptions,
) -> RgbaImage {
    let (width, height) = fit_within(frame.width(), frame.height(), max_dim);
    let mut prepared = if (width, height) == frame.dimensions() {
        frame.clone()
    } else {
        image::imageops::resize(frame, width, height, FilterType::Triangle)
    };
    bake_strokes(&mut prepared, strokes, options);
    prepared
}

/// Encode an image as PNG and return it base64-encoded.
pub fn encode_png_base64(image: &RgbaImage) -> Result<String> {
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .context("Failed to encode frame as PNG")?;
    Ok(general_purpose::STANDARD.encode(bytes.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::Point;

    #[test]
    fn test_prepare_frame_downscales_to_fit() {
        let frame = RgbaImage::from_pixel(1280, 720, Rgba([10, 10, 10, 255]));
        let prepared = prepare_frame(&frame, &[], 640, &OutlineOptions::default());
        assert_eq!(prepared.dimensions(), (640, 360));
    }

    #[test]
    fn test_bake_strokes_paints_along_path() {
        let mut image = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]));
        let stroke = Stroke {
            points: vec![Point::new(0.1, 0.5), Point::new(0.9, 0.5)],
            color: [255, 0, 0],
        };
        bake_strokes(&mut image, &[stroke], &OutlineOptions::default());

        assert_eq!(image.get_pixel(50, 50).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(50, 52).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(50, 10).0, [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(2, 50).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_bake_strokes_clips_to_image() {
        let mut image = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        let stroke = Stroke {
            points: vec![Point::new(-0.5, 0.5), Point::new(1.5, 0.5)],
            color: [0, 0, 255],
        };
        bake_strokes(&mut image, &[stroke], &OutlineOptions::default());

        assert_eq!(image.get_pixel(0, 10).0, [0, 0, 255, 255]);
        assert_eq!(image.get_pixel(19, 10).0, [0, 0, 255, 255]);
        assert_eq!(image.get_pixel(10, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_pixel_triangle_skips_collapsed_vertices() {
        let sliver = [
            Point2::new(1.1, 1.1),
            Point2::new(0.9, 0.9),
            Point2::new(5.0, 1.0),
        ];
        assert!(pixel_triangle(&sliver).is_none());

        let triangle = [
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(0.0, 4.0),
        ];
        assert!(pixel_triangle(&triangle).is_some());
    }

    #[test]
    fn test_encode_png_base64_roundtrip() {
        let image = RgbaImage::from_pixel(3, 2, Rgba([9, 8, 7, 255]));
        let encoded = encode_png_base64(&image).unwrap();
        let bytes = general_purpose::STANDARD.decode(encoded).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
    }
}
