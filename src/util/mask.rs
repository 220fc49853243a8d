// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Segmentation mask decoding and recoloring.

use crate::models::annotation::Rgb;
use crate::models::detection::DetectionBatch;
use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use image::{DynamicImage, RgbaImage};

/// Opacity used when compositing a recolored mask over its box.
pub const MASK_OPACITY: f32 = 0.55;

/// Mask colors, cycled by mask index.
pub const SEGMENTATION_COLORS: [Rgb; 10] = [
    [0xE6, 0x19, 0x4B],
    [0x3C, 0x89, 0xD0],
    [0x3C, 0xB4, 0x4B],
    [0xFF, 0xE1, 0x19],
    [0x91, 0x1E, 0xB4],
    [0x42, 0xD4, 0xF4],
    [0xF5, 0x82, 0x31],
    [0xF0, 0x32, 0xE6],
    [0xBF, 0xEF, 0x45],
    [0x46, 0x99, 0x90],
];

pub fn segmentation_color(index: usize) -> Rgb {
    SEGMENTATION_COLORS[index % SEGMENTATION_COLORS.len()]
}

/// Decode a mask payload: a `data:image/...;base64,` URL or bare base64.
pub fn decode_mask(payload: &str) -> Result<DynamicImage> {
    let encoded = match payload.split_once(',') {
        Some((header, data)) if header.starts_with("data:") => data,
        _ => payload,
    };
    let bytes = general_purpose::STANDARD
        .decode(encoded.trim())
        .context("mask payload is not valid base64")?;
    image::load_from_memory(&bytes).context("mask payload is not a decodable image")
}

/// Paint every pixel with `color`, taking alpha from the source red channel.
///
/// Grayscale sources expand to equal RGB, so their luminance becomes alpha.
pub fn recolor_mask(mask: &DynamicImage, color: Rgb) -> RgbaImage {
    let mut pixels = mask.to_rgba8();
    for pixel in pixels.pixels_mut() {
        let alpha = pixel[0];
        pixel.0 = [color[0], color[1], color[2], alpha];
    }
    pixels
}

/// Decode and recolor in one step.
pub fn render_mask(payload: &str, index: usize) -> Result<RgbaImage> {
    let mask = decode_mask(payload)?;
    Ok(recolor_mask(&mask, segmentation_color(index)))
}

/// Render every mask of a batch, aligned with its records.
///
/// A payload that fails to decode yields `None`; its box and label are
/// still drawn. Non-mask batches yield an empty list.
pub fn render_batch_masks(batch: &DetectionBatch) -> Vec<Option<RgbaImage>> {
    let DetectionBatch::Masks(masks) = batch else {
        return Vec::new();
    };
    masks
        .iter()
        .enumerate()
        .map(|(index, mask)| match render_mask(&mask.mask, index) {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("Skipping mask '{}': {:#}", mask.bounds.label, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageFormat, Luma};
    use std::io::Cursor;

    fn png_data_url(image: &GrayImage) -> String {
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(bytes.into_inner())
        )
    }

    #[test]
    fn test_recolor_moves_red_into_alpha() {
        let mut gray = GrayImage::new(3, 2);
        gray.put_pixel(0, 0, Luma([255]));
        gray.put_pixel(1, 0, Luma([128]));

        let colored = recolor_mask(&DynamicImage::ImageLuma8(gray), [10, 20, 30]);
        assert_eq!(colored.dimensions(), (3, 2));
        assert_eq!(colored.get_pixel(0, 0).0, [10, 20, 30, 255]);
        assert_eq!(colored.get_pixel(1, 0).0, [10, 20, 30, 128]);
        assert_eq!(colored.get_pixel(2, 1).0, [10, 20, 30, 0]);
    }

    #[test]
    fn test_decode_data_url_and_bare_base64() {
        let mut gray = GrayImage::new(4, 4);
        gray.put_pixel(2, 2, Luma([200]));
        let url = png_data_url(&gray);

        let from_url = render_mask(&url, 0).unwrap();
        assert_eq!(from_url.get_pixel(2, 2).0, [0xE6, 0x19, 0x4B, 200]);

        let bare = url.split_once(',').unwrap().1;
        let from_bare = render_mask(bare, 11).unwrap();
        assert_eq!(from_bare.get_pixel(2, 2).0, [0x3C, 0x89, 0xD0, 200]);
    }

    #[test]
    fn test_batch_masks_keep_alignment() {
        use crate::models::detection::{Box2D, MaskBox};

        let record = |mask: String| MaskBox {
            bounds: Box2D {
                x: 0.0,
                y: 0.0,
                width: 0.5,
                height: 0.5,
                label: "m".to_string(),
            },
            mask,
        };
        let batch = DetectionBatch::Masks(vec![
            record("not base64 at all!".to_string()),
            record(png_data_url(&GrayImage::new(2, 2))),
        ]);

        let rendered = render_batch_masks(&batch);
        assert_eq!(rendered.len(), 2);
        assert!(rendered[0].is_none());
        assert_eq!(rendered[1].as_ref().unwrap().get_pixel(0, 0).0, [0x3C, 0x89, 0xD0, 0]);
        assert!(render_batch_masks(&DetectionBatch::Points(Vec::new())).is_empty());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_mask("data:image/png;base64,@@@").is_err());
        assert!(decode_mask("bm90IGFuIGltYWdl").is_err());
    }
}
