// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Painting of strokes and detection overlays on the canvas.
//!
//! Everything is laid out in unzoomed content pixels and mapped through the
//! current transform, so overlays pan and zoom with the media.

use crate::models::annotation::{Point, Stroke};
use crate::models::detection::{Box2D, Box3D, DetectionBatch, KeyPoint, MaskBox};
use crate::ui::canvas::CanvasFrame;
use crate::util::freehand::{stroke_outline, OutlineOptions};
use crate::util::geometry::denormalize_coordinates;
use crate::util::projection::{project_box, PinholeCamera, ProjectedEdge};
use crate::util::transform::TransformState;
use nalgebra::{Point2, Vector2};

/// Accent used for boxes, points, wireframes and label tabs.
pub const ACCENT: egui::Color32 = egui::Color32::from_rgb(26, 115, 232);

const OUTLINE_WIDTH: f32 = 2.0;
const LABEL_FONT_SIZE: f32 = 12.0;
const POINT_RADIUS: f32 = 7.0;
const BEHIND_CAMERA_FADE: f32 = 0.4;

/// Per-frame inputs for detection overlays.
pub struct OverlayContext<'a> {
    pub transform: &'a TransformState,
    /// Pointer position when reveal-on-hover is tracking it.
    pub hover: Option<Point>,
    pub fov_degrees: f64,
    pub mask_opacity: f32,
    /// Mask textures, aligned with the mask batch.
    pub mask_textures: &'a [Option<egui::TextureHandle>],
}

fn color32(rgb: [u8; 3]) -> egui::Color32 {
    egui::Color32::from_rgb(rgb[0], rgb[1], rgb[2])
}

/// Fill every stroke outline in its color.
pub fn paint_strokes(
    frame: &CanvasFrame,
    transform: &TransformState,
    strokes: &[Stroke],
    options: &OutlineOptions,
) {
    for stroke in strokes {
        let content: Vec<Point2<f64>> = stroke
            .points
            .iter()
            .map(|p| denormalize_coordinates(p, &frame.viewport))
            .collect();
        let outline = stroke_outline(&content, options);
        if outline.is_empty() {
            continue;
        }
        let container = outline.map(|v| transform.content_to_screen(v, &frame.viewport));

        let color = color32(stroke.color);
        let mut mesh = egui::Mesh::default();
        for triangle in &container.triangles {
            let base = mesh.vertices.len() as u32;
            for vertex in triangle {
                mesh.colored_vertex(frame.to_screen(*vertex), color);
            }
            mesh.add_triangle(base, base + 1, base + 2);
        }
        frame.painter.add(egui::Shape::mesh(mesh));
    }
}

/// Paint the batch's overlays.
pub fn paint_detections(frame: &CanvasFrame, batch: &DetectionBatch, ctx: &OverlayContext<'_>) {
    // While hovering, only the smallest box under the pointer stays visible.
    let revealed = ctx.hover.map(|point| batch.hovered_index(&point));
    let visible = |index: usize| match revealed {
        Some(hit) => hit == Some(index),
        None => true,
    };

    match batch {
        DetectionBatch::Boxes2D(boxes) => {
            for (index, bbox) in boxes.iter().enumerate() {
                if visible(index) {
                    paint_box(frame, ctx.transform, bbox);
                }
            }
        }
        DetectionBatch::Masks(masks) => {
            for (index, mask) in masks.iter().enumerate() {
                if visible(index) {
                    let texture = ctx.mask_textures.get(index).and_then(Option::as_ref);
                    paint_mask(frame, ctx, mask, texture);
                }
            }
        }
        DetectionBatch::Points(points) => {
            for point in points {
                paint_point(frame, ctx.transform, point);
            }
        }
        DetectionBatch::Boxes3D(boxes) => {
            let camera =
                PinholeCamera::new(frame.viewport.width, frame.viewport.height, ctx.fov_degrees);
            for bbox in boxes {
                paint_wireframe(frame, ctx.transform, &camera, bbox);
            }
        }
    }
}

fn box_rect(frame: &CanvasFrame, transform: &TransformState, bbox: &Box2D) -> egui::Rect {
    let min = Point::new(bbox.x, bbox.y);
    let max = Point::new(bbox.x + bbox.width, bbox.y + bbox.height);
    egui::Rect::from_min_max(
        frame.normalized_to_screen(transform, &min),
        frame.normalized_to_screen(transform, &max),
    )
}

/// Label tab anchored at `anchor` using `align` for the tab's own corner.
fn paint_label(frame: &CanvasFrame, anchor: egui::Pos2, align: egui::Align2, text: &str) {
    let galley = frame.painter.layout_no_wrap(
        text.to_string(),
        egui::FontId::proportional(LABEL_FONT_SIZE),
        egui::Color32::WHITE,
    );
    let padding = egui::vec2(4.0, 2.0);
    let tab = align.anchor_size(anchor, galley.size() + padding * 2.0);
    frame.painter.rect_filled(tab, 3.0, ACCENT);
    frame
        .painter
        .galley(tab.min + padding, galley, egui::Color32::WHITE);
}

fn paint_box(frame: &CanvasFrame, transform: &TransformState, bbox: &Box2D) {
    let rect = box_rect(frame, transform, bbox);
    frame
        .painter
        .rect_stroke(rect, 0.0, egui::Stroke::new(OUTLINE_WIDTH, ACCENT));
    paint_label(frame, rect.right_top(), egui::Align2::RIGHT_TOP, &bbox.label);
}

fn paint_mask(
    frame: &CanvasFrame,
    ctx: &OverlayContext<'_>,
    mask: &MaskBox,
    texture: Option<&egui::TextureHandle>,
) {
    let rect = box_rect(frame, ctx.transform, &mask.bounds);
    if let Some(texture) = texture {
        frame.painter.image(
            texture.id(),
            rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE.gamma_multiply(ctx.mask_opacity),
        );
    }
    frame
        .painter
        .rect_stroke(rect, 0.0, egui::Stroke::new(OUTLINE_WIDTH, ACCENT));
    paint_label(frame, rect.right_top(), egui::Align2::RIGHT_BOTTOM, &mask.bounds.label);
}

fn paint_point(frame: &CanvasFrame, transform: &TransformState, point: &KeyPoint) {
    let center = frame.normalized_to_screen(transform, &Point::new(point.x, point.y));
    frame.painter.circle(
        center,
        POINT_RADIUS,
        ACCENT,
        egui::Stroke::new(OUTLINE_WIDTH, egui::Color32::WHITE),
    );
    let anchor = center - egui::vec2(0.0, POINT_RADIUS + 6.0);
    paint_label(frame, anchor, egui::Align2::CENTER_BOTTOM, &point.label);
}

/// A bar of `OUTLINE_WIDTH` content pixels laid from the edge start along
/// its angle, so it scales with zoom like the rest of the content.
fn paint_bar(
    frame: &CanvasFrame,
    transform: &TransformState,
    edge: &ProjectedEdge,
    color: egui::Color32,
) {
    let along = Vector2::new(edge.angle.cos(), edge.angle.sin());
    let across = Vector2::new(-along.y, along.x) * (OUTLINE_WIDTH as f64 / 2.0);
    let end = edge.start + along * edge.length;
    let corners = [
        edge.start - across,
        end - across,
        end + across,
        edge.start + across,
    ];
    let points = corners
        .iter()
        .map(|corner| frame.content_to_screen(transform, *corner))
        .collect();
    frame
        .painter
        .add(egui::Shape::convex_polygon(points, color, egui::Stroke::NONE));
}

/// Boxes reaching behind the camera are still drawn, but faded.
fn wireframe_color(behind_camera: bool) -> egui::Color32 {
    if behind_camera {
        ACCENT.gamma_multiply(BEHIND_CAMERA_FADE)
    } else {
        ACCENT
    }
}

fn paint_wireframe(
    frame: &CanvasFrame,
    transform: &TransformState,
    camera: &PinholeCamera,
    bbox: &Box3D,
) {
    let projection = project_box(bbox, camera);
    let color = wireframe_color(projection.behind_camera);
    for edge in projection.edges.iter().filter(|edge| edge.is_finite()) {
        paint_bar(frame, transform, edge, color);
    }

    let anchor = projection.label_anchor;
    if anchor.x.is_finite() && anchor.y.is_finite() {
        let center = frame.content_to_screen(transform, anchor);
        paint_label(frame, center, egui::Align2::CENTER_CENTER, &bbox.label);
    }
}
