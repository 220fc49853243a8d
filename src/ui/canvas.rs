// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for media display and freehand annotation.
//!
//! This module fits the media into the central panel, translates egui
//! pointer input into [`PointerEvent`]s in container pixels and paints the
//! media texture under the current zoom/pan.

use crate::models::annotation::Point;
use crate::ui::gesture::{Gesture, PointerEvent};
use crate::util::geometry::ViewportRect;
use crate::util::transform::TransformState;
use nalgebra::Point2;

/// Pointer state carried between frames to synthesize enter/leave/move.
#[derive(Debug, Default)]
pub struct PointerTracker {
    inside: bool,
    last_pos: Option<egui::Pos2>,
}

impl PointerTracker {
    pub fn is_inside(&self) -> bool {
        self.inside
    }
}

/// The canvas area allocated for this frame.
pub struct CanvasFrame {
    pub painter: egui::Painter,
    /// Top-left of the container in screen space.
    pub origin: egui::Pos2,
    pub viewport: ViewportRect,
    pub events: Vec<PointerEvent>,
}

impl CanvasFrame {
    /// Container pixels to egui screen space.
    pub fn to_screen(&self, container: Point2<f64>) -> egui::Pos2 {
        self.origin + egui::vec2(container.x as f32, container.y as f32)
    }

    /// Unzoomed content pixels to egui screen space.
    pub fn content_to_screen(&self, transform: &TransformState, content: Point2<f64>) -> egui::Pos2 {
        self.to_screen(transform.content_to_screen(content, &self.viewport))
    }

    /// Normalized content coordinates to egui screen space.
    pub fn normalized_to_screen(&self, transform: &TransformState, point: &Point) -> egui::Pos2 {
        match transform.normalized_to_screen(point, &self.viewport) {
            Some(container) => self.to_screen(container),
            None => self.origin,
        }
    }

    /// Screen rectangle covering the whole media under the current transform.
    pub fn media_rect(&self, transform: &TransformState) -> egui::Rect {
        egui::Rect::from_min_max(
            self.content_to_screen(transform, Point2::origin()),
            self.content_to_screen(
                transform,
                Point2::new(self.viewport.width, self.viewport.height),
            ),
        )
    }

    /// Paint the media texture.
    pub fn paint_media(&self, texture: &egui::TextureHandle, transform: &TransformState) {
        self.painter.image(
            texture.id(),
            self.media_rect(transform),
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );
    }
}

/// Allocate the canvas, fit the media and collect pointer input.
pub fn begin(
    ui: &mut egui::Ui,
    tracker: &mut PointerTracker,
    media_size: Option<(u32, u32)>,
) -> CanvasFrame {
    // Set background color
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let available_size = ui.available_size();
    let (rect, _response) = ui.allocate_exact_size(available_size, egui::Sense::click_and_drag());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, egui::Color32::from_gray(40));

    let viewport = match media_size {
        Some(size) => ViewportRect::fit((rect.width() as f64, rect.height() as f64), size),
        None => ViewportRect::default(),
    };

    let events = collect_events(ui, rect, tracker);

    CanvasFrame {
        painter,
        origin: rect.min,
        viewport,
        events,
    }
}

fn collect_events(ui: &egui::Ui, rect: egui::Rect, tracker: &mut PointerTracker) -> Vec<PointerEvent> {
    let (hover, pressed, released, scroll) = ui.input(|i| {
        (
            i.pointer.hover_pos(),
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.raw_scroll_delta.y,
        )
    });
    let inside = ui.rect_contains_pointer(rect);
    let local = |p: egui::Pos2| Point2::new((p.x - rect.min.x) as f64, (p.y - rect.min.y) as f64);

    let mut events = Vec::new();
    match (tracker.inside, inside, hover) {
        (false, true, Some(pos)) => events.push(PointerEvent::Enter(local(pos))),
        (true, false, _) => events.push(PointerEvent::Leave),
        _ => {}
    }

    if let (true, Some(pos)) = (inside, hover) {
        if pressed {
            events.push(PointerEvent::Down(local(pos)));
        } else if tracker.inside && tracker.last_pos != Some(pos) {
            events.push(PointerEvent::Move(local(pos)));
        }
        // egui scrolls up with positive y; the wheel convention is the opposite.
        if scroll != 0.0 {
            events.push(PointerEvent::Wheel {
                pos: local(pos),
                delta_y: -scroll as f64,
            });
        }
        if released {
            events.push(PointerEvent::Up);
        }
    }

    tracker.inside = inside;
    tracker.last_pos = hover;
    events
}

/// Cursor shape for the active gesture.
pub fn cursor_for(gesture: Gesture, draw_mode: bool) -> egui::CursorIcon {
    match gesture {
        Gesture::Panning { .. } => egui::CursorIcon::Grabbing,
        Gesture::Drawing => egui::CursorIcon::Crosshair,
        Gesture::Idle | Gesture::Hovering { .. } if draw_mode => egui::CursorIcon::Crosshair,
        Gesture::Idle | Gesture::Hovering { .. } => egui::CursorIcon::Grab,
    }
}

/// Centered message shown when no media is loaded.
pub fn show_welcome(ui: &mut egui::Ui) {
    ui.centered_and_justified(|ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(20.0);
            ui.heading(
                egui::RichText::new("Spatia")
                    .size(32.0)
                    .color(egui::Color32::from_gray(200)),
            );
            ui.label(
                egui::RichText::new("Spatial annotation viewer")
                    .size(14.0)
                    .color(egui::Color32::from_gray(150)),
            );
            ui.add_space(20.0);
            ui.label(
                egui::RichText::new("Open an image to begin")
                    .color(egui::Color32::from_gray(180)),
            );
            ui.add_space(10.0);
            ui.label(
                egui::RichText::new("File → Open Image...")
                    .weak()
                    .color(egui::Color32::from_gray(130)),
            );
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_follows_gesture() {
        assert_eq!(cursor_for(Gesture::Idle, false), egui::CursorIcon::Grab);
        assert_eq!(cursor_for(Gesture::Idle, true), egui::CursorIcon::Crosshair);
        assert_eq!(
            cursor_for(Gesture::Panning { last: Point2::origin() }, false),
            egui::CursorIcon::Grabbing
        );
    }
}
