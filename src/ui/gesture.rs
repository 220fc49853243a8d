// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pointer gesture state machine.
//!
//! Pan, draw and hover are mutually exclusive. The mode flags are read when
//! a gesture starts, and the gesture that holds pointer capture is the only
//! one that sees subsequent moves until it ends.

use crate::models::annotation::{Point, Rgb, StrokeSet};
use crate::util::geometry::ViewportRect;
use crate::util::transform::{TransformState, ZoomDirection};
use nalgebra::Point2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Idle,
    /// Dragging the view; `last` is the previous pointer position.
    Panning { last: Point2<f64> },
    /// A stroke is open in the stroke set.
    Drawing,
    /// Reveal-on-hover is tracking the pointer.
    Hovering { at: Point },
}

/// Host-neutral pointer input, in container pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point2<f64>),
    Move(Point2<f64>),
    Up,
    Enter(Point2<f64>),
    Leave,
    Wheel { pos: Point2<f64>, delta_y: f64 },
}

/// Mode flags sampled at gesture start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modes {
    pub draw_mode: bool,
    pub reveal_on_hover: bool,
}

/// Zoom/pan plus the active gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionState {
    transform: TransformState,
    gesture: Gesture,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            transform: TransformState::identity(),
            gesture: Gesture::Idle,
        }
    }
}

impl InteractionState {
    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    /// True while a pan or draw gesture owns the pointer.
    pub fn has_capture(&self) -> bool {
        matches!(self.gesture, Gesture::Panning { .. } | Gesture::Drawing)
    }

    /// Normalized pointer position while hovering.
    pub fn hover_point(&self) -> Option<Point> {
        match self.gesture {
            Gesture::Hovering { at } => Some(at),
            _ => None,
        }
    }

    /// Feed one pointer event. Returns true when the view or strokes changed.
    pub fn handle(
        &mut self,
        event: PointerEvent,
        rect: &ViewportRect,
        modes: Modes,
        strokes: &mut StrokeSet,
        color: Rgb,
    ) -> bool {
        match (self.gesture, event) {
            (Gesture::Idle | Gesture::Hovering { .. }, PointerEvent::Down(pos)) => {
                if modes.draw_mode {
                    let Some(point) = self.transform.screen_to_normalized(pos, rect) else {
                        return false;
                    };
                    strokes.begin(point, color);
                    self.transition(Gesture::Drawing);
                    true
                } else if rect.is_ready() {
                    self.transition(Gesture::Panning { last: pos });
                    false
                } else {
                    false
                }
            }
            (Gesture::Panning { last }, PointerEvent::Move(pos)) => {
                self.transform.pan_by(pos - last);
                self.gesture = Gesture::Panning { last: pos };
                true
            }
            (Gesture::Drawing, PointerEvent::Move(pos)) => {
                match self.transform.screen_to_normalized(pos, rect) {
                    Some(point) => strokes.extend(point),
                    None => false,
                }
            }
            (Gesture::Panning { .. }, PointerEvent::Up | PointerEvent::Leave) => {
                self.transition(Gesture::Idle);
                false
            }
            (Gesture::Drawing, PointerEvent::Up | PointerEvent::Leave) => {
                strokes.finish();
                self.transition(Gesture::Idle);
                true
            }
            (
                Gesture::Idle | Gesture::Hovering { .. },
                PointerEvent::Move(pos) | PointerEvent::Enter(pos),
            ) => self.track_hover(pos, rect, modes),
            (Gesture::Hovering { .. }, PointerEvent::Leave) => {
                self.transition(Gesture::Idle);
                true
            }
            (_, PointerEvent::Wheel { pos, delta_y }) => {
                if modes.draw_mode || !rect.is_ready() || delta_y == 0.0 {
                    return false;
                }
                self.transform.zoom_wheel(pos, delta_y, rect);
                true
            }
            _ => false,
        }
    }

    fn track_hover(&mut self, pos: Point2<f64>, rect: &ViewportRect, modes: Modes) -> bool {
        let next = if modes.reveal_on_hover && !modes.draw_mode {
            match self.transform.screen_to_normalized(pos, rect) {
                Some(at) => Gesture::Hovering { at },
                None => Gesture::Idle,
            }
        } else {
            Gesture::Idle
        };
        let changed = next != self.gesture;
        self.gesture = next;
        changed
    }

    /// Zoom button press. Ignored in draw mode or without media.
    pub fn zoom_button(&mut self, direction: ZoomDirection, rect: &ViewportRect, modes: Modes) {
        if modes.draw_mode || !rect.is_ready() {
            return;
        }
        self.transform.zoom_centered(direction, rect);
    }

    /// Abort any gesture, closing an open stroke.
    pub fn cancel(&mut self, strokes: &mut StrokeSet) {
        if strokes.is_drawing() {
            log::debug!("Gesture cancelled with a stroke open");
        }
        strokes.finish();
        self.transition(Gesture::Idle);
    }

    /// Identity transform and no gesture (media changed or "reset view").
    pub fn reset_view(&mut self, strokes: &mut StrokeSet) {
        self.cancel(strokes);
        self.transform.reset();
    }

    fn transition(&mut self, next: Gesture) {
        if std::mem::discriminant(&self.gesture) != std::mem::discriminant(&next) {
            log::debug!("Gesture {:?} -> {:?}", self.gesture, next);
        }
        self.gesture = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = [213, 40, 40];

    fn rect() -> ViewportRect {
        ViewportRect::fit((800.0, 600.0), (800, 600))
    }

    fn draw() -> Modes {
        Modes {
            draw_mode: true,
            reveal_on_hover: false,
        }
    }

    #[test]
    fn test_down_two_moves_up_records_one_stroke() {
        let mut state = InteractionState::default();
        let mut strokes = StrokeSet::default();
        let rect = rect();

        state.handle(PointerEvent::Down(Point2::new(80.0, 60.0)), &rect, draw(), &mut strokes, RED);
        assert!(state.has_capture());
        state.handle(PointerEvent::Move(Point2::new(160.0, 120.0)), &rect, draw(), &mut strokes, RED);
        state.handle(PointerEvent::Move(Point2::new(240.0, 180.0)), &rect, draw(), &mut strokes, RED);
        state.handle(PointerEvent::Up, &rect, draw(), &mut strokes, RED);
        assert!(!state.has_capture());

        assert_eq!(strokes.len(), 1);
        assert_eq!(strokes.strokes()[0].point_count(), 3);
        assert_eq!(strokes.strokes()[0].color, RED);
        assert!((strokes.strokes()[0].points[2].x - 0.3).abs() < 1e-9);

        state.handle(PointerEvent::Move(Point2::new(400.0, 300.0)), &rect, draw(), &mut strokes, RED);
        assert_eq!(strokes.strokes()[0].point_count(), 3);
    }

    #[test]
    fn test_draw_mode_disables_pan_and_wheel() {
        let mut state = InteractionState::default();
        let mut strokes = StrokeSet::default();
        let rect = rect();

        state.handle(PointerEvent::Down(Point2::new(10.0, 10.0)), &rect, draw(), &mut strokes, RED);
        state.handle(PointerEvent::Move(Point2::new(50.0, 50.0)), &rect, draw(), &mut strokes, RED);
        let wheel = PointerEvent::Wheel {
            pos: Point2::new(50.0, 50.0),
            delta_y: -1.0,
        };
        assert!(!state.handle(wheel, &rect, draw(), &mut strokes, RED));
        state.zoom_button(ZoomDirection::In, &rect, draw());

        assert_eq!(*state.transform(), TransformState::identity());
        assert_eq!(state.gesture(), Gesture::Drawing);
    }

    #[test]
    fn test_pan_follows_pointer() {
        let mut state = InteractionState::default();
        let mut strokes = StrokeSet::default();
        let rect = rect();
        let modes = Modes::default();

        state.handle(PointerEvent::Down(Point2::new(100.0, 100.0)), &rect, modes, &mut strokes, RED);
        state.handle(PointerEvent::Move(Point2::new(130.0, 90.0)), &rect, modes, &mut strokes, RED);
        state.handle(PointerEvent::Move(Point2::new(150.0, 120.0)), &rect, modes, &mut strokes, RED);
        state.handle(PointerEvent::Up, &rect, modes, &mut strokes, RED);

        assert!((state.transform().translate.x - 50.0).abs() < 1e-9);
        assert!((state.transform().translate.y - 20.0).abs() < 1e-9);
        assert!(strokes.is_empty());
    }

    #[test]
    fn test_leave_ends_pan_and_draw() {
        let mut state = InteractionState::default();
        let mut strokes = StrokeSet::default();
        let rect = rect();

        state.handle(PointerEvent::Down(Point2::new(10.0, 10.0)), &rect, Modes::default(), &mut strokes, RED);
        state.handle(PointerEvent::Leave, &rect, Modes::default(), &mut strokes, RED);
        assert_eq!(state.gesture(), Gesture::Idle);

        state.handle(PointerEvent::Down(Point2::new(10.0, 10.0)), &rect, draw(), &mut strokes, RED);
        state.handle(PointerEvent::Leave, &rect, draw(), &mut strokes, RED);
        assert!(!strokes.is_drawing());
        assert!(!state.handle(PointerEvent::Move(Point2::new(20.0, 20.0)), &rect, draw(), &mut strokes, RED));
        assert_eq!(strokes.strokes()[0].point_count(), 1);
    }

    #[test]
    fn test_hover_tracks_normalized_pointer() {
        let mut state = InteractionState::default();
        let mut strokes = StrokeSet::default();
        let rect = rect();
        let modes = Modes {
            draw_mode: false,
            reveal_on_hover: true,
        };

        state.handle(PointerEvent::Enter(Point2::new(400.0, 300.0)), &rect, modes, &mut strokes, RED);
        let at = state.hover_point().unwrap();
        assert!((at.x - 0.5).abs() < 1e-9 && (at.y - 0.5).abs() < 1e-9);

        state.handle(PointerEvent::Down(Point2::new(400.0, 300.0)), &rect, modes, &mut strokes, RED);
        assert!(matches!(state.gesture(), Gesture::Panning { .. }));
        assert!(state.hover_point().is_none());

        state.handle(PointerEvent::Up, &rect, modes, &mut strokes, RED);
        state.handle(PointerEvent::Leave, &rect, modes, &mut strokes, RED);
        assert_eq!(state.gesture(), Gesture::Idle);
    }

    #[test]
    fn test_degenerate_rect_ignores_input() {
        let mut state = InteractionState::default();
        let mut strokes = StrokeSet::default();
        let rect = ViewportRect::fit((800.0, 600.0), (0, 0));

        state.handle(PointerEvent::Down(Point2::new(10.0, 10.0)), &rect, draw(), &mut strokes, RED);
        assert!(strokes.is_empty());
        assert_eq!(state.gesture(), Gesture::Idle);
    }

    #[test]
    fn test_reset_view_restores_identity() {
        let mut state = InteractionState::default();
        let mut strokes = StrokeSet::default();
        let rect = rect();
        state.zoom_button(ZoomDirection::In, &rect, Modes::default());
        assert!((state.transform().scale - 1.2).abs() < 1e-9);

        state.reset_view(&mut strokes);
        assert_eq!(*state.transform(), TransformState::identity());
    }
}
