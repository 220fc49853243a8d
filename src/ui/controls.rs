// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Control panel for detection requests and drawing options.
//!
//! This module provides the side panel: detect type and prompt editing,
//! request sending, draw mode with its palette, reveal-on-hover, the 3D
//! field of view and the zoom buttons.

use crate::config::Settings;
use crate::io::service::{prompt_template, PromptInput};
use crate::models::annotation::Rgb;
use crate::models::detection::DetectType;
use crate::ui::gesture::Modes;

pub const FOV_RANGE: std::ops::RangeInclusive<f64> = 30.0..=120.0;

/// User-facing session options.
#[derive(Debug, Clone, PartialEq)]
pub struct Controls {
    pub detect_type: DetectType,
    /// One prompt per detect type, in `DetectType::ALL` order.
    prompts: [PromptInput; 4],
    pub temperature: f32,
    pub fov_degrees: f64,
    pub draw_mode: bool,
    pub reveal_on_hover: bool,
    pub active_color: Rgb,
    pub palette: Vec<Rgb>,
}

/// Result of control panel interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlsAction {
    None,
    Send,
    ClearStrokes,
    ZoomIn,
    ZoomOut,
    ResetView,
    /// A mode flag changed; any gesture in progress must end.
    ModesChanged,
}

fn slot(detect_type: DetectType) -> usize {
    match detect_type {
        DetectType::Boxes2D => 0,
        DetectType::Masks => 1,
        DetectType::Points => 2,
        DetectType::Boxes3D => 3,
    }
}

impl Controls {
    pub fn from_settings(settings: &Settings) -> Self {
        let palette = settings.stroke_palette.clone();
        Self {
            detect_type: DetectType::default(),
            prompts: DetectType::ALL.map(PromptInput::for_type),
            temperature: settings.temperature,
            fov_degrees: settings.initial_fov(),
            draw_mode: false,
            reveal_on_hover: false,
            active_color: palette.first().copied().unwrap_or([0, 0, 0]),
            palette,
        }
    }

    pub fn prompt(&self) -> &PromptInput {
        &self.prompts[slot(self.detect_type)]
    }

    pub fn prompt_mut(&mut self) -> &mut PromptInput {
        &mut self.prompts[slot(self.detect_type)]
    }

    /// Full prompt for the current detect type.
    pub fn prompt_text(&self) -> String {
        self.prompt().build(self.detect_type)
    }

    pub fn modes(&self) -> Modes {
        Modes {
            draw_mode: self.draw_mode,
            reveal_on_hover: self.reveal_on_hover,
        }
    }
}

fn color32(rgb: Rgb) -> egui::Color32 {
    egui::Color32::from_rgb(rgb[0], rgb[1], rgb[2])
}

fn palette_row(ui: &mut egui::Ui, palette: &[Rgb], active: &mut Rgb) {
    ui.horizontal_wrapped(|ui| {
        for color in palette {
            let (rect, response) =
                ui.allocate_exact_size(egui::vec2(22.0, 22.0), egui::Sense::click());
            let selected = *active == *color;
            let radius = if selected { 11.0 } else { 9.0 };
            ui.painter().circle(
                rect.center(),
                radius,
                color32(*color),
                egui::Stroke::new(
                    if selected { 2.0 } else { 1.0 },
                    if selected {
                        ui.visuals().selection.stroke.color
                    } else {
                        egui::Color32::from_gray(120)
                    },
                ),
            );
            if response.clicked() {
                *active = *color;
            }
        }
    });
}

/// Display the control panel.
pub fn show(
    ui: &mut egui::Ui,
    controls: &mut Controls,
    busy: bool,
    has_media: bool,
    service_name: &str,
) -> ControlsAction {
    let mut action = ControlsAction::None;

    ui.heading("Detection");
    ui.add_space(4.0);

    let previous_type = controls.detect_type;
    egui::ComboBox::from_label("Type")
        .selected_text(controls.detect_type.label())
        .show_ui(ui, |ui| {
            for detect_type in DetectType::ALL {
                ui.selectable_value(&mut controls.detect_type, detect_type, detect_type.label());
            }
        });
    if controls.detect_type != previous_type {
        action = ControlsAction::ModesChanged;
    }

    ui.add_space(4.0);
    let template = prompt_template(controls.detect_type);
    ui.label(egui::RichText::new(template.prefix.trim()).weak());
    ui.add(egui::TextEdit::singleline(&mut controls.prompt_mut().target).hint_text(template.default_target));
    if controls.detect_type == DetectType::Boxes2D {
        ui.label(egui::RichText::new("Label each one by").weak());
        ui.add(egui::TextEdit::singleline(&mut controls.prompt_mut().label_by).hint_text("e.g. color"));
    }

    ui.add(egui::Slider::new(&mut controls.temperature, 0.0..=2.0).text("Temperature"));

    if controls.detect_type == DetectType::Boxes3D {
        ui.add(egui::Slider::new(&mut controls.fov_degrees, FOV_RANGE).text("Field of view"));
    }

    ui.add_space(6.0);
    ui.horizontal(|ui| {
        let label = if busy { "Waiting for response..." } else { "Send" };
        if ui.add_enabled(!busy && has_media, egui::Button::new(label)).clicked() {
            action = ControlsAction::Send;
        }
        if busy {
            ui.spinner();
        }
    });
    ui.label(egui::RichText::new(format!("Service: {service_name}")).small().weak());

    ui.separator();
    ui.heading("Drawing");

    if ui.checkbox(&mut controls.draw_mode, "Draw on image").changed() {
        action = ControlsAction::ModesChanged;
    }
    if controls.draw_mode {
        palette_row(ui, &controls.palette, &mut controls.active_color);
        if ui.button("Clear strokes").clicked() {
            action = ControlsAction::ClearStrokes;
        }
    }
    if ui.checkbox(&mut controls.reveal_on_hover, "Reveal on hover").changed() {
        action = ControlsAction::ModesChanged;
    }

    ui.separator();
    ui.heading("View");
    ui.add_enabled_ui(has_media && !controls.draw_mode, |ui| {
        ui.horizontal(|ui| {
            if ui.button("➕ Zoom In").clicked() {
                action = ControlsAction::ZoomIn;
            }
            if ui.button("➖ Zoom Out").clicked() {
                action = ControlsAction::ZoomOut;
            }
            if ui.button("⟲ Reset").clicked() {
                action = ControlsAction::ResetView;
            }
        });
    });

    action
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_kept_per_detect_type() {
        let mut controls = Controls::from_settings(&Settings::default());
        controls.prompt_mut().target = "cups".to_string();

        controls.detect_type = DetectType::Points;
        assert_eq!(controls.prompt().target, "items");

        controls.detect_type = DetectType::Boxes2D;
        assert!(controls.prompt_text().contains("cups"));
    }

    #[test]
    fn test_defaults_from_settings() {
        let settings = Settings {
            fov_degrees: 10.0,
            ..Settings::default()
        };
        let controls = Controls::from_settings(&settings);
        assert_eq!(controls.fov_degrees, 30.0);
        assert_eq!(controls.active_color, [0, 0, 0]);
        assert_eq!(controls.modes(), Modes::default());
    }
}
