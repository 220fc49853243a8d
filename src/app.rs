// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the main application structure that implements
//! the egui::App trait, owning the session state and coordinating the
//! background media loader, the detection worker and the UI panels.

use crate::config::Settings;
use crate::error::DetectionError;
use crate::io::detection::parse_response;
use crate::io::media::{encode_png_base64, load_image, prepare_frame, LoadedImage};
use crate::io::serialization::{export_document, import_document};
use crate::io::service::{DetectionRequest, DetectionService, RequestTicket, RequestTracker};
use crate::models::annotation::{Stroke, StrokeSet};
use crate::models::detection::{DetectType, DetectionBatch};
use crate::models::document::{OverlayDocument, OverlayState};
use crate::ui::canvas::{self, PointerTracker};
use crate::ui::controls::{self, Controls, ControlsAction};
use crate::ui::gesture::InteractionState;
use crate::ui::overlay::{self, OverlayContext};
use crate::util::freehand::OutlineOptions;
use crate::util::geometry::ViewportRect;
use crate::util::mask::render_batch_masks;
use crate::util::transform::ZoomDirection;
use anyhow::Context as _;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;

/// Result of background media loading.
struct LoadedMedia {
    path: PathBuf,
    image: LoadedImage,
    /// Overlay document restored along with the media, if any.
    document: Option<(OverlayDocument, Vec<Option<RgbaImage>>)>,
}

/// Normalized response plus the rendered mask rasters.
struct DetectionOutcome {
    batch: DetectionBatch,
    masks: Vec<Option<RgbaImage>>,
}

/// What a detection worker needs, captured at send time.
struct RequestJob {
    detect_type: DetectType,
    prompt: String,
    temperature: f32,
    frame: Arc<RgbaImage>,
    strokes: Vec<Stroke>,
    max_upload_dim: u32,
    outline: OutlineOptions,
}

/// The displayed media.
struct MediaState {
    path: PathBuf,
    frame: Arc<RgbaImage>,
    texture: egui::TextureHandle,
}

impl MediaState {
    fn size(&self) -> (u32, u32) {
        self.frame.dimensions()
    }
}

enum Status {
    Info(String),
    Error(String),
}

/// Main application state.
pub struct SpatiaApp {
    settings: Settings,
    service: Option<Arc<dyn DetectionService>>,
    controls: Controls,
    interaction: InteractionState,
    overlay: OverlayState,
    pointer: PointerTracker,
    /// Content rectangle from the most recent frame. A change means the
    /// container was resized and the view starts over.
    viewport: ViewportRect,
    media: Option<MediaState>,
    mask_textures: Vec<Option<egui::TextureHandle>>,
    tracker: RequestTracker,
    pending_request: Option<(RequestTicket, Receiver<Result<DetectionOutcome, DetectionError>>)>,
    media_loader: Option<Receiver<anyhow::Result<LoadedMedia>>>,
    loading_message: Option<String>,
    status: Option<Status>,
}

impl SpatiaApp {
    /// Create a new application instance from startup settings.
    pub fn new(settings: Settings) -> Self {
        let service = settings.service.build();
        log::info!("Detection service: {}", settings.service.describe());
        Self {
            controls: Controls::from_settings(&settings),
            service,
            settings,
            interaction: InteractionState::default(),
            overlay: OverlayState::default(),
            pointer: PointerTracker::default(),
            viewport: ViewportRect::default(),
            media: None,
            mask_textures: Vec::new(),
            tracker: RequestTracker::default(),
            pending_request: None,
            media_loader: None,
            loading_message: None,
            status: None,
        }
    }

    fn outline_options(&self) -> OutlineOptions {
        OutlineOptions::with_size(self.settings.stroke_size)
    }

    /// Drop detections and their mask textures.
    fn clear_detections(&mut self) {
        self.overlay.clear_detections();
        self.mask_textures.clear();
    }

    fn install_detections(
        &mut self,
        ctx: &egui::Context,
        batch: DetectionBatch,
        masks: Vec<Option<RgbaImage>>,
    ) {
        self.mask_textures = masks
            .into_iter()
            .enumerate()
            .map(|(index, mask)| {
                mask.map(|image| {
                    let size = [image.width() as usize, image.height() as usize];
                    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
                    ctx.load_texture(format!("mask_{index}"), color_image, egui::TextureOptions::NEAREST)
                })
            })
            .collect();
        self.overlay.replace_detections(batch);
    }

    fn report_failure(&mut self, error: &DetectionError) {
        log::error!("Detection failed: {}", error);
        self.clear_detections();
        self.status = Some(Status::Error(error.to_string()));
    }

    /// Load an image file and create a texture for display (asynchronously).
    fn load_image_file(&mut self, path: PathBuf) {
        let (sender, receiver) = channel();
        self.media_loader = Some(receiver);
        self.loading_message = Some("Loading image...".to_string());

        std::thread::spawn(move || {
            let result = load_image(&path).map(|image| {
                log::info!("Loaded image: {} ({}x{})", path.display(), image.width, image.height);
                LoadedMedia {
                    path,
                    image,
                    document: None,
                }
            });
            let _ = sender.send(result);
        });
    }

    /// Import an overlay document and load the image it refers to (asynchronously).
    fn import_overlays(&mut self, path: PathBuf) {
        let (sender, receiver) = channel();
        self.media_loader = Some(receiver);
        self.loading_message = Some("Loading overlays and image...".to_string());

        std::thread::spawn(move || {
            let result = (|| -> anyhow::Result<LoadedMedia> {
                let document = import_document(&path)?;
                let media_path = resolve_media_path(&path, &document.media_file);
                let image = load_image(&media_path)
                    .with_context(|| format!("Referenced image not found: {}", media_path.display()))?;

                if (image.width, image.height) != (document.frame_width, document.frame_height) {
                    log::warn!(
                        "Overlay document expects {}x{}, image is {}x{}",
                        document.frame_width,
                        document.frame_height,
                        image.width,
                        image.height
                    );
                }
                log::info!(
                    "Imported {} strokes from {}",
                    document.strokes.len(),
                    path.display()
                );

                let masks = document
                    .detections
                    .as_ref()
                    .map(render_batch_masks)
                    .unwrap_or_default();
                Ok(LoadedMedia {
                    path: media_path,
                    image,
                    document: Some((document, masks)),
                })
            })();
            let _ = sender.send(result);
        });
    }

    /// Install freshly loaded media, resetting the session around it.
    fn apply_loaded_media(&mut self, ctx: &egui::Context, loaded: LoadedMedia) {
        let LoadedImage {
            width,
            height,
            pixels,
        } = loaded.image;
        let color_image =
            egui::ColorImage::from_rgba_unmultiplied([width as usize, height as usize], pixels.as_raw());
        let texture = ctx.load_texture("loaded_image", color_image, egui::TextureOptions::LINEAR);

        self.media = Some(MediaState {
            path: loaded.path,
            frame: Arc::new(pixels),
            texture,
        });
        self.interaction.reset_view(&mut self.overlay.strokes);
        self.overlay.reset();
        self.mask_textures.clear();
        self.tracker.invalidate();

        if let Some((document, masks)) = loaded.document {
            self.controls.detect_type = document.detect_type;
            self.controls.fov_degrees = document.fov_degrees.clamp(30.0, 120.0);
            self.overlay.strokes = StrokeSet::from_strokes(document.strokes);
            if let Some(batch) = document.detections {
                self.install_detections(ctx, batch, masks);
            }
        }
        self.status = Some(Status::Info(format!("Loaded {width}x{height} image")));
    }

    /// Start a detection request for the current frame.
    fn send_request(&mut self) {
        let Some(media) = &self.media else {
            self.report_failure(&DetectionError::Acquisition);
            return;
        };
        let Some(service) = self.service.clone() else {
            self.report_failure(&DetectionError::transport(
                "no detection service configured; use File → Load Response",
            ));
            return;
        };
        let Some(ticket) = self.tracker.begin() else {
            log::debug!("Request already in flight");
            return;
        };

        let job = RequestJob {
            detect_type: self.controls.detect_type,
            prompt: self.controls.prompt_text(),
            temperature: self.controls.temperature,
            frame: Arc::clone(&media.frame),
            strokes: self.overlay.strokes.strokes().to_vec(),
            max_upload_dim: self.settings.max_upload_dim,
            outline: self.outline_options(),
        };
        log::info!("Sending {} request: {}", job.detect_type, job.prompt);

        self.interaction.cancel(&mut self.overlay.strokes);
        self.clear_detections();
        self.status = Some(Status::Info("Waiting for response...".to_string()));

        let (sender, receiver) = channel();
        self.pending_request = Some((ticket, receiver));
        std::thread::spawn(move || {
            let _ = sender.send(run_detection(service.as_ref(), &job));
        });
    }

    fn poll_media_loader(&mut self, ctx: &egui::Context) {
        let Some(receiver) = &self.media_loader else {
            return;
        };
        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(anyhow::anyhow!("media loader stopped")),
        };
        self.media_loader = None;
        self.loading_message = None;

        match result {
            Ok(loaded) => self.apply_loaded_media(ctx, loaded),
            Err(e) => {
                log::error!("Failed to load media: {:#}", e);
                self.status = Some(Status::Error(format!("{:#}", e)));
            }
        }
    }

    fn poll_request(&mut self, ctx: &egui::Context) {
        let Some((ticket, receiver)) = &self.pending_request else {
            return;
        };
        let ticket = *ticket;
        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                Err(DetectionError::transport("detection worker stopped"))
            }
        };
        self.pending_request = None;

        if !self.tracker.complete(ticket) {
            log::warn!("Discarding response for superseded media");
            return;
        }

        match result {
            Ok(outcome) => {
                let count = outcome.batch.len();
                let message = if outcome.batch.is_empty() {
                    "No detections found".to_string()
                } else {
                    format!("Received {count} detections")
                };
                self.install_detections(ctx, outcome.batch, outcome.masks);
                self.status = Some(Status::Info(message));
                log::info!("Request completed with {} detections", count);
            }
            Err(e) => self.report_failure(&e),
        }
    }

    /// Feed a saved response file through the normal parsing path.
    fn load_response(&mut self, ctx: &egui::Context, path: &Path) {
        let detect_type = self.controls.detect_type;
        self.tracker.invalidate();
        self.clear_detections();

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                self.report_failure(&DetectionError::transport(format!("{}: {e}", path.display())));
                return;
            }
        };
        match parse_response(&text, detect_type) {
            Ok(batch) => {
                let masks = render_batch_masks(&batch);
                let count = batch.len();
                self.install_detections(ctx, batch, masks);
                self.status = Some(Status::Info(format!(
                    "Loaded {count} detections from {}",
                    path.display()
                )));
            }
            Err(e) => self.report_failure(&e),
        }
    }

    /// Export strokes and detections to a file.
    fn export_overlays(&mut self, path: PathBuf) {
        let Some(media) = &self.media else {
            return;
        };
        let (width, height) = media.size();
        let mut document =
            OverlayDocument::new(media.path.to_string_lossy().to_string(), width, height);
        document.detect_type = self.controls.detect_type;
        document.fov_degrees = self.controls.fov_degrees;
        document.strokes = self.overlay.strokes.strokes().to_vec();
        document.detections = self.overlay.detections().cloned();

        match export_document(&document, &path) {
            Ok(()) => {
                log::info!("Exported overlays to {}", path.display());
                self.status = Some(Status::Info(format!("Exported {}", path.display())));
            }
            Err(e) => {
                log::error!("Failed to export overlays: {:#}", e);
                self.status = Some(Status::Error(format!("{:#}", e)));
            }
        }
    }

    fn zoom(&mut self, direction: ZoomDirection) {
        self.interaction
            .zoom_button(direction, &self.viewport, self.controls.modes());
    }

    fn handle_controls_action(&mut self, action: ControlsAction) {
        match action {
            ControlsAction::Send => self.send_request(),
            ControlsAction::ClearStrokes => {
                self.interaction.cancel(&mut self.overlay.strokes);
                self.overlay.strokes.clear();
            }
            ControlsAction::ZoomIn => self.zoom(ZoomDirection::In),
            ControlsAction::ZoomOut => self.zoom(ZoomDirection::Out),
            ControlsAction::ResetView => self.interaction.reset_view(&mut self.overlay.strokes),
            ControlsAction::ModesChanged => self.interaction.cancel(&mut self.overlay.strokes),
            ControlsAction::None => {}
        }
    }

    fn show_menu_bar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Image...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Images", &["jpg", "jpeg", "png", "webp", "bmp"])
                        .pick_file()
                    {
                        self.load_image_file(path);
                    }
                    ui.close_menu();
                }
                if ui.button("Load Response...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Response", &["json", "txt", "md"])
                        .pick_file()
                    {
                        self.load_response(ctx, &path);
                    }
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Import Overlays...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Overlays", &["yaml", "yml", "json"])
                        .pick_file()
                    {
                        self.import_overlays(path);
                    }
                    ui.close_menu();
                }
                ui.add_enabled_ui(self.media.is_some(), |ui| {
                    ui.menu_button("Export Overlays", |ui| {
                        if ui.button("Export as YAML...").clicked() {
                            if let Some(path) = rfd::FileDialog::new()
                                .add_filter("YAML", &["yaml", "yml"])
                                .set_file_name("overlays.yaml")
                                .save_file()
                            {
                                self.export_overlays(path);
                            }
                            ui.close_menu();
                        }
                        if ui.button("Export as JSON...").clicked() {
                            if let Some(path) = rfd::FileDialog::new()
                                .add_filter("JSON", &["json"])
                                .set_file_name("overlays.json")
                                .save_file()
                            {
                                self.export_overlays(path);
                            }
                            ui.close_menu();
                        }
                    });
                });
                ui.separator();
                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.menu_button("View", |ui| {
                if ui.button("Zoom In").clicked() {
                    self.zoom(ZoomDirection::In);
                    ui.close_menu();
                }
                if ui.button("Zoom Out").clicked() {
                    self.zoom(ZoomDirection::Out);
                    ui.close_menu();
                }
                if ui.button("Reset View").clicked() {
                    self.interaction.reset_view(&mut self.overlay.strokes);
                    ui.close_menu();
                }
            });
        });
    }

    fn show_canvas(&mut self, ui: &mut egui::Ui) {
        if let Some(ref message) = self.loading_message {
            ui.centered_and_justified(|ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(20.0);
                    ui.spinner();
                    ui.add_space(10.0);
                    ui.label(
                        egui::RichText::new(message)
                            .size(16.0)
                            .color(egui::Color32::from_gray(200)),
                    );
                });
            });
            return;
        }
        let Some(media) = &self.media else {
            canvas::show_welcome(ui);
            return;
        };

        let frame = canvas::begin(ui, &mut self.pointer, Some(media.size()));
        if frame.viewport != self.viewport {
            log::debug!("Content rectangle now {:?}, resetting view", frame.viewport);
            self.interaction.reset_view(&mut self.overlay.strokes);
            self.viewport = frame.viewport;
        }

        let modes = self.controls.modes();
        let mut changed = false;
        for event in &frame.events {
            changed |= self.interaction.handle(
                *event,
                &frame.viewport,
                modes,
                &mut self.overlay.strokes,
                self.controls.active_color,
            );
        }
        if changed {
            ui.ctx().request_repaint();
        }
        if self.pointer.is_inside() || self.interaction.has_capture() {
            ui.ctx()
                .set_cursor_icon(canvas::cursor_for(self.interaction.gesture(), modes.draw_mode));
        }

        let transform = self.interaction.transform();
        frame.paint_media(&media.texture, transform);
        overlay::paint_strokes(
            &frame,
            transform,
            self.overlay.strokes.strokes(),
            &OutlineOptions::with_size(self.settings.stroke_size),
        );

        if let Some(batch) = self.overlay.detections() {
            if batch.detect_type() == self.controls.detect_type {
                let context = OverlayContext {
                    transform,
                    hover: self.interaction.hover_point(),
                    fov_degrees: self.controls.fov_degrees,
                    mask_opacity: self.settings.mask_opacity,
                    mask_textures: &self.mask_textures,
                };
                overlay::paint_detections(&frame, batch, &context);
            }
        }
    }
}

impl eframe::App for SpatiaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui(ctx);
    }
}

impl SpatiaApp {
    /// Run one frame: poll background work, then lay out every panel.
    fn ui(&mut self, ctx: &egui::Context) {
        self.poll_media_loader(ctx);
        self.poll_request(ctx);

        // Keep polling while background work is outstanding
        if self.loading_message.is_some() || self.tracker.is_busy() {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.show_menu_bar(ctx, ui);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                match &self.status {
                    Some(Status::Info(message)) => {
                        ui.label(message);
                    }
                    Some(Status::Error(message)) => {
                        ui.colored_label(ui.visuals().error_fg_color, message);
                    }
                    None => {
                        ui.label("No file loaded");
                    }
                }
                if self.media.is_some() {
                    ui.separator();
                    ui.label(format!("Zoom {:.0}%", self.interaction.transform().scale * 100.0));
                }
                if !self.overlay.strokes.is_empty() {
                    ui.separator();
                    ui.label(format!("{} strokes", self.overlay.strokes.len()));
                }
            });
        });

        let busy = self.tracker.is_busy();
        let has_media = self.media.is_some();
        let service_name = self.settings.service.describe();
        let action = egui::SidePanel::right("controls")
            .default_width(260.0)
            .show(ctx, |ui| {
                controls::show(ui, &mut self.controls, busy, has_media, &service_name)
            })
            .inner;
        self.handle_controls_action(action);

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.interaction.cancel(&mut self.overlay.strokes);
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| self.show_canvas(ui));
    }
}

/// Prepare the frame, call the service and normalize its response.
fn run_detection(
    service: &dyn DetectionService,
    job: &RequestJob,
) -> Result<DetectionOutcome, DetectionError> {
    let frame = prepare_frame(&job.frame, &job.strokes, job.max_upload_dim, &job.outline);
    let image_data = encode_frame(&frame)?;

    let request = DetectionRequest {
        detect_type: job.detect_type,
        prompt: job.prompt.clone(),
        temperature: job.temperature,
        image_mime_type: "image/png".to_string(),
        image_data,
    };
    let text = service.detect(&request)?;
    let batch = parse_response(&text, job.detect_type)?;
    let masks = render_batch_masks(&batch);
    Ok(DetectionOutcome { batch, masks })
}

/// PNG payload for the request. An image is present, so an encoder
/// failure is reported as a transport problem with its full context.
fn encode_frame(frame: &RgbaImage) -> Result<String, DetectionError> {
    encode_png_base64(frame).map_err(|e| {
        log::error!("Failed to encode frame: {:#}", e);
        DetectionError::transport(format!("{e:#}"))
    })
}

/// Media paths in overlay documents may be relative to the document.
fn resolve_media_path(document_path: &Path, media_file: &str) -> PathBuf {
    let media = PathBuf::from(media_file);
    if media.is_absolute() || media.exists() {
        return media;
    }
    match document_path.parent() {
        Some(dir) => dir.join(media),
        None => media,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use nalgebra::Vector2;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::tempdir;

    const POINTS_RESPONSE: &str = "[{\"point\": [500, 250], \"label\": \"a\"}]";

    /// Records the request and answers with a fixed text.
    struct FixedService {
        response: Result<String, DetectionError>,
        seen: Mutex<Option<DetectionRequest>>,
    }

    impl FixedService {
        fn answering(response: Result<&str, DetectionError>) -> Self {
            Self {
                response: response.map(str::to_string),
                seen: Mutex::new(None),
            }
        }
    }

    impl DetectionService for FixedService {
        fn detect(&self, request: &DetectionRequest) -> Result<String, DetectionError> {
            if let Ok(mut seen) = self.seen.lock() {
                *seen = Some(request.clone());
            }
            self.response.clone()
        }
    }

    fn job(detect_type: DetectType) -> RequestJob {
        RequestJob {
            detect_type,
            prompt: "Point to the items".to_string(),
            temperature: 0.5,
            frame: Arc::new(RgbaImage::from_pixel(1280, 960, Rgba([0, 0, 0, 255]))),
            strokes: Vec::new(),
            max_upload_dim: 640,
            outline: OutlineOptions::default(),
        }
    }

    #[test]
    fn test_run_detection_uploads_fitted_frame() {
        let service = FixedService {
            response: Ok("```json\n[{\"point\": [500, 250], \"label\": \"a\"}]\n```".to_string()),
            seen: Mutex::new(None),
        };
        let outcome = run_detection(&service, &job(DetectType::Points)).unwrap();
        assert_eq!(outcome.batch.len(), 1);
        assert!(outcome.masks.is_empty());

        let request = service.seen.lock().unwrap().clone().unwrap();
        assert_eq!(request.image_mime_type, "image/png");
        let bytes = base64::Engine::decode(
            &base64::engine::general_purpose::STANDARD,
            request.image_data,
        )
        .unwrap();
        let uploaded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((uploaded.width(), uploaded.height()), (640, 480));
    }

    #[test]
    fn test_run_detection_propagates_errors() {
        let failing = FixedService {
            response: Err(DetectionError::transport("offline")),
            seen: Mutex::new(None),
        };
        assert!(matches!(
            run_detection(&failing, &job(DetectType::Boxes2D)),
            Err(DetectionError::Transport(_))
        ));

        let garbled = FixedService {
            response: Ok("[{\"box_2d\": [1, 2, 3]}]".to_string()),
            seen: Mutex::new(None),
        };
        assert!(matches!(
            run_detection(&garbled, &job(DetectType::Boxes2D)),
            Err(DetectionError::Shape { index: Some(0), .. })
        ));
    }

    #[test]
    fn test_encode_failure_keeps_context() {
        match encode_frame(&RgbaImage::new(0, 0)) {
            Err(DetectionError::Transport(message)) => {
                assert!(message.contains("Failed to encode frame as PNG"), "{message}");
            }
            other => panic!("expected a transport error, got {other:?}"),
        }
        assert!(encode_frame(&RgbaImage::new(2, 2)).is_ok());
    }

    #[test]
    fn test_resolve_media_path_relative_to_document() {
        let resolved = resolve_media_path(Path::new("/data/run/overlays.yaml"), "frame-does-not-exist.png");
        assert_eq!(resolved, PathBuf::from("/data/run/frame-does-not-exist.png"));

        let absolute = resolve_media_path(Path::new("/data/overlays.yaml"), "/images/a.png");
        assert_eq!(absolute, PathBuf::from("/images/a.png"));
    }

    fn loaded_media(width: u32, height: u32) -> LoadedMedia {
        let pixels = RgbaImage::from_pixel(width, height, Rgba([90, 90, 90, 255]));
        LoadedMedia {
            path: PathBuf::from("frame.png"),
            image: LoadedImage {
                width,
                height,
                pixels,
            },
            document: None,
        }
    }

    fn app_with_media(ctx: &egui::Context) -> SpatiaApp {
        let mut app = SpatiaApp::new(Settings::default());
        app.apply_loaded_media(ctx, loaded_media(400, 300));
        app.controls.detect_type = DetectType::Points;
        app
    }

    fn run_frame(app: &mut SpatiaApp, ctx: &egui::Context, width: f32, height: f32) {
        let input = egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(width, height),
            )),
            ..Default::default()
        };
        let _ = ctx.run(input, |ctx| app.ui(ctx));
    }

    fn wait_for_response(app: &mut SpatiaApp, ctx: &egui::Context) {
        for _ in 0..500 {
            if app.pending_request.is_none() {
                return;
            }
            run_frame(app, ctx, 1200.0, 800.0);
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("detection worker never answered");
    }

    fn existing_points() -> DetectionBatch {
        parse_response(POINTS_RESPONSE, DetectType::Points).unwrap()
    }

    #[test]
    fn test_container_resize_resets_view() {
        let ctx = egui::Context::default();
        let mut app = app_with_media(&ctx);
        run_frame(&mut app, &ctx, 1200.0, 800.0);
        run_frame(&mut app, &ctx, 1200.0, 800.0);

        app.zoom(ZoomDirection::In);
        run_frame(&mut app, &ctx, 1200.0, 800.0);
        assert!((app.interaction.transform().scale - 1.2).abs() < 1e-9);
        let fitted = app.viewport;

        run_frame(&mut app, &ctx, 700.0, 900.0);
        assert_ne!(app.viewport, fitted);
        assert_eq!(app.interaction.transform().scale, 1.0);
        assert_eq!(app.interaction.transform().translate, Vector2::zeros());
    }

    #[test]
    fn test_send_clears_overlays_then_installs_response() {
        let ctx = egui::Context::default();
        let mut app = app_with_media(&ctx);
        app.install_detections(&ctx, existing_points(), Vec::new());
        app.service = Some(Arc::new(FixedService::answering(Ok(POINTS_RESPONSE))));

        app.send_request();
        assert!(app.overlay.detections().is_none());
        assert!(app.tracker.is_busy());

        wait_for_response(&mut app, &ctx);
        assert!(!app.tracker.is_busy());
        assert_eq!(app.overlay.detections().map(DetectionBatch::len), Some(1));
        assert!(matches!(app.status, Some(Status::Info(_))));
    }

    #[test]
    fn test_failed_request_clears_overlays() {
        let ctx = egui::Context::default();
        let mut app = app_with_media(&ctx);
        app.service = Some(Arc::new(FixedService::answering(Err(
            DetectionError::transport("offline"),
        ))));

        app.send_request();
        // Overlays that appear while the request is out are dropped on failure too.
        app.install_detections(&ctx, existing_points(), Vec::new());
        wait_for_response(&mut app, &ctx);

        assert!(app.overlay.detections().is_none());
        assert!(app.mask_textures.is_empty());
        assert!(matches!(app.status, Some(Status::Error(_))));
        assert!(!app.tracker.is_busy());
    }

    #[test]
    fn test_response_for_replaced_media_is_discarded() {
        let ctx = egui::Context::default();
        let mut app = app_with_media(&ctx);
        app.service = Some(Arc::new(FixedService::answering(Ok(POINTS_RESPONSE))));

        app.send_request();
        app.apply_loaded_media(&ctx, loaded_media(640, 480));
        wait_for_response(&mut app, &ctx);

        assert!(app.overlay.detections().is_none());
        assert!(!app.tracker.is_busy());
        assert!(matches!(&app.status, Some(Status::Info(message)) if message.starts_with("Loaded")));
    }

    #[test]
    fn test_load_response_rejects_malformed_records() {
        let ctx = egui::Context::default();
        let mut app = app_with_media(&ctx);
        app.controls.detect_type = DetectType::Boxes2D;
        let dir = tempdir().expect("tempdir");

        let shape = dir.path().join("shape.json");
        std::fs::write(&shape, "[{\"box_2d\": [1, 2, 3], \"label\": \"a\"}]").unwrap();
        app.install_detections(&ctx, existing_points(), Vec::new());
        app.load_response(&ctx, &shape);
        assert!(app.overlay.detections().is_none());
        assert!(matches!(app.status, Some(Status::Error(_))));

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "the model declined").unwrap();
        app.install_detections(&ctx, existing_points(), Vec::new());
        app.load_response(&ctx, &garbage);
        assert!(app.overlay.detections().is_none());
        assert!(matches!(app.status, Some(Status::Error(_))));

        let valid = dir.path().join("valid.json");
        std::fs::write(&valid, "[{\"box_2d\": [100, 200, 300, 400], \"label\": \"a\"}]").unwrap();
        app.load_response(&ctx, &valid);
        assert_eq!(app.overlay.detections().map(DetectionBatch::len), Some(1));
    }
}
