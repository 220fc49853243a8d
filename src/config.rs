// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application settings.
//!
//! Settings are read once at startup from the file named by `SPATIA_CONFIG`,
//! or from `spatia.yaml` in the working directory. Every field has a default,
//! so a partial file only overrides what it names.

use crate::io::service::{CommandService, DetectionService, ReplayService};
use crate::models::annotation::Rgb;
use crate::util::mask::MASK_OPACITY;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV: &str = "SPATIA_CONFIG";

/// Settings file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "spatia.yaml";

/// Freehand stroke colors offered in the palette.
pub const STROKE_COLORS: [Rgb; 8] = [
    [0, 0, 0],
    [255, 255, 255],
    [213, 40, 40],
    [250, 123, 23],
    [240, 186, 17],
    [8, 161, 72],
    [26, 115, 232],
    [161, 66, 244],
];

/// Which transport answers detection requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServiceSettings {
    /// No service; responses can still be loaded from files.
    #[default]
    None,
    /// Canned responses, one `<detect type>.json` per type.
    Replay { directory: PathBuf },
    /// External program reading the request on stdin.
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

impl ServiceSettings {
    pub fn build(&self) -> Option<Arc<dyn DetectionService>> {
        match self {
            ServiceSettings::None => None,
            ServiceSettings::Replay { directory } => {
                Some(Arc::new(ReplayService::new(directory.clone())))
            }
            ServiceSettings::Command { program, args } => {
                Some(Arc::new(CommandService::new(program.clone(), args.clone())))
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ServiceSettings::None => "none".to_string(),
            ServiceSettings::Replay { directory } => format!("replay ({})", directory.display()),
            ServiceSettings::Command { program, .. } => format!("command ({program})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Initial field of view for 3D boxes, in degrees.
    pub fov_degrees: f64,
    /// Sampling temperature sent with each request.
    pub temperature: f32,
    /// Stroke diameter in screen pixels.
    pub stroke_size: f64,
    /// Longest side of the uploaded frame.
    pub max_upload_dim: u32,
    pub mask_opacity: f32,
    pub stroke_palette: Vec<Rgb>,
    pub service: ServiceSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            temperature: 0.5,
            stroke_size: 8.0,
            max_upload_dim: 640,
            mask_opacity: MASK_OPACITY,
            stroke_palette: STROKE_COLORS.to_vec(),
            service: ServiceSettings::None,
        }
    }
}

impl Settings {
    /// Read settings from a YAML or JSON file, chosen by extension.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let extension = path.extension().and_then(|s| s.to_str());
        let settings: Settings = match extension {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&text)
                .with_context(|| format!("failed to parse settings YAML at {}", path.display()))?,
            Some("json") => serde_json::from_str(&text)
                .with_context(|| format!("failed to parse settings JSON at {}", path.display()))?,
            _ => bail!("unsupported settings file extension: {:?}", extension),
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.max_upload_dim == 0 {
            bail!("max_upload_dim must be positive");
        }
        if self.stroke_size.is_nan() || self.stroke_size <= 0.0 {
            bail!("stroke_size must be positive");
        }
        if self.stroke_palette.is_empty() {
            bail!("stroke_palette must contain at least one color");
        }
        Ok(())
    }

    /// The settings file in effect, if any.
    pub fn locate() -> Option<PathBuf> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Some(PathBuf::from(path)),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                path.exists().then_some(path)
            }
        }
    }

    /// Load settings for startup, falling back to defaults on any problem.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::locate() else {
            log::info!("No settings file found, using defaults");
            return Self::default();
        };
        match Self::load_from_path(&path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Ignoring settings: {:#}", e);
                Self::default()
            }
        }
    }

    /// FOV clamped to the slider range.
    pub fn initial_fov(&self) -> f64 {
        self.fov_degrees.clamp(30.0, 120.0)
    }
}
