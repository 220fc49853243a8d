// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Detection service requests.
//!
//! The service itself is a black box that turns a [`DetectionRequest`] into
//! raw response text. This module builds requests, provides the transports
//! and tracks the single in-flight request.

use crate::error::DetectionError;
use crate::models::detection::DetectType;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Prompt split around the user-editable target phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub prefix: &'static str,
    pub default_target: &'static str,
    pub suffix: &'static str,
}

pub fn prompt_template(detect_type: DetectType) -> PromptTemplate {
    match detect_type {
        DetectType::Boxes2D => PromptTemplate {
            prefix: "Show me the positions of ",
            default_target: "items",
            suffix: " as a JSON list. Do not return masks. Limit to 25 items.",
        },
        DetectType::Masks => PromptTemplate {
            prefix: "Give the segmentation masks for ",
            default_target: "all objects",
            suffix: ". Output a JSON list of segmentation masks where each entry contains the 2D bounding box in the key \"box_2d\", the segmentation mask in key \"mask\", and the text label in the key \"label\". Use descriptive labels.",
        },
        DetectType::Points => PromptTemplate {
            prefix: "Point to the ",
            default_target: "items",
            suffix: " with no more than 10 items. The answer should follow the json format: [{\"point\": <point>, \"label\": <label1>}, ...]. The points are in [y, x] format normalized to 0-1000.",
        },
        DetectType::Boxes3D => PromptTemplate {
            prefix: "Output in json. Detect the 3D bounding boxes of ",
            default_target: "items",
            suffix: ", output no more than 10 items. Return a list where each entry contains the object name in \"label\" and its 3D bounding box in \"box_3d\".",
        },
    }
}

/// User-entered parts of a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PromptInput {
    pub target: String,
    /// Optional "label each one by" phrase, 2D boxes only.
    pub label_by: String,
}

impl PromptInput {
    pub fn for_type(detect_type: DetectType) -> Self {
        Self {
            target: prompt_template(detect_type).default_target.to_string(),
            label_by: String::new(),
        }
    }

    /// Full prompt text sent to the service.
    pub fn build(&self, detect_type: DetectType) -> String {
        let template = prompt_template(detect_type);
        let label = match detect_type {
            DetectType::Boxes2D if !self.label_by.trim().is_empty() => {
                format!(", with labels as \"{}\"", self.label_by.trim())
            }
            _ => String::new(),
        };
        format!("{}{}{}{}", template.prefix, self.target, label, template.suffix)
    }
}

/// One detection request as handed to a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRequest {
    pub detect_type: DetectType,
    pub prompt: String,
    pub temperature: f32,
    pub image_mime_type: String,
    /// Base64-encoded image bytes.
    pub image_data: String,
}

/// Transport to the detection service.
pub trait DetectionService: Send + Sync {
    /// Send the request and return the raw response text.
    fn detect(&self, request: &DetectionRequest) -> Result<String, DetectionError>;
}

/// Replays canned responses stored as `<directory>/<detect type slug>.json`.
#[derive(Debug, Clone)]
pub struct ReplayService {
    directory: PathBuf,
}

impl ReplayService {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn response_path(&self, detect_type: DetectType) -> PathBuf {
        self.directory.join(format!("{}.json", detect_type.slug()))
    }
}

impl DetectionService for ReplayService {
    fn detect(&self, request: &DetectionRequest) -> Result<String, DetectionError> {
        let path = self.response_path(request.detect_type);
        log::info!("Replaying response from {}", path.display());
        std::fs::read_to_string(&path)
            .map_err(|err| DetectionError::transport(format!("{}: {err}", path.display())))
    }
}

/// Runs an external program: request JSON on stdin, raw response on stdout.
#[derive(Debug, Clone)]
pub struct CommandService {
    program: String,
    args: Vec<String>,
}

impl CommandService {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl DetectionService for CommandService {
    fn detect(&self, request: &DetectionRequest) -> Result<String, DetectionError> {
        let payload = serde_json::to_vec(request).map_err(DetectionError::transport)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| DetectionError::transport(format!("cannot start {}: {err}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&payload).map_err(DetectionError::transport)?;
        }

        let output = child.wait_with_output().map_err(DetectionError::transport)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DetectionError::transport(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        String::from_utf8(output.stdout).map_err(DetectionError::transport)
    }
}

/// Ticket for an issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
}

/// Allows one request in flight and recognizes superseded responses.
///
/// The generation advances on every send and whenever the session is
/// invalidated (new media), so a response is accepted only if nothing has
/// replaced the state it was requested for.
#[derive(Debug, Default)]
pub struct RequestTracker {
    generation: u64,
    in_flight: Option<RequestTicket>,
}

impl RequestTracker {
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start a request, or `None` while another one is still in flight.
    pub fn begin(&mut self) -> Option<RequestTicket> {
        if self.is_busy() {
            return None;
        }
        self.generation += 1;
        let ticket = RequestTicket {
            generation: self.generation,
        };
        self.in_flight = Some(ticket);
        Some(ticket)
    }

    /// Settle a request. Returns true if its response should be applied.
    pub fn complete(&mut self, ticket: RequestTicket) -> bool {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
        }
        ticket.generation == self.generation
    }

    /// Mark any outstanding response as stale. The busy flag stays set
    /// until that request settles.
    pub fn invalidate(&mut self) {
        self.generation += 1;
    }
}
