// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Overlay document serialization and deserialization.
//!
//! This module handles exporting and importing overlay documents in YAML
//! and JSON formats, selected by file extension.

use crate::models::document::OverlayDocument;
use anyhow::{bail, Context, Result};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path.extension().and_then(|s| s.to_str());
        match extension {
            Some("yaml") | Some("yml") => Ok(DocumentFormat::Yaml),
            Some("json") => Ok(DocumentFormat::Json),
            _ => bail!("Unsupported file extension: {:?}", extension),
        }
    }
}

/// Export an overlay document; the format follows the file extension.
pub fn export_document(data: &OverlayDocument, path: &Path) -> Result<()> {
    let text = match DocumentFormat::from_path(path)? {
        DocumentFormat::Yaml => serde_yaml::to_string(data)?,
        DocumentFormat::Json => serde_json::to_string_pretty(data)?,
    };
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Import an overlay document; the format follows the file extension.
pub fn import_document(path: &Path) -> Result<OverlayDocument> {
    let format = DocumentFormat::from_path(path)?;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let data = match format {
        DocumentFormat::Yaml => serde_yaml::from_str(&text)?,
        DocumentFormat::Json => serde_json::from_str(&text)?,
    };
    Ok(data)
}
