// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error kinds for a detection request.
//!
//! Every variant is terminal for the request that produced it: nothing is
//! retried automatically and the caller clears all overlays before showing
//! the message.

use thiserror::Error;

/// Number of characters of the raw response quoted in a parse failure.
pub const EXCERPT_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectionError {
    /// No image or frame is available to send.
    #[error("no image loaded: open an image before sending a request")]
    Acquisition,

    /// The detection service could not be reached or failed to answer.
    #[error("detection request failed: {0}")]
    Transport(String),

    /// The response is not valid JSON after fence stripping.
    #[error("response is not valid JSON ({message}); received: {excerpt}...")]
    Parse { message: String, excerpt: String },

    /// The response parsed but does not have the shape of the requested type.
    #[error("{}", shape_message(.index, .reason))]
    Shape { index: Option<usize>, reason: String },
}

fn shape_message(index: &Option<usize>, reason: &str) -> String {
    match index {
        Some(index) => format!("invalid detection record at index {index}: {reason}"),
        None => format!("invalid detection response: {reason}"),
    }
}

impl DetectionError {
    /// Build a parse error quoting the start of the offending text.
    pub fn parse(message: impl Into<String>, raw: &str) -> Self {
        Self::Parse {
            message: message.into(),
            excerpt: raw.chars().take(EXCERPT_CHARS).collect(),
        }
    }

    pub fn transport(message: impl std::fmt::Display) -> Self {
        Self::Transport(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_excerpt_is_truncated() {
        let raw = "x".repeat(250);
        match DetectionError::parse("bad", &raw) {
            DetectionError::Parse { excerpt, .. } => assert_eq!(excerpt.len(), EXCERPT_CHARS),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_shape_message_mentions_index() {
        let err = DetectionError::Shape {
            index: Some(3),
            reason: "missing field `label`".to_string(),
        };
        assert!(err.to_string().contains("index 3"));

        let err = DetectionError::Shape {
            index: None,
            reason: "expected an array".to_string(),
        };
        assert_eq!(err.to_string(), "invalid detection response: expected an array");
    }
}
