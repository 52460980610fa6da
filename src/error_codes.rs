use std::fmt;

use anyhow::Error;
use serde::Serialize;
use serde_json::{json, Value};

use crate::color::PALETTE_NAMES;
use crate::error::GradientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodedErrorKind {
    Usage,
    Precondition,
    Runtime,
}

/// An error with a stable machine-readable code, surfaced by `--json`.
#[derive(Debug, Clone)]
pub struct CodedError {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
    pub kind: CodedErrorKind,
}

impl CodedError {
    pub fn usage(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            kind: CodedErrorKind::Usage,
        }
    }

    pub fn runtime(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            kind: CodedErrorKind::Runtime,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            ok: false,
            error: ErrorEnvelopeBody {
                code: self.code.to_owned(),
                kind: self.kind,
                message: self.message.clone(),
                details: self.details.clone(),
            },
        }
    }
}

impl From<&GradientError> for CodedError {
    fn from(error: &GradientError) -> Self {
        let message = error.to_string();
        match error {
            GradientError::InvalidHexColor { value, .. } => {
                Self::usage("INVALID_HEX_COLOR", message).with_details(json!({
                    "provided": value,
                    "accepted": ["#RGB", "#RRGGBB"]
                }))
            }
            GradientError::UnknownPalette { name } => {
                Self::usage("UNKNOWN_PALETTE", message).with_details(json!({
                    "provided": name,
                    "allowed": PALETTE_NAMES
                }))
            }
            GradientError::PaletteConflict => {
                Self::usage("PALETTE_CONFLICT", message).with_details(json!({
                    "accepted": ["palette", "colors"]
                }))
            }
            GradientError::DigestLength { actual } => Self {
                code: "DIGEST_LENGTH",
                message,
                details: Some(json!({ "expected": 32, "actual": actual })),
                kind: CodedErrorKind::Precondition,
            },
            GradientError::DimensionMismatch { left, right } => Self {
                code: "DIMENSION_MISMATCH",
                message,
                details: Some(json!({ "left": [left.0, left.1], "right": [right.0, right.1] })),
                kind: CodedErrorKind::Precondition,
            },
            GradientError::DimensionsOverflow | GradientError::BufferLength { .. } => Self {
                code: "INVALID_DIMENSIONS",
                message,
                details: None,
                kind: CodedErrorKind::Precondition,
            },
        }
    }
}

impl fmt::Display for CodedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CodedError {}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub ok: bool,
    pub error: ErrorEnvelopeBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelopeBody {
    pub code: String,
    pub kind: CodedErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// First coded error in the chain, falling back to a core [`GradientError`].
pub fn find_coded_error(error: &Error) -> Option<CodedError> {
    error.chain().find_map(|cause| {
        cause
            .downcast_ref::<CodedError>()
            .cloned()
            .or_else(|| cause.downcast_ref::<GradientError>().map(CodedError::from))
    })
}
