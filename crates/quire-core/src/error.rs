// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Quire.

use thiserror::Error;

use crate::types::Operation;

/// Top-level error type for all Quire operations.
#[derive(Debug, Error)]
pub enum QuireError {
    // -- Input validation --
    #[error("file is too large: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("invalid PDF document: {0} (ensure the file is a valid, unencrypted PDF)")]
    InvalidDocument(String),

    // -- Page selection --
    #[error("no valid pages selected: the document has {page_count} pages")]
    NoValidPages { page_count: u32 },

    #[error("no pages selected")]
    NoPagesSelected,

    #[error("at least 2 documents are required, got {provided}")]
    InsufficientInputs { provided: usize },

    // -- Watermark --
    #[error("watermark text or image is required")]
    EmptyWatermark,

    #[error("watermark image could not be embedded: {0} (use a PNG or JPEG image)")]
    InvalidWatermarkImage(String),

    // -- Password protection --
    #[error("password must be between 6 and 32 characters, got {length}")]
    WeakPassword { length: usize },

    #[error("password may only contain printable ASCII characters")]
    InvalidPasswordCharacters,

    #[error("encryption failed: {0}")]
    Encryption(String),

    // -- Processing --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("{operation} failed: {detail}")]
    Pdf {
        operation: Operation,
        detail: String,
    },

    #[error("{0} is not implemented")]
    NotImplemented(String),

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Fieldless discriminant of [`QuireError`], for callers that branch on the
/// kind of failure rather than its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FileTooLarge,
    InvalidDocument,
    NoValidPages,
    NoPagesSelected,
    InsufficientInputs,
    EmptyWatermark,
    InvalidWatermarkImage,
    WeakPassword,
    InvalidPasswordCharacters,
    Encryption,
    Image,
    Pdf,
    NotImplemented,
    Config,
    Io,
    Serialization,
}

impl QuireError {
    /// Build a [`QuireError::Pdf`] for a library-level failure inside `operation`.
    pub fn pdf(operation: Operation, detail: impl std::fmt::Display) -> Self {
        Self::Pdf {
            operation,
            detail: detail.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileTooLarge { .. } => ErrorKind::FileTooLarge,
            Self::InvalidDocument(_) => ErrorKind::InvalidDocument,
            Self::NoValidPages { .. } => ErrorKind::NoValidPages,
            Self::NoPagesSelected => ErrorKind::NoPagesSelected,
            Self::InsufficientInputs { .. } => ErrorKind::InsufficientInputs,
            Self::EmptyWatermark => ErrorKind::EmptyWatermark,
            Self::InvalidWatermarkImage(_) => ErrorKind::InvalidWatermarkImage,
            Self::WeakPassword { .. } => ErrorKind::WeakPassword,
            Self::InvalidPasswordCharacters => ErrorKind::InvalidPasswordCharacters,
            Self::Encryption(_) => ErrorKind::Encryption,
            Self::ImageError(_) => ErrorKind::Image,
            Self::Pdf { .. } => ErrorKind::Pdf,
            Self::NotImplemented(_) => ErrorKind::NotImplemented,
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Validation failures are detected before any document is parsed.
    pub fn is_validation(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::FileTooLarge
                | ErrorKind::NoPagesSelected
                | ErrorKind::InsufficientInputs
                | ErrorKind::EmptyWatermark
                | ErrorKind::WeakPassword
                | ErrorKind::InvalidPasswordCharacters
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, QuireError>;
