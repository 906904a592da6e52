// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the people using the tools.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Raw library messages never reach the user; at most they are appended in
// parentheses so a support request can quote them.

use crate::error::QuireError;

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether resubmitting the same input could succeed.
    pub retriable: bool,
}

/// Convert a `QuireError` into a `HumanError` suitable for display.
pub fn humanize_error(err: &QuireError) -> HumanError {
    match err {
        QuireError::FileTooLarge { size, limit } => HumanError {
            message: "This file is too large.".into(),
            suggestion: format!(
                "The limit is {}, but the file is {}. Try a smaller file or split it first.",
                format_bytes(*limit),
                format_bytes(*size)
            ),
            retriable: false,
        },

        QuireError::InvalidDocument(detail) => HumanError {
            message: "We couldn't open this PDF.".into(),
            suggestion: format!(
                "Make sure the file is a valid PDF that isn't password-protected. ({detail})"
            ),
            retriable: false,
        },

        QuireError::NoValidPages { page_count } => HumanError {
            message: "None of the selected pages exist in this document.".into(),
            suggestion: format!("This document has {page_count} pages. Choose pages between 1 and {page_count}."),
            retriable: false,
        },

        QuireError::NoPagesSelected => HumanError {
            message: "No pages were selected.".into(),
            suggestion: "Choose at least one page or page range, then try again.".into(),
            retriable: false,
        },

        QuireError::InsufficientInputs { provided } => HumanError {
            message: "Not enough files to combine.".into(),
            suggestion: format!("Add at least 2 files (you added {provided})."),
            retriable: false,
        },

        QuireError::EmptyWatermark => HumanError {
            message: "The watermark is empty.".into(),
            suggestion: "Type some watermark text or choose a watermark image.".into(),
            retriable: false,
        },

        QuireError::InvalidWatermarkImage(_) => HumanError {
            message: "We couldn't use this watermark image.".into(),
            suggestion: "Use a PNG or JPEG image for the watermark.".into(),
            retriable: false,
        },

        QuireError::WeakPassword { .. } => HumanError {
            message: "This password is too short or too long.".into(),
            suggestion: "Use a password between 6 and 32 characters long.".into(),
            retriable: false,
        },

        QuireError::InvalidPasswordCharacters => HumanError {
            message: "This password contains characters we can't use.".into(),
            suggestion: "Use only letters, digits, spaces and common symbols (no accents or emoji).".into(),
            retriable: false,
        },

        QuireError::Encryption(detail) => HumanError {
            message: "We couldn't protect this document.".into(),
            suggestion: format!("Try again. If it keeps failing, try a different file. ({detail})"),
            retriable: true,
        },

        QuireError::ImageError(detail) => HumanError {
            message: "We couldn't use these images.".into(),
            suggestion: format!("Use PNG, JPEG, GIF, BMP, TIFF or WebP images. ({detail})"),
            retriable: false,
        },

        QuireError::Pdf { operation, detail } => HumanError {
            message: format!("{operation} didn't work for this file."),
            suggestion: format!("Make sure the file is a valid PDF and try again. ({detail})"),
            retriable: true,
        },

        QuireError::NotImplemented(what) => HumanError {
            message: format!("{what} isn't available yet."),
            suggestion: "Try one of the other tools.".into(),
            retriable: false,
        },

        QuireError::Config(detail) => HumanError {
            message: "A setting is invalid.".into(),
            suggestion: format!("Check the options you chose. ({detail})"),
            retriable: false,
        },

        QuireError::Io(e) => HumanError {
            message: "We couldn't read or save a file.".into(),
            suggestion: format!("Check the file still exists and there is free space. ({e})"),
            retriable: true,
        },

        QuireError::Serialization(e) => HumanError {
            message: "The settings file is damaged.".into(),
            suggestion: format!("Delete or fix the settings file and try again. ({e})"),
            retriable: false,
        },
    }
}

/// Render a byte count with a binary unit: `52428800` -> `"50.0 MB"`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["bytes", "KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{bytes} bytes");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Operation;

    #[test]
    fn too_large_mentions_both_sizes() {
        let human = humanize_error(&QuireError::FileTooLarge {
            size: 60 * 1024 * 1024,
            limit: 50 * 1024 * 1024,
        });
        assert!(human.suggestion.contains("50.0 MB"));
        assert!(human.suggestion.contains("60.0 MB"));
        assert!(!human.retriable);
    }

    #[test]
    fn page_count_guides_correction() {
        let human = humanize_error(&QuireError::NoValidPages { page_count: 3 });
        assert!(human.suggestion.contains("between 1 and 3"));
    }

    #[test]
    fn pdf_error_names_operation() {
        let human = humanize_error(&QuireError::pdf(Operation::Merge, "bad xref"));
        assert!(human.message.starts_with("Merge"));
        assert!(human.suggestion.contains("bad xref"));
    }

    #[test]
    fn byte_formatting() {
        assert_eq!(format_bytes(512), "512 bytes");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(100 * 1024 * 1024), "100.0 MB");
    }
}
