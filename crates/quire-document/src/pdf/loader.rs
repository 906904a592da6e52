// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document loader: size ceilings and parsing of raw PDF bytes.
//
// The size check always runs before `lopdf` sees the bytes, so an oversized
// upload is rejected without paying for a parse.

use lopdf::Document;
use quire_core::error::{QuireError, Result};
use quire_core::{InputFile, Limits, Operation};
use tracing::{debug, instrument, warn};

/// Ceiling that applies to `operation` under `limits`.
pub fn limit_for(operation: Operation, limits: &Limits) -> u64 {
    if operation.is_multi_document() {
        limits.multi_document_bytes
    } else {
        limits.single_document_bytes
    }
}

/// Fail with `FileTooLarge` when `size` exceeds `limit`.
pub fn check_size(size: u64, limit: u64) -> Result<()> {
    if size > limit {
        warn!(size, limit, "input rejected by size ceiling");
        return Err(QuireError::FileTooLarge { size, limit });
    }
    Ok(())
}

/// Check the summed size of a batch against the aggregate ceiling.
pub fn check_aggregate_size(inputs: &[InputFile], limit: u64) -> Result<()> {
    let total: u64 = inputs.iter().map(InputFile::size).sum();
    check_size(total, limit)
}

/// Parse PDF bytes into a document, after checking `limit`.
///
/// Parse failures and page-less documents are reported as `InvalidDocument`.
#[instrument(skip_all, fields(bytes_len = data.len(), limit = limit))]
pub fn load_document(data: &[u8], limit: u64) -> Result<Document> {
    check_size(data.len() as u64, limit)?;
    parse_document(data)
}

/// Parse PDF bytes without a size check. Callers are expected to have run
/// [`check_size`] or [`check_aggregate_size`] already.
pub(crate) fn parse_document(data: &[u8]) -> Result<Document> {
    if !looks_like_pdf(data) {
        return Err(QuireError::InvalidDocument("missing %PDF header".into()));
    }

    let mut document = Document::load_mem(data)
        .map_err(|err| QuireError::InvalidDocument(format!("failed to parse PDF: {err}")))?;

    // Only documents with an empty user password can be transformed.
    if document.is_encrypted() {
        document.decrypt("").map_err(|err| {
            QuireError::InvalidDocument(format!("document is password protected: {err}"))
        })?;
        debug!("encrypted source opened with the empty user password");
    }

    let pages = document.get_pages().len();
    if pages == 0 {
        return Err(QuireError::InvalidDocument("document has no pages".into()));
    }

    debug!(pages, version = %document.version, "PDF parsed");
    Ok(document)
}

/// Whether the raw file declares an /Encrypt dictionary. Checked on the
/// bytes because a successful decrypt removes it from the parsed trailer.
pub fn declares_encryption(data: &[u8]) -> bool {
    data.windows(8).any(|w| w == b"/Encrypt")
}

/// The header may be preceded by up to 1024 bytes of junk (ISO 32000-1 annex H).
fn looks_like_pdf(data: &[u8]) -> bool {
    let window = &data[..data.len().min(1024 + 5)];
    window.windows(5).any(|w| w == b"%PDF-")
}
