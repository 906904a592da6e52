// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Merge: concatenates every page of every input, in input order, into one
// new document, optionally with one bookmark per source file.

use lopdf::{Bookmark, Object, ObjectId};
use quire_core::error::{QuireError, Result};
use quire_core::{EngineConfig, InputFile, MergeConfig, MergeOutcome, Metadata, Operation};
use tracing::{debug, info, instrument, warn};

use super::graph::DocumentBuilder;
use super::loader::{check_aggregate_size, limit_for, parse_document};
use super::metadata::{compose, read_metadata};
use super::reader::package;
use super::serializer::SaveOptions;

/// Merge `inputs` in order.
///
/// Inputs that fail to parse are skipped and listed in
/// [`MergeOutcome::skipped`]; pages already merged are kept.
#[instrument(skip_all, fields(inputs = inputs.len()))]
pub fn merge(inputs: &[InputFile], config: &MergeConfig, engine: &EngineConfig) -> Result<MergeOutcome> {
    if inputs.len() < 2 {
        return Err(QuireError::InsufficientInputs {
            provided: inputs.len(),
        });
    }
    check_aggregate_size(inputs, limit_for(Operation::Merge, &engine.limits))?;
    info!(
        bookmarks = config.add_bookmarks,
        preserve_metadata = config.preserve_metadata,
        "Merging PDFs"
    );

    let mut builder = DocumentBuilder::new();
    let mut skipped = Vec::new();
    let mut bookmarks: Vec<(String, ObjectId)> = Vec::new();
    let mut first_metadata: Option<Metadata> = None;

    for (index, input) in inputs.iter().enumerate() {
        let source = match parse_document(&input.bytes) {
            Ok(source) => source,
            Err(err) => {
                warn!(name = %input.name, %err, "input skipped");
                skipped.push(input.name.clone());
                continue;
            }
        };
        if index == 0 && config.preserve_metadata {
            first_metadata = Some(read_metadata(&source));
        }

        let first_page = builder.page_ids().len();
        {
            let mut copier = builder.copier(&source);
            for page_id in source.get_pages().into_values() {
                copier
                    .copy_page(page_id)
                    .map_err(|detail| QuireError::pdf(Operation::Merge, detail))?;
            }
        }
        if let Some(&page_id) = builder.page_ids().get(first_page) {
            bookmarks.push((input.stem().to_string(), page_id));
        }
        debug!(name = %input.name, pages = builder.page_count(), "input merged");
    }

    if builder.page_count() == 0 {
        return Err(QuireError::InvalidDocument(
            "none of the merge inputs could be read".into(),
        ));
    }

    if config.add_bookmarks
        && let Err(detail) = add_outline(&mut builder, &bookmarks)
    {
        warn!(%detail, "bookmarks could not be added; continuing without them");
    }

    let metadata = compose(first_metadata.as_ref(), Operation::Merge, &engine.tool_name);
    let document = package(
        builder.into_document(),
        "Merged",
        &metadata,
        &SaveOptions::compressed(),
        Operation::Merge,
    )?;
    info!(
        pages = document.page_count,
        skipped = skipped.len(),
        bytes = document.bytes.len(),
        "Merge complete"
    );
    Ok(MergeOutcome { document, skipped })
}

/// One top-level bookmark per `(title, first page)`, built into the
/// catalog's /Outlines.
fn add_outline(builder: &mut DocumentBuilder, entries: &[(String, ObjectId)]) -> std::result::Result<(), String> {
    let doc = builder.document_mut();
    for (title, page_id) in entries {
        doc.add_bookmark(Bookmark::new(title.clone(), [0.0, 0.0, 0.0], 0, *page_id), None);
    }
    let Some(outlines_id) = doc.build_outline() else {
        return Ok(());
    };

    let catalog = builder.catalog_mut().ok_or("output has no catalog")?;
    catalog.set("Outlines", Object::Reference(outlines_id));
    catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));
    debug!(items = entries.len(), "outline added");
    Ok(())
}
