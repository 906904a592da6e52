// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Serializer: turns an output document into bytes.
//
// Classic files end in one xref table and trailer. Object-stream files pack
// every eligible object into Flate-compressed /ObjStm streams of at most
// `OBJECTS_PER_STREAM` entries, with a /XRef stream in place of the table.
// Both are written by lopdf.

use lopdf::xref::XrefType;
use lopdf::{Dictionary, Document, Object, Stream};
use quire_core::Operation;
use quire_core::error::{QuireError, Result};
use tracing::{debug, instrument};

use super::graph::{DEFAULT_MEDIA_BOX, box_to_object};
use super::security::Protection;

const OBJECTS_PER_STREAM: usize = 100;

/// How an output document is written.
#[derive(Default)]
pub struct SaveOptions<'a> {
    /// Flate-compress every stream that has no filter yet.
    pub compress_streams: bool,
    /// Pack objects into object streams with a cross-reference stream.
    /// Ignored when `security` is set.
    pub use_object_streams: bool,
    /// Append a blank Letter page when the document has none.
    pub add_default_page: bool,
    /// Encrypt strings and streams before writing.
    pub security: Option<&'a Protection<'a>>,
}

impl SaveOptions<'_> {
    /// Flate-compressed streams, classic xref.
    pub fn compressed() -> Self {
        Self {
            compress_streams: true,
            ..Default::default()
        }
    }
}

/// Serialize `doc` for the output of `operation`.
#[instrument(skip_all, fields(%operation, objects = doc.objects.len()))]
pub fn serialize(doc: &mut Document, options: &SaveOptions<'_>, operation: Operation) -> Result<Vec<u8>> {
    if options.add_default_page && doc.get_pages().is_empty() {
        add_blank_page(doc).map_err(|detail| QuireError::pdf(operation, detail))?;
    }
    if options.compress_streams {
        doc.compress();
    }
    if let Some(max_id) = doc.objects.keys().map(|(number, _)| *number).max() {
        doc.max_id = doc.max_id.max(max_id);
    }

    if let Some(security) = options.security {
        security
            .apply(doc)
            .map_err(|err| QuireError::Encryption(err.to_string()))?;
    }

    let object_streams = options.use_object_streams && options.security.is_none();
    let mut out = Vec::new();
    let written = if object_streams {
        let save_options = lopdf::SaveOptions::builder()
            .use_object_streams(true)
            .use_xref_streams(true)
            .max_objects_per_stream(OBJECTS_PER_STREAM)
            .compression_level(9)
            .build();
        doc.save_with_options(&mut out, save_options)
    } else {
        doc.reference_table.cross_reference_type = XrefType::CrossReferenceTable;
        doc.save_to(&mut out)
    };
    written.map_err(|err| QuireError::pdf(operation, format!("failed to write PDF: {err}")))?;

    debug!(bytes = out.len(), object_streams, "document serialized");
    Ok(out)
}

fn add_blank_page(doc: &mut Document) -> std::result::Result<(), String> {
    let pages_id = doc
        .catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|err| format!("catalog has no /Pages: {err}"))?;

    let content_id = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
    let page_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        ("MediaBox", box_to_object(DEFAULT_MEDIA_BOX)),
        ("Contents", Object::Reference(content_id)),
        ("Resources", Object::Dictionary(Dictionary::new())),
    ]));

    let pages = doc
        .get_dictionary_mut(pages_id)
        .map_err(|err| format!("cannot read /Pages: {err}"))?;
    if let Ok(Object::Array(kids)) = pages.get_mut(b"Kids") {
        kids.push(Object::Reference(page_id));
    } else {
        pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
    }
    pages.set("Count", Object::Integer(1));
    Ok(())
}

/// Shortest fixed-point rendering of a content-stream number, at most five
/// fractional digits (PDF has no exponent syntax).
pub(crate) fn format_real(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let text = format!("{value:.5}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" { "0".to_string() } else { text.to_string() }
}
