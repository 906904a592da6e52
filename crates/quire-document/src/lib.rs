// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// quire-document: The Quire PDF transformation engine.
//
// Provides PDF operations (split, extract ranges, merge, compress, watermark,
// protect, read metadata), image embedding for images-to-PDF conversion, and
// the serializer and standard security handler they write through.

pub mod image;
pub mod pdf;

#[cfg(test)]
mod test_support;

// Re-export the primary entry points so callers can use `quire_document::PdfReader` etc.
pub use image::processor::ImageProcessor;
pub use image::xobject::ImageXObject;
pub use pdf::merge::merge;
pub use pdf::reader::PdfReader;
pub use pdf::serializer::SaveOptions;
pub use pdf::writer::PdfWriter;
