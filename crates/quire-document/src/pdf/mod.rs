// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: loading, page selection, page copying, metadata, serialization
// and the transform operations built on them.

pub mod graph;
pub mod loader;
pub mod metadata;
pub mod page_range;
pub mod security;
pub mod serializer;

pub mod compress;
pub mod merge;
pub mod protect;
pub mod reader;
pub mod watermark;
pub mod writer;

pub use reader::PdfReader;
pub use writer::PdfWriter;
