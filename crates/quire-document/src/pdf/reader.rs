// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: a loaded source document and the single-document operations
// that read from it: split, extract page ranges, read metadata.
//
// Compress, watermark and protect live in their own modules as further
// `impl PdfReader` blocks.

use std::path::Path;

use lopdf::Document;
use quire_core::error::{QuireError, Result};
use quire_core::{
    DocumentInfo, EngineConfig, ExtractConfig, Metadata, Operation, OutputDocument, SplitConfig,
    SplitMode,
};
use tracing::{debug, info, instrument};

use super::graph::DocumentBuilder;
use super::loader::{check_size, declares_encryption, load_document};
use super::metadata::{compose, read_metadata, write_metadata};
use super::page_range::{self, PageGroup};
use super::serializer::{SaveOptions, serialize};

/// A parsed source PDF.
///
/// The wrapped `lopdf::Document` is never mutated: every operation builds a
/// fresh output document and serializes that.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Size of the bytes the document was parsed from.
    byte_size: u64,
    /// Whether the source file carried an /Encrypt dictionary.
    encrypted: bool,
    /// Name stamped into /Creator and /Producer of every output.
    tool_name: String,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Load a PDF from memory under the single-document size ceiling.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8], config: &EngineConfig) -> Result<Self> {
        Self::load(data, config.limits.single_document_bytes, config)
    }

    /// Load a PDF from memory under an explicit size ceiling.
    pub fn load(data: &[u8], limit: u64, config: &EngineConfig) -> Result<Self> {
        let document = load_document(data, limit)?;
        let reader = Self {
            document,
            byte_size: data.len() as u64,
            encrypted: declares_encryption(data),
            tool_name: config.tool_name.clone(),
        };
        debug!(pages = reader.page_count(), "PDF loaded from bytes");
        Ok(reader)
    }

    /// Open a PDF from the filesystem. The file size is checked against the
    /// ceiling before the file is read.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, config: &EngineConfig) -> Result<Self> {
        let path = path.as_ref();
        let limit = config.limits.single_document_bytes;
        check_size(std::fs::metadata(path)?.len(), limit)?;
        info!("Opening PDF: {}", path.display());
        let data = std::fs::read(path)?;
        Self::load(&data, limit, config)
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Source metadata. Unreadable fields are absent, never an error.
    pub fn metadata(&self) -> Metadata {
        read_metadata(&self.document)
    }

    /// Read-metadata operation: metadata plus page count and byte size.
    #[instrument(skip(self))]
    pub fn info(&self) -> DocumentInfo {
        let info = DocumentInfo {
            metadata: self.metadata(),
            page_count: self.page_count(),
            byte_size: self.byte_size,
            pdf_version: self.document.version.clone(),
            encrypted: self.encrypted,
        };
        info!(
            operation = %Operation::ReadMetadata,
            pages = info.page_count,
            bytes = info.byte_size,
            "Metadata read"
        );
        info
    }

    // -- Split / extract ------------------------------------------------------

    /// Split into one output per resolved page group.
    #[instrument(skip_all, fields(pages = self.page_count()))]
    pub fn split(&self, config: &SplitConfig) -> Result<Vec<OutputDocument>> {
        let groups = page_range::resolve(&config.mode, self.page_count())?;
        info!(
            mode = split_mode_name(&config.mode),
            outputs = groups.len(),
            "Splitting PDF"
        );
        self.write_groups(&groups, config.preserve_metadata, Operation::Split)
    }

    /// One output per valid `{from, to}` range, in the order given.
    #[instrument(skip_all, fields(pages = self.page_count(), ranges = config.ranges.len()))]
    pub fn extract_page_ranges(&self, config: &ExtractConfig) -> Result<Vec<OutputDocument>> {
        let groups = page_range::resolve_ranges(&config.ranges, self.page_count())?;
        info!(outputs = groups.len(), "Extracting page ranges");
        self.write_groups(&groups, config.preserve_metadata, Operation::ExtractRanges)
    }

    /// Rasterising pages needs a rendering engine, which Quire does not have.
    #[instrument(skip(self))]
    pub fn render_pages(&self) -> Result<Vec<Vec<u8>>> {
        Err(QuireError::NotImplemented(format!(
            "{} (no PDF rendering engine is available)",
            Operation::RenderPages
        )))
    }

    fn write_groups(
        &self,
        groups: &[PageGroup],
        preserve_metadata: bool,
        operation: Operation,
    ) -> Result<Vec<OutputDocument>> {
        if groups.is_empty() {
            return Err(QuireError::NoPagesSelected);
        }

        let mut outputs = Vec::with_capacity(groups.len());
        for group in groups {
            let builder = self.copy_pages(&group.pages, operation)?;
            let mut metadata = self.stamped_metadata(preserve_metadata, operation);
            metadata.title = Some(group.title.clone());
            let output = package(
                builder.into_document(),
                &group.title,
                &metadata,
                &SaveOptions::compressed(),
                operation,
            )?;
            outputs.push(output);
        }

        info!(%operation, outputs = outputs.len(), "Page groups written");
        Ok(outputs)
    }

    // -- Shared by operations -------------------------------------------------

    /// Copy the given 1-based pages, in order, into a fresh document.
    pub(crate) fn copy_pages(&self, pages: &[u32], operation: Operation) -> Result<DocumentBuilder> {
        let mut builder = DocumentBuilder::new();
        let mut copier = builder.copier(&self.document);
        for &page in pages {
            copier
                .copy_page_number(page)
                .map_err(|detail| QuireError::pdf(operation, detail))?;
        }
        debug!(pages = pages.len(), objects = copier.copied_objects(), "pages copied");
        Ok(builder)
    }

    /// Output metadata: the source fields when `preserve`, then the tool stamp.
    pub(crate) fn stamped_metadata(&self, preserve: bool, operation: Operation) -> Metadata {
        let preserved = preserve.then(|| self.metadata());
        compose(preserved.as_ref(), operation, &self.tool_name)
    }
}

/// Write `metadata` into `document`, serialize it and wrap the bytes.
pub(crate) fn package(
    mut document: Document,
    title: &str,
    metadata: &Metadata,
    options: &SaveOptions<'_>,
    operation: Operation,
) -> Result<OutputDocument> {
    write_metadata(&mut document, metadata);
    let page_count = document.get_pages().len() as u32;
    let bytes = serialize(&mut document, options, operation)?;
    debug!(title, page_count, bytes = bytes.len(), "output packaged");
    Ok(OutputDocument::new(title, bytes, page_count))
}

fn split_mode_name(mode: &SplitMode) -> &'static str {
    match mode {
        SplitMode::Pages(_) => "pages",
        SplitMode::Ranges(_) => "ranges",
        SplitMode::EqualParts(_) => "equal-parts",
        SplitMode::EveryPage => "every-page",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{page_text, sample_pdf};
    use quire_core::PageRange;

    fn reader(pages: u32) -> PdfReader {
        PdfReader::from_bytes(&sample_pdf(pages), &EngineConfig::default()).unwrap()
    }

    fn split(reader: &PdfReader, mode: SplitMode) -> Result<Vec<OutputDocument>> {
        reader.split(&SplitConfig {
            mode,
            preserve_metadata: false,
        })
    }

    #[test]
    fn split_explicit_pages() {
        let outputs = split(&reader(5), SplitMode::Pages(vec![4, 2])).unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].title, "Page 2");
        assert_eq!(outputs[1].title, "Page 4");

        let doc = Document::load_mem(&outputs[0].bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        assert!(page_text(&doc, 1).contains("(Page 2)"));
        assert_eq!(read_metadata(&doc).title.as_deref(), Some("Page 2"));
    }

    #[test]
    fn split_equal_parts_covers_document() {
        let outputs = split(&reader(7), SplitMode::EqualParts(3)).unwrap();
        let counts: Vec<u32> = outputs.iter().map(|o| o.page_count).collect();
        assert_eq!(counts, vec![3, 3, 1]);
        assert_eq!(outputs[2].title, "Part 3 (Pages 7-7)");
        assert_eq!(outputs[0].file_name(), "part-1-pages-1-3.pdf");
    }

    #[test]
    fn split_with_only_invalid_pages_fails() {
        let err = split(&reader(3), SplitMode::Pages(vec![0, 9])).unwrap_err();
        assert!(matches!(err, QuireError::NoValidPages { page_count: 3 }));
    }

    #[test]
    fn split_preserves_metadata_on_request() {
        let outputs = reader(2)
            .split(&SplitConfig {
                mode: SplitMode::EveryPage,
                preserve_metadata: true,
            })
            .unwrap();
        let metadata = read_metadata(&Document::load_mem(&outputs[1].bytes).unwrap());
        assert_eq!(metadata.author.as_deref(), Some("Tester"));
        assert_eq!(metadata.title.as_deref(), Some("Page 2"));
        assert_eq!(metadata.creator.as_deref(), Some("Quire Split"));
    }

    #[test]
    fn split_without_preservation_only_stamps() {
        let outputs = split(&reader(2), SplitMode::EveryPage).unwrap();
        let metadata = read_metadata(&Document::load_mem(&outputs[0].bytes).unwrap());
        assert!(metadata.author.is_none());
        assert_eq!(metadata.producer.as_deref(), Some("Quire"));
        assert!(metadata.creation_date.is_some());
    }

    #[test]
    fn extract_ranges_keeps_order_and_content() {
        let outputs = reader(6)
            .extract_page_ranges(&ExtractConfig {
                ranges: vec![PageRange::new(4, 6), PageRange::new(1, 2)],
                preserve_metadata: false,
            })
            .unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].title, "Pages 4-6");
        let doc = Document::load_mem(&outputs[0].bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
        assert!(page_text(&doc, 3).contains("(Page 6)"));
    }

    #[test]
    fn extract_out_of_bounds_range_rejected() {
        let err = reader(3)
            .extract_page_ranges(&ExtractConfig {
                ranges: vec![PageRange::new(2, 5)],
                preserve_metadata: false,
            })
            .unwrap_err();
        assert!(matches!(err, QuireError::NoValidPages { page_count: 3 }));
    }

    #[test]
    fn info_reports_source_without_mutation() {
        let reader = reader(4);
        let before = reader.document().objects.len();
        let info = reader.info();
        assert_eq!(info.page_count, 4);
        assert_eq!(info.metadata.title.as_deref(), Some("Sample"));
        assert_eq!(info.byte_size, sample_pdf(4).len() as u64);
        assert!(!info.encrypted);
        assert_eq!(reader.document().objects.len(), before);
    }

    #[test]
    fn render_pages_is_not_implemented() {
        let err = reader(1).render_pages().unwrap_err();
        assert!(matches!(err, QuireError::NotImplemented(_)));
    }

    #[test]
    fn oversized_source_rejected() {
        let mut config = EngineConfig::default();
        config.limits.single_document_bytes = 16;
        let err = PdfReader::from_bytes(&sample_pdf(1), &config).err().unwrap();
        assert!(matches!(err, QuireError::FileTooLarge { .. }));
    }

    #[test]
    fn open_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.pdf");
        std::fs::write(&path, sample_pdf(2)).unwrap();
        let reader = PdfReader::open(&path, &EngineConfig::default()).unwrap();
        assert_eq!(reader.page_count(), 2);
    }
}
