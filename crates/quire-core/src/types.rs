// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Quire PDF engine.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// The transformation an output was produced by.
///
/// Used for the creator stamp (`"<tool> <operation>"`) and to name the
/// failing step in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Split,
    Merge,
    Compress,
    Watermark,
    Protect,
    ExtractRanges,
    ImagesToPdf,
    ReadMetadata,
    RenderPages,
}

impl Operation {
    /// Human-facing operation name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Split => "Split",
            Self::Merge => "Merge",
            Self::Compress => "Compress",
            Self::Watermark => "Watermark",
            Self::Protect => "Protect",
            Self::ExtractRanges => "Extract Pages",
            Self::ImagesToPdf => "Images to PDF",
            Self::ReadMetadata => "Read Metadata",
            Self::RenderPages => "PDF to Images",
        }
    }

    /// Whether the operation consumes several input files at once (and is
    /// therefore bounded by the aggregate size ceiling).
    pub fn is_multi_document(&self) -> bool {
        matches!(self, Self::Merge | Self::ImagesToPdf)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Document information dictionary fields.
///
/// Every field is optional: a source document may carry any subset of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<DateTime<FixedOffset>>,
    pub modification_date: Option<DateTime<FixedOffset>>,
}

impl Metadata {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.keywords.is_none()
            && self.creator.is_none()
            && self.producer.is_none()
            && self.creation_date.is_none()
            && self.modification_date.is_none()
    }
}

/// An inclusive span of 1-based page numbers.
///
/// Only valid when `1 <= from <= to <= page_count`; see [`PageRange::is_valid_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRange {
    pub from: u32,
    pub to: u32,
}

impl PageRange {
    pub fn new(from: u32, to: u32) -> Self {
        Self { from, to }
    }

    /// Whether the range lies entirely inside a document of `page_count` pages.
    pub fn is_valid_for(&self, page_count: u32) -> bool {
        self.from >= 1 && self.from <= self.to && self.to <= page_count
    }

    /// Number of pages covered. Zero for an inverted range.
    pub fn len(&self) -> u32 {
        if self.to < self.from {
            0
        } else {
            self.to - self.from + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pages(&self) -> impl Iterator<Item = u32> {
        self.from..=self.to
    }
}

impl std::fmt::Display for PageRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

impl std::str::FromStr for PageRange {
    type Err = crate::QuireError;

    /// Parse `"3"` or `"2-5"`. Bounds are not checked here; the resolver does
    /// that against the real page count.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim().parse::<u32>().map_err(|_| {
                crate::QuireError::Config(format!("'{s}' is not a page number or range"))
            })
        };
        match s.split_once('-') {
            Some((from, to)) => Ok(Self::new(parse(from)?, parse(to)?)),
            None => {
                let page = parse(s)?;
                Ok(Self::new(page, page))
            }
        }
    }
}

/// A named input payload (PDF or image bytes).
#[derive(Debug, Clone)]
pub struct InputFile {
    /// Original file name, used for bookmarks and log messages.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// File name without its final extension (`"report.v2.pdf"` -> `"report.v2"`).
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.name,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// One serialised PDF produced by an operation.
#[derive(Debug, Clone)]
pub struct OutputDocument {
    /// Descriptive title, also written to the output's `/Title`.
    pub title: String,
    /// Filename-safe rendering of the title, without extension.
    pub file_stem: String,
    pub bytes: Vec<u8>,
    pub page_count: u32,
}

impl OutputDocument {
    pub fn new(title: impl Into<String>, bytes: Vec<u8>, page_count: u32) -> Self {
        let title = title.into();
        let file_stem = slugify(&title);
        Self {
            title,
            file_stem,
            bytes,
            page_count,
        }
    }

    /// Suggested download name.
    pub fn file_name(&self) -> String {
        format!("{}.pdf", self.file_stem)
    }
}

/// Lowercase, dash-separated rendering of a title: `"Part 1 (Pages 1-3)"`
/// becomes `"part-1-pages-1-3"`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("document");
    }
    slug
}

/// Result of the read-metadata operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub metadata: Metadata,
    pub page_count: u32,
    pub byte_size: u64,
    pub pdf_version: String,
    pub encrypted: bool,
}

/// Result of a merge: the combined document plus inputs that were skipped.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub document: OutputDocument,
    /// Names of inputs that could not be parsed and were left out.
    pub skipped: Vec<String>,
}

/// Result of images-to-PDF: one page per embedded image.
#[derive(Debug, Clone)]
pub struct ImagesOutcome {
    pub document: OutputDocument,
    /// Names of images that could not be embedded.
    pub skipped: Vec<String>,
}

/// Result of compression with before/after sizes.
#[derive(Debug, Clone)]
pub struct CompressOutcome {
    pub document: OutputDocument,
    pub original_size: u64,
    pub compressed_size: u64,
    pub images_recompressed: usize,
}

impl CompressOutcome {
    /// Fraction of the original size saved, in `0.0..=1.0` (zero when the
    /// output grew).
    pub fn savings_ratio(&self) -> f64 {
        if self.original_size == 0 || self.compressed_size >= self.original_size {
            return 0.0;
        }
        1.0 - self.compressed_size as f64 / self.original_size as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_validity() {
        assert!(PageRange::new(1, 3).is_valid_for(3));
        assert!(PageRange::new(2, 2).is_valid_for(3));
        assert!(!PageRange::new(0, 2).is_valid_for(3));
        assert!(!PageRange::new(3, 2).is_valid_for(3));
        assert!(!PageRange::new(2, 5).is_valid_for(3));
    }

    #[test]
    fn range_parsing() {
        assert_eq!("2-5".parse::<PageRange>().unwrap(), PageRange::new(2, 5));
        assert_eq!(" 4 ".parse::<PageRange>().unwrap(), PageRange::new(4, 4));
        assert!("a-b".parse::<PageRange>().is_err());
    }

    #[test]
    fn inverted_range_is_empty() {
        assert_eq!(PageRange::new(5, 2).len(), 0);
        assert!(PageRange::new(5, 2).is_empty());
        assert_eq!(PageRange::new(2, 5).len(), 4);
    }

    #[test]
    fn slug_from_titles() {
        assert_eq!(slugify("Page 2"), "page-2");
        assert_eq!(slugify("Part 1 (Pages 1-3)"), "part-1-pages-1-3");
        assert_eq!(slugify("***"), "document");
    }

    #[test]
    fn input_stem_strips_last_extension() {
        assert_eq!(InputFile::new("report.v2.pdf", vec![]).stem(), "report.v2");
        assert_eq!(InputFile::new("README", vec![]).stem(), "README");
        assert_eq!(InputFile::new(".hidden", vec![]).stem(), ".hidden");
    }

    #[test]
    fn operation_flags() {
        assert!(Operation::Merge.is_multi_document());
        assert!(Operation::ImagesToPdf.is_multi_document());
        assert!(!Operation::Split.is_multi_document());
        assert_eq!(Operation::ExtractRanges.to_string(), "Extract Pages");
    }
}
