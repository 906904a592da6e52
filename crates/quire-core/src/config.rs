// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration and the per-operation option records.
//
// Each operation recognises exactly the fields of its own config struct;
// anything absent falls back to the `Default` impl.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QuireError, Result};
use crate::types::PageRange;

const MIB: u64 = 1024 * 1024;

/// Size ceilings checked before any document is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Ceiling for split, extract, compress, watermark, protect and read-metadata.
    pub single_document_bytes: u64,
    /// Aggregate ceiling for merge and images-to-PDF.
    pub multi_document_bytes: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            single_document_bytes: 50 * MIB,
            multi_document_bytes: 100 * MIB,
        }
    }
}

/// Engine-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name stamped into `/Producer` and prefixed to `/Creator`.
    pub tool_name: String,
    pub limits: Limits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tool_name: "Quire".to_string(),
            limits: Limits::default(),
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.tool_name.trim().is_empty() {
            return Err(QuireError::Config("tool_name must not be empty".into()));
        }
        if self.limits.single_document_bytes == 0 || self.limits.multi_document_bytes == 0 {
            return Err(QuireError::Config("size limits must be non-zero".into()));
        }
        Ok(())
    }
}

// -- Split / extract ----------------------------------------------------------

/// How the pages of a document are grouped into split outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitMode {
    /// One output per listed page (1-based).
    Pages(Vec<u32>),
    /// One output per valid range.
    Ranges(Vec<PageRange>),
    /// `k` contiguous, roughly equal parts.
    EqualParts(u32),
    /// One output per page of the document.
    EveryPage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub mode: SplitMode,
    pub preserve_metadata: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            mode: SplitMode::EveryPage,
            preserve_metadata: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub ranges: Vec<PageRange>,
    pub preserve_metadata: bool,
}

// -- Merge --------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Add one outline entry per source file, named after the file.
    pub add_bookmarks: bool,
    /// Copy metadata from the first input.
    pub preserve_metadata: bool,
}

// -- Compress -----------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompressionLevel {
    Low,
    #[default]
    Medium,
    High,
    Maximum,
}

impl CompressionLevel {
    /// Pixel-dimension scale applied to re-encoded raster images.
    pub fn scale_factor(&self) -> f32 {
        match self {
            Self::Low => 0.95,
            Self::Medium => 0.85,
            Self::High => 0.65,
            Self::Maximum => 0.45,
        }
    }

    /// JPEG quality used when re-encoding images.
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            Self::Low => 85,
            Self::Medium => 75,
            Self::High => 60,
            Self::Maximum => 45,
        }
    }

    /// Only the maximum level packs objects into object streams.
    pub fn uses_object_streams(&self) -> bool {
        matches!(self, Self::Maximum)
    }
}

impl FromStr for CompressionLevel {
    type Err = QuireError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "maximum" | "max" => Ok(Self::Maximum),
            other => Err(QuireError::Config(format!(
                "unknown compression level '{other}' (expected low, medium, high or maximum)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressConfig {
    pub level: CompressionLevel,
    pub preserve_metadata: bool,
}

// -- Watermark ----------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkPosition {
    #[default]
    Center,
    Diagonal,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl FromStr for WatermarkPosition {
    type Err = QuireError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "center" | "centre" => Ok(Self::Center),
            "diagonal" => Ok(Self::Diagonal),
            "top-left" => Ok(Self::TopLeft),
            "top-right" => Ok(Self::TopRight),
            "bottom-left" => Ok(Self::BottomLeft),
            "bottom-right" => Ok(Self::BottomRight),
            other => Err(QuireError::Config(format!("unknown watermark position '{other}'"))),
        }
    }
}

/// An RGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl RgbColor {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const fn gray() -> Self {
        Self::new(0.5, 0.5, 0.5)
    }

    /// Components clamped to the valid range.
    pub fn clamped(&self) -> Self {
        Self::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
        )
    }
}

impl Default for RgbColor {
    fn default() -> Self {
        Self::gray()
    }
}

impl FromStr for RgbColor {
    type Err = QuireError;

    /// Parse `#rrggbb` / `rrggbb` hex notation.
    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(QuireError::Config(format!("'{s}' is not a #rrggbb colour")));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| QuireError::Config(format!("'{s}' is not a #rrggbb colour")))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    pub text: Option<String>,
    /// PNG or JPEG bytes.
    #[serde(skip)]
    pub image: Option<Vec<u8>>,
    pub position: WatermarkPosition,
    /// `0.0` (invisible) to `1.0` (opaque).
    pub opacity: f32,
    pub font_size: f32,
    pub color: RgbColor,
    pub preserve_metadata: bool,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            text: None,
            image: None,
            position: WatermarkPosition::Center,
            opacity: 0.5,
            font_size: 48.0,
            color: RgbColor::gray(),
            preserve_metadata: false,
        }
    }
}

impl WatermarkConfig {
    /// Watermark text, if any non-blank text was given.
    pub fn effective_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

// -- Protect ------------------------------------------------------------------

/// Access permissions granted to users who open the document with the user
/// password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permissions {
    pub print: bool,
    pub modify: bool,
    pub copy: bool,
    pub annotate: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            print: true,
            modify: false,
            copy: true,
            annotate: false,
        }
    }
}

impl Permissions {
    pub fn all() -> Self {
        Self {
            print: true,
            modify: true,
            copy: true,
            annotate: true,
        }
    }

    /// The `/P` value of the encryption dictionary (ISO 32000-1 table 22).
    ///
    /// Reserved bits 7-8 and 13-32 are set; bits 1-2 are clear.
    pub fn to_p_value(&self) -> i32 {
        let mut bits: u32 = 0xFFFF_F0C0;
        if self.print {
            bits |= 1 << 2; // bit 3
            bits |= 1 << 11; // bit 12, high-quality print
        }
        if self.modify {
            bits |= 1 << 3; // bit 4
            bits |= 1 << 10; // bit 11, assemble
        }
        if self.copy {
            bits |= 1 << 4; // bit 5
            bits |= 1 << 9; // bit 10, extract for accessibility
        }
        if self.annotate {
            bits |= 1 << 5; // bit 6
            bits |= 1 << 8; // bit 9, fill forms
        }
        bits as i32
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectConfig {
    pub user_password: String,
    /// Generated randomly when absent.
    pub owner_password: Option<String>,
    pub permissions: Permissions,
}

// -- Images to PDF ------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageSize {
    #[default]
    A4,
    A3,
    Letter,
    Legal,
}

impl PageSize {
    /// Portrait dimensions in PostScript points (width, height).
    pub fn dimensions_pt(&self) -> (f32, f32) {
        match self {
            Self::A4 => (595.28, 841.89),
            Self::A3 => (841.89, 1190.55),
            Self::Letter => (612.0, 792.0),
            Self::Legal => (612.0, 1008.0),
        }
    }
}

impl FromStr for PageSize {
    type Err = QuireError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "a3" => Ok(Self::A3),
            "letter" => Ok(Self::Letter),
            "legal" => Ok(Self::Legal),
            other => Err(QuireError::Config(format!("unknown page size '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl FromStr for Orientation {
    type Err = QuireError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "portrait" => Ok(Self::Portrait),
            "landscape" => Ok(Self::Landscape),
            other => Err(QuireError::Config(format!("unknown orientation '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesToPdfConfig {
    pub page_size: PageSize,
    pub orientation: Orientation,
    /// Margin on every side, in points.
    pub margin: f32,
    pub fit_to_page: bool,
    pub maintain_aspect_ratio: bool,
    /// Quality for images that must be re-encoded to JPEG.
    pub jpeg_quality: u8,
}

impl Default for ImagesToPdfConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
            margin: 20.0,
            fit_to_page: true,
            maintain_aspect_ratio: true,
            jpeg_quality: 92,
        }
    }
}

impl ImagesToPdfConfig {
    /// Page dimensions in points after applying the orientation.
    pub fn page_dimensions(&self) -> (f32, f32) {
        let (w, h) = self.page_size.dimensions_pt();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }
}
