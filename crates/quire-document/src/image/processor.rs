// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decoding, resampling and JPEG re-encoding of raster
// images using the `image` crate.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use quire_core::error::{QuireError, Result};
use tracing::{debug, instrument};

/// Image pipeline operating on a single in-memory image.
///
/// Transformations consume `self` and return a new processor, so calls chain:
///
/// ```ignore
/// let jpeg = ImageProcessor::from_bytes(&png)?
///     .scale(0.45)
///     .to_jpeg_bytes(45)?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode an encoded image (PNG, JPEG, GIF, BMP, TIFF, WebP).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(data)
            .map_err(|err| QuireError::ImageError(format!("failed to decode image: {err}")))?;
        debug!(width = image.width(), height = image.height(), "image decoded from bytes");
        Ok(Self { image })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Whether any pixel is not fully opaque.
    pub fn has_alpha(&self) -> bool {
        match &self.image {
            DynamicImage::ImageRgba8(rgba) => rgba.pixels().any(|p| p.0[3] < 255),
            DynamicImage::ImageLumaA8(la) => la.pixels().any(|p| p.0[1] < 255),
            other if other.color().has_alpha() => other.to_rgba8().pixels().any(|p| p.0[3] < 255),
            _ => false,
        }
    }

    /// Single-channel image.
    pub fn is_grayscale(&self) -> bool {
        matches!(
            self.image,
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageLuma16(_)
        )
    }

    // -- Transformations ------------------------------------------------------

    /// Scale both pixel dimensions by `factor` (rounded, at least 1 px).
    #[instrument(skip(self))]
    pub fn scale(self, factor: f32) -> Self {
        let (width, height) = scaled_dimensions(self.width(), self.height(), factor);
        if (width, height) == (self.width(), self.height()) {
            return self;
        }
        let resized = self
            .image
            .resize_exact(width, height, image::imageops::FilterType::Lanczos3);
        debug!(width, height, "image rescaled");
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode as baseline JPEG. Grayscale images stay single-channel; all
    /// others are flattened to RGB.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        let encoded = if self.is_grayscale() {
            self.image.to_luma8().write_with_encoder(encoder)
        } else {
            self.image.to_rgb8().write_with_encoder(encoder)
        };
        encoded.map_err(|err| QuireError::ImageError(format!("JPEG encoding failed: {err}")))?;
        Ok(buffer)
    }

    /// RGB samples and, when the image has transparency, the alpha plane.
    pub fn rgb_and_alpha(&self) -> (Vec<u8>, Option<Vec<u8>>) {
        if !self.has_alpha() {
            return (self.image.to_rgb8().into_raw(), None);
        }
        let rgba = self.image.to_rgba8();
        let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
        let mut alpha = Vec::with_capacity(rgba.len() / 4);
        for pixel in rgba.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
            alpha.push(pixel.0[3]);
        }
        (rgb, Some(alpha))
    }
}

/// `(round(width * factor), round(height * factor))`, each at least 1.
pub fn scaled_dimensions(width: u32, height: u32, factor: f32) -> (u32, u32) {
    let scale = |v: u32| ((v as f32 * factor).round() as u32).max(1);
    (scale(width), scale(height))
}

/// Sniff the container format of encoded image bytes.
pub fn detect_format(data: &[u8]) -> Option<ImageFormat> {
    image::guess_format(data).ok()
}
