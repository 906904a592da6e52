// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image XObjects: embedding encoded raster images into a PDF.
//
// JPEG is embedded as-is with /DCTDecode. PNG is decoded and stored as
// Flate-compressed RGB with the alpha plane in a separate /SMask. Every other
// format is re-encoded to JPEG first.

use std::io::{Cursor, Write};

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::codecs::jpeg::JpegDecoder;
use image::{ExtendedColorType, ImageDecoder, ImageFormat};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use quire_core::error::{QuireError, Result};
use tracing::debug;

use super::processor::{ImageProcessor, detect_format};

/// An image ready to be inserted into a document.
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    stream: Stream,
    smask: Option<Stream>,
}

impl ImageXObject {
    /// Build an XObject from encoded image bytes. `jpeg_quality` applies only
    /// to formats that have to be re-encoded.
    pub fn from_encoded(data: &[u8], jpeg_quality: u8) -> Result<Self> {
        match detect_format(data) {
            Some(ImageFormat::Jpeg) => match Self::from_jpeg(data) {
                Ok(xobject) => Ok(xobject),
                // CMYK and other exotic JPEGs: decode and re-encode as RGB.
                Err(_) => Self::reencoded(data, jpeg_quality),
            },
            Some(ImageFormat::Png) => Self::from_png(data),
            Some(_) => Self::reencoded(data, jpeg_quality),
            None => Err(QuireError::ImageError("unrecognised image format".into())),
        }
    }

    /// Pass-through embedding of a baseline/progressive JPEG.
    pub fn from_jpeg(data: &[u8]) -> Result<Self> {
        let decoder = JpegDecoder::new(Cursor::new(data))
            .map_err(|err| QuireError::ImageError(format!("invalid JPEG: {err}")))?;
        let (width, height) = decoder.dimensions();
        let color_space: &[u8] = match decoder.original_color_type() {
            ExtendedColorType::L8 => b"DeviceGray",
            ExtendedColorType::Rgb8 => b"DeviceRGB",
            other => {
                return Err(QuireError::ImageError(format!(
                    "JPEG colour type {other:?} cannot be embedded directly"
                )));
            }
        };

        let stream = Stream::new(
            image_dict(width, height, color_space, b"DCTDecode"),
            data.to_vec(),
        );
        debug!(width, height, "JPEG embedded as-is");
        Ok(Self {
            width,
            height,
            stream: without_recompression(stream),
            smask: None,
        })
    }

    /// Lossless embedding of a PNG: Flate RGB plus an optional alpha /SMask.
    pub fn from_png(data: &[u8]) -> Result<Self> {
        let processor = ImageProcessor::from_bytes(data)?;
        let (width, height) = (processor.width(), processor.height());
        let (rgb, alpha) = processor.rgb_and_alpha();

        let stream = Stream::new(
            image_dict(width, height, b"DeviceRGB", b"FlateDecode"),
            deflate(&rgb)?,
        );
        let smask = match alpha {
            Some(alpha) => Some(without_recompression(Stream::new(
                image_dict(width, height, b"DeviceGray", b"FlateDecode"),
                deflate(&alpha)?,
            ))),
            None => None,
        };
        debug!(width, height, has_alpha = smask.is_some(), "PNG embedded losslessly");
        Ok(Self {
            width,
            height,
            stream: without_recompression(stream),
            smask,
        })
    }

    /// Decode any supported format and embed it as JPEG.
    pub fn reencoded(data: &[u8], jpeg_quality: u8) -> Result<Self> {
        let processor = ImageProcessor::from_bytes(data)?;
        let (width, height) = (processor.width(), processor.height());
        let jpeg = processor.to_jpeg_bytes(jpeg_quality)?;
        let color_space: &[u8] = if processor.is_grayscale() {
            b"DeviceGray"
        } else {
            b"DeviceRGB"
        };
        debug!(width, height, jpeg_len = jpeg.len(), "image re-encoded as JPEG");
        Ok(Self {
            width,
            height,
            stream: without_recompression(Stream::new(
                image_dict(width, height, color_space, b"DCTDecode"),
                jpeg,
            )),
            smask: None,
        })
    }

    pub fn has_soft_mask(&self) -> bool {
        self.smask.is_some()
    }

    /// Add the image (and its soft mask) to `doc`, returning the image id.
    pub fn insert_into(self, doc: &mut Document) -> ObjectId {
        let mut stream = self.stream;
        if let Some(smask) = self.smask {
            let smask_id = doc.add_object(smask);
            stream.dict.set("SMask", Object::Reference(smask_id));
        }
        doc.add_object(stream)
    }
}

fn image_dict(width: u32, height: u32, color_space: &[u8], filter: &[u8]) -> Dictionary {
    Dictionary::from_iter([
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(width as i64)),
        ("Height", Object::Integer(height as i64)),
        ("ColorSpace", Object::Name(color_space.to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
        ("Filter", Object::Name(filter.to_vec())),
    ])
}

/// Already-filtered image data must not be compressed again on save.
fn without_recompression(mut stream: Stream) -> Stream {
    stream.allows_compression = false;
    stream
}

pub(crate) fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(data)
        .map_err(|err| QuireError::ImageError(format!("failed to compress image data: {err}")))?;
    encoder
        .finish()
        .map_err(|err| QuireError::ImageError(format!("failed to finish compression: {err}")))
}
