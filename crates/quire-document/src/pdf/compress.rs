// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compression: image downsampling and JPEG re-encoding, stream compression,
// pruning of unreachable objects, and (at the maximum level) object streams.
//
// The level's scale factor applies to the pixel dimensions of embedded
// raster images. Images are drawn through the current transformation matrix,
// so their size on the page and every page box stay exactly as they were.

use std::collections::HashSet;

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Document, Object, ObjectId, Stream};
use quire_core::error::Result;
use quire_core::{CompressConfig, CompressOutcome, CompressionLevel, Operation};
use tracing::{debug, info, instrument};

use super::graph::{detached_copy, resolve};
use super::reader::{PdfReader, package};
use super::serializer::SaveOptions;
use crate::image::processor::ImageProcessor;

impl PdfReader {
    /// Produce a smaller copy of the document.
    #[instrument(skip_all, fields(level = ?config.level, bytes = self.byte_size()))]
    pub fn compress(&self, config: &CompressConfig) -> Result<CompressOutcome> {
        let level = config.level;
        info!(
            scale = level.scale_factor(),
            quality = level.jpeg_quality(),
            "Compressing PDF"
        );

        let mut doc = detached_copy(self.document(), config.preserve_metadata);
        let images_recompressed = recompress_images(&mut doc, level);
        doc.prune_objects();

        let metadata = self.stamped_metadata(config.preserve_metadata, Operation::Compress);
        let options = SaveOptions {
            compress_streams: true,
            use_object_streams: level.uses_object_streams(),
            ..Default::default()
        };
        let document = package(doc, "Compressed", &metadata, &options, Operation::Compress)?;

        let outcome = CompressOutcome {
            original_size: self.byte_size(),
            compressed_size: document.bytes.len() as u64,
            images_recompressed,
            document,
        };
        info!(
            original = outcome.original_size,
            compressed = outcome.compressed_size,
            images_recompressed,
            savings = %format!("{:.1}%", outcome.savings_ratio() * 100.0),
            "Compression complete"
        );
        Ok(outcome)
    }
}

/// Re-encode every eligible image XObject in place. Returns how many were
/// replaced.
fn recompress_images(doc: &mut Document, level: CompressionLevel) -> usize {
    let masks = mask_targets(doc);
    let candidates: Vec<ObjectId> = doc
        .objects
        .iter()
        .filter(|(id, object)| !masks.contains(*id) && is_image(object))
        .map(|(id, _)| *id)
        .collect();

    let mut replaced = 0;
    for id in candidates {
        let Ok(Object::Stream(stream)) = doc.get_object(id) else {
            continue;
        };
        match recompress_image(doc, stream, level) {
            Ok(Some(smaller)) => {
                doc.objects.insert(id, Object::Stream(smaller));
                replaced += 1;
            }
            Ok(None) => debug!(?id, "re-encoded image not smaller; kept original"),
            Err(reason) => debug!(?id, %reason, "image left untouched"),
        }
    }
    replaced
}

fn is_image(object: &Object) -> bool {
    match object {
        Object::Stream(stream) => {
            matches!(stream.dict.get(b"Subtype").and_then(Object::as_name), Ok(b"Image"))
        }
        _ => false,
    }
}

/// Images used as /SMask or /Mask of another image. Their geometry must
/// match what the parent expects, so they are never touched.
fn mask_targets(doc: &Document) -> HashSet<ObjectId> {
    let mut targets = HashSet::new();
    for object in doc.objects.values() {
        let Object::Stream(stream) = object else {
            continue;
        };
        for key in [b"SMask".as_slice(), b"Mask".as_slice()] {
            if let Ok(Object::Reference(id)) = stream.dict.get(key) {
                targets.insert(*id);
            }
        }
    }
    targets
}

/// Downsample and JPEG-encode one image. `Ok(None)` when the result would not
/// be smaller; `Err` names why the image is not eligible.
fn recompress_image(
    doc: &Document,
    stream: &Stream,
    level: CompressionLevel,
) -> std::result::Result<Option<Stream>, String> {
    let dict = &stream.dict;
    let int = |key: &[u8]| -> Option<i64> { resolve(doc, dict.get(key).ok()?).as_i64().ok() };

    if matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true))) {
        return Err("stencil mask".into());
    }
    if dict.has(b"Decode") {
        return Err("custom /Decode array".into());
    }
    if int(b"BitsPerComponent") != Some(8) {
        return Err("not 8 bits per component".into());
    }
    let (Some(width), Some(height)) = (int(b"Width"), int(b"Height")) else {
        return Err("missing dimensions".into());
    };
    if width <= 0 || height <= 0 {
        return Err("empty image".into());
    }
    let (Ok(width), Ok(height)) = (u32::try_from(width), u32::try_from(height)) else {
        return Err("dimensions too large".into());
    };

    let components = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|cs| color_components(doc, cs))
        .ok_or("unsupported colour space")?;

    let image = match image_filter(doc, stream)? {
        ImageFilter::Raw => {
            let samples = if stream.dict.has(b"Filter") {
                stream
                    .decompressed_content()
                    .map_err(|err| format!("cannot inflate image: {err}"))?
            } else {
                stream.content.clone()
            };
            raw_image(samples, width, height, components)?
        }
        ImageFilter::Jpeg => {
            let decoded = image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                .map_err(|err| format!("cannot decode JPEG: {err}"))?;
            let channels = decoded.color().channel_count();
            if u32::from(channels) != components {
                return Err(format!("JPEG has {channels} channels, colour space {components}"));
            }
            decoded
        }
    };

    let scaled = ImageProcessor::from_dynamic(image).scale(level.scale_factor());
    let (new_width, new_height) = (scaled.width(), scaled.height());
    let jpeg = scaled
        .to_jpeg_bytes(level.jpeg_quality())
        .map_err(|err| err.to_string())?;
    if jpeg.len() >= stream.content.len() {
        return Ok(None);
    }

    let mut new_dict = dict.clone();
    new_dict.set("Width", Object::Integer(new_width as i64));
    new_dict.set("Height", Object::Integer(new_height as i64));
    new_dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
    new_dict.remove(b"DecodeParms");
    let mut replacement = Stream::new(new_dict, jpeg);
    replacement.allows_compression = false;
    debug!(width, height, new_width, new_height, "image downsampled");
    Ok(Some(replacement))
}

enum ImageFilter {
    /// Unfiltered or Flate-encoded samples without predictors.
    Raw,
    Jpeg,
}

fn image_filter(doc: &Document, stream: &Stream) -> std::result::Result<ImageFilter, String> {
    let filter = match stream.dict.get(b"Filter") {
        Err(_) => return Ok(ImageFilter::Raw),
        Ok(filter) => resolve(doc, filter),
    };
    let name = match filter {
        Object::Name(name) => name.as_slice(),
        Object::Array(items) if items.len() == 1 => resolve(doc, &items[0])
            .as_name()
            .map_err(|_| "malformed /Filter".to_string())?,
        _ => return Err("filter chain".into()),
    };
    match name {
        b"FlateDecode" if !stream.dict.has(b"DecodeParms") => Ok(ImageFilter::Raw),
        b"DCTDecode" => Ok(ImageFilter::Jpeg),
        other => Err(format!("filter {}", String::from_utf8_lossy(other))),
    }
}

/// Components of DeviceGray, DeviceRGB, or an ICC profile with N 1 or 3.
fn color_components(doc: &Document, color_space: &Object) -> Option<u32> {
    match resolve(doc, color_space) {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"G" => Some(1),
            b"DeviceRGB" | b"RGB" => Some(3),
            _ => None,
        },
        Object::Array(items) if items.len() == 2 => {
            if resolve(doc, &items[0]).as_name().ok()? != b"ICCBased" {
                return None;
            }
            let profile = resolve(doc, &items[1]).as_stream().ok()?;
            match profile.dict.get(b"N").ok()?.as_i64().ok()? {
                n @ (1 | 3) => Some(n as u32),
                _ => None,
            }
        }
        _ => None,
    }
}

fn raw_image(samples: Vec<u8>, width: u32, height: u32, components: u32) -> std::result::Result<DynamicImage, String> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(components as usize))
        .ok_or("dimensions too large")?;
    if samples.len() < expected {
        return Err(format!("{} sample bytes, expected {expected}", samples.len()));
    }
    let mut samples = samples;
    samples.truncate(expected);
    let image = if components == 1 {
        GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8)
    } else {
        RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8)
    };
    image.ok_or_else(|| "sample buffer does not match dimensions".to_string())
}
