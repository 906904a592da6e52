// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: creates new PDF documents from raster images, one page per
// image, laid out on a fixed paper size.

use lopdf::{Dictionary, Object, Stream};
use quire_core::error::{QuireError, Result};
use quire_core::{EngineConfig, ImagesOutcome, ImagesToPdfConfig, InputFile, Limits, Operation};
use tracing::{debug, info, instrument, warn};

use super::graph::{DocumentBuilder, box_to_object};
use super::loader::{check_aggregate_size, limit_for};
use super::metadata::compose;
use super::reader::package;
use super::serializer::{SaveOptions, format_real};
use crate::image::xobject::ImageXObject;

/// Where an image lands on its page, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Creates new PDF documents from images.
pub struct PdfWriter {
    /// Page size, orientation, margin and scaling rules.
    config: ImagesToPdfConfig,
    tool_name: String,
    limits: Limits,
}

impl PdfWriter {
    pub fn new(config: ImagesToPdfConfig, engine: &EngineConfig) -> Self {
        Self {
            config,
            tool_name: engine.tool_name.clone(),
            limits: engine.limits,
        }
    }

    /// A4 portrait with the default margin.
    pub fn a4(engine: &EngineConfig) -> Self {
        Self::new(ImagesToPdfConfig::default(), engine)
    }

    pub fn config(&self) -> &ImagesToPdfConfig {
        &self.config
    }

    // -- Images to PDF --------------------------------------------------------

    /// One page per image, in input order.
    ///
    /// PNG is embedded losslessly, JPEG as-is, anything else is re-encoded to
    /// JPEG. An image that cannot be embedded is logged and skipped.
    #[instrument(skip_all, fields(images = images.len()))]
    pub fn images_to_pdf(&self, images: &[InputFile]) -> Result<ImagesOutcome> {
        if images.is_empty() {
            return Err(QuireError::InsufficientInputs { provided: 0 });
        }
        check_aggregate_size(images, limit_for(Operation::ImagesToPdf, &self.limits))?;

        let (page_width, page_height) = self.config.page_dimensions();
        info!(
            page_size = ?self.config.page_size,
            orientation = ?self.config.orientation,
            page_width,
            page_height,
            "Creating image PDF"
        );

        let mut builder = DocumentBuilder::new();
        let mut skipped = Vec::new();
        for image in images {
            match ImageXObject::from_encoded(&image.bytes, self.config.jpeg_quality) {
                Ok(xobject) => self.add_image_page(&mut builder, xobject),
                Err(err) => {
                    warn!(name = %image.name, %err, "image skipped");
                    skipped.push(image.name.clone());
                }
            }
        }

        if builder.page_count() == 0 {
            return Err(QuireError::ImageError("none of the images could be embedded".into()));
        }

        let metadata = compose(None, Operation::ImagesToPdf, &self.tool_name);
        let document = package(
            builder.into_document(),
            "Images",
            &metadata,
            &SaveOptions::compressed(),
            Operation::ImagesToPdf,
        )?;
        info!(
            pages = document.page_count,
            skipped = skipped.len(),
            bytes = document.bytes.len(),
            "Image PDF created"
        );
        Ok(ImagesOutcome { document, skipped })
    }

    fn add_image_page(&self, builder: &mut DocumentBuilder, xobject: ImageXObject) {
        let (page_width, page_height) = self.config.page_dimensions();
        let placement = place_image(
            &self.config,
            (page_width, page_height),
            (xobject.width as f32, xobject.height as f32),
        );

        let doc = builder.document_mut();
        let image_id = xobject.insert_into(doc);
        let content = format!(
            "q\n{} 0 0 {} {} {} cm\n/Im1 Do\nQ\n",
            num(placement.width),
            num(placement.height),
            num(placement.x),
            num(placement.y),
        );
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        builder.add_page(Dictionary::from_iter([
            ("MediaBox", box_to_object([0.0, 0.0, page_width, page_height])),
            ("Contents", Object::Reference(content_id)),
            (
                "Resources",
                Object::Dictionary(Dictionary::from_iter([(
                    "XObject",
                    Object::Dictionary(Dictionary::from_iter([("Im1", Object::Reference(image_id))])),
                )])),
            ),
        ]));
        debug!(?placement, "image placed on page");
    }
}

/// Centre an image of `image` pixels (1 px = 1 pt) inside the
/// margin-adjusted area of a `page` sized in points.
///
/// Fit-to-page scales to the largest aspect-preserving size that fits.
/// Otherwise the natural size is used; if it overflows the area it is scaled
/// down uniformly when the aspect ratio is maintained, or clamped per axis
/// when not.
pub fn place_image(config: &ImagesToPdfConfig, page: (f32, f32), image: (f32, f32)) -> Placement {
    let margin = config.margin.max(0.0);
    let area_width = (page.0 - 2.0 * margin).max(1.0);
    let area_height = (page.1 - 2.0 * margin).max(1.0);
    let (image_width, image_height) = (image.0.max(1.0), image.1.max(1.0));
    let fit = (area_width / image_width).min(area_height / image_height);

    let (width, height) = if config.fit_to_page {
        (image_width * fit, image_height * fit)
    } else if image_width <= area_width && image_height <= area_height {
        (image_width, image_height)
    } else if config.maintain_aspect_ratio {
        (image_width * fit, image_height * fit)
    } else {
        (image_width.min(area_width), image_height.min(area_height))
    };

    Placement {
        x: margin + (area_width - width) / 2.0,
        y: margin + (area_height - height) / 2.0,
        width,
        height,
    }
}

fn num(value: f32) -> String {
    format_real(f64::from(value))
}
