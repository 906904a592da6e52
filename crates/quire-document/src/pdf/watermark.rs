// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Watermarking: stamps text (standard Helvetica) and/or an image onto every
// page of a copy of the document.
//
// The font, graphics state and image are embedded once and referenced from
// every page. Existing content is wrapped in `q ... Q` so the watermark is
// drawn from a clean graphics state on top of it.

use image::ImageFormat;
use lopdf::{Dictionary, Document, Object, ObjectId};
use quire_core::error::{QuireError, Result};
use quire_core::{Operation, OutputDocument, WatermarkConfig, WatermarkPosition};
use tracing::{debug, info, instrument};

use super::graph::{add_page_resource, detached_copy, page_box, wrap_page_content};
use super::reader::{PdfReader, package};
use super::serializer::{SaveOptions, format_real};
use crate::image::processor::detect_format;
use crate::image::xobject::ImageXObject;

/// Distance from the page edge for corner positions, in points.
pub const EDGE_MARGIN: f32 = 50.0;

/// Largest share of the page width/height an image watermark may cover.
pub const MAX_IMAGE_SHARE: f32 = 0.3;

/// Helvetica cap height, in thousandths of the font size.
const CAP_HEIGHT: f32 = 718.0;

const FONT_NAME: &str = "QuireWmFont";
const STATE_NAME: &str = "QuireWmGS";
const IMAGE_NAME: &str = "QuireWmImage";

impl PdfReader {
    /// Draw the configured watermark on every page.
    #[instrument(skip_all, fields(position = ?config.position, pages = self.page_count()))]
    pub fn watermark(&self, config: &WatermarkConfig) -> Result<OutputDocument> {
        let text = config.effective_text();
        if text.is_none() && config.image.is_none() {
            return Err(QuireError::EmptyWatermark);
        }
        let image = config.image.as_deref().map(watermark_image).transpose()?;
        info!(
            text = text.unwrap_or(""),
            image = image.is_some(),
            opacity = config.opacity,
            "Watermarking PDF"
        );

        let mut doc = detached_copy(self.document(), config.preserve_metadata);
        let stamp = Stamp::embed(&mut doc, config, text, image);

        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        for &page_id in &page_ids {
            stamp
                .apply(&mut doc, page_id)
                .map_err(|detail| QuireError::pdf(Operation::Watermark, detail))?;
        }
        debug!(pages = page_ids.len(), "watermark applied");

        let metadata = self.stamped_metadata(config.preserve_metadata, Operation::Watermark);
        package(
            doc,
            "Watermarked",
            &metadata,
            &SaveOptions::compressed(),
            Operation::Watermark,
        )
    }
}

/// Validate and embed-prepare a PNG or JPEG watermark image.
fn watermark_image(data: &[u8]) -> Result<ImageXObject> {
    let embedded = match detect_format(data) {
        Some(ImageFormat::Png) | Some(ImageFormat::Jpeg) => ImageXObject::from_encoded(data, 90),
        Some(other) => {
            return Err(QuireError::InvalidWatermarkImage(format!(
                "{other:?} images are not supported"
            )));
        }
        None => return Err(QuireError::InvalidWatermarkImage("unrecognised image data".into())),
    };
    embedded.map_err(|err| QuireError::InvalidWatermarkImage(err.to_string()))
}

/// The shared watermark objects and the settings to draw them with.
struct Stamp<'a> {
    config: &'a WatermarkConfig,
    text: Option<(Vec<u8>, ObjectId)>,
    image: Option<(ObjectId, f32, f32)>,
    state_id: ObjectId,
}

impl<'a> Stamp<'a> {
    fn embed(
        doc: &mut Document,
        config: &'a WatermarkConfig,
        text: Option<&str>,
        image: Option<ImageXObject>,
    ) -> Self {
        let opacity = config.opacity.clamp(0.0, 1.0);
        let state_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"ExtGState".to_vec())),
            ("ca", Object::Real(opacity.into())),
            ("CA", Object::Real(opacity.into())),
        ]));

        let text = text.map(|text| {
            let font_id = doc.add_object(Dictionary::from_iter([
                ("Type", Object::Name(b"Font".to_vec())),
                ("Subtype", Object::Name(b"Type1".to_vec())),
                ("BaseFont", Object::Name(b"Helvetica".to_vec())),
                ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
            ]));
            (encode_win_ansi(text), font_id)
        });

        let image = image.map(|xobject| {
            let (width, height) = (xobject.width as f32, xobject.height as f32);
            (xobject.insert_into(doc), width, height)
        });

        Self {
            config,
            text,
            image,
            state_id,
        }
    }

    fn apply(&self, doc: &mut Document, page_id: ObjectId) -> std::result::Result<(), String> {
        let rect = page_box(doc, page_id);
        let mut content = b"Q\n".to_vec();

        add_page_resource(doc, page_id, "ExtGState", STATE_NAME, Object::Reference(self.state_id))?;
        if let Some((image_id, width, height)) = self.image {
            add_page_resource(doc, page_id, "XObject", IMAGE_NAME, Object::Reference(image_id))?;
            content.extend(image_operators(self.config.position, rect, width, height));
        }
        if let Some((encoded, font_id)) = &self.text {
            add_page_resource(doc, page_id, "Font", FONT_NAME, Object::Reference(*font_id))?;
            content.extend(text_operators(self.config, rect, encoded));
        }

        wrap_page_content(doc, page_id, b"q\n".to_vec(), content)
    }
}

// -- Content ------------------------------------------------------------------

/// Transformation that places a `width` x `height` box according to
/// `position`, plus the offset at which to draw the box inside it.
///
/// Diagonal placement rotates 45 degrees about the page centre and draws the
/// box centred on the origin.
pub fn placement(position: WatermarkPosition, rect: [f32; 4], width: f32, height: f32) -> ([f32; 6], (f32, f32)) {
    let [llx, lly, urx, ury] = rect;
    let translate = |x: f32, y: f32| ([1.0, 0.0, 0.0, 1.0, x, y], (0.0, 0.0));
    match position {
        WatermarkPosition::Center => translate(
            (llx + urx - width) / 2.0,
            (lly + ury - height) / 2.0,
        ),
        WatermarkPosition::Diagonal => {
            let (sin, cos) = std::f32::consts::FRAC_PI_4.sin_cos();
            (
                [cos, sin, -sin, cos, (llx + urx) / 2.0, (lly + ury) / 2.0],
                (-width / 2.0, -height / 2.0),
            )
        }
        WatermarkPosition::TopLeft => translate(llx + EDGE_MARGIN, ury - EDGE_MARGIN - height),
        WatermarkPosition::TopRight => {
            translate(urx - EDGE_MARGIN - width, ury - EDGE_MARGIN - height)
        }
        WatermarkPosition::BottomLeft => translate(llx + EDGE_MARGIN, lly + EDGE_MARGIN),
        WatermarkPosition::BottomRight => translate(urx - EDGE_MARGIN - width, lly + EDGE_MARGIN),
    }
}

/// Image size on the page: natural size (1 px = 1 pt) shrunk to fit within
/// 30 % of the page width and height, aspect ratio preserved.
pub fn image_extent(rect: [f32; 4], width: f32, height: f32) -> (f32, f32) {
    let max_width = (rect[2] - rect[0]) * MAX_IMAGE_SHARE;
    let max_height = (rect[3] - rect[1]) * MAX_IMAGE_SHARE;
    let scale = (max_width / width).min(max_height / height).min(1.0);
    (width * scale, height * scale)
}

fn image_operators(position: WatermarkPosition, rect: [f32; 4], width: f32, height: f32) -> Vec<u8> {
    let (width, height) = image_extent(rect, width, height);
    let (matrix, (dx, dy)) = placement(position, rect, width, height);
    format!(
        "q\n/{STATE_NAME} gs\n{} cm\n{} 0 0 {} {} {} cm\n/{IMAGE_NAME} Do\nQ\n",
        matrix_operands(&matrix),
        num(width),
        num(height),
        num(dx),
        num(dy),
    )
    .into_bytes()
}

fn text_operators(config: &WatermarkConfig, rect: [f32; 4], encoded: &[u8]) -> Vec<u8> {
    let size = config.font_size.max(1.0);
    let width = text_width(encoded) * size / 1000.0;
    let height = CAP_HEIGHT * size / 1000.0;
    let (matrix, (dx, dy)) = placement(config.position, rect, width, height);
    let color = config.color.clamped();

    let mut out = format!(
        "q\n/{STATE_NAME} gs\n{} {} {} rg\n{} cm\nBT\n/{FONT_NAME} {} Tf\n{} {} Td\n(",
        num(color.r),
        num(color.g),
        num(color.b),
        matrix_operands(&matrix),
        num(size),
        num(dx),
        num(dy),
    )
    .into_bytes();
    for &byte in encoded {
        if matches!(byte, b'(' | b')' | b'\\') {
            out.push(b'\\');
        }
        out.push(byte);
    }
    out.extend_from_slice(b") Tj\nET\nQ\n");
    out
}

fn matrix_operands(matrix: &[f32; 6]) -> String {
    matrix.iter().map(|v| num(*v)).collect::<Vec<_>>().join(" ")
}

fn num(value: f32) -> String {
    format_real(f64::from(value))
}

// -- Helvetica ----------------------------------------------------------------

/// Helvetica advance widths for WinAnsi 0x20..=0x7E (Adobe AFM).
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0x30
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 0x40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 0x50
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 0x60
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 0x70
];

/// Average width used for WinAnsi codes outside the ASCII table.
const HELVETICA_DEFAULT: u16 = 556;

/// Width of WinAnsi-encoded text in thousandths of the font size.
pub fn text_width(encoded: &[u8]) -> f32 {
    encoded
        .iter()
        .map(|&b| match b {
            0x20..=0x7E => HELVETICA_ASCII[(b - 0x20) as usize],
            _ => HELVETICA_DEFAULT,
        })
        .map(f32::from)
        .sum()
}

/// WinAnsi code points 0x80..=0x9F (zero where undefined).
const WIN_ANSI_HIGH: [char; 32] = [
    '\u{20AC}', '\0', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\0', '\u{017D}', '\0',
    '\0', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\0', '\u{017E}', '\u{0178}',
];

/// Encode text for a standard font. Characters WinAnsi cannot represent
/// become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            ' '..='~' | '\u{A0}'..='\u{FF}' => ch as u8,
            _ => WIN_ANSI_HIGH
                .iter()
                .position(|&c| c == ch && c != '\0')
                .map(|index| 0x80 + index as u8)
                .unwrap_or(b'?'),
        })
        .collect()
}
