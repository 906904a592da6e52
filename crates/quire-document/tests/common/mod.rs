// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixture documents for the integration tests.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};

/// A4 document whose pages read `"{label} N"`, with a title in /Info.
pub fn labelled_pdf(label: &str, pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let kids: Vec<Object> = (1..=pages)
        .map(|n| {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 18.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(format!("{label} {n}"))]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
            let page_id = doc.add_object(Dictionary::from_iter([
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                ("Contents", Object::Reference(content_id)),
                (
                    "Resources",
                    Object::Dictionary(Dictionary::from_iter([(
                        "Font",
                        Object::Dictionary(Dictionary::from_iter([("F1", Object::Reference(font_id))])),
                    )])),
                ),
            ]));
            Object::Reference(page_id)
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(pages as i64)),
            ("Kids", Object::Array(kids)),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), 595.into(), 842.into()]),
            ),
        ])),
    );
    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    let info_id = doc.add_object(Dictionary::from_iter([(
        "Title",
        Object::string_literal(format!("{label} document")),
    )]));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.trailer.set("Info", Object::Reference(info_id));

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// [`labelled_pdf`] with an /Author in /Info and an XMP packet on the
/// catalog.
pub fn described_pdf(label: &str, pages: u32) -> Vec<u8> {
    let mut doc = Document::load_mem(&labelled_pdf(label, pages)).unwrap();
    let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
    doc.get_dictionary_mut(info_id)
        .unwrap()
        .set("Author", Object::string_literal("Original Author"));
    let xmp_id = doc.add_object(Stream::new(
        Dictionary::from_iter([
            ("Type", Object::Name(b"Metadata".to_vec())),
            ("Subtype", Object::Name(b"XML".to_vec())),
        ]),
        b"<x:xmpmeta xmlns:x=\"adobe:ns:meta/\"><dc:creator>Original Author XMP</dc:creator></x:xmpmeta>".to_vec(),
    ));
    doc.catalog_mut().unwrap().set("Metadata", Object::Reference(xmp_id));

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Whether `needle` appears in the raw file, in any string of any object, or
/// in the decoded content of any stream.
pub fn carries(bytes: &[u8], needle: &[u8]) -> bool {
    fn found(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|window| window == needle)
    }
    fn in_object(object: &Object, needle: &[u8]) -> bool {
        match object {
            Object::String(value, _) => found(value, needle),
            Object::Array(items) => items.iter().any(|item| in_object(item, needle)),
            Object::Dictionary(dict) => dict.iter().any(|(_, value)| in_object(value, needle)),
            Object::Stream(stream) => {
                let content = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                found(&content, needle) || stream.dict.iter().any(|(_, value)| in_object(value, needle))
            }
            _ => false,
        }
    }

    if found(bytes, needle) {
        return true;
    }
    let doc = Document::load_mem(bytes).unwrap();
    doc.objects.values().any(|object| in_object(object, needle))
        || doc.trailer.iter().any(|(_, value)| in_object(value, needle))
}

/// One Letter page showing a `width` x `height` raw RGB image.
pub fn photo_pdf(width: u32, height: u32) -> Vec<u8> {
    let pixels: Vec<u8> = (0..width * height)
        .flat_map(|i| {
            let (x, y) = (i % width, i / width);
            [(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8]
        })
        .collect();

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let image_id = doc.add_object(Stream::new(
        Dictionary::from_iter([
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(width as i64)),
            ("Height", Object::Integer(height as i64)),
            ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
        ]),
        pixels,
    ));
    let content_id = doc.add_object(Stream::new(
        Dictionary::new(),
        b"q 300 0 0 200 150 300 cm /Photo Do Q".to_vec(),
    ));
    let page_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        ("Contents", Object::Reference(content_id)),
        (
            "MediaBox",
            Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
        ),
        (
            "Resources",
            Object::Dictionary(Dictionary::from_iter([(
                "XObject",
                Object::Dictionary(Dictionary::from_iter([("Photo", Object::Reference(image_id))])),
            )])),
        ),
    ]));
    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(1)),
            ("Kids", Object::Array(vec![Object::Reference(page_id)])),
        ])),
    );
    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| image::Rgb([x as u8, y as u8, 64]));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

/// Decoded content of every page, in page order.
pub fn page_texts(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .into_values()
        .map(|id| String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned())
        .collect()
}

/// Width and height of every image XObject in the document.
pub fn image_sizes(bytes: &[u8]) -> Vec<(i64, i64)> {
    let doc = Document::load_mem(bytes).unwrap();
    let mut sizes: Vec<(i64, i64)> = doc
        .objects
        .values()
        .filter_map(|object| object.as_stream().ok())
        .filter(|stream| {
            stream
                .dict
                .get(b"Subtype")
                .and_then(Object::as_name)
                .is_ok_and(|name| name == b"Image")
        })
        .map(|stream| {
            (
                stream.dict.get(b"Width").unwrap().as_i64().unwrap(),
                stream.dict.get(b"Height").unwrap().as_i64().unwrap(),
            )
        })
        .collect();
    sizes.sort();
    sizes
}
