// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Metadata manager: reads and writes the trailer /Info dictionary and
// stamps every output with the producing tool and operation.
//
// Reading never fails: fields that cannot be decoded are logged and
// treated as absent.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeZone};
use lopdf::{Dictionary, Document, Object, StringFormat};
use quire_core::{Metadata, Operation};
use tracing::{debug, warn};

use super::graph::resolve;

/// Read the document information dictionary.
pub fn read_metadata(doc: &Document) -> Metadata {
    let Ok(info) = doc.trailer.get(b"Info") else {
        return Metadata::default();
    };
    let Ok(info) = resolve(doc, info).as_dict() else {
        warn!("trailer /Info is not a dictionary; ignoring metadata");
        return Metadata::default();
    };

    let text = |key: &[u8]| -> Option<String> {
        let value = info.get(key).ok()?;
        match resolve(doc, value) {
            Object::String(bytes, _) => Some(decode_text_string(bytes)),
            Object::Null => None,
            _ => {
                warn!(key = %String::from_utf8_lossy(key), "metadata field is not a string");
                None
            }
        }
    };
    let date = |key: &[u8]| -> Option<DateTime<FixedOffset>> {
        let raw = text(key)?;
        let parsed = parse_pdf_date(&raw);
        if parsed.is_none() {
            warn!(key = %String::from_utf8_lossy(key), raw = %raw, "unparseable metadata date");
        }
        parsed
    };

    Metadata {
        title: text(b"Title"),
        author: text(b"Author"),
        subject: text(b"Subject"),
        keywords: text(b"Keywords"),
        creator: text(b"Creator"),
        producer: text(b"Producer"),
        creation_date: date(b"CreationDate"),
        modification_date: date(b"ModDate"),
    }
}

/// Metadata for a freshly produced document: the preserved source fields
/// (when given) overlaid with the tool stamp.
pub fn compose(preserved: Option<&Metadata>, operation: Operation, tool_name: &str) -> Metadata {
    let mut metadata = preserved.cloned().unwrap_or_default();
    metadata.creator = Some(format!("{tool_name} {operation}"));
    metadata.producer = Some(tool_name.to_string());
    metadata.creation_date = Some(Local::now().fixed_offset());
    metadata
}

/// Replace the document's /Info dictionary with `metadata`.
pub fn write_metadata(doc: &mut Document, metadata: &Metadata) {
    let mut info = Dictionary::new();
    let fields = [
        ("Title", &metadata.title),
        ("Author", &metadata.author),
        ("Subject", &metadata.subject),
        ("Keywords", &metadata.keywords),
        ("Creator", &metadata.creator),
        ("Producer", &metadata.producer),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            info.set(key, encode_text_string(value));
        }
    }
    if let Some(date) = &metadata.creation_date {
        info.set("CreationDate", Object::string_literal(format_pdf_date(date)));
    }
    if let Some(date) = &metadata.modification_date {
        info.set("ModDate", Object::string_literal(format_pdf_date(date)));
    }

    let info_id = doc.add_object(info);
    doc.trailer.set("Info", Object::Reference(info_id));
    debug!(?info_id, "metadata written");
}

// -- Text strings -------------------------------------------------------------

/// PDFDocEncoding code points 0x80..=0xA0 that differ from Latin-1.
const PDF_DOC_HIGH: [char; 33] = [
    '\u{2022}', '\u{2020}', '\u{2021}', '\u{2026}', '\u{2014}', '\u{2013}', '\u{0192}', '\u{2044}',
    '\u{2039}', '\u{203A}', '\u{2212}', '\u{2030}', '\u{201E}', '\u{201C}', '\u{201D}', '\u{2018}',
    '\u{2019}', '\u{201A}', '\u{2122}', '\u{FB01}', '\u{FB02}', '\u{0141}', '\u{0152}', '\u{0160}',
    '\u{0178}', '\u{017D}', '\u{0131}', '\u{0142}', '\u{0153}', '\u{0161}', '\u{017E}', '\u{FFFD}',
    '\u{20AC}',
];

/// Decode a PDF text string: UTF-16BE or UTF-8 with BOM, else PDFDocEncoding.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    bytes
        .iter()
        .map(|&b| match b {
            0x80..=0xA0 => PDF_DOC_HIGH[(b - 0x80) as usize],
            _ => b as char,
        })
        .collect()
}

/// Encode a text string: a literal when ASCII, UTF-16BE with BOM otherwise.
pub fn encode_text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

// -- Dates --------------------------------------------------------------------

/// Parse `D:YYYYMMDDHHmmSSOHH'mm'`. Everything after the year is optional;
/// a missing offset means UTC.
pub fn parse_pdf_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let s = raw.trim();
    let s = s.strip_prefix("D:").unwrap_or(s);

    let digits_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, zone) = s.split_at(digits_end);
    if digits.len() < 4 {
        return None;
    }

    let field = |start: usize, default: u32| -> Option<u32> {
        match digits.get(start..start + 2) {
            Some(part) => part.parse().ok(),
            None => Some(default),
        }
    };
    let year: i32 = digits[..4].parse().ok()?;
    let month = field(4, 1)?;
    let day = field(6, 1)?;
    let hour = field(8, 0)?;
    let minute = field(10, 0)?;
    let second = field(12, 0)?;

    let offset = parse_offset(zone)?;
    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    offset.from_local_datetime(&naive).single()
}

fn parse_offset(zone: &str) -> Option<FixedOffset> {
    let mut chars = zone.chars();
    let sign = match chars.next() {
        None | Some('Z') => return FixedOffset::east_opt(0),
        Some('+') => 1,
        Some('-') => -1,
        Some(_) => return None,
    };
    let numbers: Vec<i32> = chars
        .as_str()
        .split('\'')
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().ok())
        .collect::<Option<_>>()?;
    let hours = numbers.first().copied().unwrap_or(0);
    let minutes = numbers.get(1).copied().unwrap_or(0);
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Format a date as `D:YYYYMMDDHHmmSS+HH'mm'`.
pub fn format_pdf_date(date: &DateTime<FixedOffset>) -> String {
    let offset = date.offset().local_minus_utc();
    let sign = if offset < 0 { '-' } else { '+' };
    let offset = offset.abs();
    format!(
        "D:{}{sign}{:02}'{:02}'",
        date.format("%Y%m%d%H%M%S"),
        offset / 3600,
        (offset % 3600) / 60
    )
}
