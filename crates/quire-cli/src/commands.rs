// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand handlers: read inputs from disk, run one engine operation, and
// write every produced document into the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use quire_core::human_errors::format_bytes;
use quire_core::{
    CompressConfig, DocumentInfo, EngineConfig, ExtractConfig, ImagesToPdfConfig, InputFile,
    MergeConfig, OutputDocument, Permissions, ProtectConfig, SplitConfig, SplitMode,
    WatermarkConfig,
};
use quire_document::{PdfReader, PdfWriter, merge};
use tracing::{info, warn};

use crate::{Command, ImagesArgs, ProtectArgs, SplitArgs, WatermarkArgs};

pub fn run(command: Command, engine: &EngineConfig, output_dir: &Path) -> Result<()> {
    match command {
        Command::Info { input } => {
            let reader = PdfReader::open(&input, engine)?;
            print!("{}", describe(&input, &reader.info()));
            Ok(())
        }
        Command::Split(args) => split(args, engine, output_dir),
        Command::Extract {
            input,
            ranges,
            preserve_metadata,
        } => {
            let reader = PdfReader::open(&input, engine)?;
            let outputs = reader.extract_page_ranges(&ExtractConfig {
                ranges,
                preserve_metadata,
            })?;
            write_all(output_dir, &input, &outputs)
        }
        Command::Merge {
            inputs,
            output,
            bookmarks,
            preserve_metadata,
        } => {
            let files = read_inputs(&inputs)?;
            let outcome = merge(
                &files,
                &MergeConfig {
                    add_bookmarks: bookmarks,
                    preserve_metadata,
                },
                engine,
            )?;
            report_skipped(&outcome.skipped);
            write_named(output_dir, &output, &outcome.document)
        }
        Command::Compress {
            input,
            level,
            preserve_metadata,
        } => {
            let reader = PdfReader::open(&input, engine)?;
            let outcome = reader.compress(&CompressConfig {
                level,
                preserve_metadata,
            })?;
            println!(
                "{} -> {} ({:.1}% smaller, {} images re-encoded)",
                format_bytes(outcome.original_size),
                format_bytes(outcome.compressed_size),
                outcome.savings_ratio() * 100.0,
                outcome.images_recompressed,
            );
            write_all(output_dir, &input, std::slice::from_ref(&outcome.document))
        }
        Command::Watermark(args) => watermark(args, engine, output_dir),
        Command::Protect(args) => protect(args, engine, output_dir),
        Command::Images(args) => images(args, engine, output_dir),
    }
}

fn split(args: SplitArgs, engine: &EngineConfig, output_dir: &Path) -> Result<()> {
    let mode = match (args.pages, args.ranges, args.parts) {
        (Some(pages), _, _) => SplitMode::Pages(pages),
        (_, Some(ranges), _) => SplitMode::Ranges(ranges),
        (_, _, Some(parts)) => SplitMode::EqualParts(parts),
        _ => SplitMode::EveryPage,
    };
    let reader = PdfReader::open(&args.input, engine)?;
    let outputs = reader.split(&SplitConfig {
        mode,
        preserve_metadata: args.preserve_metadata,
    })?;
    write_all(output_dir, &args.input, &outputs)
}

fn watermark(args: WatermarkArgs, engine: &EngineConfig, output_dir: &Path) -> Result<()> {
    let image = args
        .image
        .as_ref()
        .map(|path| fs::read(path).with_context(|| format!("failed to read {}", path.display())))
        .transpose()?;
    let reader = PdfReader::open(&args.input, engine)?;
    let output = reader.watermark(&WatermarkConfig {
        text: args.text,
        image,
        position: args.position,
        opacity: args.opacity,
        font_size: args.font_size,
        color: args.color,
        preserve_metadata: args.preserve_metadata,
    })?;
    write_all(output_dir, &args.input, std::slice::from_ref(&output))
}

fn protect(args: ProtectArgs, engine: &EngineConfig, output_dir: &Path) -> Result<()> {
    let permissions = Permissions {
        print: !args.no_print,
        modify: args.allow_modify,
        copy: !args.no_copy,
        annotate: args.allow_annotate,
    };
    let reader = PdfReader::open(&args.input, engine)?;
    let output = reader.protect(&ProtectConfig {
        user_password: args.user_password,
        owner_password: args.owner_password,
        permissions,
    })?;
    write_all(output_dir, &args.input, std::slice::from_ref(&output))
}

fn images(args: ImagesArgs, engine: &EngineConfig, output_dir: &Path) -> Result<()> {
    let files = read_inputs(&args.images)?;
    let writer = PdfWriter::new(
        ImagesToPdfConfig {
            page_size: args.page_size,
            orientation: args.orientation,
            margin: args.margin,
            fit_to_page: args.fit,
            maintain_aspect_ratio: !args.stretch,
            jpeg_quality: args.quality,
        },
        engine,
    );
    let outcome = writer.images_to_pdf(&files)?;
    report_skipped(&outcome.skipped);
    write_named(output_dir, &args.output, &outcome.document)
}

// -- Files --------------------------------------------------------------------

fn read_inputs(paths: &[PathBuf]) -> Result<Vec<InputFile>> {
    paths
        .iter()
        .map(|path| {
            let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            Ok(InputFile::new(display_name(path), bytes))
        })
        .collect()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `<input stem>-<output stem>.pdf`, so outputs from different inputs do
/// not collide in one directory.
pub fn output_path(output_dir: &Path, input: &Path, document: &OutputDocument) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output_dir.join(format!("{stem}-{}", document.file_name()))
}

fn write_all(output_dir: &Path, input: &Path, outputs: &[OutputDocument]) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    for document in outputs {
        write_document(&output_path(output_dir, input, document), document)?;
    }
    info!(count = outputs.len(), dir = %output_dir.display(), "outputs written");
    Ok(())
}

fn write_named(output_dir: &Path, name: &Path, document: &OutputDocument) -> Result<()> {
    if name.file_name().is_none() {
        bail!("'{}' is not a file name", name.display());
    }
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    write_document(&output_dir.join(name), document)
}

fn write_document(path: &Path, document: &OutputDocument) -> Result<()> {
    fs::write(path, &document.bytes).with_context(|| format!("failed to write {}", path.display()))?;
    println!(
        "{} ({} pages, {})",
        path.display(),
        document.page_count,
        format_bytes(document.bytes.len() as u64)
    );
    Ok(())
}

fn report_skipped(skipped: &[String]) {
    for name in skipped {
        warn!(%name, "input skipped");
        eprintln!("skipped: {name}");
    }
}

// -- Info ---------------------------------------------------------------------

fn describe(path: &Path, info: &DocumentInfo) -> String {
    let mut out = format!(
        "File:       {}\nPages:      {}\nSize:       {}\nVersion:    {}\nEncrypted:  {}\n",
        path.display(),
        info.page_count,
        format_bytes(info.byte_size),
        info.pdf_version,
        if info.encrypted { "yes" } else { "no" },
    );
    let metadata = &info.metadata;
    let fields = [
        ("Title", metadata.title.clone()),
        ("Author", metadata.author.clone()),
        ("Subject", metadata.subject.clone()),
        ("Keywords", metadata.keywords.clone()),
        ("Creator", metadata.creator.clone()),
        ("Producer", metadata.producer.clone()),
        ("Created", metadata.creation_date.map(|d| d.to_rfc3339())),
        ("Modified", metadata.modification_date.map(|d| d.to_rfc3339())),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            out.push_str(&format!("{:<12}{value}\n", format!("{label}:")));
        }
    }
    out
}
