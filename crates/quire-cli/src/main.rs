// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quire: PDF transformation engine, command-line front end.
//
// Entry point. Parses arguments, initialises logging, loads the engine
// config and dispatches to one subcommand per operation.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use quire_core::human_errors::humanize_error;
use quire_core::{
    CompressionLevel, EngineConfig, Orientation, PageRange, PageSize, QuireError, RgbColor,
    WatermarkPosition,
};

#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(author, version, about = "Split, merge, compress, watermark and protect PDF documents", long_about = None)]
pub struct Cli {
    /// Engine config file (JSON)
    #[arg(long, global = true, env = "QUIRE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory output files are written to
    #[arg(long, global = true, default_value = ".")]
    output_dir: PathBuf,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show page count, version and metadata of a PDF
    Info {
        input: PathBuf,
    },

    /// Split a PDF into several documents
    Split(SplitArgs),

    /// Extract page ranges into separate documents
    Extract {
        input: PathBuf,

        /// Ranges such as 1-3,5-6
        #[arg(long, required = true, value_delimiter = ',')]
        ranges: Vec<PageRange>,

        #[arg(long)]
        preserve_metadata: bool,
    },

    /// Combine PDFs in the given order
    Merge {
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,

        /// Output file name inside the output directory
        #[arg(short, long, default_value = "merged.pdf")]
        output: PathBuf,

        /// One bookmark per input file
        #[arg(long)]
        bookmarks: bool,

        /// Copy metadata from the first input
        #[arg(long)]
        preserve_metadata: bool,
    },

    /// Reduce file size
    Compress {
        input: PathBuf,

        /// low, medium, high or maximum
        #[arg(long, default_value = "medium")]
        level: CompressionLevel,

        #[arg(long)]
        preserve_metadata: bool,
    },

    /// Stamp text and/or an image on every page
    Watermark(WatermarkArgs),

    /// Encrypt a PDF with a password
    Protect(ProtectArgs),

    /// Create a PDF with one page per image
    Images(ImagesArgs),
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    input: PathBuf,

    /// One document per listed page, e.g. 2,4
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["ranges", "parts", "every_page"])]
    pages: Option<Vec<u32>>,

    /// One document per range, e.g. 1-3,5-6
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["parts", "every_page"])]
    ranges: Option<Vec<PageRange>>,

    /// This many roughly equal parts
    #[arg(long, conflicts_with = "every_page")]
    parts: Option<u32>,

    /// One document per page (the default)
    #[arg(long)]
    every_page: bool,

    #[arg(long)]
    preserve_metadata: bool,
}

#[derive(Args, Debug)]
pub struct WatermarkArgs {
    input: PathBuf,

    #[arg(long)]
    text: Option<String>,

    /// PNG or JPEG image
    #[arg(long)]
    image: Option<PathBuf>,

    /// center, diagonal, top-left, top-right, bottom-left or bottom-right
    #[arg(long, default_value = "center")]
    position: WatermarkPosition,

    #[arg(long, default_value_t = 0.5)]
    opacity: f32,

    #[arg(long, default_value_t = 48.0)]
    font_size: f32,

    /// Text colour as #rrggbb
    #[arg(long, default_value = "#808080")]
    color: RgbColor,

    #[arg(long)]
    preserve_metadata: bool,
}

#[derive(Args, Debug)]
pub struct ProtectArgs {
    input: PathBuf,

    /// Password needed to open the document (6-32 printable ASCII characters)
    #[arg(long, env = "QUIRE_USER_PASSWORD")]
    user_password: String,

    /// Password granting full access; random when omitted
    #[arg(long, env = "QUIRE_OWNER_PASSWORD")]
    owner_password: Option<String>,

    #[arg(long)]
    no_print: bool,

    #[arg(long)]
    no_copy: bool,

    #[arg(long)]
    allow_modify: bool,

    #[arg(long)]
    allow_annotate: bool,
}

#[derive(Args, Debug)]
pub struct ImagesArgs {
    #[arg(required = true)]
    images: Vec<PathBuf>,

    #[arg(short, long, default_value = "images.pdf")]
    output: PathBuf,

    /// a4, a3, letter or legal
    #[arg(long, default_value = "a4")]
    page_size: PageSize,

    /// portrait or landscape
    #[arg(long, default_value = "portrait")]
    orientation: Orientation,

    /// Margin in points
    #[arg(long, default_value_t = 20.0)]
    margin: f32,

    /// Scale every image to fill the page area
    #[arg(long)]
    fit: bool,

    /// Let oversized images be squeezed per axis instead of shrunk uniformly
    #[arg(long)]
    stretch: bool,

    /// JPEG quality for images that must be re-encoded
    #[arg(long, default_value_t = 92, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading engine config");
            Ok(EngineConfig::load(path)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = load_config(cli.config.as_ref()).and_then(|engine| commands::run(cli.command, &engine, &cli.output_dir));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

/// Print an error for a person: engine errors in plain English, everything
/// else with its context chain.
fn report(err: &anyhow::Error) {
    match err.downcast_ref::<QuireError>() {
        Some(quire_err) => {
            let human = humanize_error(quire_err);
            tracing::debug!(error = %quire_err, kind = ?quire_err.kind(), "operation failed");
            eprintln!("error: {}", human.message);
            eprintln!("  {}", human.suggestion);
        }
        None => eprintln!("error: {err:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn split_selection_flags_parse() {
        let cli = Cli::try_parse_from(["quire", "split", "in.pdf", "--ranges", "1-3,5-6"]).unwrap();
        let Command::Split(args) = cli.command else {
            panic!("expected split");
        };
        assert_eq!(args.ranges, Some(vec![PageRange::new(1, 3), PageRange::new(5, 6)]));
        assert!(args.pages.is_none());
    }

    #[test]
    fn split_selections_are_exclusive() {
        let err = Cli::try_parse_from(["quire", "split", "in.pdf", "--pages", "2", "--parts", "3"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn merge_needs_two_inputs() {
        assert!(Cli::try_parse_from(["quire", "merge", "one.pdf"]).is_err());
        assert!(Cli::try_parse_from(["quire", "merge", "one.pdf", "two.pdf"]).is_ok());
    }

    #[test]
    fn typed_option_values() {
        let cli = Cli::try_parse_from([
            "quire",
            "watermark",
            "in.pdf",
            "--text",
            "DRAFT",
            "--position",
            "diagonal",
            "--color",
            "#ff0000",
        ])
        .unwrap();
        let Command::Watermark(args) = cli.command else {
            panic!("expected watermark");
        };
        assert_eq!(args.position, WatermarkPosition::Diagonal);
        assert_eq!(args.color, RgbColor::new(1.0, 0.0, 0.0));

        assert!(Cli::try_parse_from(["quire", "compress", "in.pdf", "--level", "extreme"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["quire", "info", "in.pdf", "--output-dir", "out", "-vv"]).unwrap();
        assert_eq!(cli.output_dir, PathBuf::from("out"));
        assert_eq!(cli.verbose, 2);
    }
}
