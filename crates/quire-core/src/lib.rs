// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quire: Core types, per-operation configuration, and error definitions
// shared across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;

pub use config::{
    CompressConfig, CompressionLevel, EngineConfig, ExtractConfig, ImagesToPdfConfig, Limits,
    MergeConfig, Orientation, PageSize, Permissions, ProtectConfig, RgbColor, SplitConfig,
    SplitMode, WatermarkConfig, WatermarkPosition,
};
pub use error::{ErrorKind, QuireError, Result};
pub use types::*;
