// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: decoding, resampling, JPEG re-encoding, and embedding
// raster images as PDF image XObjects.

pub mod processor;
pub mod xobject;

pub use processor::ImageProcessor;
pub use xobject::ImageXObject;
