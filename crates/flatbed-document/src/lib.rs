// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// flatbed-document — Document rectification for Flatbed.
//
// Locates a photographed page, undoes its perspective distortion, and binarizes
// the flattened result into a scan-like image. Provides single-photo and
// parallel batch processing from paths.

pub mod batch;
pub mod image;
pub mod scan;

// Re-export the primary entry points so callers can use `flatbed_document::Scanner` etc.
pub use batch::{BatchItem, output_path, process, process_batch};
pub use crate::image::processor::ImageProcessor;
pub use scan::pipeline::{DebugArtifacts, ScanOutcome, Scanner};
