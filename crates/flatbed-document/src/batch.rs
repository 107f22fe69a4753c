// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Path-based processing — decode a photo, scan it, and write the results next
// to each other in an output directory. Batches run in parallel.

use std::path::{Path, PathBuf};

use flatbed_core::error::Result;
use image::DynamicImage;
use rayon::prelude::*;
use tracing::{info, instrument, warn};

use crate::image::processor::{ImageProcessor, save_image};
use crate::scan::pipeline::Scanner;

/// Suffix of the final scanned page.
pub const SCANNED_SUFFIX: &str = "scanned";

/// Outcome of one input in a batch.
#[derive(Debug)]
pub struct BatchItem {
    pub input: PathBuf,
    pub result: Result<PathBuf>,
}

/// `<out_dir>/<stem>_<suffix><.ext>`, keeping the input's extension. Inputs
/// without an extension are written as PNG.
pub fn output_path(input: &Path, out_dir: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    out_dir.join(format!("{stem}_{suffix}.{ext}"))
}

/// Scan one photo from disk and write `<stem>_scanned<.ext>` into `out_dir`.
///
/// In debug mode the edge map, outline overlay, and flattened page are written
/// as well (`_edged`, `_outline`, `_flat`). Nothing is written when the scan
/// fails. Returns the path of the scanned page.
#[instrument(skip(scanner), fields(input = %input.display()))]
pub fn process(input: &Path, out_dir: &Path, scanner: &Scanner) -> Result<PathBuf> {
    let photo = ImageProcessor::open(input)?;
    let outcome = scanner.scan(photo.as_dynamic())?;

    if let Some(artifacts) = outcome.artifacts {
        let debug_images = [
            ("edged", DynamicImage::ImageLuma8(artifacts.edged)),
            ("outline", DynamicImage::ImageRgb8(artifacts.outline)),
            ("flat", DynamicImage::ImageRgb8(artifacts.flat)),
        ];
        for (suffix, image) in &debug_images {
            save_image(image, output_path(input, out_dir, suffix))?;
        }
    }

    let scanned = output_path(input, out_dir, SCANNED_SUFFIX);
    save_image(&DynamicImage::ImageLuma8(outcome.scan), &scanned)?;
    info!(output = %scanned.display(), "Scanned page written");
    Ok(scanned)
}

/// Process many photos in parallel on the current rayon pool.
///
/// Each input is independent: a failure is recorded in its own `BatchItem`
/// and never affects the others. Results come back in input order.
pub fn process_batch(inputs: &[PathBuf], out_dir: &Path, scanner: &Scanner) -> Vec<BatchItem> {
    info!(count = inputs.len(), "Processing batch");
    inputs
        .par_iter()
        .map(|input| {
            let result = process(input, out_dir, scanner);
            if let Err(err) = &result {
                warn!(input = %input.display(), error = %err, "Scan failed");
            }
            BatchItem {
                input: input.clone(),
                result,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_appends_suffix_and_keeps_extension() {
        let out = output_path(Path::new("/photos/receipt.jpg"), Path::new("/tmp/out"), "scanned");
        assert_eq!(out, PathBuf::from("/tmp/out/receipt_scanned.jpg"));
    }

    #[test]
    fn output_path_defaults_to_png() {
        let out = output_path(Path::new("page"), Path::new("."), "edged");
        assert_eq!(out, PathBuf::from("./page_edged.png"));
    }

    #[test]
    fn output_path_uses_last_extension_only() {
        let out = output_path(Path::new("a/b/scan.v2.png"), Path::new("out"), "flat");
        assert_eq!(out, PathBuf::from("out/scan.v2_flat.png"));
    }
}
