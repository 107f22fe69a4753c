// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — edge preparation, document outline detection, corner
// ordering, perspective rectification, and scan-like finishing.

pub mod detect;
pub mod finish;
pub mod order;
pub mod pipeline;
pub mod preprocess;
pub mod rectify;

pub use detect::{detect_quad, search_quad, QuadSearch};
pub use finish::finish;
pub use order::{order_corners, order_points};
pub use pipeline::{DebugArtifacts, ScanOutcome, Scanner};
pub use preprocess::preprocess;
pub use rectify::rectify;
