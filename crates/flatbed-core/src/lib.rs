// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Flatbed — Core geometry, configuration, and error definitions shared across
// all crates.

pub mod config;
pub mod error;
pub mod geometry;
pub mod human_errors;

pub use config::ScanConfig;
pub use error::{FlatbedError, Result};
pub use geometry::*;
