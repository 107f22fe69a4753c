// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Flatbed.

use thiserror::Error;

/// Top-level error type for all Flatbed operations.
#[derive(Debug, Error)]
pub enum FlatbedError {
    // -- Image I/O --
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    // -- Pipeline failures --
    #[error("no quadrilateral found among {candidates} contour candidates")]
    NoQuadrilateralFound { candidates: usize },

    #[error("degenerate document geometry: {0}")]
    DegenerateGeometry(String),

    #[error("expected exactly {expected} corner points, got {actual}")]
    PreconditionViolation { expected: usize, actual: usize },

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FlatbedError>;
