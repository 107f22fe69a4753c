// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people running the scanner.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity decides how the command line reports the failure.

use crate::error::FlatbedError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The input file or the settings need to change.
    InputProblem,
    /// The photo was read fine but no usable page outline was found.
    NoDocument,
    /// Something went wrong inside the scanner itself.
    Internal,
}

impl Severity {
    /// Short tag shown in front of a failure on the command line.
    pub fn label(self) -> &'static str {
        match self {
            Self::InputProblem => "bad input",
            Self::NoDocument => "no page",
            Self::Internal => "internal error",
        }
    }
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// Severity level.
    pub severity: Severity,
}

/// Convert a `FlatbedError` into a `HumanError`.
pub fn humanize_error(err: &FlatbedError) -> HumanError {
    match err {
        FlatbedError::Decode(_) => HumanError {
            message: "This file couldn't be opened as a picture.".into(),
            suggestion: "Check that the file is a JPEG, PNG, or other common image format and isn't damaged.".into(),
            severity: Severity::InputProblem,
        },

        FlatbedError::Encode(_) => HumanError {
            message: "The scanned page couldn't be saved.".into(),
            suggestion: "Check that the output folder exists, is writable, and has free space.".into(),
            severity: Severity::InputProblem,
        },

        FlatbedError::NoQuadrilateralFound { .. } => HumanError {
            message: "No page outline was found in this photo.".into(),
            suggestion: "Take the photo against a plain background that contrasts with the paper, with all four corners of the page visible.".into(),
            severity: Severity::NoDocument,
        },

        FlatbedError::DegenerateGeometry(_) => HumanError {
            message: "The page outline found in this photo isn't a usable rectangle.".into(),
            suggestion: "Retake the photo from more directly above the page so its four corners are clearly separated.".into(),
            severity: Severity::NoDocument,
        },

        FlatbedError::PreconditionViolation { .. } => HumanError {
            message: "The scanner hit an internal error.".into(),
            suggestion: "Please report this together with the photo that caused it.".into(),
            severity: Severity::Internal,
        },

        FlatbedError::InvalidConfig(detail) => HumanError {
            message: "The scanner settings aren't valid.".into(),
            suggestion: format!("Fix the configuration and try again ({detail})."),
            severity: Severity::InputProblem,
        },

        FlatbedError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Make sure the configuration file is valid JSON.".into(),
            severity: Severity::InputProblem,
        },

        FlatbedError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "A file or folder couldn't be found.".into(),
                suggestion: "Check the path and try again.".into(),
                severity: Severity::InputProblem,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Permission was denied while reading or writing a file.".into(),
                suggestion: "Check the file permissions of the input and output locations.".into(),
                severity: Severity::InputProblem,
            },
            _ => HumanError {
                message: "A file couldn't be read or written.".into(),
                suggestion: "Check the paths and free disk space, then try again.".into(),
                severity: Severity::InputProblem,
            },
        },
    }
}
