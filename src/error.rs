// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The error taxonomy shared by the parser, the optimizer, the random
//! sources and the buffer/image writers.  A trajectory escaping the
//! bailout radius is *not* an error; the renderer deals with that on
//! its own and never reports it.

use failure::Fail;
use std::io;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FlameError>;

/// Everything that can abort a render or a tone-mapping run.
#[derive(Debug, Fail)]
pub enum FlameError {
    /// A genome field is present but unacceptable: out of range,
    /// empty, non-positive, or naming an unknown variation.
    #[fail(display = "invalid genome field \"{}\": {}", path, reason)]
    Structural {
        /// Path of the offending field, e.g. `xforms[1].weight`.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The genome document is not JSON, or lacks a field, or a field
    /// has the wrong type.
    #[fail(display = "malformed genome document: {}", _0)]
    Parse(#[cause] serde_json::Error),

    /// A caller broke a contract, such as asking for a random integer
    /// below a non-positive bound.
    #[fail(display = "invalid argument: {}", _0)]
    InvalidArgument(String),

    /// A seed that the chosen generator cannot accept.
    #[fail(display = "invalid seed: {}", _0)]
    InvalidSeed(String),

    /// The tone mapper was asked for a scaling function it doesn't have.
    #[fail(display = "unknown scaling function \"{}\"", _0)]
    UnknownScale(String),

    /// Reading or writing a genome, buffer or image failed.
    #[fail(display = "could not {} {}: {}", operation, target, cause)]
    Io {
        /// What we were doing ("read", "write", "open", ...).
        operation: &'static str,
        /// The file name, or `stdin`/`stdout`.
        target: String,
        /// The underlying failure.
        #[cause]
        cause: io::Error,
    },

    /// A render worker thread panicked.
    #[fail(display = "a render worker panicked")]
    Worker,
}

impl FlameError {
    /// Shorthand for building a `Structural` error.
    pub fn structural<P: Into<String>, R: Into<String>>(path: P, reason: R) -> FlameError {
        FlameError::Structural {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for wrapping an I/O failure with its operation and target.
    pub fn io<T: Into<String>>(operation: &'static str, target: T, cause: io::Error) -> FlameError {
        FlameError::Io {
            operation,
            target: target.into(),
            cause,
        }
    }
}

impl From<serde_json::Error> for FlameError {
    fn from(e: serde_json::Error) -> Self {
        FlameError::Parse(e)
    }
}
