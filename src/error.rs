// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the room card library.
//!
//! Only configuration errors are meant to reach the dashboard host. Template
//! and value errors are absorbed by the component that produced them and
//! turned into a safe fallback; they are still typed here so they can be
//! recorded, logged and tested.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A constrained value could not be constructed.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The card configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A template expression failed to lex, parse or evaluate.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// A host capability is missing or refused the request.
    #[error("host error: {0}")]
    Host(#[from] HostError),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    /// A numeric range is empty or inverted.
    #[error("invalid range: min {min} must be lower than max {max}")]
    InvalidRange {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// A step is zero, negative or not finite.
    #[error("invalid step {0}: must be a positive number")]
    InvalidStep(f64),

    /// A discrete control was given no modes.
    #[error("mode list is empty")]
    EmptyModes,

    /// A color string is not a valid CSS color.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A numeric value is not a finite number.
    #[error("value {0} is not finite")]
    NotFinite(f64),

    /// A temperature band name is not recognized.
    #[error("unknown temperature band: {0}")]
    UnknownBand(String),
}

/// Errors raised while loading or validating the card configuration.
///
/// These are the only errors surfaced to the dashboard host.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration is not valid JSON or has the wrong shape.
    #[error("malformed configuration: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A required field is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A device kind string is not recognized.
    #[error("unknown device kind: {0}")]
    UnknownKind(String),

    /// A control mode string is not recognized.
    #[error("unknown control mode: {0}")]
    UnknownControlMode(String),

    /// A device descriptor carries an invalid value.
    #[error("device {entity}: {source}")]
    InvalidDevice {
        /// The entity the descriptor refers to.
        entity: String,
        /// The underlying value error.
        #[source]
        source: ValueError,
    },

    /// A background color entry is malformed.
    #[error("background color for {band}: {source}")]
    InvalidColor {
        /// The temperature band name.
        band: String,
        /// The underlying value error.
        #[source]
        source: ValueError,
    },
}

/// Errors produced by the template expression language.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TemplateError {
    /// An unrecognized character sequence was found.
    #[error("unexpected character at offset {offset}: {text:?}")]
    Lex {
        /// Byte offset in the expression source.
        offset: usize,
        /// The offending text.
        text: String,
    },

    /// The token stream does not form a valid program.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax {
        /// Byte offset in the expression source.
        offset: usize,
        /// Description of the problem.
        message: String,
    },

    /// Evaluation failed at runtime.
    #[error("evaluation error: {0}")]
    Eval(String),

    /// A name was not bound in the evaluation scope.
    #[error("{0} is not defined")]
    Undefined(String),

    /// A value was called that is not a helper function.
    #[error("{0} is not a function")]
    NotCallable(String),
}

impl TemplateError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn eval(message: impl Into<String>) -> Self {
        Self::Eval(message.into())
    }
}

/// Errors related to host capabilities.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The host does not offer the requested capability.
    #[error("host does not support {0}")]
    Unsupported(String),

    /// The referenced entity is unknown to the host.
    #[error("unknown entity: {0}")]
    UnknownEntity(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
