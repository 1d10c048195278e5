// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `fibaro_lib` library.
//!
//! This module provides the error hierarchy used across the library: HTTP
//! transport failures, JSON document parsing, property value conversion, and
//! misuse of the state synchronization lifecycle.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred while talking to the hub.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a hub document.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A device property could not be read as the requested type.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// An update handler is already registered on the client.
    ///
    /// Only one polling session per client may be active at a time.
    #[error("there is already a state handler registered")]
    HandlerAlreadyRegistered,

    /// The state handler was already started or has been stopped.
    #[error("state handler was already started")]
    HandlerAlreadyStarted,

    /// The polling task needs a tokio runtime and none is running.
    #[error("no tokio runtime available to spawn the state handler")]
    NoRuntime,

    /// The hub rejected the credentials.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The hub could not be reached or answered unexpectedly.
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    /// The connection has not been established yet.
    #[error("not connected")]
    NotConnected,
}

/// Errors related to HTTP communication with the hub.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed (connection, timeout, TLS, ...).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The hub answered with a non-success status code.
    #[error("HTTP {status} - {reason}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The canonical reason phrase.
        reason: String,
    },

    /// The client was closed while the request was in flight.
    #[error("connection closed")]
    Closed,

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl ProtocolError {
    /// Returns the HTTP status code if the hub answered with an error status.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            Self::Closed | Self::InvalidAddress(_) => None,
        }
    }
}

/// Errors related to parsing hub documents.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON decoding failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the document.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Unexpected document shape.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),

    /// A field is present but holds an unusable value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// Errors raised when reading device properties as typed values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The property does not exist on the device.
    #[error("no {0} attribute available")]
    Missing(String),

    /// The property exists but cannot be converted.
    #[error("{property} cannot be converted to {target}")]
    NotConvertible {
        /// The property name.
        property: String,
        /// The requested target type.
        target: &'static str,
    },

    /// A color property is not a list of four integers.
    #[error("invalid color: {0}")]
    InvalidColor(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
