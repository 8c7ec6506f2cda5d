use std::{fmt, io, time::Duration};

use thiserror::Error;

use crate::{colors::ColorFormatError, version::Version};

/// Errors produced while turning untyped launch data into typed records.
///
/// A failed parse never yields a partially populated record: the first field
/// that fails aborts the whole parse and is reported through [`ParseError::Field`].
#[derive(Debug, Error)]
pub enum ParseError {
    /// A string expected to hold JSON could not be decoded.
    #[error("value is not valid JSON: {0}")]
    MalformedInput(#[source] serde_json::Error),

    /// The decoded value is not a JSON object.
    #[error("expected a JSON object, found {found}")]
    InvalidShape { found: &'static str },

    /// A schema field rejected its raw value.
    #[error("unable to parse field \"{key}\": {cause}")]
    Field {
        key: String,
        #[source]
        cause: Box<ParseError>,
    },

    /// A primitive parser received a value of the wrong type or format.
    #[error("unable to parse {value} as {expected}")]
    TypeMismatch { expected: &'static str, value: String },
}

impl ParseError {
    pub(crate) fn mismatch(expected: &'static str, value: impl fmt::Display) -> Self {
        Self::TypeMismatch {
            expected,
            value: value.to_string(),
        }
    }

    pub(crate) fn missing(expected: &'static str) -> Self {
        Self::TypeMismatch {
            expected,
            value: "missing value".to_string(),
        }
    }

    /// Source key of the outermost field that failed, if any.
    pub fn field_key(&self) -> Option<&str> {
        match self {
            Self::Field { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Innermost error of a chain of field failures.
    pub fn root_cause(&self) -> &ParseError {
        match self {
            Self::Field { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

/// A caller asked for something the current state or host version does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Precondition {
    #[error("method requires host version {required}, current version is {current}")]
    VersionTooLow { required: Version, current: Version },

    #[error("popup is already opened")]
    PopupAlreadyOpened,

    #[error("{what} has incorrect size: {len} (allowed {min}..={max})")]
    LengthOutOfRange {
        what: &'static str,
        len: usize,
        min: usize,
        max: usize,
    },

    #[error("url {url} is not allowed: {reason}")]
    UrlNotAllowed { url: String, reason: String },
}

/// Errors raised by the transport and the app helpers built on it.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// None of the known delivery mechanisms is present.
    #[error("application is not available: no delivery mechanism to reach the host")]
    TransportUnavailable,

    /// A known inbound event carried a payload of the wrong shape.
    #[error("unable to emit event \"{event}\": data has unexpected format")]
    ProtocolViolation {
        event: String,
        #[source]
        cause: Option<ParseError>,
    },

    #[error(transparent)]
    PreconditionFailed(#[from] Precondition),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Color(#[from] ColorFormatError),

    #[error("failed to serialize outgoing payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("host i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("popup was not answered within {0:?}")]
    PopupTimeout(Duration),

    #[error("popup request was dropped before the host answered")]
    PopupCancelled,
}

impl BridgeError {
    pub(crate) fn protocol(event: &str) -> Self {
        Self::ProtocolViolation {
            event: event.to_string(),
            cause: None,
        }
    }

    pub(crate) fn length(what: &'static str, len: usize, min: usize, max: usize) -> Self {
        Self::PreconditionFailed(Precondition::LengthOutOfRange { what, len, min, max })
    }
}
