//! Error types for the Hyperwallet client core.
//!
//! # Design
//! Two layers. `DecodeError` describes why a JSON document could not be
//! turned into a typed value; it is fatal to the decode call that raised it.
//! `ApiError` is what every `parse_*` method returns and wraps decode
//! failures alongside transport, GraphQL and token problems.
//!
//! Hosts that want one error-handling path call [`ApiError::errors`], which
//! folds every variant into the platform's `{code, message, fieldName}` shape.

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

pub const CODE_CONNECTION_ERROR: &str = "CONNECTION_ERROR";
pub const CODE_JSON_PARSE_ERROR: &str = "JSON_PARSE_ERROR";
pub const CODE_JSON_SERIALIZATION_ERROR: &str = "JSON_SERIALIZATION_ERROR";
pub const CODE_AUTH_TOKEN_ERROR: &str = "AUTH_TOKEN_ERROR";
pub const CODE_INVALID_PARAMETER: &str = "INVALID_PARAMETER";
pub const CODE_GRAPHQL_ERROR: &str = "GRAPHQL_ERROR";

/// Failure to turn a JSON document into a typed value.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum DecodeError {
    /// The text is not JSON at all.
    #[error("malformed JSON: {0}")]
    Syntax(String),

    #[error("missing required field `{field}`")]
    MissingField { field: String },

    #[error("field `{field}` is not {expected}")]
    WrongType { field: String, expected: &'static str },

    /// Two nodes of a keyed connection share the same key.
    #[error("duplicate key `{key}` in keyed connection")]
    DuplicateKey { key: String },

    #[error("invalid {context}: {message}")]
    Invalid { context: String, message: String },
}

impl DecodeError {
    pub(crate) fn missing(field: &str) -> Self {
        DecodeError::MissingField {
            field: field.to_string(),
        }
    }

    pub(crate) fn wrong_type(field: &str, expected: &'static str) -> Self {
        DecodeError::WrongType {
            field: field.to_string(),
            expected,
        }
    }

    pub(crate) fn invalid(context: &str, err: impl std::fmt::Display) -> Self {
        DecodeError::Invalid {
            context: context.to_string(),
            message: err.to_string(),
        }
    }
}

/// One entry of the platform's structured error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
}

impl Error {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            field_name: None,
        }
    }
}

/// The `{"errors": [...]}` body returned by the REST endpoints on failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Errors {
    #[serde(default)]
    pub errors: Vec<Error>,
}

impl Errors {
    pub fn single(error: Error) -> Self {
        Self {
            errors: vec![error],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Message of the first entry, if any.
    pub fn first_message(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message.as_str())
    }
}

impl std::fmt::Display for Errors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for e in &self.errors {
            if !first {
                write!(f, "; ")?;
            }
            first = false;
            write!(f, "{}: {}", e.code, e.message)?;
        }
        Ok(())
    }
}

/// Errors returned by `HyperwalletClient` build and parse methods.
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum ApiError {
    /// The server answered outside `[200, 300)`.
    #[error("HTTP {status}: {errors}")]
    Http { status: u16, errors: Errors },

    /// A well-formed GraphQL envelope carried `errors[]`.
    #[error("GraphQL error: {0}")]
    Graphql(Errors),

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("invalid authentication token: {0}")]
    InvalidToken(String),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The host could not complete the round trip (DNS, TLS, timeout, ...).
    #[error("transport failure: {0}")]
    Transport(String),
}

impl ApiError {
    pub fn transport(message: impl Into<String>) -> Self {
        ApiError::Transport(message.into())
    }

    /// HTTP status carried by the error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Fold any variant into the structured `{code, message, fieldName}` list.
    pub fn errors(&self) -> Errors {
        match self {
            ApiError::Http { errors, .. } | ApiError::Graphql(errors) => errors.clone(),
            ApiError::Decode(e) => Errors::single(Error::new(CODE_JSON_PARSE_ERROR, e.to_string())),
            ApiError::Serialization(msg) => {
                Errors::single(Error::new(CODE_JSON_SERIALIZATION_ERROR, msg.clone()))
            }
            ApiError::InvalidToken(msg) => Errors::single(Error::new(CODE_AUTH_TOKEN_ERROR, msg.clone())),
            ApiError::InvalidParameter { name, reason } => Errors::single(Error {
                code: CODE_INVALID_PARAMETER.to_string(),
                message: reason.clone(),
                field_name: Some((*name).to_string()),
            }),
            ApiError::Transport(msg) => Errors::single(Error::new(CODE_CONNECTION_ERROR, msg.clone())),
        }
    }
}
