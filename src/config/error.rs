use std::path::PathBuf;
use thiserror::Error;

use super::bind::FieldKind;

/// Errors surfaced by the file step of a configuration load.
///
/// Conversion failures during the environment overlay never reach this
/// type; they are absorbed per field.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: SyntaxError,
    },

    #[error("config file '{0}' does not contain a mapping at its root")]
    NotAMapping(PathBuf),

    #[error("failed to decode config file '{path}': {source}")]
    DecodeError {
        path: PathBuf,
        source: BindError,
    },
}

/// A document that is not valid for the chosen format.
#[derive(Debug, Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Why a single value could not be bound into a field.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BindError {
    #[error("cannot parse {value:?} as {kind}")]
    Parse { kind: FieldKind, value: String },

    #[error("{value:?} overflows {kind}")]
    Overflow { kind: FieldKind, value: String },

    #[error("malformed structured value: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("expected {expected}, found {found}")]
    Unexpected {
        expected: &'static str,
        found: &'static str,
    },

    #[error("null value")]
    Null,

    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),

    #[error("field `{field}`: {source}")]
    Field {
        field: String,
        source: Box<BindError>,
    },

    #[error("element {index}: {source}")]
    Element {
        index: usize,
        source: Box<BindError>,
    },
}

impl BindError {
    pub(crate) fn in_field(self, field: &str) -> Self {
        Self::Field {
            field: field.to_string(),
            source: Box::new(self),
        }
    }

    pub(crate) fn in_element(self, index: usize) -> Self {
        Self::Element {
            index,
            source: Box::new(self),
        }
    }
}
