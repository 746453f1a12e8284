//! Error handling for the LIR loader
//!
//! Every failure while turning a document into a program is reported as a
//! single `LoadError` carrying the kind of problem and the `DocPath` of the
//! offending node. A failed load never yields a partial program.

use crate::doc_path::DocPath;
use thiserror::Error;

/// Main loader error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("{path}: missing required field `{field}`")]
    MissingField { path: DocPath, field: String },

    #[error("{path}: expected {expected}, found {found}")]
    WrongShape {
        path: DocPath,
        expected: String,
        found: String,
    },

    #[error("{path}: unknown kind `{kind}`")]
    UnknownKind { path: DocPath, kind: String },

    #[error("{path}: unrecognized type descriptor")]
    UnknownType { path: DocPath },

    #[error("{path}: unknown operator `{code}`")]
    UnknownOperator { path: DocPath, code: String },

    #[error("{path}: operand must be an integer or a variable name, found {found}")]
    InvalidOperand { path: DocPath, found: String },

    #[error("{path}: constant {value} does not fit in 32 bits")]
    ConstantOutOfRange { path: DocPath, value: String },

    #[error("{path}: duplicate declaration of `{name}`")]
    Duplicate { path: DocPath, name: String },

    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("IO error: {message}")]
    Io { message: String },
}

impl LoadError {
    /// Create a missing-field error for `field` of the object at `path`
    pub fn missing_field(path: &DocPath, field: &str) -> Self {
        LoadError::MissingField {
            path: path.clone(),
            field: field.to_string(),
        }
    }

    /// Create a shape error
    pub fn wrong_shape(path: &DocPath, expected: &str, found: String) -> Self {
        LoadError::WrongShape {
            path: path.clone(),
            expected: expected.to_string(),
            found,
        }
    }

    /// Create a duplicate-declaration error
    pub fn duplicate(path: &DocPath, name: &str) -> Self {
        LoadError::Duplicate {
            path: path.clone(),
            name: name.to_string(),
        }
    }

    /// Location of the offending node, when the error has one
    pub fn path(&self) -> Option<&DocPath> {
        match self {
            LoadError::MissingField { path, .. }
            | LoadError::WrongShape { path, .. }
            | LoadError::UnknownKind { path, .. }
            | LoadError::UnknownType { path }
            | LoadError::UnknownOperator { path, .. }
            | LoadError::InvalidOperand { path, .. }
            | LoadError::ConstantOutOfRange { path, .. }
            | LoadError::Duplicate { path, .. } => Some(path),
            LoadError::Syntax { .. } | LoadError::Io { .. } => None,
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::Io {
            message: err.to_string(),
        }
    }
}
