//! Error types for pbxfix-pbxproj.

use crate::id::IdError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectError {
    /// The text is not valid project file grammar.
    #[error("parse error at byte {offset}: {message}")]
    Parse { offset: usize, message: String },

    /// No object is defined under this identifier.
    #[error("unknown object {id}")]
    UnknownObject { id: String },

    /// No native target carries this name.
    #[error("unknown target {name:?}")]
    UnknownTarget { name: String },

    /// The object exists but lacks a key or has a value of the wrong kind.
    #[error("unexpected shape for {id}: {message}")]
    UnexpectedShape { id: String, message: String },

    #[error(transparent)]
    InvalidId(#[from] IdError),
}

impl ProjectError {
    pub(crate) fn parse(offset: usize, message: impl Into<String>) -> Self {
        ProjectError::Parse {
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn shape(id: impl Into<String>, message: impl Into<String>) -> Self {
        ProjectError::UnexpectedShape {
            id: id.into(),
            message: message.into(),
        }
    }
}

pub type ProjectResult<T> = Result<T, ProjectError>;
