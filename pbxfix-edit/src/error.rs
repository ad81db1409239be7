//! Error types for pbxfix-edit.
//!
//! A failed splice is never fatal to the caller's pipeline. The variants
//! distinguish:
//! - Missing linkage (issue code 1): no existing build file for the library.
//! - Format mismatch (issue code 2): the project does not have the structure
//!   the splice relies on.

use pbxfix_pbxproj::ProjectError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// No `<library>.a in Frameworks` build file exists, so there is no file
    /// reference to link into another target.
    #[error("no `{library}.a in Frameworks` build file found in the project")]
    LinkageNotFound { library: String },

    /// A structural element the splice needs is absent or malformed.
    #[error("unexpected project format at {location}: {message}")]
    FormatMismatch { location: String, message: String },

    /// The identifier for the new build file is malformed or already taken.
    #[error("invalid build file identifier `{id}`: {message}")]
    InvalidIdentifier { id: String, message: String },
}

impl PatchError {
    pub(crate) fn format(location: impl Into<String>, message: impl Into<String>) -> Self {
        PatchError::FormatMismatch {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Returns true if the project layout, not the linkage, is at fault.
    pub fn is_format_error(&self) -> bool {
        !matches!(self, PatchError::LinkageNotFound { .. })
    }

    /// The number shown in the `(error N)` log line.
    pub fn issue_code(&self) -> u8 {
        match self {
            PatchError::LinkageNotFound { .. } => 1,
            PatchError::FormatMismatch { .. } | PatchError::InvalidIdentifier { .. } => 2,
        }
    }
}

impl From<ProjectError> for PatchError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::UnknownObject { id } => PatchError::format(id, "object not defined"),
            ProjectError::UnknownTarget { name } => PatchError::format(name, "target not defined"),
            ProjectError::UnexpectedShape { id, message } => PatchError::format(id, message),
            ProjectError::Parse { offset, message } => {
                PatchError::format(format!("byte {offset}"), message)
            }
            ProjectError::InvalidId(err) => PatchError::format("identifier", err.to_string()),
        }
    }
}

pub type PatchResult<T> = Result<T, PatchError>;
