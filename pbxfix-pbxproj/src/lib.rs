//! Lossless document model for Xcode `project.pbxproj` files.
//!
//! The file holds a single root dictionary. Its `objects` dictionary maps
//! 24 character identifiers to objects distinguished by their `isa`:
//!
//! - `PBXProject`: the root object (`rootObject`), listing targets and groups.
//! - `PBXNativeTarget`: a target with build phases and a configuration list.
//! - `PBXBuildFile`: a file reference used by one build phase.
//! - `PBXFileReference` / `PBXGroup`: the file tree shown in the navigator.
//! - `PBX*BuildPhase`: ordered `files` lists of build file ids.
//! - `XCConfigurationList` / `XCBuildConfiguration`: per-configuration
//!   `buildSettings`.
//!
//! [`ProjectDocument`] keeps the original text and an index of byte offsets.
//! All mutations are splices of new text, so a read-only round trip returns
//! the input unchanged and edits leave unrelated objects byte-identical.

pub mod document;
pub mod error;
pub mod id;
pub mod model;
pub mod parse;
pub mod value;

pub use document::{Object, Position, ProjectDocument};
pub use error::{ProjectError, ProjectResult};
pub use id::{HashedIds, IdError, IdGenerator, ObjectId, RandomIds};
pub use model::{BuildPhaseKind, FileType, SourceTree, TargetInfo, file_type_for};
pub use parse::{Array, Dict, Entry, Node, Scalar};
pub use value::{Value, quote, render};
