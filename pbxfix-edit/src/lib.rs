//! Static library linkage splice for exported Xcode projects.
//!
//! Xcode projects generated by a game engine already link the SDK's static
//! library into the app target. [`link_static_library`] links the same file
//! into another target (typically a freshly created app extension):
//!
//! - copy the library's `PBXBuildFile` under a new identifier,
//! - put the copy at the front of the target's frameworks phase,
//! - add a `LIBRARY_SEARCH_PATHS` stanza in front of every
//!   `PRODUCT_BUNDLE_IDENTIFIER` build setting.
//!
//! Every location is found through the parsed document and checked before
//! the first byte changes, so an error leaves the project text untouched.

pub mod error;

pub use error::{PatchError, PatchResult};

use camino::Utf8Path;
use diffy::PatchFormatter;
use pbxfix_pbxproj::model::BUILD_FILE;
use pbxfix_pbxproj::value::render_object;
use pbxfix_pbxproj::{Node, ObjectId, Position, ProjectDocument, Value, render};
use std::ops::Range;
use tracing::{debug, info};

/// Inherited-paths marker that opens every search path stanza.
pub const INHERITED: &str = "$(inherited)";

const SEARCH_PATHS_KEY: &str = "LIBRARY_SEARCH_PATHS";
const BUNDLE_ID_KEY: &str = "PRODUCT_BUNDLE_IDENTIFIER";
const CONFIGURATION: &str = "XCBuildConfiguration";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticLinkRequest {
    /// Library name without extension, e.g. `libOneSignal`.
    pub library: String,
    /// Identifier for the new `PBXBuildFile`; must not be in use.
    pub build_file_id: ObjectId,
    pub target_id: ObjectId,
    /// Directory added to `LIBRARY_SEARCH_PATHS`.
    pub search_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOutcome {
    pub file_ref: ObjectId,
    pub build_file_id: ObjectId,
    pub phase_id: ObjectId,
    pub build_action_mask: u64,
    pub search_path_insertions: usize,
}

/// The `/* ... */` annotation Xcode writes for a library build file.
pub fn build_file_comment(library: &str) -> String {
    format!("{library}.a in Frameworks")
}

/// Links the static library `req.library`, already linked into some other
/// target, into `req.target_id`.
pub fn link_static_library(
    doc: &mut ProjectDocument,
    req: &StaticLinkRequest,
) -> PatchResult<LinkOutcome> {
    if doc.contains_object(req.build_file_id.as_str()) {
        return Err(PatchError::InvalidIdentifier {
            id: req.build_file_id.to_string(),
            message: "already defined in the project".to_string(),
        });
    }

    let comment = build_file_comment(&req.library);
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();

    let (file_ref, copy_at, copy) = locate_linkage(doc, req, &comment)?;
    edits.push((copy_at..copy_at, copy));

    let (phase_id, build_action_mask, front) = locate_phase(doc, req, &comment)?;
    edits.push(front);

    let stanzas = search_path_stanzas(doc, &req.search_path);
    let search_path_insertions = stanzas.len();
    edits.extend(stanzas);

    doc.splice_all(edits)?;

    info!(
        library = req.library.as_str(),
        target = req.target_id.as_str(),
        build_file = req.build_file_id.as_str(),
        search_paths = search_path_insertions,
        "linked static library"
    );
    Ok(LinkOutcome {
        file_ref,
        build_file_id: req.build_file_id.clone(),
        phase_id,
        build_action_mask,
        search_path_insertions,
    })
}

/// Finds the first build file annotated `comment` and renders its copy.
/// Returns the file reference, the offset after the found definition and
/// the text to insert there.
fn locate_linkage(
    doc: &ProjectDocument,
    req: &StaticLinkRequest,
    comment: &str,
) -> PatchResult<(ObjectId, usize, String)> {
    let source = doc
        .objects_with_isa(BUILD_FILE)
        .find(|o| o.comment() == Some(comment) && o.get("fileRef").is_some())
        .ok_or_else(|| PatchError::LinkageNotFound {
            library: req.library.clone(),
        })?;
    debug!(entry = source.id(), "found existing linkage");

    let raw = source
        .get("fileRef")
        .and_then(Node::as_scalar)
        .ok_or_else(|| PatchError::format(source.id(), "fileRef is not an identifier"))?;
    let file_ref = ObjectId::parse(&raw.value)
        .map_err(|err| PatchError::format(source.id(), format!("fileRef: {err}")))?;
    if !doc.contains_object(file_ref.as_str()) {
        return Err(PatchError::format(
            source.id(),
            format!("fileRef {file_ref} is not defined"),
        ));
    }

    let file_name = raw
        .comment
        .clone()
        .unwrap_or_else(|| format!("{}.a", req.library));
    let indent = doc.line_indent(source.entry.key.span.start);
    let line = render_object(
        &req.build_file_id,
        Some(comment),
        BUILD_FILE,
        &[("fileRef".to_string(), Value::reference(&file_ref, file_name))],
        indent.matches('\t').count(),
        true,
    );
    Ok((file_ref, source.entry.end, format!("\n{indent}{line}")))
}

/// Resolves the target's frameworks phase, reads its `buildActionMask` and
/// computes the front insertion into `files`.
fn locate_phase(
    doc: &ProjectDocument,
    req: &StaticLinkRequest,
    comment: &str,
) -> PatchResult<(ObjectId, u64, (Range<usize>, String))> {
    let target = req.target_id.as_str();
    let phase_id = doc
        .frameworks_build_phase(target)?
        .ok_or_else(|| PatchError::format(target, "target has no frameworks build phase"))?;
    let phase = doc.require(phase_id.as_str())?;

    let mask_text = phase
        .get("buildActionMask")
        .and_then(Node::as_scalar)
        .map(|s| s.value.as_str())
        .ok_or_else(|| PatchError::format(phase.id(), "missing buildActionMask"))?;
    let digits: String = mask_text.chars().take_while(char::is_ascii_digit).collect();
    let build_action_mask = digits
        .parse::<u64>()
        .map_err(|_| PatchError::format(phase.id(), format!("buildActionMask {mask_text:?} is not numeric")))?;

    let files = phase
        .body
        .entry("files")
        .ok_or_else(|| PatchError::format(phase.id(), "missing files"))?;
    let list = files
        .value
        .as_array()
        .ok_or_else(|| PatchError::format(phase.id(), "files is not a list"))?;

    let item = Value::reference(&req.build_file_id, comment);
    let (at, text) = doc.array_insertion(files.key.span.start, list, &item, Position::Front);
    Ok((phase_id, build_action_mask, (at..at, text)))
}

/// One stanza per `PRODUCT_BUNDLE_IDENTIFIER` setting, inserted right in
/// front of it. Configurations whose search paths already hold `path` are
/// skipped.
fn search_path_stanzas(doc: &ProjectDocument, path: &str) -> Vec<(Range<usize>, String)> {
    let list = Value::List(vec![Value::str(INHERITED), Value::str(path)]);
    let mut edits = Vec::new();

    for config in doc.objects_with_isa(CONFIGURATION) {
        let Some(settings) = config.get_dict("buildSettings") else {
            continue;
        };
        let present = settings
            .entries
            .iter()
            .filter(|e| e.key.value == SEARCH_PATHS_KEY)
            .any(|e| match &e.value {
                Node::Array(a) => a.contains(path),
                Node::Scalar(s) => s.value == path,
                Node::Dict(_) => false,
            });
        if present {
            debug!(config = config.id(), "search path already configured");
            continue;
        }

        for entry in settings.entries.iter().filter(|e| e.key.value == BUNDLE_ID_KEY) {
            let at = entry.key.span.start;
            let indent = doc.line_indent(at);
            let depth = indent.matches('\t').count();
            edits.push((
                at..at,
                format!("{SEARCH_PATHS_KEY} = {};\n{indent}", render(&list, depth, false)),
            ));
        }
    }
    edits
}

/// Renders a unified diff of one file, `diff --git` style.
pub fn render_patch(path: &Utf8Path, before: &str, after: &str) -> String {
    if before == after {
        return String::new();
    }

    let mut out = String::new();
    out.push_str(&format!("diff --git a/{0} b/{0}\n", path));
    out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", path));

    let patch = diffy::create_patch(before, after);
    let formatter = PatchFormatter::new();
    out.push_str(&formatter.fmt_patch(&patch).to_string());
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn comment_names_frameworks_phase() {
        assert_eq!(build_file_comment("libOneSignal"), "libOneSignal.a in Frameworks");
    }

    #[test]
    fn patch_of_identical_text_is_empty() {
        assert_eq!(render_patch(Utf8Path::new("a"), "x\n", "x\n"), "");
    }

    #[test]
    fn patch_has_git_headers() {
        let diff = render_patch(Utf8Path::new("p/project.pbxproj"), "a\nb\n", "a\nc\n");
        assert!(diff.starts_with("diff --git a/p/project.pbxproj b/p/project.pbxproj\n"));
        assert!(diff.contains("-b\n+c\n"));
    }
}
