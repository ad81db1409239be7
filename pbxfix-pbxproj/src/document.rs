//! The project document: source text plus a structural index over it.
//!
//! Edits are byte splices at offsets located through the index, followed by a
//! re-index. Text outside the spliced ranges is never rewritten, so a document
//! that is only read serializes back to the exact input.

use crate::error::{ProjectError, ProjectResult};
use crate::id::{HashedIds, IdGenerator, ObjectId};
use crate::parse::{Array, Dict, Entry, Node, parse_document};
use crate::value::{Value, quote, render, render_object};
use std::fmt;
use std::ops::Range;
use tracing::trace;

/// Where a new item goes in an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Front,
    Back,
}

/// A read-only view of one entry of the `objects` dictionary.
#[derive(Debug, Clone, Copy)]
pub struct Object<'a> {
    pub entry: &'a Entry,
    pub body: &'a Dict,
}

impl<'a> Object<'a> {
    pub fn id(&self) -> &'a str {
        &self.entry.key.value
    }

    /// The `/* ... */` annotation after the identifier, if any.
    pub fn comment(&self) -> Option<&'a str> {
        self.entry.key.comment.as_deref()
    }

    pub fn isa(&self) -> Option<&'a str> {
        self.body.get_str("isa")
    }

    pub fn get(&self, key: &str) -> Option<&'a Node> {
        self.body.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&'a str> {
        self.body.get_str(key)
    }

    pub fn get_array(&self, key: &str) -> Option<&'a Array> {
        self.body.get_array(key)
    }

    pub fn get_dict(&self, key: &str) -> Option<&'a Dict> {
        self.body.get_dict(key)
    }
}

pub struct ProjectDocument {
    text: String,
    root: Dict,
    ids: Box<dyn IdGenerator>,
}

impl fmt::Debug for ProjectDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectDocument")
            .field("bytes", &self.text.len())
            .field("objects", &self.objects().count())
            .finish()
    }
}

impl ProjectDocument {
    /// Parses a project file. New identifiers are derived deterministically
    /// from the text via [`HashedIds`]; see [`Self::with_id_generator`].
    pub fn parse(text: impl Into<String>) -> ProjectResult<Self> {
        let text = text.into();
        let root = parse_document(&text)?;
        let seed = root
            .get_str("rootObject")
            .unwrap_or("pbxfix")
            .to_string();
        let doc = Self {
            text,
            root,
            ids: Box::new(HashedIds::new(seed)),
        };
        doc.objects_dict()?;
        Ok(doc)
    }

    pub fn with_id_generator(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn root(&self) -> &Dict {
        &self.root
    }

    pub(crate) fn objects_dict(&self) -> ProjectResult<&Dict> {
        self.root
            .get_dict("objects")
            .ok_or_else(|| ProjectError::shape("<root>", "missing objects dictionary"))
    }

    /// All objects in document order.
    pub fn objects(&self) -> impl Iterator<Item = Object<'_>> {
        self.root
            .get_dict("objects")
            .into_iter()
            .flat_map(|d| d.entries.iter())
            .filter_map(|entry| {
                entry.value.as_dict().map(|body| Object { entry, body })
            })
    }

    pub fn objects_with_isa<'a>(&'a self, isa: &'a str) -> impl Iterator<Item = Object<'a>> {
        self.objects().filter(move |o| o.isa() == Some(isa))
    }

    pub fn object(&self, id: &str) -> Option<Object<'_>> {
        self.objects().find(|o| o.id() == id)
    }

    pub fn require(&self, id: &str) -> ProjectResult<Object<'_>> {
        self.object(id).ok_or_else(|| ProjectError::UnknownObject { id: id.to_string() })
    }

    pub fn contains_object(&self, id: &str) -> bool {
        self.object(id).is_some()
    }

    pub fn root_object_id(&self) -> ProjectResult<&str> {
        self.root
            .get_str("rootObject")
            .ok_or_else(|| ProjectError::shape("<root>", "missing rootObject"))
    }

    /// A fresh identifier not yet defined in the document.
    pub fn fresh_id(&mut self, kind: &str, name: &str) -> ObjectId {
        loop {
            let id = self.ids.next_id(kind, name);
            if !self.contains_object(id.as_str()) {
                return id;
            }
        }
    }

    /// Applies several splices at once. Ranges refer to the current text and
    /// must not overlap. The document is re-indexed once; if the result does
    /// not parse, the text is restored and the error returned.
    pub fn splice_all(&mut self, mut edits: Vec<(Range<usize>, String)>) -> ProjectResult<()> {
        if edits.is_empty() {
            return Ok(());
        }
        edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));

        let mut text = self.text.clone();
        for (range, insert) in &edits {
            trace!(at = range.start, removed = range.len(), added = insert.len(), "splice");
            text.replace_range(range.clone(), insert);
        }

        let root = parse_document(&text)?;
        self.text = text;
        self.root = root;
        Ok(())
    }

    pub fn splice(&mut self, range: Range<usize>, insert: impl Into<String>) -> ProjectResult<()> {
        self.splice_all(vec![(range, insert.into())])
    }

    pub fn insert_at(&mut self, offset: usize, insert: impl Into<String>) -> ProjectResult<()> {
        self.splice(offset..offset, insert)
    }

    pub(crate) fn line_start(&self, offset: usize) -> usize {
        self.text[..offset].rfind('\n').map_or(0, |p| p + 1)
    }

    /// Leading whitespace of the line containing `offset`.
    pub fn line_indent(&self, offset: usize) -> &str {
        let start = self.line_start(offset);
        let rest = &self.text[start..];
        let len = rest
            .find(|c: char| c != '\t' && c != ' ')
            .unwrap_or(rest.len());
        &rest[..len]
    }

    fn indent_depth(&self, offset: usize) -> usize {
        self.line_indent(offset).chars().filter(|c| *c == '\t').count()
    }

    /// Renders and inserts a new object definition into its `isa` section.
    ///
    /// Objects are kept sorted by identifier within a section. A section that
    /// does not exist yet is created in front of the first section whose
    /// `isa` sorts after it, or at the end of `objects`.
    pub fn insert_object(
        &mut self,
        id: &ObjectId,
        comment: Option<&str>,
        isa: &str,
        fields: &[(String, Value)],
        inline: bool,
    ) -> ProjectResult<()> {
        if self.contains_object(id.as_str()) {
            return Err(ProjectError::shape(id.as_str(), "identifier already defined"));
        }
        let def = render_object(id, comment, isa, fields, 2, inline);

        let (offset, insert) = {
            let objects = self.objects_dict()?;
            let same: Vec<&Entry> = self
                .objects_with_isa(isa)
                .map(|o| o.entry)
                .collect();

            if let Some(next) = same.iter().find(|e| e.key.value.as_str() > id.as_str()) {
                (self.line_start(next.key.span.start), format!("\t\t{def}\n"))
            } else if let Some(last) = same.last() {
                (last.end, format!("\n\t\t{def}"))
            } else {
                let later = self
                    .objects()
                    .filter_map(|o| o.isa())
                    .filter(|other| *other > isa)
                    .min()
                    .and_then(|other| {
                        self.text
                            .find(&format!("/* Begin {other} section */"))
                            .map(|p| self.line_start(p))
                    });
                match later {
                    Some(at) => (
                        at,
                        format!("/* Begin {isa} section */\n\t\t{def}\n/* End {isa} section */\n\n"),
                    ),
                    None => (
                        self.line_start(objects.close),
                        format!("\n/* Begin {isa} section */\n\t\t{def}\n/* End {isa} section */\n"),
                    ),
                }
            }
        };

        trace!(id = id.as_str(), isa, "insert object");
        self.insert_at(offset, insert)
    }

    /// Locates the array stored under `key` in object `id`.
    fn array_of(&self, id: &str, key: &str) -> ProjectResult<(&Entry, &Array)> {
        let obj = self.require(id)?;
        let entry = obj
            .body
            .entry(key)
            .ok_or_else(|| ProjectError::shape(id, format!("missing {key}")))?;
        let array = entry
            .value
            .as_array()
            .ok_or_else(|| ProjectError::shape(id, format!("{key} is not a list")))?;
        Ok((entry, array))
    }

    /// Computes the splice that adds `item` to `array`, whose owning entry
    /// starts at `entry_start`. Nothing is changed; pass the result to
    /// [`Self::splice_all`] together with other edits.
    pub fn array_insertion(
        &self,
        entry_start: usize,
        array: &Array,
        item: &Value,
        position: Position,
    ) -> (usize, String) {
        let depth = self.indent_depth(entry_start) + 1;
        let indent = "\t".repeat(depth);
        let rendered = render(item, depth, false);
        let multiline = self.text[array.open..array.close].contains('\n');

        if let (Position::Back, Some(last_end)) = (position, self.unterminated_tail(array)) {
            return if multiline {
                (last_end, format!(",\n{indent}{rendered},"))
            } else {
                (last_end, format!(", {rendered}"))
            };
        }

        match (position, multiline) {
            (Position::Front, true) => (array.open + 1, format!("\n{indent}{rendered},")),
            (Position::Back, true) => (self.line_start(array.close), format!("{indent}{rendered},\n")),
            (_, false) if array.items.is_empty() => (
                array.close,
                format!("\n{indent}{rendered},\n{}", "\t".repeat(depth - 1)),
            ),
            (Position::Front, false) => (array.open + 1, format!("{rendered}, ")),
            (Position::Back, false) => (array.close, format!("{rendered}, ")),
        }
    }

    /// End of the last item of `array`, its `/* */` annotation included, when
    /// no `,` follows it.
    fn unterminated_tail(&self, array: &Array) -> Option<usize> {
        let last = array.items.last()?;
        let mut at = last.span().end;
        let rest = &self.text[at..array.close];
        let trimmed = rest.trim_start();
        if let Some(comment) = trimmed.strip_prefix("/*") {
            let close = comment.find("*/")?;
            at += rest.len() - trimmed.len() + 2 + close + 2;
        }
        if self.text[at..array.close].trim_start().starts_with(',') {
            None
        } else {
            Some(at)
        }
    }

    /// Adds `item` to the list under `key` of object `id`.
    pub fn insert_array_item(
        &mut self,
        id: &str,
        key: &str,
        item: &Value,
        position: Position,
    ) -> ProjectResult<()> {
        let (offset, insert) = {
            let (entry, array) = self.array_of(id, key)?;
            self.array_insertion(entry.key.span.start, array, item, position)
        };
        self.insert_at(offset, insert)
    }

    /// Computes the splice that sets `key` in `dict` (owned by an entry
    /// starting at `entry_start`) to `value`: an in-place replacement when the
    /// key exists, otherwise a new entry placed in key order.
    pub(crate) fn dict_assignment(
        &self,
        entry_start: usize,
        dict: &Dict,
        key: &str,
        value: &Value,
    ) -> (Range<usize>, String) {
        let depth = self.indent_depth(entry_start) + 1;
        let multiline = self.text[dict.open..dict.close].contains('\n');

        let rendered = render(value, depth, !multiline);

        if let Some(existing) = dict.entry(key) {
            return (existing.value.span(), rendered);
        }

        let line = format!("{} = {};", quote(key), rendered);
        if !multiline {
            return (dict.close..dict.close, format!("{line} "));
        }

        let indent = "\t".repeat(depth);
        let at = dict
            .entries
            .iter()
            .filter(|e| e.key.value != "isa")
            .find(|e| e.key.value.as_str() > key)
            .map_or(self.line_start(dict.close), |e| self.line_start(e.key.span.start));
        (at..at, format!("{indent}{line}\n"))
    }

    /// Sets `key` inside the dictionary stored under `dict_key` of object `id`.
    pub fn set_in_dict(&mut self, id: &str, dict_key: &str, key: &str, value: &Value) -> ProjectResult<()> {
        let (range, insert) = {
            let obj = self.require(id)?;
            let entry = obj
                .body
                .entry(dict_key)
                .ok_or_else(|| ProjectError::shape(id, format!("missing {dict_key}")))?;
            let dict = entry
                .value
                .as_dict()
                .ok_or_else(|| ProjectError::shape(id, format!("{dict_key} is not a dictionary")))?;
            self.dict_assignment(entry.key.span.start, dict, key, value)
        };
        self.splice(range, insert)
    }

    /// Sets a top-level key of object `id`.
    pub fn set_field(&mut self, id: &str, key: &str, value: &Value) -> ProjectResult<()> {
        let (range, insert) = {
            let obj = self.require(id)?;
            self.dict_assignment(obj.entry.key.span.start, obj.body, key, value)
        };
        self.splice(range, insert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SMALL: &str = "// !$*UTF8*$!\n{\n\tarchiveVersion = 1;\n\tobjects = {\n\n/* Begin PBXBuildFile section */\n\t\t111111111111111111111111 /* a.m in Sources */ = {isa = PBXBuildFile; fileRef = 222222222222222222222222 /* a.m */; };\n/* End PBXBuildFile section */\n\n/* Begin PBXSourcesBuildPhase section */\n\t\t333333333333333333333333 /* Sources */ = {\n\t\t\tisa = PBXSourcesBuildPhase;\n\t\t\tbuildActionMask = 2147483647;\n\t\t\tfiles = (\n\t\t\t\t111111111111111111111111 /* a.m in Sources */,\n\t\t\t);\n\t\t\trunOnlyForDeploymentPostprocessing = 0;\n\t\t};\n/* End PBXSourcesBuildPhase section */\n\t};\n\trootObject = 444444444444444444444444 /* Project object */;\n}\n";

    fn id(s: &str) -> ObjectId {
        ObjectId::parse(s).expect("id")
    }

    fn phase_files(doc: &ProjectDocument) -> Vec<String> {
        doc.object("333333333333333333333333")
            .and_then(|o| o.get_array("files"))
            .expect("files")
            .values()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn appends_after_single_line_list_without_trailing_comma() {
        let text = SMALL.replace(
            "files = (\n\t\t\t\t111111111111111111111111 /* a.m in Sources */,\n\t\t\t);",
            "files = (111111111111111111111111, 222222222222222222222222);",
        );
        let mut doc = ProjectDocument::parse(text).expect("parse");
        doc.insert_array_item(
            "333333333333333333333333",
            "files",
            &Value::reference(&id("777777777777777777777777"), "c.m in Sources"),
            Position::Back,
        )
        .expect("append");

        assert!(doc.as_str().contains(
            "files = (111111111111111111111111, 222222222222222222222222, 777777777777777777777777 /* c.m in Sources */);"
        ));
        assert_eq!(
            phase_files(&doc),
            vec![
                "111111111111111111111111",
                "222222222222222222222222",
                "777777777777777777777777",
            ]
        );
    }

    #[test]
    fn appends_after_multi_line_list_without_trailing_comma() {
        let text = SMALL.replace(
            "111111111111111111111111 /* a.m in Sources */,\n\t\t\t);",
            "111111111111111111111111 /* a.m in Sources */\n\t\t\t);",
        );
        let mut doc = ProjectDocument::parse(text).expect("parse");
        doc.insert_array_item(
            "333333333333333333333333",
            "files",
            &Value::reference(&id("777777777777777777777777"), "c.m in Sources"),
            Position::Back,
        )
        .expect("append");

        assert!(doc.as_str().contains(
            "\t\t\t\t111111111111111111111111 /* a.m in Sources */,\n\t\t\t\t777777777777777777777777 /* c.m in Sources */,\n\t\t\t);"
        ));
        assert_eq!(
            phase_files(&doc),
            vec!["111111111111111111111111", "777777777777777777777777"]
        );
    }

    #[test]
    fn reads_back_unchanged() {
        let doc = ProjectDocument::parse(SMALL).expect("parse");
        assert_eq!(doc.as_str(), SMALL);
        assert_eq!(doc.objects().count(), 2);
        assert_eq!(doc.root_object_id().expect("root"), "444444444444444444444444");
    }

    #[test]
    fn inserts_into_existing_section_in_id_order() {
        let mut doc = ProjectDocument::parse(SMALL).expect("parse");
        doc.insert_object(
            &id("000000000000000000000000"),
            Some("b.m in Sources"),
            "PBXBuildFile",
            &[("fileRef".to_string(), Value::reference(&id("555555555555555555555555"), "b.m"))],
            true,
        )
        .expect("insert");

        let ids: Vec<&str> = doc.objects_with_isa("PBXBuildFile").map(|o| o.id()).collect();
        assert_eq!(ids, vec!["000000000000000000000000", "111111111111111111111111"]);
        assert!(doc.as_str().contains(
            "/* Begin PBXBuildFile section */\n\t\t000000000000000000000000 /* b.m in Sources */ = {isa = PBXBuildFile; fileRef = 555555555555555555555555 /* b.m */; };\n\t\t111111111111111111111111"
        ));
    }

    #[test]
    fn creates_missing_section_before_later_isa() {
        let mut doc = ProjectDocument::parse(SMALL).expect("parse");
        doc.insert_object(
            &id("666666666666666666666666"),
            Some("Frameworks"),
            "PBXFrameworksBuildPhase",
            &[("files".to_string(), Value::List(vec![]))],
            false,
        )
        .expect("insert");

        let text = doc.as_str();
        let fw = text.find("/* Begin PBXFrameworksBuildPhase section */").expect("section");
        let src = text.find("/* Begin PBXSourcesBuildPhase section */").expect("sources");
        assert!(fw < src);
        assert!(doc.object("666666666666666666666666").is_some());
    }

    #[test]
    fn appends_and_prepends_array_items() {
        let mut doc = ProjectDocument::parse(SMALL).expect("parse");
        let item = Value::reference(&id("777777777777777777777777"), "c.m in Sources");
        doc.insert_array_item("333333333333333333333333", "files", &item, Position::Back)
            .expect("append");
        let first = Value::reference(&id("888888888888888888888888"), "d.m in Sources");
        doc.insert_array_item("333333333333333333333333", "files", &first, Position::Front)
            .expect("prepend");

        let phase = doc.object("333333333333333333333333").expect("phase");
        let files: Vec<&str> = phase.get_array("files").expect("files").values().collect();
        assert_eq!(
            files,
            vec![
                "888888888888888888888888",
                "111111111111111111111111",
                "777777777777777777777777"
            ]
        );
        assert!(doc.as_str().contains(
            "files = (\n\t\t\t\t888888888888888888888888 /* d.m in Sources */,\n\t\t\t\t111111111111111111111111 /* a.m in Sources */,\n\t\t\t\t777777777777777777777777 /* c.m in Sources */,\n\t\t\t);"
        ));
    }

    #[test]
    fn set_field_replaces_and_inserts_in_key_order() {
        let mut doc = ProjectDocument::parse(SMALL).expect("parse");
        doc.set_field("333333333333333333333333", "buildActionMask", &Value::str("8"))
            .expect("replace");
        doc.set_field("333333333333333333333333", "name", &Value::str("Compile Sources"))
            .expect("insert");

        let phase = doc.object("333333333333333333333333").expect("phase");
        assert_eq!(phase.get_str("buildActionMask"), Some("8"));
        assert_eq!(phase.get_str("name"), Some("Compile Sources"));
        assert!(doc.as_str().contains(
            "\t\t\t);\n\t\t\tname = \"Compile Sources\";\n\t\t\trunOnlyForDeploymentPostprocessing = 0;"
        ));
    }

    #[test]
    fn failed_splice_keeps_text() {
        let mut doc = ProjectDocument::parse(SMALL).expect("parse");
        let err = doc.insert_at(SMALL.len(), "{").expect_err("broken");
        assert!(matches!(err, ProjectError::Parse { .. }));
        assert_eq!(doc.as_str(), SMALL);
    }

    #[test]
    fn fresh_ids_skip_existing_objects() {
        let mut doc = ProjectDocument::parse(SMALL).expect("parse");
        let a = doc.fresh_id("PBXBuildFile", "x");
        let b = doc.fresh_id("PBXBuildFile", "x");
        assert_ne!(a, b);
        assert!(!doc.contains_object(a.as_str()));
    }
}
