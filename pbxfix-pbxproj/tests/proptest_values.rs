//! Property tests for value quoting and generated identifiers.

use pbxfix_pbxproj::parse::parse_document;
use pbxfix_pbxproj::{HashedIds, IdGenerator, ObjectId, quote};
use proptest::prelude::*;
use std::collections::HashSet;

proptest! {
    #[test]
    fn quoted_values_parse_back(value in "[ -~\n\t]{0,40}") {
        let text = format!("{{\n\tkey = {};\n}}\n", quote(&value));
        let root = parse_document(&text).expect("quoted value parses");
        prop_assert_eq!(root.get_str("key"), Some(value.as_str()));
    }

    #[test]
    fn hashed_ids_are_valid_and_unique(seed in "[0-9A-F]{24}", names in prop::collection::vec("[A-Za-z./ ]{1,20}", 1..30)) {
        let mut ids = HashedIds::new(seed);
        let mut seen = HashSet::new();
        for name in &names {
            let id = ids.next_id("PBXFileReference", name);
            prop_assert!(ObjectId::is_valid(id.as_str()));
            prop_assert!(seen.insert(id));
        }
    }
}
