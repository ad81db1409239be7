//! Project model operations on an exported Unity-iPhone project.

use pbxfix_pbxproj::{ObjectId, ProjectDocument, SourceTree};
use pretty_assertions::assert_eq;

const FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../tests/fixtures/unity_export/repo/Unity-iPhone.xcodeproj/project.pbxproj"
);

fn load() -> ProjectDocument {
    let text = std::fs::read_to_string(FIXTURE).expect("read fixture");
    ProjectDocument::parse(text).expect("parse fixture")
}

fn reparse(doc: &ProjectDocument) -> ProjectDocument {
    ProjectDocument::parse(doc.as_str()).expect("edited project parses")
}

#[test]
fn untouched_project_is_byte_identical() {
    let text = std::fs::read_to_string(FIXTURE).expect("read fixture");
    let doc = ProjectDocument::parse(text.as_str()).expect("parse");
    assert_eq!(doc.as_str(), text);
    assert_eq!(doc.into_string(), text);
}

#[test]
fn lists_targets_in_project_order() {
    let doc = load();
    let names: Vec<String> = doc.targets().into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["Unity-iPhone".to_string(), "Unity-iPhone Tests".to_string()]);

    let main = doc.require_target("Unity-iPhone").expect("main target");
    assert_eq!(main.as_str(), "1D6058900D05DD3D006BFB54");
    assert_eq!(doc.target_name(main.as_str()), Some("Unity-iPhone"));
    assert!(doc.target_by_name("Missing").is_none());
}

#[test]
fn resolves_phases_and_configurations() {
    let doc = load();
    let phase = doc
        .frameworks_build_phase("1D6058900D05DD3D006BFB54")
        .expect("lookup")
        .expect("phase");
    assert_eq!(phase.as_str(), "1D60588F0D05DD3D006BFB54");

    let configs = doc.build_configurations("1D6058900D05DD3D006BFB54").expect("configs");
    assert_eq!(configs.len(), 2);
    assert_eq!(
        doc.build_setting_str(configs[0].as_str(), "PRODUCT_BUNDLE_IDENTIFIER"),
        Some("com.example.game")
    );
    assert_eq!(
        doc.build_setting_str(configs[0].as_str(), "LIBRARY_SEARCH_PATHS"),
        Some("$(inherited)")
    );
}

#[test]
fn weak_framework_is_referenced_grouped_and_linked() {
    let mut doc = load();
    let main = doc.require_target("Unity-iPhone").expect("target");

    let build_file = doc
        .add_framework_to_project(&main, "UserNotifications.framework", true)
        .expect("add")
        .expect("new build file");

    let doc = reparse(&doc);
    let bf = doc.object(build_file.as_str()).expect("build file");
    assert_eq!(bf.comment(), Some("UserNotifications.framework in Frameworks"));
    let attrs = bf
        .get_dict("settings")
        .and_then(|s| s.get_array("ATTRIBUTES"))
        .expect("attributes");
    assert!(attrs.contains("Weak"));

    let file_ref = doc
        .find_file_by_path("System/Library/Frameworks/UserNotifications.framework")
        .expect("file reference");
    let group = doc.object("29B97323FDCFA39411CA2CEA").expect("Frameworks group");
    assert!(group.get_array("children").expect("children").contains(file_ref.as_str()));
    assert!(doc.phase_links("1D60588F0D05DD3D006BFB54", file_ref.as_str()).expect("phase"));
}

#[test]
fn linking_a_framework_twice_is_a_no_op() {
    let mut doc = load();
    let main = doc.require_target("Unity-iPhone").expect("target");
    let already = doc
        .add_framework_to_project(&main, "UIKit.framework", false)
        .expect("add");
    assert_eq!(already, None);
}

#[test]
fn sources_are_built_and_headers_are_only_referenced() {
    let mut doc = load();
    let target = doc.require_target("Unity-iPhone Tests").expect("target");

    let header = doc
        .add_file("Ext/NotificationService.h", "Ext/NotificationService.h", SourceTree::Source)
        .expect("header");
    let source = doc
        .add_file("Ext/NotificationService.m", "Ext/NotificationService.m", SourceTree::Source)
        .expect("source");

    assert_eq!(doc.add_file_to_build(&target, &header).expect("header build"), None);
    let built = doc.add_file_to_build(&target, &source).expect("source build");
    assert!(built.is_some());

    let doc = reparse(&doc);
    let sources = doc.object("5623C57917FDCB0800090B9E").expect("sources phase");
    assert_eq!(sources.get_array("files").expect("files").items.len(), 2);

    // Both files land in a new "Ext" group under the main group.
    let main = doc.object("29B97314FDCFA39411CA2CEA").expect("main group");
    let ext = main
        .get_array("children")
        .expect("children")
        .values()
        .filter_map(|id| doc.object(id))
        .find(|o| o.get_str("name") == Some("Ext"))
        .expect("Ext group");
    let children: Vec<&str> = ext.get_array("children").expect("children").values().collect();
    assert_eq!(children, vec![header.as_str(), source.as_str()]);
}

#[test]
fn build_properties_set_and_append() {
    let mut doc = load();
    let main = doc.require_target("Unity-iPhone").expect("target");

    doc.set_build_property(&main, "DEVELOPMENT_TEAM", "ABCDE12345").expect("set");
    doc.set_build_property(&main, "ARCHS", "$(ARCHS_STANDARD)").expect("replace");
    doc.add_build_property(&main, "CODE_SIGN_ENTITLEMENTS", "Unity-iPhone/Unity-iPhone.entitlements")
        .expect("append new");
    doc.add_build_property(&main, "LIBRARY_SEARCH_PATHS", "$(SRCROOT)/Extra").expect("append list");
    doc.add_build_property(&main, "LIBRARY_SEARCH_PATHS", "$(SRCROOT)/Extra").expect("append again");

    let doc = reparse(&doc);
    for config in doc.build_configurations(main.as_str()).expect("configs") {
        let c = config.as_str();
        assert_eq!(doc.build_setting_str(c, "DEVELOPMENT_TEAM"), Some("ABCDE12345"));
        assert_eq!(doc.build_setting_str(c, "ARCHS"), Some("$(ARCHS_STANDARD)"));
        assert_eq!(
            doc.build_setting_str(c, "CODE_SIGN_ENTITLEMENTS"),
            Some("Unity-iPhone/Unity-iPhone.entitlements")
        );
        let paths: Vec<&str> = doc
            .build_setting(c, "LIBRARY_SEARCH_PATHS")
            .and_then(|n| n.as_array())
            .expect("list")
            .values()
            .collect();
        assert_eq!(
            paths,
            vec!["$(inherited)", "\"$(SRCROOT)\"", "\"$(SRCROOT)/Libraries\"", "$(SRCROOT)/Extra"]
        );
    }
}

#[test]
fn scalar_property_becomes_list_on_append() {
    let mut doc = load();
    let main = doc.require_target("Unity-iPhone").expect("target");
    doc.add_build_property(&main, "ARCHS", "x86_64").expect("append");

    let doc = reparse(&doc);
    let configs = doc.build_configurations(main.as_str()).expect("configs");
    let archs: Vec<&str> = doc
        .build_setting(configs[0].as_str(), "ARCHS")
        .and_then(|n| n.as_array())
        .expect("list")
        .values()
        .collect();
    assert_eq!(archs, vec!["arm64", "x86_64"]);
}

#[test]
fn app_extension_target_is_complete() {
    let mut doc = load();
    let main = doc.require_target("Unity-iPhone").expect("target");

    let ext = doc
        .add_app_extension(
            &main,
            "OneSignalNotificationExtensionService",
            "com.example.game.OneSignalNotificationExtensionService",
            "OneSignalNotificationExtensionService/Info.plist",
        )
        .expect("extension");

    let doc = reparse(&doc);
    let names: Vec<String> = doc.targets().into_iter().map(|t| t.name).collect();
    assert_eq!(names.last().map(String::as_str), Some("OneSignalNotificationExtensionService"));

    let target = doc.object(ext.as_str()).expect("target object");
    assert_eq!(target.get_str("productType"), Some("com.apple.product-type.app-extension"));
    assert_eq!(target.get_array("buildPhases").expect("phases").items.len(), 3);
    assert!(doc.frameworks_build_phase(ext.as_str()).expect("lookup").is_some());

    let configs = doc.build_configurations(ext.as_str()).expect("configs");
    let config_names: Vec<&str> = configs
        .iter()
        .filter_map(|c| doc.object(c.as_str()).and_then(|o| o.get_str("name")))
        .collect();
    assert_eq!(config_names, vec!["Debug", "Release"]);
    for config in &configs {
        assert_eq!(
            doc.build_setting_str(config.as_str(), "PRODUCT_BUNDLE_IDENTIFIER"),
            Some("com.example.game.OneSignalNotificationExtensionService")
        );
        assert_eq!(
            doc.build_setting_str(config.as_str(), "INFOPLIST_FILE"),
            Some("OneSignalNotificationExtensionService/Info.plist")
        );
    }

    let main_obj = doc.object(main.as_str()).expect("main");
    assert_eq!(main_obj.get_array("dependencies").expect("deps").items.len(), 1);
    let embed = doc
        .build_phase_of(main.as_str(), "PBXCopyFilesBuildPhase")
        .expect("lookup")
        .expect("embed phase");
    let embed = doc.object(embed.as_str()).expect("embed object");
    assert_eq!(embed.get_str("dstSubfolderSpec"), Some("13"));
    assert_eq!(embed.get_array("files").expect("files").items.len(), 1);

    let product = doc
        .find_file_by_path("OneSignalNotificationExtensionService.appex")
        .expect("product reference");
    let products = doc.object("19C28FACFE9D520D11CA2CBB").expect("Products");
    assert!(products.get_array("children").expect("children").contains(product.as_str()));
}

#[test]
fn new_identifiers_are_valid_and_deterministic() {
    let mut a = load();
    let mut b = load();
    let main = a.require_target("Unity-iPhone").expect("target");

    let ea = a.add_app_extension(&main, "Ext", "com.example.ext", "Ext/Info.plist").expect("a");
    let eb = b.add_app_extension(&main, "Ext", "com.example.ext", "Ext/Info.plist").expect("b");
    assert_eq!(ea, eb);
    assert_eq!(a.as_str(), b.as_str());
    assert!(ObjectId::is_valid(ea.as_str()));
}
