use pbxfix_types::report::{
    LinkageInfo, PostProcessReport, ProjectInfo, ReportStatus, Step, StepStatus, ToolInfo,
};
use pretty_assertions::assert_eq;

fn report() -> PostProcessReport {
    PostProcessReport::new(
        ToolInfo {
            name: "pbxfix".to_string(),
            version: Some("0.3.1".to_string()),
        },
        ProjectInfo {
            root: "/build/ios".into(),
            project_file: "Unity-iPhone.xcodeproj/project.pbxproj".into(),
            target: "Unity-iPhone".to_string(),
            extension_target: "OneSignalNotificationExtensionService".to_string(),
        },
        false,
    )
}

#[test]
fn new_report_sets_schema_and_defaults() {
    let r = report();
    assert_eq!(r.schema, pbxfix_types::schema::PBXFIX_REPORT_V1);
    assert!(r.steps.is_empty());
    assert!(r.run.ended_at.is_none());
    assert_eq!(r.status(), ReportStatus::Pass);
}

#[test]
fn step_status_serializes_snake_case() {
    assert_eq!(serde_json::to_value(StepStatus::Applied).unwrap(), serde_json::json!("applied"));
    assert_eq!(serde_json::to_value(StepStatus::Failed).unwrap(), serde_json::json!("failed"));
    assert_eq!(
        serde_json::to_value(Step::LinkStaticLibrary).unwrap(),
        serde_json::json!("link_static_library")
    );
}

#[test]
fn step_names_match_serde_names() {
    for step in Step::ALL {
        assert_eq!(serde_json::to_value(step).unwrap(), serde_json::json!(step.as_str()));
    }
}

#[test]
fn failed_step_turns_status_to_warn() {
    let mut r = report();
    r.record(Step::ReadProject, StepStatus::Applied, "read");
    r.record(Step::ExtensionTarget, StepStatus::Skipped, "exists");
    r.record(Step::LinkStaticLibrary, StepStatus::Failed, "no linkage");

    let counts = r.counts();
    assert_eq!((counts.applied, counts.skipped, counts.failed), (1, 1, 1));
    assert_eq!(r.status(), ReportStatus::Warn);
    assert_eq!(
        r.step(Step::ExtensionTarget).map(|s| s.status),
        Some(StepStatus::Skipped)
    );
}

#[test]
fn report_omits_empty_optional_fields() {
    let r = report();
    let json = serde_json::to_value(&r).unwrap();
    assert!(json.get("files_written").is_none());
    assert!(json.get("linkage").is_none());
    assert_eq!(json["project"]["target"], "Unity-iPhone");
}

#[test]
fn report_deserializes_what_it_serializes() {
    let mut r = report();
    r.record(Step::WriteProject, StepStatus::Applied, "written");
    r.linkage = Some(LinkageInfo {
        library: "libOneSignal".to_string(),
        file_ref: "AA5E2E6B1F6A3F7B00C0FFEE".to_string(),
        build_file_id: "CD84C25F20742FAB0035D524".to_string(),
        phase_id: "5623C57A17FDCB0800090B9E".to_string(),
        build_action_mask: 2147483647,
        search_path_insertions: 6,
    });
    r.finish();

    let text = serde_json::to_string_pretty(&r).unwrap();
    let back: PostProcessReport = serde_json::from_str(&text).unwrap();
    assert_eq!(back.linkage, r.linkage);
    assert_eq!(back.run.id, r.run.id);
    assert_eq!(back.steps.len(), 1);
}
