//! The post-export pipeline.
//!
//! I/O-agnostic: every read and write goes through the port traits. Steps
//! run in a fixed order and each one is recorded in the report. The static
//! library link is best effort: its failure is logged and recorded, and the
//! remaining steps still run.

use crate::adapters::RecordingWritePort;
use crate::ports::{ReadPort, WritePort};
use crate::render::render_report_md;
use crate::settings::PostProcessSettings;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use pbxfix_edit::{StaticLinkRequest, build_file_comment, link_static_library, render_patch};
use pbxfix_pbxproj::{ObjectId, ProjectDocument, RandomIds, SourceTree};
use pbxfix_types::report::{
    LinkageInfo, PostProcessReport, ProjectInfo, Step, StepStatus, ToolInfo,
};
use std::io::Cursor;
use tracing::{debug, error, info, warn};

/// Framework every app target needs for notification handling.
pub const MAIN_FRAMEWORK: &str = "UserNotifications.framework";

/// Frameworks weakly linked into the extension.
pub const EXTENSION_FRAMEWORKS: [&str; 4] = [
    "NotificationCenter.framework",
    "UserNotifications.framework",
    "UIKit.framework",
    "SystemConfiguration.framework",
];

pub const EXTENSION_SOURCES: [&str; 2] = ["NotificationService.h", "NotificationService.m"];

/// Build setting value that turns on the push capability.
pub const PUSH_CAPABILITY: &str = "{com.apple.Push = {enabled = 1;};}";

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("target {name:?} not found in {project}")]
    MissingTarget { name: String, project: Utf8PathBuf },
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

/// Outcome of `run_postprocess`.
#[derive(Debug)]
pub struct PostProcessOutcome {
    pub report: PostProcessReport,
    /// Unified diff of the project file.
    pub patch: String,
}

struct Run<'a> {
    settings: &'a PostProcessSettings,
    reader: &'a dyn ReadPort,
    writer: &'a dyn WritePort,
    report: PostProcessReport,
}

impl Run<'_> {
    fn applied(&mut self, step: Step, message: impl Into<String>) {
        let message = message.into();
        info!(step = step.as_str(), "{message}");
        self.report.record(step, StepStatus::Applied, message);
    }

    fn skipped(&mut self, step: Step, message: impl Into<String>) {
        let message = message.into();
        debug!(step = step.as_str(), "skipped: {message}");
        self.report.record(step, StepStatus::Skipped, message);
    }

    fn write(&mut self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        self.writer.write_file(path, contents)?;
        self.report.files_written.push(path.to_path_buf());
        Ok(())
    }
}

/// Runs every step against the exported project in `settings.project_dir`.
///
/// With `dry_run`, writes are kept in memory and only the report and the
/// project diff come back.
pub fn run_postprocess(
    settings: &PostProcessSettings,
    reader: &dyn ReadPort,
    writer: &dyn WritePort,
    tool: ToolInfo,
) -> Result<PostProcessOutcome, ToolError> {
    let recorder = RecordingWritePort::new();
    let writer: &dyn WritePort = if settings.dry_run { &recorder } else { writer };

    let project_file = settings.project_file();
    let project_path = settings.project_dir.join(&project_file);
    let report = PostProcessReport::new(
        tool,
        ProjectInfo {
            root: settings.project_dir.clone(),
            project_file: project_file.clone(),
            target: settings.target_name.clone(),
            extension_target: settings.extension_name.clone(),
        },
        settings.dry_run,
    );
    let mut run = Run {
        settings,
        reader,
        writer,
        report,
    };

    // Read.
    let original = reader
        .read_to_string(&project_path)
        .context("read project file")?;
    let mut doc = ProjectDocument::parse(original.as_str())
        .with_context(|| format!("parse {}", project_path))?;
    if settings.random_ids {
        doc = doc.with_id_generator(Box::new(RandomIds));
    }
    let main = doc
        .target_by_name(&settings.target_name)
        .ok_or_else(|| ToolError::MissingTarget {
            name: settings.target_name.clone(),
            project: project_path.clone(),
        })?;
    run.applied(Step::ReadProject, format!("read {} objects", doc.objects().count()));

    main_frameworks(&mut run, &mut doc, &main)?;
    let extension = extension_target(&mut run, &mut doc, &main)?;
    extension_sources(&mut run, &mut doc, &extension)?;
    extension_frameworks(&mut run, &mut doc, &extension)?;
    extension_build_settings(&mut run, &mut doc, &extension)?;
    copy_sources(&mut run)?;
    link_library(&mut run, &mut doc, &extension)?;
    entitlements(&mut run)?;
    push_capability(&mut run, &mut doc, &main)?;

    // Write.
    let updated = doc.into_string();
    let patch = render_patch(&project_file, &original, &updated);
    if updated == original {
        run.skipped(Step::WriteProject, "project unchanged");
    } else {
        run.write(&project_path, updated.as_bytes())?;
        run.applied(Step::WriteProject, format!("wrote {}", project_file));
    }

    run.report.finish();
    Ok(PostProcessOutcome {
        report: run.report,
        patch,
    })
}

fn main_frameworks(run: &mut Run<'_>, doc: &mut ProjectDocument, main: &ObjectId) -> anyhow::Result<()> {
    let added = doc
        .add_framework_to_project(main, MAIN_FRAMEWORK, false)
        .with_context(|| format!("link {MAIN_FRAMEWORK}"))?;
    match added {
        Some(_) => run.applied(Step::MainFrameworks, format!("linked {MAIN_FRAMEWORK}")),
        None => run.skipped(Step::MainFrameworks, format!("{MAIN_FRAMEWORK} already linked")),
    }
    Ok(())
}

/// Creates the extension directory, its Info.plist and the extension target.
/// An existing target of the same name is reused.
fn extension_target(
    run: &mut Run<'_>,
    doc: &mut ProjectDocument,
    main: &ObjectId,
) -> anyhow::Result<ObjectId> {
    let settings = run.settings;
    let ext_dir = settings.extension_dir();
    run.writer.create_dir_all(&ext_dir)?;
    run.applied(Step::ExtensionDirectory, format!("created {}", settings.extension_name));

    let (version, build_number) = app_versions(run, doc, main);
    let template = settings.assets_dir.join("Info.plist");
    let mut info = read_plist(run.reader, &template)?;
    let dict = info
        .as_dictionary_mut()
        .with_context(|| format!("{template} is not a dictionary"))?;
    if let Some(v) = &version {
        dict.insert("CFBundleShortVersionString".to_string(), plist::Value::String(v.clone()));
    }
    if let Some(b) = &build_number {
        dict.insert("CFBundleVersion".to_string(), plist::Value::String(b.clone()));
    }
    let info_plist = Utf8PathBuf::from(&settings.extension_name).join("Info.plist");
    run.write(&settings.project_dir.join(&info_plist), &plist_xml(&info)?)?;
    run.applied(
        Step::ExtensionInfoPlist,
        format!(
            "version {} ({})",
            version.as_deref().unwrap_or("template"),
            build_number.as_deref().unwrap_or("template")
        ),
    );

    if let Some(existing) = doc.target_by_name(&settings.extension_name) {
        run.skipped(Step::ExtensionTarget, format!("target {} already exists", settings.extension_name));
        return Ok(existing);
    }

    let app_bundle_id = match &settings.bundle_id {
        Some(id) => id.clone(),
        None => main_setting(doc, main, "PRODUCT_BUNDLE_IDENTIFIER")
            .context("no bundle identifier given and the main target defines none")?,
    };
    let bundle_id = format!("{app_bundle_id}.{}", settings.extension_name);
    let id = doc
        .add_app_extension(main, &settings.extension_name, &bundle_id, info_plist.as_str())
        .context("add extension target")?;
    run.applied(Step::ExtensionTarget, format!("added {} ({bundle_id})", settings.extension_name));
    Ok(id)
}

fn extension_sources(run: &mut Run<'_>, doc: &mut ProjectDocument, ext: &ObjectId) -> anyhow::Result<()> {
    let mut built = Vec::new();
    for name in EXTENSION_SOURCES {
        let path = format!("{}/{name}", run.settings.extension_name);
        let file = doc
            .add_file(&path, &path, SourceTree::Source)
            .with_context(|| format!("add {path}"))?;
        if doc.add_file_to_build(ext, &file)?.is_some() {
            built.push(name);
        }
    }
    if built.is_empty() {
        run.skipped(Step::ExtensionSources, "sources already referenced");
    } else {
        run.applied(Step::ExtensionSources, format!("building {}", built.join(", ")));
    }
    Ok(())
}

fn extension_frameworks(run: &mut Run<'_>, doc: &mut ProjectDocument, ext: &ObjectId) -> anyhow::Result<()> {
    let mut linked = Vec::new();
    for framework in EXTENSION_FRAMEWORKS {
        if doc
            .add_framework_to_project(ext, framework, true)
            .with_context(|| format!("link {framework}"))?
            .is_some()
        {
            linked.push(framework);
        }
    }
    if linked.is_empty() {
        run.skipped(Step::ExtensionFrameworks, "frameworks already linked");
    } else {
        run.applied(Step::ExtensionFrameworks, format!("weakly linked {}", linked.join(", ")));
    }
    Ok(())
}

fn extension_build_settings(
    run: &mut Run<'_>,
    doc: &mut ProjectDocument,
    ext: &ObjectId,
) -> anyhow::Result<()> {
    doc.set_build_property(ext, "ARCHS", "$(ARCHS_STANDARD)")?;
    match &run.settings.development_team {
        Some(team) => {
            doc.set_build_property(ext, "DEVELOPMENT_TEAM", team)?;
            run.applied(Step::ExtensionBuildSettings, format!("ARCHS, DEVELOPMENT_TEAM = {team}"));
        }
        None => {
            warn!("no development team configured; extension signing must be set up in Xcode");
            run.applied(Step::ExtensionBuildSettings, "ARCHS");
        }
    }
    Ok(())
}

fn copy_sources(run: &mut Run<'_>) -> anyhow::Result<()> {
    let settings = run.settings;
    for name in EXTENSION_SOURCES {
        let from = settings.assets_dir.join(name);
        let bytes = run.reader.read_file(&from).context("read extension source")?;
        run.write(&settings.extension_dir().join(name), &bytes)?;
    }
    run.applied(Step::CopySources, format!("copied {}", EXTENSION_SOURCES.join(", ")));
    Ok(())
}

fn link_library(run: &mut Run<'_>, doc: &mut ProjectDocument, ext: &ObjectId) -> anyhow::Result<()> {
    let settings = run.settings;
    if target_links(doc, ext, &settings.library)? {
        run.skipped(Step::LinkStaticLibrary, format!("{}.a already linked", settings.library));
        return Ok(());
    }

    let build_file_id = ObjectId::parse(&settings.library_build_file_id)
        .context("library build file identifier")?;
    let req = StaticLinkRequest {
        library: settings.library.clone(),
        build_file_id,
        target_id: ext.clone(),
        search_path: settings.library_search_path.clone(),
    };

    match link_static_library(doc, &req) {
        Ok(outcome) => {
            run.report.linkage = Some(LinkageInfo {
                library: settings.library.clone(),
                file_ref: outcome.file_ref.to_string(),
                build_file_id: outcome.build_file_id.to_string(),
                phase_id: outcome.phase_id.to_string(),
                build_action_mask: outcome.build_action_mask,
                search_path_insertions: outcome.search_path_insertions,
            });
            run.applied(
                Step::LinkStaticLibrary,
                format!(
                    "linked {}.a, {} search path entries",
                    settings.library, outcome.search_path_insertions
                ),
            );
        }
        Err(err) => {
            let code = err.issue_code();
            error!(
                "(error {code}) pbxfix encountered an error while adding {} to {}: {err}. Please create an issue at {}",
                settings.library, settings.extension_name, settings.issue_tracker
            );
            run.report.record(Step::LinkStaticLibrary, StepStatus::Failed, err.to_string());
            if let Some(last) = run.report.steps.last_mut() {
                last.issue_code = Some(code);
            }
        }
    }
    Ok(())
}

fn entitlements(run: &mut Run<'_>) -> anyhow::Result<()> {
    let settings = run.settings;
    let mut dict = plist::Dictionary::new();
    dict.insert(
        "aps-environment".to_string(),
        plist::Value::String(settings.aps_environment.clone()),
    );
    let path = settings.project_dir.join(settings.entitlements_file());
    run.write(&path, &plist_xml(&plist::Value::Dictionary(dict))?)?;
    run.applied(Step::Entitlements, format!("aps-environment = {}", settings.aps_environment));
    Ok(())
}

fn push_capability(run: &mut Run<'_>, doc: &mut ProjectDocument, main: &ObjectId) -> anyhow::Result<()> {
    let relative = run.settings.entitlements_file();
    let name = relative.file_name().unwrap_or(relative.as_str());
    doc.add_file(relative.as_str(), name, SourceTree::Source)?;
    doc.add_build_property(main, "CODE_SIGN_ENTITLEMENTS", relative.as_str())?;
    doc.add_build_property(main, "SystemCapabilities", PUSH_CAPABILITY)?;
    run.applied(Step::PushCapability, format!("CODE_SIGN_ENTITLEMENTS = {relative}"));
    Ok(())
}

/// True if a frameworks phase of `target` already holds a build file for
/// `library`.
fn target_links(doc: &ProjectDocument, target: &ObjectId, library: &str) -> anyhow::Result<bool> {
    let Some(phase) = doc.frameworks_build_phase(target.as_str())? else {
        return Ok(false);
    };
    let comment = build_file_comment(library);
    let phase = doc.require(phase.as_str())?;
    Ok(phase
        .get_array("files")
        .map(|files| {
            files
                .values()
                .filter_map(|id| doc.object(id))
                .any(|bf| bf.comment() == Some(comment.as_str()))
        })
        .unwrap_or(false))
}

/// A build setting of the main target's default configuration.
fn main_setting(doc: &ProjectDocument, main: &ObjectId, key: &str) -> Option<String> {
    let configs = doc.build_configurations(main.as_str()).ok()?;
    configs
        .iter()
        .find_map(|c| doc.build_setting_str(c.as_str(), key))
        .map(str::to_string)
}

/// Version and build number: explicit settings first, then the app's own
/// Info.plist.
fn app_versions(run: &Run<'_>, doc: &ProjectDocument, main: &ObjectId) -> (Option<String>, Option<String>) {
    let settings = run.settings;
    if settings.version.is_some() && settings.build_number.is_some() {
        return (settings.version.clone(), settings.build_number.clone());
    }

    let from_app = main_setting(doc, main, "INFOPLIST_FILE")
        .map(|p| settings.project_dir.join(p))
        .and_then(|path| match read_plist(run.reader, &path) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("cannot read app Info.plist: {err:#}");
                None
            }
        });
    let app_key = |key: &str| {
        from_app
            .as_ref()
            .and_then(|v| v.as_dictionary())
            .and_then(|d| d.get(key))
            .and_then(|v| v.as_string())
            .map(str::to_string)
    };

    (
        settings.version.clone().or_else(|| app_key("CFBundleShortVersionString")),
        settings.build_number.clone().or_else(|| app_key("CFBundleVersion")),
    )
}

fn read_plist(reader: &dyn ReadPort, path: &Utf8Path) -> anyhow::Result<plist::Value> {
    let bytes = reader.read_file(path)?;
    plist::Value::from_reader(Cursor::new(bytes)).with_context(|| format!("parse {}", path))
}

fn plist_xml(value: &plist::Value) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::new();
    value.to_writer_xml(&mut out).context("serialize plist")?;
    out.push(b'\n');
    Ok(out)
}

/// Write `report.json`, `report.md` and `patch.diff` to `out_dir`.
pub fn write_report_artifacts(
    outcome: &PostProcessOutcome,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;

    let json = serde_json::to_string_pretty(&outcome.report).context("serialize report")?;
    writer.write_file(&out_dir.join("report.json"), json.as_bytes())?;

    let md = render_report_md(&outcome.report);
    writer.write_file(&out_dir.join("report.md"), md.as_bytes())?;

    writer.write_file(&out_dir.join("patch.diff"), outcome.patch.as_bytes())?;
    Ok(())
}
