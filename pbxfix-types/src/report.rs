use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one `postprocess` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostProcessReport {
    pub schema: String,
    pub tool: ToolInfo,
    pub run: RunInfo,
    pub project: ProjectInfo,

    #[serde(default)]
    pub steps: Vec<StepResult>,

    /// Paths written (or, in a dry run, that would have been written).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files_written: Vec<Utf8PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkage: Option<LinkageInfo>,
}

impl PostProcessReport {
    pub fn new(tool: ToolInfo, project: ProjectInfo, dry_run: bool) -> Self {
        Self {
            schema: crate::schema::PBXFIX_REPORT_V1.to_string(),
            tool,
            run: RunInfo {
                id: Uuid::new_v4(),
                started_at: Utc::now(),
                ended_at: None,
                dry_run,
            },
            project,
            steps: Vec::new(),
            files_written: Vec::new(),
            linkage: None,
        }
    }

    pub fn record(&mut self, step: Step, status: StepStatus, message: impl Into<String>) {
        self.steps.push(StepResult {
            step,
            status,
            message: Some(message.into()),
            issue_code: None,
        });
    }

    pub fn finish(&mut self) {
        self.run.ended_at = Some(Utc::now());
    }

    pub fn step(&self, step: Step) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.step == step)
    }

    pub fn counts(&self) -> StepCounts {
        let mut counts = StepCounts::default();
        for s in &self.steps {
            match s.status {
                StepStatus::Applied => counts.applied += 1,
                StepStatus::Skipped => counts.skipped += 1,
                StepStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    /// `Warn` when any best-effort step failed.
    pub fn status(&self) -> ReportStatus {
        if self.counts().failed > 0 {
            ReportStatus::Warn
        } else {
            ReportStatus::Pass
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Exported project directory.
    pub root: Utf8PathBuf,
    /// `project.pbxproj`, relative to `root`.
    pub project_file: Utf8PathBuf,
    pub target: String,
    pub extension_target: String,
}

/// The post-process steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    ReadProject,
    MainFrameworks,
    ExtensionDirectory,
    ExtensionInfoPlist,
    ExtensionTarget,
    ExtensionSources,
    ExtensionFrameworks,
    ExtensionBuildSettings,
    CopySources,
    LinkStaticLibrary,
    Entitlements,
    PushCapability,
    WriteProject,
}

impl Step {
    pub const ALL: [Step; 13] = [
        Step::ReadProject,
        Step::MainFrameworks,
        Step::ExtensionDirectory,
        Step::ExtensionInfoPlist,
        Step::ExtensionTarget,
        Step::ExtensionSources,
        Step::ExtensionFrameworks,
        Step::ExtensionBuildSettings,
        Step::CopySources,
        Step::LinkStaticLibrary,
        Step::Entitlements,
        Step::PushCapability,
        Step::WriteProject,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Step::ReadProject => "read_project",
            Step::MainFrameworks => "main_frameworks",
            Step::ExtensionDirectory => "extension_directory",
            Step::ExtensionInfoPlist => "extension_info_plist",
            Step::ExtensionTarget => "extension_target",
            Step::ExtensionSources => "extension_sources",
            Step::ExtensionFrameworks => "extension_frameworks",
            Step::ExtensionBuildSettings => "extension_build_settings",
            Step::CopySources => "copy_sources",
            Step::LinkStaticLibrary => "link_static_library",
            Step::Entitlements => "entitlements",
            Step::PushCapability => "push_capability",
            Step::WriteProject => "write_project",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Applied,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step: Step,
    pub status: StepStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// `(error N)` number of a failed library link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_code: Option<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepCounts {
    pub applied: u64,
    pub skipped: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pass,
    Warn,
}

/// What the static library link added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkageInfo {
    pub library: String,
    pub file_ref: String,
    pub build_file_id: String,
    pub phase_id: String,
    pub build_action_mask: u64,
    pub search_path_insertions: usize,
}
