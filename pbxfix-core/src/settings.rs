//! Clap-free settings for the post-process pipeline.

use camino::Utf8PathBuf;

/// Target name engine exports give the app.
pub const DEFAULT_TARGET: &str = "Unity-iPhone";
pub const DEFAULT_EXTENSION: &str = "OneSignalNotificationExtensionService";
pub const DEFAULT_LIBRARY: &str = "libOneSignal";
/// Identifier of the library's build file in the extension target. Fixed so
/// that repeated exports produce the same project.
pub const DEFAULT_LIBRARY_BUILD_FILE_ID: &str = "CD84C25F20742FAB0035D524";
pub const DEFAULT_LIBRARY_SEARCH_PATH: &str = "$(PROJECT_DIR)/Libraries/OneSignal/Platforms/iOS";
pub const DEFAULT_ISSUE_TRACKER: &str = "https://github.com/OneSignal/OneSignal-Unity-SDK/issues";

/// Settings for [`run_postprocess`](crate::pipeline::run_postprocess).
#[derive(Debug, Clone)]
pub struct PostProcessSettings {
    /// Exported Xcode project directory.
    pub project_dir: Utf8PathBuf,
    pub target_name: String,
    pub extension_name: String,

    /// Directory holding `Info.plist`, `NotificationService.h` and
    /// `NotificationService.m` for the extension.
    pub assets_dir: Utf8PathBuf,

    // App identity; `None` falls back to the main target's settings.
    pub bundle_id: Option<String>,
    pub version: Option<String>,
    pub build_number: Option<String>,
    pub development_team: Option<String>,

    // Static library link
    pub library: String,
    pub library_build_file_id: String,
    pub library_search_path: String,

    pub aps_environment: String,
    pub issue_tracker: String,
    /// Random identifiers for new objects instead of ones derived from the
    /// project, so two exports no longer produce the same file.
    pub random_ids: bool,
    pub dry_run: bool,
}

impl Default for PostProcessSettings {
    fn default() -> Self {
        Self {
            project_dir: Utf8PathBuf::from("."),
            target_name: DEFAULT_TARGET.to_string(),
            extension_name: DEFAULT_EXTENSION.to_string(),
            assets_dir: Utf8PathBuf::from("Assets/OneSignal/Platforms/iOS"),
            bundle_id: None,
            version: None,
            build_number: None,
            development_team: None,
            library: DEFAULT_LIBRARY.to_string(),
            library_build_file_id: DEFAULT_LIBRARY_BUILD_FILE_ID.to_string(),
            library_search_path: DEFAULT_LIBRARY_SEARCH_PATH.to_string(),
            aps_environment: "development".to_string(),
            issue_tracker: DEFAULT_ISSUE_TRACKER.to_string(),
            random_ids: false,
            dry_run: false,
        }
    }
}

impl PostProcessSettings {
    /// `<Target>.xcodeproj/project.pbxproj`, relative to the project directory.
    pub fn project_file(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("{}.xcodeproj", self.target_name)).join("project.pbxproj")
    }

    /// `<Target>/<Target>.entitlements`, relative to the project directory.
    pub fn entitlements_file(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(&self.target_name).join(format!("{}.entitlements", self.target_name))
    }

    pub fn extension_dir(&self) -> Utf8PathBuf {
        self.project_dir.join(&self.extension_name)
    }
}
