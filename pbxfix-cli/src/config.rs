//! Configuration file loading for pbxfix.
//!
//! Discovers and loads `pbxfix.toml` from the working directory, or from an
//! explicit `--config` path. CLI arguments take precedence over the file.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use pbxfix_core::PostProcessSettings;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "pbxfix.toml";

/// Top-level configuration from pbxfix.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PbxfixConfig {
    pub project: ProjectConfig,
    pub app: AppConfig,
    pub library: LibraryConfig,
    pub output: OutputConfig,
}

/// Where things live in the exported project.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub target_name: Option<String>,
    pub extension_name: Option<String>,
    /// Directory holding the extension templates.
    pub assets_dir: Option<Utf8PathBuf>,
    pub issue_tracker: Option<String>,
    /// Random identifiers for new objects.
    pub random_ids: bool,
}

/// App identity and signing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bundle_id: Option<String>,
    pub version: Option<String>,
    pub build_number: Option<String>,
    pub development_team: Option<String>,
    /// `development` or `production`.
    pub aps_environment: Option<String>,
}

/// The static library linked into the extension.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Library name without the `.a` suffix.
    pub name: Option<String>,
    pub build_file_id: Option<String>,
    pub search_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for report.json, report.md and patch.diff.
    pub dir: Option<Utf8PathBuf>,
}

/// Discover the pbxfix.toml config file in `dir`.
pub fn discover_config(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a pbxfix.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<PbxfixConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<PbxfixConfig> {
    let config: PbxfixConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load the explicit config file if given, else look in `dir`, else defaults.
pub fn load_or_default(explicit: Option<&Utf8Path>, dir: &Utf8Path) -> anyhow::Result<PbxfixConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match discover_config(dir) {
        Some(path) => load_config(&path),
        None => Ok(PbxfixConfig::default()),
    }
}

/// Values given on the `postprocess` command line.
#[derive(Debug, Clone, Default)]
pub struct PostprocessOverrides {
    pub target_name: Option<String>,
    pub extension_name: Option<String>,
    pub assets_dir: Option<Utf8PathBuf>,
    pub bundle_id: Option<String>,
    pub version: Option<String>,
    pub build_number: Option<String>,
    pub development_team: Option<String>,
    pub aps_environment: Option<String>,
    pub out_dir: Option<Utf8PathBuf>,
    pub random_ids: bool,
    pub dry_run: bool,
}

/// Settings for one `postprocess` run plus where to put its artifacts.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub settings: PostProcessSettings,
    pub out_dir: Option<Utf8PathBuf>,
}

/// Library parameters for `link-static`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedLibrary {
    pub name: String,
    pub build_file_id: String,
    pub search_path: String,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: PbxfixConfig,
}

impl ConfigMerger {
    pub fn new(config: PbxfixConfig) -> Self {
        Self { config }
    }

    /// Merge with `postprocess` arguments. A CLI value replaces the file
    /// value; anything neither sets keeps the built-in default.
    pub fn merge_postprocess_args(self, project_dir: Utf8PathBuf, cli: PostprocessOverrides) -> MergedConfig {
        let PbxfixConfig {
            project,
            app,
            library,
            output,
        } = self.config;
        let defaults = PostProcessSettings::default();

        let settings = PostProcessSettings {
            project_dir,
            target_name: cli.target_name.or(project.target_name).unwrap_or(defaults.target_name),
            extension_name: cli
                .extension_name
                .or(project.extension_name)
                .unwrap_or(defaults.extension_name),
            assets_dir: cli.assets_dir.or(project.assets_dir).unwrap_or(defaults.assets_dir),
            bundle_id: cli.bundle_id.or(app.bundle_id),
            version: cli.version.or(app.version),
            build_number: cli.build_number.or(app.build_number),
            development_team: cli.development_team.or(app.development_team),
            library: library.name.unwrap_or(defaults.library),
            library_build_file_id: library.build_file_id.unwrap_or(defaults.library_build_file_id),
            library_search_path: library.search_path.unwrap_or(defaults.library_search_path),
            aps_environment: cli
                .aps_environment
                .or(app.aps_environment)
                .unwrap_or(defaults.aps_environment),
            issue_tracker: project.issue_tracker.unwrap_or(defaults.issue_tracker),
            random_ids: cli.random_ids || project.random_ids,
            dry_run: cli.dry_run,
        };

        MergedConfig {
            settings,
            out_dir: cli.out_dir.or(output.dir),
        }
    }

    /// Merge with `link-static` arguments.
    pub fn merge_link_args(
        self,
        cli_library: Option<String>,
        cli_build_file_id: Option<String>,
        cli_search_path: Option<String>,
    ) -> MergedLibrary {
        let defaults = PostProcessSettings::default();
        let library = self.config.library;
        MergedLibrary {
            name: cli_library.or(library.name).unwrap_or(defaults.library),
            build_file_id: cli_build_file_id
                .or(library.build_file_id)
                .unwrap_or(defaults.library_build_file_id),
            search_path: cli_search_path
                .or(library.search_path)
                .unwrap_or(defaults.library_search_path),
        }
    }
}
