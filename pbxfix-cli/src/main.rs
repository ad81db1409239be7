mod config;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use config::{ConfigMerger, PostprocessOverrides};
use fs_err as fs;
use pbxfix_core::adapters::{FsReadPort, FsWritePort};
use pbxfix_core::{run_postprocess, write_report_artifacts};
use pbxfix_edit::{StaticLinkRequest, link_static_library, render_patch};
use pbxfix_pbxproj::{ObjectId, ProjectDocument};
use pbxfix_types::report::{ReportStatus, ToolInfo};
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "pbxfix",
    version,
    about = "Adds a push notification service extension to exported iOS Xcode projects."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the full post-export step on an exported Xcode project directory.
    Postprocess(PostprocessArgs),
    /// Link an already-referenced static library into another target.
    LinkStatic(LinkStaticArgs),
    /// List the native targets of a project file.
    ShowTargets(ShowTargetsArgs),
}

#[derive(Debug, Parser)]
struct PostprocessArgs {
    /// Exported Xcode project directory (contains `<Target>.xcodeproj`).
    project_dir: Utf8PathBuf,

    /// App bundle identifier (default: the main target's PRODUCT_BUNDLE_IDENTIFIER).
    #[arg(long)]
    bundle_id: Option<String>,

    /// Marketing version for the extension (default: the app's Info.plist).
    #[arg(long = "version")]
    app_version: Option<String>,

    /// Build number for the extension (default: the app's Info.plist).
    #[arg(long)]
    build_number: Option<String>,

    /// Development team id for signing the extension.
    #[arg(long)]
    team: Option<String>,

    /// Name of the main app target.
    #[arg(long)]
    target_name: Option<String>,

    /// Name of the extension target and its directory.
    #[arg(long)]
    extension_name: Option<String>,

    /// Directory holding the extension Info.plist and sources.
    #[arg(long)]
    assets_dir: Option<Utf8PathBuf>,

    /// `aps-environment` entitlement (development, production).
    #[arg(long)]
    aps_environment: Option<String>,

    /// Output directory for report.json, report.md and patch.diff.
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Compute everything but write nothing into the project.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Use random identifiers for new objects instead of deterministic ones.
    #[arg(long, default_value_t = false)]
    random_ids: bool,

    /// Config file (default: ./pbxfix.toml when present).
    #[arg(long)]
    config: Option<Utf8PathBuf>,
}

#[derive(Debug, Parser)]
struct LinkStaticArgs {
    /// Path to project.pbxproj.
    pbxproj: Utf8PathBuf,

    /// Library name without `.a` (default: libOneSignal).
    #[arg(long)]
    library: Option<String>,

    /// Name of the target to link into.
    #[arg(long)]
    target: String,

    /// Identifier for the new build file (24 hex digits).
    #[arg(long)]
    build_file_id: Option<String>,

    /// Library search path added next to every bundle identifier.
    #[arg(long)]
    search_path: Option<String>,

    /// Print the diff instead of writing the file.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Config file (default: ./pbxfix.toml when present).
    #[arg(long)]
    config: Option<Utf8PathBuf>,
}

#[derive(Debug, Parser)]
struct ShowTargetsArgs {
    /// Path to project.pbxproj.
    pbxproj: Utf8PathBuf,

    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        error!("{:?}", e);
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Postprocess(args) => cmd_postprocess(args),
        Command::LinkStatic(args) => cmd_link_static(args),
        Command::ShowTargets(args) => cmd_show_targets(args),
    }
}

fn cmd_postprocess(args: PostprocessArgs) -> anyhow::Result<()> {
    let file_config = config::load_or_default(args.config.as_deref(), Utf8Path::new("."))
        .context("load pbxfix.toml config")?;
    let merged = ConfigMerger::new(file_config).merge_postprocess_args(
        args.project_dir,
        PostprocessOverrides {
            target_name: args.target_name,
            extension_name: args.extension_name,
            assets_dir: args.assets_dir,
            bundle_id: args.bundle_id,
            version: args.app_version,
            build_number: args.build_number,
            development_team: args.team,
            aps_environment: args.aps_environment,
            out_dir: args.out_dir,
            random_ids: args.random_ids,
            dry_run: args.dry_run,
        },
    );
    debug!("merged settings: {:?}", merged.settings);

    let outcome = run_postprocess(&merged.settings, &FsReadPort, &FsWritePort, tool_info())?;

    match &merged.out_dir {
        Some(out_dir) => {
            write_report_artifacts(&outcome, out_dir, &FsWritePort)
                .with_context(|| format!("write artifacts to {}", out_dir))?;
            info!("wrote report to {}", out_dir);
        }
        None if merged.settings.dry_run => print!("{}", outcome.patch),
        None => {}
    }

    let counts = outcome.report.counts();
    match outcome.report.status() {
        ReportStatus::Pass => info!(
            "postprocess done: {} applied, {} skipped",
            counts.applied, counts.skipped
        ),
        ReportStatus::Warn => warn!(
            "postprocess finished with {} failed step(s); see the log above",
            counts.failed
        ),
    }
    Ok(())
}

fn cmd_link_static(args: LinkStaticArgs) -> anyhow::Result<()> {
    let file_config = config::load_or_default(args.config.as_deref(), Utf8Path::new("."))
        .context("load pbxfix.toml config")?;
    let library = ConfigMerger::new(file_config).merge_link_args(
        args.library,
        args.build_file_id,
        args.search_path,
    );

    let original = fs::read_to_string(&args.pbxproj).with_context(|| format!("read {}", args.pbxproj))?;
    let mut doc = ProjectDocument::parse(original.as_str())
        .with_context(|| format!("parse {}", args.pbxproj))?;
    let target_id = doc.require_target(&args.target)?;
    let build_file_id = ObjectId::parse(&library.build_file_id).context("--build-file-id")?;

    let req = StaticLinkRequest {
        library: library.name.clone(),
        build_file_id,
        target_id,
        search_path: library.search_path,
    };
    let outcome = link_static_library(&mut doc, &req).map_err(|err| {
        anyhow::anyhow!(
            "(error {}) cannot link {}.a into {}: {err}",
            err.issue_code(),
            library.name,
            args.target
        )
    })?;

    let updated = doc.into_string();
    if args.dry_run {
        print!("{}", render_patch(&args.pbxproj, &original, &updated));
        return Ok(());
    }
    fs::write(&args.pbxproj, &updated).with_context(|| format!("write {}", args.pbxproj))?;
    info!(
        "linked {}.a into {} ({} search path entries)",
        library.name, args.target, outcome.search_path_insertions
    );
    Ok(())
}

fn cmd_show_targets(args: ShowTargetsArgs) -> anyhow::Result<()> {
    let text = fs::read_to_string(&args.pbxproj).with_context(|| format!("read {}", args.pbxproj))?;
    let doc = ProjectDocument::parse(text).with_context(|| format!("parse {}", args.pbxproj))?;
    let targets = doc.targets();

    match args.format {
        OutputFormat::Text => {
            println!("  {:<24} {:<40} PRODUCT TYPE", "ID", "NAME");
            for t in &targets {
                println!(
                    "  {:<24} {:<40} {}",
                    t.id,
                    t.name,
                    t.product_type.as_deref().unwrap_or("-")
                );
            }
        }
        OutputFormat::Json => {
            let list: Vec<_> = targets
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "id": t.id,
                        "name": t.name,
                        "product_type": t.product_type,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
    }
    Ok(())
}

fn tool_info() -> ToolInfo {
    ToolInfo {
        name: "pbxfix".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    }
}
