//! Markdown rendering of the run report.

use pbxfix_types::report::{PostProcessReport, ReportStatus, StepStatus};

pub fn render_report_md(report: &PostProcessReport) -> String {
    let mut out = String::new();
    out.push_str("# pbxfix postprocess\n\n");

    let status = match report.status() {
        ReportStatus::Pass => "pass",
        ReportStatus::Warn => "warn",
    };
    let counts = report.counts();
    out.push_str(&format!("- Status: `{}`\n", status));
    out.push_str(&format!("- Project: `{}`\n", report.project.root.join(&report.project.project_file)));
    out.push_str(&format!(
        "- Targets: `{}` + `{}`\n",
        report.project.target, report.project.extension_target
    ));
    out.push_str(&format!(
        "- Steps: {} applied, {} skipped, {} failed\n",
        counts.applied, counts.skipped, counts.failed
    ));
    if report.run.dry_run {
        out.push_str("- Dry run: nothing was written\n");
    }
    out.push('\n');

    out.push_str("## Steps\n\n");
    if report.steps.is_empty() {
        out.push_str("_No steps ran._\n");
        return out;
    }
    for (i, step) in report.steps.iter().enumerate() {
        let mark = match step.status {
            StepStatus::Applied => "applied",
            StepStatus::Skipped => "skipped",
            StepStatus::Failed => "FAILED",
        };
        out.push_str(&format!("{}. `{}` {}", i + 1, step.step.as_str(), mark));
        if let Some(msg) = &step.message {
            out.push_str(&format!(": {}", msg));
        }
        if let Some(code) = step.issue_code {
            out.push_str(&format!(" (error {})", code));
        }
        out.push('\n');
    }

    if let Some(link) = &report.linkage {
        out.push_str("\n## Static library\n\n");
        out.push_str(&format!("- Library: `{}.a`\n", link.library));
        out.push_str(&format!("- File reference: `{}`\n", link.file_ref));
        out.push_str(&format!("- Build file: `{}` in phase `{}`\n", link.build_file_id, link.phase_id));
        out.push_str(&format!("- Search path entries: {}\n", link.search_path_insertions));
    }

    if !report.files_written.is_empty() {
        out.push_str("\n## Files\n\n");
        for path in &report.files_written {
            out.push_str(&format!("- `{}`\n", path));
        }
    }

    out
}
