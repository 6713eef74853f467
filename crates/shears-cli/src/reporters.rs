//! Report rendering.

use std::io::Write;

use anyhow::Result;
use console::style;

use shears_analysis::Report;
use shears_core::Warning;

/// Render the report as human-readable text.
pub fn text(report: &Report, out: &mut impl Write, colors: bool) -> Result<()> {
    let heading = |label: &str, count: usize| {
        let text = format!("{label} ({count})");
        if colors {
            style(text).bold().underlined().to_string()
        } else {
            text
        }
    };

    if !report.unused_files.is_empty() {
        writeln!(out, "{}", heading("Unused files", report.unused_files.len()))?;
        for issue in &report.unused_files {
            writeln!(out, "  {}", issue.file)?;
        }
        writeln!(out)?;
    }

    if !report.unused_dependencies.is_empty() {
        writeln!(
            out,
            "{}",
            heading("Unused dependencies", report.unused_dependencies.len())
        )?;
        for issue in &report.unused_dependencies {
            writeln!(out, "  {}  {}", issue.package, dim(&issue.workspace, colors))?;
        }
        writeln!(out)?;
    }

    if !report.unlisted_dependencies.is_empty() {
        writeln!(
            out,
            "{}",
            heading("Unlisted dependencies", report.unlisted_dependencies.len())
        )?;
        for issue in &report.unlisted_dependencies {
            writeln!(out, "  {}  {}", issue.package, dim(&issue.workspace, colors))?;
        }
        writeln!(out)?;
    }

    if !report.unused_exports.is_empty() {
        writeln!(
            out,
            "{}",
            heading("Unused exports", report.unused_exports.len())
        )?;
        for issue in &report.unused_exports {
            writeln!(out, "  {}  {}", issue.symbol, dim(&issue.file, colors))?;
        }
        writeln!(out)?;
    }

    if !report.unused_enum_members.is_empty() {
        writeln!(
            out,
            "{}",
            heading("Unused enum members", report.unused_enum_members.len())
        )?;
        for issue in &report.unused_enum_members {
            writeln!(out, "  {}  {}", issue.symbol, dim(&issue.file, colors))?;
        }
        writeln!(out)?;
    }

    if !report.unused_class_members.is_empty() {
        writeln!(
            out,
            "{}",
            heading("Unused class members", report.unused_class_members.len())
        )?;
        for issue in &report.unused_class_members {
            writeln!(out, "  {}  {}", issue.symbol, dim(&issue.file, colors))?;
        }
        writeln!(out)?;
    }

    if !report.unlisted_binaries.is_empty() {
        writeln!(
            out,
            "{}",
            heading("Unlisted binaries", report.unlisted_binaries.len())
        )?;
        for issue in &report.unlisted_binaries {
            writeln!(
                out,
                "  {}  {}",
                issue.binary,
                dim(&format!("{} ({})", issue.script, issue.workspace), colors)
            )?;
        }
        writeln!(out)?;
    }

    for warning in &report.warnings {
        let line = match warning {
            Warning::Resolution { specifier, from } => {
                format!("unresolved import `{specifier}` in {}", from.display())
            }
            Warning::Parse { path, message } => {
                format!("parse failure in {}: {message}", path.display())
            }
            Warning::Plugin {
                plugin,
                config_path,
                message,
            } => format!(
                "plugin {plugin}: unreadable config {}: {message}",
                config_path.display()
            ),
            Warning::Workspace { dir, message } => {
                format!("workspace {} skipped: {message}", dir.display())
            }
        };
        if colors {
            writeln!(out, "{} {line}", style("warning:").yellow().bold())?;
        } else {
            writeln!(out, "warning: {line}")?;
        }
    }

    if report.is_clean() {
        let message = "✂ no issues found";
        if colors {
            writeln!(out, "{}", style(message).green())?;
        } else {
            writeln!(out, "{message}")?;
        }
    }

    Ok(())
}

/// Render the report as JSON.
pub fn json(report: &Report, out: &mut impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

fn dim(text: &str, colors: bool) -> String {
    if colors {
        style(text).dim().to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shears_analysis::{DependencyIssue, FileIssue};

    fn sample_report() -> Report {
        Report {
            unused_files: vec![FileIssue {
                workspace: "root".to_string(),
                file: "src/b.ts".to_string(),
            }],
            unused_dependencies: vec![DependencyIssue {
                workspace: "root".to_string(),
                package: "lodash".to_string(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn text_reporter_lists_categories() {
        let mut out = Vec::new();
        text(&sample_report(), &mut out, false).unwrap();
        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains("Unused files (1)"));
        assert!(rendered.contains("src/b.ts"));
        assert!(rendered.contains("lodash"));
    }

    #[test]
    fn clean_report_says_so() {
        let mut out = Vec::new();
        text(&Report::default(), &mut out, false).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("no issues found"));
    }

    #[test]
    fn json_reporter_round_trips() {
        let mut out = Vec::new();
        json(&sample_report(), &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["unusedFiles"][0]["file"], "src/b.ts");
    }
}
