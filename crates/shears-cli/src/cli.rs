//! Argument parsing.

use std::path::PathBuf;

use clap::Parser;

use shears_config::{IssueKind, ReportFilter};

/// Find unused files, exports and dependencies in JavaScript/TypeScript
/// projects.
#[derive(Parser, Debug)]
#[command(
    name = "shears",
    version,
    about = "Project linter for JavaScript/TypeScript monorepos",
    long_about = "Shears walks the import graph from your entry files and reports what it\n\
                  cannot reach: unused files, unused exports, unused enum/class members,\n\
                  unused and unlisted dependencies, and unlisted binaries."
)]
pub struct Cli {
    /// Working directory to lint.
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// Report only these issue kinds (repeatable).
    #[arg(long, value_name = "KIND")]
    pub include: Vec<String>,

    /// Drop these issue kinds from the report (repeatable).
    #[arg(long, value_name = "KIND")]
    pub exclude: Vec<String>,

    /// Shorthand for --include dependencies --include unlisted.
    #[arg(long)]
    pub dependencies: bool,

    /// Shorthand for --include exports --include enumMembers.
    #[arg(long)]
    pub exports: bool,

    /// Shorthand for --include files.
    #[arg(long)]
    pub files: bool,

    /// Inspect type declarations inside node_modules (slower).
    #[arg(long = "include-libs")]
    pub include_libs: bool,

    /// Analyze only production entries and dependencies.
    #[arg(long)]
    pub production: bool,

    /// Lint a single workspace subtree.
    #[arg(short = 'W', long = "workspace", value_name = "PATH")]
    pub workspace: Option<PathBuf>,

    /// Do not respect .gitignore files.
    #[arg(long = "no-gitignore")]
    pub no_gitignore: bool,

    /// Output format.
    #[arg(long, value_name = "NAME", default_value = "text")]
    pub reporter: Reporter,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Reporter {
    Text,
    Json,
}

impl Cli {
    /// Fold the kind flags and shorthands into one report filter.
    pub fn report_filter(&self) -> Result<ReportFilter, shears_config::ConfigError> {
        let mut include: Vec<IssueKind> = Vec::new();
        for kind in &self.include {
            include.push(kind.parse()?);
        }
        if self.dependencies {
            include.push(IssueKind::Dependencies);
            include.push(IssueKind::Unlisted);
        }
        if self.exports {
            include.push(IssueKind::Exports);
            include.push(IssueKind::EnumMembers);
        }
        if self.files {
            include.push(IssueKind::Files);
        }

        let mut exclude: Vec<IssueKind> = Vec::new();
        for kind in &self.exclude {
            exclude.push(kind.parse()?);
        }

        Ok(ReportFilter::new(include, exclude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["shears"]);
        assert_eq!(cli.directory, PathBuf::from("."));
        assert_eq!(cli.reporter, Reporter::Text);
        assert!(!cli.production);
    }

    #[test]
    fn include_exclude_kinds() {
        let cli = Cli::parse_from([
            "shears",
            "--include",
            "classMembers",
            "--exclude",
            "files",
        ]);
        let filter = cli.report_filter().unwrap();
        assert!(filter.is_active(IssueKind::ClassMembers));
        assert!(!filter.is_active(IssueKind::Files));
    }

    #[test]
    fn shorthands_expand() {
        let cli = Cli::parse_from(["shears", "--dependencies"]);
        let filter = cli.report_filter().unwrap();
        assert!(filter.is_active(IssueKind::Dependencies));
        assert!(filter.is_active(IssueKind::Unlisted));
        assert!(!filter.is_active(IssueKind::Exports));
    }

    #[test]
    fn bad_kind_is_an_error() {
        let cli = Cli::parse_from(["shears", "--include", "exprots"]);
        assert!(cli.report_filter().is_err());
    }

    #[test]
    fn workspace_filter_flag() {
        let cli = Cli::parse_from(["shears", "-W", "packages/core"]);
        assert_eq!(cli.workspace, Some(PathBuf::from("packages/core")));
    }
}
