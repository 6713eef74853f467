//! Command execution: wire the pipeline together and render the report.

use std::sync::Arc;

use anyhow::{Context, Result};

use shears_analysis::{run_pipeline, AnalysisOptions, CompilerRegistry};
use shears_analyzer::OxcAnalyzer;
use shears_core::{Diagnostics, NativeRuntime, Runtime};

use crate::cli::{Cli, Reporter};
use crate::config_file::load_config;
use crate::logger::should_use_colors;
use crate::reporters;

/// Exit code of a completed run: 0 clean, 1 when issues remain after
/// filtering. Internal errors surface as `Err` and exit above 1.
pub async fn execute(cli: &Cli) -> Result<i32> {
    let root = cli
        .directory
        .canonicalize()
        .with_context(|| format!("cannot resolve directory {}", cli.directory.display()))?;

    let filter = cli.report_filter()?;
    let config = load_config(&root)?;

    let workspace_filter = match &cli.workspace {
        Some(path) => Some(
            root.join(path)
                .canonicalize()
                .with_context(|| format!("cannot resolve workspace {}", path.display()))?,
        ),
        None => None,
    };

    let options = AnalysisOptions {
        production: cli.production,
        workspace_filter,
        include_gitignored: cli.no_gitignore,
        include_libs: cli.include_libs,
        concurrency: None,
    };

    let runtime: Arc<dyn Runtime> = Arc::new(NativeRuntime::new());
    let diagnostics = Diagnostics::new();

    let mut report = run_pipeline(
        runtime,
        Arc::new(OxcAnalyzer::new()),
        CompilerRegistry::new(),
        &root,
        &config,
        &options,
        &diagnostics,
    )
    .await?;

    report.apply_filter(&filter);

    let colors = !cli.no_color && should_use_colors();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.reporter {
        Reporter::Text => reporters::text(&report, &mut out, colors)?,
        Reporter::Json => reporters::json(&report, &mut out)?,
    }

    Ok(if report.is_clean() { 0 } else { 1 })
}
