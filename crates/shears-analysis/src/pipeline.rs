//! The analysis pipeline.
//!
//! Leaf components first: enumerate workspaces, collect project files, run
//! plugins, seed entries, build the graph, count export references, scan
//! scripts, attribute dependencies, classify. Each stage only reads what
//! earlier stages produced, so the whole run is a pure function of the
//! filesystem state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{Glob, GlobSetBuilder};
use ignore::WalkBuilder;
use thiserror::Error;
use tracing::{debug, info};

use shears_config::ShearsConfig;
use shears_core::{Diagnostics, Runtime};
use shears_graph::{ModuleId, Resolution};
use shears_plugins::{find_plugin, run_plugins, strip_json_comments};
use shears_workspace::{
    apply_manifest_entries, collect_project_files, enumerate_workspaces, extract_package_name,
    CollectError, FileOrigin, ProjectFiles, Workspace, WorkspaceError,
};

use crate::analyzer::Analyzer;
use crate::attribution::attribute;
use crate::binaries::{scan_commands, scan_scripts, Binary};
use crate::classifier::{classify, ClassifierInput};
use crate::compiler::CompilerRegistry;
use crate::libs::inspect_libraries;
use crate::report::Report;
use crate::resolver::{ModuleResolver, ResolverContext, WorkspaceTarget};
use crate::walker::GraphWalker;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Collect(#[from] CollectError),
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Analyze only production entries: plugin-contributed entries are
    /// skipped and devDependencies exempt from the unused check.
    pub production: bool,
    /// Restrict reporting to workspaces under this directory.
    pub workspace_filter: Option<PathBuf>,
    /// Treat gitignored files as project files.
    pub include_gitignored: bool,
    /// Walk into installed packages' type declarations: a second traversal
    /// pass over the graph's external leaves. Can multiply the graph's
    /// size, so it is off unless asked for.
    pub include_libs: bool,
    /// Worker cap for the graph walk; defaults to available cores.
    pub concurrency: Option<usize>,
}

/// Run the full pipeline rooted at `root`.
pub async fn run_pipeline(
    runtime: Arc<dyn Runtime>,
    analyzer: Arc<dyn Analyzer>,
    compilers: CompilerRegistry,
    root: &Path,
    config: &ShearsConfig,
    options: &AnalysisOptions,
    diagnostics: &Diagnostics,
) -> Result<Report, AnalysisError> {
    let mut workspaces =
        enumerate_workspaces(runtime.as_ref(), root, config, diagnostics).await?;
    info!(count = workspaces.len(), "workspaces enumerated");

    let workspace_dirs: Vec<PathBuf> = workspaces.iter().map(|w| w.dir.clone()).collect();

    // -W subtree filter: inactive workspaces keep their manifests for
    // attribution but contribute no files, entries or issues.
    let active: Vec<bool> = workspaces
        .iter()
        .map(|workspace| match &options.workspace_filter {
            Some(filter) => workspace.dir.starts_with(filter),
            None => true,
        })
        .collect();

    // Per-workspace collection and plugin runs.
    let mut project_files: Vec<ProjectFiles> = Vec::with_capacity(workspaces.len());
    let mut plugin_refs: Vec<(usize, String)> = Vec::new();
    let mut enabled_plugins: Vec<Vec<&'static str>> = vec![Vec::new(); workspaces.len()];

    for index in 0..workspaces.len() {
        if !active[index] {
            project_files.push(ProjectFiles::default());
            continue;
        }

        let nested: Vec<PathBuf> = workspace_dirs
            .iter()
            .filter(|dir| {
                **dir != workspaces[index].dir && dir.starts_with(&workspaces[index].dir)
            })
            .cloned()
            .collect();

        let mut files = collect_project_files(
            &workspaces[index],
            &nested,
            !options.include_gitignored,
        )?;
        apply_manifest_entries(&workspaces[index], &mut files)?;

        let results =
            run_plugins(runtime.as_ref(), &workspaces[index], &nested, diagnostics).await;

        for result in results {
            enabled_plugins[index].push(result.plugin);

            for reference in &result.references {
                plugin_refs.push((index, reference.clone()));
            }
            workspaces[index]
                .config
                .ignore
                .extend(result.ignores.iter().cloned());

            if !options.production {
                for path in &result.resolved_entries {
                    if runtime.exists(path) {
                        files.insert(path.clone(), FileOrigin::PluginEntry);
                    }
                }
                for path in
                    expand_globs(&workspaces[index].dir, &result.entry_globs, &nested)
                {
                    files.insert(path, FileOrigin::PluginEntry);
                }
            }
            for path in expand_globs(&workspaces[index].dir, &result.project_globs, &nested) {
                files.insert(path, FileOrigin::Project);
            }
        }

        debug!(
            workspace = %workspaces[index].relative_dir,
            files = files.len(),
            "project files collected"
        );
        project_files.push(files);
    }

    // Manifest script scan; `node script.js` invocations seed extra entries.
    let mut binaries: Vec<Binary> = Vec::new();
    let mut binary_refs: Vec<(usize, String)> = Vec::new();
    for index in 0..workspaces.len() {
        if !active[index] {
            continue;
        }
        let chain = chain_dirs(&workspaces, index);
        let scan = scan_scripts(runtime.as_ref(), &workspaces[index], index, &chain).await;
        for package in &scan.referenced_packages {
            binary_refs.push((index, package.clone()));
        }
        for entry in scan.entries {
            project_files[index].insert(entry, FileOrigin::Entry);
        }
        binaries.extend(scan.binaries);
    }

    // Seed the walk with every entry, all workspaces unioned.
    let mut entries: Vec<ModuleId> = Vec::new();
    for files in &project_files {
        for path in files.entries() {
            entries.push(ModuleId::from_normalized(path.clone()));
        }
    }
    entries.sort();
    entries.dedup();

    let resolver_context =
        build_resolver_context(runtime.as_ref(), root, config, &workspaces).await;
    let resolver = Arc::new(ModuleResolver::new(
        Arc::clone(&runtime),
        resolver_context,
    ));

    let mut walker = GraphWalker::new(
        Arc::clone(&runtime),
        Arc::clone(&analyzer),
        compilers,
        Arc::clone(&resolver),
        diagnostics.clone(),
    );
    if let Some(concurrency) = options.concurrency {
        walker = walker.with_concurrency(concurrency);
    }

    let outcome = walker.build(&entries).await;
    info!(modules = outcome.graph.len(), "module graph built");

    // Opt-in second pass over the external leaves, before the usage counts
    // so declaration consumers are included in them.
    if options.include_libs {
        inspect_libraries(
            runtime.as_ref(),
            analyzer.as_ref(),
            &outcome.graph,
            &workspaces,
            diagnostics,
        )
        .await;
    }

    outcome.graph.compute_referenced_counts();

    // Command-like strings from source feed the binary analyzer too.
    let mut source_commands: Vec<(usize, (String, String))> = Vec::new();
    for (module, command) in &outcome.script_refs {
        if let Some(index) = crate::attribution::owning_workspace(module.as_path(), &workspaces)
        {
            let label = module.relative_to(root);
            source_commands.push((index, (label, command.clone())));
        }
    }
    for index in 0..workspaces.len() {
        let commands: Vec<(String, String)> = source_commands
            .iter()
            .filter(|(i, _)| *i == index)
            .map(|(_, c)| c.clone())
            .collect();
        if commands.is_empty() {
            continue;
        }
        let chain = chain_dirs(&workspaces, index);
        let scan =
            scan_commands(runtime.as_ref(), &workspaces[index], index, &chain, &commands).await;
        for package in &scan.referenced_packages {
            binary_refs.push((index, package.clone()));
        }
        binaries.extend(scan.binaries);
    }

    // Workspace packages imported by name count their declarations.
    let workspace_names: Vec<Option<String>> = workspaces
        .iter()
        .map(|w| w.manifest.name.clone())
        .collect();
    let mut internal_refs: Vec<(usize, String)> = Vec::new();
    for module in outcome.graph.modules_sorted() {
        let Some(importer_ws) =
            crate::attribution::owning_workspace(module.id.as_path(), &workspaces)
        else {
            continue;
        };
        for import in module.imports_iter() {
            if !matches!(import.resolution, Resolution::Internal(_)) {
                continue;
            }
            let package = extract_package_name(&import.specifier);
            if workspace_names
                .iter()
                .any(|name| name.as_deref() == Some(package))
            {
                internal_refs.push((importer_ws, package.to_string()));
            }
        }
    }

    let mut attribution = attribute(
        &outcome.graph.external_dependencies(),
        &plugin_refs,
        &binary_refs,
        &internal_refs,
        &workspaces,
    );

    // An enabled plugin keeps its enabler packages in use: the tool runs
    // even though no source file imports it.
    for (index, plugins) in enabled_plugins.iter().enumerate() {
        for plugin_name in plugins {
            let Some(plugin) = find_plugin(plugin_name) else {
                continue;
            };
            for dependency in workspaces[index].manifest.all_dependency_names() {
                if plugin.enabled_by(&dependency) {
                    attribution.referenced[index].insert(dependency);
                }
            }
        }
    }

    let mut report = classify(&ClassifierInput {
        root,
        workspaces: &workspaces,
        project_files: &project_files,
        graph: &outcome.graph,
        attribution: &attribution,
        binaries: &binaries,
        production: options.production,
    });

    // Project issues onto the -W subtree.
    if options.workspace_filter.is_some() {
        let active_names: Vec<String> = workspaces
            .iter()
            .enumerate()
            .filter(|(index, _)| active[*index])
            .map(|(_, w)| w.display_name().to_string())
            .collect();
        report
            .unused_dependencies
            .retain(|issue| active_names.contains(&issue.workspace));
        report
            .unlisted_dependencies
            .retain(|issue| active_names.contains(&issue.workspace));
        report
            .unlisted_binaries
            .retain(|issue| active_names.contains(&issue.workspace));
    }

    report.warnings = diagnostics.take_sorted();
    Ok(report)
}

/// The workspace's own directory followed by its ancestors' — the
/// `node_modules` lookup chain.
fn chain_dirs(workspaces: &[Workspace], index: usize) -> Vec<PathBuf> {
    std::iter::once(workspaces[index].dir.clone())
        .chain(
            workspaces[index]
                .ancestors
                .iter()
                .map(|a| workspaces[*a].dir.clone()),
        )
        .collect()
}

/// Workspace package table plus path aliases from config `paths` and every
/// workspace's tsconfig.
async fn build_resolver_context<R: Runtime + ?Sized>(
    runtime: &R,
    root: &Path,
    config: &ShearsConfig,
    workspaces: &[Workspace],
) -> ResolverContext {
    let mut context = ResolverContext::default();

    for workspace in workspaces {
        if let Some(name) = &workspace.manifest.name {
            context.workspace_packages.insert(
                name.clone(),
                WorkspaceTarget {
                    dir: workspace.dir.clone(),
                    entry_paths: workspace.manifest.entry_paths(),
                },
            );
        }
    }

    // Config-supplied aliases resolve against the run root.
    for (alias, targets) in &config.paths {
        context
            .path_aliases
            .push((alias.clone(), targets.clone(), root.to_path_buf()));
    }

    // tsconfig `compilerOptions.paths`, resolved against baseUrl.
    for workspace in workspaces {
        let tsconfig_path = workspace.dir.join("tsconfig.json");
        if !runtime.exists(&tsconfig_path) {
            continue;
        }
        let Ok(content) = runtime.read_to_string(&tsconfig_path).await else {
            continue;
        };
        let Ok(tsconfig) =
            serde_json::from_str::<serde_json::Value>(&strip_json_comments(&content))
        else {
            continue;
        };

        let options = tsconfig.get("compilerOptions");
        let base_url = options
            .and_then(|o| o.get("baseUrl"))
            .and_then(|v| v.as_str())
            .unwrap_or(".");
        let base_dir = workspace.dir.join(base_url);

        if let Some(serde_json::Value::Object(paths)) =
            options.and_then(|o| o.get("paths"))
        {
            for (alias, targets) in paths {
                let targets: Vec<String> = match targets {
                    serde_json::Value::Array(items) => items
                        .iter()
                        .filter_map(|v| v.as_str())
                        .map(str::to_string)
                        .collect(),
                    _ => Vec::new(),
                };
                if !targets.is_empty() {
                    context
                        .path_aliases
                        .push((alias.clone(), targets, base_dir.clone()));
                }
            }
        }
    }

    // Longest alias first so the most specific mapping wins.
    context
        .path_aliases
        .sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

    context
}

/// Expand workspace-relative globs against the tree, nested workspaces
/// excluded.
fn expand_globs(dir: &Path, globs: &[String], nested_roots: &[PathBuf]) -> Vec<PathBuf> {
    if globs.is_empty() {
        return Vec::new();
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in globs {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(_) => return Vec::new(),
        }
    }
    let Ok(matcher) = builder.build() else {
        return Vec::new();
    };

    let walker = WalkBuilder::new(dir)
        .hidden(false)
        .git_ignore(true)
        .filter_entry(|entry| entry.file_name() != "node_modules")
        .build();

    let mut matches = Vec::new();
    for entry in walker.flatten() {
        let path = entry.path();
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        if nested_roots.iter().any(|root| path.starts_with(root)) {
            continue;
        }
        if let Ok(relative) = path.strip_prefix(dir) {
            if matcher.is_match(relative) {
                matches.push(path.to_path_buf());
            }
        }
    }
    matches.sort();
    matches
}
