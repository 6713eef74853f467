//! The plugin host.
//!
//! For one workspace: decide which plugins are enabled, locate their config
//! files, parse what is parseable, run `resolve`, and hand the merged
//! contributions back to the pipeline. Plugin references are attributed to
//! the workspace containing the config file — which is always the workspace
//! the host ran for.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use path_clean::PathClean;
use tracing::{debug, trace};

use shears_config::PluginToggle;
use shears_core::{Diagnostics, Runtime, Warning};
use shears_workspace::Workspace;

use crate::catalog::CATALOG;
use crate::plugin::{Plugin, PluginOutput};

/// Contributions of one enabled plugin in one workspace.
#[derive(Debug, Clone)]
pub struct PluginResult {
    pub plugin: &'static str,
    /// Config files located in the workspace, sorted.
    pub config_files: Vec<PathBuf>,
    /// Entry globs, workspace-relative: the plugin's static set or the
    /// config override.
    pub entry_globs: Vec<String>,
    /// Project globs, workspace-relative.
    pub project_globs: Vec<String>,
    /// Entry files extracted from config contents, made absolute.
    pub resolved_entries: Vec<PathBuf>,
    /// External packages the tool references implicitly.
    pub references: Vec<String>,
    /// Ignore hints from config contents.
    pub ignores: Vec<String>,
}

/// Run every enabled plugin against a workspace.
///
/// `nested_roots` are deeper workspace directories; config files under them
/// belong to those workspaces.
pub async fn run_plugins<R: Runtime + ?Sized>(
    runtime: &R,
    workspace: &Workspace,
    nested_roots: &[PathBuf],
    diagnostics: &Diagnostics,
) -> Vec<PluginResult> {
    let dependency_names = workspace.manifest.all_dependency_names();
    let listing = workspace_file_listing(&workspace.dir, nested_roots);

    let mut results = Vec::new();

    for plugin in CATALOG {
        let toggle = workspace.config.plugins.get(plugin.name);
        let enabled = match toggle {
            Some(toggle) if toggle.is_forced_off() => false,
            Some(_) => true,
            None => dependency_names
                .iter()
                .any(|name| plugin.enabled_by(name)),
        };
        if !enabled {
            continue;
        }
        debug!(plugin = plugin.name, workspace = %workspace.relative_dir, "plugin enabled");

        let (config_globs, entry_globs, project_globs) = effective_globs(plugin, toggle);

        let config_files = match build_globset(&config_globs) {
            Some(matcher) => locate(&workspace.dir, &listing, &matcher),
            None => Vec::new(),
        };

        let mut result = PluginResult {
            plugin: plugin.name,
            config_files: config_files.clone(),
            entry_globs,
            project_globs,
            resolved_entries: Vec::new(),
            references: Vec::new(),
            ignores: Vec::new(),
        };

        if let Some(resolve) = plugin.resolve {
            for config_path in &config_files {
                let Some(output) =
                    resolve_config(runtime, plugin, config_path, resolve, diagnostics).await
                else {
                    continue;
                };
                merge_output(&mut result, config_path, output);
            }
        }

        result.references.sort();
        result.references.dedup();
        result.resolved_entries.sort();
        result.resolved_entries.dedup();
        results.push(result);
    }

    results
}

/// Parse one config file and run the plugin's extraction over it. Returns
/// `None` when the file is not statically parseable (JS/TS configs) or the
/// parse failed — the latter also records a warning.
async fn resolve_config<R: Runtime + ?Sized>(
    runtime: &R,
    plugin: &Plugin,
    config_path: &Path,
    resolve: crate::plugin::ResolveFn,
    diagnostics: &Diagnostics,
) -> Option<PluginOutput> {
    if !is_json_like(config_path) {
        trace!(config = %config_path.display(), "config is code, skipping static resolve");
        return None;
    }

    let content = match runtime.read_to_string(config_path).await {
        Ok(content) => content,
        Err(err) => {
            diagnostics.push(Warning::Plugin {
                plugin: plugin.name.to_string(),
                config_path: config_path.to_path_buf(),
                message: err.to_string(),
            });
            return None;
        }
    };

    match serde_json::from_str(&strip_json_comments(&content)) {
        Ok(value) => Some(resolve(&value)),
        Err(err) => {
            diagnostics.push(Warning::Plugin {
                plugin: plugin.name.to_string(),
                config_path: config_path.to_path_buf(),
                message: err.to_string(),
            });
            None
        }
    }
}

fn merge_output(result: &mut PluginResult, config_path: &Path, output: PluginOutput) {
    let config_dir = config_path.parent().unwrap_or(Path::new("."));
    for entry in output.entries {
        // Entry paths with glob metacharacters stay globs; plain paths
        // resolve against the config file's directory.
        if entry.contains('*') || entry.contains('{') {
            result.entry_globs.push(entry);
        } else {
            result
                .resolved_entries
                .push(config_dir.join(entry.trim_start_matches("./")).clean());
        }
    }
    result.references.extend(output.references);
    result.ignores.extend(output.ignores);
}

fn effective_globs(
    plugin: &Plugin,
    toggle: Option<&PluginToggle>,
) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut config: Vec<String> = plugin.config_files.iter().map(|s| s.to_string()).collect();
    let mut entry: Vec<String> = plugin.entry_files.iter().map(|s| s.to_string()).collect();
    let mut project: Vec<String> = plugin.project_files.iter().map(|s| s.to_string()).collect();

    if let Some(PluginToggle::Overrides {
        config: config_override,
        entry: entry_override,
        project: project_override,
    }) = toggle
    {
        if !config_override.is_empty() {
            config = config_override.clone();
        }
        if !entry_override.is_empty() {
            entry = entry_override.clone();
        }
        if !project_override.is_empty() {
            project = project_override.clone();
        }
    }

    (config, entry, project)
}

/// Candidate files of the workspace, relative paths, nested workspaces
/// excluded. One walk shared by every plugin.
fn workspace_file_listing(dir: &Path, nested_roots: &[PathBuf]) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(dir)
        .hidden(false)
        .git_ignore(true)
        .filter_entry(|entry| entry.file_name() != "node_modules")
        .build();

    let mut files = Vec::new();
    for entry in walker.flatten() {
        let path = entry.path();
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        if nested_roots.iter().any(|root| path.starts_with(root)) {
            continue;
        }
        if let Ok(relative) = path.strip_prefix(dir) {
            files.push(relative.to_path_buf());
        }
    }
    files.sort();
    files
}

fn locate(dir: &Path, listing: &[PathBuf], matcher: &GlobSet) -> Vec<PathBuf> {
    listing
        .iter()
        .filter(|relative| matcher.is_match(relative))
        .map(|relative| dir.join(relative))
        .collect()
}

fn build_globset(patterns: &[String]) -> Option<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        // Catalog globs are static and valid; config overrides may not be.
        builder.add(Glob::new(pattern).ok()?);
    }
    builder.build().ok()
}

/// Files we can parse without executing: `.json` and extensionless
/// rc-files, which are JSON by convention.
fn is_json_like(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => true,
        Some(_) => false,
        None => path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with('.')),
    }
}

/// Strip `//` and `/* */` comments so tsconfig-style JSONC parses. String
/// literals are respected.
pub fn strip_json_comments(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    let mut in_string = false;

    while i < bytes.len() {
        let c = bytes[i];
        if in_string {
            out.push(c as char);
            if c == b'\\' && i + 1 < bytes.len() {
                out.push(bytes[i + 1] as char);
                i += 2;
                continue;
            }
            if c == b'"' {
                in_string = false;
            }
            i += 1;
        } else if c == b'"' {
            in_string = true;
            out.push('"');
            i += 1;
        } else if c == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
        } else if c == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
            i += 2;
            while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                i += 1;
            }
            i += 2;
        } else {
            out.push(c as char);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shears_config::ShearsConfig;
    use shears_core::NativeRuntime;
    use shears_workspace::PackageJson;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn workspace_with_manifest(dir: &Path, manifest: &str) -> Workspace {
        Workspace {
            dir: dir.to_path_buf(),
            relative_dir: ".".to_string(),
            manifest: serde_json::from_str(manifest).unwrap(),
            config: ShearsConfig::default().for_workspace("."),
            ancestors: Vec::new(),
        }
    }

    #[test]
    fn comment_stripping_respects_strings() {
        let input = r#"{
            // line comment
            "a": "not // a comment",
            /* block */ "b": 1
        }"#;
        let value: serde_json::Value =
            serde_json::from_str(&strip_json_comments(input)).unwrap();
        assert_eq!(value["a"], "not // a comment");
        assert_eq!(value["b"], 1);
    }

    #[tokio::test]
    async fn dependency_presence_enables_plugin() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("jest.config.json"), r#"{"preset": "ts-jest"}"#);

        let workspace = workspace_with_manifest(
            dir.path(),
            r#"{"devDependencies": {"jest": "^29.0.0"}}"#,
        );

        let results = run_plugins(&NativeRuntime::new(), &workspace, &[], &Diagnostics::new())
            .await;

        let jest = results.iter().find(|r| r.plugin == "jest").unwrap();
        assert_eq!(jest.config_files.len(), 1);
        assert!(jest.references.contains(&"ts-jest".to_string()));
        assert!(!jest.entry_globs.is_empty());
    }

    #[tokio::test]
    async fn forced_off_plugin_never_runs() {
        let dir = tempfile::tempdir().unwrap();
        let mut workspace = workspace_with_manifest(
            dir.path(),
            r#"{"devDependencies": {"jest": "^29.0.0"}}"#,
        );
        workspace
            .config
            .plugins
            .insert("jest".to_string(), PluginToggle::Enabled(false));

        let results = run_plugins(&NativeRuntime::new(), &workspace, &[], &Diagnostics::new())
            .await;
        assert!(results.iter().all(|r| r.plugin != "jest"));
    }

    #[tokio::test]
    async fn forced_on_plugin_runs_without_the_dependency() {
        let dir = tempfile::tempdir().unwrap();
        let mut workspace = workspace_with_manifest(dir.path(), "{}");
        workspace
            .config
            .plugins
            .insert("cypress".to_string(), PluginToggle::Enabled(true));

        let results = run_plugins(&NativeRuntime::new(), &workspace, &[], &Diagnostics::new())
            .await;
        assert!(results.iter().any(|r| r.plugin == "cypress"));
    }

    #[tokio::test]
    async fn unparseable_json_config_warns_and_keeps_static_globs() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("jest.config.json"), "{broken");

        let workspace = workspace_with_manifest(
            dir.path(),
            r#"{"devDependencies": {"jest": "^29.0.0"}}"#,
        );

        let diagnostics = Diagnostics::new();
        let results =
            run_plugins(&NativeRuntime::new(), &workspace, &[], &diagnostics).await;

        let jest = results.iter().find(|r| r.plugin == "jest").unwrap();
        assert!(jest.references.is_empty());
        assert!(!jest.entry_globs.is_empty());
        assert_eq!(diagnostics.len(), 1);
    }

    #[tokio::test]
    async fn resolved_entries_are_relative_to_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("jest.config.json"),
            r#"{"setupFilesAfterEnv": ["<rootDir>/jest.setup.ts"]}"#,
        );

        let workspace = workspace_with_manifest(
            dir.path(),
            r#"{"devDependencies": {"jest": "^29.0.0"}}"#,
        );

        let results = run_plugins(&NativeRuntime::new(), &workspace, &[], &Diagnostics::new())
            .await;
        let jest = results.iter().find(|r| r.plugin == "jest").unwrap();
        assert_eq!(jest.resolved_entries, vec![dir.path().join("jest.setup.ts")]);
    }
}
