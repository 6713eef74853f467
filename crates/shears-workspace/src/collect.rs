//! Project-file collection.
//!
//! Expands a workspace's positive `project` globs, removes negated matches,
//! and layers the entry patterns on top. Entry patterns win over negations;
//! an entry outside the project set is silently promoted into it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use thiserror::Error;
use tracing::trace;

use shears_config::WorkspaceConfig;

use crate::enumerate::Workspace;

/// Project globs used when the configuration declares none.
pub const DEFAULT_PROJECT_PATTERNS: [&str; 1] =
    ["**/*.{js,mjs,cjs,jsx,ts,mts,cts,tsx,astro,mdx,vue,svelte}"];

/// Entry globs used when the configuration declares none.
pub const DEFAULT_ENTRY_PATTERNS: [&str; 2] = [
    "{index,main,cli}.{js,mjs,cjs,jsx,ts,mts,cts,tsx}",
    "src/{index,main,cli}.{js,mjs,cjs,jsx,ts,mts,cts,tsx}",
];

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("invalid glob `{glob}`: {message}")]
    Pattern { glob: String, message: String },

    #[error("entry `{0}` lies outside the workspace directory")]
    OutsideWorkspace(PathBuf),
}

/// How a file entered the project set. Ordered so that upgrades only move
/// forward (`Project` < everything else).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileOrigin {
    Project,
    Entry,
    PluginEntry,
    ManifestEntry,
}

impl FileOrigin {
    pub fn is_entry(&self) -> bool {
        !matches!(self, FileOrigin::Project)
    }
}

/// The collected project set of one workspace, keyed by absolute path.
#[derive(Debug, Clone, Default)]
pub struct ProjectFiles {
    files: BTreeMap<PathBuf, FileOrigin>,
}

impl ProjectFiles {
    /// Add a file, upgrading the origin when the new one outranks it.
    pub fn insert(&mut self, path: PathBuf, origin: FileOrigin) {
        let slot = self.files.entry(path).or_insert(origin);
        if origin > *slot {
            *slot = origin;
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn origin(&self, path: &Path) -> Option<FileOrigin> {
        self.files.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Every file in the project set, sorted by path.
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.keys()
    }

    /// The entry subset (anything that is not a plain project file).
    pub fn entries(&self) -> impl Iterator<Item = &PathBuf> {
        self.files
            .iter()
            .filter(|(_, origin)| origin.is_entry())
            .map(|(path, _)| path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, FileOrigin)> {
        self.files.iter().map(|(path, origin)| (path, *origin))
    }
}

/// Collect the project set P and the pre-plugin entry set of a workspace.
///
/// `nested_roots` are the directories of deeper workspaces; files under them
/// belong to those workspaces and are skipped here. Gitignored paths are
/// excluded unless `respect_gitignore` is off.
pub fn collect_project_files(
    workspace: &Workspace,
    nested_roots: &[PathBuf],
    respect_gitignore: bool,
) -> Result<ProjectFiles, CollectError> {
    let config = &workspace.config;
    let (positive, negated) = split_patterns(project_patterns(config));
    let positive_set = build_globset(&positive)?;
    let negated_set = build_globset(&negated)?;
    let entry_set = build_globset(&entry_patterns(config))?;

    let mut files = ProjectFiles::default();

    let nested: Vec<PathBuf> = nested_roots
        .iter()
        .filter(|root| root.starts_with(&workspace.dir) && **root != workspace.dir)
        .cloned()
        .collect();

    let walker = WalkBuilder::new(&workspace.dir)
        .hidden(false)
        .git_ignore(respect_gitignore)
        .git_global(respect_gitignore)
        .git_exclude(respect_gitignore)
        .filter_entry(|entry| entry.file_name() != "node_modules")
        .build();

    for entry in walker.flatten() {
        let path = entry.path();
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        if nested.iter().any(|root| path.starts_with(root)) {
            continue;
        }

        let Ok(relative) = path.strip_prefix(&workspace.dir) else {
            continue;
        };

        let is_entry = entry_set.is_match(relative);
        let in_project = positive_set.is_match(relative) && !negated_set.is_match(relative);

        if is_entry {
            // Entry wins over a negated project pattern and is promoted
            // into P when the project globs missed it.
            trace!(file = %relative.display(), "entry file");
            files.insert(path.to_path_buf(), FileOrigin::Entry);
        } else if in_project {
            files.insert(path.to_path_buf(), FileOrigin::Project);
        }
    }

    Ok(files)
}

/// Resolve the manifest's own entry nominations (`main`, `bin`, `exports`)
/// against the project set, promoting hits and adding existing files.
pub fn apply_manifest_entries(
    workspace: &Workspace,
    files: &mut ProjectFiles,
) -> Result<(), CollectError> {
    for relative in workspace.manifest.entry_paths() {
        let trimmed = relative.trim_start_matches("./");
        let absolute = normalize_join(&workspace.dir, trimmed);
        if !absolute.starts_with(&workspace.dir) {
            return Err(CollectError::OutsideWorkspace(absolute));
        }
        if absolute.is_file() {
            files.insert(absolute, FileOrigin::ManifestEntry);
        }
    }
    Ok(())
}

fn project_patterns(config: &WorkspaceConfig) -> Vec<String> {
    if config.project.is_empty() {
        DEFAULT_PROJECT_PATTERNS
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        config.project.clone()
    }
}

fn entry_patterns(config: &WorkspaceConfig) -> Vec<String> {
    if config.entry.is_empty() {
        DEFAULT_ENTRY_PATTERNS
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        config.entry.clone()
    }
}

fn split_patterns(patterns: Vec<String>) -> (Vec<String>, Vec<String>) {
    let mut positive = Vec::new();
    let mut negated = Vec::new();
    for pattern in patterns {
        match pattern.strip_prefix('!') {
            Some(rest) => negated.push(rest.to_string()),
            None => positive.push(pattern),
        }
    }
    (positive, negated)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, CollectError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|err| CollectError::Pattern {
            glob: pattern.clone(),
            message: err.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|err| CollectError::Pattern {
        glob: patterns.join(","),
        message: err.to_string(),
    })
}

fn normalize_join(base: &Path, relative: &str) -> PathBuf {
    use path_clean::PathClean;
    base.join(relative).clean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::PackageJson;
    use shears_config::ShearsConfig;

    fn workspace_at(dir: &Path, config: WorkspaceConfig) -> Workspace {
        Workspace {
            dir: dir.to_path_buf(),
            relative_dir: ".".to_string(),
            manifest: PackageJson::default(),
            config,
            ancestors: Vec::new(),
        }
    }

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "export {};\n").unwrap();
    }

    #[test]
    fn defaults_pick_up_sources_and_entries() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("src/index.ts"));
        touch(&dir.path().join("src/util.ts"));
        touch(&dir.path().join("README.md.bak"));

        let workspace = workspace_at(dir.path(), ShearsConfig::default().for_workspace("."));
        let files = collect_project_files(&workspace, &[], true).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(
            files.origin(&dir.path().join("src/index.ts")),
            Some(FileOrigin::Entry)
        );
        assert_eq!(
            files.origin(&dir.path().join("src/util.ts")),
            Some(FileOrigin::Project)
        );
    }

    #[test]
    fn negated_patterns_remove_matches() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("src/a.ts"));
        touch(&dir.path().join("src/a.test.ts"));

        let mut config = ShearsConfig::default().for_workspace(".");
        config.project = vec!["src/**/*.ts".into(), "!src/**/*.test.ts".into()];
        config.entry = vec!["src/a.ts".into()];

        let workspace = workspace_at(dir.path(), config);
        let files = collect_project_files(&workspace, &[], true).unwrap();

        assert!(files.contains(&dir.path().join("src/a.ts")));
        assert!(!files.contains(&dir.path().join("src/a.test.ts")));
    }

    #[test]
    fn entry_wins_over_negated_project_pattern() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("scripts/build.ts"));

        let mut config = ShearsConfig::default().for_workspace(".");
        config.project = vec!["**/*.ts".into(), "!scripts/**".into()];
        config.entry = vec!["scripts/build.ts".into()];

        let workspace = workspace_at(dir.path(), config);
        let files = collect_project_files(&workspace, &[], true).unwrap();

        assert_eq!(
            files.origin(&dir.path().join("scripts/build.ts")),
            Some(FileOrigin::Entry)
        );
    }

    #[test]
    fn nested_workspace_files_are_excluded() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("src/index.ts"));
        touch(&dir.path().join("packages/a/src/index.ts"));

        let workspace = workspace_at(dir.path(), ShearsConfig::default().for_workspace("."));
        let nested = vec![dir.path().join("packages/a")];
        let files = collect_project_files(&workspace, &nested, true).unwrap();

        assert!(files.contains(&dir.path().join("src/index.ts")));
        assert!(!files.contains(&dir.path().join("packages/a/src/index.ts")));
    }

    #[test]
    fn origin_upgrades_only_forward() {
        let mut files = ProjectFiles::default();
        let path = PathBuf::from("/w/src/a.ts");
        files.insert(path.clone(), FileOrigin::Entry);
        files.insert(path.clone(), FileOrigin::Project);
        assert_eq!(files.origin(&path), Some(FileOrigin::Entry));
    }

    #[test]
    fn manifest_entries_promote_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("src/main.ts"));

        let mut workspace =
            workspace_at(dir.path(), ShearsConfig::default().for_workspace("."));
        workspace.manifest = serde_json::from_str(r#"{"main": "./src/main.ts"}"#).unwrap();

        let mut files = collect_project_files(&workspace, &[], true).unwrap();
        apply_manifest_entries(&workspace, &mut files).unwrap();

        assert_eq!(
            files.origin(&dir.path().join("src/main.ts")),
            Some(FileOrigin::ManifestEntry)
        );
    }

    #[test]
    fn manifest_entry_escaping_the_workspace_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut workspace =
            workspace_at(dir.path(), ShearsConfig::default().for_workspace("."));
        workspace.manifest = serde_json::from_str(r#"{"main": "../outside.js"}"#).unwrap();

        let mut files = ProjectFiles::default();
        let err = apply_manifest_entries(&workspace, &mut files).unwrap_err();
        assert!(matches!(err, CollectError::OutsideWorkspace(_)));
    }
}
