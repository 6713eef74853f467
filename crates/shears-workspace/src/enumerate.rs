//! Workspace enumeration.
//!
//! Expands the root manifest's workspace globs into the monorepo's workspace
//! tree. A repository without a `workspaces` field is the integrated case:
//! one workspace spanning the whole tree.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use thiserror::Error;
use tracing::debug;

use shears_config::{ShearsConfig, WorkspaceConfig};
use shears_core::{Diagnostics, Runtime, Warning};

use crate::manifest::{ManifestError, PackageJson};

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("no package.json at workspace root {0}")]
    RootManifestMissing(PathBuf),

    #[error("cannot load root manifest: {0}")]
    RootManifest(#[from] ManifestError),

    #[error("invalid workspace glob `{glob}`: {message}")]
    Pattern { glob: String, message: String },
}

/// A directory with its own manifest participating in the monorepo.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Absolute directory of the workspace.
    pub dir: PathBuf,
    /// Directory relative to the run root; `.` for the root workspace.
    pub relative_dir: String,
    pub manifest: PackageJson,
    pub config: WorkspaceConfig,
    /// Indices of ancestor workspaces in the enumeration, nearest first.
    pub ancestors: Vec<usize>,
}

impl Workspace {
    pub fn display_name(&self) -> &str {
        self.manifest
            .name
            .as_deref()
            .unwrap_or(&self.relative_dir)
    }
}

/// Discover the workspace tree rooted at `root_dir`.
///
/// The result is ordered deepest-first so any workspace appears before its
/// ancestors; dependency attribution binds closer workspaces first because
/// of this order. A declared workspace whose manifest is missing or
/// unreadable is skipped with a warning, together with its descendants.
pub async fn enumerate_workspaces<R: Runtime + ?Sized>(
    runtime: &R,
    root_dir: &Path,
    config: &ShearsConfig,
    diagnostics: &Diagnostics,
) -> Result<Vec<Workspace>, WorkspaceError> {
    let root_manifest_path = root_dir.join("package.json");
    if !runtime.exists(&root_manifest_path) {
        return Err(WorkspaceError::RootManifestMissing(root_dir.to_path_buf()));
    }
    let root_manifest = PackageJson::from_path(runtime, &root_manifest_path).await?;

    let globs: Vec<String> = root_manifest
        .workspaces
        .as_ref()
        .map(|field| field.globs().to_vec())
        .unwrap_or_default();

    let mut candidates: Vec<PathBuf> = Vec::new();
    if !globs.is_empty() {
        let matcher = build_globset(&globs)?;
        candidates = find_workspace_dirs(root_dir, &matcher);
        // Ancestors first so a failed parent can orphan its subtree.
        candidates.sort_by_key(|dir| (dir.components().count(), dir.clone()));
    }

    let mut loaded: Vec<(PathBuf, PackageJson)> = Vec::new();
    let mut failed_roots: Vec<PathBuf> = Vec::new();

    for dir in candidates {
        if let Some(failed) = failed_roots.iter().find(|root| dir.starts_with(root)) {
            diagnostics.push(Warning::Workspace {
                dir: dir.clone(),
                message: format!("orphaned by unreadable workspace {}", failed.display()),
            });
            continue;
        }

        let manifest_path = dir.join("package.json");
        match PackageJson::from_path(runtime, &manifest_path).await {
            Ok(manifest) => {
                debug!(workspace = %dir.display(), "discovered workspace");
                loaded.push((dir, manifest));
            }
            Err(err) => {
                diagnostics.push(Warning::Workspace {
                    dir: dir.clone(),
                    message: err.to_string(),
                });
                failed_roots.push(dir);
            }
        }
    }

    loaded.push((root_dir.to_path_buf(), root_manifest));

    // Deepest first; ties broken by path for determinism.
    loaded.sort_by(|(a, _), (b, _)| {
        b.components()
            .count()
            .cmp(&a.components().count())
            .then_with(|| a.cmp(b))
    });

    let mut workspaces: Vec<Workspace> = loaded
        .into_iter()
        .map(|(dir, manifest)| {
            let relative_dir = relative_name(root_dir, &dir);
            let config = config.for_workspace(&relative_dir);
            Workspace {
                dir,
                relative_dir,
                manifest,
                config,
                ancestors: Vec::new(),
            }
        })
        .collect();

    let dirs: Vec<PathBuf> = workspaces.iter().map(|w| w.dir.clone()).collect();
    for workspace in workspaces.iter_mut() {
        let mut ancestors: Vec<usize> = dirs
            .iter()
            .enumerate()
            .filter(|(_, dir)| workspace.dir != **dir && workspace.dir.starts_with(dir))
            .map(|(index, _)| index)
            .collect();
        // Nearest ancestor first.
        ancestors.sort_by(|a, b| {
            dirs[*b]
                .components()
                .count()
                .cmp(&dirs[*a].components().count())
        });
        workspace.ancestors = ancestors;
    }

    Ok(workspaces)
}

fn build_globset(globs: &[String]) -> Result<GlobSet, WorkspaceError> {
    let mut builder = GlobSetBuilder::new();
    for glob in globs {
        let compiled = Glob::new(glob).map_err(|err| WorkspaceError::Pattern {
            glob: glob.clone(),
            message: err.to_string(),
        })?;
        builder.add(compiled);
    }
    builder.build().map_err(|err| WorkspaceError::Pattern {
        glob: globs.join(","),
        message: err.to_string(),
    })
}

/// Directories under `root` whose relative path matches the workspace globs.
fn find_workspace_dirs(root: &Path, matcher: &GlobSet) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .filter_entry(|entry| entry.file_name() != "node_modules")
        .build();

    let mut dirs = Vec::new();
    for entry in walker.flatten() {
        let path = entry.path();
        if path == root || !path.is_dir() {
            continue;
        }
        if let Ok(relative) = path.strip_prefix(root) {
            if matcher.is_match(relative) {
                dirs.push(path.to_path_buf());
            }
        }
    }
    dirs
}

fn relative_name(root: &Path, dir: &Path) -> String {
    match dir.strip_prefix(root) {
        Ok(relative) if relative.as_os_str().is_empty() => ".".to_string(),
        Ok(relative) => relative.to_string_lossy().replace('\\', "/"),
        Err(_) => dir.to_string_lossy().into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shears_core::NativeRuntime;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn single_manifest_repo_is_one_workspace() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("package.json"), r#"{"name": "solo"}"#);

        let workspaces = enumerate_workspaces(
            &NativeRuntime::new(),
            dir.path(),
            &ShearsConfig::default(),
            &Diagnostics::new(),
        )
        .await
        .unwrap();

        assert_eq!(workspaces.len(), 1);
        assert_eq!(workspaces[0].relative_dir, ".");
        assert_eq!(workspaces[0].display_name(), "solo");
        assert!(workspaces[0].ancestors.is_empty());
    }

    #[tokio::test]
    async fn members_come_before_the_root() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("package.json"),
            r#"{"name": "root", "workspaces": ["packages/*"]}"#,
        );
        write(
            &dir.path().join("packages/a/package.json"),
            r#"{"name": "pkg-a"}"#,
        );
        write(
            &dir.path().join("packages/b/package.json"),
            r#"{"name": "pkg-b"}"#,
        );

        let workspaces = enumerate_workspaces(
            &NativeRuntime::new(),
            dir.path(),
            &ShearsConfig::default(),
            &Diagnostics::new(),
        )
        .await
        .unwrap();

        assert_eq!(workspaces.len(), 3);
        assert_eq!(workspaces[0].display_name(), "pkg-a");
        assert_eq!(workspaces[1].display_name(), "pkg-b");
        assert_eq!(workspaces[2].display_name(), "root");

        // Members point at the root as their nearest ancestor.
        let root_index = 2;
        assert_eq!(workspaces[0].ancestors, vec![root_index]);
    }

    #[tokio::test]
    async fn missing_root_manifest_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = enumerate_workspaces(
            &NativeRuntime::new(),
            dir.path(),
            &ShearsConfig::default(),
            &Diagnostics::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WorkspaceError::RootManifestMissing(_)));
    }

    #[tokio::test]
    async fn unreadable_member_manifest_warns_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("package.json"),
            r#"{"workspaces": ["packages/*"]}"#,
        );
        write(&dir.path().join("packages/bad/package.json"), "{oops");
        write(
            &dir.path().join("packages/good/package.json"),
            r#"{"name": "good"}"#,
        );

        let diagnostics = Diagnostics::new();
        let workspaces = enumerate_workspaces(
            &NativeRuntime::new(),
            dir.path(),
            &ShearsConfig::default(),
            &diagnostics,
        )
        .await
        .unwrap();

        assert_eq!(workspaces.len(), 2);
        assert!(workspaces.iter().any(|w| w.display_name() == "good"));
        assert_eq!(diagnostics.len(), 1);
    }

    #[tokio::test]
    async fn glob_matched_dir_without_manifest_warns() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("package.json"),
            r#"{"workspaces": ["packages/*"]}"#,
        );
        std::fs::create_dir_all(dir.path().join("packages/empty")).unwrap();

        let diagnostics = Diagnostics::new();
        let workspaces = enumerate_workspaces(
            &NativeRuntime::new(),
            dir.path(),
            &ShearsConfig::default(),
            &diagnostics,
        )
        .await
        .unwrap();

        assert_eq!(workspaces.len(), 1);
        assert_eq!(diagnostics.len(), 1);
    }
}
