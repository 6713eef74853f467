//! package.json parsing.
//!
//! Only the fields the linter consumes: declared dependencies by kind,
//! scripts, the entry-describing fields (`main`, `bin`, `exports`) and the
//! `workspaces` globs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use shears_core::{Runtime, RuntimeError};

/// package.json larger than this is treated as malformed.
const MAX_MANIFEST_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: RuntimeError,
    },

    #[error("{path} exceeds the {limit} byte manifest size limit")]
    TooLarge { path: PathBuf, limit: u64 },

    #[error("invalid package.json at {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// The `bin` field: a bare path (binary named after the package) or a map of
/// binary name to path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BinField {
    Single(String),
    Map(BTreeMap<String, String>),
}

/// The `workspaces` field: a glob list or `{ "packages": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkspacesField {
    List(Vec<String>),
    Object { packages: Vec<String> },
}

impl WorkspacesField {
    pub fn globs(&self) -> &[String] {
        match self {
            Self::List(globs) => globs,
            Self::Object { packages } => packages,
        }
    }
}

/// Kind of manifest dependency table a package is declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DependencyKind {
    Production,
    Development,
    Peer,
    Optional,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "dependencies",
            Self::Development => "devDependencies",
            Self::Peer => "peerDependencies",
            Self::Optional => "optionalDependencies",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageJson {
    pub name: Option<String>,
    pub version: Option<String>,
    pub main: Option<String>,
    /// Entry of the package's type declaration surface.
    pub types: Option<String>,
    /// Legacy alias of `types`; both appear in the wild.
    pub typings: Option<String>,
    pub bin: Option<BinField>,
    /// Kept as raw JSON: the `exports` field nests conditions arbitrarily.
    pub exports: Option<Value>,
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
    pub workspaces: Option<WorkspacesField>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "peerDependencies")]
    pub peer_dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "optionalDependencies")]
    pub optional_dependencies: BTreeMap<String, String>,
    #[serde(skip)]
    pub path: PathBuf,
}

impl PackageJson {
    pub async fn from_path<R: Runtime + ?Sized>(
        runtime: &R,
        path: &Path,
    ) -> Result<Self, ManifestError> {
        let metadata = runtime
            .metadata(path)
            .await
            .map_err(|source| ManifestError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        if metadata.size > MAX_MANIFEST_SIZE {
            return Err(ManifestError::TooLarge {
                path: path.to_path_buf(),
                limit: MAX_MANIFEST_SIZE,
            });
        }

        let content =
            runtime
                .read_to_string(path)
                .await
                .map_err(|source| ManifestError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let mut manifest: PackageJson =
            serde_json::from_str(&content).map_err(|err| ManifestError::Parse {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        manifest.path = path.to_path_buf();
        Ok(manifest)
    }

    pub fn dependencies_of_kind(&self, kind: DependencyKind) -> &BTreeMap<String, String> {
        match kind {
            DependencyKind::Production => &self.dependencies,
            DependencyKind::Development => &self.dev_dependencies,
            DependencyKind::Peer => &self.peer_dependencies,
            DependencyKind::Optional => &self.optional_dependencies,
        }
    }

    /// The kind a package is declared under, production first.
    pub fn declares(&self, package: &str) -> Option<DependencyKind> {
        [
            DependencyKind::Production,
            DependencyKind::Development,
            DependencyKind::Peer,
            DependencyKind::Optional,
        ]
        .into_iter()
        .find(|kind| self.dependencies_of_kind(*kind).contains_key(package))
    }

    /// All declared dependency names across every kind, sorted and deduped.
    pub fn all_dependency_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .dependencies
            .keys()
            .chain(self.dev_dependencies.keys())
            .chain(self.peer_dependencies.keys())
            .chain(self.optional_dependencies.keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Relative paths the manifest itself nominates as entry files: `main`,
    /// every `bin` target and every string leaf of `exports`.
    pub fn entry_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();

        if let Some(main) = &self.main {
            paths.push(main.clone());
        }

        match &self.bin {
            Some(BinField::Single(path)) => paths.push(path.clone()),
            Some(BinField::Map(map)) => paths.extend(map.values().cloned()),
            None => {}
        }

        if let Some(exports) = &self.exports {
            collect_export_leaves(exports, &mut paths);
        }

        paths.sort();
        paths.dedup();
        paths
    }

    /// Relative paths to the package's type declarations: `types`,
    /// `typings` and any declaration-file leaves of `exports`.
    pub fn declaration_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();

        if let Some(types) = &self.types {
            paths.push(types.clone());
        }
        if let Some(typings) = &self.typings {
            paths.push(typings.clone());
        }
        if let Some(exports) = &self.exports {
            let mut leaves = Vec::new();
            collect_export_leaves(exports, &mut leaves);
            paths.extend(leaves.into_iter().filter(|leaf| is_declaration_path(leaf)));
        }

        paths.sort();
        paths.dedup();
        paths
    }

    /// Binary names this package installs, from its `bin` field.
    pub fn bin_names(&self) -> Vec<String> {
        match &self.bin {
            Some(BinField::Single(_)) => self.name.clone().into_iter().collect(),
            Some(BinField::Map(map)) => map.keys().cloned().collect(),
            None => Vec::new(),
        }
    }
}

/// Collect string leaves of the `exports` field. Conditions and subpath keys
/// nest arbitrarily; every string is a candidate entry path.
fn collect_export_leaves(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(path) => out.push(path.clone()),
        Value::Object(map) => {
            for nested in map.values() {
                collect_export_leaves(nested, out);
            }
        }
        Value::Array(items) => {
            for nested in items {
                collect_export_leaves(nested, out);
            }
        }
        _ => {}
    }
}

fn is_declaration_path(path: &str) -> bool {
    path.ends_with(".d.ts") || path.ends_with(".d.mts") || path.ends_with(".d.cts")
}

/// Extract the base package name from an import specifier.
///
/// `@scope/pkg/deep` → `@scope/pkg`, `lodash/fp` → `lodash`.
pub fn extract_package_name(specifier: &str) -> &str {
    if specifier.is_empty() {
        return specifier;
    }

    if let Some(rest) = specifier.strip_prefix('@') {
        match rest.find('/') {
            Some(first_slash) => {
                let after_scope = &rest[first_slash + 1..];
                match after_scope.find('/') {
                    Some(second_slash) => &specifier[..1 + first_slash + 1 + second_slash],
                    None => specifier,
                }
            }
            None => specifier,
        }
    } else {
        match specifier.find('/') {
            Some(slash) => &specifier[..slash],
            None => specifier,
        }
    }
}

/// Subpath after the package name, if any.
pub fn extract_subpath(specifier: &str) -> Option<&str> {
    let package = extract_package_name(specifier);
    let rest = &specifier[package.len()..];
    rest.strip_prefix('/').filter(|s| !s.is_empty())
}
