//! Dependency attribution.
//!
//! Every external reference binds to the nearest ancestor workspace whose
//! manifest declares the package; the enumeration order (deepest first)
//! makes the file→workspace lookup a first-match scan. A reference no
//! ancestor declares is unlisted at the importing workspace.

use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};

use shears_graph::{ExternalDependency, ModuleId};
use shears_workspace::{extract_package_name, DependencyKind, Workspace};

/// Where a dependency reference came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RefSource {
    Import,
    Plugin,
    Binary,
}

/// A reference that resolved to a declaring workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRef {
    pub package: String,
    /// Index of the declaring workspace in the enumeration.
    pub owner: usize,
    pub kind: DependencyKind,
    pub source: RefSource,
    /// Every import site was type-only.
    pub type_only: bool,
}

/// A reference no ancestor workspace declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlistedDependency {
    pub package: String,
    /// The importing workspace the issue is reported against.
    pub workspace: usize,
    /// Import sites, empty for plugin- or binary-sourced references.
    pub importers: Vec<ModuleId>,
}

#[derive(Debug, Default)]
pub struct AttributionOutcome {
    pub listed: Vec<DependencyRef>,
    pub unlisted: Vec<UnlistedDependency>,
    /// Referenced package names per workspace index, `@types` links
    /// included. Feeds the unused-dependency arithmetic.
    pub referenced: Vec<FxHashSet<String>>,
}

/// The deepest workspace whose directory contains `path`. Relies on the
/// deepest-first enumeration order.
pub fn owning_workspace(path: &Path, workspaces: &[Workspace]) -> Option<usize> {
    workspaces
        .iter()
        .position(|workspace| path.starts_with(&workspace.dir))
}

/// The DefinitelyTyped package shadowing a runtime package:
/// `react` → `@types/react`, `@babel/core` → `@types/babel__core`.
pub fn types_package_for(package: &str) -> String {
    match package.strip_prefix('@') {
        Some(rest) => format!("@types/{}", rest.replacen('/', "__", 1)),
        None => format!("@types/{package}"),
    }
}

/// Attribute every external reference.
///
/// `plugin_refs` and `binary_refs` are `(workspace index, specifier)` pairs
/// gathered by the plugin host and binary analyzer; `internal_refs` marks
/// workspace packages imported by name so `workspace:*` declarations count
/// as used.
pub fn attribute(
    externals: &[ExternalDependency],
    plugin_refs: &[(usize, String)],
    binary_refs: &[(usize, String)],
    internal_refs: &[(usize, String)],
    workspaces: &[Workspace],
) -> AttributionOutcome {
    let mut outcome = AttributionOutcome {
        listed: Vec::new(),
        unlisted: Vec::new(),
        referenced: vec![FxHashSet::default(); workspaces.len()],
    };

    // (package, importing workspace) → import sites, for unlisted grouping.
    let mut unlisted_sites: FxHashMap<(String, usize), Vec<ModuleId>> = FxHashMap::default();

    for external in externals {
        let type_only = external.is_type_only();
        for importer in &external.importers {
            let Some(start) = owning_workspace(importer.module.as_path(), workspaces) else {
                continue;
            };
            match find_owner(&external.package, start, workspaces) {
                Some((owner, kind)) => {
                    mark_referenced(&mut outcome, &external.package, owner, start, workspaces);
                    push_listed(
                        &mut outcome.listed,
                        DependencyRef {
                            package: external.package.clone(),
                            owner,
                            kind,
                            source: RefSource::Import,
                            type_only,
                        },
                    );
                }
                None => {
                    unlisted_sites
                        .entry((external.package.clone(), start))
                        .or_default()
                        .push(importer.module.clone());
                }
            }
        }
    }

    for (source, refs) in [
        (RefSource::Plugin, plugin_refs),
        (RefSource::Binary, binary_refs),
    ] {
        for (workspace, specifier) in refs {
            let package = extract_package_name(specifier);
            match find_owner(package, *workspace, workspaces) {
                Some((owner, kind)) => {
                    mark_referenced(&mut outcome, package, owner, *workspace, workspaces);
                    push_listed(
                        &mut outcome.listed,
                        DependencyRef {
                            package: package.to_string(),
                            owner,
                            kind,
                            source,
                            type_only: false,
                        },
                    );
                }
                None => {
                    unlisted_sites
                        .entry((package.to_string(), *workspace))
                        .or_default();
                }
            }
        }
    }

    // Workspace packages imported by name: the declaration is in use even
    // though the import resolved internally.
    for (workspace, package) in internal_refs {
        if let Some((owner, _)) = find_owner(package, *workspace, workspaces) {
            mark_referenced(&mut outcome, package, owner, *workspace, workspaces);
        }
    }

    let mut unlisted: Vec<UnlistedDependency> = unlisted_sites
        .into_iter()
        .map(|((package, workspace), mut importers)| {
            importers.sort();
            importers.dedup();
            UnlistedDependency {
                package,
                workspace,
                importers,
            }
        })
        .collect();
    unlisted.sort_by(|a, b| {
        (a.workspace, &a.package).cmp(&(b.workspace, &b.package))
    });
    outcome.unlisted = unlisted;

    outcome.listed.sort_by(|a, b| {
        (a.owner, &a.package, a.source).cmp(&(b.owner, &b.package, b.source))
    });

    outcome
}

/// Walk the workspace chain (itself, then ancestors) for the first manifest
/// declaring `package`.
fn find_owner(
    package: &str,
    start: usize,
    workspaces: &[Workspace],
) -> Option<(usize, DependencyKind)> {
    let chain = std::iter::once(start).chain(workspaces[start].ancestors.iter().copied());
    for index in chain {
        if let Some(kind) = workspaces[index].manifest.declares(package) {
            return Some((index, kind));
        }
    }
    None
}

/// Record the package (and its `@types` shadow) as referenced where
/// declared.
fn mark_referenced(
    outcome: &mut AttributionOutcome,
    package: &str,
    owner: usize,
    start: usize,
    workspaces: &[Workspace],
) {
    outcome.referenced[owner].insert(package.to_string());

    let types_package = types_package_for(package);
    if let Some((types_owner, _)) = find_owner(&types_package, start, workspaces) {
        outcome.referenced[types_owner].insert(types_package);
    }
}

fn push_listed(listed: &mut Vec<DependencyRef>, dependency_ref: DependencyRef) {
    if !listed.contains(&dependency_ref) {
        listed.push(dependency_ref);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shears_config::ShearsConfig;
    use shears_graph::ExternalDependency;
    use std::path::PathBuf;

    fn workspace(dir: &str, relative: &str, manifest: &str, ancestors: Vec<usize>) -> Workspace {
        Workspace {
            dir: PathBuf::from(dir),
            relative_dir: relative.to_string(),
            manifest: serde_json::from_str(manifest).unwrap(),
            config: ShearsConfig::default().for_workspace(relative),
            ancestors,
        }
    }

    /// pkg-b (index 0) under a root (index 1).
    fn two_workspaces(root_manifest: &str, member_manifest: &str) -> Vec<Workspace> {
        vec![
            workspace("/repo/packages/b", "packages/b", member_manifest, vec![1]),
            workspace("/repo", ".", root_manifest, vec![]),
        ]
    }

    fn external(package: &str, importer: &str) -> ExternalDependency {
        let mut dep = ExternalDependency::new(package);
        dep.push_importer(ModuleId::from_normalized(importer), false);
        dep
    }

    #[test]
    fn nearest_declaring_ancestor_wins() {
        let workspaces = two_workspaces(
            r#"{"dependencies": {"react": "^18.0.0"}}"#,
            r#"{"dependencies": {"react": "^18.0.0"}}"#,
        );
        let externals = vec![external("react", "/repo/packages/b/src/app.tsx")];

        let outcome = attribute(&externals, &[], &[], &[], &workspaces);
        assert_eq!(outcome.listed.len(), 1);
        // The member's own declaration binds, not the root's.
        assert_eq!(outcome.listed[0].owner, 0);
        assert!(outcome.referenced[0].contains("react"));
    }

    #[test]
    fn hoisted_declaration_binds_at_the_root() {
        let workspaces =
            two_workspaces(r#"{"dependencies": {"react": "^18.0.0"}}"#, r#"{}"#);
        let externals = vec![external("react", "/repo/packages/b/src/app.tsx")];

        let outcome = attribute(&externals, &[], &[], &[], &workspaces);
        assert_eq!(outcome.listed[0].owner, 1);
        assert!(outcome.unlisted.is_empty());
    }

    #[test]
    fn undeclared_everywhere_is_unlisted_at_the_importer() {
        let workspaces = two_workspaces(r#"{}"#, r#"{}"#);
        let externals = vec![external("chalk", "/repo/packages/b/src/cli.ts")];

        let outcome = attribute(&externals, &[], &[], &[], &workspaces);
        assert_eq!(outcome.unlisted.len(), 1);
        assert_eq!(outcome.unlisted[0].package, "chalk");
        assert_eq!(outcome.unlisted[0].workspace, 0);
        assert_eq!(outcome.unlisted[0].importers.len(), 1);
    }

    #[test]
    fn types_packages_link_to_their_runtime_package() {
        let workspaces = two_workspaces(
            r#"{"dependencies": {"react": "^18.0.0"}, "devDependencies": {"@types/react": "^18.0.0"}}"#,
            r#"{}"#,
        );
        let externals = vec![external("react", "/repo/packages/b/src/app.tsx")];

        let outcome = attribute(&externals, &[], &[], &[], &workspaces);
        assert!(outcome.referenced[1].contains("react"));
        assert!(outcome.referenced[1].contains("@types/react"));
    }

    #[test]
    fn scoped_types_name_mangling() {
        assert_eq!(types_package_for("react"), "@types/react");
        assert_eq!(types_package_for("@babel/core"), "@types/babel__core");
    }

    #[test]
    fn plugin_reference_attributes_to_config_workspace() {
        let workspaces = two_workspaces(
            r#"{"devDependencies": {"ts-jest": "^29.0.0"}}"#,
            r#"{}"#,
        );

        let outcome = attribute(&[], &[(0, "ts-jest".to_string())], &[], &[], &workspaces);
        assert_eq!(outcome.listed.len(), 1);
        assert_eq!(outcome.listed[0].source, RefSource::Plugin);
        assert!(outcome.referenced[1].contains("ts-jest"));
    }

    #[test]
    fn internal_workspace_import_counts_the_declaration() {
        let workspaces = vec![
            workspace(
                "/repo/packages/a",
                "packages/a",
                r#"{"name": "pkg-a", "dependencies": {"pkg-b": "workspace:*"}}"#,
                vec![2],
            ),
            workspace("/repo/packages/b", "packages/b", r#"{"name": "pkg-b"}"#, vec![2]),
            workspace("/repo", ".", r#"{}"#, vec![]),
        ];

        let outcome = attribute(&[], &[], &[], &[(0, "pkg-b".to_string())], &workspaces);
        assert!(outcome.referenced[0].contains("pkg-b"));
    }
}
