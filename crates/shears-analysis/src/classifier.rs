//! Issue classification.
//!
//! Pure set arithmetic over the graph, the project sets, the manifests and
//! the attribution outcome. Nothing here touches the filesystem; replaying
//! from a cached graph reproduces the report exactly.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use shears_graph::{ExportKind, ModuleGraph, ModuleId};
use shears_workspace::{DependencyKind, ProjectFiles, Workspace};

use crate::attribution::{owning_workspace, AttributionOutcome};
use crate::binaries::{Binary, BinaryResolution};
use crate::report::{BinaryIssue, DependencyIssue, ExportIssue, FileIssue, Report};

/// Everything the classifier reads. `project_files` is parallel to
/// `workspaces`.
pub struct ClassifierInput<'a> {
    pub root: &'a Path,
    pub workspaces: &'a [Workspace],
    pub project_files: &'a [ProjectFiles],
    pub graph: &'a ModuleGraph,
    pub attribution: &'a AttributionOutcome,
    pub binaries: &'a [Binary],
    /// Restrict the unused-dependency arithmetic to production kinds.
    pub production: bool,
}

/// Emit the six issue categories. The report comes back sorted but
/// unfiltered; the caller applies the `--include`/`--exclude` projection.
pub fn classify(input: &ClassifierInput<'_>) -> Report {
    let mut report = Report::default();

    classify_files(input, &mut report);
    classify_dependencies(input, &mut report);
    classify_exports(input, &mut report);
    classify_binaries(input, &mut report);

    report.sort();
    report
}

/// Unused files: P minus reached modules minus `ignore` matches.
fn classify_files(input: &ClassifierInput<'_>, report: &mut Report) {
    for (index, workspace) in input.workspaces.iter().enumerate() {
        let ignore_set = build_globset(&workspace.config.ignore);

        for path in input.project_files[index].paths() {
            let id = ModuleId::from_normalized(path.clone());
            if input.graph.contains(&id) {
                continue;
            }
            if let Some(ignore) = &ignore_set {
                let relative = path.strip_prefix(&workspace.dir).unwrap_or(path);
                if ignore.is_match(relative) {
                    continue;
                }
            }
            report.unused_files.push(FileIssue {
                workspace: workspace.display_name().to_string(),
                file: relative_to_root(input.root, path),
            });
        }
    }
}

/// Unused dependencies (declared, never referenced) and unlisted
/// dependencies (referenced, never declared).
fn classify_dependencies(input: &ClassifierInput<'_>, report: &mut Report) {
    for (index, workspace) in input.workspaces.iter().enumerate() {
        let ignore = workspace
            .config
            .ignore_dependencies_matcher()
            .unwrap_or_default();
        let referenced = &input.attribution.referenced[index];

        let kinds: &[DependencyKind] = if input.production {
            &[DependencyKind::Production]
        } else {
            &[DependencyKind::Production, DependencyKind::Development]
        };

        for kind in kinds {
            for package in workspace.manifest.dependencies_of_kind(*kind).keys() {
                if referenced.contains(package) || ignore.is_match(package) {
                    continue;
                }
                // A workspace sibling declared as a dependency resolves
                // internally; its usage was recorded under `referenced`
                // already, so reaching here means it really is unused —
                // unless it names this very package (self-reference).
                if workspace.manifest.name.as_deref() == Some(package) {
                    continue;
                }
                report.unused_dependencies.push(DependencyIssue {
                    workspace: workspace.display_name().to_string(),
                    package: package.clone(),
                });
            }
        }
    }

    for unlisted in &input.attribution.unlisted {
        let workspace = &input.workspaces[unlisted.workspace];
        let ignore = workspace
            .config
            .ignore_dependencies_matcher()
            .unwrap_or_default();
        if ignore.is_match(&unlisted.package) {
            continue;
        }
        report.unlisted_dependencies.push(DependencyIssue {
            workspace: workspace.display_name().to_string(),
            package: unlisted.package.clone(),
        });
    }
}

/// Unused exports plus the enum/class member categories.
fn classify_exports(input: &ClassifierInput<'_>, report: &mut Report) {
    for module in input.graph.modules_sorted() {
        if module.parse_failed {
            continue;
        }
        let Some(index) = owning_workspace(module.id.as_path(), input.workspaces) else {
            continue;
        };
        let workspace = &input.workspaces[index];

        // Only project files are reportable; reachable files outside P
        // (e.g. gitignored) stay silent.
        if !input.project_files[index].contains(module.id.as_path()) {
            continue;
        }

        if module.is_entry && !workspace.config.include_entry_exports {
            continue;
        }

        for export in module.exports_iter() {
            if export.is_star_reexport() {
                continue;
            }
            // Tagged surface: `@public` is intentional API, `@internal` is
            // explicitly acknowledged.
            if export.has_tag("public") || export.has_tag("internal") {
                continue;
            }
            if !export.is_unreferenced() {
                continue;
            }

            let kind_key = match &export.kind {
                ExportKind::EnumMember { .. } => "enumMembers",
                ExportKind::ClassMember { .. } => "classMembers",
                _ => "exports",
            };
            if export.used_in_file
                && workspace
                    .config
                    .ignore_exports_used_in_file
                    .applies_to(kind_key)
            {
                continue;
            }

            let issue = ExportIssue {
                workspace: workspace.display_name().to_string(),
                file: relative_to_root(input.root, module.id.as_path()),
                symbol: match export.kind.member_parent() {
                    Some(parent) => format!("{parent}.{}", export.external_name),
                    None => export.external_name.clone(),
                },
                span: export.span,
            };

            match &export.kind {
                ExportKind::EnumMember { .. } => report.unused_enum_members.push(issue),
                ExportKind::ClassMember { .. } => report.unused_class_members.push(issue),
                _ => report.unused_exports.push(issue),
            }
        }
    }
}

/// Unlisted binaries, after `ignoreBinaries`.
fn classify_binaries(input: &ClassifierInput<'_>, report: &mut Report) {
    for binary in input.binaries {
        if binary.resolution != BinaryResolution::Unlisted {
            continue;
        }
        let workspace = &input.workspaces[binary.workspace];
        let ignore = workspace
            .config
            .ignore_binaries_matcher()
            .unwrap_or_default();
        if ignore.is_match(&binary.name) {
            continue;
        }
        report.unlisted_binaries.push(BinaryIssue {
            workspace: workspace.display_name().to_string(),
            binary: binary.name.clone(),
            script: binary.script.clone(),
        });
    }
}

fn relative_to_root(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn build_globset(patterns: &[String]) -> Option<GlobSet> {
    if patterns.is_empty() {
        return None;
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).ok()?);
    }
    builder.build().ok()
}
