//! External-library inspection (`--include-libs`).
//!
//! A second, opt-in traversal pass over the already-built graph's external
//! leaves. For every referenced package it locates the installed type
//! declarations (`types`/`typings`, declaration leaves of `exports`, the
//! `@types` shadow package, `index.d.ts`), analyzes them, and follows their
//! imports — into sibling declaration files and back into project files.
//! Declaration modules enter the graph like any other node, so a workspace
//! export whose only consumer is a library's declaration surface counts as
//! referenced. The pass can multiply the graph's size, which is why it
//! never runs unless asked for.
//!
//! Imports found inside `node_modules` are resolved for edges only; they
//! contribute no dependency references, so attribution stays a function of
//! project code alone.

use std::path::{Path, PathBuf};

use path_clean::PathClean;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use shears_core::{Diagnostics, Runtime, Warning};
use shears_graph::{Module, ModuleGraph, ModuleId, Resolution, SourceType};
use shears_workspace::{extract_package_name, extract_subpath, PackageJson, Workspace};

use crate::analyzer::Analyzer;
use crate::attribution::types_package_for;
use crate::resolver::is_node_builtin;

/// Probe order inside `node_modules`; declarations shadow source files.
const DECLARATION_EXTENSIONS: [&str; 6] = ["d.ts", "ts", "d.mts", "mts", "d.cts", "cts"];

/// Walk into the type declarations of every external package the graph
/// references, adding declaration modules and their edges.
pub async fn inspect_libraries<R: Runtime + ?Sized>(
    runtime: &R,
    analyzer: &dyn Analyzer,
    graph: &ModuleGraph,
    workspaces: &[Workspace],
    diagnostics: &Diagnostics,
) {
    let mut queue: Vec<ModuleId> = Vec::new();
    let mut visited: FxHashSet<ModuleId> = FxHashSet::default();
    let mut seen_packages: FxHashSet<PathBuf> = FxHashSet::default();

    for external in graph.external_dependencies() {
        for importer in &external.importers {
            let from_dir = importer
                .module
                .as_path()
                .parent()
                .unwrap_or(Path::new("/"));
            for package in [
                external.package.clone(),
                types_package_for(&external.package),
            ] {
                let Some(package_dir) =
                    find_package_dir(runtime, from_dir, &package, workspaces)
                else {
                    continue;
                };
                if !seen_packages.insert(package_dir.clone()) {
                    continue;
                }
                for entry in declaration_entries(runtime, &package_dir).await {
                    let id = ModuleId::from_normalized(entry);
                    if visited.insert(id.clone()) {
                        queue.push(id);
                    }
                }
            }
        }
    }

    queue.sort();
    debug!(entries = queue.len(), "inspecting library declarations");

    while let Some(id) = queue.pop() {
        if graph.contains(&id) {
            continue;
        }

        match analyzer.analyze(id.as_path(), SourceType::TypeScript).await {
            Ok(analysis) => {
                let mut imports = analysis.imports.clone();
                for import in &mut imports {
                    let resolution =
                        resolve_in_libraries(runtime, &import.specifier, &id, workspaces)
                            .await;
                    if let Resolution::Internal(target) = &resolution {
                        graph.add_edge(id.clone(), target.clone());
                        if !graph.contains(target) && visited.insert(target.clone()) {
                            queue.push(target.clone());
                        }
                    }
                    import.resolution = resolution;
                }

                let module = Module::builder(id.clone(), SourceType::from_path(id.as_path()))
                    .imports(imports)
                    .exports(analysis.exports.clone())
                    .member_accesses(analysis.member_accesses.clone())
                    .build();
                graph.insert_module(module);
            }
            Err(err) => {
                trace!(file = %id, error = %err, "library declaration unreadable");
                diagnostics.push(Warning::Parse {
                    path: id.as_path().to_path_buf(),
                    message: err.to_string(),
                });
                let module = Module::builder(id.clone(), SourceType::from_path(id.as_path()))
                    .parse_failed(true)
                    .build();
                graph.insert_module(module);
            }
        }
    }
}

/// Resolution inside the library pass: relative specifiers probe
/// declaration extensions, bare specifiers walk up for their installed
/// package. Queue targets only; nothing here feeds attribution.
async fn resolve_in_libraries<R: Runtime + ?Sized>(
    runtime: &R,
    specifier: &str,
    from: &ModuleId,
    workspaces: &[Workspace],
) -> Resolution {
    let from_dir = from.as_path().parent().unwrap_or(Path::new("/"));

    if specifier.starts_with('.') || specifier.starts_with('/') {
        let joined = if specifier.starts_with('/') {
            PathBuf::from(specifier)
        } else {
            from_dir.join(specifier).clean()
        };
        return match resolve_declaration(runtime, &joined) {
            Some(path) => Resolution::Internal(ModuleId::from_normalized(path)),
            None => Resolution::Unresolved,
        };
    }

    if specifier.starts_with('#') {
        return Resolution::Unresolved;
    }

    let package = extract_package_name(specifier);
    let subpath = extract_subpath(specifier).map(str::to_string);
    if is_node_builtin(package) {
        return Resolution::External {
            package: package.to_string(),
            subpath,
        };
    }

    if let Some(package_dir) = find_package_dir(runtime, from_dir, package, workspaces) {
        let target = match &subpath {
            Some(subpath) => resolve_declaration(runtime, &package_dir.join(subpath).clean()),
            None => declaration_entries(runtime, &package_dir)
                .await
                .into_iter()
                .next(),
        };
        if let Some(path) = target {
            return Resolution::Internal(ModuleId::from_normalized(path));
        }
    }

    Resolution::External {
        package: package.to_string(),
        subpath,
    }
}

/// Declaration entry files of one installed package: manifest-nominated
/// paths first, `index.d.ts` as the fallback.
async fn declaration_entries<R: Runtime + ?Sized>(
    runtime: &R,
    package_dir: &Path,
) -> Vec<PathBuf> {
    let mut entries = Vec::new();

    let manifest_path = package_dir.join("package.json");
    if let Ok(manifest) = PackageJson::from_path(runtime, &manifest_path).await {
        for relative in manifest.declaration_paths() {
            let candidate = package_dir.join(relative.trim_start_matches("./")).clean();
            if let Some(path) = resolve_declaration(runtime, &candidate) {
                entries.push(path);
            }
        }
    }

    if entries.is_empty() {
        if let Some(index) = resolve_declaration(runtime, &package_dir.join("index.d.ts")) {
            entries.push(index);
        }
    }

    entries.sort();
    entries.dedup();
    entries
}

/// Exact file, declaration-extension probes, then `index.d.ts` and friends
/// for directories.
fn resolve_declaration<R: Runtime + ?Sized>(runtime: &R, candidate: &Path) -> Option<PathBuf> {
    if candidate.extension().is_some() && runtime.exists(candidate) {
        return Some(candidate.to_path_buf());
    }

    let file_name = candidate.file_name()?.to_str()?;
    for ext in DECLARATION_EXTENSIONS {
        let probed = candidate.with_file_name(format!("{file_name}.{ext}"));
        if runtime.exists(&probed) {
            return Some(probed);
        }
    }

    for ext in DECLARATION_EXTENSIONS {
        let probed = candidate.join(format!("index.{ext}"));
        if runtime.exists(&probed) {
            return Some(probed);
        }
    }
    None
}

/// Walk up from `from_dir` looking for `node_modules/<package>`, staying
/// inside the workspace tree.
fn find_package_dir<R: Runtime + ?Sized>(
    runtime: &R,
    from_dir: &Path,
    package: &str,
    workspaces: &[Workspace],
) -> Option<PathBuf> {
    let mut current = Some(from_dir.to_path_buf());
    while let Some(dir) = current {
        if !workspaces.iter().any(|w| dir.starts_with(&w.dir)) {
            break;
        }
        let candidate = dir.join("node_modules").join(package);
        if runtime.exists(&candidate.join("package.json")) {
            return Some(candidate);
        }
        current = dir.parent().map(Path::to_path_buf);
    }
    None
}
