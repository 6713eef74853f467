//! Export reference counting.
//!
//! Runs once after the graph reaches fixpoint. For every export the pass
//! counts distinct `(referrer, imported-name)` pairs:
//!
//! - a named import bumps the export it names,
//! - a default import bumps the `default` export,
//! - a namespace import bumps every export of the target once,
//! - a side-effect import bumps nothing,
//! - re-exports (named or star) forward instead of consuming — a consumer of
//!   the re-exporting module counts toward the origin, transitively.
//!
//! Enum and class members count through explicit member accesses on the
//! imported parent binding; a parent consumed through a namespace or default
//! import conservatively bumps every member.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use super::graph::GraphInner;
use super::{Export, ExportKind, ImportedNames, Module, ModuleGraph, ModuleId};

/// Distinct consumer pairs for one export; the second element is the
/// imported name (or `*` for namespace consumption).
type Consumers = FxHashSet<(ModuleId, String)>;

impl ModuleGraph {
    /// Compute and store `referenced_count` for every export in the graph.
    ///
    /// Star re-exports are structural and keep a count of `None`; the
    /// classifier never reports them as symbols.
    pub fn compute_referenced_counts(&self) {
        let ids = self.module_ids_sorted();
        let mut updates: FxHashMap<ModuleId, Arc<Module>> = FxHashMap::default();

        {
            let inner = self.inner.read();
            for id in ids {
                let Some(module_arc) = inner.modules.get(&id) else {
                    continue;
                };
                let mut module = (**module_arc).clone();

                let exports = Arc::make_mut(&mut module.exports);
                for export in exports.iter_mut() {
                    if export.is_star_reexport() {
                        continue;
                    }

                    let mut consumers = Consumers::default();
                    let mut visited = FxHashSet::default();
                    if export.kind.is_member() {
                        collect_member_consumers(
                            &inner,
                            &id,
                            export,
                            &mut visited,
                            &mut consumers,
                        );
                    } else {
                        collect_consumers(
                            &inner,
                            &id,
                            &export.external_name,
                            &mut visited,
                            &mut consumers,
                        );
                    }
                    export.referenced_count = Some(consumers.len() as u32);
                }

                updates.insert(id, Arc::new(module));
            }
        }

        let mut inner = self.inner.write();
        for (id, module) in updates {
            inner.modules.insert(id, module);
        }
    }
}

/// Accumulate consumers of `name` exported by `target`, following named and
/// star re-exports transitively. `visited` guards against re-export cycles.
fn collect_consumers(
    inner: &GraphInner,
    target: &ModuleId,
    name: &str,
    visited: &mut FxHashSet<(ModuleId, String)>,
    consumers: &mut Consumers,
) {
    if !visited.insert((target.clone(), name.to_string())) {
        return;
    }

    let Some(dependents) = inner.dependents.get(target) else {
        return;
    };

    for referrer_id in dependents {
        let Some(referrer) = inner.modules.get(referrer_id) else {
            continue;
        };

        for import in referrer.imports.iter() {
            if import.resolution.internal() != Some(target) {
                continue;
            }

            match (&import.names, import.is_reexport) {
                // `import { name } from target` — direct consumption.
                (ImportedNames::Named(names), false) => {
                    if names.iter().any(|n| n.imported == name) {
                        consumers.insert((referrer_id.clone(), name.to_string()));
                    }
                }
                // `import * as ns from target` consumes every export once.
                (ImportedNames::Namespace(_), false) => {
                    consumers.insert((referrer_id.clone(), "*".to_string()));
                }
                // `export { name as alias } from target` — forwarded; whoever
                // consumes the alias on the referrer consumes us.
                (ImportedNames::Named(names), true) => {
                    for named in names.iter().filter(|n| n.imported == name) {
                        collect_consumers(inner, referrer_id, &named.local, visited, consumers);
                    }
                }
                // `export * from target` forwards under the same name.
                (ImportedNames::Namespace(_), true) => {
                    collect_consumers(inner, referrer_id, name, visited, consumers);
                }
                (ImportedNames::SideEffect, _) => {}
            }
        }
    }
}

/// Consumers of an enum/class member export.
fn collect_member_consumers(
    inner: &GraphInner,
    target: &ModuleId,
    export: &Export,
    visited: &mut FxHashSet<(ModuleId, String)>,
    consumers: &mut Consumers,
) {
    let Some(parent) = export.kind.member_parent() else {
        return;
    };
    let member = export.external_name.as_str();

    if !visited.insert((target.clone(), format!("{parent}.{member}"))) {
        return;
    }

    // The parent may be exposed under `default` as well as its own name.
    let parent_is_default = inner.modules.get(target).is_some_and(|module| {
        module
            .exports
            .iter()
            .any(|e| matches!(e.kind, ExportKind::Default) && e.local_name == parent)
    });

    let Some(dependents) = inner.dependents.get(target) else {
        return;
    };

    for referrer_id in dependents {
        let Some(referrer) = inner.modules.get(referrer_id) else {
            continue;
        };

        for import in referrer.imports.iter() {
            if import.resolution.internal() != Some(target) {
                continue;
            }

            match (&import.names, import.is_reexport) {
                (ImportedNames::Named(names), false) => {
                    for named in names {
                        let binds_parent = named.imported == parent
                            || (parent_is_default && named.imported == "default");
                        if !binds_parent {
                            continue;
                        }
                        // Explicit access on the binding consumes the member.
                        if referrer
                            .member_accesses
                            .iter()
                            .any(|(binding, accessed)| {
                                binding == &named.local && accessed == member
                            })
                        {
                            consumers.insert((referrer_id.clone(), member.to_string()));
                        }
                    }
                }
                // Namespace consumption reaches every member.
                (ImportedNames::Namespace(_), false) => {
                    consumers.insert((referrer_id.clone(), "*".to_string()));
                }
                (ImportedNames::Named(names), true) => {
                    for named in names.iter().filter(|n| n.imported == parent) {
                        // Member travels with the forwarded parent name.
                        collect_forwarded_member(
                            inner,
                            referrer_id,
                            &named.local,
                            member,
                            visited,
                            consumers,
                        );
                    }
                }
                (ImportedNames::Namespace(_), true) => {
                    collect_forwarded_member(
                        inner, referrer_id, parent, member, visited, consumers,
                    );
                }
                (ImportedNames::SideEffect, _) => {}
            }
        }
    }
}

/// Member consumption through a module that re-exports the parent.
fn collect_forwarded_member(
    inner: &GraphInner,
    via: &ModuleId,
    parent: &str,
    member: &str,
    visited: &mut FxHashSet<(ModuleId, String)>,
    consumers: &mut Consumers,
) {
    if !visited.insert((via.clone(), format!("{parent}.{member}"))) {
        return;
    }

    let Some(dependents) = inner.dependents.get(via) else {
        return;
    };

    for referrer_id in dependents {
        let Some(referrer) = inner.modules.get(referrer_id) else {
            continue;
        };

        for import in referrer.imports.iter() {
            if import.resolution.internal() != Some(via) {
                continue;
            }

            match (&import.names, import.is_reexport) {
                (ImportedNames::Named(names), false) => {
                    for named in names.iter().filter(|n| n.imported == parent) {
                        if referrer
                            .member_accesses
                            .iter()
                            .any(|(binding, accessed)| {
                                binding == &named.local && accessed == member
                            })
                        {
                            consumers.insert((referrer_id.clone(), member.to_string()));
                        }
                    }
                }
                (ImportedNames::Namespace(_), false) => {
                    consumers.insert((referrer_id.clone(), "*".to_string()));
                }
                (ImportedNames::Named(names), true) => {
                    for named in names.iter().filter(|n| n.imported == parent) {
                        collect_forwarded_member(
                            inner,
                            referrer_id,
                            &named.local,
                            member,
                            visited,
                            consumers,
                        );
                    }
                }
                (ImportedNames::Namespace(_), true) => {
                    collect_forwarded_member(
                        inner, referrer_id, parent, member, visited, consumers,
                    );
                }
                (ImportedNames::SideEffect, _) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Import, NamedImport, Resolution, SourceType};

    fn id(path: &str) -> ModuleId {
        ModuleId::from_normalized(path)
    }

    fn link(graph: &ModuleGraph, from: &str, to: &str) {
        graph.add_edge(id(from), id(to));
    }

    fn named_import(target: &str, names: &[&str]) -> Import {
        Import::new(
            "./x",
            ImportedNames::Named(names.iter().map(|n| NamedImport::plain(*n)).collect()),
        )
        .with_resolution(Resolution::Internal(id(target)))
    }

    #[test]
    fn named_import_counts_one_pair() {
        let graph = ModuleGraph::new();
        graph.insert_module(
            Module::builder(id("/p/lib.ts"), SourceType::TypeScript)
                .exports(vec![
                    Export::new("x", ExportKind::Value),
                    Export::new("y", ExportKind::Value),
                ])
                .build(),
        );
        graph.insert_module(
            Module::builder(id("/p/main.ts"), SourceType::TypeScript)
                .imports(vec![named_import("/p/lib.ts", &["x"])])
                .build(),
        );
        link(&graph, "/p/main.ts", "/p/lib.ts");

        graph.compute_referenced_counts();

        let lib = graph.module(&id("/p/lib.ts")).unwrap();
        let x = lib.exports.iter().find(|e| e.external_name == "x").unwrap();
        let y = lib.exports.iter().find(|e| e.external_name == "y").unwrap();
        assert_eq!(x.referenced_count, Some(1));
        assert_eq!(y.referenced_count, Some(0));
    }

    #[test]
    fn namespace_import_counts_every_export() {
        let graph = ModuleGraph::new();
        graph.insert_module(
            Module::builder(id("/p/lib.ts"), SourceType::TypeScript)
                .exports(vec![
                    Export::new("x", ExportKind::Value),
                    Export::new("y", ExportKind::Value),
                ])
                .build(),
        );
        graph.insert_module(
            Module::builder(id("/p/main.ts"), SourceType::TypeScript)
                .imports(vec![Import::new(
                    "./lib",
                    ImportedNames::Namespace("ns".into()),
                )
                .with_resolution(Resolution::Internal(id("/p/lib.ts")))])
                .build(),
        );
        link(&graph, "/p/main.ts", "/p/lib.ts");

        graph.compute_referenced_counts();

        let lib = graph.module(&id("/p/lib.ts")).unwrap();
        assert!(lib.exports.iter().all(|e| e.referenced_count == Some(1)));
    }

    #[test]
    fn star_reexport_forwards_instead_of_consuming() {
        // origin.ts --(export * from)--> barrel.ts --(import {x})--> main.ts
        let graph = ModuleGraph::new();
        graph.insert_module(
            Module::builder(id("/p/origin.ts"), SourceType::TypeScript)
                .exports(vec![
                    Export::new("x", ExportKind::Value),
                    Export::new("unused", ExportKind::Value),
                ])
                .build(),
        );
        graph.insert_module(
            Module::builder(id("/p/barrel.ts"), SourceType::TypeScript)
                .imports(vec![Import::new(
                    "./origin",
                    ImportedNames::Namespace("*".into()),
                )
                .with_resolution(Resolution::Internal(id("/p/origin.ts")))
                .reexport()])
                .exports(vec![Export::new(
                    "*",
                    ExportKind::NamespaceReExport {
                        source: "./origin".into(),
                    },
                )])
                .build(),
        );
        graph.insert_module(
            Module::builder(id("/p/main.ts"), SourceType::TypeScript)
                .imports(vec![named_import("/p/barrel.ts", &["x"])])
                .build(),
        );
        link(&graph, "/p/barrel.ts", "/p/origin.ts");
        link(&graph, "/p/main.ts", "/p/barrel.ts");

        graph.compute_referenced_counts();

        let origin = graph.module(&id("/p/origin.ts")).unwrap();
        let x = origin.exports.iter().find(|e| e.external_name == "x").unwrap();
        let unused = origin
            .exports
            .iter()
            .find(|e| e.external_name == "unused")
            .unwrap();
        // The barrel alone consumes nothing; main consumes x through it.
        assert_eq!(x.referenced_count, Some(1));
        assert_eq!(unused.referenced_count, Some(0));
    }

    #[test]
    fn named_reexport_follows_the_alias() {
        // origin exports `x`; barrel does `export { x as y }`; main imports `y`.
        let graph = ModuleGraph::new();
        graph.insert_module(
            Module::builder(id("/p/origin.ts"), SourceType::TypeScript)
                .exports(vec![Export::new("x", ExportKind::Value)])
                .build(),
        );
        graph.insert_module(
            Module::builder(id("/p/barrel.ts"), SourceType::TypeScript)
                .imports(vec![Import::new(
                    "./origin",
                    ImportedNames::Named(vec![NamedImport::new("x", "y")]),
                )
                .with_resolution(Resolution::Internal(id("/p/origin.ts")))
                .reexport()])
                .exports(vec![Export::new("y", ExportKind::Value)])
                .build(),
        );
        graph.insert_module(
            Module::builder(id("/p/main.ts"), SourceType::TypeScript)
                .imports(vec![named_import("/p/barrel.ts", &["y"])])
                .build(),
        );
        link(&graph, "/p/barrel.ts", "/p/origin.ts");
        link(&graph, "/p/main.ts", "/p/barrel.ts");

        graph.compute_referenced_counts();

        let origin = graph.module(&id("/p/origin.ts")).unwrap();
        assert_eq!(origin.exports[0].referenced_count, Some(1));
    }

    #[test]
    fn reexport_cycles_terminate() {
        let graph = ModuleGraph::new();
        for path in ["/p/a.ts", "/p/b.ts"] {
            graph.insert_module(
                Module::builder(id(path), SourceType::TypeScript)
                    .imports(vec![Import::new(
                        "./other",
                        ImportedNames::Namespace("*".into()),
                    )
                    .with_resolution(Resolution::Internal(id(if path == "/p/a.ts" {
                        "/p/b.ts"
                    } else {
                        "/p/a.ts"
                    })))
                    .reexport()])
                    .exports(vec![Export::new("x", ExportKind::Value)])
                    .build(),
            );
        }
        link(&graph, "/p/a.ts", "/p/b.ts");
        link(&graph, "/p/b.ts", "/p/a.ts");

        // Must not hang or overflow.
        graph.compute_referenced_counts();
        let a = graph.module(&id("/p/a.ts")).unwrap();
        assert_eq!(a.exports[0].referenced_count, Some(0));
    }

    #[test]
    fn enum_member_counts_through_member_access() {
        let graph = ModuleGraph::new();
        graph.insert_module(
            Module::builder(id("/p/dir.ts"), SourceType::TypeScript)
                .exports(vec![
                    Export::new("Direction", ExportKind::Value),
                    Export::new("Up", ExportKind::EnumMember {
                        parent: "Direction".into(),
                    }),
                    Export::new("Down", ExportKind::EnumMember {
                        parent: "Direction".into(),
                    }),
                ])
                .build(),
        );
        graph.insert_module(
            Module::builder(id("/p/main.ts"), SourceType::TypeScript)
                .imports(vec![named_import("/p/dir.ts", &["Direction"])])
                .member_accesses(vec![("Direction".into(), "Up".into())])
                .build(),
        );
        link(&graph, "/p/main.ts", "/p/dir.ts");

        graph.compute_referenced_counts();

        let dir = graph.module(&id("/p/dir.ts")).unwrap();
        let up = dir.exports.iter().find(|e| e.external_name == "Up").unwrap();
        let down = dir
            .exports
            .iter()
            .find(|e| e.external_name == "Down")
            .unwrap();
        assert_eq!(up.referenced_count, Some(1));
        assert_eq!(down.referenced_count, Some(0));
    }

    #[test]
    fn aliased_parent_binding_still_counts_members() {
        let graph = ModuleGraph::new();
        graph.insert_module(
            Module::builder(id("/p/dir.ts"), SourceType::TypeScript)
                .exports(vec![
                    Export::new("Direction", ExportKind::Value),
                    Export::new("Up", ExportKind::EnumMember {
                        parent: "Direction".into(),
                    }),
                ])
                .build(),
        );
        graph.insert_module(
            Module::builder(id("/p/main.ts"), SourceType::TypeScript)
                .imports(vec![Import::new(
                    "./dir",
                    ImportedNames::Named(vec![NamedImport::new("Direction", "D")]),
                )
                .with_resolution(Resolution::Internal(id("/p/dir.ts")))])
                .member_accesses(vec![("D".into(), "Up".into())])
                .build(),
        );
        link(&graph, "/p/main.ts", "/p/dir.ts");

        graph.compute_referenced_counts();

        let dir = graph.module(&id("/p/dir.ts")).unwrap();
        let up = dir.exports.iter().find(|e| e.external_name == "Up").unwrap();
        assert_eq!(up.referenced_count, Some(1));
    }
}
