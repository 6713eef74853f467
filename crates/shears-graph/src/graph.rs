//! In-memory module graph.
//!
//! Nodes are modules keyed by [`ModuleId`]; edges live in forward and
//! reverse adjacency maps. The walker inserts concurrently during the build,
//! so all state sits behind a single `RwLock` and module insertion is
//! owner-wins: the first writer of an id keeps it.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use super::external_dep::ExternalDependency;
use super::{Module, ModuleId};

#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    pub(crate) inner: Arc<RwLock<GraphInner>>,
}

#[derive(Debug, Default)]
pub(crate) struct GraphInner {
    pub modules: FxHashMap<ModuleId, Arc<Module>>,
    /// Forward edges: module -> modules it imports.
    pub dependencies: FxHashMap<ModuleId, FxHashSet<ModuleId>>,
    /// Reverse edges: module -> modules that import it.
    pub dependents: FxHashMap<ModuleId, FxHashSet<ModuleId>>,
    pub entry_points: FxHashSet<ModuleId>,
    pub external_deps: FxHashMap<String, ExternalDependency>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a module. Returns `false` when the id was already present; the
    /// existing module wins and the argument is dropped.
    pub fn insert_module(&self, module: Module) -> bool {
        let mut inner = self.inner.write();
        if inner.modules.contains_key(&module.id) {
            return false;
        }
        inner.modules.insert(module.id.clone(), Arc::new(module));
        true
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.inner.read().modules.contains_key(id)
    }

    pub fn module(&self, id: &ModuleId) -> Option<Arc<Module>> {
        self.inner.read().modules.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().modules.is_empty()
    }

    pub fn mark_entry(&self, id: ModuleId) {
        self.inner.write().entry_points.insert(id);
    }

    pub fn entry_points(&self) -> Vec<ModuleId> {
        let inner = self.inner.read();
        let mut entries: Vec<_> = inner.entry_points.iter().cloned().collect();
        entries.sort();
        entries
    }

    /// Record a resolved import edge between two project files.
    pub fn add_edge(&self, from: ModuleId, to: ModuleId) {
        let mut inner = self.inner.write();
        inner
            .dependencies
            .entry(from.clone())
            .or_default()
            .insert(to.clone());
        inner.dependents.entry(to).or_default().insert(from);
    }

    /// Record an import of an external package.
    pub fn record_external(&self, package: &str, importer: ModuleId, type_only: bool) {
        let mut inner = self.inner.write();
        inner
            .external_deps
            .entry(package.to_string())
            .or_insert_with(|| ExternalDependency::new(package))
            .push_importer(importer, type_only);
    }

    /// All module ids in lexicographic order. Reports iterate this so the
    /// output is independent of traversal order.
    pub fn module_ids_sorted(&self) -> Vec<ModuleId> {
        let inner = self.inner.read();
        let mut ids: Vec<_> = inner.modules.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn modules_sorted(&self) -> Vec<Arc<Module>> {
        let inner = self.inner.read();
        let mut modules: Vec<_> = inner.modules.values().cloned().collect();
        modules.sort_by(|a, b| a.id.cmp(&b.id));
        modules
    }

    /// External packages referenced anywhere in the graph, sorted by name.
    pub fn external_dependencies(&self) -> Vec<ExternalDependency> {
        let inner = self.inner.read();
        let mut deps: Vec<_> = inner.external_deps.values().cloned().collect();
        deps.sort_by(|a, b| a.package.cmp(&b.package));
        for dep in &mut deps {
            dep.importers.sort_by(|a, b| a.module.cmp(&b.module));
        }
        deps
    }

    pub fn dependencies_of(&self, id: &ModuleId) -> Vec<ModuleId> {
        let inner = self.inner.read();
        let mut deps: Vec<_> = inner
            .dependencies
            .get(id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        deps.sort();
        deps
    }

    pub fn dependents_of(&self, id: &ModuleId) -> Vec<ModuleId> {
        let inner = self.inner.read();
        let mut deps: Vec<_> = inner
            .dependents
            .get(id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        deps.sort();
        deps
    }

    /// Modules transitively reachable from the entry points via recorded
    /// edges. Graph membership normally coincides with this set; the method
    /// exists so tests can assert it.
    pub fn reachable_set(&self) -> FxHashSet<ModuleId> {
        let inner = self.inner.read();
        let mut seen: FxHashSet<ModuleId> = FxHashSet::default();
        let mut queue: Vec<ModuleId> = inner.entry_points.iter().cloned().collect();

        while let Some(id) = queue.pop() {
            if !seen.insert(id.clone()) {
                continue;
            }
            if let Some(targets) = inner.dependencies.get(&id) {
                queue.extend(targets.iter().cloned());
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Module, SourceType};

    fn module(path: &str) -> Module {
        Module::builder(ModuleId::from_normalized(path), SourceType::TypeScript).build()
    }

    #[test]
    fn insertion_is_owner_wins() {
        let graph = ModuleGraph::new();
        let first = Module::builder(
            ModuleId::from_normalized("/p/a.ts"),
            SourceType::TypeScript,
        )
        .entry(true)
        .build();

        assert!(graph.insert_module(first));
        assert!(!graph.insert_module(module("/p/a.ts")));

        // The first insertion survives.
        let stored = graph.module(&ModuleId::from_normalized("/p/a.ts")).unwrap();
        assert!(stored.is_entry);
    }

    #[test]
    fn edges_maintain_both_directions() {
        let graph = ModuleGraph::new();
        graph.insert_module(module("/p/a.ts"));
        graph.insert_module(module("/p/b.ts"));
        let a = ModuleId::from_normalized("/p/a.ts");
        let b = ModuleId::from_normalized("/p/b.ts");
        graph.add_edge(a.clone(), b.clone());

        assert_eq!(graph.dependencies_of(&a), vec![b.clone()]);
        assert_eq!(graph.dependents_of(&b), vec![a]);
    }

    #[test]
    fn reachability_follows_edges_from_entries() {
        let graph = ModuleGraph::new();
        graph.insert_module(module("/p/a.ts"));
        graph.insert_module(module("/p/b.ts"));
        graph.insert_module(module("/p/c.ts"));
        let a = ModuleId::from_normalized("/p/a.ts");
        let b = ModuleId::from_normalized("/p/b.ts");
        graph.mark_entry(a.clone());
        graph.add_edge(a.clone(), b.clone());

        let reachable = graph.reachable_set();
        assert!(reachable.contains(&a));
        assert!(reachable.contains(&b));
        assert!(!reachable.contains(&ModuleId::from_normalized("/p/c.ts")));
    }

    #[test]
    fn cycles_are_legal() {
        let graph = ModuleGraph::new();
        graph.insert_module(module("/p/a.ts"));
        graph.insert_module(module("/p/b.ts"));
        let a = ModuleId::from_normalized("/p/a.ts");
        let b = ModuleId::from_normalized("/p/b.ts");
        graph.mark_entry(a.clone());
        graph.add_edge(a.clone(), b.clone());
        graph.add_edge(b.clone(), a.clone());

        let reachable = graph.reachable_set();
        assert_eq!(reachable.len(), 2);
    }

    #[test]
    fn external_importers_are_recorded() {
        let graph = ModuleGraph::new();
        let a = ModuleId::from_normalized("/p/a.ts");
        graph.record_external("lodash", a.clone(), false);
        graph.record_external("lodash", ModuleId::from_normalized("/p/b.ts"), true);

        let deps = graph.external_dependencies();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].package, "lodash");
        assert_eq!(deps[0].importers.len(), 2);
        assert!(!deps[0].is_type_only());
    }

    #[test]
    fn sorted_views_are_deterministic() {
        let graph = ModuleGraph::new();
        graph.insert_module(module("/p/z.ts"));
        graph.insert_module(module("/p/a.ts"));
        let ids = graph.module_ids_sorted();
        assert_eq!(ids[0], ModuleId::from_normalized("/p/a.ts"));
        assert_eq!(ids[1], ModuleId::from_normalized("/p/z.ts"));
    }
}
