//! Module graph construction.
//!
//! Breadth-first from the entry set: analyze every file of the current
//! frontier concurrently, resolve the discovered imports, record edges, and
//! queue unseen internal targets for the next round. The visited set is
//! owner-wins, so a file analyzed by one round is never analyzed again.
//!
//! A file the analyzer cannot parse still enters the graph as a reachable
//! leaf; reporting it unused on top of the parse warning would double-count
//! the problem.

use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use shears_core::{Diagnostics, Runtime, Warning};
use shears_graph::{Module, ModuleGraph, ModuleId, Resolution, SourceType};

use crate::analyzer::{AnalyzeError, Analyzer, FileAnalysis};
use crate::compiler::CompilerRegistry;
use crate::resolver::{is_node_builtin, ModuleResolver};

/// Everything the walk produced besides the graph itself.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub graph: ModuleGraph,
    /// Command-like strings found in source, with the module they came from.
    pub script_refs: Vec<(ModuleId, String)>,
}

pub struct GraphWalker {
    runtime: Arc<dyn Runtime>,
    analyzer: Arc<dyn Analyzer>,
    compilers: CompilerRegistry,
    resolver: Arc<ModuleResolver>,
    diagnostics: Diagnostics,
    concurrency: usize,
    /// Advisory per-file analysis cache keyed by (mtime, size); safe to
    /// discard at any time.
    analysis_cache: DashMap<std::path::PathBuf, (Option<SystemTime>, u64, Arc<FileAnalysis>)>,
}

impl GraphWalker {
    pub fn new(
        runtime: Arc<dyn Runtime>,
        analyzer: Arc<dyn Analyzer>,
        compilers: CompilerRegistry,
        resolver: Arc<ModuleResolver>,
        diagnostics: Diagnostics,
    ) -> Self {
        let concurrency = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            runtime,
            analyzer,
            compilers,
            resolver,
            diagnostics,
            concurrency,
            analysis_cache: DashMap::new(),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Build the module graph from the entry set.
    pub async fn build(&self, entries: &[ModuleId]) -> WalkOutcome {
        let graph = ModuleGraph::new();
        let mut script_refs = Vec::new();

        let entry_set: FxHashSet<ModuleId> = entries.iter().cloned().collect();
        let mut visited: FxHashSet<ModuleId> = FxHashSet::default();
        let mut frontier: Vec<ModuleId> = Vec::new();

        for entry in &entry_set {
            graph.mark_entry(entry.clone());
            if visited.insert(entry.clone()) {
                frontier.push(entry.clone());
            }
        }
        frontier.sort();

        while !frontier.is_empty() {
            debug!(files = frontier.len(), "walking frontier");

            let analyses: Vec<(ModuleId, Result<Arc<FileAnalysis>, AnalyzeError>)> =
                stream::iter(frontier.drain(..))
                    .map(|id| async move {
                        let analysis = self.analyze_file(&id).await;
                        (id, analysis)
                    })
                    .buffer_unordered(self.concurrency)
                    .collect()
                    .await;

            let mut next: Vec<ModuleId> = Vec::new();

            for (id, result) in analyses {
                let is_entry = entry_set.contains(&id);
                match result {
                    Ok(analysis) => {
                        let mut imports = analysis.imports.clone();

                        for import in &mut imports {
                            let resolution =
                                self.resolver.resolve(&import.specifier, id.as_path());
                            match &resolution {
                                Resolution::Internal(target) => {
                                    graph.add_edge(id.clone(), target.clone());
                                    if visited.insert(target.clone()) {
                                        next.push(target.clone());
                                    }
                                }
                                Resolution::External { package, .. } => {
                                    if !is_node_builtin(package) {
                                        graph.record_external(
                                            package,
                                            id.clone(),
                                            import.is_type_only,
                                        );
                                    }
                                }
                                Resolution::Unresolved => {
                                    self.diagnostics.push(Warning::Resolution {
                                        specifier: import.specifier.clone(),
                                        from: id.as_path().to_path_buf(),
                                    });
                                }
                            }
                            import.resolution = resolution;
                        }

                        for script in &analysis.script_refs {
                            script_refs.push((id.clone(), script.clone()));
                        }

                        let module =
                            Module::builder(id.clone(), SourceType::from_path(id.as_path()))
                                .imports(imports)
                                .exports(analysis.exports.clone())
                                .member_accesses(analysis.member_accesses.clone())
                                .entry(is_entry)
                                .build();
                        graph.insert_module(module);
                    }
                    Err(err) => {
                        warn!(file = %id, error = %err, "analysis failed");
                        self.diagnostics.push(Warning::Parse {
                            path: id.as_path().to_path_buf(),
                            message: err.to_string(),
                        });
                        let module =
                            Module::builder(id.clone(), SourceType::from_path(id.as_path()))
                                .entry(is_entry)
                                .parse_failed(true)
                                .build();
                        graph.insert_module(module);
                    }
                }
            }

            next.sort();
            frontier = next;
        }

        script_refs.sort();
        WalkOutcome { graph, script_refs }
    }

    /// Analyze one file, consulting the advisory cache first.
    async fn analyze_file(&self, id: &ModuleId) -> Result<Arc<FileAnalysis>, AnalyzeError> {
        let path = id.as_path();
        let kind = SourceType::from_path(path);

        let metadata = self.runtime.metadata(path).await.ok();

        if let (Some(meta), Some(cached)) = (metadata, self.analysis_cache.get(path)) {
            let (mtime, size, analysis) = cached.value();
            if *mtime == meta.modified && *size == meta.size {
                return Ok(Arc::clone(analysis));
            }
        }

        let analysis = Arc::new(self.analyze_fresh(path, kind).await?);
        if let Some(meta) = metadata {
            self.analysis_cache.insert(
                path.to_path_buf(),
                (meta.modified, meta.size, Arc::clone(&analysis)),
            );
        }
        Ok(analysis)
    }

    async fn analyze_fresh(
        &self,
        path: &Path,
        kind: SourceType,
    ) -> Result<FileAnalysis, AnalyzeError> {
        if kind.needs_compiler() {
            let Some(compiler) = self.compilers.get(kind) else {
                // No compiler: the file is a reachable leaf with opaque
                // imports.
                return Ok(FileAnalysis::default());
            };
            let source =
                self.runtime
                    .read_to_string(path)
                    .await
                    .map_err(|err| AnalyzeError::Read {
                        path: path.to_path_buf(),
                        message: err.to_string(),
                    })?;
            let compiled = compiler.compile(&source).map_err(|err| AnalyzeError::Parse {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
            return self
                .analyzer
                .analyze_source(&compiled, path, compiler.output_type())
                .await;
        }

        if kind.is_javascript_like() {
            return self.analyzer.analyze(path, kind).await;
        }

        // JSON and unknown types carry no imports.
        Ok(FileAnalysis::default())
    }
}
