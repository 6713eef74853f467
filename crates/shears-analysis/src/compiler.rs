//! Optional pre-transforms for non-standard extensions.
//!
//! `.astro`, `.mdx`, `.vue` and `.svelte` files route through a registered
//! [`Compiler`] that produces synthetic source the analyzer can read. With
//! no compiler registered for a type, such a file is a reachable leaf: its
//! imports are opaque but it is never reported unused.

use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;

use shears_graph::SourceType;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("compile failed: {0}")]
    Failed(String),
}

/// Transforms one non-standard source text into analyzable JS/TS.
pub trait Compiler: Send + Sync {
    /// The source type the synthetic output should be analyzed as.
    fn output_type(&self) -> SourceType {
        SourceType::TypeScript
    }

    fn compile(&self, source: &str) -> Result<String, CompileError>;
}

/// Registry of compilers keyed by source type.
#[derive(Clone, Default)]
pub struct CompilerRegistry {
    compilers: FxHashMap<SourceType, Arc<dyn Compiler>>,
}

impl CompilerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: SourceType, compiler: Arc<dyn Compiler>) {
        self.compilers.insert(kind, compiler);
    }

    pub fn get(&self, kind: SourceType) -> Option<&Arc<dyn Compiler>> {
        self.compilers.get(&kind)
    }
}

impl std::fmt::Debug for CompilerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilerRegistry")
            .field("types", &self.compilers.keys().collect::<Vec<_>>())
            .finish()
    }
}
