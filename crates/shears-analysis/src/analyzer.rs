//! The syntactic analyzer seam.
//!
//! The core never parses source itself. Everything it needs from a file —
//! imports, exports, member accesses, script-like references — arrives
//! through this trait. `shears-analyzer` provides the default
//! implementation; tests substitute fixtures.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use shears_graph::{Export, Import, SourceType};

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("cannot read {path}: {message}")]
    Read { path: std::path::PathBuf, message: String },

    #[error("parse error in {path}: {message}")]
    Parse { path: std::path::PathBuf, message: String },

    #[error("no analyzer for {0:?} files")]
    Unsupported(SourceType),
}

/// Structured result of analyzing one source file.
///
/// Imports come back with `Resolution::Unresolved`; the walker resolves
/// them. Export reference counts are `None`; the graph fills them in.
#[derive(Debug, Clone, Default)]
pub struct FileAnalysis {
    pub imports: Vec<Import>,
    pub exports: Vec<Export>,
    /// Property accesses on imported bindings: `(local binding, member)`.
    pub member_accesses: Vec<(String, String)>,
    /// Command-like strings found in source (`execa('eslint', ...)`),
    /// fed to the binary analyzer.
    pub script_refs: Vec<String>,
}

#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyze the file at `path`.
    async fn analyze(&self, path: &Path, kind: SourceType)
        -> Result<FileAnalysis, AnalyzeError>;

    /// Analyze already-loaded source, used for compiler-transformed files.
    /// `virtual_path` names the original file for diagnostics.
    async fn analyze_source(
        &self,
        source: &str,
        virtual_path: &Path,
        kind: SourceType,
    ) -> Result<FileAnalysis, AnalyzeError>;
}
