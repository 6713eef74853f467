//! Fixture analyzer for tests and embedders.
//!
//! Maps absolute paths to prepared [`FileAnalysis`] values; anything not in
//! the map analyzes as an empty module.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rustc_hash::FxHashMap;

use shears_graph::SourceType;

use crate::analyzer::{AnalyzeError, Analyzer, FileAnalysis};

#[derive(Debug, Default)]
pub struct FixtureAnalyzer {
    files: FxHashMap<PathBuf, FileAnalysis>,
    /// Paths that should fail with a parse error.
    failures: Vec<PathBuf>,
}

impl FixtureAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, analysis: FileAnalysis) -> Self {
        self.files.insert(path.into(), analysis);
        self
    }

    pub fn with_failure(mut self, path: impl Into<PathBuf>) -> Self {
        self.failures.push(path.into());
        self
    }
}

#[async_trait]
impl Analyzer for FixtureAnalyzer {
    async fn analyze(
        &self,
        path: &Path,
        _kind: SourceType,
    ) -> Result<FileAnalysis, AnalyzeError> {
        if self.failures.iter().any(|p| p == path) {
            return Err(AnalyzeError::Parse {
                path: path.to_path_buf(),
                message: "fixture parse failure".to_string(),
            });
        }
        Ok(self.files.get(path).cloned().unwrap_or_default())
    }

    async fn analyze_source(
        &self,
        _source: &str,
        virtual_path: &Path,
        kind: SourceType,
    ) -> Result<FileAnalysis, AnalyzeError> {
        self.analyze(virtual_path, kind).await
    }
}
