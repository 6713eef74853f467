use serde::{Deserialize, Serialize};

use super::ModuleId;

/// An external package reference and the modules that import it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalDependency {
    pub package: String,
    pub importers: Vec<ExternalImporter>,
}

/// One import site of an external package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalImporter {
    pub module: ModuleId,
    /// The import contributes only types (`import type ...`).
    pub type_only: bool,
}

impl ExternalDependency {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            importers: Vec::new(),
        }
    }

    pub fn push_importer(&mut self, module: ModuleId, type_only: bool) {
        self.importers.push(ExternalImporter { module, type_only });
    }

    /// True when every import site is type-only.
    pub fn is_type_only(&self) -> bool {
        !self.importers.is_empty() && self.importers.iter().all(|i| i.type_only)
    }
}
