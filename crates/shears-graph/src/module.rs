use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{Export, Import, ModuleId};

/// Source type derived from file extensions.
///
/// The last four require a configured compiler before the analyzer can read
/// them; without one such a file is a reachable leaf with opaque imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    JavaScript,
    TypeScript,
    Jsx,
    Tsx,
    Json,
    Astro,
    Mdx,
    Vue,
    Svelte,
    Unknown,
}

impl SourceType {
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "js" | "mjs" | "cjs" => Self::JavaScript,
            "ts" | "mts" | "cts" => Self::TypeScript,
            "jsx" => Self::Jsx,
            "tsx" => Self::Tsx,
            "json" => Self::Json,
            "astro" => Self::Astro,
            "mdx" | "md" => Self::Mdx,
            "vue" => Self::Vue,
            "svelte" => Self::Svelte,
            _ => Self::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(Self::Unknown, Self::from_extension)
    }

    pub fn is_javascript_like(&self) -> bool {
        matches!(
            self,
            Self::JavaScript | Self::TypeScript | Self::Jsx | Self::Tsx
        )
    }

    /// File types that need a pre-transform before syntactic analysis.
    pub fn needs_compiler(&self) -> bool {
        matches!(self, Self::Astro | Self::Mdx | Self::Vue | Self::Svelte)
    }
}

/// A project file that participates in the graph.
///
/// Import and export collections are wrapped in `Arc` so cloning a module out
/// of the graph stays cheap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub source_type: SourceType,
    pub imports: Arc<Vec<Import>>,
    pub exports: Arc<Vec<Export>>,
    /// Property accesses on imported bindings, as `(local binding, member)`
    /// pairs. Feeds enum/class member reference counting.
    pub member_accesses: Arc<Vec<(String, String)>>,
    pub is_entry: bool,
    /// Analyzer failed on this file; it contributes no edges but still
    /// counts as reached.
    pub parse_failed: bool,
}

impl Module {
    pub fn builder(id: ModuleId, source_type: SourceType) -> ModuleBuilder {
        ModuleBuilder {
            module: Module {
                id,
                source_type,
                imports: Arc::new(Vec::new()),
                exports: Arc::new(Vec::new()),
                member_accesses: Arc::new(Vec::new()),
                is_entry: false,
                parse_failed: false,
            },
        }
    }

    pub fn imports_iter(&self) -> impl Iterator<Item = &Import> {
        self.imports.iter()
    }

    pub fn exports_iter(&self) -> impl Iterator<Item = &Export> {
        self.exports.iter()
    }

    /// Mutable access to exports; copies on write only when shared.
    pub fn exports_mut(&mut self) -> &mut Vec<Export> {
        Arc::make_mut(&mut self.exports)
    }

    /// Imports whose resolution points at `target`.
    pub fn imports_of<'a>(&'a self, target: &'a ModuleId) -> impl Iterator<Item = &'a Import> + 'a {
        self.imports
            .iter()
            .filter(move |import| import.resolution.internal() == Some(target))
    }
}

/// Builder mirroring the field order of [`Module`].
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn imports(mut self, imports: Vec<Import>) -> Self {
        self.module.imports = Arc::new(imports);
        self
    }

    pub fn exports(mut self, exports: Vec<Export>) -> Self {
        self.module.exports = Arc::new(exports);
        self
    }

    pub fn member_accesses(mut self, accesses: Vec<(String, String)>) -> Self {
        self.module.member_accesses = Arc::new(accesses);
        self
    }

    pub fn entry(mut self, is_entry: bool) -> Self {
        self.module.is_entry = is_entry;
        self
    }

    pub fn parse_failed(mut self, failed: bool) -> Self {
        self.module.parse_failed = failed;
        self
    }

    pub fn build(self) -> Module {
        self.module
    }
}
