use serde::{Deserialize, Serialize};

use super::{ModuleId, SourceSpan};

/// One named binding pulled in by an import statement.
///
/// `imported` is the name as exported by the target module, `local` the
/// binding introduced in the referrer. They differ for aliased imports
/// (`import { up as north } from './dir'`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedImport {
    pub imported: String,
    pub local: String,
}

impl NamedImport {
    pub fn new(imported: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            imported: imported.into(),
            local: local.into(),
        }
    }

    /// Shorthand for the common unaliased case.
    pub fn plain(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            imported: name.clone(),
            local: name,
        }
    }
}

/// What an import statement binds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportedNames {
    /// `import { a, b as c } from 'mod'` — default imports appear here under
    /// the name `default`.
    Named(Vec<NamedImport>),
    /// `import * as ns from 'mod'` with the local binding name.
    Namespace(String),
    /// `import 'mod'` — evaluated for effect, binds nothing.
    SideEffect,
}

impl ImportedNames {
    pub fn is_side_effect(&self) -> bool {
        matches!(self, Self::SideEffect)
    }

    pub fn is_namespace(&self) -> bool {
        matches!(self, Self::Namespace(_))
    }

    /// Local binding introduced for a given imported name, if any.
    pub fn local_for(&self, imported: &str) -> Option<&str> {
        match self {
            Self::Named(names) => names
                .iter()
                .find(|n| n.imported == imported)
                .map(|n| n.local.as_str()),
            _ => None,
        }
    }
}

/// Outcome of resolving an import specifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// Resolved to a file inside the project.
    Internal(ModuleId),
    /// Resolved to an installed package; `subpath` is the part after the
    /// package name (`lodash/fp` → package `lodash`, subpath `fp`).
    External {
        package: String,
        subpath: Option<String>,
    },
    /// Could not be resolved; recorded as a warning, never fatal.
    Unresolved,
}

impl Resolution {
    pub fn internal(&self) -> Option<&ModuleId> {
        match self {
            Self::Internal(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Self::External { .. })
    }
}

/// A dependency edge as written in the referrer, with its resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    /// The specifier exactly as written in source.
    pub specifier: String,
    pub names: ImportedNames,
    pub resolution: Resolution,
    pub is_type_only: bool,
    /// `import()` expression with a string-literal argument.
    pub is_dynamic: bool,
    /// `export { x } from 'mod'` / `export * from 'mod'` — the binding is
    /// forwarded, not consumed.
    pub is_reexport: bool,
    pub span: SourceSpan,
}

impl Import {
    pub fn new(specifier: impl Into<String>, names: ImportedNames) -> Self {
        Self {
            specifier: specifier.into(),
            names,
            resolution: Resolution::Unresolved,
            is_type_only: false,
            is_dynamic: false,
            is_reexport: false,
            span: SourceSpan::default(),
        }
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn type_only(mut self) -> Self {
        self.is_type_only = true;
        self
    }

    pub fn dynamic(mut self) -> Self {
        self.is_dynamic = true;
        self
    }

    pub fn reexport(mut self) -> Self {
        self.is_reexport = true;
        self
    }

    pub fn is_side_effect_only(&self) -> bool {
        self.names.is_side_effect() && !self.is_reexport
    }
}
