use serde::{Deserialize, Serialize};

use super::SourceSpan;

/// Export declaration kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportKind {
    /// Runtime value: `export const x`, `export function f`, `export class C`.
    Value,
    /// Type-level only: `export type T`, `export interface I`.
    Type,
    /// `export default ...`; reported under the name `default`.
    Default,
    /// Member of an exported enum; `parent` names the enum.
    EnumMember { parent: String },
    /// Member of an exported class; `parent` names the class.
    ClassMember { parent: String },
    /// `export * from './module'` — forwards every named export of the
    /// source module without consuming any of them.
    NamespaceReExport { source: String },
}

impl ExportKind {
    pub fn is_member(&self) -> bool {
        matches!(self, Self::EnumMember { .. } | Self::ClassMember { .. })
    }

    pub fn member_parent(&self) -> Option<&str> {
        match self {
            Self::EnumMember { parent } | Self::ClassMember { parent } => Some(parent),
            _ => None,
        }
    }
}

/// A single export produced by a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    /// Name inside the module.
    pub local_name: String,
    /// Name visible to importers; differs from `local_name` for
    /// `export { a as b }`.
    pub external_name: String,
    pub kind: ExportKind,
    pub span: SourceSpan,
    /// JSDoc tags attached to the declaration (`public`, `internal`, ...),
    /// stored without the `@`.
    pub tags: Vec<String>,
    /// True when the symbol is also referenced elsewhere in its own file.
    pub used_in_file: bool,
    /// Distinct `(referrer, imported-name)` pairs pointing at this export,
    /// counting namespace and wildcard re-exports transitively. `None`
    /// until the graph-wide usage pass has run.
    pub referenced_count: Option<u32>,
}

impl Export {
    pub fn new(name: impl Into<String>, kind: ExportKind) -> Self {
        let name = name.into();
        Self {
            local_name: name.clone(),
            external_name: name,
            kind,
            span: SourceSpan::default(),
            tags: Vec::new(),
            used_in_file: false,
            referenced_count: None,
        }
    }

    pub fn renamed(mut self, external_name: impl Into<String>) -> Self {
        self.external_name = external_name.into();
        self
    }

    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = span;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn used_in_file(mut self) -> Self {
        self.used_in_file = true;
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn is_default(&self) -> bool {
        matches!(self.kind, ExportKind::Default)
    }

    pub fn is_star_reexport(&self) -> bool {
        matches!(self.kind, ExportKind::NamespaceReExport { .. })
    }

    /// Confirmed-unused after the usage pass.
    pub fn is_unreferenced(&self) -> bool {
        self.referenced_count == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_keeps_local_name() {
        let export = Export::new("internalName", ExportKind::Value).renamed("publicName");
        assert_eq!(export.local_name, "internalName");
        assert_eq!(export.external_name, "publicName");
    }

    #[test]
    fn member_kinds_know_their_parent() {
        let member = Export::new("Up", ExportKind::EnumMember {
            parent: "Direction".into(),
        });
        assert!(member.kind.is_member());
        assert_eq!(member.kind.member_parent(), Some("Direction"));
        assert_eq!(Export::new("x", ExportKind::Value).kind.member_parent(), None);
    }

    #[test]
    fn unreferenced_requires_computed_count() {
        let mut export = Export::new("x", ExportKind::Value);
        assert!(!export.is_unreferenced());
        export.referenced_count = Some(0);
        assert!(export.is_unreferenced());
    }
}
