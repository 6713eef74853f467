//! # shears-graph
//!
//! Pure data structures for the shears module graph: modules, import and
//! export records, and the [`ModuleGraph`] the analysis pipeline builds from
//! them. No I/O lives here; the walker in `shears-analysis` feeds the graph
//! and the classifier reads it back out.
//!
//! A module exists in the graph if and only if it was an entry file or was
//! resolved from a reachable import, so graph membership doubles as the
//! reachability flag. Export reference counts are computed in a single pass
//! after the graph reaches fixpoint — reachability is monotone, an export
//! cannot be "unreached" by later discovery.

pub mod export;
pub mod external_dep;
pub mod graph;
pub mod import;
pub mod module;
pub mod module_id;
pub mod span;
mod usage;

pub use export::{Export, ExportKind};
pub use external_dep::ExternalDependency;
pub use graph::ModuleGraph;
pub use import::{Import, ImportedNames, NamedImport, Resolution};
pub use module::{Module, ModuleBuilder, SourceType};
pub use module_id::{ModuleId, ModuleIdError};
pub use span::SourceSpan;

/// An export with no remaining consumers, paired with its owning module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedExport {
    pub module_id: ModuleId,
    pub export: Export,
}
