//! # shears-analysis
//!
//! The analysis pipeline: seed entries, build the module graph through the
//! [`Analyzer`] seam, attribute external references to workspaces, scan
//! package scripts for binaries, and classify the six issue categories.
//!
//! The pipeline is a pure function of the filesystem state: running it twice
//! over an unchanged tree yields byte-identical reports. Determinism comes
//! from sorting at the classifier boundary, never from traversal order.

pub mod analyzer;
pub mod attribution;
pub mod binaries;
pub mod classifier;
pub mod compiler;
pub mod fixture;
pub mod libs;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod walker;

pub use analyzer::{AnalyzeError, Analyzer, FileAnalysis};
pub use attribution::{
    attribute, owning_workspace, types_package_for, AttributionOutcome, DependencyRef,
    RefSource, UnlistedDependency,
};
pub use binaries::{
    scan_commands, scan_scripts, Binary, BinaryResolution, ScriptScan, IGNORED_GLOBAL_BINARIES,
};
pub use classifier::{classify, ClassifierInput};
pub use compiler::{CompileError, Compiler, CompilerRegistry};
pub use fixture::FixtureAnalyzer;
pub use libs::inspect_libraries;
pub use pipeline::{run_pipeline, AnalysisError, AnalysisOptions};
pub use report::{BinaryIssue, DependencyIssue, ExportIssue, FileIssue, Report};
pub use resolver::{is_node_builtin, ModuleResolver, ResolverContext, WorkspaceTarget};
pub use walker::{GraphWalker, WalkOutcome};
