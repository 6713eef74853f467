//! # shears-workspace
//!
//! The workspace layer: package.json manifests, monorepo enumeration and
//! project-file collection. The enumerator produces workspaces ordered so
//! that any workspace appears before its ancestors — dependency attribution
//! relies on that order to bind packages to the nearest declaring manifest.

pub mod collect;
pub mod enumerate;
pub mod manifest;

pub use collect::{
    apply_manifest_entries, collect_project_files, CollectError, FileOrigin, ProjectFiles,
    DEFAULT_ENTRY_PATTERNS, DEFAULT_PROJECT_PATTERNS,
};
pub use enumerate::{enumerate_workspaces, Workspace, WorkspaceError};
pub use manifest::{
    extract_package_name, extract_subpath, BinField, DependencyKind, ManifestError, PackageJson,
    WorkspacesField,
};
