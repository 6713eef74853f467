//! # shears-config
//!
//! The normalized configuration tree the core operates on. Surface formats
//! (JSON, JSONC, the `shears` field in package.json) are flattened into a
//! [`ShearsConfig`] before analysis starts; unknown top-level keys are fatal
//! so typos cannot silently disable a rule.

mod config;
mod error;
mod filter;
mod matcher;

pub use config::{
    IgnoreExportsUsedInFile, PluginToggle, ShearsConfig, WorkspaceConfig, WorkspaceOverrides,
};
pub use error::{ConfigError, Result};
pub use filter::{IssueKind, ReportFilter, DEFAULT_ISSUE_KINDS};
pub use matcher::NameMatcher;
