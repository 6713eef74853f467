//! # shears-plugins
//!
//! Plugins teach the core where third-party tools keep their configuration
//! and entry files, and which dependencies those tools pull in implicitly.
//! A plugin is pure data plus an optional pure `resolve` function over a
//! parsed config file — the catalog is a compile-time table, and enablement
//! is a predicate over the workspace manifest.

pub mod catalog;
pub mod host;
pub mod plugin;

pub use catalog::{find_plugin, plugin_names, CATALOG};
pub use host::{run_plugins, strip_json_comments, PluginResult};
pub use plugin::{Plugin, PluginOutput};
