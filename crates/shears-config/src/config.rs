//! The normalized configuration tree.
//!
//! One document configures the whole run; per-workspace overrides layer on
//! top of the root values. Plugin toggles are top-level keys named after the
//! plugin, which is why parsing needs the catalog's name list: any leftover
//! key that is not a known plugin is a hard error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, Result};
use crate::matcher::NameMatcher;

/// Keys the core understands at the top level, besides plugin names.
const KNOWN_KEYS: [&str; 9] = [
    "entry",
    "project",
    "ignore",
    "ignoreDependencies",
    "ignoreBinaries",
    "ignoreExportsUsedInFile",
    "includeEntryExports",
    "paths",
    "workspaces",
];

/// `ignoreExportsUsedInFile`: a blanket bool or a per-kind map
/// (`{"enumMembers": true}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IgnoreExportsUsedInFile {
    All(bool),
    PerKind(BTreeMap<String, bool>),
}

impl Default for IgnoreExportsUsedInFile {
    fn default() -> Self {
        Self::All(false)
    }
}

impl IgnoreExportsUsedInFile {
    /// Whether in-file usage suppresses reporting for an export kind
    /// (`"exports"`, `"enumMembers"`, `"classMembers"`).
    pub fn applies_to(&self, kind: &str) -> bool {
        match self {
            Self::All(flag) => *flag,
            Self::PerKind(map) => map.get(kind).copied().unwrap_or(false),
        }
    }
}

/// Per-plugin toggle: force on/off, or override its glob sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginToggle {
    Enabled(bool),
    Overrides {
        #[serde(default)]
        config: Vec<String>,
        #[serde(default)]
        entry: Vec<String>,
        #[serde(default)]
        project: Vec<String>,
    },
}

impl PluginToggle {
    pub fn is_forced_off(&self) -> bool {
        matches!(self, Self::Enabled(false))
    }

    pub fn is_forced_on(&self) -> bool {
        !matches!(self, Self::Enabled(false))
    }
}

/// Overrides a workspace may layer over the root configuration. `None`
/// inherits the root value; a present value replaces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorkspaceOverrides {
    pub entry: Option<Vec<String>>,
    pub project: Option<Vec<String>>,
    pub ignore: Option<Vec<String>>,
    pub ignore_dependencies: Option<Vec<String>>,
    pub ignore_binaries: Option<Vec<String>>,
    pub include_entry_exports: Option<bool>,
}

/// The parsed root configuration document.
#[derive(Debug, Clone, Default)]
pub struct ShearsConfig {
    pub entry: Vec<String>,
    pub project: Vec<String>,
    pub ignore: Vec<String>,
    pub ignore_dependencies: Vec<String>,
    pub ignore_binaries: Vec<String>,
    pub ignore_exports_used_in_file: IgnoreExportsUsedInFile,
    pub include_entry_exports: bool,
    /// Path-alias map supplementing any compiler config,
    /// `{"@lib/*": ["src/lib/*"]}`.
    pub paths: BTreeMap<String, Vec<String>>,
    /// Per-workspace overrides keyed by workspace-relative directory glob.
    pub workspaces: BTreeMap<String, WorkspaceOverrides>,
    /// Plugin toggles keyed by plugin name.
    pub plugins: BTreeMap<String, PluginToggle>,
}

impl ShearsConfig {
    /// Parse a configuration document.
    ///
    /// `known_plugins` is the catalog's name list; top-level keys that are
    /// neither recognized nor a plugin name abort the run.
    pub fn from_value(value: Value, known_plugins: &[&str]) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(ConfigError::NotAnObject);
        };

        let mut config = ShearsConfig::default();

        for (key, value) in map {
            match key.as_str() {
                "entry" => config.entry = string_list(&key, value)?,
                "project" => config.project = string_list(&key, value)?,
                "ignore" => config.ignore = string_list(&key, value)?,
                "ignoreDependencies" => config.ignore_dependencies = string_list(&key, value)?,
                "ignoreBinaries" => config.ignore_binaries = string_list(&key, value)?,
                "ignoreExportsUsedInFile" => {
                    config.ignore_exports_used_in_file =
                        parse_field(&key, value)?
                }
                "includeEntryExports" => {
                    config.include_entry_exports = parse_field(&key, value)?
                }
                "paths" => config.paths = parse_field(&key, value)?,
                "workspaces" => config.workspaces = parse_field(&key, value)?,
                _ if known_plugins.contains(&key.as_str()) => {
                    let toggle = parse_field(&key, value)?;
                    config.plugins.insert(key.clone(), toggle);
                }
                _ => return Err(ConfigError::UnknownKey(key.clone())),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Compile the name patterns once so bad regexes fail before analysis.
    fn validate(&self) -> Result<()> {
        NameMatcher::compile(&self.ignore_dependencies)?;
        NameMatcher::compile(&self.ignore_binaries)?;
        Ok(())
    }

    /// The effective configuration for a workspace at `relative_dir`,
    /// root values layered with the longest matching override entry.
    pub fn for_workspace(&self, relative_dir: &str) -> WorkspaceConfig {
        let overrides = self
            .workspaces
            .iter()
            .filter(|(pattern, _)| workspace_pattern_matches(pattern, relative_dir))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(_, overrides)| overrides.clone())
            .unwrap_or_default();

        WorkspaceConfig {
            entry: overrides.entry.unwrap_or_else(|| self.entry.clone()),
            project: overrides.project.unwrap_or_else(|| self.project.clone()),
            ignore: overrides.ignore.unwrap_or_else(|| self.ignore.clone()),
            ignore_dependencies: overrides
                .ignore_dependencies
                .unwrap_or_else(|| self.ignore_dependencies.clone()),
            ignore_binaries: overrides
                .ignore_binaries
                .unwrap_or_else(|| self.ignore_binaries.clone()),
            ignore_exports_used_in_file: self.ignore_exports_used_in_file.clone(),
            include_entry_exports: overrides
                .include_entry_exports
                .unwrap_or(self.include_entry_exports),
            paths: self.paths.clone(),
            plugins: self.plugins.clone(),
        }
    }
}

/// Resolved configuration for one workspace.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceConfig {
    pub entry: Vec<String>,
    pub project: Vec<String>,
    pub ignore: Vec<String>,
    pub ignore_dependencies: Vec<String>,
    pub ignore_binaries: Vec<String>,
    pub ignore_exports_used_in_file: IgnoreExportsUsedInFile,
    pub include_entry_exports: bool,
    pub paths: BTreeMap<String, Vec<String>>,
    pub plugins: BTreeMap<String, PluginToggle>,
}

impl WorkspaceConfig {
    pub fn ignore_dependencies_matcher(&self) -> Result<NameMatcher> {
        NameMatcher::compile(&self.ignore_dependencies)
    }

    pub fn ignore_binaries_matcher(&self) -> Result<NameMatcher> {
        NameMatcher::compile(&self.ignore_binaries)
    }
}

/// `workspaces` keys support a trailing `/*` wildcard (`packages/*`);
/// anything else is an exact relative-directory match. `.` addresses the
/// root workspace.
fn workspace_pattern_matches(pattern: &str, relative_dir: &str) -> bool {
    if pattern == relative_dir {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix("/*") {
        if let Some(rest) = relative_dir.strip_prefix(prefix) {
            let rest = rest.strip_prefix('/').unwrap_or(rest);
            return !rest.is_empty() && !rest.contains('/');
        }
    }
    false
}

fn string_list(key: &str, value: Value) -> Result<Vec<String>> {
    match value {
        Value::String(s) => Ok(vec![s]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("expected string, got {other}"),
                }),
            })
            .collect(),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected string or array of strings, got {other}"),
        }),
    }
}

fn parse_field<T: serde::de::DeserializeOwned>(key: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_the_full_key_table() {
        let value = json!({
            "entry": ["src/index.ts"],
            "project": ["src/**/*.ts", "!src/**/*.d.ts"],
            "ignore": ["**/generated/**"],
            "ignoreDependencies": ["lodash", "/@internal\\/.*/"],
            "ignoreBinaries": ["docker"],
            "ignoreExportsUsedInFile": {"enumMembers": true},
            "includeEntryExports": true,
            "paths": {"@lib/*": ["src/lib/*"]},
            "workspaces": {"packages/*": {"entry": ["index.ts"]}},
            "jest": false
        });

        let config = ShearsConfig::from_value(value, &["jest"]).unwrap();
        assert_eq!(config.entry, vec!["src/index.ts"]);
        assert_eq!(config.project.len(), 2);
        assert!(config.include_entry_exports);
        assert!(config.ignore_exports_used_in_file.applies_to("enumMembers"));
        assert!(!config.ignore_exports_used_in_file.applies_to("exports"));
        assert!(config.plugins["jest"].is_forced_off());
    }

    #[test]
    fn unknown_key_is_fatal() {
        let err = ShearsConfig::from_value(json!({"entires": []}), &[]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey(key) if key == "entires"));
    }

    #[test]
    fn unknown_plugin_name_is_fatal_too() {
        let err = ShearsConfig::from_value(json!({"jset": false}), &["jest"]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey(_)));
    }

    #[test]
    fn single_string_promotes_to_list() {
        let config = ShearsConfig::from_value(json!({"entry": "src/main.ts"}), &[]).unwrap();
        assert_eq!(config.entry, vec!["src/main.ts"]);
    }

    #[test]
    fn bad_ignore_pattern_fails_at_parse_time() {
        let err =
            ShearsConfig::from_value(json!({"ignoreDependencies": ["/(/"]}), &[]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn workspace_overrides_layer_on_root() {
        let value = json!({
            "entry": ["src/index.ts"],
            "ignoreDependencies": ["root-only"],
            "workspaces": {
                "packages/*": {"entry": ["lib/main.ts"]},
                "packages/special": {"entry": ["custom.ts"]}
            }
        });
        let config = ShearsConfig::from_value(value, &[]).unwrap();

        let plain = config.for_workspace("packages/a");
        assert_eq!(plain.entry, vec!["lib/main.ts"]);
        assert_eq!(plain.ignore_dependencies, vec!["root-only"]);

        // Longest pattern wins.
        let special = config.for_workspace("packages/special");
        assert_eq!(special.entry, vec!["custom.ts"]);

        let root = config.for_workspace(".");
        assert_eq!(root.entry, vec!["src/index.ts"]);
    }

    #[test]
    fn wildcard_matches_single_level_only() {
        assert!(workspace_pattern_matches("packages/*", "packages/a"));
        assert!(!workspace_pattern_matches("packages/*", "packages/a/b"));
        assert!(!workspace_pattern_matches("packages/*", "packages"));
    }

    #[test]
    fn round_trip_of_normalized_tree() {
        let value = json!({
            "entry": ["src/index.ts"],
            "ignoreExportsUsedInFile": true,
            "workspaces": {"apps/web": {"project": ["**/*.tsx"]}}
        });
        let first = ShearsConfig::from_value(value.clone(), &[]).unwrap();
        let second = ShearsConfig::from_value(value, &[]).unwrap();
        assert_eq!(first.entry, second.entry);
        assert_eq!(first.workspaces, second.workspaces);
        assert_eq!(
            first.ignore_exports_used_in_file,
            second.ignore_exports_used_in_file
        );
    }
}
