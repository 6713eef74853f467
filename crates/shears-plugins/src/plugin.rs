//! The declarative plugin record.

use serde_json::Value;

/// What a plugin extracted from one parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginOutput {
    /// Entry paths or globs, relative to the config file's directory.
    pub entries: Vec<String>,
    /// External packages the config references (presets, loaders, parsers).
    pub references: Vec<String>,
    /// Ignore hints the tool's config carries (e.g. test path ignores).
    pub ignores: Vec<String>,
}

impl PluginOutput {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.references.is_empty() && self.ignores.is_empty()
    }
}

/// Pure extraction over a parsed config file.
pub type ResolveFn = fn(&Value) -> PluginOutput;

/// One row of the plugin catalog.
///
/// All fields are `'static` pattern data; the only code a plugin carries is
/// its optional `resolve` function, and that is pure.
#[derive(Debug, Clone, Copy)]
pub struct Plugin {
    pub name: &'static str,
    /// Package-name patterns that auto-enable the plugin when any of them
    /// matches a declared dependency of any kind. `*` is a wildcard.
    pub enablers: &'static [&'static str],
    /// Globs locating the tool's configuration files within a workspace.
    pub config_files: &'static [&'static str],
    /// Files the tool itself loads at runtime (test files, setup scripts).
    pub entry_files: &'static [&'static str],
    /// Broader set the tool makes part of the project.
    pub project_files: &'static [&'static str],
    pub resolve: Option<ResolveFn>,
}

impl Plugin {
    /// Does any enabler pattern match this dependency name?
    pub fn enabled_by(&self, dependency: &str) -> bool {
        self.enablers
            .iter()
            .any(|pattern| pattern_matches(pattern, dependency))
    }
}

/// Package-name pattern match: exact, or with `*` matching any run of
/// characters (`@storybook/*`, `*eslint*`).
pub(crate) fn pattern_matches(pattern: &str, name: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == name;
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let mut rest = name;

    // Anchored prefix.
    if let Some(first) = parts.first() {
        if !first.is_empty() {
            match rest.strip_prefix(first) {
                Some(after) => rest = after,
                None => return false,
            }
        }
    }

    // Anchored suffix.
    if parts.len() > 1 {
        if let Some(last) = parts.last() {
            if !last.is_empty() {
                match rest.strip_suffix(last) {
                    Some(before) => rest = before,
                    None => return false,
                }
            }
        }
    }

    // Inner segments in order.
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match rest.find(part) {
            Some(index) => rest = &rest[index + part.len()..],
            None => return false,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_enabler() {
        assert!(pattern_matches("jest", "jest"));
        assert!(!pattern_matches("jest", "jest-cli"));
    }

    #[test]
    fn scoped_wildcard_enabler() {
        assert!(pattern_matches("@storybook/*", "@storybook/react"));
        assert!(!pattern_matches("@storybook/*", "@angular/core"));
    }

    #[test]
    fn infix_wildcard_enabler() {
        assert!(pattern_matches("*eslint*", "eslint"));
        assert!(pattern_matches("*eslint*", "@typescript-eslint/parser"));
        assert!(!pattern_matches("*eslint*", "prettier"));
    }
}
