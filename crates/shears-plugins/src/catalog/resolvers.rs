//! Pure `resolve` functions for plugins whose config files carry entry
//! paths or package references. Each one receives the parsed JSON of a
//! single config file and extracts what the tool would load.

use serde_json::Value;

use crate::plugin::PluginOutput;

/// Read `value[key]` as a string or array of strings. Array elements that
/// are `[name, options]` tuples contribute their first element.
fn strings_at(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Array(tuple) => tuple.first().and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn is_local_path(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('/') || name.starts_with("<rootDir>")
}

/// Strip Jest's `<rootDir>/` prefix so the path resolves against the config
/// file's directory.
fn strip_root_dir(path: &str) -> String {
    path.trim_start_matches("<rootDir>/")
        .trim_start_matches("<rootDir>")
        .to_string()
}

pub(super) fn babel(config: &Value) -> PluginOutput {
    let mut output = PluginOutput::default();
    for preset in strings_at(config, "presets") {
        if let Some(package) = normalize_babel_name(&preset, "babel-preset-") {
            output.references.push(package);
        }
    }
    for plugin in strings_at(config, "plugins") {
        if let Some(package) = normalize_babel_name(&plugin, "babel-plugin-") {
            output.references.push(package);
        }
    }
    output
}

/// Babel shorthand: a bare name expands with the `babel-preset-` /
/// `babel-plugin-` prefix; scoped and fully-qualified names pass through.
fn normalize_babel_name(name: &str, prefix: &str) -> Option<String> {
    if is_local_path(name) {
        return None;
    }
    if name.starts_with('@') || name.starts_with(prefix) {
        Some(name.to_string())
    } else {
        Some(format!("{prefix}{name}"))
    }
}

pub(super) fn commitlint(config: &Value) -> PluginOutput {
    let mut output = PluginOutput::default();
    for extend in strings_at(config, "extends") {
        if !is_local_path(&extend) {
            output.references.push(extend);
        }
    }
    output
}

pub(super) fn eslint(config: &Value) -> PluginOutput {
    let mut output = PluginOutput::default();

    for extend in strings_at(config, "extends") {
        if let Some(package) = normalize_eslint_extend(&extend) {
            output.references.push(package);
        }
    }
    for plugin in strings_at(config, "plugins") {
        output.references.push(normalize_eslint_plugin(&plugin));
    }
    if let Some(parser) = config.get("parser").and_then(Value::as_str) {
        if !is_local_path(parser) {
            output.references.push(parser.to_string());
        }
    }

    output
}

/// `extends` entries: `eslint:recommended` is builtin, `plugin:x/rule`
/// references `eslint-plugin-x`, a bare name references `eslint-config-x`.
fn normalize_eslint_extend(extend: &str) -> Option<String> {
    if is_local_path(extend) || extend.starts_with("eslint:") {
        return None;
    }
    if let Some(rest) = extend.strip_prefix("plugin:") {
        let name = rest.split('/').next().unwrap_or(rest);
        return Some(normalize_eslint_plugin(name));
    }
    if extend.starts_with('@') {
        // `@company` or `@company/name` resolve to the scope's shared config.
        return Some(extend.to_string());
    }
    if extend.starts_with("eslint-config-") {
        return Some(extend.to_string());
    }
    Some(format!("eslint-config-{extend}"))
}

fn normalize_eslint_plugin(name: &str) -> String {
    if name.starts_with('@') || name.starts_with("eslint-plugin-") {
        name.to_string()
    } else {
        format!("eslint-plugin-{name}")
    }
}

pub(super) fn jest(config: &Value) -> PluginOutput {
    let mut output = PluginOutput::default();

    if let Some(preset) = config.get("preset").and_then(Value::as_str) {
        if !is_local_path(preset) {
            output.references.push(preset.to_string());
        }
    }
    if let Some(environment) = config.get("testEnvironment").and_then(Value::as_str) {
        if !is_local_path(environment) && environment != "node" && environment != "jsdom" {
            output.references.push(environment.to_string());
        }
    }
    for key in ["setupFiles", "setupFilesAfterEnv"] {
        for entry in strings_at(config, key) {
            if is_local_path(&entry) {
                output.entries.push(strip_root_dir(&entry));
            } else {
                output.references.push(entry);
            }
        }
    }
    for key in ["globalSetup", "globalTeardown"] {
        if let Some(path) = config.get(key).and_then(Value::as_str) {
            if is_local_path(path) {
                output.entries.push(strip_root_dir(path));
            }
        }
    }
    if let Some(Value::Object(transform)) = config.get("transform") {
        for target in transform.values() {
            let name = match target {
                Value::String(s) => Some(s.as_str()),
                Value::Array(tuple) => tuple.first().and_then(Value::as_str),
                _ => None,
            };
            if let Some(name) = name {
                if !is_local_path(name) {
                    output.references.push(name.to_string());
                }
            }
        }
    }
    for pattern in strings_at(config, "testMatch") {
        output.entries.push(strip_root_dir(&pattern));
    }
    for pattern in strings_at(config, "testPathIgnorePatterns") {
        output.ignores.push(strip_root_dir(&pattern));
    }

    output
}

pub(super) fn mocha(config: &Value) -> PluginOutput {
    let mut output = PluginOutput::default();
    for require in strings_at(config, "require") {
        if is_local_path(&require) {
            output.entries.push(require);
        } else {
            output.references.push(require);
        }
    }
    for spec in strings_at(config, "spec") {
        output.entries.push(spec);
    }
    output
}

pub(super) fn postcss(config: &Value) -> PluginOutput {
    let mut output = PluginOutput::default();
    if let Some(Value::Object(plugins)) = config.get("plugins") {
        output
            .references
            .extend(plugins.keys().filter(|k| !is_local_path(k)).cloned());
    } else {
        for plugin in strings_at(config, "plugins") {
            if !is_local_path(&plugin) {
                output.references.push(plugin);
            }
        }
    }
    output
}

pub(super) fn prettier(config: &Value) -> PluginOutput {
    let mut output = PluginOutput::default();
    for plugin in strings_at(config, "plugins") {
        if !is_local_path(&plugin) {
            output.references.push(plugin);
        }
    }
    output
}

pub(super) fn release_it(config: &Value) -> PluginOutput {
    let mut output = PluginOutput::default();
    if let Some(Value::Object(plugins)) = config.get("plugins") {
        output
            .references
            .extend(plugins.keys().filter(|k| !is_local_path(k)).cloned());
    }
    output
}

pub(super) fn semantic_release(config: &Value) -> PluginOutput {
    let mut output = PluginOutput::default();
    for plugin in strings_at(config, "plugins") {
        if !is_local_path(&plugin) {
            output.references.push(plugin);
        }
    }
    for extend in strings_at(config, "extends") {
        if !is_local_path(&extend) {
            output.references.push(extend);
        }
    }
    output
}

pub(super) fn stylelint(config: &Value) -> PluginOutput {
    let mut output = PluginOutput::default();
    for extend in strings_at(config, "extends") {
        if !is_local_path(&extend) {
            output.references.push(extend);
        }
    }
    for plugin in strings_at(config, "plugins") {
        if !is_local_path(&plugin) {
            output.references.push(plugin);
        }
    }
    if let Some(syntax) = config.get("customSyntax").and_then(Value::as_str) {
        if !is_local_path(syntax) {
            output.references.push(syntax.to_string());
        }
    }
    output
}

pub(super) fn typescript(config: &Value) -> PluginOutput {
    let mut output = PluginOutput::default();

    if let Some(extends) = config.get("extends") {
        for base in match extends {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        } {
            if !is_local_path(&base) {
                output.references.push(base);
            }
        }
    }

    if let Some(options) = config.get("compilerOptions") {
        for types in strings_at(options, "types") {
            // Bare entries in `types` name packages under `@types/`.
            if types.starts_with('@') || types.contains('/') {
                output.references.push(types);
            } else {
                output.references.push(format!("@types/{types}"));
            }
        }
        if let Some(Value::Array(plugins)) = options.get("plugins") {
            for plugin in plugins {
                if let Some(name) = plugin.get("name").and_then(Value::as_str) {
                    output.references.push(name.to_string());
                }
            }
        }
    }

    output
}
