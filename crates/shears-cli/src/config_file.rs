//! Configuration discovery.
//!
//! The normalized tree can live in `shears.json`, `shears.jsonc`, or the
//! `"shears"` field of the root package.json. First hit wins; no file at
//! all means an all-defaults run.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use shears_config::ShearsConfig;
use shears_plugins::{plugin_names, strip_json_comments};

const CONFIG_FILES: [&str; 2] = ["shears.json", "shears.jsonc"];

pub fn load_config(root: &Path) -> Result<ShearsConfig> {
    let known = plugin_names();

    for name in CONFIG_FILES {
        let path = root.join(name);
        if !path.is_file() {
            continue;
        }
        debug!(config = %path.display(), "loading configuration");
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&strip_json_comments(&content))
            .with_context(|| format!("invalid JSON in {}", path.display()))?;
        return ShearsConfig::from_value(value, &known)
            .with_context(|| format!("invalid configuration in {}", path.display()));
    }

    // Fall back to the package.json field.
    let manifest_path = root.join("package.json");
    if manifest_path.is_file() {
        let content = std::fs::read_to_string(&manifest_path)
            .with_context(|| format!("cannot read {}", manifest_path.display()))?;
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&content) {
            if let Some(section) = value.get("shears") {
                debug!("loading configuration from package.json#shears");
                return ShearsConfig::from_value(section.clone(), &known)
                    .context("invalid configuration in package.json#shears");
            }
        }
    }

    Ok(ShearsConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert!(config.entry.is_empty());
    }

    #[test]
    fn shears_json_wins_over_package_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("shears.json"),
            r#"{"entry": ["src/cli.ts"]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"shears": {"entry": ["other.ts"]}}"#,
        )
        .unwrap();

        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.entry, vec!["src/cli.ts"]);
    }

    #[test]
    fn package_json_field_is_honored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"name": "x", "shears": {"entry": ["src/main.ts"]}}"#,
        )
        .unwrap();

        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.entry, vec!["src/main.ts"]);
    }

    #[test]
    fn jsonc_comments_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("shears.jsonc"),
            "{\n  // entries\n  \"entry\": [\"src/index.ts\"]\n}",
        )
        .unwrap();

        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.entry, vec!["src/index.ts"]);
    }

    #[test]
    fn unknown_key_aborts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("shears.json"), r#"{"entires": []}"#).unwrap();
        assert!(load_config(dir.path()).is_err());
    }
}
