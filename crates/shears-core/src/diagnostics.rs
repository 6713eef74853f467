//! Non-fatal warning collection.
//!
//! Warnings accumulate during a run and are rendered alongside issues; they
//! never abort the pipeline. Fatal conditions (config errors, unreadable
//! workspace manifests) are ordinary `Err` values instead.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

/// A non-fatal condition observed during analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Warning {
    /// An import specifier that could not be resolved to a file or package.
    #[serde(rename_all = "camelCase")]
    Resolution {
        specifier: String,
        from: PathBuf,
    },

    /// The analyzer failed on a file; it contributes no edges but is still
    /// considered reached.
    #[serde(rename_all = "camelCase")]
    Parse {
        path: PathBuf,
        message: String,
    },

    /// A plugin's config file is present but unparseable; that plugin's
    /// resolved contributions were dropped for the workspace.
    #[serde(rename_all = "camelCase")]
    Plugin {
        plugin: String,
        config_path: PathBuf,
        message: String,
    },

    /// A declared workspace root without a readable manifest; the workspace
    /// and its descendants were skipped.
    #[serde(rename_all = "camelCase")]
    Workspace {
        dir: PathBuf,
        message: String,
    },
}

impl Warning {
    /// Stable sort key so reports are deterministic.
    fn sort_key(&self) -> (u8, String) {
        match self {
            Warning::Workspace { dir, .. } => (0, dir.to_string_lossy().into_owned()),
            Warning::Plugin {
                plugin,
                config_path,
                ..
            } => (1, format!("{}:{}", plugin, config_path.display())),
            Warning::Parse { path, .. } => (2, path.to_string_lossy().into_owned()),
            Warning::Resolution { from, specifier } => {
                (3, format!("{}:{}", from.display(), specifier))
            }
        }
    }
}

/// Cheap-to-clone handle to the run's warning sink.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    inner: Arc<Mutex<Vec<Warning>>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, warning: Warning) {
        self.inner.lock().push(warning);
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Drain all warnings in deterministic order.
    pub fn take_sorted(&self) -> Vec<Warning> {
        let mut warnings = std::mem::take(&mut *self.inner.lock());
        warnings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_drain_sorted_and_once() {
        let diagnostics = Diagnostics::new();
        diagnostics.push(Warning::Resolution {
            specifier: "./missing".into(),
            from: PathBuf::from("src/b.ts"),
        });
        diagnostics.push(Warning::Parse {
            path: PathBuf::from("src/a.ts"),
            message: "unexpected token".into(),
        });

        let drained = diagnostics.take_sorted();
        assert_eq!(drained.len(), 2);
        assert!(matches!(drained[0], Warning::Parse { .. }));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn clones_share_the_sink() {
        let diagnostics = Diagnostics::new();
        let clone = diagnostics.clone();
        clone.push(Warning::Workspace {
            dir: PathBuf::from("packages/gone"),
            message: "manifest missing".into(),
        });
        assert_eq!(diagnostics.len(), 1);
    }
}
