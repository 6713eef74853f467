//! Canonical module identifiers.

use std::borrow::Cow;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModuleIdError {
    #[error("module path is empty")]
    EmptyPath,

    #[error("cannot resolve current directory: {source}")]
    CurrentDir {
        #[source]
        source: io::Error,
    },

    #[error("cannot canonicalize {path}: {source}")]
    Canonicalization {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Canonical identifier for a module in the graph.
///
/// Prefers canonical filesystem paths so modules originating from different
/// user inputs (relative vs absolute, `.` vs `..`) compare equal. Paths that
/// do not exist yet are kept cleaned but uncanonicalized so unit tests can
/// build graphs without touching disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(PathBuf);

impl ModuleId {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ModuleIdError> {
        let path = path.as_ref();

        if path.as_os_str().is_empty() {
            return Err(ModuleIdError::EmptyPath);
        }

        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|source| ModuleIdError::CurrentDir { source })?
                .join(path)
        };

        let cleaned = joined.clean();

        match std::fs::canonicalize(&cleaned) {
            Ok(canonical) => Ok(Self(canonical)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self(cleaned)),
            Err(err) => Err(ModuleIdError::Canonicalization {
                path: cleaned,
                source: err,
            }),
        }
    }

    /// Build an identifier from a path already known to be absolute and
    /// normalized (e.g. produced by the collector). Skips the canonicalize
    /// probe entirely.
    pub fn from_normalized(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path(self) -> PathBuf {
        self.0
    }

    /// Borrow the identifier as a string for logging and report output.
    pub fn path_string(&self) -> Cow<'_, str> {
        self.0.to_string_lossy()
    }

    /// Render the identifier relative to a root, falling back to the
    /// absolute form when the module lives outside it.
    pub fn relative_to(&self, root: &Path) -> String {
        self.0
            .strip_prefix(root)
            .unwrap_or(&self.0)
            .to_string_lossy()
            .into_owned()
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for ModuleId {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(ModuleId::new(""), Err(ModuleIdError::EmptyPath)));
    }

    #[test]
    fn nonexistent_paths_are_cleaned_not_canonicalized() {
        let id = ModuleId::new("/proj/src/../src/index.ts").unwrap();
        assert_eq!(id.as_path(), Path::new("/proj/src/index.ts"));
    }

    #[test]
    fn equivalent_spellings_compare_equal() {
        let a = ModuleId::new("/proj/src/./a.ts").unwrap();
        let b = ModuleId::new("/proj/src/a.ts").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn relative_rendering() {
        let id = ModuleId::from_normalized("/proj/src/a.ts");
        assert_eq!(id.relative_to(Path::new("/proj")), "src/a.ts");
        assert_eq!(id.relative_to(Path::new("/other")), "/proj/src/a.ts");
    }
}
