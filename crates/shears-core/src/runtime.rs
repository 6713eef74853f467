//! Read-only filesystem abstraction.
//!
//! The linter's results depend only on files on disk at the moment of the
//! run, so the runtime exposes reads, stats and directory listings and
//! nothing else.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("invalid UTF-8 in {path}")]
    InvalidUtf8 { path: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Stat result for a single path.
#[derive(Debug, Clone, Copy)]
pub struct FileMetadata {
    pub is_file: bool,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// Read-only view of the project filesystem.
///
/// `exists` is synchronous on purpose: resolution probes call it in tight
/// loops and the implementations answer from a stat without yielding.
#[async_trait]
pub trait Runtime: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, RuntimeError>;

    async fn metadata(&self, path: &Path) -> Result<FileMetadata, RuntimeError>;

    /// List the entry names (not full paths) of a directory.
    async fn read_dir(&self, path: &Path) -> Result<Vec<String>, RuntimeError>;

    /// Read a file and decode it as UTF-8.
    async fn read_to_string(&self, path: &Path) -> Result<String, RuntimeError> {
        let bytes = self.read_file(path).await?;
        String::from_utf8(bytes).map_err(|_| RuntimeError::InvalidUtf8 {
            path: path.to_path_buf(),
        })
    }
}

/// [`Runtime`] backed by the local filesystem via tokio.
#[derive(Debug, Default, Clone)]
pub struct NativeRuntime;

impl NativeRuntime {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runtime for NativeRuntime {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, RuntimeError> {
        tokio::fs::read(path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                RuntimeError::FileNotFound(path.to_path_buf())
            } else {
                RuntimeError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })
    }

    async fn metadata(&self, path: &Path) -> Result<FileMetadata, RuntimeError> {
        let meta = tokio::fs::metadata(path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                RuntimeError::FileNotFound(path.to_path_buf())
            } else {
                RuntimeError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        Ok(FileMetadata {
            is_file: meta.is_file(),
            is_dir: meta.is_dir(),
            size: meta.len(),
            modified: meta.modified().ok(),
        })
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<String>, RuntimeError> {
        let mut entries = tokio::fs::read_dir(path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                RuntimeError::NotADirectory(path.to_path_buf())
            } else {
                RuntimeError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|source| RuntimeError::Io {
            path: path.to_path_buf(),
            source,
        })? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn native_runtime_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("hello.txt");
        std::fs::File::create(&file)
            .unwrap()
            .write_all(b"hi")
            .unwrap();

        let runtime = NativeRuntime::new();
        assert!(runtime.exists(&file));
        assert_eq!(runtime.read_to_string(&file).await.unwrap(), "hi");

        let meta = runtime.metadata(&file).await.unwrap();
        assert!(meta.is_file);
        assert_eq!(meta.size, 2);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let runtime = NativeRuntime::new();
        let err = runtime
            .read_file(Path::new("/definitely/not/here.ts"))
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn read_dir_returns_sorted_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::File::create(dir.path().join("b.ts")).unwrap();
        std::fs::File::create(dir.path().join("a.ts")).unwrap();

        let runtime = NativeRuntime::new();
        let names = runtime.read_dir(dir.path()).await.unwrap();
        assert_eq!(names, vec!["a.ts".to_string(), "b.ts".to_string()]);
    }
}
