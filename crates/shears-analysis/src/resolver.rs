//! Module resolution.
//!
//! Deterministic, first hit wins:
//!
//! 1. relative (and absolute) specifiers against the referrer's directory,
//!    trying the exact path, known source extensions, then `index.*`;
//! 2. path-mapping aliases from tsconfig-style `paths`;
//! 3. workspace package names through the enumerator's table;
//! 4. node builtins and bare specifiers attribute as external packages —
//!    resolution never descends into `node_modules`;
//! 5. otherwise unresolved, which is a warning and never fatal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use path_clean::PathClean;
use rustc_hash::FxHashMap;
use tracing::trace;

use shears_core::Runtime;
use shears_graph::{ModuleId, Resolution};
use shears_workspace::{extract_package_name, extract_subpath};

/// Extension probe order; TypeScript sources shadow their JS siblings.
pub const RESOLVE_EXTENSIONS: [&str; 13] = [
    "ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs", "json", "vue", "svelte", "astro",
    "mdx",
];

/// Node builtin modules (without the `node:` prefix); never dependencies.
const NODE_BUILTINS: [&str; 30] = [
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "dns",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "querystring",
    "readline",
    "stream",
    "timers",
    "tls",
    "url",
    "util",
    "zlib",
];

pub fn is_node_builtin(package: &str) -> bool {
    let name = package.strip_prefix("node:").unwrap_or(package);
    let name = name.split('/').next().unwrap_or(name);
    NODE_BUILTINS.contains(&name)
}

/// One workspace package the resolver can target by name.
#[derive(Debug, Clone)]
pub struct WorkspaceTarget {
    pub dir: PathBuf,
    /// Manifest-nominated entry paths, relative to `dir`.
    pub entry_paths: Vec<String>,
}

/// Everything the resolver needs to know about the project.
#[derive(Debug, Clone, Default)]
pub struct ResolverContext {
    /// Workspace package name → target.
    pub workspace_packages: FxHashMap<String, WorkspaceTarget>,
    /// Alias → (substitution targets, base directory the targets are
    /// relative to). Wildcard aliases end in `/*`.
    pub path_aliases: Vec<(String, Vec<String>, PathBuf)>,
}

pub struct ModuleResolver {
    runtime: Arc<dyn Runtime>,
    context: ResolverContext,
    cache: DashMap<(PathBuf, String), Resolution>,
}

impl ModuleResolver {
    pub fn new(runtime: Arc<dyn Runtime>, context: ResolverContext) -> Self {
        Self {
            runtime,
            context,
            cache: DashMap::new(),
        }
    }

    /// Resolve `specifier` as written in `from`.
    pub fn resolve(&self, specifier: &str, from: &Path) -> Resolution {
        let from_dir = from.parent().unwrap_or(Path::new("/")).to_path_buf();
        let key = (from_dir.clone(), specifier.to_string());
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }

        let resolved = self.resolve_uncached(specifier, &from_dir);
        trace!(specifier, from = %from.display(), ?resolved, "resolved");
        self.cache.insert(key, resolved.clone());
        resolved
    }

    fn resolve_uncached(&self, specifier: &str, from_dir: &Path) -> Resolution {
        // 1. Relative / absolute paths.
        if specifier.starts_with('.') || specifier.starts_with('/') {
            let joined = if specifier.starts_with('/') {
                PathBuf::from(specifier)
            } else {
                from_dir.join(specifier).clean()
            };
            return match self.resolve_file(&joined) {
                Some(path) => Resolution::Internal(ModuleId::from_normalized(path)),
                None => Resolution::Unresolved,
            };
        }

        // 2. Path-mapping aliases.
        if let Some(resolution) = self.resolve_alias(specifier) {
            return resolution;
        }

        // Subpath imports (`#internal/...`) need the manifest `imports`
        // field, which is out of reach here.
        if specifier.starts_with('#') {
            return Resolution::Unresolved;
        }

        let package = extract_package_name(specifier);

        // 3. Workspace package names.
        if let Some(target) = self.context.workspace_packages.get(package) {
            return match self.resolve_workspace_target(target, extract_subpath(specifier)) {
                Some(path) => Resolution::Internal(ModuleId::from_normalized(path)),
                None => Resolution::Unresolved,
            };
        }

        // 4. Everything else that looks like a package is external; the
        // attributor decides listed vs unlisted and drops builtins.
        Resolution::External {
            package: package.to_string(),
            subpath: extract_subpath(specifier).map(str::to_string),
        }
    }

    fn resolve_alias(&self, specifier: &str) -> Option<Resolution> {
        for (alias, targets, base_dir) in &self.context.path_aliases {
            let remainder = if let Some(prefix) = alias.strip_suffix("/*") {
                match specifier.strip_prefix(prefix) {
                    Some(rest) if !rest.is_empty() => Some(rest.trim_start_matches('/')),
                    _ => None,
                }
            } else if specifier == alias {
                Some("")
            } else {
                None
            };

            let Some(remainder) = remainder else { continue };

            for target in targets {
                let substituted = if let Some(target_prefix) = target.strip_suffix("/*") {
                    format!("{target_prefix}/{remainder}")
                } else {
                    target.clone()
                };
                let candidate = base_dir.join(substituted).clean();
                if let Some(path) = self.resolve_file(&candidate) {
                    return Some(Resolution::Internal(ModuleId::from_normalized(path)));
                }
            }
        }
        None
    }

    fn resolve_workspace_target(
        &self,
        target: &WorkspaceTarget,
        subpath: Option<&str>,
    ) -> Option<PathBuf> {
        if let Some(subpath) = subpath {
            return self.resolve_file(&target.dir.join(subpath).clean());
        }

        for entry in &target.entry_paths {
            let candidate = target.dir.join(entry.trim_start_matches("./")).clean();
            if let Some(path) = self.resolve_file(&candidate) {
                return Some(path);
            }
        }

        // Fall back to conventional index files.
        for dir in [target.dir.clone(), target.dir.join("src")] {
            if let Some(path) = self.try_index(&dir) {
                return Some(path);
            }
        }
        None
    }

    /// Exact file, then extension probes, then `index.*` for directories.
    fn resolve_file(&self, candidate: &Path) -> Option<PathBuf> {
        // Any extension marks a file path; extensionless candidates could be
        // directories, which `exists` cannot tell apart.
        if candidate.extension().is_some() && self.runtime.exists(candidate) {
            return Some(candidate.to_path_buf());
        }

        let file_name = candidate.file_name()?.to_str()?;
        for ext in RESOLVE_EXTENSIONS {
            let probed = candidate.with_file_name(format!("{file_name}.{ext}"));
            if self.runtime.exists(&probed) {
                return Some(probed);
            }
        }

        self.try_index(candidate)
    }

    fn try_index(&self, dir: &Path) -> Option<PathBuf> {
        for ext in RESOLVE_EXTENSIONS {
            let probed = dir.join(format!("index.{ext}"));
            if self.runtime.exists(&probed) {
                return Some(probed);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shears_core::{FileMetadata, RuntimeError};

    /// In-memory runtime with a fixed file list.
    #[derive(Debug, Default)]
    struct MemoryRuntime {
        files: Vec<PathBuf>,
    }

    impl MemoryRuntime {
        fn with(files: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                files: files.iter().map(PathBuf::from).collect(),
            })
        }
    }

    #[async_trait]
    impl Runtime for MemoryRuntime {
        fn exists(&self, path: &Path) -> bool {
            self.files.iter().any(|f| f == path)
        }

        async fn read_file(&self, path: &Path) -> Result<Vec<u8>, RuntimeError> {
            Err(RuntimeError::FileNotFound(path.to_path_buf()))
        }

        async fn metadata(&self, path: &Path) -> Result<FileMetadata, RuntimeError> {
            if self.exists(path) {
                Ok(FileMetadata {
                    is_file: true,
                    is_dir: false,
                    size: 0,
                    modified: None,
                })
            } else {
                Err(RuntimeError::FileNotFound(path.to_path_buf()))
            }
        }

        async fn read_dir(&self, _path: &Path) -> Result<Vec<String>, RuntimeError> {
            Ok(Vec::new())
        }
    }

    fn resolver(files: &[&str]) -> ModuleResolver {
        ModuleResolver::new(MemoryRuntime::with(files), ResolverContext::default())
    }

    #[test]
    fn relative_with_extension_probe() {
        let r = resolver(&["/p/src/utils.ts"]);
        let resolved = r.resolve("./utils", Path::new("/p/src/index.ts"));
        assert_eq!(
            resolved,
            Resolution::Internal(ModuleId::from_normalized("/p/src/utils.ts"))
        );
    }

    #[test]
    fn typescript_shadows_javascript() {
        let r = resolver(&["/p/src/a.js", "/p/src/a.ts"]);
        let resolved = r.resolve("./a", Path::new("/p/src/index.ts"));
        assert_eq!(
            resolved,
            Resolution::Internal(ModuleId::from_normalized("/p/src/a.ts"))
        );
    }

    #[test]
    fn directory_resolves_to_index() {
        let r = resolver(&["/p/src/lib/index.ts"]);
        let resolved = r.resolve("./lib", Path::new("/p/src/main.ts"));
        assert_eq!(
            resolved,
            Resolution::Internal(ModuleId::from_normalized("/p/src/lib/index.ts"))
        );
    }

    #[test]
    fn missing_relative_is_unresolved() {
        let r = resolver(&[]);
        assert_eq!(
            r.resolve("./nope", Path::new("/p/src/index.ts")),
            Resolution::Unresolved
        );
    }

    #[test]
    fn bare_specifier_is_external_with_subpath() {
        let r = resolver(&[]);
        assert_eq!(
            r.resolve("lodash/fp", Path::new("/p/src/index.ts")),
            Resolution::External {
                package: "lodash".to_string(),
                subpath: Some("fp".to_string()),
            }
        );
    }

    #[test]
    fn scoped_package_name_is_kept_whole() {
        let r = resolver(&[]);
        assert_eq!(
            r.resolve("@babel/core/lib", Path::new("/p/a.ts")),
            Resolution::External {
                package: "@babel/core".to_string(),
                subpath: Some("lib".to_string()),
            }
        );
    }

    #[test]
    fn wildcard_alias_substitutes_and_probes() {
        let runtime = MemoryRuntime::with(&["/p/src/lib/math.ts"]);
        let context = ResolverContext {
            path_aliases: vec![(
                "@lib/*".to_string(),
                vec!["src/lib/*".to_string()],
                PathBuf::from("/p"),
            )],
            ..Default::default()
        };
        let r = ModuleResolver::new(runtime, context);
        assert_eq!(
            r.resolve("@lib/math", Path::new("/p/src/index.ts")),
            Resolution::Internal(ModuleId::from_normalized("/p/src/lib/math.ts"))
        );
    }

    #[test]
    fn workspace_package_resolves_through_its_manifest() {
        let runtime = MemoryRuntime::with(&["/repo/packages/ui/src/index.ts"]);
        let mut workspace_packages = FxHashMap::default();
        workspace_packages.insert(
            "@acme/ui".to_string(),
            WorkspaceTarget {
                dir: PathBuf::from("/repo/packages/ui"),
                entry_paths: vec!["src/index.ts".to_string()],
            },
        );
        let r = ModuleResolver::new(
            runtime,
            ResolverContext {
                workspace_packages,
                ..Default::default()
            },
        );
        assert_eq!(
            r.resolve("@acme/ui", Path::new("/repo/apps/web/src/page.ts")),
            Resolution::Internal(ModuleId::from_normalized(
                "/repo/packages/ui/src/index.ts"
            ))
        );
    }

    #[test]
    fn node_builtins_are_recognized() {
        assert!(is_node_builtin("fs"));
        assert!(is_node_builtin("node:fs"));
        assert!(is_node_builtin("fs/promises"));
        assert!(!is_node_builtin("lodash"));
    }

    #[test]
    fn repeated_resolution_hits_the_cache() {
        let r = resolver(&["/p/src/utils.ts"]);
        let first = r.resolve("./utils", Path::new("/p/src/index.ts"));
        let second = r.resolve("./utils", Path::new("/p/src/index.ts"));
        assert_eq!(first, second);
        assert_eq!(r.cache.len(), 1);
    }
}
