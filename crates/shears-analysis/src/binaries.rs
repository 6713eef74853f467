//! Binary analysis over package scripts.
//!
//! Tokenizes every manifest script, strips environment assignments, splits
//! on shell operators, and works out which binary each command invokes.
//! A binary resolves when some installed package in the reachable
//! `node_modules` tree provides it, when it maps to a declared dependency,
//! or when it is a ubiquitous global.

use std::path::PathBuf;

use rustc_hash::FxHashMap;
use tracing::trace;

use shears_core::Runtime;
use shears_workspace::{PackageJson, Workspace};

/// Shell and system tools never reported as unlisted.
pub const IGNORED_GLOBAL_BINARIES: [&str; 28] = [
    "bash", "cat", "cd", "cp", "curl", "echo", "exit", "false", "git", "grep", "kill", "ls",
    "mkdir", "mv", "node", "npm", "nvm", "pnpm", "rm", "rmdir", "sh", "sleep", "tar", "test",
    "touch", "true", "wget", "yarn",
];

/// Binary names whose providing package is named differently.
const KNOWN_BINARY_PACKAGES: [(&str, &str); 4] = [
    ("tsc", "typescript"),
    ("tsserver", "typescript"),
    ("sb", "storybook"),
    ("nuxi", "nuxt"),
];

/// Resolution outcome for one invoked binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryResolution {
    /// Provided by an installed or declared package.
    Installed { package: Option<String> },
    /// Member of [`IGNORED_GLOBAL_BINARIES`].
    Ignored,
    /// `npx --yes`: fetched on demand, intentionally not listed.
    IntentionallyUnlisted,
    Unlisted,
}

/// One binary invocation found in a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    pub name: String,
    /// Script key in the manifest (`lint`, `build`, ...), or a pseudo-key
    /// for references found in source files.
    pub script: String,
    pub workspace: usize,
    pub resolution: BinaryResolution,
}

/// Result of scanning one workspace's scripts.
#[derive(Debug, Default)]
pub struct ScriptScan {
    pub binaries: Vec<Binary>,
    /// Local script files invoked via `node ./scripts/x.js`; extra entry
    /// candidates.
    pub entries: Vec<PathBuf>,
    /// Packages that provide a used binary; they count as referenced.
    pub referenced_packages: Vec<String>,
}

/// Scan every script of a workspace manifest.
pub async fn scan_scripts<R: Runtime + ?Sized>(
    runtime: &R,
    workspace: &Workspace,
    workspace_index: usize,
    workspaces_chain_dirs: &[PathBuf],
) -> ScriptScan {
    let scripts: Vec<(String, String)> = workspace
        .manifest
        .scripts
        .iter()
        .map(|(name, body)| (name.clone(), body.clone()))
        .collect();
    scan_commands(
        runtime,
        workspace,
        workspace_index,
        workspaces_chain_dirs,
        &scripts,
    )
    .await
}

/// Scan an explicit `(label, command)` list — manifest scripts or
/// command-like strings the analyzer surfaced from source files.
pub async fn scan_commands<R: Runtime + ?Sized>(
    runtime: &R,
    workspace: &Workspace,
    workspace_index: usize,
    workspaces_chain_dirs: &[PathBuf],
    commands: &[(String, String)],
) -> ScriptScan {
    let mut scan = ScriptScan::default();
    let bin_map = installed_bin_map(runtime, workspace, workspaces_chain_dirs).await;

    for (script_name, body) in commands {
        for command in split_commands(&body) {
            let Some(invocation) = parse_invocation(&command) else {
                continue;
            };

            match invocation {
                Invocation::Binary(name) => {
                    let resolution = resolve_binary(
                        runtime,
                        &name,
                        workspace,
                        workspaces_chain_dirs,
                        &bin_map,
                    );
                    if let BinaryResolution::Installed { package: Some(pkg) } = &resolution {
                        scan.referenced_packages.push(pkg.clone());
                    }
                    scan.binaries.push(Binary {
                        name,
                        script: script_name.clone(),
                        workspace: workspace_index,
                        resolution,
                    });
                }
                Invocation::IntentionallyUnlisted(name) => {
                    scan.binaries.push(Binary {
                        name,
                        script: script_name.clone(),
                        workspace: workspace_index,
                        resolution: BinaryResolution::IntentionallyUnlisted,
                    });
                }
                Invocation::NodeScript(path) => {
                    let file = workspace.dir.join(path.trim_start_matches("./"));
                    if runtime.exists(&file) {
                        scan.entries.push(file);
                    }
                }
                Invocation::Nothing => {}
            }
        }
    }

    scan.referenced_packages.sort();
    scan.referenced_packages.dedup();
    scan.binaries
        .sort_by(|a, b| (&a.script, &a.name).cmp(&(&b.script, &b.name)));
    scan.entries.sort();
    scan.entries.dedup();
    scan
}

#[derive(Debug, PartialEq, Eq)]
enum Invocation {
    Binary(String),
    IntentionallyUnlisted(String),
    NodeScript(String),
    Nothing,
}

/// Split a script body on shell operators, respecting single and double
/// quotes.
fn split_commands(body: &str) -> Vec<String> {
    let mut commands = Vec::new();
    let mut current = String::new();
    let mut chars = body.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    current.push(c);
                }
                '&' | '|' if chars.peek() == Some(&c) => {
                    chars.next();
                    commands.push(std::mem::take(&mut current));
                }
                ';' | '|' => {
                    commands.push(std::mem::take(&mut current));
                }
                _ => current.push(c),
            },
        }
    }
    commands.push(current);
    commands
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Tokenize one command and classify its invocation.
fn parse_invocation(command: &str) -> Option<Invocation> {
    let tokens: Vec<&str> = command.split_whitespace().collect();
    let mut index = 0;

    // Leading VAR=value assignments.
    while index < tokens.len() && is_env_assignment(tokens[index]) {
        index += 1;
    }
    if index >= tokens.len() {
        return Some(Invocation::Nothing);
    }

    let head = tokens[index].trim_start_matches('(');
    match head {
        "npx" => {
            let mut yes = false;
            let mut cursor = index + 1;
            while cursor < tokens.len() && tokens[cursor].starts_with('-') {
                if tokens[cursor] == "--yes" || tokens[cursor] == "-y" {
                    yes = true;
                }
                cursor += 1;
            }
            let name = tokens.get(cursor)?;
            let name = base_binary_name(name);
            if yes {
                Some(Invocation::IntentionallyUnlisted(name))
            } else {
                Some(Invocation::Binary(name))
            }
        }
        "pnpm" | "yarn" | "npm" => {
            match tokens.get(index + 1).copied() {
                Some("exec") => {
                    let name = tokens.get(index + 2)?;
                    Some(Invocation::Binary(base_binary_name(name)))
                }
                // dlx fetches on demand, like `npx --yes`.
                Some("dlx") => {
                    let name = tokens.get(index + 2)?;
                    Some(Invocation::IntentionallyUnlisted(base_binary_name(name)))
                }
                // `pnpm run x` / `yarn build` chain to other scripts.
                _ => Some(Invocation::Nothing),
            }
        }
        "node" => {
            let target = tokens
                .get(index + 1..)?
                .iter()
                .find(|t| !t.starts_with('-'))?;
            if target.starts_with('.') || target.ends_with(".js") || target.ends_with(".mjs") {
                Some(Invocation::NodeScript(target.to_string()))
            } else {
                Some(Invocation::Nothing)
            }
        }
        other => Some(Invocation::Binary(base_binary_name(other))),
    }
}

fn is_env_assignment(token: &str) -> bool {
    match token.split_once('=') {
        Some((name, _)) => {
            !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

/// `@scope/pkg` invocations run the package's default binary.
fn base_binary_name(token: &str) -> String {
    let token = token.trim_matches(|c| c == '"' || c == '\'');
    if token.starts_with('@') {
        token.to_string()
    } else {
        // Strip any path prefix (./node_modules/.bin/eslint).
        token.rsplit('/').next().unwrap_or(token).to_string()
    }
}

/// Map binary name → providing package for every declared dependency whose
/// installed manifest is readable.
async fn installed_bin_map<R: Runtime + ?Sized>(
    runtime: &R,
    workspace: &Workspace,
    chain_dirs: &[PathBuf],
) -> FxHashMap<String, String> {
    let mut map = FxHashMap::default();

    for dependency in workspace.manifest.all_dependency_names() {
        for dir in chain_dirs {
            let manifest_path = dir
                .join("node_modules")
                .join(&dependency)
                .join("package.json");
            if !runtime.exists(&manifest_path) {
                continue;
            }
            if let Ok(manifest) = PackageJson::from_path(runtime, &manifest_path).await {
                for bin in manifest.bin_names() {
                    map.entry(bin).or_insert_with(|| dependency.clone());
                }
            }
            break;
        }
    }

    map
}

fn resolve_binary<R: Runtime + ?Sized>(
    runtime: &R,
    name: &str,
    workspace: &Workspace,
    chain_dirs: &[PathBuf],
    bin_map: &FxHashMap<String, String>,
) -> BinaryResolution {
    if IGNORED_GLOBAL_BINARIES.contains(&name) {
        return BinaryResolution::Ignored;
    }

    if let Some(package) = bin_map.get(name) {
        return BinaryResolution::Installed {
            package: Some(package.clone()),
        };
    }

    // An installed .bin shim counts even when the providing package could
    // not be read.
    for dir in chain_dirs {
        if runtime.exists(&dir.join("node_modules/.bin").join(name)) {
            trace!(binary = name, "resolved via .bin shim");
            return BinaryResolution::Installed { package: None };
        }
    }

    // A declared dependency with the binary's own name, or a well-known
    // mapping (tsc → typescript).
    if workspace.manifest.declares(name).is_some() {
        return BinaryResolution::Installed {
            package: Some(name.to_string()),
        };
    }
    for (binary, package) in KNOWN_BINARY_PACKAGES {
        if binary == name && workspace.manifest.declares(package).is_some() {
            return BinaryResolution::Installed {
                package: Some(package.to_string()),
            };
        }
    }

    BinaryResolution::Unlisted
}
