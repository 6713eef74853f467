//! # shears-analyzer
//!
//! The default [`Analyzer`] implementation, built on the oxc parser. It
//! extracts static imports (skipping type-only ones only in the sense of
//! flagging them), `require()` and literal `import()` calls, the full export
//! surface including enum and exported-class members, JSDoc tags, property
//! accesses on imported bindings, and command-like strings passed to
//! process-spawning helpers.

mod extract;
mod jsdoc;

use std::path::Path;

use async_trait::async_trait;

use shears_analysis::{AnalyzeError, Analyzer, FileAnalysis};
use shears_graph::SourceType;

#[derive(Debug, Default, Clone)]
pub struct OxcAnalyzer;

impl OxcAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Analyzer for OxcAnalyzer {
    async fn analyze(
        &self,
        path: &Path,
        kind: SourceType,
    ) -> Result<FileAnalysis, AnalyzeError> {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| AnalyzeError::Read {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        self.analyze_source(&source, path, kind).await
    }

    async fn analyze_source(
        &self,
        source: &str,
        virtual_path: &Path,
        kind: SourceType,
    ) -> Result<FileAnalysis, AnalyzeError> {
        extract::extract(source, virtual_path, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shears_graph::{ExportKind, ImportedNames, Resolution};

    async fn analyze(source: &str) -> FileAnalysis {
        OxcAnalyzer::new()
            .analyze_source(source, Path::new("/test/mod.ts"), SourceType::TypeScript)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn static_imports_with_specifiers() {
        let analysis = analyze(
            r#"
            import def from './a';
            import { x, y as z } from './b';
            import * as ns from './c';
            import './polyfill';
            "#,
        )
        .await;

        assert_eq!(analysis.imports.len(), 4);

        let def = &analysis.imports[0];
        assert_eq!(def.specifier, "./a");
        assert_eq!(def.names.local_for("default"), Some("def"));

        let named = &analysis.imports[1];
        assert_eq!(named.names.local_for("x"), Some("x"));
        assert_eq!(named.names.local_for("y"), Some("z"));

        assert!(analysis.imports[2].names.is_namespace());
        assert!(analysis.imports[3].is_side_effect_only());
        assert!(analysis
            .imports
            .iter()
            .all(|i| i.resolution == Resolution::Unresolved));
    }

    #[tokio::test]
    async fn type_only_imports_are_flagged() {
        let analysis = analyze(r#"import type { Props } from './types';"#).await;
        assert_eq!(analysis.imports.len(), 1);
        assert!(analysis.imports[0].is_type_only);
    }

    #[tokio::test]
    async fn require_and_dynamic_import() {
        let analysis = analyze(
            r#"
            const lib = require('some-lib');
            async function load() {
                return import('./lazy');
            }
            "#,
        )
        .await;

        let specifiers: Vec<&str> =
            analysis.imports.iter().map(|i| i.specifier.as_str()).collect();
        assert!(specifiers.contains(&"some-lib"));
        assert!(specifiers.contains(&"./lazy"));
        let lazy = analysis
            .imports
            .iter()
            .find(|i| i.specifier == "./lazy")
            .unwrap();
        assert!(lazy.is_dynamic);
    }

    #[tokio::test]
    async fn export_surface_including_members() {
        let analysis = analyze(
            r#"
            export const value = 1;
            export function helper() {}
            export default class App {}
            export enum Direction { Up, Down }
            export class Service {
                start() {}
                stop() {}
            }
            export type Alias = string;
            "#,
        )
        .await;

        let names: Vec<(&str, &ExportKind)> = analysis
            .exports
            .iter()
            .map(|e| (e.external_name.as_str(), &e.kind))
            .collect();

        assert!(names.iter().any(|(n, k)| *n == "value" && matches!(k, ExportKind::Value)));
        assert!(names.iter().any(|(n, k)| *n == "default" && matches!(k, ExportKind::Default)));
        assert!(names
            .iter()
            .any(|(n, k)| *n == "Up" && matches!(k, ExportKind::EnumMember { parent } if parent == "Direction")));
        assert!(names
            .iter()
            .any(|(n, k)| *n == "start" && matches!(k, ExportKind::ClassMember { parent } if parent == "Service")));
        assert!(names.iter().any(|(n, k)| *n == "Alias" && matches!(k, ExportKind::Type)));
    }

    #[tokio::test]
    async fn reexports_are_imports_and_exports() {
        let analysis = analyze(
            r#"
            export { one, two as too } from './pair';
            export * from './all';
            "#,
        )
        .await;

        let pair = analysis
            .imports
            .iter()
            .find(|i| i.specifier == "./pair")
            .unwrap();
        assert!(pair.is_reexport);
        assert_eq!(pair.names.local_for("two"), Some("too"));

        let all = analysis
            .imports
            .iter()
            .find(|i| i.specifier == "./all")
            .unwrap();
        assert!(all.is_reexport);
        assert!(matches!(all.names, ImportedNames::Namespace(_)));

        assert!(analysis
            .exports
            .iter()
            .any(|e| e.external_name == "too"));
        assert!(analysis.exports.iter().any(|e| e.is_star_reexport()));
    }

    #[tokio::test]
    async fn member_accesses_on_imported_bindings() {
        let analysis = analyze(
            r#"
            import { Direction } from './dir';
            function go() {
                return Direction.Up;
            }
            "#,
        )
        .await;

        assert!(analysis
            .member_accesses
            .contains(&("Direction".to_string(), "Up".to_string())));
    }

    #[tokio::test]
    async fn jsdoc_tags_attach_to_exports() {
        let analysis = analyze(
            r#"
            /** @public */
            export const api = 1;

            /** @internal plumbing */
            export const secret = 2;

            export const plain = 3;
            "#,
        )
        .await;

        let api = analysis
            .exports
            .iter()
            .find(|e| e.external_name == "api")
            .unwrap();
        assert!(api.has_tag("public"));

        let secret = analysis
            .exports
            .iter()
            .find(|e| e.external_name == "secret")
            .unwrap();
        assert!(secret.has_tag("internal"));

        let plain = analysis
            .exports
            .iter()
            .find(|e| e.external_name == "plain")
            .unwrap();
        assert!(plain.tags.is_empty());
    }

    #[tokio::test]
    async fn script_refs_from_spawn_helpers() {
        let analysis = analyze(
            r#"
            import { execa } from 'execa';
            await execa('eslint', ['--fix']);
            "#,
        )
        .await;
        assert!(analysis.script_refs.contains(&"eslint".to_string()));
    }

    #[tokio::test]
    async fn in_file_usage_marks_exports() {
        let analysis = analyze(
            r#"
            export const used = 1;
            export const untouched = 2;
            const double = used * 2;
            "#,
        )
        .await;

        let used = analysis
            .exports
            .iter()
            .find(|e| e.external_name == "used")
            .unwrap();
        assert!(used.used_in_file);

        let untouched = analysis
            .exports
            .iter()
            .find(|e| e.external_name == "untouched")
            .unwrap();
        assert!(!untouched.used_in_file);
    }

    #[tokio::test]
    async fn broken_source_is_a_parse_error() {
        let result = OxcAnalyzer::new()
            .analyze_source(
                "import { from 'nowhere",
                Path::new("/test/broken.ts"),
                SourceType::TypeScript,
            )
            .await;
        assert!(matches!(result, Err(AnalyzeError::Parse { .. })));
    }
}
