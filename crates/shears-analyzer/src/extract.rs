//! AST extraction.
//!
//! One pass over the parsed program collects imports, exports, member
//! accesses on identifiers and command-like call arguments. Expression
//! walking is hand-rolled over the statement forms real code uses; exotic
//! nodes simply contribute nothing.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, BindingPatternKind, ClassElement, Declaration, Expression,
    ImportDeclarationSpecifier, ModuleExportName, ObjectPropertyKind, PropertyKey, Statement,
    TSAccessibility, TSEnumMemberName,
};
use oxc_parser::{Parser as OxcParser, ParserReturn};
use oxc_span::SourceType as OxcSourceType;
use tracing::trace;

use shears_analysis::{AnalyzeError, FileAnalysis};
use shears_graph::{
    Export, ExportKind, Import, ImportedNames, NamedImport, SourceSpan, SourceType,
};

use crate::jsdoc::{identifier_occurrences, tags_before};

/// Callees whose first string argument is a shell command.
const SPAWN_HELPERS: [&str; 5] = ["exec", "execSync", "execa", "spawn", "spawnSync"];

pub(crate) fn extract(
    source: &str,
    path: &Path,
    kind: SourceType,
) -> Result<FileAnalysis, AnalyzeError> {
    let source_type = oxc_source_type(path, kind);
    let allocator = Allocator::default();
    let ParserReturn {
        program, panicked, ..
    } = OxcParser::new(&allocator, source, source_type).parse();

    if panicked {
        return Err(AnalyzeError::Parse {
            path: path.to_path_buf(),
            message: "parser panicked".to_string(),
        });
    }

    let mut collector = Collector {
        source,
        analysis: FileAnalysis::default(),
    };

    for stmt in &program.body {
        collector.statement(stmt);
    }

    trace!(
        file = %path.display(),
        imports = collector.analysis.imports.len(),
        exports = collector.analysis.exports.len(),
        "extracted"
    );
    Ok(collector.analysis)
}

fn oxc_source_type(path: &Path, kind: SourceType) -> OxcSourceType {
    match kind {
        SourceType::TypeScript => OxcSourceType::ts(),
        SourceType::Tsx => OxcSourceType::tsx(),
        SourceType::Jsx => OxcSourceType::jsx(),
        SourceType::JavaScript => OxcSourceType::mjs(),
        _ => OxcSourceType::from_path(path).unwrap_or_else(|_| OxcSourceType::ts()),
    }
}

struct Collector<'src> {
    source: &'src str,
    analysis: FileAnalysis,
}

impl<'src> Collector<'src> {
    fn statement(&mut self, stmt: &Statement<'_>) {
        match stmt {
            Statement::ImportDeclaration(decl) => self.import_declaration(decl),
            Statement::ExportNamedDeclaration(named) => self.export_named(named),
            Statement::ExportDefaultDeclaration(default) => {
                let span = SourceSpan::new(default.span.start, default.span.end);
                let mut export = Export::new("default", ExportKind::Default).with_span(span);
                if let Some(local) = default_declaration_name(default) {
                    export.local_name = local;
                }
                export.tags = tags_before(self.source, default.span.start as usize);
                self.analysis.exports.push(export);
            }
            Statement::ExportAllDeclaration(all) => {
                let span = SourceSpan::new(all.span.start, all.span.end);
                let source_specifier = all.source.value.to_string();
                self.analysis.exports.push(
                    Export::new(
                        "*",
                        ExportKind::NamespaceReExport {
                            source: source_specifier.clone(),
                        },
                    )
                    .with_span(span),
                );
                let mut import = Import::new(
                    source_specifier,
                    ImportedNames::Namespace("*".to_string()),
                )
                .reexport();
                import.span = span;
                self.analysis.imports.push(import);
            }
            Statement::ExpressionStatement(es) => self.expression(&es.expression),
            Statement::VariableDeclaration(vd) => {
                for declarator in &vd.declarations {
                    if let Some(init) = &declarator.init {
                        self.expression(init);
                    }
                }
            }
            Statement::BlockStatement(block) => {
                for stmt in &block.body {
                    self.statement(stmt);
                }
            }
            Statement::IfStatement(ifs) => {
                self.expression(&ifs.test);
                self.statement(&ifs.consequent);
                if let Some(alternate) = &ifs.alternate {
                    self.statement(alternate);
                }
            }
            Statement::ForStatement(fors) => self.statement(&fors.body),
            Statement::ForInStatement(fors) => self.statement(&fors.body),
            Statement::ForOfStatement(fors) => self.statement(&fors.body),
            Statement::WhileStatement(whiles) => {
                self.expression(&whiles.test);
                self.statement(&whiles.body);
            }
            Statement::DoWhileStatement(dos) => {
                self.statement(&dos.body);
                self.expression(&dos.test);
            }
            Statement::ReturnStatement(ret) => {
                if let Some(argument) = &ret.argument {
                    self.expression(argument);
                }
            }
            Statement::ThrowStatement(throw) => self.expression(&throw.argument),
            Statement::TryStatement(tries) => {
                for stmt in &tries.block.body {
                    self.statement(stmt);
                }
                if let Some(handler) = &tries.handler {
                    for stmt in &handler.body.body {
                        self.statement(stmt);
                    }
                }
                if let Some(finalizer) = &tries.finalizer {
                    for stmt in &finalizer.body {
                        self.statement(stmt);
                    }
                }
            }
            Statement::SwitchStatement(switch) => {
                self.expression(&switch.discriminant);
                for case in &switch.cases {
                    for stmt in &case.consequent {
                        self.statement(stmt);
                    }
                }
            }
            Statement::LabeledStatement(labeled) => self.statement(&labeled.body),
            Statement::FunctionDeclaration(func) => {
                if let Some(body) = &func.body {
                    for stmt in &body.statements {
                        self.statement(stmt);
                    }
                }
            }
            Statement::ClassDeclaration(class) => self.class_bodies(&class.body.body),
            _ => {}
        }
    }

    fn import_declaration(&mut self, decl: &oxc_ast::ast::ImportDeclaration<'_>) {
        let mut named = Vec::new();
        let mut namespace: Option<String> = None;
        let mut all_type_only = true;

        if let Some(specifiers) = &decl.specifiers {
            for spec in specifiers {
                match spec {
                    ImportDeclarationSpecifier::ImportDefaultSpecifier(default_spec) => {
                        all_type_only = false;
                        named.push(NamedImport::new(
                            "default",
                            default_spec.local.name.to_string(),
                        ));
                    }
                    ImportDeclarationSpecifier::ImportNamespaceSpecifier(ns_spec) => {
                        all_type_only = false;
                        namespace = Some(ns_spec.local.name.to_string());
                    }
                    ImportDeclarationSpecifier::ImportSpecifier(named_spec) => {
                        if !named_spec.import_kind.is_type() {
                            all_type_only = false;
                        }
                        named.push(NamedImport::new(
                            export_name_string(&named_spec.imported),
                            named_spec.local.name.to_string(),
                        ));
                    }
                }
            }
        } else {
            all_type_only = false;
        }

        let names = if let Some(ns) = namespace {
            ImportedNames::Namespace(ns)
        } else if named.is_empty() {
            ImportedNames::SideEffect
        } else {
            ImportedNames::Named(named)
        };

        let mut import = Import::new(decl.source.value.to_string(), names);
        import.span = SourceSpan::new(decl.span.start, decl.span.end);
        if decl.import_kind.is_type() || all_type_only {
            import.is_type_only = true;
        }
        self.analysis.imports.push(import);
    }

    fn export_named(&mut self, named: &oxc_ast::ast::ExportNamedDeclaration<'_>) {
        let span = SourceSpan::new(named.span.start, named.span.end);
        let tags = tags_before(self.source, named.span.start as usize);
        let type_only = named.export_kind.is_type();

        if let Some(source) = &named.source {
            // Re-export: an import edge that forwards, plus the exported
            // names on this module.
            let mut specifiers = Vec::new();
            for spec in &named.specifiers {
                let imported = export_name_string(&spec.local);
                let exported = export_name_string(&spec.exported);
                specifiers.push(NamedImport::new(imported, exported.clone()));

                let kind = if type_only {
                    ExportKind::Type
                } else {
                    ExportKind::Value
                };
                self.analysis.exports.push(
                    Export::new(exported, kind)
                        .with_span(span)
                        .with_tags(tags.clone()),
                );
            }
            let mut import = Import::new(
                source.value.to_string(),
                ImportedNames::Named(specifiers),
            )
            .reexport();
            import.span = span;
            import.is_type_only = type_only;
            self.analysis.imports.push(import);
            return;
        }

        if let Some(declaration) = &named.declaration {
            self.export_declaration(declaration, span, &tags);
            return;
        }

        // `export { a, b as c }`: the locals are defined elsewhere in the
        // file, so the bar for "also used in file" is one extra mention.
        for spec in &named.specifiers {
            let local = export_name_string(&spec.local);
            let exported = export_name_string(&spec.exported);
            let kind = if type_only {
                ExportKind::Type
            } else {
                ExportKind::Value
            };
            let mut export = Export::new(local.clone(), kind)
                .renamed(exported)
                .with_span(span)
                .with_tags(tags.clone());
            if identifier_occurrences(self.source, &local) >= 3 {
                export = export.used_in_file();
            }
            self.analysis.exports.push(export);
        }
    }

    fn export_declaration(
        &mut self,
        declaration: &Declaration<'_>,
        span: SourceSpan,
        tags: &[String],
    ) {
        match declaration {
            Declaration::FunctionDeclaration(func) => {
                if let Some(id) = &func.id {
                    self.push_named_export(id.name.as_str(), ExportKind::Value, span, tags);
                }
                if let Some(body) = &func.body {
                    for stmt in &body.statements {
                        self.statement(stmt);
                    }
                }
            }
            Declaration::VariableDeclaration(var) => {
                for declarator in &var.declarations {
                    if let BindingPatternKind::BindingIdentifier(ident) = &declarator.id.kind {
                        self.push_named_export(
                            ident.name.as_str(),
                            ExportKind::Value,
                            span,
                            tags,
                        );
                    }
                    if let Some(init) = &declarator.init {
                        self.expression(init);
                    }
                }
            }
            Declaration::ClassDeclaration(class) => {
                let Some(id) = &class.id else {
                    return;
                };
                let class_name = id.name.to_string();
                self.push_named_export(&class_name, ExportKind::Value, span, tags);

                for element in &class.body.body {
                    if let Some((member, member_span)) = class_member_name(element) {
                        self.analysis.exports.push(
                            Export::new(
                                member,
                                ExportKind::ClassMember {
                                    parent: class_name.clone(),
                                },
                            )
                            .with_span(member_span),
                        );
                    }
                }
                self.class_bodies(&class.body.body);
            }
            Declaration::TSEnumDeclaration(ts_enum) => {
                let enum_name = ts_enum.id.name.to_string();
                self.push_named_export(&enum_name, ExportKind::Value, span, tags);

                for member in &ts_enum.members {
                    if let Some(name) = enum_member_name(&member.id) {
                        self.analysis.exports.push(
                            Export::new(
                                name,
                                ExportKind::EnumMember {
                                    parent: enum_name.clone(),
                                },
                            )
                            .with_span(SourceSpan::new(member.span.start, member.span.end)),
                        );
                    }
                }
            }
            Declaration::TSTypeAliasDeclaration(alias) => {
                self.push_named_export(alias.id.name.as_str(), ExportKind::Type, span, tags);
            }
            Declaration::TSInterfaceDeclaration(interface) => {
                self.push_named_export(
                    interface.id.name.as_str(),
                    ExportKind::Type,
                    span,
                    tags,
                );
            }
            _ => {}
        }
    }

    fn push_named_export(
        &mut self,
        name: &str,
        kind: ExportKind,
        span: SourceSpan,
        tags: &[String],
    ) {
        let mut export = Export::new(name, kind)
            .with_span(span)
            .with_tags(tags.to_vec());
        // The declaration itself is one mention; anything beyond that is
        // in-file usage.
        if identifier_occurrences(self.source, name) >= 2 {
            export = export.used_in_file();
        }
        self.analysis.exports.push(export);
    }

    fn class_bodies(&mut self, elements: &oxc_allocator::Vec<'_, ClassElement<'_>>) {
        for element in elements {
            if let ClassElement::MethodDefinition(method) = element {
                if let Some(body) = &method.value.body {
                    for stmt in &body.statements {
                        self.statement(stmt);
                    }
                }
            }
        }
    }

    fn expression(&mut self, expr: &Expression<'_>) {
        match expr {
            Expression::CallExpression(call) => {
                // require('x')
                if let Expression::Identifier(callee) = &call.callee {
                    if callee.name.as_str() == "require" && !call.arguments.is_empty() {
                        if let Some(Expression::StringLiteral(literal)) =
                            call.arguments[0].as_expression()
                        {
                            let mut import = Import::new(
                                literal.value.to_string(),
                                ImportedNames::Namespace("require".to_string()),
                            );
                            import.span =
                                SourceSpan::new(call.span.start, call.span.end);
                            self.analysis.imports.push(import);
                        }
                    }
                    if SPAWN_HELPERS.contains(&callee.name.as_str()) {
                        if let Some(Some(Expression::StringLiteral(literal))) =
                            call.arguments.first().map(Argument::as_expression)
                        {
                            self.analysis
                                .script_refs
                                .push(literal.value.to_string());
                        }
                    }
                }
                self.expression(&call.callee);
                for argument in &call.arguments {
                    if let Some(expr) = argument.as_expression() {
                        self.expression(expr);
                    }
                }
            }
            Expression::ImportExpression(import_expr) => {
                if let Expression::StringLiteral(literal) = &import_expr.source {
                    let mut import = Import::new(
                        literal.value.to_string(),
                        ImportedNames::Namespace("import()".to_string()),
                    )
                    .dynamic();
                    import.span =
                        SourceSpan::new(import_expr.span.start, import_expr.span.end);
                    self.analysis.imports.push(import);
                }
            }
            Expression::StaticMemberExpression(member) => {
                if let Expression::Identifier(object) = &member.object {
                    self.analysis.member_accesses.push((
                        object.name.to_string(),
                        member.property.name.to_string(),
                    ));
                }
                self.expression(&member.object);
            }
            Expression::ComputedMemberExpression(member) => {
                self.expression(&member.object);
                self.expression(&member.expression);
            }
            Expression::ArrayExpression(array) => {
                for element in &array.elements {
                    if let Some(expr) = element.as_expression() {
                        self.expression(expr);
                    }
                }
            }
            Expression::ObjectExpression(object) => {
                for property in &object.properties {
                    match property {
                        ObjectPropertyKind::ObjectProperty(prop) => {
                            self.expression(&prop.value);
                        }
                        ObjectPropertyKind::SpreadProperty(spread) => {
                            self.expression(&spread.argument);
                        }
                    }
                }
            }
            Expression::ArrowFunctionExpression(arrow) => {
                for stmt in &arrow.body.statements {
                    self.statement(stmt);
                }
            }
            Expression::FunctionExpression(func) => {
                if let Some(body) = &func.body {
                    for stmt in &body.statements {
                        self.statement(stmt);
                    }
                }
            }
            Expression::AssignmentExpression(assign) => self.expression(&assign.right),
            Expression::BinaryExpression(binary) => {
                self.expression(&binary.left);
                self.expression(&binary.right);
            }
            Expression::LogicalExpression(logical) => {
                self.expression(&logical.left);
                self.expression(&logical.right);
            }
            Expression::ConditionalExpression(cond) => {
                self.expression(&cond.test);
                self.expression(&cond.consequent);
                self.expression(&cond.alternate);
            }
            Expression::UnaryExpression(unary) => self.expression(&unary.argument),
            Expression::AwaitExpression(awaited) => self.expression(&awaited.argument),
            Expression::NewExpression(new_expr) => {
                self.expression(&new_expr.callee);
                for argument in &new_expr.arguments {
                    if let Some(expr) = argument.as_expression() {
                        self.expression(expr);
                    }
                }
            }
            Expression::SequenceExpression(sequence) => {
                for expr in &sequence.expressions {
                    self.expression(expr);
                }
            }
            Expression::ParenthesizedExpression(paren) => self.expression(&paren.expression),
            Expression::TemplateLiteral(template) => {
                for expr in &template.expressions {
                    self.expression(expr);
                }
            }
            _ => {}
        }
    }
}

fn export_name_string(name: &ModuleExportName<'_>) -> String {
    match name {
        ModuleExportName::IdentifierName(ident) => ident.name.to_string(),
        ModuleExportName::IdentifierReference(ident) => ident.name.to_string(),
        ModuleExportName::StringLiteral(literal) => literal.value.to_string(),
    }
}

#[allow(unreachable_patterns)]
fn enum_member_name(name: &TSEnumMemberName<'_>) -> Option<String> {
    match name {
        TSEnumMemberName::Identifier(ident) => Some(ident.name.to_string()),
        TSEnumMemberName::String(literal) => Some(literal.value.to_string()),
        _ => None,
    }
}

/// Public, non-constructor member names of a class body element.
fn class_member_name(element: &ClassElement<'_>) -> Option<(String, SourceSpan)> {
    let (key, span, is_private) = match element {
        ClassElement::MethodDefinition(method) => {
            if method.kind.is_constructor() {
                return None;
            }
            (
                &method.key,
                SourceSpan::new(method.span.start, method.span.end),
                matches!(method.accessibility, Some(TSAccessibility::Private)),
            )
        }
        ClassElement::PropertyDefinition(property) => (
            &property.key,
            SourceSpan::new(property.span.start, property.span.end),
            matches!(property.accessibility, Some(TSAccessibility::Private)),
        ),
        _ => return None,
    };

    if is_private {
        return None;
    }

    match key {
        PropertyKey::StaticIdentifier(ident) => Some((ident.name.to_string(), span)),
        // #private fields and computed keys are not part of the surface.
        _ => None,
    }
}

fn default_declaration_name(
    default: &oxc_ast::ast::ExportDefaultDeclaration<'_>,
) -> Option<String> {
    use oxc_ast::ast::ExportDefaultDeclarationKind;
    match &default.declaration {
        ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
            func.id.as_ref().map(|id| id.name.to_string())
        }
        ExportDefaultDeclarationKind::ClassDeclaration(class) => {
            class.id.as_ref().map(|id| id.name.to_string())
        }
        _ => None,
    }
}
