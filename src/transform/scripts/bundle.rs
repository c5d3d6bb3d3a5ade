//! Module graph bundler.
//!
//! Modules are numbered breadth-first from the entry (id `0`). Each one is
//! parsed with oxc, lowered to the configured target when it belongs to the
//! project, and rewritten to a CommonJS function body by span edits:
//!
//! - `import`/`export` declarations become `require(<id>)` calls and
//!   getters registered through `__kiln.define`,
//! - `require("x")` specifiers are replaced with module ids,
//! - `import("x")` becomes a promise of the required module,
//! - `process.env.NODE_ENV` becomes a string literal.
//!
//! Imported bindings are read once when the import statement runs; exports
//! are live getters.

use super::resolve::resolve;
use crate::embed::bundle::{RUNTIME_JS, RuntimeVars};
use oxc::allocator::Allocator;
use oxc::ast::ast::{
    Argument, BindingIdentifier, CallExpression, Declaration,
    ExportDefaultDeclarationKind, Expression, ImportDeclarationSpecifier, ImportExpression,
    Program, Statement, StaticMemberExpression,
};
use oxc::ast_visit::{Visit, walk};
use oxc::codegen::Codegen;
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::{GetSpan, SourceType, Span};
use oxc::transformer::{TransformOptions, Transformer};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

/// A finished bundle.
#[derive(Debug)]
pub struct Bundle {
    pub code: String,
    /// Module paths by id.
    pub modules: Vec<PathBuf>,
}

pub struct Bundler<'a> {
    root: &'a Path,
    transform: TransformOptions,
    node_env: &'a str,
}

impl<'a> Bundler<'a> {
    /// `target` is an oxc/esbuild-style target such as `es2015`.
    pub fn new(root: &'a Path, target: &str, node_env: &'a str) -> Result<Self, String> {
        let transform = TransformOptions::from_target(target)
            .map_err(|e| format!("invalid target `{target}`: {e}"))?;
        Ok(Self {
            root,
            transform,
            node_env,
        })
    }

    pub fn bundle(&self, entry: &Path) -> Result<Bundle, String> {
        let mut ids: FxHashMap<PathBuf, usize> = FxHashMap::default();
        let mut queue = VecDeque::new();
        let mut modules = Vec::new();
        let mut bodies = Vec::new();

        ids.insert(entry.to_path_buf(), 0);
        queue.push_back(entry.to_path_buf());

        while let Some(path) = queue.pop_front() {
            let display = self.display(&path);
            let dir = path.parent().unwrap_or(self.root).to_path_buf();

            let mut require = |specifier: &str| -> Result<usize, String> {
                let target = resolve(&dir, specifier)?;
                let next = ids.len();
                let id = *ids.entry(target.clone()).or_insert_with(|| {
                    queue.push_back(target);
                    next
                });
                Ok(id)
            };

            let body = self.load(&path, &display, &mut require)?;
            bodies.push(format!(
                "/* {display} */\nfunction (module, exports, require, __kiln) {{\n{body}\n}}"
            ));
            modules.push(path);
        }

        crate::debug!("scripts"; "bundled {} modules", modules.len());
        let code = RUNTIME_JS.render(&RuntimeVars {
            modules: bodies.join(",\n"),
        });
        Ok(Bundle { code, modules })
    }

    fn display(&self, path: &Path) -> String {
        path.strip_prefix(self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    fn load(
        &self,
        path: &Path,
        display: &str,
        require: &mut dyn FnMut(&str) -> Result<usize, String>,
    ) -> Result<String, String> {
        let source = fs::read_to_string(path).map_err(|e| format!("{display}: {e}"))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str::<serde_json::Value>(&source)
                .map_err(|e| format!("{display}: {e}"))?;
            return Ok(format!("module.exports = {};", source.trim()));
        }

        let code = if is_dependency(path) {
            source
        } else {
            self.lower(path, display, &source)?
        };
        rewrite(&code, display, self.node_env, require)
    }

    /// Run the oxc transformer over a project module.
    fn lower(&self, path: &Path, display: &str, source: &str) -> Result<String, String> {
        let allocator = Allocator::default();
        let mut program = parse(&allocator, source, display)?;
        let scoping = SemanticBuilder::new()
            .build(&program)
            .semantic
            .into_scoping();
        let ret = Transformer::new(&allocator, path, &self.transform)
            .build_with_scoping(scoping, &mut program);
        if let Some(err) = ret.errors.first() {
            return Err(format!("{display}: {err}"));
        }
        Ok(Codegen::new().build(&program).code)
    }
}

/// Third-party code is bundled as published.
fn is_dependency(path: &Path) -> bool {
    path.components()
        .any(|c| c.as_os_str() == "node_modules")
}

/// Parse as an ES module, falling back to a sloppy-mode script.
fn parse<'a>(allocator: &'a Allocator, code: &'a str, display: &str) -> Result<Program<'a>, String> {
    let ret = Parser::new(allocator, code, SourceType::mjs()).parse();
    if ret.errors.is_empty() && !ret.panicked {
        return Ok(ret.program);
    }

    let script = Parser::new(allocator, code, SourceType::cjs()).parse();
    if script.errors.is_empty() && !script.panicked {
        return Ok(script.program);
    }

    let message = ret
        .errors
        .iter()
        .map(|e| format!("{display}: {e}"))
        .collect::<Vec<_>>()
        .join("\n");
    Err(message)
}

/// Rewrite one module to a CommonJS function body.
pub fn rewrite(
    code: &str,
    display: &str,
    node_env: &str,
    require: &mut dyn FnMut(&str) -> Result<usize, String>,
) -> Result<String, String> {
    let allocator = Allocator::default();
    let program = parse(&allocator, code, display)?;

    let mut rewriter = Rewriter {
        edits: Vec::new(),
        exports: Vec::new(),
        esm: false,
        temps: 0,
        node_env,
        require,
        error: None,
    };
    for stmt in &program.body {
        rewriter.statement(stmt);
    }
    rewriter.visit_program(&program);

    if let Some(err) = rewriter.error {
        return Err(format!("{display}: {err}"));
    }
    Ok(rewriter.finish(code))
}

struct Edit {
    span: Span,
    text: String,
}

struct Rewriter<'r> {
    edits: Vec<Edit>,
    /// (exported name, expression) pairs for `__kiln.define`
    exports: Vec<(String, String)>,
    esm: bool,
    temps: usize,
    node_env: &'r str,
    require: &'r mut dyn FnMut(&str) -> Result<usize, String>,
    error: Option<String>,
}

impl Rewriter<'_> {
    fn replace(&mut self, span: Span, text: impl Into<String>) {
        self.edits.push(Edit {
            span,
            text: text.into(),
        });
    }

    fn temp(&mut self) -> String {
        self.temps += 1;
        format!("__kiln_m{}", self.temps)
    }

    fn export(&mut self, name: impl Into<String>, expr: impl Into<String>) {
        self.exports.push((name.into(), expr.into()));
    }

    fn module_id(&mut self, specifier: &str) -> Option<usize> {
        match (self.require)(specifier) {
            Ok(id) => Some(id),
            Err(e) => {
                self.error.get_or_insert(e);
                None
            }
        }
    }

    fn statement(&mut self, stmt: &Statement<'_>) {
        match stmt {
            Statement::ImportDeclaration(decl) => {
                self.esm = true;
                let Some(id) = self.module_id(&decl.source.value) else {
                    return;
                };
                let specifiers: &[ImportDeclarationSpecifier<'_>] = match &decl.specifiers {
                    Some(specifiers) => specifiers,
                    None => &[],
                };
                if specifiers.is_empty() {
                    self.replace(decl.span, format!("require({id});"));
                    return;
                }

                let m = self.temp();
                let mut text = format!("var {m} = require({id});");
                for spec in specifiers {
                    let binding = match spec {
                        ImportDeclarationSpecifier::ImportSpecifier(s) => format!(
                            " var {} = {m}[{}];",
                            s.local.name,
                            js_string(&s.imported.name())
                        ),
                        ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                            format!(" var {} = __kiln.interop({m}).default;", s.local.name)
                        }
                        ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                            format!(" var {} = {m};", s.local.name)
                        }
                    };
                    text.push_str(&binding);
                }
                self.replace(decl.span, text);
            }
            Statement::ExportAllDeclaration(decl) => {
                self.esm = true;
                let Some(id) = self.module_id(&decl.source.value) else {
                    return;
                };
                match &decl.exported {
                    Some(name) => {
                        let m = self.temp();
                        self.replace(decl.span, format!("var {m} = require({id});"));
                        self.export(name.name().to_string(), m);
                    }
                    None => {
                        self.replace(
                            decl.span,
                            format!("__kiln.reexport(exports, require({id}));"),
                        );
                    }
                }
            }
            Statement::ExportNamedDeclaration(decl) => {
                self.esm = true;
                if let Some(source) = &decl.source {
                    let Some(id) = self.module_id(&source.value) else {
                        return;
                    };
                    let m = self.temp();
                    self.replace(decl.span, format!("var {m} = require({id});"));
                    for spec in &decl.specifiers {
                        let expr = format!("{m}[{}]", js_string(&spec.local.name()));
                        self.export(spec.exported.name().to_string(), expr);
                    }
                } else if let Some(declaration) = &decl.declaration {
                    self.replace(Span::new(decl.span.start, declaration.span().start), "");
                    for name in declared_names(declaration) {
                        self.export(name.clone(), name);
                    }
                } else {
                    self.replace(decl.span, "");
                    for spec in &decl.specifiers {
                        self.export(spec.exported.name().to_string(), spec.local.name().to_string());
                    }
                }
            }
            Statement::ExportDefaultDeclaration(decl) => {
                self.esm = true;
                let inner = decl.declaration.span();
                let prefix = Span::new(decl.span.start, inner.start);
                let named = match &decl.declaration {
                    ExportDefaultDeclarationKind::FunctionDeclaration(f) => f.id.as_ref(),
                    ExportDefaultDeclarationKind::ClassDeclaration(c) => c.id.as_ref(),
                    _ => None,
                };
                match named {
                    Some(ident) => {
                        self.replace(prefix, "");
                        self.export("default", ident.name.to_string());
                    }
                    None => {
                        self.replace(prefix, "var __kiln_default = ");
                        if matches!(
                            decl.declaration,
                            ExportDefaultDeclarationKind::FunctionDeclaration(_)
                                | ExportDefaultDeclarationKind::ClassDeclaration(_)
                        ) {
                            self.replace(Span::new(inner.end, inner.end), ";");
                        }
                        self.export("default", "__kiln_default");
                    }
                }
            }
            _ => {}
        }
    }

    /// Apply edits and prepend the export header.
    fn finish(mut self, code: &str) -> String {
        self.edits.sort_by_key(|e| (e.span.start, e.span.end));

        let mut out = String::with_capacity(code.len() + 256);
        if self.esm {
            out.push_str("__kiln.define(exports, {");
            for (i, (name, expr)) in self.exports.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&format!(
                    " {}: function () {{ return {expr}; }}",
                    js_string(name)
                ));
            }
            out.push_str(" });\n");
        }

        let mut cursor = 0usize;
        for edit in &self.edits {
            let start = edit.span.start as usize;
            let end = edit.span.end as usize;
            if start < cursor {
                continue;
            }
            out.push_str(&code[cursor..start]);
            out.push_str(&edit.text);
            cursor = end;
        }
        out.push_str(&code[cursor..]);
        out
    }
}

impl<'a> Visit<'a> for Rewriter<'_> {
    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        if let Expression::Identifier(callee) = &it.callee
            && callee.name.as_str() == "require"
            && it.arguments.len() == 1
            && let Argument::StringLiteral(lit) = &it.arguments[0]
        {
            if let Some(id) = self.module_id(&lit.value) {
                self.replace(lit.span, id.to_string());
            }
            return;
        }
        walk::walk_call_expression(self, it);
    }

    fn visit_import_expression(&mut self, it: &ImportExpression<'a>) {
        let Expression::StringLiteral(lit) = &it.source else {
            self.error
                .get_or_insert_with(|| "import() needs a string literal specifier".into());
            return;
        };
        if let Some(id) = self.module_id(&lit.value) {
            self.replace(
                it.span,
                format!(
                    "Promise.resolve().then(function () {{ return __kiln.interop(require({id})); }})"
                ),
            );
        }
    }

    fn visit_static_member_expression(&mut self, it: &StaticMemberExpression<'a>) {
        if it.property.name.as_str() == "NODE_ENV"
            && let Expression::StaticMemberExpression(env) = &it.object
            && env.property.name.as_str() == "env"
            && let Expression::Identifier(process) = &env.object
            && process.name.as_str() == "process"
        {
            let value = js_string(self.node_env);
            self.replace(it.span, value);
            return;
        }
        walk::walk_static_member_expression(self, it);
    }
}

/// Names bound by an exported declaration.
fn declared_names(declaration: &Declaration<'_>) -> Vec<String> {
    let mut names = BindingNames(Vec::new());
    match declaration {
        Declaration::VariableDeclaration(var) => {
            for declarator in &var.declarations {
                names.visit_binding_pattern(&declarator.id);
            }
        }
        Declaration::FunctionDeclaration(f) => {
            if let Some(id) = &f.id {
                names.visit_binding_identifier(id);
            }
        }
        Declaration::ClassDeclaration(c) => {
            if let Some(id) = &c.id {
                names.visit_binding_identifier(id);
            }
        }
        _ => {}
    }
    names.0
}

/// Collects binding identifiers of a pattern, skipping default values.
struct BindingNames(Vec<String>);

impl<'a> Visit<'a> for BindingNames {
    fn visit_binding_identifier(&mut self, it: &BindingIdentifier<'a>) {
        self.0.push(it.name.to_string());
    }

    fn visit_expression(&mut self, _: &Expression<'a>) {}
}

fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}
