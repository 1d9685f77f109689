// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JavaScript/TypeScript syntax model
//!
//! Thin layer over tree-sitter: grammar selection by dialect, a closed
//! [`NodeKind`] for the node types the rewriter cares about, and an
//! enumeration of top-level exports.

use std::path::Path;
use thiserror::Error;
use tree_sitter::{Language, Node, Parser, Tree};

/// Identifier that marks an installed capture bootstrap
pub const BOOTSTRAP_MARKER: &str = "__snap_record";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("grammar could not be loaded: {0}")]
    Language(String),
    #[error("parser produced no tree")]
    NoTree,
    #[error("syntax error at line {line}, column {column}")]
    Invalid { line: usize, column: usize },
}

/// Source dialect, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    JavaScript,
    Jsx,
    TypeScript,
    Tsx,
}

impl Dialect {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext {
            "js" | "mjs" | "cjs" => Some(Self::JavaScript),
            "jsx" => Some(Self::Jsx),
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            _ => None,
        }
    }

    pub fn is_typescript(self) -> bool {
        matches!(self, Self::TypeScript | Self::Tsx)
    }

    fn language(self) -> Language {
        match self {
            Self::JavaScript | Self::Jsx => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Node types the rewriter distinguishes; everything else is `Other`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Program,
    HashBangLine,
    Comment,
    ExpressionStatement,
    String,
    ExportStatement,
    ExportClause,
    ExportSpecifier,
    FunctionDeclaration,
    GeneratorFunctionDeclaration,
    FunctionSignature,
    LexicalDeclaration,
    VariableDeclaration,
    VariableDeclarator,
    ArrowFunction,
    FunctionExpression,
    GeneratorFunction,
    Identifier,
    DefaultKeyword,
    Other,
}

impl NodeKind {
    pub fn of(node: Node<'_>) -> Self {
        match node.kind() {
            "program" => Self::Program,
            "hash_bang_line" => Self::HashBangLine,
            "comment" => Self::Comment,
            "expression_statement" => Self::ExpressionStatement,
            "string" => Self::String,
            "export_statement" => Self::ExportStatement,
            "export_clause" => Self::ExportClause,
            "export_specifier" => Self::ExportSpecifier,
            "function_declaration" => Self::FunctionDeclaration,
            "generator_function_declaration" => Self::GeneratorFunctionDeclaration,
            "function_signature" => Self::FunctionSignature,
            "lexical_declaration" => Self::LexicalDeclaration,
            "variable_declaration" => Self::VariableDeclaration,
            "variable_declarator" => Self::VariableDeclarator,
            "arrow_function" => Self::ArrowFunction,
            // Older grammars call function expressions `function`
            "function_expression" | "function" => Self::FunctionExpression,
            "generator_function" => Self::GeneratorFunction,
            "identifier" => Self::Identifier,
            "default" => Self::DefaultKeyword,
            _ => Self::Other,
        }
    }

    /// Declarations that define a callable body
    pub fn is_function_declaration(self) -> bool {
        matches!(
            self,
            Self::FunctionDeclaration | Self::GeneratorFunctionDeclaration
        )
    }

    /// Expressions that evaluate to a function
    pub fn is_function_expression(self) -> bool {
        matches!(
            self,
            Self::ArrowFunction | Self::FunctionExpression | Self::GeneratorFunction
        )
    }
}

/// Parse `source`, rejecting trees that contain syntax errors
pub fn parse(source: &str, dialect: Dialect) -> Result<Tree, SyntaxError> {
    let mut parser = Parser::new();
    parser
        .set_language(&dialect.language())
        .map_err(|e| SyntaxError::Language(e.to_string()))?;
    let tree = parser.parse(source, None).ok_or(SyntaxError::NoTree)?;

    let root = tree.root_node();
    if root.has_error() {
        let at = first_error(root).unwrap_or(root).start_position();
        return Err(SyntaxError::Invalid {
            line: at.row + 1,
            column: at.column + 1,
        });
    }
    Ok(tree)
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

/// Source text of a node
pub fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

fn children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// One `name = value` inside an exported variable statement
#[derive(Debug, Clone, Copy)]
pub struct Declarator<'t> {
    /// Binding pattern (usually an identifier)
    pub name: Node<'t>,
    /// True when the name is a plain identifier
    pub simple: bool,
    /// True when the initializer is an arrow or function expression
    pub is_function: bool,
}

/// What an `export` statement exports
#[derive(Debug, Clone)]
pub enum ExportKind<'t> {
    /// `export [async] function [*] name() {}`
    Function { name: Node<'t> },
    /// `export function name(): T;` (TypeScript overload)
    Signature { name: Node<'t> },
    /// `export const|let|var a = .., b = ..`
    Variables { declarators: Vec<Declarator<'t>> },
    /// `export { a, b as c }` without a source module
    Clause { exported: Vec<String> },
    /// Default exports, re-exports, classes, types and anything else
    Other,
}

/// A top-level `export` statement
#[derive(Debug, Clone)]
pub struct Export<'t> {
    pub statement: Node<'t>,
    /// The exported declaration, when there is one
    pub declaration: Option<Node<'t>>,
    pub kind: ExportKind<'t>,
}

impl<'t> Export<'t> {
    /// Names this statement makes importable
    pub fn names(&self, source: &str) -> Vec<String> {
        match &self.kind {
            ExportKind::Function { name } | ExportKind::Signature { name } => {
                vec![text(*name, source).to_string()]
            }
            ExportKind::Variables { declarators } => declarators
                .iter()
                .filter(|d| d.simple)
                .map(|d| text(d.name, source).to_string())
                .collect(),
            ExportKind::Clause { exported } => exported.clone(),
            ExportKind::Other => Vec::new(),
        }
    }
}

/// Enumerate top-level exports in source order
pub fn exports<'t>(root: Node<'t>, source: &str) -> Vec<Export<'t>> {
    named_children(root)
        .into_iter()
        .filter(|node| NodeKind::of(*node) == NodeKind::ExportStatement)
        .map(|statement| classify_export(statement, source))
        .collect()
}

fn classify_export<'t>(statement: Node<'t>, source: &str) -> Export<'t> {
    let declaration = statement.child_by_field_name("declaration");
    let is_default = children(statement)
        .iter()
        .any(|c| NodeKind::of(*c) == NodeKind::DefaultKeyword);
    let reexport = statement.child_by_field_name("source").is_some();

    let kind = match declaration {
        _ if is_default || reexport => ExportKind::Other,
        Some(decl) => classify_declaration(decl),
        None => match named_children(statement)
            .into_iter()
            .find(|c| NodeKind::of(*c) == NodeKind::ExportClause)
        {
            Some(clause) => ExportKind::Clause {
                exported: clause_names(clause, source),
            },
            None => ExportKind::Other,
        },
    };

    Export {
        statement,
        declaration,
        kind,
    }
}

fn classify_declaration(decl: Node<'_>) -> ExportKind<'_> {
    let kind = NodeKind::of(decl);
    match kind {
        _ if kind.is_function_declaration() => match decl.child_by_field_name("name") {
            Some(name) => ExportKind::Function { name },
            None => ExportKind::Other,
        },
        NodeKind::FunctionSignature => match decl.child_by_field_name("name") {
            Some(name) => ExportKind::Signature { name },
            None => ExportKind::Other,
        },
        NodeKind::LexicalDeclaration | NodeKind::VariableDeclaration => ExportKind::Variables {
            declarators: named_children(decl)
                .into_iter()
                .filter(|c| NodeKind::of(*c) == NodeKind::VariableDeclarator)
                .filter_map(declarator)
                .collect(),
        },
        _ => ExportKind::Other,
    }
}

fn declarator(node: Node<'_>) -> Option<Declarator<'_>> {
    let name = node.child_by_field_name("name")?;
    let is_function = node
        .child_by_field_name("value")
        .is_some_and(|value| NodeKind::of(value).is_function_expression());
    Some(Declarator {
        name,
        simple: NodeKind::of(name) == NodeKind::Identifier,
        is_function,
    })
}

fn clause_names(clause: Node<'_>, source: &str) -> Vec<String> {
    named_children(clause)
        .into_iter()
        .filter(|c| NodeKind::of(*c) == NodeKind::ExportSpecifier)
        .filter_map(|spec| {
            let exported = spec
                .child_by_field_name("alias")
                .or_else(|| spec.child_by_field_name("name"))?;
            let name = text(exported, source).trim_matches(|c| c == '"' || c == '\'');
            Some(name.to_string())
        })
        .filter(|name| name != "default")
        .collect()
}

/// True if a top-level declaration of the bootstrap marker exists
pub fn has_bootstrap(root: Node<'_>, source: &str) -> bool {
    named_children(root).into_iter().any(|node| {
        let kind = NodeKind::of(node);
        match kind {
            _ if kind.is_function_declaration() => node
                .child_by_field_name("name")
                .is_some_and(|name| text(name, source) == BOOTSTRAP_MARKER),
            NodeKind::LexicalDeclaration | NodeKind::VariableDeclaration => named_children(node)
                .into_iter()
                .filter_map(|d| d.child_by_field_name("name"))
                .any(|name| text(name, source) == BOOTSTRAP_MARKER),
            _ => false,
        }
    })
}

/// Byte offset just past the hashbang, leading comments and directive
/// prologue; `None` when the file starts directly with code
pub fn prologue_end(root: Node<'_>) -> Option<usize> {
    let mut end = None;
    for node in named_children(root) {
        match NodeKind::of(node) {
            NodeKind::HashBangLine | NodeKind::Comment => end = Some(node.end_byte()),
            NodeKind::ExpressionStatement if is_directive(node) => end = Some(node.end_byte()),
            _ => break,
        }
    }
    end
}

fn is_directive(statement: Node<'_>) -> bool {
    let named = named_children(statement);
    matches!(named.as_slice(), [only] if NodeKind::of(*only) == NodeKind::String)
}

#[cfg(test)]
#[path = "syntax_tests.rs"]
mod tests;
