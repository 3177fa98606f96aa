//! Semantic Analysis for Rovar
//!
//! Performs:
//! - Symbol table management (scope stack, declarations)
//! - Declared-before-used checking
//! - Duplicate-declaration checking
//! - Type agreement checking
//!
//! The pass is a single depth-first walk, left subtree before right, and is
//! fail-fast: the first failing check's diagnostic is returned and nothing
//! further is visited. Tree nodes carry no source positions, so semantic
//! diagnostics use the `0,0` position sentinel.

use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::frontend::ast::{Node, NodeKind};
use crate::utils::{Diagnostic, DiagnosticKind, Result};

// ==================== Symbol Table ====================

/// Inferred type of a declared name or expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Int,
    Str,
    Bool,
    /// Declared without initializer; agrees with everything until the
    /// first assignment narrows it
    Unknown,
}

impl VarType {
    /// Two types agree when equal or when either side is still unknown.
    fn compatible(self, other: VarType) -> bool {
        self == other || self == VarType::Unknown || other == VarType::Unknown
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VarType::Int => "int",
            VarType::Str => "string",
            VarType::Bool => "bool",
            VarType::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// Symbol information
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub ty: VarType,
}

/// Symbol table: a stack of scopes, innermost last.
pub struct SymbolTable {
    scopes: Vec<HashMap<String, Symbol>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        // Global scope
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    /// Enter a new scope (block entry)
    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Exit the current scope (block exit), dropping its symbols
    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Define a symbol in the current scope. Shadowing an outer scope is
    /// allowed; a second definition in the same scope is not.
    pub fn define(&mut self, symbol: Symbol) -> Result<()> {
        if self.lookup_local(&symbol.name).is_some() {
            return Err(Diagnostic::semantic(
                DiagnosticKind::DuplicateDeclaration,
                format!("Variable '{}' already declared in this scope", symbol.name),
            ));
        }
        let scope = self.scopes.last_mut().expect("scope stack is never empty");
        scope.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Look up a name from the innermost scope outward
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Look up a name in the current scope only
    pub fn lookup_local(&self, name: &str) -> Option<&Symbol> {
        self.scopes.last().and_then(|scope| scope.get(name))
    }

    /// Narrow the recorded type of a visible name (first assignment to a
    /// declaration without initializer).
    fn bind_type(&mut self, name: &str, ty: VarType) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(symbol) = scope.get_mut(name) {
                symbol.ty = ty;
                return;
            }
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== Semantic Analyzer ====================

/// Semantic analyzer
pub struct SemanticAnalyzer {
    symbols: SymbolTable,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
        }
    }

    /// Validate a tree against the language rules. Returns the first
    /// failing check's diagnostic; a tree with no nodes is vacuously valid.
    pub fn analyze(&mut self, root: &Node) -> Result<()> {
        self.check_node(root)?;
        debug!("semantic analysis passed");
        Ok(())
    }

    fn check_node(&mut self, node: &Node) -> Result<()> {
        match node.kind {
            NodeKind::Program => self.check_stmt_chain(node.left.as_deref()),
            NodeKind::Statement => self.check_stmt_chain(Some(node)),
            NodeKind::VarDecl | NodeKind::Block => self.check_stmt(node),
            _ => self.check_expr(node).map(|_| ()),
        }
    }

    /// Walk a right-threaded chain of `Statement` nodes in order.
    fn check_stmt_chain(&mut self, mut stmt: Option<&Node>) -> Result<()> {
        while let Some(node) = stmt {
            if let Some(content) = node.left.as_deref() {
                self.check_stmt(content)?;
            }
            stmt = node.right.as_deref();
        }
        Ok(())
    }

    /// Validate one statement's content node.
    fn check_stmt(&mut self, node: &Node) -> Result<()> {
        match node.kind {
            NodeKind::VarDecl => self.check_var_decl(node),
            NodeKind::Block => {
                self.symbols.enter_scope();
                let result = self.check_stmt_chain(node.left.as_deref());
                self.symbols.exit_scope();
                result
            }
            _ => self.check_expr(node).map(|_| ()),
        }
    }

    /// A declaration defines its name only after its initializer has been
    /// checked, so `var x = x;` is an undeclared use.
    fn check_var_decl(&mut self, node: &Node) -> Result<()> {
        let ty = match node.left.as_deref() {
            Some(init) => self.check_expr(init)?,
            None => VarType::Unknown,
        };
        let name = match &node.text {
            Some(name) => name.clone(),
            None => {
                return Err(Diagnostic::semantic(
                    DiagnosticKind::Unknown,
                    "declaration without a name",
                ))
            }
        };
        self.symbols.define(Symbol { name, ty })
    }

    /// Type-check an expression subtree, producing its inferred type.
    fn check_expr(&mut self, node: &Node) -> Result<VarType> {
        match node.kind {
            NodeKind::Number => Ok(VarType::Int),
            NodeKind::Str => Ok(VarType::Str),
            NodeKind::Identifier => {
                let name = node.text.as_deref().unwrap_or("");
                match self.symbols.lookup(name) {
                    Some(symbol) => Ok(symbol.ty),
                    None => Err(undeclared(name)),
                }
            }
            NodeKind::Expression => match node.left.as_deref() {
                Some(inner) => self.check_expr(inner),
                None => Ok(VarType::Unknown),
            },
            NodeKind::BinaryOp => self.check_binary(node),
            NodeKind::Unknown => Err(Diagnostic::semantic(
                DiagnosticKind::Unknown,
                "unclassified construct in syntax tree",
            )),
            NodeKind::Program | NodeKind::Statement | NodeKind::VarDecl | NodeKind::Block => {
                Err(Diagnostic::semantic(
                    DiagnosticKind::Unknown,
                    format!("{:?} node in expression position", node.kind),
                ))
            }
        }
    }

    /// Left operand first, then right, then the operator's own rule.
    fn check_binary(&mut self, node: &Node) -> Result<VarType> {
        let op = node.text.as_deref().unwrap_or("");
        if op == "=" {
            return self.check_assignment(node);
        }

        let left = match node.left.as_deref() {
            Some(n) => self.check_expr(n)?,
            None => VarType::Unknown,
        };
        let right = match node.right.as_deref() {
            Some(n) => self.check_expr(n)?,
            None => VarType::Unknown,
        };

        match op {
            "+" | "-" | "*" | "/" => {
                if left.compatible(VarType::Int) && right.compatible(VarType::Int) {
                    Ok(VarType::Int)
                } else {
                    Err(Diagnostic::semantic(
                        DiagnosticKind::TypeError,
                        format!("operator '{op}' needs int operands, got {left} and {right}"),
                    ))
                }
            }
            "==" | "!=" | "<" | "<=" | ">" | ">=" => {
                if left.compatible(right) {
                    Ok(VarType::Bool)
                } else {
                    Err(Diagnostic::semantic(
                        DiagnosticKind::TypeError,
                        format!("cannot compare {left} and {right}"),
                    ))
                }
            }
            _ => Err(Diagnostic::semantic(
                DiagnosticKind::Unknown,
                format!("unknown operator '{op}'"),
            )),
        }
    }

    /// Assignment: the left side must be a declared identifier and the
    /// right side must agree with its declared type.
    fn check_assignment(&mut self, node: &Node) -> Result<VarType> {
        let target = match node.left.as_deref() {
            Some(n) if n.kind == NodeKind::Identifier => n,
            _ => {
                return Err(Diagnostic::semantic(
                    DiagnosticKind::TypeError,
                    "left side of assignment is not assignable",
                ))
            }
        };
        let name = target.text.as_deref().unwrap_or("");
        let declared = match self.symbols.lookup(name) {
            Some(symbol) => symbol.ty,
            None => return Err(undeclared(name)),
        };

        let value = match node.right.as_deref() {
            Some(n) => self.check_expr(n)?,
            None => VarType::Unknown,
        };
        if !declared.compatible(value) {
            return Err(Diagnostic::semantic(
                DiagnosticKind::TypeError,
                format!("cannot assign {value} to '{name}' of type {declared}"),
            ));
        }

        if declared == VarType::Unknown && value != VarType::Unknown {
            self.symbols.bind_type(name, value);
            return Ok(value);
        }
        Ok(declared)
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn undeclared(name: &str) -> Diagnostic {
    Diagnostic::semantic(
        DiagnosticKind::UndeclaredVariable,
        format!("Variable '{name}' undeclared"),
    )
}
