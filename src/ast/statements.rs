use crate::Span;

use super::{ast::Expr, expressions::Decorator};

/// Left-hand side of a `let`/`maybe` binding.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingTarget {
    Name(String),
    Record(Vec<String>),
    List(Vec<String>),
    Tuple(Vec<String>),
}

impl BindingTarget {
    pub fn names(&self) -> Vec<&str> {
        match self {
            BindingTarget::Name(name) => vec![name.as_str()],
            BindingTarget::Record(names)
            | BindingTarget::List(names)
            | BindingTarget::Tuple(names) => names.iter().map(|n| n.as_str()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LetStmt {
    pub target: BindingTarget,
    pub mutable: bool,
    pub value: Expr,
    pub decorators: Vec<Decorator>,
    pub span: Span,
}

/// `and name = ...`: adds an overload or the reverse half to an existing binding.
#[derive(Debug, Clone, PartialEq)]
pub struct AndStmt {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

/// `name := value`
#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextDefStmt {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProvideStmt {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecoratorDefStmt {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

/// `{-- label --}` ... `{/--}`
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledBlockStmt {
    pub label: String,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// `#strict` at statement position.
#[derive(Debug, Clone, PartialEq)]
pub struct PragmaStmt {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStmt {
    pub expression: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let(LetStmt),
    And(AndStmt),
    Assign(AssignStmt),
    Context(ContextDefStmt),
    Provide(ProvideStmt),
    Decorator(DecoratorDefStmt),
    Block(LabeledBlockStmt),
    Pragma(PragmaStmt),
    Expression(ExpressionStmt),
}

impl Stmt {
    pub fn get_span(&self) -> &Span {
        match self {
            Stmt::Let(stmt) => &stmt.span,
            Stmt::And(stmt) => &stmt.span,
            Stmt::Assign(stmt) => &stmt.span,
            Stmt::Context(stmt) => &stmt.span,
            Stmt::Provide(stmt) => &stmt.span,
            Stmt::Decorator(stmt) => &stmt.span,
            Stmt::Block(stmt) => &stmt.span,
            Stmt::Pragma(stmt) => &stmt.span,
            Stmt::Expression(stmt) => &stmt.span,
        }
    }
}

/// A parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl Program {
    /// Names bound by top-level `let` statements carrying `#export`.
    pub fn exports(&self) -> Vec<String> {
        let mut names = vec![];
        for stmt in &self.body {
            let Stmt::Let(binding) = stmt else { continue };
            let exported = binding.decorators.iter().any(|d| d.name == "export")
                || matches!(&binding.value, Expr::Function(f) if f.decorators.iter().any(|d| d.name == "export"));
            if exported {
                names.extend(binding.target.names().into_iter().map(String::from));
            }
        }
        names
    }

    pub fn has_pragma(&self, name: &str) -> bool {
        self.body
            .iter()
            .any(|stmt| matches!(stmt, Stmt::Pragma(pragma) if pragma.name == name))
    }
}
