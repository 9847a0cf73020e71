use crate::Span;

use super::{ast::Expr, statements::Stmt, types::TypeSignature, types::TypeAnnotation};

// LITERALS

/// Number Expression
/// Represents a numeric literal in the AST.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberExpr {
    pub value: f64,
    pub span: Span,
}

/// String Expression
#[derive(Debug, Clone, PartialEq)]
pub struct StringExpr {
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BooleanExpr {
    pub value: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NullExpr {
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text(String),
    Expr(Expr),
}

/// Template Expression
/// A backtick string; parts alternate between literal text and embedded expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateExpr {
    pub parts: Vec<TemplatePart>,
    pub span: Span,
}

/// Symbol Expression
/// Represents an identifier in the AST. This includes functions.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolExpr {
    pub value: String,
    pub span: Span,
}

/// Placeholder Expression
/// `input`: the value currently flowing through a pipe or being matched.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderExpr {
    pub span: Span,
}

/// `@Name`
#[derive(Debug, Clone, PartialEq)]
pub struct ContextExpr {
    pub name: String,
    pub span: Span,
}

// COLLECTIONS

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub value: Expr,
    pub spread: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListExpr {
    pub elements: Vec<Element>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleExpr {
    pub elements: Vec<Element>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordEntry {
    Field { key: String, value: Expr },
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordExpr {
    pub entries: Vec<RecordEntry>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub object: Box<Expr>,
    pub index: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    pub object: Box<Expr>,
    pub property: String,
    pub span: Span,
}

// OPERATORS

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub operator: UnaryOperator,
    pub operand: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Concat,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Concat => "++",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        }
    }
}

/// Binary Expression
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub operator: BinaryOperator,
    pub right: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TernaryExpr {
    pub condition: Box<Expr>,
    pub then_branch: Box<Expr>,
    pub else_branch: Box<Expr>,
    pub span: Span,
}

// PIPES

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeKind {
    /// `/>`
    Sequential,
    /// `</`
    Reverse,
    /// `/>>>`
    Spread,
}

/// Pipe Expression
/// `left /> right` and its reverse and spread variants.
#[derive(Debug, Clone, PartialEq)]
pub struct PipeExpr {
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub kind: PipeKind,
    pub span: Span,
}

/// One step of a pipeline literal, a parallel branch or a reactive chain.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStage {
    Pipe(Expr),
    Spread(Expr),
    /// Fan-out: every branch receives the same value, results feed the next stage in order.
    Parallel(Vec<Vec<PipelineStage>>),
}

/// Parallel Pipe Expression
/// `input \> a \> b`; each branch is its own stage list.
#[derive(Debug, Clone, PartialEq)]
pub struct ParallelPipeExpr {
    pub input: Box<Expr>,
    pub branches: Vec<Vec<PipelineStage>>,
    pub span: Span,
}

/// Reactive Pipe Expression
/// `source @> f /> g`, recomputed lazily when `source` is reassigned.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactivePipeExpr {
    pub source: String,
    pub stages: Vec<PipelineStage>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineExpr {
    pub stages: Vec<PipelineStage>,
    pub signature: Option<TypeSignature>,
    pub decorators: Vec<Decorator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BidirectionalPipelineExpr {
    pub stages: Vec<Expr>,
    pub decorators: Vec<Decorator>,
    pub span: Span,
}

// FUNCTIONS

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub default: Option<Expr>,
    pub annotation: Option<TypeAnnotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Expression(Box<Expr>),
    Block(Vec<Stmt>),
}

/// `#name` or `#name(arguments)` trailing a function, pipeline or binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Decorator {
    pub name: String,
    pub arguments: Vec<Expr>,
    pub span: Span,
}

/// Function Expression
/// `(a, b) -> body` or, for the reverse half of a reversible function, `(a) <- body`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpr {
    pub parameters: Vec<Parameter>,
    pub body: FunctionBody,
    pub decorators: Vec<Decorator>,
    pub signature: Option<TypeSignature>,
    pub is_reverse: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub value: Expr,
    pub spread: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub arguments: Vec<Argument>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AwaitExpr {
    pub operand: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnExpr {
    pub value: Option<Box<Expr>>,
    pub span: Span,
}

// MATCH

#[derive(Debug, Clone, PartialEq)]
pub enum MatchCaseKind {
    Pattern(Expr),
    Guard(Expr),
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchCase {
    pub kind: MatchCaseKind,
    pub body: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchExpr {
    pub scrutinee: Box<Expr>,
    pub cases: Vec<MatchCase>,
    pub span: Span,
}

/// `use "path"`
#[derive(Debug, Clone, PartialEq)]
pub struct UseExpr {
    pub path: String,
    pub span: Span,
}
