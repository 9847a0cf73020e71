use crate::Span;

use super::expressions::{
    AwaitExpr, BidirectionalPipelineExpr, BinaryExpr, BooleanExpr, CallExpr, ContextExpr,
    FunctionExpr, IndexExpr, ListExpr, MatchExpr, MemberExpr, NullExpr, NumberExpr,
    ParallelPipeExpr, PipeExpr, PipelineExpr, PipelineStage, PlaceholderExpr, ReactivePipeExpr,
    RecordEntry, RecordExpr, ReturnExpr, StringExpr, SymbolExpr, TemplateExpr, TemplatePart,
    TernaryExpr, TupleExpr, UnaryExpr, UseExpr,
};

/// Expression
///
/// The closed set of expression nodes produced by the parser. Nodes never
/// carry evaluator state, so the same tree can be evaluated, rendered or
/// inspected any number of times.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(NumberExpr),
    String(StringExpr),
    Boolean(BooleanExpr),
    Null(NullExpr),
    Template(TemplateExpr),
    Symbol(SymbolExpr),
    Placeholder(PlaceholderExpr),
    Context(ContextExpr),
    List(ListExpr),
    Tuple(TupleExpr),
    Record(RecordExpr),
    Index(IndexExpr),
    Member(MemberExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Ternary(TernaryExpr),
    Pipe(PipeExpr),
    Parallel(ParallelPipeExpr),
    Reactive(ReactivePipeExpr),
    Function(FunctionExpr),
    Call(CallExpr),
    Pipeline(PipelineExpr),
    Bidirectional(BidirectionalPipelineExpr),
    Await(AwaitExpr),
    Return(ReturnExpr),
    Match(MatchExpr),
    Use(UseExpr),
}

impl Expr {
    pub fn get_span(&self) -> &Span {
        match self {
            Expr::Number(e) => &e.span,
            Expr::String(e) => &e.span,
            Expr::Boolean(e) => &e.span,
            Expr::Null(e) => &e.span,
            Expr::Template(e) => &e.span,
            Expr::Symbol(e) => &e.span,
            Expr::Placeholder(e) => &e.span,
            Expr::Context(e) => &e.span,
            Expr::List(e) => &e.span,
            Expr::Tuple(e) => &e.span,
            Expr::Record(e) => &e.span,
            Expr::Index(e) => &e.span,
            Expr::Member(e) => &e.span,
            Expr::Unary(e) => &e.span,
            Expr::Binary(e) => &e.span,
            Expr::Ternary(e) => &e.span,
            Expr::Pipe(e) => &e.span,
            Expr::Parallel(e) => &e.span,
            Expr::Reactive(e) => &e.span,
            Expr::Function(e) => &e.span,
            Expr::Call(e) => &e.span,
            Expr::Pipeline(e) => &e.span,
            Expr::Bidirectional(e) => &e.span,
            Expr::Await(e) => &e.span,
            Expr::Return(e) => &e.span,
            Expr::Match(e) => &e.span,
            Expr::Use(e) => &e.span,
        }
    }

    /// Whether an `input` placeholder occurs in this expression.
    ///
    /// Function literals and `match` expressions bind their own `input`, so
    /// the search does not descend into them.
    pub fn contains_placeholder(&self) -> bool {
        match self {
            Expr::Placeholder(_) => true,
            Expr::Number(_)
            | Expr::String(_)
            | Expr::Boolean(_)
            | Expr::Null(_)
            | Expr::Symbol(_)
            | Expr::Context(_)
            | Expr::Function(_)
            | Expr::Match(_)
            | Expr::Use(_)
            | Expr::Pipeline(_)
            | Expr::Bidirectional(_) => false,
            Expr::Template(e) => e.parts.iter().any(|part| match part {
                TemplatePart::Text(_) => false,
                TemplatePart::Expr(expr) => expr.contains_placeholder(),
            }),
            Expr::List(e) => e.elements.iter().any(|el| el.value.contains_placeholder()),
            Expr::Tuple(e) => e.elements.iter().any(|el| el.value.contains_placeholder()),
            Expr::Record(e) => e.entries.iter().any(|entry| match entry {
                RecordEntry::Field { value, .. } => value.contains_placeholder(),
                RecordEntry::Spread(value) => value.contains_placeholder(),
            }),
            Expr::Index(e) => e.object.contains_placeholder() || e.index.contains_placeholder(),
            Expr::Member(e) => e.object.contains_placeholder(),
            Expr::Unary(e) => e.operand.contains_placeholder(),
            Expr::Binary(e) => e.left.contains_placeholder() || e.right.contains_placeholder(),
            Expr::Ternary(e) => {
                e.condition.contains_placeholder()
                    || e.then_branch.contains_placeholder()
                    || e.else_branch.contains_placeholder()
            }
            // Only the left side: the right side of a nested pipe gets its own input.
            Expr::Pipe(e) => e.left.contains_placeholder(),
            Expr::Parallel(e) => e.input.contains_placeholder(),
            Expr::Reactive(_) => false,
            Expr::Call(e) => {
                e.callee.contains_placeholder()
                    || e.arguments.iter().any(|arg| arg.value.contains_placeholder())
            }
            Expr::Await(e) => e.operand.contains_placeholder(),
            Expr::Return(e) => e.value.as_ref().is_some_and(|v| v.contains_placeholder()),
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Expr::Symbol(symbol) => Some(&symbol.value),
            _ => None,
        }
    }
}

impl PipelineStage {
    pub fn get_span(&self) -> Option<&Span> {
        match self {
            PipelineStage::Pipe(expr) | PipelineStage::Spread(expr) => Some(expr.get_span()),
            PipelineStage::Parallel(branches) => branches
                .first()
                .and_then(|branch| branch.first())
                .and_then(|stage| stage.get_span()),
        }
    }
}
