//! Source-like rendering of AST nodes.
//!
//! Pipelines are inspectable at runtime, so their stages must be printable
//! without keeping the original source text around.

use std::fmt::{Display, Formatter, Result};

use super::{
    ast::Expr,
    expressions::{
        Decorator, FunctionBody, MatchCaseKind, PipeKind, PipelineStage, RecordEntry,
        TemplatePart, UnaryOperator,
    },
    statements::{BindingTarget, Stmt},
};

/// Integral numbers print without a fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn join<T: Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

fn spread_prefix(spread: bool) -> &'static str {
    if spread {
        "..."
    } else {
        ""
    }
}

impl Display for Decorator {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if self.arguments.is_empty() {
            write!(f, "#{}", self.name)
        } else {
            write!(f, "#{}({})", self.name, join(&self.arguments, ", "))
        }
    }
}

fn write_decorators(f: &mut Formatter<'_>, decorators: &[Decorator]) -> Result {
    for decorator in decorators {
        write!(f, " {}", decorator)?;
    }
    Ok(())
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            PipelineStage::Pipe(expr) => write!(f, "/> {}", expr),
            PipelineStage::Spread(expr) => write!(f, "/>>> {}", expr),
            PipelineStage::Parallel(branches) => {
                let rendered: Vec<String> = branches
                    .iter()
                    .map(|branch| render_branch(branch))
                    .collect();
                write!(f, "{}", rendered.join(" "))
            }
        }
    }
}

/// `\> first /> nested` for one fan-out branch.
pub fn render_branch(branch: &[PipelineStage]) -> String {
    let mut out = String::from("\\>");
    for (i, stage) in branch.iter().enumerate() {
        match (i, stage) {
            (0, PipelineStage::Pipe(expr)) => out.push_str(&format!(" {}", expr)),
            _ => out.push_str(&format!(" {}", stage)),
        }
    }
    out
}

impl Display for FunctionBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            FunctionBody::Expression(expr) => write!(f, "{}", expr),
            FunctionBody::Block(stmts) => write!(f, "{{ {} }}", join(stmts, "; ")),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Expr::Number(e) => write!(f, "{}", format_number(e.value)),
            Expr::String(e) => write!(f, "{:?}", e.value),
            Expr::Boolean(e) => write!(f, "{}", e.value),
            Expr::Null(_) => write!(f, "null"),
            Expr::Template(e) => {
                write!(f, "`")?;
                for part in &e.parts {
                    match part {
                        TemplatePart::Text(text) => write!(f, "{}", text)?,
                        TemplatePart::Expr(expr) => write!(f, "${{{}}}", expr)?,
                    }
                }
                write!(f, "`")
            }
            Expr::Symbol(e) => write!(f, "{}", e.value),
            Expr::Placeholder(_) => write!(f, "input"),
            Expr::Context(e) => write!(f, "@{}", e.name),
            Expr::List(e) => {
                let items: Vec<String> = e
                    .elements
                    .iter()
                    .map(|el| format!("{}{}", spread_prefix(el.spread), el.value))
                    .collect();
                write!(f, "[{}]", items.join(", "))
            }
            Expr::Tuple(e) => {
                let items: Vec<String> = e
                    .elements
                    .iter()
                    .map(|el| format!("{}{}", spread_prefix(el.spread), el.value))
                    .collect();
                if items.len() == 1 {
                    write!(f, "({},)", items[0])
                } else {
                    write!(f, "({})", items.join(", "))
                }
            }
            Expr::Record(e) => {
                let items: Vec<String> = e
                    .entries
                    .iter()
                    .map(|entry| match entry {
                        RecordEntry::Field { key, value } => format!("{}: {}", key, value),
                        RecordEntry::Spread(value) => format!("...{}", value),
                    })
                    .collect();
                write!(f, "{{ {} }}", items.join(", "))
            }
            Expr::Index(e) => write!(f, "{}[{}]", e.object, e.index),
            Expr::Member(e) => write!(f, "{}.{}", e.object, e.property),
            Expr::Unary(e) => match e.operator {
                UnaryOperator::Negate => write!(f, "-{}", e.operand),
                UnaryOperator::Not => write!(f, "!{}", e.operand),
            },
            Expr::Binary(e) => write!(f, "({} {} {})", e.left, e.operator.symbol(), e.right),
            Expr::Ternary(e) => write!(
                f,
                "({} ? {} : {})",
                e.condition, e.then_branch, e.else_branch
            ),
            Expr::Pipe(e) => {
                let operator = match e.kind {
                    PipeKind::Sequential => "/>",
                    PipeKind::Reverse => "</",
                    PipeKind::Spread => "/>>>",
                };
                write!(f, "{} {} {}", e.left, operator, e.right)
            }
            Expr::Parallel(e) => {
                write!(f, "{}", e.input)?;
                for branch in &e.branches {
                    write!(f, " {}", render_branch(branch))?;
                }
                Ok(())
            }
            Expr::Reactive(e) => {
                write!(f, "{} @>", e.source)?;
                for (i, stage) in e.stages.iter().enumerate() {
                    match (i, stage) {
                        (0, PipelineStage::Pipe(expr)) => write!(f, " {}", expr)?,
                        _ => write!(f, " {}", stage)?,
                    }
                }
                Ok(())
            }
            Expr::Function(e) => {
                let params: Vec<String> = e
                    .parameters
                    .iter()
                    .map(|p| {
                        let mut out = p.name.clone();
                        if let Some(annotation) = &p.annotation {
                            out.push_str(&format!(": {}", annotation));
                        }
                        if let Some(default) = &p.default {
                            out.push_str(&format!(" = {}", default));
                        }
                        out
                    })
                    .collect();
                let arrow = if e.is_reverse { "<-" } else { "->" };
                write!(f, "({}) {} {}", params.join(", "), arrow, e.body)?;
                if let Some(signature) = &e.signature {
                    write!(f, " :: {}", signature)?;
                }
                write_decorators(f, &e.decorators)
            }
            Expr::Call(e) => {
                let args: Vec<String> = e
                    .arguments
                    .iter()
                    .map(|arg| format!("{}{}", spread_prefix(arg.spread), arg.value))
                    .collect();
                write!(f, "{}({})", e.callee, args.join(", "))
            }
            Expr::Pipeline(e) => {
                write!(f, "{}", join(&e.stages, " "))?;
                if let Some(signature) = &e.signature {
                    write!(f, " :: {}", signature)?;
                }
                write_decorators(f, &e.decorators)
            }
            Expr::Bidirectional(e) => {
                let stages: Vec<String> = e.stages.iter().map(|s| format!("</> {}", s)).collect();
                write!(f, "{}", stages.join(" "))?;
                write_decorators(f, &e.decorators)
            }
            Expr::Await(e) => write!(f, "await {}", e.operand),
            Expr::Return(e) => match &e.value {
                Some(value) => write!(f, "return {}", value),
                None => write!(f, "return"),
            },
            Expr::Match(e) => {
                write!(f, "match {}", e.scrutinee)?;
                for case in &e.cases {
                    match &case.kind {
                        MatchCaseKind::Pattern(pattern) => {
                            write!(f, " | {} -> {}", pattern, case.body)?
                        }
                        MatchCaseKind::Guard(guard) => {
                            write!(f, " | if {} -> {}", guard, case.body)?
                        }
                        MatchCaseKind::Default => write!(f, " | {}", case.body)?,
                    }
                }
                Ok(())
            }
            Expr::Use(e) => write!(f, "use {:?}", e.path),
        }
    }
}

impl Display for BindingTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            BindingTarget::Name(name) => write!(f, "{}", name),
            BindingTarget::Record(names) => write!(f, "{{ {} }}", names.join(", ")),
            BindingTarget::List(names) => write!(f, "[{}]", names.join(", ")),
            BindingTarget::Tuple(names) => write!(f, "({})", names.join(", ")),
        }
    }
}

impl Display for Stmt {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Stmt::Let(stmt) => {
                let keyword = if stmt.mutable { "maybe" } else { "let" };
                write!(f, "{} {} = {}", keyword, stmt.target, stmt.value)?;
                write_decorators(f, &stmt.decorators)
            }
            Stmt::And(stmt) => write!(f, "and {} = {}", stmt.name, stmt.value),
            Stmt::Assign(stmt) => write!(f, "{} := {}", stmt.name, stmt.value),
            Stmt::Context(stmt) => write!(f, "context {} = {}", stmt.name, stmt.value),
            Stmt::Provide(stmt) => write!(f, "provide {} {}", stmt.name, stmt.value),
            Stmt::Decorator(stmt) => write!(f, "decorator {} = {}", stmt.name, stmt.value),
            Stmt::Block(stmt) => {
                write!(f, "{{-- {} --}} {} {{/--}}", stmt.label, join(&stmt.body, "; "))
            }
            Stmt::Pragma(stmt) => write!(f, "#{}", stmt.name),
            Stmt::Expression(stmt) => write!(f, "{}", stmt.expression),
        }
    }
}
