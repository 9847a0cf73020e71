//! Unit tests for the parser module.
//!
//! Covers the precedence ladder, the pipe family and its layout rules,
//! function literals, match expressions and statement forms.

use std::rc::Rc;

use super::parser::{parse, parse_source};
use crate::{
    ast::{
        ast::Expr,
        expressions::{BinaryOperator, FunctionBody, MatchCaseKind, PipeKind, PipelineStage, TemplatePart},
        statements::{BindingTarget, Program, Stmt},
        types::TypeAnnotation,
    },
    lexer::{lexer::tokenize, tokens::TokenKind},
};

fn parse_ok(source: &str) -> Program {
    match parse_source(source, "test.pipe") {
        Ok(program) => program,
        Err(error) => panic!("failed to parse {:?}: {}", source, error),
    }
}

/// The expression of the only (or last) statement, unwrapping `let` values.
fn last_expr(program: &Program) -> &Expr {
    match program.body.last().unwrap() {
        Stmt::Expression(stmt) => &stmt.expression,
        Stmt::Let(stmt) => &stmt.value,
        other => panic!("unexpected statement {:?}", other),
    }
}

fn symbol(expr: &Expr) -> &str {
    expr.as_symbol()
        .unwrap_or_else(|| panic!("expected symbol, got {:?}", expr))
}

#[test]
fn test_parse_returns_parser_and_program() {
    let tokens = tokenize("let x = 42".to_string(), Some("test.pipe".to_string())).unwrap();
    let (parser, result) = parse(tokens, Rc::new("test.pipe".to_string()));

    assert!(result.is_ok());
    assert_eq!(parser.current_token_kind(), TokenKind::EOF);
}

#[test]
fn test_pipe_binds_tighter_than_arithmetic() {
    for (source, operator) in [
        ("a /> b + c", BinaryOperator::Add),
        ("a /> b - c", BinaryOperator::Subtract),
        ("a /> b * c", BinaryOperator::Multiply),
        ("a /> b / c", BinaryOperator::Divide),
        ("a /> b == c", BinaryOperator::Equal),
    ] {
        let program = parse_ok(source);
        let Expr::Binary(binary) = last_expr(&program) else {
            panic!("expected binary for {}", source);
        };
        assert_eq!(binary.operator, operator);
        let Expr::Pipe(pipe) = binary.left.as_ref() else {
            panic!("expected pipe on the left for {}", source);
        };
        assert_eq!(symbol(&pipe.left), "a");
        assert_eq!(symbol(&pipe.right), "b");
        assert_eq!(symbol(&binary.right), "c");
    }
}

#[test]
fn test_pipes_are_left_associative() {
    let program = parse_ok("a /> b /> c");
    let Expr::Pipe(outer) = last_expr(&program) else {
        panic!("expected pipe");
    };
    assert_eq!(symbol(&outer.right), "c");
    let Expr::Pipe(inner) = outer.left.as_ref() else {
        panic!("expected nested pipe");
    };
    assert_eq!(symbol(&inner.left), "a");
    assert_eq!(symbol(&inner.right), "b");
}

#[test]
fn test_arithmetic_precedence() {
    let program = parse_ok("1 + 2 * 3");
    let Expr::Binary(add) = last_expr(&program) else {
        panic!("expected binary");
    };
    assert_eq!(add.operator, BinaryOperator::Add);
    assert!(matches!(add.right.as_ref(), Expr::Binary(mul) if mul.operator == BinaryOperator::Multiply));
}

#[test]
fn test_logical_operators_sit_below_equality() {
    let program = parse_ok("a == 1 || b && c");
    let Expr::Binary(or) = last_expr(&program) else {
        panic!("expected binary");
    };
    assert_eq!(or.operator, BinaryOperator::Or);
    assert!(matches!(or.left.as_ref(), Expr::Binary(eq) if eq.operator == BinaryOperator::Equal));
    assert!(matches!(or.right.as_ref(), Expr::Binary(and) if and.operator == BinaryOperator::And));
}

#[test]
fn test_unary_binds_tighter_than_pipe() {
    let program = parse_ok("-x /> f");
    let Expr::Pipe(pipe) = last_expr(&program) else {
        panic!("expected pipe");
    };
    assert!(matches!(pipe.left.as_ref(), Expr::Unary(_)));
}

#[test]
fn test_ternary() {
    let program = parse_ok("x > 1 ? \"big\" : \"small\"");
    let Expr::Ternary(ternary) = last_expr(&program) else {
        panic!("expected ternary");
    };
    assert!(matches!(ternary.condition.as_ref(), Expr::Binary(_)));
}

#[test]
fn test_pipe_variants() {
    let program = parse_ok("a </ b\nc />>> d");
    let Stmt::Expression(first) = &program.body[0] else {
        panic!()
    };
    assert!(matches!(&first.expression, Expr::Pipe(p) if p.kind == PipeKind::Reverse));
    assert!(matches!(last_expr(&program), Expr::Pipe(p) if p.kind == PipeKind::Spread));
}

#[test]
fn test_pipe_into_call() {
    let program = parse_ok("5 /> add(3, input)");
    let Expr::Pipe(pipe) = last_expr(&program) else {
        panic!("expected pipe");
    };
    let Expr::Call(call) = pipe.right.as_ref() else {
        panic!("expected call");
    };
    assert_eq!(call.arguments.len(), 2);
    assert!(pipe.right.contains_placeholder());
}

#[test]
fn test_parenthesis_disambiguation() {
    assert!(matches!(last_expr(&parse_ok("(a)")), Expr::Symbol(_)));
    assert!(matches!(last_expr(&parse_ok("(a, b)")), Expr::Tuple(t) if t.elements.len() == 2));
    assert!(matches!(last_expr(&parse_ok("()")), Expr::Tuple(t) if t.elements.is_empty()));
    assert!(matches!(last_expr(&parse_ok("(1,)")), Expr::Tuple(t) if t.elements.len() == 1));
    assert!(matches!(last_expr(&parse_ok("(x) -> x")), Expr::Function(f) if !f.is_reverse));
    assert!(matches!(last_expr(&parse_ok("(x) <- x")), Expr::Function(f) if f.is_reverse));
    assert!(matches!(last_expr(&parse_ok("((a, b)) -> a")), Expr::Function(_)));
}

#[test]
fn test_function_parameters() {
    let program = parse_ok("(a, b: Int, c = 1, d: [String] = []) -> a");
    let Expr::Function(function) = last_expr(&program) else {
        panic!("expected function");
    };
    let names: Vec<&str> = function.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c", "d"]);
    assert_eq!(
        function.parameters[1].annotation,
        Some(TypeAnnotation::Named("Int".to_string()))
    );
    assert!(function.parameters[2].default.is_some());
    assert_eq!(
        function.parameters[3].annotation,
        Some(TypeAnnotation::List(Box::new(TypeAnnotation::Named(
            "String".to_string()
        ))))
    );
}

#[test]
fn test_function_signature_and_decorators() {
    let program = parse_ok("let add = (a, b) -> a + b :: (Int, Int) -> Int #memo #retry(3)");
    let Expr::Function(function) = last_expr(&program) else {
        panic!("expected function");
    };
    let signature = function.signature.as_ref().unwrap();
    assert_eq!(signature.to_string(), "(Int, Int) -> Int");
    let decorators: Vec<String> = function.decorators.iter().map(|d| d.to_string()).collect();
    assert_eq!(decorators, vec!["#memo", "#retry(3)"]);
}

#[test]
fn test_record_body_versus_block_body() {
    let program = parse_ok("(x) -> { value: x }");
    assert!(matches!(
        last_expr(&program),
        Expr::Function(f) if matches!(&f.body, FunctionBody::Expression(body) if matches!(body.as_ref(), Expr::Record(_)))
    ));

    let program = parse_ok("(x) -> { let y = x * 2; y + 1 }");
    assert!(matches!(
        last_expr(&program),
        Expr::Function(f) if matches!(&f.body, FunctionBody::Block(stmts) if stmts.len() == 2)
    ));
}

#[test]
fn test_indented_function_body() {
    let program = parse_ok("let f = (x) ->\n  let y = x * 2\n  y + 1\nlet g = 1");
    assert_eq!(program.body.len(), 2);

    let Stmt::Let(binding) = &program.body[0] else {
        panic!("expected let");
    };
    let Expr::Function(function) = &binding.value else {
        panic!("expected function");
    };
    assert!(matches!(&function.body, FunctionBody::Block(stmts) if stmts.len() == 2));
}

#[test]
fn test_indented_body_ends_at_decorator() {
    let program = parse_ok("let f = (x) ->\n  x + 1\n#memo\nf(1)");
    assert_eq!(program.body.len(), 2);
    let Stmt::Let(binding) = &program.body[0] else {
        panic!("expected let");
    };
    let Expr::Function(function) = &binding.value else {
        panic!("expected function");
    };
    assert_eq!(function.decorators.len(), 1);
    assert_eq!(function.decorators[0].name, "memo");
}

#[test]
fn test_indented_body_continues_with_pipes() {
    let program = parse_ok("let f = (xs) ->\n  xs\n    /> map(double)\n    /> sum\nf([1])");
    assert_eq!(program.body.len(), 2);
    let Stmt::Let(binding) = &program.body[0] else {
        panic!("expected let");
    };
    let Expr::Function(function) = &binding.value else {
        panic!("expected function");
    };
    let FunctionBody::Block(stmts) = &function.body else {
        panic!("expected block");
    };
    assert_eq!(stmts.len(), 1);
    assert!(matches!(&stmts[0], Stmt::Expression(e) if matches!(&e.expression, Expr::Pipe(_))));
}

#[test]
fn test_multiline_pipe_continuation() {
    let program = parse_ok("let total = xs\n  /> map(double)\n  /> sum");
    assert_eq!(program.body.len(), 1);
    let Expr::Pipe(outer) = last_expr(&program) else {
        panic!("expected pipe");
    };
    assert_eq!(symbol(&outer.right), "sum");
    assert!(matches!(outer.left.as_ref(), Expr::Pipe(_)));
}

#[test]
fn test_single_line_parallel() {
    let program = parse_ok("5 \\> addOne \\> double /> combine");
    let Expr::Pipe(pipe) = last_expr(&program) else {
        panic!("expected pipe");
    };
    assert_eq!(symbol(&pipe.right), "combine");
    let Expr::Parallel(parallel) = pipe.left.as_ref() else {
        panic!("expected parallel");
    };
    assert_eq!(parallel.branches.len(), 2);
    assert!(matches!(&parallel.branches[0][0], PipelineStage::Pipe(e) if symbol(e) == "addOne"));
    assert!(matches!(&parallel.branches[1][0], PipelineStage::Pipe(e) if symbol(e) == "double"));
}

#[test]
fn test_multiline_parallel_with_nested_stages() {
    let source = "let r = 5\n  \\> addOne\n      /> double\n  \\> triple\n  /> combine";
    let program = parse_ok(source);
    assert_eq!(program.body.len(), 1);

    let Expr::Pipe(pipe) = last_expr(&program) else {
        panic!("expected pipe");
    };
    assert_eq!(symbol(&pipe.right), "combine");
    let Expr::Parallel(parallel) = pipe.left.as_ref() else {
        panic!("expected parallel");
    };
    assert_eq!(parallel.branches.len(), 2);
    assert_eq!(parallel.branches[0].len(), 2);
    assert_eq!(parallel.branches[1].len(), 1);
}

#[test]
fn test_branch_function_body_does_not_consume_enclosing_pipes() {
    let program = parse_ok("5 \\> (x) -> x + 1 \\> double /> combine");
    let Expr::Pipe(pipe) = last_expr(&program) else {
        panic!("expected pipe");
    };
    let Expr::Parallel(parallel) = pipe.left.as_ref() else {
        panic!("expected parallel");
    };
    assert_eq!(parallel.branches.len(), 2);
    assert!(matches!(&parallel.branches[0][0], PipelineStage::Pipe(Expr::Function(f))
        if matches!(&f.body, FunctionBody::Expression(body) if matches!(body.as_ref(), Expr::Binary(_)))));
}

#[test]
fn test_reactive_pipe() {
    let program = parse_ok("count @> double /> inc");
    let Expr::Reactive(reactive) = last_expr(&program) else {
        panic!("expected reactive");
    };
    assert_eq!(reactive.source, "count");
    assert_eq!(reactive.stages.len(), 2);
}

#[test]
fn test_reactive_pipe_requires_bare_identifier() {
    let error = parse_source("[1] @> double", "test.pipe").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedToken");
}

#[test]
fn test_pipeline_literal() {
    let program = parse_ok("let p = /> double />>> inc \\> a \\> b :: (Int) -> Int #validate");
    let Expr::Pipeline(pipeline) = last_expr(&program) else {
        panic!("expected pipeline");
    };
    assert_eq!(pipeline.stages.len(), 3);
    assert!(matches!(&pipeline.stages[1], PipelineStage::Spread(_)));
    assert!(matches!(&pipeline.stages[2], PipelineStage::Parallel(branches) if branches.len() == 2));
    assert!(pipeline.signature.is_some());
    assert_eq!(pipeline.decorators[0].name, "validate");
}

#[test]
fn test_pipeline_literal_stage_function_stops_at_next_stage() {
    let program = parse_ok("let p = /> (x) -> x + 1 /> double");
    let Expr::Pipeline(pipeline) = last_expr(&program) else {
        panic!("expected pipeline");
    };
    assert_eq!(pipeline.stages.len(), 2);
    assert_eq!(last_expr(&program).to_string(), "/> (x) -> (x + 1) /> double");
}

#[test]
fn test_bidirectional_literal() {
    let program = parse_ok("let codec = </> encode </> compress");
    let Expr::Bidirectional(pipeline) = last_expr(&program) else {
        panic!("expected bidirectional pipeline");
    };
    assert_eq!(pipeline.stages.len(), 2);
}

#[test]
fn test_match_cases() {
    let program = parse_ok("match 0 | 0 -> \"zero\" | 1 -> \"one\" | \"other\"");
    let Expr::Match(expr) = last_expr(&program) else {
        panic!("expected match");
    };
    assert_eq!(expr.cases.len(), 3);
    assert!(matches!(expr.cases[0].kind, MatchCaseKind::Pattern(_)));
    assert!(matches!(expr.cases[2].kind, MatchCaseKind::Default));
}

#[test]
fn test_multiline_match_with_guards() {
    let program = parse_ok("let size = match n\n  | if input > 100 -> \"huge\"\n  | if input > 10 -> \"big\"\n  | \"small\"\nsize");
    assert_eq!(program.body.len(), 2);
    let Stmt::Let(binding) = &program.body[0] else {
        panic!("expected let");
    };
    let Expr::Match(expr) = &binding.value else {
        panic!("expected match");
    };
    assert_eq!(expr.cases.len(), 3);
    assert!(matches!(expr.cases[0].kind, MatchCaseKind::Guard(_)));
}

#[test]
fn test_tuple_pattern_is_not_a_function() {
    let program = parse_ok("match pair | (1, 2) -> \"one-two\" | \"other\"");
    let Expr::Match(expr) = last_expr(&program) else {
        panic!("expected match");
    };
    assert!(matches!(&expr.cases[0].kind, MatchCaseKind::Pattern(Expr::Tuple(_))));
}

#[test]
fn test_template_string() {
    let program = parse_ok("`a ${x + 1} b`");
    let Expr::Template(template) = last_expr(&program) else {
        panic!("expected template");
    };
    assert_eq!(template.parts.len(), 3);
    assert!(matches!(&template.parts[1], TemplatePart::Expr(Expr::Binary(_))));
}

#[test]
fn test_invalid_interpolation() {
    let error = parse_source("`a ${1 +} b`", "test.pipe").unwrap_err();
    assert_eq!(error.get_error_name(), "InvalidInterpolation");
}

#[test]
fn test_collections_and_access() {
    let program = parse_ok("[1, ...xs][0]\n{ a: 1, \"b\": 2, ...rest, c }.a");
    assert!(matches!(&program.body[0], Stmt::Expression(e) if matches!(&e.expression, Expr::Index(_))));
    let Expr::Member(member) = last_expr(&program) else {
        panic!("expected member");
    };
    assert_eq!(member.property, "a");
    assert!(matches!(member.object.as_ref(), Expr::Record(r) if r.entries.len() == 4));
}

#[test]
fn test_statements() {
    let program = parse_ok(
        "#strict\nmaybe count = 0\ncount := count + 1\nand double = (x) <- x / 2\ncontext Theme = \"light\"\nprovide Theme \"dark\"\ndecorator twice = (f) -> (x) -> f(f(x))\nlet { a, b } = rec; let [x, y] = xs",
    );
    assert!(program.has_pragma("strict"));
    assert!(matches!(&program.body[1], Stmt::Let(s) if s.mutable));
    assert!(matches!(&program.body[2], Stmt::Assign(s) if s.name == "count"));
    assert!(matches!(&program.body[3], Stmt::And(s) if s.name == "double"));
    assert!(matches!(&program.body[4], Stmt::Context(s) if s.name == "Theme"));
    assert!(matches!(&program.body[5], Stmt::Provide(s) if s.name == "Theme"));
    assert!(matches!(&program.body[6], Stmt::Decorator(s) if s.name == "twice"));
    assert!(matches!(&program.body[7], Stmt::Let(s) if s.target == BindingTarget::Record(vec!["a".to_string(), "b".to_string()])));
    assert!(matches!(&program.body[8], Stmt::Let(s) if matches!(s.target, BindingTarget::List(_))));
}

#[test]
fn test_labeled_block() {
    let program = parse_ok("{-- Setup --}\nlet a = 1\nlet b = 2\n{/--}\na + b");
    assert_eq!(program.body.len(), 2);
    assert!(matches!(&program.body[0], Stmt::Block(block) if block.label == "Setup" && block.body.len() == 2));
}

#[test]
fn test_exports() {
    let program = parse_ok("let add = (a, b) -> a + b #export\nlet hidden = 1\nlet pi = 3.14 #export");
    assert_eq!(program.exports(), vec!["add".to_string(), "pi".to_string()]);
}

#[test]
fn test_use_and_context_read() {
    let program = parse_ok("let math = use \"./math\"\n@Theme");
    assert!(matches!(&program.body[0], Stmt::Let(s) if matches!(&s.value, Expr::Use(u) if u.path == "./math")));
    assert!(matches!(last_expr(&program), Expr::Context(c) if c.name == "Theme"));
}

#[test]
fn test_unexpected_token_aborts() {
    let error = parse_source("let x = 1 2", "test.pipe").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedToken");
    assert_eq!(error.get_position().column, 11);

    assert!(parse_source("let = 5", "test.pipe").is_err());
    assert!(parse_source("(a, b", "test.pipe").is_err());
}
