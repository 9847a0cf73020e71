//! End-to-end tests: source text through tokenizing, parsing and evaluation.

use std::rc::Rc;

use pipelang::{
    ast::{ast::Expr, expressions::BinaryOperator, statements::Stmt},
    errors::errors::{LangError, RuntimeErrorKind},
    interpreter::{
        interpreter::Interpreter, modules::StaticModuleLoader, options::InterpreterOptions,
        value::Value,
    },
    lexer::lexer::tokenize,
    parser::parser::{parse, parse_source},
    run_source,
};

fn run(source: &str) -> Value {
    match run_source(source, "main.pipe", InterpreterOptions::default()) {
        Ok(value) => value,
        Err(error) => panic!("{:?} failed: {}", source, error),
    }
}

fn runtime_error(source: &str, options: InterpreterOptions) -> RuntimeErrorKind {
    match run_source(source, "main.pipe", options) {
        Err(LangError::Runtime(error)) => error.kind,
        Err(other) => panic!("expected a runtime error, got {}", other),
        Ok(value) => panic!("expected {:?} to fail, got {:?}", source, value),
    }
}

fn numbers(values: &[f64]) -> Value {
    Value::List(values.iter().map(|n| Value::Number(*n)).collect())
}

#[test]
fn test_pipe_and_arithmetic_parse_the_same_as_parenthesized() {
    for operator in ["+", "-", "*", "/", "%"] {
        let bare = parse_source(&format!("a /> b {} c", operator), "main.pipe").unwrap();
        let grouped = parse_source(&format!("(a /> b) {} c", operator), "main.pipe").unwrap();
        assert_eq!(bare.body[0].to_string(), grouped.body[0].to_string());
    }

    let program = parse_source("a /> b /> c", "main.pipe").unwrap();
    let Stmt::Expression(stmt) = &program.body[0] else {
        panic!("expected expression statement");
    };
    let Expr::Pipe(outer) = &stmt.expression else {
        panic!("expected pipe");
    };
    assert_eq!(outer.right.to_string(), "c");
    assert_eq!(outer.left.to_string(), "a /> b");
}

#[test]
fn test_pipe_result_feeds_arithmetic() {
    let program = parse_source("x /> double * 2", "main.pipe").unwrap();
    let Stmt::Expression(stmt) = &program.body[0] else {
        panic!("expected expression statement");
    };
    assert!(matches!(&stmt.expression, Expr::Binary(b) if b.operator == BinaryOperator::Multiply));
    assert_eq!(run("let double = (x) -> x * 2\n3 /> double * 2"), Value::Number(12.0));
}

#[test]
fn test_pipe_substitution_matches_direct_call() {
    let prelude = "let add = (a, b) -> a * 10 + b\n";
    assert_eq!(run(&format!("{}5 /> add(3)", prelude)), run(&format!("{}add(5, 3)", prelude)));
    assert_eq!(
        run(&format!("{}5 /> add(3, input)", prelude)),
        run(&format!("{}add(3, 5)", prelude))
    );
}

#[test]
fn test_reversible_round_trip() {
    let prelude = "let double = (x) -> x * 2\nand double = (x) <- x / 2\n";
    for x in [0.0, 1.0, -3.5, 1024.0] {
        assert_eq!(
            run(&format!("{}{} /> double </ double == {}", prelude, x, x)),
            Value::Bool(true)
        );
    }
}

#[test]
fn test_memo_body_runs_once() {
    let source = "maybe runs = 0
let slow = (n) ->
  runs := runs + 1
  n * 100
#memo
[slow(2), slow(2), slow(2), slow(3), runs]";
    assert_eq!(run(source), numbers(&[200.0, 200.0, 200.0, 300.0, 2.0]));
}

#[test]
fn test_first_true_guard_wins() {
    let source = "let size = (n) -> match n
  | if input > 10 -> \"big\"
  | if input > 5 -> \"medium\"
  | \"small\"
[size(50), size(7), size(1)]";
    assert_eq!(
        run(source),
        Value::List(vec![
            Value::string("big"),
            Value::string("medium"),
            Value::string("small")
        ])
    );
}

#[test]
fn test_overload_resolution() {
    let prelude = "let area = (r: Number) -> r * r * 3
and area = (w: Number, h: Number) -> w * h
";
    assert_eq!(run(&format!("{}[area(2), area(2, 5)]", prelude)), numbers(&[12.0, 10.0]));
    assert!(matches!(
        runtime_error(&format!("{}area(1, 2, 3)", prelude), InterpreterOptions::default()),
        RuntimeErrorKind::NoMatchingOverload { .. }
    ));
    assert!(matches!(
        runtime_error(
            "let f = (x: Number) -> 1\nand f = (x: Int) -> 2\nf(4)",
            InterpreterOptions::default()
        ),
        RuntimeErrorKind::AmbiguousOverload { .. }
    ));
}

#[test]
fn test_reactive_recomputes_once_per_mutation() {
    let source = "maybe price = 10
maybe runs = 0
let track = (x) -> { runs := runs + 1; x }
let total = price @> track /> (x) -> x * 2
let first = total.value
let second = total.value
let before = runs
price := 20
[first, second, before, total.value, total.value, runs]";
    assert_eq!(run(source), numbers(&[20.0, 20.0, 1.0, 40.0, 40.0, 2.0]));
}

#[test]
fn test_parallel_results_follow_input_order() {
    let source = "let job = (ms) -> await delay(ms, ms) #async
await parallel([50, 5, 20, 1], job)";
    assert_eq!(run(source), numbers(&[50.0, 5.0, 20.0, 1.0]));
}

#[test]
fn test_filter_map_reduce_scenario() {
    assert_eq!(
        run("[1,2,3] /> filter((x)->x>1) /> map((x)->x*x) /> reduce(0,(acc,x)->acc+x)"),
        Value::Number(13.0)
    );
}

#[test]
fn test_parallel_pipe_scenario() {
    let source = "let addOne = (x) -> x + 1
let double = (x) -> x * 2
let combine = (a, b) -> [a, b]
5 \\> addOne \\> double /> combine";
    assert_eq!(run(source), numbers(&[6.0, 10.0]));
}

#[test]
fn test_multiline_parallel_pipe() {
    let source = "let addOne = (x) -> x + 1
let double = (x) -> x * 2
let combine = (a, b) -> [a, b]
let result = 5
  \\> addOne
      /> double
  \\> double
  /> combine
result";
    assert_eq!(run(source), numbers(&[12.0, 10.0]));
}

#[test]
fn test_match_scenario() {
    assert_eq!(
        run("match 0 | 0 -> \"zero\" | 1 -> \"one\" | \"other\""),
        Value::string("zero")
    );
}

#[test]
fn test_strict_mode_scenario() {
    let source = "let inc = (x) -> x + 1 :: (Int) -> Int\ninc(\"7\")";
    assert!(matches!(
        runtime_error(source, InterpreterOptions::strict()),
        RuntimeErrorKind::TypeMismatch { .. }
    ));
    assert_eq!(
        run_source(source, "main.pipe", InterpreterOptions::default()).unwrap(),
        Value::string("71")
    );
}

#[test]
fn test_errors_carry_positions() {
    let error = run_source("let x = 1\nlet y = x + missing", "main.pipe", InterpreterOptions::default())
        .unwrap_err();
    assert_eq!(error.get_error_name(), "UndefinedBinding");
    let position = error.get_position().unwrap();
    assert_eq!((position.line, position.column), (2, 13));
    assert_eq!(error.to_string(), "main.pipe:2:13: undefined binding `missing`");

    let error = run_source("let x = $", "main.pipe", InterpreterOptions::default()).unwrap_err();
    assert!(matches!(error, LangError::Syntax(_)));
    assert_eq!(error.get_error_name(), "UnrecognisedToken");
}

#[test]
fn test_module_import() {
    let loader = StaticModuleLoader::new().with_module(
        "./strings",
        "let shout = (s) -> upper(s) ++ \"!\" #export\nlet whisper = (s) -> lower(s)",
    );
    let tokens = tokenize(
        "let { shout } = use \"./strings\"\n\"hey\" /> shout".to_string(),
        Some("main.pipe".to_string()),
    )
    .unwrap();
    let (_, program) = parse(tokens, Rc::new("main.pipe".to_string()));

    let mut interpreter = Interpreter::new(InterpreterOptions::default()).with_module_loader(loader);
    assert_eq!(interpreter.interpret(&program.unwrap()).unwrap(), Value::string("HEY!"));
}

#[test]
fn test_data_pipeline_program() {
    let source = "{-- Data --}
let orders = [
  { item: \"tea\", qty: 2, price: 3 },
  { item: \"cake\", qty: 1, price: 5 },
  { item: \"tea\", qty: 1, price: 3 }
]
{/--}
let lineTotal = (order) -> order.qty * order.price
let report = /> map(lineTotal) /> sum
let total = orders /> report
`total: ${total}`";
    assert_eq!(run(source), Value::string("total: 14"));
}
