use std::collections::BTreeMap;

use crate::{
    errors::errors::{RuntimeError, RuntimeErrorKind},
    on_evaluation_stack,
    parser::parser::parse_source,
};

use super::{
    format::{canonical_key, format_value, repr_value},
    interpreter::Interpreter,
    modules::StaticModuleLoader,
    options::InterpreterOptions,
    value::Value,
};

fn evaluate(interpreter: &mut Interpreter, source: &str) -> Result<Value, RuntimeError> {
    let program = match parse_source(source, "test.pipe") {
        Ok(program) => program,
        Err(error) => panic!("failed to parse {:?}: {}", source, error),
    };
    interpreter.interpret(&program)
}

fn run(source: &str) -> Value {
    run_with(source, InterpreterOptions::default())
}

fn run_with(source: &str, options: InterpreterOptions) -> Value {
    let mut interpreter = Interpreter::new(options);
    evaluate(&mut interpreter, source)
        .unwrap_or_else(|error| panic!("failed to run {:?}: {}", source, error))
}

fn run_err(source: &str) -> RuntimeErrorKind {
    run_err_with(source, InterpreterOptions::default())
}

fn run_err_with(source: &str, options: InterpreterOptions) -> RuntimeErrorKind {
    let mut interpreter = Interpreter::new(options);
    match evaluate(&mut interpreter, source) {
        Ok(value) => panic!("expected {:?} to fail, got {}", source, repr_value(&value)),
        Err(error) => error.kind,
    }
}

fn num(n: f64) -> Value {
    Value::Number(n)
}

fn list(items: Vec<Value>) -> Value {
    Value::List(items)
}

#[test]
fn test_arithmetic_and_strings() {
    assert_eq!(run("1 + 2 * 3"), num(7.0));
    assert_eq!(run("(1 + 2) * 3"), num(9.0));
    assert_eq!(run("7 % 4 - 1"), num(2.0));
    assert_eq!(run("\"a\" + 1"), Value::string("a1"));
    assert_eq!(run("\"ab\" ++ \"cd\""), Value::string("abcd"));
    assert_eq!(run("[1] ++ [2, 3]"), list(vec![num(1.0), num(2.0), num(3.0)]));
    assert_eq!(run("!true || 2 > 1"), Value::Bool(true));
    assert_eq!(run("1 > 2 ? \"big\" : \"small\""), Value::string("small"));
}

#[test]
fn test_division_by_zero() {
    assert_eq!(run_err("1 / 0"), RuntimeErrorKind::DivisionByZero);
    assert_eq!(run_err("1 % 0"), RuntimeErrorKind::DivisionByZero);
}

#[test]
fn test_bindings_and_assignment() {
    assert_eq!(run("maybe count = 1\ncount := count + 1\ncount"), num(2.0));
    assert_eq!(
        run_err("let x = 1\nx := 2"),
        RuntimeErrorKind::ImmutableAssignment {
            name: "x".to_string()
        }
    );
    assert_eq!(
        run_err("missing := 2"),
        RuntimeErrorKind::UndefinedBinding {
            name: "missing".to_string()
        }
    );
    assert_eq!(
        run_err("nothing + 1"),
        RuntimeErrorKind::UndefinedBinding {
            name: "nothing".to_string()
        }
    );
}

#[test]
fn test_error_position() {
    let mut interpreter = Interpreter::new(InterpreterOptions::default());
    let error = evaluate(&mut interpreter, "let x = 1\noops").unwrap_err();
    let position = error.position.as_ref().expect("position");
    assert_eq!((position.line, position.column), (2, 1));
    assert!(error.to_string().starts_with("test.pipe:2:1: "));
}

#[test]
fn test_destructuring() {
    let source = "let { a, b } = { a: 1, b: 2 }\nlet [x, y] = [3, 4]\nlet (p, q) = (5, 6)\na + b + x + y + p + q";
    assert_eq!(run(source), num(21.0));
    assert!(matches!(
        run_err("let [x, y] = [1]"),
        RuntimeErrorKind::IndexOutOfBounds { index: 1, length: 1 }
    ));
}

#[test]
fn test_index_and_members() {
    let source = "let xs = [1, 2, 3]\n[xs[-1], xs.length, \"abc\".length, { a: 1 }.a, \"abc\"[1]]";
    assert_eq!(
        run(source),
        list(vec![num(3.0), num(3.0), num(3.0), num(1.0), Value::string("b")])
    );
    assert_eq!(
        run_err("[1][5]"),
        RuntimeErrorKind::IndexOutOfBounds {
            index: 5,
            length: 1
        }
    );
    assert!(matches!(run_err("{ a: 1 }.b"), RuntimeErrorKind::FieldNotFound { .. }));
}

#[test]
fn test_records_and_spread() {
    let value = run("let base = { a: 1 }\nlet xs = [2, 3]\n[{ ...base, b: 2 }, [1, ...xs]]");
    let mut record = BTreeMap::new();
    record.insert("a".to_string(), num(1.0));
    record.insert("b".to_string(), num(2.0));
    assert_eq!(
        value,
        list(vec![
            Value::Record(record),
            list(vec![num(1.0), num(2.0), num(3.0)])
        ])
    );
}

#[test]
fn test_template_strings() {
    assert_eq!(run("let name = \"pipe\"\n`hi ${name}, ${1 + 1}!`"), Value::string("hi pipe, 2!"));
}

#[test]
fn test_closures_and_defaults() {
    assert_eq!(
        run("let makeAdder = (n) -> (x) -> x + n\nlet add5 = makeAdder(5)\nadd5(10)"),
        num(15.0)
    );
    assert_eq!(
        run("let greet = (name, greeting = \"hi\") -> greeting ++ \" \" ++ name\ngreet(\"bob\")"),
        Value::string("hi bob")
    );
    assert!(matches!(
        run_err("let greet = (name, greeting = \"hi\") -> name\ngreet()"),
        RuntimeErrorKind::ArityMismatch { expected: 1, received: 0, .. }
    ));
    assert_eq!(run("let first = (a) -> a\nfirst(1, 2, 3)"), num(1.0));
}

#[test]
fn test_not_callable() {
    assert!(matches!(run_err("let x = 1\nx(2)"), RuntimeErrorKind::NotCallable { .. }));
}

#[test]
fn test_early_return() {
    assert_eq!(run("let f = (x) -> { return x * 2; 99 }\nf(4)"), num(8.0));
    assert_eq!(run("return 5\n6"), num(5.0));
}

#[test]
fn test_indented_body() {
    let source = "let f = (x) ->\n  let y = x * 2\n  y + 1\nf(4)";
    assert_eq!(run(source), num(9.0));
}

#[test]
fn test_pipe_substitution() {
    let prelude = "let sub = (a, b) -> a - b\n";
    assert_eq!(run(&format!("{}5 /> sub(3)", prelude)), num(2.0));
    assert_eq!(run(&format!("{}5 /> sub(3, input)", prelude)), num(-2.0));
    assert_eq!(run("5 /> [input, input]"), list(vec![num(5.0), num(5.0)]));
}

#[test]
fn test_pipe_binds_tighter_than_arithmetic() {
    assert_eq!(run("let double = (x) -> x * 2\n3 /> double + 1"), num(7.0));
}

#[test]
fn test_filter_map_reduce() {
    let source = "[1,2,3] /> filter((x)->x>1) /> map((x)->x*x) /> reduce(0,(acc,x)->acc+x)";
    assert_eq!(run(source), num(13.0));
}

#[test]
fn test_parallel_pipe() {
    let prelude = "let addOne = (x) -> x + 1\nlet double = (x) -> x * 2\nlet combine = (a, b) -> [a, b]\n";
    assert_eq!(
        run(&format!("{}5 \\> addOne \\> double /> combine", prelude)),
        list(vec![num(6.0), num(10.0)])
    );
    assert_eq!(
        run(&format!("{}5 \\> addOne \\> double", prelude)),
        list(vec![num(6.0), num(10.0)])
    );
}

#[test]
fn test_spread_pipe() {
    assert_eq!(
        run("[10, 20] />>> (x, i) -> x + i"),
        list(vec![num(10.0), num(21.0)])
    );
    assert!(matches!(
        run_err("let double = (x) -> x * 2\n5 />>> double"),
        RuntimeErrorKind::TypeError { .. }
    ));
}

#[test]
fn test_spread_into_call_passes_index_before_arguments() {
    let source = "let scale = (x, i, factor) -> x * factor + i\n[10, 20] />>> scale(3)";
    assert_eq!(run(source), list(vec![num(30.0), num(61.0)]));
}

#[test]
fn test_reversible_round_trip() {
    let prelude = "let double = (x) -> x * 2\nand double = (x) <- x / 2\n";
    assert_eq!(run(&format!("{}7 /> double </ double == 7", prelude)), Value::Bool(true));
    assert_eq!(run(&format!("{}8 </ double", prelude)), num(4.0));
    assert!(matches!(
        run_err("let inc = (x) -> x + 1\n5 </ inc"),
        RuntimeErrorKind::NotReversible { .. }
    ));
}

#[test]
fn test_bidirectional_pipeline() {
    let source = "let double = (x) -> x * 2\nand double = (x) <- x / 2\nlet inc = (x) -> x + 1\nand inc = (x) <- x - 1\nlet codec = </> double </> inc\n[3 /> codec, 7 </ codec]";
    assert_eq!(run(source), list(vec![num(7.0), num(3.0)]));
}

#[test]
fn test_pipeline_values() {
    let source = "let inc = (x) -> x + 1\nlet double = (x) -> x * 2\nlet p = /> inc /> double\nlet q = p.push(inc)\n[p(3), q(3), p.length, q.length, p.reverse()(3), p.slice(1)(3), p.concat(q).length]";
    assert_eq!(
        run(source),
        list(vec![
            num(8.0),
            num(9.0),
            num(2.0),
            num(3.0),
            num(7.0),
            num(6.0),
            num(5.0)
        ])
    );
    assert_eq!(
        run("let inc = (x) -> x + 1\nlet p = /> inc\np.stages"),
        list(vec![Value::string("/> inc")])
    );
}

#[test]
fn test_match() {
    assert_eq!(run("match 0 | 0 -> \"zero\" | 1 -> \"one\" | \"other\""), Value::string("zero"));
    assert_eq!(run("match 7 | 0 -> \"zero\" | \"other\""), Value::string("other"));
    assert_eq!(
        run("match 50 | if input > 10 -> \"big\" | if input > 5 -> \"medium\" | \"small\""),
        Value::string("big")
    );
    assert!(matches!(run_err("match 3 | 1 -> \"one\""), RuntimeErrorKind::NoMatchingCase { .. }));
}

#[test]
fn test_overload_resolution() {
    let prelude = "let describe = (x: Int) -> \"int\"\nand describe = (x: String) -> \"string\"\nand describe = (x: Int, y: Int) -> \"pair\"\n";
    assert_eq!(
        run(&format!("{}[describe(1), describe(\"a\"), describe(1, 2)]", prelude)),
        list(vec![Value::string("int"), Value::string("string"), Value::string("pair")])
    );
    assert!(matches!(
        run_err(&format!("{}describe(true)", prelude)),
        RuntimeErrorKind::NoMatchingOverload { .. }
    ));
    assert!(matches!(
        run_err(&format!("{}describe(1, 2, 3)", prelude)),
        RuntimeErrorKind::NoMatchingOverload { .. }
    ));
    assert!(matches!(
        run_err("let f = (x: Int) -> 1\nand f = (x: Any) -> 2\nf(3)"),
        RuntimeErrorKind::AmbiguousOverload { candidates: 2, .. }
    ));
    assert!(matches!(
        run_err("let g = (x) -> x\nand g = (x: Int) -> x"),
        RuntimeErrorKind::MissingSignature { .. }
    ));
}

#[test]
fn test_overloads_need_every_parameter_typed() {
    assert!(matches!(
        run_err("let h = (x: Int, y) -> x\nand h = (x: String) -> x"),
        RuntimeErrorKind::MissingSignature { .. }
    ));
    assert!(matches!(
        run_err("let h = (x: Int) -> x\nand h = (x: Int, y) -> x"),
        RuntimeErrorKind::MissingSignature { .. }
    ));
    assert_eq!(
        run("let h = (x: Int) -> \"one\"\nand h = (x, y) -> \"two\" :: (Int, Int) -> String\nh(1, 2)"),
        Value::string("two")
    );
}

#[test]
fn test_strict_mode() {
    let source = "let inc = (x) -> x + 1 :: (Int) -> Int\ninc(\"a\")";
    assert!(matches!(
        run_err_with(source, InterpreterOptions::strict()),
        RuntimeErrorKind::TypeMismatch { .. }
    ));
    assert_eq!(run(source), Value::string("a1"));
    assert!(matches!(
        run_err(&format!("#strict\n{}", source)),
        RuntimeErrorKind::TypeMismatch { .. }
    ));
    assert!(matches!(
        run_err("let inc = (x) -> x + 1 :: (Int) -> Int #validate\ninc(\"a\")"),
        RuntimeErrorKind::TypeMismatch { .. }
    ));
    assert!(matches!(
        run_err_with("let bad = (x) -> \"s\" :: (Int) -> Int\nbad(1)", InterpreterOptions::strict()),
        RuntimeErrorKind::TypeMismatch { .. }
    ));
}

#[test]
fn test_memo_runs_body_once() {
    let source = "maybe calls = 0\nlet square = (x) -> { calls := calls + 1; x * x } #memo\nsquare(4); square(4); square(4)\n[square(4), calls]";
    assert_eq!(run(source), list(vec![num(16.0), num(1.0)]));
}

#[test]
fn test_user_decorators_compose_in_source_order() {
    let source = "decorator addTen = (f) -> (x) -> f(x) + 10\ndecorator twice = (f) -> (x) -> f(x) * 2\nlet base = (x) -> x #addTen #twice\nbase(1)";
    assert_eq!(run(source), num(22.0));
    assert!(matches!(
        run_err("let f = (x) -> x #nonexistent\nf(1)"),
        RuntimeErrorKind::UndefinedDecorator { .. }
    ));
}

#[test]
fn test_conversion_decorators() {
    assert_eq!(run("let add = (a, b) -> a + b #coerce(Int)\nadd(\"2\", \"3\")"), num(5.0));
    assert_eq!(run("let show = (x) -> x * 2 #stringify\nshow(4)"), Value::string("8"));
    assert_eq!(run("let inc = (x) -> x + 1 #parse\ninc(\"41\")"), num(42.0));
    assert_eq!(run("let half = (x) -> x / 2 #tease(Int)\nhalf(5)"), num(2.0));
    assert!(matches!(
        run_err("let add = (a, b) -> a + b #coerce(Int)\nadd(\"a\", 1)"),
        RuntimeErrorKind::TypeError { .. }
    ));
}

#[test]
fn test_retry() {
    let source = "maybe attempts = 0\nlet flaky = () -> { attempts := attempts + 1; attempts < 3 ? fail(\"boom\") : \"ok\" } #retry(5)\n[flaky(), attempts]";
    assert_eq!(run(source), list(vec![Value::string("ok"), num(3.0)]));
    assert!(matches!(
        run_err("let always = () -> fail(\"nope\") #retry(2)\nalways()"),
        RuntimeErrorKind::RetryExhausted { attempts: 3, .. }
    ));
}

#[test]
fn test_contexts() {
    let source = "context Theme = \"light\"\nlet read = () -> @Theme\nlet before = read()\nprovide Theme \"dark\"\n[before, read()]";
    assert_eq!(run(source), list(vec![Value::string("light"), Value::string("dark")]));

    let scoped = "context Theme = \"light\"\nlet f = () -> { provide Theme \"dark\"; @Theme }\n[f(), @Theme]";
    assert_eq!(run(scoped), list(vec![Value::string("dark"), Value::string("light")]));

    assert!(matches!(run_err("@Missing"), RuntimeErrorKind::UndefinedContext { .. }));
}

#[test]
fn test_reactive_caching() {
    let source = "maybe count = 1\nlet double = (x) -> x * 2\nlet doubled = count @> double\nlet a = doubled.value\nlet b = doubled.value\nlet before = doubled.computations\ncount := 5\nlet dirty = doubled.dirty\n[a, b, before, dirty, doubled.value, doubled.computations]";
    assert_eq!(
        run(source),
        list(vec![
            num(2.0),
            num(2.0),
            num(1.0),
            Value::Bool(true),
            num(10.0),
            num(2.0)
        ])
    );
}

#[test]
fn test_redeclared_source_invalidates_reactive() {
    let source = "maybe x = 1\nlet double = (v) -> v * 2\nlet r = x @> double\nlet a = r.value\nmaybe x = 5\n[a, r.dirty, r.value, r.computations]";
    assert_eq!(
        run(source),
        list(vec![num(2.0), Value::Bool(true), num(10.0), num(2.0)])
    );
}

#[test]
fn test_async_parallel_preserves_order() {
    let source = "let fetch = (ms) -> await delay(ms, ms * 10) #async\nlet results = await parallel([30, 10, 20], fetch)\n[results, clock()]";
    assert_eq!(
        run(source),
        list(vec![list(vec![num(300.0), num(100.0), num(200.0)]), num(30.0)])
    );
}

#[test]
fn test_async_parallel_limit() {
    let source = "let fetch = (ms) -> await delay(ms, ms) #async\nlet results = await parallel([30, 10, 20], fetch, { limit: 1 })\n[results, clock()]";
    assert_eq!(
        run(source),
        list(vec![list(vec![num(30.0), num(10.0), num(20.0)]), num(60.0)])
    );
}

#[test]
fn test_race_and_then() {
    assert_eq!(
        run("let slow = delay(50, \"slow\")\nlet fast = delay(10, \"fast\")\n[await race([slow, fast]), clock()]"),
        list(vec![Value::string("fast"), num(10.0)])
    );
    assert_eq!(run("await then(delay(5, 2), (x) -> x * 3)"), num(6.0));
}

#[test]
fn test_timeout() {
    assert!(matches!(
        run_err("let slow = () -> await delay(100, 1) #async #timeout(50)\nawait slow()"),
        RuntimeErrorKind::Timeout { limit_ms: 50, .. }
    ));
    assert_eq!(
        run("let quick = () -> await delay(10, 1) #async #timeout(50)\nawait quick()"),
        num(1.0)
    );
}

#[test]
fn test_async_rejection_surfaces_on_await() {
    assert!(matches!(
        run_err("let broken = () -> fail(\"bad\") #async\nlet p = broken()\nawait p"),
        RuntimeErrorKind::Custom { .. }
    ));
}

#[test]
fn test_interpret_async_awaits_result() {
    let program = parse_source("delay(20, 1)", "test.pipe").unwrap();
    let mut interpreter = Interpreter::new(InterpreterOptions::default());
    assert_eq!(interpreter.interpret_async(&program).unwrap(), num(1.0));
    assert_eq!(interpreter.now, 20);
}

#[test]
fn test_stack_overflow() {
    let options = InterpreterOptions {
        max_call_depth: 32,
        ..Default::default()
    };
    assert_eq!(
        run_err_with("let spin = (n) -> spin(n + 1)\nspin(0)", options),
        RuntimeErrorKind::StackOverflow { limit: 32 }
    );
}

#[test]
fn test_deep_recursion_reaches_call_limit_without_crashing() {
    let options = InterpreterOptions::default();
    let count = |depth: usize| {
        let source = format!("let tally = (n) -> n == 0 ? 0 : 1 + tally(n - 1)\ntally({})", depth);
        on_evaluation_stack(&options, || {
            let mut interpreter = Interpreter::new(options.clone());
            match evaluate(&mut interpreter, &source) {
                Ok(Value::Number(n)) => Ok(n),
                Ok(other) => Err(repr_value(&other)),
                Err(error) => Err(error.kind.name().to_string()),
            }
        })
        .unwrap()
    };

    let depth = options.max_call_depth - 2;
    assert_eq!(count(depth), Ok(depth as f64));
    assert_eq!(count(options.max_call_depth + 50), Err(String::from("StackOverflow")));
}

#[test]
fn test_labeled_block_shares_scope() {
    assert_eq!(run("{-- Setup --}\nlet a = 1\n{/--}\na + 1"), num(2.0));
}

#[test]
fn test_print_output() {
    let mut interpreter = Interpreter::new(InterpreterOptions::default());
    evaluate(&mut interpreter, "print(\"a\", 1)\nprint([1, \"b\"])").unwrap();
    assert_eq!(
        interpreter.output().to_vec(),
        vec!["a 1".to_string(), "[1, \"b\"]".to_string()]
    );
}

#[test]
fn test_builtins() {
    assert_eq!(run("range(3)"), list(vec![num(0.0), num(1.0), num(2.0)]));
    assert_eq!(run("sort([3, 1, 2])"), list(vec![num(1.0), num(2.0), num(3.0)]));
    assert_eq!(run("sort([1, 3, 2], (a, b) -> b - a)"), list(vec![num(3.0), num(2.0), num(1.0)]));
    assert_eq!(run("join(split(\"a,b\", \",\"), \"-\")"), Value::string("a-b"));
    assert_eq!(run("[typeOf(1), typeOf(1.5), typeOf(\"s\"), typeOf(null)]"),
        list(vec![Value::string("Int"), Value::string("Float"), Value::string("String"), Value::string("Null")]));
    assert_eq!(run("max([3, 9, 2])"), num(9.0));
    assert_eq!(run("min(4, 2, 8)"), num(2.0));
    assert_eq!(run("toNumber(\"2.5\")"), num(2.5));
    assert_eq!(run("zip([1], [\"a\"])"), list(vec![Value::Tuple(vec![num(1.0), Value::string("a")])]));
    assert!(matches!(run_err("fail(\"custom\")"), RuntimeErrorKind::Custom { message } if message == "custom"));
}

#[test]
fn test_modules() {
    let loader = StaticModuleLoader::new()
        .with_module("./math", "let square = (x) -> x * x #export\nlet hidden = 1")
        .with_module("./a", "let b = use \"./b\"")
        .with_module("./b", "let a = use \"./a\"");

    let mut interpreter = Interpreter::new(InterpreterOptions::default()).with_module_loader(loader);
    assert_eq!(
        evaluate(&mut interpreter, "let math = use \"./math\"\nmath.square(4)").unwrap(),
        num(16.0)
    );
    assert!(matches!(
        evaluate(&mut interpreter, "(use \"./math\").hidden").unwrap_err().kind,
        RuntimeErrorKind::FieldNotFound { .. }
    ));
    assert!(matches!(
        evaluate(&mut interpreter, "use \"./a\"").unwrap_err().kind,
        RuntimeErrorKind::CircularImport { .. }
    ));
    assert!(matches!(
        evaluate(&mut interpreter, "use \"./nowhere\"").unwrap_err().kind,
        RuntimeErrorKind::ModuleNotFound { .. }
    ));
}

#[test]
fn test_format_values() {
    let value = list(vec![num(1.0), num(2.5), Value::string("x"), Value::Null, Value::Tuple(vec![num(1.0)])]);
    assert_eq!(format_value(&value), "[1, 2.5, \"x\", null, (1,)]");
    assert_eq!(format_value(&Value::string("raw")), "raw");
    assert_ne!(canonical_key(&[num(1.0)]), canonical_key(&[Value::string("1")]));
}
