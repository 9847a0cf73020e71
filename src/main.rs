use std::{fs::read_to_string, path::PathBuf, process::exit, rc::Rc, time::Instant};

use clap::{Parser, Subcommand};
use pipelang::{
    display_error,
    errors::errors::LangError,
    interpreter::{
        format::repr_value, interpreter::Interpreter, options::InterpreterOptions, value::Value,
    },
    lexer::lexer::tokenize,
    on_evaluation_stack,
    parser::parser::parse,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pipelang", about = "Interpreter for a pipe-oriented functional language")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level regardless of RUST_LOG.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program and print its final value.
    Run(RunArgs),
    /// Parse a program and print the syntax tree back as source.
    Parse { file: PathBuf },
    /// Print the token stream of a program.
    Tokens { file: PathBuf },
}

#[derive(Parser)]
struct RunArgs {
    file: PathBuf,

    /// Type-check every typed function, as if the program started with `#strict`.
    #[arg(long)]
    strict: bool,

    /// Await the program's final value if it is a promise.
    #[arg(long = "async")]
    run_async: bool,

    /// Sleep for real when awaiting instead of only advancing the virtual clock.
    #[arg(long)]
    real_time: bool,

    /// Maximum depth of nested calls.
    #[arg(long, default_value_t = 256)]
    max_call_depth: usize,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let file = match &cli.command {
        Commands::Run(args) => &args.file,
        Commands::Parse { file } | Commands::Tokens { file } => file,
    };
    let source = match read_to_string(file) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("Error: could not read {}: {}", file.display(), error);
            exit(1);
        }
    };
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| String::from("<input>"));

    let succeeded = match &cli.command {
        Commands::Run(args) => {
            let options = InterpreterOptions {
                strict: args.strict,
                real_time: args.real_time,
                max_call_depth: args.max_call_depth,
            };
            on_evaluation_stack(&options, || {
                report(run(args, options.clone(), &source, &file_name), &source)
            })
            .unwrap_or_else(|error| {
                eprintln!("Error: could not start the interpreter thread: {}", error);
                false
            })
        }
        Commands::Parse { .. } => report(print_program(&source, &file_name), &source),
        Commands::Tokens { .. } => report(print_tokens(&source, &file_name), &source),
    };

    if !succeeded {
        exit(1);
    }
}

fn report(result: Result<(), LangError>, source: &str) -> bool {
    match result {
        Ok(()) => true,
        Err(error) => {
            display_error(&error, source);
            false
        }
    }
}

fn run(args: &RunArgs, options: InterpreterOptions, source: &str, file_name: &str) -> Result<(), LangError> {
    let start = Instant::now();
    let tokens = tokenize(source.to_string(), Some(file_name.to_string()))?;
    let (_, program) = parse(tokens, Rc::new(file_name.to_string()));
    let program = program?;
    debug!(elapsed = ?start.elapsed(), statements = program.body.len(), "parsed");

    let mut interpreter = Interpreter::new(options);

    let value = if args.run_async {
        interpreter.interpret_async(&program)?
    } else {
        interpreter.interpret(&program)?
    };
    info!(elapsed = ?start.elapsed(), "finished");

    if value != Value::Null {
        println!("{}", repr_value(&value));
    }
    Ok(())
}

fn print_program(source: &str, file_name: &str) -> Result<(), LangError> {
    let tokens = tokenize(source.to_string(), Some(file_name.to_string()))?;
    let (_, program) = parse(tokens, Rc::new(file_name.to_string()));
    for stmt in program?.body {
        println!("{}", stmt);
    }
    Ok(())
}

fn print_tokens(source: &str, file_name: &str) -> Result<(), LangError> {
    for token in tokenize(source.to_string(), Some(file_name.to_string()))? {
        println!(
            "{}:{} {} {:?}",
            token.span.start.line, token.span.start.column, token.kind, token.value
        );
    }
    Ok(())
}
