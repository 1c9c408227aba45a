use std::io;
use std::path::PathBuf;
use std::process;
use std::thread;

use clap::Parser as ClapParser;
use log::{debug, error};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use muscheme::config::Config;
use muscheme::env::Env;
use muscheme::error::ParserErrorKind;
use muscheme::parser::Parser;
use muscheme::repl::{install_loader, load_file, read_eval_print};
use muscheme::create_global_frame;

const STACK_SIZE: usize = 256 * 1024 * 1024;

#[derive(ClapParser, Debug)]
#[command(name = "muscheme", about = "A small Scheme interpreter with lexical and dynamic scoping")]
struct Args {
    /// Run this file instead of starting an interactive session
    file: Option<PathBuf>,

    /// Load these files, then start an interactive session
    #[arg(long, num_args = 1.., conflicts_with = "file")]
    load: Vec<PathBuf>,

    /// Evaluate tail calls recursively
    #[arg(long)]
    no_tail_calls: bool,

    /// Maximum nesting depth of non-tail evaluations
    #[arg(long, default_value_t = Config::default().max_depth)]
    max_depth: usize,

    /// Do not print values of evaluated expressions
    #[arg(long)]
    quiet: bool,
}

/// Whether `input` stops in the middle of a datum
fn is_incomplete(input: &str) -> bool {
    match Parser::new(input).parse_all() {
        Err(e) => e.kind == ParserErrorKind::UnexpectedEOF,
        Ok(_) => false,
    }
}

fn read(rl: &mut DefaultEditor) -> Result<String, ReadlineError> {
    let mut input = rl.readline(">> ")?;
    while is_incomplete(&input) {
        let line = rl.readline(".. ")?;
        input.push('\n');
        input.push_str(&line);
    }
    remember(rl, &input);
    Ok(input)
}

/// Adds non-blank input to the line editor history
fn remember(rl: &mut DefaultEditor, input: &str) {
    if input.trim().is_empty() {
        return;
    }
    if let Err(e) = rl.add_history_entry(input) {
        debug!("cannot add history entry: {}", e);
    }
}

fn interactive(env: &Env, quiet: bool) -> Result<(), ReadlineError> {
    let mut rl = DefaultEditor::new()?;
    loop {
        match read(&mut rl) {
            Ok(input) => read_eval_print(&input, env, quiet, &mut io::stdout())?,
            Err(ReadlineError::Interrupted) => println!("KeyboardInterrupt"),
            Err(ReadlineError::Eof) => return Ok(()),
            Err(e) => return Err(e),
        }
    }
}

fn run(args: Args) -> i32 {
    Config {
        tail_calls: !args.no_tail_calls,
        max_depth: args.max_depth,
    }
    .install();

    let env = create_global_frame();
    install_loader(&env);

    if let Some(file) = args.file {
        return match load_file(&file.to_string_lossy(), &env, args.quiet) {
            Ok(()) => 0,
            Err(e) => {
                println!("Error: {}", e);
                1
            }
        };
    }

    for file in &args.load {
        if let Err(e) = load_file(&file.to_string_lossy(), &env, true) {
            println!("Error: {}", e);
        }
    }

    match interactive(&env, args.quiet) {
        Ok(()) => 0,
        Err(e) => {
            error!("line editor failed: {}", e);
            1
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    debug!("{:?}", args);

    let handle = thread::Builder::new()
        .name("muscheme".to_string())
        .stack_size(STACK_SIZE)
        .spawn(move || run(args));
    let code = match handle.map(|h| h.join()) {
        Ok(Ok(code)) => code,
        Ok(Err(_)) => 101,
        Err(e) => {
            error!("cannot spawn interpreter thread: {}", e);
            1
        }
    };
    process::exit(code);
}
