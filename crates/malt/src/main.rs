use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use malt::{ErrorPolicy, Interpreter, MaltError, DEFAULT_MAX_DEPTH};

const INTERPRETER_STACK_SIZE: usize = 16 * 1024 * 1024;

#[derive(Parser)]
#[command(name = "malt", version, about = "Malt: a small Lisp with closures, macros and proper tail calls")]
struct Cli {
    /// File to execute
    file: Option<PathBuf>,

    /// Arguments bound to *ARGV* when running a file
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,

    /// Evaluate an expression
    #[arg(short, long)]
    eval: Option<String>,

    /// Whether try*/catch* sees structural errors
    #[arg(long, default_value = "catchable", value_parser = parse_policy)]
    error_policy: ErrorPolicy,

    /// Maximum nested evaluation depth
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// REPL history file
    #[arg(long)]
    history: Option<PathBuf>,
}

fn parse_policy(s: &str) -> Result<ErrorPolicy, String> {
    ErrorPolicy::from_name(s).ok_or_else(|| format!("unknown error policy '{s}' (catchable|propagate)"))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MALT_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Deep non-tail recursion is bounded by --max-depth; give it room.
    let worker = std::thread::Builder::new()
        .name("malt".into())
        .stack_size(INTERPRETER_STACK_SIZE)
        .spawn(move || run(cli));
    match worker.map(|handle| handle.join()) {
        Ok(Ok(code)) => code,
        Ok(Err(_)) => {
            eprintln!("Error: interpreter thread panicked");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: failed to start interpreter thread: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> ExitCode {
    let interpreter = Interpreter::builder()
        .with_error_policy(cli.error_policy)
        .with_max_depth(cli.max_depth)
        .build();
    interpreter.set_argv(&cli.args);

    if let Some(expr) = &cli.eval {
        return match interpreter.eval_str(expr) {
            Ok(val) => {
                if !val.is_nil() {
                    println!("{val}");
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    if let Some(file) = &cli.file {
        return match std::fs::read_to_string(file) {
            Ok(content) => match interpreter.eval_str(&content) {
                Ok(_) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("Error in {}: {e}", file.display());
                    ExitCode::FAILURE
                }
            },
            Err(e) => {
                eprintln!("Error reading {}: {e}", file.display());
                ExitCode::FAILURE
            }
        };
    }

    let history = cli.history.unwrap_or_else(default_history_path);
    repl(interpreter, history)
}

fn repl(interpreter: Interpreter, history_path: PathBuf) -> ExitCode {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Error: failed to create editor: {e}");
            return ExitCode::FAILURE;
        }
    };
    let _ = rl.load_history(&history_path);

    println!("Malt v{}", env!("CARGO_PKG_VERSION"));
    println!("Type ,help for help, ,quit to exit\n");

    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() { "user> " } else { "  ... " };
        match rl.readline(prompt) {
            Ok(line) => {
                if buffer.is_empty() {
                    match line.trim() {
                        ",quit" | ",exit" | ",q" => break,
                        ",help" | ",h" => {
                            print_help();
                            continue;
                        }
                        ",env" => {
                            print_env(&interpreter);
                            continue;
                        }
                        _ => {}
                    }
                } else {
                    buffer.push('\n');
                }
                buffer.push_str(&line);

                match interpreter.rep(&buffer) {
                    Err(MaltError::Read(e)) if e.is_incomplete() => continue,
                    result => {
                        let input = std::mem::take(&mut buffer);
                        let _ = rl.add_history_entry(input.trim());
                        match result {
                            Ok(Some(out)) => println!("{out}"),
                            Ok(None) => {}
                            Err(e) => eprintln!("Error: {e}"),
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                if !buffer.is_empty() {
                    buffer.clear();
                    println!("^C");
                    continue;
                }
                break;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Error: {e}");
                break;
            }
        }
    }

    if let Some(dir) = history_path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let _ = rl.save_history(&history_path);
    println!("Goodbye!");
    ExitCode::SUCCESS
}

fn print_help() {
    println!("Malt REPL Commands:");
    println!("  ,quit / ,q    Exit the REPL");
    println!("  ,help / ,h    Show this help");
    println!("  ,env          Show global bindings");
    println!();
    println!("Special Forms:");
    println!("  {}", malt_eval::SPECIAL_FORM_NAMES.join(", "));
    println!();
    println!("Set MALT_LOG=debug for evaluator logging, or (def! DEBUG-EVAL true)");
    println!("to trace every evaluation step.");
}

fn print_env(interpreter: &Interpreter) {
    let env = interpreter.global_env();
    let user: Vec<(String, malt::Value)> = env
        .names()
        .into_iter()
        .filter_map(|name| env.get_str(&name).map(|v| (name, v)))
        .filter(|(_, v)| !matches!(v, malt::Value::Builtin(_)))
        .collect();
    if user.is_empty() {
        println!("(no user-defined bindings)");
    } else {
        for (name, val) in user {
            println!("  {name} = {val}");
        }
    }
}

fn default_history_path() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".malt")
        .join("history.txt")
}
