use rascheme::env::Env;
use rascheme::evaluator::eval_source;
use rascheme::value::Value;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::panic;
use std::process;

fn main() {
    let result = panic::catch_unwind(run_repl);

    if let Err(panic_info) = result {
        eprintln!("The REPL encountered an unexpected error and must exit.");

        if let Some(msg) = panic_info.downcast_ref::<&str>() {
            eprintln!("Error: {msg}");
        } else if let Some(msg) = panic_info.downcast_ref::<String>() {
            eprintln!("Error: {msg}");
        } else {
            eprintln!("Error: Unknown panic occurred");
        }

        process::exit(1);
    }
}

fn run_repl() {
    println!("RaScheme - a small Scheme with exact rational arithmetic");
    println!("Enter expressions like: (+ 1/2 1/3)");
    println!("Type (exit) or Ctrl+C to leave.");
    println!();

    let mut rl = DefaultEditor::new().expect("Could not initialize REPL");
    let env = Env::empty();

    loop {
        match rl.readline("rascheme> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match eval_source(line, &env) {
                    Ok(Value::Terminate) => {
                        println!("Goodbye!");
                        break;
                    }
                    // The unspecified value is not echoed (define, set!, ...)
                    Ok(Value::Void) => {}
                    Ok(result) => println!("{result}"),
                    Err(e) => println!("Error: {e}"),
                }
            }

            Err(ReadlineError::Eof | ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }
}
