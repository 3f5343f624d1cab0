use std::fs;

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use weave_core::{init_tracing, WeaveConfig, WeaveRuntime};
use weave_repl::repl::{parse_command, LineProcessResult, MultiLineCollector, Repl};

fn main() -> Result<()> {
    // Initialize logging
    init_tracing();

    // Parse command line arguments
    let matches = Command::new("weave-repl")
        .version(weave_core::VERSION)
        .about("Interactive REPL for the Weave programming language")
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .help("Execute a Weave script file and exit")
                .index(1),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug mode")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json-trace")
                .long("json-trace")
                .help("Emit trace events as JSON lines on stdout")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let input_file = matches.get_one::<String>("file").cloned();
    let debug = matches.get_flag("debug");
    let json_trace = matches.get_flag("json-trace");

    // Configure the Weave runtime
    let config = WeaveConfig {
        debug,
        ..Default::default()
    };
    let runtime = WeaveRuntime::new(config)?;
    let mut repl = Repl::new(runtime)?;
    if json_trace {
        repl.enable_json_trace();
    }

    // Script mode: run the file and exit
    if let Some(path) = input_file {
        let source = fs::read_to_string(&path)?;
        match repl.execute(&source) {
            Ok((output, duration_ms)) => {
                repl.notifier().on_result(&output, duration_ms, true);
                return Ok(());
            }
            Err(e) => {
                repl.notifier().on_error(&format!("Error: {e}"));
                std::process::exit(1);
            }
        }
    }

    println!("Weave REPL v{}", weave_core::VERSION);
    if debug {
        println!("Debug mode: enabled");
    }
    println!("Type .help for help, .quit to exit");
    println!();

    run_repl(&mut repl)
}

fn run_repl(repl: &mut Repl) -> Result<()> {
    use rustyline::{error::ReadlineError, DefaultEditor};

    let mut rl = DefaultEditor::new()?;
    let mut collector = MultiLineCollector::new();

    while repl.is_running() {
        match rl.readline(collector.prompt()) {
            Ok(line) => {
                // Dot-commands only apply at the start of a statement
                if !collector.is_collecting() && line.trim_start().starts_with('.') {
                    rl.add_history_entry(&line)?;
                    match parse_command(&line) {
                        Ok(command) => match repl.handle_command(command) {
                            Ok(message) => repl.notifier().on_output(&message),
                            Err(e) => repl.notifier().on_error(&format!("Error: {e}")),
                        },
                        Err(e) => repl.notifier().on_error(&format!("Error: {e}")),
                    }
                    continue;
                }

                match collector.process_line(&line) {
                    LineProcessResult::Complete(source) => {
                        if source.trim().is_empty() {
                            continue;
                        }
                        rl.add_history_entry(source.trim_end())?;
                        match repl.execute(&source) {
                            Ok((output, duration_ms)) => {
                                repl.notifier()
                                    .on_result(&output, duration_ms, repl.is_quiet());
                            }
                            Err(e) => repl.notifier().on_error(&format!("Error: {e}")),
                        }
                    }
                    LineProcessResult::NeedMore => {}
                }
            }
            Err(ReadlineError::Interrupted) => {
                collector.reset();
                repl.notifier().on_output("(interrupted)");
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
