use rpncalc::runtime::{
    built_ins::base_words::display_words::format_stack,
    data_structures::config::{CONFIG_FILE_NAME, Config},
    error::{self, ErrorKind, ScriptError},
    interpreter::{Evaluation, Interpreter, InterpreterStack, calc_interpreter::CalcInterpreter},
};
use std::{
    env::{args, current_exe, var},
    io::{BufRead, Write, stdin, stdout},
    path::{Path, PathBuf},
};

/// Macros loaded from the data directory at startup.
const MACRO_FILE_NAME: &str = "predefined_macros.txt";

/// Get the directory that holds the configuration, saved registers, words and programs.  This is
/// either the directory named by the environment variable RPNCALC_DATA_PATH or the directory of
/// the executable.
fn data_directory() -> error::Result<String> {
    if let Ok(data_path) = var("RPNCALC_DATA_PATH") {
        return Ok(data_path);
    }

    let exe_path = current_exe().map_err(|err| {
        ScriptError::new(
            ErrorKind::Io,
            None,
            format!("Could not get the current executable path: {}", err),
            None,
        )
    })?;

    match exe_path.parent().and_then(|directory| directory.to_str()) {
        Some(directory) => Ok(directory.to_string()),
        None => ScriptError::new_as_result(
            ErrorKind::Io,
            None,
            "Could not get the directory of the running executable.".to_string(),
            None,
        ),
    }
}

fn config_path(directory: &str) -> PathBuf {
    Path::new(directory).join(CONFIG_FILE_NAME)
}

/// Read the configuration file if there is one.  The data directory found at startup wins over a
/// path stored in the file when the environment variable is set.
fn load_config(path: &Path, directory: &str) -> Config {
    let mut config = Config::default();

    if path.is_file() {
        if let Err(error) = config.load_from_file(&path.to_string_lossy()) {
            eprintln!("Warning: {}", error);
        }
    }

    if var("RPNCALC_DATA_PATH").is_ok() || !path.is_file() {
        config.path_to_data_and_programs = directory.to_string();
    }

    config
}

fn repl(interpreter: &mut CalcInterpreter) -> error::Result<()> {
    let input = stdin();
    let mut lines = input.lock().lines();

    loop {
        print!("> ");
        stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };

        let line = line.trim();

        if line == "q" {
            break;
        }

        if line.is_empty() {
            continue;
        }

        interpreter.evaluate_input(line);

        if !interpreter.take_stack_print_suppressed() {
            println!("{}", format_stack(interpreter.stack(), interpreter.config()));
        }
    }

    Ok(())
}

fn main() -> error::Result<()> {
    let directory = data_directory()?;
    let config_path = config_path(&directory);
    let mut interpreter = CalcInterpreter::with_config(load_config(&config_path, &directory));

    // The calculator is usable without macros.
    if let Err(error) = interpreter.load_macros(MACRO_FILE_NAME) {
        interpreter.verbose(&format!("No macros loaded: {}", error));
    }

    let args: Vec<String> = args().collect();

    if args.len() >= 2 {
        if let Err(error) = interpreter.run_batch_file(&args[1]) {
            interpreter.report_error(error);
        }
    } else {
        repl(&mut interpreter)?;
    }

    // Saved where it was read from, even if the file moved the data path elsewhere.
    interpreter.config().save_to_file(&config_path.to_string_lossy())?;

    Ok(())
}
