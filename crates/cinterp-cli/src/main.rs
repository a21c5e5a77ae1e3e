use std::{env, fs, process};

use cinterp::{Runner, StdPrint, StdinRead};
use rand::Rng as _;

fn main() -> process::ExitCode {
    let args: Vec<String> = env::args().collect();
    let file_path = if args.len() > 1 { &args[1] } else { "example.c" };
    let source = match read_file(file_path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: {err}");
            return process::ExitCode::from(255);
        }
    };

    let runner = match Runner::new(&source) {
        Ok(runner) => runner,
        Err(err) => {
            eprintln!("{err}");
            return process::ExitCode::from(255);
        }
    };

    let seed = rand::thread_rng().r#gen::<u64>();
    match runner.run(&mut StdPrint, &mut StdinRead::new(), seed) {
        Ok(status) => exit_with(status),
        Err(err) => {
            eprintln!("{err}");
            process::ExitCode::from(255)
        }
    }
}

/// Maps the program's `main` return value to a process exit code. `ExitCode` only models
/// `0..=255`; values outside that range are truncated the way a real C runtime's `exit()`
/// truncates its argument to the low byte.
fn exit_with(status: i64) -> process::ExitCode {
    process::ExitCode::from((status & 0xff) as u8)
}

fn read_file(file_path: &str) -> Result<String, String> {
    match fs::metadata(file_path) {
        Ok(metadata) => {
            if !metadata.is_file() {
                return Err(format!("{file_path} is not a file"));
            }
        }
        Err(err) => return Err(format!("reading {file_path}: {err}")),
    }
    fs::read_to_string(file_path).map_err(|err| format!("reading {file_path}: {err}"))
}
