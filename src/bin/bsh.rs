use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process;

use bsh_rs::{
    errors::*, shell::DEFAULT_HISTORY_CAPACITY, util, Editor, LineSource, ScriptReader, Shell,
    ShellConfig,
};
use docopt::Docopt;
use log::{debug, error};
use nix::unistd::Pid;
use serde_derive::Deserialize;

const LOG_FILE_NAME: &str = ".bsh_log";

const USAGE: &str = "
bsh.

Usage:
    bsh [options]
    bsh [options] -c <command>
    bsh [options] <file>
    bsh (-h | --help)
    bsh --version

Options:
    -h --help               Show this screen.
    --version               Show version.
    -c                      If the -c option is present, then commands are read from the first
                                non-option argument command_string.
    --log=<path>            File to write log to, defaults to ~/.bsh_log
    --history-size=<n>      Number of commands kept in the history [default: 20]
";

/// Docopts input arguments.
#[derive(Debug, Deserialize)]
struct Args {
    arg_command: Option<String>,
    arg_file: Option<String>,
    flag_version: bool,
    flag_c: bool,
    flag_log: Option<String>,
    flag_history_size: Option<usize>,
}

fn main() {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    if let Err(e) = init_logger(&args.flag_log) {
        eprintln!("bsh: failed to initialize logging: {}", e);
    }
    debug!("{:?}", args);

    if args.flag_version {
        println!("bsh version {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if let Err(e) = run(&args) {
        display_error_and_exit(&e);
    }
}

fn run(args: &Args) -> Result<()> {
    let capacity = args.flag_history_size.unwrap_or(DEFAULT_HISTORY_CAPACITY);
    let interactive = !args.flag_c && args.arg_file.is_none() && util::isatty();
    let config = if interactive {
        if let Err(e) = util::ignore_interactive_signals() {
            eprintln!("bsh: failed to ignore interactive signals: {}", e);
        }
        ShellConfig::interactive(capacity)
    } else {
        ShellConfig {
            history_capacity: capacity,
            ..ShellConfig::noninteractive()
        }
    };

    let source: Box<dyn LineSource> = if args.flag_c {
        let command = args.arg_command.clone().unwrap_or_default();
        Box::new(ScriptReader::from_string(command))
    } else if let Some(ref path) = args.arg_file {
        let file = File::open(path).chain_err(|| format!("{}: cannot open script", path))?;
        Box::new(ScriptReader::new(BufReader::new(file)))
    } else if interactive {
        Box::new(Editor::new()?)
    } else {
        Box::new(ScriptReader::new(BufReader::new(io::stdin())))
    };

    Shell::new(config, source).run()
}

fn init_logger(path: &Option<String>) -> Result<()> {
    let log_path = match *path {
        Some(ref path) => PathBuf::from(path),
        None => default_log_path()?,
    };

    let pid = Pid::this();
    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                pid,
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(fern::log_file(log_path)?)
        .apply()?;
    Ok(())
}

fn default_log_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(LOG_FILE_NAME))
        .ok_or_else(|| "unable to find home directory".into())
}

fn display_error_and_exit(error: &Error) -> ! {
    error!("bsh failed: {}", error);
    eprintln!("bsh: {}", error);
    for e in error.iter().skip(1) {
        eprintln!("caused by: {}", e);
    }
    process::exit(1);
}
