//! Bsh builtins
//!
//! This module includes the implementations of the shell's builtin commands.
//! Builtins run inside the shell process; redirections and pipes on a builtin
//! command line are ignored.

use std::io::Write;

use log::debug;

use crate::errors::*;
use crate::shell::Shell;

use self::dirs::Cd;
use self::env::Set;
use self::exit::Exit;
use self::help::Help;
use self::history::History;
use self::jobs::Jobs;

mod dirs;
mod env;
mod exit;
mod help;
mod history;
mod jobs;

mod prelude {
    pub use std::io::Write;

    pub use crate::errors::*;
    pub use crate::shell::Shell;
}

const CD_NAME: &str = "cd";
const EXIT_NAME: &str = "exit";
const HELP_NAME: &str = "help";
const HISTORY_NAME: &str = "history";
const JOBS_NAME: &str = "jobs";
const SET_NAME: &str = "set";

/// Represents a Bsh builtin command such as cd or help.
pub trait BuiltinCommand {
    /// The NAME of the command.
    const NAME: &'static str;
    /// The help string to display to the user. The first line is the usage.
    const HELP: &'static str;
    /// The usage string to display to the user.
    fn usage() -> &'static str {
        Self::HELP.lines().next().unwrap_or(Self::HELP)
    }
    /// Runs the command with the given arguments in the `shell` environment.
    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()>;
}

/// Whether the dispatcher took care of a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// The command was a builtin and finished with this status.
    Handled(i32),
    NotBuiltin,
}

pub fn is_builtin<T: AsRef<str>>(argv: &[T]) -> bool {
    argv.first().map_or(false, |program| {
        [CD_NAME, EXIT_NAME, HELP_NAME, HISTORY_NAME, JOBS_NAME, SET_NAME]
            .contains(&program.as_ref())
    })
}

/// Runs `argv` if it names a builtin. A failing builtin is reported on stderr
/// and still counts as handled.
pub fn dispatch<T: AsRef<str>>(shell: &mut Shell, argv: &[T], stdout: &mut dyn Write) -> Dispatch {
    let (program, args) = match argv.split_first() {
        Some((program, args)) if is_builtin(argv) => (program.as_ref(), args),
        _ => return Dispatch::NotBuiltin,
    };

    debug!("running builtin {}", program);
    let result = match program {
        CD_NAME => Cd::run(shell, args, stdout),
        EXIT_NAME => Exit::run(shell, args, stdout),
        HELP_NAME => Help::run(shell, args, stdout),
        HISTORY_NAME => History::run(shell, args, stdout),
        JOBS_NAME => Jobs::run(shell, args, stdout),
        SET_NAME => Set::run(shell, args, stdout),
        _ => return Dispatch::NotBuiltin,
    };

    match result {
        Ok(()) => Dispatch::Handled(0),
        Err(e) => {
            eprintln!("bsh: {}", e);
            Dispatch::Handled(e.builtin_status())
        }
    }
}
