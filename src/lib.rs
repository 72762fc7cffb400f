//! Bsh - Bob Shell
//!
//! A small interactive shell: simple commands with `<` and `>` redirection, a
//! single `|` pipe, background jobs, variables, `!n` history references and an
//! `if`/`then`/`else`/`fi` conditional.

#![recursion_limit = "1024"]

#[macro_use]
extern crate error_chain;

/// Logs the error in `result`, if any, without propagating it.
macro_rules! log_if_err {
    ($result:expr, $($arg:tt)+) => {
        if let Err(ref e) = $result {
            log::error!("{}: {}", format_args!($($arg)+), e);
        }
    };
}

pub mod builtins;
pub mod control_flow;
pub mod core;
pub mod editor;
pub mod errors;
pub mod execute_command;
pub mod history;
pub mod job_control;
pub mod shell;
pub mod util;

pub use crate::core::{parser::Command, variables::Variables};
pub use crate::editor::{Editor, LineSource, ScriptReader};
pub use crate::execute_command::{ExecResult, FailureKind};
pub use crate::history::History;
pub use crate::job_control::JobTable;
pub use crate::shell::{Shell, ShellConfig};
