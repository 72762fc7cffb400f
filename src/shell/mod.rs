//! The interpreter: reads lines from a [`LineSource`] and processes each one
//! to completion before reading the next.

use std::env;
use std::fmt;
use std::io;
use std::process;

use log::{debug, info, warn};

use crate::builtins::{self, Dispatch};
use crate::control_flow::{self, ConditionalBlock};
use crate::core::{
    parser::{self, Command},
    variable_expansion,
    variables::Variables,
};
use crate::editor::LineSource;
use crate::errors::{Error, ErrorKind, Result};
use crate::execute_command::{self, ExecResult};
use crate::history::History;
use crate::job_control::JobTable;
use crate::util;

/// Number of history entries kept unless configured otherwise
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Deepest chain of re-dispatched lines, via `!n` or a conditional branch,
/// that will be followed.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Consecutive failed reads after which the input is treated as exhausted.
const MAX_CONSECUTIVE_READ_ERRORS: usize = 16;

/// Policy object to control a Shell's behavior
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Number of entries to store in the shell's command history
    pub history_capacity: usize,

    /// Determines if some messages (e.g. "exit", finished background jobs)
    /// should be displayed.
    pub display_messages: bool,
}

impl ShellConfig {
    /// Creates an interactive shell, i.e. one that displays messages meant for
    /// a user at a terminal.
    pub fn interactive(history_capacity: usize) -> Self {
        Self {
            history_capacity,
            display_messages: true,
        }
    }

    /// Creates a noninteractive shell for running scripts.
    pub fn noninteractive() -> Self {
        Default::default()
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            display_messages: false,
        }
    }
}

pub struct Shell {
    config: ShellConfig,
    source: Box<dyn LineSource>,
    history: History,
    variables: Variables,
    jobs: JobTable,
    /// Exit status of the last command executed.
    last_exit_status: i32,
    /// Current nesting of `process_line` calls
    depth: usize,
}

impl Shell {
    pub fn new(config: ShellConfig, source: Box<dyn LineSource>) -> Shell {
        Shell {
            config,
            source,
            history: History::with_capacity(config.history_capacity),
            variables: Variables::new(),
            jobs: JobTable::new(),
            last_exit_status: 0,
            depth: 0,
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut Variables {
        &mut self.variables
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    pub fn jobs_mut(&mut self) -> &mut JobTable {
        &mut self.jobs
    }

    pub fn last_exit_status(&self) -> i32 {
        self.last_exit_status
    }

    /// Reads and processes lines until the line source is exhausted.
    pub fn run(&mut self) -> Result<()> {
        info!("bsh started up");
        let mut read_errors = 0;
        loop {
            self.notify_finished_jobs();

            let prompt = self.prompt();
            match self.source.read_line(&prompt) {
                Ok(Some(line)) => {
                    read_errors = 0;
                    self.process_line(&line);
                }
                Ok(None) => break,
                Err(e) => {
                    report(&e);
                    read_errors += 1;
                    if read_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                        warn!("giving up after {} failed reads", read_errors);
                        break;
                    }
                }
            }
        }

        if self.config.display_messages {
            println!("exit");
        }
        info!("end of input, bsh has shut down");
        Ok(())
    }

    /// Terminates the shell process with status 0.
    pub fn exit(&mut self) -> ! {
        if self.config.display_messages {
            println!("exit");
        }

        info!("bsh has shut down");
        process::exit(0);
    }

    /// Processes one line to completion. Errors are reported on stderr and
    /// never escape.
    pub fn process_line(&mut self, line: &str) {
        if self.depth >= MAX_NESTING_DEPTH {
            warn!("refusing to process '{}' at depth {}", line, self.depth);
            report(&ErrorKind::NestingTooDeep(MAX_NESTING_DEPTH).into());
            self.last_exit_status = 1;
            return;
        }

        self.depth += 1;
        self.dispatch_line(line);
        self.depth -= 1;
    }

    fn dispatch_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        if let Some(test) = control_flow::conditional_test(line) {
            match ConditionalBlock::read(test, &mut *self.source) {
                Ok(block) => control_flow::evaluate(self, block),
                Err(e) => {
                    report(&e);
                    self.last_exit_status = 2;
                }
            }
            return;
        }

        match self.history.expand(line) {
            Ok(Some(expanded)) => {
                println!("{}", expanded);
                self.process_line(&expanded);
                return;
            }
            Ok(None) => {}
            Err(e) => {
                report(&e);
                self.last_exit_status = 1;
                return;
            }
        }

        if self.variables.try_assign(line) {
            self.last_exit_status = 0;
            return;
        }

        self.history.record(line);
        for segment in parser::split_segments(line) {
            self.last_exit_status = self.run_segment(segment);
        }
    }

    fn run_segment(&mut self, segment: &str) -> i32 {
        let mut command = Command::parse(segment);
        variable_expansion::expand_variables(&mut command, &self.variables);

        if let Dispatch::Handled(status) =
            builtins::dispatch(self, &command.program_argv, &mut io::stdout())
        {
            return status;
        }

        let label = command.to_string();
        match execute_command::execute(command, &mut self.jobs) {
            ExecResult::Backgrounded(id) => {
                if self.config.display_messages {
                    println!("[{}] {}", id, label);
                }
                0
            }
            result => result.status(),
        }
    }

    /// Runs the test command of a conditional in the foreground and returns
    /// its status. Any builtin counts as success.
    pub(crate) fn test_status(&mut self, test: &str) -> i32 {
        let mut command = Command::parse(test);
        command.background = false;
        variable_expansion::expand_variables(&mut command, &self.variables);

        match builtins::dispatch(self, &command.program_argv, &mut io::stdout()) {
            Dispatch::Handled(_) => 0,
            Dispatch::NotBuiltin => execute_command::execute(command, &mut self.jobs).status(),
        }
    }

    fn notify_finished_jobs(&mut self) {
        for job in self.jobs.reap_completed() {
            debug!("reaped {}", job);
            if self.config.display_messages {
                println!("{}", job);
            }
        }
    }

    /// The working directory, abbreviated relative to the home directory.
    fn prompt(&self) -> String {
        match env::current_dir() {
            Ok(cwd) => {
                let home = dirs::home_dir();
                let rel = util::abbreviate_home(&cwd, home.as_deref());
                format!("{} $ ", rel.display())
            }
            Err(e) => {
                warn!("failed to get current directory: {}", e);
                "$ ".to_string()
            }
        }
    }
}

fn report(e: &Error) {
    warn!("{}", e);
    eprintln!("bsh: {}", e);
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Shell")
            .field("config", &self.config)
            .field("history", &self.history)
            .field("variables", &self.variables)
            .field("jobs", &self.jobs)
            .field("last_exit_status", &self.last_exit_status)
            .finish()
    }
}
