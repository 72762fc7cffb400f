//! Error module. See the [error-chain](https://crates.io/crates/error-chain) crate for details.

error_chain! {
    foreign_links {
        Io(::std::io::Error);
        Readline(::rustyline::error::ReadlineError);
        Docopt(::docopt::Error);
        Logger(::log::SetLoggerError);
        Nix(::nix::Error);
    }

    errors {
        /// Dangling operator, e.g. a pipe with nothing on its right-hand side
        Syntax(token: String) {
            description("syntax error")
            display("syntax error near unexpected token `{}'", token)
        }
        /// The OS refused to create a new process
        SpawnFailure(program: String) {
            description("failed to create process")
            display("{}: failed to create process", program)
        }
        /// A redirection target could not be opened
        RedirectOpen(path: String, reason: String) {
            description("cannot open redirection target")
            display("{}: {}", path, reason)
        }
        /// The program image could not be loaded into the new process
        ImageReplace(program: String, reason: String) {
            description("cannot execute program")
            display("{}: {}", program, reason)
        }
        HistoryLookup(event: String) {
            description("event not found")
            display("{}: event not found", event)
        }
        DirectoryChange(path: String, reason: String) {
            description("cannot change directory")
            display("cd: {}: {}", path, reason)
        }
        BuiltinCommand(message: String, code: i32) {
            description("builtin command failed")
            display("{}", message)
        }
        NestingTooDeep(limit: usize) {
            description("maximum nesting depth exceeded")
            display("maximum nesting depth exceeded ({})", limit)
        }
    }
}

impl Error {
    pub(crate) fn builtin_command<T: AsRef<str>>(message: T, code: i32) -> Error {
        ErrorKind::BuiltinCommand(message.as_ref().to_string(), code).into()
    }

    pub(crate) fn history_lookup<T: AsRef<str>>(event: T) -> Error {
        ErrorKind::HistoryLookup(event.as_ref().to_string()).into()
    }

    /// Status a builtin reports when it fails with this error.
    pub fn builtin_status(&self) -> i32 {
        match *self.kind() {
            ErrorKind::BuiltinCommand(_, code) => code,
            _ => 1,
        }
    }
}
