use crate::builtins::{self, prelude::*, BuiltinCommand, Cd, Exit, History, Jobs, Set};

pub struct Help;

impl builtins::BuiltinCommand for Help {
    const NAME: &'static str = builtins::HELP_NAME;

    const HELP: &'static str = "\
help: help [command ...]
    Display helpful information about builtin commands. If COMMAND is specified,
    gives detailed help on all commands matching COMMAND, otherwise a list of the
    builtins is printed.";

    fn run<T: AsRef<str>>(_shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()> {
        if args.is_empty() {
            for usage in &[
                Cd::usage(),
                Exit::usage(),
                Help::usage(),
                History::usage(),
                Jobs::usage(),
                Set::usage(),
            ] {
                writeln!(stdout, "{}", usage)?;
            }
            return Ok(());
        }

        let mut all_invalid = true;
        for arg in args {
            let msg = match arg.as_ref() {
                builtins::CD_NAME => Some(Cd::HELP),
                builtins::EXIT_NAME => Some(Exit::HELP),
                builtins::HELP_NAME => Some(Help::HELP),
                builtins::HISTORY_NAME => Some(History::HELP),
                builtins::JOBS_NAME => Some(Jobs::HELP),
                builtins::SET_NAME => Some(Set::HELP),
                _ => None,
            };
            if let Some(msg) = msg {
                writeln!(stdout, "{}", msg)?;
                all_invalid = false;
            }
        }

        if all_invalid {
            let topic = args.last().map_or("", AsRef::as_ref);
            return Err(Error::builtin_command(
                format!("help: no help topics match `{}'", topic),
                1,
            ));
        }
        Ok(())
    }
}
