use crate::builtins::{self, prelude::*};

pub struct Jobs;

impl builtins::BuiltinCommand for Jobs {
    const NAME: &'static str = builtins::JOBS_NAME;

    const HELP: &'static str = "\
jobs: jobs [-p]
    Lists the active background jobs. The `-p' option lists process IDs only.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()> {
        let pids_only = match args.first().map(|arg| arg.as_ref()) {
            None => false,
            Some("-p") => true,
            Some(arg) => {
                let msg = format!("jobs: {}: invalid option\n{}", arg, Self::usage());
                return Err(Error::builtin_command(msg, 2));
            }
        };

        for job in shell.jobs().jobs() {
            if pids_only {
                writeln!(stdout, "{}", job.id())?;
            } else {
                writeln!(stdout, "{}", job)?;
            }
        }
        Ok(())
    }
}
