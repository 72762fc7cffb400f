use crate::builtins::{self, prelude::*};

pub struct Set;

impl builtins::BuiltinCommand for Set {
    const NAME: &'static str = builtins::SET_NAME;

    const HELP: &'static str = "\
set: set
    Display the shell variables as name=value, sorted by name.
    set [name=value ...] assigns each NAME the given VALUE first.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()> {
        let mut bad_args = Vec::new();
        for arg in args {
            if !shell.variables_mut().try_assign(arg.as_ref()) {
                bad_args.push(arg.as_ref());
            }
        }

        if !bad_args.is_empty() {
            let msg = bad_args
                .iter()
                .map(|arg| format!("set: `{}': not a valid assignment", arg))
                .collect::<Vec<String>>()
                .join("\n");
            return Err(Error::builtin_command(msg, 1));
        }

        if args.is_empty() {
            for (name, value) in shell.variables().iter() {
                writeln!(stdout, "{}={}", name, value)?;
            }
        }
        Ok(())
    }
}
