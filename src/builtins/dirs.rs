use std::env;
use std::path::PathBuf;

use log::debug;

use crate::builtins::{self, prelude::*};

const DEFAULT_DIRECTORY: &str = "/";

pub struct Cd;

impl builtins::BuiltinCommand for Cd {
    const NAME: &'static str = builtins::CD_NAME;

    const HELP: &'static str = "\
cd: cd [dir]
    Change the current directory to DIR. The variable $HOME is the default
    DIR, or / if HOME is not set.";

    fn run<T: AsRef<str>>(_shell: &mut Shell, args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        let dir = match args.first() {
            Some(dir) => PathBuf::from(dir.as_ref()),
            None => env::var_os("HOME")
                .filter(|home| !home.is_empty())
                .map_or_else(|| PathBuf::from(DEFAULT_DIRECTORY), PathBuf::from),
        };

        env::set_current_dir(&dir).map_err(|e| {
            let reason = e
                .raw_os_error()
                .map(|code| nix::errno::Errno::from_i32(code).desc().to_string())
                .unwrap_or_else(|| e.to_string());
            Error::from(ErrorKind::DirectoryChange(dir.display().to_string(), reason))
        })?;
        debug!("changed directory to {}", dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;
    use std::sync::Mutex;

    use lazy_static::lazy_static;
    use tempdir::TempDir;

    use crate::builtins::BuiltinCommand;
    use crate::editor::ScriptReader;
    use crate::shell::ShellConfig;

    lazy_static! {
        static ref CWD_LOCK: Mutex<()> = Mutex::new(());
    }

    fn shell() -> Shell {
        Shell::new(
            ShellConfig::noninteractive(),
            Box::new(ScriptReader::from_string("")),
        )
    }

    #[test]
    fn cd_to_directory() {
        let _guard = CWD_LOCK.lock().unwrap();
        let original = env::current_dir().unwrap();
        let dir = TempDir::new("bsh-cd").unwrap();
        let target = dir.path().canonicalize().unwrap();

        let result = Cd::run(&mut shell(), &[target.to_str().unwrap()], &mut io::sink());
        let now = env::current_dir().unwrap();
        env::set_current_dir(&original).unwrap();

        assert!(result.is_ok());
        assert_eq!(now.canonicalize().unwrap(), target);
    }

    #[test]
    fn cd_failure_keeps_directory() {
        let _guard = CWD_LOCK.lock().unwrap();
        let original = env::current_dir().unwrap();
        let dir = TempDir::new("bsh-cd").unwrap();
        let missing = dir.path().join("missing");

        let err = Cd::run(&mut shell(), &[missing.to_str().unwrap()], &mut io::sink())
            .unwrap_err();
        assert_eq!(env::current_dir().unwrap(), original);
        match *err.kind() {
            ErrorKind::DirectoryChange(ref path, ref reason) => {
                assert_eq!(path, &missing.display().to_string());
                assert_eq!(reason, "No such file or directory");
            }
            ref other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.builtin_status(), 1);
    }
}
