use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

use nix::sys::signal::{self, SigHandler, Signal};
use nix::unistd;

use crate::errors::Result;

/// Signals sent by the terminal's interrupt and quit keys.
const INTERACTIVE_SIGNALS: [Signal; 2] = [Signal::SIGINT, Signal::SIGQUIT];

/// Returns `true` if the shell's standard input is a terminal.
pub fn isatty() -> bool {
    let temp_result = unistd::isatty(get_terminal());
    log_if_err!(temp_result, "unistd::isatty");
    temp_result.unwrap_or(false)
}

pub fn get_terminal() -> RawFd {
    io::stdin().as_raw_fd()
}

/// Ignore interactive signals so that Ctrl-C only reaches the foreground
/// child. Children restore the defaults with [`reset_signals`].
pub fn ignore_interactive_signals() -> Result<()> {
    for &sig in &INTERACTIVE_SIGNALS {
        unsafe {
            signal::signal(sig, SigHandler::SigIgn)?;
        }
    }
    Ok(())
}

/// Resets interactive signal handling back to default. Runs in the child
/// between fork and exec, so it only makes async-signal-safe calls.
pub fn reset_signals() -> io::Result<()> {
    for &sig in &INTERACTIVE_SIGNALS {
        unsafe {
            signal::signal(sig, SigHandler::SigDfl)?;
        }
    }
    Ok(())
}

/// Removes one layer of matching single or double quotes surrounding `s`.
pub fn strip_quotes(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &s[1..s.len() - 1];
        }
    }

    s
}

/// Rewrites `path` relative to `home` as `~/...`, leaving other paths alone.
pub fn abbreviate_home(path: &Path, home: Option<&Path>) -> PathBuf {
    match home.and_then(|home| path.strip_prefix(home).ok()) {
        Some(rel) if rel.as_os_str().is_empty() => PathBuf::from("~"),
        Some(rel) => Path::new("~").join(rel),
        None => path.to_path_buf(),
    }
}
