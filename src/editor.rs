//! Sources of input lines for the shell.

use std::fmt;
use std::io::{BufRead, Cursor};

use log::warn;
use rustyline::{error::ReadlineError, DefaultEditor};

use crate::errors::Result;

/// Supplies the shell with one line at a time.
pub trait LineSource {
    /// Displays `prompt` if the source is interactive and reads the next line.
    /// Returns `None` when end of input is reached.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Interactive line editor backed by rustyline.
pub struct Editor {
    internal: DefaultEditor,
}

impl Editor {
    pub fn new() -> Result<Editor> {
        Ok(Editor {
            internal: DefaultEditor::new()?,
        })
    }
}

impl LineSource for Editor {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.internal.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = self.internal.add_history_entry(line.as_str()) {
                        warn!("failed to add line to editor history: {}", e);
                    }
                }
                Ok(Some(line))
            }
            // Ctrl-C abandons the current line
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Editor")
    }
}

/// Non-interactive source, e.g. a script file or piped stdin. Prompts are not
/// displayed.
#[derive(Debug)]
pub struct ScriptReader<R> {
    reader: R,
}

impl<R: BufRead> ScriptReader<R> {
    pub fn new(reader: R) -> Self {
        ScriptReader { reader }
    }
}

impl ScriptReader<Cursor<String>> {
    /// Reads lines from an in-memory script, e.g. the argument to `bsh -c`.
    pub fn from_string<S: Into<String>>(script: S) -> Self {
        ScriptReader::new(Cursor::new(script.into()))
    }
}

impl<R: BufRead> LineSource for ScriptReader<R> {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        let mut line = Vec::new();
        if self.reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }

        if line.ends_with(b"\n") {
            line.pop();
            if line.ends_with(b"\r") {
                line.pop();
            }
        }
        // Bytes that are not UTF-8 become U+FFFD rather than ending the script
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }
}
