//! BSH Parser
//!
//! Turns one segment of a shell line into a [`Command`]. The grammar is
//! deliberately small: whitespace separated words, `<` and `>` redirections,
//! a single `|` and a trailing `&`.

use std::fmt;

use log::debug;

const INPUT_REDIRECT: &str = "<";
const OUTPUT_REDIRECT: &str = ">";
const PIPE: &str = "|";
const BACKGROUND: char = '&';
const SEGMENT_SEPARATOR: char = ';';

/// One parsed shell command, owning all of its words.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Command {
    /// Program to run followed by its arguments
    pub program_argv: Vec<String>,
    /// Right-hand side of the pipe, empty unless `has_pipe`
    pub pipe_argv: Vec<String>,
    pub input_redirect: Option<String>,
    /// Opened write/create/truncate
    pub output_redirect: Option<String>,
    pub has_pipe: bool,
    pub background: bool,
}

impl Command {
    /// Parses `input` according to bsh grammar.
    ///
    /// A redirection or pipe operator with no operand is consumed without
    /// recording anything; the executor deals with the consequences.
    ///
    /// # Examples
    ///
    /// ```
    /// use bsh_rs::Command;
    ///
    /// let command = Command::parse("sort < in.txt | uniq > out.txt &");
    /// assert_eq!(command.program_argv, vec!["sort"]);
    /// assert_eq!(command.pipe_argv, vec!["uniq"]);
    /// assert_eq!(command.input_redirect.as_deref(), Some("in.txt"));
    /// assert_eq!(command.output_redirect.as_deref(), Some("out.txt"));
    /// assert!(command.has_pipe);
    /// assert!(command.background);
    /// ```
    pub fn parse(input: &str) -> Command {
        let mut command = Command::default();
        let mut line = input.trim();
        if line.ends_with(BACKGROUND) {
            command.background = true;
            line = line[..line.len() - 1].trim_end();
        }

        let mut tokens = line.split_whitespace();
        while let Some(token) = tokens.next() {
            match token {
                INPUT_REDIRECT => {
                    if let Some(path) = tokens.next() {
                        command.input_redirect = Some(path.to_string());
                    }
                }
                OUTPUT_REDIRECT => {
                    if let Some(path) = tokens.next() {
                        command.output_redirect = Some(path.to_string());
                    }
                }
                PIPE => command.has_pipe = true,
                word if command.has_pipe => command.pipe_argv.push(word.to_string()),
                word => command.program_argv.push(word.to_string()),
            }
        }

        debug!("parsed Command: {:?}", command);
        command
    }

    /// Returns `true` if nothing at all was parsed, e.g. from a blank line.
    pub fn is_empty(&self) -> bool {
        *self == Command::default()
    }

    pub fn program(&self) -> Option<&str> {
        self.program_argv.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.program_argv.get(1..).unwrap_or(&[])
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut words: Vec<&str> = self.program_argv.iter().map(String::as_str).collect();
        if let Some(ref path) = self.input_redirect {
            words.extend(&[INPUT_REDIRECT, path.as_str()]);
        }
        if self.has_pipe {
            words.push(PIPE);
            words.extend(self.pipe_argv.iter().map(String::as_str));
        }
        if let Some(ref path) = self.output_redirect {
            words.extend(&[OUTPUT_REDIRECT, path.as_str()]);
        }
        if self.background {
            words.push("&");
        }

        write!(f, "{}", words.join(" "))
    }
}

/// Splits a line on `;`, skipping blank segments.
pub fn split_segments(line: &str) -> impl Iterator<Item = &str> {
    line.split(SEGMENT_SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
}
