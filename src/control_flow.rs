//! The `if`/`then`/`else`/`fi` construct.

use log::{debug, warn};

use crate::editor::LineSource;
use crate::errors::{ErrorKind, Result};
use crate::shell::Shell;

const IF_KEYWORD: &str = "if";
const THEN_KEYWORD: &str = "then";
const ELSE_KEYWORD: &str = "else";
const END_KEYWORD: &str = "fi";

pub const CONTINUATION_PROMPT: &str = "if> ";

/// A conditional read in full, waiting to be evaluated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConditionalBlock {
    pub test: String,
    pub then_lines: Vec<String>,
    pub else_lines: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Branch {
    /// Before the first `then` or `else`; lines here are dropped
    None,
    Then,
    Else,
}

/// If `line` starts a conditional, returns whatever follows the `if` keyword.
///
/// ```
/// use bsh_rs::control_flow::conditional_test;
///
/// assert_eq!(conditional_test("if test -d /tmp"), Some("test -d /tmp"));
/// assert_eq!(conditional_test("if"), Some(""));
/// assert_eq!(conditional_test("ifconfig"), None);
/// ```
pub fn conditional_test(line: &str) -> Option<&str> {
    let line = line.trim();
    if !line.starts_with(IF_KEYWORD) {
        return None;
    }

    let rest = &line[IF_KEYWORD.len()..];
    match rest.chars().next() {
        None => Some(""),
        Some(c) if c.is_whitespace() => Some(rest.trim()),
        Some(_) => None,
    }
}

impl ConditionalBlock {
    /// Reads the remainder of a conditional from `source`, given the text that
    /// followed `if` on its first line.
    ///
    /// Running out of input before `fi` is a syntax error; none of the block
    /// is kept.
    pub fn read(test: &str, source: &mut dyn LineSource) -> Result<ConditionalBlock> {
        let mut block = ConditionalBlock {
            test: test.trim().to_string(),
            ..Default::default()
        };

        while block.test.is_empty() {
            block.test = next_line(source)?.trim().to_string();
        }

        let mut branch = Branch::None;
        loop {
            let line = next_line(source)?;
            match line.trim() {
                THEN_KEYWORD => branch = Branch::Then,
                ELSE_KEYWORD => branch = Branch::Else,
                END_KEYWORD => break,
                "" => {}
                line => match branch {
                    Branch::None => debug!("ignoring '{}' before then", line),
                    Branch::Then => block.then_lines.push(line.to_string()),
                    Branch::Else => block.else_lines.push(line.to_string()),
                },
            }
        }

        debug!("read {:?}", block);
        Ok(block)
    }
}

fn next_line(source: &mut dyn LineSource) -> Result<String> {
    match source.read_line(CONTINUATION_PROMPT)? {
        Some(line) => Ok(line),
        None => {
            warn!("input ended inside a conditional");
            Err(ErrorKind::Syntax("end of file".to_string()).into())
        }
    }
}

/// Runs the test command, then replays the chosen branch through `shell`.
pub fn evaluate(shell: &mut Shell, block: ConditionalBlock) {
    let status = shell.test_status(&block.test);
    debug!("conditional test '{}' returned {}", block.test, status);

    let branch = if status == 0 {
        block.then_lines
    } else {
        block.else_lines
    };
    for line in &branch {
        shell.process_line(line);
    }
}
