use std::collections::vec_deque::{self, VecDeque};
use std::fmt;

use crate::errors::{Error, Result};

const HISTORY_REFERENCE: char = '!';

/// Fixed-capacity command history. Once full, recording a new entry evicts
/// the oldest one.
pub struct History {
    entries: VecDeque<String>,
    capacity: usize,
}

impl History {
    pub fn with_capacity(capacity: usize) -> History {
        History {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record<S: Into<String>>(&mut self, line: S) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(line.into());
    }

    /// Returns the `n`th retained entry, where 1 is the oldest.
    pub fn get(&self, n: usize) -> Option<&str> {
        n.checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates over the entries together with their 1-based number, oldest
    /// first.
    pub fn enumerate(&self) -> impl Iterator<Item = (usize, &str)> {
        self.iter().enumerate().map(|(i, e)| (i + 1, e))
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter(self.entries.iter())
    }

    /// Performs history expansion on a `!n` line.
    ///
    /// Returns `None` if `line` is not a history reference.
    pub fn expand(&self, line: &str) -> Result<Option<String>> {
        let line = line.trim();
        if !line.starts_with(HISTORY_REFERENCE) {
            return Ok(None);
        }

        line[1..]
            .parse::<usize>()
            .ok()
            .and_then(|n| self.get(n))
            .map(|entry| Some(entry.to_string()))
            .ok_or_else(|| Error::history_lookup(line))
    }
}

pub struct Iter<'a>(vec_deque::Iter<'a, String>);

impl<'a> Iterator for Iter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.0.next().map(String::as_str)
    }
}

impl fmt::Display for History {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, e) in self.enumerate() {
            writeln!(f, "\t{}\t{}", i, e)?;
        }

        Ok(())
    }
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "count: {}", self.entries.len())?;
        writeln!(f, "capacity: {}", self.capacity)?;
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::errors::ErrorKind;

    fn alloc_history(capacity: usize, full: usize) -> History {
        let mut history = History::with_capacity(capacity);
        for i in 0..full {
            history.record(format!("cmd{}", i));
        }
        history
    }

    #[test]
    fn init_with_capacity() {
        let history = History::with_capacity(10);
        assert!(history.is_empty());
        assert_eq!(history.capacity(), 10);
        assert_eq!(history.get(1), None);
    }

    #[test]
    fn record_in_order() {
        let history = alloc_history(5, 3);
        let entries: Vec<&str> = history.iter().collect();
        assert_eq!(entries, vec!["cmd0", "cmd1", "cmd2"]);
        assert_eq!(history.get(1), Some("cmd0"));
        assert_eq!(history.get(3), Some("cmd2"));
        assert_eq!(history.get(0), None);
        assert_eq!(history.get(4), None);
    }

    #[test]
    fn record_rollover_evicts_oldest() {
        let mut history = alloc_history(3, 3);
        history.record("extra");
        assert_eq!(history.len(), 3);
        assert_eq!(history.get(1), Some("cmd1"));
        assert_eq!(history.get(3), Some("extra"));

        history.record("more");
        assert_eq!(history.get(1), Some("cmd2"));
    }

    #[test]
    fn zero_capacity_records_nothing() {
        let mut history = History::with_capacity(0);
        history.record("ls");
        assert!(history.is_empty());
    }

    #[test]
    fn clear() {
        let mut history = alloc_history(10, 5);
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), 10);
    }

    #[test]
    fn display() {
        let history = alloc_history(10, 2);
        assert_eq!(history.to_string(), "\t1\tcmd0\n\t2\tcmd1\n");
    }

    #[test]
    fn expand_not_a_reference() {
        let history = alloc_history(10, 2);
        assert!(history.expand("ls -l").unwrap().is_none());
        assert!(history.expand("").unwrap().is_none());
    }

    #[test]
    fn expand_positive_nth_command() {
        let (cap, full) = (10, 10);
        let history = alloc_history(cap, full);
        for i in 0..full {
            let line = format!("!{}", i + 1);
            assert_eq!(
                history.expand(&line).unwrap(),
                Some(format!("cmd{}", i))
            );
        }
    }

    #[test]
    fn expand_after_rollover_uses_oldest_retained() {
        let mut history = alloc_history(2, 2);
        history.record("newest");
        assert_eq!(history.expand("!1").unwrap().as_deref(), Some("cmd1"));
        assert_eq!(history.expand("!2").unwrap().as_deref(), Some("newest"));
    }

    #[test]
    fn expand_event_not_found() {
        let history = alloc_history(10, 2);
        for line in &["!0", "!3", "!", "!-1", "!abc"] {
            let err = history.expand(line).unwrap_err();
            match *err.kind() {
                ErrorKind::HistoryLookup(ref event) => assert_eq!(event, line),
                ref other => panic!("unexpected error: {:?}", other),
            }
        }
    }
}
