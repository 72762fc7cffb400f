//! Shell variable store.

use std::collections::btree_map::{self, BTreeMap};

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::util;

lazy_static! {
    static ref ASSIGNMENT: Regex =
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)=((?:\S.*)?)$").expect("valid assignment regex");
}

/// Flat name to value store for variables set with `NAME=value`.
#[derive(Clone, Debug, Default)]
pub struct Variables {
    vars: BTreeMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn set<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Iterates over all variables, ordered by name.
    pub fn iter(&self) -> Iter<'_> {
        Iter(self.vars.iter())
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Consumes `line` as an assignment if it has the form `NAME=value`.
    ///
    /// Returns `false`, leaving the store untouched, if it does not.
    pub fn try_assign(&mut self, line: &str) -> bool {
        match parse_assignment(line) {
            Some((name, value)) => {
                debug!("assigning {}={}", name, value);
                self.set(name, value);
                true
            }
            None => false,
        }
    }
}

pub struct Iter<'a>(btree_map::Iter<'a, String, String>);

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Splits `NAME=value` into its name and value, stripping one layer of quotes
/// from the value. There must be no whitespace on either side of `=`.
pub fn parse_assignment(line: &str) -> Option<(&str, &str)> {
    let captures = ASSIGNMENT.captures(line.trim())?;
    let name = captures.get(1)?.as_str();
    let value = captures.get(2).map_or("", |m| m.as_str());
    Some((name, util::strip_quotes(value)))
}
