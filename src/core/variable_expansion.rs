use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::core::{parser::Command, variables::Variables};

lazy_static! {
    static ref VARIABLE: Regex =
        Regex::new(r"\$(?:\{([^}]*)\}|([A-Za-z0-9_]+))").expect("valid variable regex");
}

/// Expands `$NAME` and `${NAME}` in every word and redirection target of
/// `command`.
pub fn expand_variables(command: &mut Command, variables: &Variables) {
    for word in command
        .program_argv
        .iter_mut()
        .chain(command.pipe_argv.iter_mut())
        .chain(command.input_redirect.iter_mut())
        .chain(command.output_redirect.iter_mut())
    {
        if let Cow::Owned(expanded) = expand_variables_word(word, variables) {
            *word = expanded;
        }
    }
}

/// Substitutes each variable reference in `s` with its value in `variables`,
/// or with nothing if it is unset there. Substituted values are not expanded again.
///
/// A `$` that does not start a reference is kept as is.
pub fn expand_variables_word<'a>(s: &'a str, variables: &Variables) -> Cow<'a, str> {
    if !s.contains('$') {
        return Cow::Borrowed(s);
    }

    VARIABLE.replace_all(s, |captures: &Captures| {
        let name = captures
            .get(1)
            .or_else(|| captures.get(2))
            .map_or("", |m| m.as_str());
        variables.get(name).unwrap_or_default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variables() -> Variables {
        let mut variables = Variables::new();
        variables.set("NAME", "world");
        variables.set("DIR", "/tmp/out");
        variables.set("SELF", "$NAME");
        variables
    }

    #[test]
    fn test_no_dollar_is_unchanged() {
        let variables = variables();
        for s in &["plain", "", "a{b}c", "100%", "NAME"] {
            assert_eq!(expand_variables_word(s, &variables), *s);
            assert!(matches!(
                expand_variables_word(s, &variables),
                Cow::Borrowed(_)
            ));
        }
    }

    #[test]
    fn test_word_expansion() {
        let variables = variables();
        assert_eq!(expand_variables_word("$NAME", &variables), "world");
        assert_eq!(expand_variables_word("${NAME}", &variables), "world");
        assert_eq!(expand_variables_word("hello-$NAME!", &variables), "hello-world!");
        assert_eq!(expand_variables_word("${NAME}s", &variables), "worlds");
        assert_eq!(expand_variables_word("$NAMEs", &variables), "");
        assert_eq!(expand_variables_word("$DIR/$NAME", &variables), "/tmp/out/world");
    }

    #[test]
    fn test_unset_expands_to_empty() {
        let variables = variables();
        assert_eq!(
            expand_variables_word("a${BSH_SURELY_UNSET_VARIABLE}b", &variables),
            "ab"
        );
        assert_eq!(expand_variables_word("${}", &variables), "");
    }

    #[test]
    fn test_environment_is_not_consulted() {
        let variables = Variables::new();
        assert!(std::env::var_os("PATH").is_some());
        assert_eq!(expand_variables_word("[$PATH]", &variables), "[]");
        assert_eq!(expand_variables_word("[${PATH}]", &variables), "[]");
    }

    #[test]
    fn test_single_pass() {
        let variables = variables();
        assert_eq!(expand_variables_word("$SELF", &variables), "$NAME");
    }

    #[test]
    fn test_literal_dollar_is_kept() {
        let variables = variables();
        assert_eq!(expand_variables_word("$", &variables), "$");
        assert_eq!(expand_variables_word("cost: $ 5", &variables), "cost: $ 5");
        assert_eq!(expand_variables_word("${NAME", &variables), "${NAME");
    }

    #[test]
    fn test_command_expansion() {
        let variables = variables();
        let mut command = Command::parse("echo $NAME < ${DIR}.in | tee $NAME > $DIR");
        expand_variables(&mut command, &variables);
        assert_eq!(command.program_argv, vec!["echo", "world"]);
        assert_eq!(command.pipe_argv, vec!["tee", "world"]);
        assert_eq!(command.input_redirect.as_deref(), Some("/tmp/out.in"));
        assert_eq!(command.output_redirect.as_deref(), Some("/tmp/out"));
    }
}
