//! SMT-LIB2 text formatting for AST types.
//!
//! Implements `Display` for [`Sort`], [`Command`], and [`Script`]. Formulas
//! format themselves (see [`Formula::serialize`](crate::formula::Formula::serialize)).

use std::fmt;

use crate::command::Command;
use crate::formula::Formula;
use crate::script::Script;
use crate::sort::Sort;

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Bool => write!(f, "Bool"),
            Sort::Int => write!(f, "Int"),
        }
    }
}

/// Write a space-separated list of terms.
fn fmt_term_list(terms: &[Formula], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, t) in terms.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{t}")?;
    }
    Ok(())
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetLogic(logic) => write!(f, "(set-logic {logic})"),
            Command::SetOption(key, value) => write!(f, "(set-option :{key} {value})"),
            Command::DeclareConst(name, sort) => {
                write!(f, "(declare-const {name} {sort})")
            }
            Command::Assert(term) => write!(f, "(assert {term})"),
            Command::CheckSat => write!(f, "(check-sat)"),
            Command::GetValue(terms) => {
                write!(f, "(get-value (")?;
                fmt_term_list(terms, f)?;
                write!(f, "))")
            }
            Command::Push(n) => write!(f, "(push {n})"),
            Command::Pop(n) => write!(f, "(pop {n})"),
            Command::Comment(text) => write!(f, ";; {text}"),
            Command::Exit => write!(f, "(exit)"),
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cmd) in self.commands().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{cmd}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::command::Command;
    use crate::formula::Formula;
    use crate::script::Script;
    use crate::sort::Sort;

    #[test]
    fn sort_names() {
        assert_eq!(Sort::Bool.to_string(), "Bool");
        assert_eq!(Sort::Int.to_string(), "Int");
    }

    #[test]
    fn declare_const() {
        let cmd = Command::DeclareConst("x-3_0".to_string(), Sort::Int);
        assert_eq!(cmd.to_string(), "(declare-const x-3_0 Int)");
    }

    #[test]
    fn assert_command() {
        let cmd = Command::Assert(Formula::eq(
            Formula::declared("x", Sort::Int),
            Formula::int(5),
        ));
        assert_eq!(cmd.to_string(), "(assert (= x 5))");
    }

    #[test]
    fn get_value_lists_terms() {
        let cmd = Command::GetValue(vec![
            Formula::declared("x", Sort::Int),
            Formula::declared("b", Sort::Bool),
        ]);
        assert_eq!(cmd.to_string(), "(get-value (x b))");
    }

    #[test]
    fn scope_and_misc_commands() {
        assert_eq!(Command::Push(1).to_string(), "(push 1)");
        assert_eq!(Command::Pop(2).to_string(), "(pop 2)");
        assert_eq!(Command::CheckSat.to_string(), "(check-sat)");
        assert_eq!(Command::Exit.to_string(), "(exit)");
        assert_eq!(
            Command::SetOption("produce-models".into(), "true".into()).to_string(),
            "(set-option :produce-models true)"
        );
        assert_eq!(Command::Comment("f".into()).to_string(), ";; f");
    }

    #[test]
    fn script_is_newline_separated() {
        let script = Script::with_commands(vec![
            Command::SetLogic("QF_LIA".to_string()),
            Command::DeclareConst("x".to_string(), Sort::Int),
            Command::CheckSat,
        ]);
        assert_eq!(
            script.to_string(),
            "(set-logic QF_LIA)\n(declare-const x Int)\n(check-sat)"
        );
    }
}
