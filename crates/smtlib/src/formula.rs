//! Immutable logical terms over `Int` and `Bool`.
//!
//! A [`Formula`] is one of three shapes:
//!
//! - `Apply`: a built-in operator applied to an ordered argument list,
//! - `Leaf`: a constant (`true`, `false`, `42`) or a name managed elsewhere,
//! - `Declared`: a free variable that must be introduced with
//!   `declare-const` before use.
//!
//! Operator arity is enforced by construction. The typed constructors
//! (`not`, `and`, `ite`, ...) cannot build a malformed node, and the generic
//! [`Formula::apply`] rejects argument lists that do not match
//! [`Operator::arity`].
//!
//! Children are reference counted, so cloning a formula is cheap and
//! sub-terms can be shared freely between statements.
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use num::BigInt;
use thiserror::Error;

use crate::sort::Sort;

/// Built-in operators and their fixed arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Not,
    And,
    Or,
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    /// Native integer division (`div`, floors towards negative infinity
    /// for a positive divisor).
    Div,
    Ite,
}

impl Operator {
    pub const ALL: [Operator; 13] = [
        Operator::Not,
        Operator::And,
        Operator::Or,
        Operator::Eq,
        Operator::Lt,
        Operator::Le,
        Operator::Gt,
        Operator::Ge,
        Operator::Add,
        Operator::Sub,
        Operator::Mul,
        Operator::Div,
        Operator::Ite,
    ];

    /// SMT-LIB2 symbol of the operator.
    pub fn name(self) -> &'static str {
        match self {
            Operator::Not => "not",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Eq => "=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "div",
            Operator::Ite => "ite",
        }
    }

    /// Number of arguments the operator takes.
    pub fn arity(self) -> usize {
        match self {
            Operator::Not => 1,
            Operator::Ite => 3,
            _ => 2,
        }
    }

    /// Look an operator up by symbol. `/` is accepted as an alias of `div`.
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "/" {
            return Some(Operator::Div);
        }
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Result sort. Arithmetic yields `Int`, `ite` takes the sort of its
    /// then-branch, everything else is a predicate.
    fn result_sort(self, args: &[Formula]) -> Sort {
        match self {
            Operator::Add | Operator::Sub | Operator::Mul | Operator::Div => Sort::Int,
            Operator::Ite => args[1].sort(),
            _ => Sort::Bool,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rejected operator application.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArityError {
    #[error("unknown operator `{0}`")]
    UnknownOperator(String),
    #[error("operator `{op}` expects {expected} argument(s), got {actual}")]
    WrongArity {
        op: Operator,
        expected: usize,
        actual: usize,
    },
}

/// Serialized form of a formula: inline text plus the `declare-const`
/// commands needed for every free variable reachable from it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Serialized {
    pub declarations: BTreeSet<String>,
    pub text: String,
}

/// An immutable, well-sorted logical term.
#[derive(Debug, Clone, PartialEq)]
pub enum Formula {
    Apply {
        op: Operator,
        sort: Sort,
        args: Arc<[Formula]>,
    },
    Leaf {
        name: Arc<str>,
        sort: Sort,
    },
    Declared {
        name: Arc<str>,
        sort: Sort,
    },
}

impl Formula {
    // === Leaves ===

    /// Boolean constant.
    pub fn bool(value: bool) -> Self {
        Formula::Leaf {
            name: Arc::from(if value { "true" } else { "false" }),
            sort: Sort::Bool,
        }
    }

    /// Integer constant. Negative values render as `(- N)`.
    pub fn int(value: impl Into<BigInt>) -> Self {
        let value: BigInt = value.into();
        let name = if value.sign() == num::bigint::Sign::Minus {
            format!("(- {})", -value)
        } else {
            value.to_string()
        };
        Formula::Leaf {
            name: Arc::from(name),
            sort: Sort::Int,
        }
    }

    /// A named term whose declaration is owned by someone else (e.g. a
    /// solver backend that already emitted `declare-const`).
    pub fn leaf(name: impl Into<String>, sort: Sort) -> Self {
        Formula::Leaf {
            name: Arc::from(name.into()),
            sort,
        }
    }

    /// A free variable that carries its own declaration.
    pub fn declared(name: impl Into<String>, sort: Sort) -> Self {
        Formula::Declared {
            name: Arc::from(name.into()),
            sort,
        }
    }

    // === Operators ===

    /// Generic, arity-checked operator application.
    pub fn apply(op: Operator, args: Vec<Formula>) -> Result<Self, ArityError> {
        if args.len() != op.arity() {
            return Err(ArityError::WrongArity {
                op,
                expected: op.arity(),
                actual: args.len(),
            });
        }
        Ok(Self::node(op, args))
    }

    /// Like [`Formula::apply`], looking the operator up by symbol.
    pub fn apply_named(name: &str, args: Vec<Formula>) -> Result<Self, ArityError> {
        let op =
            Operator::from_name(name).ok_or_else(|| ArityError::UnknownOperator(name.to_string()))?;
        Self::apply(op, args)
    }

    // Callers guarantee the arity.
    fn node(op: Operator, args: Vec<Formula>) -> Self {
        let sort = op.result_sort(&args);
        Formula::Apply {
            op,
            sort,
            args: Arc::from(args),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(a: Formula) -> Self {
        Self::node(Operator::Not, vec![a])
    }

    pub fn and(a: Formula, b: Formula) -> Self {
        Self::node(Operator::And, vec![a, b])
    }

    pub fn or(a: Formula, b: Formula) -> Self {
        Self::node(Operator::Or, vec![a, b])
    }

    /// `a ⟹ b`, expressed as `¬a ∨ b`.
    pub fn implies(a: Formula, b: Formula) -> Self {
        Self::or(Self::not(a), b)
    }

    pub fn eq(a: Formula, b: Formula) -> Self {
        Self::node(Operator::Eq, vec![a, b])
    }

    /// `a ≠ b`, expressed as `¬(a = b)`.
    pub fn ne(a: Formula, b: Formula) -> Self {
        Self::not(Self::eq(a, b))
    }

    pub fn lt(a: Formula, b: Formula) -> Self {
        Self::node(Operator::Lt, vec![a, b])
    }

    pub fn le(a: Formula, b: Formula) -> Self {
        Self::node(Operator::Le, vec![a, b])
    }

    pub fn gt(a: Formula, b: Formula) -> Self {
        Self::node(Operator::Gt, vec![a, b])
    }

    pub fn ge(a: Formula, b: Formula) -> Self {
        Self::node(Operator::Ge, vec![a, b])
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add(a: Formula, b: Formula) -> Self {
        Self::node(Operator::Add, vec![a, b])
    }

    #[allow(clippy::should_implement_trait)]
    pub fn sub(a: Formula, b: Formula) -> Self {
        Self::node(Operator::Sub, vec![a, b])
    }

    #[allow(clippy::should_implement_trait)]
    pub fn mul(a: Formula, b: Formula) -> Self {
        Self::node(Operator::Mul, vec![a, b])
    }

    /// Native integer division of the backend.
    #[allow(clippy::should_implement_trait)]
    pub fn div(a: Formula, b: Formula) -> Self {
        Self::node(Operator::Div, vec![a, b])
    }

    /// Arithmetic negation, `0 - a`.
    #[allow(clippy::should_implement_trait)]
    pub fn neg(a: Formula) -> Self {
        Self::sub(Self::int(0), a)
    }

    /// `ite(c, t, f)`. The result has the sort of `t`; `t` and `f` are
    /// expected to agree.
    pub fn ite(cond: Formula, then: Formula, otherwise: Formula) -> Self {
        debug_assert_eq!(cond.sort(), Sort::Bool, "ite condition must be Bool");
        Self::node(Operator::Ite, vec![cond, then, otherwise])
    }

    /// Conjunction of any number of formulas: `true` when empty, the
    /// formula itself for a single element, otherwise left-nested `and`.
    pub fn conjunction(formulas: impl IntoIterator<Item = Formula>) -> Self {
        formulas
            .into_iter()
            .reduce(Self::and)
            .unwrap_or_else(|| Self::bool(true))
    }

    // === Accessors ===

    pub fn sort(&self) -> Sort {
        match self {
            Formula::Apply { sort, .. } | Formula::Leaf { sort, .. } | Formula::Declared { sort, .. } => {
                *sort
            }
        }
    }

    /// Operator symbol for applications, the bare name for leaves.
    pub fn name(&self) -> &str {
        match self {
            Formula::Apply { op, .. } => op.name(),
            Formula::Leaf { name, .. } | Formula::Declared { name, .. } => name,
        }
    }

    pub fn operator(&self) -> Option<Operator> {
        match self {
            Formula::Apply { op, .. } => Some(*op),
            _ => None,
        }
    }

    pub fn args(&self) -> &[Formula] {
        match self {
            Formula::Apply { args, .. } => args,
            _ => &[],
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Formula::Leaf { name, .. } if &**name == "true")
    }

    pub fn is_false(&self) -> bool {
        matches!(self, Formula::Leaf { name, .. } if &**name == "false")
    }

    // === Serialization ===

    /// Render the term and collect the declarations of every free variable
    /// in it. A non-empty `nonce` is appended to declared names as
    /// `<name>.<nonce>` so the same term can be emitted in several contexts.
    pub fn serialize(&self, nonce: &str) -> Serialized {
        let mut out = Serialized::default();
        self.write_sexpr(nonce, &mut out);
        out
    }

    fn write_sexpr(&self, nonce: &str, out: &mut Serialized) {
        match self {
            Formula::Apply { op, args, .. } => {
                out.text.push('(');
                out.text.push_str(op.name());
                for arg in args.iter() {
                    out.text.push(' ');
                    arg.write_sexpr(nonce, out);
                }
                out.text.push(')');
            }
            Formula::Leaf { name, .. } => out.text.push_str(name),
            Formula::Declared { name, sort } => {
                let name = if nonce.is_empty() {
                    name.to_string()
                } else {
                    format!("{name}.{nonce}")
                };
                out.declarations
                    .insert(format!("(declare-const {name} {sort})"));
                out.text.push_str(&name);
            }
        }
    }

    /// Names and sorts of every declared variable reachable from the term.
    pub fn free_variables(&self) -> BTreeSet<(String, Sort)> {
        let mut vars = BTreeSet::new();
        let mut stack = vec![self];
        while let Some(f) = stack.pop() {
            match f {
                Formula::Apply { args, .. } => stack.extend(args.iter()),
                Formula::Declared { name, sort } => {
                    vars.insert((name.to_string(), *sort));
                }
                Formula::Leaf { .. } => {}
            }
        }
        vars
    }
}

impl From<bool> for Formula {
    fn from(value: bool) -> Self {
        Formula::bool(value)
    }
}

impl From<i64> for Formula {
    fn from(value: i64) -> Self {
        Formula::int(value)
    }
}

impl From<u64> for Formula {
    fn from(value: u64) -> Self {
        Formula::int(value)
    }
}

impl From<usize> for Formula {
    fn from(value: usize) -> Self {
        Formula::int(value)
    }
}

impl From<BigInt> for Formula {
    fn from(value: BigInt) -> Self {
        Formula::int(value)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize("").text)
    }
}
