//! Property tests for the formula algebra.
//!
//! - `apply` accepts exactly the arity of each operator and rejects every
//!   other argument count.
//! - Serialization hoists each free variable exactly once no matter how
//!   often it recurs in the term.

use proptest::prelude::*;
use smtgas_smtlib::{ArityError, Formula, Operator, Sort};

fn operator() -> impl Strategy<Value = Operator> {
    prop::sample::select(Operator::ALL.to_vec())
}

fn int_var(i: usize) -> Formula {
    Formula::declared(format!("v{i}"), Sort::Int)
}

proptest! {
    #[test]
    fn apply_rejects_wrong_arity(op in operator(), count in 0usize..6) {
        let args: Vec<Formula> = (0..count).map(int_var).collect();
        let result = Formula::apply(op, args);
        if count == op.arity() {
            let f = result.unwrap();
            prop_assert_eq!(f.args().len(), op.arity());
            prop_assert_eq!(f.operator(), Some(op));
        } else {
            prop_assert_eq!(
                result,
                Err(ArityError::WrongArity { op, expected: op.arity(), actual: count })
            );
        }
    }

    #[test]
    fn declarations_are_hoisted_once(repeats in 1usize..12, vars in 1usize..5) {
        // Sum v0 + v1 + ... repeated `repeats` times.
        let mut term = Formula::int(0);
        for r in 0..repeats {
            for v in 0..vars {
                term = Formula::add(term, int_var((r + v) % vars));
            }
        }
        let s = Formula::eq(term, int_var(0)).serialize("");
        prop_assert_eq!(s.declarations.len(), vars);
        for v in 0..vars {
            let expected = format!("(declare-const v{v} Int)");
            prop_assert!(s.declarations.contains(&expected));
        }
    }

    #[test]
    fn serialization_is_deterministic(a in -1000i64..1000, b in -1000i64..1000) {
        let f = Formula::and(
            Formula::le(int_var(0), Formula::int(a)),
            Formula::ge(int_var(1), Formula::int(b)),
        );
        prop_assert_eq!(f.serialize("n"), f.clone().serialize("n"));
    }
}
