//! # smtgas-smtlib
//!
//! Term algebra for the function encoder: immutable, well-sorted
//! [`Formula`] trees over `Int` and `Bool`, plus the SMT-LIB2 command and
//! script types used to hand them to a solver.
//!
//! ## Usage
//!
//! ```
//! use smtgas_smtlib::{Formula, Sort};
//!
//! let x = Formula::declared("x", Sort::Int);
//! let y = Formula::declared("y", Sort::Int);
//! let f = Formula::and(Formula::eq(x, Formula::int(3)), Formula::lt(y, Formula::int(4)));
//!
//! let sexpr = f.serialize("");
//! assert_eq!(sexpr.text, "(and (= x 3) (< y 4))");
//! assert_eq!(sexpr.declarations.len(), 2);
//! ```

pub mod command;
pub mod formatter;
pub mod formula;
pub mod script;
pub mod sort;

pub use command::Command;
pub use formula::{ArityError, Formula, Operator, Serialized};
pub use script::Script;
pub use sort::Sort;
