//! # smtgas-solver
//!
//! Solver backends for the symbolic encoder.
//!
//! The encoder talks to a solver only through the [`SolverBackend`] trait.
//! [`SmtLib2Interface`] accumulates SMT-LIB2 text and answers queries
//! through a [`QueryRunner`], which is either a [`CliSolver`] subprocess
//! (Z3 or CVC5 over stdin) or any closure supplied by the embedder. With
//! the `z3-native` feature, `Z3NativeSolver` drives the Z3 library
//! directly.
//!
//! ## Usage
//!
//! ```no_run
//! use smtgas_smtlib::{Formula, Sort};
//! use smtgas_solver::{SmtLib2Interface, SolverBackend};
//!
//! let mut backend = SmtLib2Interface::with_default_solver().unwrap();
//! let x = Formula::declared("x", Sort::Int);
//! backend.assert(&Formula::gt(x.clone(), Formula::int(0)));
//! backend.assert(&Formula::lt(x.clone(), Formula::int(10)));
//!
//! let outcome = backend.check(&[x]);
//! println!("{} {:?}", outcome.result, outcome.values);
//! ```

pub mod backend;
pub mod config;
pub mod error;
mod parser;
pub mod result;
pub mod smtlib2;
pub mod solver;

#[cfg(feature = "z3-native")]
pub mod z3_native;

pub use backend::SolverBackend;
pub use config::{SolverConfig, SolverKind};
pub use error::SolverError;
pub use parser::{parse_check_response, parse_get_value};
pub use result::{CheckOutcome, CheckResult};
pub use smtlib2::SmtLib2Interface;
pub use solver::{CliSolver, QueryRunner};

#[cfg(feature = "z3-native")]
pub use z3_native::Z3NativeSolver;
