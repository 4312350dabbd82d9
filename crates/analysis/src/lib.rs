//! # smtgas-analysis
//!
//! Symbolic execution of contract functions into SMT formulas for gas and
//! assertion analysis.
//!
//! The host compiler hands over a typed tree ([`ast`]). For each function,
//! a [`FunctionEncoder`] gives every source variable a sequence of SSA
//! versions ([`SymbolicVariable`]), every expression a named leaf, and
//! records one path-condition-gated [`Statement`] per fact it learns. The
//! [`GasAnalyzer`] decides the traversal order and collects the results.
//!
//! ## Usage
//!
//! ```
//! use smtgas_analysis::ast::{AstBuilder, BinaryOp, IntegerType, Type};
//! use smtgas_analysis::GasAnalyzer;
//!
//! // function f(int x) returns (int y) { y = x + 1; }
//! let mut b = AstBuilder::new();
//! let x = b.variable("x", Type::Integer(IntegerType::int256()));
//! let y = b.variable("y", Type::Integer(IntegerType::int256()));
//! let lhs = b.identifier(&x);
//! let one = b.number(1);
//! let sum = b.binary(BinaryOp::Add, lhs, one);
//! let assign = b.assign(&y, sum);
//! let body = vec![b.expr_stmt(assign)];
//! let f = b.function("f", vec![x], vec![y.clone()], body);
//! let contract = b.contract("C", vec![], vec![f]);
//!
//! let report = GasAnalyzer::default().analyze_contract(&contract);
//! let encoder = report.functions[0].encoder().unwrap();
//! assert_eq!(encoder.variable_version(y.id), Some(1));
//! println!("{}", encoder.to_smtlib());
//! ```

pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod encoder;
pub mod error;
pub mod symbolic_variable;

pub use config::{AnalyzerConfig, EncoderConfig};
pub use diagnostics::{Diagnostic, ErrorReporter, Severity};
pub use driver::{AnalysisReport, FunctionReport, GasAnalyzer};
pub use encoder::{FunctionEncoder, Partition, Phase, Statement, division};
pub use error::{EncodeError, UnsupportedType};
pub use symbolic_variable::{SymbolicVariable, variable_sort};
