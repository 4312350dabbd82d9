//! Performance benchmarks for function encoding and solving.
//!
//! Benchmark groups:
//! - `encode_*`: tree -> statements -> SMT-LIB script, no solver involved
//! - `e2e_*`: encoding plus a Z3 satisfiability check

use criterion::{Criterion, criterion_group, criterion_main};
use smtgas_analysis::GasAnalyzer;
use smtgas_analysis::ast::{AstBuilder, BinaryOp, ContractDefinition, IntegerType, Type, UnaryOp};
use smtgas_solver::{CliSolver, SmtLib2Interface};

// ---------------------------------------------------------------------------
// Contract constructors
// ---------------------------------------------------------------------------

fn int256() -> Type {
    Type::Integer(IntegerType::int256())
}

/// `function f(int x) returns (int y) { y = x + 1; }`
fn make_increment_contract() -> ContractDefinition {
    let mut b = AstBuilder::new();
    let x = b.variable("x", int256());
    let y = b.variable("y", int256());
    let lhs = b.identifier(&x);
    let one = b.number(1);
    let sum = b.binary(BinaryOp::Add, lhs, one);
    let assign = b.assign(&y, sum);
    let body = vec![b.expr_stmt(assign)];
    let f = b.function("f", vec![x], vec![y], body);
    b.contract("Increment", vec![], vec![f])
}

/// `function max(int a, int b) returns (int m) { if (a > b) m = a; else m = b; }`
fn make_max_contract() -> ContractDefinition {
    let mut b = AstBuilder::new();
    let a = b.variable("a", int256());
    let c = b.variable("b", int256());
    let m = b.variable("m", int256());
    let l = b.identifier(&a);
    let r = b.identifier(&c);
    let cond = b.binary(BinaryOp::Gt, l, r);
    let then_value = b.identifier(&a);
    let else_value = b.identifier(&c);
    let then_assign = b.assign(&m, then_value);
    let else_assign = b.assign(&m, else_value);
    let then_stmt = b.expr_stmt(then_assign);
    let else_stmt = b.expr_stmt(else_assign);
    let body = vec![b.if_else(cond, then_stmt, Some(else_stmt))];
    let f = b.function("max", vec![a, c], vec![m], body);
    b.contract("Max", vec![], vec![f])
}

/// A state counter updated `n` times with mixed arithmetic, including
/// signed division and a bounded loop.
fn make_long_contract(n: usize) -> ContractDefinition {
    let mut b = AstBuilder::new();
    let counter = b.variable("counter", int256());
    let step = b.variable("step", Type::Integer(IntegerType::int(64)));
    let mut body = Vec::with_capacity(n + 1);
    for i in 0..n {
        let lhs = b.identifier(&counter);
        let rhs = b.identifier(&step);
        let op = match i % 4 {
            0 => BinaryOp::Add,
            1 => BinaryOp::Sub,
            2 => BinaryOp::Mul,
            _ => BinaryOp::Div,
        };
        let value = b.binary(op, lhs, rhs);
        let assign = b.assign(&counter, value);
        body.push(b.expr_stmt(assign));
    }
    let i = b.variable("i", Type::Integer(IntegerType::uint(8)));
    let cond_lhs = b.identifier(&i);
    let limit = b.number(10);
    let cond = b.binary(BinaryOp::Lt, cond_lhs, limit);
    let target = b.lvalue(&i);
    let inc = b.unary(UnaryOp::Inc, true, target);
    let loop_body = b.expr_stmt(inc);
    body.push(b.while_loop(cond, loop_body));
    let f = b.function("run", vec![step], vec![i], body);
    b.contract("Long", vec![counter], vec![f])
}

// ---------------------------------------------------------------------------
// Encoding-only benchmarks
// ---------------------------------------------------------------------------

fn bench_encode_increment(c: &mut Criterion) {
    let contract = make_increment_contract();
    let analyzer = GasAnalyzer::default();
    c.bench_function("encode_increment", |b| {
        b.iter(|| analyzer.analyze_contract(&contract));
    });
}

fn bench_encode_max(c: &mut Criterion) {
    let contract = make_max_contract();
    let analyzer = GasAnalyzer::default();
    c.bench_function("encode_max", |b| {
        b.iter(|| analyzer.analyze_contract(&contract));
    });
}

fn bench_encode_long(c: &mut Criterion) {
    let contract = make_long_contract(200);
    let analyzer = GasAnalyzer::default();
    c.bench_function("encode_long_200", |b| {
        b.iter(|| {
            let report = analyzer.analyze_contract(&contract);
            report
                .encoded()
                .map(|f| f.encoder().map(|e| e.to_smtlib().len()).unwrap_or(0))
                .sum::<usize>()
        });
    });
}

// ---------------------------------------------------------------------------
// End-to-end benchmarks (encoding + Z3)
// ---------------------------------------------------------------------------

fn bench_e2e(c: &mut Criterion, name: &str, contract: ContractDefinition) {
    let solver = match CliSolver::with_default_config() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Z3 not available, skipping E2E bench: {e}");
            return;
        }
    };
    let mut backend = SmtLib2Interface::with_runner(solver);
    let analyzer = GasAnalyzer::default();
    c.bench_function(name, |b| {
        b.iter(|| {
            let report = analyzer.analyze_contract(&contract);
            for function in &report.functions {
                let _ = function.check(&mut backend, &[]);
            }
        });
    });
}

fn bench_e2e_increment(c: &mut Criterion) {
    bench_e2e(c, "e2e_increment", make_increment_contract());
}

fn bench_e2e_max(c: &mut Criterion) {
    bench_e2e(c, "e2e_max", make_max_contract());
}

fn bench_e2e_long(c: &mut Criterion) {
    bench_e2e(c, "e2e_long_50", make_long_contract(50));
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(
    encode_benches,
    bench_encode_increment,
    bench_encode_max,
    bench_encode_long,
);

criterion_group!(e2e_benches, bench_e2e_increment, bench_e2e_max, bench_e2e_long);

criterion_main!(encode_benches, e2e_benches);
