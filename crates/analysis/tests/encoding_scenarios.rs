//! End-to-end encodings of small functions through the analyzer.

use smtgas_analysis::ast::{
    AstBuilder, BinaryOp, ContractDefinition, IntegerType, Type, UnaryOp, VariableDeclaration,
};
use smtgas_analysis::{
    AnalyzerConfig, EncodeError, EncoderConfig, FunctionEncoder, GasAnalyzer, Severity,
};

// ---- Helpers ----

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn int256() -> Type {
    Type::Integer(IntegerType::int256())
}

fn statement_texts(encoder: &FunctionEncoder) -> Vec<String> {
    encoder
        .statements()
        .iter()
        .map(|s| s.contribution().to_string())
        .collect()
}

/// `function f(int x) returns (int y) { y = x + 1; }`
fn increment_contract(b: &mut AstBuilder) -> (ContractDefinition, VariableDeclaration, VariableDeclaration) {
    let x = b.variable("x", int256());
    let y = b.variable("y", int256());
    let lhs = b.identifier(&x);
    let one = b.number(1);
    let sum = b.binary(BinaryOp::Add, lhs, one);
    let assign = b.assign(&y, sum);
    let body = vec![b.expr_stmt(assign)];
    let f = b.function("f", vec![x.clone()], vec![y.clone()], body);
    (b.contract("C", vec![], vec![f]), x, y)
}

#[test]
fn increment_function_versions_and_script() {
    init_logging();
    let mut b = AstBuilder::new();
    let (contract, x, y) = increment_contract(&mut b);

    let report = GasAnalyzer::default().analyze_contract(&contract);
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    let encoder = report.function("C", "f").unwrap().encoder().unwrap();

    assert_eq!(encoder.variable_version(x.id), Some(0));
    assert_eq!(encoder.variable_version(y.id), Some(1));

    let script = encoder.to_smtlib();
    assert_eq!(
        script.matches(&format!("(declare-const y-{}_1 Int)", y.id)).count(),
        1
    );
    assert!(script.contains(&format!("(assert (= y-{}_0 0))", y.id)));
    assert!(script.contains(&format!("(>= x-{}_0 (- ", x.id)));

    // The final version of y is defined from the sum's leaf.
    let defining = statement_texts(encoder)
        .into_iter()
        .find(|s| s.starts_with(&format!("(= y-{}_1 expr_", y.id)))
        .expect("y-1 should be defined");
    assert!(defining.ends_with(')'));
}

#[test]
fn every_declaration_appears_once() {
    let mut b = AstBuilder::new();
    let (contract, _, _) = increment_contract(&mut b);
    let report = GasAnalyzer::default().analyze_contract(&contract);
    let script = report.functions[0].encoder().unwrap().to_smtlib();

    let declarations: Vec<&str> = script
        .lines()
        .filter(|l| l.starts_with("(declare-const"))
        .collect();
    let mut unique = declarations.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(declarations.len(), unique.len());
    // Declarations precede every assertion.
    let first_assert = script.lines().position(|l| l.starts_with("(assert")).unwrap();
    assert!(
        script
            .lines()
            .skip(first_assert)
            .all(|l| !l.starts_with("(declare-const"))
    );
}

#[test]
fn nested_branch_statements_carry_both_guards() {
    // if (a) { if (c) { z = 1; } }
    let mut b = AstBuilder::new();
    let a = b.variable("a", Type::Bool);
    let c = b.variable("c", Type::Bool);
    let z = b.variable("z", int256());
    let outer = b.identifier(&a);
    let inner = b.identifier(&c);
    let one = b.number(1);
    let assign = b.assign(&z, one.clone());
    let assign_stmt = b.expr_stmt(assign);
    let inner_if = b.if_else(inner.clone(), assign_stmt, None);
    let body = vec![b.if_else(outer.clone(), inner_if, None)];
    let f = b.function("f", vec![a, c], vec![z.clone()], body);
    let contract = b.contract("C", vec![], vec![f]);

    let report = GasAnalyzer::default().analyze_contract(&contract);
    let encoder = report.functions[0].encoder().unwrap();
    let texts = statement_texts(encoder);
    assert!(texts.contains(&format!(
        "(or (not (and expr_{} expr_{})) (= z-{}_1 expr_{}))",
        outer.id,
        inner.id,
        z.id,
        one.id
    )));
    // Inner merge happens under the outer guard, outer merge at top level.
    assert_eq!(encoder.variable_version(z.id), Some(3));
    assert_eq!(
        texts.last().unwrap(),
        &format!("(= z-{0}_3 (ite expr_{1} z-{0}_2 z-{0}_0))", z.id, outer.id)
    );
}

#[test]
fn versions_never_decrease_across_branches() {
    let mut b = AstBuilder::new();
    let c = b.variable("c", Type::Bool);
    let x = b.variable("x", Type::Integer(IntegerType::uint(32)));
    let cond = b.identifier(&c);
    let then_target = b.lvalue(&x);
    let then_inc = b.unary(UnaryOp::Inc, true, then_target);
    let else_target = b.lvalue(&x);
    let else_dec = b.unary(UnaryOp::Dec, false, else_target);
    let then_stmt = b.expr_stmt(then_inc);
    let else_stmt = b.expr_stmt(else_dec);
    let body = vec![b.if_else(cond, then_stmt, Some(else_stmt))];
    let f = b.function("f", vec![c, x.clone()], vec![], body);
    let contract = b.contract("C", vec![], vec![f]);

    let report = GasAnalyzer::default().analyze_contract(&contract);
    let encoder = report.functions[0].encoder().unwrap();
    let texts = statement_texts(encoder);

    let mut last = 0;
    for text in &texts {
        for version in 0..=4u32 {
            if text.starts_with(&format!("(= x-{}_{version} ", x.id))
                || text.contains(&format!(") (= x-{}_{version} ", x.id))
            {
                assert!(version >= last, "x-{version} assigned after x-{last}");
                last = version;
            }
        }
    }
    assert_eq!(encoder.variable_version(x.id), Some(4));
}

#[test]
fn duplicate_declaration_abandons_only_that_function() {
    init_logging();
    let mut b = AstBuilder::new();
    let x = b.variable("x", int256());
    let dup = b.function("dup", vec![x.clone()], vec![x.clone()], vec![]);
    let (other, _, _) = increment_contract(&mut b);
    let mut contract = b.contract("C", vec![], vec![dup]);
    contract.functions.extend(other.functions);

    let report = GasAnalyzer::default().analyze_contract(&contract);
    assert!(matches!(
        report.function("C", "dup").unwrap().error(),
        Some(EncodeError::DuplicateDeclaration { id, .. }) if *id == x.id
    ));
    assert!(report.function("C", "f").unwrap().is_encoded());
    assert_eq!(
        report
            .diagnostics
            .diagnostics()
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count(),
        1
    );
}

#[test]
fn fractional_constant_is_fatal() {
    let mut b = AstBuilder::new();
    let half = b.rational(1, 2);
    let body = vec![b.expr_stmt(half)];
    let f = b.function("f", vec![], vec![], body);
    let contract = b.contract("C", vec![], vec![f]);

    let report = GasAnalyzer::default().analyze_contract(&contract);
    assert!(matches!(
        report.functions[0].error(),
        Some(EncodeError::FractionalLiteral { .. })
    ));
}

#[test]
fn division_guard_from_config() {
    let mut b = AstBuilder::new();
    let x = b.variable("x", int256());
    let q = b.variable("q", int256());
    let lhs = b.identifier(&x);
    let rhs = b.identifier(&x);
    let quotient = b.binary(BinaryOp::Div, lhs, rhs.clone());
    let assign = b.assign(&q, quotient);
    let body = vec![b.expr_stmt(assign)];
    let f = b.function("f", vec![x], vec![q], body);
    let contract = b.contract("C", vec![], vec![f]);

    let guarded = GasAnalyzer::new(AnalyzerConfig::new(
        EncoderConfig::default().with_division_guard(true),
    ))
    .analyze_contract(&contract);
    let plain = GasAnalyzer::default().analyze_contract(&contract);

    let guard = format!("(not (= expr_{} 0))", rhs.id);
    assert!(statement_texts(guarded.functions[0].encoder().unwrap()).contains(&guard));
    assert!(!statement_texts(plain.functions[0].encoder().unwrap()).contains(&guard));
}

#[test]
fn finalized_encoder_is_read_only() {
    let mut b = AstBuilder::new();
    let (contract, _, y) = increment_contract(&mut b);
    let function = &contract.functions[0];

    let mut encoder = FunctionEncoder::for_function(&contract, function, EncoderConfig::default()).unwrap();
    encoder.finalize();
    let formula = encoder.formula();
    assert_eq!(
        encoder.assignment(y.id, smtgas_smtlib::Formula::int(0), &y.location),
        Err(EncodeError::Finalized)
    );
    assert_eq!(encoder.variable_version(y.id), Some(0));
    assert_eq!(encoder.formula(), formula);
}
