//! Traversal policy: which nodes the encoder sees, in which order.
//!
//! [`GasAnalyzer`] walks every function of every contract, feeds the body to
//! a fresh [`FunctionEncoder`] and collects the result in an
//! [`AnalysisReport`]. Expressions are encoded in post-order. Branches are
//! encoded under pushed path conditions and joined with `ite`; loops are not
//! unrolled, the variables they write are havocked instead. Statements after
//! a `return` are gated by the negation of the path it was taken on.
//!
//! A fatal [`EncodeError`] discards the function it occurred in and is
//! recorded as an error diagnostic. Other functions are unaffected.

use std::collections::{BTreeMap, BTreeSet};

use smtgas_smtlib::Formula;
use smtgas_solver::{CheckOutcome, SolverBackend};

use crate::ast::{
    ContractDefinition, ExprKind, Expression, FunctionDefinition, FunctionKind, LiteralValue,
    NodeId, SourceLocation, SourceUnit, Stmt, StmtKind, Type, UnaryOp, VariableDeclaration,
};
use crate::config::AnalyzerConfig;
use crate::diagnostics::{Diagnostic, ErrorReporter};
use crate::encoder::FunctionEncoder;
use crate::error::EncodeError;
use crate::symbolic_variable::zero;

/// Encoding result of one function.
#[derive(Debug)]
pub struct FunctionReport {
    pub contract: String,
    pub function: String,
    pub location: SourceLocation,
    /// The finalized encoder, or the condition that abandoned the function.
    pub outcome: Result<FunctionEncoder, EncodeError>,
    pub diagnostics: ErrorReporter,
}

impl FunctionReport {
    pub fn encoder(&self) -> Option<&FunctionEncoder> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&EncodeError> {
        self.outcome.as_ref().err()
    }

    pub fn is_encoded(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Check the function's formula in a fresh scope of `backend`,
    /// evaluating `to_evaluate` in the model. `None` if the function could
    /// not be encoded.
    pub fn check(
        &self,
        backend: &mut dyn SolverBackend,
        to_evaluate: &[Formula],
    ) -> Option<CheckOutcome> {
        let encoder = self.encoder()?;
        backend.push();
        encoder.assert_into(backend);
        let outcome = backend.check(to_evaluate);
        if let Err(e) = backend.pop() {
            tracing::warn!(error = %e, function = %self.function, "Could not restore solver scope");
        }
        tracing::debug!(contract = %self.contract, function = %self.function, result = %outcome.result, "Checked function");
        Some(outcome)
    }
}

/// Everything the analyzer produced for a source unit or contract.
#[derive(Debug, Default)]
pub struct AnalysisReport {
    pub functions: Vec<FunctionReport>,
    /// Diagnostics of every function, in encoding order.
    pub diagnostics: ErrorReporter,
}

impl AnalysisReport {
    pub fn function(&self, contract: &str, function: &str) -> Option<&FunctionReport> {
        self.functions
            .iter()
            .find(|f| f.contract == contract && f.function == function)
    }

    pub fn encoded(&self) -> impl Iterator<Item = &FunctionReport> {
        self.functions.iter().filter(|f| f.is_encoded())
    }

    pub fn failed(&self) -> impl Iterator<Item = &FunctionReport> {
        self.functions.iter().filter(|f| !f.is_encoded())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.warnings()
    }

    fn push(&mut self, report: FunctionReport) {
        let mut diagnostics = report.diagnostics.clone();
        self.diagnostics.append(&mut diagnostics);
        self.functions.push(report);
    }

    fn extend(&mut self, mut other: AnalysisReport) {
        self.diagnostics.append(&mut other.diagnostics);
        self.functions.append(&mut other.functions);
    }
}

#[derive(Debug, Clone, Default)]
pub struct GasAnalyzer {
    config: AnalyzerConfig,
}

impl GasAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn analyze(&self, unit: &SourceUnit) -> AnalysisReport {
        let mut report = AnalysisReport::default();
        for contract in &unit.contracts {
            report.extend(self.analyze_contract(contract));
        }
        tracing::info!(
            functions = report.functions.len(),
            failed = report.failed().count(),
            "Analysis finished"
        );
        report
    }

    pub fn analyze_contract(&self, contract: &ContractDefinition) -> AnalysisReport {
        let mut report = AnalysisReport::default();
        for function in &contract.functions {
            report.push(self.analyze_function(contract, function));
        }
        report
    }

    pub fn analyze_function(
        &self,
        contract: &ContractDefinition,
        function: &FunctionDefinition,
    ) -> FunctionReport {
        let mut encoder = FunctionEncoder::new(self.config.encoder);
        if function.is_constructor {
            encoder.warning(
                &function.location,
                "Gas estimator does not yet support constructors; the body is encoded as a plain function.",
            );
        }
        if !function.modifiers.is_empty() {
            encoder.warning(
                &function.location,
                format!(
                    "Gas estimator does not yet support modifiers; ignoring {}.",
                    function.modifiers.join(", ")
                ),
            );
        }

        let result = encoder
            .initialize(contract, function)
            .and_then(|()| BodyEncoder::new(&mut encoder, &function.returns).statements(&function.body));

        let mut diagnostics = encoder.take_diagnostics();
        let outcome = match result {
            Ok(()) => {
                encoder.finalize();
                Ok(encoder)
            }
            Err(e) => {
                diagnostics.error(
                    e.location().unwrap_or(&function.location),
                    format!("Encoding of {}.{} abandoned: {e}", contract.name, function.name),
                );
                Err(e)
            }
        };

        FunctionReport {
            contract: contract.name.clone(),
            function: function.name.clone(),
            location: function.location.clone(),
            outcome,
            diagnostics,
        }
    }
}

/// Declarations written anywhere inside `stmts` or `exprs`.
fn assigned_variables(stmts: &[&Stmt], exprs: &[&Expression]) -> BTreeSet<NodeId> {
    fn visit_expr(e: &Expression, out: &mut BTreeSet<NodeId>) {
        match &e.kind {
            ExprKind::Assignment { lhs, .. } => out.extend(lhs.referenced_declaration()),
            ExprKind::Unary {
                op: UnaryOp::Inc | UnaryOp::Dec,
                sub,
                ..
            } => out.extend(sub.referenced_declaration()),
            _ => {}
        }
        for child in e.children() {
            visit_expr(child, out);
        }
    }

    fn visit_stmt(s: &Stmt, out: &mut BTreeSet<NodeId>) {
        match &s.kind {
            StmtKind::Block(stmts) => stmts.iter().for_each(|s| visit_stmt(s, out)),
            StmtKind::VariableDeclaration {
                declarations,
                initial_value,
            } => {
                out.extend(declarations.iter().map(|d| d.id));
                if let Some(e) = initial_value {
                    visit_expr(e, out);
                }
            }
            StmtKind::Expression(e) => visit_expr(e, out),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                visit_expr(condition, out);
                visit_stmt(then_branch, out);
                if let Some(e) = else_branch {
                    visit_stmt(e, out);
                }
            }
            StmtKind::While {
                condition, body, ..
            } => {
                visit_expr(condition, out);
                visit_stmt(body, out);
            }
            StmtKind::For {
                init,
                condition,
                step,
                body,
            } => {
                if let Some(init) = init {
                    visit_stmt(init, out);
                }
                condition.iter().for_each(|c| visit_expr(c, out));
                step.iter().for_each(|s| visit_expr(s, out));
                visit_stmt(body, out);
            }
            StmtKind::Return(value) => value.iter().for_each(|v| visit_expr(v, out)),
        }
    }

    let mut out = BTreeSet::new();
    for stmt in stmts {
        visit_stmt(stmt, &mut out);
    }
    for e in exprs {
        visit_expr(e, &mut out);
    }
    out
}

struct BodyEncoder<'a> {
    encoder: &'a mut FunctionEncoder,
    returns: &'a [VariableDeclaration],
    /// Path condition of every `return` encoded so far.
    exits: Vec<Formula>,
}

impl<'a> BodyEncoder<'a> {
    fn new(encoder: &'a mut FunctionEncoder, returns: &'a [VariableDeclaration]) -> Self {
        Self {
            encoder,
            returns,
            exits: Vec::new(),
        }
    }

    fn statements(&mut self, stmts: &[Stmt]) -> Result<(), EncodeError> {
        let mut guards = Vec::new();
        for stmt in stmts {
            let exits = self.exits.len();
            self.statement(stmt)?;
            // The rest of the block runs only where no return was taken.
            let Some(taken) = self.exits[exits..].iter().cloned().reduce(Formula::or) else {
                continue;
            };
            let guard = Formula::not(taken);
            guards.push((guard.clone(), self.encoder.versions(), &stmt.location));
            self.encoder.push_condition(guard);
        }
        while let Some((guard, before, location)) = guards.pop() {
            self.encoder.pop_path_condition()?;
            let after = self.encoder.versions();
            self.merge_versions(&guard, &before, &after, &before, location)?;
        }
        Ok(())
    }

    fn statement(&mut self, stmt: &Stmt) -> Result<(), EncodeError> {
        match &stmt.kind {
            StmtKind::Block(stmts) => self.statements(stmts),
            StmtKind::VariableDeclaration {
                declarations,
                initial_value,
            } => self.declaration(stmt, declarations, initial_value.as_ref()),
            StmtKind::Expression(e) => self.expression(e),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.branch(stmt, condition, then_branch, else_branch.as_deref()),
            StmtKind::While {
                condition,
                body,
                do_while,
            } => self.while_loop(stmt, condition, body, *do_while),
            StmtKind::For {
                init,
                condition,
                step,
                body,
            } => {
                if let Some(init) = init {
                    self.statement(init)?;
                }
                self.for_loop(stmt, condition.as_ref(), step.as_ref(), body)
            }
            StmtKind::Return(value) => self.return_statement(stmt, value.as_ref()),
        }
    }

    fn declaration(
        &mut self,
        stmt: &Stmt,
        declarations: &[VariableDeclaration],
        initial_value: Option<&Expression>,
    ) -> Result<(), EncodeError> {
        if let Some(value) = initial_value {
            self.expression(value)?;
        }
        let [decl] = declarations else {
            self.encoder.warning(
                &stmt.location,
                "Gas estimator does not yet implement multi-variable declarations.",
            );
            for decl in declarations {
                if self.encoder.variable(decl.id).is_some() {
                    self.encoder.havoc(decl.id, &stmt.location)?;
                }
            }
            return Ok(());
        };
        let Some(sort) = self.encoder.variable_sort(decl.id) else {
            // Unsupported type, already reported at registration.
            return Ok(());
        };
        match initial_value {
            Some(value) => self.encoder.assign_expr(decl.id, value, &stmt.location),
            None => self
                .encoder
                .assignment(decl.id, zero(sort), &stmt.location),
        }
    }

    fn branch(
        &mut self,
        stmt: &Stmt,
        condition: &Expression,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Result<(), EncodeError> {
        self.expression(condition)?;
        let guard = self.encoder.expr(condition)?;
        let before = self.encoder.versions();

        self.encoder.push_path_condition(condition, true)?;
        self.statement(then_branch)?;
        self.encoder.pop_path_condition()?;
        let after_then = self.encoder.versions();

        if let Some(else_branch) = else_branch {
            self.encoder.push_path_condition(condition, false)?;
            // The else branch reads the values from before the if.
            for (decl, version) in &before {
                if after_then.get(decl) != Some(version) {
                    let old = self.term_at(*decl, *version);
                    if let Some(old) = old {
                        self.encoder.assignment(*decl, old, &stmt.location)?;
                    }
                }
            }
            self.statement(else_branch)?;
            self.encoder.pop_path_condition()?;
        }

        let after_else = self.encoder.versions();
        self.merge_versions(&guard, &before, &after_then, &after_else, &stmt.location)
    }

    /// Give every variable that differs between `then_versions` and
    /// `else_versions` (or from `before`) a version `ite(guard, then, else)`.
    fn merge_versions(
        &mut self,
        guard: &Formula,
        before: &BTreeMap<NodeId, u32>,
        then_versions: &BTreeMap<NodeId, u32>,
        else_versions: &BTreeMap<NodeId, u32>,
        location: &SourceLocation,
    ) -> Result<(), EncodeError> {
        for (decl, version) in before {
            let then_version = then_versions.get(decl).copied().unwrap_or(*version);
            let else_version = else_versions.get(decl).copied().unwrap_or(*version);
            if then_version == *version && else_version == *version {
                continue;
            }
            let else_version = if else_version != then_version {
                else_version
            } else {
                *version
            };
            let (Some(then_term), Some(else_term)) = (
                self.term_at(*decl, then_version),
                self.term_at(*decl, else_version),
            ) else {
                continue;
            };
            self.encoder
                .merge(*decl, guard.clone(), then_term, else_term, location)?;
        }
        Ok(())
    }

    fn term_at(&self, decl: NodeId, version: u32) -> Option<Formula> {
        self.encoder.variable(decl).map(|v| v.term(version))
    }

    fn havoc_all(&mut self, written: &BTreeSet<NodeId>, location: &SourceLocation) -> Result<(), EncodeError> {
        for decl in written {
            if self.encoder.variable(*decl).is_some() {
                self.encoder.havoc(*decl, location)?;
            }
        }
        Ok(())
    }

    fn loop_warning(&mut self, location: &SourceLocation) {
        self.encoder.warning(
            location,
            "Gas estimator does not unroll loops; variables written in the loop are treated as unknown.",
        );
    }

    fn while_loop(
        &mut self,
        stmt: &Stmt,
        condition: &Expression,
        body: &Stmt,
        do_while: bool,
    ) -> Result<(), EncodeError> {
        self.loop_warning(&stmt.location);
        let written = assigned_variables(&[body], &[condition]);
        self.havoc_all(&written, &stmt.location)?;

        if do_while {
            self.statement(body)?;
            self.expression(condition)?;
        } else {
            self.expression(condition)?;
            self.encoder.push_path_condition(condition, true)?;
            self.statement(body)?;
            self.encoder.pop_path_condition()?;
        }

        self.havoc_all(&written, &stmt.location)
    }

    fn for_loop(
        &mut self,
        stmt: &Stmt,
        condition: Option<&Expression>,
        step: Option<&Expression>,
        body: &Stmt,
    ) -> Result<(), EncodeError> {
        self.loop_warning(&stmt.location);
        // The init part runs once before the loop and is not reset.
        let header: Vec<&Expression> = condition.into_iter().chain(step).collect();
        let written = assigned_variables(&[body], &header);
        self.havoc_all(&written, &stmt.location)?;

        if let Some(condition) = condition {
            self.expression(condition)?;
            self.encoder.push_path_condition(condition, true)?;
        }
        self.statement(body)?;
        if let Some(step) = step {
            self.expression(step)?;
        }
        if condition.is_some() {
            self.encoder.pop_path_condition()?;
        }

        self.havoc_all(&written, &stmt.location)
    }

    fn return_statement(&mut self, stmt: &Stmt, value: Option<&Expression>) -> Result<(), EncodeError> {
        if let Some(value) = value {
            self.expression(value)?;
            let returns = self.returns;
            match returns {
                [slot] if self.encoder.variable(slot.id).is_some() => {
                    self.encoder.assign_expr(slot.id, value, &stmt.location)?;
                }
                [_] => {}
                _ => self.encoder.warning(
                    &stmt.location,
                    "Gas estimator does not yet implement returning multiple values.",
                ),
            }
        }
        self.exits.push(self.encoder.current_path_condition());
        Ok(())
    }

    // === Expressions ===

    fn expression(&mut self, e: &Expression) -> Result<(), EncodeError> {
        match &e.kind {
            ExprKind::Literal(value) => self.literal(e, value),
            ExprKind::Identifier {
                name,
                declaration,
                lvalue,
            } => {
                if *lvalue || matches!(e.ty, Type::Function(_)) {
                    return Ok(());
                }
                match declaration {
                    Some(decl) => self.encoder.define_expr_from_variable(e, *decl),
                    None => {
                        self.encoder.warning(
                            &e.location,
                            format!("Gas estimator does not yet support the identifier `{name}`."),
                        );
                        Ok(())
                    }
                }
            }
            ExprKind::Unary { sub, .. } => {
                self.expression(sub)?;
                self.encoder.unary_operation(e)
            }
            ExprKind::Binary { left, right, .. } => {
                self.expression(left)?;
                self.expression(right)?;
                self.encoder.binary_operation(e)
            }
            ExprKind::Assignment { lhs, rhs, .. } => {
                self.expression(rhs)?;
                self.expression(lhs)?;
                self.encoder.assignment_operation(e)
            }
            ExprKind::Tuple {
                components,
                inline_array,
            } => {
                for component in components {
                    self.expression(component)?;
                }
                match components.as_slice() {
                    [single] if !*inline_array => {
                        if FunctionEncoder::expression_sort(e).is_ok() {
                            self.encoder.define_expr_from(e, single)
                        } else {
                            Ok(())
                        }
                    }
                    _ => {
                        self.encoder.warning(
                            &e.location,
                            "Gas estimator does not yet implement tuples and inline arrays.",
                        );
                        Ok(())
                    }
                }
            }
            ExprKind::FunctionCall { callee, args } => self.call(e, callee, args),
            ExprKind::IndexAccess { .. } | ExprKind::MemberAccess { .. } => {
                let what = if matches!(e.kind, ExprKind::IndexAccess { .. }) {
                    "index access"
                } else {
                    "member access"
                };
                self.encoder.warning(
                    &e.location,
                    format!("Gas estimator does not yet implement {what}; its value is unknown."),
                );
                self.unconstrained(e)
            }
        }
    }

    /// Literals are dispatched on their static type; a number typed as an
    /// address or fixed-size bytes only warns.
    fn literal(&mut self, e: &Expression, value: &LiteralValue) -> Result<(), EncodeError> {
        match (&e.ty, value) {
            (Type::Bool, LiteralValue::Bool(b)) => self.encoder.define_expr(e, *b),
            (Type::Integer(_) | Type::RationalNumber(_), LiteralValue::Number(n)) => {
                if n.is_integer() {
                    self.encoder.define_expr(e, n.to_integer())
                } else {
                    // Rejected when the symbol is created.
                    self.encoder.create_expr(e)
                }
            }
            _ => {
                self.encoder.warning(
                    &e.location,
                    "Gas estimator does not yet support this literal type.",
                );
                Ok(())
            }
        }
    }

    fn call(&mut self, e: &Expression, callee: &Expression, args: &[Expression]) -> Result<(), EncodeError> {
        match callee.ty {
            Type::Function(FunctionKind::Require | FunctionKind::Assert) => {
                let Some(condition) = args.first() else {
                    self.encoder
                        .warning(&e.location, "Condition missing in call to require/assert.");
                    return Ok(());
                };
                self.expression(condition)?;
                self.encoder.assume(condition)
            }
            _ => {
                for arg in args {
                    self.expression(arg)?;
                }
                self.encoder.warning(
                    &e.location,
                    "Gas estimator does not yet implement function calls; the result is unknown.",
                );
                self.unconstrained(e)
            }
        }
    }

    /// Give `e` a symbol without constraining it, so later uses find it.
    fn unconstrained(&mut self, e: &Expression) -> Result<(), EncodeError> {
        if FunctionEncoder::expression_sort(e).is_ok() {
            self.encoder.create_expr(e)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AssignOp, AstBuilder, BinaryOp, IntegerType};
    use crate::diagnostics::Severity;

    fn int256() -> Type {
        Type::Integer(IntegerType::int256())
    }

    fn texts(encoder: &FunctionEncoder) -> Vec<String> {
        encoder
            .statements()
            .iter()
            .map(|s| s.contribution().to_string())
            .collect()
    }

    fn analyze(contract: &ContractDefinition) -> AnalysisReport {
        GasAnalyzer::default().analyze_contract(contract)
    }

    #[test]
    fn straight_line_assignment() {
        let mut b = AstBuilder::new();
        let x = b.variable("x", int256());
        let y = b.variable("y", int256());
        let lhs = b.identifier(&x);
        let one = b.number(1);
        let sum = b.binary(BinaryOp::Add, lhs.clone(), one.clone());
        let assign = b.assign(&y, sum.clone());
        let body = vec![b.expr_stmt(assign.clone())];
        let f = b.function("f", vec![x.clone()], vec![y.clone()], body);
        let c = b.contract("C", vec![], vec![f]);

        let report = analyze(&c);
        let encoder = report.function("C", "f").and_then(FunctionReport::encoder).unwrap();
        assert_eq!(encoder.variable_version(y.id), Some(1));
        assert_eq!(encoder.variable_version(x.id), Some(0));
        assert_eq!(
            texts(encoder),
            vec![
                format!(
                    "(and (>= x-{0}_0 (- {1})) (<= x-{0}_0 {2}))",
                    x.id,
                    -IntegerType::int256().min_value(),
                    IntegerType::int256().max_value()
                ),
                format!("(= y-{}_0 0)", y.id),
                format!("(= expr_{} x-{}_0)", lhs.id, x.id),
                format!("(= expr_{} 1)", one.id),
                format!("(= expr_{} (+ expr_{} expr_{}))", sum.id, lhs.id, one.id),
                format!("(= y-{}_1 expr_{})", y.id, sum.id),
                format!("(= expr_{} expr_{})", assign.id, sum.id),
            ]
        );
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn if_else_merges_with_ite() {
        let mut b = AstBuilder::new();
        let c = b.variable("c", Type::Bool);
        let z = b.variable("z", int256());
        let cond = b.identifier(&c);
        let one = b.number(1);
        let two = b.number(2);
        let then_assign = b.assign(&z, one);
        let else_assign = b.assign(&z, two);
        let then_stmt = b.expr_stmt(then_assign);
        let else_stmt = b.expr_stmt(else_assign);
        let body = vec![b.if_else(cond.clone(), then_stmt, Some(else_stmt))];
        let f = b.function("f", vec![c.clone()], vec![z.clone()], body);
        let contract = b.contract("C", vec![], vec![f]);

        let report = analyze(&contract);
        let encoder = report.functions[0].encoder().unwrap();
        let texts = texts(encoder);
        // then: z_1; else: copy z_2 = z_0, then z_3; merge z_4.
        assert_eq!(encoder.variable_version(z.id), Some(4));
        assert!(texts.contains(&format!(
            "(or (not (not expr_{0})) (= z-{1}_2 z-{1}_0))",
            cond.id, z.id
        )));
        assert_eq!(
            texts.last().unwrap(),
            &format!("(= z-{0}_4 (ite expr_{1} z-{0}_1 z-{0}_3))", z.id, cond.id)
        );
    }

    #[test]
    fn if_without_else_keeps_old_value() {
        let mut b = AstBuilder::new();
        let c = b.variable("c", Type::Bool);
        let z = b.variable("z", int256());
        let cond = b.identifier(&c);
        let one = b.number(1);
        let assign = b.assign(&z, one);
        let then_stmt = b.expr_stmt(assign);
        let body = vec![b.if_else(cond.clone(), then_stmt, None)];
        let f = b.function("f", vec![c], vec![z.clone()], body);
        let contract = b.contract("C", vec![], vec![f]);

        let report = analyze(&contract);
        let encoder = report.functions[0].encoder().unwrap();
        assert_eq!(encoder.variable_version(z.id), Some(2));
        assert_eq!(
            texts(encoder).last().unwrap(),
            &format!("(= z-{0}_2 (ite expr_{1} z-{0}_1 z-{0}_0))", z.id, cond.id)
        );
    }

    #[test]
    fn loops_havoc_and_warn() {
        let mut b = AstBuilder::new();
        let i = b.variable("i", Type::Integer(IntegerType::uint(8)));
        let cond_lhs = b.identifier(&i);
        let ten = b.number(10);
        let cond = b.binary(BinaryOp::Lt, cond_lhs, ten);
        let target = b.lvalue(&i);
        let inc = b.unary(UnaryOp::Inc, true, target);
        let body = b.expr_stmt(inc);
        let stmts = vec![b.while_loop(cond, body)];
        let f = b.function("f", vec![], vec![i.clone()], stmts);
        let contract = b.contract("C", vec![], vec![f]);

        let report = analyze(&contract);
        let encoder = report.functions[0].encoder().unwrap();
        // havoc, increment, havoc
        assert_eq!(encoder.variable_version(i.id), Some(3));
        assert_eq!(
            texts(encoder).last().unwrap(),
            &format!("(and (>= i-{0}_3 0) (<= i-{0}_3 255))", i.id)
        );
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn require_assumes_condition() {
        let mut b = AstBuilder::new();
        let x = b.variable("x", int256());
        let lhs = b.identifier(&x);
        let zero = b.number(0);
        let positive = b.binary(BinaryOp::Gt, lhs, zero);
        let call = b.require(positive.clone());
        let body = vec![b.expr_stmt(call)];
        let f = b.function("f", vec![x], vec![], body);
        let contract = b.contract("C", vec![], vec![f]);

        let report = analyze(&contract);
        let encoder = report.functions[0].encoder().unwrap();
        assert_eq!(texts(encoder).last().unwrap(), &format!("expr_{}", positive.id));
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn return_assigns_single_slot() {
        let mut b = AstBuilder::new();
        let r = b.variable("r", Type::Bool);
        let t = b.bool_literal(true);
        let body = vec![b.ret(Some(t.clone()))];
        let f = b.function("f", vec![], vec![r.clone()], body);
        let contract = b.contract("C", vec![], vec![f]);

        let report = analyze(&contract);
        let encoder = report.functions[0].encoder().unwrap();
        assert_eq!(encoder.variable_version(r.id), Some(1));
        assert_eq!(
            texts(encoder).last().unwrap(),
            &format!("(= r-{}_1 expr_{})", r.id, t.id)
        );
    }

    #[test]
    fn early_return_gates_the_rest_of_the_body() {
        // if (c) { return 1; } return 2;
        let mut b = AstBuilder::new();
        let c = b.variable("c", Type::Bool);
        let r = b.variable("r", int256());
        let cond = b.identifier(&c);
        let one = b.number(1);
        let two = b.number(2);
        let early = b.ret(Some(one));
        let body = vec![b.if_else(cond.clone(), early, None), b.ret(Some(two.clone()))];
        let f = b.function("f", vec![c], vec![r.clone()], body);
        let contract = b.contract("C", vec![], vec![f]);

        let report = analyze(&contract);
        let encoder = report.functions[0].encoder().unwrap();
        let texts = texts(encoder);
        assert!(texts.contains(&format!(
            "(= r-{0}_2 (ite expr_{1} r-{0}_1 r-{0}_0))",
            r.id, cond.id
        )));
        assert!(texts.contains(&format!(
            "(or (not (not expr_{})) (= r-{}_3 expr_{}))",
            cond.id, r.id, two.id
        )));
        assert_eq!(encoder.variable_version(r.id), Some(4));
        assert_eq!(
            texts.last().unwrap(),
            &format!("(= r-{0}_4 (ite (not expr_{1}) r-{0}_3 r-{0}_2))", r.id, cond.id)
        );
        assert_eq!(encoder.path_depth(), 0);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn statements_after_top_level_return_are_dead() {
        let mut b = AstBuilder::new();
        let r = b.variable("r", int256());
        let one = b.number(1);
        let two = b.number(2);
        let assign = b.assign(&r, two.clone());
        let body = vec![b.ret(Some(one)), b.expr_stmt(assign)];
        let f = b.function("f", vec![], vec![r.clone()], body);
        let contract = b.contract("C", vec![], vec![f]);

        let report = analyze(&contract);
        let encoder = report.functions[0].encoder().unwrap();
        assert!(texts(encoder).contains(&format!(
            "(or (not (not true)) (= r-{}_2 expr_{}))",
            r.id, two.id
        )));
        assert_eq!(
            texts(encoder).last().unwrap(),
            &format!("(= r-{0}_3 (ite (not true) r-{0}_2 r-{0}_1))", r.id)
        );
    }

    #[test]
    fn for_init_survives_the_loop() {
        // for (uint n = 5; i < n; i++) {}
        let mut b = AstBuilder::new();
        let i = b.variable("i", Type::Integer(IntegerType::uint(8)));
        let n = b.variable("n", Type::Integer(IntegerType::uint256()));
        let five = b.number(5);
        let init = b.declare(n.clone(), Some(five));
        let lhs = b.identifier(&i);
        let rhs = b.identifier(&n);
        let cond = b.binary(BinaryOp::Lt, lhs, rhs);
        let target = b.lvalue(&i);
        let step = b.unary(UnaryOp::Inc, true, target);
        let empty = b.block(vec![]);
        let body = vec![b.for_loop(Some(init), Some(cond), Some(step), empty)];
        let f = b.function("f", vec![i.clone()], vec![], body);
        let contract = b.contract("C", vec![], vec![f]);

        let report = analyze(&contract);
        let encoder = report.functions[0].encoder().unwrap();
        assert_eq!(encoder.variable_version(n.id), Some(1));
        // havoc, increment, havoc
        assert_eq!(encoder.variable_version(i.id), Some(3));
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn parenthesized_literal_is_defined() {
        // y = (5);
        let mut b = AstBuilder::new();
        let y = b.variable("y", int256());
        let five = b.number(5);
        let paren = b.tuple(vec![five.clone()]);
        let assign = b.assign(&y, paren.clone());
        let body = vec![b.expr_stmt(assign)];
        let f = b.function("f", vec![], vec![y.clone()], body);
        let contract = b.contract("C", vec![], vec![f]);

        let report = analyze(&contract);
        let encoder = report.functions[0].encoder().unwrap();
        let texts = texts(encoder);
        assert!(texts.contains(&format!("(= expr_{} expr_{})", paren.id, five.id)));
        assert!(texts.contains(&format!("(= y-{}_1 expr_{})", y.id, paren.id)));
        assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    }

    #[test]
    fn non_numeric_typed_number_literal_warns() {
        let mut b = AstBuilder::new();
        let address = b.number(0x1234);
        let address = Expression {
            ty: Type::Address,
            ..address
        };
        let bytes = b.number(0xff);
        let bytes = Expression {
            ty: Type::FixedBytes(1),
            ..bytes
        };
        let body = vec![b.expr_stmt(address.clone()), b.expr_stmt(bytes.clone())];
        let f = b.function("f", vec![], vec![], body);
        let contract = b.contract("C", vec![], vec![f]);

        let report = analyze(&contract);
        let encoder = report.functions[0].encoder().unwrap();
        assert!(!encoder.has_expr(&address));
        assert!(!encoder.has_expr(&bytes));
        assert_eq!(report.warnings().count(), 2);
        assert!(report
            .warnings()
            .all(|d| d.message == "Gas estimator does not yet support this literal type."));
    }

    #[test]
    fn declarations_become_assignments() {
        let mut b = AstBuilder::new();
        let a = b.variable("a", int256());
        let z = b.variable("z", Type::Bool);
        let five = b.number(5);
        let body = vec![b.declare(a.clone(), Some(five.clone())), b.declare(z.clone(), None)];
        let f = b.function("f", vec![], vec![], body);
        let contract = b.contract("C", vec![], vec![f]);

        let report = analyze(&contract);
        let encoder = report.functions[0].encoder().unwrap();
        let texts = texts(encoder);
        assert!(texts.contains(&format!("(= a-{}_1 expr_{})", a.id, five.id)));
        assert!(texts.contains(&format!("(= z-{}_1 false)", z.id)));
    }

    #[test]
    fn constructor_and_modifiers_warn_but_encode() {
        let mut b = AstBuilder::new();
        let mut ctor = b.function("constructor", vec![], vec![], vec![]);
        ctor.is_constructor = true;
        let mut guarded = b.function("g", vec![], vec![], vec![]);
        guarded.modifiers = vec!["onlyOwner".to_string()];
        let contract = b.contract("C", vec![], vec![ctor, guarded]);

        let report = analyze(&contract);
        assert_eq!(report.encoded().count(), 2);
        assert_eq!(report.warnings().count(), 2);
    }

    #[test]
    fn fatal_error_is_isolated() {
        let mut b = AstBuilder::new();
        let x = b.variable("x", int256());
        let one = b.number(1);
        let shift = b.compound_assign(AssignOp::Shl, &x, one);
        let bad_body = vec![b.expr_stmt(shift)];
        let bad = b.function("bad", vec![x.clone()], vec![], bad_body);
        let good = b.function("good", vec![], vec![], vec![]);
        let contract = b.contract("C", vec![], vec![bad, good]);

        let report = analyze(&contract);
        assert_eq!(report.failed().count(), 1);
        assert!(matches!(
            report.function("C", "bad").and_then(FunctionReport::error),
            Some(EncodeError::Unsupported { .. })
        ));
        assert!(report.function("C", "good").unwrap().is_encoded());
        assert!(report.diagnostics.has_errors());
        let errors: Vec<_> = report
            .diagnostics
            .diagnostics()
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.starts_with("Encoding of C.bad abandoned"));
    }

    #[test]
    fn duplicate_parameter_is_fatal() {
        let mut b = AstBuilder::new();
        let x = b.variable("x", int256());
        let f = b.function("f", vec![x.clone(), x.clone()], vec![], vec![]);
        let contract = b.contract("C", vec![], vec![f]);

        let report = analyze(&contract);
        assert!(matches!(
            report.functions[0].error(),
            Some(EncodeError::DuplicateDeclaration { .. })
        ));
    }

    #[test]
    fn unsupported_nodes_only_warn() {
        let mut b = AstBuilder::new();
        let owner = b.variable("owner", Type::Address);
        let balances = b.variable(
            "balances",
            Type::Mapping(Box::new(Type::Address), Box::new(int256())),
        );
        let base = b.identifier(&balances);
        let key = b.identifier(&owner);
        let lookup = b.index(base, key, int256());
        let text = b.string_literal("hello");
        let body = vec![b.expr_stmt(lookup.clone()), b.expr_stmt(text)];
        let f = b.function("f", vec![], vec![], body);
        let contract = b.contract("C", vec![owner, balances], vec![f]);

        let report = analyze(&contract);
        let encoder = report.functions[0].encoder().unwrap();
        assert!(encoder.has_expr(&lookup));
        // owner (unsupported type), index access, string literal
        assert_eq!(report.warnings().count(), 3);
    }
}
