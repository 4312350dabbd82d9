//! Per-function SSA encoder.
//!
//! A [`FunctionEncoder`] turns the body of one function into a list of
//! [`Statement`]s, each of the form `pathCondition => constraint`. Their
//! conjunction is the function's formula.
//!
//! The encoder keeps four maps from declaration to [`SymbolicVariable`]
//! (state variables, parameters, locals, return slots), one map from
//! expression node to the leaf naming its value, and a stack of path
//! conditions. The caller walks the tree in post-order and calls into the
//! encoder node by node; sub-expressions must be encoded before the
//! expressions that use them.
//!
//! Problems with a single node are reported to the encoder's
//! [`ErrorReporter`] and encoding continues. Problems that make the whole
//! function's formula untrustworthy are returned as [`EncodeError`].

use std::collections::{BTreeMap, HashMap};

use smtgas_smtlib::{Formula, Script, Sort};
use smtgas_solver::SolverBackend;

use crate::ast::{
    BinaryOp, ContractDefinition, ExprKind, Expression, FunctionDefinition, IntegerType, NodeId,
    SourceLocation, Type, UnaryOp, VariableDeclaration,
};
use crate::config::EncoderConfig;
use crate::diagnostics::ErrorReporter;
use crate::error::EncodeError;
use crate::symbolic_variable::{SymbolicVariable, variable_sort};

/// Lifecycle of a [`FunctionEncoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Initializing,
    Encoding,
    Finalized,
}

/// Which of the four variable maps a declaration lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    StateVariable,
    Parameter,
    Local,
    Return,
}

/// One conjunct of the function formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub condition: Formula,
    pub expression: Formula,
    pub location: SourceLocation,
}

impl Statement {
    /// `condition => expression`, or just `expression` under `true`.
    pub fn contribution(&self) -> Formula {
        if self.condition.is_true() {
            self.expression.clone()
        } else {
            Formula::implies(self.condition.clone(), self.expression.clone())
        }
    }
}

/// Truncating signed division over the solver's native `div`.
///
/// `div` rounds towards negative infinity for negative dividends, so for
/// signed types both operands are made non-negative first and the sign is
/// restored afterwards. Unsigned operands are never negative and use `div`
/// directly.
pub fn division(left: Formula, right: Formula, ty: &IntegerType) -> Formula {
    if !ty.signed {
        return Formula::div(left, right);
    }
    let zero = || Formula::int(0);
    Formula::ite(
        Formula::ge(left.clone(), zero()),
        Formula::ite(
            Formula::ge(right.clone(), zero()),
            Formula::div(left.clone(), right.clone()),
            Formula::neg(Formula::div(left.clone(), Formula::neg(right.clone()))),
        ),
        Formula::ite(
            Formula::ge(right.clone(), zero()),
            Formula::neg(Formula::div(Formula::neg(left.clone()), right.clone())),
            Formula::div(Formula::neg(left), Formula::neg(right)),
        ),
    )
}

fn expression_symbol(e: &Expression) -> String {
    format!("expr_{}", e.id)
}

#[derive(Debug)]
pub struct FunctionEncoder {
    contract: String,
    function: String,
    config: EncoderConfig,
    phase: Phase,
    state_variables: BTreeMap<NodeId, SymbolicVariable>,
    parameters: BTreeMap<NodeId, SymbolicVariable>,
    locals: BTreeMap<NodeId, SymbolicVariable>,
    returns: BTreeMap<NodeId, SymbolicVariable>,
    expressions: HashMap<NodeId, Formula>,
    path_conditions: Vec<Formula>,
    statements: Vec<Statement>,
    reporter: ErrorReporter,
}

impl FunctionEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self {
            contract: String::new(),
            function: String::new(),
            config,
            phase: Phase::Created,
            state_variables: BTreeMap::new(),
            parameters: BTreeMap::new(),
            locals: BTreeMap::new(),
            returns: BTreeMap::new(),
            expressions: HashMap::new(),
            path_conditions: Vec::new(),
            statements: Vec::new(),
            reporter: ErrorReporter::new(),
        }
    }

    /// Create and initialize an encoder for `function` in one step.
    pub fn for_function(
        contract: &ContractDefinition,
        function: &FunctionDefinition,
        config: EncoderConfig,
    ) -> Result<Self, EncodeError> {
        let mut encoder = Self::new(config);
        encoder.initialize(contract, function)?;
        Ok(encoder)
    }

    /// Register every eligible declaration and emit its initializer.
    ///
    /// State variables (value types only) and parameters start anywhere in
    /// their type's range; locals and return slots start at zero.
    pub fn initialize(
        &mut self,
        contract: &ContractDefinition,
        function: &FunctionDefinition,
    ) -> Result<(), EncodeError> {
        self.begin_registration(&contract.name, &function.name)?;

        for var in contract
            .state_variables
            .iter()
            .filter(|v| v.ty.is_value_type())
        {
            self.register_variable(Partition::StateVariable, var)?;
        }
        for param in &function.parameters {
            self.register_variable(Partition::Parameter, param)?;
        }
        for local in function.local_variables() {
            self.register_variable(Partition::Local, local)?;
        }
        for ret in &function.returns {
            self.register_variable(Partition::Return, ret)?;
        }

        self.begin_encoding()
    }

    /// `Created -> Initializing`. Only a fresh encoder accepts variables.
    pub fn begin_registration(&mut self, contract: &str, function: &str) -> Result<(), EncodeError> {
        self.expect_phase(Phase::Created, "start registration")?;
        self.contract = contract.to_string();
        self.function = function.to_string();
        self.phase = Phase::Initializing;
        tracing::info!(contract = %self.contract, function = %self.function, "Encoding function");
        Ok(())
    }

    /// `Initializing -> Encoding`. No variable can be registered afterwards.
    pub fn begin_encoding(&mut self) -> Result<(), EncodeError> {
        self.expect_phase(Phase::Initializing, "start encoding")?;
        self.phase = Phase::Encoding;
        Ok(())
    }

    fn expect_phase(&self, expected: Phase, operation: &'static str) -> Result<(), EncodeError> {
        match self.phase {
            phase if phase == expected => Ok(()),
            Phase::Finalized => Err(EncodeError::Finalized),
            phase => Err(EncodeError::WrongPhase { operation, phase }),
        }
    }

    /// Add `decl` to `partition` and emit its initializer.
    ///
    /// Unsupported types are skipped with a warning. Registering a
    /// declaration that is already known, in any partition, is fatal.
    pub fn register_variable(
        &mut self,
        partition: Partition,
        decl: &VariableDeclaration,
    ) -> Result<(), EncodeError> {
        self.expect_phase(Phase::Initializing, "register a variable")?;
        let var = match SymbolicVariable::new(decl) {
            Ok(var) => var,
            Err(e) => {
                self.reporter.warning(
                    &decl.location,
                    format!("Gas estimator does not yet support the type of this variable ({})", e.0),
                );
                return Ok(());
            }
        };
        if self.variable(decl.id).is_some() {
            return Err(EncodeError::DuplicateDeclaration {
                name: decl.name.clone(),
                id: decl.id,
                location: decl.location.clone(),
            });
        }

        let initializer = match partition {
            Partition::StateVariable | Partition::Parameter => var.assert_unknown(),
            Partition::Local | Partition::Return => var.assert_zero(),
        };
        tracing::debug!(variable = %decl.name, id = %decl.id, ?partition, sort = %var.sort(), "Registered variable");
        self.partition_mut(partition).insert(decl.id, var);
        self.add_statement(initializer, &decl.location);
        Ok(())
    }

    // === Accessors ===

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn contract_name(&self) -> &str {
        &self.contract
    }

    pub fn function_name(&self) -> &str {
        &self.function
    }

    pub fn diagnostics(&self) -> &ErrorReporter {
        &self.reporter
    }

    /// Hand the collected diagnostics to the caller, leaving an empty sink.
    pub fn take_diagnostics(&mut self) -> ErrorReporter {
        std::mem::take(&mut self.reporter)
    }

    pub fn warning(&mut self, location: &SourceLocation, message: impl Into<String>) {
        self.reporter.warning(location, message);
    }

    fn partition_mut(&mut self, partition: Partition) -> &mut BTreeMap<NodeId, SymbolicVariable> {
        match partition {
            Partition::StateVariable => &mut self.state_variables,
            Partition::Parameter => &mut self.parameters,
            Partition::Local => &mut self.locals,
            Partition::Return => &mut self.returns,
        }
    }

    fn partitions(&self) -> [(Partition, &BTreeMap<NodeId, SymbolicVariable>); 4] {
        [
            (Partition::StateVariable, &self.state_variables),
            (Partition::Parameter, &self.parameters),
            (Partition::Local, &self.locals),
            (Partition::Return, &self.returns),
        ]
    }

    pub fn variable(&self, decl: NodeId) -> Option<&SymbolicVariable> {
        self.partitions()
            .into_iter()
            .find_map(|(_, map)| map.get(&decl))
    }

    fn variable_mut(&mut self, decl: NodeId) -> Option<&mut SymbolicVariable> {
        [
            &mut self.state_variables,
            &mut self.parameters,
            &mut self.locals,
            &mut self.returns,
        ]
        .into_iter()
        .find_map(|map| map.get_mut(&decl))
    }

    pub fn partition_of(&self, decl: NodeId) -> Option<Partition> {
        self.partitions()
            .into_iter()
            .find(|(_, map)| map.contains_key(&decl))
            .map(|(partition, _)| partition)
    }

    /// Every registered variable, partition by partition.
    pub fn variables(&self) -> impl Iterator<Item = &SymbolicVariable> {
        self.state_variables
            .values()
            .chain(self.parameters.values())
            .chain(self.locals.values())
            .chain(self.returns.values())
    }

    pub fn variable_version(&self, decl: NodeId) -> Option<u32> {
        self.variable(decl).map(SymbolicVariable::version)
    }

    pub fn current_term(&self, decl: NodeId) -> Option<Formula> {
        self.variable(decl).map(SymbolicVariable::current)
    }

    pub fn variable_sort(&self, decl: NodeId) -> Option<Sort> {
        self.variable(decl).map(SymbolicVariable::sort)
    }

    /// Current version of every registered variable.
    pub fn versions(&self) -> BTreeMap<NodeId, u32> {
        self.variables()
            .map(|v| (v.declaration(), v.version()))
            .collect()
    }

    // === Expressions ===

    fn ensure_encoding(&self) -> Result<(), EncodeError> {
        self.expect_phase(Phase::Encoding, "encode")
    }

    /// Sort of the leaf `create_expr` would allocate for `e`.
    pub fn expression_sort(e: &Expression) -> Result<Sort, EncodeError> {
        match &e.ty {
            Type::RationalNumber(r) if r.is_fractional() => Err(EncodeError::FractionalLiteral {
                literal: r.to_string(),
                location: e.location.clone(),
            }),
            Type::RationalNumber(_) | Type::Integer(_) => Ok(Sort::Int),
            Type::Bool => Ok(Sort::Bool),
            other => Err(EncodeError::UnimplementedType {
                ty: other.clone(),
                location: e.location.clone(),
            }),
        }
    }

    fn insert_leaf(&mut self, e: &Expression) -> Result<Formula, EncodeError> {
        let sort = Self::expression_sort(e)?;
        let leaf = Formula::declared(expression_symbol(e), sort);
        tracing::trace!(id = %e.id, %sort, "Created expression symbol");
        self.expressions.insert(e.id, leaf.clone());
        Ok(leaf)
    }

    /// Allocate the leaf naming `e`'s value. A second call for the same
    /// node only warns.
    pub fn create_expr(&mut self, e: &Expression) -> Result<(), EncodeError> {
        self.ensure_encoding()?;
        if self.expressions.contains_key(&e.id) {
            self.reporter.warning(
                &e.location,
                "Internal error: Expression created twice in SMT solver.",
            );
            return Ok(());
        }
        self.insert_leaf(e).map(|_| ())
    }

    /// The leaf of an already-created expression.
    ///
    /// An expression that was never created gets an unconstrained leaf and
    /// a warning, or an [`EncodeError::UndefinedExpression`] under
    /// `strict_expression_lookup`.
    pub fn expr(&mut self, e: &Expression) -> Result<Formula, EncodeError> {
        if let Some(leaf) = self.expressions.get(&e.id) {
            return Ok(leaf.clone());
        }
        if self.config.strict_expression_lookup {
            return Err(EncodeError::UndefinedExpression {
                id: e.id,
                location: e.location.clone(),
            });
        }
        self.reporter.warning(
            &e.location,
            "Gas estimator internal error: Expression undefined for SMT solver.",
        );
        self.ensure_encoding()?;
        self.insert_leaf(e)
    }

    pub fn has_expr(&self, e: &Expression) -> bool {
        self.expressions.contains_key(&e.id)
    }

    /// Emit `pathCondition => leaf(e) = value`, creating the leaf if needed.
    pub fn define_expr(&mut self, e: &Expression, value: impl Into<Formula>) -> Result<(), EncodeError> {
        self.ensure_encoding()?;
        let leaf = match self.expressions.get(&e.id) {
            Some(leaf) => leaf.clone(),
            None => self.insert_leaf(e)?,
        };
        self.add_statement(Formula::eq(leaf, value.into()), &e.location);
        Ok(())
    }

    /// Define `e` as equal to the already-encoded `value`.
    pub fn define_expr_from(&mut self, e: &Expression, value: &Expression) -> Result<(), EncodeError> {
        let value = self.expr(value)?;
        self.define_expr(e, value)
    }

    /// Define `e` as the current version of variable `decl`.
    pub fn define_expr_from_variable(&mut self, e: &Expression, decl: NodeId) -> Result<(), EncodeError> {
        match self.current_term(decl) {
            Some(term) => self.define_expr(e, term),
            None => {
                let name = match &e.kind {
                    ExprKind::Identifier { name, .. } => name.clone(),
                    _ => format!("declaration {decl}"),
                };
                self.reporter
                    .warning(&e.location, format!("Unknown variable: {name}"));
                Ok(())
            }
        }
    }

    // === Assignments ===

    /// Advance `decl` and emit `pathCondition => newVersion = value`.
    /// Unknown declarations only warn.
    pub fn assignment(
        &mut self,
        decl: NodeId,
        value: Formula,
        location: &SourceLocation,
    ) -> Result<(), EncodeError> {
        self.ensure_encoding()?;
        let Some(var) = self.variable_mut(decl) else {
            self.reporter
                .warning(location, format!("Unknown variable: declaration {decl}"));
            return Ok(());
        };
        var.advance();
        let term = var.current();
        tracing::debug!(variable = %var.name(), version = var.version(), "Assignment");
        self.add_statement(Formula::eq(term, value), location);
        Ok(())
    }

    /// Assign the value of the already-encoded expression `value`.
    pub fn assign_expr(
        &mut self,
        decl: NodeId,
        value: &Expression,
        location: &SourceLocation,
    ) -> Result<(), EncodeError> {
        let value = self.expr(value)?;
        self.assignment(decl, value, location)
    }

    /// Encode an assignment expression: `x = e` or `x op= e` for
    /// `+ - * /`. The assignment expression itself evaluates to the
    /// assigned value.
    pub fn assignment_operation(&mut self, e: &Expression) -> Result<(), EncodeError> {
        let ExprKind::Assignment { op, lhs, rhs } = &e.kind else {
            return Err(EncodeError::unsupported(&e.location, "Not an assignment"));
        };
        let ExprKind::Identifier {
            declaration: Some(decl),
            ..
        } = &lhs.kind
        else {
            return Err(EncodeError::unsupported(
                &e.location,
                "Gas estimator does not yet implement such assignments.",
            ));
        };
        if variable_sort(&lhs.ty).is_err() {
            self.reporter.warning(
                &e.location,
                format!("Gas estimator does not yet support assignments to {}", lhs.ty),
            );
            return Ok(());
        }

        let rhs_value = self.expr(rhs)?;
        let value = match op.binary_op() {
            None => rhs_value,
            Some(bin @ (BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div)) => {
                let Type::Integer(int) = &lhs.ty else {
                    return Err(EncodeError::UnimplementedType {
                        ty: lhs.ty.clone(),
                        location: e.location.clone(),
                    });
                };
                let Some(current) = self.current_term(*decl) else {
                    self.reporter
                        .warning(&e.location, format!("Unknown variable: declaration {decl}"));
                    return Ok(());
                };
                self.arithmetic(bin, current, rhs_value, int, &e.location)
            }
            Some(_) => {
                return Err(EncodeError::unsupported(
                    &e.location,
                    format!("Gas estimator does not yet implement compound assignment `{op}`."),
                ));
            }
        };

        self.assignment(*decl, value.clone(), &e.location)?;
        self.define_expr(e, value)
    }

    /// Advance `decl` to a fresh version constrained only by its type.
    pub fn havoc(&mut self, decl: NodeId, location: &SourceLocation) -> Result<(), EncodeError> {
        self.ensure_encoding()?;
        let Some(var) = self.variable_mut(decl) else {
            self.reporter
                .warning(location, format!("Unknown variable: declaration {decl}"));
            return Ok(());
        };
        var.advance();
        let range = var.assert_unknown();
        tracing::debug!(variable = %var.name(), version = var.version(), "Havoc");
        self.add_statement(range, location);
        Ok(())
    }

    /// Join two control-flow branches: the next version of `decl` is
    /// `ite(condition, then_term, else_term)`.
    pub fn merge(
        &mut self,
        decl: NodeId,
        condition: Formula,
        then_term: Formula,
        else_term: Formula,
        location: &SourceLocation,
    ) -> Result<(), EncodeError> {
        self.assignment(decl, Formula::ite(condition, then_term, else_term), location)
    }

    /// Constrain the Bool expression `e` to hold on the current path.
    pub fn assume(&mut self, e: &Expression) -> Result<(), EncodeError> {
        self.ensure_encoding()?;
        if e.ty != Type::Bool {
            self.reporter.warning(
                &e.location,
                format!("Cannot assume a condition of type {}", e.ty),
            );
            return Ok(());
        }
        let condition = self.expr(e)?;
        self.add_statement(condition, &e.location);
        Ok(())
    }

    // === Operators ===

    pub fn unary_operation(&mut self, e: &Expression) -> Result<(), EncodeError> {
        let ExprKind::Unary { op, prefix, sub } = &e.kind else {
            return Err(EncodeError::unsupported(&e.location, "Not a unary operation"));
        };
        match op {
            UnaryOp::Not => {
                if e.ty != Type::Bool {
                    return Err(EncodeError::UnimplementedType {
                        ty: e.ty.clone(),
                        location: e.location.clone(),
                    });
                }
                let value = self.expr(sub)?;
                self.define_expr(e, Formula::not(value))
            }
            UnaryOp::Inc | UnaryOp::Dec => {
                if !matches!(e.ty, Type::Integer(_)) {
                    return Err(EncodeError::UnimplementedType {
                        ty: e.ty.clone(),
                        location: e.location.clone(),
                    });
                }
                let ExprKind::Identifier { declaration, .. } = &sub.kind else {
                    self.reporter.warning(
                        &e.location,
                        "Gas estimator does not yet implement such increments / decrements.",
                    );
                    return Ok(());
                };
                let Some((decl, inner)) =
                    declaration.and_then(|d| self.current_term(d).map(|term| (d, term)))
                else {
                    self.reporter.warning(
                        &e.location,
                        "Gas estimator does not yet implement such assignments.",
                    );
                    return Ok(());
                };
                let new_value = if *op == UnaryOp::Inc {
                    Formula::add(inner.clone(), Formula::int(1))
                } else {
                    Formula::sub(inner.clone(), Formula::int(1))
                };
                self.assignment(decl, new_value.clone(), &e.location)?;
                self.define_expr(e, if *prefix { new_value } else { inner })
            }
            UnaryOp::Plus => self.define_expr_from(e, sub),
            UnaryOp::Minus => {
                let value = self.expr(sub)?;
                self.define_expr(e, Formula::neg(value))
            }
            UnaryOp::BitNot | UnaryOp::Delete => {
                self.reporter.warning(
                    &e.location,
                    format!("Gas estimator does not yet implement the operator {op}."),
                );
                Ok(())
            }
        }
    }

    pub fn binary_operation(&mut self, e: &Expression) -> Result<(), EncodeError> {
        let ExprKind::Binary {
            op,
            left,
            right,
            common_type,
        } = &e.kind
        else {
            return Err(EncodeError::unsupported(&e.location, "Not a binary operation"));
        };
        if op.is_arithmetic() {
            self.arithmetic_operation(e, *op, left, right, common_type)
        } else if op.is_compare() {
            self.compare_operation(e, *op, left, right, common_type)
        } else if op.is_boolean() {
            self.boolean_operation(e, *op, left, right, common_type)
        } else {
            self.reporter.warning(
                &e.location,
                format!("Gas estimator does not yet implement the operator {op}."),
            );
            Ok(())
        }
    }

    // `op` is one of `+ - * /`.
    fn arithmetic(
        &mut self,
        op: BinaryOp,
        left: Formula,
        right: Formula,
        ty: &IntegerType,
        location: &SourceLocation,
    ) -> Formula {
        match op {
            BinaryOp::Add => Formula::add(left, right),
            BinaryOp::Sub => Formula::sub(left, right),
            BinaryOp::Mul => Formula::mul(left, right),
            _ => {
                if self.config.guard_division_by_zero {
                    self.add_statement(Formula::ne(right.clone(), Formula::int(0)), location);
                }
                division(left, right, ty)
            }
        }
    }

    fn arithmetic_operation(
        &mut self,
        e: &Expression,
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
        common_type: &Type,
    ) -> Result<(), EncodeError> {
        if !matches!(op, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div) {
            self.reporter.warning(
                &e.location,
                format!("Gas estimator does not yet implement the operator {op}."),
            );
            return Ok(());
        }
        let Type::Integer(int) = common_type else {
            return Err(EncodeError::UnimplementedType {
                ty: common_type.clone(),
                location: e.location.clone(),
            });
        };
        let l = self.expr(left)?;
        let r = self.expr(right)?;
        let value = self.arithmetic(op, l, r, int, &e.location);
        self.define_expr(e, value)
    }

    fn compare_operation(
        &mut self,
        e: &Expression,
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
        common_type: &Type,
    ) -> Result<(), EncodeError> {
        let Ok(sort) = variable_sort(common_type) else {
            self.reporter.warning(
                &e.location,
                format!("Gas estimator does not yet implement the type {common_type} for comparisons"),
            );
            return Ok(());
        };
        if sort == Sort::Bool && !matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
            return Err(EncodeError::unsupported(
                &e.location,
                format!("Operator {op} is not supported for bool operands"),
            ));
        }
        let l = self.expr(left)?;
        let r = self.expr(right)?;
        let value = match op {
            BinaryOp::Eq => Formula::eq(l, r),
            BinaryOp::Ne => Formula::ne(l, r),
            BinaryOp::Lt => Formula::lt(l, r),
            BinaryOp::Le => Formula::le(l, r),
            BinaryOp::Gt => Formula::gt(l, r),
            _ => Formula::ge(l, r),
        };
        self.define_expr(e, value)
    }

    fn boolean_operation(
        &mut self,
        e: &Expression,
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
        common_type: &Type,
    ) -> Result<(), EncodeError> {
        if *common_type != Type::Bool {
            self.reporter.warning(
                &e.location,
                format!("Gas estimator does not yet implement the type {common_type} for boolean operations"),
            );
            return Ok(());
        }
        let l = self.expr(left)?;
        let r = self.expr(right)?;
        let value = if op == BinaryOp::And {
            Formula::and(l, r)
        } else {
            Formula::or(l, r)
        };
        self.define_expr(e, value)
    }

    // === Path conditions ===

    /// Conjunction of the enclosing branch guards; `true` at top level.
    pub fn current_path_condition(&self) -> Formula {
        self.path_conditions
            .last()
            .cloned()
            .unwrap_or_else(|| Formula::bool(true))
    }

    pub fn path_depth(&self) -> usize {
        self.path_conditions.len()
    }

    /// Enter the branch where `e` is `sign`.
    pub fn push_path_condition(&mut self, e: &Expression, sign: bool) -> Result<(), EncodeError> {
        let condition = self.expr(e)?;
        self.push_condition(if sign {
            condition
        } else {
            Formula::not(condition)
        });
        Ok(())
    }

    /// Enter a branch guarded by `condition`.
    pub fn push_condition(&mut self, condition: Formula) {
        let current = self.current_path_condition();
        let next = if current.is_true() {
            condition
        } else {
            Formula::and(current, condition)
        };
        tracing::debug!(depth = self.path_conditions.len() + 1, condition = %next, "Push path condition");
        self.path_conditions.push(next);
    }

    pub fn pop_path_condition(&mut self) -> Result<(), EncodeError> {
        if self.path_conditions.pop().is_none() {
            return Err(EncodeError::EmptyPathCondition);
        }
        tracing::debug!(depth = self.path_conditions.len(), "Pop path condition");
        Ok(())
    }

    // === Statements ===

    fn add_statement(&mut self, expression: Formula, location: &SourceLocation) {
        let statement = Statement {
            condition: self.current_path_condition(),
            expression,
            location: location.clone(),
        };
        tracing::debug!(statement = %statement.contribution(), "Statement");
        self.statements.push(statement);
    }

    /// Close the encoding. Further encoding calls fail with
    /// [`EncodeError::Finalized`]; read access is unaffected.
    pub fn finalize(&mut self) {
        if self.phase != Phase::Finalized {
            tracing::info!(
                contract = %self.contract,
                function = %self.function,
                statements = self.statements.len(),
                "Finished encoding function"
            );
        }
        self.phase = Phase::Finalized;
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Conjunction of every statement's contribution, in emission order.
    pub fn formula(&self) -> Formula {
        Formula::conjunction(self.statements.iter().map(Statement::contribution))
    }

    /// The function as an SMT-LIB2 script: every declaration once, then one
    /// `assert` per statement.
    pub fn to_smtlib(&self) -> String {
        let contributions: Vec<Formula> = self
            .statements
            .iter()
            .map(Statement::contribution)
            .collect();
        Script::from_assertions(&contributions).to_string()
    }

    /// Assert every statement into `backend`.
    pub fn assert_into(&self, backend: &mut dyn SolverBackend) {
        tracing::debug!(function = %self.function, statements = self.statements.len(), "Flushing statements to solver");
        for statement in &self.statements {
            backend.assert(&statement.contribution());
        }
    }
}
