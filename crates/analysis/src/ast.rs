//! Syntax tree handed over by the host compiler.
//!
//! The tree is already parsed and type-checked: every expression carries its
//! static [`Type`], every identifier the [`NodeId`] of the declaration it
//! resolves to. The encoder never owns these nodes; it keys its maps on
//! node ids and borrows the nodes while a function is being encoded.
//!
//! [`AstBuilder`] hands out fresh ids and fills in the type annotations the
//! type checker would have produced, for tests, benchmarks and embedders
//! that build trees programmatically.

use std::fmt;

use num::{BigInt, BigRational, One, Zero};

/// Stable identity of a node (expression or declaration) in the host tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Byte range in a source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub source: Option<String>,
    pub start: usize,
    pub end: usize,
}

impl SourceLocation {
    pub fn new(source: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            source: Some(source.into()),
            start,
            end,
        }
    }

    pub fn span(start: usize, end: usize) -> Self {
        Self {
            source: None,
            start,
            end,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{source}:{}-{}", self.start, self.end),
            None => write!(f, "{}-{}", self.start, self.end),
        }
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Fixed-width integer type (`int8` .. `int256`, `uint8` .. `uint256`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegerType {
    pub bits: u16,
    pub signed: bool,
}

impl IntegerType {
    pub fn new(bits: u16, signed: bool) -> Self {
        Self { bits, signed }
    }

    pub fn int(bits: u16) -> Self {
        Self::new(bits, true)
    }

    pub fn uint(bits: u16) -> Self {
        Self::new(bits, false)
    }

    pub fn int256() -> Self {
        Self::int(256)
    }

    pub fn uint256() -> Self {
        Self::uint(256)
    }

    /// Smallest representable value: `-2^(bits-1)` or `0`. A zero-width
    /// type holds only `0`.
    pub fn min_value(&self) -> BigInt {
        match usize::from(self.bits).checked_sub(1) {
            Some(magnitude) if self.signed => -(BigInt::one() << magnitude),
            _ => BigInt::zero(),
        }
    }

    /// Largest representable value: `2^(bits-1) - 1` or `2^bits - 1`.
    pub fn max_value(&self) -> BigInt {
        let magnitude = if self.signed {
            usize::from(self.bits).saturating_sub(1)
        } else {
            usize::from(self.bits)
        };
        (BigInt::one() << magnitude) - BigInt::one()
    }
}

impl fmt::Display for IntegerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.signed { "int" } else { "uint" };
        write!(f, "{prefix}{}", self.bits)
    }
}

/// Compile-time constant number, the type of numeric literals.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RationalNumberType {
    pub value: BigRational,
}

impl RationalNumberType {
    pub fn is_fractional(&self) -> bool {
        !self.value.is_integer()
    }
}

impl fmt::Display for RationalNumberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_fractional() {
            write!(
                f,
                "rational_const {} / {}",
                self.value.numer(),
                self.value.denom()
            )
        } else {
            write!(f, "int_const {}", self.value.numer())
        }
    }
}

/// What a function-typed expression refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Require,
    Assert,
    Internal,
    External,
}

/// Static type of an expression or declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Bool,
    Integer(IntegerType),
    RationalNumber(RationalNumberType),
    Address,
    FixedBytes(u8),
    String,
    Array(Box<Type>),
    Mapping(Box<Type>, Box<Type>),
    Struct(String),
    Contract(String),
    Function(FunctionKind),
    Tuple(Vec<Type>),
}

impl Type {
    /// Types whose values are copied rather than referenced.
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            Type::Bool | Type::Integer(_) | Type::Address | Type::FixedBytes(_) | Type::Contract(_)
        )
    }

    /// Type of a numeric literal.
    pub fn rational(value: impl Into<BigInt>) -> Self {
        Type::RationalNumber(RationalNumberType {
            value: BigRational::from_integer(value.into()),
        })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Integer(int) => write!(f, "{int}"),
            Type::RationalNumber(r) => write!(f, "{r}"),
            Type::Address => write!(f, "address"),
            Type::FixedBytes(n) => write!(f, "bytes{n}"),
            Type::String => write!(f, "string"),
            Type::Array(elem) => write!(f, "{elem}[]"),
            Type::Mapping(key, value) => write!(f, "mapping({key} => {value})"),
            Type::Struct(name) => write!(f, "struct {name}"),
            Type::Contract(name) => write!(f, "contract {name}"),
            Type::Function(_) => write!(f, "function"),
            Type::Tuple(types) => {
                write!(f, "tuple(")?;
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{ty}")?;
                }
                write!(f, ")")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    BitNot,
    Inc,
    Dec,
    Plus,
    Minus,
    Delete,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Inc => "++",
            UnaryOp::Dec => "--",
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Delete => "delete",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Exp
        )
    }

    pub fn is_compare(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_boolean(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Exp => "**",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        };
        f.write_str(s)
    }
}

/// `=` or a compound assignment operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl AssignOp {
    /// The binary operator a compound assignment applies, `None` for `=`.
    pub fn binary_op(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Sub => Some(BinaryOp::Sub),
            AssignOp::Mul => Some(BinaryOp::Mul),
            AssignOp::Div => Some(BinaryOp::Div),
            AssignOp::Mod => Some(BinaryOp::Mod),
            AssignOp::BitAnd => Some(BinaryOp::BitAnd),
            AssignOp::BitOr => Some(BinaryOp::BitOr),
            AssignOp::BitXor => Some(BinaryOp::BitXor),
            AssignOp::Shl => Some(BinaryOp::Shl),
            AssignOp::Shr => Some(BinaryOp::Shr),
        }
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.binary_op() {
            None => f.write_str("="),
            Some(op) => write!(f, "{op}="),
        }
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Bool(bool),
    Number(BigRational),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub id: NodeId,
    pub location: SourceLocation,
    pub ty: Type,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(LiteralValue),
    Identifier {
        name: String,
        /// Resolved declaration; `None` for built-ins such as `require`.
        declaration: Option<NodeId>,
        /// Set when the identifier is the target of an assignment or an
        /// increment/decrement.
        lvalue: bool,
    },
    Unary {
        op: UnaryOp,
        prefix: bool,
        sub: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
        common_type: Type,
    },
    Assignment {
        op: AssignOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Tuple {
        components: Vec<Expression>,
        inline_array: bool,
    },
    FunctionCall {
        callee: Box<Expression>,
        args: Vec<Expression>,
    },
    IndexAccess {
        base: Box<Expression>,
        index: Box<Expression>,
    },
    MemberAccess {
        base: Box<Expression>,
        member: String,
    },
}

impl Expression {
    /// Direct sub-expressions in evaluation order.
    pub fn children(&self) -> Vec<&Expression> {
        match &self.kind {
            ExprKind::Literal(_) | ExprKind::Identifier { .. } => Vec::new(),
            ExprKind::Unary { sub, .. } => vec![sub],
            ExprKind::Binary { left, right, .. } => vec![left, right],
            ExprKind::Assignment { lhs, rhs, .. } => vec![rhs, lhs],
            ExprKind::Tuple { components, .. } => components.iter().collect(),
            ExprKind::FunctionCall { callee, args } => {
                let mut children: Vec<&Expression> = args.iter().collect();
                children.push(callee);
                children
            }
            ExprKind::IndexAccess { base, index } => vec![base, index],
            ExprKind::MemberAccess { base, .. } => vec![base],
        }
    }

    /// Declaration an identifier resolves to.
    pub fn referenced_declaration(&self) -> Option<NodeId> {
        match &self.kind {
            ExprKind::Identifier { declaration, .. } => *declaration,
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Declarations and statements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub id: NodeId,
    pub name: String,
    pub ty: Type,
    pub location: SourceLocation,
    /// Initializer of a state variable. Local initializers live on the
    /// declaration statement.
    pub value: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub location: SourceLocation,
    pub kind: StmtKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Block(Vec<Stmt>),
    VariableDeclaration {
        declarations: Vec<VariableDeclaration>,
        initial_value: Option<Expression>,
    },
    Expression(Expression),
    If {
        condition: Expression,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expression,
        body: Box<Stmt>,
        do_while: bool,
    },
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expression>,
        step: Option<Expression>,
        body: Box<Stmt>,
    },
    Return(Option<Expression>),
}

impl Stmt {
    fn collect_locals<'a>(&'a self, out: &mut Vec<&'a VariableDeclaration>) {
        match &self.kind {
            StmtKind::Block(stmts) => stmts.iter().for_each(|s| s.collect_locals(out)),
            StmtKind::VariableDeclaration { declarations, .. } => out.extend(declarations.iter()),
            StmtKind::Expression(_) | StmtKind::Return(_) => {}
            StmtKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                then_branch.collect_locals(out);
                if let Some(else_branch) = else_branch {
                    else_branch.collect_locals(out);
                }
            }
            StmtKind::While { body, .. } => body.collect_locals(out),
            StmtKind::For { init, body, .. } => {
                if let Some(init) = init {
                    init.collect_locals(out);
                }
                body.collect_locals(out);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub id: NodeId,
    pub name: String,
    pub location: SourceLocation,
    pub parameters: Vec<VariableDeclaration>,
    pub returns: Vec<VariableDeclaration>,
    pub body: Vec<Stmt>,
    pub is_constructor: bool,
    pub modifiers: Vec<String>,
}

impl FunctionDefinition {
    /// Every variable declared anywhere in the body, in source order.
    pub fn local_variables(&self) -> Vec<&VariableDeclaration> {
        let mut out = Vec::new();
        for stmt in &self.body {
            stmt.collect_locals(&mut out);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractDefinition {
    pub id: NodeId,
    pub name: String,
    pub location: SourceLocation,
    pub state_variables: Vec<VariableDeclaration>,
    pub functions: Vec<FunctionDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceUnit {
    pub contracts: Vec<ContractDefinition>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builds annotated trees with unique node ids.
#[derive(Debug, Clone)]
pub struct AstBuilder {
    next_id: usize,
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AstBuilder {
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    fn fresh(&mut self) -> (NodeId, SourceLocation) {
        let id = self.next_id;
        self.next_id += 1;
        (NodeId(id), SourceLocation::span(id, id + 1))
    }

    fn expression(&mut self, ty: Type, kind: ExprKind) -> Expression {
        let (id, location) = self.fresh();
        Expression {
            id,
            location,
            ty,
            kind,
        }
    }

    fn stmt(&mut self, kind: StmtKind) -> Stmt {
        let (_, location) = self.fresh();
        Stmt { location, kind }
    }

    // === Declarations ===

    pub fn variable(&mut self, name: impl Into<String>, ty: Type) -> VariableDeclaration {
        let (id, location) = self.fresh();
        VariableDeclaration {
            id,
            name: name.into(),
            ty,
            location,
            value: None,
        }
    }

    pub fn function(
        &mut self,
        name: impl Into<String>,
        parameters: Vec<VariableDeclaration>,
        returns: Vec<VariableDeclaration>,
        body: Vec<Stmt>,
    ) -> FunctionDefinition {
        let (id, location) = self.fresh();
        FunctionDefinition {
            id,
            name: name.into(),
            location,
            parameters,
            returns,
            body,
            is_constructor: false,
            modifiers: Vec::new(),
        }
    }

    pub fn contract(
        &mut self,
        name: impl Into<String>,
        state_variables: Vec<VariableDeclaration>,
        functions: Vec<FunctionDefinition>,
    ) -> ContractDefinition {
        let (id, location) = self.fresh();
        ContractDefinition {
            id,
            name: name.into(),
            location,
            state_variables,
            functions,
        }
    }

    // === Expressions ===

    pub fn bool_literal(&mut self, value: bool) -> Expression {
        self.expression(Type::Bool, ExprKind::Literal(LiteralValue::Bool(value)))
    }

    pub fn number(&mut self, value: impl Into<BigInt>) -> Expression {
        let value: BigInt = value.into();
        self.expression(
            Type::rational(value.clone()),
            ExprKind::Literal(LiteralValue::Number(BigRational::from_integer(value))),
        )
    }

    /// Literal `numer / denom`, typed as a (possibly fractional) constant.
    pub fn rational(&mut self, numer: impl Into<BigInt>, denom: impl Into<BigInt>) -> Expression {
        let value = BigRational::new(numer.into(), denom.into());
        self.expression(
            Type::RationalNumber(RationalNumberType {
                value: value.clone(),
            }),
            ExprKind::Literal(LiteralValue::Number(value)),
        )
    }

    pub fn string_literal(&mut self, value: impl Into<String>) -> Expression {
        self.expression(Type::String, ExprKind::Literal(LiteralValue::Str(value.into())))
    }

    pub fn identifier(&mut self, decl: &VariableDeclaration) -> Expression {
        self.reference(decl, false)
    }

    /// Identifier used as an assignment target.
    pub fn lvalue(&mut self, decl: &VariableDeclaration) -> Expression {
        self.reference(decl, true)
    }

    fn reference(&mut self, decl: &VariableDeclaration, lvalue: bool) -> Expression {
        self.expression(
            decl.ty.clone(),
            ExprKind::Identifier {
                name: decl.name.clone(),
                declaration: Some(decl.id),
                lvalue,
            },
        )
    }

    pub fn unary(&mut self, op: UnaryOp, prefix: bool, sub: Expression) -> Expression {
        let ty = match op {
            UnaryOp::Not => Type::Bool,
            _ => sub.ty.clone(),
        };
        self.expression(
            ty,
            ExprKind::Unary {
                op,
                prefix,
                sub: Box::new(sub),
            },
        )
    }

    pub fn binary(&mut self, op: BinaryOp, left: Expression, right: Expression) -> Expression {
        let common_type = common_type(&left.ty, &right.ty);
        let ty = if op.is_compare() || op.is_boolean() {
            Type::Bool
        } else {
            common_type.clone()
        };
        self.expression(
            ty,
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                common_type,
            },
        )
    }

    pub fn assign(&mut self, decl: &VariableDeclaration, rhs: Expression) -> Expression {
        self.compound_assign(AssignOp::Assign, decl, rhs)
    }

    pub fn compound_assign(
        &mut self,
        op: AssignOp,
        decl: &VariableDeclaration,
        rhs: Expression,
    ) -> Expression {
        let lhs = self.lvalue(decl);
        self.expression(
            decl.ty.clone(),
            ExprKind::Assignment {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        )
    }

    pub fn tuple(&mut self, components: Vec<Expression>) -> Expression {
        let ty = match components.as_slice() {
            [single] => single.ty.clone(),
            _ => Type::Tuple(components.iter().map(|c| c.ty.clone()).collect()),
        };
        self.expression(
            ty,
            ExprKind::Tuple {
                components,
                inline_array: false,
            },
        )
    }

    pub fn call(
        &mut self,
        name: impl Into<String>,
        kind: FunctionKind,
        args: Vec<Expression>,
        result: Type,
    ) -> Expression {
        let callee = self.expression(
            Type::Function(kind),
            ExprKind::Identifier {
                name: name.into(),
                declaration: None,
                lvalue: false,
            },
        );
        self.expression(
            result,
            ExprKind::FunctionCall {
                callee: Box::new(callee),
                args,
            },
        )
    }

    pub fn require(&mut self, condition: Expression) -> Expression {
        self.call("require", FunctionKind::Require, vec![condition], Type::Tuple(Vec::new()))
    }

    pub fn assert(&mut self, condition: Expression) -> Expression {
        self.call("assert", FunctionKind::Assert, vec![condition], Type::Tuple(Vec::new()))
    }

    pub fn index(&mut self, base: Expression, index: Expression, ty: Type) -> Expression {
        self.expression(
            ty,
            ExprKind::IndexAccess {
                base: Box::new(base),
                index: Box::new(index),
            },
        )
    }

    // === Statements ===

    pub fn expr_stmt(&mut self, expression: Expression) -> Stmt {
        self.stmt(StmtKind::Expression(expression))
    }

    pub fn declare(&mut self, decl: VariableDeclaration, initial_value: Option<Expression>) -> Stmt {
        self.stmt(StmtKind::VariableDeclaration {
            declarations: vec![decl],
            initial_value,
        })
    }

    pub fn block(&mut self, stmts: Vec<Stmt>) -> Stmt {
        self.stmt(StmtKind::Block(stmts))
    }

    pub fn if_else(&mut self, condition: Expression, then_branch: Stmt, else_branch: Option<Stmt>) -> Stmt {
        self.stmt(StmtKind::If {
            condition,
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        })
    }

    pub fn while_loop(&mut self, condition: Expression, body: Stmt) -> Stmt {
        self.stmt(StmtKind::While {
            condition,
            body: Box::new(body),
            do_while: false,
        })
    }

    pub fn for_loop(
        &mut self,
        init: Option<Stmt>,
        condition: Option<Expression>,
        step: Option<Expression>,
        body: Stmt,
    ) -> Stmt {
        self.stmt(StmtKind::For {
            init: init.map(Box::new),
            condition,
            step,
            body: Box::new(body),
        })
    }

    pub fn ret(&mut self, value: Option<Expression>) -> Stmt {
        self.stmt(StmtKind::Return(value))
    }
}

/// Type both operands are converted to before a binary operation.
fn common_type(left: &Type, right: &Type) -> Type {
    match (left, right) {
        (Type::Integer(a), _) => Type::Integer(*a),
        (_, Type::Integer(b)) => Type::Integer(*b),
        (Type::RationalNumber(_), Type::RationalNumber(_)) => Type::Integer(IntegerType::int256()),
        _ => left.clone(),
    }
}
