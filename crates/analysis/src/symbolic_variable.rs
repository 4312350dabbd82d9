//! SSA versioning of source variables.
//!
//! A [`SymbolicVariable`] gives every write to a source variable its own
//! logical constant. Version `k` of declaration `x` with id `7` is the free
//! variable `x-7_k`; older versions stay valid terms, they are simply no
//! longer returned by [`SymbolicVariable::current`].

use smtgas_smtlib::{Formula, Sort};

use crate::ast::{NodeId, Type, VariableDeclaration};
use crate::error::UnsupportedType;

/// Logical sort of a variable of type `ty`.
///
/// Only booleans and fixed-width integers are modelled; every other type is
/// rejected so it is never silently miscoded.
pub fn variable_sort(ty: &Type) -> Result<Sort, UnsupportedType> {
    match ty {
        Type::Bool => Ok(Sort::Bool),
        Type::Integer(_) => Ok(Sort::Int),
        other => Err(UnsupportedType(other.clone())),
    }
}

/// Zero element of a sort: `0` or `false`.
pub fn zero(sort: Sort) -> Formula {
    match sort {
        Sort::Bool => Formula::bool(false),
        Sort::Int => Formula::int(0),
    }
}

#[derive(Debug, Clone)]
pub struct SymbolicVariable {
    declaration: NodeId,
    name: String,
    ty: Type,
    sort: Sort,
    version: u32,
}

impl SymbolicVariable {
    pub fn new(decl: &VariableDeclaration) -> Result<Self, UnsupportedType> {
        let sort = variable_sort(&decl.ty)?;
        Ok(Self {
            declaration: decl.id,
            name: decl.name.clone(),
            ty: decl.ty.clone(),
            sort,
            version: 0,
        })
    }

    pub fn declaration(&self) -> NodeId {
        self.declaration
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn sort(&self) -> Sort {
        self.sort
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// The term naming `version` of this variable.
    pub fn term(&self, version: u32) -> Formula {
        Formula::declared(
            format!("{}-{}_{}", self.name, self.declaration, version),
            self.sort,
        )
    }

    pub fn current(&self) -> Formula {
        self.term(self.version)
    }

    /// Move to a fresh version and return its number. The new version is
    /// unconstrained until the caller defines it.
    pub fn advance(&mut self) -> u32 {
        self.version += 1;
        self.version
    }

    /// `current = 0` (or `current = false`).
    pub fn assert_zero(&self) -> Formula {
        Formula::eq(self.current(), zero(self.sort))
    }

    /// The current version holds some value of the declared type.
    ///
    /// Integers are bounded by their width: `min <= v && v <= max`. Any
    /// boolean is in range, so booleans get the vacuous `v => true`, which
    /// still mentions the variable and therefore declares it.
    pub fn assert_unknown(&self) -> Formula {
        let current = self.current();
        match &self.ty {
            Type::Integer(int) => Formula::and(
                Formula::ge(current.clone(), Formula::int(int.min_value())),
                Formula::le(current, Formula::int(int.max_value())),
            ),
            _ => Formula::implies(current, Formula::bool(true)),
        }
    }
}
