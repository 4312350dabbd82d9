use thiserror::Error;

use crate::ast::{NodeId, SourceLocation, Type};
use crate::encoder::Phase;

/// A condition that abandons the encoding of the current function.
///
/// Other functions are unaffected; the analyzer records the error as a
/// diagnostic and discards the partial encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("Can't register variable `{name}` (declaration {id}) twice")]
    DuplicateDeclaration {
        name: String,
        id: NodeId,
        location: SourceLocation,
    },

    #[error("Type not implemented: {ty}")]
    UnimplementedType { ty: Type, location: SourceLocation },

    #[error("Fractional constant {literal} used as an integer")]
    FractionalLiteral {
        literal: String,
        location: SourceLocation,
    },

    #[error("Cannot pop path condition, empty")]
    EmptyPathCondition,

    #[error("Expression {id} used before it was encoded")]
    UndefinedExpression { id: NodeId, location: SourceLocation },

    #[error("Function encoding is finalized")]
    Finalized,

    #[error("Cannot {operation} while the encoder is {phase:?}")]
    WrongPhase { operation: &'static str, phase: Phase },

    #[error("{message}")]
    Unsupported {
        message: String,
        location: SourceLocation,
    },
}

impl EncodeError {
    pub fn unsupported(location: &SourceLocation, message: impl Into<String>) -> Self {
        EncodeError::Unsupported {
            message: message.into(),
            location: location.clone(),
        }
    }

    /// Where the condition was detected, if it belongs to a node.
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            EncodeError::DuplicateDeclaration { location, .. }
            | EncodeError::UnimplementedType { location, .. }
            | EncodeError::FractionalLiteral { location, .. }
            | EncodeError::UndefinedExpression { location, .. }
            | EncodeError::Unsupported { location, .. } => Some(location),
            EncodeError::EmptyPathCondition
            | EncodeError::Finalized
            | EncodeError::WrongPhase { .. } => None,
        }
    }
}

/// A type with no logical sort.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Variable type is not supported: {0}")]
pub struct UnsupportedType(pub Type);
