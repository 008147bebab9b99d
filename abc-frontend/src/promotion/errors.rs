//! Semantic rejection definitions
//!
//! Every operator, call and declaration rule rejects through one of these
//! variants. Rejections are fatal for the construct being built.

use crate::types::TypeError;
use abc_common::{CompilerError, SourceSpan};
use thiserror::Error;

/// Semantic analysis errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    #[error("operator '{op}' can not be applied to operand types '{left}' and '{right}'")]
    InvalidOperands {
        op: String,
        left: String,
        right: String,
        span: SourceSpan,
    },

    #[error("operator '{op}' can not be applied to operand of type '{operand}'")]
    InvalidOperand {
        op: String,
        operand: String,
        span: SourceSpan,
    },

    #[error("assignment of read-only variable '{expr}'")]
    ReadOnlyAssignment { expr: String, span: SourceSpan },

    #[error("increment of read-only variable '{expr}'")]
    ReadOnlyIncrement { expr: String, span: SourceSpan },

    #[error("decrement of read-only variable '{expr}'")]
    ReadOnlyDecrement { expr: String, span: SourceSpan },

    #[error("'{expr}' is not an lvalue")]
    NotAnLvalue { expr: String, span: SourceSpan },

    #[error("cannot take the address of '{expr}'")]
    NotAddressable { expr: String, span: SourceSpan },

    #[error("integer expression expected")]
    IntegerExpected { span: SourceSpan },

    #[error("dereferencing nullptr")]
    NullDereference { span: SourceSpan },

    #[error("'{expr}' is not a function (type '{ty}')")]
    NotAFunction {
        expr: String,
        ty: String,
        span: SourceSpan,
    },

    #[error("too few arguments to function")]
    TooFewArguments { span: SourceSpan },

    #[error("too many arguments to function")]
    TooManyArguments { span: SourceSpan },

    #[error("undeclared identifier '{name}'")]
    UndeclaredIdentifier { name: String, span: SourceSpan },

    #[error("redeclaration of '{name}'")]
    Redeclaration {
        name: String,
        span: SourceSpan,
        previous: SourceSpan,
    },

    #[error("invalid conversion from '{from}' to '{to}'")]
    InvalidConversion {
        from: String,
        to: String,
        span: SourceSpan,
    },

    #[error("invalid cast from '{from}' to '{to}'")]
    InvalidCast {
        from: String,
        to: String,
        span: SourceSpan,
    },

    #[error("use of incomplete type '{ty}'")]
    IncompleteType { ty: String, span: SourceSpan },

    #[error("member access on non-struct type '{ty}'")]
    NotAStruct { ty: String, span: SourceSpan },

    #[error("too many initializers for '{ty}'")]
    TooManyInitializers { ty: String, span: SourceSpan },

    #[error("division by zero")]
    DivisionByZero { span: SourceSpan },

    #[error("{error}")]
    Type { error: TypeError, span: SourceSpan },
}

impl SemanticError {
    pub fn span(&self) -> &SourceSpan {
        match self {
            SemanticError::InvalidOperands { span, .. }
            | SemanticError::InvalidOperand { span, .. }
            | SemanticError::ReadOnlyAssignment { span, .. }
            | SemanticError::ReadOnlyIncrement { span, .. }
            | SemanticError::ReadOnlyDecrement { span, .. }
            | SemanticError::NotAnLvalue { span, .. }
            | SemanticError::NotAddressable { span, .. }
            | SemanticError::IntegerExpected { span }
            | SemanticError::NullDereference { span }
            | SemanticError::NotAFunction { span, .. }
            | SemanticError::TooFewArguments { span }
            | SemanticError::TooManyArguments { span }
            | SemanticError::UndeclaredIdentifier { span, .. }
            | SemanticError::Redeclaration { span, .. }
            | SemanticError::InvalidConversion { span, .. }
            | SemanticError::InvalidCast { span, .. }
            | SemanticError::IncompleteType { span, .. }
            | SemanticError::NotAStruct { span, .. }
            | SemanticError::TooManyInitializers { span, .. }
            | SemanticError::DivisionByZero { span }
            | SemanticError::Type { span, .. } => span,
        }
    }
}

impl From<SemanticError> for CompilerError {
    fn from(err: SemanticError) -> Self {
        let span = err.span().clone();
        CompilerError::semantic_error(err.to_string(), span)
    }
}
