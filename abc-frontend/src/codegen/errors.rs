//! Code generation error types

use abc_common::CompilerError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    #[error("'{expr}' is not a constant expression")]
    NotAConstant { expr: String },

    #[error("'{expr}' has no address")]
    NotAddressable { expr: String },

    #[error("type '{ty}' has no machine representation")]
    UnsupportedType { ty: String },

    #[error("no conversion from '{from}' to '{to}'")]
    UnsupportedCast { from: String, to: String },

    #[error("function '{name}' started while '{current}' is being built")]
    NestedFunction { name: String, current: String },

    #[error("no function is being built")]
    NoFunction,

    #[error("missing return in function '{function}'")]
    MissingReturn { function: String },

    #[error("undefined variable '{name}'")]
    UndefinedVariable { name: String },

    #[error("IR builder: {0}")]
    Builder(String),
}

impl From<String> for CodegenError {
    fn from(message: String) -> Self {
        CodegenError::Builder(message)
    }
}

impl From<CodegenError> for CompilerError {
    fn from(err: CodegenError) -> Self {
        CompilerError::codegen_error(err.to_string(), None)
    }
}
