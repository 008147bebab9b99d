//! ABC Compiler - Common Types and Utilities
//!
//! This crate contains shared types, error definitions, and utilities
//! used across all components of the ABC compiler: source locations,
//! diagnostics, the scoped symbol table and label/temporary generators.

pub mod error;
pub mod types;
pub mod source_loc;

pub use error::{CompilerError, Diagnostic, ErrorReporter, Severity};
pub use types::*;
pub use source_loc::{HasSpan, SourceLocation, SourceSpan};
