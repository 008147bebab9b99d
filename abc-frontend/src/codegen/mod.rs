//! Code generation for typed expressions
//!
//! `CodeGenerator` walks expression trees and drives a [`CodeGenBackend`];
//! `IrBackend` is the backend building the crate's IR module.

mod backend;
mod errors;
mod expressions;
mod function;
mod ir_backend;
mod statements;
pub mod types;

pub use backend::{CodeGenBackend, FunctionState, Parameter};
pub use errors::CodegenError;
pub use expressions::CodeGenerator;
pub use ir_backend::IrBackend;
pub use types::convert_type;
