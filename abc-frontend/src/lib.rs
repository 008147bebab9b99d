//! ABC Compiler - Semantic Core
//!
//! This crate provides the typed middle of the ABC compiler:
//! - Types: interned type table and the implicit/explicit conversion matrix
//! - Promotion: operand conversion and result types for every operator
//! - Expressions: typed expression nodes with constant folding
//! - Session: scopes, declarations and diagnostics
//! - Codegen: expression lowering, short-circuit branches and function construction
//! - IR: the SSA-style intermediate representation the default backend emits

pub mod codegen;
pub mod expr;
pub mod ir;
pub mod promotion;
pub mod session;
pub mod types;

pub use codegen::{CodeGenBackend, CodeGenerator, CodegenError, IrBackend};
pub use expr::{BinaryOp, Constant, Expr, ExprPtr, UnaryOp};
pub use promotion::SemanticError;
pub use session::{Declaration, FailurePolicy, Session, SessionOptions};
pub use types::{FloatWidth, TypeId, TypeKind, TypeTable};
