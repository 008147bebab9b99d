//! Intermediate Representation
//!
//! A small SSA-flavoured IR used as the reference code generation
//! backend. Expressions are lowered into it through the
//! [`CodeGenBackend`](crate::codegen::CodeGenBackend) trait.
//!
//! ## Architecture
//!
//! The module is structured as follows:
//! - `types` - IR types
//! - `values` - Value representations
//! - `ops` - Binary and unary (conversion) operations
//! - `instructions` - IR instructions
//! - `blocks` - Basic block management
//! - `function` - Function definitions
//! - `module` - Module and global variables
//! - `builder` - IR construction utilities

pub use self::types::IrType;
pub use self::values::Value;
pub use self::ops::{IrBinaryOp, IrUnaryOp};
pub use self::instructions::Instruction;
pub use self::blocks::BasicBlock;
pub use self::function::Function;
pub use self::module::{Module, GlobalVariable, Linkage};
pub use self::builder::IrBuilder;

mod types;
mod values;
mod ops;
mod instructions;
mod blocks;
mod function;
mod module;
mod builder;

#[cfg(test)]
mod tests;
