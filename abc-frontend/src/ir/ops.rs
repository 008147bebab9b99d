//! IR Operations
//!
//! Defines binary and unary operations available in the IR.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operations in IR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IrBinaryOp {
    // Arithmetic
    Add, Sub, Mul,
    SDiv, UDiv,    // Signed/unsigned division
    SRem, URem,    // Signed/unsigned remainder

    // Floating point arithmetic
    FAdd, FSub, FMul, FDiv, FRem,

    // Comparison (return i1)
    Eq, Ne,
    Slt, Sle, Sgt, Sge, // Signed comparisons
    Ult, Ule, Ugt, Uge, // Unsigned comparisons
    FEq, FNe, FLt, FLe, FGt, FGe, // Ordered float comparisons
}

impl IrBinaryOp {
    pub fn is_comparison(self) -> bool {
        use IrBinaryOp::*;
        matches!(
            self,
            Eq | Ne | Slt | Sle | Sgt | Sge | Ult | Ule | Ugt | Uge | FEq | FNe | FLt | FLe | FGt | FGe
        )
    }
}

impl fmt::Display for IrBinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            IrBinaryOp::Add => "add",
            IrBinaryOp::Sub => "sub",
            IrBinaryOp::Mul => "mul",
            IrBinaryOp::SDiv => "sdiv",
            IrBinaryOp::UDiv => "udiv",
            IrBinaryOp::SRem => "srem",
            IrBinaryOp::URem => "urem",
            IrBinaryOp::FAdd => "fadd",
            IrBinaryOp::FSub => "fsub",
            IrBinaryOp::FMul => "fmul",
            IrBinaryOp::FDiv => "fdiv",
            IrBinaryOp::FRem => "frem",
            IrBinaryOp::Eq => "eq",
            IrBinaryOp::Ne => "ne",
            IrBinaryOp::Slt => "slt",
            IrBinaryOp::Sle => "sle",
            IrBinaryOp::Sgt => "sgt",
            IrBinaryOp::Sge => "sge",
            IrBinaryOp::Ult => "ult",
            IrBinaryOp::Ule => "ule",
            IrBinaryOp::Ugt => "ugt",
            IrBinaryOp::Uge => "uge",
            IrBinaryOp::FEq => "oeq",
            IrBinaryOp::FNe => "one",
            IrBinaryOp::FLt => "olt",
            IrBinaryOp::FLe => "ole",
            IrBinaryOp::FGt => "ogt",
            IrBinaryOp::FGe => "oge",
        };
        write!(f, "{op_str}")
    }
}

/// Unary operations in IR, including every value conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IrUnaryOp {
    Neg,      // Arithmetic negation
    FNeg,     // Floating point negation
    ZExt,     // Zero extend
    SExt,     // Sign extend
    Trunc,    // Truncate
    FpExt,    // f32 -> f64
    FpTrunc,  // f64 -> f32
    SiToFp,   // Signed integer to float
    UiToFp,   // Unsigned integer to float
    FpToSi,   // Float to signed integer
    FpToUi,   // Float to unsigned integer
    PtrToInt, // Pointer to integer cast
    IntToPtr, // Integer to pointer cast
    Bitcast,  // Reinterpret without changing bits (pointer to pointer)
}

impl fmt::Display for IrUnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            IrUnaryOp::Neg => "neg",
            IrUnaryOp::FNeg => "fneg",
            IrUnaryOp::ZExt => "zext",
            IrUnaryOp::SExt => "sext",
            IrUnaryOp::Trunc => "trunc",
            IrUnaryOp::FpExt => "fpext",
            IrUnaryOp::FpTrunc => "fptrunc",
            IrUnaryOp::SiToFp => "sitofp",
            IrUnaryOp::UiToFp => "uitofp",
            IrUnaryOp::FpToSi => "fptosi",
            IrUnaryOp::FpToUi => "fptoui",
            IrUnaryOp::PtrToInt => "ptrtoint",
            IrUnaryOp::IntToPtr => "inttoptr",
            IrUnaryOp::Bitcast => "bitcast",
        };
        write!(f, "{op_str}")
    }
}
