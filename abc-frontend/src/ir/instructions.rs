//! IR Instructions
//!
//! Defines all instruction types available in the IR.

use abc_common::{LabelId, TempId};
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::ir::{IrBinaryOp, IrType, IrUnaryOp, Value};

/// IR Instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Binary operation: result = op lhs, rhs
    Binary {
        result: TempId,
        op: IrBinaryOp,
        lhs: Value,
        rhs: Value,
        result_type: IrType,
    },

    /// Unary operation or conversion: result = op operand to result_type
    Unary {
        result: TempId,
        op: IrUnaryOp,
        operand: Value,
        result_type: IrType,
    },

    /// Load from memory: result = load ptr
    Load {
        result: TempId,
        ptr: Value,
        result_type: IrType,
    },

    /// Store to memory: store value, ptr
    Store {
        value: Value,
        ptr: Value,
        value_type: IrType,
    },

    /// Get element pointer: result = getelementptr ptr, indices...
    GetElementPtr {
        result: TempId,
        ptr: Value,
        indices: Vec<Value>,
        result_type: IrType,
    },

    /// Allocate stack memory: result = alloca type
    Alloca {
        result: TempId,
        alloc_type: IrType,
        result_type: IrType, // Always pointer type
    },

    /// Function call: result = call func(args...)
    Call {
        result: Option<TempId>,
        function: Value,
        args: Vec<Value>,
        result_type: IrType,
    },

    /// Return: ret value or ret void
    Return(Option<Value>),

    /// Unconditional branch: br label
    Branch(LabelId),

    /// Conditional branch: br condition, true_label, false_label
    BranchCond {
        condition: Value,
        true_label: LabelId,
        false_label: LabelId,
    },

    /// Phi node: result = phi [val1, label1], [val2, label2], ...
    Phi {
        result: TempId,
        incoming: Vec<(Value, LabelId)>,
        result_type: IrType,
    },

    /// Comment (for debugging)
    Comment(String),
}

impl Instruction {
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Return(_) | Instruction::Branch(_) | Instruction::BranchCond { .. }
        )
    }

    /// Labels control may transfer to after this instruction
    pub fn successors(&self) -> Vec<LabelId> {
        match self {
            Instruction::Branch(label) => vec![*label],
            Instruction::BranchCond { true_label, false_label, .. } => {
                vec![*true_label, *false_label]
            }
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Binary { result, op, lhs, rhs, result_type } => {
                write!(f, "%{result} = {op} {result_type} {lhs}, {rhs}")
            }
            Instruction::Unary { result, op, operand, result_type } => {
                write!(f, "%{result} = {op} {operand} to {result_type}")
            }
            Instruction::Load { result, ptr, result_type } => {
                write!(f, "%{result} = load {result_type}, {result_type}* {ptr}")
            }
            Instruction::Store { value, ptr, value_type } => {
                write!(f, "store {value_type} {value}, {value_type}* {ptr}")
            }
            Instruction::GetElementPtr { result, ptr, indices, result_type } => {
                write!(f, "%{result} = getelementptr {ptr}")?;
                for index in indices {
                    write!(f, ", {index}")?;
                }
                write!(f, " ; {result_type}")
            }
            Instruction::Alloca { result, alloc_type, .. } => {
                write!(f, "%{result} = alloca {alloc_type}")
            }
            Instruction::Call { result, function, args, .. } => {
                if let Some(result) = result {
                    write!(f, "%{result} = ")?;
                }
                write!(f, "call {function}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Instruction::Return(Some(value)) => write!(f, "ret {value}"),
            Instruction::Return(None) => write!(f, "ret void"),
            Instruction::Branch(label) => write!(f, "br label %L{label}"),
            Instruction::BranchCond { condition, true_label, false_label } => {
                write!(f, "br i1 {condition}, label %L{true_label}, label %L{false_label}")
            }
            Instruction::Phi { result, incoming, result_type } => {
                write!(f, "%{result} = phi {result_type} ")?;
                for (i, (value, label)) in incoming.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "[{value}, %L{label}]")?;
                }
                Ok(())
            }
            Instruction::Comment(text) => write!(f, "; {text}"),
        }
    }
}
