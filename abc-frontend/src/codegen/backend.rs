//! Code generation backend interface
//!
//! The expression generator only talks to the target through this trait.
//! Values, labels and types are those of the IR; a backend emitting
//! something else maps them onto its own representation.

use super::errors::CodegenError;
use crate::expr::Storage;
use crate::ir::{IrBinaryOp, IrType, IrUnaryOp, Value};
use abc_common::{LabelId, SymbolId};

/// Parameter of a function under construction
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub symbol: SymbolId,
    pub name: String,
    pub ty: IrType,
}

/// Where function construction stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionState {
    NotBuilding,
    Building { block_open: bool },
}

pub trait CodeGenBackend {
    // Labels and blocks

    fn create_label(&mut self) -> LabelId;

    /// Start the block `label`. An open block falls through into it.
    fn define_label(&mut self, label: LabelId) -> Result<(), CodegenError>;

    fn current_label(&self) -> Option<LabelId>;

    fn state(&self) -> FunctionState;

    fn is_block_open(&self) -> bool {
        matches!(self.state(), FunctionState::Building { block_open: true })
    }

    // Control flow; each closes the current block

    fn jump(&mut self, target: LabelId) -> Result<(), CodegenError>;

    fn cond_jump(&mut self, condition: Value, on_true: LabelId, on_false: LabelId) -> Result<(), CodegenError>;

    fn ret(&mut self, value: Option<Value>) -> Result<(), CodegenError>;

    // Storage

    fn load(&mut self, address: Value, ty: &IrType) -> Result<Value, CodegenError>;

    fn store(&mut self, value: Value, address: Value, ty: &IrType) -> Result<(), CodegenError>;

    /// Storage for a local variable, addressable through `symbol_address`
    fn local_variable(&mut self, symbol: SymbolId, name: &str, ty: &IrType) -> Result<Value, CodegenError>;

    /// Anonymous storage of type `ty`
    fn temporary(&mut self, ty: &IrType) -> Result<Value, CodegenError>;

    fn symbol_address(&mut self, symbol: SymbolId, name: &str, storage: Storage) -> Result<Value, CodegenError>;

    /// Address of a zero-terminated copy of `text`
    fn string_literal(&mut self, text: &str) -> Result<Value, CodegenError>;

    fn declare_global(
        &mut self,
        symbol: SymbolId,
        name: &str,
        ty: &IrType,
        init: Option<Value>,
    ) -> Result<Value, CodegenError>;

    // Address arithmetic

    /// `base` advanced by `index` elements of type `element`
    fn ptr_offset(&mut self, base: Value, index: Value, element: &IrType) -> Result<Value, CodegenError>;

    /// Address of member `index` of the struct of type `object` at `base`
    fn member_address(
        &mut self,
        base: Value,
        object: &IrType,
        index: usize,
        member: &IrType,
    ) -> Result<Value, CodegenError>;

    /// Number of `element`s between two addresses, as i64
    fn ptr_diff(&mut self, a: Value, b: Value, element: &IrType) -> Result<Value, CodegenError>;

    // Values

    fn int_const(&mut self, value: i64, ty: &IrType) -> Value;

    fn float_const(&mut self, value: f64, ty: &IrType) -> Value;

    fn zero(&mut self, ty: &IrType) -> Value;

    fn arith(&mut self, op: IrBinaryOp, a: Value, b: Value, ty: &IrType) -> Result<Value, CodegenError>;

    /// Comparison of two operands of type `ty`, yielding an i1
    fn compare(&mut self, op: IrBinaryOp, a: Value, b: Value, ty: &IrType) -> Result<Value, CodegenError>;

    /// Negation or a type-directed conversion to `ty`
    fn unary(&mut self, op: IrUnaryOp, a: Value, ty: &IrType) -> Result<Value, CodegenError>;

    /// Value depending on the predecessor control arrived from
    fn merge(&mut self, incoming: Vec<(Value, LabelId)>, ty: &IrType) -> Result<Value, CodegenError>;

    /// Call; `None` for a void result
    fn call(&mut self, callee: Value, args: Vec<Value>, ret: &IrType) -> Result<Option<Value>, CodegenError>;

    // Function construction

    /// Open the entry block and bind the parameters
    fn begin_function(
        &mut self,
        name: &str,
        ret: IrType,
        params: Vec<Parameter>,
        variadic: bool,
    ) -> Result<(), CodegenError>;

    /// Close the function. A void function falling off its end returns
    /// implicitly; any other open block is a missing return.
    fn end_function(&mut self) -> Result<(), CodegenError>;
}
