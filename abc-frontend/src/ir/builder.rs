//! IR Builder
//!
//! Provides utilities for constructing IR programmatically.

use abc_common::{LabelGenerator, LabelId, TempGenerator, TempId};
use crate::ir::{
    BasicBlock, Function, Instruction, IrBinaryOp, IrType, IrUnaryOp, Value,
};

/// Builder for constructing IR
///
/// Labels are unique for the whole builder; temporaries restart with
/// every function.
pub struct IrBuilder {
    current_function: Option<Function>,
    current_block: Option<LabelId>,
    temps: TempGenerator,
    labels: LabelGenerator,
}

impl IrBuilder {
    pub fn new() -> Self {
        Self {
            current_function: None,
            current_block: None,
            temps: TempGenerator::new(),
            labels: LabelGenerator::new(),
        }
    }

    pub fn new_temp(&mut self) -> TempId {
        self.temps.new_temp()
    }

    pub fn new_label(&mut self) -> LabelId {
        self.labels.new_label()
    }

    pub fn has_function(&self) -> bool {
        self.current_function.is_some()
    }

    pub fn create_function(&mut self, name: String, return_type: IrType) -> &mut Function {
        // Reset temp counter for new function
        self.temps.reset();
        self.current_block = None;
        self.current_function.insert(Function::new(name, return_type))
    }

    pub fn add_parameter(&mut self, param_id: TempId, param_type: IrType) {
        if let Some(ref mut function) = self.current_function {
            function.add_parameter(param_id, param_type);
            // Avoid conflicts with parameter IDs
            self.temps.reserve(param_id);
        }
    }

    /// Append a new block and make it the insertion point
    pub fn create_block(&mut self, label_id: LabelId) -> Result<&mut BasicBlock, String> {
        let function = self
            .current_function
            .as_mut()
            .ok_or_else(|| "No current function".to_string())?;
        if function.get_block(label_id).is_some() {
            return Err(format!("Label L{label_id} defined twice"));
        }
        function.add_block(BasicBlock::new(label_id));
        self.current_block = Some(label_id);
        function
            .blocks
            .last_mut()
            .ok_or_else(|| "Block vanished".to_string())
    }

    pub fn current_block(&self) -> Option<LabelId> {
        self.current_block
    }

    pub fn build_binary(&mut self, op: IrBinaryOp, lhs: Value, rhs: Value, result_type: IrType) -> Result<TempId, String> {
        let result = self.new_temp();
        let instr = Instruction::Binary { result, op, lhs, rhs, result_type };

        self.add_instruction(instr)?;
        Ok(result)
    }

    pub fn build_unary(&mut self, op: IrUnaryOp, operand: Value, result_type: IrType) -> Result<TempId, String> {
        let result = self.new_temp();
        let instr = Instruction::Unary { result, op, operand, result_type };

        self.add_instruction(instr)?;
        Ok(result)
    }

    pub fn build_load(&mut self, ptr: Value, result_type: IrType) -> Result<TempId, String> {
        let result = self.new_temp();
        let instr = Instruction::Load { result, ptr, result_type };

        self.add_instruction(instr)?;
        Ok(result)
    }

    pub fn build_store(&mut self, value: Value, ptr: Value, value_type: IrType) -> Result<(), String> {
        let instr = Instruction::Store { value, ptr, value_type };
        self.add_instruction(instr)
    }

    pub fn build_alloca(&mut self, alloc_type: IrType) -> Result<Value, String> {
        let result = self.new_temp();
        let result_type = IrType::Ptr(Box::new(alloc_type.clone()));
        let instr = Instruction::Alloca { result, alloc_type, result_type };

        self.add_instruction(instr)?;
        Ok(Value::Temp(result))
    }

    pub fn build_call(&mut self, function: Value, args: Vec<Value>, result_type: IrType) -> Result<Option<TempId>, String> {
        let result = if matches!(result_type, IrType::Void) {
            None
        } else {
            Some(self.new_temp())
        };

        let instr = Instruction::Call { result, function, args, result_type };

        self.add_instruction(instr)?;
        Ok(result)
    }

    pub fn build_return(&mut self, value: Option<Value>) -> Result<(), String> {
        self.add_instruction(Instruction::Return(value))
    }

    pub fn build_branch(&mut self, label: LabelId) -> Result<(), String> {
        self.add_instruction(Instruction::Branch(label))
    }

    pub fn build_branch_cond(&mut self, condition: Value, true_label: LabelId, false_label: LabelId) -> Result<(), String> {
        let instr = Instruction::BranchCond { condition, true_label, false_label };
        self.add_instruction(instr)
    }

    pub fn build_phi(&mut self, incoming: Vec<(Value, LabelId)>, result_type: IrType) -> Result<TempId, String> {
        let result = self.new_temp();
        let instr = Instruction::Phi { result, incoming, result_type };

        self.add_instruction(instr)?;
        Ok(result)
    }

    /// Address arithmetic: `ptr` advanced by `indices`, typed `result_type`
    pub fn build_pointer_offset(&mut self, ptr: Value, indices: Vec<Value>, result_type: IrType) -> Result<Value, String> {
        let result = self.new_temp();
        let instr = Instruction::GetElementPtr { result, ptr, indices, result_type };

        self.add_instruction(instr)?;
        Ok(Value::Temp(result))
    }

    pub fn build_comment(&mut self, text: String) -> Result<(), String> {
        self.add_instruction(Instruction::Comment(text))
    }

    fn add_instruction(&mut self, instr: Instruction) -> Result<(), String> {
        let function = self
            .current_function
            .as_mut()
            .ok_or_else(|| "No current function".to_string())?;
        let block_id = self.current_block.ok_or_else(|| "No current block".to_string())?;
        let block = function
            .get_block_mut(block_id)
            .ok_or_else(|| "Current block not found".to_string())?;
        if block.has_terminator() {
            return Err(format!("Block L{block_id} is already terminated"));
        }
        block.add_instruction(instr);
        Ok(())
    }

    pub fn current_block_has_terminator(&self) -> bool {
        if let Some(ref function) = self.current_function {
            if let Some(block_id) = self.current_block {
                if let Some(block) = function.get_block(block_id) {
                    return block.has_terminator();
                }
            }
        }
        false
    }

    /// Drop the current block if it is empty, not the entry block and no
    /// block branches to it. Returns whether it was dropped.
    pub fn discard_current_block_if_unreachable(&mut self) -> bool {
        let (Some(function), Some(block_id)) = (self.current_function.as_mut(), self.current_block) else {
            return false;
        };
        let is_entry = function.entry_block().is_some_and(|b| b.id == block_id);
        let is_empty = function.get_block(block_id).is_some_and(|b| b.is_empty());
        let is_target = function.blocks.iter().any(|b| b.successors.contains(&block_id));
        if is_entry || !is_empty || is_target {
            return false;
        }
        function.blocks.retain(|b| b.id != block_id);
        self.current_block = None;
        true
    }

    pub fn finish_function(&mut self) -> Option<Function> {
        self.current_block = None;
        let mut function = self.current_function.take()?;
        function.link_predecessors();
        Some(function)
    }
}

impl Default for IrBuilder {
    fn default() -> Self {
        Self::new()
    }
}
