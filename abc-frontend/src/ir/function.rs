//! Function Definitions
//!
//! Defines IR functions with their parameters, blocks, and metadata.

use abc_common::{LabelId, SourceSpan, TempId};
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::ir::{BasicBlock, IrType};

/// Function in IR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub return_type: IrType,
    pub parameters: Vec<(TempId, IrType)>,
    pub blocks: Vec<BasicBlock>,
    pub is_vararg: bool,
    pub span: Option<SourceSpan>,
}

impl Function {
    pub fn new(name: String, return_type: IrType) -> Self {
        Self {
            name,
            return_type,
            parameters: Vec::new(),
            blocks: Vec::new(),
            is_vararg: false,
            span: None,
        }
    }

    pub fn add_parameter(&mut self, param_id: TempId, param_type: IrType) {
        self.parameters.push((param_id, param_type));
    }

    pub fn add_block(&mut self, block: BasicBlock) {
        self.blocks.push(block);
    }

    pub fn get_block(&self, id: LabelId) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn get_block_mut(&mut self, id: LabelId) -> Option<&mut BasicBlock> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    pub fn entry_block(&self) -> Option<&BasicBlock> {
        self.blocks.first()
    }

    /// Recompute the predecessor lists from the recorded successors
    pub fn link_predecessors(&mut self) {
        let edges: Vec<(LabelId, LabelId)> = self
            .blocks
            .iter()
            .flat_map(|b| b.successors.iter().map(move |s| (b.id, *s)))
            .collect();
        for block in &mut self.blocks {
            block.predecessors.clear();
        }
        for (from, to) in edges {
            if let Some(block) = self.get_block_mut(to) {
                if !block.predecessors.contains(&from) {
                    block.predecessors.push(from);
                }
            }
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "define {} @{}(", self.return_type, self.name)?;
        for (i, (id, ty)) in self.parameters.iter().enumerate() {
            if i > 0 { write!(f, ", ")?; }
            write!(f, "{ty} %{id}")?;
        }
        if self.is_vararg {
            if !self.parameters.is_empty() { write!(f, ", ")?; }
            write!(f, "...")?;
        }
        writeln!(f, ") {{")?;
        for block in &self.blocks {
            write!(f, "{block}")?;
        }
        writeln!(f, "}}")
    }
}
