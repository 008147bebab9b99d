//! Module and Global Variables
//!
//! Defines the top-level module structure and global variable management.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use crate::ir::{Function, IrType, Value};

/// Linkage types for global symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Linkage {
    External,  // Visible to other modules
    Internal,  // Only visible within this module
    Private,   // Compiler generated (string literals)
}

/// Global variable definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalVariable {
    pub name: String,
    pub var_type: IrType,
    pub is_constant: bool,
    pub initializer: Option<Value>,
    pub linkage: Linkage,
}

/// IR Module - represents a complete compilation unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub functions: Vec<Function>,
    pub globals: Vec<GlobalVariable>,
    pub type_definitions: BTreeMap<String, IrType>,
}

impl Module {
    pub fn new(name: String) -> Self {
        Self {
            name,
            functions: Vec::new(),
            globals: Vec::new(),
            type_definitions: BTreeMap::new(),
        }
    }

    pub fn add_function(&mut self, function: Function) {
        self.functions.push(function);
    }

    pub fn add_global(&mut self, global: GlobalVariable) {
        self.globals.push(global);
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn get_function_mut(&mut self, name: &str) -> Option<&mut Function> {
        self.functions.iter_mut().find(|f| f.name == name)
    }

    pub fn get_global(&self, name: &str) -> Option<&GlobalVariable> {
        self.globals.iter().find(|g| g.name == name)
    }

    /// Serialize the module for inspection by external tools
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; module {}", self.name)?;
        for (name, ty) in &self.type_definitions {
            writeln!(f, "%{name} = type {ty}")?;
        }
        for global in &self.globals {
            let kind = if global.is_constant { "constant" } else { "global" };
            write!(f, "@{} = {kind} {}", global.name, global.var_type)?;
            if let Some(init) = &global.initializer {
                write!(f, " {init}")?;
            }
            writeln!(f)?;
        }
        for function in &self.functions {
            writeln!(f)?;
            write!(f, "{function}")?;
        }
        Ok(())
    }
}
