//! IR Value Representations
//!
//! Defines values that can be used as operands in IR instructions,
//! including temporaries, constants and global references.

use abc_common::TempId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// IR Value - represents operands in IR instructions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Temporary variable
    Temp(TempId),

    /// Constant integer
    Constant(i64),

    /// Constant floating point number
    FloatConstant(f64),

    /// The null pointer
    Null,

    /// Global symbol reference
    Global(String),

    /// Function reference
    Function(String),

    /// Aggregate of constant values (for initializers)
    Aggregate(Vec<Value>),

    /// Undefined value (for uninitialized variables)
    Undef,
}

impl Value {
    pub fn is_constant(&self) -> bool {
        match self {
            Value::Constant(_) | Value::FloatConstant(_) | Value::Null => true,
            Value::Aggregate(values) => values.iter().all(Value::is_constant),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Temp(id) => write!(f, "%{id}"),
            Value::Constant(val) => write!(f, "{val}"),
            Value::FloatConstant(val) => write!(f, "{val:?}"),
            Value::Null => write!(f, "null"),
            Value::Global(name) => write!(f, "@{name}"),
            Value::Function(name) => write!(f, "@{name}"),
            Value::Aggregate(values) => {
                write!(f, "[")?;
                for (i, val) in values.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{val}")?;
                }
                write!(f, "]")
            }
            Value::Undef => write!(f, "undef"),
        }
    }
}
