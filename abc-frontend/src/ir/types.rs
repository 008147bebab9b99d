//! IR Type System
//!
//! Machine-level types: integers by width, floats, typed pointers,
//! arrays, structs and function signatures. Signedness and const
//! qualification live in the front end types only.

use serde::{Deserialize, Serialize};
use std::fmt;

/// IR Type system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IrType {
    Void,

    /// Integer types with bit width
    I1,
    I8,
    I16,
    I32,
    I64,

    F32,
    F64,

    /// Pointer type
    Ptr(Box<IrType>),

    /// Array type [size x element_type]
    Array { size: u64, element_type: Box<IrType> },

    /// Function type
    Function {
        return_type: Box<IrType>,
        param_types: Vec<IrType>,
        is_vararg: bool,
    },

    /// Struct type
    Struct {
        name: Option<String>,
        fields: Vec<IrType>,
    },

    /// Label type (for basic block addresses)
    Label,
}

impl IrType {
    /// Integer type of the given width
    pub fn int(bits: u16) -> IrType {
        match bits {
            1 => IrType::I1,
            8 => IrType::I8,
            16 => IrType::I16,
            32 => IrType::I32,
            _ => IrType::I64,
        }
    }

    /// Get the size of this type in bytes
    pub fn size_in_bytes(&self) -> Option<u64> {
        match self {
            IrType::Void => None,
            IrType::I1 => Some(1), // Stored in full byte
            IrType::I8 => Some(1),
            IrType::I16 => Some(2),
            IrType::I32 | IrType::F32 => Some(4),
            IrType::I64 | IrType::F64 => Some(8),
            IrType::Ptr(_) => Some(8),
            IrType::Array { size, element_type } => {
                element_type.size_in_bytes().map(|elem_size| elem_size * size)
            }
            IrType::Function { .. } => None,
            IrType::Struct { fields, .. } => {
                let mut total = 0;
                for field in fields {
                    total += field.size_in_bytes()?;
                }
                Some(total)
            }
            IrType::Label => None,
        }
    }

    /// Bit width of integer and float types
    pub fn bits(&self) -> Option<u16> {
        match self {
            IrType::I1 => Some(1),
            IrType::I8 => Some(8),
            IrType::I16 => Some(16),
            IrType::I32 | IrType::F32 => Some(32),
            IrType::I64 | IrType::F64 => Some(64),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, IrType::I1 | IrType::I8 | IrType::I16 | IrType::I32 | IrType::I64)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, IrType::F32 | IrType::F64)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, IrType::Ptr(_))
    }

    /// Get the element type for pointers and arrays
    pub fn element_type(&self) -> Option<&IrType> {
        match self {
            IrType::Ptr(elem) => Some(elem),
            IrType::Array { element_type, .. } => Some(element_type),
            _ => None,
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Void => write!(f, "void"),
            IrType::I1 => write!(f, "i1"),
            IrType::I8 => write!(f, "i8"),
            IrType::I16 => write!(f, "i16"),
            IrType::I32 => write!(f, "i32"),
            IrType::I64 => write!(f, "i64"),
            IrType::F32 => write!(f, "float"),
            IrType::F64 => write!(f, "double"),
            IrType::Ptr(target) => write!(f, "{target}*"),
            IrType::Array { size, element_type } => write!(f, "[{size} x {element_type}]"),
            IrType::Function { return_type, param_types, is_vararg } => {
                write!(f, "{return_type} (")?;
                for (i, param) in param_types.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{param}")?;
                }
                if *is_vararg {
                    if !param_types.is_empty() { write!(f, ", ")?; }
                    write!(f, "...")?;
                }
                write!(f, ")")
            }
            IrType::Struct { name: Some(name), .. } => write!(f, "%{name}"),
            IrType::Struct { name: None, fields } => {
                write!(f, "{{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{field}")?;
                }
                write!(f, " }}")
            }
            IrType::Label => write!(f, "label"),
        }
    }
}
