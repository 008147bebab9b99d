//! Mapping of front end types and operators onto the IR

use super::errors::CodegenError;
use crate::expr::BinaryOp;
use crate::ir::{IrBinaryOp, IrType, IrUnaryOp};
use crate::types::{FloatWidth, TypeId, TypeKind, TypeTable};

/// Name under which a struct type is known to the IR
pub fn struct_type_name(types: &TypeTable, ty: TypeId) -> Option<String> {
    let id = types.struct_id(ty)?;
    let name = types.struct_name(ty)?;
    Some(format!("{}.{}", name, id.index()))
}

/// Convert a front end type to its IR representation
///
/// Structs are laid out member by member. Behind a pointer they are
/// referenced by name only, which keeps self-referential structs finite.
pub fn convert_type(types: &TypeTable, ty: TypeId) -> Result<IrType, CodegenError> {
    let unsupported = || CodegenError::UnsupportedType { ty: types.name(ty) };
    match types.kind(ty) {
        TypeKind::Void => Ok(IrType::Void),
        TypeKind::Bool => Ok(IrType::I1),
        TypeKind::Integer { bits, .. } => Ok(IrType::int(*bits)),
        TypeKind::Float(FloatWidth::F32) => Ok(IrType::F32),
        TypeKind::Float(FloatWidth::F64) => Ok(IrType::F64),
        TypeKind::Pointer(None) => Ok(IrType::Ptr(Box::new(IrType::I8))),
        TypeKind::Pointer(Some(pointee)) => Ok(IrType::Ptr(Box::new(pointee_type(types, *pointee)?))),
        TypeKind::Array { element, dim } => Ok(IrType::Array {
            size: *dim,
            element_type: Box::new(convert_type(types, *element)?),
        }),
        TypeKind::Function { ret, params, variadic } => Ok(IrType::Function {
            return_type: Box::new(convert_type(types, *ret)?),
            param_types: params
                .iter()
                .map(|param| convert_type(types, *param))
                .collect::<Result<_, _>>()?,
            is_vararg: *variadic,
        }),
        TypeKind::Struct(_) => {
            let members = types.members(ty).map_err(|_| unsupported())?;
            Ok(IrType::Struct {
                name: struct_type_name(types, ty),
                fields: members
                    .iter()
                    .map(|member| convert_type(types, member.ty))
                    .collect::<Result<_, _>>()?,
            })
        }
        TypeKind::Alias { .. } => Err(unsupported()),
    }
}

fn pointee_type(types: &TypeTable, pointee: TypeId) -> Result<IrType, CodegenError> {
    match types.kind(pointee) {
        TypeKind::Void => Ok(IrType::I8),
        TypeKind::Struct(_) => Ok(IrType::Struct {
            name: struct_type_name(types, pointee),
            fields: Vec::new(),
        }),
        _ => convert_type(types, pointee),
    }
}

/// Conversion instruction between two scalar types, or `None` when both
/// share one representation. Conversions to bool are comparisons and are
/// not handled here.
pub fn cast_op(types: &TypeTable, from: TypeId, to: TypeId) -> Result<Option<IrUnaryOp>, CodegenError> {
    let unsupported = || CodegenError::UnsupportedCast {
        from: types.name(from),
        to: types.name(to),
    };
    let op = match (types.kind(from), types.kind(to)) {
        (TypeKind::Integer { bits: a, signed }, TypeKind::Integer { bits: b, .. }) => {
            if b > a {
                Some(if *signed { IrUnaryOp::SExt } else { IrUnaryOp::ZExt })
            } else if b < a {
                Some(IrUnaryOp::Trunc)
            } else {
                None
            }
        }
        (TypeKind::Bool, TypeKind::Integer { bits, .. }) => (*bits > 1).then_some(IrUnaryOp::ZExt),
        (TypeKind::Bool, TypeKind::Float(_)) => Some(IrUnaryOp::UiToFp),
        (TypeKind::Integer { signed: true, .. }, TypeKind::Float(_)) => Some(IrUnaryOp::SiToFp),
        (TypeKind::Integer { signed: false, .. }, TypeKind::Float(_)) => Some(IrUnaryOp::UiToFp),
        (TypeKind::Float(_), TypeKind::Integer { signed: true, .. }) => Some(IrUnaryOp::FpToSi),
        (TypeKind::Float(_), TypeKind::Integer { signed: false, .. }) => Some(IrUnaryOp::FpToUi),
        (TypeKind::Float(a), TypeKind::Float(b)) => match a.bits().cmp(&b.bits()) {
            std::cmp::Ordering::Less => Some(IrUnaryOp::FpExt),
            std::cmp::Ordering::Greater => Some(IrUnaryOp::FpTrunc),
            std::cmp::Ordering::Equal => None,
        },
        (TypeKind::Pointer(None), TypeKind::Pointer(_)) => None,
        (TypeKind::Pointer(_), TypeKind::Pointer(_)) => Some(IrUnaryOp::Bitcast),
        // Aggregates are copied as they are; their layouts must agree
        (TypeKind::Array { .. }, TypeKind::Array { .. }) => {
            if convert_type(types, from)? != convert_type(types, to)? {
                return Err(unsupported());
            }
            None
        }
        (TypeKind::Struct(_), TypeKind::Struct(_)) => None,
        (TypeKind::Bool, TypeKind::Bool) => None,
        _ => return Err(unsupported()),
    };
    Ok(op)
}

/// Arithmetic instruction for `op` on operands of type `ty`
pub fn arithmetic_op(types: &TypeTable, op: BinaryOp, ty: TypeId) -> Result<IrBinaryOp, CodegenError> {
    let float = types.is_float(ty);
    let unsigned = types.is_unsigned_integer(ty);
    let ir_op = match op {
        BinaryOp::Add if float => IrBinaryOp::FAdd,
        BinaryOp::Sub if float => IrBinaryOp::FSub,
        BinaryOp::Mul if float => IrBinaryOp::FMul,
        BinaryOp::Div if float => IrBinaryOp::FDiv,
        BinaryOp::Mod if float => IrBinaryOp::FRem,
        BinaryOp::Add => IrBinaryOp::Add,
        BinaryOp::Sub => IrBinaryOp::Sub,
        BinaryOp::Mul => IrBinaryOp::Mul,
        BinaryOp::Div if unsigned => IrBinaryOp::UDiv,
        BinaryOp::Div => IrBinaryOp::SDiv,
        BinaryOp::Mod if unsigned => IrBinaryOp::URem,
        BinaryOp::Mod => IrBinaryOp::SRem,
        _ => {
            return Err(CodegenError::UnsupportedCast {
                from: op.to_string(),
                to: types.name(ty),
            })
        }
    };
    Ok(ir_op)
}

/// Comparison instruction for `op` on operands of type `ty`
///
/// Pointers and bools compare unsigned.
pub fn comparison_op(types: &TypeTable, op: BinaryOp, ty: TypeId) -> Option<IrBinaryOp> {
    let float = types.is_float(ty);
    let signed = types.is_signed_integer(ty);
    let ir_op = match op {
        BinaryOp::Equal if float => IrBinaryOp::FEq,
        BinaryOp::NotEqual if float => IrBinaryOp::FNe,
        BinaryOp::Less if float => IrBinaryOp::FLt,
        BinaryOp::LessEqual if float => IrBinaryOp::FLe,
        BinaryOp::Greater if float => IrBinaryOp::FGt,
        BinaryOp::GreaterEqual if float => IrBinaryOp::FGe,
        BinaryOp::Equal => IrBinaryOp::Eq,
        BinaryOp::NotEqual => IrBinaryOp::Ne,
        BinaryOp::Less if signed => IrBinaryOp::Slt,
        BinaryOp::LessEqual if signed => IrBinaryOp::Sle,
        BinaryOp::Greater if signed => IrBinaryOp::Sgt,
        BinaryOp::GreaterEqual if signed => IrBinaryOp::Sge,
        BinaryOp::Less => IrBinaryOp::Ult,
        BinaryOp::LessEqual => IrBinaryOp::Ule,
        BinaryOp::Greater => IrBinaryOp::Ugt,
        BinaryOp::GreaterEqual => IrBinaryOp::Uge,
        _ => return None,
    };
    Some(ir_op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_convert_scalars() {
        let mut types = TypeTable::new();
        let b = types.bool_type();
        let u16_ty = types.unsigned(16);
        let f = types.float(FloatWidth::F32);
        let void_ptr = {
            let v = types.void_type();
            types.pointer(v)
        };
        assert_eq!(convert_type(&types, b).unwrap(), IrType::I1);
        assert_eq!(convert_type(&types, u16_ty).unwrap(), IrType::I16);
        assert_eq!(convert_type(&types, f).unwrap(), IrType::F32);
        assert_eq!(convert_type(&types, void_ptr).unwrap(), IrType::Ptr(Box::new(IrType::I8)));
    }

    #[test]
    fn test_self_referential_struct() {
        let mut types = TypeTable::new();
        let node = types.incomplete_struct("Node");
        let next = types.pointer(node);
        let i32_ty = types.signed(32);
        types
            .complete_struct(node, vec!["value".to_string(), "next".to_string()], vec![i32_ty, next])
            .unwrap();
        let ir = convert_type(&types, node).unwrap();
        assert_eq!(
            ir,
            IrType::Struct {
                name: Some("Node.0".to_string()),
                fields: vec![
                    IrType::I32,
                    IrType::Ptr(Box::new(IrType::Struct {
                        name: Some("Node.0".to_string()),
                        fields: vec![]
                    })),
                ],
            }
        );
    }

    #[test]
    fn test_cast_ops() {
        let mut types = TypeTable::new();
        let i8_ty = types.signed(8);
        let u8_ty = types.unsigned(8);
        let i32_ty = types.signed(32);
        let f64_ty = types.float(FloatWidth::F64);
        assert_eq!(cast_op(&types, i8_ty, i32_ty).unwrap(), Some(IrUnaryOp::SExt));
        assert_eq!(cast_op(&types, u8_ty, i32_ty).unwrap(), Some(IrUnaryOp::ZExt));
        assert_eq!(cast_op(&types, i32_ty, u8_ty).unwrap(), Some(IrUnaryOp::Trunc));
        assert_eq!(cast_op(&types, i8_ty, u8_ty).unwrap(), None);
        assert_eq!(cast_op(&types, u8_ty, f64_ty).unwrap(), Some(IrUnaryOp::UiToFp));
        assert_eq!(cast_op(&types, f64_ty, i32_ty).unwrap(), Some(IrUnaryOp::FpToSi));
    }

    #[test]
    fn test_array_copy_needs_matching_layout() {
        let mut types = TypeTable::new();
        let u8_ty = types.unsigned(8);
        let const_u8 = types.get_const(u8_ty);
        let i32_ty = types.signed(32);
        let bytes = types.array(u8_ty, 4);
        let const_bytes = types.array(const_u8, 4);
        let words = types.array(i32_ty, 4);
        assert_eq!(cast_op(&types, const_bytes, bytes).unwrap(), None);
        assert!(cast_op(&types, bytes, words).is_err());
    }

    #[test]
    fn test_operator_selection() {
        let mut types = TypeTable::new();
        let u32_ty = types.unsigned(32);
        let i32_ty = types.signed(32);
        let f32_ty = types.float(FloatWidth::F32);
        assert_eq!(arithmetic_op(&types, BinaryOp::Div, u32_ty).unwrap(), IrBinaryOp::UDiv);
        assert_eq!(arithmetic_op(&types, BinaryOp::Div, i32_ty).unwrap(), IrBinaryOp::SDiv);
        assert_eq!(arithmetic_op(&types, BinaryOp::Add, f32_ty).unwrap(), IrBinaryOp::FAdd);
        assert_eq!(comparison_op(&types, BinaryOp::Less, u32_ty), Some(IrBinaryOp::Ult));
        assert_eq!(comparison_op(&types, BinaryOp::Less, i32_ty), Some(IrBinaryOp::Slt));
        assert_eq!(comparison_op(&types, BinaryOp::Assign, i32_ty), None);
    }
}
