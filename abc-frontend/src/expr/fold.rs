//! Compile-time evaluation of constant expressions

use super::{BinaryOp, Expr, ExprKind, Literal, UnaryOp};
use crate::types::{FloatWidth, TypeId, TypeKind, TypeTable};

/// Value of a constant expression
///
/// Integers are kept normalized to the width and signedness of their
/// type; unsigned 64-bit values are stored as their bit pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Integer(i64),
    Float(f64),
    Null,
    Aggregate(Vec<Constant>),
}

impl Constant {
    pub fn is_true(&self) -> bool {
        match self {
            Constant::Integer(value) => *value != 0,
            Constant::Float(value) => *value != 0.0,
            Constant::Null => false,
            Constant::Aggregate(_) => true,
        }
    }
}

/// Truncate to `bits` and sign- or zero-extend back to 64 bits
pub(crate) fn wrap(value: i64, bits: u16, signed: bool) -> i64 {
    if bits >= 64 {
        return value;
    }
    let mask = (1u64 << bits) - 1;
    let low = (value as u64) & mask;
    if signed && bits > 0 && (low >> (bits - 1)) & 1 == 1 {
        (low | !mask) as i64
    } else {
        low as i64
    }
}

fn round_float(value: f64, width: FloatWidth) -> f64 {
    match width {
        FloatWidth::F32 => value as f32 as f64,
        FloatWidth::F64 => value,
    }
}

impl Expr {
    /// Value of the expression if it can be computed at compile time
    pub fn constant(&self, types: &TypeTable) -> Option<Constant> {
        match &self.kind {
            ExprKind::Literal(literal) => literal_constant(literal, self.ty, types),
            ExprKind::Identifier { value, .. } => value.as_ref()?.constant(types),
            ExprKind::Proxy(target) => target.constant(types),
            ExprKind::Unary { op, child } => {
                let value = child.constant(types)?;
                match op {
                    UnaryOp::Cast | UnaryOp::ExplicitCast => {
                        convert_constant(value, child.ty, self.ty, types)
                    }
                    UnaryOp::Minus => match value {
                        Constant::Integer(v) => integer_of(v.wrapping_neg(), self.ty, types),
                        Constant::Float(v) => Some(Constant::Float(-v)),
                        _ => None,
                    },
                    UnaryOp::LogicalNot => Some(Constant::Integer(!value.is_true() as i64)),
                    _ => None,
                }
            }
            ExprKind::Binary { op, left, right } => {
                fold_binary(*op, left, right, self.ty, types)
            }
            ExprKind::Conditional { cond, then_expr, else_expr } => {
                if cond.constant(types)?.is_true() {
                    then_expr.constant(types)
                } else {
                    else_expr.constant(types)
                }
            }
            ExprKind::AggregateVector { elements } => elements
                .iter()
                .map(|element| element.constant(types))
                .collect::<Option<Vec<_>>>()
                .map(Constant::Aggregate),
            ExprKind::Call { .. } | ExprKind::Member { .. } => None,
        }
    }

    pub fn is_constant(&self, types: &TypeTable) -> bool {
        self.constant(types).is_some()
    }

    /// Statically known to be a null pointer
    pub fn is_null_pointer_value(&self, types: &TypeTable) -> bool {
        types.is_nullptr(self.ty) || matches!(self.constant(types), Some(Constant::Null))
    }
}

fn integer_of(value: i64, ty: TypeId, types: &TypeTable) -> Option<Constant> {
    match types.kind(ty) {
        TypeKind::Integer { bits, signed } => Some(Constant::Integer(wrap(value, *bits, *signed))),
        TypeKind::Bool => Some(Constant::Integer((value != 0) as i64)),
        _ => None,
    }
}

fn literal_constant(literal: &Literal, ty: TypeId, types: &TypeTable) -> Option<Constant> {
    match literal {
        Literal::Integer(value) => integer_of(*value, ty, types),
        Literal::Bool(value) => Some(Constant::Integer(*value as i64)),
        Literal::Float(value) => match types.kind(ty) {
            TypeKind::Float(width) => Some(Constant::Float(round_float(*value, *width))),
            _ => None,
        },
        Literal::Nullptr => Some(Constant::Null),
        Literal::String(_) => None,
    }
}

fn convert_constant(value: Constant, from: TypeId, to: TypeId, types: &TypeTable) -> Option<Constant> {
    if types.is_bool(to) {
        return match value {
            Constant::Aggregate(_) => None,
            scalar => Some(Constant::Integer(scalar.is_true() as i64)),
        };
    }
    match (value, types.kind(to)) {
        (Constant::Integer(v), TypeKind::Integer { bits, signed }) => {
            Some(Constant::Integer(wrap(v, *bits, *signed)))
        }
        (Constant::Float(v), TypeKind::Integer { bits, signed }) => {
            let truncated = if *signed { v as i64 } else { v as u64 as i64 };
            Some(Constant::Integer(wrap(truncated, *bits, *signed)))
        }
        (Constant::Integer(v), TypeKind::Float(width)) => {
            let as_float = if types.is_unsigned_integer(from) {
                v as u64 as f64
            } else {
                v as f64
            };
            Some(Constant::Float(round_float(as_float, *width)))
        }
        (Constant::Float(v), TypeKind::Float(width)) => Some(Constant::Float(round_float(v, *width))),
        (Constant::Null, TypeKind::Pointer(_)) => Some(Constant::Null),
        (Constant::Aggregate(items), TypeKind::Array { .. } | TypeKind::Struct(_)) => {
            Some(Constant::Aggregate(items))
        }
        _ => None,
    }
}

fn fold_binary(op: BinaryOp, left: &Expr, right: &Expr, ty: TypeId, types: &TypeTable) -> Option<Constant> {
    if op.is_assignment() || op == BinaryOp::Index {
        return None;
    }
    let l = left.constant(types)?;
    let r = right.constant(types)?;

    if op.is_logical() {
        let value = match op {
            BinaryOp::LogicalAnd => l.is_true() && r.is_true(),
            _ => l.is_true() || r.is_true(),
        };
        return Some(Constant::Integer(value as i64));
    }

    if op.is_comparison() {
        let operand_ty = left.ty;
        let ordering = match (&l, &r) {
            (Constant::Null, Constant::Null) => Some(std::cmp::Ordering::Equal),
            (Constant::Float(a), Constant::Float(b)) => a.partial_cmp(b),
            (Constant::Integer(a), Constant::Integer(b)) => {
                if types.is_unsigned_integer(operand_ty) {
                    Some((*a as u64).cmp(&(*b as u64)))
                } else {
                    Some(a.cmp(b))
                }
            }
            _ => None,
        }?;
        let pointer_operands = types.is_pointer(operand_ty);
        let value = match op {
            BinaryOp::Equal => ordering.is_eq(),
            BinaryOp::NotEqual => ordering.is_ne(),
            _ if pointer_operands => return None,
            BinaryOp::Less => ordering.is_lt(),
            BinaryOp::Greater => ordering.is_gt(),
            BinaryOp::LessEqual => ordering.is_le(),
            _ => ordering.is_ge(),
        };
        return Some(Constant::Integer(value as i64));
    }

    match (l, r) {
        (Constant::Integer(a), Constant::Integer(b)) => {
            let unsigned = types.is_unsigned_integer(ty);
            let value = match op {
                BinaryOp::Add => a.wrapping_add(b),
                BinaryOp::Sub => a.wrapping_sub(b),
                BinaryOp::Mul => a.wrapping_mul(b),
                BinaryOp::Div if b == 0 => return None,
                BinaryOp::Mod if b == 0 => return None,
                BinaryOp::Div if unsigned => ((a as u64) / (b as u64)) as i64,
                BinaryOp::Mod if unsigned => ((a as u64) % (b as u64)) as i64,
                BinaryOp::Div => a.wrapping_div(b),
                BinaryOp::Mod => a.wrapping_rem(b),
                _ => return None,
            };
            integer_of(value, ty, types)
        }
        (Constant::Float(a), Constant::Float(b)) => {
            let value = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => return None,
            };
            match types.kind(ty) {
                TypeKind::Float(width) => Some(Constant::Float(round_float(value, *width))),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap() {
        assert_eq!(wrap(300, 8, false), 44);
        assert_eq!(wrap(200, 8, true), -56);
        assert_eq!(wrap(-1, 8, false), 255);
        assert_eq!(wrap(-1, 64, false), -1);
        assert_eq!(wrap(0x1_0000_0001, 32, true), 1);
    }

    #[test]
    fn test_truthiness() {
        assert!(Constant::Integer(3).is_true());
        assert!(!Constant::Integer(0).is_true());
        assert!(!Constant::Null.is_true());
        assert!(Constant::Float(0.5).is_true());
    }
}
