//! Binary operator rules
//!
//! Dispatch goes by operand category: struct, then array, then pointer,
//! then arithmetic. A rule may rewrite its operands (array decay, operand
//! swap) and dispatch again.

use super::{decay, implicit_cast, is_integral, is_read_only, require_sized_pointee, text, SemanticError};
use crate::expr::{BinaryOp, Constant, ExprPtr};
use crate::session::Session;
use crate::types::TypeId;
use abc_common::SourceSpan;

/// Operands after coercion together with the result type
#[derive(Debug, Clone)]
pub struct BinaryResult {
    pub left: ExprPtr,
    pub right: ExprPtr,
    pub ty: TypeId,
}

pub fn binary(
    session: &mut Session,
    op: BinaryOp,
    left: ExprPtr,
    right: ExprPtr,
    span: &SourceSpan,
) -> Result<BinaryResult, SemanticError> {
    if op.is_assignment() {
        if is_read_only(&session.types, left.ty) {
            return Err(SemanticError::ReadOnlyAssignment {
                expr: text(session, &left),
                span: left.span.clone(),
            });
        }
        if !left.is_lvalue() {
            return Err(SemanticError::NotAnLvalue {
                expr: text(session, &left),
                span: left.span.clone(),
            });
        }
    }

    let result = dispatch(session, op, left, right, span)?;

    // Only a division that would be folded is rejected; with a runtime
    // dividend the fault belongs to the running program
    if matches!(op, BinaryOp::Div | BinaryOp::Mod)
        && session.types.is_integer(result.right.ty)
        && result.left.is_constant(&session.types)
        && result.right.constant(&session.types) == Some(Constant::Integer(0))
    {
        return Err(SemanticError::DivisionByZero {
            span: result.right.span.clone(),
        });
    }

    log::debug!(
        "binary '{}' on '{}' and '{}' has type '{}'",
        op,
        session.types.name(result.left.ty),
        session.types.name(result.right.ty),
        session.types.name(result.ty)
    );
    Ok(result)
}

fn dispatch(
    session: &mut Session,
    op: BinaryOp,
    left: ExprPtr,
    right: ExprPtr,
    span: &SourceSpan,
) -> Result<BinaryResult, SemanticError> {
    let types = &session.types;
    if types.is_struct(left.ty) || types.is_struct(right.ty) {
        struct_rules(session, op, left, right, span)
    } else if types.is_array(left.ty) || types.is_array(right.ty) {
        array_rules(session, op, left, right, span)
    } else if types.is_function(left.ty) || types.is_function(right.ty) {
        let left = decay(session, left);
        let right = decay(session, right);
        dispatch(session, op, left, right, span)
    } else if types.is_pointer(left.ty) || types.is_pointer(right.ty) {
        pointer_rules(session, op, left, right, span)
    } else if types.is_arithmetic(left.ty) && types.is_arithmetic(right.ty) {
        arithmetic_rules(session, op, left, right, span)
    } else {
        Err(invalid_operands(session, op, &left, &right, span))
    }
}

pub(super) fn invalid_operands(
    session: &Session,
    op: BinaryOp,
    left: &ExprPtr,
    right: &ExprPtr,
    span: &SourceSpan,
) -> SemanticError {
    SemanticError::InvalidOperands {
        op: op.to_string(),
        left: session.types.name(left.ty),
        right: session.types.name(right.ty),
        span: span.clone(),
    }
}

/// Convert `right` to the type of `left` for an assignment, rejecting
/// with the operator error when no implicit conversion exists
fn assigned_value(
    session: &mut Session,
    op: BinaryOp,
    left: &ExprPtr,
    right: ExprPtr,
    span: &SourceSpan,
) -> Result<ExprPtr, SemanticError> {
    let convertible = (session.types.is_function(right.ty) && session.types.is_pointer(left.ty))
        || session.types.implicit_convert(right.ty, left.ty).is_some();
    if !convertible {
        return Err(invalid_operands(session, op, left, &right, span));
    }
    implicit_cast(session, right, left.ty)
}

fn struct_rules(
    session: &mut Session,
    op: BinaryOp,
    left: ExprPtr,
    right: ExprPtr,
    span: &SourceSpan,
) -> Result<BinaryResult, SemanticError> {
    if op != BinaryOp::Assign {
        return Err(invalid_operands(session, op, &left, &right, span));
    }
    let right = assigned_value(session, op, &left, right, span)?;
    let ty = left.ty;
    Ok(BinaryResult { left, right, ty })
}

fn array_rules(
    session: &mut Session,
    op: BinaryOp,
    left: ExprPtr,
    right: ExprPtr,
    span: &SourceSpan,
) -> Result<BinaryResult, SemanticError> {
    match op {
        BinaryOp::Index if session.types.is_array(left.ty) => {
            if !is_integral(&session.types, right.ty) {
                return Err(SemanticError::IntegerExpected {
                    span: right.span.clone(),
                });
            }
            let element = require_sized_pointee(session, left.ty, span)?;
            let right = offset(session, right)?;
            Ok(BinaryResult { left, right, ty: element })
        }
        BinaryOp::Assign if session.types.is_pointer(left.ty) && session.types.is_array(right.ty) => {
            let right = decay(session, right);
            dispatch(session, op, left, right, span)
        }
        BinaryOp::Assign if session.types.is_array(left.ty) && session.types.is_array(right.ty) => {
            // Whole arrays are copied only between identical array types
            if !same_array_type(session, left.ty, right.ty) {
                return Err(invalid_operands(session, op, &left, &right, span));
            }
            let right = assigned_value(session, op, &left, right, span)?;
            let ty = left.ty;
            Ok(BinaryResult { left, right, ty })
        }
        _ if op.is_assignment() => Err(invalid_operands(session, op, &left, &right, span)),
        _ => {
            let left = decay(session, left);
            let right = decay(session, right);
            dispatch(session, op, left, right, span)
        }
    }
}

/// Equal dimension and equal element type, ignoring const on the elements
fn same_array_type(session: &mut Session, a: TypeId, b: TypeId) -> bool {
    let types = &mut session.types;
    match (types.ref_type(a), types.ref_type(b)) {
        (Some(x), Some(y)) => types.dim(a) == types.dim(b) && types.equals_unqualified(x, y),
        _ => false,
    }
}

fn pointer_rules(
    session: &mut Session,
    op: BinaryOp,
    left: ExprPtr,
    right: ExprPtr,
    span: &SourceSpan,
) -> Result<BinaryResult, SemanticError> {
    // Integer on the left of an addition: use the pointer as base
    let (left, right) = if op == BinaryOp::Add && !session.types.is_pointer(left.ty) {
        (right, left)
    } else {
        (left, right)
    };
    let left_pointer = session.types.is_pointer(left.ty);
    let right_pointer = session.types.is_pointer(right.ty);
    let right_integral = is_integral(&session.types, right.ty);
    let right_integer = session.types.is_integer(right.ty);

    match op {
        BinaryOp::Assign => {
            let right = assigned_value(session, op, &left, right, span)?;
            let ty = left.ty;
            Ok(BinaryResult { left, right, ty })
        }
        BinaryOp::AddAssign | BinaryOp::SubAssign if left_pointer && right_integer => {
            require_sized_pointee(session, left.ty, span)?;
            let right = offset(session, right)?;
            let ty = left.ty;
            Ok(BinaryResult { left, right, ty })
        }
        BinaryOp::Add | BinaryOp::Sub if left_pointer && right_integer => {
            require_sized_pointee(session, left.ty, span)?;
            let right = offset(session, right)?;
            let ty = session.types.get_const_removed(left.ty);
            Ok(BinaryResult { left, right, ty })
        }
        BinaryOp::Sub if left_pointer && right_pointer => {
            let compatible = match (session.types.ref_type(left.ty), session.types.ref_type(right.ty)) {
                (Some(a), Some(b)) => session.types.equals_unqualified(a, b),
                _ => false,
            };
            if !compatible {
                return Err(invalid_operands(session, op, &left, &right, span));
            }
            require_sized_pointee(session, left.ty, span)?;
            let ty = session.types.signed(64);
            Ok(BinaryResult { left, right, ty })
        }
        _ if op.is_comparison() && left_pointer && right_pointer => {
            let ty = session.types.bool_type();
            Ok(BinaryResult { left, right, ty })
        }
        BinaryOp::LogicalAnd | BinaryOp::LogicalOr => logical(session, op, left, right, span),
        BinaryOp::Index if left_pointer => {
            if !right_integral {
                return Err(SemanticError::IntegerExpected {
                    span: right.span.clone(),
                });
            }
            if left.is_null_pointer_value(&session.types) {
                return Err(SemanticError::NullDereference {
                    span: left.span.clone(),
                });
            }
            let element = require_sized_pointee(session, left.ty, span)?;
            let right = offset(session, right)?;
            Ok(BinaryResult { left, right, ty: element })
        }
        BinaryOp::Index => Err(SemanticError::IntegerExpected {
            span: right.span.clone(),
        }),
        _ => Err(invalid_operands(session, op, &left, &right, span)),
    }
}

/// Element offsets are computed in the platform size type
fn offset(session: &mut Session, index: ExprPtr) -> Result<ExprPtr, SemanticError> {
    let size_type = session.types.size_type();
    implicit_cast(session, index, size_type)
}

/// Both operands of `&&` and `||` become bool
fn logical(
    session: &mut Session,
    op: BinaryOp,
    left: ExprPtr,
    right: ExprPtr,
    span: &SourceSpan,
) -> Result<BinaryResult, SemanticError> {
    let ty = session.types.bool_type();
    let convertible = session.types.implicit_convert(left.ty, ty).is_some()
        && session.types.implicit_convert(right.ty, ty).is_some();
    if !convertible {
        return Err(invalid_operands(session, op, &left, &right, span));
    }
    let left = implicit_cast(session, left, ty)?;
    let right = implicit_cast(session, right, ty)?;
    Ok(BinaryResult { left, right, ty })
}

fn arithmetic_rules(
    session: &mut Session,
    op: BinaryOp,
    left: ExprPtr,
    right: ExprPtr,
    span: &SourceSpan,
) -> Result<BinaryResult, SemanticError> {
    let either_float = session.types.is_float(left.ty) || session.types.is_float(right.ty);
    match op {
        BinaryOp::Assign => {
            let right = assigned_value(session, op, &left, right, span)?;
            let ty = left.ty;
            Ok(BinaryResult { left, right, ty })
        }
        BinaryOp::ModAssign if either_float => Err(invalid_operands(session, op, &left, &right, span)),
        BinaryOp::AddAssign
        | BinaryOp::SubAssign
        | BinaryOp::MulAssign
        | BinaryOp::DivAssign
        | BinaryOp::ModAssign => {
            let right = assigned_value(session, op, &left, right, span)?;
            let ty = left.ty;
            Ok(BinaryResult { left, right, ty })
        }
        BinaryOp::Mod if either_float => Err(invalid_operands(session, op, &left, &right, span)),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            let common = common_type(session, op, &left, &right, span)?;
            // bool operands compute in int
            let ty = if session.types.is_bool(common) {
                session.types.signed(32)
            } else {
                common
            };
            let left = implicit_cast(session, left, ty)?;
            let right = implicit_cast(session, right, ty)?;
            Ok(BinaryResult { left, right, ty })
        }
        _ if op.is_comparison() => {
            let common = common_type(session, op, &left, &right, span)?;
            let left = implicit_cast(session, left, common)?;
            let right = implicit_cast(session, right, common)?;
            let ty = session.types.bool_type();
            Ok(BinaryResult { left, right, ty })
        }
        BinaryOp::LogicalAnd | BinaryOp::LogicalOr => logical(session, op, left, right, span),
        _ => Err(invalid_operands(session, op, &left, &right, span)),
    }
}

/// Common type of two arithmetic operands, unqualified
fn common_type(
    session: &mut Session,
    op: BinaryOp,
    left: &ExprPtr,
    right: &ExprPtr,
    span: &SourceSpan,
) -> Result<TypeId, SemanticError> {
    let plain_left = session.types.get_const_removed(left.ty);
    let plain_right = session.types.get_const_removed(right.ty);
    session
        .types
        .common(plain_left, plain_right)
        .ok_or_else(|| invalid_operands(session, op, left, right, span))
}
