//! Promotion rules
//!
//! Operator and call specific semantic rules. Given the raw operands, each
//! rule either inserts the required conversions and fixes the result type,
//! or rejects the construct with a [`SemanticError`].

mod binary;
mod call;
pub mod errors;
mod unary;

pub use binary::{binary, BinaryResult};
pub use call::{call, CallResult};
pub use errors::SemanticError;
pub use unary::{unary, UnaryResult};

use crate::expr::{Constant, Expr, ExprKind, ExprPtr, UnaryOp};
use crate::session::Session;
use crate::types::{FloatWidth, TypeId, TypeKind, TypeTable};
use abc_common::SourceSpan;

/// Flat rendering of an expression for diagnostics
pub(crate) fn text(session: &Session, expr: &Expr) -> String {
    expr.display(&session.types).to_string()
}

/// Whether assignments through this type are forbidden
pub(crate) fn is_read_only(types: &TypeTable, ty: TypeId) -> bool {
    match types.kind(ty) {
        TypeKind::Array { element, .. } => types.is_const(ty) || is_read_only(types, *element),
        _ => types.is_const(ty),
    }
}

/// Bool or integer
pub(crate) fn is_integral(types: &TypeTable, ty: TypeId) -> bool {
    types.is_bool(ty) || types.is_integer(ty)
}

/// Arrays decay to a pointer to their first element, functions to a
/// pointer to the function. Other expressions are returned unchanged.
pub(crate) fn decay(session: &mut Session, expr: ExprPtr) -> ExprPtr {
    let target = match session.types.kind(expr.ty).clone() {
        TypeKind::Array { element, .. } => session.types.pointer(element),
        TypeKind::Function { .. } => session.types.pointer(expr.ty),
        _ => return expr,
    };
    let span = expr.span.clone();
    Expr::new(ExprKind::Unary { op: UnaryOp::Cast, child: expr }, target, span)
}

/// Implicit conversion of `expr` to `to`
///
/// Identity conversions insert no node. Conversions that discard const or
/// may change the value are reported as warnings.
pub fn implicit_cast(session: &mut Session, expr: ExprPtr, to: TypeId) -> Result<ExprPtr, SemanticError> {
    if session.types.equals(expr.ty, to) {
        return Ok(expr);
    }
    let expr = if session.types.is_function(expr.ty) && session.types.is_pointer(to) {
        decay(session, expr)
    } else {
        expr
    };

    let conversion = session.types.implicit_convert(expr.ty, to).ok_or_else(|| {
        SemanticError::InvalidConversion {
            from: session.types.name(expr.ty),
            to: session.types.name(to),
            span: expr.span.clone(),
        }
    })?;

    if conversion.discards_const {
        let message = format!(
            "conversion from '{}' to '{}' discards const qualifier",
            session.types.name(expr.ty),
            session.types.name(to)
        );
        session.warn(message, expr.span.clone());
    }
    if session.options().warn_narrowing && is_narrowing(&session.types, &expr, conversion.target) {
        let message = format!(
            "conversion from '{}' to '{}' may change value",
            session.types.name(expr.ty),
            session.types.name(to)
        );
        session.warn(message, expr.span.clone());
    }

    let span = expr.span.clone();
    Ok(Expr::new(
        ExprKind::Unary { op: UnaryOp::Cast, child: expr },
        conversion.target,
        span,
    ))
}

/// Explicit cast of `expr` to `to`
pub fn explicit_cast(
    session: &mut Session,
    expr: ExprPtr,
    to: TypeId,
    span: &SourceSpan,
) -> Result<ExprPtr, SemanticError> {
    let expr = if session.types.is_array(expr.ty) || session.types.is_function(expr.ty) {
        decay(session, expr)
    } else {
        expr
    };

    let conversion = session.types.explicit_cast(expr.ty, to).ok_or_else(|| {
        SemanticError::InvalidCast {
            from: session.types.name(expr.ty),
            to: session.types.name(to),
            span: span.clone(),
        }
    })?;
    if conversion.discards_const {
        let message = format!(
            "cast from '{}' to '{}' discards const qualifier",
            session.types.name(expr.ty),
            session.types.name(to)
        );
        session.warn(message, span.clone());
    }
    log::debug!(
        "explicit cast from '{}' to '{}'",
        session.types.name(expr.ty),
        session.types.name(conversion.target)
    );
    Ok(Expr::new(
        ExprKind::Unary { op: UnaryOp::ExplicitCast, child: expr },
        conversion.target,
        span.clone(),
    ))
}

/// A conversion to a narrower representation, unless the operand is a
/// constant that survives it unchanged
fn is_narrowing(types: &TypeTable, expr: &Expr, to: TypeId) -> bool {
    let narrower = match (types.kind(expr.ty), types.kind(to)) {
        (TypeKind::Integer { bits: from, .. }, TypeKind::Integer { bits: into, .. }) => into < from,
        (TypeKind::Float(_), TypeKind::Integer { .. }) => true,
        (TypeKind::Float(FloatWidth::F64), TypeKind::Float(FloatWidth::F32)) => true,
        _ => false,
    };
    if !narrower {
        return false;
    }
    match (expr.constant(types), types.kind(to)) {
        (Some(Constant::Integer(value)), TypeKind::Integer { bits, signed }) => {
            crate::expr::fold_wrap(value, *bits, *signed) != value
        }
        (Some(Constant::Float(value)), TypeKind::Float(FloatWidth::F32)) => {
            value as f32 as f64 != value
        }
        _ => true,
    }
}

/// Reject pointer arithmetic through a pointee without size
pub(crate) fn require_sized_pointee(
    session: &Session,
    pointer: TypeId,
    span: &SourceSpan,
) -> Result<TypeId, SemanticError> {
    let pointee = session.types.ref_type(pointer).ok_or_else(|| SemanticError::NullDereference {
        span: span.clone(),
    })?;
    if !session.types.has_size(pointee) {
        return Err(SemanticError::IncompleteType {
            ty: session.types.name(pointee),
            span: span.clone(),
        });
    }
    Ok(pointee)
}
