//! Unary operator rules

use super::{decay, is_integral, is_read_only, require_sized_pointee, text, SemanticError};
use crate::expr::{ExprPtr, UnaryOp};
use crate::session::Session;
use crate::types::TypeId;
use abc_common::SourceSpan;

#[derive(Debug, Clone)]
pub struct UnaryResult {
    pub child: ExprPtr,
    pub ty: TypeId,
}

pub fn unary(
    session: &mut Session,
    op: UnaryOp,
    child: ExprPtr,
    span: &SourceSpan,
) -> Result<UnaryResult, SemanticError> {
    let result = match op {
        UnaryOp::AddressOf => address_of(session, child),
        UnaryOp::Dereference => dereference(session, child, span),
        UnaryOp::PreIncrement | UnaryOp::PostIncrement | UnaryOp::PreDecrement | UnaryOp::PostDecrement => {
            step(session, op, child, span)
        }
        UnaryOp::LogicalNot => {
            if is_integral(&session.types, child.ty) {
                let ty = child.ty;
                Ok(UnaryResult { child, ty })
            } else if session.types.is_pointer(child.ty) {
                let ty = session.types.bool_type();
                Ok(UnaryResult { child, ty })
            } else {
                Err(invalid_operand(session, op, &child, span))
            }
        }
        UnaryOp::Minus => {
            if session.types.is_integer(child.ty) || session.types.is_float(child.ty) {
                let ty = session.types.get_const_removed(child.ty);
                Ok(UnaryResult { child, ty })
            } else {
                Err(invalid_operand(session, op, &child, span))
            }
        }
        // Conversions are built through implicit_cast and explicit_cast
        UnaryOp::Cast | UnaryOp::ExplicitCast => Err(invalid_operand(session, op, &child, span)),
    }?;

    log::debug!(
        "unary '{}' on '{}' has type '{}'",
        op,
        session.types.name(result.child.ty),
        session.types.name(result.ty)
    );
    Ok(result)
}

fn invalid_operand(session: &Session, op: UnaryOp, child: &ExprPtr, span: &SourceSpan) -> SemanticError {
    SemanticError::InvalidOperand {
        op: op.to_string(),
        operand: session.types.name(child.ty),
        span: span.clone(),
    }
}

fn address_of(session: &mut Session, child: ExprPtr) -> Result<UnaryResult, SemanticError> {
    if !child.has_address() {
        return Err(SemanticError::NotAddressable {
            expr: text(session, &child),
            span: child.span.clone(),
        });
    }
    let ty = session.types.pointer(child.ty);
    Ok(UnaryResult { child, ty })
}

fn dereference(session: &mut Session, child: ExprPtr, span: &SourceSpan) -> Result<UnaryResult, SemanticError> {
    let child = if session.types.is_array(child.ty) {
        decay(session, child)
    } else {
        child
    };
    if !session.types.is_pointer(child.ty) {
        return Err(invalid_operand(session, UnaryOp::Dereference, &child, span));
    }
    if child.is_null_pointer_value(&session.types) {
        return Err(SemanticError::NullDereference {
            span: child.span.clone(),
        });
    }
    let ty = match session.types.ref_type(child.ty) {
        Some(pointee) if !session.types.is_void(pointee) => pointee,
        Some(pointee) => {
            return Err(SemanticError::IncompleteType {
                ty: session.types.name(pointee),
                span: span.clone(),
            })
        }
        None => {
            return Err(SemanticError::NullDereference {
                span: child.span.clone(),
            })
        }
    };
    Ok(UnaryResult { child, ty })
}

/// Increment and decrement, prefix or postfix
fn step(session: &mut Session, op: UnaryOp, child: ExprPtr, span: &SourceSpan) -> Result<UnaryResult, SemanticError> {
    if is_read_only(&session.types, child.ty) {
        let expr = text(session, &child);
        let span = child.span.clone();
        return Err(if op.is_increment() {
            SemanticError::ReadOnlyIncrement { expr, span }
        } else {
            SemanticError::ReadOnlyDecrement { expr, span }
        });
    }
    if !child.is_lvalue() {
        return Err(SemanticError::NotAnLvalue {
            expr: text(session, &child),
            span: child.span.clone(),
        });
    }
    if session.types.is_pointer(child.ty) {
        require_sized_pointee(session, child.ty, span)?;
    } else if !session.types.is_integer(child.ty) {
        return Err(invalid_operand(session, op, &child, span));
    }
    let ty = child.ty;
    Ok(UnaryResult { child, ty })
}
