//! Function call rules

use super::{decay, implicit_cast, text, SemanticError};
use crate::expr::{Expr, ExprKind, ExprPtr, UnaryOp};
use crate::session::Session;
use crate::types::TypeId;
use abc_common::SourceSpan;

#[derive(Debug, Clone)]
pub struct CallResult {
    pub callee: ExprPtr,
    pub args: Vec<ExprPtr>,
    pub ty: TypeId,
}

/// Check a call against the callee's signature
///
/// Fixed parameters convert their argument implicitly. Arguments passed
/// through the variadic tail only decay.
pub fn call(
    session: &mut Session,
    callee: ExprPtr,
    args: Vec<ExprPtr>,
    span: &SourceSpan,
) -> Result<CallResult, SemanticError> {
    // Calls through a function pointer dereference it first
    let callee = match session.types.ref_type(callee.ty) {
        Some(pointee) if session.types.is_pointer(callee.ty) && session.types.is_function(pointee) => {
            let callee_span = callee.span.clone();
            Expr::new(
                ExprKind::Unary { op: UnaryOp::Dereference, child: callee },
                pointee,
                callee_span,
            )
        }
        _ => callee,
    };
    if !session.types.is_function(callee.ty) {
        return Err(SemanticError::NotAFunction {
            expr: text(session, &callee),
            ty: session.types.name(callee.ty),
            span: callee.span.clone(),
        });
    }

    let params = session.types.param_types(callee.ty).to_vec();
    if args.len() < params.len() {
        return Err(SemanticError::TooFewArguments { span: span.clone() });
    }
    if args.len() > params.len() && !session.types.has_varg(callee.ty) {
        return Err(SemanticError::TooManyArguments { span: span.clone() });
    }

    let mut converted = Vec::with_capacity(args.len());
    for (i, arg) in args.into_iter().enumerate() {
        let arg = match params.get(i) {
            Some(param) => implicit_cast(session, arg, *param)?,
            None if session.types.is_array(arg.ty) => decay(session, arg),
            None => arg,
        };
        converted.push(arg);
    }

    let ty = session.types.ret_type(callee.ty).unwrap_or(callee.ty);
    log::debug!(
        "call to '{}' with {} argument(s) returns '{}'",
        text(session, &callee),
        converted.len(),
        session.types.name(ty)
    );
    Ok(CallResult { callee, args: converted, ty })
}
