//! Node constructors
//!
//! Each constructor runs the applicable promotion rule and only builds the
//! node once the rule accepted it. Rejections go through the session's
//! failure policy.

use super::{Expr, ExprKind, ExprPtr, Literal, UnaryOp};
use crate::expr::BinaryOp;
use crate::promotion::{self, SemanticError};
use crate::session::Session;
use crate::types::{FloatWidth, TypeId, TypeKind};
use abc_common::{CompilerError, SourceSpan};

impl Expr {
    /// Integer literal of type i32, or i64 when the value does not fit
    pub fn integer_literal(session: &mut Session, value: i64, span: SourceSpan) -> ExprPtr {
        let ty = if i32::try_from(value).is_ok() {
            session.types.signed(32)
        } else {
            session.types.signed(64)
        };
        Expr::new(ExprKind::Literal(Literal::Integer(value)), ty, span)
    }

    /// Integer literal with an explicit integer type (suffixed literals)
    pub fn typed_integer_literal(
        session: &mut Session,
        value: i64,
        ty: TypeId,
        span: SourceSpan,
    ) -> Result<ExprPtr, CompilerError> {
        if !session.types.is_integer(ty) {
            let err = SemanticError::InvalidConversion {
                from: "integer literal".to_string(),
                to: session.types.name(ty),
                span,
            };
            return Err(session.reject(err));
        }
        Ok(Expr::new(ExprKind::Literal(Literal::Integer(value)), ty, span))
    }

    pub fn float_literal(session: &mut Session, value: f64, width: FloatWidth, span: SourceSpan) -> ExprPtr {
        let ty = session.types.float(width);
        Expr::new(ExprKind::Literal(Literal::Float(value)), ty, span)
    }

    pub fn bool_literal(session: &mut Session, value: bool, span: SourceSpan) -> ExprPtr {
        let ty = session.types.bool_type();
        Expr::new(ExprKind::Literal(Literal::Bool(value)), ty, span)
    }

    pub fn nullptr_literal(session: &mut Session, span: SourceSpan) -> ExprPtr {
        let ty = session.types.null_pointer();
        Expr::new(ExprKind::Literal(Literal::Nullptr), ty, span)
    }

    /// String literal of type `const u8[len + 1]`
    pub fn string_literal(session: &mut Session, text: &str, span: SourceSpan) -> ExprPtr {
        let byte = session.types.unsigned(8);
        let element = session.types.get_const(byte);
        let ty = session.types.array(element, text.len() as u64 + 1);
        Expr::new(ExprKind::Literal(Literal::String(text.to_string())), ty, span)
    }

    pub fn identifier(session: &mut Session, name: &str, span: SourceSpan) -> Result<ExprPtr, CompilerError> {
        let found = session
            .lookup(name)
            .map(|symbol| (symbol.id, symbol.value.clone()));
        let Some((symbol, binding)) = found else {
            let err = SemanticError::UndeclaredIdentifier {
                name: name.to_string(),
                span,
            };
            return Err(session.reject(err));
        };
        Ok(Expr::new(
            ExprKind::Identifier {
                name: name.to_string(),
                symbol,
                storage: binding.storage,
                value: binding.value,
            },
            binding.ty,
            span,
        ))
    }

    pub fn unary(session: &mut Session, op: UnaryOp, child: ExprPtr, span: SourceSpan) -> Result<ExprPtr, CompilerError> {
        let result = promotion::unary(session, op, child, &span);
        let promoted = session.check(result)?;
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                child: promoted.child,
            },
            promoted.ty,
            span,
        ))
    }

    pub fn binary(
        session: &mut Session,
        op: BinaryOp,
        left: ExprPtr,
        right: ExprPtr,
        span: SourceSpan,
    ) -> Result<ExprPtr, CompilerError> {
        let result = promotion::binary(session, op, left, right, &span);
        let promoted = session.check(result)?;
        Ok(Expr::new(
            ExprKind::Binary {
                op,
                left: promoted.left,
                right: promoted.right,
            },
            promoted.ty,
            span,
        ))
    }

    /// `cond ? then_expr : else_expr`
    pub fn conditional(
        session: &mut Session,
        cond: ExprPtr,
        then_expr: ExprPtr,
        else_expr: ExprPtr,
        span: SourceSpan,
    ) -> Result<ExprPtr, CompilerError> {
        let bool_ty = session.types.bool_type();
        let cond = promotion::implicit_cast(session, cond, bool_ty);
        let cond = session.check(cond)?;

        let ty = if session.types.is_void(then_expr.ty) && session.types.is_void(else_expr.ty) {
            Some(then_expr.ty)
        } else {
            let a = session.types.get_const_removed(then_expr.ty);
            let b = session.types.get_const_removed(else_expr.ty);
            session.types.common(a, b)
        };
        let Some(ty) = ty else {
            let err = SemanticError::InvalidOperands {
                op: "?:".to_string(),
                left: session.types.name(then_expr.ty),
                right: session.types.name(else_expr.ty),
                span,
            };
            return Err(session.reject(err));
        };

        let then_expr = promotion::implicit_cast(session, then_expr, ty);
        let then_expr = session.check(then_expr)?;
        let else_expr = promotion::implicit_cast(session, else_expr, ty);
        let else_expr = session.check(else_expr)?;
        Ok(Expr::new(
            ExprKind::Conditional {
                cond,
                then_expr,
                else_expr,
            },
            ty,
            span,
        ))
    }

    pub fn call(
        session: &mut Session,
        callee: ExprPtr,
        args: Vec<ExprPtr>,
        span: SourceSpan,
    ) -> Result<ExprPtr, CompilerError> {
        let result = promotion::call(session, callee, args, &span);
        let promoted = session.check(result)?;
        Ok(Expr::new(
            ExprKind::Call {
                callee: promoted.callee,
                args: promoted.args,
            },
            promoted.ty,
            span,
        ))
    }

    /// `object.member`; members of a const object are const
    pub fn member(
        session: &mut Session,
        object: ExprPtr,
        member: &str,
        span: SourceSpan,
    ) -> Result<ExprPtr, CompilerError> {
        if !session.types.is_struct(object.ty) {
            let err = SemanticError::NotAStruct {
                ty: session.types.name(object.ty),
                span,
            };
            return Err(session.reject(err));
        }
        let lookup = session
            .types
            .member_index(object.ty, member)
            .and_then(|index| Ok((index, session.types.members(object.ty)?[index].ty)))
            .map_err(|error| SemanticError::Type {
                error,
                span: span.clone(),
            });
        let (index, member_ty) = session.check(lookup)?;

        let ty = if session.types.is_const(object.ty) {
            session.types.get_const(member_ty)
        } else {
            member_ty
        };
        Ok(Expr::new(
            ExprKind::Member {
                object,
                member: member.to_string(),
                index,
            },
            ty,
            span,
        ))
    }

    /// `pointer->member`, built as a member of the dereferenced pointer
    pub fn arrow(
        session: &mut Session,
        pointer: ExprPtr,
        member: &str,
        span: SourceSpan,
    ) -> Result<ExprPtr, CompilerError> {
        let object = Expr::unary(session, UnaryOp::Dereference, pointer, span.clone())?;
        Expr::member(session, object, member, span)
    }

    /// `(to) child` written in the source
    pub fn cast(session: &mut Session, child: ExprPtr, to: TypeId, span: SourceSpan) -> Result<ExprPtr, CompilerError> {
        let result = promotion::explicit_cast(session, child, to, &span);
        session.check(result)
    }

    /// Conversion inserted where a value of type `to` is required
    pub fn implicit_cast(session: &mut Session, child: ExprPtr, to: TypeId) -> Result<ExprPtr, CompilerError> {
        let result = promotion::implicit_cast(session, child, to);
        session.check(result)
    }

    /// Brace initializer for an object of type `ty`
    ///
    /// Elements are converted to the element or member types. An unbound
    /// array type takes its dimension from the number of elements.
    pub fn aggregate(
        session: &mut Session,
        elements: Vec<ExprPtr>,
        ty: TypeId,
        span: SourceSpan,
    ) -> Result<ExprPtr, CompilerError> {
        let targets: Vec<TypeId> = match session.types.kind(ty).clone() {
            TypeKind::Array { element, dim } => {
                let count = if dim == 0 {
                    elements.len()
                } else {
                    usize::try_from(dim).map_or(elements.len(), |dim| dim.min(elements.len() + 1))
                };
                vec![element; count]
            }
            TypeKind::Struct(_) => {
                let members = session
                    .types
                    .members(ty)
                    .map(|members| members.iter().map(|m| m.ty).collect())
                    .map_err(|error| SemanticError::Type {
                        error,
                        span: span.clone(),
                    });
                session.check(members)?
            }
            _ => vec![ty],
        };

        if elements.len() > targets.len() {
            let err = SemanticError::TooManyInitializers {
                ty: session.types.name(ty),
                span,
            };
            return Err(session.reject(err));
        }

        let mut converted = Vec::with_capacity(elements.len());
        for (element, target) in elements.into_iter().zip(targets) {
            let element = promotion::implicit_cast(session, element, target);
            converted.push(session.check(element)?);
        }

        let ty = if session.types.is_unbound_array(ty) {
            session.types.patch_unbound_array(ty, converted.len() as u64)
        } else {
            ty
        };
        Ok(Expr::new(ExprKind::AggregateVector { elements: converted }, ty, span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Constant;

    fn span() -> SourceSpan {
        SourceSpan::dummy()
    }

    #[test]
    fn test_integer_literal_width() {
        let mut session = Session::collecting();
        let small = Expr::integer_literal(&mut session, 7, span());
        let large = Expr::integer_literal(&mut session, 1 << 40, span());
        assert_eq!(session.types.name(small.ty), "i32");
        assert_eq!(session.types.name(large.ty), "i64");
    }

    #[test]
    fn test_string_literal_type() {
        let mut session = Session::collecting();
        let s = Expr::string_literal(&mut session, "hello", span());
        assert_eq!(session.types.name(s.ty), "const u8[6]");
        assert!(s.has_address());
        assert!(!s.is_lvalue());
    }

    #[test]
    fn test_undeclared_identifier() {
        let mut session = Session::collecting();
        let err = Expr::identifier(&mut session, "nope", span()).unwrap_err();
        assert_eq!(err.message(), "undeclared identifier 'nope'");
    }

    #[test]
    fn test_conditional_uses_common_type() {
        let mut session = Session::collecting();
        let cond = Expr::bool_literal(&mut session, true, span());
        let a = Expr::integer_literal(&mut session, 1, span());
        let b = Expr::float_literal(&mut session, 2.5, FloatWidth::F64, span());
        let e = Expr::conditional(&mut session, cond, a, b, span()).unwrap();
        assert_eq!(session.types.name(e.ty), "f64");
        assert_eq!(e.constant(&session.types), Some(Constant::Float(1.0)));
    }

    #[test]
    fn test_aggregate_patches_unbound_array() {
        let mut session = Session::collecting();
        let i32_ty = session.types.signed(32);
        let unbound = session.types.array(i32_ty, 0);
        let elements = (1..=3)
            .map(|v| Expr::integer_literal(&mut session, v, span()))
            .collect();
        let e = Expr::aggregate(&mut session, elements, unbound, span()).unwrap();
        assert_eq!(session.types.name(e.ty), "i32[3]");
        assert_eq!(
            e.constant(&session.types),
            Some(Constant::Aggregate(vec![
                Constant::Integer(1),
                Constant::Integer(2),
                Constant::Integer(3)
            ]))
        );
    }

    #[test]
    fn test_aggregate_rejects_surplus() {
        let mut session = Session::collecting();
        let i32_ty = session.types.signed(32);
        let arr = session.types.array(i32_ty, 1);
        let elements = vec![
            Expr::integer_literal(&mut session, 1, span()),
            Expr::integer_literal(&mut session, 2, span()),
        ];
        let err = Expr::aggregate(&mut session, elements, arr, span()).unwrap_err();
        assert_eq!(err.message(), "too many initializers for 'i32[1]'");
    }

    #[test]
    fn test_member_of_const_struct_is_const() {
        let mut session = Session::collecting();
        let i32_ty = session.types.signed(32);
        let s = session.declare_struct("S", span()).unwrap();
        session
            .complete_struct(s, vec![("x".to_string(), i32_ty)], span())
            .unwrap();
        let const_s = session.types.get_const(s);
        let one = Expr::integer_literal(&mut session, 1, span());
        let init = Expr::aggregate(&mut session, vec![one], s, span()).unwrap();
        session.declare_variable("v", const_s, Some(init), span()).unwrap();

        let v = Expr::identifier(&mut session, "v", span()).unwrap();
        let x = Expr::member(&mut session, v, "x", span()).unwrap();
        assert!(session.types.is_const(x.ty));
        assert_eq!(x.display(&session.types).to_string(), "v.x");

        let v = Expr::identifier(&mut session, "v", span()).unwrap();
        let err = Expr::member(&mut session, v, "y", span()).unwrap_err();
        assert_eq!(err.message(), "struct S has no member 'y'");
    }
}
