//! Expression nodes
//!
//! Expressions are immutable, fully typed trees. A node is only created by
//! the constructors in `build`, after the promotion rules accepted its
//! operands and fixed its type; no node with an unresolved type exists.
//!
//! Children are shared through [`ExprPtr`]. A `Proxy` node refers to a node
//! that is owned elsewhere, so the same sub-expression can be evaluated or
//! addressed again without rebuilding it.

mod build;
mod fold;
pub mod ops;

pub use fold::Constant;
pub(crate) use fold::wrap as fold_wrap;
pub use ops::{BinaryOp, UnaryOp};

use crate::types::{TypeId, TypeTable};
use abc_common::{HasSpan, SourceSpan, SymbolId};
use std::fmt;
use std::rc::Rc;

pub type ExprPtr = Rc<Expr>;

/// Where the object an identifier names lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Global,
    Local,
    Function,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Nullptr,
    /// Text without the terminating zero byte
    String(String),
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    Identifier {
        name: String,
        symbol: SymbolId,
        storage: Storage,
        /// Initializer of a read-only variable with a constant value
        value: Option<ExprPtr>,
    },
    Proxy(ExprPtr),
    Unary {
        op: UnaryOp,
        child: ExprPtr,
    },
    Binary {
        op: BinaryOp,
        left: ExprPtr,
        right: ExprPtr,
    },
    Conditional {
        cond: ExprPtr,
        then_expr: ExprPtr,
        else_expr: ExprPtr,
    },
    Call {
        callee: ExprPtr,
        args: Vec<ExprPtr>,
    },
    Member {
        object: ExprPtr,
        member: String,
        index: usize,
    },
    AggregateVector {
        elements: Vec<ExprPtr>,
    },
}

/// A type-resolved expression
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: TypeId,
    pub span: SourceSpan,
}

impl HasSpan for Expr {
    fn span(&self) -> &SourceSpan {
        &self.span
    }
}

impl Expr {
    pub(crate) fn new(kind: ExprKind, ty: TypeId, span: SourceSpan) -> ExprPtr {
        Rc::new(Expr { kind, ty, span })
    }

    /// Refer to `target` without owning a copy of it
    pub fn proxy(target: &ExprPtr, span: SourceSpan) -> ExprPtr {
        Expr::new(ExprKind::Proxy(Rc::clone(target)), target.ty, span)
    }

    /// Whether the expression denotes a storage location
    pub fn has_address(&self) -> bool {
        match &self.kind {
            ExprKind::Identifier { .. } => true,
            ExprKind::Literal(Literal::String(_)) => true,
            ExprKind::Proxy(target) => target.has_address(),
            ExprKind::Unary { op, .. } => *op == UnaryOp::Dereference,
            ExprKind::Binary { op, .. } => *op == BinaryOp::Index,
            ExprKind::Member { object, .. } => object.has_address(),
            ExprKind::Literal(_)
            | ExprKind::Conditional { .. }
            | ExprKind::Call { .. }
            | ExprKind::AggregateVector { .. } => false,
        }
    }

    /// Whether the expression may appear on the left of an assignment
    /// (const qualification is checked separately)
    pub fn is_lvalue(&self) -> bool {
        match &self.kind {
            ExprKind::Identifier { storage, .. } => *storage != Storage::Function,
            ExprKind::Proxy(target) => target.is_lvalue(),
            ExprKind::Unary { op, .. } => *op == UnaryOp::Dereference,
            ExprKind::Binary { op, .. } => *op == BinaryOp::Index,
            ExprKind::Member { object, .. } => object.is_lvalue(),
            ExprKind::Literal(_)
            | ExprKind::Conditional { .. }
            | ExprKind::Call { .. }
            | ExprKind::AggregateVector { .. } => false,
        }
    }

    /// Follow proxies to the node doing the work
    pub fn resolve(&self) -> &Expr {
        match &self.kind {
            ExprKind::Proxy(target) => target.resolve(),
            _ => self,
        }
    }

    /// Flat source-like rendering used in diagnostics
    pub fn display<'a>(&'a self, types: &'a TypeTable) -> ExprDisplay<'a> {
        ExprDisplay { expr: self, types }
    }

    fn fmt_operand(&self, types: &TypeTable, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let needs_parens = match &self.resolve().kind {
            ExprKind::Binary { op, .. } => *op != BinaryOp::Index,
            ExprKind::Conditional { .. } => true,
            ExprKind::Unary { op: UnaryOp::Cast, child } => {
                matches!(child.resolve().kind, ExprKind::Binary { op, .. } if op != BinaryOp::Index)
                    || matches!(child.resolve().kind, ExprKind::Conditional { .. })
            }
            _ => false,
        };
        if needs_parens {
            write!(f, "(")?;
            self.fmt_flat(types, f)?;
            write!(f, ")")
        } else {
            self.fmt_flat(types, f)
        }
    }

    fn fmt_flat(&self, types: &TypeTable, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Literal(Literal::Integer(value)) => write!(f, "{value}"),
            ExprKind::Literal(Literal::Float(value)) => write!(f, "{value:?}"),
            ExprKind::Literal(Literal::Bool(value)) => write!(f, "{value}"),
            ExprKind::Literal(Literal::Nullptr) => write!(f, "nullptr"),
            ExprKind::Literal(Literal::String(text)) => write!(f, "{text:?}"),
            ExprKind::Identifier { name, .. } => write!(f, "{name}"),
            ExprKind::Proxy(target) => target.fmt_flat(types, f),
            ExprKind::Unary { op: UnaryOp::Cast, child } => child.fmt_flat(types, f),
            ExprKind::Unary { op: UnaryOp::ExplicitCast, child } => {
                write!(f, "({})", types.display(self.ty))?;
                child.fmt_operand(types, f)
            }
            ExprKind::Unary { op, child } if op.is_postfix() => {
                child.fmt_operand(types, f)?;
                write!(f, "{op}")
            }
            ExprKind::Unary { op, child } => {
                write!(f, "{op}")?;
                child.fmt_operand(types, f)
            }
            ExprKind::Binary { op: BinaryOp::Index, left, right } => {
                left.fmt_operand(types, f)?;
                write!(f, "[")?;
                right.fmt_flat(types, f)?;
                write!(f, "]")
            }
            ExprKind::Binary { op, left, right } => {
                left.fmt_operand(types, f)?;
                write!(f, " {op} ")?;
                right.fmt_operand(types, f)
            }
            ExprKind::Conditional { cond, then_expr, else_expr } => {
                cond.fmt_operand(types, f)?;
                write!(f, " ? ")?;
                then_expr.fmt_operand(types, f)?;
                write!(f, " : ")?;
                else_expr.fmt_operand(types, f)
            }
            ExprKind::Call { callee, args } => {
                callee.fmt_operand(types, f)?;
                write!(f, "(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    arg.fmt_flat(types, f)?;
                }
                write!(f, ")")
            }
            ExprKind::Member { object, member, .. } => match &object.resolve().kind {
                ExprKind::Unary { op: UnaryOp::Dereference, child } => {
                    child.fmt_operand(types, f)?;
                    write!(f, "->{member}")
                }
                _ => {
                    object.fmt_operand(types, f)?;
                    write!(f, ".{member}")
                }
            },
            ExprKind::AggregateVector { elements } => {
                write!(f, "{{")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    element.fmt_flat(types, f)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Helper returned by [`Expr::display`]
pub struct ExprDisplay<'a> {
    expr: &'a Expr,
    types: &'a TypeTable,
}

impl fmt::Display for ExprDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.expr.fmt_flat(self.types, f)
    }
}
