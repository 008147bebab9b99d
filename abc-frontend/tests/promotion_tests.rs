//! Operator typing and rejection through the expression constructors

use abc_common::SourceSpan;
use abc_frontend::expr::{BinaryOp, Expr, ExprKind, ExprPtr, UnaryOp};
use abc_frontend::session::Session;
use abc_frontend::types::{FloatWidth, TypeId};

fn span() -> SourceSpan {
    SourceSpan::dummy()
}

fn variable(session: &mut Session, name: &str, ty: TypeId, init: Option<ExprPtr>) -> ExprPtr {
    session.declare_variable(name, ty, init, span()).unwrap();
    Expr::identifier(session, name, span()).unwrap()
}

fn int(session: &mut Session, value: i64) -> ExprPtr {
    Expr::integer_literal(session, value, span())
}

#[test]
fn test_sum_of_two_ints() {
    let mut session = Session::collecting();
    let i32_ty = session.types.signed(32);
    let one = int(&mut session, 1);
    let two = int(&mut session, 2);
    let x = variable(&mut session, "x", i32_ty, Some(one));
    let y = variable(&mut session, "y", i32_ty, Some(two));

    let sum = Expr::binary(&mut session, BinaryOp::Add, x, y, span()).unwrap();
    assert_eq!(sum.ty, i32_ty);
    assert_eq!(session.reporter.error_count(), 0);
    assert_eq!(session.reporter.warning_count(), 0);
}

#[test]
fn test_assignment_to_const_variable() {
    let mut session = Session::collecting();
    let i32_ty = session.types.signed(32);
    let const_i32 = session.types.get_const(i32_ty);
    let one = int(&mut session, 1);
    let x = variable(&mut session, "x", const_i32, Some(one));

    let two = int(&mut session, 2);
    let err = Expr::binary(&mut session, BinaryOp::Assign, x, two, span()).unwrap_err();
    assert_eq!(err.message(), "assignment of read-only variable 'x'");
    assert_eq!(session.reporter.error_count(), 1);
}

#[test]
fn test_every_assignment_kind_rejects_const() {
    let mut session = Session::collecting();
    let i32_ty = session.types.signed(32);
    let const_i32 = session.types.get_const(i32_ty);
    let zero = int(&mut session, 0);
    let x = variable(&mut session, "x", const_i32, Some(zero));

    let ops = [
        BinaryOp::Assign,
        BinaryOp::AddAssign,
        BinaryOp::SubAssign,
        BinaryOp::MulAssign,
        BinaryOp::DivAssign,
        BinaryOp::ModAssign,
    ];
    for op in ops {
        let three = int(&mut session, 3);
        let err = Expr::binary(&mut session, op, x.clone(), three, span()).unwrap_err();
        assert!(err.message().starts_with("assignment of read-only variable"), "{}", op);
    }

    for op in [UnaryOp::PreIncrement, UnaryOp::PostIncrement] {
        let err = Expr::unary(&mut session, op, x.clone(), span()).unwrap_err();
        assert_eq!(err.message(), "increment of read-only variable 'x'");
    }
    for op in [UnaryOp::PreDecrement, UnaryOp::PostDecrement] {
        let err = Expr::unary(&mut session, op, x.clone(), span()).unwrap_err();
        assert_eq!(err.message(), "decrement of read-only variable 'x'");
    }
    assert_eq!(session.reporter.error_count(), ops.len() + 4);
}

#[test]
fn test_assignment_to_rvalue() {
    let mut session = Session::collecting();
    let one = int(&mut session, 1);
    let two = int(&mut session, 2);
    let err = Expr::binary(&mut session, BinaryOp::Assign, one, two, span()).unwrap_err();
    assert_eq!(err.message(), "'1' is not an lvalue");
}

#[test]
fn test_indexing_null_pointer_constant() {
    let mut session = Session::collecting();
    let u8_ty = session.types.unsigned(8);
    let ptr = session.types.pointer(u8_ty);
    let const_ptr = session.types.get_const(ptr);
    let null = Expr::nullptr_literal(&mut session, span());
    let p = variable(&mut session, "p", const_ptr, Some(null));

    let zero = int(&mut session, 0);
    let err = Expr::binary(&mut session, BinaryOp::Index, p, zero, span()).unwrap_err();
    assert_eq!(err.message(), "dereferencing nullptr");
}

#[test]
fn test_pointer_arithmetic_types() {
    let mut session = Session::collecting();
    let i32_ty = session.types.signed(32);
    let i64_ty = session.types.signed(64);
    let bool_ty = session.types.bool_type();
    let ptr = session.types.pointer(i32_ty);
    let p = variable(&mut session, "p", ptr, None);
    let q = variable(&mut session, "q", ptr, None);

    let one = int(&mut session, 1);
    let forward = Expr::binary(&mut session, BinaryOp::Add, p.clone(), one, span()).unwrap();
    assert_eq!(forward.ty, ptr);

    // The pointer operand moves to the left
    let one = int(&mut session, 1);
    let swapped = Expr::binary(&mut session, BinaryOp::Add, one, p.clone(), span()).unwrap();
    assert_eq!(swapped.ty, ptr);
    let ExprKind::Binary { left, .. } = &swapped.kind else {
        panic!("expected a binary node");
    };
    assert_eq!(left.ty, ptr);

    let diff = Expr::binary(&mut session, BinaryOp::Sub, p.clone(), q.clone(), span()).unwrap();
    assert_eq!(diff.ty, i64_ty);

    let less = Expr::binary(&mut session, BinaryOp::Less, p.clone(), q, span()).unwrap();
    assert_eq!(less.ty, bool_ty);

    let two = int(&mut session, 2);
    let element = Expr::binary(&mut session, BinaryOp::Index, p, two, span()).unwrap();
    assert_eq!(element.ty, i32_ty);
    assert_eq!(session.reporter.error_count(), 0);
}

#[test]
fn test_array_indexing() {
    let mut session = Session::collecting();
    let i32_ty = session.types.signed(32);
    let size_ty = session.types.size_type();
    let arr_ty = session.types.array(i32_ty, 4);
    let arr = variable(&mut session, "arr", arr_ty, None);

    let two = int(&mut session, 2);
    let element = Expr::binary(&mut session, BinaryOp::Index, arr.clone(), two, span()).unwrap();
    assert_eq!(element.ty, i32_ty);
    let ExprKind::Binary { right, .. } = &element.kind else {
        panic!("expected a binary node");
    };
    assert_eq!(right.ty, size_ty);

    let half = Expr::float_literal(&mut session, 0.5, FloatWidth::F64, span());
    let err = Expr::binary(&mut session, BinaryOp::Index, arr, half, span()).unwrap_err();
    assert_eq!(err.message(), "integer expression expected");
}

#[test]
fn test_void_pointer_use() {
    let mut session = Session::collecting();
    let void_ty = session.types.void_type();
    let void_ptr = session.types.pointer(void_ty);
    let v = variable(&mut session, "v", void_ptr, None);

    let one = int(&mut session, 1);
    let err = Expr::binary(&mut session, BinaryOp::Add, v.clone(), one, span()).unwrap_err();
    assert_eq!(err.message(), "use of incomplete type 'void'");

    let err = Expr::unary(&mut session, UnaryOp::Dereference, v, span()).unwrap_err();
    assert_eq!(err.message(), "use of incomplete type 'void'");
}

#[test]
fn test_unary_rules() {
    let mut session = Session::collecting();
    let u16_ty = session.types.unsigned(16);
    let bool_ty = session.types.bool_type();
    let u8_ty = session.types.unsigned(8);
    let ptr = session.types.pointer(u8_ty);
    let n = variable(&mut session, "n", u16_ty, None);
    let p = variable(&mut session, "p", ptr, None);

    let not_n = Expr::unary(&mut session, UnaryOp::LogicalNot, n.clone(), span()).unwrap();
    assert_eq!(not_n.ty, u16_ty);
    let not_p = Expr::unary(&mut session, UnaryOp::LogicalNot, p.clone(), span()).unwrap();
    assert_eq!(not_p.ty, bool_ty);

    let addr = Expr::unary(&mut session, UnaryOp::AddressOf, n.clone(), span()).unwrap();
    let n_ptr = session.types.pointer(u16_ty);
    assert_eq!(addr.ty, n_ptr);

    let minus = Expr::unary(&mut session, UnaryOp::Minus, n, span()).unwrap();
    assert_eq!(minus.ty, u16_ty);

    let step = Expr::unary(&mut session, UnaryOp::PostIncrement, p.clone(), span()).unwrap();
    assert_eq!(step.ty, ptr);

    let err = Expr::unary(&mut session, UnaryOp::Minus, p, span()).unwrap_err();
    assert!(err.message().starts_with("operator '-' can not be applied"));

    let seven = int(&mut session, 7);
    let err = Expr::unary(&mut session, UnaryOp::AddressOf, seven, span()).unwrap_err();
    assert_eq!(err.message(), "cannot take the address of '7'");
}

#[test]
fn test_call_arity() {
    let mut session = Session::collecting();
    let i32_ty = session.types.signed(32);
    let fn_ty = session.types.function(i32_ty, vec![i32_ty, i32_ty], false);
    session.declare_function("add", fn_ty, span()).unwrap();

    let callee = Expr::identifier(&mut session, "add", span()).unwrap();
    let one = int(&mut session, 1);
    let err = Expr::call(&mut session, callee.clone(), vec![one], span()).unwrap_err();
    assert_eq!(err.message(), "too few arguments to function");

    let args = vec![int(&mut session, 1), int(&mut session, 2), int(&mut session, 3)];
    let err = Expr::call(&mut session, callee.clone(), args, span()).unwrap_err();
    assert_eq!(err.message(), "too many arguments to function");

    let args = vec![int(&mut session, 1), int(&mut session, 2)];
    let call = Expr::call(&mut session, callee, args, span()).unwrap();
    assert_eq!(call.ty, i32_ty);
}

#[test]
fn test_variadic_arguments_decay() {
    let mut session = Session::collecting();
    let i32_ty = session.types.signed(32);
    let u8_ty = session.types.unsigned(8);
    let const_u8 = session.types.get_const(u8_ty);
    let format_ty = session.types.pointer(const_u8);
    let print_ty = session.types.function(i32_ty, vec![format_ty], true);
    session.declare_function("print", print_ty, span()).unwrap();

    let buffer_ty = session.types.array(u8_ty, 8);
    let buffer = variable(&mut session, "buffer", buffer_ty, None);
    let callee = Expr::identifier(&mut session, "print", span()).unwrap();
    let format = Expr::string_literal(&mut session, "%s %d", span());
    let count = int(&mut session, 3);

    let call = Expr::call(&mut session, callee, vec![format, buffer, count], span()).unwrap();
    let ExprKind::Call { args, .. } = &call.kind else {
        panic!("expected a call node");
    };
    assert_eq!(args[0].ty, format_ty);
    let u8_ptr = session.types.pointer(u8_ty);
    assert_eq!(args[1].ty, u8_ptr);
    assert_eq!(args[2].ty, i32_ty);
}

#[test]
fn test_call_through_function_pointer() {
    let mut session = Session::collecting();
    let void_ty = session.types.void_type();
    let fn_ty = session.types.function(void_ty, vec![], false);
    let fn_ptr = session.types.pointer(fn_ty);
    let handler = variable(&mut session, "handler", fn_ptr, None);

    let call = Expr::call(&mut session, handler, vec![], span()).unwrap();
    assert_eq!(call.ty, void_ty);

    let i32_ty = session.types.signed(32);
    let x = variable(&mut session, "x", i32_ty, None);
    let err = Expr::call(&mut session, x, vec![], span()).unwrap_err();
    assert_eq!(err.message(), "'x' is not a function (type 'i32')");
}

#[test]
fn test_operator_errors() {
    let mut session = Session::collecting();
    let f64_ty = session.types.float(FloatWidth::F64);
    let d = variable(&mut session, "d", f64_ty, None);

    let one = Expr::float_literal(&mut session, 1.0, FloatWidth::F64, span());
    let err = Expr::binary(&mut session, BinaryOp::Mod, d.clone(), one, span()).unwrap_err();
    assert_eq!(
        err.message(),
        "operator '%' can not be applied to operand types 'f64' and 'f64'"
    );

    let one = Expr::float_literal(&mut session, 1.0, FloatWidth::F64, span());
    let err = Expr::binary(&mut session, BinaryOp::LogicalAnd, d, one, span()).unwrap_err();
    assert!(err.message().starts_with("operator '&&'"));

    let six = int(&mut session, 6);
    let zero = int(&mut session, 0);
    let err = Expr::binary(&mut session, BinaryOp::Div, six, zero, span()).unwrap_err();
    assert_eq!(err.message(), "division by zero");
    assert_eq!(session.reporter.error_count(), 3);
}

#[test]
fn test_division_by_zero_at_run_time() {
    let mut session = Session::collecting();
    let i32_ty = session.types.signed(32);
    let x = variable(&mut session, "x", i32_ty, None);

    // Only a division that is folded is rejected
    for op in [BinaryOp::Div, BinaryOp::Mod, BinaryOp::DivAssign, BinaryOp::ModAssign] {
        let zero = int(&mut session, 0);
        let e = Expr::binary(&mut session, op, x.clone(), zero, span()).unwrap();
        assert_eq!(e.ty, i32_ty, "{}", op);
        assert!(!e.is_constant(&session.types));
    }
    assert_eq!(session.reporter.error_count(), 0);

    let seven = int(&mut session, 7);
    let zero = int(&mut session, 0);
    let err = Expr::binary(&mut session, BinaryOp::Mod, seven, zero, span()).unwrap_err();
    assert_eq!(err.message(), "division by zero");
}

#[test]
fn test_pointer_offset_must_be_integer() {
    let mut session = Session::collecting();
    let i32_ty = session.types.signed(32);
    let u8_ty = session.types.unsigned(8);
    let size_ty = session.types.size_type();
    let ptr = session.types.pointer(i32_ty);
    let p = variable(&mut session, "p", ptr, None);
    let n = variable(&mut session, "n", u8_ty, None);

    // The offset is widened to the size type
    for op in [BinaryOp::Add, BinaryOp::Sub, BinaryOp::AddAssign, BinaryOp::SubAssign] {
        let e = Expr::binary(&mut session, op, p.clone(), n.clone(), span()).unwrap();
        assert_eq!(e.ty, ptr, "{}", op);
        let ExprKind::Binary { right, .. } = &e.kind else {
            panic!("expected a binary node");
        };
        assert_eq!(right.ty, size_ty, "{}", op);
    }

    let flag = Expr::bool_literal(&mut session, true, span());
    let err = Expr::binary(&mut session, BinaryOp::Add, p.clone(), flag, span()).unwrap_err();
    assert_eq!(
        err.message(),
        "operator '+' can not be applied to operand types 'i32*' and 'bool'"
    );

    let flag = Expr::bool_literal(&mut session, false, span());
    let err = Expr::binary(&mut session, BinaryOp::SubAssign, p, flag, span()).unwrap_err();
    assert_eq!(
        err.message(),
        "operator '-=' can not be applied to operand types 'i32*' and 'bool'"
    );
}

#[test]
fn test_array_assignment_requires_identical_type() {
    let mut session = Session::collecting();
    let i32_ty = session.types.signed(32);
    let u8_ty = session.types.unsigned(8);
    let words_ty = session.types.array(i32_ty, 4);
    let bytes_ty = session.types.array(u8_ty, 4);
    let long_ty = session.types.array(i32_ty, 5);
    let a = variable(&mut session, "a", words_ty, None);
    let b = variable(&mut session, "b", bytes_ty, None);
    let c = variable(&mut session, "c", words_ty, None);
    let d = variable(&mut session, "d", long_ty, None);

    let copy = Expr::binary(&mut session, BinaryOp::Assign, a.clone(), c, span()).unwrap();
    assert_eq!(copy.ty, words_ty);
    let ExprKind::Binary { right, .. } = &copy.kind else {
        panic!("expected a binary node");
    };
    assert_eq!(right.ty, words_ty);

    let err = Expr::binary(&mut session, BinaryOp::Assign, a.clone(), b, span()).unwrap_err();
    assert_eq!(
        err.message(),
        "operator '=' can not be applied to operand types 'i32[4]' and 'u8[4]'"
    );
    let err = Expr::binary(&mut session, BinaryOp::Assign, a, d, span()).unwrap_err();
    assert_eq!(
        err.message(),
        "operator '=' can not be applied to operand types 'i32[4]' and 'i32[5]'"
    );
    assert_eq!(session.reporter.error_count(), 2);
}

#[test]
fn test_struct_operators() {
    let mut session = Session::collecting();
    let i32_ty = session.types.signed(32);
    let s_ty = session.declare_struct("S", span()).unwrap();
    session
        .complete_struct(s_ty, vec![("x".to_string(), i32_ty)], span())
        .unwrap();
    let t_ty = session.declare_struct("T", span()).unwrap();
    session
        .complete_struct(t_ty, vec![("x".to_string(), i32_ty)], span())
        .unwrap();
    let s1 = variable(&mut session, "s1", s_ty, None);
    let s2 = variable(&mut session, "s2", s_ty, None);
    let t = variable(&mut session, "t", t_ty, None);

    let copy = Expr::binary(&mut session, BinaryOp::Assign, s1.clone(), s2.clone(), span()).unwrap();
    assert_eq!(copy.ty, s_ty);

    // Same members, different struct
    let err = Expr::binary(&mut session, BinaryOp::Assign, s1.clone(), t, span()).unwrap_err();
    assert_eq!(
        err.message(),
        "operator '=' can not be applied to operand types 'struct S' and 'struct T'"
    );

    for (op, spelling) in [
        (BinaryOp::Add, "+"),
        (BinaryOp::Equal, "=="),
        (BinaryOp::AddAssign, "+="),
        (BinaryOp::LogicalAnd, "&&"),
    ] {
        let err = Expr::binary(&mut session, op, s1.clone(), s2.clone(), span()).unwrap_err();
        assert_eq!(
            err.message(),
            format!("operator '{}' can not be applied to operand types 'struct S' and 'struct S'", spelling)
        );
    }

    let one = int(&mut session, 1);
    let err = Expr::binary(&mut session, BinaryOp::Assign, s1, one, span()).unwrap_err();
    assert_eq!(
        err.message(),
        "operator '=' can not be applied to operand types 'struct S' and 'i32'"
    );
}

#[test]
fn test_const_pointee_loss_only_warns() {
    let mut session = Session::collecting();
    let u8_ty = session.types.unsigned(8);
    let const_u8 = session.types.get_const(u8_ty);
    let ptr = session.types.pointer(u8_ty);
    let const_ptr = session.types.pointer(const_u8);
    let source = variable(&mut session, "source", const_ptr, None);

    session.declare_variable("sink", ptr, Some(source), span()).unwrap();
    assert_eq!(session.reporter.error_count(), 0);
    assert_eq!(session.reporter.warning_count(), 1);
    let warning = session.reporter.warnings().next().unwrap();
    assert_eq!(
        warning.message,
        "conversion from 'const u8*' to 'u8*' discards const qualifier"
    );
}

#[test]
fn test_constant_folding() {
    let mut session = Session::collecting();
    let u8_ty = session.types.unsigned(8);
    let i32_ty = session.types.signed(32);
    let const_i32 = session.types.get_const(i32_ty);
    let ten = int(&mut session, 10);
    let limit = variable(&mut session, "limit", const_i32, Some(ten));

    let two = int(&mut session, 2);
    let doubled = Expr::binary(&mut session, BinaryOp::Mul, limit, two, span()).unwrap();
    assert!(doubled.is_constant(&session.types));

    // Constants are truncated to the width of their type
    let big = int(&mut session, 300);
    let narrow = Expr::cast(&mut session, big, u8_ty, span()).unwrap();
    assert_eq!(
        narrow.constant(&session.types),
        Some(abc_frontend::Constant::Integer(44))
    );
}

#[test]
fn test_narrowing_warning() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut session = Session::collecting();
    let i32_ty = session.types.signed(32);
    let u8_ty = session.types.unsigned(8);
    let wide = variable(&mut session, "wide", i32_ty, None);

    session.declare_variable("narrow", u8_ty, Some(wide), span()).unwrap();
    assert_eq!(session.reporter.warning_count(), 1);

    // A constant that fits is converted silently
    let small = int(&mut session, 200);
    session.declare_variable("fits", u8_ty, Some(small), span()).unwrap();
    assert_eq!(session.reporter.warning_count(), 1);
    assert_eq!(session.reporter.error_count(), 0);
}
