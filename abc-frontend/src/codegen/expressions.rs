//! Expression code generation
//!
//! Every expression can be asked for its constant value, its runtime value,
//! its address, or to branch on its truth value. Logical operators are
//! lowered as control flow: `branch_on` never evaluates the right operand
//! of `&&` once the left one is false. Where a logical value is needed, the
//! two branch targets each provide a constant and meet in a merge block.

use super::backend::CodeGenBackend;
use super::errors::CodegenError;
use super::types::{arithmetic_op, cast_op, comparison_op, convert_type};
use crate::expr::{BinaryOp, Constant, Expr, ExprKind, ExprPtr, Literal, Storage, UnaryOp};
use crate::ir::{IrBinaryOp, IrType, IrUnaryOp, Value};
use crate::types::{TypeId, TypeKind, TypeTable};
use abc_common::LabelId;

/// Expression generator context
pub struct CodeGenerator<'a, B: CodeGenBackend> {
    pub types: &'a TypeTable,
    pub backend: &'a mut B,
}

impl<'a, B: CodeGenBackend> CodeGenerator<'a, B> {
    pub fn new(types: &'a TypeTable, backend: &'a mut B) -> Self {
        Self { types, backend }
    }

    pub(super) fn ir_type(&self, ty: TypeId) -> Result<IrType, CodegenError> {
        convert_type(self.types, ty)
    }

    fn text(&self, expr: &Expr) -> String {
        expr.display(self.types).to_string()
    }

    fn pointee_type(&self, pointer: TypeId) -> Result<IrType, CodegenError> {
        let pointee = self
            .types
            .ref_type(pointer)
            .ok_or_else(|| CodegenError::UnsupportedType { ty: self.types.name(pointer) })?;
        self.ir_type(pointee)
    }

    /// Type of element `index` of an aggregate of type `ty`
    fn element_type(&self, ty: TypeId, index: usize) -> Result<TypeId, CodegenError> {
        match self.types.kind(ty) {
            TypeKind::Array { element, .. } => Ok(*element),
            TypeKind::Struct(_) => self
                .types
                .members(ty)
                .ok()
                .and_then(|members| members.get(index))
                .map(|member| member.ty)
                .ok_or_else(|| CodegenError::UnsupportedType { ty: self.types.name(ty) }),
            _ => Ok(ty),
        }
    }

    // ---------------------------------------------------------------------
    // Constants
    // ---------------------------------------------------------------------

    pub fn load_constant(&mut self, expr: &Expr) -> Result<Value, CodegenError> {
        let constant = expr
            .constant(self.types)
            .ok_or_else(|| CodegenError::NotAConstant { expr: self.text(expr) })?;
        self.constant_value(&constant, expr.ty)
    }

    fn constant_value(&mut self, constant: &Constant, ty: TypeId) -> Result<Value, CodegenError> {
        let value = match constant {
            Constant::Integer(value) => {
                let ir = self.ir_type(ty)?;
                self.backend.int_const(*value, &ir)
            }
            Constant::Float(value) => {
                let ir = self.ir_type(ty)?;
                self.backend.float_const(*value, &ir)
            }
            Constant::Null => {
                let ir = self.ir_type(ty)?;
                self.backend.zero(&ir)
            }
            Constant::Aggregate(items) => {
                let mut values = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let item_ty = self.element_type(ty, i)?;
                    values.push(self.constant_value(item, item_ty)?);
                }
                Value::Aggregate(values)
            }
        };
        Ok(value)
    }

    // ---------------------------------------------------------------------
    // Values
    // ---------------------------------------------------------------------

    pub fn load_value(&mut self, expr: &Expr) -> Result<Value, CodegenError> {
        if let Some(constant) = expr.constant(self.types) {
            return self.constant_value(&constant, expr.ty);
        }
        match &expr.kind {
            ExprKind::Literal(Literal::String(_)) => {
                let address = self.load_address(expr)?;
                let ir = self.ir_type(expr.ty)?;
                self.backend.load(address, &ir)
            }
            ExprKind::Literal(_) => self.load_constant(expr),
            ExprKind::Identifier { storage: Storage::Function, symbol, name, .. } => {
                self.backend.symbol_address(*symbol, name, Storage::Function)
            }
            ExprKind::Identifier { .. } | ExprKind::Member { .. } => {
                let address = self.load_address(expr)?;
                let ir = self.ir_type(expr.ty)?;
                self.backend.load(address, &ir)
            }
            ExprKind::Proxy(target) => self.load_value(target),
            ExprKind::Unary { op, child } => self.unary_value(expr, *op, child),
            ExprKind::Binary { op, left, right } => self.binary_value(expr, *op, left, right),
            ExprKind::Conditional { cond, then_expr, else_expr } => {
                self.conditional_value(expr, cond, then_expr, else_expr)
            }
            ExprKind::Call { callee, args } => {
                let target = self.load_value(callee)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.load_value(arg)?);
                }
                let ret = self.ir_type(expr.ty)?;
                Ok(self.backend.call(target, values, &ret)?.unwrap_or(Value::Undef))
            }
            ExprKind::AggregateVector { .. } => {
                let ir = self.ir_type(expr.ty)?;
                let slot = self.backend.temporary(&ir)?;
                self.store_initializer(slot.clone(), expr, expr.ty)?;
                self.backend.load(slot, &ir)
            }
        }
    }

    fn unary_value(&mut self, expr: &Expr, op: UnaryOp, child: &ExprPtr) -> Result<Value, CodegenError> {
        match op {
            UnaryOp::Cast | UnaryOp::ExplicitCast => self.cast_value(child, expr.ty),
            UnaryOp::Minus => {
                let value = self.load_value(child)?;
                let ir = self.ir_type(expr.ty)?;
                let neg = if ir.is_float() { IrUnaryOp::FNeg } else { IrUnaryOp::Neg };
                self.backend.unary(neg, value, &ir)
            }
            UnaryOp::LogicalNot if self.types.is_bool(expr.ty) => self.materialize(expr),
            UnaryOp::LogicalNot => {
                // Integer operand: the result keeps its type
                let value = self.load_value(child)?;
                let ir = self.ir_type(child.ty)?;
                let zero = self.backend.zero(&ir);
                let is_zero = self.backend.compare(IrBinaryOp::Eq, value, zero, &ir)?;
                let out = self.ir_type(expr.ty)?;
                if out == IrType::I1 {
                    Ok(is_zero)
                } else {
                    self.backend.unary(IrUnaryOp::ZExt, is_zero, &out)
                }
            }
            UnaryOp::Dereference => {
                let address = self.load_value(child)?;
                if self.types.is_function(expr.ty) {
                    return Ok(address);
                }
                let ir = self.ir_type(expr.ty)?;
                self.backend.load(address, &ir)
            }
            UnaryOp::AddressOf => self.load_address(child),
            UnaryOp::PreIncrement | UnaryOp::PostIncrement | UnaryOp::PreDecrement | UnaryOp::PostDecrement => {
                self.step(op, child)
            }
        }
    }

    /// Increment or decrement in place; postfix forms yield the old value
    fn step(&mut self, op: UnaryOp, child: &ExprPtr) -> Result<Value, CodegenError> {
        let address = self.load_address(child)?;
        let ir = self.ir_type(child.ty)?;
        let old = self.backend.load(address.clone(), &ir)?;
        let delta: i64 = if op.is_increment() { 1 } else { -1 };

        let new = if self.types.is_pointer(child.ty) {
            let element = self.pointee_type(child.ty)?;
            let delta = self.backend.int_const(delta, &IrType::I64);
            self.backend.ptr_offset(old.clone(), delta, &element)?
        } else {
            let one = self.backend.int_const(1, &ir);
            let ir_op = if delta > 0 { IrBinaryOp::Add } else { IrBinaryOp::Sub };
            self.backend.arith(ir_op, old.clone(), one, &ir)?
        };
        self.backend.store(new.clone(), address, &ir)?;
        Ok(if op.is_postfix() { old } else { new })
    }

    fn cast_value(&mut self, child: &ExprPtr, to: TypeId) -> Result<Value, CodegenError> {
        let from = child.ty;
        if self.types.is_bool(to) && !self.types.is_bool(from) {
            let value = self.load_value(child)?;
            return self.truth(value, from);
        }
        // Decay
        if self.types.is_array(from) && self.types.is_pointer(to) {
            return self.object_address(child);
        }
        if self.types.is_function(from) {
            return self.load_value(child);
        }

        let value = self.load_value(child)?;
        match cast_op(self.types, from, to)? {
            Some(op) => {
                let ir = self.ir_type(to)?;
                self.backend.unary(op, value, &ir)
            }
            None => Ok(value),
        }
    }

    /// i1 that is set when `value` of type `ty` is non-zero
    fn truth(&mut self, value: Value, ty: TypeId) -> Result<Value, CodegenError> {
        if self.types.is_bool(ty) {
            return Ok(value);
        }
        let ir = self.ir_type(ty)?;
        let zero = self.backend.zero(&ir);
        let op = if ir.is_float() { IrBinaryOp::FNe } else { IrBinaryOp::Ne };
        self.backend.compare(op, value, zero, &ir)
    }

    fn binary_value(
        &mut self,
        expr: &Expr,
        op: BinaryOp,
        left: &ExprPtr,
        right: &ExprPtr,
    ) -> Result<Value, CodegenError> {
        match op {
            BinaryOp::Assign => {
                let address = self.load_address(left)?;
                let value = self.load_value(right)?;
                let ir = self.ir_type(expr.ty)?;
                self.backend.store(value.clone(), address, &ir)?;
                Ok(value)
            }
            BinaryOp::AddAssign
            | BinaryOp::SubAssign
            | BinaryOp::MulAssign
            | BinaryOp::DivAssign
            | BinaryOp::ModAssign => {
                let base = op.compound_base().unwrap_or(op);
                // The destination is evaluated once
                let address = self.load_address(left)?;
                let ir = self.ir_type(left.ty)?;
                let old = self.backend.load(address.clone(), &ir)?;
                let rhs = self.load_value(right)?;
                let new = self.arithmetic(base, left.ty, old, right.ty, rhs, left.ty)?;
                self.backend.store(new.clone(), address, &ir)?;
                Ok(new)
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let l = self.load_value(left)?;
                let r = self.load_value(right)?;
                self.arithmetic(op, left.ty, l, right.ty, r, expr.ty)
            }
            BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::Less
            | BinaryOp::Greater
            | BinaryOp::LessEqual
            | BinaryOp::GreaterEqual => {
                let l = self.load_value(left)?;
                let r = self.load_value(right)?;
                self.compare(op, left.ty, l, r)
            }
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr => self.materialize(expr),
            BinaryOp::Index => {
                let address = self.load_address(expr)?;
                let ir = self.ir_type(expr.ty)?;
                self.backend.load(address, &ir)
            }
        }
    }

    fn compare(&mut self, op: BinaryOp, operand_ty: TypeId, l: Value, r: Value) -> Result<Value, CodegenError> {
        let ir = self.ir_type(operand_ty)?;
        let ir_op = comparison_op(self.types, op, operand_ty).ok_or_else(|| CodegenError::UnsupportedCast {
            from: op.to_string(),
            to: self.types.name(operand_ty),
        })?;
        self.backend.compare(ir_op, l, r, &ir)
    }

    /// Arithmetic, with pointer offsets and pointer differences scaled by
    /// the pointee
    fn arithmetic(
        &mut self,
        op: BinaryOp,
        left_ty: TypeId,
        l: Value,
        right_ty: TypeId,
        r: Value,
        result_ty: TypeId,
    ) -> Result<Value, CodegenError> {
        if self.types.is_pointer(left_ty) {
            let element = self.pointee_type(left_ty)?;
            if self.types.is_pointer(right_ty) {
                return self.backend.ptr_diff(l, r, &element);
            }
            let index = if op == BinaryOp::Sub {
                let ir = self.ir_type(right_ty)?;
                self.backend.unary(IrUnaryOp::Neg, r, &ir)?
            } else {
                r
            };
            return self.backend.ptr_offset(l, index, &element);
        }
        let ir = self.ir_type(result_ty)?;
        let ir_op = arithmetic_op(self.types, op, result_ty)?;
        self.backend.arith(ir_op, l, r, &ir)
    }

    fn conditional_value(
        &mut self,
        expr: &Expr,
        cond: &ExprPtr,
        then_expr: &ExprPtr,
        else_expr: &ExprPtr,
    ) -> Result<Value, CodegenError> {
        let on_true = self.backend.create_label();
        let on_false = self.backend.create_label();
        let end = self.backend.create_label();
        self.branch_on(cond, on_true, on_false)?;

        self.backend.define_label(on_true)?;
        let a = self.load_value(then_expr)?;
        let from_then = self.backend.current_label().ok_or(CodegenError::NoFunction)?;
        self.backend.jump(end)?;

        self.backend.define_label(on_false)?;
        let b = self.load_value(else_expr)?;
        let from_else = self.backend.current_label().ok_or(CodegenError::NoFunction)?;
        self.backend.jump(end)?;

        self.backend.define_label(end)?;
        if self.types.is_void(expr.ty) {
            return Ok(Value::Undef);
        }
        let ir = self.ir_type(expr.ty)?;
        self.backend.merge(vec![(a, from_then), (b, from_else)], &ir)
    }

    /// Value of a condition through the true/false/merge block pattern
    fn materialize(&mut self, expr: &Expr) -> Result<Value, CodegenError> {
        let on_true = self.backend.create_label();
        let on_false = self.backend.create_label();
        let end = self.backend.create_label();
        self.branch_on(expr, on_true, on_false)?;

        self.backend.define_label(on_true)?;
        self.backend.jump(end)?;
        self.backend.define_label(on_false)?;
        self.backend.jump(end)?;
        self.backend.define_label(end)?;

        let one = self.backend.int_const(1, &IrType::I1);
        let zero = self.backend.int_const(0, &IrType::I1);
        self.backend.merge(vec![(one, on_true), (zero, on_false)], &IrType::I1)
    }

    // ---------------------------------------------------------------------
    // Addresses
    // ---------------------------------------------------------------------

    pub fn load_address(&mut self, expr: &Expr) -> Result<Value, CodegenError> {
        match &expr.kind {
            ExprKind::Identifier { symbol, name, storage, .. } => {
                self.backend.symbol_address(*symbol, name, *storage)
            }
            ExprKind::Literal(Literal::String(text)) => self.backend.string_literal(text),
            ExprKind::Proxy(target) => self.load_address(target),
            ExprKind::Unary { op: UnaryOp::Dereference, child } => self.load_value(child),
            ExprKind::Binary { op: BinaryOp::Index, left, right } => {
                // An array's address is the address of its first element
                let base = if self.types.is_array(left.ty) {
                    self.object_address(left)?
                } else {
                    self.load_value(left)?
                };
                let index = self.load_value(right)?;
                let element = self.ir_type(expr.ty)?;
                self.backend.ptr_offset(base, index, &element)
            }
            ExprKind::Member { object, index, .. } => {
                let base = self.object_address(object)?;
                let object_ir = self.ir_type(object.ty)?;
                let member_ir = self.ir_type(expr.ty)?;
                self.backend.member_address(base, &object_ir, *index, &member_ir)
            }
            ExprKind::Literal(_)
            | ExprKind::Unary { .. }
            | ExprKind::Binary { .. }
            | ExprKind::Conditional { .. }
            | ExprKind::Call { .. }
            | ExprKind::AggregateVector { .. } => Err(CodegenError::NotAddressable { expr: self.text(expr) }),
        }
    }

    /// Address of a struct or array object; a value without storage is
    /// first copied to a temporary
    fn object_address(&mut self, expr: &Expr) -> Result<Value, CodegenError> {
        if expr.has_address() {
            return self.load_address(expr);
        }
        let ir = self.ir_type(expr.ty)?;
        let value = self.load_value(expr)?;
        let slot = self.backend.temporary(&ir)?;
        self.backend.store(value, slot.clone(), &ir)?;
        Ok(slot)
    }

    // ---------------------------------------------------------------------
    // Branches
    // ---------------------------------------------------------------------

    /// Transfer control to `on_true` or `on_false` depending on the truth
    /// value of `expr`
    pub fn branch_on(&mut self, expr: &Expr, on_true: LabelId, on_false: LabelId) -> Result<(), CodegenError> {
        if let Some(constant) = expr.constant(self.types) {
            let target = if constant.is_true() { on_true } else { on_false };
            return self.backend.jump(target);
        }
        match &expr.kind {
            ExprKind::Proxy(target) => self.branch_on(target, on_true, on_false),
            ExprKind::Binary { op: BinaryOp::LogicalAnd, left, right } => {
                let check_right = self.backend.create_label();
                self.branch_on(left, check_right, on_false)?;
                self.backend.define_label(check_right)?;
                self.branch_on(right, on_true, on_false)
            }
            ExprKind::Binary { op: BinaryOp::LogicalOr, left, right } => {
                let check_right = self.backend.create_label();
                self.branch_on(left, on_true, check_right)?;
                self.backend.define_label(check_right)?;
                self.branch_on(right, on_true, on_false)
            }
            ExprKind::Unary { op: UnaryOp::LogicalNot, child } => self.branch_on(child, on_false, on_true),
            ExprKind::Unary { op: UnaryOp::Cast, child }
                if self.types.is_bool(expr.ty)
                    && (self.types.is_integer(child.ty) || self.types.is_pointer(child.ty)) =>
            {
                self.branch_on(child, on_true, on_false)
            }
            ExprKind::Literal(_)
            | ExprKind::Identifier { .. }
            | ExprKind::Unary { .. }
            | ExprKind::Binary { .. }
            | ExprKind::Conditional { .. }
            | ExprKind::Call { .. }
            | ExprKind::Member { .. }
            | ExprKind::AggregateVector { .. } => {
                let value = self.load_value(expr)?;
                let condition = self.truth(value, expr.ty)?;
                self.backend.cond_jump(condition, on_true, on_false)
            }
        }
    }

    // ---------------------------------------------------------------------
    // Initializers
    // ---------------------------------------------------------------------

    /// Brace elements behind `expr`, looking through proxies and
    /// conversions between aggregate types
    fn aggregate_elements<'e>(&self, expr: &'e Expr) -> Option<&'e [ExprPtr]> {
        match &expr.kind {
            ExprKind::AggregateVector { elements } => Some(elements),
            ExprKind::Proxy(target) => self.aggregate_elements(target),
            ExprKind::Unary { op: UnaryOp::Cast, child } if !self.types.is_scalar(child.ty) => {
                self.aggregate_elements(child)
            }
            _ => None,
        }
    }

    /// Store `init` into the object of type `ty` at `address`. A brace
    /// initializer that is not constant is stored element by element; the
    /// elements it leaves out are zero.
    pub fn store_initializer(&mut self, address: Value, init: &Expr, ty: TypeId) -> Result<(), CodegenError> {
        let ir = self.ir_type(ty)?;
        if init.constant(self.types).is_none() {
            if let Some(elements) = self.aggregate_elements(init) {
                let count = match self.types.kind(ty) {
                    TypeKind::Array { dim, .. } => usize::try_from(*dim).unwrap_or(usize::MAX),
                    TypeKind::Struct(_) => self.types.members(ty).map_or(0, <[_]>::len),
                    _ => 1,
                };
                if elements.len() < count {
                    let zero = self.backend.zero(&ir);
                    self.backend.store(zero, address.clone(), &ir)?;
                }
                for (i, element) in elements.iter().enumerate() {
                    let element_ty = self.element_type(ty, i)?;
                    let element_ir = self.ir_type(element_ty)?;
                    let element_address = if self.types.is_array(ty) {
                        let index = self.backend.int_const(i as i64, &IrType::I64);
                        self.backend.ptr_offset(address.clone(), index, &element_ir)?
                    } else if self.types.is_struct(ty) {
                        self.backend.member_address(address.clone(), &ir, i, &element_ir)?
                    } else {
                        address.clone()
                    };
                    self.store_initializer(element_address, element, element_ty)?;
                }
                return Ok(());
            }
        }
        let value = self.load_value(init)?;
        self.backend.store(value, address, &ir)
    }
}
