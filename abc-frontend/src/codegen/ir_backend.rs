//! Reference backend producing an IR [`Module`]

use super::backend::{CodeGenBackend, FunctionState, Parameter};
use super::errors::CodegenError;
use crate::expr::Storage;
use crate::ir::{
    GlobalVariable, IrBinaryOp, IrBuilder, IrType, IrUnaryOp, Linkage, Module, Value,
};
use abc_common::{LabelId, SymbolId};
use std::collections::HashMap;

/// Function being built and what is needed to close it
struct Current {
    name: String,
    return_type: IrType,
}

pub struct IrBackend {
    builder: IrBuilder,
    module: Module,
    locals: HashMap<SymbolId, Value>,
    current: Option<Current>,
    next_string_id: u32,
}

impl IrBackend {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            builder: IrBuilder::new(),
            module: Module::new(module_name.into()),
            locals: HashMap::new(),
            current: None,
            next_string_id: 0,
        }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn into_module(self) -> Module {
        self.module
    }

    /// Make sure instructions have a block to go to. After a terminator,
    /// code continues in a fresh block nothing branches to.
    fn open_block(&mut self) -> Result<(), CodegenError> {
        if self.current.is_none() {
            return Err(CodegenError::NoFunction);
        }
        if self.builder.current_block().is_none() || self.builder.current_block_has_terminator() {
            let label = self.builder.new_label();
            self.builder.create_block(label)?;
            log::debug!("emitting into unreachable block L{}", label);
        }
        Ok(())
    }

    /// Remember the layout of struct types for the module header
    fn record_type(&mut self, ty: &IrType) {
        match ty {
            IrType::Struct { name: Some(name), fields } if !fields.is_empty() => {
                for field in fields {
                    self.record_type(field);
                }
                self.module.type_definitions.entry(name.clone()).or_insert_with(|| ty.clone());
            }
            IrType::Array { element_type, .. } => self.record_type(element_type),
            _ => {}
        }
    }

    fn abandon_function(&mut self) {
        self.builder.finish_function();
        self.current = None;
        self.locals.clear();
    }
}

impl CodeGenBackend for IrBackend {
    fn create_label(&mut self) -> LabelId {
        self.builder.new_label()
    }

    fn define_label(&mut self, label: LabelId) -> Result<(), CodegenError> {
        if self.current.is_none() {
            return Err(CodegenError::NoFunction);
        }
        if self.is_block_open() {
            self.builder.build_branch(label)?;
        }
        self.builder.create_block(label)?;
        Ok(())
    }

    fn current_label(&self) -> Option<LabelId> {
        self.builder.current_block()
    }

    fn state(&self) -> FunctionState {
        match self.current {
            None => FunctionState::NotBuilding,
            Some(_) => FunctionState::Building {
                block_open: self.builder.current_block().is_some() && !self.builder.current_block_has_terminator(),
            },
        }
    }

    fn jump(&mut self, target: LabelId) -> Result<(), CodegenError> {
        self.open_block()?;
        Ok(self.builder.build_branch(target)?)
    }

    fn cond_jump(&mut self, condition: Value, on_true: LabelId, on_false: LabelId) -> Result<(), CodegenError> {
        self.open_block()?;
        Ok(self.builder.build_branch_cond(condition, on_true, on_false)?)
    }

    fn ret(&mut self, value: Option<Value>) -> Result<(), CodegenError> {
        self.open_block()?;
        Ok(self.builder.build_return(value)?)
    }

    fn load(&mut self, address: Value, ty: &IrType) -> Result<Value, CodegenError> {
        self.open_block()?;
        let temp = self.builder.build_load(address, ty.clone())?;
        Ok(Value::Temp(temp))
    }

    fn store(&mut self, value: Value, address: Value, ty: &IrType) -> Result<(), CodegenError> {
        self.open_block()?;
        Ok(self.builder.build_store(value, address, ty.clone())?)
    }

    fn local_variable(&mut self, symbol: SymbolId, name: &str, ty: &IrType) -> Result<Value, CodegenError> {
        self.open_block()?;
        self.record_type(ty);
        self.builder.build_comment(format!("{name}: {ty}"))?;
        let slot = self.builder.build_alloca(ty.clone())?;
        self.locals.insert(symbol, slot.clone());
        Ok(slot)
    }

    fn temporary(&mut self, ty: &IrType) -> Result<Value, CodegenError> {
        self.open_block()?;
        self.record_type(ty);
        Ok(self.builder.build_alloca(ty.clone())?)
    }

    fn symbol_address(&mut self, symbol: SymbolId, name: &str, storage: Storage) -> Result<Value, CodegenError> {
        match storage {
            Storage::Local => self
                .locals
                .get(&symbol)
                .cloned()
                .ok_or_else(|| CodegenError::UndefinedVariable { name: name.to_string() }),
            Storage::Global => Ok(Value::Global(name.to_string())),
            Storage::Function => Ok(Value::Function(name.to_string())),
        }
    }

    fn string_literal(&mut self, text: &str) -> Result<Value, CodegenError> {
        let name = format!(".str{}", self.next_string_id);
        self.next_string_id += 1;
        let bytes = text
            .bytes()
            .chain(std::iter::once(0))
            .map(|b| Value::Constant(b as i64))
            .collect::<Vec<_>>();
        self.module.add_global(GlobalVariable {
            name: name.clone(),
            var_type: IrType::Array {
                size: bytes.len() as u64,
                element_type: Box::new(IrType::I8),
            },
            is_constant: true,
            initializer: Some(Value::Aggregate(bytes)),
            linkage: Linkage::Private,
        });
        Ok(Value::Global(name))
    }

    fn declare_global(
        &mut self,
        _symbol: SymbolId,
        name: &str,
        ty: &IrType,
        init: Option<Value>,
    ) -> Result<Value, CodegenError> {
        self.record_type(ty);
        self.module.add_global(GlobalVariable {
            name: name.to_string(),
            var_type: ty.clone(),
            is_constant: false,
            initializer: init,
            linkage: Linkage::External,
        });
        Ok(Value::Global(name.to_string()))
    }

    fn ptr_offset(&mut self, base: Value, index: Value, element: &IrType) -> Result<Value, CodegenError> {
        self.open_block()?;
        let result_type = IrType::Ptr(Box::new(element.clone()));
        Ok(self.builder.build_pointer_offset(base, vec![index], result_type)?)
    }

    fn member_address(
        &mut self,
        base: Value,
        _object: &IrType,
        index: usize,
        member: &IrType,
    ) -> Result<Value, CodegenError> {
        self.open_block()?;
        let result_type = IrType::Ptr(Box::new(member.clone()));
        let indices = vec![Value::Constant(0), Value::Constant(index as i64)];
        Ok(self.builder.build_pointer_offset(base, indices, result_type)?)
    }

    fn ptr_diff(&mut self, a: Value, b: Value, element: &IrType) -> Result<Value, CodegenError> {
        let size = element
            .size_in_bytes()
            .ok_or_else(|| CodegenError::UnsupportedType { ty: element.to_string() })?;
        let a = self.unary(IrUnaryOp::PtrToInt, a, &IrType::I64)?;
        let b = self.unary(IrUnaryOp::PtrToInt, b, &IrType::I64)?;
        let bytes = self.arith(IrBinaryOp::Sub, a, b, &IrType::I64)?;
        if size == 1 {
            return Ok(bytes);
        }
        self.arith(IrBinaryOp::SDiv, bytes, Value::Constant(size as i64), &IrType::I64)
    }

    fn int_const(&mut self, value: i64, _ty: &IrType) -> Value {
        Value::Constant(value)
    }

    fn float_const(&mut self, value: f64, _ty: &IrType) -> Value {
        Value::FloatConstant(value)
    }

    fn zero(&mut self, ty: &IrType) -> Value {
        match ty {
            IrType::F32 | IrType::F64 => Value::FloatConstant(0.0),
            IrType::Ptr(_) => Value::Null,
            IrType::Array { .. } | IrType::Struct { .. } => Value::Aggregate(Vec::new()),
            _ => Value::Constant(0),
        }
    }

    fn arith(&mut self, op: IrBinaryOp, a: Value, b: Value, ty: &IrType) -> Result<Value, CodegenError> {
        self.open_block()?;
        let temp = self.builder.build_binary(op, a, b, ty.clone())?;
        Ok(Value::Temp(temp))
    }

    fn compare(&mut self, op: IrBinaryOp, a: Value, b: Value, _ty: &IrType) -> Result<Value, CodegenError> {
        self.open_block()?;
        let temp = self.builder.build_binary(op, a, b, IrType::I1)?;
        Ok(Value::Temp(temp))
    }

    fn unary(&mut self, op: IrUnaryOp, a: Value, ty: &IrType) -> Result<Value, CodegenError> {
        self.open_block()?;
        let temp = self.builder.build_unary(op, a, ty.clone())?;
        Ok(Value::Temp(temp))
    }

    fn merge(&mut self, incoming: Vec<(Value, LabelId)>, ty: &IrType) -> Result<Value, CodegenError> {
        self.open_block()?;
        let temp = self.builder.build_phi(incoming, ty.clone())?;
        Ok(Value::Temp(temp))
    }

    fn call(&mut self, callee: Value, args: Vec<Value>, ret: &IrType) -> Result<Option<Value>, CodegenError> {
        self.open_block()?;
        let result = self.builder.build_call(callee, args, ret.clone())?;
        Ok(result.map(Value::Temp))
    }

    fn begin_function(
        &mut self,
        name: &str,
        ret: IrType,
        params: Vec<Parameter>,
        variadic: bool,
    ) -> Result<(), CodegenError> {
        if let Some(current) = &self.current {
            return Err(CodegenError::NestedFunction {
                name: name.to_string(),
                current: current.name.clone(),
            });
        }
        log::debug!("begin function '{}'", name);

        let function = self.builder.create_function(name.to_string(), ret.clone());
        function.is_vararg = variadic;
        self.current = Some(Current {
            name: name.to_string(),
            return_type: ret,
        });
        self.locals.clear();

        let entry = self.builder.new_label();
        self.builder.create_block(entry)?;
        for (i, param) in params.iter().enumerate() {
            self.builder.add_parameter(i as u32, param.ty.clone());
        }
        for (i, param) in params.into_iter().enumerate() {
            let slot = self.local_variable(param.symbol, &param.name, &param.ty)?;
            self.builder.build_store(Value::Temp(i as u32), slot, param.ty)?;
        }
        Ok(())
    }

    fn end_function(&mut self) -> Result<(), CodegenError> {
        let Some(current) = &self.current else {
            return Err(CodegenError::NoFunction);
        };
        let name = current.name.clone();
        let returns_void = current.return_type == IrType::Void;

        if self.is_block_open() && !self.builder.discard_current_block_if_unreachable() {
            if !returns_void {
                self.abandon_function();
                return Err(CodegenError::MissingReturn { function: name });
            }
            self.builder.build_return(None)?;
        }

        let function = self.builder.finish_function().ok_or(CodegenError::NoFunction)?;
        log::debug!("end function '{}' with {} block(s)", function.name, function.blocks.len());
        self.module.add_function(function);
        self.current = None;
        self.locals.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Instruction;

    #[test]
    fn test_state_machine() {
        let mut backend = IrBackend::new("test");
        assert_eq!(backend.state(), FunctionState::NotBuilding);
        assert_eq!(backend.jump(0), Err(CodegenError::NoFunction));

        backend.begin_function("f", IrType::Void, vec![], false).unwrap();
        assert_eq!(backend.state(), FunctionState::Building { block_open: true });

        let err = backend.begin_function("g", IrType::Void, vec![], false).unwrap_err();
        assert!(matches!(err, CodegenError::NestedFunction { .. }));

        backend.ret(None).unwrap();
        assert_eq!(backend.state(), FunctionState::Building { block_open: false });

        let label = backend.create_label();
        backend.define_label(label).unwrap();
        assert_eq!(backend.state(), FunctionState::Building { block_open: true });

        backend.end_function().unwrap();
        assert_eq!(backend.state(), FunctionState::NotBuilding);
        let f = backend.module().get_function("f").unwrap();
        assert!(f.blocks.iter().all(|b| b.has_terminator()));
    }

    #[test]
    fn test_missing_return() {
        let mut backend = IrBackend::new("test");
        backend.begin_function("f", IrType::I32, vec![], false).unwrap();
        let err = backend.end_function().unwrap_err();
        assert_eq!(err, CodegenError::MissingReturn { function: "f".to_string() });
        assert_eq!(backend.state(), FunctionState::NotBuilding);
        assert!(backend.module().functions.is_empty());
    }

    #[test]
    fn test_trailing_unreachable_block_is_dropped() {
        let mut backend = IrBackend::new("test");
        backend.begin_function("h", IrType::I32, vec![], false).unwrap();
        backend.ret(Some(Value::Constant(1))).unwrap();
        let label = backend.create_label();
        backend.define_label(label).unwrap();
        backend.end_function().unwrap();
        let h = backend.module().get_function("h").unwrap();
        assert_eq!(h.blocks.len(), 1);
    }

    #[test]
    fn test_parameters_are_spilled() {
        let mut backend = IrBackend::new("test");
        let params = vec![Parameter {
            symbol: 7,
            name: "x".to_string(),
            ty: IrType::I32,
        }];
        backend.begin_function("id", IrType::I32, params, false).unwrap();
        let slot = backend.symbol_address(7, "x", Storage::Local).unwrap();
        let value = backend.load(slot, &IrType::I32).unwrap();
        backend.ret(Some(value)).unwrap();
        backend.end_function().unwrap();

        let f = backend.module().get_function("id").unwrap();
        assert_eq!(f.parameters, vec![(0, IrType::I32)]);
        let entry = f.entry_block().unwrap();
        assert!(entry.instructions.iter().any(|i| matches!(i, Instruction::Alloca { .. })));
        assert!(entry
            .instructions
            .iter()
            .any(|i| matches!(i, Instruction::Store { value: Value::Temp(0), .. })));
    }

    #[test]
    fn test_string_literal_global() {
        let mut backend = IrBackend::new("test");
        let value = backend.string_literal("hi").unwrap();
        assert_eq!(value, Value::Global(".str0".to_string()));
        let global = backend.module().get_global(".str0").unwrap();
        assert_eq!(global.linkage, Linkage::Private);
        assert_eq!(
            global.initializer,
            Some(Value::Aggregate(vec![
                Value::Constant(104),
                Value::Constant(105),
                Value::Constant(0)
            ]))
        );
    }
}
