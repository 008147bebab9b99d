//! Function definitions

use super::backend::{CodeGenBackend, Parameter};
use super::errors::CodegenError;
use super::expressions::CodeGenerator;
use crate::types::TypeId;
use abc_common::SymbolId;

impl<'a, B: CodeGenBackend> CodeGenerator<'a, B> {
    /// Start the body of function `name` of type `fn_type`
    ///
    /// `params` names the parameter symbols in declaration order.
    pub fn function_definition_begin(
        &mut self,
        name: &str,
        fn_type: TypeId,
        params: &[(SymbolId, String)],
    ) -> Result<(), CodegenError> {
        let unsupported = || CodegenError::UnsupportedType {
            ty: self.types.name(fn_type),
        };
        let ret = self.types.ret_type(fn_type).ok_or_else(unsupported)?;
        let param_types = self.types.param_types(fn_type);
        if param_types.len() != params.len() {
            return Err(unsupported());
        }

        let ret = self.ir_type(ret)?;
        let mut parameters = Vec::with_capacity(params.len());
        for ((symbol, param_name), ty) in params.iter().zip(param_types) {
            parameters.push(Parameter {
                symbol: *symbol,
                name: param_name.clone(),
                ty: self.ir_type(*ty)?,
            });
        }
        log::debug!("function '{}' with {} parameters", name, parameters.len());
        self.backend
            .begin_function(name, ret, parameters, self.types.has_varg(fn_type))
    }

    pub fn function_definition_end(&mut self) -> Result<(), CodegenError> {
        self.backend.end_function()
    }
}
