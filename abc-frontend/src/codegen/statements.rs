//! Statement lowering
//!
//! Statement bodies are passed as closures so that a parser can generate
//! them in place, between the labels this module lays out.

use super::backend::CodeGenBackend;
use super::errors::CodegenError;
use super::expressions::CodeGenerator;
use crate::expr::{Expr, Storage};
use crate::session::Declaration;

impl<'a, B: CodeGenBackend> CodeGenerator<'a, B> {
    pub fn expression_statement(&mut self, expr: &Expr) -> Result<(), CodegenError> {
        self.load_value(expr).map(drop)
    }

    pub fn return_statement(&mut self, value: Option<&Expr>) -> Result<(), CodegenError> {
        let value = match value {
            Some(expr) => Some(self.load_value(expr)?),
            None => None,
        };
        self.backend.ret(value)
    }

    pub fn declaration(&mut self, decl: &Declaration) -> Result<(), CodegenError> {
        match decl.storage {
            Storage::Global => self.global_declaration(decl),
            Storage::Local => self.local_declaration(decl),
            Storage::Function => Ok(()),
        }
    }

    pub fn local_declaration(&mut self, decl: &Declaration) -> Result<(), CodegenError> {
        let ir = self.ir_type(decl.ty)?;
        let address = self.backend.local_variable(decl.symbol, &decl.name, &ir)?;
        if let Some(init) = &decl.init {
            self.store_initializer(address, init, decl.ty)?;
        }
        Ok(())
    }

    /// Globals are initialized at load time, so their initializer must be
    /// a constant
    pub fn global_declaration(&mut self, decl: &Declaration) -> Result<(), CodegenError> {
        let ir = self.ir_type(decl.ty)?;
        let init = match &decl.init {
            Some(init) => Some(self.load_constant(init)?),
            None => None,
        };
        self.backend
            .declare_global(decl.symbol, &decl.name, &ir, init)
            .map(drop)
    }

    pub fn if_statement<T>(&mut self, cond: &Expr, then_branch: T) -> Result<(), CodegenError>
    where
        T: FnOnce(&mut Self) -> Result<(), CodegenError>,
    {
        let then_label = self.backend.create_label();
        let end = self.backend.create_label();
        self.branch_on(cond, then_label, end)?;

        self.backend.define_label(then_label)?;
        then_branch(self)?;
        self.backend.define_label(end)
    }

    pub fn if_else_statement<T, E>(&mut self, cond: &Expr, then_branch: T, else_branch: E) -> Result<(), CodegenError>
    where
        T: FnOnce(&mut Self) -> Result<(), CodegenError>,
        E: FnOnce(&mut Self) -> Result<(), CodegenError>,
    {
        let then_label = self.backend.create_label();
        let else_label = self.backend.create_label();
        let end = self.backend.create_label();
        self.branch_on(cond, then_label, else_label)?;

        self.backend.define_label(then_label)?;
        then_branch(self)?;
        if self.backend.is_block_open() {
            self.backend.jump(end)?;
        }

        self.backend.define_label(else_label)?;
        else_branch(self)?;
        self.backend.define_label(end)
    }

    pub fn while_statement<F>(&mut self, cond: &Expr, body: F) -> Result<(), CodegenError>
    where
        F: FnOnce(&mut Self) -> Result<(), CodegenError>,
    {
        let check = self.backend.create_label();
        let body_label = self.backend.create_label();
        let end = self.backend.create_label();

        self.backend.define_label(check)?;
        self.branch_on(cond, body_label, end)?;

        self.backend.define_label(body_label)?;
        body(self)?;
        if self.backend.is_block_open() {
            self.backend.jump(check)?;
        }
        self.backend.define_label(end)
    }
}
