//! Compilation session
//!
//! A session owns everything that lives for the duration of one
//! compilation: the type table, the scoped symbol tables for ordinary
//! identifiers and struct tags, and the diagnostic sink. Every node
//! constructor takes the session explicitly, so independent sessions never
//! share state.

use crate::expr::{ExprPtr, Storage};
use crate::promotion::{self, SemanticError};
use crate::types::{TypeId, TypeTable};
use abc_common::{
    CompilerError, DeclScope, ErrorReporter, ScopeSet, SourceSpan, Symbol, SymbolError, SymbolId,
    SymbolTable,
};
use serde::{Deserialize, Serialize};

/// What happens when a construct is rejected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Print the diagnostics and exit with status 1
    #[default]
    Abort,
    /// Record the diagnostic and return the error to the caller
    Collect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    pub failure_policy: FailurePolicy,
    /// Width of the size type index operands are converted to
    pub size_type_bits: u16,
    pub warn_narrowing: bool,
    pub filename: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Abort,
            size_type_bits: 64,
            warn_narrowing: true,
            filename: "<input>".to_string(),
        }
    }
}

impl SessionOptions {
    /// Parse options from JSON; absent fields keep their defaults
    pub fn from_json(text: &str) -> Result<Self, CompilerError> {
        serde_json::from_str(text).map_err(|err| CompilerError::ConfigError {
            message: err.to_string(),
        })
    }
}

/// What an ordinary identifier is bound to
#[derive(Debug, Clone)]
pub struct Binding {
    pub ty: TypeId,
    pub storage: Storage,
    /// Initializer of a const variable whose value is known
    pub value: Option<ExprPtr>,
}

/// Result of a variable declaration
#[derive(Debug, Clone)]
pub struct Declaration {
    pub symbol: SymbolId,
    pub name: String,
    pub ty: TypeId,
    pub storage: Storage,
    /// Initializer converted to the declared type
    pub init: Option<ExprPtr>,
}

#[derive(Debug)]
pub struct Session {
    pub types: TypeTable,
    pub reporter: ErrorReporter,
    symbols: SymbolTable<Binding>,
    tags: SymbolTable<TypeId>,
    options: SessionOptions,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            types: TypeTable::with_size_type_bits(options.size_type_bits),
            reporter: ErrorReporter::new(),
            symbols: SymbolTable::new(),
            tags: SymbolTable::new(),
            options,
        }
    }

    /// A session that hands rejections back instead of exiting
    pub fn collecting() -> Self {
        Self::new(SessionOptions {
            failure_policy: FailurePolicy::Collect,
            ..SessionOptions::default()
        })
    }

    /// Attach the source text used for diagnostic excerpts
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.reporter.set_source(source);
        self
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    // ---------------------------------------------------------------------
    // Diagnostics
    // ---------------------------------------------------------------------

    /// Record an advisory diagnostic; compilation continues
    pub fn warn(&mut self, message: String, span: SourceSpan) {
        log::warn!("{}: {}", self.options.filename, message);
        self.reporter.warning(message, span);
    }

    /// Apply the failure policy to a rejected construct
    pub fn reject(&mut self, err: SemanticError) -> CompilerError {
        let span = err.span().clone();
        self.reporter.error(err.to_string(), span);
        if let SemanticError::Redeclaration { name, previous, .. } = &err {
            if !previous.is_dummy() {
                self.reporter
                    .note(format!("previous declaration of '{}' is here", name), previous.clone());
            }
        }
        match self.options.failure_policy {
            FailurePolicy::Abort => self.reporter.fatal(),
            FailurePolicy::Collect => err.into(),
        }
    }

    /// Pass a rule outcome through, applying the failure policy on rejection
    pub fn check<T>(&mut self, result: Result<T, SemanticError>) -> Result<T, CompilerError> {
        result.map_err(|err| self.reject(err))
    }

    // ---------------------------------------------------------------------
    // Scopes
    // ---------------------------------------------------------------------

    pub fn depth(&self) -> u32 {
        self.symbols.depth()
    }

    pub fn open_scope(&mut self) {
        self.symbols.open_scope();
        self.tags.open_scope();
    }

    /// Leave the innermost scope; struct tags declared in it are removed
    pub fn close_scope(&mut self) {
        self.symbols.close_scope();
        for tag in self.tags.close_scope() {
            log::trace!("struct {} goes out of scope", tag.name);
            self.types.remove_struct(tag.value);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol<Binding>> {
        self.symbols.lookup(name, ScopeSet::All)
    }

    fn bind(&mut self, name: &str, binding: Binding, span: &SourceSpan) -> Result<SymbolId, CompilerError> {
        let declared = self
            .symbols
            .declare(name, binding, span.clone(), DeclScope::Current)
            .map_err(|err| match err {
                SymbolError::Redeclaration { name, previous } => SemanticError::Redeclaration {
                    name,
                    span: span.clone(),
                    previous,
                },
            });
        self.check(declared)
    }

    // ---------------------------------------------------------------------
    // Declarations
    // ---------------------------------------------------------------------

    /// Declare a variable in the innermost scope
    ///
    /// The initializer is converted to the declared type; an unbound array
    /// takes its dimension from it. A const variable with a constant
    /// initializer is bound to that value.
    pub fn declare_variable(
        &mut self,
        name: &str,
        ty: TypeId,
        init: Option<ExprPtr>,
        span: SourceSpan,
    ) -> Result<Declaration, CompilerError> {
        let storage = if self.depth() == 0 {
            Storage::Global
        } else {
            Storage::Local
        };

        let init = match init {
            Some(init) => {
                let converted = promotion::implicit_cast(self, init, ty);
                Some(self.check(converted)?)
            }
            None => None,
        };
        let ty = init.as_ref().map_or(ty, |init| init.ty);

        if !self.types.has_size(ty) {
            let err = SemanticError::IncompleteType {
                ty: self.types.name(ty),
                span: span.clone(),
            };
            return Err(self.reject(err));
        }

        let value = match &init {
            Some(init) if self.types.is_const(ty) && init.is_constant(&self.types) => Some(init.clone()),
            _ => None,
        };
        let symbol = self.bind(name, Binding { ty, storage, value }, &span)?;
        log::debug!("declared {} '{}' of type '{}'", symbol, name, self.types.name(ty));

        Ok(Declaration {
            symbol,
            name: name.to_string(),
            ty,
            storage,
            init,
        })
    }

    /// Declare a function at file scope
    ///
    /// Redeclaring with the same type refers to the existing symbol.
    pub fn declare_function(&mut self, name: &str, ty: TypeId, span: SourceSpan) -> Result<SymbolId, CompilerError> {
        if let Some(existing) = self.symbols.lookup(name, ScopeSet::Root) {
            if existing.value.storage == Storage::Function && self.types.equals(existing.value.ty, ty) {
                return Ok(existing.id);
            }
        }
        let binding = Binding {
            ty,
            storage: Storage::Function,
            value: None,
        };
        let declared = self
            .symbols
            .declare(name, binding, span.clone(), DeclScope::Root)
            .map_err(|err| match err {
                SymbolError::Redeclaration { name, previous } => SemanticError::Redeclaration {
                    name,
                    span: span.clone(),
                    previous,
                },
            });
        self.check(declared)
    }

    /// Declare a parameter in the function's scope
    pub fn declare_parameter(&mut self, name: &str, ty: TypeId, span: SourceSpan) -> Result<SymbolId, CompilerError> {
        let binding = Binding {
            ty,
            storage: Storage::Local,
            value: None,
        };
        self.bind(name, binding, &span)
    }

    /// Declare a struct tag, or find the one visible in the current scope
    pub fn declare_struct(&mut self, name: &str, span: SourceSpan) -> Result<TypeId, CompilerError> {
        if let Some(existing) = self.tags.lookup(name, ScopeSet::Current) {
            return Ok(existing.value);
        }
        let ty = self.types.incomplete_struct(name);
        let declared = self
            .tags
            .declare(name, ty, span.clone(), DeclScope::Current)
            .map_err(|err| match err {
                SymbolError::Redeclaration { name, previous } => SemanticError::Redeclaration {
                    name,
                    span: span.clone(),
                    previous,
                },
            });
        self.check(declared)?;
        Ok(ty)
    }

    pub fn complete_struct(
        &mut self,
        ty: TypeId,
        members: Vec<(String, TypeId)>,
        span: SourceSpan,
    ) -> Result<(), CompilerError> {
        let (names, types): (Vec<String>, Vec<TypeId>) = members.into_iter().unzip();
        let completed = self
            .types
            .complete_struct(ty, names, types)
            .map_err(|error| SemanticError::Type { error, span });
        self.check(completed)
    }

    /// Struct tag visible from the current scope
    pub fn lookup_struct(&self, name: &str) -> Option<TypeId> {
        self.tags.lookup(name, ScopeSet::All).map(|tag| tag.value)
    }
}
