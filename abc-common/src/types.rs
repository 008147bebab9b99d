//! Common types used throughout the compiler
//!
//! This module defines data types that are shared across multiple
//! compiler phases: identifiers, the lexically scoped symbol table and
//! label/temporary generators.

use crate::source_loc::SourceSpan;
use std::collections::HashMap;
use thiserror::Error;

/// Symbol identifier
pub type SymbolId = u32;

/// Label identifier for code generation
pub type LabelId = u32;

/// Temporary variable identifier for IR
pub type TempId = u32;

/// Scope a declaration is added to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclScope {
    /// The innermost open scope
    Current,
    /// The file-level scope, regardless of nesting
    Root,
}

/// Set of scopes searched by a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeSet {
    /// Only the innermost open scope
    Current,
    /// Only the file-level scope
    Root,
    /// All open scopes, innermost first
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    #[error("redeclaration of '{name}'")]
    Redeclaration {
        name: String,
        previous: SourceSpan,
    },
}

/// Symbol table entry
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol<T> {
    pub id: SymbolId,
    pub name: String,
    pub value: T,
    pub span: SourceSpan,
    pub scope_level: u32,
}

/// Lexically scoped symbol table
///
/// Scope 0 is the root scope and is never closed. Symbol ids are handed
/// out monotonically and never reused.
#[derive(Debug, Clone)]
pub struct SymbolTable<T> {
    scopes: Vec<HashMap<String, Symbol<T>>>,
    next_id: SymbolId,
}

impl<T> SymbolTable<T> {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()], // Root scope
            next_id: 0,
        }
    }

    /// Current nesting depth (0 for the root scope)
    pub fn depth(&self) -> u32 {
        (self.scopes.len() - 1) as u32
    }

    /// Enter a new scope
    pub fn open_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Exit current scope, handing back the symbols that went out of scope
    pub fn close_scope(&mut self) -> Vec<Symbol<T>> {
        if self.scopes.len() <= 1 {
            return Vec::new();
        }
        let mut dropped: Vec<Symbol<T>> = self
            .scopes
            .pop()
            .map(|scope| scope.into_values().collect())
            .unwrap_or_default();
        dropped.sort_by_key(|s| s.id);
        dropped
    }

    /// Add a symbol; a name may be declared once per scope
    pub fn declare(
        &mut self,
        name: &str,
        value: T,
        span: SourceSpan,
        scope: DeclScope,
    ) -> Result<SymbolId, SymbolError> {
        let level = match scope {
            DeclScope::Current => self.scopes.len() - 1,
            DeclScope::Root => 0,
        };

        if let Some(previous) = self.scopes[level].get(name) {
            return Err(SymbolError::Redeclaration {
                name: name.to_string(),
                previous: previous.span.clone(),
            });
        }

        let id = self.next_id;
        self.next_id += 1;
        let symbol = Symbol {
            id,
            name: name.to_string(),
            value,
            span,
            scope_level: level as u32,
        };
        self.scopes[level].insert(name.to_string(), symbol);
        Ok(id)
    }

    /// Look up a symbol by name in the given scope set
    pub fn lookup(&self, name: &str, set: ScopeSet) -> Option<&Symbol<T>> {
        match set {
            ScopeSet::Current => self.scopes.last().and_then(|scope| scope.get(name)),
            ScopeSet::Root => self.scopes.first().and_then(|scope| scope.get(name)),
            ScopeSet::All => self.scopes.iter().rev().find_map(|scope| scope.get(name)),
        }
    }
}

impl<T> Default for SymbolTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Label generator for code generation
#[derive(Debug, Clone, Default)]
pub struct LabelGenerator {
    next_id: LabelId,
}

impl LabelGenerator {
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Generate a new unique label
    pub fn new_label(&mut self) -> LabelId {
        let label = self.next_id;
        self.next_id += 1;
        label
    }
}

/// Temporary variable generator for IR
#[derive(Debug, Clone, Default)]
pub struct TempGenerator {
    next_id: TempId,
}

impl TempGenerator {
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Generate a new temporary variable ID
    pub fn new_temp(&mut self) -> TempId {
        let temp = self.next_id;
        self.next_id += 1;
        temp
    }

    /// Make sure future temporaries do not collide with `id`
    pub fn reserve(&mut self, id: TempId) {
        if id >= self.next_id {
            self.next_id = id + 1;
        }
    }

    pub fn reset(&mut self) {
        self.next_id = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_table_scoping() {
        let mut table = SymbolTable::new();

        table.declare("A", 1, SourceSpan::dummy(), DeclScope::Root).unwrap();

        table.open_scope();
        let local = table.declare("a", 2, SourceSpan::dummy(), DeclScope::Current).unwrap();
        assert_eq!(table.lookup("a", ScopeSet::Current).map(|s| s.id), Some(local));
        assert_eq!(table.lookup("A", ScopeSet::All).map(|s| s.value), Some(1));
        assert!(table.lookup("A", ScopeSet::Current).is_none());

        let dropped = table.close_scope();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].name, "a");
        assert!(table.lookup("a", ScopeSet::All).is_none());
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        let mut table = SymbolTable::new();
        table.declare("x", 1, SourceSpan::on_line(1, 1, 1), DeclScope::Current).unwrap();

        let err = table
            .declare("x", 2, SourceSpan::on_line(2, 1, 1), DeclScope::Current)
            .unwrap_err();
        assert_eq!(err.to_string(), "redeclaration of 'x'");

        // Shadowing in a nested scope is fine
        table.open_scope();
        assert!(table.declare("x", 3, SourceSpan::dummy(), DeclScope::Current).is_ok());
        assert_eq!(table.lookup("x", ScopeSet::All).map(|s| s.value), Some(3));
        assert_eq!(table.lookup("x", ScopeSet::Root).map(|s| s.value), Some(1));
    }

    #[test]
    fn test_declare_to_root_from_nested_scope() {
        let mut table = SymbolTable::new();
        table.open_scope();
        table.open_scope();
        table.declare("X", 5, SourceSpan::dummy(), DeclScope::Root).unwrap();
        assert_eq!(table.depth(), 2);
        table.close_scope();
        table.close_scope();
        assert_eq!(table.lookup("X", ScopeSet::Current).map(|s| s.value), Some(5));
        // The root scope never closes
        assert!(table.close_scope().is_empty());
        assert_eq!(table.depth(), 0);
    }

    #[test]
    fn test_label_generator() {
        let mut gen = LabelGenerator::new();

        assert_eq!(gen.new_label(), 0);
        assert_eq!(gen.new_label(), 1);
    }

    #[test]
    fn test_temp_generator() {
        let mut gen = TempGenerator::new();

        assert_eq!(gen.new_temp(), 0);
        gen.reserve(5);
        assert_eq!(gen.new_temp(), 6);
        gen.reset();
        assert_eq!(gen.new_temp(), 0);
    }
}
