//! Symbol tables used by the semantic analyzer.
//!
//! Grounded on `semantic_analysis/table.py`. The reference implementation links scopes with
//! an `enclosing_scope` pointer per `ScopedSymbolTable`; we represent the same chain as a
//! `Vec<ScopedSymbolTable>` stack (scope 0 is always the global scope) since ownership of a
//! borrowed parent pointer while also mutating the child scope is awkward in Rust. Lookup
//! walks the stack from the top (innermost) down, which is exactly the chain the original
//! walks via `enclosing_scope`.

use indexmap::IndexMap;

use crate::ctype::CType;

#[derive(Debug, Clone)]
pub struct VarSymbol {
    pub name: String,
    pub ty: CType,
}

#[derive(Debug, Clone)]
pub struct ConstSymbol {
    pub name: String,
    pub ty: CType,
}

#[derive(Debug, Clone)]
pub struct FunctionSymbol {
    pub name: String,
    pub return_type: CType,
    /// `None` for a variadic or unknown-arity builtin (e.g. `printf`/`scanf`).
    pub params: Option<Vec<VarSymbol>>,
}

#[derive(Debug, Clone)]
pub struct StructSymbol {
    pub name: String,
    pub fields: Vec<(String, CType)>,
}

#[derive(Debug, Clone)]
pub enum Symbol {
    Var(VarSymbol),
    Const(ConstSymbol),
    Function(FunctionSymbol),
    Struct(StructSymbol),
}

impl Symbol {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Var(s) => &s.name,
            Self::Const(s) => &s.name,
            Self::Function(s) => &s.name,
            Self::Struct(s) => &s.name,
        }
    }
}

/// A single nesting level: function scope, block scope, or the root global scope.
#[derive(Debug, Clone)]
pub struct ScopedSymbolTable {
    pub scope_name: String,
    pub scope_level: usize,
    symbols: IndexMap<String, Symbol>,
}

impl ScopedSymbolTable {
    #[must_use]
    pub fn new(scope_name: impl Into<String>, scope_level: usize) -> Self {
        Self { scope_name: scope_name.into(), scope_level, symbols: IndexMap::new() }
    }

    pub fn insert(&mut self, symbol: Symbol) {
        self.symbols.insert(symbol.name().to_string(), symbol);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }
}

/// The live stack of scopes during semantic analysis; index 0 is the global scope.
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<ScopedSymbolTable>,
}

impl ScopeStack {
    #[must_use]
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    pub fn push(&mut self, table: ScopedSymbolTable) {
        self.scopes.push(table);
    }

    pub fn pop(&mut self) -> Option<ScopedSymbolTable> {
        self.scopes.pop()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Inserts a symbol into the innermost (current) scope.
    ///
    /// # Panics
    /// Panics if there is no current scope.
    pub fn insert(&mut self, symbol: Symbol) {
        self.scopes.last_mut().expect("scope stack is never empty during analysis").insert(symbol);
    }

    /// Looks up `name` restricted to the innermost scope only (used for uniqueness checks).
    #[must_use]
    pub fn lookup_current(&self, name: &str) -> Option<&Symbol> {
        self.scopes.last().and_then(|scope| scope.get(name))
    }

    /// Walks the scope chain from innermost to outermost (the global scope is always last).
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    #[must_use]
    pub fn current_scope_name(&self) -> &str {
        self.scopes.last().map_or("", |scope| scope.scope_name.as_str())
    }

    #[must_use]
    pub fn current_scope_level(&self) -> usize {
        self.scopes.last().map_or(0, |scope| scope.scope_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_outward_through_nested_scopes() {
        let mut stack = ScopeStack::new();
        stack.push(ScopedSymbolTable::new("global", 1));
        stack.insert(Symbol::Var(VarSymbol { name: "g".to_string(), ty: CType::int() }));
        stack.push(ScopedSymbolTable::new("main", 2));
        stack.insert(Symbol::Var(VarSymbol { name: "x".to_string(), ty: CType::int() }));

        assert!(stack.lookup("g").is_some());
        assert!(stack.lookup("x").is_some());
        assert!(stack.lookup_current("g").is_none());

        stack.pop();
        assert!(stack.lookup("x").is_none());
        assert!(stack.lookup("g").is_some());
    }
}
