//! Simulated addressable program memory: scopes, frames, the call stack, and the flat
//! address-keyed `raw_store`.
//!
//! Grounded on `interpreter/memory.py`, but follows spec §4.5 (not the original, which calls
//! `get_address`/`get_at_address`/`set_at_address`/`allocate` methods its own `Memory` class
//! never actually defines) as the authoritative contract: named bindings resolve to either an
//! address into `raw_store`, a constant, a user function, or a builtin — and addresses are
//! allocated monotonically from a fixed high base so pointer values look like real addresses.

use std::{collections::HashSet, rc::Rc};

use ahash::AHashMap;
use indexmap::IndexMap;

use crate::{
    ast::FunctionDecl,
    builtins::Builtin,
    ctype::CType,
    error::{CError, CResult},
    number::Number,
};

/// An address into `raw_store`. Opaque to callers; only ordering and equality are meaningful.
pub type Address = u64;

/// Addresses below this are never handed out by `allocate`, keeping them clearly distinguishable
/// from small integers in diagnostics (spec §4.5).
const ADDRESS_BASE: Address = 1_000_000;

/// What a stored value at an address actually is.
#[derive(Debug, Clone)]
pub enum StoredValue {
    Number(Number),
    Function(Rc<FunctionDecl>),
    Builtin(Rc<Builtin>),
}

impl StoredValue {
    /// # Errors
    /// Returns `CError::Runtime` if this binding does not hold a `Number`.
    pub fn as_number(&self) -> CResult<&Number> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Function(_) => Err(CError::runtime("cannot read a function binding as a value")),
            Self::Builtin(_) => Err(CError::runtime("cannot read a builtin binding as a value")),
        }
    }
}

/// What a name in a scope is bound to: an address (ordinary variable), a constant (no storage
/// slot), or directly a function/builtin (spec §4.6's `IncludeLibrary`/`FunctionDecl` visits).
#[derive(Debug, Clone)]
pub enum Binding {
    Address(Address),
    Const(Number),
    Function(Rc<FunctionDecl>),
    Builtin(Rc<Builtin>),
}

/// A name -> binding table. Scopes form a singly-linked list via the frame/stack structure
/// below rather than an owned parent pointer (see `symbol.rs` for the same tradeoff).
#[derive(Debug, Default)]
struct Scope {
    bindings: AHashMap<String, Binding>,
}

/// One function activation: a stack of nested block scopes, innermost last.
#[derive(Debug)]
struct Frame {
    scopes: Vec<Scope>,
}

impl Frame {
    fn new() -> Self {
        Self { scopes: vec![Scope::default()] }
    }

    fn new_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    fn del_scope(&mut self) {
        self.scopes.pop();
        assert!(!self.scopes.is_empty(), "a frame always retains its function-level scope");
    }

    fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|scope| scope.bindings.get(name))
    }

    fn current_scope_mut(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("frame always has at least one scope")
    }
}

/// Simulated program memory: a global scope, a call stack of frames, and the flat
/// address-keyed store backing every declared variable.
#[derive(Debug)]
pub struct Memory {
    global: Scope,
    frames: Vec<Frame>,
    raw_store: AHashMap<Address, StoredValue>,
    next_address: Address,
    dyn_alloc: HashSet<Address>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            global: Scope::default(),
            frames: Vec::new(),
            raw_store: AHashMap::new(),
            next_address: ADDRESS_BASE,
            dyn_alloc: HashSet::new(),
        }
    }

    fn current_scope_mut(&mut self) -> &mut Scope {
        match self.frames.last_mut() {
            Some(frame) => frame.current_scope_mut(),
            None => &mut self.global,
        }
    }

    pub fn new_frame(&mut self) {
        self.frames.push(Frame::new());
    }

    pub fn del_frame(&mut self) {
        self.frames.pop();
    }

    pub fn new_scope(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.new_scope();
        }
    }

    pub fn del_scope(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.del_scope();
        }
    }

    /// Reserves `n` consecutive addresses and returns the first one.
    pub fn allocate(&mut self, n: u32) -> Address {
        let base = self.next_address;
        self.next_address += Address::from(n.max(1));
        base
    }

    /// Records `address` as a live dynamic (`malloc`) allocation.
    pub fn track_dynamic(&mut self, address: Address) {
        self.dyn_alloc.insert(address);
    }

    /// Removes `address` from the live dynamic-allocation set and invalidates its slot.
    ///
    /// # Errors
    /// Returns `CError::Runtime` if `address` was not a live dynamic allocation (spec §9: a
    /// double-`free` or a `free` of a non-dynamic address is an error).
    pub fn free(&mut self, address: Address) -> CResult<()> {
        if !self.dyn_alloc.remove(&address) {
            return Err(CError::runtime("cannot free memory that was not dynamically allocated"));
        }
        self.raw_store.remove(&address);
        Ok(())
    }

    /// Declares `name` with type `ty` in the current scope, allocating storage for it and
    /// binding the name to the new address. The slot starts with an unspecified in-range value.
    pub fn declare(&mut self, ty: &CType, name: &str) {
        let address = self.allocate(ty.size_bytes());
        self.raw_store.insert(address, StoredValue::Number(Number::uninitialized(ty)));
        self.current_scope_mut().bindings.insert(name.to_string(), Binding::Address(address));
    }

    /// Binds `name` to an address that storage was already reserved for, without allocating
    /// a fresh one. Used for multi-slot struct variables, where the caller lays out one
    /// address per field itself and only the base address gets a name.
    pub fn bind_address(&mut self, name: &str, address: Address) {
        self.current_scope_mut().bindings.insert(name.to_string(), Binding::Address(address));
    }

    /// Binds `name` directly to a constant value in the current scope (no storage slot).
    pub fn declare_constant(&mut self, name: &str, value: Number) {
        self.current_scope_mut().bindings.insert(name.to_string(), Binding::Const(value));
    }

    /// Binds `name` directly to a user function declaration in the current scope.
    pub fn declare_function(&mut self, name: &str, decl: Rc<FunctionDecl>) {
        self.current_scope_mut().bindings.insert(name.to_string(), Binding::Function(decl));
    }

    /// Binds `name` directly to a builtin in the current scope.
    pub fn declare_builtin(&mut self, name: &str, builtin: Rc<Builtin>) {
        self.current_scope_mut().bindings.insert(name.to_string(), Binding::Builtin(builtin));
    }

    /// Walks the scope chain from innermost to outermost, falling back to the global scope.
    ///
    /// # Errors
    /// Returns `CError::Runtime` if `name` is unbound; semantic analysis must prevent this.
    pub fn lookup(&self, name: &str) -> CResult<&Binding> {
        if let Some(frame) = self.frames.last()
            && let Some(binding) = frame.lookup(name)
        {
            return Ok(binding);
        }
        self.global
            .bindings
            .get(name)
            .ok_or_else(|| CError::runtime(format!("failed to find '{name}' in the current scope")))
    }

    /// Resolves `name` to its bound address.
    ///
    /// # Errors
    /// Returns `CError::Runtime` if `name` is bound to a constant, function, or builtin.
    pub fn get_address(&self, name: &str) -> CResult<Address> {
        match self.lookup(name)? {
            Binding::Address(address) => Ok(*address),
            _ => Err(CError::runtime(format!("'{name}' is not an addressable variable"))),
        }
    }

    /// Returns the stored value at `address`. Reading a never-written address yields a fresh
    /// default `int` (spec §4.5).
    #[must_use]
    pub fn load(&self, address: Address) -> StoredValue {
        self.raw_store.get(&address).cloned().unwrap_or_else(|| StoredValue::Number(Number::uninitialized(&CType::int())))
    }

    /// Writes `value` at `address`.
    pub fn store(&mut self, address: Address, value: Number) {
        self.raw_store.insert(address, StoredValue::Number(value));
    }

    /// Stores a raw (non-Number) value at an address, used for function/builtin slots that
    /// also occupy `raw_store` directly (e.g. when taken by address).
    pub fn store_raw(&mut self, address: Address, value: StoredValue) {
        self.raw_store.insert(address, value);
    }

    /// Resolves `name` and returns its bound value.
    ///
    /// # Errors
    /// Returns `CError::Runtime` if `name` is bound to a constant/function/builtin and the
    /// caller asked for a plain value read on an address binding that isn't one, or if `name`
    /// is unbound.
    pub fn read(&self, name: &str) -> CResult<StoredValue> {
        match self.lookup(name)? {
            Binding::Address(address) => Ok(self.load(*address)),
            Binding::Const(value) => Ok(StoredValue::Number(value.clone())),
            Binding::Function(decl) => Ok(StoredValue::Function(Rc::clone(decl))),
            Binding::Builtin(builtin) => Ok(StoredValue::Builtin(Rc::clone(builtin))),
        }
    }

    /// Resolves `name` and writes `value` through it.
    ///
    /// # Errors
    /// Returns `CError::Runtime` if `name` is bound to a constant (writing a constant binding
    /// is a hard error per spec §4.5).
    pub fn write(&mut self, name: &str, value: Number) -> CResult<()> {
        let address = self.get_address(name)?;
        self.store(address, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_then_read_round_trips_through_an_address() {
        let mut mem = Memory::new();
        mem.declare(&CType::int(), "x");
        mem.write("x", Number::int(42)).unwrap();
        let value = mem.read("x").unwrap();
        assert_eq!(value.as_number().unwrap().as_i64(), 42);
    }

    #[test]
    fn constants_reject_writes_through_get_address() {
        let mut mem = Memory::new();
        mem.declare_constant("NULL", Number::int(0));
        assert!(mem.get_address("NULL").is_err());
    }

    #[test]
    fn frame_scopes_shadow_globals_and_unwind_on_pop() {
        let mut mem = Memory::new();
        mem.declare(&CType::int(), "x");
        mem.write("x", Number::int(1)).unwrap();

        mem.new_frame();
        mem.declare(&CType::int(), "x");
        mem.write("x", Number::int(2)).unwrap();
        assert_eq!(mem.read("x").unwrap().as_number().unwrap().as_i64(), 2);
        mem.del_frame();

        assert_eq!(mem.read("x").unwrap().as_number().unwrap().as_i64(), 1);
    }

    #[test]
    fn free_of_non_dynamic_address_is_an_error() {
        let mut mem = Memory::new();
        mem.declare(&CType::int(), "x");
        let address = mem.get_address("x").unwrap();
        assert!(mem.free(address).is_err());
    }

    #[test]
    fn double_free_is_an_error() {
        let mut mem = Memory::new();
        let address = mem.allocate(4);
        mem.track_dynamic(address);
        mem.free(address).unwrap();
        assert!(mem.free(address).is_err());
    }

    #[test]
    fn allocate_is_monotonic_from_the_high_base() {
        let mut mem = Memory::new();
        let a = mem.allocate(4);
        let b = mem.allocate(4);
        assert!(a >= ADDRESS_BASE);
        assert!(b > a);
    }
}
