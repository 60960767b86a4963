use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ir::{MethodId, StmtRef};

/// Identifies a `Variable` within a `Program`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct VarId(pub(crate) u32);

impl VarId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A local variable of a method.
///
/// A variable keeps an index of the statements which use it as a field/array
/// base or as a call receiver. The index is filled in when the owning
/// method's body is set, and is what lets the points-to engine react to a
/// variable's points-to set growing without rescanning method bodies.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Variable {
    name: String,
    method: MethodId,
    load_fields: Vec<StmtRef>,
    store_fields: Vec<StmtRef>,
    load_arrays: Vec<StmtRef>,
    store_arrays: Vec<StmtRef>,
    invokes: Vec<StmtRef>,
}

impl Variable {
    pub(crate) fn new(name: String, method: MethodId) -> Variable {
        Variable {
            name,
            method,
            load_fields: Vec::new(),
            store_fields: Vec::new(),
            load_arrays: Vec::new(),
            store_arrays: Vec::new(),
            invokes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The method this variable belongs to.
    pub fn method(&self) -> MethodId {
        self.method
    }

    /// Instance field loads with this variable as the base, `x = this.f`.
    pub fn load_fields(&self) -> &[StmtRef] {
        &self.load_fields
    }

    /// Instance field stores with this variable as the base, `this.f = x`.
    pub fn store_fields(&self) -> &[StmtRef] {
        &self.store_fields
    }

    /// Array loads with this variable as the array, `x = this[*]`.
    pub fn load_arrays(&self) -> &[StmtRef] {
        &self.load_arrays
    }

    /// Array stores with this variable as the array, `this[*] = x`.
    pub fn store_arrays(&self) -> &[StmtRef] {
        &self.store_arrays
    }

    /// Calls with this variable as the receiver, `this.m(..)`.
    pub fn invokes(&self) -> &[StmtRef] {
        &self.invokes
    }

    pub(crate) fn add_load_field(&mut self, at: StmtRef) {
        self.load_fields.push(at);
    }

    pub(crate) fn add_store_field(&mut self, at: StmtRef) {
        self.store_fields.push(at);
    }

    pub(crate) fn add_load_array(&mut self, at: StmtRef) {
        self.load_arrays.push(at);
    }

    pub(crate) fn add_store_array(&mut self, at: StmtRef) {
        self.store_arrays.push(at);
    }

    pub(crate) fn add_invoke(&mut self, at: StmtRef) {
        self.invokes.push(at);
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
