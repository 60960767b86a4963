use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ir::{ClassId, Statement, VarId};

/// Identifies a `Method` within a `Program`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct MethodId(pub(crate) u32);

impl MethodId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// A method declared by a class.
///
/// Parameter variables and the implicit receiver variable are created when
/// the method is declared. Return variables are collected from the `Return`
/// statements when the body is set.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Method {
    subsignature: String,
    class: ClassId,
    is_static: bool,
    is_abstract: bool,
    parameters: Vec<VarId>,
    return_vars: Vec<VarId>,
    this: Option<VarId>,
    body: Vec<Statement>,
}

impl Method {
    pub(crate) fn new(
        subsignature: String,
        class: ClassId,
        is_static: bool,
        is_abstract: bool,
    ) -> Method {
        Method {
            subsignature,
            class,
            is_static,
            is_abstract,
            parameters: Vec::new(),
            return_vars: Vec::new(),
            this: None,
            body: Vec::new(),
        }
    }

    /// The method's name, without the parameter portion of the
    /// subsignature.
    pub fn name(&self) -> &str {
        match self.subsignature.split_once('(') {
            Some((name, _)) => name,
            None => &self.subsignature,
        }
    }

    /// The subsignature identifying this method for dispatch, e.g.
    /// `"equals(Object)"`.
    pub fn subsignature(&self) -> &str {
        &self.subsignature
    }

    /// The class declaring this method.
    pub fn class(&self) -> ClassId {
        self.class
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// The parameter variables, in declaration order.
    pub fn parameters(&self) -> &[VarId] {
        &self.parameters
    }

    /// The variables returned by this method's `Return` statements.
    pub fn return_vars(&self) -> &[VarId] {
        &self.return_vars
    }

    /// The implicit receiver variable. `None` for static methods.
    pub fn this(&self) -> Option<VarId> {
        self.this
    }

    /// The method body. Empty until set, and always empty for abstract
    /// methods.
    pub fn body(&self) -> &[Statement] {
        &self.body
    }

    pub(crate) fn set_this(&mut self, this: VarId) {
        self.this = Some(this);
    }

    pub(crate) fn add_parameter(&mut self, parameter: VarId) {
        self.parameters.push(parameter);
    }

    pub(crate) fn set_body(&mut self, body: Vec<Statement>, return_vars: Vec<VarId>) {
        self.body = body;
        self.return_vars = return_vars;
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.class, self.subsignature)
    }
}
