use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::ir::MethodId;

/// Identifies a `Class` within a `Program`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// A class or interface in the program's hierarchy.
///
/// Direct hierarchy descendants (subclasses, sub-interfaces, implementors)
/// are maintained by `Program` as classes are added, so downward hierarchy
/// walks never have to scan the whole program.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Class {
    name: String,
    superclass: Option<ClassId>,
    interfaces: Vec<ClassId>,
    is_interface: bool,
    // Declared methods, keyed by subsignature.
    methods: BTreeMap<String, MethodId>,
    subclasses: Vec<ClassId>,
    subinterfaces: Vec<ClassId>,
    implementors: Vec<ClassId>,
}

impl Class {
    pub(crate) fn new(
        name: String,
        superclass: Option<ClassId>,
        interfaces: Vec<ClassId>,
        is_interface: bool,
    ) -> Class {
        Class {
            name,
            superclass,
            interfaces,
            is_interface,
            methods: BTreeMap::new(),
            subclasses: Vec::new(),
            subinterfaces: Vec::new(),
            implementors: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The direct superclass, if any. Always `None` for interfaces.
    pub fn superclass(&self) -> Option<ClassId> {
        self.superclass
    }

    /// The interfaces this class implements, or the interfaces this
    /// interface extends.
    pub fn interfaces(&self) -> &[ClassId] {
        &self.interfaces
    }

    pub fn is_interface(&self) -> bool {
        self.is_interface
    }

    /// The method this class itself declares for the given subsignature.
    /// Inherited methods are not considered.
    pub fn declared_method(&self, subsignature: &str) -> Option<MethodId> {
        self.methods.get(subsignature).cloned()
    }

    /// All methods this class declares.
    pub fn declared_methods(&self) -> impl Iterator<Item = MethodId> + '_ {
        self.methods.values().cloned()
    }

    /// Classes which name this class as their direct superclass.
    pub fn direct_subclasses(&self) -> &[ClassId] {
        &self.subclasses
    }

    /// Interfaces which directly extend this interface.
    pub fn direct_subinterfaces(&self) -> &[ClassId] {
        &self.subinterfaces
    }

    /// Classes which directly implement this interface.
    pub fn direct_implementors(&self) -> &[ClassId] {
        &self.implementors
    }

    pub(crate) fn add_declared_method(&mut self, subsignature: String, method: MethodId) -> bool {
        if self.methods.contains_key(&subsignature) {
            return false;
        }
        self.methods.insert(subsignature, method);
        true
    }

    pub(crate) fn add_subclass(&mut self, class: ClassId) {
        self.subclasses.push(class);
    }

    pub(crate) fn add_subinterface(&mut self, class: ClassId) {
        self.subinterfaces.push(class);
    }

    pub(crate) fn add_implementor(&mut self, class: ClassId) {
        self.implementors.push(class);
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
