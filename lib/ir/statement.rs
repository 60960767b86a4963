use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ir::{ClassId, FieldId, MethodId, VarId};

/// Identifies a statement by its method and position in that method's body.
///
/// A `StmtRef` is also the identity of an allocation site (when it names a
/// `Statement::New`) and of a call site (when it names a
/// `Statement::Invoke`).
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct StmtRef {
    method: MethodId,
    index: usize,
}

impl StmtRef {
    pub fn new(method: MethodId, index: usize) -> StmtRef {
        StmtRef { method, index }
    }

    pub fn method(&self) -> MethodId {
        self.method
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for StmtRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.method, self.index)
    }
}

/// The dispatch discipline of a call site.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum CallKind {
    Static,
    Special,
    Virtual,
    Interface,
    Dynamic,
}

impl CallKind {
    /// True for call kinds which dispatch through a receiver variable.
    pub fn is_instance(&self) -> bool {
        matches!(self, CallKind::Special | CallKind::Virtual | CallKind::Interface)
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CallKind::Static => write!(f, "static"),
            CallKind::Special => write!(f, "special"),
            CallKind::Virtual => write!(f, "virtual"),
            CallKind::Interface => write!(f, "interface"),
            CallKind::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// A call site: a statically declared target reference plus operands.
///
/// The target reference is a class and a subsignature; what it resolves to
/// depends on the call kind and, for virtual and interface calls, on the
/// runtime type of the receiver.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct CallSite {
    kind: CallKind,
    class: ClassId,
    subsignature: String,
    receiver: Option<VarId>,
    arguments: Vec<VarId>,
    result: Option<VarId>,
}

impl CallSite {
    pub fn new<S: Into<String>>(
        kind: CallKind,
        class: ClassId,
        subsignature: S,
        receiver: Option<VarId>,
        arguments: Vec<VarId>,
        result: Option<VarId>,
    ) -> CallSite {
        CallSite {
            kind,
            class,
            subsignature: subsignature.into(),
            receiver,
            arguments,
            result,
        }
    }

    pub fn kind(&self) -> CallKind {
        self.kind
    }

    /// The statically declared class of the target reference.
    pub fn class(&self) -> ClassId {
        self.class
    }

    pub fn subsignature(&self) -> &str {
        &self.subsignature
    }

    pub fn receiver(&self) -> Option<VarId> {
        self.receiver
    }

    pub fn arguments(&self) -> &[VarId] {
        &self.arguments
    }

    /// The variable receiving the call's return value, if any.
    pub fn result(&self) -> Option<VarId> {
        self.result
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(result) = self.result {
            write!(f, "{} = ", result)?;
        }
        write!(f, "{} ", self.kind)?;
        if let Some(receiver) = self.receiver {
            write!(f, "{}.", receiver)?;
        }
        write!(f, "{}.{}(", self.class, self.subsignature)?;
        let mut is_first = true;
        for argument in &self.arguments {
            if !is_first {
                write!(f, ", ")?;
            }
            write!(f, "{}", argument)?;
            is_first = false;
        }
        write!(f, ")")
    }
}

/// A statement in a method body.
///
/// This is a closed type: the analyses match on it exhaustively, so a new
/// statement kind fails to compile until every consumer handles it.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Statement {
    /// `result = new class`
    New { result: VarId, class: ClassId },
    /// `result = source`
    Copy { result: VarId, source: VarId },
    /// `result = field` where `field` is static
    LoadStatic { result: VarId, field: FieldId },
    /// `field = source` where `field` is static
    StoreStatic { field: FieldId, source: VarId },
    /// `result = base.field`
    LoadField {
        result: VarId,
        base: VarId,
        field: FieldId,
    },
    /// `base.field = source`
    StoreField {
        base: VarId,
        field: FieldId,
        source: VarId,
    },
    /// `result = array[*]` - array elements are not distinguished by index
    LoadArray { result: VarId, array: VarId },
    /// `array[*] = source`
    StoreArray { array: VarId, source: VarId },
    /// A method call.
    Invoke(CallSite),
    /// `return value`
    Return { value: Option<VarId> },
    /// A statement with no effect on any analysis in this crate.
    Nop,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Statement::New { result, class } => write!(f, "{} = new {}", result, class),
            Statement::Copy { result, source } => write!(f, "{} = {}", result, source),
            Statement::LoadStatic { result, field } => write!(f, "{} = {}", result, field),
            Statement::StoreStatic { field, source } => write!(f, "{} = {}", field, source),
            Statement::LoadField {
                result,
                base,
                field,
            } => write!(f, "{} = {}.{}", result, base, field),
            Statement::StoreField {
                base,
                field,
                source,
            } => write!(f, "{}.{} = {}", base, field, source),
            Statement::LoadArray { result, array } => write!(f, "{} = {}[*]", result, array),
            Statement::StoreArray { array, source } => write!(f, "{}[*] = {}", array, source),
            Statement::Invoke(call_site) => write!(f, "{}", call_site),
            Statement::Return { value } => match value {
                Some(value) => write!(f, "return {}", value),
                None => write!(f, "return"),
            },
            Statement::Nop => write!(f, "nop"),
        }
    }
}
