use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ir::ClassId;

/// Identifies a `Field` within a `Program`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct FieldId(pub(crate) u32);

impl FieldId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// A field declared by a class.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Field {
    name: String,
    class: ClassId,
    is_static: bool,
}

impl Field {
    pub(crate) fn new(name: String, class: ClassId, is_static: bool) -> Field {
        Field {
            name,
            class,
            is_static,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The class declaring this field.
    pub fn class(&self) -> ClassId {
        self.class
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
