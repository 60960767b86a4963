//! Pointers, abstract objects, and their interning.
//!
//! Identity of every element is structural: two requests for the same
//! tuple return the same id. The [`ElementPool`] owns the interning
//! tables; ids index into dense arenas, which is what keeps points-to set
//! and pointer flow graph storage flat.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analysis::pta::ContextId;
use crate::ir::{ClassId, FieldId, MethodId, StmtRef, VarId};

/// A context-qualified method.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct CsMethod {
    pub context: ContextId,
    pub method: MethodId,
}

impl CsMethod {
    pub fn new(context: ContextId, method: MethodId) -> CsMethod {
        CsMethod { context, method }
    }
}

impl fmt::Display for CsMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.context, self.method)
    }
}

/// A context-qualified call site.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct CsCallSite {
    pub context: ContextId,
    pub site: StmtRef,
}

impl CsCallSite {
    pub fn new(context: ContextId, site: StmtRef) -> CsCallSite {
        CsCallSite { context, site }
    }
}

impl fmt::Display for CsCallSite {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.context, self.site)
    }
}

/// Identifies an interned context-qualified abstract object.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct CsObjId(pub(crate) u32);

impl CsObjId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CsObjId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "o{}", self.0)
    }
}

/// A context-qualified abstract object: an allocation site qualified by a
/// heap context, with the allocated class.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct CsObj {
    pub context: ContextId,
    pub alloc: StmtRef,
    pub class: ClassId,
}

/// Identifies an interned pointer.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PointerId(pub(crate) u32);

impl PointerId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// A node in the pointer flow graph.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Pointer {
    /// A context-qualified local variable.
    Var { context: ContextId, var: VarId },
    /// A static field. One pointer per field, never context-qualified.
    StaticField { field: FieldId },
    /// An instance field of a context-qualified object.
    InstanceField { object: CsObjId, field: FieldId },
    /// The elements of a context-qualified array object. Element indices
    /// are not distinguished.
    ArrayElement { object: CsObjId },
}

/// Interns pointers and abstract objects.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ElementPool {
    pointers: Vec<Pointer>,
    pointer_index: FxHashMap<Pointer, PointerId>,
    objects: Vec<CsObj>,
    object_index: FxHashMap<CsObj, CsObjId>,
}

impl ElementPool {
    pub fn new() -> ElementPool {
        ElementPool::default()
    }

    /// The pointer for a variable under a context.
    pub fn var_pointer(&mut self, context: ContextId, var: VarId) -> PointerId {
        self.intern_pointer(Pointer::Var { context, var })
    }

    /// The pointer for a static field.
    pub fn static_field_pointer(&mut self, field: FieldId) -> PointerId {
        self.intern_pointer(Pointer::StaticField { field })
    }

    /// The pointer for a field of a context-qualified object.
    pub fn instance_field_pointer(&mut self, object: CsObjId, field: FieldId) -> PointerId {
        self.intern_pointer(Pointer::InstanceField { object, field })
    }

    /// The pointer for the elements of a context-qualified array object.
    pub fn array_element_pointer(&mut self, object: CsObjId) -> PointerId {
        self.intern_pointer(Pointer::ArrayElement { object })
    }

    fn intern_pointer(&mut self, pointer: Pointer) -> PointerId {
        if let Some(id) = self.pointer_index.get(&pointer) {
            return *id;
        }
        let id = PointerId(self.pointers.len() as u32);
        self.pointers.push(pointer);
        self.pointer_index.insert(pointer, id);
        id
    }

    /// Looks a pointer up without interning it.
    pub fn find_pointer(&self, pointer: &Pointer) -> Option<PointerId> {
        self.pointer_index.get(pointer).cloned()
    }

    pub fn pointer(&self, id: PointerId) -> Pointer {
        self.pointers[id.index()]
    }

    /// All interned pointers with their ids.
    pub fn pointers(&self) -> impl Iterator<Item = (PointerId, Pointer)> + '_ {
        self.pointers
            .iter()
            .enumerate()
            .map(|(index, pointer)| (PointerId(index as u32), *pointer))
    }

    pub fn num_pointers(&self) -> usize {
        self.pointers.len()
    }

    /// The abstract object for an allocation site under a heap context.
    pub fn object(&mut self, context: ContextId, alloc: StmtRef, class: ClassId) -> CsObjId {
        let obj = CsObj {
            context,
            alloc,
            class,
        };
        if let Some(id) = self.object_index.get(&obj) {
            return *id;
        }
        let id = CsObjId(self.objects.len() as u32);
        self.objects.push(obj);
        self.object_index.insert(obj, id);
        id
    }

    pub fn obj(&self, id: CsObjId) -> CsObj {
        self.objects[id.index()]
    }

    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc_site(index: usize) -> StmtRef {
        StmtRef::new(MethodId(0), index)
    }

    #[test]
    fn test_pointer_identity_is_structural() {
        let mut pool = ElementPool::new();

        let a = pool.var_pointer(ContextId::EMPTY, VarId(3));
        let b = pool.var_pointer(ContextId::EMPTY, VarId(3));
        let c = pool.var_pointer(ContextId::EMPTY, VarId(4));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(pool.num_pointers(), 2);
    }

    #[test]
    fn test_pointer_variants_do_not_collide() {
        let mut pool = ElementPool::new();

        let object = pool.object(ContextId::EMPTY, alloc_site(0), ClassId(0));
        let var = pool.var_pointer(ContextId::EMPTY, VarId(0));
        let static_field = pool.static_field_pointer(FieldId(0));
        let instance_field = pool.instance_field_pointer(object, FieldId(0));
        let array = pool.array_element_pointer(object);

        assert_eq!(pool.num_pointers(), 4);
        assert_ne!(var, static_field);
        assert_ne!(static_field, instance_field);
        assert_ne!(instance_field, array);
    }

    #[test]
    fn test_object_identity_per_site_and_context() {
        let mut pool = ElementPool::new();
        let mut contexts = crate::analysis::pta::ContextPool::new();
        let heap = contexts.intern(vec![crate::analysis::pta::ContextElement::Alloc(
            alloc_site(7),
        )]);

        let a = pool.object(ContextId::EMPTY, alloc_site(0), ClassId(0));
        let b = pool.object(ContextId::EMPTY, alloc_site(0), ClassId(0));
        // same site under a different heap context is a different object
        let c = pool.object(heap, alloc_site(0), ClassId(0));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(pool.num_objects(), 2);
    }

    #[test]
    fn test_find_pointer_does_not_intern() {
        let mut pool = ElementPool::new();
        let a = pool.var_pointer(ContextId::EMPTY, VarId(0));

        assert_eq!(
            pool.find_pointer(&Pointer::Var {
                context: ContextId::EMPTY,
                var: VarId(0)
            }),
            Some(a)
        );
        assert_eq!(
            pool.find_pointer(&Pointer::Var {
                context: ContextId::EMPTY,
                var: VarId(9)
            }),
            None
        );
        assert_eq!(pool.num_pointers(), 1);
    }
}
