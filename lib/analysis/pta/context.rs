//! Contexts and context-sensitivity policies.
//!
//! A context is an interned sequence of [`ContextElement`]s; the engine
//! only ever compares and hashes the resulting [`ContextId`], so any
//! sensitivity policy can be expressed by deciding which elements to
//! append and how many to keep.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analysis::pta::{CsCallSite, CsMethod, CsObj};
use crate::ir::{ClassId, MethodId, StmtRef};

/// One element of a context string.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum ContextElement {
    /// A call site, for call-site sensitivity.
    CallSite(StmtRef),
    /// An allocation site, for object sensitivity.
    Alloc(StmtRef),
    /// A class, for type sensitivity.
    Type(ClassId),
}

/// An opaque, comparable context token.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ContextId(u32);

impl ContextId {
    /// The empty context, used for the program entry point.
    pub const EMPTY: ContextId = ContextId(0);

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ctx{}", self.0)
    }
}

/// Interns context element sequences: two equal sequences always map to
/// the same `ContextId`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ContextPool {
    contexts: Vec<Vec<ContextElement>>,
    index: FxHashMap<Vec<ContextElement>, ContextId>,
}

impl ContextPool {
    pub fn new() -> ContextPool {
        let mut pool = ContextPool {
            contexts: Vec::new(),
            index: FxHashMap::default(),
        };
        // the empty context is always interned first
        pool.intern(Vec::new());
        pool
    }

    /// The empty context.
    pub fn empty_context(&self) -> ContextId {
        ContextId::EMPTY
    }

    /// The elements of a context, oldest first.
    pub fn elements(&self, context: ContextId) -> &[ContextElement] {
        &self.contexts[context.index()]
    }

    pub fn num_contexts(&self) -> usize {
        self.contexts.len()
    }

    /// Interns an element sequence.
    pub fn intern(&mut self, elements: Vec<ContextElement>) -> ContextId {
        if let Some(context) = self.index.get(&elements) {
            return *context;
        }
        let context = ContextId(self.contexts.len() as u32);
        self.contexts.push(elements.clone());
        self.index.insert(elements, context);
        context
    }

    /// Appends `element` to `base`, keeping only the `limit` newest
    /// elements.
    pub fn append_limited(
        &mut self,
        base: ContextId,
        element: ContextElement,
        limit: usize,
    ) -> ContextId {
        if limit == 0 {
            return self.empty_context();
        }
        let mut elements = self.elements(base).to_vec();
        elements.push(element);
        if elements.len() > limit {
            elements.drain(..elements.len() - limit);
        }
        self.intern(elements)
    }

    /// Truncates `base` to its `limit` newest elements.
    pub fn truncate_limited(&mut self, base: ContextId, limit: usize) -> ContextId {
        let elements = self.elements(base);
        if elements.len() <= limit {
            return base;
        }
        let elements = elements[elements.len() - limit..].to_vec();
        self.intern(elements)
    }
}

impl Default for ContextPool {
    fn default() -> ContextPool {
        ContextPool::new()
    }
}

/// Decides the context of callees and of newly allocated objects.
///
/// This is what makes the points-to engine context-sensitive. The engine
/// treats the returned ids as opaque tokens: implementations may encode
/// call-site strings, receiver objects, receiver types, or nothing at
/// all.
pub trait ContextSelector {
    /// The context for the program's entry method.
    fn empty_context(&self, pool: &mut ContextPool) -> ContextId;

    /// The context for the callee of a static or special call.
    fn select_call_context(
        &self,
        pool: &mut ContextPool,
        call_site: CsCallSite,
        callee: MethodId,
    ) -> ContextId;

    /// The context for the callee of a virtual or interface call, given
    /// the receiver object. `receiver_container` is the class declaring
    /// the method which allocated the receiver.
    fn select_instance_context(
        &self,
        pool: &mut ContextPool,
        call_site: CsCallSite,
        receiver: CsObj,
        receiver_container: ClassId,
        callee: MethodId,
    ) -> ContextId;

    /// The heap context for an object allocated at `alloc` by `method`.
    fn select_heap_context(
        &self,
        pool: &mut ContextPool,
        method: CsMethod,
        alloc: StmtRef,
    ) -> ContextId;
}

/// Context-insensitive: every method and every object lives in the empty
/// context.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContextInsensitive;

impl ContextSelector for ContextInsensitive {
    fn empty_context(&self, pool: &mut ContextPool) -> ContextId {
        pool.empty_context()
    }

    fn select_call_context(
        &self,
        pool: &mut ContextPool,
        _call_site: CsCallSite,
        _callee: MethodId,
    ) -> ContextId {
        pool.empty_context()
    }

    fn select_instance_context(
        &self,
        pool: &mut ContextPool,
        _call_site: CsCallSite,
        _receiver: CsObj,
        _receiver_container: ClassId,
        _callee: MethodId,
    ) -> ContextId {
        pool.empty_context()
    }

    fn select_heap_context(
        &self,
        pool: &mut ContextPool,
        _method: CsMethod,
        _alloc: StmtRef,
    ) -> ContextId {
        pool.empty_context()
    }
}

/// k-limited call-site sensitivity: a callee's context is the last `k`
/// call sites on the call string. Heap contexts keep `k - 1` elements.
#[derive(Clone, Copy, Debug)]
pub struct KCallSelector {
    k: usize,
}

impl KCallSelector {
    pub fn new(k: usize) -> KCallSelector {
        KCallSelector { k }
    }
}

impl ContextSelector for KCallSelector {
    fn empty_context(&self, pool: &mut ContextPool) -> ContextId {
        pool.empty_context()
    }

    fn select_call_context(
        &self,
        pool: &mut ContextPool,
        call_site: CsCallSite,
        _callee: MethodId,
    ) -> ContextId {
        pool.append_limited(
            call_site.context,
            ContextElement::CallSite(call_site.site),
            self.k,
        )
    }

    fn select_instance_context(
        &self,
        pool: &mut ContextPool,
        call_site: CsCallSite,
        _receiver: CsObj,
        _receiver_container: ClassId,
        _callee: MethodId,
    ) -> ContextId {
        pool.append_limited(
            call_site.context,
            ContextElement::CallSite(call_site.site),
            self.k,
        )
    }

    fn select_heap_context(
        &self,
        pool: &mut ContextPool,
        method: CsMethod,
        _alloc: StmtRef,
    ) -> ContextId {
        pool.truncate_limited(method.context, self.k.saturating_sub(1))
    }
}

/// k-limited object sensitivity: a callee's context is the last `k`
/// allocation sites of the chain of receiver objects. Static calls
/// propagate the caller's context. Heap contexts keep `k - 1` elements.
#[derive(Clone, Copy, Debug)]
pub struct KObjSelector {
    k: usize,
}

impl KObjSelector {
    pub fn new(k: usize) -> KObjSelector {
        KObjSelector { k }
    }
}

impl ContextSelector for KObjSelector {
    fn empty_context(&self, pool: &mut ContextPool) -> ContextId {
        pool.empty_context()
    }

    fn select_call_context(
        &self,
        _pool: &mut ContextPool,
        call_site: CsCallSite,
        _callee: MethodId,
    ) -> ContextId {
        call_site.context
    }

    fn select_instance_context(
        &self,
        pool: &mut ContextPool,
        _call_site: CsCallSite,
        receiver: CsObj,
        _receiver_container: ClassId,
        _callee: MethodId,
    ) -> ContextId {
        pool.append_limited(
            receiver.context,
            ContextElement::Alloc(receiver.alloc),
            self.k,
        )
    }

    fn select_heap_context(
        &self,
        pool: &mut ContextPool,
        method: CsMethod,
        _alloc: StmtRef,
    ) -> ContextId {
        pool.truncate_limited(method.context, self.k.saturating_sub(1))
    }
}

/// k-limited type sensitivity: like object sensitivity, but contexts are
/// the classes containing the receiver objects' allocation sites.
#[derive(Clone, Copy, Debug)]
pub struct KTypeSelector {
    k: usize,
}

impl KTypeSelector {
    pub fn new(k: usize) -> KTypeSelector {
        KTypeSelector { k }
    }
}

impl ContextSelector for KTypeSelector {
    fn empty_context(&self, pool: &mut ContextPool) -> ContextId {
        pool.empty_context()
    }

    fn select_call_context(
        &self,
        _pool: &mut ContextPool,
        call_site: CsCallSite,
        _callee: MethodId,
    ) -> ContextId {
        call_site.context
    }

    fn select_instance_context(
        &self,
        pool: &mut ContextPool,
        _call_site: CsCallSite,
        receiver: CsObj,
        receiver_container: ClassId,
        _callee: MethodId,
    ) -> ContextId {
        pool.append_limited(
            receiver.context,
            ContextElement::Type(receiver_container),
            self.k,
        )
    }

    fn select_heap_context(
        &self,
        pool: &mut ContextPool,
        method: CsMethod,
        _alloc: StmtRef,
    ) -> ContextId {
        pool.truncate_limited(method.context, self.k.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::MethodId;

    fn site(index: usize) -> StmtRef {
        StmtRef::new(MethodId(0), index)
    }

    #[test]
    fn test_interning_is_structural() {
        let mut pool = ContextPool::new();

        let a = pool.intern(vec![ContextElement::CallSite(site(1))]);
        let b = pool.intern(vec![ContextElement::CallSite(site(1))]);
        let c = pool.intern(vec![ContextElement::CallSite(site(2))]);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(pool.num_contexts(), 3);
    }

    #[test]
    fn test_append_limited_truncates() {
        let mut pool = ContextPool::new();

        let one = pool.append_limited(ContextId::EMPTY, ContextElement::CallSite(site(1)), 2);
        let two = pool.append_limited(one, ContextElement::CallSite(site(2)), 2);
        let three = pool.append_limited(two, ContextElement::CallSite(site(3)), 2);

        // only the two newest sites remain
        assert_eq!(
            pool.elements(three),
            &[
                ContextElement::CallSite(site(2)),
                ContextElement::CallSite(site(3)),
            ]
        );
    }

    #[test]
    fn test_append_limited_zero_is_empty() {
        let mut pool = ContextPool::new();

        let context = pool.append_limited(ContextId::EMPTY, ContextElement::CallSite(site(1)), 0);
        assert_eq!(context, ContextId::EMPTY);
    }

    #[test]
    fn test_selectors() {
        use crate::ir::ClassId;

        let mut pool = ContextPool::new();
        let callee = MethodId(1);
        let call = CsCallSite::new(ContextId::EMPTY, site(4));
        let receiver = CsObj {
            context: ContextId::EMPTY,
            alloc: site(9),
            class: ClassId(2),
        };
        let container = ClassId(3);

        let insensitive = ContextInsensitive;
        assert_eq!(
            insensitive.select_instance_context(&mut pool, call, receiver, container, callee),
            ContextId::EMPTY
        );

        let one_call = KCallSelector::new(1);
        let context = one_call.select_call_context(&mut pool, call, callee);
        assert_eq!(pool.elements(context), &[ContextElement::CallSite(site(4))]);
        // with k = 1 the heap context is empty
        let method = CsMethod::new(context, callee);
        assert_eq!(
            one_call.select_heap_context(&mut pool, method, site(0)),
            ContextId::EMPTY
        );

        let one_obj = KObjSelector::new(1);
        let context = one_obj.select_instance_context(&mut pool, call, receiver, container, callee);
        assert_eq!(pool.elements(context), &[ContextElement::Alloc(site(9))]);
        // static calls propagate the caller's context
        assert_eq!(
            one_obj.select_call_context(&mut pool, call, callee),
            call.context
        );

        let one_type = KTypeSelector::new(1);
        let context =
            one_type.select_instance_context(&mut pool, call, receiver, container, callee);
        assert_eq!(pool.elements(context), &[ContextElement::Type(container)]);
    }

    #[test]
    fn test_truncate_limited() {
        let mut pool = ContextPool::new();

        let one = pool.append_limited(ContextId::EMPTY, ContextElement::CallSite(site(1)), 2);
        let two = pool.append_limited(one, ContextElement::CallSite(site(2)), 2);

        let truncated = pool.truncate_limited(two, 1);
        assert_eq!(pool.elements(truncated), &[ContextElement::CallSite(site(2))]);

        // already short enough
        assert_eq!(pool.truncate_limited(one, 2), one);
        assert_eq!(pool.truncate_limited(two, 0), ContextId::EMPTY);
    }
}
