use serde::{Deserialize, Serialize};

use crate::analysis::pta::{
    ContextId, ContextPool, CsCallGraph, CsObj, CsObjId, ElementPool, Pointer, PointerFlowGraph,
    PointerId, PointsToSet,
};
use crate::ir::{FieldId, VarId};

/// The immutable result of a points-to analysis run: the final points-to
/// sets, the pointer flow graph, and the discovered call graph.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PointsToResult {
    contexts: ContextPool,
    elements: ElementPool,
    points_to: Vec<PointsToSet>,
    pfg: PointerFlowGraph,
    call_graph: CsCallGraph,
    empty: PointsToSet,
}

impl PointsToResult {
    pub(crate) fn new(
        contexts: ContextPool,
        elements: ElementPool,
        points_to: Vec<PointsToSet>,
        pfg: PointerFlowGraph,
        call_graph: CsCallGraph,
    ) -> PointsToResult {
        PointsToResult {
            contexts,
            elements,
            points_to,
            pfg,
            call_graph,
            empty: PointsToSet::new(),
        }
    }

    /// The points-to set of `pointer`. Empty if the pointer was never
    /// reached by the analysis.
    pub fn points_to(&self, pointer: &Pointer) -> &PointsToSet {
        match self.elements.find_pointer(pointer) {
            Some(id) => self.points_to_pointer_id(id),
            None => &self.empty,
        }
    }

    /// The points-to set of an interned pointer id.
    pub fn points_to_pointer_id(&self, pointer: PointerId) -> &PointsToSet {
        self.points_to.get(pointer.index()).unwrap_or(&self.empty)
    }

    /// The points-to set of a variable under one context.
    pub fn points_to_var(&self, context: ContextId, var: VarId) -> &PointsToSet {
        self.points_to(&Pointer::Var { context, var })
    }

    /// The union of a variable's points-to sets over every context it was
    /// analyzed under.
    pub fn points_to_var_all(&self, var: VarId) -> PointsToSet {
        let mut all = PointsToSet::new();
        for (id, pointer) in self.elements.pointers() {
            if let Pointer::Var { var: pointer_var, .. } = pointer {
                if pointer_var == var {
                    for object in self.points_to_pointer_id(id).iter() {
                        all.insert(object);
                    }
                }
            }
        }
        all
    }

    /// The points-to set of a static field.
    pub fn points_to_static_field(&self, field: FieldId) -> &PointsToSet {
        self.points_to(&Pointer::StaticField { field })
    }

    /// The points-to set of a field of a context-qualified object.
    pub fn points_to_instance_field(&self, object: CsObjId, field: FieldId) -> &PointsToSet {
        self.points_to(&Pointer::InstanceField { object, field })
    }

    /// The points-to set of the elements of a context-qualified array
    /// object.
    pub fn points_to_array_element(&self, object: CsObjId) -> &PointsToSet {
        self.points_to(&Pointer::ArrayElement { object })
    }

    /// The data of a context-qualified object.
    pub fn object(&self, id: CsObjId) -> CsObj {
        self.elements.obj(id)
    }

    /// The call graph discovered during the run.
    pub fn call_graph(&self) -> &CsCallGraph {
        &self.call_graph
    }

    /// The contexts interned during the run.
    pub fn contexts(&self) -> &ContextPool {
        &self.contexts
    }

    /// The pointers and objects interned during the run.
    pub fn elements(&self) -> &ElementPool {
        &self.elements
    }

    /// The final pointer flow graph.
    pub fn pointer_flow_graph(&self) -> &PointerFlowGraph {
        &self.pfg
    }
}
