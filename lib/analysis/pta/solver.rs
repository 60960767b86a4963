use log::{debug, trace};
use std::collections::VecDeque;

use crate::analysis::callgraph::dispatch;
use crate::analysis::pta::{
    ContextId, ContextPool, ContextSelector, CsCallEdge, CsCallGraph, CsCallSite, CsMethod,
    CsObjId, ElementPool, Pointer, PointerFlowGraph, PointerId, PointsToResult, PointsToSet,
};
use crate::ir::{CallKind, CallSite, FieldId, MethodId, Program, Statement, StmtRef, VarId};
use crate::Error;

/// A pending propagation: a pointer which just gained the objects in
/// `delta`.
#[derive(Clone, Debug)]
struct WorkItem {
    pointer: PointerId,
    delta: PointsToSet,
}

/// The context-sensitive points-to solver.
///
/// The solver owns all interned contexts, pointers and objects for the
/// lifetime of a run, and discovers the call graph while it propagates:
/// statements of a method are processed once, when the method first
/// becomes reachable under a context; statements whose effect depends on
/// a points-to set (instance field and array accesses, virtual and
/// interface calls) are revisited for each object their base variable
/// gains. The run terminates when the worklist empties, which it always
/// does: every set it grows is drawn from a finite domain and nothing is
/// ever retracted.
pub struct PointsToSolver<'p, S: ContextSelector> {
    program: &'p Program,
    selector: S,
    contexts: ContextPool,
    elements: ElementPool,
    points_to: Vec<PointsToSet>,
    pfg: PointerFlowGraph,
    call_graph: CsCallGraph,
    worklist: VecDeque<WorkItem>,
}

impl<'p, S: ContextSelector> PointsToSolver<'p, S> {
    pub fn new(program: &'p Program, selector: S) -> PointsToSolver<'p, S> {
        PointsToSolver {
            program,
            selector,
            contexts: ContextPool::new(),
            elements: ElementPool::new(),
            points_to: Vec::new(),
            pfg: PointerFlowGraph::new(),
            call_graph: CsCallGraph::new(),
            worklist: VecDeque::new(),
        }
    }

    /// Runs the analysis to its fixpoint and returns the result.
    pub fn solve(mut self) -> Result<PointsToResult, Error> {
        self.initialize()?;
        self.analyze();
        Ok(PointsToResult::new(
            self.contexts,
            self.elements,
            self.points_to,
            self.pfg,
            self.call_graph,
        ))
    }

    fn initialize(&mut self) -> Result<(), Error> {
        let entry = self.program.entry().ok_or("program has no entry method")?;
        let context = self.selector.empty_context(&mut self.contexts);
        let entry = CsMethod::new(context, entry);
        self.call_graph.add_entry_method(entry);
        self.add_reachable(entry);
        Ok(())
    }

    /// Marks a context-qualified method reachable and processes each of
    /// its statements once. A no-op if it already was reachable.
    fn add_reachable(&mut self, method: CsMethod) {
        if !self.call_graph.add_reachable_method(method) {
            return;
        }
        debug!(
            "pta: {} reachable under {}",
            self.program.method(method.method),
            method.context
        );
        let program = self.program;
        for (index, statement) in program.method(method.method).body().iter().enumerate() {
            self.process_statement(method, StmtRef::new(method.method, index), statement);
        }
    }

    // Seeds and edges for statements whose effect does not depend on any
    // points-to set. Instance field and array accesses, and calls which
    // dispatch on a receiver, wait until the base variable has objects.
    fn process_statement(&mut self, method: CsMethod, at: StmtRef, statement: &Statement) {
        match statement {
            Statement::New { result, class } => {
                let heap_context =
                    self.selector
                        .select_heap_context(&mut self.contexts, method, at);
                let object = self.elements.object(heap_context, at, *class);
                let pointer = self.var_pointer(method.context, *result);
                trace!("pta: {} allocated into {}", object, pointer);
                self.worklist.push_back(WorkItem {
                    pointer,
                    delta: PointsToSet::singleton(object),
                });
            }
            Statement::Copy { result, source } => {
                let source = self.var_pointer(method.context, *source);
                let target = self.var_pointer(method.context, *result);
                self.add_pfg_edge(source, target);
            }
            Statement::LoadStatic { result, field } => {
                let source = self.static_field_pointer(*field);
                let target = self.var_pointer(method.context, *result);
                self.add_pfg_edge(source, target);
            }
            Statement::StoreStatic { field, source } => {
                let source = self.var_pointer(method.context, *source);
                let target = self.static_field_pointer(*field);
                self.add_pfg_edge(source, target);
            }
            Statement::Invoke(call_site) => match call_site.kind() {
                CallKind::Static | CallKind::Special => {
                    self.process_fixed_call(method, at, call_site)
                }
                // resolved per receiver object as the receiver's
                // points-to set grows
                CallKind::Virtual | CallKind::Interface => {}
                CallKind::Dynamic => {}
            },
            // processed per newly discovered base object
            Statement::LoadField { .. }
            | Statement::StoreField { .. }
            | Statement::LoadArray { .. }
            | Statement::StoreArray { .. } => {}
            Statement::Return { .. } | Statement::Nop => {}
        }
    }

    // A call whose single target is known without receiver objects.
    fn process_fixed_call(&mut self, method: CsMethod, at: StmtRef, call_site: &CallSite) {
        let callee = match dispatch(self.program, call_site.class(), call_site.subsignature()) {
            Some(callee) => callee,
            // an unresolvable call site contributes no edges
            None => return,
        };
        let cs_call_site = CsCallSite::new(method.context, at);
        let callee_context =
            self.selector
                .select_call_context(&mut self.contexts, cs_call_site, callee);
        let cs_callee = CsMethod::new(callee_context, callee);

        let edge = CsCallEdge::new(call_site.kind(), cs_call_site, cs_callee);
        if !self.call_graph.add_edge(edge) {
            return;
        }
        trace!("pta: call edge {} -> {}", cs_call_site, cs_callee);
        // a special call still flows its receiver into the callee's this
        if let (Some(receiver), Some(this)) =
            (call_site.receiver(), self.program.method(callee).this())
        {
            let source = self.var_pointer(method.context, receiver);
            let target = self.var_pointer(callee_context, this);
            self.add_pfg_edge(source, target);
        }
        self.add_reachable(cs_callee);
        self.wire_call(method.context, call_site, callee_context, callee);
    }

    // Connects argument pointers to parameter pointers, and return
    // variable pointers to the result pointer.
    fn wire_call(
        &mut self,
        caller_context: ContextId,
        call_site: &CallSite,
        callee_context: ContextId,
        callee: MethodId,
    ) {
        let program = self.program;
        let parameters = program.method(callee).parameters();
        for (argument, parameter) in call_site.arguments().iter().zip(parameters.iter()) {
            let source = self.var_pointer(caller_context, *argument);
            let target = self.var_pointer(callee_context, *parameter);
            self.add_pfg_edge(source, target);
        }
        if let Some(result) = call_site.result() {
            let target = self.var_pointer(caller_context, result);
            for return_var in program.method(callee).return_vars() {
                let source = self.var_pointer(callee_context, *return_var);
                self.add_pfg_edge(source, target);
            }
        }
    }

    /// Adds an edge to the pointer flow graph. If the source already
    /// points to anything, that set is queued for the target immediately,
    /// so an edge added late still sees earlier facts.
    fn add_pfg_edge(&mut self, source: PointerId, target: PointerId) {
        if !self.pfg.add_edge(source, target) {
            return;
        }
        trace!("pta: pfg edge {} -> {}", source, target);
        let points_to = &self.points_to[source.index()];
        if !points_to.is_empty() {
            let delta = points_to.clone();
            self.worklist.push_back(WorkItem {
                pointer: target,
                delta,
            });
        }
    }

    /// Drains the worklist: fold each delta into its pointer, then react
    /// to variables which gained objects.
    fn analyze(&mut self) {
        while let Some(item) = self.worklist.pop_front() {
            let delta = self.propagate(item.pointer, &item.delta);
            if delta.is_empty() {
                continue;
            }
            if let Pointer::Var { context, var } = self.elements.pointer(item.pointer) {
                for object in delta.iter() {
                    self.process_instance_accesses(context, var, object);
                    self.process_instance_calls(context, var, object);
                }
            }
        }
        debug!(
            "pta: fixpoint, {} pointers, {} objects, {} reachable methods",
            self.elements.num_pointers(),
            self.elements.num_objects(),
            self.call_graph.reachable_methods().len()
        );
    }

    /// Folds `incoming` into the pointer's points-to set and forwards the
    /// objects actually new to every successor in the pointer flow graph.
    /// Returns that difference.
    fn propagate(&mut self, pointer: PointerId, incoming: &PointsToSet) -> PointsToSet {
        let delta = self.points_to[pointer.index()].difference_from(incoming);
        if delta.is_empty() {
            return delta;
        }
        trace!("pta: {} gains {}", pointer, delta);
        for object in delta.iter() {
            self.points_to[pointer.index()].insert(object);
        }
        for successor in self.pfg.successors_of(pointer) {
            self.worklist.push_back(WorkItem {
                pointer: successor,
                delta: delta.clone(),
            });
        }
        delta
    }

    // Wires the instance field and array accesses through `var` to the
    // freshly discovered object.
    fn process_instance_accesses(&mut self, context: ContextId, var: VarId, object: CsObjId) {
        let program = self.program;
        for at in program.variable(var).store_fields() {
            if let Statement::StoreField { field, source, .. } = program.statement(*at) {
                let source = self.var_pointer(context, *source);
                let target = self.instance_field_pointer(object, *field);
                self.add_pfg_edge(source, target);
            }
        }
        for at in program.variable(var).load_fields() {
            if let Statement::LoadField { result, field, .. } = program.statement(*at) {
                let source = self.instance_field_pointer(object, *field);
                let target = self.var_pointer(context, *result);
                self.add_pfg_edge(source, target);
            }
        }
        for at in program.variable(var).store_arrays() {
            if let Statement::StoreArray { source, .. } = program.statement(*at) {
                let source = self.var_pointer(context, *source);
                let target = self.array_element_pointer(object);
                self.add_pfg_edge(source, target);
            }
        }
        for at in program.variable(var).load_arrays() {
            if let Statement::LoadArray { result, .. } = program.statement(*at) {
                let source = self.array_element_pointer(object);
                let target = self.var_pointer(context, *result);
                self.add_pfg_edge(source, target);
            }
        }
    }

    // Resolves the virtual and interface call sites whose receiver is
    // `var` against the runtime type of the freshly discovered object.
    fn process_instance_calls(&mut self, context: ContextId, var: VarId, object: CsObjId) {
        let program = self.program;
        let obj = self.elements.obj(object);
        for at in program.variable(var).invokes() {
            let call_site = match program.statement(*at) {
                Statement::Invoke(call_site) => call_site,
                _ => continue,
            };
            match call_site.kind() {
                CallKind::Virtual | CallKind::Interface => {}
                // special calls were wired when their method became
                // reachable; dynamic calls resolve to nothing
                CallKind::Static | CallKind::Special | CallKind::Dynamic => continue,
            }
            let callee = match dispatch(program, obj.class, call_site.subsignature()) {
                Some(callee) => callee,
                // no concrete target for this receiver type
                None => continue,
            };
            let cs_call_site = CsCallSite::new(context, *at);
            let receiver_container = program.method(obj.alloc.method()).class();
            let callee_context = self.selector.select_instance_context(
                &mut self.contexts,
                cs_call_site,
                obj,
                receiver_container,
                callee,
            );
            let cs_callee = CsMethod::new(callee_context, callee);

            // the callee's this receives the receiver object whether or
            // not the call edge is new
            if let Some(this) = program.method(callee).this() {
                let this_pointer = self.var_pointer(callee_context, this);
                self.worklist.push_back(WorkItem {
                    pointer: this_pointer,
                    delta: PointsToSet::singleton(object),
                });
            }

            let edge = CsCallEdge::new(call_site.kind(), cs_call_site, cs_callee);
            if !self.call_graph.add_edge(edge) {
                continue;
            }
            trace!("pta: call edge {} -> {}", cs_call_site, cs_callee);
            self.add_reachable(cs_callee);
            self.wire_call(context, call_site, callee_context, callee);
        }
    }

    fn var_pointer(&mut self, context: ContextId, var: VarId) -> PointerId {
        let pointer = self.elements.var_pointer(context, var);
        self.ensure_points_to(pointer);
        pointer
    }

    fn static_field_pointer(&mut self, field: FieldId) -> PointerId {
        let pointer = self.elements.static_field_pointer(field);
        self.ensure_points_to(pointer);
        pointer
    }

    fn instance_field_pointer(&mut self, object: CsObjId, field: FieldId) -> PointerId {
        let pointer = self.elements.instance_field_pointer(object, field);
        self.ensure_points_to(pointer);
        pointer
    }

    fn array_element_pointer(&mut self, object: CsObjId) -> PointerId {
        let pointer = self.elements.array_element_pointer(object);
        self.ensure_points_to(pointer);
        pointer
    }

    // Pointers are interned on demand; their points-to slots follow.
    fn ensure_points_to(&mut self, pointer: PointerId) {
        if self.points_to.len() <= pointer.index() {
            self.points_to
                .resize_with(pointer.index() + 1, PointsToSet::new);
        }
    }
}
