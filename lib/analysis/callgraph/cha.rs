use log::debug;
use rustc_hash::FxHashSet;
use std::collections::{BTreeSet, VecDeque};

use crate::analysis::callgraph::{CallEdge, CallGraph};
use crate::ir::{CallKind, CallSite, ClassId, MethodId, Program, Statement};
use crate::Error;

/// Looks up the dispatch target for `subsignature` starting at `class`.
///
/// Returns the first non-abstract declaration found walking up the
/// superclass chain, or `None` if the hierarchy is exhausted.
pub fn dispatch(program: &Program, class: ClassId, subsignature: &str) -> Option<MethodId> {
    let mut current = Some(class);
    while let Some(class_id) = current {
        let class = program.class(class_id);
        if let Some(method) = class.declared_method(subsignature) {
            if !program.method(method).is_abstract() {
                return Some(method);
            }
        }
        current = class.superclass();
    }
    None
}

/// Resolves the candidate callees of a call site through the class
/// hierarchy.
///
/// Static and special calls dispatch from the statically declared class
/// and yield at most one candidate. Virtual and interface calls close
/// breadth-first over the subtype hierarchy - sub-interfaces and
/// implementors for interfaces, subclasses for classes - dispatching on
/// every type visited; duplicate dispatch results collapse into the set.
/// Dynamic call sites resolve to nothing. An empty result is not an
/// error.
pub fn resolve(program: &Program, call_site: &CallSite) -> BTreeSet<MethodId> {
    let mut targets = BTreeSet::new();
    match call_site.kind() {
        CallKind::Static | CallKind::Special => {
            if let Some(method) = dispatch(program, call_site.class(), call_site.subsignature()) {
                targets.insert(method);
            }
        }
        CallKind::Virtual | CallKind::Interface => {
            let mut queue: VecDeque<ClassId> = VecDeque::new();
            let mut visited: FxHashSet<ClassId> = FxHashSet::default();
            queue.push_back(call_site.class());
            while let Some(class_id) = queue.pop_front() {
                // the visited guard keeps diamonds, and cycles in
                // malformed hierarchies, from looping
                if !visited.insert(class_id) {
                    continue;
                }
                if let Some(method) = dispatch(program, class_id, call_site.subsignature()) {
                    targets.insert(method);
                }
                let class = program.class(class_id);
                if class.is_interface() {
                    queue.extend(class.direct_subinterfaces().iter().copied());
                    queue.extend(class.direct_implementors().iter().copied());
                } else {
                    queue.extend(class.direct_subclasses().iter().copied());
                }
            }
        }
        CallKind::Dynamic => {}
    }
    targets
}

/// Builds a whole-program call graph with class-hierarchy analysis.
///
/// Starting from the program's entry method, every call site of every
/// reachable method is resolved with [`resolve`]; callees become
/// reachable in turn, until no method is left to process.
pub struct ChaBuilder<'a> {
    program: &'a Program,
}

impl<'a> ChaBuilder<'a> {
    pub fn new(program: &'a Program) -> ChaBuilder<'a> {
        ChaBuilder { program }
    }

    pub fn build(&self) -> Result<CallGraph, Error> {
        let entry = self.program.entry().ok_or("program has no entry method")?;

        let mut call_graph = CallGraph::new();
        call_graph.add_entry_method(entry);

        let mut worklist: VecDeque<MethodId> = VecDeque::new();
        worklist.push_back(entry);

        while let Some(method) = worklist.pop_front() {
            if !call_graph.add_reachable_method(method) {
                continue;
            }
            debug!("cha: {} is reachable", self.program.method(method));
            for at in self.program.call_sites_in(method) {
                if let Statement::Invoke(call_site) = self.program.statement(at) {
                    for callee in resolve(self.program, call_site) {
                        call_graph.add_edge(CallEdge::new(call_site.kind(), at, callee));
                        worklist.push_back(callee);
                    }
                }
            }
        }

        Ok(call_graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::StmtRef;

    /**
     * Object
     *   + A      declares m(), n()
     *   |  + B   declares m()
     *   |  + C
     *   + D      declares m()
     */
    fn create_test_hierarchy() -> (Program, Vec<ClassId>, Vec<MethodId>) {
        let mut program = Program::new();
        let object = program.add_class("Object", None, vec![]);
        let a = program.add_class("A", Some(object), vec![]);
        let b = program.add_class("B", Some(a), vec![]);
        let c = program.add_class("C", Some(a), vec![]);
        let d = program.add_class("D", Some(object), vec![]);

        let a_m = program.add_method(a, "m()", false, false, 0).unwrap();
        let a_n = program.add_method(a, "n()", false, false, 0).unwrap();
        let b_m = program.add_method(b, "m()", false, false, 0).unwrap();
        let d_m = program.add_method(d, "m()", false, false, 0).unwrap();

        (
            program,
            vec![object, a, b, c, d],
            vec![a_m, a_n, b_m, d_m],
        )
    }

    #[test]
    fn test_dispatch_walks_superclasses() {
        let (program, classes, methods) = create_test_hierarchy();
        let (b, c) = (classes[2], classes[3]);
        let (a_m, a_n, b_m) = (methods[0], methods[1], methods[2]);

        // B overrides m, but inherits n from A
        assert_eq!(dispatch(&program, b, "m()"), Some(b_m));
        assert_eq!(dispatch(&program, b, "n()"), Some(a_n));
        // C inherits both
        assert_eq!(dispatch(&program, c, "m()"), Some(a_m));
        assert_eq!(dispatch(&program, c, "missing()"), None);
    }

    #[test]
    fn test_dispatch_skips_abstract_declarations() {
        let mut program = Program::new();
        let x = program.add_class("X", None, vec![]);
        let y = program.add_class("Y", Some(x), vec![]);
        program.add_method(x, "m()", false, true, 0).unwrap();

        assert_eq!(dispatch(&program, y, "m()"), None);
    }

    #[test]
    fn test_resolve_virtual_closure() {
        let (program, classes, methods) = create_test_hierarchy();
        let a = classes[1];
        let (a_m, b_m) = (methods[0], methods[2]);

        let call_site = CallSite::new(CallKind::Virtual, a, "m()", None, vec![], None);
        let targets = resolve(&program, &call_site);

        // A's own method and B's override; C contributes A.m again; the
        // unrelated D.m is not included
        let expected: BTreeSet<MethodId> = vec![a_m, b_m].into_iter().collect();
        assert_eq!(targets, expected);
    }

    #[test]
    fn test_resolve_special_single_target() {
        let (program, classes, methods) = create_test_hierarchy();
        let b = classes[2];
        let a_n = methods[1];

        let call_site =
            CallSite::new(CallKind::Special, b, "n()", None, vec![], None);
        let targets = resolve(&program, &call_site);

        let expected: BTreeSet<MethodId> = vec![a_n].into_iter().collect();
        assert_eq!(targets, expected);
    }

    #[test]
    fn test_resolve_interface_closure() {
        let mut program = Program::new();
        let i = program.add_interface("I", vec![]);
        let j = program.add_interface("J", vec![i]);
        let a = program.add_class("A", None, vec![i]);
        let b = program.add_class("B", None, vec![j]);

        let a_m = program.add_method(a, "m()", false, false, 0).unwrap();
        let b_m = program.add_method(b, "m()", false, false, 0).unwrap();

        let call_site =
            CallSite::new(CallKind::Interface, i, "m()", None, vec![], None);
        let targets = resolve(&program, &call_site);

        // implementors of I and of its sub-interface J
        let expected: BTreeSet<MethodId> = vec![a_m, b_m].into_iter().collect();
        assert_eq!(targets, expected);
    }

    #[test]
    fn test_resolve_diamond_counts_once() {
        let mut program = Program::new();
        let i = program.add_interface("I", vec![]);
        let j = program.add_interface("J", vec![i]);
        let k = program.add_interface("K", vec![i]);
        let a = program.add_class("A", None, vec![j, k]);

        let a_m = program.add_method(a, "m()", false, false, 0).unwrap();

        let call_site =
            CallSite::new(CallKind::Interface, i, "m()", None, vec![], None);
        let targets = resolve(&program, &call_site);

        let expected: BTreeSet<MethodId> = vec![a_m].into_iter().collect();
        assert_eq!(targets, expected);
    }

    #[test]
    fn test_resolve_dynamic_is_empty() {
        let (program, classes, _) = create_test_hierarchy();

        let call_site = CallSite::new(CallKind::Dynamic, classes[1], "m()", None, vec![], None);
        assert!(resolve(&program, &call_site).is_empty());
    }

    #[test]
    fn test_build_call_graph() {
        let (mut program, classes, methods) = create_test_hierarchy();
        let (object, a) = (classes[0], classes[1]);
        let (a_m, _, b_m, _) = (methods[0], methods[1], methods[2], methods[3]);

        let main_class = program.add_class("Main", Some(object), vec![]);
        let util = program.add_class("Util", Some(object), vec![]);
        let main = program
            .add_method(main_class, "main()", true, false, 0)
            .unwrap();
        let u = program.add_method(util, "u()", true, false, 0).unwrap();

        let x = program.add_variable(main, "x");
        program
            .set_body(
                main,
                vec![
                    Statement::New { result: x, class: a },
                    Statement::Invoke(CallSite::new(
                        CallKind::Virtual,
                        a,
                        "m()",
                        Some(x),
                        vec![],
                        None,
                    )),
                    Statement::Invoke(CallSite::new(
                        CallKind::Static,
                        util,
                        "u()",
                        None,
                        vec![],
                        None,
                    )),
                ],
            )
            .unwrap();

        // u calls itself, exercising the re-entrancy guard
        program
            .set_body(
                u,
                vec![Statement::Invoke(CallSite::new(
                    CallKind::Static,
                    util,
                    "u()",
                    None,
                    vec![],
                    None,
                ))],
            )
            .unwrap();
        program.set_entry(main);

        let call_graph = ChaBuilder::new(&program).build().unwrap();

        assert_eq!(call_graph.entry_methods().len(), 1);
        assert!(call_graph.is_reachable(main));
        assert!(call_graph.is_reachable(a_m));
        assert!(call_graph.is_reachable(b_m));
        assert!(call_graph.is_reachable(u));
        assert_eq!(call_graph.reachable_methods().len(), 4);

        // virtual m resolves to two targets, plus two static edges to u
        assert_eq!(call_graph.num_edges(), 4);
        let virtual_site = StmtRef::new(main, 1);
        assert_eq!(call_graph.callees_of(virtual_site).len(), 2);
        assert_eq!(call_graph.edges_out_of(main).len(), 3);
        assert_eq!(call_graph.edges_into(u).len(), 2);
    }

    #[test]
    fn test_build_without_entry_is_an_error() {
        let (program, _, _) = create_test_hierarchy();
        assert!(ChaBuilder::new(&program).build().is_err());
    }
}
