//! Worklist solvers for intraprocedural dataflow problems.

use log::{debug, trace};
use std::collections::VecDeque;

use crate::analysis::dataflow::{Cfg, DataflowAnalysis, DataflowResult};
use crate::graph::Vertex;
use crate::Error;

/// Solves a forward dataflow problem over `cfg` to a fixpoint.
///
/// The entry node's IN fact is the boundary fact and is never recomputed
/// by meeting; every other node's IN is the meet over its predecessors'
/// OUT facts.
pub fn solve_forward<A, V>(analysis: &A, cfg: &Cfg<V>) -> Result<DataflowResult<A::Fact>, Error>
where
    A: DataflowAnalysis<V>,
    V: Vertex,
{
    let entry = cfg.entry().ok_or("control flow graph has no entry")?;

    let mut result = DataflowResult::new();
    for node in cfg.graph().vertices() {
        if node.index() == entry {
            let in_fact = analysis.boundary_fact();
            let mut out_fact = analysis.initial_fact();
            analysis.transfer(node, &in_fact, &mut out_fact);
            result.set_in_fact(entry, in_fact);
            result.set_out_fact(entry, out_fact);
        } else {
            result.set_in_fact(node.index(), analysis.initial_fact());
            result.set_out_fact(node.index(), analysis.initial_fact());
        }
    }

    let mut worklist: VecDeque<usize> = cfg
        .graph()
        .vertex_indices()
        .into_iter()
        .filter(|&index| index != entry)
        .collect();

    while let Some(index) = worklist.pop_front() {
        trace!("solve_forward: node {}", index);

        let mut in_fact = analysis.initial_fact();
        for predecessor in cfg.graph().predecessor_indices(index)? {
            analysis.meet_into(result.out_fact(predecessor).unwrap(), &mut in_fact);
        }

        let node = cfg.graph().vertex(index)?;
        let mut out_fact = result.out_fact(index).unwrap().clone();
        let changed = analysis.transfer(node, &in_fact, &mut out_fact);

        result.set_in_fact(index, in_fact);
        result.set_out_fact(index, out_fact);

        if changed {
            for successor in cfg.graph().successor_indices(index)? {
                if successor != entry {
                    worklist.push_back(successor);
                }
            }
        }
    }

    debug!("solve_forward: fixpoint over {} nodes", cfg.graph().num_vertices());
    Ok(result)
}

/// Solves a backward dataflow problem over `cfg` to a fixpoint.
///
/// Symmetric to [`solve_forward`]: the exit node's OUT fact is the
/// boundary fact, every other node's OUT is the meet over its successors'
/// IN facts, and the transfer function computes IN from OUT.
pub fn solve_backward<A, V>(analysis: &A, cfg: &Cfg<V>) -> Result<DataflowResult<A::Fact>, Error>
where
    A: DataflowAnalysis<V>,
    V: Vertex,
{
    let exit = cfg.exit().ok_or("control flow graph has no exit")?;

    let mut result = DataflowResult::new();
    for node in cfg.graph().vertices() {
        if node.index() == exit {
            let out_fact = analysis.boundary_fact();
            let mut in_fact = analysis.initial_fact();
            analysis.transfer(node, &out_fact, &mut in_fact);
            result.set_out_fact(exit, out_fact);
            result.set_in_fact(exit, in_fact);
        } else {
            result.set_in_fact(node.index(), analysis.initial_fact());
            result.set_out_fact(node.index(), analysis.initial_fact());
        }
    }

    let mut worklist: VecDeque<usize> = cfg
        .graph()
        .vertex_indices()
        .into_iter()
        .filter(|&index| index != exit)
        .collect();

    while let Some(index) = worklist.pop_front() {
        trace!("solve_backward: node {}", index);

        let mut out_fact = analysis.initial_fact();
        for successor in cfg.graph().successor_indices(index)? {
            analysis.meet_into(result.in_fact(successor).unwrap(), &mut out_fact);
        }

        let node = cfg.graph().vertex(index)?;
        let mut in_fact = result.in_fact(index).unwrap().clone();
        let changed = analysis.transfer(node, &out_fact, &mut in_fact);

        result.set_out_fact(index, out_fact);
        result.set_in_fact(index, in_fact);

        if changed {
            for predecessor in cfg.graph().predecessor_indices(index)? {
                if predecessor != exit {
                    worklist.push_back(predecessor);
                }
            }
        }
    }

    debug!(
        "solve_backward: fixpoint over {} nodes",
        cfg.graph().num_vertices()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Vertex;
    use std::collections::BTreeSet;

    // A node which generates and kills definition ids, for a reaching
    // definitions style forward problem.
    #[derive(Clone, Debug)]
    struct DefNode {
        index: usize,
        gen: BTreeSet<usize>,
        kill: BTreeSet<usize>,
    }

    impl DefNode {
        fn new(index: usize, gen: &[usize], kill: &[usize]) -> DefNode {
            DefNode {
                index,
                gen: gen.iter().cloned().collect(),
                kill: kill.iter().cloned().collect(),
            }
        }
    }

    impl Vertex for DefNode {
        fn index(&self) -> usize {
            self.index
        }
        fn dot_label(&self) -> String {
            format!("{:?}", self)
        }
    }

    struct ReachingDefinitions;

    impl DataflowAnalysis<DefNode> for ReachingDefinitions {
        type Fact = BTreeSet<usize>;

        fn boundary_fact(&self) -> Self::Fact {
            BTreeSet::new()
        }

        fn initial_fact(&self) -> Self::Fact {
            BTreeSet::new()
        }

        fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact) {
            for definition in fact {
                target.insert(*definition);
            }
        }

        fn transfer(&self, node: &DefNode, input: &Self::Fact, output: &mut Self::Fact) -> bool {
            let mut new_output: BTreeSet<usize> =
                input.difference(&node.kill).cloned().collect();
            for definition in &node.gen {
                new_output.insert(*definition);
            }
            if new_output == *output {
                false
            } else {
                *output = new_output;
                true
            }
        }
    }

    /**
     * 0 +---> 1 +---> 2 +---> 3
     *         ^         |
     *         +---------+
     *
     * 0: gen {0}          (definition of x)
     * 1: gen {1}          (definition of y)
     * 2: gen {2} kill {0} (redefinition of x)
     */
    fn create_loop_cfg() -> Cfg<DefNode> {
        let mut cfg = Cfg::new();
        cfg.add_node(DefNode::new(0, &[0], &[2])).unwrap();
        cfg.add_node(DefNode::new(1, &[1], &[])).unwrap();
        cfg.add_node(DefNode::new(2, &[2], &[0])).unwrap();
        cfg.add_node(DefNode::new(3, &[], &[])).unwrap();
        cfg.add_edge(0, 1).unwrap();
        cfg.add_edge(1, 2).unwrap();
        cfg.add_edge(2, 1).unwrap();
        cfg.add_edge(2, 3).unwrap();
        cfg.set_entry(0).unwrap();
        cfg.set_exit(3).unwrap();
        cfg
    }

    fn set(definitions: &[usize]) -> BTreeSet<usize> {
        definitions.iter().cloned().collect()
    }

    #[test]
    fn test_forward_reaching_definitions() {
        let cfg = create_loop_cfg();
        let result = solve_forward(&ReachingDefinitions, &cfg).unwrap();

        assert_eq!(result.out_fact(0).unwrap(), &set(&[0]));
        // the definition from inside the loop flows back around
        assert_eq!(result.in_fact(1).unwrap(), &set(&[0, 1, 2]));
        assert_eq!(result.out_fact(1).unwrap(), &set(&[0, 1, 2]));
        // node 2 kills definition 0
        assert_eq!(result.out_fact(2).unwrap(), &set(&[1, 2]));
        assert_eq!(result.in_fact(3).unwrap(), &set(&[1, 2]));
    }

    #[test]
    fn test_forward_fixpoint_is_stable() {
        let cfg = create_loop_cfg();
        let analysis = ReachingDefinitions;
        let result = solve_forward(&analysis, &cfg).unwrap();

        // re-running the transfer function at the fixpoint changes nothing
        for node in cfg.graph().vertices() {
            let mut out_fact = result.out_fact(node.index()).unwrap().clone();
            let changed =
                analysis.transfer(node, result.in_fact(node.index()).unwrap(), &mut out_fact);
            assert!(!changed);
        }
    }

    #[test]
    fn test_meet_properties() {
        let analysis = ReachingDefinitions;

        let a = set(&[0, 2]);
        let b = set(&[1]);

        // idempotent
        let mut target = a.clone();
        analysis.meet_into(&a, &mut target);
        assert_eq!(target, a);

        // commutative
        let mut ab = a.clone();
        analysis.meet_into(&b, &mut ab);
        let mut ba = b.clone();
        analysis.meet_into(&a, &mut ba);
        assert_eq!(ab, ba);
    }

    // A node which uses and defines variables, for a live variables style
    // backward problem.
    #[derive(Clone, Debug)]
    struct UseDefNode {
        index: usize,
        uses: BTreeSet<usize>,
        defs: BTreeSet<usize>,
    }

    impl UseDefNode {
        fn new(index: usize, uses: &[usize], defs: &[usize]) -> UseDefNode {
            UseDefNode {
                index,
                uses: uses.iter().cloned().collect(),
                defs: defs.iter().cloned().collect(),
            }
        }
    }

    impl Vertex for UseDefNode {
        fn index(&self) -> usize {
            self.index
        }
        fn dot_label(&self) -> String {
            format!("{:?}", self)
        }
    }

    struct LiveVariables;

    impl DataflowAnalysis<UseDefNode> for LiveVariables {
        type Fact = BTreeSet<usize>;

        fn boundary_fact(&self) -> Self::Fact {
            BTreeSet::new()
        }

        fn initial_fact(&self) -> Self::Fact {
            BTreeSet::new()
        }

        fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact) {
            for variable in fact {
                target.insert(*variable);
            }
        }

        // input is the OUT fact, output is the IN fact
        fn transfer(
            &self,
            node: &UseDefNode,
            input: &Self::Fact,
            output: &mut Self::Fact,
        ) -> bool {
            let mut new_output: BTreeSet<usize> =
                input.difference(&node.defs).cloned().collect();
            for variable in &node.uses {
                new_output.insert(*variable);
            }
            if new_output == *output {
                false
            } else {
                *output = new_output;
                true
            }
        }
    }

    /**
     * 0 +---> 1 +---> 2
     *
     * variables: 0 is x, 1 is y
     * 0: def x
     * 1: use x, def y
     * 2: use y
     */
    #[test]
    fn test_backward_live_variables() {
        let mut cfg = Cfg::new();
        cfg.add_node(UseDefNode::new(0, &[], &[0])).unwrap();
        cfg.add_node(UseDefNode::new(1, &[0], &[1])).unwrap();
        cfg.add_node(UseDefNode::new(2, &[1], &[])).unwrap();
        cfg.add_edge(0, 1).unwrap();
        cfg.add_edge(1, 2).unwrap();
        cfg.set_entry(0).unwrap();
        cfg.set_exit(2).unwrap();

        let result = solve_backward(&LiveVariables, &cfg).unwrap();

        assert_eq!(result.in_fact(2).unwrap(), &set(&[1]));
        // y is live across the edge into node 2
        assert_eq!(result.out_fact(1).unwrap(), &set(&[1]));
        assert_eq!(result.in_fact(1).unwrap(), &set(&[0]));
        // x dies at its definition
        assert_eq!(result.in_fact(0).unwrap(), &set(&[]));
    }

    #[test]
    fn test_missing_entry_is_an_error() {
        let mut cfg: Cfg<DefNode> = Cfg::new();
        cfg.add_node(DefNode::new(0, &[], &[])).unwrap();

        assert!(solve_forward(&ReachingDefinitions, &cfg).is_err());
    }
}
