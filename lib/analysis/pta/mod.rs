//! A context-sensitive, inclusion-based points-to analysis.
//!
//! The engine computes, for every pointer the program can reach, the set
//! of abstract heap objects it may refer to, and discovers the call graph
//! while doing so: when a receiver variable gains an object, the calls
//! dispatching through it are resolved against that object's runtime
//! type, which can make new methods reachable, which produces new
//! pointer flow, and so on until a global fixpoint.
//!
//! Context sensitivity is pluggable through [`ContextSelector`]:
//! [`ContextInsensitive`] collapses everything, while [`KCallSelector`],
//! [`KObjSelector`] and [`KTypeSelector`] implement the standard
//! k-limited call-site, object and type sensitivity policies. The engine
//! itself only compares and hashes the tokens a selector returns.
//!
//! ```
//! use kestrel::analysis::pta::{ContextInsensitive, PointsToSolver};
//! use kestrel::ir::{Program, Statement};
//!
//! let mut program = Program::new();
//! let object = program.add_class("Object", None, vec![]);
//! let main_class = program.add_class("Main", Some(object), vec![]);
//! let main = program.add_method(main_class, "main()", true, false, 0).unwrap();
//! let x = program.add_variable(main, "x");
//! program.set_body(main, vec![Statement::New { result: x, class: object }]).unwrap();
//! program.set_entry(main);
//!
//! let result = PointsToSolver::new(&program, ContextInsensitive).solve().unwrap();
//! assert_eq!(result.points_to_var_all(x).len(), 1);
//! ```

mod call_graph;
mod context;
mod element;
mod pfg;
mod pts;
mod result;
mod solver;

pub use self::call_graph::{CsCallEdge, CsCallGraph};
pub use self::context::{
    ContextElement, ContextId, ContextInsensitive, ContextPool, ContextSelector, KCallSelector,
    KObjSelector, KTypeSelector,
};
pub use self::element::{CsCallSite, CsMethod, CsObj, CsObjId, ElementPool, Pointer, PointerId};
pub use self::pfg::PointerFlowGraph;
pub use self::pts::PointsToSet;
pub use self::result::PointsToResult;
pub use self::solver::PointsToSolver;
