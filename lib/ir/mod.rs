//! The program representation consumed by the analyses.
//!
//! The representation is a plain in-memory model: a [`Program`] owns arenas
//! of classes, fields, methods and variables, each addressed by a copyable
//! id. Method bodies are ordered lists of [`Statement`]s, a closed sum type
//! over the statement kinds the analyses understand. There is no parser and
//! no loader here; a program is built through the constructor API on
//! [`Program`], typically by a frontend, or by hand in tests.
//!
//! Identity conventions:
//!
//! * Ids ([`ClassId`], [`MethodId`], [`VarId`], [`FieldId`]) are valid only
//!   for the `Program` that created them.
//! * A [`StmtRef`] names a statement by method and body position. It doubles
//!   as the identity of an allocation site (for [`Statement::New`]) and of a
//!   call site (for [`Statement::Invoke`]).
//!
//! The constructor API validates shape as the program is built (for
//! example, an instance call must carry a receiver variable). The analyses
//! assume a well-formed `Program` and do not re-validate.

mod class;
mod field;
mod method;
mod program;
mod statement;
mod variable;

pub use self::class::{Class, ClassId};
pub use self::field::{Field, FieldId};
pub use self::method::{Method, MethodId};
pub use self::program::Program;
pub use self::statement::{CallKind, CallSite, Statement, StmtRef};
pub use self::variable::{VarId, Variable};
