//! # z3rc
//!
//! Reference-counted, thread-safe bindings to the Z3 SMT solver.
//!
//! Every object handed out by this crate (sorts, expressions, solvers,
//! models) owns one engine reference on its foreign handle and keeps its
//! [`Context`] alive. Dropping the last `Context` value does not tear down
//! the engine while anything built from it is still reachable, and calls on
//! one context are serialized so its objects may move between threads.
//!
//! ## Usage
//!
//! ```no_run
//! use z3rc::{Context, SolverResult};
//!
//! let ctx = Context::with_default_config().unwrap();
//! let int = ctx.int_sort().unwrap();
//! let x = ctx.constant("x", &int).unwrap();
//! let sum = ctx.add(&[&x, &ctx.int(10, &int).unwrap()]).unwrap();
//!
//! let solver = ctx.solver().unwrap();
//! solver.assert(&ctx.gt(&sum, &ctx.int(20, &int).unwrap()).unwrap()).unwrap();
//!
//! match solver.solve().unwrap() {
//!     SolverResult::Sat(model) => println!("x = {}", model.eval_string(&x)),
//!     SolverResult::Unsat => println!("UNSAT"),
//!     SolverResult::Unknown(reason) => println!("Unknown: {reason}"),
//! }
//! ```

pub mod backend;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod expr;
mod fpa;
pub mod func;
mod handle;
pub mod model;
pub mod optimize;
mod quantifier;
pub mod result;
pub mod solver;
pub mod sort;

// Re-export primary types for ergonomic use
pub use backend::SolverBackend;
pub use config::Config;
pub use context::Context;
pub use diagnostics::engine_error_count;
pub use error::{EngineErrorKind, Z3Error};
pub use expr::Expr;
pub use func::FuncDecl;
pub use model::{Model, UNKNOWN_VALUE};
pub use optimize::{Objective, Optimize};
pub use result::{SatResult, SolverResult};
pub use solver::Solver;
pub use sort::{Sort, SortKind};
