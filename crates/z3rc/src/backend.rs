//! A common interface over [`Solver`] and [`Optimize`].
//!
//! Code that only needs "assert, decide, read the model" can take a
//! `&dyn SolverBackend` and work with either engine.

use crate::error::Z3Error;
use crate::expr::Expr;
use crate::model::Model;
use crate::optimize::Optimize;
use crate::result::{SatResult, SolverResult};
use crate::solver::Solver;

/// Trait abstracting over the Z3 engines that can decide a set of assertions.
pub trait SolverBackend {
    /// Add a Boolean constraint.
    fn assert(&self, constraint: &Expr) -> Result<(), Z3Error>;

    /// Decide the assertions made so far.
    fn check(&self) -> Result<SatResult, Z3Error>;

    /// The model of the last `Sat` check.
    fn model(&self) -> Result<Model, Z3Error>;

    /// Why the last check returned `Unknown`.
    fn reason_unknown(&self) -> String;

    /// Check and bundle the outcome with its model or reason.
    ///
    /// The check and the follow-up read happen under one hold on the
    /// context, so the model or reason always belongs to this check even
    /// when other threads share the engine.
    ///
    /// Returns:
    /// - `Ok(SolverResult::Sat(model))` if satisfiable
    /// - `Ok(SolverResult::Unsat)` if unsatisfiable
    /// - `Ok(SolverResult::Unknown(reason))` if the engine gave up
    /// - `Err(Z3Error)` if a foreign call failed
    fn solve(&self) -> Result<SolverResult, Z3Error>;
}

impl SolverBackend for Solver {
    fn assert(&self, constraint: &Expr) -> Result<(), Z3Error> {
        Solver::assert(self, constraint)
    }

    fn check(&self) -> Result<SatResult, Z3Error> {
        Solver::check(self)
    }

    fn model(&self) -> Result<Model, Z3Error> {
        Solver::model(self)
    }

    fn reason_unknown(&self) -> String {
        Solver::reason_unknown(self)
    }

    fn solve(&self) -> Result<SolverResult, Z3Error> {
        Solver::solve(self)
    }
}

impl SolverBackend for Optimize {
    fn assert(&self, constraint: &Expr) -> Result<(), Z3Error> {
        Optimize::assert(self, constraint)
    }

    fn check(&self) -> Result<SatResult, Z3Error> {
        Optimize::check(self)
    }

    fn model(&self) -> Result<Model, Z3Error> {
        Optimize::model(self)
    }

    fn reason_unknown(&self) -> String {
        Optimize::reason_unknown(self)
    }

    fn solve(&self) -> Result<SolverResult, Z3Error> {
        Optimize::solve(self)
    }
}
