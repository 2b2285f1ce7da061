use std::fmt;
use std::ptr;
use std::time::Instant;

use z3_sys::*;

use crate::context::Context;
use crate::error::Z3Error;
use crate::expr::Expr;
use crate::handle::{Entered, Managed};
use crate::model::Model;
use crate::result::{SatResult, SolverResult};

/// An objective registered with [`Optimize::maximize`] or
/// [`Optimize::minimize`]. Only meaningful for the optimizer that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Objective(u32);

impl Objective {
    /// Position of the objective in registration order.
    pub fn index(self) -> u32 {
        self.0
    }
}

/// A solver that also optimizes arithmetic or bit-vector objectives.
///
/// Multiple objectives are combined lexicographically in registration order
/// (Z3's default).
#[derive(Clone)]
pub struct Optimize {
    handle: Managed<Z3_optimize>,
}

impl Context {
    pub fn optimize(&self) -> Result<Optimize, Z3Error> {
        let handle = self.make(|c| unsafe { Z3_mk_optimize(c) })?;
        Ok(Optimize { handle })
    }
}

impl Optimize {
    pub fn context(&self) -> Context {
        Context::from_inner(self.handle.context().clone())
    }

    /// Add a hard constraint.
    pub fn assert(&self, constraint: &Expr) -> Result<(), Z3Error> {
        constraint.handle.same_context(self.handle.context())?;
        let entered = self.handle.enter();
        unsafe { Z3_optimize_assert(entered.raw(), self.handle.raw(), constraint.handle.raw()) };
        entered.check()
    }

    pub fn maximize(&self, term: &Expr) -> Result<Objective, Z3Error> {
        self.objective(Z3_optimize_maximize, term)
    }

    pub fn minimize(&self, term: &Expr) -> Result<Objective, Z3Error> {
        self.objective(Z3_optimize_minimize, term)
    }

    fn objective(
        &self,
        op: unsafe extern "C" fn(Z3_context, Z3_optimize, Z3_ast) -> u32,
        term: &Expr,
    ) -> Result<Objective, Z3Error> {
        term.handle.same_context(self.handle.context())?;
        let entered = self.handle.enter();
        let index = unsafe { op(entered.raw(), self.handle.raw(), term.handle.raw()) };
        entered.check()?;
        Ok(Objective(index))
    }

    /// Find a model of the hard constraints that is optimal for the
    /// registered objectives.
    pub fn check(&self) -> Result<SatResult, Z3Error> {
        let entered = self.handle.enter();
        self.check_entered(&entered)
    }

    /// Check, then fetch the model or the reason for `Unknown` under the
    /// same hold on the context.
    pub fn solve(&self) -> Result<SolverResult, Z3Error> {
        let entered = self.handle.enter();
        let (c, raw) = (entered.raw(), self.handle.raw());
        Ok(match self.check_entered(&entered)? {
            SatResult::Sat => {
                let model = unsafe { Z3_optimize_get_model(c, raw) };
                SolverResult::Sat(Model::new(Managed::acquire(
                    self.handle.context(),
                    &entered,
                    model,
                )?))
            }
            SatResult::Unsat => SolverResult::Unsat,
            SatResult::Unknown => SolverResult::Unknown(
                entered.string(unsafe { Z3_optimize_get_reason_unknown(c, raw) }),
            ),
        })
    }

    fn check_entered(&self, entered: &Entered<'_>) -> Result<SatResult, Z3Error> {
        let start = Instant::now();
        let lbool = unsafe { Z3_optimize_check(entered.raw(), self.handle.raw(), 0, ptr::null()) };
        entered.check()?;
        let result = SatResult::from_lbool(lbool);
        tracing::debug!(
            context = self.handle.context().id(),
            %result,
            "optimize check in {:?}",
            start.elapsed()
        );
        Ok(result)
    }

    /// The optimal model of the last `Sat` check.
    pub fn model(&self) -> Result<Model, Z3Error> {
        let raw = self.handle.raw();
        let handle = self
            .context()
            .make(|c| unsafe { Z3_optimize_get_model(c, raw) })?;
        Ok(Model::new(handle))
    }

    /// Lower bound found for `objective` by the last check.
    pub fn lower(&self, objective: Objective) -> Result<Expr, Z3Error> {
        let raw = self.handle.raw();
        self.context()
            .expr(|c| unsafe { Z3_optimize_get_lower(c, raw, objective.0) })
    }

    /// Upper bound found for `objective` by the last check.
    pub fn upper(&self, objective: Objective) -> Result<Expr, Z3Error> {
        let raw = self.handle.raw();
        self.context()
            .expr(|c| unsafe { Z3_optimize_get_upper(c, raw, objective.0) })
    }

    pub fn push(&self) {
        let entered = self.handle.enter();
        unsafe { Z3_optimize_push(entered.raw(), self.handle.raw()) }
    }

    /// Close the innermost scope.
    pub fn pop(&self) -> Result<(), Z3Error> {
        let entered = self.handle.enter();
        unsafe { Z3_optimize_pop(entered.raw(), self.handle.raw()) };
        entered.check()
    }

    pub fn reason_unknown(&self) -> String {
        let entered = self.handle.enter();
        entered.string(unsafe { Z3_optimize_get_reason_unknown(entered.raw(), self.handle.raw()) })
    }

    /// Give up on each check after `ms` milliseconds.
    pub fn set_timeout(&self, ms: u32) -> Result<(), Z3Error> {
        self.set_param_u32("timeout", ms)
    }

    /// Set an unsigned optimizer parameter. Unknown names are rejected with
    /// an engine error.
    pub fn set_param_u32(&self, name: &str, value: u32) -> Result<(), Z3Error> {
        let ctx = self.context();
        let params = ctx.params_u32(name, value)?;
        let raw = self.handle.raw();
        let descrs = ctx.make(|c| unsafe { Z3_optimize_get_param_descrs(c, raw) })?;
        let entered = self.handle.enter();
        unsafe { Z3_params_validate(entered.raw(), params.raw(), descrs.raw()) };
        entered.check()?;
        unsafe { Z3_optimize_set_params(entered.raw(), raw, params.raw()) };
        entered.check()
    }
}

impl fmt::Display for Optimize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.handle.render())
    }
}

impl fmt::Debug for Optimize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Optimize")
            .field("context", &self.handle.context().id())
            .finish()
    }
}
