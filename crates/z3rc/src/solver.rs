use std::ffi::c_uint;
use std::fmt;
use std::time::Instant;

use z3_sys::*;

use crate::context::{Context, c_name, symbol};
use crate::error::Z3Error;
use crate::expr::Expr;
use crate::handle::{Entered, Managed};
use crate::model::Model;
use crate::result::{SatResult, SolverResult};

/// An incremental SMT solver.
///
/// Assertions accumulate until [`Solver::reset`] or a matching
/// [`Solver::pop`]. A solver may be shared between threads; its calls are
/// serialized with everything else on the same context, so [`Solver::check`]
/// blocks other work on that context while it runs. Use
/// [`Solver::interrupt`] from another thread to cut it short.
#[derive(Clone)]
pub struct Solver {
    handle: Managed<Z3_solver>,
}

impl Context {
    /// A general-purpose solver that picks its tactics from the assertions.
    pub fn solver(&self) -> Result<Solver, Z3Error> {
        let handle = self.make(|c| unsafe { Z3_mk_solver(c) })?;
        Ok(Solver { handle })
    }

    /// A plain incremental solver without preprocessing.
    pub fn simple_solver(&self) -> Result<Solver, Z3Error> {
        let handle = self.make(|c| unsafe { Z3_mk_simple_solver(c) })?;
        Ok(Solver { handle })
    }

    /// A solver specialized for an SMT-LIB logic such as `"QF_BV"`.
    ///
    /// Z3 falls back to the general solver for logics it does not know.
    pub fn solver_for_logic(&self, logic: &str) -> Result<Solver, Z3Error> {
        let logic = c_name(logic)?;
        let handle = self.make(|c| unsafe { Z3_mk_solver_for_logic(c, symbol(c, &logic)) })?;
        Ok(Solver { handle })
    }
}

impl Solver {
    pub fn context(&self) -> Context {
        Context::from_inner(self.handle.context().clone())
    }

    /// Add `constraint`, which must be Boolean.
    pub fn assert(&self, constraint: &Expr) -> Result<(), Z3Error> {
        constraint.handle.same_context(self.handle.context())?;
        let entered = self.handle.enter();
        unsafe { Z3_solver_assert(entered.raw(), self.handle.raw(), constraint.handle.raw()) };
        entered.check()
    }

    /// Decide the current assertions.
    pub fn check(&self) -> Result<SatResult, Z3Error> {
        let entered = self.handle.enter();
        self.check_entered(&entered)
    }

    /// Check, then fetch the model or the reason for `Unknown` without
    /// releasing the context in between, so another thread sharing this
    /// solver cannot run a check of its own and replace either.
    pub fn solve(&self) -> Result<SolverResult, Z3Error> {
        let entered = self.handle.enter();
        let (c, raw) = (entered.raw(), self.handle.raw());
        Ok(match self.check_entered(&entered)? {
            SatResult::Sat => {
                let model = unsafe { Z3_solver_get_model(c, raw) };
                SolverResult::Sat(Model::new(Managed::acquire(
                    self.handle.context(),
                    &entered,
                    model,
                )?))
            }
            SatResult::Unsat => SolverResult::Unsat,
            SatResult::Unknown => SolverResult::Unknown(
                entered.string(unsafe { Z3_solver_get_reason_unknown(c, raw) }),
            ),
        })
    }

    fn check_entered(&self, entered: &Entered<'_>) -> Result<SatResult, Z3Error> {
        let start = Instant::now();
        let lbool = unsafe { Z3_solver_check(entered.raw(), self.handle.raw()) };
        entered.check()?;
        let result = SatResult::from_lbool(lbool);
        tracing::debug!(
            context = self.handle.context().id(),
            %result,
            "solver check in {:?}",
            start.elapsed()
        );
        Ok(result)
    }

    /// Decide the current assertions together with `assumptions`, which are
    /// only in force for this call.
    pub fn check_assumptions(&self, assumptions: &[&Expr]) -> Result<SatResult, Z3Error> {
        let raws = self.context().raw_args(assumptions)?;
        let start = Instant::now();
        let entered = self.handle.enter();
        let lbool = unsafe {
            Z3_solver_check_assumptions(
                entered.raw(),
                self.handle.raw(),
                raws.len() as c_uint,
                raws.as_ptr(),
            )
        };
        entered.check()?;
        let result = SatResult::from_lbool(lbool);
        tracing::debug!(
            context = self.handle.context().id(),
            assumptions = raws.len(),
            %result,
            "solver check in {:?}",
            start.elapsed()
        );
        Ok(result)
    }

    /// The model of the last `Sat` check.
    ///
    /// Fails with an engine error if the last check was not `Sat`.
    pub fn model(&self) -> Result<Model, Z3Error> {
        let raw = self.handle.raw();
        let handle = self
            .context()
            .make(|c| unsafe { Z3_solver_get_model(c, raw) })?;
        Ok(Model::new(handle))
    }

    /// Open a backtracking scope.
    pub fn push(&self) {
        let entered = self.handle.enter();
        unsafe { Z3_solver_push(entered.raw(), self.handle.raw()) }
    }

    /// Close `n` scopes, dropping the assertions made inside them.
    pub fn pop(&self, n: u32) -> Result<(), Z3Error> {
        let entered = self.handle.enter();
        unsafe { Z3_solver_pop(entered.raw(), self.handle.raw(), n) };
        entered.check()
    }

    /// Remove every assertion and scope.
    pub fn reset(&self) {
        let entered = self.handle.enter();
        unsafe { Z3_solver_reset(entered.raw(), self.handle.raw()) }
    }

    pub fn num_scopes(&self) -> u32 {
        let entered = self.handle.enter();
        unsafe { Z3_solver_get_num_scopes(entered.raw(), self.handle.raw()) }
    }

    /// Why the last check returned `Unknown`, e.g. `"timeout"` or `"canceled"`.
    pub fn reason_unknown(&self) -> String {
        let entered = self.handle.enter();
        entered.string(unsafe { Z3_solver_get_reason_unknown(entered.raw(), self.handle.raw()) })
    }

    /// Give up on each check after `ms` milliseconds.
    pub fn set_timeout(&self, ms: u32) -> Result<(), Z3Error> {
        self.set_param_u32("timeout", ms)
    }

    /// Set an unsigned solver parameter such as `"timeout"` or `"random_seed"`.
    ///
    /// Names the solver does not know are rejected with an engine error.
    pub fn set_param_u32(&self, name: &str, value: u32) -> Result<(), Z3Error> {
        let ctx = self.context();
        let params = ctx.params_u32(name, value)?;
        let raw = self.handle.raw();
        let descrs = ctx.make(|c| unsafe { Z3_solver_get_param_descrs(c, raw) })?;
        let entered = self.handle.enter();
        unsafe { Z3_params_validate(entered.raw(), params.raw(), descrs.raw()) };
        entered.check()?;
        unsafe { Z3_solver_set_params(entered.raw(), raw, params.raw()) };
        entered.check()
    }

    /// Interrupt a `check` running on this solver's context.
    pub fn interrupt(&self) {
        self.handle.context().interrupt();
    }
}

impl Context {
    /// A one-entry parameter set.
    pub(crate) fn params_u32(
        &self,
        name: &str,
        value: u32,
    ) -> Result<Managed<Z3_params>, Z3Error> {
        let name = c_name(name)?;
        let params = self.make(|c| unsafe { Z3_mk_params(c) })?;
        let entered = params.enter();
        let c = entered.raw();
        unsafe { Z3_params_set_uint(c, params.raw(), symbol(c, &name), value) };
        entered.check()?;
        drop(entered);
        Ok(params)
    }
}

impl fmt::Display for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.handle.render())
    }
}

impl fmt::Debug for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solver")
            .field("context", &self.handle.context().id())
            .finish()
    }
}
