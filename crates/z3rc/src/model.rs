use std::fmt;
use std::ptr;

use z3_sys::*;

use crate::context::Context;
use crate::error::Z3Error;
use crate::expr::Expr;
use crate::handle::Managed;

/// Placeholder returned by [`Model::eval_string`] when Z3 cannot evaluate a
/// term.
pub const UNKNOWN_VALUE: &str = "unknown";

/// A satisfying assignment produced by a solver or optimizer.
///
/// The model is a live Z3 object: it keeps its context alive and can evaluate
/// arbitrary terms, not only the declared constants.
#[derive(Clone)]
pub struct Model {
    handle: Managed<Z3_model>,
}

impl Model {
    pub(crate) fn new(handle: Managed<Z3_model>) -> Self {
        Self { handle }
    }

    pub fn context(&self) -> Context {
        Context::from_inner(self.handle.context().clone())
    }

    /// Evaluate `expr` under this model.
    ///
    /// With `completion` set, constants the model leaves unconstrained are
    /// given a default value instead of staying symbolic. Returns `None` if
    /// Z3 declines to evaluate the term.
    pub fn eval(&self, expr: &Expr, completion: bool) -> Result<Option<Expr>, Z3Error> {
        expr.handle.same_context(self.handle.context())?;
        let ctx = self.handle.context();
        let entered = ctx.enter();
        let mut value: Z3_ast = ptr::null_mut();
        let ok = unsafe {
            Z3_model_eval(
                entered.raw(),
                self.handle.raw(),
                expr.handle.raw(),
                completion,
                &mut value,
            )
        };
        entered.check()?;
        if !ok || value.is_null() {
            return Ok(None);
        }
        let handle = Managed::acquire(ctx, &entered, value)?;
        drop(entered);
        Ok(Some(Expr { handle }))
    }

    /// Evaluate `expr` with completion and render the result, or
    /// [`UNKNOWN_VALUE`] if that fails.
    pub fn eval_string(&self, expr: &Expr) -> String {
        match self.eval(expr, true) {
            Ok(Some(value)) => value.to_string(),
            Ok(None) => UNKNOWN_VALUE.to_string(),
            Err(err) => {
                tracing::warn!(%err, "model evaluation failed");
                UNKNOWN_VALUE.to_string()
            }
        }
    }

    /// `(name, value)` for every constant the model interprets, in Z3's order.
    pub fn assignments(&self) -> Result<Vec<(String, String)>, Z3Error> {
        let entered = self.handle.enter();
        let (ctx, model) = (entered.raw(), self.handle.raw());
        let count = unsafe { Z3_model_get_num_consts(ctx, model) };
        let mut assignments = Vec::with_capacity(count as usize);
        for i in 0..count {
            let decl = unsafe { Z3_model_get_const_decl(ctx, model, i) };
            entered.check()?;
            let symbol = unsafe { Z3_get_decl_name(ctx, decl) };
            let name = entered.string(unsafe { Z3_get_symbol_string(ctx, symbol) });
            let interp = unsafe { Z3_model_get_const_interp(ctx, model, decl) };
            let value = if interp.is_null() {
                UNKNOWN_VALUE.to_string()
            } else {
                entered.string(unsafe { Z3_ast_to_string(ctx, interp) })
            };
            assignments.push((name, value));
        }
        Ok(assignments)
    }

    /// Look up a constant's value by name.
    ///
    /// An engine error while listing the assignments is logged and reads as
    /// "not found".
    pub fn get(&self, name: &str) -> Option<String> {
        match self.assignments() {
            Ok(assignments) => assignments
                .into_iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v),
            Err(err) => {
                tracing::warn!(%err, name, "model assignments unavailable");
                None
            }
        }
    }

    /// Number of constants the model interprets.
    pub fn len(&self) -> usize {
        let entered = self.handle.enter();
        unsafe { Z3_model_get_num_consts(entered.raw(), self.handle.raw()) as usize }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.handle.render())
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("context", &self.handle.context().id())
            .field("consts", &self.len())
            .finish()
    }
}
