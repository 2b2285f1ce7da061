use std::ffi::c_uint;
use std::ptr;

use z3_sys::*;

use crate::context::Context;
use crate::error::Z3Error;
use crate::expr::Expr;

type QuantifierFn = unsafe extern "C" fn(
    Z3_context,
    c_uint,
    c_uint,
    *const Z3_app,
    c_uint,
    *const Z3_pattern,
    Z3_ast,
) -> Z3_ast;

impl Context {
    /// `forall vars. body`, binding each constant in `vars` wherever it
    /// occurs in `body`. With no variables the body is returned as is.
    pub fn forall(&self, vars: &[&Expr], body: &Expr) -> Result<Expr, Z3Error> {
        self.quantifier(Z3_mk_forall_const, vars, body)
    }

    /// `exists vars. body`. With no variables the body is returned as is.
    pub fn exists(&self, vars: &[&Expr], body: &Expr) -> Result<Expr, Z3Error> {
        self.quantifier(Z3_mk_exists_const, vars, body)
    }

    fn quantifier(&self, op: QuantifierFn, vars: &[&Expr], body: &Expr) -> Result<Expr, Z3Error> {
        self.owns(&body.handle)?;
        if vars.is_empty() {
            return Ok(body.clone());
        }
        let vars = self.raw_args(vars)?;
        let body = body.handle.raw();
        self.expr(|c| unsafe {
            // Bound variables must be constants, i.e. applications.
            let apps: Vec<Z3_app> = vars.iter().map(|&v| Z3_to_app(c, v)).collect();
            op(
                c,
                0,
                apps.len() as c_uint,
                apps.as_ptr(),
                0,
                ptr::null(),
                body,
            )
        })
    }
}
