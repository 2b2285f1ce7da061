use std::ffi::c_uint;
use std::fmt;

use z3_sys::*;

use crate::context::{Context, c_name, symbol};
use crate::error::Z3Error;
use crate::expr::Expr;
use crate::handle::Managed;
use crate::sort::Sort;

/// An uninterpreted function `name(domain...) -> range`.
///
/// Declarations are AST nodes inside Z3 and are reference counted the same
/// way as [`Expr`].
#[derive(Clone)]
pub struct FuncDecl {
    handle: Managed<Z3_func_decl>,
}

impl FuncDecl {
    pub fn context(&self) -> Context {
        Context::from_inner(self.handle.context().clone())
    }

    /// Number of arguments.
    pub fn arity(&self) -> u32 {
        let entered = self.handle.enter();
        unsafe { Z3_get_arity(entered.raw(), self.handle.raw()) }
    }

    pub fn name(&self) -> String {
        let entered = self.handle.enter();
        let ctx = entered.raw();
        let sym = unsafe { Z3_get_decl_name(ctx, self.handle.raw()) };
        entered.string(unsafe { Z3_get_symbol_string(ctx, sym) })
    }
}

impl fmt::Display for FuncDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.handle.render())
    }
}

impl fmt::Debug for FuncDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FuncDecl({self})")
    }
}

impl Context {
    /// Declare `name(domain...) -> range`. A field of a record-like sort is
    /// usually modelled as `field(Record) -> FieldSort`.
    pub fn func_decl(&self, name: &str, domain: &[&Sort], range: &Sort) -> Result<FuncDecl, Z3Error> {
        let domain = domain
            .iter()
            .map(|sort| {
                self.owns(&sort.handle)?;
                Ok(sort.handle.raw())
            })
            .collect::<Result<Vec<Z3_sort>, Z3Error>>()?;
        self.owns(&range.handle)?;
        let name = c_name(name)?;
        let range = range.handle.raw();
        let handle = self.make(|c| unsafe {
            Z3_mk_func_decl(
                c,
                symbol(c, &name),
                domain.len() as c_uint,
                domain.as_ptr(),
                range,
            )
        })?;
        Ok(FuncDecl { handle })
    }

    /// Apply `f` to `args`.
    pub fn apply(&self, f: &FuncDecl, args: &[&Expr]) -> Result<Expr, Z3Error> {
        self.owns(&f.handle)?;
        let raws = self.raw_args(args)?;
        let decl = f.handle.raw();
        self.expr(|c| unsafe { Z3_mk_app(c, decl, raws.len() as c_uint, raws.as_ptr()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_reports_name_and_arity() {
        let ctx = Context::with_default_config().unwrap();
        let user = ctx.uninterpreted_sort("User").unwrap();
        let int = ctx.int_sort().unwrap();
        let age = ctx.func_decl("Age", &[&user], &int).unwrap();
        assert_eq!(age.name(), "Age");
        assert_eq!(age.arity(), 1);
        assert_eq!(age.to_string(), "(declare-fun Age (User) Int)");
    }

    #[test]
    fn application_has_range_sort() {
        let ctx = Context::with_default_config().unwrap();
        let int = ctx.int_sort().unwrap();
        let f = ctx.func_decl("f", &[&int, &int], &int).unwrap();
        let x = ctx.constant("x", &int).unwrap();
        let app = ctx.apply(&f, &[&x, &x]).unwrap();
        assert_eq!(app.to_string(), "(f x x)");
        assert_eq!(app.sort().unwrap(), int);
    }

    #[test]
    fn wrong_arity_is_an_engine_error() {
        let ctx = Context::with_default_config().unwrap();
        let int = ctx.int_sort().unwrap();
        let f = ctx.func_decl("f", &[&int], &int).unwrap();
        let x = ctx.constant("x", &int).unwrap();
        assert!(matches!(
            ctx.apply(&f, &[&x, &x]).unwrap_err(),
            Z3Error::Engine { .. }
        ));
    }

    #[test]
    fn nullary_declaration_behaves_like_a_constant() {
        let ctx = Context::with_default_config().unwrap();
        let int = ctx.int_sort().unwrap();
        let c = ctx.func_decl("c", &[], &int).unwrap();
        let app = ctx.apply(&c, &[]).unwrap();
        assert_eq!(app, ctx.constant("c", &int).unwrap());
    }

    #[test]
    fn declarations_hold_a_handle_each() {
        let ctx = Context::with_default_config().unwrap();
        let int = ctx.int_sort().unwrap();
        let base = ctx.live_handles();
        let f = ctx.func_decl("f", &[&int], &int).unwrap();
        let g = f.clone();
        assert_eq!(ctx.live_handles(), base + 2);
        drop(f);
        assert_eq!(g.context(), ctx);
        drop(g);
        assert_eq!(ctx.live_handles(), base);
    }
}
