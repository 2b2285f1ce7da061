use std::ffi::c_uint;
use std::fmt;

use z3_sys::*;

use crate::context::{Context, c_name, symbol};
use crate::error::Z3Error;
use crate::handle::Managed;
use crate::sort::Sort;

type UnaryFn = unsafe extern "C" fn(Z3_context, Z3_ast) -> Z3_ast;
type BinaryFn = unsafe extern "C" fn(Z3_context, Z3_ast, Z3_ast) -> Z3_ast;
type TernaryFn = unsafe extern "C" fn(Z3_context, Z3_ast, Z3_ast, Z3_ast) -> Z3_ast;
type NaryFn = unsafe extern "C" fn(Z3_context, c_uint, *const Z3_ast) -> Z3_ast;

/// A Z3 expression (AST node).
///
/// Cloning takes another engine reference on the same node; dropping gives it
/// back. The node's context stays alive for as long as the `Expr` does.
#[derive(Clone)]
pub struct Expr {
    pub(crate) handle: Managed<Z3_ast>,
}

impl Expr {
    /// The context this expression was created in.
    pub fn context(&self) -> Context {
        Context::from_inner(self.handle.context().clone())
    }

    pub fn sort(&self) -> Result<Sort, Z3Error> {
        let raw = self.handle.raw();
        let handle = self
            .context()
            .make(|c| unsafe { Z3_get_sort(c, raw) })?;
        Ok(Sort { handle })
    }

    /// Z3's simplified form of this expression.
    pub fn simplify(&self) -> Result<Expr, Z3Error> {
        let raw = self.handle.raw();
        self.context().expr(|c| unsafe { Z3_simplify(c, raw) })
    }

    pub fn is_numeral(&self) -> bool {
        let entered = self.handle.enter();
        unsafe { Z3_is_numeral_ast(entered.raw(), self.handle.raw()) }
    }

    /// The value of an integer or bit-vector numeral that fits in an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        let entered = self.handle.enter();
        let mut value: i64 = 0;
        let ok =
            unsafe { Z3_get_numeral_int64(entered.raw(), self.handle.raw(), &mut value) };
        ok.then_some(value)
    }

    /// The value of an integer or bit-vector numeral that fits in a `u64`.
    pub fn as_u64(&self) -> Option<u64> {
        let entered = self.handle.enter();
        let mut value: u64 = 0;
        let ok =
            unsafe { Z3_get_numeral_uint64(entered.raw(), self.handle.raw(), &mut value) };
        ok.then_some(value)
    }
}

impl PartialEq for Expr {
    /// Structural identity: Z3 hash-conses nodes, so equal terms share one node.
    fn eq(&self, other: &Self) -> bool {
        if self.handle.same_context(other.handle.context()).is_err() {
            return false;
        }
        let entered = self.handle.enter();
        unsafe { Z3_is_eq_ast(entered.raw(), self.handle.raw(), other.handle.raw()) }
    }
}

impl Eq for Expr {}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.handle.render())
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr({self})")
    }
}

// Construction helpers shared by the factory methods below and in `fpa`,
// `func` and `quantifier`.
impl Context {
    pub(crate) fn expr(&self, build: impl FnOnce(Z3_context) -> Z3_ast) -> Result<Expr, Z3Error> {
        Ok(Expr {
            handle: self.make(build)?,
        })
    }

    pub(crate) fn unary(&self, op: UnaryFn, a: &Expr) -> Result<Expr, Z3Error> {
        self.owns(&a.handle)?;
        let a = a.handle.raw();
        self.expr(|c| unsafe { op(c, a) })
    }

    pub(crate) fn binary(&self, op: BinaryFn, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.owns(&a.handle)?;
        self.owns(&b.handle)?;
        let (a, b) = (a.handle.raw(), b.handle.raw());
        self.expr(|c| unsafe { op(c, a, b) })
    }

    pub(crate) fn ternary(
        &self,
        op: TernaryFn,
        a: &Expr,
        b: &Expr,
        d: &Expr,
    ) -> Result<Expr, Z3Error> {
        self.owns(&a.handle)?;
        self.owns(&b.handle)?;
        self.owns(&d.handle)?;
        let (a, b, d) = (a.handle.raw(), b.handle.raw(), d.handle.raw());
        self.expr(|c| unsafe { op(c, a, b, d) })
    }

    fn nary(&self, op: NaryFn, args: &[&Expr]) -> Result<Expr, Z3Error> {
        let raws = self.raw_args(args)?;
        self.expr(|c| unsafe { op(c, raws.len() as c_uint, raws.as_ptr()) })
    }

    pub(crate) fn raw_args(&self, args: &[&Expr]) -> Result<Vec<Z3_ast>, Z3Error> {
        args.iter()
            .map(|arg| {
                self.owns(&arg.handle)?;
                Ok(arg.handle.raw())
            })
            .collect()
    }
}

/// Constants and literals.
impl Context {
    /// A named constant of `sort`. The same name and sort always yield the
    /// same node.
    pub fn constant(&self, name: &str, sort: &Sort) -> Result<Expr, Z3Error> {
        self.owns(&sort.handle)?;
        let name = c_name(name)?;
        let sort = sort.handle.raw();
        self.expr(|c| unsafe { Z3_mk_const(c, symbol(c, &name), sort) })
    }

    /// An integer or bit-vector numeral of `sort`. Bit-vector values wrap
    /// modulo the sort's width.
    pub fn int(&self, value: i64, sort: &Sort) -> Result<Expr, Z3Error> {
        self.owns(&sort.handle)?;
        let sort = sort.handle.raw();
        self.expr(|c| unsafe { Z3_mk_int64(c, value, sort) })
    }

    pub fn uint(&self, value: u64, sort: &Sort) -> Result<Expr, Z3Error> {
        self.owns(&sort.handle)?;
        let sort = sort.handle.raw();
        self.expr(|c| unsafe { Z3_mk_unsigned_int64(c, value, sort) })
    }

    /// A numeral written in decimal, e.g. `"-12"` or `"3/4"` for reals.
    pub fn numeral(&self, value: &str, sort: &Sort) -> Result<Expr, Z3Error> {
        self.owns(&sort.handle)?;
        let value = c_name(value)?;
        let sort = sort.handle.raw();
        self.expr(|c| unsafe { Z3_mk_numeral(c, value.as_ptr(), sort) })
    }

    /// A bit-vector numeral of `width` bits.
    pub fn bv_val(&self, value: i64, width: u32) -> Result<Expr, Z3Error> {
        let sort = self.bv_sort(width)?;
        self.int(value, &sort)
    }

    pub fn bool_val(&self, value: bool) -> Result<Expr, Z3Error> {
        if value {
            self.expr(|c| unsafe { Z3_mk_true(c) })
        } else {
            self.expr(|c| unsafe { Z3_mk_false(c) })
        }
    }
}

/// Equality and boolean connectives.
impl Context {
    pub fn eq(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_eq, a, b)
    }

    /// Pairwise disequality of all `args`.
    pub fn distinct(&self, args: &[&Expr]) -> Result<Expr, Z3Error> {
        self.nary(Z3_mk_distinct, args)
    }

    /// Conjunction of all `args`.
    pub fn and(&self, args: &[&Expr]) -> Result<Expr, Z3Error> {
        self.nary(Z3_mk_and, args)
    }

    /// Disjunction of all `args`.
    pub fn or(&self, args: &[&Expr]) -> Result<Expr, Z3Error> {
        self.nary(Z3_mk_or, args)
    }

    pub fn not(&self, a: &Expr) -> Result<Expr, Z3Error> {
        self.unary(Z3_mk_not, a)
    }

    pub fn implies(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_implies, a, b)
    }

    pub fn xor(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_xor, a, b)
    }

    /// `if cond then a else b`.
    pub fn ite(&self, cond: &Expr, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.ternary(Z3_mk_ite, cond, a, b)
    }
}

/// Integer and real arithmetic.
impl Context {
    pub fn add(&self, args: &[&Expr]) -> Result<Expr, Z3Error> {
        self.nary(Z3_mk_add, args)
    }

    pub fn sub(&self, args: &[&Expr]) -> Result<Expr, Z3Error> {
        self.nary(Z3_mk_sub, args)
    }

    pub fn mul(&self, args: &[&Expr]) -> Result<Expr, Z3Error> {
        self.nary(Z3_mk_mul, args)
    }

    /// Integer division for `Int`, real division for `Real`.
    pub fn div(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_div, a, b)
    }

    pub fn rem(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_mod, a, b)
    }

    pub fn neg(&self, a: &Expr) -> Result<Expr, Z3Error> {
        self.unary(Z3_mk_unary_minus, a)
    }

    pub fn gt(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_gt, a, b)
    }

    pub fn ge(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_ge, a, b)
    }

    pub fn lt(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_lt, a, b)
    }

    pub fn le(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_le, a, b)
    }
}

/// Bit-vectors. Arithmetic wraps modulo 2^width.
impl Context {
    pub fn bvadd(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_bvadd, a, b)
    }

    pub fn bvsub(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_bvsub, a, b)
    }

    pub fn bvmul(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_bvmul, a, b)
    }

    pub fn bvudiv(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_bvudiv, a, b)
    }

    pub fn bvurem(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_bvurem, a, b)
    }

    pub fn bvneg(&self, a: &Expr) -> Result<Expr, Z3Error> {
        self.unary(Z3_mk_bvneg, a)
    }

    pub fn bvand(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_bvand, a, b)
    }

    pub fn bvor(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_bvor, a, b)
    }

    pub fn bvxor(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_bvxor, a, b)
    }

    pub fn bvnot(&self, a: &Expr) -> Result<Expr, Z3Error> {
        self.unary(Z3_mk_bvnot, a)
    }

    pub fn bvult(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_bvult, a, b)
    }

    pub fn bvule(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_bvule, a, b)
    }

    pub fn bvugt(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_bvugt, a, b)
    }

    pub fn bvuge(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_bvuge, a, b)
    }

    pub fn bvslt(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_bvslt, a, b)
    }

    pub fn bvsle(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_bvsle, a, b)
    }

    pub fn bvsgt(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_bvsgt, a, b)
    }

    pub fn bvsge(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_bvsge, a, b)
    }

    /// Bits `high..=low` of `a`.
    pub fn extract(&self, high: u32, low: u32, a: &Expr) -> Result<Expr, Z3Error> {
        self.owns(&a.handle)?;
        let a = a.handle.raw();
        self.expr(|c| unsafe { Z3_mk_extract(c, high, low, a) })
    }

    /// `a` in the high bits, `b` in the low bits.
    pub fn concat(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_concat, a, b)
    }

    /// Widen `a` by `extra` zero bits.
    pub fn zero_ext(&self, extra: u32, a: &Expr) -> Result<Expr, Z3Error> {
        self.owns(&a.handle)?;
        let a = a.handle.raw();
        self.expr(|c| unsafe { Z3_mk_zero_ext(c, extra, a) })
    }

    /// Widen `a` by `extra` copies of its sign bit.
    pub fn sign_ext(&self, extra: u32, a: &Expr) -> Result<Expr, Z3Error> {
        self.owns(&a.handle)?;
        let a = a.handle.raw();
        self.expr(|c| unsafe { Z3_mk_sign_ext(c, extra, a) })
    }
}

/// Arrays.
impl Context {
    /// `array[index]`.
    pub fn select(&self, array: &Expr, index: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_select, array, index)
    }

    /// A new array equal to `array` except that `index` maps to `value`.
    pub fn store(&self, array: &Expr, index: &Expr, value: &Expr) -> Result<Expr, Z3Error> {
        self.ternary(Z3_mk_store, array, index, value)
    }

    /// The array over `domain` mapping every index to `value`.
    pub fn const_array(&self, domain: &Sort, value: &Expr) -> Result<Expr, Z3Error> {
        self.owns(&domain.handle)?;
        self.owns(&value.handle)?;
        let (d, v) = (domain.handle.raw(), value.handle.raw());
        self.expr(|c| unsafe { Z3_mk_const_array(c, d, v) })
    }
}
