//! IEEE 754 floating point (Z3's FPA theory).
//!
//! Arithmetic takes an explicit rounding-mode expression as its first
//! argument; [`Context::rne`] is the usual IEEE default.

use z3_sys::*;

use crate::context::Context;
use crate::error::Z3Error;
use crate::expr::Expr;
use crate::sort::Sort;

type RoundedBinaryFn = unsafe extern "C" fn(Z3_context, Z3_ast, Z3_ast, Z3_ast) -> Z3_ast;

/// Literals and special values.
impl Context {
    /// The float of `sort` nearest to `value`.
    pub fn float_val(&self, value: f64, sort: &Sort) -> Result<Expr, Z3Error> {
        self.owns(&sort.handle)?;
        let sort = sort.handle.raw();
        self.expr(|c| unsafe { Z3_mk_fpa_numeral_double(c, value, sort) })
    }

    /// A single-precision literal.
    pub fn float32_val(&self, value: f32) -> Result<Expr, Z3Error> {
        let sort = self.float32_sort()?;
        let raw = sort.handle.raw();
        self.expr(|c| unsafe { Z3_mk_fpa_numeral_float(c, value, raw) })
    }

    pub fn fp_nan(&self, sort: &Sort) -> Result<Expr, Z3Error> {
        self.owns(&sort.handle)?;
        let sort = sort.handle.raw();
        self.expr(|c| unsafe { Z3_mk_fpa_nan(c, sort) })
    }

    pub fn fp_inf(&self, sort: &Sort, negative: bool) -> Result<Expr, Z3Error> {
        self.owns(&sort.handle)?;
        let sort = sort.handle.raw();
        self.expr(|c| unsafe { Z3_mk_fpa_inf(c, sort, negative) })
    }

    pub fn fp_zero(&self, sort: &Sort, negative: bool) -> Result<Expr, Z3Error> {
        self.owns(&sort.handle)?;
        let sort = sort.handle.raw();
        self.expr(|c| unsafe { Z3_mk_fpa_zero(c, sort, negative) })
    }
}

/// Rounding modes.
impl Context {
    /// Round to nearest, ties to even.
    pub fn rne(&self) -> Result<Expr, Z3Error> {
        self.expr(|c| unsafe { Z3_mk_fpa_round_nearest_ties_to_even(c) })
    }

    /// Round to nearest, ties away from zero.
    pub fn rna(&self) -> Result<Expr, Z3Error> {
        self.expr(|c| unsafe { Z3_mk_fpa_round_nearest_ties_to_away(c) })
    }

    /// Round toward positive infinity.
    pub fn rtp(&self) -> Result<Expr, Z3Error> {
        self.expr(|c| unsafe { Z3_mk_fpa_round_toward_positive(c) })
    }

    /// Round toward negative infinity.
    pub fn rtn(&self) -> Result<Expr, Z3Error> {
        self.expr(|c| unsafe { Z3_mk_fpa_round_toward_negative(c) })
    }

    /// Round toward zero.
    pub fn rtz(&self) -> Result<Expr, Z3Error> {
        self.expr(|c| unsafe { Z3_mk_fpa_round_toward_zero(c) })
    }
}

/// Arithmetic.
impl Context {
    fn rounded(&self, op: RoundedBinaryFn, rm: &Expr, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.ternary(op, rm, a, b)
    }

    pub fn fpa_add(&self, rm: &Expr, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.rounded(Z3_mk_fpa_add, rm, a, b)
    }

    pub fn fpa_sub(&self, rm: &Expr, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.rounded(Z3_mk_fpa_sub, rm, a, b)
    }

    pub fn fpa_mul(&self, rm: &Expr, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.rounded(Z3_mk_fpa_mul, rm, a, b)
    }

    pub fn fpa_div(&self, rm: &Expr, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.rounded(Z3_mk_fpa_div, rm, a, b)
    }

    pub fn fpa_sqrt(&self, rm: &Expr, a: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_fpa_sqrt, rm, a)
    }

    pub fn fpa_neg(&self, a: &Expr) -> Result<Expr, Z3Error> {
        self.unary(Z3_mk_fpa_neg, a)
    }

    pub fn fpa_abs(&self, a: &Expr) -> Result<Expr, Z3Error> {
        self.unary(Z3_mk_fpa_abs, a)
    }
}

/// Comparison and classification. `fpa_eq` is IEEE equality: NaN is unequal
/// to itself and `+0 == -0`.
impl Context {
    pub fn fpa_eq(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_fpa_eq, a, b)
    }

    pub fn fpa_lt(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_fpa_lt, a, b)
    }

    pub fn fpa_le(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_fpa_leq, a, b)
    }

    pub fn fpa_gt(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_fpa_gt, a, b)
    }

    pub fn fpa_ge(&self, a: &Expr, b: &Expr) -> Result<Expr, Z3Error> {
        self.binary(Z3_mk_fpa_geq, a, b)
    }

    pub fn fpa_is_nan(&self, a: &Expr) -> Result<Expr, Z3Error> {
        self.unary(Z3_mk_fpa_is_nan, a)
    }

    pub fn fpa_is_infinite(&self, a: &Expr) -> Result<Expr, Z3Error> {
        self.unary(Z3_mk_fpa_is_infinite, a)
    }

    pub fn fpa_is_zero(&self, a: &Expr) -> Result<Expr, Z3Error> {
        self.unary(Z3_mk_fpa_is_zero, a)
    }

    pub fn fpa_is_negative(&self, a: &Expr) -> Result<Expr, Z3Error> {
        self.unary(Z3_mk_fpa_is_negative, a)
    }
}

/// Bit-level conversion.
impl Context {
    /// The IEEE 754 bit pattern of `a` as a bit-vector of width `ebits + sbits`.
    ///
    /// NaN has several encodings; Z3 leaves the one chosen unspecified.
    pub fn fpa_to_ieee_bv(&self, a: &Expr) -> Result<Expr, Z3Error> {
        self.unary(Z3_mk_fpa_to_ieee_bv, a)
    }

    /// Reinterpret the bit-vector `bits` as a float of `sort`.
    pub fn fpa_from_ieee_bv(&self, bits: &Expr, sort: &Sort) -> Result<Expr, Z3Error> {
        self.owns(&bits.handle)?;
        self.owns(&sort.handle)?;
        let (b, s) = (bits.handle.raw(), sort.handle.raw());
        self.expr(|c| unsafe { Z3_mk_fpa_to_fp_bv(c, b, s) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::SortKind;

    fn ctx() -> Context {
        Context::with_default_config().unwrap()
    }

    #[test]
    fn one_has_the_expected_bit_pattern() {
        let ctx = ctx();
        let one = ctx.float_val(1.0, &ctx.float32_sort().unwrap()).unwrap();
        let bits = ctx.fpa_to_ieee_bv(&one).unwrap().simplify().unwrap();
        assert_eq!(bits.as_u64(), Some(0x3f80_0000));
    }

    #[test]
    fn float32_val_matches_float_val() {
        let ctx = ctx();
        let a = ctx.float32_val(2.5).unwrap();
        let b = ctx.float_val(2.5, &ctx.float32_sort().unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn bit_pattern_round_trips_through_sort() {
        let ctx = ctx();
        let f64s = ctx.float64_sort().unwrap();
        let bits = ctx.bv_val(0x4000_0000_0000_0000, 64).unwrap();
        let two = ctx.fpa_from_ieee_bv(&bits, &f64s).unwrap();
        let expected = ctx.float_val(2.0, &f64s).unwrap();
        let same = ctx.fpa_eq(&two, &expected).unwrap().simplify().unwrap();
        assert_eq!(same, ctx.bool_val(true).unwrap());
    }

    #[test]
    fn nan_is_not_equal_to_itself() {
        let ctx = ctx();
        let nan = ctx.fp_nan(&ctx.float32_sort().unwrap()).unwrap();
        let eq = ctx.fpa_eq(&nan, &nan).unwrap().simplify().unwrap();
        assert_eq!(eq, ctx.bool_val(false).unwrap());
        let is_nan = ctx.fpa_is_nan(&nan).unwrap().simplify().unwrap();
        assert_eq!(is_nan, ctx.bool_val(true).unwrap());
    }

    #[test]
    fn signed_zeros_compare_equal() {
        let ctx = ctx();
        let s = ctx.float32_sort().unwrap();
        let pos = ctx.fp_zero(&s, false).unwrap();
        let neg = ctx.fp_zero(&s, true).unwrap();
        let eq = ctx.fpa_eq(&pos, &neg).unwrap().simplify().unwrap();
        assert_eq!(eq, ctx.bool_val(true).unwrap());
        let is_neg = ctx.fpa_is_negative(&neg).unwrap().simplify().unwrap();
        assert_eq!(is_neg, ctx.bool_val(true).unwrap());
    }

    #[test]
    fn rounding_modes_have_rounding_sort() {
        let ctx = ctx();
        for rm in [ctx.rne(), ctx.rna(), ctx.rtp(), ctx.rtn(), ctx.rtz()] {
            assert_eq!(rm.unwrap().sort().unwrap().kind(), SortKind::RoundingMode);
        }
    }

    #[test]
    fn infinity_classifies() {
        let ctx = ctx();
        let inf = ctx.fp_inf(&ctx.float64_sort().unwrap(), true).unwrap();
        let is_inf = ctx.fpa_is_infinite(&inf).unwrap().simplify().unwrap();
        assert_eq!(is_inf, ctx.bool_val(true).unwrap());
    }

    #[test]
    fn arithmetic_requires_a_rounding_mode() {
        let ctx = ctx();
        let s = ctx.float32_sort().unwrap();
        let a = ctx.constant("a", &s).unwrap();
        assert!(ctx.fpa_add(&a, &a, &a).is_err());
        let sum = ctx.fpa_add(&ctx.rne().unwrap(), &a, &a).unwrap();
        assert_eq!(sum.sort().unwrap(), s);
    }
}
