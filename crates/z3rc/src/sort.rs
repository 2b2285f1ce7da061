use std::fmt;

use z3_sys::*;

use crate::context::{Context, c_name, symbol};
use crate::error::Z3Error;
use crate::handle::Managed;

/// Broad classification of a [`Sort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKind {
    Bool,
    Int,
    Real,
    BitVec,
    Array,
    FloatingPoint,
    RoundingMode,
    Uninterpreted,
    /// Datatypes, sequences and other sorts this crate does not construct.
    Other,
}

/// The domain of an expression, e.g. `Int` or `(_ BitVec 8)`.
#[derive(Clone)]
pub struct Sort {
    pub(crate) handle: Managed<Z3_sort>,
}

impl Sort {
    /// The context this sort was created in.
    pub fn context(&self) -> Context {
        Context::from_inner(self.handle.context().clone())
    }

    pub fn kind(&self) -> SortKind {
        let entered = self.handle.enter();
        match unsafe { Z3_get_sort_kind(entered.raw(), self.handle.raw()) } {
            z3_sys::SortKind::Bool => SortKind::Bool,
            z3_sys::SortKind::Int => SortKind::Int,
            z3_sys::SortKind::Real => SortKind::Real,
            z3_sys::SortKind::BV => SortKind::BitVec,
            z3_sys::SortKind::Array => SortKind::Array,
            z3_sys::SortKind::FloatingPoint => SortKind::FloatingPoint,
            z3_sys::SortKind::RoundingMode => SortKind::RoundingMode,
            z3_sys::SortKind::Uninterpreted => SortKind::Uninterpreted,
            _ => SortKind::Other,
        }
    }

    /// Width of a bit-vector sort, `None` for every other kind.
    pub fn bv_size(&self) -> Option<u32> {
        if self.kind() != SortKind::BitVec {
            return None;
        }
        let entered = self.handle.enter();
        Some(unsafe { Z3_get_bv_sort_size(entered.raw(), self.handle.raw()) })
    }

    /// `(exponent bits, significand bits)` of a floating-point sort.
    pub fn float_bits(&self) -> Option<(u32, u32)> {
        if self.kind() != SortKind::FloatingPoint {
            return None;
        }
        let entered = self.handle.enter();
        let (ctx, raw) = (entered.raw(), self.handle.raw());
        let bits = unsafe { (Z3_fpa_get_ebits(ctx, raw), Z3_fpa_get_sbits(ctx, raw)) };
        Some(bits)
    }
}

impl PartialEq for Sort {
    fn eq(&self, other: &Self) -> bool {
        if self.handle.same_context(other.handle.context()).is_err() {
            return false;
        }
        let entered = self.handle.enter();
        unsafe { Z3_is_eq_sort(entered.raw(), self.handle.raw(), other.handle.raw()) }
    }
}

impl Eq for Sort {}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.handle.render())
    }
}

impl fmt::Debug for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sort({self})")
    }
}

impl Context {
    fn sort(&self, build: impl FnOnce(Z3_context) -> Z3_sort) -> Result<Sort, Z3Error> {
        Ok(Sort {
            handle: self.make(build)?,
        })
    }

    pub fn bool_sort(&self) -> Result<Sort, Z3Error> {
        self.sort(|c| unsafe { Z3_mk_bool_sort(c) })
    }

    pub fn int_sort(&self) -> Result<Sort, Z3Error> {
        self.sort(|c| unsafe { Z3_mk_int_sort(c) })
    }

    pub fn real_sort(&self) -> Result<Sort, Z3Error> {
        self.sort(|c| unsafe { Z3_mk_real_sort(c) })
    }

    /// Bit-vectors of `width` bits. A zero width is an engine error.
    pub fn bv_sort(&self, width: u32) -> Result<Sort, Z3Error> {
        self.sort(|c| unsafe { Z3_mk_bv_sort(c, width) })
    }

    /// Arrays mapping `domain` to `range`.
    pub fn array_sort(&self, domain: &Sort, range: &Sort) -> Result<Sort, Z3Error> {
        self.owns(&domain.handle)?;
        self.owns(&range.handle)?;
        let (d, r) = (domain.handle.raw(), range.handle.raw());
        self.sort(|c| unsafe { Z3_mk_array_sort(c, d, r) })
    }

    /// A fresh uninterpreted sort such as `User`.
    pub fn uninterpreted_sort(&self, name: &str) -> Result<Sort, Z3Error> {
        let name = c_name(name)?;
        self.sort(|c| unsafe { Z3_mk_uninterpreted_sort(c, symbol(c, &name)) })
    }

    /// Floating point with `ebits` exponent and `sbits` significand bits
    /// (the significand count includes the hidden bit).
    pub fn float_sort(&self, ebits: u32, sbits: u32) -> Result<Sort, Z3Error> {
        self.sort(|c| unsafe { Z3_mk_fpa_sort(c, ebits, sbits) })
    }

    /// IEEE 754 half precision.
    pub fn float16_sort(&self) -> Result<Sort, Z3Error> {
        self.sort(|c| unsafe { Z3_mk_fpa_sort_half(c) })
    }

    /// IEEE 754 single precision.
    pub fn float32_sort(&self) -> Result<Sort, Z3Error> {
        self.sort(|c| unsafe { Z3_mk_fpa_sort_single(c) })
    }

    /// IEEE 754 double precision.
    pub fn float64_sort(&self) -> Result<Sort, Z3Error> {
        self.sort(|c| unsafe { Z3_mk_fpa_sort_double(c) })
    }

    /// IEEE 754 quadruple precision.
    pub fn float128_sort(&self) -> Result<Sort, Z3Error> {
        self.sort(|c| unsafe { Z3_mk_fpa_sort_quadruple(c) })
    }

    pub fn rounding_mode_sort(&self) -> Result<Sort, Z3Error> {
        self.sort(|c| unsafe { Z3_mk_fpa_rounding_mode_sort(c) })
    }
}
