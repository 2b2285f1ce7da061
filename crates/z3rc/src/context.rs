use std::ffi::CString;
use std::fmt;
use std::sync::Arc;

use z3_sys::*;

use crate::config::Config;
use crate::diagnostics;
use crate::error::Z3Error;
use crate::handle::{ContextInner, Managed, RefCounted};

/// Root owner of every sort, expression, solver and model built through it.
///
/// `Context` is a cheap handle: clones share the same foreign context. The
/// `Z3_context` is deleted once the last `Context` clone *and* the last object
/// created from it have been dropped.
///
/// Calls on one context are serialized by an internal lock, so a context and
/// its objects may be shared across threads. Independent contexts never
/// contend with each other.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    /// Create a reference-counted context from `config`.
    ///
    /// Z3 copies the configuration, so `config` may be dropped afterwards.
    pub fn new(config: &Config) -> Result<Self, Z3Error> {
        let raw = unsafe { Z3_mk_context_rc(config.raw()) };
        if raw.is_null() {
            return Err(Z3Error::NullHandle("context"));
        }
        diagnostics::install(raw);
        let inner = Arc::new(ContextInner::new(raw));
        tracing::debug!(
            context = inner.id(),
            params = config.params().len(),
            "created Z3 context"
        );
        Ok(Self { inner })
    }

    /// Create a context with Z3's default parameters.
    pub fn with_default_config() -> Result<Self, Z3Error> {
        Self::new(&Config::new())
    }

    /// Process-unique identifier, used in log output.
    pub fn id(&self) -> usize {
        self.inner.id()
    }

    /// Number of live handles (sorts, expressions, solvers, ...) created
    /// under this context and not yet dropped.
    pub fn live_handles(&self) -> usize {
        self.inner.live_handles()
    }

    /// Ask any `check` currently running on this context to give up.
    ///
    /// Safe to call from another thread while `check` holds the context; the
    /// interrupted check reports [`SatResult::Unknown`](crate::SatResult::Unknown).
    pub fn interrupt(&self) {
        self.inner.interrupt();
    }

    pub(crate) fn from_inner(inner: Arc<ContextInner>) -> Self {
        Self { inner }
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &Arc<ContextInner> {
        &self.inner
    }

    /// Run one constructor call under the context lock and take ownership of
    /// its result.
    pub(crate) fn make<T: RefCounted>(
        &self,
        build: impl FnOnce(Z3_context) -> T,
    ) -> Result<Managed<T>, Z3Error> {
        let entered = self.inner.enter();
        let raw = build(entered.raw());
        Managed::acquire(&self.inner, &entered, raw)
    }

    /// Fail unless `handle` was created under this context.
    pub(crate) fn owns<T: RefCounted>(&self, handle: &Managed<T>) -> Result<(), Z3Error> {
        handle.same_context(&self.inner)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id())
            .field("live_handles", &self.live_handles())
            .finish()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Context {}

/// Intern `name` as a Z3 string symbol.
pub(crate) fn symbol(ctx: Z3_context, name: &CString) -> Z3_symbol {
    unsafe { Z3_mk_string_symbol(ctx, name.as_ptr()) }
}

/// Convert a user-supplied name, rejecting interior NUL bytes.
pub(crate) fn c_name(name: &str) -> Result<CString, Z3Error> {
    CString::new(name).map_err(|_| Z3Error::InvalidName(name.to_string()))
}
