//! Lifetime management for foreign Z3 handles.
//!
//! Every object handed out by this crate wraps a raw Z3 pointer in a
//! [`Managed`] value. A `Managed` handle:
//!
//! - takes one engine reference when it is created or cloned, and gives it back
//!   exactly once when dropped;
//! - holds a strong [`Arc`] to the [`ContextInner`] that created it, so the
//!   `Z3_context` is deleted only after every child has released its reference;
//! - performs every foreign call under the context's mutex, which is what makes
//!   handles `Send + Sync`.
//!
//! The one rule callers inside the crate must follow: never drop a `Managed`
//! value while an [`Entered`] guard for the same context is alive on the
//! current thread. `Drop` takes the context lock, and the lock is not
//! reentrant.

use std::ffi::CStr;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use z3_sys::*;

use crate::error::{EngineErrorKind, Z3Error};

static NEXT_CONTEXT_ID: AtomicUsize = AtomicUsize::new(1);

/// The foreign context plus the state shared by all of its handles.
pub(crate) struct ContextInner {
    raw: Z3_context,
    lock: Mutex<()>,
    live: AtomicUsize,
    id: usize,
}

// SAFETY: `raw` is only dereferenced by Z3 through calls made while holding
// `lock` (see `enter`). `Z3_interrupt` is the single exception and is
// documented by Z3 as safe to call from any thread.
unsafe impl Send for ContextInner {}
unsafe impl Sync for ContextInner {}

impl ContextInner {
    /// Take ownership of a freshly created `Z3_mk_context_rc` context.
    pub(crate) fn new(raw: Z3_context) -> Self {
        Self {
            raw,
            lock: Mutex::new(()),
            live: AtomicUsize::new(0),
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Lock the context for a sequence of foreign calls.
    pub(crate) fn enter(&self) -> Entered<'_> {
        // A panic while holding the lock cannot leave Z3 half-updated from our
        // side; the engine state is whatever the last completed call left.
        let guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Entered {
            raw: self.raw,
            _guard: guard,
        }
    }

    pub(crate) fn id(&self) -> usize {
        self.id
    }

    pub(crate) fn live_handles(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Ask a running `check` on this context to stop. Does not take the lock.
    pub(crate) fn interrupt(&self) {
        tracing::debug!(context = self.id, "interrupting Z3 context");
        unsafe { Z3_interrupt(self.raw) }
    }
}

impl Drop for ContextInner {
    fn drop(&mut self) {
        let leaked = self.live.load(Ordering::Acquire);
        debug_assert_eq!(leaked, 0, "context dropped with live handles");
        tracing::debug!(context = self.id, "deleting Z3 context");
        unsafe { Z3_del_context(self.raw) }
    }
}

impl fmt::Debug for ContextInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextInner")
            .field("id", &self.id)
            .field("live", &self.live_handles())
            .finish()
    }
}

/// Proof that the current thread holds the context lock.
pub(crate) struct Entered<'a> {
    raw: Z3_context,
    _guard: MutexGuard<'a, ()>,
}

impl Entered<'_> {
    pub(crate) fn raw(&self) -> Z3_context {
        self.raw
    }

    /// Report the error left by the last foreign call, if any.
    pub(crate) fn check(&self) -> Result<(), Z3Error> {
        let code = unsafe { Z3_get_error_code(self.raw) };
        match EngineErrorKind::from_code(code) {
            None => Ok(()),
            Some(kind) => {
                let message = self.string(unsafe { Z3_get_error_msg(self.raw, code) });
                Err(Z3Error::Engine { kind, message })
            }
        }
    }

    /// Copy a Z3-owned string. Z3 reuses the buffer on the next call, so this
    /// must happen before the lock is released.
    pub(crate) fn string(&self, s: Z3_string) -> String {
        if s.is_null() {
            return String::new();
        }
        unsafe { CStr::from_ptr(s) }.to_string_lossy().into_owned()
    }
}

/// A raw Z3 handle kind with its own reference-counting entry points.
pub(crate) trait RefCounted: Copy {
    /// Human-readable kind, used in errors and logs.
    const NAME: &'static str;

    fn is_absent(self) -> bool;

    /// # Safety
    /// `ctx` must be locked and `raw` must belong to it.
    unsafe fn inc_ref(ctx: Z3_context, raw: Self);

    /// # Safety
    /// As for `inc_ref`; `raw` must hold a reference taken by `inc_ref`.
    unsafe fn dec_ref(ctx: Z3_context, raw: Self);

    /// # Safety
    /// As for `inc_ref`. The result is only valid until the next Z3 call.
    unsafe fn render(ctx: Z3_context, raw: Self) -> Z3_string;
}

impl RefCounted for Z3_ast {
    const NAME: &'static str = "ast";

    fn is_absent(self) -> bool {
        self.is_null()
    }

    unsafe fn inc_ref(ctx: Z3_context, raw: Self) {
        unsafe { Z3_inc_ref(ctx, raw) }
    }

    unsafe fn dec_ref(ctx: Z3_context, raw: Self) {
        unsafe { Z3_dec_ref(ctx, raw) }
    }

    unsafe fn render(ctx: Z3_context, raw: Self) -> Z3_string {
        unsafe { Z3_ast_to_string(ctx, raw) }
    }
}

impl RefCounted for Z3_sort {
    const NAME: &'static str = "sort";

    fn is_absent(self) -> bool {
        self.is_null()
    }

    unsafe fn inc_ref(ctx: Z3_context, raw: Self) {
        unsafe { Z3_inc_ref(ctx, Z3_sort_to_ast(ctx, raw)) }
    }

    unsafe fn dec_ref(ctx: Z3_context, raw: Self) {
        unsafe { Z3_dec_ref(ctx, Z3_sort_to_ast(ctx, raw)) }
    }

    unsafe fn render(ctx: Z3_context, raw: Self) -> Z3_string {
        unsafe { Z3_sort_to_string(ctx, raw) }
    }
}

impl RefCounted for Z3_func_decl {
    const NAME: &'static str = "function declaration";

    fn is_absent(self) -> bool {
        self.is_null()
    }

    unsafe fn inc_ref(ctx: Z3_context, raw: Self) {
        unsafe { Z3_inc_ref(ctx, Z3_func_decl_to_ast(ctx, raw)) }
    }

    unsafe fn dec_ref(ctx: Z3_context, raw: Self) {
        unsafe { Z3_dec_ref(ctx, Z3_func_decl_to_ast(ctx, raw)) }
    }

    unsafe fn render(ctx: Z3_context, raw: Self) -> Z3_string {
        unsafe { Z3_func_decl_to_string(ctx, raw) }
    }
}

impl RefCounted for Z3_solver {
    const NAME: &'static str = "solver";

    fn is_absent(self) -> bool {
        self.is_null()
    }

    unsafe fn inc_ref(ctx: Z3_context, raw: Self) {
        unsafe { Z3_solver_inc_ref(ctx, raw) }
    }

    unsafe fn dec_ref(ctx: Z3_context, raw: Self) {
        unsafe { Z3_solver_dec_ref(ctx, raw) }
    }

    unsafe fn render(ctx: Z3_context, raw: Self) -> Z3_string {
        unsafe { Z3_solver_to_string(ctx, raw) }
    }
}

impl RefCounted for Z3_optimize {
    const NAME: &'static str = "optimizer";

    fn is_absent(self) -> bool {
        self.is_null()
    }

    unsafe fn inc_ref(ctx: Z3_context, raw: Self) {
        unsafe { Z3_optimize_inc_ref(ctx, raw) }
    }

    unsafe fn dec_ref(ctx: Z3_context, raw: Self) {
        unsafe { Z3_optimize_dec_ref(ctx, raw) }
    }

    unsafe fn render(ctx: Z3_context, raw: Self) -> Z3_string {
        unsafe { Z3_optimize_to_string(ctx, raw) }
    }
}

impl RefCounted for Z3_model {
    const NAME: &'static str = "model";

    fn is_absent(self) -> bool {
        self.is_null()
    }

    unsafe fn inc_ref(ctx: Z3_context, raw: Self) {
        unsafe { Z3_model_inc_ref(ctx, raw) }
    }

    unsafe fn dec_ref(ctx: Z3_context, raw: Self) {
        unsafe { Z3_model_dec_ref(ctx, raw) }
    }

    unsafe fn render(ctx: Z3_context, raw: Self) -> Z3_string {
        unsafe { Z3_model_to_string(ctx, raw) }
    }
}

impl RefCounted for Z3_params {
    const NAME: &'static str = "parameter set";

    fn is_absent(self) -> bool {
        self.is_null()
    }

    unsafe fn inc_ref(ctx: Z3_context, raw: Self) {
        unsafe { Z3_params_inc_ref(ctx, raw) }
    }

    unsafe fn dec_ref(ctx: Z3_context, raw: Self) {
        unsafe { Z3_params_dec_ref(ctx, raw) }
    }

    unsafe fn render(ctx: Z3_context, raw: Self) -> Z3_string {
        unsafe { Z3_params_to_string(ctx, raw) }
    }
}

impl RefCounted for Z3_param_descrs {
    const NAME: &'static str = "parameter descriptions";

    fn is_absent(self) -> bool {
        self.is_null()
    }

    unsafe fn inc_ref(ctx: Z3_context, raw: Self) {
        unsafe { Z3_param_descrs_inc_ref(ctx, raw) }
    }

    unsafe fn dec_ref(ctx: Z3_context, raw: Self) {
        unsafe { Z3_param_descrs_dec_ref(ctx, raw) }
    }

    unsafe fn render(ctx: Z3_context, raw: Self) -> Z3_string {
        unsafe { Z3_param_descrs_to_string(ctx, raw) }
    }
}

/// An owned engine reference to `raw`, keeping its context alive.
pub(crate) struct Managed<T: RefCounted> {
    raw: T,
    ctx: Arc<ContextInner>,
}

// SAFETY: the raw pointer is only passed to Z3 under `ctx`'s lock.
unsafe impl<T: RefCounted> Send for Managed<T> {}
unsafe impl<T: RefCounted> Sync for Managed<T> {}

impl<T: RefCounted> Managed<T> {
    /// Take a reference on `raw`, the result of the call just made under `entered`.
    ///
    /// Fails if that call reported an engine error or produced a null handle.
    pub(crate) fn acquire(
        ctx: &Arc<ContextInner>,
        entered: &Entered<'_>,
        raw: T,
    ) -> Result<Self, Z3Error> {
        entered.check()?;
        if raw.is_absent() {
            return Err(Z3Error::NullHandle(T::NAME));
        }
        unsafe { T::inc_ref(entered.raw(), raw) };
        ctx.live.fetch_add(1, Ordering::AcqRel);
        Ok(Self {
            raw,
            ctx: Arc::clone(ctx),
        })
    }

    pub(crate) fn raw(&self) -> T {
        self.raw
    }

    pub(crate) fn context(&self) -> &Arc<ContextInner> {
        &self.ctx
    }

    pub(crate) fn enter(&self) -> Entered<'_> {
        self.ctx.enter()
    }

    pub(crate) fn same_context(&self, ctx: &Arc<ContextInner>) -> Result<(), Z3Error> {
        if Arc::ptr_eq(&self.ctx, ctx) {
            Ok(())
        } else {
            Err(Z3Error::ContextMismatch)
        }
    }

    /// Z3's textual rendering of the handle.
    pub(crate) fn render(&self) -> String {
        let entered = self.ctx.enter();
        entered.string(unsafe { T::render(entered.raw(), self.raw) })
    }
}

impl<T: RefCounted> Clone for Managed<T> {
    fn clone(&self) -> Self {
        let entered = self.ctx.enter();
        unsafe { T::inc_ref(entered.raw(), self.raw) };
        self.ctx.live.fetch_add(1, Ordering::AcqRel);
        Self {
            raw: self.raw,
            ctx: Arc::clone(&self.ctx),
        }
    }
}

impl<T: RefCounted> Drop for Managed<T> {
    fn drop(&mut self) {
        {
            let entered = self.ctx.enter();
            unsafe { T::dec_ref(entered.raw(), self.raw) };
        }
        self.ctx.live.fetch_sub(1, Ordering::AcqRel);
        tracing::trace!(context = self.ctx.id, kind = T::NAME, "released handle");
        // `self.ctx` is dropped after this body, so the context outlives the release above.
    }
}

impl<T: RefCounted> fmt::Debug for Managed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Managed")
            .field("kind", &T::NAME)
            .field("context", &self.ctx.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Weak;

    use super::*;
    use crate::{Config, Context};

    fn int_sort(ctx: &Context) -> Managed<Z3_sort> {
        ctx.make(|c| unsafe { Z3_mk_int_sort(c) }).unwrap()
    }

    #[test]
    fn acquire_and_drop_balance_live_count() {
        let ctx = Context::new(&Config::new()).unwrap();
        assert_eq!(ctx.live_handles(), 0);
        let sort = int_sort(&ctx);
        assert_eq!(ctx.live_handles(), 1);
        let copy = sort.clone();
        assert_eq!(ctx.live_handles(), 2);
        drop(sort);
        drop(copy);
        assert_eq!(ctx.live_handles(), 0);
    }

    #[test]
    fn child_keeps_context_alive() {
        let ctx = Context::new(&Config::new()).unwrap();
        let weak: Weak<ContextInner> = Arc::downgrade(ctx.inner());
        let sort = int_sort(&ctx);
        drop(ctx);
        assert!(weak.upgrade().is_some(), "context released before its child");
        assert_eq!(sort.render(), "Int");
        drop(sort);
        assert!(weak.upgrade().is_none(), "context outlived its last child");
    }

    #[test]
    fn null_handle_is_rejected() {
        let ctx = Context::new(&Config::new()).unwrap();
        let inner = ctx.inner();
        let entered = inner.enter();
        let result = Managed::<Z3_ast>::acquire(inner, &entered, std::ptr::null_mut());
        assert_eq!(result.unwrap_err(), Z3Error::NullHandle("ast"));
        drop(entered);
        assert_eq!(ctx.live_handles(), 0);
    }

    #[test]
    fn same_context_detects_foreign_handles() {
        let a = Context::new(&Config::new()).unwrap();
        let b = Context::new(&Config::new()).unwrap();
        let sort = int_sort(&a);
        assert!(sort.same_context(a.inner()).is_ok());
        assert_eq!(
            sort.same_context(b.inner()).unwrap_err(),
            Z3Error::ContextMismatch
        );
    }

    #[test]
    fn context_ids_are_distinct() {
        let a = Context::new(&Config::new()).unwrap();
        let b = Context::new(&Config::new()).unwrap();
        assert_ne!(a.id(), b.id());
    }
}
