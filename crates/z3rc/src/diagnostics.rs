//! Engine error reporting.
//!
//! Z3 reports errors through a callback. This crate uses exactly one callback
//! for the whole process, [`log_engine_error`], and gives it to every context
//! when the context is created (Z3 stores the callback per context). It is
//! never replaced afterwards. The callback logs through `tracing` and bumps a
//! process-wide counter; the failing call additionally surfaces the error to
//! its caller as [`Z3Error::Engine`](crate::Z3Error::Engine).

use std::ffi::CStr;
use std::sync::atomic::{AtomicU64, Ordering};

use z3_sys::*;

use crate::error::EngineErrorKind;

static ENGINE_ERRORS: AtomicU64 = AtomicU64::new(0);

/// Total engine errors reported by any context since process start.
pub fn engine_error_count() -> u64 {
    ENGINE_ERRORS.load(Ordering::Relaxed)
}

/// Attach the process-wide handler to a new context.
pub(crate) fn install(ctx: Z3_context) {
    let handler: unsafe extern "C" fn(Z3_context, ErrorCode) = log_engine_error;
    unsafe { Z3_set_error_handler(ctx, Some(handler)) }
}

/// Called by Z3 on the thread that made the failing call, while that thread
/// holds the context lock.
unsafe extern "C" fn log_engine_error(ctx: Z3_context, code: ErrorCode) {
    ENGINE_ERRORS.fetch_add(1, Ordering::Relaxed);
    let Some(kind) = EngineErrorKind::from_code(code) else {
        return;
    };
    let msg = unsafe { Z3_get_error_msg(ctx, code) };
    let message = if msg.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
    };
    tracing::error!(%kind, "Z3 error: {message}");
}
