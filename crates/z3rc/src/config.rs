use std::ffi::{CStr, CString};
use std::fmt;

use z3_sys::*;

use crate::context::c_name;
use crate::error::Z3Error;

/// Context configuration, a wrapper around `Z3_config`.
///
/// Parameters are applied when a [`Context`](crate::Context) is created from
/// the config; Z3 copies them, so the config can be closed or dropped right
/// after without affecting the context.
pub struct Config {
    raw: Z3_config,
    params: Vec<(String, String)>,
}

// SAFETY: a `Z3_config` is not tied to any context or thread, and mutation
// requires `&mut self`.
unsafe impl Send for Config {}

impl Config {
    /// Create a config holding Z3's defaults.
    pub fn new() -> Self {
        Self {
            raw: unsafe { Z3_mk_config() },
            params: Vec::new(),
        }
    }

    /// Set a context parameter such as `"timeout"` or `"model"`.
    ///
    /// Z3 warns about (but does not reject) unknown parameter names.
    pub fn set_param(&mut self, id: &str, value: &str) -> Result<(), Z3Error> {
        let c_id = c_name(id)?;
        let c_value = c_name(value)?;
        self.set_c_param(&c_id, &c_value);
        self.params.push((id.to_string(), value.to_string()));
        Ok(())
    }

    /// Builder form of [`set_param`](Self::set_param).
    pub fn with_param(mut self, id: &str, value: &str) -> Result<Self, Z3Error> {
        self.set_param(id, value)?;
        Ok(self)
    }

    /// Default timeout in milliseconds for every check run under the context.
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.set_known(c"timeout", timeout_ms.to_string());
        self
    }

    /// Enable or disable model generation (enabled by default).
    pub fn with_model(mut self, enabled: bool) -> Self {
        self.set_known(c"model", enabled.to_string());
        self
    }

    /// Enable or disable proof generation.
    pub fn with_proof(mut self, enabled: bool) -> Self {
        self.set_known(c"proof", enabled.to_string());
        self
    }

    /// Parameters set so far, in order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// The most recent `timeout` parameter, if one was set.
    pub fn timeout_ms(&self) -> Option<u64> {
        self.params
            .iter()
            .rev()
            .find(|(id, _)| id == "timeout")
            .and_then(|(_, value)| value.parse().ok())
    }

    /// Release the foreign config now instead of at the end of scope.
    pub fn close(self) {
        drop(self);
    }

    pub(crate) fn raw(&self) -> Z3_config {
        self.raw
    }

    // `value` is produced by `Display` for numbers and booleans, so it never
    // contains a NUL byte.
    fn set_known(&mut self, id: &CStr, value: String) {
        let c_value = CString::new(value.clone()).unwrap_or_default();
        self.set_c_param(id, &c_value);
        self.params.push((id.to_string_lossy().into_owned(), value));
    }

    fn set_c_param(&mut self, id: &CStr, value: &CStr) {
        unsafe { Z3_set_param_value(self.raw, id.as_ptr(), value.as_ptr()) }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Config {
    fn drop(&mut self) {
        unsafe { Z3_del_config(self.raw) }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("params", &self.params)
            .finish()
    }
}
