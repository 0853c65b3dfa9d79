// src/ffi/mod.rs
use crate::ffi::error::{ErrorCode, FFIError};
use lazy_static::lazy_static;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use tokio::runtime::Runtime;

pub mod activity;
pub mod core;
pub mod error;
pub mod schedule;

pub use error::FFIResult;

lazy_static! {
    /// One runtime for every FFI call, so the HTTP connection pool outlives single calls
    static ref RUNTIME: Result<Runtime, String> = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| e.to_string());
}

thread_local! {
    static LAST_ERROR: RefCell<Option<FFIError>> = const { RefCell::new(None) };
}

/// Run an async future to completion on the shared runtime.
pub fn block_on_async<F, T>(future: F) -> FFIResult<T>
where
    F: std::future::Future<Output = FFIResult<T>>,
{
    match RUNTIME.as_ref() {
        Ok(runtime) => runtime.block_on(future),
        Err(e) => Err(FFIError::internal(format!("Tokio runtime unavailable: {}", e))),
    }
}

/// Error handling helper for FFI boundaries (returns error code).
/// The error is kept for `cronograma_last_error` on the calling thread.
pub fn handle_status_result<F>(func: F) -> c_int
where
    F: FnOnce() -> FFIResult<()>,
{
    match func() {
        Ok(_) => {
            set_last_error(None);
            ErrorCode::Success as c_int
        }
        Err(e) => {
            log::error!(
                "[FFI] Code: {:?}, Message: {}, Details: {}",
                e.code,
                e.message,
                e.details.as_deref().unwrap_or("None")
            );
            let code = e.code as c_int;
            set_last_error(Some(e));
            code
        }
    }
}

pub(crate) fn set_last_error(error: Option<FFIError>) {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = error);
}

pub(crate) fn last_error() -> Option<FFIError> {
    LAST_ERROR.with(|slot| slot.borrow().clone())
}

/// Decode a JSON argument coming from the host.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
pub unsafe fn read_json<T: DeserializeOwned>(ptr: *const c_char, name: &str) -> FFIResult<T> {
    if ptr.is_null() {
        return Err(FFIError::null_pointer(name));
    }
    let raw = CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| FFIError::new(ErrorCode::InvalidUtf8, &format!("{} is not valid UTF-8", name)))?;
    serde_json::from_str(raw)
        .map_err(|e| FFIError::invalid_argument(&format!("invalid {} JSON: {}", name, e)))
}

/// Serialize `value` and hand ownership of the string to the host through `result`.
///
/// # Safety
/// `result` must be null or valid for writes.
pub unsafe fn write_json<T: Serialize>(result: *mut *mut c_char, value: &T) -> FFIResult<()> {
    if result.is_null() {
        return Err(FFIError::null_pointer("result"));
    }
    let json = serde_json::to_string(value)
        .map_err(|e| FFIError::internal(format!("Failed to serialize result: {}", e)))?;
    let c_string = CString::new(json)
        .map_err(|e| FFIError::internal(format!("CString creation failed: {}", e)))?;
    *result = c_string.into_raw();
    Ok(())
}
