// src/ffi/core.rs
// ============================================================================
// Core FFI functions for library initialization and management
// ============================================================================

use crate::config::AppConfig;
use crate::ffi::{block_on_async, error::FFIError, handle_status_result, read_json};
use std::any::Any;
use std::ffi::{c_char, CString};
use std::os::raw::c_int;

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Panicked during FFI call, but panic message is not a string".to_string()
    }
}

fn initialize_guarded<F>(load_config: F) -> c_int
where
    F: FnOnce() -> Result<AppConfig, FFIError> + std::panic::UnwindSafe,
{
    let result = std::panic::catch_unwind(|| {
        let config = load_config()?;
        block_on_async(async move { crate::initialize(config).await.map_err(FFIError::from) })
    });

    match result {
        Ok(ffi_result) => handle_status_result(|| ffi_result),
        Err(payload) => {
            let panic_msg = panic_message(payload);
            log::error!("[FFI] Panic during initialization: {}", panic_msg);
            handle_status_result(|| {
                Err(FFIError::internal(format!("Panic during initialization: {}", panic_msg)))
            })
        }
    }
}

/// Initialize the library from a JSON config:
/// `{"apiBaseUrl": "...", "statusWireMode": "boolean" | "enum", "requestTimeoutSecs": 15}`.
/// Returns 0 on success, non-zero on error. Calling it again after success is a no-op.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cronograma_initialize(config_json: *const c_char) -> c_int {
    initialize_guarded(|| unsafe { read_json::<AppConfig>(config_json, "config") })
}

/// Initialize the library from `CRONOGRAMA_*` environment variables (and `.env`).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cronograma_initialize_from_env() -> c_int {
    initialize_guarded(|| AppConfig::from_env().map_err(FFIError::from))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn cronograma_is_initialized() -> bool {
    crate::globals::is_initialized()
}

/// Last error raised on the calling thread, as `{"code", "message", "details"}` JSON.
/// Returns null when the previous call succeeded. Free with `cronograma_free`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cronograma_last_error() -> *mut c_char {
    crate::ffi::last_error()
        .and_then(|error| serde_json::to_string(&error).ok())
        .and_then(|json| CString::new(json).ok())
        .map(CString::into_raw)
        .unwrap_or(std::ptr::null_mut())
}

/// Frees a string allocated by this library.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cronograma_free(ptr: *mut c_char) {
    if !ptr.is_null() {
        let _ = CString::from_raw(ptr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::error::ErrorCode;
    use std::ffi::CStr;

    #[test]
    fn test_bad_config_is_reported_without_initializing() {
        let config = CString::new(r#"{"statusWireMode": "enum"}"#).unwrap();
        let code = unsafe { cronograma_initialize(config.as_ptr()) };
        assert_eq!(code, ErrorCode::InvalidArgument as c_int);

        let raw = unsafe { cronograma_last_error() };
        assert!(!raw.is_null());
        let json = unsafe { CStr::from_ptr(raw) }.to_str().unwrap().to_string();
        unsafe { cronograma_free(raw) };
        let error: FFIError = serde_json::from_str(&json).unwrap();
        assert_eq!(error.code, ErrorCode::InvalidArgument);
        assert!(error.message.contains("apiBaseUrl"));
    }

    #[test]
    fn test_null_config() {
        let code = unsafe { cronograma_initialize(std::ptr::null()) };
        assert_eq!(code, ErrorCode::NullPointer as c_int);
        unsafe { cronograma_free(std::ptr::null_mut()) };
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new(String::from("bang"))), "bang");
    }
}
