// src/ffi/schedule.rs
// ============================================================================
// Schedule screen lifecycle: open, close, and the header summary
// ============================================================================

use crate::ffi::{block_on_async, error::FFIError, handle_status_result, read_json, write_json};
use crate::globals;
use serde::Deserialize;
use std::ffi::c_char;
use std::os::raw::c_int;

/// Open the schedule screen for the route's condominium.
/// Payload: `{"condominiumId": "..."}` (null or missing redirects to selection).
/// Result: `{"resolution": {...}, "load": {...} | null}`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn schedule_open(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Payload {
            #[serde(default)]
            condominium_id: Option<String>,
        }

        let payload: Payload = read_json(payload_json, "payload")?;
        let session = globals::get_schedule_session()?;

        let opened = block_on_async(async move {
            session
                .open(payload.condominium_id.as_deref())
                .await
                .map_err(FFIError::from)
        })?;

        write_json(result, &opened)
    })
}

/// Cancel every lookup and load started by the screen.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn schedule_close() -> c_int {
    handle_status_result(|| {
        globals::get_schedule_session()?.close();
        Ok(())
    })
}

/// Header data: condominium name and logo, stats chips, loading flag.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn schedule_summary(result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let summary = globals::get_schedule_session()?.summary();
        write_json(result, &summary)
    })
}
