// src/ffi/activity.rs
// ============================================================================
// Activity FFI: save, quick actions, reload and the three read-only views.
// Views are computed from the current snapshot on every call.
// ============================================================================

use crate::domains::activity::projections::{self, CalendarView};
use crate::domains::activity::store::ActivitySnapshot;
use crate::domains::activity::types::{Activity, ActivityDraft, SaveMode};
use crate::errors::DomainError;
use crate::ffi::{block_on_async, error::FFIError, handle_status_result, read_json, write_json, FFIResult};
use crate::globals;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ffi::c_char;
use std::os::raw::c_int;
use std::sync::Arc;

#[derive(Deserialize)]
struct IdPayload {
    id: String,
}

fn current_snapshot() -> FFIResult<Arc<ActivitySnapshot>> {
    Ok(globals::get_activity_store()?.snapshot())
}

fn find_activity(snapshot: &ActivitySnapshot, id: &str) -> FFIResult<Activity> {
    snapshot
        .find(id)
        .cloned()
        .ok_or_else(|| DomainError::EntityNotFound("Activity".to_string(), id.to_string()).into())
}

fn current_activity(id: &str) -> FFIResult<Activity> {
    let snapshot = current_snapshot()?;
    find_activity(&snapshot, id)
}

/// Create or edit an activity from the dialog. The follow-up reload is skipped
/// once the schedule screen is closed.
/// Payload: `{"mode": "create" | "edit", "activity": {draft}}`. Result: the saved activity.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn activity_save(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        #[derive(Deserialize)]
        struct Payload {
            mode: SaveMode,
            activity: ActivityDraft,
        }

        let payload: Payload = read_json(payload_json, "payload")?;
        let service = globals::get_activity_service()?;
        let cancel = globals::get_schedule_session()?.lifetime_token();

        let saved = block_on_async(async move {
            service
                .save(payload.activity, payload.mode, &cancel)
                .await
                .map_err(FFIError::from)
        })?;

        write_json(result, &saved)
    })
}

/// Run the card's quick action ("Iniciar" / "Concluir"). Payload: `{"id": "..."}`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn activity_advance(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let payload: IdPayload = read_json(payload_json, "payload")?;
        let activity = current_activity(&payload.id)?;
        let service = globals::get_activity_service()?;
        let cancel = globals::get_schedule_session()?.lifetime_token();

        let saved = block_on_async(async move {
            service.advance(&activity, &cancel).await.map_err(FFIError::from)
        })?;

        write_json(result, &saved)
    })
}

/// Prefilled dialog content for editing. Payload: `{"id": "..."}`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn activity_edit_draft(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let payload: IdPayload = read_json(payload_json, "payload")?;
        let activity = current_activity(&payload.id)?;
        write_json(result, &ActivityDraft::from(&activity))
    })
}

/// Reload the selected condominium's activities.
/// Result: `{"outcome": "loaded", "count": n}` or `{"outcome": "discarded"}`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn activity_reload(result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let service = globals::get_activity_service()?;
        let cancel = globals::get_schedule_session()?.lifetime_token();
        let outcome = block_on_async(async move {
            service
                .reload(&cancel)
                .await
                .map_err(FFIError::from)
        })?;
        write_json(result, &outcome)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn activity_list_view(result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let snapshot = current_snapshot()?;
        write_json(result, &projections::list(&snapshot.items))
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn activity_kanban_view(result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let snapshot = current_snapshot()?;
        write_json(result, &projections::kanban(&snapshot.items))
    })
}

#[derive(Debug, Default, Deserialize)]
struct CalendarQuery {
    year: Option<i32>,
    month: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalendarDay<'a> {
    date: NaiveDate,
    activities: &'a [&'a Activity],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalendarResponse<'a> {
    days: Vec<CalendarDay<'a>>,
    undated: usize,
}

fn calendar_response<'a>(view: &'a CalendarView<'a>, query: &CalendarQuery) -> FFIResult<CalendarResponse<'a>> {
    let days = match (query.year, query.month) {
        (Some(year), Some(month)) => {
            if !(1..=12).contains(&month) {
                return Err(FFIError::invalid_argument("month must be between 1 and 12"));
            }
            view.for_month(year, month)
                .into_iter()
                .map(|(date, activities)| CalendarDay { date, activities })
                .collect()
        }
        (None, None) => view
            .days
            .iter()
            .map(|(date, activities)| CalendarDay {
                date: *date,
                activities: activities.as_slice(),
            })
            .collect(),
        _ => return Err(FFIError::invalid_argument("year and month must be given together")),
    };
    Ok(CalendarResponse {
        days,
        undated: view.undated,
    })
}

/// Activities grouped by expected date. Payload (nullable): `{"year": 2025, "month": 7}`
/// limits the result to one month.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn activity_calendar_view(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let query: CalendarQuery = if payload_json.is_null() {
            CalendarQuery::default()
        } else {
            read_json(payload_json, "payload")?
        };
        let snapshot = current_snapshot()?;
        let view = projections::calendar(&snapshot.items);
        write_json(result, &calendar_response(&view, &query)?)
    })
}
