//! FFI bindings for the Napper engine
//!
//! C-compatible functions for calling the engine from mobile and web hosts.
//! All functions take and return NUL-terminated UTF-8 JSON strings. Returned
//! strings are allocated here and must be freed with `napper_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::error::EngineError;
use crate::pipeline::{
    daily_insights_json, feeding_interval_stats_json, predictions_json, wake_window_stats_json,
};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Read a C string argument, naming it in the error on failure
unsafe fn read_arg(ptr: *const c_char, name: &str) -> Result<String, String> {
    if ptr.is_null() {
        return Err(format!("Invalid {name} string pointer"));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(str::to_string)
        .map_err(|_| format!("{name} is not valid UTF-8"))
}

/// Hand a result to C: the JSON string, or NULL with the error recorded
fn into_c_result(result: Result<String, EngineError>) -> *mut c_char {
    match result {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => cstr.into_raw(),
            Err(_) => {
                set_last_error("Output contained an interior NUL byte");
                ptr::null_mut()
            }
        },
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

macro_rules! arg_or_null {
    ($ptr:expr, $name:expr) => {
        match read_arg($ptr, $name) {
            Ok(value) => value,
            Err(msg) => {
                set_last_error(&msg);
                return ptr::null_mut();
            }
        }
    };
}

/// Build the full prediction bundle for one subject of a history snapshot.
///
/// # Safety
/// - `snapshot_json`, `subject_id`, and `reference_time` must be valid null-terminated C strings.
/// - `reference_time` is RFC 3339 with the subject's local offset.
/// - Returns a newly allocated string that must be freed with `napper_free_string`.
/// - Returns NULL on error; call `napper_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn napper_build_predictions(
    snapshot_json: *const c_char,
    subject_id: *const c_char,
    reference_time: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let snapshot = arg_or_null!(snapshot_json, "snapshot_json");
    let subject = arg_or_null!(subject_id, "subject_id");
    let now = arg_or_null!(reference_time, "reference_time");

    into_c_result(predictions_json(&snapshot, &subject, &now))
}

/// Day and night wake-window statistics for a JSON array of sleep episodes.
///
/// # Safety
/// - `sleep_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `napper_free_string`.
/// - Returns NULL on error; call `napper_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn napper_wake_window_stats(sleep_json: *const c_char) -> *mut c_char {
    clear_last_error();
    let sleep = arg_or_null!(sleep_json, "sleep_json");
    into_c_result(wake_window_stats_json(&sleep))
}

/// Feeding-interval statistics for a JSON array of feeding episodes.
///
/// # Safety
/// - `feeding_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `napper_free_string`.
/// - Returns NULL on error; call `napper_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn napper_feeding_interval_stats(feeding_json: *const c_char) -> *mut c_char {
    clear_last_error();
    let feeding = arg_or_null!(feeding_json, "feeding_json");
    into_c_result(feeding_interval_stats_json(&feeding))
}

/// Insights for a calendar date (`YYYY-MM-DD`).
///
/// # Safety
/// - All arguments must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `napper_free_string`.
/// - Returns NULL on error; call `napper_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn napper_daily_insights(
    date: *const c_char,
    sleep_json: *const c_char,
    feeding_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let date = arg_or_null!(date, "date");
    let sleep = arg_or_null!(sleep_json, "sleep_json");
    let feeding = arg_or_null!(feeding_json, "feeding_json");

    into_c_result(daily_insights_json(&date, &sleep, &feeding))
}

/// Free a string returned by any `napper_*` function.
///
/// # Safety
/// - `ptr` must be a pointer returned by this library, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn napper_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Napper function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn napper_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn napper_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
