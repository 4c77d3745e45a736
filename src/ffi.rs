//! FFI bindings for Bewegungsliga
//!
//! C-compatible entry points for hosts that embed the metrics engine from
//! another language. Inputs and outputs are JSON in null-terminated C strings.
//! Returned strings are allocated here and must be released with
//! `liga_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::error::MetricsError;
use crate::ingest::{self, parse_date};
use crate::metrics;
use crate::summary::DashboardSnapshot;
use crate::types::{BonusProgram, BonusProgramRequirement};

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

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Hand a JSON result back to C, recording the error on failure
fn finish(result: Result<String, MetricsError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Metrics API
// ============================================================================

/// Compute the dashboard snapshot.
///
/// `today` is a `YYYY-MM-DD` date, or NULL for the current UTC date. A
/// non-NULL `today` that is not valid UTF-8 is an error.
///
/// # Safety
/// - `records_json` and `program_json` must be valid null-terminated C strings.
/// - `today` must be NULL or a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `liga_free_string`.
/// - Returns NULL on error; call `liga_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn liga_dashboard_json(
    records_json: *const c_char,
    program_json: *const c_char,
    today: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(records_str) = cstr_to_string(records_json) else {
        set_last_error("Invalid records string pointer");
        return ptr::null_mut();
    };

    let Some(program_str) = cstr_to_string(program_json) else {
        set_last_error("Invalid program string pointer");
        return ptr::null_mut();
    };

    let today_str = if today.is_null() {
        None
    } else {
        let Some(today_str) = cstr_to_string(today) else {
            set_last_error("Invalid today string pointer");
            return ptr::null_mut();
        };
        Some(today_str)
    };

    finish((|| -> Result<String, MetricsError> {
        let records = ingest::parse_array(&records_str)?;
        let program: BonusProgram = serde_json::from_str(&program_str)?;
        let today = match today_str {
            Some(s) => parse_date(&s)?,
            None => metrics::current_date(),
        };
        let snapshot = DashboardSnapshot::compute(&records, &program, today);
        Ok(serde_json::to_string(&snapshot)?)
    })())
}

/// Compute bonus progress for a requirement.
///
/// # Safety
/// - `records_json` and `requirement_json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `liga_free_string`.
/// - Returns NULL on error; call `liga_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn liga_bonus_progress_json(
    records_json: *const c_char,
    requirement_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(records_str) = cstr_to_string(records_json) else {
        set_last_error("Invalid records string pointer");
        return ptr::null_mut();
    };

    let Some(requirement_str) = cstr_to_string(requirement_json) else {
        set_last_error("Invalid requirement string pointer");
        return ptr::null_mut();
    };

    finish((|| -> Result<String, MetricsError> {
        let records = ingest::parse_array(&records_str)?;
        let requirement: BonusProgramRequirement = serde_json::from_str(&requirement_str)?;
        let progress = metrics::calculate_bonus_progress(&records, &requirement);
        Ok(serde_json::to_string(&progress)?)
    })())
}

/// Current streak of a record array.
///
/// # Safety
/// - `records_json` must be a valid null-terminated C string.
/// - Returns -1 on error; call `liga_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn liga_streak(records_json: *const c_char) -> i64 {
    clear_last_error();

    let Some(records_str) = cstr_to_string(records_json) else {
        set_last_error("Invalid records string pointer");
        return -1;
    };

    match ingest::parse_array(&records_str) {
        Ok(records) => i64::from(metrics::calculate_streak(&records)),
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Validate a record array; returns a JSON array of issues (empty when valid).
///
/// # Safety
/// - `records_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `liga_free_string`.
/// - Returns NULL on error; call `liga_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn liga_validate_records_json(records_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(records_str) = cstr_to_string(records_json) else {
        set_last_error("Invalid records string pointer");
        return ptr::null_mut();
    };

    finish((|| -> Result<String, MetricsError> {
        let records = ingest::parse_array(&records_str)?;
        let issues = ingest::validate_records(&records);
        Ok(serde_json::to_string(&issues)?)
    })())
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by a `liga_*` function.
///
/// # Safety
/// - `ptr` must be a pointer returned by a `liga_*` function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn liga_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - The returned pointer is valid until the next `liga_*` call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn liga_last_error() -> *const c_char {
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
pub unsafe extern "C" fn liga_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_records() -> CString {
        CString::new(
            r#"[
                {"date": "2024-06-01", "steps": 9000, "target": 8000},
                {"date": "2024-06-02", "steps": 5000, "target": 8000},
                {"date": "2024-06-03", "steps": 8100, "target": 8000},
                {"date": "2024-06-04", "steps": 8000, "target": 8000}
            ]"#,
        )
        .unwrap()
    }

    fn sample_program() -> CString {
        CString::new(
            r#"{
                "name": "Step Challenge",
                "description": "Demo bonus program for testing",
                "requirement": {"stepsPerDay": 6000, "daysRequired": 3, "periodDays": 30},
                "reward": "€30 bonus payment"
            }"#,
        )
        .unwrap()
    }

    unsafe fn take_json(ptr: *mut c_char) -> serde_json::Value {
        assert!(!ptr.is_null());
        let value = serde_json::from_str(CStr::from_ptr(ptr).to_str().unwrap()).unwrap();
        liga_free_string(ptr);
        value
    }

    #[test]
    fn test_ffi_dashboard() {
        let records = sample_records();
        let program = sample_program();
        let today = CString::new("2024-06-04").unwrap();

        unsafe {
            let result = liga_dashboard_json(records.as_ptr(), program.as_ptr(), today.as_ptr());
            let snapshot = take_json(result);

            assert_eq!(snapshot["todaySteps"], 8000);
            assert_eq!(snapshot["weeklyTotal"], 30_100);
            assert_eq!(snapshot["streak"], 2);
            assert_eq!(snapshot["bonus"]["daysAchieved"], 3);
            assert_eq!(snapshot["bonus"]["isEligible"], true);
        }
    }

    #[test]
    fn test_ffi_bonus_progress() {
        let records = sample_records();
        let requirement =
            CString::new(r#"{"stepsPerDay": 8000, "daysRequired": 6, "periodDays": 30}"#).unwrap();

        unsafe {
            let result = liga_bonus_progress_json(records.as_ptr(), requirement.as_ptr());
            let progress = take_json(result);

            assert_eq!(progress["daysAchieved"], 3);
            assert_eq!(progress["progressPercentage"], 50.0);
            assert_eq!(progress["isEligible"], false);
        }
    }

    #[test]
    fn test_ffi_streak_and_validation() {
        let records = sample_records();
        unsafe {
            assert_eq!(liga_streak(records.as_ptr()), 2);

            let issues = take_json(liga_validate_records_json(records.as_ptr()));
            assert_eq!(issues, serde_json::json!([]));
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid = CString::new("not json").unwrap();
            assert_eq!(liga_streak(invalid.as_ptr()), -1);

            let error = liga_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());

            let result = liga_dashboard_json(ptr::null(), invalid.as_ptr(), ptr::null());
            assert!(result.is_null());
        }
    }

    #[test]
    fn test_ffi_dashboard_rejects_invalid_today() {
        let records = sample_records();
        let program = sample_program();
        let today = CString::new(vec![0xff, 0xfe]).unwrap();

        unsafe {
            let result = liga_dashboard_json(records.as_ptr(), program.as_ptr(), today.as_ptr());
            assert!(result.is_null());

            let error = liga_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert_eq!(error_str, "Invalid today string pointer");
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = liga_version();
            assert!(!version.is_null());
            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
