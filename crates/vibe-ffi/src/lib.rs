//! C FFI surface for VibeAlchemy.
//!
//! Pattern: opaque EngineHandle + C strings + JSON serialization.
//!
//! A browser shell (via a wasm/native bridge), Flutter (`dart:ffi`) or any
//! platform with C FFI drives the three screens through these calls and
//! renders the JSON returned by `vibe_state`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use vibe_core::{best_match, Catalog, Engine, EngineConfig, SessionCommand, SCALE_UNIVERSE};

// ---------------------------------------------------------------------------
// Error handling (thread-local last error)
// ---------------------------------------------------------------------------

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

fn set_error(msg: String) {
    log::debug!("vibe-ffi: {}", msg);
    LAST_ERROR.with(|cell| *cell.borrow_mut() = Some(msg));
}

fn clear_error() {
    LAST_ERROR.with(|cell| *cell.borrow_mut() = None);
}

/// Returns the last error message (caller frees with `vibe_string_free`).
#[no_mangle]
pub extern "C" fn vibe_last_error() -> *mut c_char {
    LAST_ERROR.with(|cell| {
        cell.borrow_mut()
            .take()
            .and_then(|s| CString::new(s).ok())
            .map(|s| s.into_raw())
            .unwrap_or(ptr::null_mut())
    })
}

/// Frees a string returned from vibe FFI.
///
/// # Safety
/// Must be a pointer returned from this FFI and not already freed.
#[no_mangle]
pub unsafe extern "C" fn vibe_string_free(ptr: *mut c_char) {
    if !ptr.is_null() {
        let _ = CString::from_raw(ptr);
    }
}

// ---------------------------------------------------------------------------
// Opaque handle
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct EngineHandle {
    _private: [u8; 0],
}

struct EngineHandleInner {
    engine: Engine,
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Opens an engine and starts its heartbeat. `config_json` may be NULL for
/// defaults. Returns an opaque handle, or NULL on error.
///
/// # Safety
/// `config_json` must be NULL or a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vibe_open(config_json: *const c_char) -> *mut EngineHandle {
    clear_error();
    let config = if config_json.is_null() {
        EngineConfig::default()
    } else {
        let json = match read_cstr(config_json) {
            Ok(s) => s,
            Err(e) => return err_handle(e),
        };
        match EngineConfig::from_json(&json) {
            Ok(c) => c,
            Err(e) => return err_handle(e.to_string()),
        }
    };

    match Engine::new(config) {
        Ok(engine) => {
            engine.start();
            Box::into_raw(Box::new(EngineHandleInner { engine })) as *mut EngineHandle
        }
        Err(e) => err_handle(e.to_string()),
    }
}

/// Closes the engine and releases all resources.
#[no_mangle]
pub extern "C" fn vibe_close(handle: *mut EngineHandle) {
    if !handle.is_null() {
        unsafe {
            let inner = Box::from_raw(handle as *mut EngineHandleInner);
            inner.engine.shutdown();
        }
    }
}

// ---------------------------------------------------------------------------
// Screen transitions
// ---------------------------------------------------------------------------

/// Landing → capture. Returns 1 on success, 0 on error.
#[no_mangle]
pub extern "C" fn vibe_start_capture(handle: *mut EngineHandle) -> i32 {
    run_command(handle, SessionCommand::StartCapture)
}

/// Cancel a capture, or go back to landing from the presenter.
/// Returns 1 on success, 0 on error (e.g. while analyzing).
#[no_mangle]
pub extern "C" fn vibe_cancel_or_reset(handle: *mut EngineHandle) -> i32 {
    run_command(handle, SessionCommand::CancelOrReset)
}

/// Present the best match for a JSON array of scale labels.
/// Returns 1 on success, 0 on error.
///
/// # Safety
/// `detected_json` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vibe_complete_capture(handle: *mut EngineHandle, detected_json: *const c_char) -> i32 {
    clear_error();
    let detected = match read_json::<Vec<String>>(detected_json) {
        Ok(d) => d,
        Err(e) => {
            set_error(e);
            return 0;
        }
    };
    run_command(handle, SessionCommand::CompleteCapture { detected })
}

/// Flip the like flag on the presenter. Returns 1 on success, 0 on error.
#[no_mangle]
pub extern "C" fn vibe_toggle_like(handle: *mut EngineHandle) -> i32 {
    run_command(handle, SessionCommand::ToggleLike)
}

/// Apply a tagged JSON command, e.g. `{"action":"start_capture"}`.
/// Returns 1 on success, 0 on error.
///
/// # Safety
/// `json` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vibe_command(handle: *mut EngineHandle, json: *const c_char) -> i32 {
    clear_error();
    let value = match read_json::<serde_json::Value>(json) {
        Ok(v) => v,
        Err(e) => {
            set_error(e);
            return 0;
        }
    };
    match SessionCommand::from_value(&value) {
        Some(cmd) => run_command(handle, cmd),
        None => {
            set_error(format!("unknown command: {}", value));
            0
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Step the session to the current time without waiting for the heartbeat.
/// Returns the emitted events as a JSON array (caller frees).
#[no_mangle]
pub extern "C" fn vibe_pump(handle: *mut EngineHandle) -> *mut c_char {
    clear_error();
    match engine_ref(handle) {
        Ok(engine) => json_to_cstr(&engine.pump()),
        Err(e) => err_null(e),
    }
}

/// Current screen as JSON (caller frees).
#[no_mangle]
pub extern "C" fn vibe_state(handle: *mut EngineHandle) -> *mut c_char {
    clear_error();
    match engine_ref(handle) {
        Ok(engine) => json_to_cstr(&engine.state()),
        Err(e) => err_null(e),
    }
}

/// The engine's song catalog as a JSON array (caller frees).
#[no_mangle]
pub extern "C" fn vibe_catalog(handle: *mut EngineHandle) -> *mut c_char {
    clear_error();
    match engine_ref(handle) {
        Ok(engine) => json_to_cstr(&engine.catalog().songs()),
        Err(e) => err_null(e),
    }
}

/// The ten scale labels as a JSON array (caller frees).
#[no_mangle]
pub extern "C" fn vibe_scales() -> *mut c_char {
    json_to_cstr(&SCALE_UNIVERSE)
}

/// Stateless selector: best match of `detected_json` (array of labels)
/// against `catalog_json` (array of songs), or the built-in catalog when
/// `catalog_json` is NULL. Returns the recommendation JSON (caller frees).
///
/// # Safety
/// `detected_json` must be a valid null-terminated C string; `catalog_json`
/// must be NULL or one.
#[no_mangle]
pub unsafe extern "C" fn vibe_best_match(detected_json: *const c_char, catalog_json: *const c_char) -> *mut c_char {
    clear_error();
    let detected = match read_json::<Vec<String>>(detected_json) {
        Ok(d) => d,
        Err(e) => return err_null(e),
    };
    let catalog = if catalog_json.is_null() {
        Catalog::builtin()
    } else {
        let json = match read_cstr(catalog_json) {
            Ok(s) => s,
            Err(e) => return err_null(e),
        };
        match Catalog::from_json(&json) {
            Ok(c) => c,
            Err(e) => return err_null(e.to_string()),
        }
    };
    match best_match(&detected, catalog.songs()) {
        Ok(rec) => json_to_cstr(&rec),
        Err(e) => err_null(e.to_string()),
    }
}

/// ABI version.
#[no_mangle]
pub extern "C" fn vibe_version() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn run_command(handle: *mut EngineHandle, cmd: SessionCommand) -> i32 {
    let engine = match engine_ref(handle) {
        Ok(e) => e,
        Err(e) => {
            set_error(e);
            return 0;
        }
    };
    match engine.command(cmd) {
        Ok(()) => 1,
        Err(e) => {
            set_error(e.to_string());
            0
        }
    }
}

fn engine_ref<'a>(handle: *mut EngineHandle) -> Result<&'a Engine, String> {
    if handle.is_null() {
        return Err("null engine handle".into());
    }
    let inner = unsafe { &*(handle as *mut EngineHandleInner) };
    Ok(&inner.engine)
}

fn read_cstr(ptr: *const c_char) -> Result<String, String> {
    if ptr.is_null() {
        return Err("null string pointer".into());
    }
    unsafe {
        CStr::from_ptr(ptr)
            .to_str()
            .map(String::from)
            .map_err(|_| "invalid utf-8".into())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(ptr: *const c_char) -> Result<T, String> {
    let s = read_cstr(ptr)?;
    serde_json::from_str(&s).map_err(|e| e.to_string())
}

fn json_to_cstr<T: serde::Serialize + ?Sized>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => to_cstr(json),
        Err(e) => err_null(e.to_string()),
    }
}

fn to_cstr(s: String) -> *mut c_char {
    CString::new(s)
        .map(|c| c.into_raw())
        .unwrap_or(ptr::null_mut())
}

fn err_null(msg: String) -> *mut c_char {
    set_error(msg);
    ptr::null_mut()
}

fn err_handle(msg: String) -> *mut EngineHandle {
    set_error(msg);
    ptr::null_mut()
}

// ---------------------------------------------------------------------------
// FFI Integration Tests
// ---------------------------------------------------------------------------
