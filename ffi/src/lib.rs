//! C-ABI wrapper around `traceix-core`.
//!
//! # Overview
//! Exposes every Traceix operation through `extern "C"` functions so C
//! callers can keep their existing call sites: create an opaque handle with
//! `traceix_sdk_new`, call one function per operation, and free the returned
//! JSON with `traceix_string_free`.
//!
//! # Design
//! - Every entry point returns a `TraceixStatus`; response bodies come back
//!   through `char **` out-params that are NULLed first and populated only
//!   on `Ok`.
//! - Every entry point wraps its body in `catch_unwind` so panics never
//!   cross the FFI boundary; a caught panic reports `InternalError`.
//! - Hostile arguments are rejected, not undefined behavior: null handles
//!   and out-params yield `InternalError`, out-of-range search kinds yield
//!   `InvalidSearchKind`, and a null or empty uuid yields `NoUuid`.
//! - The C caller owns every returned string and must release it with
//!   `traceix_string_free`; the handle is released with `traceix_sdk_free`.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use traceix_core::{ApiError, ClientConfig, TraceixClient};

use types::*;

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

/// Read a nullable C string. Null, empty, and invalid UTF-8 all become
/// `None`, mirroring how the service treats absent values.
fn opt_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let s = unsafe { CStr::from_ptr(ptr) }.to_str().ok()?;
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Read a required C string argument. Null and invalid UTF-8 are caller
/// bugs and map to `Internal`.
fn required_string(ptr: *const c_char, name: &str) -> Result<String, ApiError> {
    if ptr.is_null() {
        return Err(ApiError::Internal {
            message: format!("null pointer argument: {name}"),
        });
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map(str::to_string)
        .map_err(|_| ApiError::Internal {
            message: format!("argument {name} is not valid UTF-8"),
        })
}

fn to_c_string(s: String) -> Result<*mut c_char, ApiError> {
    CString::new(s)
        .map(CString::into_raw)
        .map_err(|_| ApiError::Internal {
            message: "response contained an interior NUL byte".to_string(),
        })
}

fn set_status(out_status: *mut TraceixStatus, status: TraceixStatus) {
    if !out_status.is_null() {
        unsafe { *out_status = status };
    }
}

/// Shared body of every single-response operation: NULL the out-param,
/// reject null pointers, run the operation panic-proofed, and hand the body
/// to the caller as a C string.
fn run_to_json<F>(sdk: *const TraceixSdk, out_json: *mut *mut c_char, op: F) -> TraceixStatus
where
    F: FnOnce(&TraceixSdk) -> Result<String, ApiError>,
{
    if !out_json.is_null() {
        unsafe { *out_json = std::ptr::null_mut() };
    }
    if sdk.is_null() || out_json.is_null() {
        return TraceixStatus::InternalError;
    }
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let sdk = unsafe { &*sdk };
        op(sdk).and_then(to_c_string)
    }));
    match outcome {
        Ok(Ok(json)) => {
            unsafe { *out_json = json };
            TraceixStatus::Ok
        }
        Ok(Err(error)) => TraceixStatus::from(&error),
        Err(_) => TraceixStatus::InternalError,
    }
}

// ---------------------------------------------------------------------------
// Handle lifecycle
// ---------------------------------------------------------------------------

fn sdk_new_impl(
    api_key: *const c_char,
    base_url: *const c_char,
    out_status: *mut TraceixStatus,
) -> *mut TraceixSdk {
    let outcome = catch_unwind(|| {
        let key = opt_string(api_key);
        let mut config = ClientConfig::resolve(key.as_deref())?;
        if let Some(base_url) = opt_string(base_url) {
            config = config.with_base_url(base_url);
        }
        let inner = TraceixClient::new(config)?;
        Ok::<_, ApiError>(TraceixSdk { inner })
    });
    match outcome {
        Ok(Ok(sdk)) => {
            set_status(out_status, TraceixStatus::Ok);
            Box::into_raw(Box::new(sdk))
        }
        Ok(Err(error)) => {
            set_status(out_status, TraceixStatus::from(&error));
            std::ptr::null_mut()
        }
        Err(_) => {
            set_status(out_status, TraceixStatus::InternalError);
            std::ptr::null_mut()
        }
    }
}

/// Create an SDK handle.
///
/// A null or empty `api_key` falls back to the `TRACEIX_API_KEY`
/// environment variable; if that is also unset the call fails with
/// `NoApiKey`. `out_status` may be null.
/// On failure the return value is null. The caller must free the handle
/// with `traceix_sdk_free`.
#[unsafe(no_mangle)]
pub extern "C" fn traceix_sdk_new(
    api_key: *const c_char,
    out_status: *mut TraceixStatus,
) -> *mut TraceixSdk {
    sdk_new_impl(api_key, std::ptr::null(), out_status)
}

/// Create an SDK handle pointed at a non-default host, for self-hosted
/// deployments and tests. A null or empty `base_url` keeps the default.
/// Otherwise identical to `traceix_sdk_new`.
#[unsafe(no_mangle)]
pub extern "C" fn traceix_sdk_new_with_base_url(
    api_key: *const c_char,
    base_url: *const c_char,
    out_status: *mut TraceixStatus,
) -> *mut TraceixSdk {
    sdk_new_impl(api_key, base_url, out_status)
}

/// Free an SDK handle created by `traceix_sdk_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn traceix_sdk_free(sdk: *mut TraceixSdk) {
    if !sdk.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(sdk) });
        }));
    }
}

/// Free a string returned by any operation. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn traceix_string_free(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Upload operations
// ---------------------------------------------------------------------------

/// Upload a file for an AI verdict. The raw response body is returned
/// through `out_json` regardless of HTTP status.
#[unsafe(no_mangle)]
pub extern "C" fn traceix_ai_prediction(
    sdk: *const TraceixSdk,
    filename: *const c_char,
    out_json: *mut *mut c_char,
) -> TraceixStatus {
    run_to_json(sdk, out_json, |sdk| {
        let path = required_string(filename, "filename")?;
        sdk.inner.ai_prediction(path)
    })
}

/// Upload a file for a capability report.
#[unsafe(no_mangle)]
pub extern "C" fn traceix_capa_extraction(
    sdk: *const TraceixSdk,
    filename: *const c_char,
    out_json: *mut *mut c_char,
) -> TraceixStatus {
    run_to_json(sdk, out_json, |sdk| {
        let path = required_string(filename, "filename")?;
        sdk.inner.capa_extraction(path)
    })
}

/// Upload a file for a metadata report.
#[unsafe(no_mangle)]
pub extern "C" fn traceix_exif_extraction(
    sdk: *const TraceixSdk,
    filename: *const c_char,
    out_json: *mut *mut c_char,
) -> TraceixStatus {
    run_to_json(sdk, out_json, |sdk| {
        let path = required_string(filename, "filename")?;
        sdk.inner.exif_extraction(path)
    })
}

// ---------------------------------------------------------------------------
// Status and search operations
// ---------------------------------------------------------------------------

/// Poll a job by uuid. A null or empty `uuid` fails with `NoUuid` before
/// any request is sent.
#[unsafe(no_mangle)]
pub extern "C" fn traceix_check_status(
    sdk: *const TraceixSdk,
    uuid: *const c_char,
    out_json: *mut *mut c_char,
) -> TraceixStatus {
    run_to_json(sdk, out_json, |sdk| {
        let uuid = opt_string(uuid).unwrap_or_default();
        sdk.inner.check_status(&uuid)
    })
}

/// Search previously analyzed samples by sha256. `search_type` is checked
/// before anything else; values other than `TRACEIX_SEARCH_KIND_CAPA` and
/// `TRACEIX_SEARCH_KIND_EXIF` fail with `InvalidSearchKind`.
#[unsafe(no_mangle)]
pub extern "C" fn traceix_hash_search(
    sdk: *const TraceixSdk,
    file_hash: *const c_char,
    search_type: u32,
    out_json: *mut *mut c_char,
) -> TraceixStatus {
    run_to_json(sdk, out_json, |sdk| {
        let kind = search_kind_from_raw(search_type)?;
        let hash = required_string(file_hash, "file_hash")?;
        sdk.inner.hash_search(&hash, kind)
    })
}

// ---------------------------------------------------------------------------
// IPFS dataset operations
// ---------------------------------------------------------------------------

/// List every public IPFS dataset.
#[unsafe(no_mangle)]
pub extern "C" fn traceix_list_all_ipfs_datasets(
    sdk: *const TraceixSdk,
    out_json: *mut *mut c_char,
) -> TraceixStatus {
    run_to_json(sdk, out_json, |sdk| sdk.inner.list_all_ipfs_datasets())
}

/// Look up one public dataset by CID.
#[unsafe(no_mangle)]
pub extern "C" fn traceix_get_public_ipfs_dataset(
    sdk: *const TraceixSdk,
    cid: *const c_char,
    out_json: *mut *mut c_char,
) -> TraceixStatus {
    run_to_json(sdk, out_json, |sdk| {
        let cid = required_string(cid, "cid")?;
        sdk.inner.get_public_ipfs_dataset(&cid)
    })
}

/// Find which dataset contains a file hash.
#[unsafe(no_mangle)]
pub extern "C" fn traceix_search_ipfs_dataset_by_hash(
    sdk: *const TraceixSdk,
    file_hash: *const c_char,
    out_json: *mut *mut c_char,
) -> TraceixStatus {
    run_to_json(sdk, out_json, |sdk| {
        let hash = required_string(file_hash, "file_hash")?;
        sdk.inner.search_ipfs_dataset_by_hash(&hash)
    })
}

// ---------------------------------------------------------------------------
// Composite
// ---------------------------------------------------------------------------

/// Run AI prediction, capability extraction, and metadata extraction on the
/// same file. All-or-nothing: on any failure every out-param is left null
/// and the first error's status is returned.
#[unsafe(no_mangle)]
pub extern "C" fn traceix_full_upload(
    sdk: *const TraceixSdk,
    filename: *const c_char,
    out_ai_json: *mut *mut c_char,
    out_capa_json: *mut *mut c_char,
    out_exif_json: *mut *mut c_char,
) -> TraceixStatus {
    for out in [out_ai_json, out_capa_json, out_exif_json] {
        if !out.is_null() {
            unsafe { *out = std::ptr::null_mut() };
        }
    }
    if sdk.is_null() || out_ai_json.is_null() || out_capa_json.is_null() || out_exif_json.is_null()
    {
        return TraceixStatus::InternalError;
    }
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let sdk = unsafe { &*sdk };
        let path = required_string(filename, "filename")?;
        let report = sdk.inner.full_upload(path)?;
        match (
            CString::new(report.ai),
            CString::new(report.capa),
            CString::new(report.exif),
        ) {
            (Ok(ai), Ok(capa), Ok(exif)) => {
                Ok((ai.into_raw(), capa.into_raw(), exif.into_raw()))
            }
            _ => Err(ApiError::Internal {
                message: "response contained an interior NUL byte".to_string(),
            }),
        }
    }));
    match outcome {
        Ok(Ok((ai, capa, exif))) => {
            unsafe {
                *out_ai_json = ai;
                *out_capa_json = capa;
                *out_exif_json = exif;
            }
            TraceixStatus::Ok
        }
        Ok(Err(error)) => TraceixStatus::from(&error),
        Err(_) => TraceixStatus::InternalError,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
