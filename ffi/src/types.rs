//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Requests cross as plain data (`FfiHttpRequest`), responses come back the
//! same way (`FfiHttpResponse`). Parsed results are not mirrored field by
//! field: `FfiResult` carries the typed value re-serialized as JSON, which
//! keeps the C surface small while the core graph keeps evolving. The keys
//! graph is the exception and also has an opaque handle for direct lookups.

use std::ffi::CString;
use std::os::raw::c_char;

use hyperwallet_core::{ApiError, HttpMethod, HttpRequest, HyperwalletClient, TransferMethodConfigurationKeys};
use serde::Serialize;

/// Opaque handle to a `HyperwalletClient`.
pub struct FfiHyperwalletClient {
    pub(crate) inner: HyperwalletClient,
}

/// Opaque handle to a decoded keys graph.
pub struct FfiConfigurationKeys {
    pub(crate) inner: TransferMethodConfigurationKeys,
}

/// Heap C string for `s`. Interior NULs are dropped rather than failing.
pub(crate) fn c_string(s: impl Into<String>) -> *mut c_char {
    let mut bytes = s.into().into_bytes();
    bytes.retain(|b| *b != 0);
    CString::new(bytes).unwrap_or_default().into_raw()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `hw_build_*`; released with `hw_free_request`. `url` is absolute
/// and already carries the query string.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: c_string(req.path),
            headers,
            headers_len,
            body: req.body.map(c_string).unwrap_or(std::ptr::null_mut()),
        }))
    }
}

/// An HTTP response filled in by the C caller. Read, never freed, here.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error category of an `FfiResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Http = 1,
    Graphql = 2,
    Decode = 3,
    Serialization = 4,
    InvalidToken = 5,
    InvalidParameter = 6,
    Transport = 7,
    Panic = 8,
    NullArg = 9,
}

/// Result envelope for every `hw_parse_*` function.
///
/// On success `data_json` holds the parsed value as JSON (or null when the
/// operation has no payload) and `error_message` is null. On failure
/// `error_message` holds the structured `{"errors":[...]}` body as JSON.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_json: *mut c_char,
}

impl FfiResult {
    fn boxed(error_code: FfiErrorCode, error_message: *mut c_char, http_status: u16, data_json: *mut c_char) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message,
            http_status,
            data_json,
        }))
    }

    /// Success carrying `value` as JSON.
    pub(crate) fn ok<T: Serialize>(value: &T) -> *mut Self {
        match serde_json::to_string(value) {
            Ok(json) => Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), 0, c_string(json)),
            Err(e) => Self::from_error(ApiError::Serialization(e.to_string())),
        }
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let error_code = match &err {
            ApiError::Http { .. } => FfiErrorCode::Http,
            ApiError::Graphql(_) => FfiErrorCode::Graphql,
            ApiError::Decode(_) => FfiErrorCode::Decode,
            ApiError::Serialization(_) => FfiErrorCode::Serialization,
            ApiError::InvalidToken(_) => FfiErrorCode::InvalidToken,
            ApiError::InvalidParameter { .. } => FfiErrorCode::InvalidParameter,
            ApiError::Transport(_) => FfiErrorCode::Transport,
        };
        let message = serde_json::to_string(&err.errors()).unwrap_or_else(|_| err.to_string());
        Self::boxed(error_code, c_string(message), err.status().unwrap_or(0), std::ptr::null_mut())
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::NullArg,
            c_string(format!("null argument: {name}")),
            0,
            std::ptr::null_mut(),
        )
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, c_string(msg), 0, std::ptr::null_mut())
    }
}

/// A list of C strings, released with `hw_free_string_list`.
#[repr(C)]
pub struct FfiStringList {
    pub items: *mut *mut c_char,
    pub len: u32,
}

impl FfiStringList {
    pub(crate) fn from_strs<'a>(values: impl IntoIterator<Item = &'a str>) -> *mut Self {
        let items: Box<[*mut c_char]> = values.into_iter().map(c_string).collect();
        let len = items.len() as u32;
        let items = if items.is_empty() {
            std::ptr::null_mut()
        } else {
            Box::into_raw(items) as *mut *mut c_char
        };
        Box::into_raw(Box::new(FfiStringList { items, len }))
    }
}
