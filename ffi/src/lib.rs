//! C-ABI wrapper around `hyperwallet-core`.
//!
//! # Overview
//! Exposes the user, transfer method, balance, receipt and configuration
//! operations through `extern "C"` functions so any language with a C FFI
//! can build requests and parse responses while owning the network itself.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `hw_build_*` return null on a null argument or an invalid parameter;
//!   `hw_parse_*` always return an `FfiResult`.
//! - The C caller owns all returned pointers and must call the matching
//!   `hw_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use hyperwallet_core::{
    ApiError, HttpResponse, HyperwalletClient, ListQuery, Mask, TransferMethod, TransferMethodConfigurationFieldsQuery,
    TransferMethodConfigurationKeysQuery, TransferMethodTypesFeesAndProcessingTimesQuery,
};
use serde::Serialize;

use types::*;

/// Borrow a C string argument. Null and invalid UTF-8 are both `None`.
fn str_arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

fn client_ref<'a>(client: *const FfiHyperwalletClient) -> Option<&'a HyperwalletClient> {
    if client.is_null() {
        return None;
    }
    Some(&unsafe { &*client }.inner)
}

/// `limit == 0` keeps the default page size.
fn list_query(limit: u32, offset: u32) -> ListQuery {
    let query = ListQuery::default().offset(offset);
    if limit == 0 {
        query
    } else {
        query.limit(limit)
    }
}

fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    HttpResponse::new(resp.status, str_arg(resp.body).unwrap_or_default())
}

/// Shared null checks and error mapping for the `hw_parse_*` functions.
fn parse_with<T, F>(client: *const FfiHyperwalletClient, response: *const FfiHttpResponse, parse: F) -> *mut FfiResult
where
    T: Serialize,
    F: FnOnce(&HyperwalletClient, HttpResponse) -> Result<T, ApiError>,
{
    let Some(client) = client_ref(client) else {
        return FfiResult::null_arg("client");
    };
    if response.is_null() {
        return FfiResult::null_arg("response");
    }
    let response = ffi_response_to_core(unsafe { &*response });
    match parse(client, response) {
        Ok(value) => FfiResult::ok(&value),
        Err(e) => FfiResult::from_error(e),
    }
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client from an authentication token.
///
/// Returns null if `token` is null or is not a decodable token.
/// The caller must free the returned pointer with `hw_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn hw_client_new(token: *const c_char) -> *mut FfiHyperwalletClient {
    catch_unwind(|| {
        let Some(token) = str_arg(token) else {
            return std::ptr::null_mut();
        };
        match HyperwalletClient::new(token) {
            Ok(inner) => Box::into_raw(Box::new(FfiHyperwalletClient { inner })),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `hw_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hw_client_free(client: *mut FfiHyperwalletClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

/// Whether the client's token expires within the stale period. A null
/// client reports `true`.
#[unsafe(no_mangle)]
pub extern "C" fn hw_client_requires_token_refresh(client: *const FfiHyperwalletClient) -> bool {
    catch_unwind(|| client_ref(client).is_none_or(HyperwalletClient::requires_token_refresh)).unwrap_or(true)
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build the request for the authenticated user.
#[unsafe(no_mangle)]
pub extern "C" fn hw_build_get_user(client: *const FfiHyperwalletClient) -> *mut FfiHttpRequest {
    catch_unwind(|| match client_ref(client) {
        Some(client) => FfiHttpRequest::from_core(client.build_get_user()),
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a transfer method list request. `limit == 0` uses the default.
#[unsafe(no_mangle)]
pub extern "C" fn hw_build_list_transfer_methods(
    client: *const FfiHyperwalletClient,
    limit: u32,
    offset: u32,
) -> *mut FfiHttpRequest {
    catch_unwind(|| match client_ref(client) {
        Some(client) => FfiHttpRequest::from_core(client.build_list_transfer_methods(&list_query(limit, offset))),
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a create request from a transfer method given as JSON.
///
/// Returns null if an argument is null, the JSON does not describe a
/// transfer method, or its type has no REST collection.
#[unsafe(no_mangle)]
pub extern "C" fn hw_build_create_transfer_method(
    client: *const FfiHyperwalletClient,
    transfer_method_json: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        let (Some(client), Some(json)) = (client_ref(client), str_arg(transfer_method_json)) else {
            return std::ptr::null_mut();
        };
        let Ok(method) = serde_json::from_str::<TransferMethod>(json) else {
            return std::ptr::null_mut();
        };
        match client.build_create_transfer_method(&method) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

#[unsafe(no_mangle)]
pub extern "C" fn hw_build_list_balances(
    client: *const FfiHyperwalletClient,
    limit: u32,
    offset: u32,
) -> *mut FfiHttpRequest {
    catch_unwind(|| match client_ref(client) {
        Some(client) => FfiHttpRequest::from_core(client.build_list_balances(&list_query(limit, offset))),
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

#[unsafe(no_mangle)]
pub extern "C" fn hw_build_list_receipts(
    client: *const FfiHyperwalletClient,
    limit: u32,
    offset: u32,
) -> *mut FfiHttpRequest {
    catch_unwind(|| match client_ref(client) {
        Some(client) => FfiHttpRequest::from_core(client.build_list_receipts(&list_query(limit, offset))),
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the GraphQL request for every configured country, currency and
/// transfer method type.
#[unsafe(no_mangle)]
pub extern "C" fn hw_build_configuration_keys(client: *const FfiHyperwalletClient) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        let Some(client) = client_ref(client) else {
            return std::ptr::null_mut();
        };
        let query = TransferMethodConfigurationKeysQuery::new(client.user_token());
        match client.build_graphql(&query) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the GraphQL request for the fees and processing times of one
/// country/currency pair.
#[unsafe(no_mangle)]
pub extern "C" fn hw_build_fees_and_processing_times(
    client: *const FfiHyperwalletClient,
    country: *const c_char,
    currency: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        let (Some(client), Some(country), Some(currency)) = (client_ref(client), str_arg(country), str_arg(currency))
        else {
            return std::ptr::null_mut();
        };
        let query = TransferMethodTypesFeesAndProcessingTimesQuery::new(client.user_token(), country, currency);
        match client.build_graphql(&query) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the GraphQL request for the field configuration of one tuple.
#[unsafe(no_mangle)]
pub extern "C" fn hw_build_configuration_fields(
    client: *const FfiHyperwalletClient,
    country: *const c_char,
    currency: *const c_char,
    transfer_method_type: *const c_char,
    profile: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        let (Some(client), Some(country), Some(currency), Some(transfer_method_type), Some(profile)) = (
            client_ref(client),
            str_arg(country),
            str_arg(currency),
            str_arg(transfer_method_type),
            str_arg(profile),
        ) else {
            return std::ptr::null_mut();
        };
        let query = TransferMethodConfigurationFieldsQuery::new(
            client.user_token(),
            country,
            currency,
            transfer_method_type,
            profile,
        );
        match client.build_graphql(&query) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn hw_parse_get_user(
    client: *const FfiHyperwalletClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(|| parse_with(client, response, |c, r| c.parse_get_user(r)))
        .unwrap_or_else(|_| FfiResult::panic("panic in hw_parse_get_user"))
}

/// Parse a transfer method page. An empty list (204) is a page with no data.
#[unsafe(no_mangle)]
pub extern "C" fn hw_parse_list_transfer_methods(
    client: *const FfiHyperwalletClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(|| parse_with(client, response, |c, r| c.parse_list_transfer_methods(r)))
        .unwrap_or_else(|_| FfiResult::panic("panic in hw_parse_list_transfer_methods"))
}

#[unsafe(no_mangle)]
pub extern "C" fn hw_parse_create_transfer_method(
    client: *const FfiHyperwalletClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(|| parse_with(client, response, |c, r| c.parse_create_transfer_method(r)))
        .unwrap_or_else(|_| FfiResult::panic("panic in hw_parse_create_transfer_method"))
}

#[unsafe(no_mangle)]
pub extern "C" fn hw_parse_list_balances(
    client: *const FfiHyperwalletClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(|| parse_with(client, response, |c, r| c.parse_list_balances(r)))
        .unwrap_or_else(|_| FfiResult::panic("panic in hw_parse_list_balances"))
}

#[unsafe(no_mangle)]
pub extern "C" fn hw_parse_list_receipts(
    client: *const FfiHyperwalletClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(|| parse_with(client, response, |c, r| c.parse_list_receipts(r)))
        .unwrap_or_else(|_| FfiResult::panic("panic in hw_parse_list_receipts"))
}

/// Parse the keys response.
///
/// When `keys_out` is non-null and parsing succeeds, `*keys_out` receives a
/// handle for `hw_keys_*` lookups that the caller frees with `hw_keys_free`.
#[unsafe(no_mangle)]
pub extern "C" fn hw_parse_configuration_keys(
    client: *const FfiHyperwalletClient,
    response: *const FfiHttpResponse,
    keys_out: *mut *mut FfiConfigurationKeys,
) -> *mut FfiResult {
    catch_unwind(|| {
        parse_with(client, response, |c, r| {
            let keys = c.parse_graphql(&TransferMethodConfigurationKeysQuery::new(c.user_token()), r)?;
            store_keys(keys_out, &keys);
            Ok(keys)
        })
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in hw_parse_configuration_keys"))
}

/// Parse the fees-and-processing-times response. `keys_out` behaves as in
/// `hw_parse_configuration_keys`.
#[unsafe(no_mangle)]
pub extern "C" fn hw_parse_fees_and_processing_times(
    client: *const FfiHyperwalletClient,
    response: *const FfiHttpResponse,
    keys_out: *mut *mut FfiConfigurationKeys,
) -> *mut FfiResult {
    catch_unwind(|| {
        parse_with(client, response, |c, r| {
            // decoding does not look at the query arguments
            let query = TransferMethodTypesFeesAndProcessingTimesQuery::new(c.user_token(), "", "");
            let keys = c.parse_graphql(&query, r)?;
            store_keys(keys_out, &keys);
            Ok(keys)
        })
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in hw_parse_fees_and_processing_times"))
}

#[unsafe(no_mangle)]
pub extern "C" fn hw_parse_configuration_fields(
    client: *const FfiHyperwalletClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(|| {
        parse_with(client, response, |c, r| {
            let query = TransferMethodConfigurationFieldsQuery::new(c.user_token(), "", "", "", "");
            c.parse_graphql(&query, r)
        })
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in hw_parse_configuration_fields"))
}

fn store_keys(keys_out: *mut *mut FfiConfigurationKeys, keys: &hyperwallet_core::TransferMethodConfigurationKeys) {
    if !keys_out.is_null() {
        let handle = Box::new(FfiConfigurationKeys { inner: keys.clone() });
        unsafe { *keys_out = Box::into_raw(handle) };
    }
}

// ---------------------------------------------------------------------------
// Keys lookups
// ---------------------------------------------------------------------------

/// Country codes in response order. Null if `keys` is null.
#[unsafe(no_mangle)]
pub extern "C" fn hw_keys_countries(keys: *const FfiConfigurationKeys) -> *mut FfiStringList {
    catch_unwind(|| {
        if keys.is_null() {
            return std::ptr::null_mut();
        }
        let keys = &unsafe { &*keys }.inner;
        FfiStringList::from_strs(keys.countries().iter().map(|c| c.code.as_str()))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Currency codes of `country`; an unknown country gives an empty list.
#[unsafe(no_mangle)]
pub extern "C" fn hw_keys_currencies(keys: *const FfiConfigurationKeys, country: *const c_char) -> *mut FfiStringList {
    catch_unwind(|| {
        let Some(country) = str_arg(country) else {
            return std::ptr::null_mut();
        };
        if keys.is_null() {
            return std::ptr::null_mut();
        }
        let keys = &unsafe { &*keys }.inner;
        FfiStringList::from_strs(keys.currencies(country).iter().map(|c| c.code.as_str()))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Transfer method type codes of `country`/`currency`; misses give an
/// empty list.
#[unsafe(no_mangle)]
pub extern "C" fn hw_keys_transfer_method_types(
    keys: *const FfiConfigurationKeys,
    country: *const c_char,
    currency: *const c_char,
) -> *mut FfiStringList {
    catch_unwind(|| {
        let (Some(country), Some(currency)) = (str_arg(country), str_arg(currency)) else {
            return std::ptr::null_mut();
        };
        if keys.is_null() {
            return std::ptr::null_mut();
        }
        let keys = &unsafe { &*keys }.inner;
        FfiStringList::from_strs(
            keys.transfer_method_types(country, currency)
                .iter()
                .map(|t| t.code.as_str()),
        )
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a keys handle. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hw_keys_free(keys: *mut FfiConfigurationKeys) {
    if !keys.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(keys) });
        });
    }
}

// ---------------------------------------------------------------------------
// Masks
// ---------------------------------------------------------------------------

fn mask_arg(mask_json: *const c_char) -> Option<Mask> {
    serde_json::from_str(str_arg(mask_json)?).ok()
}

/// Pattern the mask picks for `value`. Null on a null argument or a mask
/// that is not valid JSON. Free with `hw_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn hw_mask_select_pattern(mask_json: *const c_char, value: *const c_char) -> *mut c_char {
    catch_unwind(|| match (mask_arg(mask_json), str_arg(value)) {
        (Some(mask), Some(value)) => c_string(mask.select_pattern(value)),
        _ => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// `value` scrubbed and laid out on the selected pattern. Free with
/// `hw_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn hw_mask_format(mask_json: *const c_char, value: *const c_char) -> *mut c_char {
    catch_unwind(|| match (mask_arg(mask_json), str_arg(value)) {
        (Some(mask), Some(value)) => c_string(mask.format(value)),
        _ => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a request returned by any `hw_build_*` function. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hw_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.url);
        free_c_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(req.headers, req.headers_len as usize))
            };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    });
}

/// Free a result returned by any `hw_parse_*` function. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hw_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        free_c_string(result.data_json);
    });
}

/// Free a string list returned by any `hw_keys_*` lookup. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hw_free_string_list(list: *mut FfiStringList) {
    if list.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let list = unsafe { Box::from_raw(list) };
        if !list.items.is_null() && list.len > 0 {
            let items = unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(list.items, list.len as usize)) };
            for item in items.iter() {
                free_c_string(*item);
            }
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hw_free_string(s: *mut c_char) {
    let _ = catch_unwind(|| free_c_string(s));
}

fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
