//! GraphQL response envelope: `{data, errors?}`.
//!
//! `data` is mandatory and decoded by a caller-supplied decoder; `errors`
//! is kept verbatim next to it. A response carrying both is a partial
//! success and both halves are preserved.

use serde::{Deserialize, Serialize};

use crate::error::{self, DecodeError, Errors};
use crate::json::{self, JsonObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GqlLocation {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GqlErrorExtensions {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GqlError {
    pub message: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub locations: Vec<GqlLocation>,
    #[serde(default, deserialize_with = "path_segments")]
    pub path: Vec<String>,
    #[serde(default)]
    pub extensions: Option<GqlErrorExtensions>,
}

impl GqlError {
    pub fn code(&self) -> Option<&str> {
        self.extensions.as_ref()?.code.as_deref()
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Path segments are field names or list indices; indices are kept as text.
fn path_segments<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .collect())
}

/// A decoded GraphQL response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GqlResponse<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<GqlError>>,
}

impl<T> GqlResponse<T> {
    /// Decode an envelope. A missing or non-object `data` is a decode error;
    /// an empty or null `errors` records no errors.
    pub fn decode_with<F>(obj: &JsonObject, decoder: F) -> Result<Self, DecodeError>
    where
        F: FnOnce(&JsonObject) -> Result<T, DecodeError>,
    {
        let data_obj = json::optional_object(obj, "data")?.ok_or_else(|| DecodeError::missing("data"))?;
        let data = decoder(data_obj)?;

        let errors = match json::optional_array(obj, "errors")? {
            None => None,
            Some(items) if items.is_empty() => None,
            Some(items) => Some(
                json::objects(items, "errors")?
                    .into_iter()
                    .map(|e| json::from_object::<GqlError>(e, "GraphQL error"))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };
        Ok(Self { data, errors })
    }

    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    /// The errors in the platform's structured shape.
    pub fn to_errors(&self) -> Errors {
        Errors {
            errors: self
                .errors
                .iter()
                .flatten()
                .map(|e| error::Error {
                    code: e.code().unwrap_or(error::CODE_GRAPHQL_ERROR).to_string(),
                    message: e.message.clone(),
                    field_name: None,
                })
                .collect(),
        }
    }

    /// `Ok(data)` when no errors were reported.
    pub fn into_result(self) -> Result<T, Errors> {
        if self.has_errors() {
            Err(self.to_errors())
        } else {
            Ok(self.data)
        }
    }
}

/// Parse a raw body and decode it as an envelope.
pub fn decode_gql_response<T, F>(body: &str, decoder: F) -> Result<GqlResponse<T>, DecodeError>
where
    F: FnOnce(&JsonObject) -> Result<T, DecodeError>,
{
    GqlResponse::decode_with(&json::parse_object(body)?, decoder)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(data: &JsonObject) -> Result<Vec<String>, DecodeError> {
        Ok(data.keys().cloned().collect())
    }

    #[test]
    fn data_and_errors_coexist() {
        let body = r#"{"data":{"countries":{"nodes":[]}},"errors":[{"message":"partial failure"}]}"#;
        let response = decode_gql_response(body, keys).unwrap();
        assert_eq!(response.data, vec!["countries".to_string()]);
        let errors = response.errors.as_ref().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "partial failure");
        assert!(response.has_errors());
    }

    #[test]
    fn missing_data_is_fatal() {
        let err = decode_gql_response(r#"{"errors":[{"message":"x"}]}"#, keys).unwrap_err();
        assert_eq!(err, DecodeError::MissingField { field: "data".into() });
    }

    #[test]
    fn data_of_wrong_shape_is_fatal() {
        let err = decode_gql_response(r#"{"data":[1,2]}"#, keys).unwrap_err();
        assert!(matches!(err, DecodeError::WrongType { .. }));
    }

    #[test]
    fn empty_and_null_errors_record_nothing() {
        for body in [r#"{"data":{},"errors":[]}"#, r#"{"data":{},"errors":null}"#, r#"{"data":{}}"#] {
            let response = decode_gql_response(body, keys).unwrap();
            assert!(response.errors.is_none(), "{body}");
            assert!(response.into_result().is_ok());
        }
    }

    #[test]
    fn null_locations_and_path_keep_the_error() {
        let body = r#"{"data":{},"errors":[{"message":"x","locations":null,"path":null}]}"#;
        let response = decode_gql_response(body, keys).unwrap();
        let errors = response.errors.as_ref().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "x");
        assert!(errors[0].locations.is_empty());
        assert!(errors[0].path.is_empty());
        assert!(response.data.is_empty());
    }

    #[test]
    fn full_error_object_decodes() {
        let body = r#"{
            "data": {},
            "errors": [{
                "message": "Could not find any currency.",
                "locations": [{"line": 1, "column": 78}],
                "path": ["countries", 0, "currencies"],
                "extensions": {"code": "DataFetchingException", "timestamp": "2019-04-30T21:22:14.911Z"}
            }]
        }"#;
        let response = decode_gql_response(body, keys).unwrap();
        let error = &response.errors.as_ref().unwrap()[0];
        assert_eq!(error.locations, vec![GqlLocation { line: 1, column: 78 }]);
        assert_eq!(error.path, vec!["countries", "0", "currencies"]);
        assert_eq!(error.code(), Some("DataFetchingException"));

        let errors = response.into_result().unwrap_err();
        assert_eq!(errors.errors[0].code, "DataFetchingException");
        assert_eq!(errors.errors[0].message, "Could not find any currency.");
    }

    #[test]
    fn error_without_code_maps_to_generic_code() {
        let response = decode_gql_response(r#"{"data":{},"errors":[{"message":"boom"}]}"#, keys).unwrap();
        assert_eq!(response.to_errors().errors[0].code, crate::error::CODE_GRAPHQL_ERROR);
    }

    #[test]
    fn data_decoder_failure_propagates() {
        let err = decode_gql_response(r#"{"data":{}}"#, |_| -> Result<(), DecodeError> {
            Err(DecodeError::missing("countries"))
        })
        .unwrap_err();
        assert_eq!(err, DecodeError::MissingField { field: "countries".into() });
    }
}
