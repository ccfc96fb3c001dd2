//! GraphQL query builders.
//!
//! Each query is a literal template with positional `%s` holes. String
//! arguments are escaped into GraphQL string literals; enum arguments must
//! be plain upper-case identifiers so nothing caller-supplied reaches the
//! query text unchecked.

use crate::configuration::{TransferMethodConfigurationFields, TransferMethodConfigurationResult};
use crate::country::TransferMethodConfigurationKeys;
use crate::error::{ApiError, DecodeError};
use crate::json::JsonObject;

/// A GraphQL query together with the decoder for its `data` object.
pub trait GqlQuery {
    type Data;

    /// Render the query text sent as `{"query": ...}`.
    fn to_query(&self) -> Result<String, ApiError>;

    fn decode_data(&self, data: &JsonObject) -> Result<Self::Data, DecodeError>;
}

const KEYS_QUERY: &str = r#"query QueryUser($idToken: String = %s) {
  countries(idToken: $idToken) {
    count
    nodes {
      code
      name
      iso3
      currencies {
        count
        nodes {
          code
          name
          transferMethodTypes {
            count
            nodes {
              code
              name
            }
          }
        }
      }
    }
  }
}"#;

const FEES_AND_PROCESSING_TIMES_QUERY: &str = r#"query QueryUser($idToken: String = %s) {
  countries(idToken: $idToken, countryCode: %s) {
    count
    nodes {
      code
      name
      currencies(currencyCode: %s) {
        count
        nodes {
          code
          name
          transferMethodTypes {
            count
            nodes {
              code
              name
              processingTimes {
                count
                nodes {
                  country
                  currency
                  transferMethodType
                  value
                }
              }
              fees {
                count
                nodes {
                  currency
                  feeRateType
                  value
                  minimum
                  maximum
                }
              }
            }
          }
        }
      }
    }
  }
}"#;

const FIELDS_QUERY: &str = r#"query QueryUser($idToken: String = %s) {
  transferMethodConfigurations(idToken: $idToken, country: %s, currency: %s, transferMethodType: %s, profile: %s) {
    count
    nodes {
      country
      currency
      transferMethodType
      profile
      fieldGroups {
        nodes {
          group
          isEditable
          fields {
            category
            dataType
            isRequired
            isEditable
            label
            maxLength
            minLength
            name
            placeholder
            regularExpression
            value
            fieldSelectionOptions {
              label
              value
            }
            validationMessage {
              length
              pattern
              empty
            }
            mask {
              defaultPattern
              scrubRegex
              conditionalPatterns {
                pattern
                regex
              }
            }
            fileType
            fileSize {
              min
              max
            }
          }
        }
      }
    }
  }
  countries(idToken: $idToken, countryCode: %s) {
    nodes {
      code
      name
      iso3
      currencies(currencyCode: %s) {
        nodes {
          code
          name
          transferMethodTypes(transferMethodType: %s) {
            nodes {
              code
              name
              fees {
                nodes {
                  currency
                  feeRateType
                  value
                  minimum
                  maximum
                }
              }
              processingTimes {
                nodes {
                  country
                  currency
                  transferMethodType
                  value
                }
              }
            }
          }
        }
      }
    }
  }
}"#;

const CONFIGURATIONS_QUERY: &str = r#"query QueryUser($idToken: String = %s) {
  transferMethodConfigurations(idToken: $idToken%s) {
    count
    nodes {
      countries
      currencies
      transferMethodType
      profile
      processingTime
      fees {
        count
        nodes {
          country
          currency
          transferMethodType
          feeRateType
          value
          minimum
          maximum
        }
      }
      fields {
        category
        dataType
        isRequired
        isEditable
        label
        maxLength
        minLength
        name
        placeholder
        regularExpression
        fieldSelectionOptions {
          label
          value
        }
      }
    }
  }
}"#;

/// Substitute each `%s` in order. Extra holes stay empty; extra arguments
/// are ignored.
fn fill(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len() + args.iter().map(String::len).sum::<usize>());
    let mut args = args.iter();
    let mut parts = template.split("%s");
    if let Some(head) = parts.next() {
        out.push_str(head);
    }
    for part in parts {
        if let Some(arg) = args.next() {
            out.push_str(arg);
        }
        out.push_str(part);
    }
    out
}

/// Render `value` as a quoted GraphQL string literal.
fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Accept `[A-Z0-9_]+` only.
fn enum_value(name: &'static str, value: &str) -> Result<String, ApiError> {
    let valid = !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_');
    if valid {
        Ok(value.to_string())
    } else {
        Err(ApiError::InvalidParameter {
            name,
            reason: format!("`{value}` is not an upper-case identifier"),
        })
    }
}

fn user_token(value: &str) -> Result<String, ApiError> {
    if value.is_empty() {
        return Err(ApiError::InvalidParameter {
            name: "userToken",
            reason: "must not be empty".to_string(),
        });
    }
    Ok(string_literal(value))
}

/// Every country, currency and transfer method type available to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferMethodConfigurationKeysQuery {
    pub user_token: String,
}

impl TransferMethodConfigurationKeysQuery {
    pub fn new(user_token: impl Into<String>) -> Self {
        Self {
            user_token: user_token.into(),
        }
    }
}

impl GqlQuery for TransferMethodConfigurationKeysQuery {
    type Data = TransferMethodConfigurationKeys;

    fn to_query(&self) -> Result<String, ApiError> {
        Ok(fill(KEYS_QUERY, &[user_token(&self.user_token)?]))
    }

    fn decode_data(&self, data: &JsonObject) -> Result<Self::Data, DecodeError> {
        TransferMethodConfigurationKeys::decode(data)
    }
}

/// Transfer method types with fees and processing times for one
/// country/currency pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferMethodTypesFeesAndProcessingTimesQuery {
    pub user_token: String,
    pub country: String,
    pub currency: String,
}

impl TransferMethodTypesFeesAndProcessingTimesQuery {
    pub fn new(user_token: impl Into<String>, country: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            user_token: user_token.into(),
            country: country.into(),
            currency: currency.into(),
        }
    }
}

impl GqlQuery for TransferMethodTypesFeesAndProcessingTimesQuery {
    type Data = TransferMethodConfigurationKeys;

    fn to_query(&self) -> Result<String, ApiError> {
        let args = [
            user_token(&self.user_token)?,
            enum_value("country", &self.country)?,
            enum_value("currency", &self.currency)?,
        ];
        Ok(fill(FEES_AND_PROCESSING_TIMES_QUERY, &args))
    }

    fn decode_data(&self, data: &JsonObject) -> Result<Self::Data, DecodeError> {
        TransferMethodConfigurationKeys::decode(data)
    }
}

/// Field configuration for one full tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferMethodConfigurationFieldsQuery {
    pub user_token: String,
    pub country: String,
    pub currency: String,
    pub transfer_method_type: String,
    pub profile: String,
}

impl TransferMethodConfigurationFieldsQuery {
    pub fn new(
        user_token: impl Into<String>,
        country: impl Into<String>,
        currency: impl Into<String>,
        transfer_method_type: impl Into<String>,
        profile: impl Into<String>,
    ) -> Self {
        Self {
            user_token: user_token.into(),
            country: country.into(),
            currency: currency.into(),
            transfer_method_type: transfer_method_type.into(),
            profile: profile.into(),
        }
    }
}

impl GqlQuery for TransferMethodConfigurationFieldsQuery {
    type Data = TransferMethodConfigurationFields;

    fn to_query(&self) -> Result<String, ApiError> {
        let country = enum_value("country", &self.country)?;
        let currency = enum_value("currency", &self.currency)?;
        let transfer_method_type = enum_value("transferMethodType", &self.transfer_method_type)?;
        let args = [
            user_token(&self.user_token)?,
            country.clone(),
            currency.clone(),
            transfer_method_type.clone(),
            enum_value("profile", &self.profile)?,
            country,
            currency,
            transfer_method_type,
        ];
        Ok(fill(FIELDS_QUERY, &args))
    }

    fn decode_data(&self, data: &JsonObject) -> Result<Self::Data, DecodeError> {
        TransferMethodConfigurationFields::decode(data)
    }
}

/// Configurations in the legacy flat shape, optionally filtered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferMethodConfigurationsQuery {
    pub user_token: String,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub transfer_method_type: Option<String>,
    pub profile: Option<String>,
}

impl TransferMethodConfigurationsQuery {
    pub fn new(user_token: impl Into<String>) -> Self {
        Self {
            user_token: user_token.into(),
            ..Self::default()
        }
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn transfer_method_type(mut self, transfer_method_type: impl Into<String>) -> Self {
        self.transfer_method_type = Some(transfer_method_type.into());
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    fn filters(&self) -> Result<String, ApiError> {
        let mut out = String::new();
        let filters = [
            ("country", &self.country),
            ("currency", &self.currency),
            ("transferMethodType", &self.transfer_method_type),
            ("profile", &self.profile),
        ];
        for (name, value) in filters {
            if let Some(value) = value {
                out.push_str(&format!(", {name}: {}", enum_value(name, value)?));
            }
        }
        Ok(out)
    }
}

impl GqlQuery for TransferMethodConfigurationsQuery {
    type Data = TransferMethodConfigurationResult;

    fn to_query(&self) -> Result<String, ApiError> {
        Ok(fill(CONFIGURATIONS_QUERY, &[user_token(&self.user_token)?, self.filters()?]))
    }

    fn decode_data(&self, data: &JsonObject) -> Result<Self::Data, DecodeError> {
        TransferMethodConfigurationResult::decode(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_is_positional() {
        assert_eq!(fill("a %s b %s c", &["1".into(), "2".into()]), "a 1 b 2 c");
        assert_eq!(fill("%s%s", &["x".into()]), "x");
        assert_eq!(fill("no holes", &["x".into()]), "no holes");
    }

    #[test]
    fn keys_query_embeds_escaped_token() {
        let q = TransferMethodConfigurationKeysQuery::new("usr-123").to_query().unwrap();
        assert!(q.starts_with("query QueryUser($idToken: String = \"usr-123\")"));
        assert!(q.contains("transferMethodTypes"));
        assert!(!q.contains("%s"));

        let q = TransferMethodConfigurationKeysQuery::new("a\"b\\c").to_query().unwrap();
        assert!(q.contains(r#"String = "a\"b\\c")"#));
    }

    #[test]
    fn fees_query_places_country_and_currency() {
        let q = TransferMethodTypesFeesAndProcessingTimesQuery::new("usr-1", "CA", "CAD")
            .to_query()
            .unwrap();
        assert!(q.contains("countryCode: CA"));
        assert!(q.contains("currencyCode: CAD"));
        assert!(q.contains("processingTimes"));
    }

    #[test]
    fn fields_query_fills_both_roots() {
        let q = TransferMethodConfigurationFieldsQuery::new("usr-1", "US", "USD", "BANK_ACCOUNT", "INDIVIDUAL")
            .to_query()
            .unwrap();
        assert!(q.contains(
            "country: US, currency: USD, transferMethodType: BANK_ACCOUNT, profile: INDIVIDUAL"
        ));
        assert!(q.contains("countries(idToken: $idToken, countryCode: US)"));
        assert!(q.contains("transferMethodTypes(transferMethodType: BANK_ACCOUNT)"));
        assert!(!q.contains("%s"));
    }

    #[test]
    fn enum_arguments_are_validated() {
        let err = TransferMethodConfigurationFieldsQuery::new("usr-1", "US) { x", "USD", "BANK_ACCOUNT", "INDIVIDUAL")
            .to_query()
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter { name: "country", .. }));

        let err = TransferMethodTypesFeesAndProcessingTimesQuery::new("usr-1", "CA", "cad")
            .to_query()
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter { name: "currency", .. }));
    }

    #[test]
    fn empty_user_token_is_rejected() {
        let err = TransferMethodConfigurationKeysQuery::new("").to_query().unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter { name: "userToken", .. }));
    }

    #[test]
    fn legacy_query_renders_only_set_filters() {
        let q = TransferMethodConfigurationsQuery::new("usr-1").to_query().unwrap();
        assert!(q.contains("transferMethodConfigurations(idToken: $idToken) {"));

        let q = TransferMethodConfigurationsQuery::new("usr-1")
            .country("CA")
            .profile("INDIVIDUAL")
            .to_query()
            .unwrap();
        assert!(q.contains("transferMethodConfigurations(idToken: $idToken, country: CA, profile: INDIVIDUAL) {"));
    }

    #[test]
    fn control_characters_are_escaped() {
        assert_eq!(string_literal("a\nb\u{1}"), "\"a\\nb\\u0001\"");
    }
}
