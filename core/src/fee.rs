//! Fee and processing-time metadata attached to transfer method types.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeRateType {
    Flat,
    Percent,
}

/// Amounts arrive as strings from GraphQL and occasionally as numbers.
fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(other) => {
            return Err(serde::de::Error::custom(format!("expected amount, got {other}")));
        }
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fee {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub transfer_method_type: Option<String>,
    pub fee_rate_type: FeeRateType,
    #[serde(default, deserialize_with = "amount")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "amount")]
    pub minimum: Option<String>,
    #[serde(default, deserialize_with = "amount")]
    pub maximum: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

impl Fee {
    /// True when the fee's own tuple equals the query tuple.
    pub fn applies_to(&self, country: &str, currency: &str, transfer_method_type: &str) -> bool {
        self.country.as_deref() == Some(country)
            && self.currency.as_deref() == Some(currency)
            && self.transfer_method_type.as_deref() == Some(transfer_method_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingTime {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub transfer_method_type: Option<String>,
    pub value: String,
}
