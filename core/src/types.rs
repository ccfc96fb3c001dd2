//! REST DTOs.
//!
//! # Design
//! Each resource models the fields the client reads and keeps everything
//! else in `extra`, so dynamic transfer method fields (whatever the
//! configuration query lists) survive a round trip untouched. Types are
//! defined independently of the mock server; integration tests catch
//! schema drift.

use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, PercentEncode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::json::GenericValue;

/// Unknown fields, keyed by wire name.
pub type Extra = BTreeMap<String, GenericValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_token: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// REST collection a transfer method type is stored under.
pub fn transfer_method_collection(transfer_method_type: &str) -> Result<&'static str, ApiError> {
    match transfer_method_type {
        "BANK_ACCOUNT" | "WIRE_ACCOUNT" => Ok("bank-accounts"),
        "BANK_CARD" => Ok("bank-cards"),
        "PAPER_CHECK" => Ok("paper-checks"),
        "PAYPAL_ACCOUNT" => Ok("paypal-accounts"),
        "PREPAID_CARD" => Ok("prepaid-cards"),
        "VENMO_ACCOUNT" => Ok("venmo-accounts"),
        other => Err(ApiError::InvalidParameter {
            name: "type",
            reason: format!("unsupported transfer method type `{other}`"),
        }),
    }
}

/// A bank account, card, check, wallet or prepaid card.
///
/// Type-specific fields (`bankAccountId`, `cardNumber`, `email`, ...) live in
/// `extra` under the names the configuration fields query reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferMethod {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(rename = "type")]
    pub transfer_method_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    pub transfer_method_country: String,
    pub transfer_method_currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default_transfer_method: Option<bool>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl TransferMethod {
    pub fn new(
        transfer_method_type: impl Into<String>,
        country: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            transfer_method_type: transfer_method_type.into(),
            transfer_method_country: country.into(),
            transfer_method_currency: currency.into(),
            ..Self::default()
        }
    }

    /// Set a dynamic field by its configuration name.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<GenericValue>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.extra.get(name).and_then(GenericValue::as_str)
    }

    pub fn collection(&self) -> Result<&'static str, ApiError> {
        transfer_method_collection(&self.transfer_method_type)
    }
}

/// Body of a `status-transitions` request and its response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTransition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub transition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl StatusTransition {
    pub const DE_ACTIVATED: &'static str = "DE_ACTIVATED";
    pub const SCHEDULED: &'static str = "SCHEDULED";

    pub fn new(transition: &str, notes: Option<&str>) -> Self {
        Self {
            transition: transition.to_string(),
            notes: notes.map(str::to_string),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub currency: String,
    pub amount: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_id: Option<String>,
    #[serde(rename = "type")]
    pub receipt_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    /// `CREDIT` or `DEBIT`.
    pub entry: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_token: Option<String>,
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<String>,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, GenericValue>>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    pub client_transfer_id: String,
    pub source_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_currency: Option<String>,
    pub destination_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_on: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    pub href: String,
}

/// One page of a REST list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageList<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl<T> Default for PageList<T> {
    fn default() -> Self {
        Self {
            count: 0,
            offset: 0,
            limit: 0,
            data: Vec::new(),
            links: Vec::new(),
        }
    }
}

impl<T> PageList<T> {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// `href` of the `next` link, if the server offered one.
    pub fn next_href(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.params.get("rel").map(String::as_str) == Some("next"))
            .map(|l| l.href.as_str())
    }
}

/// Everything but RFC 3986 unreserved characters.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// `segment` encoded for use as one URL path segment.
pub(crate) fn path_segment(segment: &str) -> PercentEncode<'_> {
    utf8_percent_encode(segment, QUERY_ENCODE_SET)
}

pub const DEFAULT_LIMIT: u32 = 10;

/// Paging and filtering for list endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: u32,
    pub offset: u32,
    pub status: Option<String>,
    pub transfer_method_type: Option<String>,
    pub currency: Option<String>,
    pub created_after: Option<String>,
    pub created_before: Option<String>,
    pub sort_by: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            status: None,
            transfer_method_type: None,
            currency: None,
            created_after: None,
            created_before: None,
            sort_by: None,
        }
    }
}

impl ListQuery {
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn transfer_method_type(mut self, transfer_method_type: impl Into<String>) -> Self {
        self.transfer_method_type = Some(transfer_method_type.into());
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn created_after(mut self, created_after: impl Into<String>) -> Self {
        self.created_after = Some(created_after.into());
        self
    }

    pub fn created_before(mut self, created_before: impl Into<String>) -> Self {
        self.created_before = Some(created_before.into());
        self
    }

    pub fn sort_by(mut self, sort_by: impl Into<String>) -> Self {
        self.sort_by = Some(sort_by.into());
        self
    }

    /// `limit=..&offset=..` followed by every set filter, without the `?`.
    pub fn to_query_string(&self) -> String {
        let limit = self.limit.to_string();
        let offset = self.offset.to_string();
        let pairs = [
            ("limit", Some(limit.as_str())),
            ("offset", Some(offset.as_str())),
            ("status", self.status.as_deref()),
            ("type", self.transfer_method_type.as_deref()),
            ("currency", self.currency.as_deref()),
            ("createdAfter", self.created_after.as_deref()),
            ("createdBefore", self.created_before.as_deref()),
            ("sortBy", self.sort_by.as_deref()),
        ];
        pairs
            .iter()
            .filter_map(|(k, v)| v.map(|v| format!("{k}={}", utf8_percent_encode(v, QUERY_ENCODE_SET))))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_method_keeps_dynamic_fields() {
        let json = r#"{"token":"trm-1","type":"BANK_ACCOUNT","status":"ACTIVATED",
            "transferMethodCountry":"US","transferMethodCurrency":"USD",
            "bankAccountId":"7861012345","branchId":"021000021","bankAccountPurpose":"CHECKING"}"#;
        let method: TransferMethod = serde_json::from_str(json).unwrap();
        assert_eq!(method.field("bankAccountId"), Some("7861012345"));
        assert_eq!(method.collection().unwrap(), "bank-accounts");

        let back = serde_json::to_value(&method).unwrap();
        assert_eq!(back["branchId"], "021000021");
        assert_eq!(back["type"], "BANK_ACCOUNT");
    }

    #[test]
    fn new_transfer_method_omits_server_fields() {
        let method = TransferMethod::new("PAYPAL_ACCOUNT", "US", "USD").with_field("email", "a@b.c");
        let body = serde_json::to_value(&method).unwrap();
        assert!(body.get("token").is_none());
        assert!(body.get("status").is_none());
        assert_eq!(body["email"], "a@b.c");
        assert_eq!(method.collection().unwrap(), "paypal-accounts");
    }

    #[test]
    fn collection_mapping() {
        assert_eq!(transfer_method_collection("WIRE_ACCOUNT").unwrap(), "bank-accounts");
        assert_eq!(transfer_method_collection("BANK_CARD").unwrap(), "bank-cards");
        assert_eq!(transfer_method_collection("VENMO_ACCOUNT").unwrap(), "venmo-accounts");
        assert!(matches!(
            transfer_method_collection("CASH"),
            Err(ApiError::InvalidParameter { name: "type", .. })
        ));
    }

    #[test]
    fn page_list_with_links() {
        let json = r#"{"count":2,"offset":0,"limit":1,
            "data":[{"currency":"USD","amount":"9933.50"}],
            "links":[{"params":{"rel":"next"},"href":"https://api/balances?offset=1&limit=1"}]}"#;
        let page: PageList<Balance> = serde_json::from_str(json).unwrap();
        assert_eq!(page.data[0].amount, "9933.50");
        assert_eq!(page.next_href(), Some("https://api/balances?offset=1&limit=1"));
        assert!(PageList::<Balance>::default().is_empty());
    }

    #[test]
    fn list_query_defaults() {
        assert_eq!(ListQuery::default().to_query_string(), "limit=10&offset=0");
    }

    #[test]
    fn list_query_orders_and_encodes() {
        let query = ListQuery::default()
            .limit(5)
            .offset(10)
            .sort_by("-createdOn")
            .status("ACTIVATED")
            .created_after("2019-01-01T00:00:00")
            .transfer_method_type("BANK_ACCOUNT");
        assert_eq!(
            query.to_query_string(),
            "limit=5&offset=10&status=ACTIVATED&type=BANK_ACCOUNT&createdAfter=2019-01-01T00%3A00%3A00&sortBy=-createdOn"
        );
        assert_eq!(
            ListQuery::default().currency("A&B=C").to_query_string(),
            "limit=10&offset=0&currency=A%26B%3DC"
        );
    }

    #[test]
    fn receipt_details_are_generic() {
        let json = r#"{"journalId":"51660665","type":"PAYMENT","entry":"CREDIT","amount":"20.00",
            "currency":"USD","details":{"clientPaymentId":"trans-0001","payeeName":"Kevin Puckett"}}"#;
        let receipt: Receipt = serde_json::from_str(json).unwrap();
        let details = receipt.details.unwrap();
        assert_eq!(details["payeeName"].as_str(), Some("Kevin Puckett"));
    }
}
