//! Transfer method configurations: what a user may create for a given
//! country, currency, transfer method type and profile.
//!
//! # Design
//! The backend speaks two node shapes. The current one carries a single
//! `country`/`currency` and grouped fields; the legacy one carries
//! `countries`/`currencies` lists, fees, a processing time and a flat
//! field list. Both decode into one `TransferMethodConfiguration` so the
//! rest of the crate never branches on wire format.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::connection::{Connection, MappedConnection};
use crate::country::Country;
use crate::error::DecodeError;
use crate::fee::Fee;
use crate::field::{Field, FieldGroup};
use crate::json::{self, JsonObject};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferMethodConfiguration {
    pub countries: Vec<String>,
    pub currencies: Vec<String>,
    pub profile: String,
    pub transfer_method_type: String,
    pub processing_time: Option<String>,
    pub fees: Vec<Fee>,
    /// Ungrouped fields (legacy shape).
    pub fields: Vec<Field>,
    pub field_groups: Vec<FieldGroup>,
}

impl TransferMethodConfiguration {
    /// Decode either wire shape.
    pub fn decode(obj: &JsonObject) -> Result<Self, DecodeError> {
        if obj.contains_key("countries") {
            Self::decode_legacy(obj)
        } else if obj.contains_key("country") {
            Self::decode_current(obj)
        } else {
            Err(DecodeError::missing("country"))
        }
    }

    fn decode_current(obj: &JsonObject) -> Result<Self, DecodeError> {
        let field_groups = Connection::decode_child(obj, "fieldGroups", |node| {
            json::from_object::<FieldGroup>(node, "field group")
        })?;
        Ok(Self {
            countries: vec![json::required_str(obj, "country")?],
            currencies: vec![json::required_str(obj, "currency")?],
            profile: json::required_str(obj, "profile")?,
            transfer_method_type: json::required_str(obj, "transferMethodType")?,
            processing_time: None,
            fees: Vec::new(),
            fields: Vec::new(),
            field_groups: field_groups.nodes.unwrap_or_default(),
        })
    }

    fn decode_legacy(obj: &JsonObject) -> Result<Self, DecodeError> {
        let fees = Connection::decode_child(obj, "fees", |node| json::from_object::<Fee>(node, "fee"))?;
        let fields = match json::optional_array(obj, "fields")? {
            None => Vec::new(),
            Some(items) => json::objects(items, "fields")?
                .into_iter()
                .map(|f| json::from_object::<Field>(f, "field"))
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(Self {
            countries: json::string_list(obj, "countries")?,
            currencies: json::string_list(obj, "currencies")?,
            profile: json::required_str(obj, "profile")?,
            transfer_method_type: json::required_str(obj, "transferMethodType")?,
            processing_time: json::optional_str(obj, "processingTime")?,
            fees: fees.nodes.unwrap_or_default(),
            fields,
            field_groups: Vec::new(),
        })
    }

    pub fn has_country(&self, country: &str) -> bool {
        self.countries.iter().any(|c| c == country)
    }

    pub fn has_currency(&self, currency: &str) -> bool {
        self.currencies.iter().any(|c| c == currency)
    }

    /// Ungrouped fields first, then each group's fields in group order.
    pub fn all_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields
            .iter()
            .chain(self.field_groups.iter().flat_map(FieldGroup::fields))
    }

    fn matches(&self, country: &str, currency: &str, transfer_method_type: &str, profile: &str) -> bool {
        self.profile == profile
            && self.transfer_method_type == transfer_method_type
            && self.has_country(country)
            && self.has_currency(currency)
    }
}

fn configurations_root(data: &JsonObject) -> Result<&JsonObject, DecodeError> {
    json::optional_object(data, "transferMethodConfigurations")?
        .ok_or_else(|| DecodeError::missing("transferMethodConfigurations"))
}

/// Questions answered over a list of configurations.
///
/// Lookups that find nothing return an empty collection or `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferMethodConfigurationResult {
    pub configurations: Connection<TransferMethodConfiguration>,
}

impl TransferMethodConfigurationResult {
    /// Decode from the GraphQL `data` object.
    pub fn decode(data: &JsonObject) -> Result<Self, DecodeError> {
        Ok(Self {
            configurations: Connection::decode_with(configurations_root(data)?, TransferMethodConfiguration::decode)?,
        })
    }

    pub fn countries(&self) -> BTreeSet<String> {
        self.configurations
            .iter()
            .flat_map(|c| c.countries.iter().cloned())
            .collect()
    }

    pub fn currencies(&self, country: &str) -> BTreeSet<String> {
        self.configurations
            .iter()
            .filter(|c| c.has_country(country))
            .flat_map(|c| c.currencies.iter().cloned())
            .collect()
    }

    pub fn transfer_method_types(&self, country: &str, currency: &str, profile: &str) -> BTreeSet<String> {
        self.configurations
            .iter()
            .filter(|c| c.profile == profile && c.has_country(country) && c.has_currency(currency))
            .map(|c| c.transfer_method_type.clone())
            .collect()
    }

    /// Fees of every configuration with this profile whose own tuple equals
    /// the query, in configuration order then fee order.
    pub fn fees(&self, country: &str, currency: &str, transfer_method_type: &str, profile: &str) -> Vec<Fee> {
        self.configurations
            .iter()
            .filter(|c| c.profile == profile && !c.fees.is_empty())
            .flat_map(|c| c.fees.iter())
            .filter(|fee| fee.applies_to(country, currency, transfer_method_type))
            .cloned()
            .collect()
    }

    pub fn processing_time(
        &self,
        country: &str,
        currency: &str,
        transfer_method_type: &str,
        profile: &str,
    ) -> Option<&str> {
        self.configurations
            .iter()
            .find(|c| c.matches(country, currency, transfer_method_type, profile))?
            .processing_time
            .as_deref()
    }

    /// Every configuration's fields, in configuration order.
    pub fn fields(&self) -> Vec<&Field> {
        self.configurations.iter().flat_map(|c| c.all_fields()).collect()
    }

    /// Fields of the configurations matching the full tuple.
    pub fn fields_for(
        &self,
        country: &str,
        currency: &str,
        transfer_method_type: &str,
        profile: &str,
    ) -> Vec<&Field> {
        self.configurations
            .iter()
            .filter(|c| c.matches(country, currency, transfer_method_type, profile))
            .flat_map(|c| c.all_fields())
            .collect()
    }
}

/// Result of the configuration fields query: the field configuration for
/// one tuple plus the country graph narrowed to that tuple.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferMethodConfigurationFields {
    pub configurations: Connection<TransferMethodConfiguration>,
    pub countries: Option<MappedConnection<Country>>,
}

impl TransferMethodConfigurationFields {
    pub fn decode(data: &JsonObject) -> Result<Self, DecodeError> {
        let configurations =
            Connection::decode_with(configurations_root(data)?, TransferMethodConfiguration::decode)?;
        let countries = match json::optional_object(data, "countries")? {
            Some(obj) => Some(MappedConnection::decode_with(obj, Country::decode)?),
            None => None,
        };
        Ok(Self {
            configurations,
            countries,
        })
    }

    pub fn configuration(&self) -> Option<&TransferMethodConfiguration> {
        self.configurations.first()
    }

    pub fn field_groups(&self) -> &[FieldGroup] {
        self.configuration()
            .map(|c| c.field_groups.as_slice())
            .unwrap_or(&[])
    }

    pub fn fields(&self) -> Vec<&Field> {
        self.configuration()
            .map(|c| c.all_fields().collect())
            .unwrap_or_default()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.configuration()?.all_fields().find(|f| f.name == name)
    }

    fn transfer_method_type(&self) -> Option<&crate::country::TransferMethodType> {
        self.countries
            .as_ref()?
            .first()?
            .currencies
            .first()?
            .transfer_method_types
            .first()
    }

    pub fn fees(&self) -> &[Fee] {
        self.transfer_method_type()
            .map(|t| t.fees.nodes())
            .unwrap_or(&[])
    }

    pub fn processing_time(&self) -> Option<&str> {
        self.transfer_method_type()?.processing_time()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::GroupName;
    use crate::json::parse_object;

    const LEGACY: &str = r#"{
        "transferMethodConfigurations": {
            "count": 2,
            "nodes": [
                {
                    "countries": ["CA"], "currencies": ["CAD"],
                    "profile": "INDIVIDUAL", "transferMethodType": "PAPER_CHECK",
                    "processingTime": "5 - 7 business days",
                    "fees": {"count": 1, "nodes": [{
                        "country": "CA", "currency": "CAD", "transferMethodType": "PAPER_CHECK",
                        "feeRateType": "PERCENT", "value": "4.9", "minimum": "10", "maximum": "20"
                    }]},
                    "fields": [
                        {"name": "addressLine1", "label": "Address", "dataType": "TEXT", "isRequired": true}
                    ]
                },
                {
                    "countries": ["CA", "US"], "currencies": ["CAD", "USD"],
                    "profile": "BUSINESS", "transferMethodType": "BANK_ACCOUNT",
                    "fees": {"nodes": []}
                }
            ]
        }
    }"#;

    const CURRENT: &str = r#"{
        "transferMethodConfigurations": {
            "count": 1,
            "nodes": [{
                "country": "US", "currency": "USD", "profile": "INDIVIDUAL",
                "transferMethodType": "BANK_ACCOUNT",
                "fieldGroups": {"nodes": [
                    {"group": "ACCOUNT_INFORMATION", "fields": [
                        {"name": "branchId", "dataType": "NUMBER"},
                        {"name": "bankAccountId", "dataType": "NUMBER"}
                    ]},
                    {"group": "ADDRESS", "fields": [
                        {"name": "city", "dataType": "TEXT"}
                    ]}
                ]}
            }]
        },
        "countries": {"nodes": [{"code": "US", "currencies": {"nodes": [{"code": "USD",
            "transferMethodTypes": {"nodes": [{"code": "BANK_ACCOUNT",
                "processingTimes": {"nodes": [{"value": "1-3 business days"}]},
                "fees": {"nodes": [{"feeRateType": "FLAT", "value": "2.00", "currency": "USD"}]}}]}}]}}]}
    }"#;

    fn legacy() -> TransferMethodConfigurationResult {
        TransferMethodConfigurationResult::decode(&parse_object(LEGACY).unwrap()).unwrap()
    }

    #[test]
    fn fee_lookup_filters_by_profile_and_tuple() {
        let result = legacy();
        let fees = result.fees("CA", "CAD", "PAPER_CHECK", "INDIVIDUAL");
        assert_eq!(fees.len(), 1);
        assert_eq!(fees[0].value.as_deref(), Some("4.9"));
        assert!(result.fees("CA", "CAD", "PAPER_CHECK", "BUSINESS").is_empty());
        assert!(result.fees("CA", "USD", "PAPER_CHECK", "INDIVIDUAL").is_empty());
    }

    #[test]
    fn countries_and_currencies_union() {
        let result = legacy();
        assert_eq!(result.countries(), BTreeSet::from(["CA".to_string(), "US".to_string()]));
        assert_eq!(result.currencies("CA"), BTreeSet::from(["CAD".to_string(), "USD".to_string()]));
        assert_eq!(result.currencies("US"), BTreeSet::from(["CAD".to_string(), "USD".to_string()]));
        assert!(result.currencies("FR").is_empty());
    }

    #[test]
    fn transfer_method_types_respect_profile() {
        let result = legacy();
        assert_eq!(
            result.transfer_method_types("CA", "CAD", "INDIVIDUAL"),
            BTreeSet::from(["PAPER_CHECK".to_string()])
        );
        assert_eq!(
            result.transfer_method_types("US", "USD", "BUSINESS"),
            BTreeSet::from(["BANK_ACCOUNT".to_string()])
        );
        assert!(result.transfer_method_types("US", "USD", "INDIVIDUAL").is_empty());
    }

    #[test]
    fn processing_time_first_match_or_none() {
        let result = legacy();
        assert_eq!(
            result.processing_time("CA", "CAD", "PAPER_CHECK", "INDIVIDUAL"),
            Some("5 - 7 business days")
        );
        assert_eq!(result.processing_time("CA", "CAD", "BANK_ACCOUNT", "BUSINESS"), None);
        assert_eq!(result.processing_time("FR", "EUR", "PAPER_CHECK", "INDIVIDUAL"), None);
    }

    #[test]
    fn fields_concatenate_in_node_order() {
        let result = legacy();
        let names: Vec<&str> = result.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["addressLine1"]);
        assert!(result
            .fields_for("US", "USD", "BANK_ACCOUNT", "BUSINESS")
            .is_empty());
    }

    #[test]
    fn current_shape_decodes_into_same_model() {
        let fields = TransferMethodConfigurationFields::decode(&parse_object(CURRENT).unwrap()).unwrap();
        let config = fields.configuration().unwrap();
        assert_eq!(config.countries, vec!["US"]);
        assert_eq!(config.currencies, vec!["USD"]);
        assert_eq!(fields.field_groups()[0].group_name, GroupName::AccountInformation);

        let names: Vec<&str> = fields.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["branchId", "bankAccountId", "city"]);
        assert!(fields.field("city").is_some());

        assert_eq!(fields.fees().len(), 1);
        assert_eq!(fields.processing_time(), Some("1-3 business days"));
    }

    #[test]
    fn both_shapes_feed_the_facade() {
        let current = TransferMethodConfigurationResult::decode(&parse_object(CURRENT).unwrap()).unwrap();
        assert_eq!(
            current.transfer_method_types("US", "USD", "INDIVIDUAL"),
            BTreeSet::from(["BANK_ACCOUNT".to_string()])
        );
        assert_eq!(current.fields_for("US", "USD", "BANK_ACCOUNT", "INDIVIDUAL").len(), 3);
    }

    #[test]
    fn node_without_country_is_rejected() {
        let body = r#"{"transferMethodConfigurations":{"nodes":[{"profile":"INDIVIDUAL","transferMethodType":"X"}]}}"#;
        let err = TransferMethodConfigurationResult::decode(&parse_object(body).unwrap()).unwrap_err();
        assert_eq!(err, DecodeError::MissingField { field: "country".into() });
    }

    #[test]
    fn field_group_without_group_is_rejected() {
        let body = r#"{"transferMethodConfigurations":{"nodes":[{"country":"US","currency":"USD",
            "profile":"INDIVIDUAL","transferMethodType":"BANK_ACCOUNT",
            "fieldGroups":{"nodes":[{"fields":[]}]}}]}}"#;
        assert!(TransferMethodConfigurationFields::decode(&parse_object(body).unwrap()).is_err());
    }

    #[test]
    fn missing_root_is_fatal() {
        let err = TransferMethodConfigurationFields::decode(&parse_object("{}").unwrap()).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MissingField {
                field: "transferMethodConfigurations".into()
            }
        );
    }

    #[test]
    fn empty_fields_result_is_empty() {
        let body = r#"{"transferMethodConfigurations":{"count":0,"nodes":[]}}"#;
        let fields = TransferMethodConfigurationFields::decode(&parse_object(body).unwrap()).unwrap();
        assert!(fields.configuration().is_none());
        assert!(fields.fields().is_empty());
        assert!(fields.fees().is_empty());
        assert!(fields.processing_time().is_none());
    }
}
