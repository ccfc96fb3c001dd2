//! The country → currency → transfer method type graph returned by the
//! configuration keys query, and the lookups a host runs over it.

use serde::Serialize;

use crate::connection::{Connection, Keyed, MappedConnection};
use crate::error::DecodeError;
use crate::fee::{Fee, ProcessingTime};
use crate::json::{self, JsonObject};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferMethodType {
    pub code: String,
    pub name: Option<String>,
    pub processing_times: Connection<ProcessingTime>,
    pub fees: Connection<Fee>,
}

impl TransferMethodType {
    pub fn decode(obj: &JsonObject) -> Result<Self, DecodeError> {
        Ok(Self {
            code: json::required_str(obj, "code")?,
            name: json::optional_str(obj, "name")?,
            processing_times: Connection::decode_child(obj, "processingTimes", |node| {
                json::from_object(node, "processing time")
            })?,
            fees: Connection::decode_child(obj, "fees", |node| json::from_object(node, "fee"))?,
        })
    }

    /// Value of the first processing time node.
    pub fn processing_time(&self) -> Option<&str> {
        self.processing_times.first().map(|p| p.value.as_str())
    }
}

impl Keyed for TransferMethodType {
    fn key(&self) -> &str {
        &self.code
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub code: String,
    pub name: Option<String>,
    pub transfer_method_types: MappedConnection<TransferMethodType>,
}

impl Currency {
    pub fn decode(obj: &JsonObject) -> Result<Self, DecodeError> {
        Ok(Self {
            code: json::required_str(obj, "code")?,
            name: json::optional_str(obj, "name")?,
            transfer_method_types: MappedConnection::decode_child(
                obj,
                "transferMethodTypes",
                TransferMethodType::decode,
            )?,
        })
    }
}

impl Keyed for Currency {
    fn key(&self) -> &str {
        &self.code
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Country {
    pub code: String,
    pub name: Option<String>,
    pub iso3: Option<String>,
    pub currencies: MappedConnection<Currency>,
}

impl Country {
    pub fn decode(obj: &JsonObject) -> Result<Self, DecodeError> {
        Ok(Self {
            code: json::required_str(obj, "code")?,
            name: json::optional_str(obj, "name")?,
            iso3: json::optional_str(obj, "iso3")?,
            currencies: MappedConnection::decode_child(obj, "currencies", Currency::decode)?,
        })
    }
}

impl Keyed for Country {
    fn key(&self) -> &str {
        &self.code
    }
}

/// Result of the keys and fees-and-processing-times queries.
///
/// Every lookup miss is an empty slice or `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferMethodConfigurationKeys {
    pub countries: MappedConnection<Country>,
}

impl TransferMethodConfigurationKeys {
    /// Decode from the GraphQL `data` object.
    pub fn decode(data: &JsonObject) -> Result<Self, DecodeError> {
        let countries = json::optional_object(data, "countries")?.ok_or_else(|| DecodeError::missing("countries"))?;
        Ok(Self {
            countries: MappedConnection::decode_with(countries, Country::decode)?,
        })
    }

    pub fn countries(&self) -> &[Country] {
        self.countries.nodes()
    }

    pub fn country(&self, country: &str) -> Option<&Country> {
        self.countries.get(country)
    }

    pub fn currencies(&self, country: &str) -> &[Currency] {
        self.country(country).map(|c| c.currencies.nodes()).unwrap_or(&[])
    }

    pub fn currency(&self, country: &str, currency: &str) -> Option<&Currency> {
        self.country(country)?.currencies.get(currency)
    }

    pub fn transfer_method_types(&self, country: &str, currency: &str) -> &[TransferMethodType] {
        self.currency(country, currency)
            .map(|c| c.transfer_method_types.nodes())
            .unwrap_or(&[])
    }

    pub fn transfer_method_type(
        &self,
        country: &str,
        currency: &str,
        transfer_method_type: &str,
    ) -> Option<&TransferMethodType> {
        self.currency(country, currency)?
            .transfer_method_types
            .get(transfer_method_type)
    }

    pub fn fees(&self, country: &str, currency: &str, transfer_method_type: &str) -> &[Fee] {
        self.transfer_method_type(country, currency, transfer_method_type)
            .map(|t| t.fees.nodes())
            .unwrap_or(&[])
    }

    pub fn processing_time(&self, country: &str, currency: &str, transfer_method_type: &str) -> Option<&str> {
        self.transfer_method_type(country, currency, transfer_method_type)?
            .processing_time()
    }
}
