//! Synchronous client core for the Hyperwallet REST and GraphQL APIs.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The caller executes the
//! actual HTTP round-trip, making the core fully deterministic and testable.
//!
//! # Design
//! - `HyperwalletClient` holds the parsed token and a context id; every
//!   operation is a `build_*`/`parse_*` pair.
//! - GraphQL responses decode into explicit graphs (`Connection`,
//!   `MappedConnection`, `Country` ...) through hand-written decoders, so a
//!   malformed response fails the whole decode instead of yielding a
//!   half-populated model.
//! - Transfer method configurations arrive in two wire shapes and decode
//!   into one canonical `TransferMethodConfiguration`.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod auth;
pub mod client;
pub mod configuration;
pub mod connection;
pub mod country;
pub mod error;
pub mod fee;
pub mod field;
pub mod gql;
pub mod http;
pub mod json;
pub mod query;
pub mod types;

pub use auth::Configuration;
pub use client::HyperwalletClient;
pub use configuration::{
    TransferMethodConfiguration, TransferMethodConfigurationFields, TransferMethodConfigurationResult,
};
pub use connection::{Connection, Keyed, MappedConnection, PageInfo};
pub use country::{Country, Currency, TransferMethodConfigurationKeys, TransferMethodType};
pub use error::{ApiError, DecodeError, Error, Errors};
pub use fee::{Fee, FeeRateType, ProcessingTime};
pub use field::{DataType, Field, FieldGroup, GroupName, Mask, ValidationFailure};
pub use gql::{decode_gql_response, GqlError, GqlResponse};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use json::{GenericValue, JsonObject};
pub use query::{
    GqlQuery, TransferMethodConfigurationFieldsQuery, TransferMethodConfigurationKeysQuery,
    TransferMethodConfigurationsQuery, TransferMethodTypesFeesAndProcessingTimesQuery,
};
pub use types::{Balance, ListQuery, PageList, Receipt, StatusTransition, Transfer, TransferMethod, User};
