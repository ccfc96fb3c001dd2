//! Stateless HTTP request builder and response parser for the Hyperwallet
//! REST and GraphQL APIs.
//!
//! # Design
//! `HyperwalletClient` holds the parsed token and a context id and carries
//! no mutable state between calls. Each operation is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse`. The caller executes the round trip, keeping
//! the core deterministic and free of I/O dependencies.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::Configuration;
use crate::error::{ApiError, DecodeError, Error, Errors};
use crate::gql::{decode_gql_response, GqlResponse};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::query::GqlQuery;
use crate::types::{
    path_segment, transfer_method_collection, Balance, ListQuery, PageList, Receipt, StatusTransition, Transfer,
    TransferMethod, User,
};

pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SDK_TYPE: &str = "rust";

/// Synchronous, stateless client for the Hyperwallet API.
///
/// Every request is addressed using the URIs carried by the token. When
/// [`requires_token_refresh`](Self::requires_token_refresh) turns true the
/// host fetches a new token and swaps it in with
/// [`with_token`](Self::with_token).
#[derive(Debug, Clone)]
pub struct HyperwalletClient {
    configuration: Configuration,
    context_id: String,
}

impl HyperwalletClient {
    pub fn new(token: &str) -> Result<Self, ApiError> {
        Ok(Self {
            configuration: Configuration::from_token(token)?,
            context_id: Uuid::new_v4().to_string(),
        })
    }

    /// Same client, fresh token. The context id is kept.
    pub fn with_token(&self, token: &str) -> Result<Self, ApiError> {
        Ok(Self {
            configuration: Configuration::from_token(token)?,
            context_id: self.context_id.clone(),
        })
    }

    pub fn with_context_id(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = context_id.into();
        self
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn user_token(&self) -> &str {
        &self.configuration.user_token
    }

    pub fn requires_token_refresh(&self) -> bool {
        self.configuration.is_stale()
    }

    // -- users ---------------------------------------------------------------

    pub fn build_get_user(&self) -> HttpRequest {
        self.rest(HttpMethod::Get, &format!("users/{}", self.user_segment()), None)
    }

    pub fn parse_get_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        parse_entity(&response)
    }

    // -- transfer methods ----------------------------------------------------

    pub fn build_create_transfer_method(&self, method: &TransferMethod) -> Result<HttpRequest, ApiError> {
        let path = format!("users/{}/{}", self.user_segment(), method.collection()?);
        Ok(self.rest(HttpMethod::Post, &path, Some(to_body(method)?)))
    }

    pub fn parse_create_transfer_method(&self, response: HttpResponse) -> Result<TransferMethod, ApiError> {
        parse_entity(&response)
    }

    pub fn build_update_transfer_method(&self, method: &TransferMethod) -> Result<HttpRequest, ApiError> {
        let token = required_token(method.token.as_deref())?;
        let path = format!(
            "users/{}/{}/{}",
            self.user_segment(),
            method.collection()?,
            path_segment(token)
        );
        Ok(self.rest(HttpMethod::Put, &path, Some(to_body(method)?)))
    }

    pub fn parse_update_transfer_method(&self, response: HttpResponse) -> Result<TransferMethod, ApiError> {
        parse_entity(&response)
    }

    pub fn build_deactivate_transfer_method(
        &self,
        transfer_method_type: &str,
        transfer_method_token: &str,
        notes: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let token = required_token(Some(transfer_method_token))?;
        let path = format!(
            "users/{}/{}/{}/status-transitions",
            self.user_segment(),
            transfer_method_collection(transfer_method_type)?,
            path_segment(token)
        );
        let body = to_body(&StatusTransition::new(StatusTransition::DE_ACTIVATED, notes))?;
        Ok(self.rest(HttpMethod::Post, &path, Some(body)))
    }

    pub fn parse_deactivate_transfer_method(&self, response: HttpResponse) -> Result<StatusTransition, ApiError> {
        parse_entity(&response)
    }

    pub fn build_list_transfer_methods(&self, query: &ListQuery) -> HttpRequest {
        let path = format!("users/{}/transfer-methods?{}", self.user_segment(), query.to_query_string());
        self.rest(HttpMethod::Get, &path, None)
    }

    pub fn parse_list_transfer_methods(&self, response: HttpResponse) -> Result<PageList<TransferMethod>, ApiError> {
        parse_page(&response)
    }

    // -- balances and receipts -----------------------------------------------

    pub fn build_list_balances(&self, query: &ListQuery) -> HttpRequest {
        let path = format!("users/{}/balances?{}", self.user_segment(), query.to_query_string());
        self.rest(HttpMethod::Get, &path, None)
    }

    pub fn build_list_prepaid_card_balances(&self, card_token: &str, query: &ListQuery) -> HttpRequest {
        let path = format!(
            "users/{}/prepaid-cards/{}/balances?{}",
            self.user_segment(),
            path_segment(card_token),
            query.to_query_string()
        );
        self.rest(HttpMethod::Get, &path, None)
    }

    pub fn parse_list_balances(&self, response: HttpResponse) -> Result<PageList<Balance>, ApiError> {
        parse_page(&response)
    }

    pub fn build_list_receipts(&self, query: &ListQuery) -> HttpRequest {
        let path = format!("users/{}/receipts?{}", self.user_segment(), query.to_query_string());
        self.rest(HttpMethod::Get, &path, None)
    }

    pub fn build_list_prepaid_card_receipts(&self, card_token: &str, query: &ListQuery) -> HttpRequest {
        let path = format!(
            "users/{}/prepaid-cards/{}/receipts?{}",
            self.user_segment(),
            path_segment(card_token),
            query.to_query_string()
        );
        self.rest(HttpMethod::Get, &path, None)
    }

    pub fn parse_list_receipts(&self, response: HttpResponse) -> Result<PageList<Receipt>, ApiError> {
        parse_page(&response)
    }

    // -- transfers -----------------------------------------------------------

    pub fn build_create_transfer(&self, transfer: &Transfer) -> Result<HttpRequest, ApiError> {
        Ok(self.rest(HttpMethod::Post, "transfers", Some(to_body(transfer)?)))
    }

    pub fn parse_create_transfer(&self, response: HttpResponse) -> Result<Transfer, ApiError> {
        parse_entity(&response)
    }

    pub fn build_get_transfer(&self, transfer_token: &str) -> Result<HttpRequest, ApiError> {
        let token = required_token(Some(transfer_token))?;
        Ok(self.rest(HttpMethod::Get, &format!("transfers/{}", path_segment(token)), None))
    }

    pub fn parse_get_transfer(&self, response: HttpResponse) -> Result<Transfer, ApiError> {
        parse_entity(&response)
    }

    pub fn build_list_transfers(&self, query: &ListQuery) -> HttpRequest {
        self.rest(HttpMethod::Get, &format!("transfers?{}", query.to_query_string()), None)
    }

    pub fn parse_list_transfers(&self, response: HttpResponse) -> Result<PageList<Transfer>, ApiError> {
        parse_page(&response)
    }

    pub fn build_schedule_transfer(&self, transfer_token: &str, notes: Option<&str>) -> Result<HttpRequest, ApiError> {
        let token = required_token(Some(transfer_token))?;
        let body = to_body(&StatusTransition::new(StatusTransition::SCHEDULED, notes))?;
        let path = format!("transfers/{}/status-transitions", path_segment(token));
        Ok(self.rest(HttpMethod::Post, &path, Some(body)))
    }

    pub fn parse_schedule_transfer(&self, response: HttpResponse) -> Result<StatusTransition, ApiError> {
        parse_entity(&response)
    }

    // -- GraphQL -------------------------------------------------------------

    pub fn build_graphql<Q: GqlQuery>(&self, query: &Q) -> Result<HttpRequest, ApiError> {
        let body = serde_json::json!({ "query": query.to_query()? }).to_string();
        Ok(self.request(HttpMethod::Post, self.configuration.graphql_uri.clone(), Some(body)))
    }

    /// Typed data, or `ApiError::Graphql` when the envelope reports errors.
    pub fn parse_graphql<Q: GqlQuery>(&self, query: &Q, response: HttpResponse) -> Result<Q::Data, ApiError> {
        let envelope = self.parse_graphql_response(query, response)?;
        envelope.into_result().map_err(ApiError::Graphql)
    }

    /// The full envelope, partial data and errors side by side.
    pub fn parse_graphql_response<Q: GqlQuery>(
        &self,
        query: &Q,
        response: HttpResponse,
    ) -> Result<GqlResponse<Q::Data>, ApiError> {
        check_status(&response)?;
        let envelope = decode_gql_response(&response.body, |data| query.decode_data(data))?;
        if envelope.has_errors() {
            warn!(errors = %envelope.to_errors(), "GraphQL response carried errors");
        }
        Ok(envelope)
    }

    // -- plumbing ------------------------------------------------------------

    fn user_segment(&self) -> impl std::fmt::Display + '_ {
        path_segment(self.user_token())
    }

    fn rest(&self, method: HttpMethod, path: &str, body: Option<String>) -> HttpRequest {
        let url = format!("{}/{path}", self.configuration.rest_uri.trim_end_matches('/'));
        self.request(method, url, body)
    }

    fn request(&self, method: HttpMethod, path: String, body: Option<String>) -> HttpRequest {
        let mut headers = vec![
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.configuration.token()),
            ),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        headers.extend([
            ("User-Agent".to_string(), format!("HyperwalletSDK/Rust/{SDK_VERSION}")),
            ("X-Sdk-Version".to_string(), SDK_VERSION.to_string()),
            ("X-Sdk-Type".to_string(), SDK_TYPE.to_string()),
            ("X-Sdk-ContextId".to_string(), self.context_id.clone()),
        ]);
        debug!(method = method.as_str(), %path, "built request");
        HttpRequest {
            method,
            path,
            headers,
            body,
        }
    }
}

fn required_token(token: Option<&str>) -> Result<&str, ApiError> {
    match token {
        Some(t) if !t.is_empty() => Ok(t),
        _ => Err(ApiError::InvalidParameter {
            name: "token",
            reason: "must not be empty".to_string(),
        }),
    }
}

fn to_body<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::Serialization(e.to_string()))
}

/// Map a status outside `[200, 300)` to `ApiError::Http`, keeping the
/// server's structured errors when the body has them.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    debug!(status = response.status, "parsing response");
    if response.is_success() {
        return Ok(());
    }
    let errors = serde_json::from_str::<Errors>(&response.body)
        .ok()
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| {
            let message = if response.body.trim().is_empty() {
                format!("HTTP status {}", response.status)
            } else {
                response.body.clone()
            };
            Errors::single(Error::new(format!("HTTP_{}", response.status), message))
        });
    warn!(status = response.status, %errors, "request failed");
    Err(ApiError::Http {
        status: response.status,
        errors,
    })
}

fn parse_entity<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    check_status(response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(DecodeError::Syntax(e.to_string())))
}

/// `204 No Content` is an empty page.
fn parse_page<T: DeserializeOwned>(response: &HttpResponse) -> Result<PageList<T>, ApiError> {
    if response.status == 204 {
        return Ok(PageList::default());
    }
    parse_entity(response)
}
