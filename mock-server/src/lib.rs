//! In-memory stand-in for the Hyperwallet REST and GraphQL endpoints.
//!
//! Every route requires `Authorization: Bearer <jwt>`; the token's `sub`
//! must own the `users/{user}` path it addresses. Transfer methods and
//! transfers live in memory per server instance. GraphQL answers come from
//! the fixtures in `fixtures/`, filtered by the arguments found in the
//! query text.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};
use uuid::Uuid;

const COUNTRIES: &str = include_str!("../fixtures/countries.json");
const FIELD_CONFIGURATIONS: &str = include_str!("../fixtures/field-configurations.json");
const CONFIGURATIONS: &str = include_str!("../fixtures/configurations.json");
const RECEIPTS: &str = include_str!("../fixtures/receipts.json");

/// Mint an unsigned token for `user_token` whose URIs point at `base_url`.
pub fn issue_token(user_token: &str, base_url: &str, ttl: Duration) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let base_url = base_url.trim_end_matches('/');
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let claims = json!({
        "sub": user_token,
        "iat": now,
        "exp": now + ttl.as_secs(),
        "aud": "prg-mock",
        "iss": "prg-mock",
        "rest-uri": format!("{base_url}/rest/v3/"),
        "graphql-uri": format!("{base_url}/graphql"),
        "environment": "MOCK",
        "program-model": "WALLET_MODEL"
    });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.mock")
}

#[derive(Debug, Default)]
pub struct Store {
    /// Transfer methods by owning user token.
    transfer_methods: HashMap<String, Vec<Map<String, Value>>>,
    transfers: Vec<Map<String, Value>>,
}

impl Store {
    fn transfer_method(&mut self, user: &str, collection: &str, token: &str) -> Result<&mut Map<String, Value>, Failure> {
        self.transfer_methods
            .get_mut(user)
            .into_iter()
            .flatten()
            .find(|m| field(m, "token") == Some(token) && field(m, "type").and_then(collection_of) == Some(collection))
            .ok_or_else(|| Failure::not_found("transfer method"))
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/rest/v3/users/{user}", get(get_user))
        .route("/rest/v3/users/{user}/transfer-methods", get(list_transfer_methods))
        .route("/rest/v3/users/{user}/balances", get(list_balances))
        .route("/rest/v3/users/{user}/receipts", get(list_receipts))
        .route("/rest/v3/users/{user}/{collection}", post(create_transfer_method))
        .route("/rest/v3/users/{user}/{collection}/{token}", put(update_transfer_method))
        .route(
            "/rest/v3/users/{user}/{collection}/{token}/status-transitions",
            post(deactivate_transfer_method),
        )
        .route("/rest/v3/users/{user}/{collection}/{token}/balances", get(list_card_balances))
        .route("/rest/v3/users/{user}/{collection}/{token}/receipts", get(list_card_receipts))
        .route("/rest/v3/transfers", get(list_transfers).post(create_transfer))
        .route("/rest/v3/transfers/{token}", get(get_transfer))
        .route("/rest/v3/transfers/{token}/status-transitions", post(schedule_transfer))
        .route("/graphql", post(graphql))
        .layer(middleware::from_fn(log_request))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let response = next.run(request).await;
    info!(%method, %uri, status = response.status().as_u16(), "handled request");
    response
}

// ---------------------------------------------------------------------------
// Errors and auth
// ---------------------------------------------------------------------------

/// A non-2xx answer carrying the platform's `{"errors": [...]}` body.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    code: &'static str,
    message: String,
    field_name: Option<String>,
}

impl Failure {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            field_name: None,
        }
    }

    fn field(mut self, name: &str) -> Self {
        self.field_name = Some(name.to_string());
        self
    }

    fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", format!("{what} not found"))
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let mut error = json!({"message": self.message, "code": self.code});
        if let Some(field) = self.field_name {
            error["fieldName"] = Value::String(field);
        }
        (self.status, Json(json!({ "errors": [error] }))).into_response()
    }
}

type Reply = Result<Response, Failure>;

fn respond(status: StatusCode, body: Value) -> Reply {
    Ok((status, Json(body)).into_response())
}

#[derive(Deserialize)]
struct Claims {
    sub: String,
    exp: u64,
}

/// The `sub` of a valid, unexpired bearer token.
fn authorize(headers: &HeaderMap) -> Result<String, Failure> {
    let unauthorized = |message: &str| Failure::new(StatusCode::UNAUTHORIZED, "INVALID_AUTHENTICATION", message);
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| unauthorized("missing bearer token"))?;
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| unauthorized("malformed token"))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| unauthorized("malformed token"))?;
    let claims: Claims = serde_json::from_slice(&bytes).map_err(|_| unauthorized("malformed token"))?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    if claims.exp <= now {
        return Err(Failure::new(StatusCode::UNAUTHORIZED, "JWT_EXPIRED", "token has expired"));
    }
    Ok(claims.sub)
}

fn authorize_user(headers: &HeaderMap, user: &str) -> Result<(), Failure> {
    if authorize(headers)? == user {
        Ok(())
    } else {
        warn!(%user, "token does not own requested user");
        Err(Failure::new(StatusCode::FORBIDDEN, "FORBIDDEN", "token does not grant access to this user"))
    }
}

fn fixture(text: &str) -> Result<Value, Failure> {
    serde_json::from_str(text)
        .map_err(|e| Failure::new(StatusCode::INTERNAL_SERVER_ERROR, "FIXTURE_ERROR", e.to_string()))
}

// ---------------------------------------------------------------------------
// Paging
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    limit: Option<usize>,
    offset: Option<usize>,
    status: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    currency: Option<String>,
}

impl ListParams {
    fn keeps(&self, item: &Map<String, Value>) -> bool {
        let matches = |filter: &Option<String>, key: &str| {
            filter
                .as_deref()
                .map_or(true, |want| item.get(key).and_then(Value::as_str) == Some(want))
        };
        matches(&self.status, "status") && matches(&self.kind, "type") && matches(&self.currency, "currency")
    }
}

/// `204` when nothing matches, otherwise one page in the REST list shape.
fn page(items: Vec<Value>, params: &ListParams) -> Reply {
    let limit = params.limit.unwrap_or(10);
    let offset = params.offset.unwrap_or(0);
    let count = items.len();
    let data: Vec<Value> = items.into_iter().skip(offset).take(limit).collect();
    if data.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    respond(StatusCode::OK, json!({
            "count": count,
            "offset": offset,
            "limit": limit,
            "data": data,
            "links": [{"params": {"rel": "self"}, "href": format!("?offset={offset}&limit={limit}")}]
        }))
}

// ---------------------------------------------------------------------------
// Users, balances, receipts
// ---------------------------------------------------------------------------

async fn get_user(headers: HeaderMap, Path(user): Path<String>) -> Reply {
    authorize_user(&headers, &user)?;
    respond(StatusCode::OK, json!({
            "token": user,
            "status": "PRE_ACTIVATED",
            "createdOn": "2019-01-01T00:00:00",
            "clientUserId": "mock-client",
            "profileType": "INDIVIDUAL",
            "firstName": "Stan",
            "lastName": "Fung",
            "email": "stan@example.com",
            "country": "US",
            "programToken": "prg-mock"
        }))
}

async fn list_balances(headers: HeaderMap, Path(user): Path<String>, Query(params): Query<ListParams>) -> Reply {
    authorize_user(&headers, &user)?;
    let balances = vec![
        json!({"currency": "USD", "amount": "9933.50"}),
        json!({"currency": "CAD", "amount": "120.00"}),
    ];
    let balances = balances
        .into_iter()
        .filter(|b| b.as_object().is_some_and(|b| params.keeps(b)))
        .collect();
    page(balances, &params)
}

async fn list_receipts(headers: HeaderMap, Path(user): Path<String>, Query(params): Query<ListParams>) -> Reply {
    authorize_user(&headers, &user)?;
    let receipts = match fixture(RECEIPTS)? {
        Value::Array(items) => items,
        _ => Vec::new(),
    };
    let receipts = receipts
        .into_iter()
        .filter(|r| r.as_object().is_some_and(|r| params.keeps(r)))
        .collect();
    page(receipts, &params)
}

async fn prepaid_card_exists(db: &Db, user: &str, collection: &str, token: &str) -> Result<(), Failure> {
    let store = db.read().await;
    let found = collection == "prepaid-cards"
        && store
            .transfer_methods
            .get(user)
            .into_iter()
            .flatten()
            .any(|m| field(m, "token") == Some(token) && field(m, "type") == Some("PREPAID_CARD"));
    if found {
        Ok(())
    } else {
        Err(Failure::not_found("prepaid card"))
    }
}

async fn list_card_balances(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((user, collection, token)): Path<(String, String, String)>,
    Query(params): Query<ListParams>,
) -> Reply {
    authorize_user(&headers, &user)?;
    prepaid_card_exists(&db, &user, &collection, &token).await?;
    page(vec![json!({"currency": "USD", "amount": "45.00"})], &params)
}

async fn list_card_receipts(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((user, collection, token)): Path<(String, String, String)>,
    Query(params): Query<ListParams>,
) -> Reply {
    authorize_user(&headers, &user)?;
    prepaid_card_exists(&db, &user, &collection, &token).await?;
    let receipt = json!({
        "journalId": "CC003924839",
        "type": "CARD_ACTIVATION_FEE",
        "createdOn": "2019-06-01T12:00:00",
        "entry": "DEBIT",
        "sourceToken": token,
        "amount": "1.95",
        "currency": "USD"
    });
    page(vec![receipt], &params)
}

// ---------------------------------------------------------------------------
// Transfer methods
// ---------------------------------------------------------------------------

fn field<'a>(item: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    item.get(key).and_then(Value::as_str)
}

fn collection_of(transfer_method_type: &str) -> Option<&'static str> {
    match transfer_method_type {
        "BANK_ACCOUNT" | "WIRE_ACCOUNT" => Some("bank-accounts"),
        "BANK_CARD" => Some("bank-cards"),
        "PAPER_CHECK" => Some("paper-checks"),
        "PAYPAL_ACCOUNT" => Some("paypal-accounts"),
        "PREPAID_CARD" => Some("prepaid-cards"),
        "VENMO_ACCOUNT" => Some("venmo-accounts"),
        _ => None,
    }
}

fn require<'a>(body: &'a Map<String, Value>, key: &str) -> Result<&'a str, Failure> {
    field(body, key).filter(|v| !v.is_empty()).ok_or_else(|| {
        Failure::new(
            StatusCode::BAD_REQUEST,
            "CONSTRAINT_VIOLATIONS",
            "You must provide a value for this field",
        )
        .field(key)
    })
}

fn object(body: Value) -> Result<Map<String, Value>, Failure> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(Failure::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", "body must be an object")),
    }
}

async fn create_transfer_method(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((user, collection)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Reply {
    authorize_user(&headers, &user)?;
    let mut method = object(body)?;
    let kind = require(&method, "type")?;
    if collection_of(kind) != Some(collection.as_str()) {
        return Err(Failure::new(
            StatusCode::BAD_REQUEST,
            "INVALID_TRANSFER_METHOD_TYPE",
            format!("`{kind}` cannot be created under `{collection}`"),
        )
        .field("type"));
    }
    require(&method, "transferMethodCountry")?;
    require(&method, "transferMethodCurrency")?;

    method.insert("token".into(), Value::String(format!("trm-{}", Uuid::new_v4())));
    method.insert("status".into(), Value::String("ACTIVATED".into()));
    method.insert("createdOn".into(), Value::String("2019-01-01T00:00:00".into()));
    method.insert("userToken".into(), Value::String(user.clone()));

    db.write()
        .await
        .transfer_methods
        .entry(user)
        .or_default()
        .push(method.clone());
    respond(StatusCode::CREATED, Value::Object(method))
}

async fn update_transfer_method(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((user, collection, token)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> Reply {
    authorize_user(&headers, &user)?;
    let update = object(body)?;
    let mut store = db.write().await;
    let method = store.transfer_method(&user, &collection, &token)?;
    for (key, value) in update {
        if !matches!(key.as_str(), "token" | "status" | "createdOn" | "type") {
            method.insert(key, value);
        }
    }
    respond(StatusCode::OK, Value::Object(method.clone()))
}

fn status_transition(transition: &str, from: &str, notes: Option<&Value>) -> Value {
    let mut body = json!({
        "token": format!("sts-{}", Uuid::new_v4()),
        "createdOn": "2019-01-01T00:00:00",
        "transition": transition,
        "fromStatus": from,
        "toStatus": transition
    });
    if let Some(notes) = notes {
        body["notes"] = notes.clone();
    }
    body
}

async fn deactivate_transfer_method(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((user, collection, token)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> Reply {
    authorize_user(&headers, &user)?;
    let request = object(body)?;
    if require(&request, "transition")? != "DE_ACTIVATED" {
        return Err(
            Failure::new(StatusCode::BAD_REQUEST, "INVALID_TRANSITION", "unsupported transition").field("transition"),
        );
    }
    let mut store = db.write().await;
    let method = store.transfer_method(&user, &collection, &token)?;
    let from = field(method, "status").unwrap_or_default().to_string();
    if from == "DE_ACTIVATED" {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "INVALID_TRANSITION", "already de-activated"));
    }
    method.insert("status".into(), Value::String("DE_ACTIVATED".into()));
    respond(StatusCode::CREATED, status_transition("DE_ACTIVATED", &from, request.get("notes")))
}

async fn list_transfer_methods(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(user): Path<String>,
    Query(params): Query<ListParams>,
) -> Reply {
    authorize_user(&headers, &user)?;
    let store = db.read().await;
    let methods = store
        .transfer_methods
        .get(&user)
        .into_iter()
        .flatten()
        .filter(|m| params.keeps(m))
        .cloned()
        .map(Value::Object)
        .collect();
    page(methods, &params)
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

async fn create_transfer(State(db): State<Db>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let user = authorize(&headers)?;
    let mut transfer = object(body)?;
    require(&transfer, "clientTransferId")?;
    if require(&transfer, "sourceToken")? != user {
        return Err(
            Failure::new(StatusCode::FORBIDDEN, "FORBIDDEN", "source must be the token owner").field("sourceToken"),
        );
    }
    require(&transfer, "destinationToken")?;
    let client_id = field(&transfer, "clientTransferId").map(str::to_string);
    let mut store = db.write().await;
    if store
        .transfers
        .iter()
        .any(|t| field(t, "clientTransferId").map(str::to_string) == client_id)
    {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "DUPLICATE_EXTERNAL_ID", "clientTransferId already used")
            .field("clientTransferId"));
    }
    transfer.insert("token".into(), Value::String(format!("trf-{}", Uuid::new_v4())));
    transfer.insert("status".into(), Value::String("QUOTED".into()));
    transfer.insert("createdOn".into(), Value::String("2019-01-01T00:00:00".into()));
    if let Some(amount) = transfer.get("destinationAmount").cloned() {
        transfer.entry("sourceAmount").or_insert(amount);
    }
    store.transfers.push(transfer.clone());
    respond(StatusCode::CREATED, Value::Object(transfer))
}

fn owned_transfer<'a>(
    transfers: &'a mut [Map<String, Value>],
    user: &str,
    token: &str,
) -> Result<&'a mut Map<String, Value>, Failure> {
    transfers
        .iter_mut()
        .find(|t| field(t, "token") == Some(token) && field(t, "sourceToken") == Some(user))
        .ok_or_else(|| Failure::not_found("transfer"))
}

async fn get_transfer(State(db): State<Db>, headers: HeaderMap, Path(token): Path<String>) -> Reply {
    let user = authorize(&headers)?;
    let mut store = db.write().await;
    let transfer = owned_transfer(&mut store.transfers, &user, &token)?;
    respond(StatusCode::OK, Value::Object(transfer.clone()))
}

async fn list_transfers(State(db): State<Db>, headers: HeaderMap, Query(params): Query<ListParams>) -> Reply {
    let user = authorize(&headers)?;
    let store = db.read().await;
    let transfers = store
        .transfers
        .iter()
        .filter(|t| field(t, "sourceToken") == Some(user.as_str()) && params.keeps(t))
        .cloned()
        .map(Value::Object)
        .collect();
    page(transfers, &params)
}

async fn schedule_transfer(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(token): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let user = authorize(&headers)?;
    let request = object(body)?;
    if require(&request, "transition")? != "SCHEDULED" {
        return Err(
            Failure::new(StatusCode::BAD_REQUEST, "INVALID_TRANSITION", "unsupported transition").field("transition"),
        );
    }
    let mut store = db.write().await;
    let transfer = owned_transfer(&mut store.transfers, &user, &token)?;
    let from = field(transfer, "status").unwrap_or_default().to_string();
    if from != "QUOTED" {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "INVALID_TRANSITION", format!("cannot schedule a {from} transfer")));
    }
    transfer.insert("status".into(), Value::String("SCHEDULED".into()));
    respond(StatusCode::CREATED, status_transition("SCHEDULED", &from, request.get("notes")))
}

// ---------------------------------------------------------------------------
// GraphQL
// ---------------------------------------------------------------------------

/// Value of an enum argument `name: VALUE` in the query text.
fn argument<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("{name}: ");
    let mut rest = query;
    while let Some(at) = rest.find(&needle) {
        let before = rest[..at].chars().next_back();
        let tail = &rest[at + needle.len()..];
        if !before.is_some_and(|c| c.is_ascii_alphanumeric()) {
            let end = tail
                .find(|c: char| !(c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'))
                .unwrap_or(tail.len());
            if end > 0 {
                return Some(&tail[..end]);
            }
        }
        rest = tail;
    }
    None
}

fn nodes_mut<'a>(connection: &'a mut Value) -> Option<&'a mut Vec<Value>> {
    connection.get_mut("nodes")?.as_array_mut()
}

/// Keep the nodes whose `code` equals `code`, and fix up `count`.
fn retain_code(connection: &mut Value, code: Option<&str>) {
    let Some(code) = code else { return };
    if let Some(nodes) = nodes_mut(connection) {
        nodes.retain(|n| n.get("code").and_then(Value::as_str) == Some(code));
        let count = nodes.len();
        connection["count"] = json!(count);
    }
}

/// Every currency connection nested under the country nodes.
fn for_each_currencies(countries: &mut Value, mut f: impl FnMut(&mut Value)) {
    for country in nodes_mut(countries).into_iter().flatten() {
        if let Some(currencies) = country.get_mut("currencies") {
            f(currencies);
        }
    }
}

fn for_each_types(countries: &mut Value, mut f: impl FnMut(&mut Value)) {
    for_each_currencies(countries, |currencies| {
        for currency in nodes_mut(currencies).into_iter().flatten() {
            if let Some(types) = currency.get_mut("transferMethodTypes") {
                f(types);
            }
        }
    });
}

fn countries_for(query: &str) -> Result<(Value, Vec<Value>), Failure> {
    let mut countries = fixture(COUNTRIES)?;
    let mut errors = Vec::new();
    retain_code(&mut countries, argument(query, "countryCode"));
    if let Some(currency) = argument(query, "currencyCode") {
        let mut found = false;
        for_each_currencies(&mut countries, |c| {
            retain_code(c, Some(currency));
            found |= nodes_mut(c).is_some_and(|n| !n.is_empty());
        });
        if !found {
            errors.push(json!({
                "message": "Could not find any currency.",
                "locations": [{"line": 1, "column": 78}],
                "path": ["countries", 0, "currencies"],
                "extensions": {"code": "DataFetchingException"}
            }));
        }
    }
    let transfer_method_type = argument(query, "transferMethodType");
    let with_details = query.contains("processingTimes");
    for_each_types(&mut countries, |types| {
        retain_code(types, transfer_method_type);
        if !with_details {
            for node in nodes_mut(types).into_iter().flatten() {
                if let Some(node) = node.as_object_mut() {
                    node.remove("fees");
                    node.remove("processingTimes");
                }
            }
        }
    });
    Ok((countries, errors))
}

fn configurations_for(text: &str, query: &str, shape_list: bool) -> Result<Value, Failure> {
    let mut configurations = fixture(text)?;
    let filters = [
        ("country", if shape_list { "countries" } else { "country" }),
        ("currency", if shape_list { "currencies" } else { "currency" }),
        ("transferMethodType", "transferMethodType"),
        ("profile", "profile"),
    ];
    if let Some(nodes) = nodes_mut(&mut configurations) {
        for (argument_name, key) in filters {
            if let Some(want) = argument(query, argument_name) {
                nodes.retain(|n| match n.get(key) {
                    Some(Value::Array(items)) => items.iter().any(|v| v.as_str() == Some(want)),
                    Some(Value::String(s)) => s == want,
                    _ => false,
                });
            }
        }
        let count = nodes.len();
        configurations["count"] = json!(count);
    }
    Ok(configurations)
}

#[derive(Deserialize)]
struct GraphqlRequest {
    query: String,
}

async fn graphql(headers: HeaderMap, Json(request): Json<GraphqlRequest>) -> Reply {
    authorize(&headers)?;
    let query = request.query.as_str();
    let mut data = Map::new();
    let mut errors = Vec::new();

    if query.contains("fieldGroups") {
        data.insert(
            "transferMethodConfigurations".into(),
            configurations_for(FIELD_CONFIGURATIONS, query, false)?,
        );
        let (countries, _) = countries_for(query)?;
        data.insert("countries".into(), countries);
    } else if query.contains("transferMethodConfigurations") {
        data.insert(
            "transferMethodConfigurations".into(),
            configurations_for(CONFIGURATIONS, query, true)?,
        );
    } else if query.contains("countries") {
        let (countries, found) = countries_for(query)?;
        data.insert("countries".into(), countries);
        errors = found;
    } else {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "INVALID_QUERY", "unsupported query"));
    }

    let mut body = json!({ "data": data });
    if !errors.is_empty() {
        body["errors"] = Value::Array(errors);
    }
    respond(StatusCode::OK, body)
}
