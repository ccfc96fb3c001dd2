use std::time::Duration;

use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, issue_token};
use serde_json::Value;
use tower::ServiceExt;

const USER: &str = "usr-c4292f1a-866f-4310-a289-b916853939de";

fn token() -> String {
    issue_token(USER, "http://localhost:3000", Duration::from_secs(600))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {}", token()))
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {}", token()))
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn graphql(query: &str) -> Request<String> {
    json_request("POST", "/graphql", &serde_json::json!({ "query": query }).to_string())
}

// --- auth ---

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri(format!("/rest/v3/users/{USER}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["errors"][0]["code"], "INVALID_AUTHENTICATION");
}

#[tokio::test]
async fn other_users_are_forbidden() {
    let resp = app().oneshot(get("/rest/v3/users/usr-someone-else")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let expired = issue_token(USER, "http://localhost:3000", Duration::ZERO);
    let resp = app()
        .oneshot(
            Request::builder()
                .uri(format!("/rest/v3/users/{USER}"))
                .header(http::header::AUTHORIZATION, format!("Bearer {expired}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["errors"][0]["code"], "JWT_EXPIRED");
}

// --- users, balances, receipts ---

#[tokio::test]
async fn get_user_returns_token_owner() {
    let resp = app().oneshot(get(&format!("/rest/v3/users/{USER}"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["token"], USER);
}

#[tokio::test]
async fn balances_are_paged() {
    let resp = app()
        .oneshot(get(&format!("/rest/v3/users/{USER}/balances?limit=1&offset=0")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["limit"], 1);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn receipts_filter_by_currency() {
    let resp = app()
        .oneshot(get(&format!("/rest/v3/users/{USER}/receipts?currency=EUR")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn empty_transfer_method_list_is_no_content() {
    let resp = app()
        .oneshot(get(&format!("/rest/v3/users/{USER}/transfer-methods")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

// --- transfer methods ---

#[tokio::test]
async fn create_rejects_missing_fields() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            &format!("/rest/v3/users/{USER}/bank-accounts"),
            r#"{"type":"BANK_ACCOUNT","transferMethodCountry":"US"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["errors"][0]["fieldName"], "transferMethodCurrency");
}

#[tokio::test]
async fn create_rejects_wrong_collection() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            &format!("/rest/v3/users/{USER}/paper-checks"),
            r#"{"type":"BANK_ACCOUNT","transferMethodCountry":"US","transferMethodCurrency":"USD"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn transfer_method_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            &format!("/rest/v3/users/{USER}/bank-accounts"),
            r#"{"type":"BANK_ACCOUNT","transferMethodCountry":"US","transferMethodCurrency":"USD",
                "branchId":"021000021","bankAccountId":"7861012345"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    assert_eq!(created["status"], "ACTIVATED");
    assert_eq!(created["branchId"], "021000021");
    let token = created["token"].as_str().unwrap().to_string();

    // update keeps server-owned fields
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            &format!("/rest/v3/users/{USER}/bank-accounts/{token}"),
            r#"{"type":"BANK_ACCOUNT","status":"DE_ACTIVATED","branchId":"026009593"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = body_json(resp).await;
    assert_eq!(updated["branchId"], "026009593");
    assert_eq!(updated["status"], "ACTIVATED");

    // list
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/rest/v3/users/{USER}/transfer-methods?type=BANK_ACCOUNT")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let list = body_json(resp).await;
    assert_eq!(list["count"], 1);
    assert_eq!(list["data"][0]["token"], token.as_str());

    // deactivate
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            &format!("/rest/v3/users/{USER}/bank-accounts/{token}/status-transitions"),
            r#"{"transition":"DE_ACTIVATED","notes":"closing"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let transition = body_json(resp).await;
    assert_eq!(transition["fromStatus"], "ACTIVATED");
    assert_eq!(transition["toStatus"], "DE_ACTIVATED");
    assert_eq!(transition["notes"], "closing");

    // deactivating twice fails
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            &format!("/rest/v3/users/{USER}/bank-accounts/{token}/status-transitions"),
            r#"{"transition":"DE_ACTIVATED"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // filtered list of active methods is now empty
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/rest/v3/users/{USER}/transfer-methods?status=ACTIVATED")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn prepaid_card_balances_require_card() {
    use tower::Service;

    let mut app = app().into_service();
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/rest/v3/users/{USER}/prepaid-cards/trm-missing/balances")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            &format!("/rest/v3/users/{USER}/prepaid-cards"),
            r#"{"type":"PREPAID_CARD","transferMethodCountry":"US","transferMethodCurrency":"USD"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let card = body_json(resp).await;
    let card_token = card["token"].as_str().unwrap();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/rest/v3/users/{USER}/prepaid-cards/{card_token}/receipts")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"][0]["sourceToken"], card_token);
}

// --- transfers ---

#[tokio::test]
async fn transfer_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();
    let body = serde_json::json!({
        "clientTransferId": "ct-1",
        "sourceToken": USER,
        "destinationToken": "trm-1",
        "destinationAmount": "25.00",
        "destinationCurrency": "USD"
    })
    .to_string();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/rest/v3/transfers", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    assert_eq!(created["status"], "QUOTED");
    let token = created["token"].as_str().unwrap().to_string();

    // duplicate client id
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/rest/v3/transfers", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            &format!("/rest/v3/transfers/{token}/status-transitions"),
            r#"{"transition":"SCHEDULED"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_json(resp).await["toStatus"], "SCHEDULED");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/rest/v3/transfers/{token}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "SCHEDULED");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/rest/v3/transfers"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["count"], 1);
}

#[tokio::test]
async fn unknown_transfer_is_not_found() {
    let resp = app().oneshot(get("/rest/v3/transfers/trf-missing")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- graphql ---

#[tokio::test]
async fn keys_query_returns_country_graph() {
    let resp = app()
        .oneshot(graphql("query { countries(idToken: $idToken) { nodes { code } } }"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["countries"]["nodes"][0]["code"], "CA");
    assert!(body.get("errors").is_none());
}

#[tokio::test]
async fn fees_query_filters_and_reports_unknown_currency() {
    let resp = app()
        .oneshot(graphql(
            "query { countries(idToken: $idToken, countryCode: CA) { currencies(currencyCode: CAD) { processingTimes } } }",
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    let countries = body["data"]["countries"]["nodes"].as_array().unwrap();
    assert_eq!(countries.len(), 1);
    assert_eq!(countries[0]["currencies"]["nodes"][0]["code"], "CAD");

    let resp = app()
        .oneshot(graphql(
            "query { countries(idToken: $idToken, countryCode: CA) { currencies(currencyCode: EUR) { processingTimes } } }",
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["errors"][0]["message"], "Could not find any currency.");
}

#[tokio::test]
async fn fields_query_filters_configurations() {
    let query = "query { transferMethodConfigurations(idToken: $idToken, country: US, currency: USD, \
                 transferMethodType: PAYPAL_ACCOUNT, profile: INDIVIDUAL) { fieldGroups } \
                 countries(idToken: $idToken, countryCode: US) { currencies(currencyCode: USD) { \
                 transferMethodTypes(transferMethodType: PAYPAL_ACCOUNT) { processingTimes } } } }";
    let resp = app().oneshot(graphql(query)).await.unwrap();
    let body = body_json(resp).await;
    let configurations = &body["data"]["transferMethodConfigurations"];
    assert_eq!(configurations["count"], 1);
    assert_eq!(configurations["nodes"][0]["transferMethodType"], "PAYPAL_ACCOUNT");
    let types = &body["data"]["countries"]["nodes"][0]["currencies"]["nodes"][0]["transferMethodTypes"]["nodes"];
    assert_eq!(types.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unsupported_query_is_bad_request() {
    let resp = app().oneshot(graphql("query { me }")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
