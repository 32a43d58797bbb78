//! HTTP integration tests.
//!
//! Starts the axum router on an ephemeral port and exercises it with reqwest.

mod common;

use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use ream_api::{router, AppState};

/// Bind to port 0 and return the base URL.
async fn start_server(state: AppState) -> String {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn problem(resp: reqwest::Response, status: StatusCode) -> Value {
    assert_eq!(resp.status(), status);
    assert_eq!(resp.headers()[CONTENT_TYPE], "application/problem+json");

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], status.as_u16());
    assert!(body["type"].as_str().unwrap().starts_with("https://tools.ietf.org/html/rfc9110"));
    assert!(body["detail"].is_string());
    body
}

#[tokio::test]
async fn health_check() {
    let base = start_server(common::memory_state().await).await;

    let resp = Client::new().get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn catalog_roundtrip() {
    let base = start_server(common::memory_state().await).await;
    let client = Client::new();

    let resp = client
        .post(format!("{base}/api/Paper/property"))
        .json(&json!({ "name": "A4" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let a4: Value = resp.json().await.unwrap();

    let resp = client
        .post(format!("{base}/api/Paper/property"))
        .json(&json!({ "name": "Recycled" }))
        .send()
        .await
        .unwrap();
    let recycled: Value = resp.json().await.unwrap();

    let resp = client
        .post(format!("{base}/api/Paper"))
        .json(&json!([
            { "name": "Copy 80gsm A4", "priceCents": 499, "stock": 20,
              "propertyIds": [a4["id"], recycled["id"]] },
            { "name": "Bond 100gsm A4", "priceCents": 899, "stock": 5,
              "propertyIds": [a4["id"]] },
            { "name": "Kraft 120gsm A5", "priceCents": 350, "stock": 0 }
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.unwrap();
    assert_eq!(created.as_array().unwrap().len(), 3);
    assert_eq!(created[0]["properties"].as_array().unwrap().len(), 2);

    // AND needs every selected property.
    let filter = format!("{},{}", a4["id"], recycled["id"]);
    let body: Value = client
        .get(format!("{base}/api/Paper"))
        .query(&[("filter", filter.as_str()), ("filterType", "and")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["pagingInfo"]["totalItems"], 1);
    assert_eq!(body["items"][0]["name"], "Copy 80gsm A4");

    // OR needs any of them.
    let body: Value = client
        .get(format!("{base}/api/Paper"))
        .query(&[("filter", filter.as_str()), ("filterType", "or")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["pagingInfo"]["totalItems"], 2);

    let body: Value = client
        .get(format!("{base}/api/Paper"))
        .query(&[("orderBy", "price"), ("sortBy", "desc"), ("pageSize", "2")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["items"][0]["name"], "Bond 100gsm A4");
    assert_eq!(body["pagingInfo"]["totalPages"], 2);
    assert_eq!(body["pagingInfo"]["itemsPerPage"], 2);

    let resp = client
        .get(format!("{base}/api/Paper?pageSize=0"))
        .send()
        .await
        .unwrap();
    problem(resp, StatusCode::BAD_REQUEST).await;

    let properties: Value = client
        .get(format!("{base}/api/Paper/property"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(properties[0]["name"], "A4");
    assert_eq!(properties[0]["paperCount"], 2);
}

#[tokio::test]
async fn stock_endpoints() {
    let state = common::memory_state().await;
    let paper = common::paper(&state, "Vellum 100gsm A4", 650, 4).await;
    let base = start_server(state.clone()).await;
    let client = Client::new();

    let resp = client
        .patch(format!("{base}/api/Paper/{}/restock?amount=6", paper.id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(common::stock_of(&state, paper.id).await, 10);

    let resp = client
        .patch(format!("{base}/api/Paper/restock"))
        .json(&json!([
            { "paperId": paper.id, "amount": 1 },
            { "paperId": paper.id, "amount": 2 }
        ]))
        .send()
        .await
        .unwrap();
    problem(resp, StatusCode::BAD_REQUEST).await;

    let resp = client
        .patch(format!("{base}/api/Paper/discontinue"))
        .json(&json!([-1, 0]))
        .send()
        .await
        .unwrap();
    problem(resp, StatusCode::BAD_REQUEST).await;

    let resp = client
        .patch(format!("{base}/api/Paper/{}/discontinue", paper.id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .patch(format!("{base}/api/Paper/restock"))
        .json(&json!([{ "paperId": paper.id, "amount": 1 }]))
        .send()
        .await
        .unwrap();
    let body = problem(resp, StatusCode::NOT_FOUND).await;
    assert!(body["detail"].as_str().unwrap().contains("Discontinued ids"));
}

#[tokio::test]
async fn order_lifecycle() {
    let state = common::memory_state().await;
    let customer = common::customer(&state, "Ada Stationers").await;
    let paper = common::paper(&state, "Cardstock 250gsm A4", 1099, 3).await;
    let base = start_server(state.clone()).await;
    let client = Client::new();

    let resp = client
        .post(format!("{base}/api/Order"))
        .json(&json!({
            "customerId": customer.id,
            "orderEntries": [{ "productId": paper.id, "quantity": 5 }]
        }))
        .send()
        .await
        .unwrap();
    let body = problem(resp, StatusCode::CONFLICT).await;
    assert_eq!(body["title"], "Conflict");
    assert_eq!(common::stock_of(&state, paper.id).await, 3);

    let resp = client
        .post(format!("{base}/api/Order"))
        .json(&json!({
            "customerId": customer.id,
            "orderEntries": [{ "productId": paper.id, "quantity": 2 }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp.headers()[LOCATION].to_str().unwrap().to_string();
    let order: Value = resp.json().await.unwrap();
    assert_eq!(location, format!("/api/Order/{}", order["id"]));
    assert_eq!(order["status"], "Pending");
    assert_eq!(order["totalAmountCents"], 2198);
    assert_eq!(order["orderEntries"][0]["unitPriceCents"], 1099);

    let order_id = order["id"].as_i64().unwrap();
    let resp = client
        .patch(format!("{base}/api/Order/{order_id}/status?status=shipped"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .patch(format!("{base}/api/Order/{order_id}/status?status=Pending"))
        .send()
        .await
        .unwrap();
    problem(resp, StatusCode::CONFLICT).await;

    let resp = client
        .patch(format!("{base}/api/Order/status?status=Lost"))
        .json(&json!([order_id]))
        .send()
        .await
        .unwrap();
    problem(resp, StatusCode::BAD_REQUEST).await;

    let resp = client
        .patch(format!("{base}/api/Order/status?status=Delivered"))
        .json(&json!([order_id, 9999]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let fetched: Value = client
        .get(format!("{base}{location}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["status"], "Delivered");

    let page: Value = client
        .get(format!("{base}/api/Customer/{}/Orders?page=1&pageSize=10", customer.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["pagingInfo"]["totalItems"], 1);
    assert_eq!(page["items"][0]["id"], order_id);

    let customers: Value = client
        .get(format!("{base}/api/Customer?orders=true"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(customers[0]["orders"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn failures_are_problem_details() {
    let base = start_server(common::memory_state().await).await;
    let client = Client::new();

    let resp = client
        .get(format!("{base}/api/Customer/999"))
        .send()
        .await
        .unwrap();
    let body = problem(resp, StatusCode::NOT_FOUND).await;
    assert_eq!(body["title"], "Not Found");

    let resp = client
        .post(format!("{base}/api/Order"))
        .header(CONTENT_TYPE, "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    problem(resp, StatusCode::BAD_REQUEST).await;

    let resp = client
        .get(format!("{base}/api/Customer/abc"))
        .send()
        .await
        .unwrap();
    problem(resp, StatusCode::BAD_REQUEST).await;

    let resp = client
        .get(format!("{base}/api/Nope"))
        .send()
        .await
        .unwrap();
    problem(resp, StatusCode::NOT_FOUND).await;
}
