use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo, Item};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

// --- status ---

#[tokio::test]
async fn status_outside_standard_ranges() {
    let resp = app().oneshot(get("/status/600")).await.unwrap();
    assert_eq!(resp.status().as_u16(), 600);
}

#[tokio::test]
async fn status_rejects_non_numeric_code() {
    let resp = app().oneshot(get("/status/teapot")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- echo ---

#[tokio::test]
async fn echo_without_query_or_body() {
    let resp = app().oneshot(get("/echo")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "GET");
    assert!(echo.query.is_none());
    assert!(echo.body.is_empty());
}

// --- delay / garbage ---

#[tokio::test]
async fn delay_eventually_answers() {
    let resp = app().oneshot(get("/delay/5")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(&body_bytes(resp).await[..], b"done");
}

#[tokio::test]
async fn garbage_is_not_json() {
    let resp = app().oneshot(get("/garbage")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    assert!(serde_json::from_slice::<serde_json::Value>(&bytes).is_err());
}

// --- items ---

#[tokio::test]
async fn create_item_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/items", r#"{"title":1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_item_bad_uuid_returns_400() {
    let resp = app().oneshot(get("/items/not-a-uuid")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn item_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/items", r#"{"name":"bolt"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Item = body_json(resp).await;
    assert_eq!(created.name, "bolt");
    let id = created.id;

    // get
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/items/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Item = body_json(resp).await;
    assert_eq!(fetched, created);

    // list
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/items"))
        .await
        .unwrap();
    let items: Vec<Item> = body_json(resp).await;
    assert_eq!(items, vec![created.clone()]);

    // wrapped list
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/wrapped/items"))
        .await
        .unwrap();
    let wrapped: serde_json::Value = body_json(resp).await;
    assert_eq!(wrapped["count"], 1);
    assert_eq!(wrapped["data"][0]["name"], "bolt");

    // unknown id
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/items/00000000-0000-0000-0000-000000000000"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
