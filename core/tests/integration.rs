//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives typed requests
//! through `Client` and the real `UreqTransport`. Validates request building,
//! classification and decoding over actual HTTP.

use std::time::Duration;

use courier_core::{
    Client, ClientError, DecodeError, FailureKind, HeaderName, HeaderValue, HttpMethod, QueryItem,
    Request, TransportConfig, UreqTransport,
};
use mock_server::{Echo, Item};
use serde::Serialize;
use tokio::sync::oneshot;

async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    format!("http://{addr}")
}

fn client() -> Client {
    Client::new(UreqTransport::default())
}

fn kind<T: std::fmt::Debug, E: std::fmt::Debug>(result: Result<T, ClientError<E>>) -> FailureKind {
    result.unwrap_err().kind().expect("expected a network error")
}

#[derive(Serialize)]
struct NewItem<'a> {
    name: &'a str,
}

#[tokio::test(flavor = "multi_thread")]
async fn item_lifecycle() {
    let base = start_server().await;
    let client = client();

    // Step 1: list is empty.
    let items = client.execute(&Request::<Vec<Item>>::json(format!("{base}/items"))).await.unwrap();
    assert!(items.is_empty(), "expected empty list");

    // Step 2: create.
    let create = Request::<Item>::json(format!("{base}/items"))
        .with_method(HttpMethod::Post)
        .with_json_body(&NewItem { name: "widget" })
        .unwrap();
    let created = client.execute(&create).await.unwrap();
    assert_eq!(created.name, "widget");

    // Step 3: fetch it back.
    let fetched = client
        .execute(&Request::<Item>::json(format!("{base}/items/{}", created.id)))
        .await
        .unwrap();
    assert_eq!(fetched, created);

    // Step 4: list through a root decoding key.
    let wrapped = client
        .execute(&Request::<Vec<Item>>::json_at_key(format!("{base}/wrapped/items"), "data"))
        .await
        .unwrap();
    assert_eq!(wrapped, vec![created]);

    // Step 5: unknown id is a client error carrying the response.
    let missing = format!("{base}/items/00000000-0000-0000-0000-000000000000");
    let err = client.execute(&Request::<Item>::json(missing)).await.unwrap_err();
    assert_eq!(err.kind(), Some(FailureKind::ClientError(404)));
    assert_eq!(err.response().map(|r| r.code), Some(404));

    assert_eq!(client.in_flight_count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn built_request_reaches_the_server_intact() {
    let base = start_server().await;
    let request = Request::<Echo>::json(format!("{base}/echo"))
        .with_method(HttpMethod::Put)
        .with_query([
            QueryItem::new("param1", Some("param1value")),
            QueryItem::new("param2", Some("param2 value")),
            QueryItem::flag("param3"),
        ])
        .with_header(HeaderName::CONTENT_TYPE, HeaderValue::TEXT_PLAIN)
        .with_header("X-Trace", "abc")
        .with_body("Test");

    let echo = client().execute(&request).await.unwrap();
    assert_eq!(echo.method, "PUT");
    assert_eq!(echo.query.as_deref(), Some("param1=param1value&param2=param2%20value&param3"));
    assert_eq!(echo.headers.get("content-type").map(String::as_str), Some("text/plain"));
    assert_eq!(echo.headers.get("x-trace").map(String::as_str), Some("abc"));
    assert_eq!(echo.body, "Test");
}

#[tokio::test(flavor = "multi_thread")]
async fn status_codes_are_classified() {
    let base = start_server().await;
    let client = client();

    let err = client.execute(&Request::text(format!("{base}/status/418"))).await.unwrap_err();
    assert_eq!(err.kind(), Some(FailureKind::ClientError(418)));
    assert_eq!(err.response().and_then(|r| r.body.clone()).as_deref(), Some(&b"status 418"[..]));

    assert_eq!(
        kind(client.execute(&Request::text(format!("{base}/status/503"))).await),
        FailureKind::ServerError(503)
    );
    assert_eq!(
        kind(client.execute(&Request::text(format!("{base}/status/204"))).await),
        FailureKind::NoData
    );
    assert_eq!(
        kind(client.execute(&Request::text(format!("{base}/empty"))).await),
        FailureKind::NoData
    );

    let ok = client.execute(&Request::text(format!("{base}/status/200"))).await.unwrap();
    assert_eq!(ok, "status 200");
}

#[tokio::test(flavor = "multi_thread")]
async fn undecodable_body_is_a_data_transformation_error() {
    let base = start_server().await;
    let err = client()
        .execute(&Request::<Item>::json(format!("{base}/garbage")))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::DataTransformation(DecodeError::Json(_))));
    assert_eq!(err.kind(), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn redirects_follow_transport_config() {
    let base = start_server().await;

    let config = TransportConfig::default().with_follow_redirects(false);
    let strict = Client::new(UreqTransport::new(config));
    assert_eq!(
        kind(strict.execute(&Request::text(format!("{base}/redirect"))).await),
        FailureKind::Redirection
    );

    let echo = client().execute(&Request::<Echo>::json(format!("{base}/redirect"))).await.unwrap();
    assert_eq!(echo.method, "GET");
}

#[tokio::test(flavor = "multi_thread")]
async fn oversized_body_is_a_transport_failure() {
    let base = start_server().await;
    let config = TransportConfig::default().with_max_body_size(4);
    let client = Client::new(UreqTransport::new(config));

    // "status 200" is ten bytes, over the four byte limit.
    let err = client
        .execute(&Request::text(format!("{base}/status/200")))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(FailureKind::UnknownTransportError));
    assert!(err.response().is_none());

    // Bodies within the limit still decode.
    let config = TransportConfig::default().with_max_body_size(64);
    let client = Client::new(UreqTransport::new(config));
    let ok = client
        .execute(&Request::text(format!("{base}/status/200")))
        .await
        .unwrap();
    assert_eq!(ok, "status 200");
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_response_times_out() {
    let base = start_server().await;
    let request =
        Request::text(format!("{base}/delay/3000")).with_timeout(Duration::from_millis(200));
    assert_eq!(kind(client().execute(&request).await), FailureKind::TimedOut);
}

#[tokio::test(flavor = "multi_thread")]
async fn refused_connection_is_no_connection() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let request = Request::text(format!("http://{addr}/")).with_timeout(Duration::from_secs(2));
    assert_eq!(kind(client().execute(&request).await), FailureKind::NoConnection);
}

#[tokio::test(flavor = "multi_thread")]
async fn cancel_right_after_execute() {
    let base = start_server().await;
    let client = client();
    let request = Request::text(format!("{base}/delay/1000"));

    let pending = client.execute(&request);
    client.cancel(&request);
    assert_eq!(client.in_flight_count(), 0);

    let err = pending.await.unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test(flavor = "multi_thread")]
async fn callback_delivery() {
    let base = start_server().await;
    let client = client();
    let (tx, rx) = oneshot::channel();

    client.execute_with(&Request::text(format!("{base}/status/201")), move |result| {
        let _ = tx.send(result);
    });

    let body = rx.await.unwrap().unwrap();
    assert_eq!(body, "status 201");
}
