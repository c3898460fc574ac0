//! Fixture HTTP server for exercising clients end to end.
//!
//! Routes:
//! - `/status/{code}` answers with the given status and a short text body.
//! - `/empty` answers 200 with no body.
//! - `/echo` reflects method, query, headers and body back as JSON.
//! - `/delay/{ms}` sleeps before answering 200.
//! - `/redirect` answers 302 pointing at `/echo`.
//! - `/garbage` answers 200 with a body that is not JSON.
//! - `/items` and `/items/{id}` are a tiny in-memory JSON resource.
//! - `/wrapped/items` returns the item list under a `data` root key.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
}

#[derive(Deserialize)]
pub struct NewItem {
    pub name: String,
}

/// What `/echo` saw. Header names are lower-cased by the HTTP stack.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Item>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/status/{code}", any(status))
        .route("/empty", get(empty))
        .route("/echo", any(echo))
        .route("/delay/{ms}", get(delay))
        .route("/redirect", get(redirect))
        .route("/garbage", get(garbage))
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", get(get_item))
        .route("/wrapped/items", get(wrapped_items))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn status(Path(code): Path<u16>) -> Response {
    match StatusCode::from_u16(code) {
        Ok(status) if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED => {
            status.into_response()
        }
        Ok(status) => (status, format!("status {code}")).into_response(),
        Err(_) => (StatusCode::BAD_REQUEST, "invalid status code").into_response(),
    }
}

async fn empty() -> StatusCode {
    StatusCode::OK
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.as_str().to_string(), value.to_string()))
        })
        .collect();
    Json(Echo {
        method: method.to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn delay(Path(ms): Path<u64>) -> &'static str {
    debug!(ms, "delaying response");
    tokio::time::sleep(Duration::from_millis(ms)).await;
    "done"
}

async fn redirect() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/echo")])
}

async fn garbage() -> &'static str {
    "definitely { not json"
}

async fn list_items(State(db): State<Db>) -> Json<Vec<Item>> {
    let items = db.read().await;
    let mut items: Vec<Item> = items.values().cloned().collect();
    items.sort_by(|a, b| a.name.cmp(&b.name));
    Json(items)
}

async fn create_item(State(db): State<Db>, Json(input): Json<NewItem>) -> (StatusCode, Json<Item>) {
    let item = Item {
        id: Uuid::new_v4(),
        name: input.name,
    };
    db.write().await.insert(item.id, item.clone());
    (StatusCode::CREATED, Json(item))
}

async fn get_item(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Json<Item>, StatusCode> {
    let items = db.read().await;
    items.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn wrapped_items(State(db): State<Db>) -> Json<serde_json::Value> {
    let Json(items) = list_items(State(db)).await;
    let count = items.len();
    Json(serde_json::json!({ "data": items, "count": count }))
}
