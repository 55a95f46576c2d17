use std::{collections::BTreeMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: u64,
    pub name: String,
}

#[derive(Deserialize)]
pub struct CreateItem {
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
}

pub type Db = Arc<RwLock<BTreeMap<u64, Item>>>;

/// The item seeded into every fresh server.
pub fn seed_item() -> Item {
    Item {
        id: 5,
        name: "Widget".to_string(),
    }
}

pub fn app() -> Router {
    let seed = seed_item();
    let db: Db = Arc::new(RwLock::new(BTreeMap::from([(seed.id, seed)])));
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", get(get_item))
        .route("/echo/headers", get(echo_headers))
        .route("/echo/body", post(echo_body))
        .route("/faults/empty", get(fault_empty))
        .route("/faults/garbage", get(fault_garbage))
        .route("/faults/latin1", get(fault_latin1))
        .route("/faults/bogus-charset", get(fault_bogus_charset))
        .route("/faults/teapot", get(fault_teapot))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

fn api_error(status: StatusCode, message: &str) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            code: status.as_u16(),
            message: message.to_string(),
        }),
    )
}

async fn list_items(State(db): State<Db>) -> Json<Vec<Item>> {
    let items = db.read().await;
    Json(items.values().cloned().collect())
}

async fn create_item(
    State(db): State<Db>,
    Json(input): Json<CreateItem>,
) -> (StatusCode, Json<Item>) {
    let mut items = db.write().await;
    let id = items.keys().next_back().map_or(1, |last| last + 1);
    let item = Item {
        id,
        name: input.name,
    };
    items.insert(id, item.clone());
    tracing::debug!(id, "created item");
    (StatusCode::CREATED, Json(item))
}

async fn get_item(State(db): State<Db>, Path(id): Path<u64>) -> Response {
    let items = db.read().await;
    match items.get(&id) {
        Some(item) => (
            [
                (header::CACHE_CONTROL, "max-age=60".to_string()),
                (header::ETAG, format!("\"item-{id}\"")),
            ],
            Json(item.clone()),
        )
            .into_response(),
        None => api_error(StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

async fn echo_headers(headers: HeaderMap) -> Json<BTreeMap<String, String>> {
    Json(
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect(),
    )
}

async fn echo_body(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    Json(json!({ "content_type": content_type, "body": body }))
}

async fn fault_empty() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn fault_garbage() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], "not json")
}

/// `{"id":9,"name":"Café"}` encoded as ISO-8859-1.
async fn fault_latin1() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json; charset=ISO-8859-1")],
        Bytes::from_static(b"{\"id\":9,\"name\":\"Caf\xE9\"}"),
    )
}

async fn fault_bogus_charset() -> impl IntoResponse {
    (
        StatusCode::BAD_REQUEST,
        [(header::CONTENT_TYPE, "application/json; charset=x-klingon")],
        r#"{"code":400,"message":"bad request"}"#,
    )
}

async fn fault_teapot() -> impl IntoResponse {
    api_error(StatusCode::IM_A_TEAPOT, "short and stout")
}
