//! Shared utilities for integration testing.
//!
//! Starts a mock downstream microservice and the gateway on ephemeral ports.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::{Form, Multipart, Path, Query},
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use service_gateway::config::{parse_config, GatewayConfig, HttpMethod, RouteConfig};
use service_gateway::{HttpServer, Shutdown};

/// Service URL used by the bundled `gateway.toml`.
const SAMPLE_SERVICE_URL: &str = "http://microservice.localtest.me:8002";

#[derive(Deserialize)]
struct QueryParams {
    query_int: i64,
    query_str: String,
}

#[derive(Deserialize)]
struct ExampleModel {
    example_int: i64,
    example_str: String,
}

#[derive(Deserialize)]
struct Login {
    username: String,
    password: String,
}

async fn path_param(Path(random_int): Path<String>) -> impl IntoResponse {
    (
        AppendHeaders([("x-service", "microservice")]),
        Json(json!({"foo": "bar", "custom_int": random_int})),
    )
}

async fn path_and_body(Path(path_int): Path<i64>, Json(data): Json<ExampleModel>) -> Json<Value> {
    Json(json!({
        "foo": "bar",
        "path_int": path_int,
        "example_int": data.example_int,
        "example_str": data.example_str,
    }))
}

async fn list_model() -> Json<Value> {
    Json(json!([{"foo_key": "foo"}, {"foo_key": "bar"}]))
}

async fn query(Query(q): Query<QueryParams>) -> Json<Value> {
    Json(json!({"query_int": q.query_int, "query_str": q.query_str}))
}

async fn query_and_body(Query(q): Query<QueryParams>, Json(m): Json<ExampleModel>) -> Json<Value> {
    Json(json!({
        "query_int": q.query_int,
        "query_str": q.query_str,
        "example_int": m.example_int,
        "example_str": m.example_str,
    }))
}

async fn query_and_body_path(
    Path(path): Path<i64>,
    Query(q): Query<QueryParams>,
    Json(m): Json<ExampleModel>,
) -> Json<Value> {
    Json(json!({
        "query_int": q.query_int,
        "query_str": q.query_str,
        "path": path,
        "example_int": m.example_int,
        "example_str": m.example_str,
    }))
}

async fn form_data(Form(login): Form<Login>) -> Json<Value> {
    Json(json!({"foo": "bar", "username": login.username, "password": login.password}))
}

/// Collect multipart fields: text fields by value, file fields by metadata.
async fn read_multipart(mut multipart: Multipart) -> Map<String, Value> {
    let mut fields = Map::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let size = field.bytes().await.unwrap().len();
                fields.insert(
                    name,
                    json!({"filename": filename, "content_type": content_type, "size": size}),
                );
            }
            None => {
                fields.insert(name, Value::String(field.text().await.unwrap()));
            }
        }
    }
    fields
}

async fn upload_file(multipart: Multipart) -> Json<Value> {
    let fields = read_multipart(multipart).await;
    Json(json!({
        "filename": fields["file"]["filename"],
        "file_content_type": fields["file"]["content_type"],
    }))
}

async fn form_and_upload_file(multipart: Multipart) -> Json<Value> {
    let fields = read_multipart(multipart).await;
    Json(json!({
        "username": fields["username"],
        "pwd": fields["password"],
        "filename": fields["file"]["filename"],
        "content_type": fields["file"]["content_type"],
    }))
}

async fn check_dependency_header(headers: HeaderMap) -> Json<Value> {
    let key = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    Json(json!({"header": key, "foo": "bar"}))
}

/// Echo the request headers and attach a few response headers of its own.
async fn echo_headers(headers: HeaderMap) -> impl IntoResponse {
    let echoed: Map<String, Value> = headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_string(),
                Value::String(v.to_str().unwrap_or_default().to_string()),
            )
        })
        .collect();
    (
        AppendHeaders([
            ("x-service", "microservice"),
            ("set-cookie", "a=1"),
            ("set-cookie", "b=2"),
            ("server", "mock"),
        ]),
        Json(Value::Object(echoed)),
    )
}

async fn html() -> impl IntoResponse {
    ([("content-type", "text/html")], "<h1>not json</h1>")
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({"late": true}))
}

async fn encoded() -> Json<Value> {
    Json(json!({"name": "J%C3%BCrgen", "city": "K%C3%B6ln"}))
}

async fn status(Path(code): Path<u16>) -> impl IntoResponse {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"code": code})))
}

async fn echo_query(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!(params))
}

/// Start the mock microservice. Returns its base URL.
pub async fn start_service() -> String {
    let app = Router::new()
        .route("/v1/path_param/{random_int}", get(path_param))
        .route("/v1/path_and_body/{path_int}", post(path_and_body))
        .route("/v1/list_model", get(list_model))
        .route("/v1/query", get(query))
        .route("/v1/query_and_body", post(query_and_body))
        .route("/v1/query_and_body_path/{path}", post(query_and_body_path))
        .route("/v1/form_data", post(form_data))
        .route("/v1/upload_file", post(upload_file))
        .route("/v1/form_and_upload_file", post(form_and_upload_file))
        .route("/v1/check_dependency_header", get(check_dependency_header))
        .route("/v1/headers", get(echo_headers))
        .route("/v1/html", get(html))
        .route("/v1/slow", get(slow))
        .route("/v1/encoded", get(encoded))
        .route("/v1/status/{code}", get(status))
        .route("/v1/echo_query", get(echo_query));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A URL on which nothing listens.
pub async fn closed_service_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// The bundled `gateway.toml`, pointed at `service_url`.
pub fn sample_config(service_url: &str) -> GatewayConfig {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("gateway.toml");
    let content = std::fs::read_to_string(path).unwrap();
    parse_config(&content.replace(SAMPLE_SERVICE_URL, service_url)).unwrap()
}

/// A GET route under `/extra` pointing at `service_path`.
pub fn extra_route(name: &str, gateway_path: &str, service_url: &str, service_path: &str) -> RouteConfig {
    let mut route = RouteConfig::new(name, HttpMethod::Get, gateway_path, service_url);
    route.prefix = "/extra".into();
    route.service_path = Some(service_path.into());
    route
}

/// A running gateway. Dropping it shuts the server down.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<()>,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the gateway with `config` on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });

    TestGateway {
        addr,
        shutdown,
        handle,
    }
}

/// HTTP client for talking to the gateway.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
