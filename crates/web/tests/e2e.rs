use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use indoc::indoc;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use wharf_http::protocol::{Request, Response};
use wharf_web::router::{get, post};
use wharf_web::schema::{Field, FieldType, Length, Model, NotNull, Range, Schema};
use wharf_web::{App, Error, Router, Server, ShutdownHandle, handler_fn, with_model};

#[derive(Debug, Deserialize)]
struct NewUser {
    name: String,
    age: i64,
}

static NEW_USER_SCHEMA: Lazy<Arc<Schema>> = Lazy::new(|| {
    Schema::builder("NewUser")
        .field(Field::new("name", FieldType::String).validator(NotNull).validator(Length::min(3)))
        .field(Field::new("age", FieldType::Integer).validator(Range::between(0, 130)))
        .build()
});

impl Model for NewUser {
    fn schema() -> Arc<Schema> {
        Arc::clone(&NEW_USER_SCHEMA)
    }
}

async fn echo_path(req: Request) -> Result<Response, Error> {
    Ok(Response::text(StatusCode::OK, req.path().to_string()))
}

async fn show_user(req: Request) -> Result<Response, Error> {
    let id = req.path_params().get("id").unwrap_or_default();
    Ok(Response::json(StatusCode::OK, &json!({"id": id})))
}

async fn create_user(_req: Request, user: NewUser) -> Result<Response, Error> {
    Ok(Response::json(StatusCode::CREATED, &json!({"name": user.name, "age": user.age})))
}

async fn start() -> (SocketAddr, ShutdownHandle) {
    let app = App::builder()
        .get("/items", handler_fn(echo_path))
        .router(
            Router::builder("/users")
                .route("/{id}", get(handler_fn(show_user)))
                .route("/", post(with_model(create_user)))
                .build(),
        )
        .build();

    let listener = Server::builder()
        .app(app)
        .port(0)
        .keep_alive_timeout(Duration::from_secs(5))
        .build()
        .unwrap()
        .listen()
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = listener.shutdown_handle();
    tokio::spawn(listener.serve());
    (addr, shutdown)
}

struct RawResponse {
    head: String,
    body: String,
}

impl RawResponse {
    fn status(&self) -> u16 {
        self.head.split(' ').nth(1).unwrap().parse().unwrap()
    }

    fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Reads exactly one response framed by its Content-Length.
async fn read_response(stream: &mut TcpStream) -> RawResponse {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before the head was complete");
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8(buf[..head_end].to_vec()).unwrap();
    let content_length: usize = head
        .lines()
        .find_map(|line| line.strip_prefix("Content-Length: "))
        .map(|value| value.trim().parse().unwrap())
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before the body was complete");
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = String::from_utf8(buf[head_end..head_end + content_length].to_vec()).unwrap();
    RawResponse { head, body }
}

#[tokio::test]
async fn test_keep_alive_round_trip() {
    let (addr, _shutdown) = start().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream.write_all(b"GET /items HTTP/1.1\r\nHost: localhost\r\n\r\n").await.unwrap();
    let first = read_response(&mut stream).await;
    assert_eq!(first.status(), 200);
    assert!(first.head.contains("Connection: keep-alive\r\n"));
    assert!(first.head.contains("Keep-Alive: timeout=5\r\n"));
    assert_eq!(first.body, "/items");

    stream.write_all(b"GET /users/7 HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").await.unwrap();
    let second = read_response(&mut stream).await;
    assert_eq!(second.status(), 200);
    assert!(second.head.contains("Connection: close\r\n"));
    assert_eq!(second.json(), json!({"id": "7"}));

    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());
}

#[tokio::test]
async fn test_not_found_and_method_not_allowed() {
    let (addr, _shutdown) = start().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream.write_all(b"GET /missing HTTP/1.1\r\n\r\n").await.unwrap();
    let missing = read_response(&mut stream).await;
    assert_eq!(missing.status(), 404);
    assert_eq!(missing.json(), json!({"error": {"code": 404, "message": "Route '/missing' not found for method GET"}}));

    stream.write_all(b"POST /items HTTP/1.1\r\n\r\n").await.unwrap();
    let mismatch = read_response(&mut stream).await;
    assert_eq!(mismatch.status(), 405);
    assert_eq!(mismatch.json(), json!({"error": {"code": 405, "message": "Method 'POST' is not allowed for '/items'."}}));
}

#[tokio::test]
async fn test_trailing_slash() {
    let (addr, _shutdown) = start().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream.write_all(b"GET /items/ HTTP/1.1\r\n\r\n").await.unwrap();
    let response = read_response(&mut stream).await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_validation_errors_in_one_response() {
    let (addr, _shutdown) = start().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let request = indoc! {r#"
        POST /users HTTP/1.1
        Content-Type: application/json
        Content-Length: 24

        {"name": "", "age": 200}"#};
    stream.write_all(request.replace('\n', "\r\n").as_bytes()).await.unwrap();

    let response = read_response(&mut stream).await;
    assert_eq!(response.status(), 400);

    let body = response.json();
    assert_eq!(body["error"]["type"], "SCHEMA_VALIDATION_ERROR");
    assert_eq!(body["error"]["model"], "NewUser");
    assert_eq!(body["error"]["count"], 2);
    assert_eq!(body["error"]["errors"][0]["field"], "name");
    assert_eq!(body["error"]["errors"][1]["field"], "age");
}

#[tokio::test]
async fn test_type_mismatch_skips_constraints() {
    let (addr, _shutdown) = start().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let body = r#"{"name": "Ann", "age": "not-a-number"}"#;
    let request = format!("POST /users HTTP/1.1\r\nContent-Length: {}\r\n\r\n{body}", body.len());
    stream.write_all(request.as_bytes()).await.unwrap();

    let response = read_response(&mut stream).await;
    let body = response.json();
    assert_eq!(body["error"]["count"], 1);
    assert_eq!(body["error"]["errors"][0]["code"], "TYPE_MISMATCH");
    assert_eq!(body["error"]["errors"][0]["field"], "age");
}

#[tokio::test]
async fn test_valid_model_is_bound() {
    let (addr, _shutdown) = start().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let body = r#"{"name": "Ann", "age": 30}"#;
    let request = format!("POST /users/ HTTP/1.1\r\nContent-Length: {}\r\n\r\n{body}", body.len());
    stream.write_all(request.as_bytes()).await.unwrap();

    let response = read_response(&mut stream).await;
    assert_eq!(response.status(), 201);
    assert_eq!(response.json(), json!({"name": "Ann", "age": 30}));
}

#[tokio::test]
async fn test_malformed_request_closes_connection() {
    let (addr, _shutdown) = start().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream.write_all(b"FETCH /items HTTP/1.1\r\n\r\n").await.unwrap();
    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());
}

#[tokio::test]
async fn test_shutdown_closes_open_connections() {
    let (addr, shutdown) = start().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream.write_all(b"GET /items HTTP/1.1\r\n\r\n").await.unwrap();
    read_response(&mut stream).await;
    assert_eq!(shutdown.open_connections(), 1);

    assert_eq!(shutdown.shutdown(), 1);

    let mut rest = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(1), stream.read_to_end(&mut rest)).await;
    assert!(matches!(read, Ok(Ok(0)) | Ok(Err(_))));
}
