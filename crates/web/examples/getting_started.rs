use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::json;
use wharf_http::protocol::{Request, Response};
use wharf_web::middleware::{AccessLog, BodyLimit, Guard, GuardStrategy, RateLimit};
use wharf_web::router::{get, post};
use wharf_web::schema::{Email, Field, FieldType, Length, Model, NotNull, Password, Schema};
use wharf_web::{App, Error, HttpException, Router, Server, handler_fn, with_model};

#[derive(Deserialize, Debug)]
pub struct SignUp {
    name: String,
    email: String,
    #[allow(dead_code, reason = "validated, never echoed")]
    password: String,
}

static SIGN_UP: Lazy<Arc<Schema>> = Lazy::new(|| {
    Schema::builder("SignUp")
        .field(Field::new("name", FieldType::String).validator(NotNull).validator(Length::between(2, 64)))
        .field(Field::new("email", FieldType::String).validator(NotNull).validator(Email))
        .field(Field::new("password", FieldType::String).validator(NotNull).validator(Password::new()))
        .build()
});

impl Model for SignUp {
    fn schema() -> Arc<Schema> {
        Arc::clone(&SIGN_UP)
    }
}

// curl -v http://127.0.0.1:8080/
async fn hello(_req: Request) -> Result<Response, Error> {
    Ok(Response::text(StatusCode::OK, "hello world"))
}

// curl -v http://127.0.0.1:8080/users/42
async fn show_user(req: Request) -> Result<Response, Error> {
    match req.path_params().get("id") {
        Some("0") => Err(HttpException::resource_not_found("User").into()),
        Some(id) => Ok(Response::json(StatusCode::OK, &json!({"id": id}))),
        None => Err(HttpException::bad_request("missing id").into()),
    }
}

// curl -v -H 'Content-Type: application/json' -d '{"name":"Ann","email":"ann@example.com","password":"S3cret!pw"}' http://127.0.0.1:8080/users
async fn sign_up(_req: Request, form: SignUp) -> Result<Response, Error> {
    Ok(Response::json(StatusCode::CREATED, &json!({"name": form.name, "email": form.email})))
}

// curl -v -H 'Authorization: Bearer letmein' http://127.0.0.1:8080/admin/stats
async fn stats(_req: Request) -> Result<Response, Error> {
    Ok(Response::json(StatusCode::OK, &json!({"uptime": "ok"})))
}

#[tokio::main]
async fn main() {
    let users = Router::builder("/users")
        .route("/{id}", get(handler_fn(show_user)))
        .route("/", post(with_model(sign_up)))
        .middleware(BodyLimit::new(16 * 1024))
        .build();

    let admin = Router::builder("/admin")
        .middleware(Guard::new(GuardStrategy::Bearer("letmein".to_string())))
        .route("/stats", get(handler_fn(stats)))
        .build();

    let app = App::builder()
        .middleware(AccessLog)
        .middleware(RateLimit::new(100, Duration::from_secs(60)))
        .get("/", handler_fn(hello))
        .router(users)
        .router(admin)
        .build();

    let server = match Server::builder().app(app).port(8080).build() {
        Ok(server) => server,
        Err(e) => {
            eprintln!("{e}");
            return;
        }
    };

    if let Err(e) = server.start().await {
        eprintln!("{e}");
    }
}
