//! Routing, middleware and request body validation on top of `wharf-http`.
//!
//! ```no_run
//! use http::StatusCode;
//! use wharf_web::middleware::AccessLog;
//! use wharf_web::router::get;
//! use wharf_web::{App, Error, Router, Server, handler_fn};
//! use wharf_http::protocol::{Request, Response};
//!
//! async fn hello(req: Request) -> Result<Response, Error> {
//!     let name = req.path_params().get("name").unwrap_or("world");
//!     Ok(Response::text(StatusCode::OK, format!("hello {name}")))
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = App::builder()
//!         .middleware(AccessLog)
//!         .get("/", handler_fn(hello))
//!         .router(Router::builder("/greet").route("/{name}", get(handler_fn(hello))).build())
//!         .build();
//!
//!     let server = Server::builder().app(app).port(8080).build().unwrap();
//!     if let Err(e) = server.start().await {
//!         eprintln!("{e}");
//!     }
//! }
//! ```

mod app;
mod config;
mod error;
mod handler;
mod server;

pub mod middleware;
pub mod router;
pub mod schema;

pub use app::App;
pub use app::AppBuilder;
pub use app::Registrable;
pub use config::ServerConfig;
pub use error::Error;
pub use error::HttpException;
pub use handler::FnHandler;
pub use handler::ModelHandler;
pub use handler::RequestHandler;
pub use handler::handler_fn;
pub use handler::with_model;
pub use router::Router;
pub use server::Listener;
pub use server::Server;
pub use server::ServerBuildError;
pub use server::ServerBuilder;
pub use server::ServerError;
pub use server::ShutdownHandle;
