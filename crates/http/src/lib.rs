//! The HTTP/1.1 layer of wharf.
//!
//! This crate turns a byte stream into requests and responses back into
//! bytes, and drives one connection through its keep-alive loop. Routing,
//! middleware and validation live one level up, in `wharf-web`.
//!
//! # Features
//!
//! - HTTP/1.0 and HTTP/1.1 request parsing with `httparse`
//! - `Content-Length` framed bodies, decoded as JSON
//! - Keep-alive with an idle timeout and a per-request size ceiling
//! - Typed access to well-known headers, query and path parameters
//! - A registry of live connections for forced shutdown
//!
//! # Example
//!
//! ```no_run
//! use std::convert::Infallible;
//! use std::sync::Arc;
//!
//! use http::StatusCode;
//! use tokio::net::TcpListener;
//! use tracing::{Level, error, info, warn};
//! use tracing_subscriber::FmtSubscriber;
//! use wharf_http::connection::{ConnectionConfig, HttpConnection};
//! use wharf_http::handler::make_handler;
//! use wharf_http::protocol::{Request, Response};
//!
//! #[tokio::main]
//! async fn main() {
//!     let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
//!     tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
//!
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let handler = Arc::new(make_handler(hello_world));
//!
//!     loop {
//!         let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let handler = Arc::clone(&handler);
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             let connection = HttpConnection::new(reader, writer, Some(remote_addr), ConnectionConfig::default());
//!             match connection.process(handler).await {
//!                 Ok(()) => info!("finished process, connection shutdown"),
//!                 Err(e) => error!(cause = %e, "service has error, connection shutdown"),
//!             }
//!         });
//!     }
//! }
//!
//! async fn hello_world(request: Request) -> Result<Response, Infallible> {
//!     info!(path = request.path(), "receiving request");
//!     Ok(Response::text(StatusCode::OK, "Hello World!"))
//! }
//! ```
//!
//! # Architecture
//!
//! - [`connection`]: the keep-alive loop and the connection registry
//! - [`protocol`]: request, response and error types
//! - [`codec`]: `tokio_util` decoder and encoder for the wire format
//! - [`handler`]: the request handler trait
//!
//! # Error Handling
//!
//! - [`protocol::ParseError`]: the frame can't be trusted, the connection is
//!   closed without a response
//! - [`protocol::SendError`]: writing the response failed
//! - [`protocol::HttpError`]: either of the two
//!
//! # Limitations
//!
//! - No HTTP/2, TLS, chunked transfer encoding or streaming bodies
//! - Maximum number of headers: 64

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
