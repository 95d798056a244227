//! HTTP connection handling module
//!
//! - [`HttpConnection`]: serves one accepted socket. It reads a request frame,
//!   calls the handler, writes the response and either loops (keep-alive) or
//!   closes. Idle timeout, end of stream and malformed frames close silently.
//! - [`ConnectionRegistry`]: the set of live connection tasks, used to
//!   force-close outstanding connections on shutdown.

mod http_connection;
mod registry;

pub use http_connection::{ConnectionConfig, DEFAULT_KEEP_ALIVE_TIMEOUT, DEFAULT_MAX_REQUEST_SIZE, HttpConnection};
pub use registry::ConnectionRegistry;
