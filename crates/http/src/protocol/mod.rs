//! Core HTTP protocol types.
//!
//! - [`Method`]: the supported request methods
//! - [`Request`] / [`RequestHead`]: parsed inbound messages, with typed
//!   well-known headers, query and path [`Params`] and an [`Authorization`]
//!   accessor
//! - [`Response`] / [`ResponseBody`]: outbound messages with ordered [`Headers`]
//! - [`HttpError`], [`ParseError`], [`SendError`]: transport faults
//!
//! The protocol module is typically used through the connection layer rather
//! than directly; handlers only see [`Request`] and return [`Response`].

mod auth;
pub use auth::Authorization;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;

mod header;
pub use header::Headers;

mod method;
pub use method::Method;

mod params;
pub use params::Params;

mod request;
pub use request::Request;
pub use request::RequestHead;

mod response;
pub use response::Response;
pub use response::ResponseBody;
