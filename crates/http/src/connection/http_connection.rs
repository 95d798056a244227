use std::error::Error;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::{FutureExt, SinkExt, StreamExt};
use http::StatusCode;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error, info, warn};

use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::handler::Handler;
use crate::protocol::{HttpError, Request, Response};

/// Default ceiling for one request frame, head plus body.
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 1024 * 1024;

/// Default idle window of a kept-alive connection.
pub const DEFAULT_KEEP_ALIVE_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-connection limits.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionConfig {
    pub max_request_size: usize,
    pub keep_alive_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self { max_request_size: DEFAULT_MAX_REQUEST_SIZE, keep_alive_timeout: DEFAULT_KEEP_ALIVE_TIMEOUT }
    }
}

/// An HTTP connection serving requests one after another.
///
/// `HttpConnection` handles the full lifecycle of a connection:
/// - Reading and decoding one request frame at a time
/// - Calling the handler, turning errors and panics into a 500
/// - Deciding keep-alive and annotating the response accordingly
/// - Closing silently on idle timeout, end of stream or a malformed frame
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
    config: ConnectionConfig,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, client_addr: Option<SocketAddr>, config: ConnectionConfig) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::new(config.max_request_size, client_addr), 8 * 1024),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
            config,
        }
    }

    /// Runs the keep-alive loop until the peer leaves, asks to close or idles out.
    ///
    /// Returns `Err` only for transport faults: a frame that can't be parsed
    /// (no response is written) or a failed write.
    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
    {
        loop {
            let next = match tokio::time::timeout(self.config.keep_alive_timeout, self.framed_read.next()).await {
                Ok(next) => next,
                Err(_) => {
                    debug!(timeout = ?self.config.keep_alive_timeout, "connection idle, closing");
                    return Ok(());
                }
            };

            let request = match next {
                Some(Ok(request)) => request,
                Some(Err(e)) => {
                    warn!(cause = %e, "can't receive next request, closing connection");
                    return Err(e.into());
                }
                None => {
                    info!("cant read more request, break this connection down");
                    return Ok(());
                }
            };

            let keep_alive = request.keep_alive();
            let mut response = dispatch(handler.as_ref(), request).await;

            if keep_alive {
                response
                    .add_header("Connection", "keep-alive")
                    .add_header("Keep-Alive", format!("timeout={}", self.config.keep_alive_timeout.as_secs()));
            } else {
                response.add_header("Connection", "close");
            }

            self.framed_write.send(&response).await?;

            if !keep_alive {
                return Ok(());
            }
        }
    }
}

async fn dispatch<H: Handler>(handler: &H, request: Request) -> Response {
    match AssertUnwindSafe(handler.call(request)).catch_unwind().await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            let cause: Box<dyn Error + Send + Sync> = e.into();
            error!(cause = %cause, "handle response error");
            internal_error()
        }
        Err(_) => {
            error!("handler panicked while processing request");
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    Response::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::make_handler;
    use crate::protocol::Method;
    use std::convert::Infallible;
    use std::io;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};

    async fn echo_path(request: Request) -> Result<Response, Infallible> {
        Ok(Response::text(StatusCode::OK, request.path().to_string()))
    }

    fn spawn_connection<H: Handler + 'static>(handler: H, config: ConnectionConfig) -> (ReadHalf<DuplexStream>, WriteHalf<DuplexStream>) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (reader, writer) = tokio::io::split(server);
        tokio::spawn(async move {
            let _ = HttpConnection::new(reader, writer, None, config).process(Arc::new(handler)).await;
        });
        tokio::io::split(client)
    }

    async fn read_to_end(mut reader: ReadHalf<DuplexStream>) -> String {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_keep_alive_round_trip() {
        let (mut reader, mut writer) = spawn_connection(make_handler(echo_path), ConnectionConfig::default());

        writer.write_all(b"GET /first HTTP/1.1\r\n\r\n").await.unwrap();
        let mut buf = vec![0; 1024];
        let n = reader.read(&mut buf).await.unwrap();
        let first = String::from_utf8_lossy(&buf[..n]).to_string();
        assert!(first.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(first.contains("Connection: keep-alive\r\n"));
        assert!(first.contains("Keep-Alive: timeout=30\r\n"));
        assert!(first.ends_with("/first"));

        writer.write_all(b"GET /second HTTP/1.1\r\nConnection: close\r\n\r\n").await.unwrap();
        let second = read_to_end(reader).await;
        assert!(second.contains("Connection: close\r\n"));
        assert!(second.ends_with("/second"));
    }

    #[tokio::test]
    async fn test_http10_closes() {
        let (reader, mut writer) = spawn_connection(make_handler(echo_path), ConnectionConfig::default());

        writer.write_all(b"GET /old HTTP/1.0\r\n\r\n").await.unwrap();
        let response = read_to_end(reader).await;
        assert!(response.contains("Connection: close\r\n"));
    }

    #[tokio::test]
    async fn test_malformed_request_closes_without_response() {
        let (reader, mut writer) = spawn_connection(make_handler(echo_path), ConnectionConfig::default());

        writer.write_all(b"BREW /pot HTTP/1.1\r\n\r\n").await.unwrap();
        let response = read_to_end(reader).await;
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_too_large_closes_without_response() {
        let config = ConnectionConfig { max_request_size: 64, ..ConnectionConfig::default() };
        let (reader, mut writer) = spawn_connection(make_handler(echo_path), config);

        writer.write_all(b"POST /upload HTTP/1.1\r\nContent-Length: 4096\r\n\r\n").await.unwrap();
        let response = read_to_end(reader).await;
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_idle_timeout_closes() {
        let config = ConnectionConfig { keep_alive_timeout: Duration::from_millis(50), ..ConnectionConfig::default() };
        let (reader, _writer) = spawn_connection(make_handler(echo_path), config);

        let response = read_to_end(reader).await;
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_handler_error_becomes_500() {
        let handler = make_handler(|_request: Request| async { Err::<Response, _>(io::Error::other("db down")) });
        let (reader, mut writer) = spawn_connection(handler, ConnectionConfig::default());

        writer.write_all(b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n").await.unwrap();
        let response = read_to_end(reader).await;
        assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(response.ends_with(r#"{"error":{"code":500,"message":"Internal Server Error"}}"#));
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_500() {
        let handler = make_handler(|request: Request| async move {
            if request.method() == Method::Get {
                panic!("boom");
            }
            Ok::<_, Infallible>(Response::new(StatusCode::NO_CONTENT))
        });
        let (reader, mut writer) = spawn_connection(handler, ConnectionConfig::default());

        writer.write_all(b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n").await.unwrap();
        let response = read_to_end(reader).await;
        assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    }
}
