//! Minimal JSON-over-HTTP/1.1 client.
//!
//! Opens one TCP connection per request and drives it with hyper's
//! connection-level client. Every request is bounded by a timeout covering
//! connect, send, and reading the full body.

use std::time::Duration;

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE, HOST, USER_AGENT};
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{ClientError, ClientResult};

const AGENT: &str = concat!("appscale/", env!("CARGO_PKG_VERSION"));

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Shared request settings.
#[derive(Debug, Clone)]
pub struct HttpClient {
    timeout: Duration,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `path` from `authority` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, authority: &str, path: &str) -> ClientResult<T> {
        let body = self.send(Method::GET, authority, path, None).await?;
        decode(authority, path, &body)
    }

    /// PUT a JSON body to `path` on `authority`. The response body is
    /// only inspected on error.
    pub async fn put_json<B: Serialize>(
        &self,
        authority: &str,
        path: &str,
        payload: &B,
    ) -> ClientResult<()> {
        let body = serde_json::to_vec(payload).map_err(|e| ClientError::Decode {
            uri: uri(authority, path),
            reason: e.to_string(),
        })?;
        self.send(Method::PUT, authority, path, Some(body)).await?;
        Ok(())
    }

    /// Perform one request and return the body of a 2xx response.
    async fn send(
        &self,
        method: Method,
        authority: &str,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> ClientResult<Bytes> {
        let uri = uri(authority, path);
        trace!(%method, %uri, "sending request");

        let target = uri.as_str();
        let has_body = body.is_some();
        let payload = Full::new(Bytes::from(body.unwrap_or_default()));

        let exchange = async move {
            let stream = tokio::net::TcpStream::connect(authority)
                .await
                .map_err(|e| transport(target, e))?;

            let io = hyper_util::rt::TokioIo::new(stream);
            let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
                .await
                .map_err(|e| transport(target, e))?;

            // Drive the connection in the background.
            tokio::spawn(async move {
                if let Err(e) = conn.await {
                    trace!(error = %e, "connection closed with error");
                }
            });

            let mut builder = Request::builder()
                .method(method)
                .uri(path)
                .header(HOST, authority)
                .header(USER_AGENT, AGENT)
                .header(ACCEPT, "application/json");
            if has_body {
                builder = builder.header(CONTENT_TYPE, "application/json");
            }
            let req = builder
                .body(payload)
                .map_err(|e| ClientError::InvalidEndpoint {
                    endpoint: target.to_string(),
                    reason: e.to_string(),
                })?;

            let resp = sender
                .send_request(req)
                .await
                .map_err(|e| transport(target, e))?;
            let status = resp.status();
            let bytes = resp
                .into_body()
                .collect()
                .await
                .map_err(|e| transport(target, e))?
                .to_bytes();

            Ok::<_, ClientError>((status, bytes))
        };

        let (status, bytes) = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ClientError::Timeout {
                    uri,
                    timeout: self.timeout,
                });
            }
        };

        if !status.is_success() {
            debug!(%uri, %status, "non-2xx response");
            return Err(status_error(uri, status, &bytes));
        }

        Ok(bytes)
    }
}

fn uri(authority: &str, path: &str) -> String {
    format!("http://{authority}{path}")
}

fn transport(uri: &str, e: impl std::fmt::Display) -> ClientError {
    ClientError::Transport {
        uri: uri.to_string(),
        reason: e.to_string(),
    }
}

fn decode<T: DeserializeOwned>(authority: &str, path: &str, body: &[u8]) -> ClientResult<T> {
    serde_json::from_slice(body).map_err(|e| ClientError::Decode {
        uri: uri(authority, path),
        reason: e.to_string(),
    })
}

fn status_error(uri: String, status: StatusCode, body: &[u8]) -> ClientError {
    let body = serde_json::from_slice(body).unwrap_or_else(|_| {
        serde_json::Value::String(String::from_utf8_lossy(body).into_owned())
    });
    ClientError::Status {
        uri,
        status: status.as_u16(),
        body,
    }
}
