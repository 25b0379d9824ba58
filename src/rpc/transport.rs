//! HTTP transport for JSON-RPC requests.
//!
//! # Responsibilities
//! - POST one JSON-RPC request to one endpoint URL
//! - Hand back the raw HTTP status and body for classification
//!
//! # Design Decisions
//! - Attempt timeouts are applied by the caller, not the transport
//! - The trait returns boxed futures so it can be used as `Arc<dyn RpcTransport>`

use std::time::Duration;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::rpc::types::JsonRpcRequest;

/// Raw HTTP reply from an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to obtain any HTTP reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFailure {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Connection(String),
}

/// Sends JSON-RPC requests to endpoints.
pub trait RpcTransport: Send + Sync {
    fn send<'a>(
        &'a self,
        url: &'a str,
        request: &'a JsonRpcRequest,
    ) -> BoxFuture<'a, Result<HttpReply, TransportFailure>>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("rpc-fallback/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl RpcTransport for HttpTransport {
    fn send<'a>(
        &'a self,
        url: &'a str,
        request: &'a JsonRpcRequest,
    ) -> BoxFuture<'a, Result<HttpReply, TransportFailure>> {
        Box::pin(async move {
            let response = self
                .client
                .post(url)
                .json(request)
                .send()
                .await
                .map_err(map_reqwest_error)?;

            let status = response.status().as_u16();
            let body = response.bytes().await.map_err(map_reqwest_error)?;
            Ok(HttpReply::new(status, body.to_vec()))
        })
    }
}

fn map_reqwest_error(error: reqwest::Error) -> TransportFailure {
    if error.is_timeout() {
        TransportFailure::Timeout(Duration::ZERO)
    } else {
        TransportFailure::Connection(error.to_string())
    }
}
