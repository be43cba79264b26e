//! TCP JSON-RPC client for calling a module endpoint.
//!
//! The client serializes access to the underlying stream with a tokio
//! `Mutex`, so one connection can be shared safely across async tasks.

use super::protocol::{read_frame, write_frame, RpcRequest, RpcResponse};
use crate::config::TransportConfig;
use crate::{GridError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::debug;

/// A connected JSON-RPC client.
#[derive(Debug)]
pub struct RpcClient {
    stream: Mutex<TcpStream>,
    address: String,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Connect to an endpoint address (`host:port`).
    ///
    /// Uses the transport-wide connect timeout.
    pub async fn connect(address: &str) -> Result<Self> {
        let stream = tokio::time::timeout(
            TransportConfig::CONNECT_TIMEOUT,
            TcpStream::connect(address),
        )
        .await
        .map_err(|_| GridError::ConnectTimeout {
            endpoint: address.to_string(),
        })?
        .map_err(|e| GridError::Transport {
            message: format!("failed to connect to {address}: {e}"),
        })?;

        debug!("rpc client connected to {address}");

        Ok(Self {
            stream: Mutex::new(stream),
            address: address.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Call a JSON-RPC method and return the result value.
    ///
    /// A broken connection or a JSON-RPC error response both surface as
    /// [`GridError::Transport`].
    pub async fn call(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(method, params, id);
        let request_bytes = serde_json::to_vec(&request)?;

        let mut stream = self.stream.lock().await;
        let (mut reader, mut writer) = stream.split();

        write_frame(&mut writer, &request_bytes)
            .await
            .map_err(|e| GridError::Transport {
                message: format!("send to {} failed: {e}", self.address),
            })?;

        let response_bytes = read_frame(&mut reader)
            .await
            .map_err(|e| GridError::Transport {
                message: format!("receive from {} failed: {e}", self.address),
            })?
            .ok_or_else(|| GridError::Transport {
                message: format!("{} closed the connection", self.address),
            })?;

        let response: RpcResponse =
            serde_json::from_slice(&response_bytes).map_err(|e| GridError::Json {
                message: format!("failed to parse response from {}: {e}", self.address),
                source: Some(e),
            })?;

        if let Some(err) = response.error {
            return Err(GridError::Transport {
                message: format!(
                    "{} answered '{}' with error {}: {}",
                    self.address, method, err.code, err.message
                ),
            });
        }

        response.result.ok_or_else(|| GridError::Transport {
            message: format!("{} response is missing a result", self.address),
        })
    }

    /// The address this client is connected to.
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::server::{RpcDispatch, RpcServer};
    use crate::GridError;
    use std::sync::Arc;

    struct TestDispatch;

    #[async_trait::async_trait]
    impl RpcDispatch for TestDispatch {
        async fn dispatch(
            &self,
            method: &str,
            params: serde_json::Value,
        ) -> Result<serde_json::Value> {
            match method {
                "ping" => Ok(serde_json::json!("pong")),
                "add" => {
                    let a = params["a"].as_i64().unwrap_or(0);
                    let b = params["b"].as_i64().unwrap_or(0);
                    Ok(serde_json::json!(a + b))
                }
                _ => Err(GridError::MethodNotFound {
                    method: method.to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_call_success() {
        let mut handle = RpcServer::start(Arc::new(TestDispatch)).await.unwrap();

        let client = RpcClient::connect(&handle.addr().to_string()).await.unwrap();
        let result = client.call("ping", serde_json::json!({})).await.unwrap();
        assert_eq!(result, serde_json::json!("pong"));

        handle.shutdown();
    }

    #[tokio::test]
    async fn test_call_with_params() {
        let mut handle = RpcServer::start(Arc::new(TestDispatch)).await.unwrap();

        let client = RpcClient::connect(&handle.addr().to_string()).await.unwrap();
        let result = client
            .call("add", serde_json::json!({"a": 3, "b": 4}))
            .await
            .unwrap();
        assert_eq!(result, serde_json::json!(7));

        handle.shutdown();
    }

    #[tokio::test]
    async fn test_peer_error_becomes_transport_error() {
        let mut handle = RpcServer::start(Arc::new(TestDispatch)).await.unwrap();

        let client = RpcClient::connect(&handle.addr().to_string()).await.unwrap();
        let result = client.call("nonexistent", serde_json::json!({})).await;
        assert!(matches!(result, Err(GridError::Transport { .. })));

        handle.shutdown();
    }

    #[tokio::test]
    async fn test_connect_to_dead_endpoint_fails() {
        // a port nothing is listening on
        let result = RpcClient::connect("127.0.0.1:1").await;
        assert!(result.is_err());
    }
}
