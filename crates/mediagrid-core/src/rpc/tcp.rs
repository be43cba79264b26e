//! TCP implementation of the RPC transport capability.
//!
//! A session caches one connection per endpoint for its lifetime and drops
//! them all when it goes out of scope. The typed-proxy cast is realized as
//! an `rpc.interfaces` handshake: the peer advertises the interface kinds it
//! serves, and requesting one it lacks fails with a cast error.

use super::client::RpcClient;
use super::protocol::methods;
use crate::messaging::{
    interfaces, Endpoint, Message, MessagingProxy, ModulesProxy, RpcSession, RpcTransport,
};
use crate::{GridError, Result};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Transport that reaches module endpoints over TCP JSON-RPC.
///
/// Holds no connections itself; those belong to the sessions it opens.
#[derive(Debug, Default)]
pub struct TcpTransport;

impl TcpTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RpcTransport for TcpTransport {
    async fn open_session(&self) -> Result<Box<dyn RpcSession>> {
        Ok(Box::new(TcpSession {
            clients: Mutex::new(HashMap::new()),
        }))
    }
}

/// One open session: a connection cache scoped to the session's lifetime.
struct TcpSession {
    clients: Mutex<HashMap<Endpoint, Arc<RpcClient>>>,
}

impl TcpSession {
    async fn client(&self, endpoint: &Endpoint) -> Result<Arc<RpcClient>> {
        let mut clients = self.clients.lock().await;
        if let Some(client) = clients.get(endpoint) {
            return Ok(client.clone());
        }
        let client = Arc::new(RpcClient::connect(endpoint.as_str()).await?);
        clients.insert(endpoint.clone(), client.clone());
        Ok(client)
    }

    /// Connect and verify the peer serves the requested interface.
    async fn cast(&self, endpoint: &Endpoint, interface: &str) -> Result<Arc<RpcClient>> {
        let client = self.client(endpoint).await?;

        let advertised = client.call(methods::INTERFACES, json!({})).await?;
        let supported: Vec<String> = serde_json::from_value(advertised)?;
        if !supported.iter().any(|kind| kind == interface) {
            return Err(GridError::ProxyCast {
                endpoint: endpoint.to_string(),
                interface: interface.to_string(),
            });
        }

        Ok(client)
    }
}

#[async_trait]
impl RpcSession for TcpSession {
    async fn messaging_proxy(&self, endpoint: &Endpoint) -> Result<Box<dyn MessagingProxy>> {
        let client = self.cast(endpoint, interfaces::MESSAGING).await?;
        Ok(Box::new(TcpMessagingProxy { client }))
    }

    async fn modules_proxy(&self, endpoint: &Endpoint) -> Result<Box<dyn ModulesProxy>> {
        let client = self.cast(endpoint, interfaces::MODULES).await?;
        Ok(Box::new(TcpModulesProxy { client }))
    }
}

struct TcpMessagingProxy {
    client: Arc<RpcClient>,
}

#[async_trait]
impl MessagingProxy for TcpMessagingProxy {
    async fn ping(&self) -> Result<()> {
        self.client.call(methods::PING, json!({})).await.map(|_| ())
    }

    async fn message_template(&self, message_id: Uuid) -> Result<Message> {
        let value = self
            .client
            .call(methods::TEMPLATE, json!({ "message": message_id.to_string() }))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn send_sync(&self, message: Message) -> Result<Message> {
        let value = self
            .client
            .call(methods::SEND, json!({ "message": message }))
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}

struct TcpModulesProxy {
    client: Arc<RpcClient>,
}

#[async_trait]
impl ModulesProxy for TcpModulesProxy {
    async fn is_loaded(&self, module: Uuid) -> Result<bool> {
        let value = self
            .client
            .call(methods::IS_LOADED, json!({ "module": module.to_string() }))
            .await?;
        value.as_bool().ok_or_else(|| GridError::Transport {
            message: format!("{} returned a non-boolean load state", self.client.address()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::{MessageSink, MessagingService};
    use crate::rpc::server::RpcServer;

    struct EchoSink;

    #[async_trait]
    impl MessageSink for EchoSink {
        async fn message_template(&self, message_id: Uuid) -> Option<Message> {
            Some(Message::template(message_id))
        }

        async fn handle(&self, message: Message) -> Result<Message> {
            Ok(message)
        }
    }

    #[tokio::test]
    async fn test_cast_rejects_missing_interface() {
        // messaging-only endpoint: the modules cast must fail
        let service = Arc::new(MessagingService::new(Arc::new(EchoSink)));
        let mut handle = RpcServer::start(service).await.unwrap();
        let endpoint = Endpoint::new(handle.addr().to_string());

        let transport = TcpTransport::new();
        let session = transport.open_session().await.unwrap();

        assert!(session.messaging_proxy(&endpoint).await.is_ok());
        let result = session.modules_proxy(&endpoint).await;
        assert!(matches!(result, Err(GridError::ProxyCast { .. })));

        handle.shutdown();
    }

    #[tokio::test]
    async fn test_ping_and_send_roundtrip() {
        let service = Arc::new(MessagingService::with_modules_admin(Arc::new(EchoSink)));
        let module = Uuid::new_v4();
        service.set_loaded(module, true);

        let mut handle = RpcServer::start(service).await.unwrap();
        let endpoint = Endpoint::new(handle.addr().to_string());

        let transport = TcpTransport::new();
        let session = transport.open_session().await.unwrap();

        let messaging = session.messaging_proxy(&endpoint).await.unwrap();
        messaging.ping().await.unwrap();

        let mut message = messaging.message_template(Uuid::new_v4()).await.unwrap();
        message.set("volume", json!(11));
        let reply = messaging.send_sync(message.clone()).await.unwrap();
        assert_eq!(reply, message);

        let modules = session.modules_proxy(&endpoint).await.unwrap();
        assert!(modules.is_loaded(module).await.unwrap());
        assert!(!modules.is_loaded(Uuid::new_v4()).await.unwrap());

        handle.shutdown();
    }

    #[tokio::test]
    async fn test_session_reuses_connections() {
        let service = Arc::new(MessagingService::new(Arc::new(EchoSink)));
        let mut handle = RpcServer::start(service).await.unwrap();
        let endpoint = Endpoint::new(handle.addr().to_string());

        let transport = TcpTransport::new();
        let session = transport.open_session().await.unwrap();

        let first = session.messaging_proxy(&endpoint).await.unwrap();
        let second = session.messaging_proxy(&endpoint).await.unwrap();
        first.ping().await.unwrap();
        second.ping().await.unwrap();

        handle.shutdown();
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails_cast() {
        let transport = TcpTransport::new();
        let session = transport.open_session().await.unwrap();

        let endpoint = Endpoint::new("127.0.0.1:1");
        assert!(session.messaging_proxy(&endpoint).await.is_err());
    }
}
