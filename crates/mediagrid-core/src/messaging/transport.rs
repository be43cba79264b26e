//! RPC transport capability.
//!
//! The notification layer never talks to a wire protocol directly; it is
//! handed an [`RpcTransport`] and works in terms of sessions and typed
//! proxies. A session is a scoped resource: implementations release whatever
//! it holds when it is dropped, which happens on every exit path of a
//! liveness probe or a send.

use super::endpoint::Endpoint;
use super::message::Message;
use crate::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Interface kinds a proxy can be cast to.
pub mod interfaces {
    pub const MESSAGING: &str = "messaging";
    pub const MODULES: &str = "modules";
}

/// Factory for transport sessions.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn RpcSession>>;
}

/// One open transport session.
///
/// The proxy accessors are the typed-cast step: binding an endpoint that is
/// reachable but does not expose the requested interface fails with
/// [`crate::GridError::ProxyCast`].
#[async_trait]
pub trait RpcSession: Send + Sync {
    async fn messaging_proxy(&self, endpoint: &Endpoint) -> Result<Box<dyn MessagingProxy>>;
    async fn modules_proxy(&self, endpoint: &Endpoint) -> Result<Box<dyn ModulesProxy>>;
}

/// The messaging interface every notifiable module exposes.
#[async_trait]
pub trait MessagingProxy: Send + Sync {
    /// Lightweight round-trip used by liveness checks.
    async fn ping(&self) -> Result<()>;

    /// Fetch the empty message template for a message id.
    async fn message_template(&self, message_id: Uuid) -> Result<Message>;

    /// Deliver a populated message synchronously and return the reply.
    async fn send_sync(&self, message: Message) -> Result<Message>;
}

/// The per-host administrative interface reporting module load state.
#[async_trait]
pub trait ModulesProxy: Send + Sync {
    async fn is_loaded(&self, module: Uuid) -> Result<bool>;
}
