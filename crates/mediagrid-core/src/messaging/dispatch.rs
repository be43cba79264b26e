//! Best-effort synchronous notification dispatch.

use super::endpoint::Endpoint;
use super::liveness::LivenessChecker;
use super::message::{Message, MessageArgs};
use super::resolver::EndpointResolver;
use super::transport::RpcTransport;
use crate::{GridError, Result};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Public entry point for notifying a module that persisted state it depends
/// on has changed.
///
/// A target that is not configured or not running is the dominant case,
/// since modules are started independently of the database state they read;
/// it yields `Ok(None)` without noise. Only a failure *after* liveness has
/// been confirmed is surfaced, as [`GridError::NotificationFailed`].
pub struct MessageDispatcher {
    resolver: EndpointResolver,
    checker: LivenessChecker,
    transport: Arc<dyn RpcTransport>,
}

impl MessageDispatcher {
    pub fn new(resolver: EndpointResolver, transport: Arc<dyn RpcTransport>) -> Self {
        let checker = LivenessChecker::new(resolver.clone(), transport.clone());
        Self {
            resolver,
            checker,
            transport,
        }
    }

    /// The liveness checker this dispatcher consults.
    pub fn liveness(&self) -> &LivenessChecker {
        &self.checker
    }

    /// Send a synchronous notification to a module, if it is live.
    ///
    /// Returns the reply message, or `None` when the target is absent. No
    /// retries happen within a call; callers that need them re-invoke.
    pub async fn notify(
        &self,
        module: Uuid,
        message_id: Uuid,
        args: MessageArgs,
    ) -> Result<Option<Message>> {
        let liveness = self.checker.probe(module).await?;
        if !liveness.is_live() {
            debug!("skipping message {message_id} to module {module}: {liveness:?}");
            return Ok(None);
        }

        // Liveness just confirmed the endpoint exists; a vanished entry here
        // means the directory changed underneath us, which we treat the same
        // as a dead target.
        let Some(endpoint) = self.resolver.messages_endpoint(module).await? else {
            debug!("endpoint for module {module} disappeared after liveness check");
            return Ok(None);
        };

        match self.send(&endpoint, message_id, args).await {
            Ok(reply) => Ok(Some(reply)),
            Err(e) => Err(GridError::NotificationFailed {
                module,
                message: message_id,
                cause: e.to_string(),
            }),
        }
    }

    /// The send path proper: everything in here runs against a target
    /// believed live, so any failure is a genuine delivery failure. The
    /// session is released on every path out.
    async fn send(
        &self,
        endpoint: &Endpoint,
        message_id: Uuid,
        args: MessageArgs,
    ) -> Result<Message> {
        let session = self.transport.open_session().await?;
        let proxy = session.messaging_proxy(endpoint).await?;

        let mut message = proxy.message_template(message_id).await?;
        message.apply_args(args);

        proxy.send_sync(message).await
    }
}
