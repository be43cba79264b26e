//! Host side of the messaging interface.
//!
//! A process that wants its modules to be notifiable runs an
//! [`crate::rpc::RpcServer`] with a [`MessagingService`] as its dispatch.
//! The service answers the interface handshake, pings, template fetches and
//! synchronous sends, delegating message semantics to a [`MessageSink`]; a
//! service built with [`MessagingService::with_modules_admin`] additionally
//! serves the per-host load-state queries for internal modules.

use super::message::Message;
use super::transport::interfaces;
use crate::rpc::methods;
use crate::rpc::RpcDispatch;
use crate::{GridError, Result};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// What a module host implements to receive notifications.
#[async_trait::async_trait]
pub trait MessageSink: Send + Sync + 'static {
    /// The empty template for a message id, or `None` if the id is unknown.
    async fn message_template(&self, message_id: Uuid) -> Option<Message>;

    /// Handle a delivered message and produce the synchronous reply.
    async fn handle(&self, message: Message) -> Result<Message>;
}

/// RPC dispatch for a module endpoint.
pub struct MessagingService {
    sink: Arc<dyn MessageSink>,
    modules_admin: bool,
    loaded: RwLock<HashSet<Uuid>>,
}

impl MessagingService {
    /// A plain module endpoint: messaging interface only.
    pub fn new(sink: Arc<dyn MessageSink>) -> Self {
        Self {
            sink,
            modules_admin: false,
            loaded: RwLock::new(HashSet::new()),
        }
    }

    /// A host endpoint that also answers module load-state queries.
    pub fn with_modules_admin(sink: Arc<dyn MessageSink>) -> Self {
        Self {
            sink,
            modules_admin: true,
            loaded: RwLock::new(HashSet::new()),
        }
    }

    /// Record whether a module is loaded in this process.
    pub fn set_loaded(&self, module: Uuid, loaded: bool) {
        if let Ok(mut set) = self.loaded.write() {
            if loaded {
                set.insert(module);
            } else {
                set.remove(&module);
            }
        }
    }

    pub fn is_loaded(&self, module: Uuid) -> bool {
        self.loaded
            .read()
            .map(|set| set.contains(&module))
            .unwrap_or(false)
    }

    fn uuid_param(params: &Value, field: &str) -> Result<Uuid> {
        let raw = params
            .get(field)
            .and_then(Value::as_str)
            .ok_or_else(|| GridError::InvalidParams {
                message: format!("missing '{field}' parameter"),
            })?;
        Uuid::parse_str(raw).map_err(|_| GridError::InvalidParams {
            message: format!("'{field}' is not a uuid: {raw}"),
        })
    }
}

#[async_trait::async_trait]
impl RpcDispatch for MessagingService {
    async fn dispatch(&self, method: &str, params: Value) -> Result<Value> {
        match method {
            methods::INTERFACES => {
                let mut kinds = vec![interfaces::MESSAGING];
                if self.modules_admin {
                    kinds.push(interfaces::MODULES);
                }
                Ok(json!(kinds))
            }

            methods::PING => Ok(json!("pong")),

            methods::TEMPLATE => {
                let message_id = Self::uuid_param(&params, "message")?;
                let template = self.sink.message_template(message_id).await.ok_or_else(|| {
                    GridError::InvalidParams {
                        message: format!("unknown message id: {message_id}"),
                    }
                })?;
                Ok(serde_json::to_value(template)?)
            }

            methods::SEND => {
                let raw = params.get("message").ok_or_else(|| GridError::InvalidParams {
                    message: "missing 'message' parameter".to_string(),
                })?;
                let message: Message = serde_json::from_value(raw.clone()).map_err(|e| {
                    GridError::InvalidParams {
                        message: format!("malformed message: {e}"),
                    }
                })?;
                let reply = self.sink.handle(message).await?;
                Ok(serde_json::to_value(reply)?)
            }

            methods::IS_LOADED if self.modules_admin => {
                let module = Self::uuid_param(&params, "module")?;
                Ok(json!(self.is_loaded(module)))
            }

            other => Err(GridError::MethodNotFound {
                method: other.to_string(),
            }),
        }
    }
}
