//! Module liveness and notification.
//!
//! The pipeline behind [`MessageDispatcher::notify`]: resolve an endpoint
//! through the directory (with the common-module fallback), confirm the
//! target is actually running and has the module loaded, then deliver a
//! best-effort synchronous message. A target that is absent is a normal
//! condition, tolerated silently: modules are started independently of the
//! database state they read.

mod dispatch;
mod endpoint;
mod liveness;
mod message;
mod resolver;
mod service;
mod transport;

pub use dispatch::MessageDispatcher;
pub use endpoint::{Endpoint, EndpointKind};
pub use liveness::{Liveness, LivenessChecker};
pub use message::{FieldValue, Message, MessageArgs};
pub use resolver::EndpointResolver;
pub use service::{MessageSink, MessagingService};
pub use transport::{
    interfaces, MessagingProxy, ModulesProxy, RpcSession, RpcTransport,
};
