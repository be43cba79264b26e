//! Mediagrid core - control-plane library for a media-processing cluster.
//!
//! The cluster registry (hosts, applications, modules) lives in a relational
//! store reached through named stored procedures; this crate composes the
//! process-local view of that registry and carries the notification layer
//! used to tell a running module that persisted configuration it depends on
//! has changed.
//!
//! # Example
//!
//! ```rust,ignore
//! use mediagrid_core::config::Config;
//! use mediagrid_core::registry::Cluster;
//! use mediagrid_core::rpc::TcpTransport;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> mediagrid_core::Result<()> {
//!     let config = Config::load("/etc/mediagrid.json")?;
//!     let cluster = Cluster::new(config, backend, Arc::new(TcpTransport::new()), manifest);
//!
//!     let host = cluster.local_host().await?;
//!     println!("{} modules on {}", host.modules().len(), host.name());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod messaging;
pub mod registry;
pub mod rpc;

// Re-export commonly used types
pub use config::Config;
pub use error::{GridError, Result};
pub use messaging::{
    Endpoint, EndpointKind, EndpointResolver, FieldValue, Liveness, LivenessChecker, Message,
    MessageArgs, MessageDispatcher,
};
pub use registry::{
    Cluster, Host, HostContext, MediaKind, Module, ModuleEntry, ModuleIdentity, ModuleManifest,
    COMMON_MODULE_ID,
};
