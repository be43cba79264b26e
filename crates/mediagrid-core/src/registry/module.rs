//! Module trait and the static module manifest.
//!
//! The original system discovered module implementations by scanning the
//! filesystem for loadable code units. Here the available implementations
//! are an explicit table of `(name, constructor)` entries, resolved when a
//! host registry is composed.

use super::cluster::Cluster;
use super::identity::ModuleIdentity;
use crate::db::ProcedureBackend;
use crate::messaging::{EndpointResolver, LivenessChecker, MessageDispatcher, RpcTransport};
use crate::Result;
use std::any::Any;
use std::sync::Arc;
use uuid::Uuid;

/// A named unit of cluster functionality hosted by exactly one host process.
///
/// Implementations carry their identity plus module-specific behavior;
/// callers that need a concrete capability set downcast via [`Module::as_any`].
pub trait Module: Send + Sync + 'static {
    /// The module's cluster-wide identity.
    fn identity(&self) -> &ModuleIdentity;

    /// Concrete-type access for capability downcasts.
    fn as_any(&self) -> &dyn Any;

    fn name(&self) -> &str {
        &self.identity().name
    }

    fn id(&self) -> Uuid {
        self.identity().id
    }
}

/// Constructor signature for manifest entries.
pub type ModuleConstructor = fn(HostContext) -> Result<Arc<dyn Module>>;

/// One statically-declared module implementation.
#[derive(Clone, Copy)]
pub struct ModuleEntry {
    /// Declared name, used for diagnostics when construction fails.
    pub name: &'static str,
    pub constructor: ModuleConstructor,
}

/// The table of module implementations available to every host.
pub type ModuleManifest = Vec<ModuleEntry>;

/// Per-host construction context handed to module constructors.
///
/// Modules keep it to reach the store and the notification layer later on.
#[derive(Clone)]
pub struct HostContext {
    cluster: Arc<Cluster>,
    host_id: Uuid,
    host_name: String,
}

impl HostContext {
    pub(crate) fn new(cluster: Arc<Cluster>, host_id: Uuid, host_name: impl Into<String>) -> Self {
        Self {
            cluster,
            host_id,
            host_name: host_name.into(),
        }
    }

    pub fn cluster(&self) -> &Arc<Cluster> {
        &self.cluster
    }

    pub fn host_id(&self) -> Uuid {
        self.host_id
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    pub fn backend(&self) -> &Arc<dyn ProcedureBackend> {
        self.cluster.backend()
    }

    pub fn transport(&self) -> &Arc<dyn RpcTransport> {
        self.cluster.transport()
    }

    /// Endpoint resolver scoped to this host.
    pub fn resolver(&self) -> EndpointResolver {
        EndpointResolver::new(self.cluster.backend().clone(), self.host_id)
    }

    /// Liveness checker scoped to this host.
    pub fn liveness(&self) -> LivenessChecker {
        LivenessChecker::new(self.resolver(), self.cluster.transport().clone())
    }

    /// Message dispatcher scoped to this host.
    pub fn dispatcher(&self) -> MessageDispatcher {
        MessageDispatcher::new(self.resolver(), self.cluster.transport().clone())
    }
}
