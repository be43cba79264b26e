//! Per-host module registry.

use super::cluster::Cluster;
use super::identity::ModuleIdentity;
use super::module::{HostContext, Module};
use crate::{GridError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// A registered host and the modules composed onto it.
///
/// Construction walks the cluster's module manifest and instantiates every
/// entry; a constructor failure skips that entry so one missing or broken
/// module implementation cannot prevent the rest of the host from coming up.
/// The module map is read-only afterward.
pub struct Host {
    identity: ModuleIdentity,
    context: HostContext,
    modules: HashMap<String, Arc<dyn Module>>,
}

impl Host {
    pub(crate) fn compose(cluster: &Arc<Cluster>, id: Uuid, name: &str) -> Self {
        let context = HostContext::new(cluster.clone(), id, name);

        let mut modules: HashMap<String, Arc<dyn Module>> = HashMap::new();
        for entry in cluster.manifest() {
            match (entry.constructor)(context.clone()) {
                Ok(module) => {
                    // Index under the module's declared identity name.
                    modules.insert(module.name().to_string(), module);
                }
                Err(e) => {
                    debug!("skipping module '{}' on host '{}': {}", entry.name, name, e);
                }
            }
        }

        Self {
            identity: ModuleIdentity::new(id, name),
            context,
            modules,
        }
    }

    pub fn id(&self) -> Uuid {
        self.identity.id
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn identity(&self) -> &ModuleIdentity {
        &self.identity
    }

    /// The construction context, for building per-host messaging components.
    pub fn context(&self) -> &HostContext {
        &self.context
    }

    /// Modules composed onto this host, keyed by name.
    pub fn modules(&self) -> &HashMap<String, Arc<dyn Module>> {
        &self.modules
    }

    pub fn module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.get(name)
    }

    /// Like [`Host::module`] but failing with [`GridError::ModuleNotFound`].
    pub fn expect_module(&self, name: &str) -> Result<&Arc<dyn Module>> {
        self.modules.get(name).ok_or_else(|| GridError::ModuleNotFound {
            name: name.to_string(),
        })
    }
}
