//! Endpoint resolution with common-module fallback.

use super::endpoint::{Endpoint, EndpointKind};
use crate::db::{procs, ProcedureBackend};
use crate::registry::COMMON_MODULE_ID;
use crate::Result;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Resolves `(object kind, module id)` pairs to endpoint addresses through
/// the directory, scoped to one host.
///
/// A module without a dedicated directory entry falls back to the common
/// module's entry, exactly once. There is no further fallback chain, so
/// resolution can never loop.
#[derive(Clone)]
pub struct EndpointResolver {
    backend: Arc<dyn ProcedureBackend>,
    host: Uuid,
}

impl EndpointResolver {
    pub fn new(backend: Arc<dyn ProcedureBackend>, host: Uuid) -> Self {
        Self { backend, host }
    }

    pub fn host(&self) -> Uuid {
        self.host
    }

    /// Resolve an endpoint, applying the single common-id fallback.
    pub async fn resolve(&self, kind: EndpointKind, module: Uuid) -> Result<Option<Endpoint>> {
        if let Some(endpoint) = self.lookup(kind, module).await? {
            return Ok(Some(endpoint));
        }
        if module != COMMON_MODULE_ID {
            return self.lookup(kind, COMMON_MODULE_ID).await;
        }
        Ok(None)
    }

    /// A module's message delivery endpoint.
    pub async fn messages_endpoint(&self, module: Uuid) -> Result<Option<Endpoint>> {
        self.resolve(EndpointKind::Messages, module).await
    }

    /// The host-wide administrative endpoint.
    pub async fn modules_endpoint(&self) -> Result<Option<Endpoint>> {
        self.resolve(EndpointKind::Modules, COMMON_MODULE_ID).await
    }

    /// Whether a module runs inside the common host process.
    ///
    /// Internal modules share the common module's messages endpoint and
    /// cannot be told apart from it by address; they additionally need a
    /// load-state query. The common module itself is never internal.
    pub async fn is_internal(&self, module: Uuid) -> Result<bool> {
        if module == COMMON_MODULE_ID {
            return Ok(false);
        }
        let own = self.messages_endpoint(module).await?;
        let common = self.messages_endpoint(COMMON_MODULE_ID).await?;
        Ok(own == common)
    }

    async fn lookup(&self, kind: EndpointKind, module: Uuid) -> Result<Option<Endpoint>> {
        let rows = self
            .backend
            .call_procedure(
                procs::ENDPOINT_GET,
                &[
                    json!(self.host.to_string()),
                    json!(module.to_string()),
                    json!(kind.object_id().to_string()),
                ],
            )
            .await?;

        match rows.first() {
            Some(row) => Ok(Some(Endpoint::new(row.string_at(0)?))),
            None => Ok(None),
        }
    }
}
