//! Applications: modules activated on a host.

use super::identity::ModuleIdentity;
use super::module::HostContext;
use crate::db::procs;
use crate::{GridError, Result};
use serde_json::json;
use tokio::sync::OnceCell;
use uuid::Uuid;

/// A module activated as an application on a host.
///
/// An application is a module plus a per-host application id used to fetch
/// application-specific settings. The id is looked up lazily and cached once
/// found; until activation there is none.
pub struct Application {
    identity: ModuleIdentity,
    context: HostContext,
    app_id: OnceCell<Uuid>,
}

impl Application {
    pub fn new(context: HostContext, identity: ModuleIdentity) -> Self {
        Self {
            identity,
            context,
            app_id: OnceCell::new(),
        }
    }

    pub fn identity(&self) -> &ModuleIdentity {
        &self.identity
    }

    /// The per-host application id, or `None` if not yet activated.
    pub async fn app_id(&self) -> Result<Option<Uuid>> {
        if let Some(id) = self.app_id.get() {
            return Ok(Some(*id));
        }

        let rows = self
            .context
            .backend()
            .call_procedure(
                procs::APPLICATION_UUID_GET,
                &[
                    json!(self.identity.id.to_string()),
                    json!(self.context.host_id().to_string()),
                ],
            )
            .await?;

        match rows.first() {
            Some(row) => {
                let id = row.uuid_at(0)?;
                let _ = self.app_id.set(id);
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Activate the application on this host.
    pub async fn activate(&self, description: &str) -> Result<Uuid> {
        if self.app_id().await?.is_some() {
            return Err(GridError::AlreadyActivated {
                name: self.identity.name.clone(),
            });
        }

        let rows = self
            .context
            .backend()
            .call_procedure(
                procs::APPLICATION_ADD,
                &[
                    json!(self.identity.id.to_string()),
                    json!(self.identity.name),
                    json!(self.context.host_id().to_string()),
                    json!(description),
                ],
            )
            .await?;

        let row = rows.first().ok_or_else(|| GridError::Database {
            message: format!("{} returned no application id", procs::APPLICATION_ADD),
        })?;
        let id = row.uuid_at(0)?;
        let _ = self.app_id.set(id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::{MemoryBackend, ProcedureBackend, Row};
    use crate::messaging::{RpcSession, RpcTransport};
    use crate::registry::Cluster;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NoTransport;

    #[async_trait]
    impl RpcTransport for NoTransport {
        async fn open_session(&self) -> Result<Box<dyn RpcSession>> {
            Err(GridError::transport("no transport in this test"))
        }
    }

    fn context(backend: Arc<MemoryBackend>) -> HostContext {
        let cluster = Cluster::new(
            Config::new("studio-1", Default::default()),
            backend as Arc<dyn ProcedureBackend>,
            Arc::new(NoTransport),
            Vec::new(),
        );
        HostContext::new(cluster, Uuid::new_v4(), "studio-1")
    }

    #[tokio::test]
    async fn test_app_id_absent_until_activated() {
        let backend = Arc::new(MemoryBackend::new());
        backend.register_empty(procs::APPLICATION_UUID_GET);
        let app_uuid = Uuid::new_v4();
        backend.register_rows(
            procs::APPLICATION_ADD,
            vec![Row::new(vec![serde_json::json!(app_uuid.to_string())])],
        );

        let app = Application::new(
            context(backend.clone()),
            ModuleIdentity::new(Uuid::new_v4(), "streamer"),
        );

        assert_eq!(app.app_id().await.unwrap(), None);

        let activated = app.activate("http streamer").await.unwrap();
        assert_eq!(activated, app_uuid);
        // cached now, no further store lookups needed
        assert_eq!(app.app_id().await.unwrap(), Some(app_uuid));
    }

    #[tokio::test]
    async fn test_double_activation_is_an_error() {
        let backend = Arc::new(MemoryBackend::new());
        let app_uuid = Uuid::new_v4();
        backend.register_rows(
            procs::APPLICATION_UUID_GET,
            vec![Row::new(vec![serde_json::json!(app_uuid.to_string())])],
        );

        let app = Application::new(
            context(backend),
            ModuleIdentity::new(Uuid::new_v4(), "streamer"),
        );

        // already present in the store
        assert_eq!(app.app_id().await.unwrap(), Some(app_uuid));
        let result = app.activate("again").await;
        assert!(matches!(result, Err(GridError::AlreadyActivated { .. })));
    }
}
