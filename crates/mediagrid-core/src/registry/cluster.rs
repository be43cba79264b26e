//! Process-wide cluster registry.

use super::host::Host;
use super::module::{ModuleEntry, ModuleManifest};
use crate::config::Config;
use crate::db::{procs, ProcedureBackend};
use crate::messaging::RpcTransport;
use crate::{GridError, Result};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

static GLOBAL: OnceLock<Arc<Cluster>> = OnceLock::new();

/// The cluster as seen from one control-plane process: configuration, the
/// store backend, the RPC transport capability, and the module manifest used
/// to compose host registries.
///
/// A `Cluster` is an ordinary value meant to be constructed once at process
/// start and injected into whatever needs it. [`Cluster::install`] adds
/// optional process-wide access with first-construction-wins semantics for
/// callers that cannot thread the handle through.
pub struct Cluster {
    config: Config,
    backend: Arc<dyn ProcedureBackend>,
    transport: Arc<dyn RpcTransport>,
    manifest: ModuleManifest,
}

impl Cluster {
    pub fn new(
        config: Config,
        backend: Arc<dyn ProcedureBackend>,
        transport: Arc<dyn RpcTransport>,
        manifest: ModuleManifest,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            backend,
            transport,
            manifest,
        })
    }

    /// Install a cluster as the process-wide instance.
    ///
    /// The first install wins; later installs are ignored and the already
    /// installed instance is returned, so racing initializers converge on
    /// one shared registry.
    pub fn install(cluster: Arc<Cluster>) -> Arc<Cluster> {
        GLOBAL.get_or_init(|| cluster).clone()
    }

    /// The process-wide instance, if one has been installed.
    pub fn global() -> Option<Arc<Cluster>> {
        GLOBAL.get().cloned()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn ProcedureBackend> {
        &self.backend
    }

    pub fn transport(&self) -> &Arc<dyn RpcTransport> {
        &self.transport
    }

    pub(crate) fn manifest(&self) -> &[ModuleEntry] {
        &self.manifest
    }

    /// All registered hosts, keyed by name, each with its module registry
    /// composed from the manifest.
    pub async fn hosts(self: &Arc<Self>) -> Result<HashMap<String, Host>> {
        let rows = self.backend.call_procedure(procs::HOST_LIST, &[]).await?;

        let mut hosts = HashMap::with_capacity(rows.len());
        for row in rows {
            let id = row.uuid_at(0)?;
            let name = row.string_at(1)?;
            hosts.insert(name.clone(), Host::compose(self, id, &name));
        }
        Ok(hosts)
    }

    /// A single registered host by name.
    pub async fn host(self: &Arc<Self>, name: &str) -> Result<Host> {
        self.hosts()
            .await?
            .remove(name)
            .ok_or_else(|| GridError::HostNotFound {
                name: name.to_string(),
            })
    }

    /// The host this process runs on, per configuration.
    pub async fn local_host(self: &Arc<Self>) -> Result<Host> {
        let name = self.config.host.clone();
        self.host(&name).await
    }

    /// Register a new host.
    pub async fn add_host(&self, name: &str) -> Result<Uuid> {
        let rows = self
            .backend
            .call_procedure(procs::HOST_ADD, &[json!(name)])
            .await?;
        let row = rows.first().ok_or_else(|| GridError::Database {
            message: format!("{} returned no host id", procs::HOST_ADD),
        })?;
        row.uuid_at(0)
    }

    /// Delete a host by name.
    pub async fn remove_host(&self, name: &str) -> Result<()> {
        self.backend
            .call_procedure(procs::HOST_DELETE, &[json!(name)])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryBackend, Row};
    use crate::messaging::RpcSession;
    use async_trait::async_trait;
    use serde_json::json;

    struct NoTransport;

    #[async_trait]
    impl RpcTransport for NoTransport {
        async fn open_session(&self) -> Result<Box<dyn RpcSession>> {
            Err(GridError::transport("no transport in this test"))
        }
    }

    fn test_cluster(backend: Arc<MemoryBackend>) -> Arc<Cluster> {
        Cluster::new(
            Config::new("studio-1", Default::default()),
            backend,
            Arc::new(NoTransport),
            Vec::new(),
        )
    }

    #[tokio::test]
    async fn test_hosts_built_from_host_list() {
        let backend = Arc::new(MemoryBackend::new());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        backend.register_rows(
            procs::HOST_LIST,
            vec![
                Row::new(vec![json!(a.to_string()), json!("studio-1")]),
                Row::new(vec![json!(b.to_string()), json!("studio-2")]),
            ],
        );

        let cluster = test_cluster(backend);
        let hosts = cluster.hosts().await.unwrap();

        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts["studio-1"].id(), a);
        assert_eq!(hosts["studio-2"].name(), "studio-2");

        let local = cluster.local_host().await.unwrap();
        assert_eq!(local.id(), a);
    }

    #[tokio::test]
    async fn test_unknown_host_is_an_error() {
        let backend = Arc::new(MemoryBackend::new());
        backend.register_empty(procs::HOST_LIST);

        let cluster = test_cluster(backend);
        let result = cluster.host("nowhere").await;
        assert!(matches!(result, Err(GridError::HostNotFound { .. })));
    }

    #[tokio::test]
    async fn test_add_and_remove_host_call_procedures() {
        let backend = Arc::new(MemoryBackend::new());
        let new_id = Uuid::new_v4();
        backend.register_rows(
            procs::HOST_ADD,
            vec![Row::new(vec![json!(new_id.to_string())])],
        );
        backend.register_empty(procs::HOST_DELETE);

        let cluster = test_cluster(backend.clone());
        assert_eq!(cluster.add_host("studio-9").await.unwrap(), new_id);
        cluster.remove_host("studio-9").await.unwrap();

        assert_eq!(
            backend.called_procedures(),
            vec![procs::HOST_ADD, procs::HOST_DELETE]
        );
        assert_eq!(backend.calls()[0].1, vec![json!("studio-9")]);
    }

    // The global install guard is process-wide state, so it gets exactly one
    // test in this binary.
    #[tokio::test]
    async fn test_install_is_first_wins() {
        let first = test_cluster(Arc::new(MemoryBackend::new()));
        let second = test_cluster(Arc::new(MemoryBackend::new()));

        let installed = Cluster::install(first.clone());
        assert!(Arc::ptr_eq(&installed, &first));

        let installed_again = Cluster::install(second);
        assert!(Arc::ptr_eq(&installed_again, &first));

        let global = Cluster::global().expect("global cluster installed");
        assert!(Arc::ptr_eq(&global, &first));
    }
}
