//! File module: media files and folders registered as sources.

use mediagrid_core::db::procs;
use mediagrid_core::{HostContext, MessageArgs, Module, ModuleIdentity, Result};
use serde_json::json;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::{uuid, Uuid};

/// The file module's cluster-wide id.
pub const FILE_MODULE_ID: Uuid = uuid!("9d0c5e0a-f3b1-4e26-8be0-aa34c2b9e815");

pub const FILE_MODULE_NAME: &str = "file";

/// Sent to the running file module after a registry mutation.
pub const DB_UPDATE_MESSAGE: Uuid = uuid!("53a2b0de-6a4c-4db0-9e51-2f93dd0b7c44");

/// A registered file item: a regular file or a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileItem {
    pub id: Uuid,
    pub name: String,
    pub path: String,
    /// Item kind name as the registry reports it ("file", "folder").
    pub kind: String,
}

/// The file module.
pub struct FileModule {
    identity: ModuleIdentity,
    context: HostContext,
}

impl FileModule {
    /// Manifest constructor.
    pub fn create(context: HostContext) -> Result<Arc<dyn Module>> {
        Ok(Arc::new(Self {
            identity: ModuleIdentity::new(FILE_MODULE_ID, FILE_MODULE_NAME),
            context,
        }))
    }

    /// File items registered on this host, keyed by name.
    pub async fn items(&self) -> Result<HashMap<String, FileItem>> {
        let rows = self
            .context
            .backend()
            .call_procedure(
                procs::FILE_LIST,
                &[json!(self.context.host_id().to_string())],
            )
            .await?;

        let mut items = HashMap::with_capacity(rows.len());
        for row in rows {
            let item = FileItem {
                id: row.uuid_at(0)?,
                name: row.string_at(1)?,
                path: row.string_at(2)?,
                kind: row.string_at(3)?,
            };
            items.insert(item.name.clone(), item);
        }
        Ok(items)
    }

    /// Register a file and notify the running module.
    pub async fn add_file(&self, name: &str, path: &str, kind: &str) -> Result<()> {
        self.context
            .backend()
            .call_procedure(
                procs::FILE_ADD,
                &[
                    json!(name),
                    json!(path),
                    json!(self.context.host_id().to_string()),
                    json!(kind),
                ],
            )
            .await?;

        self.notify_db_update().await
    }

    /// Remove a file by name and notify the running module.
    pub async fn remove_file(&self, name: &str) -> Result<()> {
        self.context
            .backend()
            .call_procedure(
                procs::FILE_DELETE,
                &[
                    json!(name),
                    json!(self.context.host_id().to_string()),
                ],
            )
            .await?;

        self.notify_db_update().await
    }

    async fn notify_db_update(&self) -> Result<()> {
        self.context
            .dispatcher()
            .notify(FILE_MODULE_ID, DB_UPDATE_MESSAGE, MessageArgs::new())
            .await?;
        Ok(())
    }
}

impl Module for FileModule {
    fn identity(&self) -> &ModuleIdentity {
        &self.identity
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
