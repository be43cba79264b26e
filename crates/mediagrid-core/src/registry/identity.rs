//! Object identity for cluster entities.

use serde::{Deserialize, Serialize};
use uuid::{uuid, Uuid};

/// The distinguished module id of a host's always-present base process.
///
/// Endpoint resolution falls back to this id when a module has no dedicated
/// directory entry, and modules sharing an endpoint with it are *internal*:
/// they need a load-state query on top of a ping to be considered live.
pub const COMMON_MODULE_ID: Uuid = uuid!("f52a9254-5b14-4c41-ac53-19ee73f71dce");

/// Identity shared by every module and application in the cluster: an opaque
/// id plus a human-readable name. Immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleIdentity {
    pub id: Uuid,
    pub name: String,
}

impl ModuleIdentity {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
