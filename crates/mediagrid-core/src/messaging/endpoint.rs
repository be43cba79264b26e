//! Endpoint addressing.

use serde::{Deserialize, Serialize};
use uuid::{uuid, Uuid};

/// The two logical address spaces a host publishes into the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    /// The host-wide administrative endpoint (module load state).
    Modules,
    /// A module's message delivery endpoint.
    Messages,
}

impl EndpointKind {
    /// The directory object id for this address space.
    pub fn object_id(&self) -> Uuid {
        match self {
            EndpointKind::Modules => uuid!("3eb45d0e-1f7a-4a29-9bc7-6a50b67fbd3a"),
            EndpointKind::Messages => uuid!("c1df6ef2-8e0c-45bd-9df3-2c660a6177d6"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::Modules => "modules",
            EndpointKind::Messages => "messages",
        }
    }
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A network-reachable address at which a module's messaging interface can
/// be contacted, as stored in the directory (e.g. `127.0.0.1:4101`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Endpoint {
    fn from(address: &str) -> Self {
        Self(address.to_string())
    }
}

impl From<String> for Endpoint {
    fn from(address: String) -> Self {
        Self(address)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
