//! Network module: interfaces and routes.
//!
//! Routes are the addresses media flows in and out of the cluster on. All
//! state lives in the registry database; every mutation is followed by a
//! best-effort notification to the running network module so it can reload.

use mediagrid_core::db::procs;
use mediagrid_core::{GridError, HostContext, MessageArgs, Module, ModuleIdentity, Result};
use serde_json::json;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::{uuid, Uuid};

/// The network module's cluster-wide id.
pub const NETWORK_MODULE_ID: Uuid = uuid!("8a2b4d4a-35e2-4b90-9bc8-5e3bb9a4c1f2");

pub const NETWORK_MODULE_NAME: &str = "network";

/// Sent to the running network module after a registry mutation.
pub const DB_UPDATE_MESSAGE: Uuid = uuid!("47e17335-9a14-4bcd-8f0a-12e3b2c2a9d0");

/// Transport protocols a route can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteProtocol {
    Udp,
    Tcp,
}

impl RouteProtocol {
    pub const ALL: [RouteProtocol; 2] = [RouteProtocol::Udp, RouteProtocol::Tcp];

    pub fn id(&self) -> Uuid {
        match self {
            RouteProtocol::Udp => uuid!("1e2f9d55-8f0b-4a6c-9c2d-53a1f0de8b11"),
            RouteProtocol::Tcp => uuid!("b3d8a7c2-40e1-4f5a-8c47-92bb1da4e6f0"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteProtocol::Udp => "udp",
            RouteProtocol::Tcp => "tcp",
        }
    }

    pub fn from_id(id: Uuid) -> Option<Self> {
        Self::ALL.into_iter().find(|proto| proto.id() == id)
    }
}

impl std::fmt::Display for RouteProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A network interface on a host (eth0, lo, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    /// Registry id of the address record, used when adding routes.
    pub address_id: Uuid,
}

/// A network route: an interface plus an address, port, and protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub id: Uuid,
    pub name: String,
    pub interface: Interface,
    pub address: String,
    pub port: u16,
    pub protocol: RouteProtocol,
}

/// The network module.
pub struct NetworkModule {
    identity: ModuleIdentity,
    context: HostContext,
}

impl NetworkModule {
    /// Manifest constructor.
    pub fn create(context: HostContext) -> Result<Arc<dyn Module>> {
        Ok(Arc::new(Self {
            identity: ModuleIdentity::new(NETWORK_MODULE_ID, NETWORK_MODULE_NAME),
            context,
        }))
    }

    /// Interfaces known for this host, keyed by name.
    pub async fn interfaces(&self) -> Result<HashMap<String, Interface>> {
        let rows = self
            .context
            .backend()
            .call_procedure(
                procs::NETWORK_RESOURCES_LIST,
                &[json!(self.context.host_id().to_string())],
            )
            .await?;

        let mut interfaces = HashMap::with_capacity(rows.len());
        for row in rows {
            let interface = Interface {
                id: row.uuid_at(0)?,
                name: row.string_at(1)?,
                address: row.string_at(2)?,
                address_id: row.uuid_at(3)?,
            };
            interfaces.insert(interface.name.clone(), interface);
        }
        Ok(interfaces)
    }

    /// Routes over every interface of this host, keyed by route name.
    pub async fn routes(&self) -> Result<HashMap<String, Route>> {
        let mut routes = HashMap::new();
        for interface in self.interfaces().await?.into_values() {
            for route in self.routes_for(&interface).await? {
                routes.insert(route.name.clone(), route);
            }
        }
        Ok(routes)
    }

    /// A route by its registry id.
    pub async fn route_by_id(&self, id: Uuid) -> Result<Option<Route>> {
        Ok(self
            .routes()
            .await?
            .into_values()
            .find(|route| route.id == id))
    }

    async fn routes_for(&self, interface: &Interface) -> Result<Vec<Route>> {
        let rows = self
            .context
            .backend()
            .call_procedure(
                procs::NETWORK_ROUTE_LIST,
                &[json!(interface.id.to_string())],
            )
            .await?;

        let mut routes = Vec::with_capacity(rows.len());
        for row in rows {
            let proto_id = row.uuid_at(4)?;
            let protocol =
                RouteProtocol::from_id(proto_id).ok_or_else(|| GridError::Database {
                    message: format!("unknown route protocol: {proto_id}"),
                })?;
            routes.push(Route {
                id: row.uuid_at(0)?,
                name: row.string_at(1)?,
                interface: interface.clone(),
                address: row.string_at(2)?,
                port: row.u16_at(3)?,
                protocol,
            });
        }
        Ok(routes)
    }

    /// Add a route and notify the running module.
    pub async fn add_route(
        &self,
        name: &str,
        interface: &Interface,
        address: &str,
        port: u16,
        protocol: RouteProtocol,
    ) -> Result<()> {
        self.context
            .backend()
            .call_procedure(
                procs::NETWORK_ROUTE_ADD,
                &[
                    json!(name),
                    json!(interface.address_id.to_string()),
                    json!(address),
                    json!(port),
                    json!(protocol.id().to_string()),
                ],
            )
            .await?;

        self.notify_db_update().await
    }

    /// Remove a route by name and notify the running module.
    ///
    /// An unknown name is not an error; the notification is sent either way
    /// so the module reconciles with whatever the registry now holds.
    pub async fn remove_route(&self, name: &str) -> Result<()> {
        if let Some(route) = self.routes().await?.remove(name) {
            self.context
                .backend()
                .call_procedure(
                    procs::NETWORK_ROUTE_DELETE,
                    &[json!(route.id.to_string())],
                )
                .await?;
        }

        self.notify_db_update().await
    }

    /// Whether a route is currently locked by a module.
    ///
    /// Any failure reads as "not in use".
    pub async fn route_in_use(&self, route_id: Uuid) -> bool {
        let result = self
            .context
            .backend()
            .call_procedure(
                procs::NETWORK_ROUTE_GETLOCK,
                &[json!(route_id.to_string())],
            )
            .await;

        match result {
            Ok(rows) => rows
                .first()
                .and_then(|row| row.i64_at(0).ok())
                .map(|locked| locked != 0)
                .unwrap_or(false),
            Err(e) => {
                debug!("route lock query for {route_id} failed: {e}");
                false
            }
        }
    }

    async fn notify_db_update(&self) -> Result<()> {
        self.context
            .dispatcher()
            .notify(NETWORK_MODULE_ID, DB_UPDATE_MESSAGE, MessageArgs::new())
            .await?;
        Ok(())
    }
}

impl Module for NetworkModule {
    fn identity(&self) -> &ModuleIdentity {
        &self.identity
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_protocol_roundtrip() {
        for proto in RouteProtocol::ALL {
            assert_eq!(RouteProtocol::from_id(proto.id()), Some(proto));
        }
        assert_eq!(RouteProtocol::from_id(Uuid::new_v4()), None);
        assert_eq!(RouteProtocol::Udp.to_string(), "udp");
    }
}
