//! Liveness probing of module endpoints.

use super::resolver::EndpointResolver;
use super::transport::RpcTransport;
use crate::Result;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Outcome of a liveness probe.
///
/// Only store failures are errors; every way a module can fail to answer is
/// an expected steady state of a partially-up cluster and gets a variant
/// here instead of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// The module answered its ping (and, for internal modules, the host
    /// reports it loaded).
    Live,
    /// No endpoint in the directory, even after the common-id fallback.
    NotConfigured,
    /// Connecting, casting, pinging, or querying load state failed.
    Unreachable,
    /// The shared host process answered, but reports the module not loaded.
    NotLoaded,
}

impl Liveness {
    pub fn is_live(self) -> bool {
        matches!(self, Liveness::Live)
    }
}

/// Decides whether a notification attempt is worthwhile.
pub struct LivenessChecker {
    resolver: EndpointResolver,
    transport: Arc<dyn RpcTransport>,
}

impl LivenessChecker {
    pub fn new(resolver: EndpointResolver, transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            resolver,
            transport,
        }
    }

    /// Probe a module: ping its messages endpoint, and for internal modules
    /// additionally ask the host whether the module is loaded.
    ///
    /// The transport session lives for the duration of the probe and is
    /// released on every path out.
    pub async fn probe(&self, module: Uuid) -> Result<Liveness> {
        let Some(endpoint) = self.resolver.messages_endpoint(module).await? else {
            return Ok(Liveness::NotConfigured);
        };

        let session = match self.transport.open_session().await {
            Ok(session) => session,
            Err(e) => {
                debug!("probe of module {module}: failed to open session: {e}");
                return Ok(Liveness::Unreachable);
            }
        };

        let ping_ok = match session.messaging_proxy(&endpoint).await {
            Ok(proxy) => proxy.ping().await.is_ok(),
            Err(e) => {
                debug!("probe of module {module} at {endpoint}: {e}");
                false
            }
        };
        if !ping_ok {
            return Ok(Liveness::Unreachable);
        }

        // An internal module shares the common endpoint; the ping answer came
        // from the host process, so ask it whether the module is loaded.
        if self.resolver.is_internal(module).await? {
            let Some(admin) = self.resolver.modules_endpoint().await? else {
                return Ok(Liveness::NotConfigured);
            };

            let loaded = match session.modules_proxy(&admin).await {
                Ok(proxy) => match proxy.is_loaded(module).await {
                    Ok(loaded) => loaded,
                    Err(e) => {
                        debug!("load-state query for module {module} at {admin}: {e}");
                        return Ok(Liveness::Unreachable);
                    }
                },
                Err(e) => {
                    debug!("load-state query for module {module} at {admin}: {e}");
                    return Ok(Liveness::Unreachable);
                }
            };
            if !loaded {
                return Ok(Liveness::NotLoaded);
            }
        }

        Ok(Liveness::Live)
    }

    /// `probe` collapsed to a boolean.
    pub async fn is_live(&self, module: Uuid) -> Result<bool> {
        Ok(self.probe(module).await?.is_live())
    }
}
