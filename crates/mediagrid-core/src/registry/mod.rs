//! Cluster, host, and module registries.

mod application;
mod cluster;
mod host;
mod identity;
mod media;
mod module;

pub use application::Application;
pub use cluster::Cluster;
pub use host::Host;
pub use identity::{ModuleIdentity, COMMON_MODULE_ID};
pub use media::MediaKind;
pub use module::{HostContext, Module, ModuleConstructor, ModuleEntry, ModuleManifest};
