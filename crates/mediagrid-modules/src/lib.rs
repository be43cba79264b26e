//! Mediagrid domain modules.
//!
//! CRUD modules that mutate cluster state through the registry's stored
//! procedures and then notify the running module through the core
//! dispatcher. Hosts compose them via [`default_manifest`].
//!
//! The modules here cover registry bookkeeping only; the media engines that
//! consume these records are separate processes and are the *targets* of
//! the notifications, not part of this crate.

pub mod file;
pub mod network;

pub use file::{FileItem, FileModule, FILE_MODULE_ID, FILE_MODULE_NAME};
pub use network::{
    Interface, NetworkModule, Route, RouteProtocol, NETWORK_MODULE_ID, NETWORK_MODULE_NAME,
};

use mediagrid_core::{ModuleEntry, ModuleManifest};

/// The statically-declared table of module implementations shipped with
/// this crate, in the form host composition consumes.
pub fn default_manifest() -> ModuleManifest {
    vec![
        ModuleEntry {
            name: network::NETWORK_MODULE_NAME,
            constructor: network::NetworkModule::create,
        },
        ModuleEntry {
            name: file::FILE_MODULE_NAME,
            constructor: file::FileModule::create,
        },
    ]
}
