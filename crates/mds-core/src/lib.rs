//! Configuration and service registry loading for the message delivery service.
//!
//! Process settings come from environment variables ([`ServerConfig`]). The set
//! of trusted callers lives in a JSON services file that is loaded into a
//! [`RegistrySnapshot`](mds_auth::registry::RegistrySnapshot) and can be
//! reloaded at runtime without disturbing in-flight requests.

mod config;
mod error;
mod services;

pub use config::ServerConfig;
pub use error::{ConfigError, ConfigResult};
pub use services::{
    DEFAULT_SERVICES_FILE, ServiceEntry, ServicesFile, ServicesFileWatcher, ensure_services_file,
    load_registry, reload_registry,
};
