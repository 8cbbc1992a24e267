//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → command-line overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared by value with the subsystems at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the credential and target host never change at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, read_config, ConfigError};
pub use schema::{
    CredentialConfig, HostMatch, InterceptionConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, ProxyConfig, TlsConfig,
};
pub use validation::{validate_config, ValidationError};
