//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SiteConfig (validated, immutable)
//!     → shared with the HTTP server at startup
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of the site settings
//! ```
//!
//! # Design Decisions
//! - All fields have defaults; running without a file is supported
//! - Only `[site]` settings are applied on reload; listener, limits and the
//!   route table are fixed for the life of the process
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_or_default, parse_config, ConfigError};
pub use schema::{
    ListenerConfig, ObservabilityConfig, SecurityConfig, SiteConfig, SiteSettings,
    TimeoutConfig,
};
pub use validation::ValidationError;
pub use watcher::ConfigWatcher;
