//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Build and check the route table
//! - Bind the listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{load_or_default, ConfigError, SiteConfig};
use crate::pages::urlpatterns;
use crate::routing::{RouteError, RouteTable};

/// Anything that stops the site from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("route table error: {0}")]
    Routes(#[from] RouteError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Load configuration from `path`, or defaults when no path is given.
///
/// Runs before the subscriber is installed, so it does not log.
pub fn load_configuration(path: Option<&Path>) -> Result<SiteConfig, StartupError> {
    Ok(load_or_default(path)?)
}

/// Build the site's route table and run the load-time checks.
pub fn load_routes() -> Result<RouteTable, StartupError> {
    let urls = urlpatterns();
    let warnings = urls.check()?;
    tracing::info!(
        routes = urls.len(),
        warnings = warnings.len(),
        "Route table loaded"
    );
    Ok(urls)
}

/// Bind the configured listener address.
pub async fn bind(config: &SiteConfig) -> Result<TcpListener, StartupError> {
    let addr = &config.listener.bind_address;
    let bind_error = |source: std::io::Error| StartupError::Bind {
        addr: addr.clone(),
        source,
    };

    let parsed: SocketAddr = addr.parse().map_err(|e| {
        bind_error(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
    })?;
    TcpListener::bind(parsed).await.map_err(bind_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_routes() {
        let urls = load_routes().unwrap();
        assert_eq!(urls.len(), 2);
    }

    #[tokio::test]
    async fn test_bind_reports_address() {
        let mut config = SiteConfig::default();
        config.listener.bind_address = "127.0.0.1:0".to_string();
        let listener = bind(&config).await.unwrap();
        assert!(listener.local_addr().unwrap().port() > 0);

        config.listener.bind_address = "not-an-address".to_string();
        let err = bind(&config).await.unwrap_err();
        assert!(err.to_string().contains("not-an-address"));
    }
}
