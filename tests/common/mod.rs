//! Shared utilities for integration tests.

use std::net::SocketAddr;

use personal_website::config::SiteConfig;
use personal_website::http::HttpServer;
use personal_website::lifecycle::Shutdown;
use personal_website::pages::urlpatterns;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A site running on an ephemeral loopback port.
pub struct RunningSite {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_tx: mpsc::UnboundedSender<SiteConfig>,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl RunningSite {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the site with `config` on 127.0.0.1:0.
pub async fn start_site(config: SiteConfig) -> RunningSite {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_tx, config_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config, urlpatterns());
    let server_shutdown = shutdown.subscribe();

    let handle = tokio::spawn(async move { server.run(listener, config_rx, server_shutdown).await });

    RunningSite {
        addr,
        shutdown,
        config_tx,
        handle,
    }
}

/// HTTP client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
