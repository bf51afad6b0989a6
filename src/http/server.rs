//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the dispatch handler
//! - Wire up middleware (request ID, tracing, timeout, limits, headers)
//! - Resolve request paths against the route table and call views
//! - Apply site settings from config reloads
//! - Serve until shutdown, draining in-flight requests

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    extract::{Request, State},
    http::Method,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{SiteConfig, SiteSettings};
use crate::http::request::{request_id, MakeRequestUuidV4, X_REQUEST_ID};
use crate::http::response::{permanent_redirect, with_security_headers};
use crate::observability::metrics;
use crate::pages::page_not_found;
use crate::routing::{decode_path, RouteTable, ViewContext};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Built once at startup, never replaced.
    pub urls: Arc<RouteTable>,
    /// Swapped wholesale when the config file changes.
    pub site: Arc<ArcSwap<SiteSettings>>,
}

/// HTTP server for the site.
pub struct HttpServer {
    router: Router,
    config: SiteConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server serving `urls` with the given configuration.
    pub fn new(config: SiteConfig, urls: RouteTable) -> Self {
        let state = AppState {
            urls: Arc::new(urls),
            site: Arc::new(ArcSwap::from_pointee(config.site.clone())),
        };

        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            config,
            state,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &SiteConfig, state: AppState) -> Router {
        apply_layers(Router::new().fallback(dispatch).with_state(state), config)
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Shared handle to the live site settings.
    pub fn site_settings(&self) -> Arc<ArcSwap<SiteSettings>> {
        Arc::clone(&self.state.site)
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Run the server on `listener` until `shutdown` fires.
    ///
    /// New configurations arriving on `config_updates` replace the site
    /// settings; other sections only take effect after a restart.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<SiteConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, routes = self.state.urls.len(), "HTTP server starting");

        let site = Arc::clone(&self.state.site);
        let running = self.config.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                apply_config_update(&site, &running, new_config);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wrap `router` in the middleware stack, innermost first.
///
/// Security headers sit outside the limit and timeout layers so the 413,
/// 408 and 503 responses those layers generate carry them too.
#[allow(deprecated)]
fn apply_layers(router: Router, config: &SiteConfig) -> Router {
    let mut router = router
        .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
        .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

    if config.security.enable_headers {
        router = with_security_headers(router);
    }

    router
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                request_id = %request_id(request),
                method = %request.method(),
                path = %request.uri().path(),
            )
        }))
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
}

/// Config sections that differ from the running ones but cannot be applied live.
fn restart_required_sections(running: &SiteConfig, new_config: &SiteConfig) -> Vec<&'static str> {
    let mut sections = Vec::new();
    if new_config.listener != running.listener {
        sections.push("listener");
    }
    if new_config.timeouts != running.timeouts {
        sections.push("timeouts");
    }
    if new_config.security != running.security {
        sections.push("security");
    }
    if new_config.observability != running.observability {
        sections.push("observability");
    }
    sections
}

/// Swap in the reloaded site settings.
fn apply_config_update(site: &ArcSwap<SiteSettings>, running: &SiteConfig, new_config: SiteConfig) {
    let ignored = restart_required_sections(running, &new_config);
    if !ignored.is_empty() {
        tracing::warn!(
            sections = ?ignored,
            "Changes to these sections require a restart; ignoring them"
        );
    }

    site.store(Arc::new(new_config.site));
    tracing::info!("Site settings reloaded");
}

/// Single entry point for every request.
/// Resolves the path against the route table and calls the matched view.
async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let start = Instant::now();
    let site = state.site.load_full();
    let uri = request.uri();
    let path_info = decode_path(uri.path());

    let ctx = ViewContext {
        method: request.method(),
        path: &path_info,
        query: uri.query(),
        site: &site,
        urls: &state.urls,
    };

    let (response, view) = match state.urls.resolve(ctx.path) {
        Some(matched) => {
            tracing::debug!(
                view = matched.view_name(),
                route = matched.index,
                "Route matched"
            );
            (matched.view().call(&ctx), matched.view_name())
        }
        None => match append_slash_target(&ctx, uri.path()) {
            Some(location) => {
                tracing::debug!(location = %location, "Redirecting to slash-terminated path");
                (permanent_redirect(&location), "redirect")
            }
            None => {
                tracing::debug!(path = %ctx.path, "No route matched");
                (page_not_found(&ctx), "not_found")
            }
        },
    };

    metrics::record_request(
        ctx.method.as_str(),
        response.status().as_u16(),
        view,
        start,
    );
    response
}

/// Where to redirect a slash-less path, if anywhere.
///
/// Only GET and HEAD are redirected; other methods would lose their body.
/// The location keeps the path as the client encoded it.
fn append_slash_target(ctx: &ViewContext<'_>, raw_path: &str) -> Option<String> {
    if !ctx.site.append_slash || ctx.path.ends_with('/') {
        return None;
    }
    if *ctx.method != Method::GET && *ctx.method != Method::HEAD {
        return None;
    }

    ctx.urls.resolve(&format!("{}/", ctx.path))?;

    Some(match ctx.query {
        Some(query) => format!("{raw_path}/?{query}"),
        None => format!("{raw_path}/"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::urlpatterns;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    fn server() -> HttpServer {
        HttpServer::new(SiteConfig::default(), urlpatterns())
    }

    async fn send(router: Router, method: Method, uri: &str) -> Response {
        router
            .oneshot(
                axum::http::Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_root_serves_home_page() {
        let response = send(server().router(), Method::GET, "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("<h2>Homepage</h2>"));
    }

    #[tokio::test]
    async fn test_about_serves_about_page() {
        let response = send(server().router(), Method::GET, "/about/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("<h2>About page</h2>"));
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let response = send(server().router(), Method::GET, "/missing/").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("Not Found"));
    }

    #[tokio::test]
    async fn test_root_pattern_is_not_a_prefix() {
        let response = send(server().router(), Method::GET, "/about/team/").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_slash_redirects_with_query() {
        let response = send(server().router(), Method::GET, "/about?lang=en").await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "/about/?lang=en");
    }

    #[tokio::test]
    async fn test_missing_slash_post_is_not_redirected() {
        let response = send(server().router(), Method::POST, "/about").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_append_slash_can_be_disabled() {
        let mut config = SiteConfig::default();
        config.site.append_slash = false;
        let server = HttpServer::new(config, urlpatterns());

        let response = send(server.router(), Method::GET, "/about").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_views_accept_any_method() {
        let response = send(server().router(), Method::POST, "/about/").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_id_and_security_headers() {
        let response = send(server().router(), Method::GET, "/").await;
        let id = response.headers()["x-request-id"].to_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
    }

    #[tokio::test]
    async fn test_client_request_id_is_echoed() {
        let response = server()
            .router()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/")
                    .header("x-request-id", "client-supplied")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "client-supplied");
    }

    #[tokio::test]
    async fn test_security_headers_can_be_disabled() {
        let mut config = SiteConfig::default();
        config.security.enable_headers = false;
        let server = HttpServer::new(config, urlpatterns());

        let response = send(server.router(), Method::GET, "/").await;
        assert!(response.headers().get(header::X_FRAME_OPTIONS).is_none());
    }

    #[tokio::test]
    async fn test_percent_encoded_path_is_decoded_before_resolving() {
        let response = send(server().router(), Method::GET, "/%61bout/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("<h2>About page</h2>"));
    }

    #[tokio::test]
    async fn test_encoded_missing_slash_redirect_keeps_encoding() {
        let response = send(server().router(), Method::GET, "/%61bout").await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "/%61bout/");
    }

    #[tokio::test]
    async fn test_oversized_body_gets_security_headers() {
        let mut config = SiteConfig::default();
        config.security.max_body_size = 16;
        let server = HttpServer::new(config, urlpatterns());

        let response = server
            .router()
            .oneshot(
                axum::http::Request::builder()
                    .method(Method::POST)
                    .uri("/")
                    .header(header::CONTENT_LENGTH, "64")
                    .body(Body::from(vec![b'x'; 64]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_request_gets_security_headers() {
        let mut config = SiteConfig::default();
        config.timeouts.request_secs = 1;
        let slow = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                "late"
            }),
        );

        let response = send(apply_layers(slow, &config), Method::GET, "/slow").await;

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[test]
    fn test_restart_required_sections() {
        let running = SiteConfig::default();
        let mut reloaded = SiteConfig::default();
        reloaded.site.title = "Renamed".to_string();
        assert!(restart_required_sections(&running, &reloaded).is_empty());

        reloaded.observability.log_level = "debug".to_string();
        reloaded.timeouts.request_secs = 5;
        assert_eq!(
            restart_required_sections(&running, &reloaded),
            vec!["timeouts", "observability"]
        );
    }

    #[tokio::test]
    async fn test_config_update_swaps_site_settings_only() {
        let server = server();
        let site = server.site_settings();
        let router = server.router();

        let mut reloaded = SiteConfig::default();
        reloaded.site.owner = "Grace Hopper".to_string();
        reloaded.listener.bind_address = "127.0.0.1:9999".to_string();
        apply_config_update(&site, server.config(), reloaded);

        let response = send(router, Method::GET, "/about/").await;
        assert!(body_text(response).await.contains("Grace Hopper"));
        assert_eq!(server.config().listener.bind_address, "127.0.0.1:8000");
    }
}
