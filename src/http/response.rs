//! Response helpers.
//!
//! # Responsibilities
//! - Build redirect responses for slash-less URLs
//! - Add security response headers (optional)
//!
//! # Design Decisions
//! - Security headers never overwrite a value a view set itself
//! - Slash redirects are permanent (301)

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

fn security_headers() -> [(HeaderName, HeaderValue); 3] {
    [
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        (header::REFERRER_POLICY, HeaderValue::from_static("same-origin")),
    ]
}

/// `301 Moved Permanently` to `location`.
pub fn permanent_redirect(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, value)]).into_response(),
        Err(_) => {
            tracing::warn!(location = %location, "Redirect target is not a valid header value");
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}

/// Add the security response headers to every response of `router`.
pub fn with_security_headers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    security_headers()
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(name, value))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permanent_redirect() {
        let response = permanent_redirect("/about/?lang=en");
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "/about/?lang=en");
    }

    #[test]
    fn test_invalid_redirect_target() {
        let response = permanent_redirect("/bad\nheader");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
