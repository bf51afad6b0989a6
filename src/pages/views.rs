//! Page views.
//!
//! Each view takes the request context and returns a complete response.

use axum::http::StatusCode;
use axum::response::Response;
use maud::html;

use crate::pages::templates::{layout, render};
use crate::routing::ViewContext;

/// `/`: site title and tagline.
pub fn home_page_view(ctx: &ViewContext<'_>) -> Response {
    let body = layout(
        ctx,
        "Home",
        html! {
            h2 { "Homepage" }
            p { (ctx.site.tagline) }
        },
    );
    render(StatusCode::OK, body)
}

/// `/about/`: who runs the site.
pub fn about_page_view(ctx: &ViewContext<'_>) -> Response {
    let body = layout(
        ctx,
        "About",
        html! {
            h2 { "About page" }
            p { "This website is run by " (ctx.site.owner) "." }
        },
    );
    render(StatusCode::OK, body)
}

/// Answer for paths no route matches.
pub fn page_not_found(ctx: &ViewContext<'_>) -> Response {
    let body = layout(
        ctx,
        "Not Found",
        html! {
            h2 { "Not Found" }
            p { "The requested resource was not found on this server." }
        },
    );
    render(StatusCode::NOT_FOUND, body)
}
