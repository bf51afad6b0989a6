//! Shared page layout.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use maud::{html, Markup, DOCTYPE};

use crate::routing::ViewContext;

/// Navigation entries as (route name, label).
const NAV_LINKS: &[(&str, &str)] = &[("home", "Home"), ("about", "About")];

/// Wrap page content in the site layout.
///
/// Navigation links are reversed from the route table, so a link only
/// appears when its route is declared.
pub fn layout(ctx: &ViewContext<'_>, page_title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (page_title) " | " (ctx.site.title) }
            }
            body {
                header {
                    h1 { (ctx.site.title) }
                    nav {
                        @for (name, label) in NAV_LINKS {
                            @if let Some(href) = ctx.urls.reverse(name) {
                                a href=(href) { (label) } " "
                            }
                        }
                    }
                }
                main {
                    (content)
                }
            }
        }
    }
}

/// Render markup as an HTML response with the given status.
pub fn render(status: StatusCode, markup: Markup) -> Response {
    (status, Html(markup.into_string())).into_response()
}
