//! The site's pages.
//!
//! # Data Flow
//! ```text
//! urls.rs (route declarations)
//!     → RouteTable handed to the HTTP server at startup
//!     → views.rs (one function per page)
//!     → templates.rs (shared layout, HTML response)
//! ```

pub mod templates;
pub mod urls;
pub mod views;

pub use urls::urlpatterns;
pub use views::{about_page_view, home_page_view, page_not_found};
