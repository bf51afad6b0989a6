//! URL declarations for the site.

use crate::pages::views::{about_page_view, home_page_view};
use crate::routing::{path, RouteTable};
use crate::view;

/// The site's route table, in match order.
pub fn urlpatterns() -> RouteTable {
    RouteTable::new(vec![
        path("", view!(home_page_view)).named("home"),
        path("about/", view!(about_page_view)).named("about"),
    ])
}
