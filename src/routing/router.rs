//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store the ordered route table
//! - Look up the matching route for a request path
//! - Return the matched route or an explicit no-match
//! - Compute URLs from route names (reverse)
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in declaration order; first match wins
//! - Explicit `None` rather than a silent default route

use std::collections::HashMap;
use std::fmt;

use axum::http::Method;
use axum::response::Response;

use crate::config::SiteSettings;
use crate::routing::matcher::{normalize_path, RoutePattern};
use crate::routing::RouteError;

/// Everything a view can see about the request it is answering.
pub struct ViewContext<'a> {
    pub method: &'a Method,
    /// Percent-decoded request path, including the leading slash.
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub site: &'a SiteSettings,
    /// The table the request was resolved against, for building links.
    pub urls: &'a RouteTable,
}

/// Signature every view function has.
pub type ViewFn = fn(&ViewContext<'_>) -> Response;

/// A named reference to a view function.
///
/// The name is the function's identifier, captured where the route is
/// declared. Use the [`view!`](crate::view) macro to build one.
#[derive(Clone, Copy)]
pub struct View {
    name: &'static str,
    func: ViewFn,
}

impl View {
    pub const fn new(name: &'static str, func: ViewFn) -> Self {
        Self { name, func }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn call(&self, ctx: &ViewContext<'_>) -> Response {
        (self.func)(ctx)
    }
}

// Function pointer addresses are not stable across codegen units, so views
// compare by identifier.
impl PartialEq for View {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for View {}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("View").field(&self.name).finish()
    }
}

/// Build a [`View`] from a function in scope, recording its identifier.
#[macro_export]
macro_rules! view {
    ($func:ident) => {
        $crate::routing::View::new(stringify!($func), $func)
    };
}

/// A single entry of the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pattern: RoutePattern,
    view: View,
    name: Option<String>,
}

impl Route {
    pub fn new(pattern: impl Into<String>, view: View) -> Self {
        Self {
            pattern: RoutePattern::new(pattern),
            view,
            name: None,
        }
    }

    /// Attach a name usable with [`RouteTable::reverse`].
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Declare a route: `path("about/", view!(about_page_view))`.
pub fn path(pattern: &str, view: View) -> Route {
    Route::new(pattern, view)
}

/// Result of a successful lookup.
#[derive(Debug, Clone, Copy)]
pub struct ResolverMatch<'a> {
    pub route: &'a Route,
    /// Position of the route in the table.
    pub index: usize,
}

impl ResolverMatch<'_> {
    pub fn view(&self) -> View {
        self.route.view
    }

    pub fn view_name(&self) -> &'static str {
        self.route.view.name
    }
}

/// Non-fatal findings from [`RouteTable::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteWarning {
    /// A later route repeats an earlier pattern and can never be reached.
    DuplicatePattern {
        pattern: String,
        first: usize,
        shadowed: usize,
    },
    /// Two routes share a name; reverse resolves to the first.
    DuplicateName {
        name: String,
        first: usize,
        shadowed: usize,
    },
}

impl fmt::Display for RouteWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteWarning::DuplicatePattern { pattern, first, shadowed } => write!(
                f,
                "route #{shadowed} repeats pattern {pattern:?} of route #{first} and is unreachable"
            ),
            RouteWarning::DuplicateName { name, first, shadowed } => write!(
                f,
                "route #{shadowed} reuses name {name:?} of route #{first}"
            ),
        }
    }
}

/// Ordered, immutable routing table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Route> {
        self.routes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Find the first route whose pattern matches the request path.
    pub fn resolve(&self, request_path: &str) -> Option<ResolverMatch<'_>> {
        let normalized = normalize_path(request_path);
        self.routes
            .iter()
            .enumerate()
            .find(|(_, route)| route.pattern.matches(normalized))
            .map(|(index, route)| ResolverMatch { route, index })
    }

    /// URL path of the first route declared with `name`.
    pub fn reverse(&self, name: &str) -> Option<String> {
        self.routes
            .iter()
            .find(|route| route.name.as_deref() == Some(name))
            .map(|route| route.pattern.to_url())
    }

    /// Load-time checks.
    ///
    /// Malformed patterns are fatal. Duplicates are reported as warnings
    /// and logged; the table is still usable.
    pub fn check(&self) -> Result<Vec<RouteWarning>, RouteError> {
        let mut warnings = Vec::new();
        let mut patterns: HashMap<&str, usize> = HashMap::new();
        let mut names: HashMap<&str, usize> = HashMap::new();

        for (index, route) in self.routes.iter().enumerate() {
            route.pattern.check()?;

            if let Some(&first) = patterns.get(route.pattern.as_str()) {
                warnings.push(RouteWarning::DuplicatePattern {
                    pattern: route.pattern.as_str().to_string(),
                    first,
                    shadowed: index,
                });
            } else {
                patterns.insert(route.pattern.as_str(), index);
            }

            if let Some(name) = route.name.as_deref() {
                if let Some(&first) = names.get(name) {
                    warnings.push(RouteWarning::DuplicateName {
                        name: name.to_string(),
                        first,
                        shadowed: index,
                    });
                } else {
                    names.insert(name, index);
                }
            }
        }

        for warning in &warnings {
            tracing::warn!(%warning, "Route table check");
        }

        Ok(warnings)
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a Route;
    type IntoIter = std::slice::Iter<'a, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}
