//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → matcher.rs (percent-decode, normalise path, exact pattern match)
//!     → router.rs (scan table in order)
//!     → Return: ResolverMatch (route + view) or None
//!
//! Table construction (at startup):
//!     pages::urls::urlpatterns()
//!     → RouteTable::check (malformed patterns fatal, duplicates warned)
//!     → Freeze behind Arc, shared by every request task
//! ```
//!
//! # Design Decisions
//! - Routes built at startup, immutable at runtime
//! - No regex; literal patterns only
//! - Deterministic: same path always resolves to the same route
//! - First match wins (declaration order)

pub mod matcher;
pub mod router;

pub use matcher::{decode_path, normalize_path, RoutePattern};
pub use router::{
    path, ResolverMatch, Route, RouteTable, RouteWarning, View, ViewContext, ViewFn,
};

use thiserror::Error;

/// Fatal problems found while loading the route table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// Patterns are matched against paths with the leading slash removed.
    #[error("route pattern {pattern:?} starts with '/' and can never match")]
    LeadingSlash { pattern: String },

    #[error("route pattern {pattern:?} is invalid: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}
