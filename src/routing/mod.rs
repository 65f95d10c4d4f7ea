//! Routing table subsystem.
//!
//! # Data Flow
//! ```text
//! CLI mutation (add / remove route)
//!     → table.rs (ordered insert, duplicate check)
//!     → two projections:
//!         serialize_to_line()    → DYNAMIC_SERVER env of the proxy service
//!         sorted_for_rendering() → nginx location blocks
//!         locations()            → x-meta.locations map in the document
//! ```
//!
//! # Design Decisions
//! - Entries are kept most-specific-first so "first match wins" holds for any
//!   consumer walking the list in order
//! - Paths are regex-capable prefixes; containment is tested on the literal
//!   path strings of two entries, not on live traffic
//! - O(n) insert; tables hold tens of routes, nothing richer is warranted
//! - The document's `locations` map is a pure projection of the table, so the
//!   two persisted views cannot diverge through this crate

pub mod entry;
pub mod table;

pub use entry::RouteEntry;
pub use table::RoutingTable;

/// Environment variable on the proxy service that carries the encoded table.
pub const ROUTES_ENV_VAR: &str = "DYNAMIC_SERVER";
