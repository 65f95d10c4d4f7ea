//! Service registry subsystem.
//!
//! # Responsibilities
//! - Hold the named service definitions of one group
//! - Distinguish the proxy service and give it sole ownership of the
//!   routing table
//! - Convert between the persisted document and the typed in-memory view
//!
//! # Design Decisions
//! - The proxy is its own typed field, not a name-flagged entry in the
//!   service map, so routing-table ownership is encoded in the type system
//! - `x-meta.locations` is written as a projection of the routing table and
//!   cross-checked on load; a mismatch means the document was edited outside
//!   this tool and is fatal
//! - Removing a service does not remove its routes; callers that want both
//!   must remove the routes first (some deliberately keep stale entries)

pub mod registry;

pub use registry::{ProxyService, ServiceEntry, ServiceRegistry, ServiceRole};
