//! Document persistence subsystem.
//!
//! # Data Flow
//! ```text
//! docker-compose.yml
//!     → codec.rs (parse & deserialize)
//!     → schema.rs types (ComposeFile, ServiceSpec, MetaSection)
//!     → ServiceRegistry (typed in-memory view, owns the routing table)
//!
//! On save:
//!     ServiceRegistry::to_document()
//!     → codec.rs (serialize & write)
//! ```
//!
//! # Design Decisions
//! - The document is read once at process start and written once after a
//!   successful command; single-writer, single-process, no locking
//! - Schema types round-trip unknown keys so hand-edited documents survive

pub mod codec;
pub mod schema;

pub use codec::{load, save, DOCUMENT_NAME};
pub use schema::{ComposeFile, MetaSection, NetworkSpec, PortMapping, ServiceData, ServiceSpec};
