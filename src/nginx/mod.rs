//! Reverse-proxy configuration generation.
//!
//! # Responsibilities
//! - Splice one `location` block per route into a static site template
//! - Locate the insertion point inside the template
//! - Write the rendered site file, creating parent directories as needed
//!
//! # Design Decisions
//! - Everything outside the generated blocks passes through unchanged; all
//!   other nginx semantics belong to the template, not this tool
//! - Blocks are spliced before the root catch-all `location / {` line so the
//!   catch-all keeps matching last

pub mod generator;

pub use generator::{render, render_site};
