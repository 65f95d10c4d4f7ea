//! Ordered route collection and its projections.
//!
//! # Responsibilities
//! - Keep more specific paths ahead of any generic path that would also match
//!   them, across inserts and removals
//! - Reject two entries claiming the same path
//! - Project the table as the environment line, the rendering order, and the
//!   document's locations map
//!
//! # Design Decisions
//! - "More generic" is not a strict weak ordering (mutually non-matching
//!   entries compare as unordered), so rendering order is produced by a
//!   hand-written stable insertion pass instead of the stdlib sort; ties keep
//!   their original relative order

use std::collections::BTreeMap;
use std::fmt;

use crate::error::Error;
use crate::routing::entry::RouteEntry;

/// The ordered set of all routes for one proxy service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingTable {
    entries: Vec<RouteEntry>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order (most specific first).
    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter()
    }

    /// Insert a route, keeping it ahead of the first existing entry that
    /// would also match its path.
    ///
    /// Fails with [`Error::DuplicatePath`] when the path is already claimed;
    /// the table is left unchanged in that case.
    pub fn add_route(&mut self, path: &str, backend: &str, port: u16) -> Result<(), Error> {
        let entry = RouteEntry::new(path, backend, port)?;
        match self
            .entries
            .iter()
            .position(|existing| existing.is_more_generic_than(&entry))
        {
            Some(index) => {
                if self.entries[index].path() == entry.path() {
                    return Err(Error::DuplicatePath(entry.path().to_string()));
                }
                self.entries.insert(index, entry);
            }
            None => self.entries.push(entry),
        }
        Ok(())
    }

    /// Remove every route targeting `backend`. No-op when none match.
    pub fn remove_routes_by_backend(&mut self, backend: &str) {
        self.entries.retain(|entry| entry.backend() != backend);
    }

    /// Remove the route with exactly this path. No-op when absent.
    pub fn remove_route(&mut self, path: &str) {
        if let Some(index) = self.entries.iter().position(|entry| entry.path() == path) {
            self.entries.remove(index);
        }
    }

    /// Parse the `;`-joined environment encoding. Empty segments are skipped,
    /// so a trailing separator or an empty string is fine.
    pub fn parse_from_line(line: &str) -> Result<Self, Error> {
        let entries = line
            .split(';')
            .filter(|segment| !segment.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<RouteEntry>, Error>>()?;
        Ok(Self { entries })
    }

    /// The `;`-joined environment encoding. An empty table yields `""`.
    pub fn serialize_to_line(&self) -> String {
        self.entries
            .iter()
            .map(RouteEntry::to_string)
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Entries in the order location blocks must be emitted: most specific
    /// first, every generic pattern after all entries it would also match.
    ///
    /// Each entry is placed before the first already-placed entry that is
    /// more generic than it; entries with no ordering between them keep their
    /// original relative order, so output is deterministic.
    pub fn sorted_for_rendering(&self) -> Vec<RouteEntry> {
        let mut sorted: Vec<RouteEntry> = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let index = sorted
                .iter()
                .position(|placed| placed.is_more_generic_than(entry))
                .unwrap_or(sorted.len());
            sorted.insert(index, entry.clone());
        }
        sorted
    }

    /// The `path → "backend:port"` map persisted under `x-meta.locations`.
    pub fn locations(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|entry| (entry.path().to_string(), entry.upstream()))
            .collect()
    }
}

impl fmt::Display for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize_to_line())
    }
}
