//! A single path → backend mapping.

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::error::Error;

/// One `path → (backend, port)` mapping owned by the proxy's routing table.
///
/// The path doubles as a start-anchored regex when entries are compared for
/// specificity. Equal paths match each other in both directions, so the
/// "more generic" relation is not antisymmetric and callers must special-case
/// equality themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    path: String,
    backend: String,
    port: u16,
}

impl RouteEntry {
    /// Create a validated entry.
    ///
    /// The path must compile as a pattern and must not contain `;` (the line
    /// separator); the backend name must not contain `:` (the field
    /// separator); the port must be non-zero.
    pub fn new(
        path: impl Into<String>,
        backend: impl Into<String>,
        port: u16,
    ) -> Result<Self, Error> {
        let path = path.into();
        let backend = backend.into();
        if path.is_empty() || path.contains(';') {
            return Err(Error::Format(format!("invalid route path {path:?}")));
        }
        if backend.is_empty() || backend.contains(':') {
            return Err(Error::Format(format!("invalid backend name {backend:?}")));
        }
        if port == 0 {
            return Err(Error::Format(format!("invalid port 0 for path {path}")));
        }
        if Regex::new(&anchored(&path)).is_err() {
            return Err(Error::Format(format!("path {path:?} is not a valid pattern")));
        }
        Ok(Self { path, backend, port })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// True iff this entry's path, used as a start-anchored pattern, matches
    /// the other entry's path.
    pub fn is_more_generic_than(&self, other: &RouteEntry) -> bool {
        Regex::new(&anchored(&self.path))
            .map(|re| re.is_match(&other.path))
            .unwrap_or(false)
    }

    /// The `name:port` upstream half of this entry, as stored in the
    /// document's `locations` map.
    pub fn upstream(&self) -> String {
        format!("{}:{}", self.backend, self.port)
    }
}

fn anchored(path: &str) -> String {
    format!("^(?:{path})")
}

impl fmt::Display for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path, self.backend, self.port)
    }
}

impl FromStr for RouteEntry {
    type Err = Error;

    /// Parse `path:backend:port`. The backend name cannot contain `:`, so the
    /// two rightmost fields are split off first and any remaining colons stay
    /// part of the path.
    fn from_str(s: &str) -> Result<Self, Error> {
        let mut fields = s.rsplitn(3, ':');
        let port = fields.next();
        let backend = fields.next();
        let path = fields.next();
        match (path, backend, port) {
            (Some(path), Some(backend), Some(port)) => {
                let port: u16 = port
                    .parse()
                    .map_err(|_| Error::Format(format!("invalid port in route {s:?}")))?;
                Self::new(path, backend, port)
            }
            _ => Err(Error::Format(format!(
                "route {s:?} has fewer than 3 colon-delimited fields"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize() {
        let entry = RouteEntry::new("/api", "group.api", 3000).unwrap();
        assert_eq!(entry.to_string(), "/api:group.api:3000");
        assert_eq!(entry.upstream(), "group.api:3000");
    }

    #[test]
    fn test_parse_round_trip() {
        let entry: RouteEntry = "/api/v2:group.api:3000".parse().unwrap();
        assert_eq!(entry.path(), "/api/v2");
        assert_eq!(entry.backend(), "group.api");
        assert_eq!(entry.port(), 3000);
        assert_eq!(entry.to_string(), "/api/v2:group.api:3000");
    }

    #[test]
    fn test_parse_rejects_short_input() {
        assert!("only:two".parse::<RouteEntry>().is_err());
        assert!("justpath".parse::<RouteEntry>().is_err());
        assert!("".parse::<RouteEntry>().is_err());
    }

    #[test]
    fn test_parse_rejects_bad_port() {
        assert!("/api:name:notaport".parse::<RouteEntry>().is_err());
        assert!("/api:name:0".parse::<RouteEntry>().is_err());
        assert!("/api:name:70000".parse::<RouteEntry>().is_err());
    }

    #[test]
    fn test_new_rejects_separators_in_fields() {
        assert!(RouteEntry::new("/a;b", "name", 80).is_err());
        assert!(RouteEntry::new("/a", "na:me", 80).is_err());
        assert!(RouteEntry::new("/a(", "name", 80).is_err());
    }

    #[test]
    fn test_prefix_is_more_generic() {
        let api = RouteEntry::new("/api", "a", 1).unwrap();
        let api_v2 = RouteEntry::new("/api/v2", "b", 2).unwrap();
        assert!(api.is_more_generic_than(&api_v2));
        assert!(!api_v2.is_more_generic_than(&api));
    }

    #[test]
    fn test_root_is_more_generic_than_everything() {
        let root = RouteEntry::new("/", "spa", 80).unwrap();
        let other = RouteEntry::new("/x", "x", 1).unwrap();
        assert!(root.is_more_generic_than(&other));
        assert!(!other.is_more_generic_than(&root));
    }

    #[test]
    fn test_equal_paths_match_both_ways() {
        let a = RouteEntry::new("/api", "a", 1).unwrap();
        let b = RouteEntry::new("/api", "b", 2).unwrap();
        assert!(a.is_more_generic_than(&b));
        assert!(b.is_more_generic_than(&a));
    }

    #[test]
    fn test_unrelated_paths_match_neither_way() {
        let a = RouteEntry::new("/api", "a", 1).unwrap();
        let b = RouteEntry::new("/static", "b", 2).unwrap();
        assert!(!a.is_more_generic_than(&b));
        assert!(!b.is_more_generic_than(&a));
    }
}
