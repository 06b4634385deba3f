//! Composite resource identities.
//!
//! Every managed resource is addressed by an opaque string built from its
//! natural keys, for example `my-project/my-pg` for a service or
//! `my-project/my-es/logs-*/alice` for an index ACL rule.
//!
//! # Format
//!
//! Parts are joined with [`SEPARATOR`]. A literal separator or [`ESCAPE`]
//! inside a part is prefixed with [`ESCAPE`], so any sequence of parts
//! survives a round trip:
//!
//! ```
//! use cloudsvc_core::id::{decode, encode};
//!
//! let parts = ["acme", "logs/primary", ""];
//! let id = encode(&parts);
//! assert_eq!(id, r"acme/logs\/primary/");
//! assert_eq!(decode(&id, 3).unwrap(), parts);
//! ```
//!
//! Identities are built purely from user-supplied keys, so delete and import
//! can address a resource before anything has been read from the remote API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Separator placed between identity parts.
pub const SEPARATOR: char = '/';

/// Escape prefix for literal separators and escapes inside a part.
pub const ESCAPE: char = '\\';

/// Joins parts into a composite identity, escaping as needed.
pub fn encode<S: AsRef<str>>(parts: &[S]) -> String {
    let capacity = parts.iter().map(|p| p.as_ref().len() + 1).sum();
    let mut out = String::with_capacity(capacity);
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        for ch in part.as_ref().chars() {
            if ch == SEPARATOR || ch == ESCAPE {
                out.push(ESCAPE);
            }
            out.push(ch);
        }
    }
    out
}

/// Splits a composite identity into exactly `expected` parts.
///
/// # Errors
///
/// Returns [`CoreError::MalformedIdentity`] when the number of parts differs
/// from `expected` or when an escape sequence is dangling or unknown.
pub fn decode(id: &str, expected: usize) -> Result<Vec<String>> {
    let mut parts = Vec::with_capacity(expected);
    let mut current = String::new();
    let mut chars = id.chars();

    while let Some(ch) = chars.next() {
        match ch {
            ESCAPE => match chars.next() {
                Some(escaped @ (SEPARATOR | ESCAPE)) => current.push(escaped),
                Some(other) => {
                    return Err(CoreError::malformed_identity(
                        id,
                        format!("unknown escape sequence '{ESCAPE}{other}'"),
                    ));
                }
                None => {
                    return Err(CoreError::malformed_identity(id, "dangling escape at end"));
                }
            },
            SEPARATOR => parts.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    parts.push(current);

    if parts.len() != expected {
        return Err(CoreError::malformed_identity(
            id,
            format!("expected {expected} parts, found {}", parts.len()),
        ));
    }
    Ok(parts)
}

/// Fixed-arity variant of [`decode`].
pub fn decode_parts<const N: usize>(id: &str) -> Result<[String; N]> {
    let parts = decode(id, N)?;
    parts
        .try_into()
        .map_err(|_| CoreError::malformed_identity(id, format!("expected {N} parts")))
}

/// Identity of a managed service: `<project>/<service_name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceId {
    pub project: String,
    pub service_name: String,
}

impl ServiceId {
    pub fn new(project: impl Into<String>, service_name: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            service_name: service_name.into(),
        }
    }

    /// Returns the opaque identity string.
    pub fn encode(&self) -> String {
        encode(&[self.project.as_str(), self.service_name.as_str()])
    }
}

impl FromStr for ServiceId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let [project, service_name] = decode_parts::<2>(s)?;
        Ok(Self {
            project,
            service_name,
        })
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl Serialize for ServiceId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for ServiceId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Reference to a project VPC: `<project>/<vpc_id>`.
///
/// The remote API only knows the bare VPC id; the project prefix keeps the
/// reference resolvable on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VpcId {
    pub project: String,
    pub vpc_id: String,
}

impl VpcId {
    pub fn new(project: impl Into<String>, vpc_id: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            vpc_id: vpc_id.into(),
        }
    }

    pub fn encode(&self) -> String {
        encode(&[self.project.as_str(), self.vpc_id.as_str()])
    }
}

impl FromStr for VpcId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let [project, vpc_id] = decode_parts::<2>(s)?;
        Ok(Self { project, vpc_id })
    }
}

impl fmt::Display for VpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_plain_parts() {
        assert_eq!(encode(&["acme", "pg-main"]), "acme/pg-main");
        assert_eq!(encode(&["acme", "es", "logs", "alice"]), "acme/es/logs/alice");
    }

    #[test]
    fn test_encode_escapes_separator_and_escape() {
        assert_eq!(encode(&["a/b", "c"]), r"a\/b/c");
        assert_eq!(encode(&[r"a\b", "c"]), r"a\\b/c");
    }

    #[test]
    fn test_empty_parts_survive() {
        let id = encode(&["", ""]);
        assert_eq!(id, "/");
        assert_eq!(decode(&id, 2).unwrap(), vec!["", ""]);

        let id = encode(&["p", "", "u"]);
        assert_eq!(decode(&id, 3).unwrap(), vec!["p", "", "u"]);
    }

    #[test]
    fn test_wrong_part_count_is_rejected() {
        let err = decode("a/b/c", 2).unwrap_err();
        assert!(matches!(err, CoreError::MalformedIdentity { .. }));
        assert!(err.to_string().contains("expected 2 parts, found 3"));

        assert!(decode("only-one", 2).is_err());
    }

    #[test]
    fn test_unbalanced_escape_is_rejected() {
        assert!(decode(r"a/b\", 2).is_err());
        assert!(decode(r"a\x/b", 2).is_err());
    }

    #[test]
    fn test_escaped_separator_is_not_a_boundary() {
        assert_eq!(decode(r"a\/b/c", 2).unwrap(), vec!["a/b", "c"]);
        assert!(decode(r"a\/b\/c", 2).is_err());
    }

    #[test]
    fn test_decode_parts_fixed_arity() {
        let [project, service, index, user] = decode_parts::<4>("p/s/logs-*/alice").unwrap();
        assert_eq!(
            (project.as_str(), service.as_str(), index.as_str(), user.as_str()),
            ("p", "s", "logs-*", "alice")
        );
        assert!(decode_parts::<3>("p/s").is_err());
    }

    #[test]
    fn test_service_id_round_trip() {
        let id = ServiceId::new("acme", "kafka/1");
        let encoded = id.to_string();
        assert_eq!(encoded, r"acme/kafka\/1");
        assert_eq!(encoded.parse::<ServiceId>().unwrap(), id);
    }

    #[test]
    fn test_service_id_serde_as_string() {
        let id = ServiceId::new("acme", "pg");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"acme/pg\"");
        let back: ServiceId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<ServiceId>("\"no-separator\"").is_err());
    }

    #[test]
    fn test_vpc_id_parse() {
        let vpc: VpcId = "acme/1234-abcd".parse().unwrap();
        assert_eq!(vpc.project, "acme");
        assert_eq!(vpc.vpc_id, "1234-abcd");
        assert_eq!(vpc.to_string(), "acme/1234-abcd");
    }
}
