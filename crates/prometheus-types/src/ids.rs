//! Identifier of live entity instances.
//!
//! Instances are identified by UUID v7 values generated at creation time.
//! v7 values are time-ordered and never reused within a process, so a stale
//! handle can never alias a newer instance.
//!
//! Type and evolution-condition identifiers are plain strings chosen by the
//! registering code and are not wrapped here.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Process-unique identifier of a live entity instance.
///
/// Stamped once by the lifecycle manager when the instance is created.
/// Serializes as the bare UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub Uuid);

impl InstanceId {
    /// A fresh v7 identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The wrapped UUID.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for InstanceId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn fresh_ids_are_distinct() {
        let ids: BTreeSet<InstanceId> = (0..1000).map(|_| InstanceId::new()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn display_matches_inner_uuid() {
        let id = InstanceId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }

    #[test]
    fn serializes_as_bare_uuid() {
        let uuid = Uuid::now_v7();
        let id = InstanceId::from(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
        assert_eq!(serde_json::from_str::<InstanceId>(&json).unwrap(), id);
    }
}
