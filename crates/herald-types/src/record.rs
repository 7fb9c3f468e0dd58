//! Storage records and the field-set request vocabulary.
//!
//! Storage is consulted through field sets: callers name the fields they
//! will read and the store may leave everything else at its default.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Fields of a [`UserRecord`] that can be requested from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserField {
    /// Always present.
    Id,
    /// Display name.
    Name,
    /// Authority level.
    Authority,
    /// Per-command usage counters.
    Usage,
    /// Per-command last-call timestamps.
    Timers,
    /// Free-form flag bits.
    Flags,
}

/// Fields of a [`GroupRecord`] that can be requested from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupField {
    /// Always present.
    Id,
    /// Bot account responsible for the group.
    Assignee,
    /// Free-form flag bits.
    Flags,
}

/// A set of requested fields.
pub type FieldSet<F> = BTreeSet<F>;

/// Daily invocation counter for one command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCount {
    /// Day number (days since the Unix epoch, UTC) the count belongs to.
    pub day: i64,
    /// Accepted invocations on that day.
    pub count: u32,
}

/// Persisted user data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRecord {
    /// User id.
    pub id: u64,
    /// Display name.
    pub name: Option<String>,
    /// Privilege level; commands and options carry minimum thresholds.
    pub authority: u32,
    /// Usage counters keyed by usage name.
    pub usage: BTreeMap<String, UsageCount>,
    /// Last accepted call per usage name, in milliseconds since the epoch.
    pub timers: BTreeMap<String, i64>,
    /// Flag bits.
    pub flags: u64,
}

impl UserRecord {
    /// Creates a record with the given authority.
    #[must_use]
    pub fn new(id: u64, authority: u32) -> Self {
        Self {
            id,
            authority,
            ..Self::default()
        }
    }
}

/// Persisted group data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupRecord {
    /// Group id.
    pub id: u64,
    /// Bot account that should answer in this group, if pinned.
    pub assignee: Option<u64>,
    /// Flag bits.
    pub flags: u64,
}

impl GroupRecord {
    /// Creates a record with no assignee.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}
