//! Conversation identities.
//!
//! Every routed event belongs to exactly one conversation: a private chat
//! with a user, a group, or a discuss (ad-hoc multi-user chat). The pair of
//! [`IdentityKind`] and numeric id is what a [`Context`](crate::Context)
//! matches against.

use crate::ScopeParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of conversation categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    /// Private conversation with a single user.
    User,
    /// Group conversation.
    Group,
    /// Discuss (temporary multi-user) conversation.
    Discuss,
}

impl IdentityKind {
    /// All kinds in canonical order.
    ///
    /// The order is part of the canonical scope text form.
    pub const ALL: [IdentityKind; 3] = [Self::User, Self::Group, Self::Discuss];

    /// Position of this kind inside [`IdentityKind::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::User => 0,
            Self::Group => 1,
            Self::Discuss => 2,
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::Discuss => "discuss",
        }
    }
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityKind {
    type Err = ScopeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "group" => Ok(Self::Group),
            "discuss" => Ok(Self::Discuss),
            other => Err(ScopeParseError::UnknownKind(other.to_string())),
        }
    }
}

/// A concrete conversation: kind plus numeric id.
///
/// # Example
///
/// ```
/// use herald_types::{Identity, IdentityKind};
///
/// let group = Identity::group(100);
/// assert_eq!(group.kind, IdentityKind::Group);
/// assert_eq!(group.to_string(), "group:100");
/// assert_eq!("group:100".parse::<Identity>().unwrap(), group);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Conversation kind.
    pub kind: IdentityKind,
    /// Conversation id within that kind.
    pub id: u64,
}

impl Identity {
    /// Creates an identity.
    #[must_use]
    pub fn new(kind: IdentityKind, id: u64) -> Self {
        Self { kind, id }
    }

    /// Private conversation with `id`.
    #[must_use]
    pub fn user(id: u64) -> Self {
        Self::new(IdentityKind::User, id)
    }

    /// Group conversation `id`.
    #[must_use]
    pub fn group(id: u64) -> Self {
        Self::new(IdentityKind::Group, id)
    }

    /// Discuss conversation `id`.
    #[must_use]
    pub fn discuss(id: u64) -> Self {
        Self::new(IdentityKind::Discuss, id)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for Identity {
    type Err = ScopeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| ScopeParseError::MissingSeparator(s.to_string()))?;
        let kind = kind.parse()?;
        let id = id.parse().map_err(|_| ScopeParseError::InvalidId {
            segment: s.to_string(),
            value: id.to_string(),
        })?;
        Ok(Self { kind, id })
    }
}
