//! Per-kind allow/deny id sets.
//!
//! A [`ScopeSet`] describes which ids of a single [`IdentityKind`] are
//! reachable. It is either an allow-list ([`ScopeSet::Include`]) or a
//! deny-list ([`ScopeSet::Exclude`]); the enum makes "both" and "neither"
//! unrepresentable.
//!
//! # Algebra
//!
//! | op | inc ∘ inc | inc ∘ exc | exc ∘ inc | exc ∘ exc |
//! |----|-----------|-----------|-----------|-----------|
//! | `plus` | inc a∪b | exc b−a | exc a−b | exc a∩b |
//! | `minus` | inc a−b | inc a∩b | exc a∪b | inc b−a |
//! | `intersect` | inc a∩b | inc a−b | inc b−a | exc a∪b |
//!
//! [`IdentityKind`]: crate::IdentityKind

use crate::ErrorCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Allow-list or deny-list over the ids of one identity kind.
///
/// `Exclude({})` matches everything, `Include({})` matches nothing.
///
/// # Example
///
/// ```
/// use herald_types::ScopeSet;
///
/// let admins = ScopeSet::include([1, 2]);
/// let not_banned = ScopeSet::exclude([2]);
///
/// let both = admins.intersect(&not_banned);
/// assert!(both.matches(1));
/// assert!(!both.matches(2));
/// assert!(!both.matches(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeSet {
    /// Matches only the listed ids.
    Include(BTreeSet<u64>),
    /// Matches every id except the listed ones.
    Exclude(BTreeSet<u64>),
}

impl ScopeSet {
    /// Scope matching every id.
    #[must_use]
    pub fn all() -> Self {
        Self::Exclude(BTreeSet::new())
    }

    /// Scope matching no id.
    #[must_use]
    pub fn none() -> Self {
        Self::Include(BTreeSet::new())
    }

    /// Allow-list of `ids`.
    #[must_use]
    pub fn include(ids: impl IntoIterator<Item = u64>) -> Self {
        Self::Include(ids.into_iter().collect())
    }

    /// Deny-list of `ids`.
    #[must_use]
    pub fn exclude(ids: impl IntoIterator<Item = u64>) -> Self {
        Self::Exclude(ids.into_iter().collect())
    }

    /// Returns `true` for the match-everything scope.
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::Exclude(ids) if ids.is_empty())
    }

    /// Returns `true` for the match-nothing scope.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::Include(ids) if ids.is_empty())
    }

    /// Returns `true` if `id` is reachable through this scope.
    #[must_use]
    pub fn matches(&self, id: u64) -> bool {
        match self {
            Self::Include(ids) => ids.contains(&id),
            Self::Exclude(ids) => !ids.contains(&id),
        }
    }

    /// Union: matches what either side matches.
    #[must_use]
    pub fn plus(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Include(a), Self::Include(b)) => Self::Include(a | b),
            (Self::Include(a), Self::Exclude(b)) => Self::Exclude(b - a),
            (Self::Exclude(a), Self::Include(b)) => Self::Exclude(a - b),
            (Self::Exclude(a), Self::Exclude(b)) => Self::Exclude(a & b),
        }
    }

    /// Difference: matches what `self` matches and `other` does not.
    #[must_use]
    pub fn minus(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Include(a), Self::Include(b)) => Self::Include(a - b),
            (Self::Include(a), Self::Exclude(b)) => Self::Include(a & b),
            (Self::Exclude(a), Self::Include(b)) => Self::Exclude(a | b),
            (Self::Exclude(a), Self::Exclude(b)) => Self::Include(b - a),
        }
    }

    /// Intersection: matches what both sides match.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Include(a), Self::Include(b)) => Self::Include(a & b),
            (Self::Include(a), Self::Exclude(b)) => Self::Include(a - b),
            (Self::Exclude(a), Self::Include(b)) => Self::Include(b - a),
            (Self::Exclude(a), Self::Exclude(b)) => Self::Exclude(a | b),
        }
    }

    /// Complement: swaps allow-list and deny-list.
    #[must_use]
    pub fn inverse(&self) -> Self {
        match self {
            Self::Include(ids) => Self::Exclude(ids.clone()),
            Self::Exclude(ids) => Self::Include(ids.clone()),
        }
    }

    /// Returns `true` if every id matched by `other` is matched by `self`.
    ///
    /// An allow-list never contains a deny-list, since a deny-list matches
    /// infinitely many ids.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Include(a), Self::Include(b)) => b.is_subset(a),
            (Self::Include(_), Self::Exclude(_)) => false,
            (Self::Exclude(a), Self::Include(b)) => a.is_disjoint(b),
            (Self::Exclude(a), Self::Exclude(b)) => a.is_subset(b),
        }
    }

    /// The listed ids, regardless of polarity.
    #[must_use]
    pub fn ids(&self) -> &BTreeSet<u64> {
        match self {
            Self::Include(ids) | Self::Exclude(ids) => ids,
        }
    }
}

impl Default for ScopeSet {
    fn default() -> Self {
        Self::all()
    }
}

/// Malformed canonical scope text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeParseError {
    /// Segment does not start with `+` or `-`.
    #[error("scope segment '{0}' must start with '+' or '-'")]
    MissingSign(String),

    /// Segment has no `:` between kind and ids.
    #[error("scope segment '{0}' is missing ':'")]
    MissingSeparator(String),

    /// Kind name is not one of user/group/discuss.
    #[error("unknown identity kind: {0}")]
    UnknownKind(String),

    /// An id is not a non-negative integer.
    #[error("invalid id '{value}' in scope segment '{segment}'")]
    InvalidId {
        /// Offending segment.
        segment: String,
        /// Offending id text.
        value: String,
    },

    /// The same kind appears in two segments.
    #[error("identity kind '{0}' appears more than once")]
    DuplicateKind(String),

    /// Nothing between two `;` separators, or a trailing `;`.
    #[error("empty scope segment")]
    EmptySegment,
}

impl ErrorCode for ScopeParseError {
    fn code(&self) -> &'static str {
        match self {
            Self::MissingSign(_) => "SCOPE_MISSING_SIGN",
            Self::MissingSeparator(_) => "SCOPE_MISSING_SEPARATOR",
            Self::UnknownKind(_) => "SCOPE_UNKNOWN_KIND",
            Self::InvalidId { .. } => "SCOPE_INVALID_ID",
            Self::DuplicateKind(_) => "SCOPE_DUPLICATE_KIND",
            Self::EmptySegment => "SCOPE_EMPTY_SEGMENT",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}
