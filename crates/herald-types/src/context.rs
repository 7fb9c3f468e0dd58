//! Cross-kind reachability scopes.
//!
//! A [`Context`] holds one [`ScopeSet`] per [`IdentityKind`] and decides
//! whether a command or middleware is reachable from a conversation.
//! Contexts are immutable values: every algebra operation returns a new one.
//!
//! # Canonical text form
//!
//! ```text
//! +user:1,2;-group:5
//! ```
//!
//! Only kinds whose scope differs from "everything" are written; ids are
//! sorted ascending. [`Context::all`] renders as the empty string and
//! [`Context::noop`] as [`NOOP_IDENTIFIER`].

use crate::{Identity, IdentityKind, ScopeParseError, ScopeSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Identifier of the context that matches nothing.
pub const NOOP_IDENTIFIER: &str = "+user:;+group:;+discuss:";

/// Where something is reachable, across all identity kinds.
///
/// # Example
///
/// ```
/// use herald_types::{Context, Identity, IdentityKind};
///
/// let staff_group = Context::only(IdentityKind::Group, [100]);
/// let everyone_private = Context::everyone(IdentityKind::User);
/// let scope = staff_group.plus(&everyone_private);
///
/// assert!(scope.matches(Identity::group(100)));
/// assert!(scope.matches(Identity::user(5)));
/// assert!(!scope.matches(Identity::group(200)));
/// assert_eq!(scope.identifier(), "+group:100;+discuss:");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Context {
    scopes: [ScopeSet; 3],
}

impl Context {
    /// Builds a context from one scope per kind, in [`IdentityKind::ALL`] order.
    #[must_use]
    pub fn new(user: ScopeSet, group: ScopeSet, discuss: ScopeSet) -> Self {
        Self {
            scopes: [user, group, discuss],
        }
    }

    /// Matches every conversation.
    #[must_use]
    pub fn all() -> Self {
        Self::new(ScopeSet::all(), ScopeSet::all(), ScopeSet::all())
    }

    /// Matches no conversation.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(ScopeSet::none(), ScopeSet::none(), ScopeSet::none())
    }

    /// Matches only the listed ids of `kind`, nothing of other kinds.
    #[must_use]
    pub fn only(kind: IdentityKind, ids: impl IntoIterator<Item = u64>) -> Self {
        Self::noop().with_scope(kind, ScopeSet::include(ids))
    }

    /// Matches every id of `kind`, nothing of other kinds.
    #[must_use]
    pub fn everyone(kind: IdentityKind) -> Self {
        Self::noop().with_scope(kind, ScopeSet::all())
    }

    /// Matches everything except the listed ids of `kind`.
    #[must_use]
    pub fn except(kind: IdentityKind, ids: impl IntoIterator<Item = u64>) -> Self {
        Self::all().with_scope(kind, ScopeSet::exclude(ids))
    }

    /// Returns a copy with the scope of `kind` replaced.
    #[must_use]
    pub fn with_scope(mut self, kind: IdentityKind, scope: ScopeSet) -> Self {
        self.scopes[kind.index()] = scope;
        self
    }

    /// The scope for one kind.
    #[must_use]
    pub fn scope(&self, kind: IdentityKind) -> &ScopeSet {
        &self.scopes[kind.index()]
    }

    /// Returns `true` if the conversation is reachable.
    #[must_use]
    pub fn matches(&self, identity: Identity) -> bool {
        self.scope(identity.kind).matches(identity.id)
    }

    /// Returns `true` if every conversation matched by `other` is matched by `self`.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.scopes
            .iter()
            .zip(other.scopes.iter())
            .all(|(mine, theirs)| mine.contains(theirs))
    }

    /// Union.
    #[must_use]
    pub fn plus(&self, other: &Self) -> Self {
        self.zip_with(other, ScopeSet::plus)
    }

    /// Difference.
    #[must_use]
    pub fn minus(&self, other: &Self) -> Self {
        self.zip_with(other, ScopeSet::minus)
    }

    /// Intersection.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        self.zip_with(other, ScopeSet::intersect)
    }

    /// Complement.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            scopes: [
                self.scopes[0].inverse(),
                self.scopes[1].inverse(),
                self.scopes[2].inverse(),
            ],
        }
    }

    /// Returns `true` if no conversation can match.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.scopes.iter().all(ScopeSet::is_none)
    }

    /// Canonical text form, used for equality and persistence.
    #[must_use]
    pub fn identifier(&self) -> String {
        self.to_string()
    }

    fn zip_with(&self, other: &Self, op: fn(&ScopeSet, &ScopeSet) -> ScopeSet) -> Self {
        Self {
            scopes: [
                op(&self.scopes[0], &other.scopes[0]),
                op(&self.scopes[1], &other.scopes[1]),
                op(&self.scopes[2], &other.scopes[2]),
            ],
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (kind, scope) in IdentityKind::ALL.iter().zip(self.scopes.iter()) {
            if scope.is_all() {
                continue;
            }
            if !first {
                f.write_str(";")?;
            }
            first = false;

            let sign = match scope {
                ScopeSet::Include(_) => '+',
                ScopeSet::Exclude(_) => '-',
            };
            write!(f, "{sign}{kind}:")?;
            for (i, id) in scope.ids().iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{id}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Context {
    type Err = ScopeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut scopes = [ScopeSet::all(), ScopeSet::all(), ScopeSet::all()];
        let mut seen = [false; 3];
        if s.is_empty() {
            return Ok(Self { scopes });
        }

        for segment in s.split(';') {
            if segment.is_empty() {
                return Err(ScopeParseError::EmptySegment);
            }
            let (include, body) = match segment.as_bytes()[0] {
                b'+' => (true, &segment[1..]),
                b'-' => (false, &segment[1..]),
                _ => return Err(ScopeParseError::MissingSign(segment.to_string())),
            };
            let (kind, list) = body
                .split_once(':')
                .ok_or_else(|| ScopeParseError::MissingSeparator(segment.to_string()))?;
            let kind: IdentityKind = kind.parse()?;
            if seen[kind.index()] {
                return Err(ScopeParseError::DuplicateKind(kind.to_string()));
            }
            seen[kind.index()] = true;

            // `+user:` is the empty list; otherwise every id must be present.
            let ids = list
                .split(',')
                .filter(|_| !list.is_empty())
                .map(|id| {
                    id.parse::<u64>().map_err(|_| ScopeParseError::InvalidId {
                        segment: segment.to_string(),
                        value: id.to_string(),
                    })
                })
                .collect::<Result<BTreeSet<_>, _>>()?;

            scopes[kind.index()] = if include {
                ScopeSet::Include(ids)
            } else {
                ScopeSet::Exclude(ids)
            };
        }

        Ok(Self { scopes })
    }
}

impl TryFrom<String> for Context {
    type Error = ScopeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Context> for String {
    fn from(ctx: Context) -> Self {
        ctx.identifier()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_identifier_is_fixed() {
        assert_eq!(Context::noop().identifier(), NOOP_IDENTIFIER);
        assert!(Context::noop().is_noop());
        assert!(!Context::all().is_noop());
    }

    #[test]
    fn all_renders_empty() {
        assert_eq!(Context::all().identifier(), "");
        assert_eq!("".parse::<Context>().unwrap(), Context::all());
    }

    #[test]
    fn noop_matches_nothing() {
        let noop = Context::noop();
        for kind in IdentityKind::ALL {
            for id in [0, 1, 100, u64::MAX] {
                assert!(!noop.matches(Identity::new(kind, id)));
            }
        }
    }

    #[test]
    fn canonical_text_sorted_and_signed() {
        let ctx = Context::only(IdentityKind::User, [3, 1, 2])
            .with_scope(IdentityKind::Group, ScopeSet::exclude([9]));
        assert_eq!(ctx.identifier(), "+user:1,2,3;-group:9;+discuss:");
    }

    #[test]
    fn parse_round_trip() {
        let text = "+user:1,2;-group:5";
        let ctx: Context = text.parse().unwrap();
        assert_eq!(ctx.identifier(), text);
        assert!(ctx.matches(Identity::user(1)));
        assert!(!ctx.matches(Identity::group(5)));
        assert!(ctx.matches(Identity::discuss(77)));
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            "user:1".parse::<Context>(),
            Err(ScopeParseError::MissingSign(_))
        ));
        assert!(matches!(
            "+user".parse::<Context>(),
            Err(ScopeParseError::MissingSeparator(_))
        ));
        assert!(matches!(
            "+room:1".parse::<Context>(),
            Err(ScopeParseError::UnknownKind(_))
        ));
        assert!(matches!(
            "+user:1,x".parse::<Context>(),
            Err(ScopeParseError::InvalidId { .. })
        ));
        assert!(matches!(
            "+user:1;-user:2".parse::<Context>(),
            Err(ScopeParseError::DuplicateKind(_))
        ));
        for bad in ["+user:1,,2", "+user:1,", "-group:,3"] {
            assert!(
                matches!(bad.parse::<Context>(), Err(ScopeParseError::InvalidId { ref value, .. }) if value.is_empty()),
                "{bad} should be rejected"
            );
        }
        for bad in [";;+user:1;", "+user:1;", ";+user:1", "+user:1;;-group:2"] {
            assert_eq!(
                bad.parse::<Context>(),
                Err(ScopeParseError::EmptySegment),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn empty_lists_and_empty_text_still_parse() {
        assert_eq!("".parse::<Context>(), Ok(Context::all()));
        let ctx: Context = "+user:;-group:5".parse().unwrap();
        assert_eq!(ctx.to_string(), "+user:;-group:5");
        assert!(!ctx.matches(Identity::user(1)));
        assert!(ctx.matches(Identity::group(1)));
        assert!(!ctx.matches(Identity::group(5)));
    }

    #[test]
    fn constructors() {
        let ctx = Context::except(IdentityKind::Group, [13]);
        assert!(ctx.matches(Identity::group(12)));
        assert!(!ctx.matches(Identity::group(13)));
        assert!(ctx.matches(Identity::user(13)));

        let users = Context::everyone(IdentityKind::User);
        assert!(users.matches(Identity::user(1)));
        assert!(!users.matches(Identity::group(1)));
    }

    #[test]
    fn containment_across_kinds() {
        let wide = Context::everyone(IdentityKind::Group);
        let narrow = Context::only(IdentityKind::Group, [100]);
        assert!(wide.contains(&narrow));
        assert!(!narrow.contains(&wide));
        assert!(Context::all().contains(&narrow));
        assert!(narrow.contains(&Context::noop()));
    }

    #[test]
    fn serde_uses_canonical_text() {
        let ctx = Context::only(IdentityKind::Group, [100]);
        let json = serde_json::to_string(&ctx).unwrap();
        assert_eq!(json, "\"+user:;+group:100;+discuss:\"");
        let back: Context = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ctx);
    }

    mod proptest_context {
        use super::super::*;
        use proptest::prelude::*;

        fn scope_strategy() -> impl Strategy<Value = ScopeSet> {
            (any::<bool>(), prop::collection::btree_set(0u64..6, 0..4)).prop_map(
                |(include, ids)| {
                    if include {
                        ScopeSet::Include(ids)
                    } else {
                        ScopeSet::Exclude(ids)
                    }
                },
            )
        }

        fn context_strategy() -> impl Strategy<Value = Context> {
            (scope_strategy(), scope_strategy(), scope_strategy())
                .prop_map(|(u, g, d)| Context::new(u, g, d))
        }

        fn identity_strategy() -> impl Strategy<Value = Identity> {
            (0usize..3, 0u64..8).prop_map(|(k, id)| Identity::new(IdentityKind::ALL[k], id))
        }

        proptest! {
            #[test]
            fn intersect_matches_both(a in context_strategy(), b in context_strategy(), x in identity_strategy()) {
                prop_assert_eq!(a.intersect(&b).matches(x), a.matches(x) && b.matches(x));
            }

            #[test]
            fn plus_matches_either(a in context_strategy(), b in context_strategy(), x in identity_strategy()) {
                prop_assert_eq!(a.plus(&b).matches(x), a.matches(x) || b.matches(x));
            }

            #[test]
            fn inverse_negates(a in context_strategy(), x in identity_strategy()) {
                prop_assert_eq!(a.inverse().matches(x), !a.matches(x));
            }

            #[test]
            fn contain_implies_match_subset(a in context_strategy(), b in context_strategy(), x in identity_strategy()) {
                if a.contains(&b) && b.matches(x) {
                    prop_assert!(a.matches(x));
                }
            }

            #[test]
            fn text_round_trip(a in context_strategy(), b in context_strategy()) {
                for ctx in [a.plus(&b), a.minus(&b), a.intersect(&b), a.inverse()] {
                    let parsed: Context = ctx.identifier().parse().unwrap();
                    prop_assert_eq!(parsed.identifier(), ctx.identifier());
                }
            }
        }
    }
}
