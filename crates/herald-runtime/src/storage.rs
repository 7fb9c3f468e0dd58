//! User and group storage.
//!
//! The runtime never owns persistent data. It asks a [`Storage`] for the
//! fields a command needs and delegates usage accounting to it, since only
//! the store can make the read-check-increment on a counter atomic.
//!
//! [`MemoryStorage`] keeps everything in process and is what tests and the
//! console frontend use.

use crate::gate::Rejection;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use herald_types::{ErrorCode, FieldSet, GroupField, GroupRecord, UserField, UserRecord};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Storage backend failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The backend cannot be reached right now.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with an error.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl ErrorCode for StorageError {
    fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "STORAGE_UNAVAILABLE",
            Self::Backend(_) => "STORAGE_BACKEND",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Resolved usage thresholds for one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageLimits {
    /// Accepted calls per day; `None` is unlimited.
    pub max_usage: Option<u32>,
    /// Minimum time since the last accepted call.
    pub min_interval: Duration,
}

impl UsageLimits {
    /// Returns `true` if neither limit can reject anything.
    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        self.max_usage.is_none() && self.min_interval.is_zero()
    }
}

/// Persistence collaborator.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Loads a user with at least `fields` populated.
    async fn fetch_user(
        &self,
        id: u64,
        fields: &FieldSet<UserField>,
    ) -> Result<Option<UserRecord>, StorageError>;

    /// Loads a group with at least `fields` populated.
    async fn fetch_group(
        &self,
        id: u64,
        fields: &FieldSet<GroupField>,
    ) -> Result<Option<GroupRecord>, StorageError>;

    /// Checks the limits for `usage` and, if they pass, records the call.
    ///
    /// Must be atomic per `(usage, user)`: of N concurrent calls against a
    /// limit of one, exactly one is accepted.
    async fn check_and_consume_usage(
        &self,
        usage: &str,
        user: u64,
        limits: UsageLimits,
    ) -> Result<Option<Rejection>, StorageError>;
}

/// Time source for [`MemoryStorage`].
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// In-process storage.
///
/// Unknown users are created on first fetch with the configured default
/// authority. Usage counts reset when the UTC day changes.
///
/// # Example
///
/// ```
/// use herald_runtime::{MemoryStorage, Storage};
/// use herald_types::{FieldSet, UserField, UserRecord};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let storage = MemoryStorage::new(1);
/// storage.insert_user(UserRecord::new(42, 4));
///
/// let fields = FieldSet::from([UserField::Id, UserField::Authority]);
/// let user = storage.fetch_user(42, &fields).await.unwrap().unwrap();
/// assert_eq!(user.authority, 4);
/// # });
/// ```
pub struct MemoryStorage {
    users: Mutex<HashMap<u64, UserRecord>>,
    groups: Mutex<HashMap<u64, GroupRecord>>,
    default_authority: u32,
    clock: Clock,
}

impl MemoryStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new(default_authority: u32) -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            groups: Mutex::new(HashMap::new()),
            default_authority,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Inserts or replaces a user.
    pub fn insert_user(&self, user: UserRecord) {
        self.users.lock().insert(user.id, user);
    }

    /// Inserts or replaces a group.
    pub fn insert_group(&self, group: GroupRecord) {
        self.groups.lock().insert(group.id, group);
    }

    /// Full copy of a stored user.
    #[must_use]
    pub fn user(&self, id: u64) -> Option<UserRecord> {
        self.users.lock().get(&id).cloned()
    }
}

impl fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("users", &self.users.lock().len())
            .field("groups", &self.groups.lock().len())
            .field("default_authority", &self.default_authority)
            .finish_non_exhaustive()
    }
}

fn project_user(record: &UserRecord, fields: &FieldSet<UserField>) -> UserRecord {
    let mut out = UserRecord {
        id: record.id,
        ..UserRecord::default()
    };
    for field in fields {
        match field {
            UserField::Id => {}
            UserField::Name => out.name.clone_from(&record.name),
            UserField::Authority => out.authority = record.authority,
            UserField::Usage => out.usage.clone_from(&record.usage),
            UserField::Timers => out.timers.clone_from(&record.timers),
            UserField::Flags => out.flags = record.flags,
        }
    }
    out
}

fn project_group(record: &GroupRecord, fields: &FieldSet<GroupField>) -> GroupRecord {
    let mut out = GroupRecord::new(record.id);
    for field in fields {
        match field {
            GroupField::Id => {}
            GroupField::Assignee => out.assignee = record.assignee,
            GroupField::Flags => out.flags = record.flags,
        }
    }
    out
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn fetch_user(
        &self,
        id: u64,
        fields: &FieldSet<UserField>,
    ) -> Result<Option<UserRecord>, StorageError> {
        let mut users = self.users.lock();
        let record = users.entry(id).or_insert_with(|| {
            debug!(user = id, authority = self.default_authority, "creating user");
            UserRecord::new(id, self.default_authority)
        });
        Ok(Some(project_user(record, fields)))
    }

    async fn fetch_group(
        &self,
        id: u64,
        fields: &FieldSet<GroupField>,
    ) -> Result<Option<GroupRecord>, StorageError> {
        let mut groups = self.groups.lock();
        let record = groups.entry(id).or_insert_with(|| GroupRecord::new(id));
        Ok(Some(project_group(record, fields)))
    }

    async fn check_and_consume_usage(
        &self,
        usage: &str,
        user: u64,
        limits: UsageLimits,
    ) -> Result<Option<Rejection>, StorageError> {
        let now = (self.clock)();
        let today = now.timestamp().div_euclid(86_400);
        let now_ms = now.timestamp_millis();

        // One lock spans the read, the check and the increment.
        let mut users = self.users.lock();
        let record = users
            .entry(user)
            .or_insert_with(|| UserRecord::new(user, self.default_authority));

        let counter = record.usage.entry(usage.to_string()).or_default();
        if counter.day != today {
            counter.day = today;
            counter.count = 0;
        }

        if let Some(max) = limits.max_usage {
            if counter.count >= max {
                return Ok(Some(Rejection::UsageExhausted));
            }
        }

        if !limits.min_interval.is_zero() {
            if let Some(&last) = record.timers.get(usage) {
                let interval_ms = i64::try_from(limits.min_interval.as_millis()).unwrap_or(i64::MAX);
                if now_ms.saturating_sub(last) < interval_ms {
                    return Ok(Some(Rejection::TooFrequent));
                }
            }
        }

        counter.count += 1;
        record.timers.insert(usage.to_string(), now_ms);
        Ok(None)
    }
}
