//! Record store and identity provider seams
//!
//! Persistence and authentication live in a hosted service. The projector only
//! sees them through these traits, so any backend (or a fixture) can be plugged in.

use crate::types::{RawMoodRow, UserIdentity};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Failures reported by a record store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store is not configured")]
    NotConfigured,

    #[error("record store unreachable: {0}")]
    Unreachable(String),

    #[error("query failed: {0}")]
    Query(String),
}

/// Read access to mood and journal records
pub trait RecordStore {
    /// Mood rows of `user_id` created in `[since, until)`, or from `since` on when
    /// `until` is `None`
    fn query_mood_entries(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<RawMoodRow>, StoreError>;

    /// Number of journal entries of `user_id` created at or after `since`
    fn query_journal_count(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Source of the signed-in user
pub trait IdentityProvider {
    fn current_user(&self) -> Option<UserIdentity>;
}

/// Identity provider that always reports the same user (or nobody)
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Option<UserIdentity>,
}

impl StaticIdentity {
    pub fn signed_in(user: UserIdentity) -> Self {
        Self { user: Some(user) }
    }

    pub fn signed_out() -> Self {
        Self { user: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<UserIdentity> {
        self.user.clone()
    }
}

/// In-memory record store keyed by user
///
/// Rows whose timestamp cannot be read are still returned by mood queries so
/// the projector can flag them; they never match a journal count.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    configured: bool,
    moods: HashMap<Uuid, Vec<RawMoodRow>>,
    journals: HashMap<Uuid, Vec<DateTime<Utc>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            configured: true,
            ..Default::default()
        }
    }

    /// A store whose every query fails with `StoreError::NotConfigured`
    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn insert_mood(&mut self, user_id: Uuid, row: RawMoodRow) {
        self.moods.entry(user_id).or_default().push(row);
    }

    pub fn extend_moods(&mut self, user_id: Uuid, rows: impl IntoIterator<Item = RawMoodRow>) {
        self.moods.entry(user_id).or_default().extend(rows);
    }

    pub fn insert_journal(&mut self, user_id: Uuid, created_at: DateTime<Utc>) {
        self.journals.entry(user_id).or_default().push(created_at);
    }

    fn ensure_configured(&self) -> Result<(), StoreError> {
        if self.configured {
            Ok(())
        } else {
            Err(StoreError::NotConfigured)
        }
    }
}

impl RecordStore for MemoryRecordStore {
    fn query_mood_entries(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<RawMoodRow>, StoreError> {
        self.ensure_configured()?;

        let rows = self.moods.get(&user_id).map(Vec::as_slice).unwrap_or(&[]);
        Ok(rows
            .iter()
            .filter(|row| match crate::adapter::parse_timestamp(&row.created_at) {
                Ok(ts) => ts >= since && until.map_or(true, |u| ts < u),
                Err(_) => true,
            })
            .cloned()
            .collect())
    }

    fn query_journal_count(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<u64, StoreError> {
        self.ensure_configured()?;

        let count = self
            .journals
            .get(&user_id)
            .map(|entries| entries.iter().filter(|ts| **ts >= since).count())
            .unwrap_or(0);
        Ok(count as u64)
    }
}
