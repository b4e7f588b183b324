//! # Member directory
//!
//! Seam towards the persistence layer: member records with their permission
//! sets, looked up at login and by the CRUD handlers. The in-memory
//! implementation backs the demo server and the tests.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::Serialize;
use thiserror::Error;

use crate::error::ApiError;

/// A member as exposed to the API. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRecord {
    /// Member identifier.
    pub id: i32,
    /// Unique display name.
    pub username: String,
    /// Permission identifiers granted to this member.
    pub permissions: Vec<i32>,
}

/// Errors from directory operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("username is already taken")]
    UsernameTaken,

    #[error("member not found")]
    NotFound,
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::UsernameTaken => Self::UsernameTaken,
            DirectoryError::NotFound => Self::MemberNotFound,
        }
    }
}

/// Lookup and mutation of member records.
pub trait MemberDirectory: Send + Sync {
    /// Check credentials and return the matching record.
    ///
    /// Credential storage policy (hashing, lockout) lives with the
    /// implementation, not with this layer.
    fn authenticate(&self, username: &str, password: &str) -> Option<MemberRecord>;

    /// Look up a member by id.
    fn get(&self, id: i32) -> Option<MemberRecord>;

    /// All members, ordered by id.
    fn list(&self) -> Vec<MemberRecord>;

    /// Create a member with the given credentials and permission set.
    fn insert(
        &self,
        username: &str,
        password: &str,
        permissions: Vec<i32>,
    ) -> Result<MemberRecord, DirectoryError>;

    /// Change a member's username.
    fn rename(&self, id: i32, username: &str) -> Result<MemberRecord, DirectoryError>;
}

#[derive(Debug, Clone)]
struct StoredMember {
    record: MemberRecord,
    password: String,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i32,
    members: HashMap<i32, StoredMember>,
}

/// In-memory [`MemberDirectory`].
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    inner: RwLock<Inner>,
}

impl InMemoryDirectory {
    /// Empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemberDirectory for InMemoryDirectory {
    fn authenticate(&self, username: &str, password: &str) -> Option<MemberRecord> {
        let inner = self.inner.read().expect("directory lock poisoned");
        inner
            .members
            .values()
            .find(|m| m.record.username == username && m.password == password)
            .map(|m| m.record.clone())
    }

    fn get(&self, id: i32) -> Option<MemberRecord> {
        let inner = self.inner.read().expect("directory lock poisoned");
        inner.members.get(&id).map(|m| m.record.clone())
    }

    fn list(&self) -> Vec<MemberRecord> {
        let inner = self.inner.read().expect("directory lock poisoned");
        let mut records: Vec<_> = inner.members.values().map(|m| m.record.clone()).collect();
        records.sort_by_key(|r| r.id);
        records
    }

    fn insert(
        &self,
        username: &str,
        password: &str,
        permissions: Vec<i32>,
    ) -> Result<MemberRecord, DirectoryError> {
        let mut inner = self.inner.write().expect("directory lock poisoned");
        if inner.members.values().any(|m| m.record.username == username) {
            return Err(DirectoryError::UsernameTaken);
        }

        inner.next_id += 1;
        let record = MemberRecord {
            id: inner.next_id,
            username: username.to_owned(),
            permissions,
        };
        inner.members.insert(
            record.id,
            StoredMember {
                record: record.clone(),
                password: password.to_owned(),
            },
        );
        Ok(record)
    }

    fn rename(&self, id: i32, username: &str) -> Result<MemberRecord, DirectoryError> {
        let mut inner = self.inner.write().expect("directory lock poisoned");
        if inner
            .members
            .values()
            .any(|m| m.record.id != id && m.record.username == username)
        {
            return Err(DirectoryError::UsernameTaken);
        }

        let member = inner.members.get_mut(&id).ok_or(DirectoryError::NotFound)?;
        member.record.username = username.to_owned();
        Ok(member.record.clone())
    }
}
