//! Marksheet and user records
//!
//! [`JsonFileStore`] keeps everything in one JSON document with three
//! collections. The file is read on every lookup so edits are picked up
//! without a restart. Entries are decoded only when a lookup reaches them,
//! so a malformed document fails its own lookup and nobody else's.

use marksheet::{Marksheet, MarksheetRecord, StaffMember};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store data is corrupt: {0}")]
    Corrupt(String),
}

/// A push subscription registered for a user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushSubscription {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
}

impl PushSubscription {
    pub fn is_active(&self) -> bool {
        self.active == Some(true) || self.status.as_deref() == Some("active")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub push_subscriptions: Vec<PushSubscription>,
}

impl User {
    pub fn active_subscriptions(&self) -> usize {
        self.push_subscriptions.iter().filter(|s| s.is_active()).count()
    }
}

/// Read access to marksheets and users
pub trait MarksheetStore: Send + Sync + 'static {
    /// The marksheet with `id`, its staff and HOD resolved
    fn find_marksheet(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<MarksheetRecord>, StoreError>> + Send;

    fn find_user(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;
}

#[derive(Debug, Default, Deserialize)]
struct StoreData {
    #[serde(default)]
    marksheets: Vec<Value>,
    #[serde(default)]
    staff: Vec<Value>,
    #[serde(default)]
    users: Vec<Value>,
}

impl StoreData {
    /// A staff member that cannot be decoded is logged and treated as absent
    fn staff_member(&self, id: Option<&str>) -> Option<StaffMember> {
        let id = id.filter(|id| !id.is_empty())?;
        match find_entry(&self.staff, "staff", &["_id", "id"], id) {
            Ok(member) => member,
            Err(err) => {
                tracing::warn!(staff_id = id, "skipping staff member: {err}");
                None
            }
        }
    }
}

/// Decode the first entry whose key field equals `wanted`
fn find_entry<T: DeserializeOwned>(
    entries: &[Value],
    collection: &str,
    keys: &[&str],
    wanted: &str,
) -> Result<Option<T>, StoreError> {
    let Some(entry) = entries.iter().find(|entry| {
        keys.iter()
            .find_map(|key| entry.get(*key))
            .and_then(Value::as_str)
            == Some(wanted)
    }) else {
        return Ok(None);
    };
    T::deserialize(entry)
        .map(Some)
        .map_err(|e| StoreError::Corrupt(format!("{collection} entry {wanted}: {e}")))
}

/// Store backed by a single JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<StoreData, StoreError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", self.path.display())))?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt(e.to_string()))
    }
}

impl MarksheetStore for JsonFileStore {
    async fn find_marksheet(&self, id: &str) -> Result<Option<MarksheetRecord>, StoreError> {
        let data = self.load().await?;
        let Some(marksheet) =
            find_entry::<Marksheet>(&data.marksheets, "marksheets", &["_id", "id"], id)?
        else {
            return Ok(None);
        };
        let staff = data.staff_member(marksheet.staff_id.as_deref());
        let hod = data.staff_member(marksheet.hod_id.as_deref());
        Ok(Some(MarksheetRecord {
            marksheet,
            staff,
            hod,
        }))
    }

    async fn find_user(&self, email: &str) -> Result<Option<User>, StoreError> {
        let data = self.load().await?;
        find_entry(&data.users, "users", &["email"], email)
    }
}
