//! Secondary tier: Firestore over its documents REST API.
//!
//! Read-path only for this subsystem: the orchestrator subscribes to teacher
//! and school snapshots here, but never routes writes through this tier.
//! "Live" snapshots are modeled as a polling task feeding a channel; the
//! handle aborts the task on unsubscribe or drop so nothing updates state
//! after the consumer is gone.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};

use crate::model::school::School;
use crate::model::teacher::Teacher;
use crate::sync::error::SyncError;

const POLL_INTERVAL: Duration = Duration::from_secs(15);

/// One delivery of directory data. Teachers are always present; the school
/// collection may lag behind and is filled in on a later snapshot.
#[derive(Debug)]
pub struct DirectorySnapshot {
    pub teachers: Vec<Teacher>,
    pub schools: Option<Vec<School>>,
}

pub struct Subscription {
    rx: mpsc::Receiver<DirectorySnapshot>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(rx: mpsc::Receiver<DirectorySnapshot>, task: JoinHandle<()>) -> Self {
        Self { rx, task }
    }

    pub async fn next(&mut self) -> Option<DirectorySnapshot> {
        self.rx.recv().await
    }

    /// Detached teardown handle; lets the consumer keep draining snapshots
    /// while someone else decides when the stream dies.
    pub fn handle(&self) -> SubscriptionHandle {
        SubscriptionHandle {
            poll: self.task.abort_handle(),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Stopping the poll task drops its channel sender, so any consumer of the
/// subscription sees end-of-stream after the buffered snapshots drain.
pub struct SubscriptionHandle {
    poll: AbortHandle,
}

impl SubscriptionHandle {
    pub fn unsubscribe(&self) {
        self.poll.abort();
    }
}

#[derive(Clone)]
pub struct FirestoreBackend {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FirestoreBackend {
    pub fn new(project_id: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!(
                "https://firestore.googleapis.com/v1/projects/{project_id}/databases/(default)/documents"
            ),
            api_key: api_key.to_string(),
        }
    }

    async fn fetch_documents(&self, collection: &str) -> Result<DocumentList, SyncError> {
        let url = format!("{}/{}?key={}", self.base_url, collection, self.api_key);
        let response = self.http.get(&url).send().await?.error_for_status()?;
        let list = response.json::<DocumentList>().await?;
        Ok(list)
    }

    pub async fn fetch_teachers(&self) -> Result<Vec<Teacher>, SyncError> {
        let list = self.fetch_documents("teachers").await?;
        list.documents.iter().map(decode_teacher).collect()
    }

    pub async fn fetch_schools(&self) -> Result<Vec<School>, SyncError> {
        let list = self.fetch_documents("schools").await?;
        list.documents.iter().map(decode_school).collect()
    }

    /// Opens the snapshot stream. The first teacher fetch happens inline, so
    /// an unreachable or misconfigured backend fails here and the caller can
    /// fall through to the next tier; after that the polling task only logs
    /// failures and retries on the next tick.
    pub async fn subscribe(&self) -> Result<Subscription, SyncError> {
        let first_teachers = self.fetch_teachers().await?;
        let first_schools = self.fetch_schools().await.ok();

        let backend = self.clone();
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(async move {
            if tx
                .send(DirectorySnapshot {
                    teachers: first_teachers,
                    schools: first_schools,
                })
                .await
                .is_err()
            {
                return;
            }
            loop {
                tokio::time::sleep(POLL_INTERVAL).await;
                let teachers = match backend.fetch_teachers().await {
                    Ok(teachers) => teachers,
                    Err(e) => {
                        tracing::warn!(error = %e, "teacher snapshot poll failed, will retry");
                        continue;
                    }
                };
                let schools = match backend.fetch_schools().await {
                    Ok(schools) => Some(schools),
                    Err(e) => {
                        tracing::warn!(error = %e, "school snapshot poll failed");
                        None
                    }
                };
                if tx.send(DirectorySnapshot { teachers, schools }).await.is_err() {
                    break;
                }
            }
        });

        Ok(Subscription::new(rx, task))
    }
}

// --- Firestore document envelope -------------------------------------------
//
// Documents come back as {"name": ".../teachers/t-1001", "fields": {"name":
// {"stringValue": "..."}, ...}}; only the value kinds the directory needs are
// decoded here.

#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    documents: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: HashMap<String, FireValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FireValue {
    string_value: Option<String>,
    array_value: Option<ArrayValue>,
}

#[derive(Debug, Default, Deserialize)]
struct ArrayValue {
    #[serde(default)]
    values: Vec<FireValue>,
}

impl Document {
    /// The document id is the last path segment of the resource name.
    fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    fn str_field(&self, key: &str) -> Result<String, SyncError> {
        self.fields
            .get(key)
            .and_then(|v| v.string_value.clone())
            .ok_or_else(|| SyncError::Decode(format!("missing string field `{key}`")))
    }

    fn str_array_field(&self, key: &str) -> Vec<String> {
        self.fields
            .get(key)
            .and_then(|v| v.array_value.as_ref())
            .map(|arr| {
                arr.values
                    .iter()
                    .filter_map(|v| v.string_value.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn decode_teacher(doc: &Document) -> Result<Teacher, SyncError> {
    Ok(Teacher {
        id: doc.id().to_string(),
        name: doc.str_field("name")?,
        school_id: doc.str_field("schoolId")?,
        position: doc.str_field("position")?,
        roles: doc.str_array_field("roles"),
    })
}

fn decode_school(doc: &Document) -> Result<School, SyncError> {
    Ok(School {
        id: doc.id().to_string(),
        name: doc.str_field("name")?,
        address: doc.str_field("address")?,
    })
}
