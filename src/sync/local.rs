//! Local in-memory tier: fixed seed data plus whatever writes degraded here.
//! This tier is the fallback terminus and never fails.

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;

use crate::model::leave_record::{LeaveRecord, LeaveStatus, LeaveType};
use crate::model::school::School;
use crate::model::teacher::Teacher;
use crate::sync::error::SyncError;

struct LocalData {
    teachers: Vec<Teacher>,
    schools: Vec<School>,
    leaves: Vec<LeaveRecord>,
}

pub struct LocalStore {
    inner: RwLock<LocalData>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(seed()),
        }
    }

    pub async fn teachers(&self) -> Vec<Teacher> {
        self.inner.read().await.teachers.clone()
    }

    pub async fn schools(&self) -> Vec<School> {
        self.inner.read().await.schools.clone()
    }

    pub async fn leaves(&self) -> Vec<LeaveRecord> {
        self.inner.read().await.leaves.clone()
    }

    pub async fn insert_leave(&self, record: LeaveRecord) {
        self.inner.write().await.leaves.push(record);
    }

    /// Refreshes cached copies of remotely-read records, keeping any records
    /// that exist only here (offline-degraded writes). Keeps the last-known
    /// working set available so a degraded write can still patch it.
    pub async fn hydrate_leaves(&self, records: &[LeaveRecord]) {
        let mut data = self.inner.write().await;
        for incoming in records {
            match data.leaves.iter_mut().find(|r| r.id == incoming.id) {
                Some(existing) => *existing = incoming.clone(),
                None => data.leaves.push(incoming.clone()),
            }
        }
    }

    /// Patches a pending record to its terminal status. Terminal records are
    /// left untouched and reported as not found, mirroring the SQL tier's
    /// `WHERE status = 'pending'` guard.
    pub async fn apply_decision(
        &self,
        id: &str,
        status: LeaveStatus,
        approved_date: NaiveDate,
        director_signature: Option<&str>,
    ) -> Result<(), SyncError> {
        let mut data = self.inner.write().await;
        let record = data
            .leaves
            .iter_mut()
            .find(|r| r.id == id && !r.status.is_terminal())
            .ok_or_else(|| SyncError::NotFound(id.to_string()))?;
        record.status = status;
        record.approved_date = Some(approved_date);
        record.director_signature = director_signature.map(str::to_string);
        Ok(())
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().expect("seed timestamp")
}

fn d(s: &str) -> NaiveDate {
    s.parse().expect("seed date")
}

/// Fixed demo dataset: one school, a small faculty and a little history, so
/// the app is usable with no backend configured at all.
fn seed() -> LocalData {
    let schools = vec![School {
        id: "s-01".to_string(),
        name: "San Isidro Elementary School".to_string(),
        address: "San Isidro, Nueva Ecija".to_string(),
    }];

    let teachers = vec![
        Teacher {
            id: "t-1001".to_string(),
            name: "Maria Santos".to_string(),
            school_id: "s-01".to_string(),
            position: "Math Teacher".to_string(),
            roles: vec!["teacher".to_string()],
        },
        Teacher {
            id: "t-1002".to_string(),
            name: "Jose Ramirez".to_string(),
            school_id: "s-01".to_string(),
            position: "Science Teacher".to_string(),
            roles: vec!["teacher".to_string()],
        },
        Teacher {
            id: "t-2001".to_string(),
            name: "Rosa Villanueva".to_string(),
            school_id: "s-01".to_string(),
            position: "School Director".to_string(),
            roles: vec!["teacher".to_string(), "director".to_string()],
        },
    ];

    let leaves = vec![
        LeaveRecord {
            id: "seed-leave-01".to_string(),
            teacher_id: "t-1001".to_string(),
            teacher_name: "Maria Santos".to_string(),
            leave_type: LeaveType::Sick,
            start_date: d("2024-06-03"),
            end_date: d("2024-06-04"),
            start_time: None,
            end_time: None,
            reason: "Flu".to_string(),
            status: LeaveStatus::Approved,
            teacher_signature: None,
            director_signature: Some("Rosa Villanueva".to_string()),
            approved_date: Some(d("2024-06-05")),
            created_at: ts("2024-06-01T08:00:00Z"),
        },
        LeaveRecord {
            id: "seed-leave-02".to_string(),
            teacher_id: "t-1002".to_string(),
            teacher_name: "Jose Ramirez".to_string(),
            leave_type: LeaveType::Late,
            start_date: d("2024-06-10"),
            end_date: d("2024-06-10"),
            start_time: Some("09:15:00".parse().expect("seed time")),
            end_time: None,
            reason: "Traffic on the highway".to_string(),
            status: LeaveStatus::Pending,
            teacher_signature: None,
            director_signature: None,
            approved_date: None,
            created_at: ts("2024-06-10T07:00:00Z"),
        },
    ];

    LocalData {
        teachers,
        schools,
        leaves,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seed_data_is_present() {
        let store = LocalStore::new();
        assert_eq!(store.schools().await.len(), 1);
        assert_eq!(store.teachers().await.len(), 3);
        assert!(!store.leaves().await.is_empty());
    }

    #[tokio::test]
    async fn insert_then_read_back() {
        let store = LocalStore::new();
        let before = store.leaves().await.len();
        let mut record = store.leaves().await[0].clone();
        record.id = "new-1".to_string();
        record.status = LeaveStatus::Pending;
        store.insert_leave(record).await;
        assert_eq!(store.leaves().await.len(), before + 1);
    }

    #[tokio::test]
    async fn hydration_upserts_and_keeps_local_only_records() {
        let store = LocalStore::new();
        let mut offline = store.leaves().await[0].clone();
        offline.id = "offline-1".to_string();
        offline.status = LeaveStatus::Pending;
        store.insert_leave(offline).await;

        // A fresh remote copy of a seed record plus a record unknown locally.
        let mut updated = store.leaves().await[0].clone();
        updated.reason = "Updated upstream".to_string();
        let mut remote_only = updated.clone();
        remote_only.id = "sql-only-1".to_string();
        let count_before = store.leaves().await.len();
        store.hydrate_leaves(&[updated.clone(), remote_only]).await;

        let leaves = store.leaves().await;
        assert_eq!(leaves.len(), count_before + 1);
        assert!(leaves.iter().any(|r| r.id == "offline-1"));
        assert!(leaves.iter().any(|r| r.id == "sql-only-1"));
        let refreshed = leaves.iter().find(|r| r.id == updated.id).unwrap();
        assert_eq!(refreshed.reason, "Updated upstream");
    }

    #[tokio::test]
    async fn decision_patches_pending_record() {
        let store = LocalStore::new();
        store
            .apply_decision(
                "seed-leave-02",
                LeaveStatus::Approved,
                d("2024-06-11"),
                Some("Rosa Villanueva"),
            )
            .await
            .unwrap();
        let patched = store
            .leaves()
            .await
            .into_iter()
            .find(|r| r.id == "seed-leave-02")
            .unwrap();
        assert_eq!(patched.status, LeaveStatus::Approved);
        assert_eq!(patched.approved_date, Some(d("2024-06-11")));
        assert_eq!(patched.director_signature.as_deref(), Some("Rosa Villanueva"));
    }

    #[tokio::test]
    async fn decision_on_terminal_record_is_not_found() {
        let store = LocalStore::new();
        // seed-leave-01 is already approved.
        let err = store
            .apply_decision("seed-leave-01", LeaveStatus::Rejected, d("2024-06-11"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
    }
}
