//! Sync orchestrator: picks the authoritative backend at startup and routes
//! every write through the fallback chain.
//!
//! Tier policy (deliberately asymmetric):
//!
//! | operation | chain                          |
//! |-----------|--------------------------------|
//! | startup   | SQL -> FIREBASE -> LOCAL       |
//! | write     | SQL -> LOCAL (never FIREBASE)  |
//!
//! The document store is read-path only for this subsystem: it feeds the
//! directory snapshot stream and nothing else. Any exception from a tier
//! (network, authorization, malformed response) triggers the same fallback;
//! the local in-memory tier is the terminus and never fails, so no write is
//! ever surfaced to the user as an error.

pub mod error;
pub mod firestore;
pub mod local;
pub mod sql;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use strum::Display;
use tokio::sync::RwLock;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::config::Config;
use crate::model::leave_record::{LeaveRecord, LeaveStatus};
use crate::model::school::School;
use crate::model::teacher::Teacher;
use error::SyncError;
use firestore::{FirestoreBackend, Subscription, SubscriptionHandle};
use local::LocalStore;
use sql::SqlBackend;

/// The active data source, recorded for display; it selects a backend but
/// does not otherwise gate read/write logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SyncSource {
    Sql,
    Firebase,
    Local,
}

/// Per-tier health, for display. A configured tier starts as `Connected`
/// (assumed healthy until an attempt proves otherwise) and drops to
/// `Degraded` on its first failed attempt; `Unconfigured` means no
/// credentials were supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TierState {
    Unconfigured,
    Connected,
    Degraded,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct TierStates {
    pub sql: TierState,
    pub firebase: TierState,
    pub local: TierState,
}

/// Which tier accepted a write. Selects the success wording; there is no
/// failure variant by design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Remote,
    LocalFallback,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    #[schema(example = "local")]
    pub source: SyncSource,
    pub tiers: TierStates,
    #[schema(example = true)]
    pub data_loaded: bool,
}

#[derive(Debug, Default, Clone)]
pub struct Directory {
    pub teachers: Vec<Teacher>,
    pub schools: Vec<School>,
}

/// The primary tier's full capability set: bulk directory read plus the
/// leave-record write path.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn load_directory(&self) -> Result<Directory, SyncError>;
    async fn load_leaves(&self) -> Result<Vec<LeaveRecord>, SyncError>;
    async fn insert_leave(&self, record: &LeaveRecord) -> Result<(), SyncError>;
    async fn apply_decision(
        &self,
        id: &str,
        status: LeaveStatus,
        approved_date: NaiveDate,
        director_signature: Option<&str>,
    ) -> Result<(), SyncError>;
}

/// The secondary tier's only capability: a directory snapshot stream.
#[async_trait]
pub trait StreamSource: Send + Sync {
    async fn subscribe(&self) -> Result<Subscription, SyncError>;
}

#[async_trait]
impl StreamSource for FirestoreBackend {
    async fn subscribe(&self) -> Result<Subscription, SyncError> {
        FirestoreBackend::subscribe(self).await
    }
}

/// Process-wide sync state: configuration outcome, active source, backend
/// handles and the local terminus. Built once at startup and shared; no
/// hidden globals.
pub struct SyncContext {
    source: SyncSource,
    tiers: TierStates,
    data_loaded: bool,
    primary: Option<Arc<dyn RemoteStore>>,
    directory: Arc<RwLock<Directory>>,
    local: LocalStore,
    stream: std::sync::Mutex<Option<SubscriptionHandle>>,
    signer: String,
}

/// One startup attempt against the primary tier.
async fn attempt_primary(
    primary: Option<&Arc<dyn RemoteStore>>,
) -> Result<Directory, SyncError> {
    match primary {
        Some(backend) => backend.load_directory().await,
        None => Err(SyncError::Unconfigured),
    }
}

/// One startup attempt against the secondary tier.
async fn attempt_secondary(
    secondary: Option<&Arc<dyn StreamSource>>,
) -> Result<Subscription, SyncError> {
    match secondary {
        Some(stream) => stream.subscribe().await,
        None => Err(SyncError::Unconfigured),
    }
}

impl SyncContext {
    pub async fn start(config: &Config) -> Self {
        let primary: Option<Arc<dyn RemoteStore>> = match config.database_url.as_deref() {
            Some(url) => match SqlBackend::new(url) {
                Ok(backend) => Some(Arc::new(backend)),
                Err(e) => {
                    warn!(error = %e, "primary database URL rejected, tier skipped");
                    None
                }
            },
            None => None,
        };

        let secondary: Option<Arc<dyn StreamSource>> =
            match (&config.firestore_project_id, &config.firestore_api_key) {
                (Some(project), Some(key)) => Some(Arc::new(FirestoreBackend::new(project, key))),
                _ => None,
            };

        Self::start_with(
            primary,
            secondary,
            config.director_name.clone(),
            Duration::from_millis(config.local_seed_delay_ms),
        )
        .await
    }

    /// The startup chain itself, one tier at a time, never raced. Seam for
    /// tests: tiers come in as trait objects.
    async fn start_with(
        primary: Option<Arc<dyn RemoteStore>>,
        secondary: Option<Arc<dyn StreamSource>>,
        signer: String,
        seed_delay: Duration,
    ) -> Self {
        let local = LocalStore::new();
        let mut tiers = TierStates {
            sql: TierState::Unconfigured,
            firebase: match secondary {
                Some(_) => TierState::Connected,
                None => TierState::Unconfigured,
            },
            local: TierState::Connected,
        };

        // Tier 1: one-shot bulk read from the relational store.
        match attempt_primary(primary.as_ref()).await {
            Ok(directory) => {
                tiers.sql = TierState::Connected;
                info!(source = %SyncSource::Sql, "adopted primary backend");
                return Self {
                    source: SyncSource::Sql,
                    tiers,
                    data_loaded: true,
                    primary,
                    directory: Arc::new(RwLock::new(directory)),
                    local,
                    stream: std::sync::Mutex::new(None),
                    signer,
                };
            }
            Err(SyncError::Unconfigured) => {}
            Err(e) => {
                tiers.sql = TierState::Degraded;
                warn!(error = %e, "primary bulk read failed, falling back");
            }
        }

        // Tier 2: live snapshot stream from the document store. Adopted on
        // the first teacher snapshot; later snapshots keep the directory
        // cache fresh until shutdown unsubscribes.
        match attempt_secondary(secondary.as_ref()).await {
            Ok(mut subscription) => {
                if let Some(first) = subscription.next().await {
                    let stream_handle = subscription.handle();
                    let directory = Arc::new(RwLock::new(Directory {
                        teachers: first.teachers,
                        schools: first.schools.unwrap_or_default(),
                    }));
                    let cache = Arc::clone(&directory);
                    tokio::spawn(async move {
                        while let Some(snapshot) = subscription.next().await {
                            let mut dir = cache.write().await;
                            dir.teachers = snapshot.teachers;
                            if let Some(schools) = snapshot.schools {
                                dir.schools = schools;
                            }
                        }
                    });
                    info!(source = %SyncSource::Firebase, "adopted secondary backend");
                    return Self {
                        source: SyncSource::Firebase,
                        tiers,
                        data_loaded: true,
                        primary,
                        directory,
                        local,
                        stream: std::sync::Mutex::new(Some(stream_handle)),
                        signer,
                    };
                }
                tiers.firebase = TierState::Degraded;
                warn!("secondary stream closed before first snapshot, falling back");
            }
            Err(SyncError::Unconfigured) => {}
            Err(e) => {
                tiers.firebase = TierState::Degraded;
                warn!(error = %e, "secondary subscribe failed, falling back");
            }
        }

        // Tier 3: fixed seed data. The short artificial delay preserves the
        // perceived-loading behavior the UI was built around.
        tokio::time::sleep(seed_delay).await;
        let directory = Directory {
            teachers: local.teachers().await,
            schools: local.schools().await,
        };
        info!(source = %SyncSource::Local, "adopted local seed data");
        Self {
            source: SyncSource::Local,
            tiers,
            data_loaded: true,
            primary,
            directory: Arc::new(RwLock::new(directory)),
            local,
            stream: std::sync::Mutex::new(None),
            signer,
        }
    }

    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            source: self.source,
            tiers: self.tiers,
            data_loaded: self.data_loaded,
        }
    }

    pub async fn teachers(&self) -> Vec<Teacher> {
        self.directory.read().await.teachers.clone()
    }

    pub async fn schools(&self) -> Vec<School> {
        self.directory.read().await.schools.clone()
    }

    /// Leave records from the primary if it answers, else the local store.
    /// Successful primary reads also refresh the local working set, so a
    /// later outage still has a record to patch decisions into.
    pub async fn leaves(&self) -> Vec<LeaveRecord> {
        if let Some(ref backend) = self.primary {
            match backend.load_leaves().await {
                Ok(records) => {
                    self.local.hydrate_leaves(&records).await;
                    return records;
                }
                Err(e) => warn!(error = %e, "leave read failed on primary, serving local"),
            }
        }
        self.local.leaves().await
    }

    /// Two-tier write: primary, then silent local fallback. The secondary
    /// tier is never attempted here.
    pub async fn submit_leave(&self, record: LeaveRecord) -> WriteOutcome {
        if let Some(ref backend) = self.primary {
            match backend.insert_leave(&record).await {
                Ok(()) => return WriteOutcome::Remote,
                Err(e) => {
                    warn!(error = %e, id = %record.id, "primary write failed, saving offline")
                }
            }
        }
        self.local.insert_leave(record).await;
        WriteOutcome::LocalFallback
    }

    /// Director decision through the same two-tier write chain. Stamps
    /// today's date and, on approval, the configured signer name. No version
    /// check: concurrent decisions are last-write-wins.
    pub async fn decide_leave(
        &self,
        id: &str,
        status: LeaveStatus,
    ) -> Result<WriteOutcome, SyncError> {
        let approved_date = Utc::now().date_naive();
        let signature = match status {
            LeaveStatus::Approved => Some(self.signer.as_str()),
            _ => None,
        };

        if let Some(ref backend) = self.primary {
            match backend
                .apply_decision(id, status, approved_date, signature)
                .await
            {
                Ok(()) => return Ok(WriteOutcome::Remote),
                Err(e) => warn!(error = %e, id, "primary decision failed, patching offline"),
            }
        }
        self.local
            .apply_decision(id, status, approved_date, signature)
            .await?;
        Ok(WriteOutcome::LocalFallback)
    }

    /// Tears down the snapshot stream. Unsubscribing stops the poll task;
    /// the forwarder then drains the closed channel and exits, so nothing
    /// touches the directory cache once the queue is empty.
    pub fn shutdown(&self) {
        if let Some(handle) = self.stream.lock().expect("stream handle lock").take() {
            handle.unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::firestore::DirectorySnapshot;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::mpsc;

    struct FailingStore;

    #[async_trait]
    impl RemoteStore for FailingStore {
        async fn load_directory(&self) -> Result<Directory, SyncError> {
            Err(SyncError::Backend("connection refused".to_string()))
        }
        async fn load_leaves(&self) -> Result<Vec<LeaveRecord>, SyncError> {
            Err(SyncError::Backend("connection refused".to_string()))
        }
        async fn insert_leave(&self, _record: &LeaveRecord) -> Result<(), SyncError> {
            Err(SyncError::Backend("connection refused".to_string()))
        }
        async fn apply_decision(
            &self,
            _id: &str,
            _status: LeaveStatus,
            _approved_date: NaiveDate,
            _director_signature: Option<&str>,
        ) -> Result<(), SyncError> {
            Err(SyncError::Backend("connection refused".to_string()))
        }
    }

    struct HealthyStore;

    #[async_trait]
    impl RemoteStore for HealthyStore {
        async fn load_directory(&self) -> Result<Directory, SyncError> {
            Ok(Directory {
                teachers: vec![Teacher {
                    id: "t-db".to_string(),
                    name: "From Database".to_string(),
                    school_id: "s-01".to_string(),
                    position: "Teacher".to_string(),
                    roles: vec!["teacher".to_string()],
                }],
                schools: Vec::new(),
            })
        }
        async fn load_leaves(&self) -> Result<Vec<LeaveRecord>, SyncError> {
            Ok(Vec::new())
        }
        async fn insert_leave(&self, _record: &LeaveRecord) -> Result<(), SyncError> {
            Ok(())
        }
        async fn apply_decision(
            &self,
            _id: &str,
            _status: LeaveStatus,
            _approved_date: NaiveDate,
            _director_signature: Option<&str>,
        ) -> Result<(), SyncError> {
            Ok(())
        }
    }

    struct OutageStore {
        down: Arc<AtomicBool>,
    }

    #[async_trait]
    impl RemoteStore for OutageStore {
        async fn load_directory(&self) -> Result<Directory, SyncError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(SyncError::Backend("connection reset".to_string()));
            }
            Ok(Directory::default())
        }
        async fn load_leaves(&self) -> Result<Vec<LeaveRecord>, SyncError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(SyncError::Backend("connection reset".to_string()));
            }
            let mut record = sample_record();
            record.id = "sql-1".to_string();
            Ok(vec![record])
        }
        async fn insert_leave(&self, _record: &LeaveRecord) -> Result<(), SyncError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(SyncError::Backend("connection reset".to_string()));
            }
            Ok(())
        }
        async fn apply_decision(
            &self,
            _id: &str,
            _status: LeaveStatus,
            _approved_date: NaiveDate,
            _director_signature: Option<&str>,
        ) -> Result<(), SyncError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(SyncError::Backend("connection reset".to_string()));
            }
            Ok(())
        }
    }

    struct StubStream {
        subscribed: AtomicBool,
    }

    impl StubStream {
        fn new() -> Self {
            Self {
                subscribed: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl StreamSource for StubStream {
        async fn subscribe(&self) -> Result<Subscription, SyncError> {
            self.subscribed.store(true, Ordering::SeqCst);
            let (tx, rx) = mpsc::channel(1);
            tx.send(DirectorySnapshot {
                teachers: vec![Teacher {
                    id: "t-fb".to_string(),
                    name: "From Firestore".to_string(),
                    school_id: "s-01".to_string(),
                    position: "Teacher".to_string(),
                    roles: vec!["teacher".to_string()],
                }],
                schools: None,
            })
            .await
            .expect("stub channel");
            let task = tokio::spawn(async {});
            Ok(Subscription::new(rx, task))
        }
    }

    fn sample_record() -> LeaveRecord {
        use crate::model::leave_record::LeaveType;
        LeaveRecord {
            id: "w-1".to_string(),
            teacher_id: "t-1001".to_string(),
            teacher_name: "Maria Santos".to_string(),
            leave_type: LeaveType::Personal,
            start_date: "2024-06-03".parse().unwrap(),
            end_date: "2024-06-03".parse().unwrap(),
            start_time: None,
            end_time: None,
            reason: "Errand".to_string(),
            status: LeaveStatus::Pending,
            teacher_signature: None,
            director_signature: None,
            approved_date: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn healthy_primary_is_adopted_without_touching_other_tiers() {
        let stream = Arc::new(StubStream::new());
        let ctx = SyncContext::start_with(
            Some(Arc::new(HealthyStore)),
            Some(stream.clone() as Arc<dyn StreamSource>),
            "Director".to_string(),
            Duration::ZERO,
        )
        .await;
        assert_eq!(ctx.status().source, SyncSource::Sql);
        assert!(ctx.status().data_loaded);
        assert!(!stream.subscribed.load(Ordering::SeqCst));
        assert_eq!(ctx.teachers().await[0].id, "t-db");
    }

    #[tokio::test]
    async fn failing_primary_falls_back_to_secondary() {
        let ctx = SyncContext::start_with(
            Some(Arc::new(FailingStore)),
            Some(Arc::new(StubStream::new())),
            "Director".to_string(),
            Duration::ZERO,
        )
        .await;
        let status = ctx.status();
        assert_eq!(status.source, SyncSource::Firebase);
        assert_eq!(status.tiers.sql, TierState::Degraded);
        assert!(status.data_loaded);
        assert_eq!(ctx.teachers().await[0].id, "t-fb");
        ctx.shutdown();
    }

    #[tokio::test]
    async fn failing_primary_without_secondary_falls_back_to_local() {
        let ctx = SyncContext::start_with(
            Some(Arc::new(FailingStore)),
            None,
            "Director".to_string(),
            Duration::ZERO,
        )
        .await;
        let status = ctx.status();
        assert_eq!(status.source, SyncSource::Local);
        assert_eq!(status.tiers.sql, TierState::Degraded);
        assert_eq!(status.tiers.firebase, TierState::Unconfigured);
    }

    #[tokio::test]
    async fn nothing_configured_seeds_local() {
        let ctx =
            SyncContext::start_with(None, None, "Director".to_string(), Duration::ZERO).await;
        let status = ctx.status();
        assert_eq!(status.source, SyncSource::Local);
        assert_eq!(status.tiers.sql, TierState::Unconfigured);
        assert!(!ctx.teachers().await.is_empty());
    }

    #[tokio::test]
    async fn write_without_primary_lands_in_local_store() {
        let ctx =
            SyncContext::start_with(None, None, "Director".to_string(), Duration::ZERO).await;
        let outcome = ctx.submit_leave(sample_record()).await;
        assert_eq!(outcome, WriteOutcome::LocalFallback);
        assert!(ctx.leaves().await.iter().any(|r| r.id == "w-1"));
    }

    #[tokio::test]
    async fn failed_primary_write_degrades_to_local_silently() {
        let ctx = SyncContext::start_with(
            Some(Arc::new(FailingStore)),
            None,
            "Director".to_string(),
            Duration::ZERO,
        )
        .await;
        let outcome = ctx.submit_leave(sample_record()).await;
        assert_eq!(outcome, WriteOutcome::LocalFallback);
        // The failed remote write is not queued; the record lives locally.
        assert!(ctx.local.leaves().await.iter().any(|r| r.id == "w-1"));
    }

    #[tokio::test]
    async fn successful_primary_write_stays_remote() {
        let ctx = SyncContext::start_with(
            Some(Arc::new(HealthyStore)),
            None,
            "Director".to_string(),
            Duration::ZERO,
        )
        .await;
        let outcome = ctx.submit_leave(sample_record()).await;
        assert_eq!(outcome, WriteOutcome::Remote);
        assert!(!ctx.local.leaves().await.iter().any(|r| r.id == "w-1"));
    }

    #[tokio::test]
    async fn approval_stamps_date_and_signer() {
        let ctx =
            SyncContext::start_with(None, None, "Rosa Villanueva".to_string(), Duration::ZERO)
                .await;
        let record = sample_record();
        ctx.submit_leave(record).await;
        let outcome = ctx.decide_leave("w-1", LeaveStatus::Approved).await.unwrap();
        assert_eq!(outcome, WriteOutcome::LocalFallback);
        let patched = ctx
            .leaves()
            .await
            .into_iter()
            .find(|r| r.id == "w-1")
            .unwrap();
        assert_eq!(patched.status, LeaveStatus::Approved);
        assert_eq!(patched.approved_date, Some(Utc::now().date_naive()));
        assert_eq!(patched.director_signature.as_deref(), Some("Rosa Villanueva"));
    }

    #[tokio::test]
    async fn rejection_carries_no_signature() {
        let ctx =
            SyncContext::start_with(None, None, "Rosa Villanueva".to_string(), Duration::ZERO)
                .await;
        ctx.submit_leave(sample_record()).await;
        ctx.decide_leave("w-1", LeaveStatus::Rejected).await.unwrap();
        let patched = ctx
            .leaves()
            .await
            .into_iter()
            .find(|r| r.id == "w-1")
            .unwrap();
        assert_eq!(patched.status, LeaveStatus::Rejected);
        assert!(patched.director_signature.is_none());
    }

    #[tokio::test]
    async fn decision_during_primary_outage_patches_cached_record() {
        let down = Arc::new(AtomicBool::new(false));
        let ctx = SyncContext::start_with(
            Some(Arc::new(OutageStore { down: down.clone() })),
            None,
            "Rosa Villanueva".to_string(),
            Duration::ZERO,
        )
        .await;

        // A healthy read caches the remote record locally.
        assert!(ctx.leaves().await.iter().any(|r| r.id == "sql-1"));

        // The database goes away before the director decides.
        down.store(true, Ordering::SeqCst);
        let outcome = ctx.decide_leave("sql-1", LeaveStatus::Approved).await.unwrap();
        assert_eq!(outcome, WriteOutcome::LocalFallback);

        let patched = ctx
            .leaves()
            .await
            .into_iter()
            .find(|r| r.id == "sql-1")
            .unwrap();
        assert_eq!(patched.status, LeaveStatus::Approved);
        assert_eq!(patched.director_signature.as_deref(), Some("Rosa Villanueva"));
    }
}
