use super::*;
use async_trait::async_trait;
use shared::{error::ErrorKind, protocol::RawProfile};
use std::sync::{Arc, Mutex};
use storage::StorageError;

use crate::error::RemoteError;

#[derive(Clone, Default)]
struct RecordingStore {
    rows: Arc<Mutex<Vec<UserRecord>>>,
    calls: Arc<Mutex<Vec<String>>>,
    unavailable: Arc<Mutex<bool>>,
    fail_delete: Arc<Mutex<bool>>,
}

impl RecordingStore {
    fn with_rows(rows: Vec<UserRecord>) -> Self {
        let store = Self::default();
        *store.rows.lock().expect("rows") = rows;
        store
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().expect("calls").push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls").clone()
    }

    fn ids(&self) -> Vec<String> {
        self.rows
            .lock()
            .expect("rows")
            .iter()
            .map(|row| row.id.to_string())
            .collect()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if *self.unavailable.lock().expect("flag") {
            return Err(StorageError::Unavailable("database is disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for RecordingStore {
    async fn count(&self) -> Result<u64, StorageError> {
        self.record("count");
        self.check_available()?;
        Ok(self.rows.lock().expect("rows").len() as u64)
    }

    async fn bulk_add(&self, records: &[UserRecord]) -> Result<(), StorageError> {
        self.record(format!("bulk_add:{}", records.len()));
        self.check_available()?;
        let mut rows = self.rows.lock().expect("rows");
        let mut seen: Vec<&UserKey> = rows.iter().map(|row| &row.id).collect();
        for record in records {
            if seen.contains(&&record.id) {
                return Err(StorageError::ConstraintViolation {
                    id: record.id.clone(),
                });
            }
            seen.push(&record.id);
        }
        drop(seen);
        rows.extend_from_slice(records);
        Ok(())
    }

    async fn to_array(&self) -> Result<Vec<UserRecord>, StorageError> {
        self.record("to_array");
        self.check_available()?;
        Ok(self.rows.lock().expect("rows").clone())
    }

    async fn delete(&self, id: &UserKey) -> Result<(), StorageError> {
        self.record(format!("delete:{id}"));
        if *self.fail_delete.lock().expect("flag") {
            return Err(StorageError::Unavailable("write refused".to_string()));
        }
        self.rows.lock().expect("rows").retain(|row| &row.id != id);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.record("clear");
        self.check_available()?;
        self.rows.lock().expect("rows").clear();
        Ok(())
    }
}

#[derive(Clone, Default)]
struct ScriptedSource {
    profiles: Arc<Mutex<Vec<RawProfile>>>,
    requested: Arc<Mutex<Vec<usize>>>,
    fail_status: Arc<Mutex<Option<u16>>>,
    observer: Arc<Mutex<Option<watch::Receiver<ViewState>>>>,
    store_probe: Arc<Mutex<Option<RecordingStore>>>,
    phases_at_fetch: Arc<Mutex<Vec<LoadPhase>>>,
    store_rows_at_fetch: Arc<Mutex<Vec<usize>>>,
}

impl ScriptedSource {
    fn returning(profiles: Vec<RawProfile>) -> Self {
        let source = Self::default();
        *source.profiles.lock().expect("profiles") = profiles;
        source
    }

    fn fetches(&self) -> usize {
        self.requested.lock().expect("requested").len()
    }
}

#[async_trait]
impl ProfileSource for ScriptedSource {
    async fn fetch_users(&self, count: usize) -> Result<Vec<RawProfile>, RemoteError> {
        self.requested.lock().expect("requested").push(count);
        if let Some(rx) = self.observer.lock().expect("observer").as_ref() {
            let phase = rx.borrow().phase().clone();
            self.phases_at_fetch.lock().expect("phases").push(phase);
        }
        if let Some(store) = self.store_probe.lock().expect("probe").as_ref() {
            let rows = store.rows.lock().expect("rows").len();
            self.store_rows_at_fetch.lock().expect("rows at fetch").push(rows);
        }
        if let Some(status) = *self.fail_status.lock().expect("status") {
            return Err(RemoteError::Status { status });
        }
        let profiles = self.profiles.lock().expect("profiles").clone();
        Ok(profiles.into_iter().take(count).collect())
    }
}

fn raw(uuid: &str) -> RawProfile {
    RawProfile {
        uuid: uuid.to_string(),
        title: "Mr".to_string(),
        first: format!("First{uuid}"),
        last: "Last".to_string(),
        picture_large: format!("https://img.test/{uuid}.jpg"),
    }
}

fn generated(count: usize) -> Vec<RawProfile> {
    (0..count)
        .map(|_| raw(&uuid::Uuid::new_v4().to_string()))
        .collect()
}

fn instant() -> DirectoryOptions {
    DirectoryOptions {
        results: 50,
        spinner_delay: Duration::ZERO,
    }
}

fn assert_count_invariant(state: &ViewState) {
    assert_eq!(state.count(), state.users().len());
}

#[test]
fn fresh_state_is_loading_and_empty() {
    let state = ViewState::default();
    assert!(state.loading());
    assert_eq!(state.count(), 0);
    assert_eq!(state.phase(), &LoadPhase::Initializing);
}

#[tokio::test]
async fn empty_store_hydrates_from_remote_and_persists_first() {
    let store = RecordingStore::default();
    let source = ScriptedSource::returning(generated(60));
    let mut controller = DirectoryController::new(store.clone(), source.clone(), instant());

    let loaded_from = controller.initialize().await.expect("initialize");

    assert_eq!(loaded_from, LoadSource::Remote);
    assert_eq!(*source.requested.lock().expect("requested"), vec![50]);
    assert_eq!(store.calls(), vec!["count", "bulk_add:50", "to_array"]);
    assert_eq!(controller.state().count(), 50);
    assert_eq!(controller.state().phase(), &LoadPhase::Ready);
    assert!(!controller.state().loading());
    assert_count_invariant(controller.state());
}

#[tokio::test]
async fn populated_store_never_touches_remote() {
    let rows = vec![
        UserRecord::new("a", "Mr A A", "ia"),
        UserRecord::new("b", "Ms B B", "ib"),
        UserRecord::new("c", "Dr C C", "ic"),
    ];
    let store = RecordingStore::with_rows(rows.clone());
    let source = ScriptedSource::returning(generated(50));
    let mut controller = DirectoryController::new(store.clone(), source.clone(), instant());

    let loaded_from = controller.initialize().await.expect("initialize");

    assert_eq!(loaded_from, LoadSource::Local);
    assert_eq!(source.fetches(), 0);
    assert_eq!(store.calls(), vec!["count", "to_array"]);
    assert_eq!(controller.state().users(), rows.as_slice());
    assert_count_invariant(controller.state());
}

#[tokio::test]
async fn remote_phase_is_visible_as_loading_while_fetching() {
    let store = RecordingStore::default();
    let source = ScriptedSource::returning(generated(5));
    let mut controller = DirectoryController::new(store, source.clone(), instant());
    *source.observer.lock().expect("observer") = Some(controller.subscribe());

    controller.initialize().await.expect("initialize");

    let phases = source.phases_at_fetch.lock().expect("phases").clone();
    assert_eq!(phases, vec![LoadPhase::HydratingRemote]);
    assert!(phases[0].is_loading());
    assert_eq!(controller.subscribe().borrow().phase(), &LoadPhase::Ready);
}

#[tokio::test]
async fn delete_removes_entry_from_store_and_view() {
    let store = RecordingStore::with_rows(vec![
        UserRecord::new("u1", "Mr A B", "img1"),
        UserRecord::new("u2", "Ms C D", "img2"),
    ]);
    let mut controller =
        DirectoryController::new(store.clone(), ScriptedSource::default(), instant());
    controller.initialize().await.expect("initialize");

    controller
        .delete(&UserKey::from("u1"))
        .await
        .expect("delete");

    assert_eq!(
        controller.state().users(),
        &[UserRecord::new("u2", "Ms C D", "img2")]
    );
    assert_eq!(controller.state().count(), 1);
    assert_eq!(store.ids(), vec!["u2"]);
    assert_eq!(store.calls().last().map(String::as_str), Some("delete:u1"));
    assert_eq!(controller.state().phase(), &LoadPhase::Ready);
}

#[tokio::test]
async fn deleting_unknown_id_still_calls_store_and_keeps_view() {
    let store = RecordingStore::with_rows(vec![UserRecord::new("u1", "Mr A B", "img1")]);
    let mut controller =
        DirectoryController::new(store.clone(), ScriptedSource::default(), instant());
    controller.initialize().await.expect("initialize");
    let before = controller.state().clone();

    controller
        .delete(&UserKey::from("ghost"))
        .await
        .expect("delete absent");

    assert_eq!(controller.state(), &before);
    assert!(store.calls().contains(&"delete:ghost".to_string()));
}

#[tokio::test]
async fn failed_delete_leaves_view_untouched() {
    let store = RecordingStore::with_rows(vec![UserRecord::new("u1", "Mr A B", "img1")]);
    let mut controller =
        DirectoryController::new(store.clone(), ScriptedSource::default(), instant());
    controller.initialize().await.expect("initialize");
    *store.fail_delete.lock().expect("flag") = true;

    let err = controller
        .delete(&UserKey::from("u1"))
        .await
        .expect_err("delete fails");

    assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
    assert_eq!(controller.state().count(), 1);
    assert_eq!(controller.state().phase(), &LoadPhase::Ready);
}

#[tokio::test]
async fn refresh_clears_store_and_always_refetches() {
    let store = RecordingStore::with_rows(vec![UserRecord::new("old", "Mr Old Row", "x")]);
    let source = ScriptedSource::returning(generated(50));
    let mut controller = DirectoryController::new(store.clone(), source.clone(), instant());
    controller.initialize().await.expect("initialize");
    assert_eq!(source.fetches(), 0);

    *source.store_probe.lock().expect("probe") = Some(store.clone());
    *source.observer.lock().expect("observer") = Some(controller.subscribe());
    let loaded_from = controller.refresh().await.expect("refresh");

    assert_eq!(loaded_from, LoadSource::Remote);
    assert_eq!(source.fetches(), 1);
    assert_eq!(*source.store_rows_at_fetch.lock().expect("rows"), vec![0]);
    assert_eq!(
        *source.phases_at_fetch.lock().expect("phases"),
        vec![LoadPhase::HydratingRemote]
    );
    assert_eq!(
        store.calls(),
        vec!["count", "to_array", "clear", "count", "bulk_add:50", "to_array"]
    );
    assert!(!store.ids().contains(&"old".to_string()));
    assert_eq!(controller.state().count(), 50);
    assert_count_invariant(controller.state());
}

#[tokio::test]
async fn network_failure_ends_in_failed_phase_instead_of_spinning() {
    let store = RecordingStore::default();
    let source = ScriptedSource::returning(generated(50));
    *source.fail_status.lock().expect("status") = Some(503);
    let mut controller = DirectoryController::new(store.clone(), source.clone(), instant());

    let err = controller.initialize().await.expect_err("network failure");

    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(!controller.state().loading());
    let failure = controller.state().failure().expect("failure recorded");
    assert_eq!(failure.kind, ErrorKind::Network);
    assert!(failure.message.contains("503"));
    assert_eq!(store.calls(), vec!["count"]);
    assert_count_invariant(controller.state());
}

#[tokio::test]
async fn retry_after_failure_reaches_ready() {
    let store = RecordingStore::default();
    let source = ScriptedSource::returning(generated(50));
    *source.fail_status.lock().expect("status") = Some(500);
    let mut controller = DirectoryController::new(store.clone(), source.clone(), instant());
    controller.initialize().await.expect_err("first attempt fails");

    *source.fail_status.lock().expect("status") = None;
    let loaded_from = controller.retry().await.expect("retry");

    assert_eq!(loaded_from, LoadSource::Remote);
    assert_eq!(controller.state().phase(), &LoadPhase::Ready);
    assert_eq!(controller.state().count(), 50);
    assert!(controller.state().failure().is_none());
}

#[tokio::test]
async fn unavailable_store_fails_during_initialize() {
    let store = RecordingStore::default();
    *store.unavailable.lock().expect("flag") = true;
    let source = ScriptedSource::returning(generated(50));
    let mut controller = DirectoryController::new(store, source.clone(), instant());

    let err = controller.initialize().await.expect_err("storage failure");

    assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
    assert_eq!(source.fetches(), 0);
    assert_eq!(
        controller.state().failure().map(|failure| failure.kind),
        Some(ErrorKind::StorageUnavailable)
    );
}

#[tokio::test]
async fn duplicate_remote_ids_are_a_constraint_violation() {
    let store = RecordingStore::default();
    let source = ScriptedSource::returning(vec![raw("dup"), raw("other"), raw("dup")]);
    let mut controller = DirectoryController::new(store.clone(), source, instant());

    let err = controller.initialize().await.expect_err("constraint");

    assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
    assert!(store.ids().is_empty());
    assert!(!store.calls().contains(&"to_array".to_string()));
}

#[tokio::test]
async fn spinner_delay_holds_loading_before_ready() {
    let store = RecordingStore::with_rows(vec![UserRecord::new("u1", "Mr A B", "img1")]);
    let options = DirectoryOptions {
        results: 50,
        spinner_delay: Duration::from_millis(40),
    };
    let mut controller = DirectoryController::new(store, ScriptedSource::default(), options);

    let started = std::time::Instant::now();
    controller.initialize().await.expect("initialize");

    assert!(started.elapsed() >= Duration::from_millis(40));
    assert_eq!(controller.state().phase(), &LoadPhase::Ready);
}

#[tokio::test]
async fn count_matches_users_across_every_transition() {
    let store = RecordingStore::default();
    let source = ScriptedSource::returning(generated(8));
    let mut controller = DirectoryController::new(
        store,
        source,
        DirectoryOptions {
            results: 8,
            spinner_delay: Duration::ZERO,
        },
    );

    assert_count_invariant(controller.state());
    controller.initialize().await.expect("initialize");
    assert_count_invariant(controller.state());

    let ids: Vec<UserKey> = controller
        .state()
        .users()
        .iter()
        .take(3)
        .map(|user| user.id.clone())
        .collect();
    for id in &ids {
        controller.delete(id).await.expect("delete");
        assert_count_invariant(controller.state());
    }
    assert_eq!(controller.state().count(), 5);

    controller.refresh().await.expect("refresh");
    assert_count_invariant(controller.state());
}
