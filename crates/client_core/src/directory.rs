//! View-state lifecycle: decides where the directory is hydrated from and owns
//! the only copy of the in-memory view.
//!
//! ```text
//! Initializing --count()==0--> HydratingRemote --+
//!      |                                         +--> Ready --refresh()--> Initializing
//!      +------count()>0------> HydratingLocal ---+      |
//!                                                       +--delete(id)--> Ready
//! any load step failing ----------------------------> Failed --retry()--> Initializing
//! ```

use std::time::Duration;

use shared::{
    domain::{UserKey, UserRecord},
    error::Failure,
    protocol::profiles_to_records,
};
use tokio::sync::watch;

use crate::{error::DirectoryError, remote::DEFAULT_RESULTS, ProfileSource, UserStore};

pub const DEFAULT_SPINNER_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Initializing,
    HydratingRemote,
    HydratingLocal,
    Ready,
    Failed(Failure),
}

impl LoadPhase {
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            LoadPhase::Initializing | LoadPhase::HydratingRemote | LoadPhase::HydratingLocal
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoadPhase::Initializing => "initializing",
            LoadPhase::HydratingRemote => "hydrating_remote",
            LoadPhase::HydratingLocal => "hydrating_local",
            LoadPhase::Ready => "ready",
            LoadPhase::Failed(_) => "failed",
        }
    }
}

/// Where a completed load took its rows from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    users: Vec<UserRecord>,
    phase: LoadPhase,
}

impl ViewState {
    #[cfg(test)]
    pub(crate) fn from_parts(users: Vec<UserRecord>, phase: LoadPhase) -> Self {
        Self { users, phase }
    }

    pub fn users(&self) -> &[UserRecord] {
        &self.users
    }

    /// Always the length of [`ViewState::users`].
    pub fn count(&self) -> usize {
        self.users.len()
    }

    pub fn loading(&self) -> bool {
        self.phase.is_loading()
    }

    pub fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    pub fn failure(&self) -> Option<&Failure> {
        match &self.phase {
            LoadPhase::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DirectoryOptions {
    pub results: usize,
    pub spinner_delay: Duration,
}

impl Default for DirectoryOptions {
    fn default() -> Self {
        Self {
            results: DEFAULT_RESULTS,
            spinner_delay: DEFAULT_SPINNER_DELAY,
        }
    }
}

pub struct DirectoryController<S, R> {
    store: S,
    source: R,
    options: DirectoryOptions,
    state: ViewState,
    updates: watch::Sender<ViewState>,
}

impl<S: UserStore, R: ProfileSource> DirectoryController<S, R> {
    pub fn new(store: S, source: R, options: DirectoryOptions) -> Self {
        let state = ViewState::default();
        let (updates, _) = watch::channel(state.clone());
        Self {
            store,
            source,
            options,
            state,
            updates,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Receives a snapshot after every transition, including the in-flight loading phases.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.updates.subscribe()
    }

    pub async fn initialize(&mut self) -> Result<LoadSource, DirectoryError> {
        self.enter(LoadPhase::Initializing);

        let persisted = match self.store.count().await {
            Ok(persisted) => persisted,
            Err(err) => return Err(self.fail(err.into())),
        };

        if persisted == 0 {
            self.hydrate_remote().await?;
            Ok(LoadSource::Remote)
        } else {
            tracing::debug!(persisted, "store already populated");
            self.hydrate_local().await?;
            Ok(LoadSource::Local)
        }
    }

    pub async fn hydrate_remote(&mut self) -> Result<(), DirectoryError> {
        self.enter(LoadPhase::HydratingRemote);
        match self.pull_remote().await {
            Ok(users) => {
                self.finish(users).await;
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    pub async fn hydrate_local(&mut self) -> Result<(), DirectoryError> {
        self.enter(LoadPhase::HydratingLocal);
        match self.store.to_array().await {
            Ok(users) => {
                self.finish(users).await;
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Removes the entry from the store and then from memory without re-reading the store.
    pub async fn delete(&mut self, id: &UserKey) -> Result<(), DirectoryError> {
        self.store.delete(id).await?;

        let before = self.state.users.len();
        self.state.users.retain(|user| &user.id != id);
        let removed = before - self.state.users.len();
        tracing::info!(user_id = %id, removed, count = self.state.count(), "deleted user");
        self.publish();
        Ok(())
    }

    /// Empties the store and reloads, which always goes through the remote source.
    pub async fn refresh(&mut self) -> Result<LoadSource, DirectoryError> {
        self.store.clear().await?;
        tracing::info!("store cleared for refresh");
        self.initialize().await
    }

    pub async fn retry(&mut self) -> Result<LoadSource, DirectoryError> {
        if let Some(failure) = self.state.failure() {
            tracing::info!(kind = ?failure.kind, "retrying failed load");
        }
        self.initialize().await
    }

    async fn pull_remote(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        let profiles = self.source.fetch_users(self.options.results).await?;
        let records = profiles_to_records(profiles);
        self.store.bulk_add(&records).await?;
        tracing::info!(inserted = records.len(), "persisted fetched profiles");
        Ok(self.store.to_array().await?)
    }

    async fn finish(&mut self, users: Vec<UserRecord>) {
        self.state.users = users;
        self.publish();

        if !self.options.spinner_delay.is_zero() {
            tokio::time::sleep(self.options.spinner_delay).await;
        }

        self.enter(LoadPhase::Ready);
    }

    fn enter(&mut self, phase: LoadPhase) {
        tracing::info!(
            phase = phase.label(),
            count = self.state.count(),
            "directory transition"
        );
        self.state.phase = phase;
        self.publish();
    }

    fn fail(&mut self, err: DirectoryError) -> DirectoryError {
        tracing::error!(kind = ?err.kind(), "directory load failed: {err}");
        self.enter(LoadPhase::Failed(err.to_failure()));
        err
    }

    fn publish(&self) {
        self.updates.send_replace(self.state.clone());
    }
}

#[cfg(test)]
#[path = "tests/directory_tests.rs"]
mod tests;
