//! Backend commands queued from UI to backend worker.

use shared::domain::UserKey;

pub enum BackendCommand {
    Delete { id: UserKey },
    Refresh,
    Retry,
    FetchAvatar { id: UserKey, url: String },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Delete { .. } => "delete",
            BackendCommand::Refresh => "refresh",
            BackendCommand::Retry => "retry",
            BackendCommand::FetchAvatar { .. } => "fetch_avatar",
        }
    }
}
