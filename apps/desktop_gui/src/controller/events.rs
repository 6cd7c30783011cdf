//! UI/backend events and error modeling for the directory window.

use client_core::ViewState;
use shared::{
    domain::UserKey,
    error::{ErrorKind, Failure},
};

use crate::ui::avatar::AvatarImage;

pub enum UiEvent {
    Info(String),
    ViewChanged(ViewState),
    StartupFailed(Failure),
    Error(UiError),
    AvatarLoaded { id: UserKey, image: AvatarImage },
    AvatarFailed { id: UserKey, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Network,
    Data,
    Storage,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Delete,
    Refresh,
}

impl UiErrorContext {
    pub fn label(self) -> &'static str {
        match self {
            UiErrorContext::BackendStartup => "Startup",
            UiErrorContext::Delete => "Deleting user",
            UiErrorContext::Refresh => "Refreshing users",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_failure(context: UiErrorContext, failure: &Failure) -> Self {
        let category = match failure.kind {
            ErrorKind::Network => UiErrorCategory::Network,
            ErrorKind::Shape => UiErrorCategory::Data,
            ErrorKind::StorageUnavailable
            | ErrorKind::ConstraintViolation
            | ErrorKind::Storage => UiErrorCategory::Storage,
        };
        Self {
            category,
            context,
            message: failure.message.clone(),
        }
    }

    /// Best-effort classification for errors that only exist as text, such as queue failures.
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("sqlite")
            || message_lower.contains("storage")
            || message_lower.contains("database")
        {
            UiErrorCategory::Storage
        } else if message_lower.contains("malformed")
            || message_lower.contains("missing")
            || message_lower.contains("json")
        {
            UiErrorCategory::Data
        } else if message_lower.contains("timeout")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("http")
            || message_lower.contains("disconnect")
        {
            UiErrorCategory::Network
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
