//! Pure description of what the window shows for a given [`ViewState`].

use shared::{
    domain::{UserKey, UserRecord},
    error::ErrorKind,
};

use crate::directory::ViewState;

pub const TITLE: &str = "Users";

const SMALL_BREAKPOINT: f32 = 600.0;
const MEDIUM_BREAKPOINT: f32 = 900.0;
const CARD_SPAN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Refresh,
    Retry,
    Delete(UserKey),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub title: &'static str,
    pub count_label: String,
    pub refresh: Action,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: UserKey,
    pub name: String,
    pub image: String,
    pub delete: Action,
}

impl From<&UserRecord> for Card {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            image: user.image.clone(),
            delete: Action::Delete(user.id.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewTree {
    /// Centred indeterminate spinner filling the viewport.
    Loading,
    Directory {
        header: Header,
        cards: Vec<Card>,
    },
    LoadFailed {
        kind: ErrorKind,
        message: String,
        retry: Action,
    },
}

pub fn render(state: &ViewState) -> ViewTree {
    if state.loading() {
        return ViewTree::Loading;
    }

    if let Some(failure) = state.failure() {
        return ViewTree::LoadFailed {
            kind: failure.kind,
            message: failure.message.clone(),
            retry: Action::Retry,
        };
    }

    ViewTree::Directory {
        header: Header {
            title: TITLE,
            count_label: count_label(state.count()),
            refresh: Action::Refresh,
        },
        cards: state.users().iter().map(Card::from).collect(),
    }
}

pub fn count_label(count: usize) -> String {
    format!("{count} Users")
}

/// Layout columns for a viewport width: 4 / 8 / 12 at the small and medium breakpoints.
pub fn layout_columns(width: f32) -> usize {
    if width < SMALL_BREAKPOINT {
        4
    } else if width < MEDIUM_BREAKPOINT {
        8
    } else {
        12
    }
}

pub fn cards_per_row(width: f32) -> usize {
    layout_columns(width) / CARD_SPAN
}

pub fn grid_spacing(width: f32) -> f32 {
    if width < MEDIUM_BREAKPOINT {
        16.0
    } else {
        24.0
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
