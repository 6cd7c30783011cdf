//! UI layer for the directory window: app shell, avatars and theme.

pub mod app;
pub mod avatar;
pub mod theme;

pub use app::DirectoryApp;
