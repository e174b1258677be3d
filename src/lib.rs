pub mod api;
pub mod config;
pub mod conversation;
pub mod reveal;
pub mod session;
pub mod transcript;
pub mod types;
pub mod ui;
pub mod views;
