pub mod adb;
pub mod catalog;
#[cfg(feature = "desktop")]
pub mod commands;
pub mod config;
pub mod error;
pub mod inventory;
pub mod logging;
pub mod models;
pub mod removal;
pub mod selection;
pub mod session;
#[cfg(feature = "desktop")]
pub mod state;
