//! Command handlers

pub mod add;
pub mod config;
pub mod list;
pub mod logout;
pub mod rm;
pub mod status;
pub mod watch;
