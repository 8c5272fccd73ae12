//! Vacation auto-responder — polls a Gmail inbox and replies to first-contact mail.

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod responder;
