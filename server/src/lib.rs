//! Lead Relay
//!
//! Webhook endpoint for website lead forms. Normalises the submitted fields,
//! formats a plain-text report and delivers it to a Telegram chat and an
//! email inbox concurrently.

pub mod api;
pub mod channels;
pub mod config;
pub mod delivery;
pub mod lead;
