//! Lead Intake
//!
//! Turns a loosely structured form post into a typed [`Lead`] and renders it
//! as the plain-text report sent to every channel.

pub mod body;
pub mod format;
pub mod submission;

pub use body::{parse_body, BodyEncoding};
pub use format::{format_message, Priority};
pub use submission::{Field, Lead, Submission};
