//! Jira / Tempo gateway and domain types.
//!
//! The rest of the crate depends on the [`Gateway`] trait only; [`JiraClient`]
//! is the production implementation.

mod adf;
mod auth;
mod client;
mod error;
mod gateway;
pub mod types;

pub use auth::get_token;
pub use client::JiraClient;
pub use error::{ApiError, Result};
pub use gateway::Gateway;
pub use types::{
    Issue, IssueDetail, NewWorklog, Priority, Status, StatusCategory, Transition, User, Worklog,
};
