//! The remote service boundary.
//!
//! Every network operation the application performs goes through this trait,
//! one logical operation per call. The event loop never calls it directly:
//! calls are described as effects and executed on background tasks.

use async_trait::async_trait;

use super::error::Result;
use super::types::{
    Issue, IssueDetail, NewWorklog, Priority, Status, Transition, User, Worklog,
};

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Issues matching the configured "my issues" query.
    async fn my_issues(&self) -> Result<Vec<Issue>>;

    /// The authenticated user.
    async fn myself(&self) -> Result<User>;

    async fn issue_detail(&self, key: &str) -> Result<IssueDetail>;

    async fn transitions(&self, key: &str) -> Result<Vec<Transition>>;

    /// Execute a transition, optionally attaching a comment in the same request.
    async fn post_transition(&self, key: &str, transition_id: &str, comment: Option<&str>)
        -> Result<()>;

    async fn assign(&self, key: &str, account_id: &str) -> Result<()>;

    async fn update_description(&self, key: &str, description: &str) -> Result<()>;

    async fn update_priority(&self, key: &str, priority: &str) -> Result<()>;

    /// Set the original estimate, in Jira duration syntax (`1h 30m`).
    async fn update_estimate(&self, key: &str, estimate: &str) -> Result<()>;

    /// Post a comment; `@[Name]` markers matching `users` become mentions.
    async fn post_comment(&self, key: &str, body: &str, users: &[User]) -> Result<()>;

    async fn assignable_users(&self, key: &str) -> Result<Vec<User>>;

    async fn priorities(&self) -> Result<Vec<Priority>>;

    /// Every workflow status the site knows, with its category.
    async fn statuses(&self) -> Result<Vec<Status>>;

    /// Issues whose parent is the epic `key`.
    async fn epic_children(&self, key: &str) -> Result<Vec<Issue>>;

    /// Tempo work-logs for an issue, by issue id.
    async fn worklogs(&self, issue_id: &str) -> Result<Vec<Worklog>>;

    async fn post_worklog(&self, worklog: &NewWorklog) -> Result<()>;

    async fn link_issue(&self, from_key: &str, to_key: &str) -> Result<()>;

    async fn unlink_issue(&self, link_id: &str) -> Result<()>;
}
