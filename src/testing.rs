//! In-memory gateway and fixtures for tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{
    ApiError, Gateway, Issue, IssueDetail, NewWorklog, Priority, Result, Status, StatusCategory,
    Transition, User, Worklog,
};

/// A scripted [`Gateway`] that records every call.
///
/// Operations listed with [`FakeGateway::fail`] return a server error. Work-log
/// fetches can be failed per issue with `"worklogs:<id>"`.
#[derive(Default)]
pub struct FakeGateway {
    pub issues: Vec<Issue>,
    pub details: HashMap<String, IssueDetail>,
    pub transitions: HashMap<String, Vec<Transition>>,
    pub users: Vec<User>,
    pub priorities: Vec<Priority>,
    pub statuses: Vec<Status>,
    pub epic_children: HashMap<String, Vec<Issue>>,
    pub worklogs: HashMap<String, Vec<Worklog>>,
    pub worklog_delay: Option<Duration>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeGateway {
    pub fn fail(&mut self, op: &str) {
        self.failing.insert(op.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Highest number of concurrent `worklogs` calls observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn record(&self, op: &str, call: String) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if self.failing.contains(op) {
            return Err(ApiError::ServerError(format!("{} failed", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn my_issues(&self) -> Result<Vec<Issue>> {
        self.record("my_issues", "my_issues".to_string())?;
        Ok(self.issues.clone())
    }

    async fn myself(&self) -> Result<User> {
        self.record("myself", "myself".to_string())?;
        Ok(user("me", "Current User"))
    }

    async fn issue_detail(&self, key: &str) -> Result<IssueDetail> {
        self.record("issue_detail", format!("issue_detail {}", key))?;
        self.details
            .get(key)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Issue '{}'", key)))
    }

    async fn transitions(&self, key: &str) -> Result<Vec<Transition>> {
        self.record("transitions", format!("transitions {}", key))?;
        Ok(self.transitions.get(key).cloned().unwrap_or_default())
    }

    async fn post_transition(
        &self,
        key: &str,
        transition_id: &str,
        comment: Option<&str>,
    ) -> Result<()> {
        self.record(
            "post_transition",
            format!("post_transition {} {} {:?}", key, transition_id, comment),
        )
    }

    async fn assign(&self, key: &str, account_id: &str) -> Result<()> {
        self.record("assign", format!("assign {} {}", key, account_id))
    }

    async fn update_description(&self, key: &str, description: &str) -> Result<()> {
        self.record(
            "update_description",
            format!("update_description {} {}", key, description),
        )
    }

    async fn update_priority(&self, key: &str, priority: &str) -> Result<()> {
        self.record("update_priority", format!("update_priority {} {}", key, priority))
    }

    async fn update_estimate(&self, key: &str, estimate: &str) -> Result<()> {
        self.record("update_estimate", format!("update_estimate {} {}", key, estimate))
    }

    async fn post_comment(&self, key: &str, body: &str, users: &[User]) -> Result<()> {
        self.record(
            "post_comment",
            format!("post_comment {} {} ({} users)", key, body, users.len()),
        )
    }

    async fn assignable_users(&self, key: &str) -> Result<Vec<User>> {
        self.record("assignable_users", format!("assignable_users {}", key))?;
        Ok(self.users.clone())
    }

    async fn priorities(&self) -> Result<Vec<Priority>> {
        self.record("priorities", "priorities".to_string())?;
        Ok(self.priorities.clone())
    }

    async fn statuses(&self) -> Result<Vec<Status>> {
        self.record("statuses", "statuses".to_string())?;
        Ok(self.statuses.clone())
    }

    async fn epic_children(&self, key: &str) -> Result<Vec<Issue>> {
        self.record("epic_children", format!("epic_children {}", key))?;
        Ok(self.epic_children.get(key).cloned().unwrap_or_default())
    }

    async fn worklogs(&self, issue_id: &str) -> Result<Vec<Worklog>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.worklog_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.record(
            &format!("worklogs:{}", issue_id),
            format!("worklogs {}", issue_id),
        )?;
        Ok(self.worklogs.get(issue_id).cloned().unwrap_or_default())
    }

    async fn post_worklog(&self, worklog: &NewWorklog) -> Result<()> {
        self.record(
            "post_worklog",
            format!(
                "post_worklog {} {} {}",
                worklog.issue_id, worklog.seconds, worklog.start_date
            ),
        )
    }

    async fn link_issue(&self, from_key: &str, to_key: &str) -> Result<()> {
        self.record("link_issue", format!("link_issue {} {}", from_key, to_key))
    }

    async fn unlink_issue(&self, link_id: &str) -> Result<()> {
        self.record("unlink_issue", format!("unlink_issue {}", link_id))
    }
}

pub fn issue(key: &str, id: &str) -> Issue {
    Issue {
        id: id.to_string(),
        key: key.to_string(),
        summary: format!("Summary of {}", key),
        status: "In Progress".to_string(),
        issue_type: "Task".to_string(),
        assignee: None,
        priority: Some("Medium".to_string()),
    }
}

/// A detail with the given original estimate (`None` means unestimated).
pub fn detail(key: &str, id: &str, estimate: Option<&str>) -> IssueDetail {
    IssueDetail {
        id: id.to_string(),
        key: key.to_string(),
        summary: format!("Summary of {}", key),
        status: "In Progress".to_string(),
        issue_type: "Task".to_string(),
        original_estimate: estimate.map(str::to_string),
        ..IssueDetail::default()
    }
}

pub fn transition(id: &str, name: &str) -> Transition {
    Transition {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn user(account_id: &str, name: &str) -> User {
    User {
        account_id: account_id.to_string(),
        display_name: name.to_string(),
    }
}

pub fn worklog(seconds: u64) -> Worklog {
    Worklog {
        id: None,
        seconds,
        author_account_id: None,
        description: String::new(),
        start_date: None,
    }
}

pub fn status(name: &str, category: StatusCategory) -> Status {
    Status {
        id: name.to_lowercase(),
        name: name.to_string(),
        category: Some(category),
    }
}
