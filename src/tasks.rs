//! Effect queue for non-blocking gateway operations.
//!
//! The event loop never awaits the network. State updates describe the
//! remote work they need as [`Effect`] values; the loop hands them to a
//! [`TaskSpawner`], which runs each on a background task and sends exactly
//! one [`ApiMessage`] back through the channel. The loop polls the channel
//! with `try_recv()` and applies messages one at a time.
//!
//! Gateway failures never escape a task: they arrive as
//! [`ApiMessage::Failure`] carrying the effect kind, its subject and a
//! user-facing cause.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::api::{
    Gateway, Issue, IssueDetail, NewWorklog, Priority, Status, Transition, User, Worklog,
};
use crate::error::AppError;
use crate::pool;

/// Identifies the operation behind an effect or message.
///
/// Used for loading flags and for routing failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Issues,
    Myself,
    Statuses,
    Detail,
    Transitions,
    PostTransition,
    Assign,
    Users,
    Priorities,
    Description,
    Priority,
    Estimate,
    Comment,
    Worklogs,
    WorklogTotals,
    PostWorklog,
    Link,
    EpicChildren,
}

impl EffectKind {
    /// Short label for status messages.
    pub fn label(self) -> &'static str {
        match self {
            EffectKind::Issues => "load issues",
            EffectKind::Myself => "load current user",
            EffectKind::Statuses => "load statuses",
            EffectKind::Detail => "load issue",
            EffectKind::Transitions => "load transitions",
            EffectKind::PostTransition => "change status",
            EffectKind::Assign => "assign issue",
            EffectKind::Users => "load users",
            EffectKind::Priorities => "load priorities",
            EffectKind::Description => "update description",
            EffectKind::Priority => "update priority",
            EffectKind::Estimate => "set estimate",
            EffectKind::Comment => "post comment",
            EffectKind::Worklogs => "load work-logs",
            EffectKind::WorklogTotals => "load work-log totals",
            EffectKind::PostWorklog => "log work",
            EffectKind::Link => "update link",
            EffectKind::EpicChildren => "load epic children",
        }
    }
}

/// A deferred description of one remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchMyIssues,
    FetchMyself,
    FetchStatuses,
    FetchDetail {
        key: String,
    },
    FetchTransitions {
        key: String,
    },
    PostTransition {
        key: String,
        transition_id: String,
        comment: Option<String>,
    },
    Assign {
        key: String,
        account_id: String,
    },
    FetchUsers {
        key: String,
    },
    FetchPriorities,
    UpdateDescription {
        key: String,
        description: String,
    },
    UpdatePriority {
        key: String,
        priority: String,
    },
    UpdateEstimate {
        key: String,
        estimate: String,
    },
    PostComment {
        key: String,
        body: String,
        users: Vec<User>,
    },
    FetchWorklogs {
        issue_id: String,
    },
    FetchWorklogTotals {
        issue_ids: Vec<String>,
    },
    PostWorklog {
        key: String,
        worklog: NewWorklog,
    },
    LinkIssue {
        key: String,
        other_key: String,
    },
    UnlinkIssue {
        key: String,
        link_id: String,
    },
    FetchEpicChildren {
        key: String,
    },
}

impl Effect {
    pub fn kind(&self) -> EffectKind {
        match self {
            Effect::FetchMyIssues => EffectKind::Issues,
            Effect::FetchMyself => EffectKind::Myself,
            Effect::FetchStatuses => EffectKind::Statuses,
            Effect::FetchDetail { .. } => EffectKind::Detail,
            Effect::FetchTransitions { .. } => EffectKind::Transitions,
            Effect::PostTransition { .. } => EffectKind::PostTransition,
            Effect::Assign { .. } => EffectKind::Assign,
            Effect::FetchUsers { .. } => EffectKind::Users,
            Effect::FetchPriorities => EffectKind::Priorities,
            Effect::UpdateDescription { .. } => EffectKind::Description,
            Effect::UpdatePriority { .. } => EffectKind::Priority,
            Effect::UpdateEstimate { .. } => EffectKind::Estimate,
            Effect::PostComment { .. } => EffectKind::Comment,
            Effect::FetchWorklogs { .. } => EffectKind::Worklogs,
            Effect::FetchWorklogTotals { .. } => EffectKind::WorklogTotals,
            Effect::PostWorklog { .. } => EffectKind::PostWorklog,
            Effect::LinkIssue { .. } | Effect::UnlinkIssue { .. } => EffectKind::Link,
            Effect::FetchEpicChildren { .. } => EffectKind::EpicChildren,
        }
    }

    /// The issue key (or, for work-log fetches, issue id) this effect is about.
    pub fn subject(&self) -> Option<&str> {
        match self {
            Effect::FetchMyIssues
            | Effect::FetchMyself
            | Effect::FetchStatuses
            | Effect::FetchPriorities
            | Effect::FetchWorklogTotals { .. } => None,
            Effect::FetchWorklogs { issue_id } => Some(issue_id),
            Effect::FetchDetail { key }
            | Effect::FetchTransitions { key }
            | Effect::PostTransition { key, .. }
            | Effect::Assign { key, .. }
            | Effect::FetchUsers { key }
            | Effect::UpdateDescription { key, .. }
            | Effect::UpdatePriority { key, .. }
            | Effect::UpdateEstimate { key, .. }
            | Effect::PostComment { key, .. }
            | Effect::PostWorklog { key, .. }
            | Effect::LinkIssue { key, .. }
            | Effect::UnlinkIssue { key, .. }
            | Effect::FetchEpicChildren { key } => Some(key),
        }
    }
}

/// Messages sent from background tasks to the main event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiMessage {
    IssuesLoaded(Vec<Issue>),
    MyselfLoaded(User),
    StatusesLoaded(Vec<Status>),
    DetailLoaded {
        key: String,
        detail: IssueDetail,
    },
    TransitionsLoaded {
        key: String,
        transitions: Vec<Transition>,
    },
    TransitionPosted {
        key: String,
    },
    AssigneeChanged {
        key: String,
    },
    UsersLoaded {
        key: String,
        users: Vec<User>,
    },
    PrioritiesLoaded(Vec<Priority>),
    DescriptionUpdated {
        key: String,
    },
    PriorityUpdated {
        key: String,
    },
    /// The estimate was saved; carries the value that was sent.
    EstimateUpdated {
        key: String,
        estimate: String,
    },
    CommentPosted {
        key: String,
    },
    WorklogsLoaded {
        issue_id: String,
        worklogs: Vec<Worklog>,
    },
    /// Totals for every issue whose fetch succeeded.
    WorklogTotalsLoaded(HashMap<String, u64>),
    WorklogPosted {
        key: String,
    },
    LinkToggled {
        key: String,
    },
    EpicChildrenLoaded {
        key: String,
        children: Vec<Issue>,
    },
    /// Any effect that failed.
    Failure {
        kind: EffectKind,
        subject: Option<String>,
        cause: String,
    },
}

impl ApiMessage {
    pub fn kind(&self) -> EffectKind {
        match self {
            ApiMessage::IssuesLoaded(_) => EffectKind::Issues,
            ApiMessage::MyselfLoaded(_) => EffectKind::Myself,
            ApiMessage::StatusesLoaded(_) => EffectKind::Statuses,
            ApiMessage::DetailLoaded { .. } => EffectKind::Detail,
            ApiMessage::TransitionsLoaded { .. } => EffectKind::Transitions,
            ApiMessage::TransitionPosted { .. } => EffectKind::PostTransition,
            ApiMessage::AssigneeChanged { .. } => EffectKind::Assign,
            ApiMessage::UsersLoaded { .. } => EffectKind::Users,
            ApiMessage::PrioritiesLoaded(_) => EffectKind::Priorities,
            ApiMessage::DescriptionUpdated { .. } => EffectKind::Description,
            ApiMessage::PriorityUpdated { .. } => EffectKind::Priority,
            ApiMessage::EstimateUpdated { .. } => EffectKind::Estimate,
            ApiMessage::CommentPosted { .. } => EffectKind::Comment,
            ApiMessage::WorklogsLoaded { .. } => EffectKind::Worklogs,
            ApiMessage::WorklogTotalsLoaded(_) => EffectKind::WorklogTotals,
            ApiMessage::WorklogPosted { .. } => EffectKind::PostWorklog,
            ApiMessage::LinkToggled { .. } => EffectKind::Link,
            ApiMessage::EpicChildrenLoaded { .. } => EffectKind::EpicChildren,
            ApiMessage::Failure { kind, .. } => *kind,
        }
    }
}

/// Execute one effect against the gateway.
///
/// Never fails: gateway errors become [`ApiMessage::Failure`].
pub async fn run(gateway: Arc<dyn Gateway>, effect: Effect, worklog_limit: usize) -> ApiMessage {
    let kind = effect.kind();
    let subject = effect.subject().map(str::to_string);

    match execute(gateway, effect, worklog_limit).await {
        Ok(message) => message,
        Err(e) => {
            let error = AppError::from(e);
            if error.is_critical() {
                error!(?kind, subject = ?subject, error = %error, "Effect failed");
            } else {
                warn!(?kind, subject = ?subject, error = %error, "Effect failed");
            }
            ApiMessage::Failure {
                kind,
                subject,
                cause: error.user_message(),
            }
        }
    }
}

async fn execute(
    gateway: Arc<dyn Gateway>,
    effect: Effect,
    worklog_limit: usize,
) -> crate::api::Result<ApiMessage> {
    let message = match effect {
        Effect::FetchMyIssues => ApiMessage::IssuesLoaded(gateway.my_issues().await?),
        Effect::FetchMyself => ApiMessage::MyselfLoaded(gateway.myself().await?),
        Effect::FetchDetail { key } => {
            let detail = gateway.issue_detail(&key).await?;
            ApiMessage::DetailLoaded { key, detail }
        }
        Effect::FetchTransitions { key } => {
            let transitions = gateway.transitions(&key).await?;
            ApiMessage::TransitionsLoaded { key, transitions }
        }
        Effect::PostTransition {
            key,
            transition_id,
            comment,
        } => {
            gateway
                .post_transition(&key, &transition_id, comment.as_deref())
                .await?;
            ApiMessage::TransitionPosted { key }
        }
        Effect::Assign { key, account_id } => {
            gateway.assign(&key, &account_id).await?;
            ApiMessage::AssigneeChanged { key }
        }
        Effect::FetchUsers { key } => {
            let users = gateway.assignable_users(&key).await?;
            ApiMessage::UsersLoaded { key, users }
        }
        Effect::FetchPriorities => ApiMessage::PrioritiesLoaded(gateway.priorities().await?),
        Effect::FetchStatuses => ApiMessage::StatusesLoaded(gateway.statuses().await?),
        Effect::FetchEpicChildren { key } => {
            let children = gateway.epic_children(&key).await?;
            ApiMessage::EpicChildrenLoaded { key, children }
        }
        Effect::UpdateDescription { key, description } => {
            gateway.update_description(&key, &description).await?;
            ApiMessage::DescriptionUpdated { key }
        }
        Effect::UpdatePriority { key, priority } => {
            gateway.update_priority(&key, &priority).await?;
            ApiMessage::PriorityUpdated { key }
        }
        Effect::UpdateEstimate { key, estimate } => {
            gateway.update_estimate(&key, &estimate).await?;
            ApiMessage::EstimateUpdated { key, estimate }
        }
        Effect::PostComment { key, body, users } => {
            gateway.post_comment(&key, &body, &users).await?;
            ApiMessage::CommentPosted { key }
        }
        Effect::FetchWorklogs { issue_id } => {
            let worklogs = gateway.worklogs(&issue_id).await?;
            ApiMessage::WorklogsLoaded { issue_id, worklogs }
        }
        Effect::FetchWorklogTotals { issue_ids } => ApiMessage::WorklogTotalsLoaded(
            pool::fetch_worklog_totals(gateway, issue_ids, worklog_limit).await,
        ),
        Effect::PostWorklog { key, worklog } => {
            gateway.post_worklog(&worklog).await?;
            ApiMessage::WorklogPosted { key }
        }
        Effect::LinkIssue { key, other_key } => {
            gateway.link_issue(&key, &other_key).await?;
            ApiMessage::LinkToggled { key }
        }
        Effect::UnlinkIssue { key, link_id } => {
            gateway.unlink_issue(&link_id).await?;
            ApiMessage::LinkToggled { key }
        }
    };
    Ok(message)
}

/// Spawns background tasks for effects.
///
/// Each call to [`TaskSpawner::issue`] spawns one tokio task that sends its
/// result through the channel. Nothing is cancelled once issued; stale
/// results are filtered when applied.
#[derive(Clone)]
pub struct TaskSpawner {
    tx: mpsc::UnboundedSender<ApiMessage>,
    gateway: Arc<dyn Gateway>,
    worklog_limit: usize,
}

impl TaskSpawner {
    pub fn new(
        tx: mpsc::UnboundedSender<ApiMessage>,
        gateway: Arc<dyn Gateway>,
        worklog_limit: usize,
    ) -> Self {
        Self {
            tx,
            gateway,
            worklog_limit,
        }
    }

    /// Fire-and-forget execution of one effect.
    pub fn issue(&self, effect: Effect) {
        debug!(kind = ?effect.kind(), subject = ?effect.subject(), "Issuing effect");
        let tx = self.tx.clone();
        let gateway = self.gateway.clone();
        let limit = self.worklog_limit;
        tokio::spawn(async move {
            let message = run(gateway, effect, limit).await;
            // The receiver only goes away during shutdown.
            let _ = tx.send(message);
        });
    }
}

/// Create the channel used by background tasks to report results.
pub fn create_task_channel() -> (
    mpsc::UnboundedSender<ApiMessage>,
    mpsc::UnboundedReceiver<ApiMessage>,
) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{detail, issue, transition, user, worklog, FakeGateway};

    fn gateway(fake: FakeGateway) -> Arc<dyn Gateway> {
        Arc::new(fake)
    }

    #[tokio::test]
    async fn test_run_maps_success_to_message() {
        let mut fake = FakeGateway::default();
        fake.details
            .insert("DEV-1".to_string(), detail("DEV-1", "1", Some("2h")));

        let message = run(
            gateway(fake),
            Effect::FetchDetail {
                key: "DEV-1".to_string(),
            },
            5,
        )
        .await;

        match message {
            ApiMessage::DetailLoaded { key, detail } => {
                assert_eq!(key, "DEV-1");
                assert_eq!(detail.original_estimate.as_deref(), Some("2h"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_fetches_epic_children() {
        let mut fake = FakeGateway::default();
        fake.epic_children
            .insert("DEV-7".to_string(), vec![issue("DEV-8", "8"), issue("DEV-9", "9")]);

        let message = run(
            gateway(fake),
            Effect::FetchEpicChildren {
                key: "DEV-7".to_string(),
            },
            5,
        )
        .await;

        match message {
            ApiMessage::EpicChildrenLoaded { key, children } => {
                assert_eq!(key, "DEV-7");
                assert_eq!(children.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_converts_error_to_failure() {
        let mut fake = FakeGateway::default();
        fake.fail("update_estimate");

        let message = run(
            gateway(fake),
            Effect::UpdateEstimate {
                key: "DEV-1".to_string(),
                estimate: "2h".to_string(),
            },
            5,
        )
        .await;

        match message {
            ApiMessage::Failure {
                kind,
                subject,
                cause,
            } => {
                assert_eq!(kind, EffectKind::Estimate);
                assert_eq!(subject.as_deref(), Some("DEV-1"));
                assert_eq!(cause, "Server error. Please try again later.");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_post_transition_passes_comment() {
        let fake = Arc::new(FakeGateway::default());

        let message = run(
            fake.clone(),
            Effect::PostTransition {
                key: "DEV-1".to_string(),
                transition_id: "31".to_string(),
                comment: Some("duplicate".to_string()),
            },
            5,
        )
        .await;

        assert_eq!(
            message,
            ApiMessage::TransitionPosted {
                key: "DEV-1".to_string()
            }
        );
        assert_eq!(
            fake.calls(),
            vec![r#"post_transition DEV-1 31 Some("duplicate")"#.to_string()]
        );
    }

    #[tokio::test]
    async fn test_worklog_totals_effect_uses_pool() {
        let mut fake = FakeGateway::default();
        fake.worklogs.insert("1".to_string(), vec![worklog(600)]);
        fake.fail("worklogs:2");

        let message = run(
            gateway(fake),
            Effect::FetchWorklogTotals {
                issue_ids: vec!["1".to_string(), "2".to_string()],
            },
            5,
        )
        .await;

        assert_eq!(
            message,
            ApiMessage::WorklogTotalsLoaded(HashMap::from([("1".to_string(), 600)]))
        );
    }

    #[tokio::test]
    async fn test_spawner_sends_exactly_one_message() {
        let mut fake = FakeGateway::default();
        fake.issues = vec![issue("DEV-1", "1")];
        fake.transitions
            .insert("DEV-1".to_string(), vec![transition("11", "Done")]);
        fake.users = vec![user("a", "Ada")];

        let (tx, mut rx) = create_task_channel();
        let spawner = TaskSpawner::new(tx, gateway(fake), 5);
        spawner.issue(Effect::FetchMyIssues);

        let message = rx.recv().await.unwrap();
        assert_eq!(message.kind(), EffectKind::Issues);
        drop(spawner);
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_effect_subjects() {
        assert_eq!(Effect::FetchMyIssues.subject(), None);
        assert_eq!(Effect::FetchStatuses.subject(), None);
        assert_eq!(
            Effect::FetchWorklogs {
                issue_id: "10001".to_string()
            }
            .subject(),
            Some("10001")
        );
        assert_eq!(
            Effect::UnlinkIssue {
                key: "DEV-1".to_string(),
                link_id: "77".to_string()
            }
            .kind(),
            EffectKind::Link
        );
    }
}
