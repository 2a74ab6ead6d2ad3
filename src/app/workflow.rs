//! Guarded transition workflow.
//!
//! A chosen transition passes two guards before it is posted:
//!
//! 1. the issue must have an original estimate, otherwise one is collected;
//! 2. a transition into a cancellation status needs a reason, which is sent
//!    as the transition comment.
//!
//! Both guards may apply, always in that order. The transition waiting on a
//! guard is held as the pending transition.

use tracing::debug;

use crate::api::Transition;

/// Decides whether a target status counts as a cancellation.
///
/// Matches case-insensitively on any configured substring.
#[derive(Debug, Clone)]
pub struct CancelMatcher {
    patterns: Vec<String>,
}

impl CancelMatcher {
    pub fn new(patterns: &[String]) -> Self {
        Self {
            patterns: patterns.iter().map(|p| p.trim().to_lowercase()).collect(),
        }
    }

    pub fn matches(&self, status: &str) -> bool {
        let status = status.to_lowercase();
        self.patterns.iter().any(|p| status.contains(p.as_str()))
    }
}

/// What the controller must do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Collect an original estimate.
    RequireEstimate,
    /// Collect a cancellation reason.
    RequireCancelReason,
    /// Post the transition.
    Post {
        transition: Transition,
        comment: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct TransitionWorkflow {
    pending: Option<Transition>,
    matcher: CancelMatcher,
}

impl TransitionWorkflow {
    pub fn new(matcher: CancelMatcher) -> Self {
        Self {
            pending: None,
            matcher,
        }
    }

    pub fn pending(&self) -> Option<&Transition> {
        self.pending.as_ref()
    }

    /// Start the workflow for a chosen transition.
    pub fn select(&mut self, transition: Transition, has_estimate: bool) -> Step {
        debug!(transition = %transition.name, has_estimate, "Transition selected");
        if !has_estimate {
            self.pending = Some(transition);
            return Step::RequireEstimate;
        }
        self.check_cancel(transition)
    }

    /// The missing estimate was saved; only the cancellation guard remains.
    ///
    /// Returns `None` when nothing is pending (the workflow was abandoned).
    pub fn estimate_saved(&mut self) -> Option<Step> {
        let transition = self.pending.take()?;
        Some(self.check_cancel(transition))
    }

    /// The cancellation reason was entered.
    pub fn reason_submitted(&mut self, reason: String) -> Option<Step> {
        let transition = self.pending.take()?;
        Some(Step::Post {
            transition,
            comment: Some(reason),
        })
    }

    /// Abandon the workflow.
    pub fn cancel(&mut self) {
        if let Some(t) = self.pending.take() {
            debug!(transition = %t.name, "Pending transition dropped");
        }
    }

    fn check_cancel(&mut self, transition: Transition) -> Step {
        if self.matcher.matches(&transition.name) {
            self.pending = Some(transition);
            Step::RequireCancelReason
        } else {
            self.pending = None;
            Step::Post {
                transition,
                comment: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::transition;

    fn workflow() -> TransitionWorkflow {
        TransitionWorkflow::new(CancelMatcher::new(&["cancel".to_string()]))
    }

    #[test]
    fn test_matcher_is_case_insensitive_substring() {
        let matcher = CancelMatcher::new(&["cancel".to_string()]);
        assert!(matcher.matches("Cancelled"));
        assert!(matcher.matches("CANCELADO"));
        assert!(matcher.matches("Won't do / cancel"));
        assert!(!matcher.matches("Done"));
    }

    #[test]
    fn test_matcher_with_custom_patterns() {
        let matcher = CancelMatcher::new(&["Abandon".to_string(), "rejected".to_string()]);
        assert!(matcher.matches("abandoned"));
        assert!(matcher.matches("Rejected"));
        assert!(!matcher.matches("Cancelled"));
    }

    #[test]
    fn test_no_guard_posts_directly() {
        let mut wf = workflow();
        let step = wf.select(transition("21", "Done"), true);
        assert_eq!(
            step,
            Step::Post {
                transition: transition("21", "Done"),
                comment: None
            }
        );
        assert!(wf.pending().is_none());
    }

    #[test]
    fn test_missing_estimate_then_post() {
        let mut wf = workflow();
        assert_eq!(wf.select(transition("21", "Done"), false), Step::RequireEstimate);
        assert_eq!(wf.pending(), Some(&transition("21", "Done")));

        let step = wf.estimate_saved().unwrap();
        assert!(matches!(step, Step::Post { comment: None, .. }));
        assert!(wf.pending().is_none());
    }

    #[test]
    fn test_both_guards_in_order() {
        let mut wf = workflow();
        assert_eq!(
            wf.select(transition("31", "Cancelled"), false),
            Step::RequireEstimate
        );
        assert_eq!(wf.estimate_saved(), Some(Step::RequireCancelReason));
        assert_eq!(wf.pending(), Some(&transition("31", "Cancelled")));

        assert_eq!(
            wf.reason_submitted("duplicate".to_string()),
            Some(Step::Post {
                transition: transition("31", "Cancelled"),
                comment: Some("duplicate".to_string())
            })
        );
        assert!(wf.pending().is_none());
    }

    #[test]
    fn test_cancel_only_guard() {
        let mut wf = workflow();
        assert_eq!(
            wf.select(transition("31", "Cancelled"), true),
            Step::RequireCancelReason
        );
    }

    #[test]
    fn test_cancel_clears_pending_and_ignores_late_results() {
        let mut wf = workflow();
        wf.select(transition("31", "Cancelled"), false);
        wf.cancel();

        assert!(wf.pending().is_none());
        assert_eq!(wf.estimate_saved(), None);
        assert_eq!(wf.reason_submitted("late".to_string()), None);
    }
}
