//! The mode state machine.
//!
//! Exactly one [`Mode`] is active. Editing modes remember the mode that
//! opened them and return there on escape or submission. Transitions are a
//! pure function of the current [`ModeState`] and a [`ModeEvent`].

use crate::tasks::EffectKind;

/// The active top-level view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    List,
    Detail,
    TransitionSelect,
    RequireEstimate,
    RequireCancelReason,
    UserSearch,
    EditDescription,
    EditPriority,
    PostComment,
    PostWorklog,
    LinkIssueSearch,
}

impl Mode {
    /// Editing modes own a form and overlay the view they were opened from.
    pub fn is_editing(self) -> bool {
        !matches!(self, Mode::List | Mode::Detail)
    }

    /// Modes reachable only through a workflow redirect.
    pub fn is_workflow_step(self) -> bool {
        matches!(self, Mode::RequireEstimate | Mode::RequireCancelReason)
    }

    /// Modes without free text input, where `q` means quit.
    pub fn is_navigation(self) -> bool {
        matches!(
            self,
            Mode::List | Mode::Detail | Mode::TransitionSelect | Mode::EditPriority
        )
    }

    /// The fetch that must succeed for this mode to be usable.
    ///
    /// If it fails the mode reverts to its parent.
    pub fn required_fetch(self) -> Option<EffectKind> {
        match self {
            Mode::Detail => Some(EffectKind::Detail),
            Mode::TransitionSelect => Some(EffectKind::Transitions),
            Mode::UserSearch => Some(EffectKind::Users),
            Mode::EditPriority => Some(EffectKind::Priorities),
            _ => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Mode::List => "My Issues",
            Mode::Detail => "Issue",
            Mode::TransitionSelect => "Change Status",
            Mode::RequireEstimate => "Original Estimate Required",
            Mode::RequireCancelReason => "Cancellation Reason",
            Mode::UserSearch => "Assign",
            Mode::EditDescription => "Edit Description",
            Mode::EditPriority => "Priority",
            Mode::PostComment => "Comment",
            Mode::PostWorklog => "Log Work",
            Mode::LinkIssueSearch => "Issue Key",
        }
    }
}

/// The active mode and the mode that opened it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeState {
    pub current: Mode,
    pub parent: Mode,
}

impl ModeState {
    fn at(current: Mode, parent: Mode) -> Self {
        Self { current, parent }
    }

    /// Where `Escape` (or a failed entry) leads from here.
    fn back(self) -> Self {
        match self.current {
            Mode::List | Mode::Detail => Self::at(Mode::List, Mode::List),
            _ => Self::at(self.parent, Mode::List),
        }
    }
}

/// Inputs to the mode state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEvent {
    /// User asked to open a mode.
    Open(Mode),
    Escape,
    /// The active form was submitted.
    Submitted,
    /// A workflow guard moved to another step, keeping the original parent.
    Redirect(Mode),
    /// The fetch required by the active mode failed.
    EnterFailed,
}

/// Compute the next mode state. Disallowed events leave the state unchanged.
pub fn transition(state: ModeState, event: ModeEvent) -> ModeState {
    match event {
        ModeEvent::Open(target) => {
            if can_open(state.current, target) {
                ModeState::at(target, state.current)
            } else {
                state
            }
        }
        ModeEvent::Escape | ModeEvent::EnterFailed => state.back(),
        ModeEvent::Submitted => match (state.current, state.parent) {
            // Opening an issue by key from the list lands on its detail.
            (Mode::LinkIssueSearch, Mode::List) => ModeState::at(Mode::Detail, Mode::List),
            (current, _) if current.is_editing() => state.back(),
            _ => state,
        },
        ModeEvent::Redirect(target) => {
            let from_workflow = matches!(
                state.current,
                Mode::TransitionSelect | Mode::RequireEstimate
            );
            if from_workflow && target.is_workflow_step() {
                ModeState::at(target, state.parent)
            } else {
                state
            }
        }
    }
}

fn can_open(from: Mode, target: Mode) -> bool {
    match from {
        Mode::List => matches!(target, Mode::Detail | Mode::LinkIssueSearch),
        Mode::Detail => target.is_editing() && !target.is_workflow_step(),
        _ => false,
    }
}
