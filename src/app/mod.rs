//! Main application state and event dispatch.
//!
//! This module implements The Elm Architecture (TEA) pattern: [`App`] is the
//! model, [`App::update`] applies one [`Event`] and returns the [`Effect`]s
//! to issue, and the view renders from the model only. Background tasks never
//! touch the model; their results come back as [`ApiMessage`]s.

mod loading;
mod mode;
mod sections;
mod workflow;

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, info, warn};

pub use loading::LoadingFlags;
pub use mode::{Mode, ModeEvent, ModeState};
pub use sections::{Section, StatusCategories};
pub use workflow::{CancelMatcher, Step, TransitionWorkflow};

use crate::api::types::total_seconds;
use crate::api::{Issue, IssueDetail, NewWorklog, Priority, Transition, User, Worklog};
use crate::config::Settings;
use crate::events::Event;
use crate::tasks::{ApiMessage, Effect, EffectKind};
use crate::time::format_duration;
use crate::ui::{Form, FormOutcome, FormValue, StatusMessage, TextInput, TextRule};

/// Work-logs of the issue shown in the detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedWorklogs {
    pub issue_id: String,
    pub worklogs: Vec<Worklog>,
}

/// What the right-hand panel of the detail view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SidePanel {
    #[default]
    Worklogs,
    EpicChildren,
}

/// Child issues of the epic shown in the detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpicChildren {
    pub key: String,
    pub issues: Vec<Issue>,
}

/// The main application struct that holds all state.
pub struct App {
    mode: ModeState,
    /// Present iff the current mode is an editing mode.
    form: Option<Form>,
    /// Fetch issued on entering the current mode and not yet answered.
    entering: Option<EffectKind>,

    issues: Vec<Issue>,
    /// Index into the filtered list.
    cursor: usize,
    filter: TextInput,
    filter_active: bool,
    status_categories: StatusCategories,
    show_done: bool,

    selected_key: Option<String>,
    detail: Option<IssueDetail>,
    detail_scroll: u16,
    selected_worklogs: Option<SelectedWorklogs>,
    side_panel: SidePanel,
    epic_children: Option<EpicChildren>,

    transitions: Vec<Transition>,
    /// Assignable users per issue key.
    users: HashMap<String, Vec<User>>,
    priorities: Vec<Priority>,
    myself: Option<User>,
    /// Logged seconds per issue id.
    worklog_totals: HashMap<String, u64>,

    workflow: TransitionWorkflow,
    change_issue_key: Option<String>,

    loading: LoadingFlags,
    status: Option<StatusMessage>,
    /// Kind of the failure behind an error status.
    failed: Option<EffectKind>,
    tick: usize,
    should_quit: bool,
}

impl App {
    /// Create a new application instance.
    pub fn new(settings: &Settings) -> Self {
        debug!("Creating new application instance");
        Self {
            mode: ModeState::default(),
            form: None,
            entering: None,
            issues: Vec::new(),
            cursor: 0,
            filter: TextInput::new(),
            filter_active: false,
            status_categories: StatusCategories::default(),
            show_done: false,
            selected_key: None,
            detail: None,
            detail_scroll: 0,
            selected_worklogs: None,
            side_panel: SidePanel::default(),
            epic_children: None,
            transitions: Vec::new(),
            users: HashMap::new(),
            priorities: Vec::new(),
            myself: None,
            worklog_totals: HashMap::new(),
            workflow: TransitionWorkflow::new(CancelMatcher::new(&settings.cancel_patterns)),
            change_issue_key: settings.change_issue_key.clone(),
            loading: LoadingFlags::default(),
            status: None,
            failed: None,
            tick: 0,
            should_quit: false,
        }
    }

    /// Effects to issue at startup.
    pub fn init(&mut self) -> Vec<Effect> {
        self.track(vec![
            Effect::FetchMyIssues,
            Effect::FetchMyself,
            Effect::FetchStatuses,
        ])
    }

    // ========================================================================
    // Read access for the view
    // ========================================================================

    pub fn mode(&self) -> Mode {
        self.mode.current
    }

    pub fn mode_state(&self) -> ModeState {
        self.mode
    }

    pub fn form(&self) -> Option<&Form> {
        self.form.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Issues matching the list filter, grouped by status category.
    pub fn sections(&self) -> Vec<Section<'_>> {
        let filter = self.filter.value().trim();
        sections::group(
            self.issues.iter().filter(|issue| issue.matches_filter(filter)),
            &self.status_categories,
            self.show_done,
        )
    }

    /// Issues the cursor can reach, in display order.
    pub fn visible_issues(&self) -> Vec<&Issue> {
        self.sections()
            .into_iter()
            .filter(|section| !section.collapsed)
            .flat_map(|section| section.issues)
            .collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn filter(&self) -> &str {
        self.filter.value()
    }

    pub fn is_filtering(&self) -> bool {
        self.filter_active
    }

    pub fn selected_key(&self) -> Option<&str> {
        self.selected_key.as_deref()
    }

    pub fn detail(&self) -> Option<&IssueDetail> {
        self.detail.as_ref()
    }

    pub fn detail_scroll(&self) -> u16 {
        self.detail_scroll
    }

    pub fn selected_worklogs(&self) -> Option<&SelectedWorklogs> {
        self.selected_worklogs.as_ref()
    }

    pub fn side_panel(&self) -> SidePanel {
        self.side_panel
    }

    /// Children of the shown epic, once loaded.
    pub fn epic_children(&self) -> Option<&[Issue]> {
        let children = self.epic_children.as_ref()?;
        (self.selected_key.as_deref() == Some(children.key.as_str()))
            .then_some(children.issues.as_slice())
    }

    pub fn worklog_total(&self, issue_id: &str) -> Option<u64> {
        self.worklog_totals.get(issue_id).copied()
    }

    /// Seconds logged across all loaded issues.
    pub fn total_logged(&self) -> u64 {
        self.issues
            .iter()
            .filter_map(|issue| self.worklog_totals.get(&issue.id))
            .sum()
    }

    pub fn pending_transition(&self) -> Option<&Transition> {
        self.workflow.pending()
    }

    pub fn change_issue_key(&self) -> Option<&str> {
        self.change_issue_key.as_deref()
    }

    pub fn loading(&self) -> &LoadingFlags {
        &self.loading
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn tick(&self) -> usize {
        self.tick
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Apply one event and return the effects it requires.
    pub fn update(&mut self, event: Event) -> Vec<Effect> {
        let effects = match event {
            Event::Key(key) => self.handle_key(key),
            Event::Api(message) => self.handle_message(message),
            Event::Tick => {
                self.tick = self.tick.wrapping_add(1);
                Vec::new()
            }
            Event::Resize(..) => Vec::new(),
        };
        self.track(effects)
    }

    /// Raise the loading flag for every effect about to be issued.
    fn track(&mut self, effects: Vec<Effect>) -> Vec<Effect> {
        for effect in &effects {
            self.loading.begin(effect.kind());
        }
        effects
    }

    fn set_error(&mut self, kind: EffectKind, message: impl Into<String>) {
        self.status = Some(StatusMessage::Error(message.into()));
        self.failed = Some(kind);
    }

    /// Drop an error status once the same kind of operation succeeds.
    fn clear_error_on_success(&mut self, kind: EffectKind) {
        if self.failed != Some(kind) {
            return;
        }
        self.failed = None;
        if matches!(self.status, Some(StatusMessage::Error(_))) {
            self.status = None;
        }
    }

    /// Forget the entry fetch once its result has arrived.
    fn entered(&mut self, kind: EffectKind) {
        if self.entering == Some(kind) {
            self.entering = None;
        }
    }

    fn set_info(&mut self, message: impl Into<String>) {
        self.status = Some(StatusMessage::Info(message.into()));
    }

    /// Whether a result about `key` still concerns what is on screen.
    fn is_current(&self, key: &str) -> bool {
        self.mode.current != Mode::List && self.selected_key.as_deref() == Some(key)
    }

    // ========================================================================
    // Mode changes
    // ========================================================================

    /// Run the mode state machine and perform entry actions.
    fn change_mode(&mut self, event: ModeEvent) -> Vec<Effect> {
        let previous = self.mode;
        let next = mode::transition(previous, event);
        if next == previous {
            return Vec::new();
        }

        debug!(from = ?previous.current, to = ?next.current, ?event, "Mode changed");
        self.mode = next;
        self.form = None;
        self.status = None;
        self.entering = None;

        if in_workflow(previous.current) && !in_workflow(next.current) {
            self.workflow.cancel();
        }

        match next.current {
            Mode::List => {
                self.selected_key = None;
                self.detail = None;
                self.selected_worklogs = None;
                self.detail_scroll = 0;
                self.side_panel = SidePanel::Worklogs;
                self.epic_children = None;
                if previous.current == Mode::Detail && event == ModeEvent::Escape {
                    vec![Effect::FetchMyIssues]
                } else {
                    Vec::new()
                }
            }
            Mode::Detail => Vec::new(),
            editing => {
                let effects = self.enter_editor(editing);
                self.entering = editing
                    .required_fetch()
                    .filter(|kind| effects.iter().any(|e| e.kind() == *kind));
                effects
            }
        }
    }

    /// Build the form of an editing mode and fetch what it needs.
    fn enter_editor(&mut self, mode: Mode) -> Vec<Effect> {
        let Some(key) = self.selected_key.clone() else {
            // Opening an issue by key from the list.
            self.form = Some(Form::text("", TextRule::IssueKey));
            return Vec::new();
        };

        let mut effects = Vec::new();
        let form = match mode {
            Mode::TransitionSelect => {
                self.transitions.clear();
                effects.push(Effect::FetchTransitions { key });
                Form::select(Vec::new())
            }
            Mode::RequireEstimate => Form::text("", TextRule::Duration),
            Mode::RequireCancelReason => Form::multiline("", TextRule::Required),
            Mode::UserSearch => match self.users.get(&key) {
                Some(users) => Form::users(users.clone()),
                None => {
                    effects.push(Effect::FetchUsers { key });
                    Form::users(Vec::new())
                }
            },
            Mode::EditDescription => {
                let description = self
                    .detail
                    .as_ref()
                    .map(|d| d.description.clone())
                    .unwrap_or_default();
                Form::multiline(description, TextRule::Any)
            }
            Mode::EditPriority => {
                let mut form = Form::select(Vec::new());
                if self.priorities.is_empty() {
                    effects.push(Effect::FetchPriorities);
                } else {
                    form.set_choices(self.priority_names(), self.current_priority_index());
                }
                form
            }
            Mode::PostComment => {
                // Users are only needed to resolve mentions.
                if !self.users.contains_key(&key) {
                    effects.push(Effect::FetchUsers { key });
                }
                Form::multiline("", TextRule::Required)
            }
            Mode::PostWorklog => Form::worklog(),
            Mode::LinkIssueSearch => Form::text(
                self.change_issue_key.clone().unwrap_or_default(),
                TextRule::IssueKey,
            ),
            Mode::List | Mode::Detail => return effects,
        };
        self.form = Some(form);
        effects
    }

    /// Select an issue and load its detail.
    fn open_detail(&mut self, key: String) -> Vec<Effect> {
        info!(issue = %key, "Opening issue");
        self.selected_key = Some(key.clone());
        self.detail = None;
        self.detail_scroll = 0;
        self.selected_worklogs = None;
        self.side_panel = SidePanel::Worklogs;
        self.epic_children = None;
        self.entering = Some(EffectKind::Detail);
        vec![Effect::FetchDetail { key }]
    }

    fn priority_names(&self) -> Vec<String> {
        self.priorities.iter().map(|p| p.name.clone()).collect()
    }

    fn current_priority_index(&self) -> Option<usize> {
        let current = self.detail.as_ref()?.priority.as_deref()?;
        self.priorities.iter().position(|p| p.name == current)
    }

    // ========================================================================
    // Keys
    // ========================================================================

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            info!("Quit requested");
            self.should_quit = true;
            return Vec::new();
        }

        let typing_filter = self.mode.current == Mode::List && self.filter_active;
        if key.code == KeyCode::Char('q')
            && key.modifiers == KeyModifiers::NONE
            && self.mode.current.is_navigation()
            && !typing_filter
        {
            info!("Quit requested");
            self.should_quit = true;
            return Vec::new();
        }

        if key.code == KeyCode::Esc {
            if typing_filter {
                self.filter_active = false;
                self.filter.clear();
                self.cursor = 0;
                return Vec::new();
            }
            return self.change_mode(ModeEvent::Escape);
        }

        match self.mode.current {
            Mode::List => self.handle_list_key(key),
            Mode::Detail => self.handle_detail_key(key),
            _ => self.handle_form_key(key),
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if self.filter_active {
            match key.code {
                KeyCode::Enter => self.filter_active = false,
                KeyCode::Up | KeyCode::Down => self.move_cursor(key.code == KeyCode::Down),
                _ => {
                    if self.filter.handle_input(key) {
                        self.cursor = 0;
                    }
                }
            }
            return Vec::new();
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_cursor(true);
                Vec::new()
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_cursor(false);
                Vec::new()
            }
            KeyCode::Char('g') | KeyCode::Home => {
                self.cursor = 0;
                Vec::new()
            }
            KeyCode::Char('G') | KeyCode::End => {
                self.cursor = self.visible_issues().len().saturating_sub(1);
                Vec::new()
            }
            KeyCode::Char('/') => {
                self.filter_active = true;
                Vec::new()
            }
            KeyCode::Char('r') => vec![Effect::FetchMyIssues],
            KeyCode::Char('z') => {
                self.show_done = !self.show_done;
                self.clamp_cursor();
                Vec::new()
            }
            KeyCode::Char('s') => self.change_mode(ModeEvent::Open(Mode::LinkIssueSearch)),
            KeyCode::Enter => {
                let Some(key) = self
                    .visible_issues()
                    .get(self.cursor)
                    .map(|issue| issue.key.clone())
                else {
                    return Vec::new();
                };
                let mut effects = self.change_mode(ModeEvent::Open(Mode::Detail));
                effects.extend(self.open_detail(key));
                effects
            }
            _ => Vec::new(),
        }
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self
            .cursor
            .min(self.visible_issues().len().saturating_sub(1));
    }

    fn move_cursor(&mut self, down: bool) {
        let len = self.visible_issues().len();
        if down {
            if self.cursor + 1 < len {
                self.cursor += 1;
            }
        } else {
            self.cursor = self.cursor.saturating_sub(1);
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        let target = match key.code {
            KeyCode::Char('t') => Mode::TransitionSelect,
            KeyCode::Char('a') => Mode::UserSearch,
            KeyCode::Char('d') => Mode::EditDescription,
            KeyCode::Char('p') => Mode::EditPriority,
            KeyCode::Char('c') => Mode::PostComment,
            KeyCode::Char('w') => Mode::PostWorklog,
            KeyCode::Char('l') => Mode::LinkIssueSearch,
            KeyCode::Char('j') | KeyCode::Down => {
                self.detail_scroll = self.detail_scroll.saturating_add(1);
                return Vec::new();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.detail_scroll = self.detail_scroll.saturating_sub(1);
                return Vec::new();
            }
            KeyCode::Char('r') => {
                return match self.selected_key.clone() {
                    Some(key) => vec![Effect::FetchDetail { key }],
                    None => Vec::new(),
                };
            }
            KeyCode::Char('e') => return self.toggle_side_panel(),
            _ => return Vec::new(),
        };

        if self.detail.is_none() {
            self.set_info("Issue is still loading");
            return Vec::new();
        }
        self.change_mode(ModeEvent::Open(target))
    }

    /// Switch the detail side panel between work-logs and epic children.
    fn toggle_side_panel(&mut self) -> Vec<Effect> {
        let Some(detail) = self.detail.as_ref() else {
            self.set_info("Issue is still loading");
            return Vec::new();
        };
        if !detail.issue_type.eq_ignore_ascii_case("epic") {
            let message = format!("{} is not an epic", detail.key);
            self.set_info(message);
            return Vec::new();
        }
        let key = detail.key.clone();

        self.side_panel = match self.side_panel {
            SidePanel::Worklogs => SidePanel::EpicChildren,
            SidePanel::EpicChildren => SidePanel::Worklogs,
        };
        let needs_fetch = self.side_panel == SidePanel::EpicChildren
            && self.epic_children().is_none()
            && !self.loading.is_loading(EffectKind::EpicChildren);
        if needs_fetch {
            vec![Effect::FetchEpicChildren { key }]
        } else {
            Vec::new()
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        // One estimate update at a time.
        if self.mode.current == Mode::RequireEstimate && self.loading.is_loading(EffectKind::Estimate)
        {
            return Vec::new();
        }

        let Some(form) = self.form.as_mut() else {
            return Vec::new();
        };
        match form.handle_input(key) {
            FormOutcome::Pending => Vec::new(),
            FormOutcome::Submitted(value) => self.submit(value),
        }
    }

    // ========================================================================
    // Form submission
    // ========================================================================

    fn form_error(&mut self, message: &str) -> Vec<Effect> {
        if let Some(form) = self.form.as_mut() {
            form.set_error(message);
        }
        Vec::new()
    }

    fn submit(&mut self, value: FormValue) -> Vec<Effect> {
        let mode = self.mode.current;
        if mode == Mode::LinkIssueSearch && self.mode.parent == Mode::List {
            let FormValue::Text(key) = value else {
                return Vec::new();
            };
            let mut effects = self.change_mode(ModeEvent::Submitted);
            effects.extend(self.open_detail(key));
            return effects;
        }

        let Some(key) = self.selected_key.clone() else {
            return Vec::new();
        };
        info!(issue = %key, ?mode, "Form submitted");

        match (mode, value) {
            (Mode::TransitionSelect, FormValue::Choice(index)) => {
                let Some(transition) = self.transitions.get(index).cloned() else {
                    return Vec::new();
                };
                let has_estimate = self
                    .detail
                    .as_ref()
                    .is_some_and(|d| d.original_estimate.is_some());
                let step = self.workflow.select(transition, has_estimate);
                self.apply_step(key, step)
            }
            (Mode::RequireEstimate, FormValue::Duration(seconds)) => {
                vec![Effect::UpdateEstimate {
                    key,
                    estimate: format_duration(seconds),
                }]
            }
            (Mode::RequireCancelReason, FormValue::Text(reason)) => {
                match self.workflow.reason_submitted(reason) {
                    Some(step) => self.apply_step(key, step),
                    None => self.change_mode(ModeEvent::Escape),
                }
            }
            (Mode::UserSearch, FormValue::User(user)) => {
                let mut effects = vec![Effect::Assign {
                    key,
                    account_id: user.account_id,
                }];
                effects.extend(self.change_mode(ModeEvent::Submitted));
                effects
            }
            (Mode::EditDescription, FormValue::Text(description)) => {
                let mut effects = vec![Effect::UpdateDescription { key, description }];
                effects.extend(self.change_mode(ModeEvent::Submitted));
                effects
            }
            (Mode::EditPriority, FormValue::Choice(index)) => {
                let Some(priority) = self.priorities.get(index).map(|p| p.name.clone()) else {
                    return Vec::new();
                };
                let mut effects = vec![Effect::UpdatePriority { key, priority }];
                effects.extend(self.change_mode(ModeEvent::Submitted));
                effects
            }
            (Mode::PostComment, FormValue::Text(body)) => {
                let users = self.users.get(&key).cloned().unwrap_or_default();
                let mut effects = vec![Effect::PostComment { key, body, users }];
                effects.extend(self.change_mode(ModeEvent::Submitted));
                effects
            }
            (Mode::PostWorklog, FormValue::Worklog(entry)) => {
                let Some(issue_id) = self.detail.as_ref().map(|d| d.id.clone()) else {
                    return self.form_error("issue is still loading");
                };
                let Some(author) = self.myself.as_ref().map(|u| u.account_id.clone()) else {
                    return self.form_error("current user is not loaded yet");
                };
                let worklog = NewWorklog {
                    issue_id,
                    seconds: entry.seconds,
                    start_date: entry.date,
                    author_account_id: author,
                    description: entry.note,
                };
                let mut effects = vec![Effect::PostWorklog { key, worklog }];
                effects.extend(self.change_mode(ModeEvent::Submitted));
                effects
            }
            (Mode::LinkIssueSearch, FormValue::Text(other_key)) => {
                if other_key.eq_ignore_ascii_case(&key) {
                    return self.form_error("an issue cannot be linked to itself");
                }
                let existing = self
                    .detail
                    .as_ref()
                    .and_then(|d| d.link_to(&other_key))
                    .map(|link| link.id.clone());
                let effect = match existing {
                    Some(link_id) => Effect::UnlinkIssue { key, link_id },
                    None => Effect::LinkIssue { key, other_key },
                };
                let mut effects = vec![effect];
                effects.extend(self.change_mode(ModeEvent::Submitted));
                effects
            }
            (mode, value) => {
                warn!(?mode, ?value, "Form value does not fit the mode");
                Vec::new()
            }
        }
    }

    /// Act on the next step of the transition workflow.
    fn apply_step(&mut self, key: String, step: Step) -> Vec<Effect> {
        match step {
            Step::RequireEstimate => self.change_mode(ModeEvent::Redirect(Mode::RequireEstimate)),
            Step::RequireCancelReason => {
                self.change_mode(ModeEvent::Redirect(Mode::RequireCancelReason))
            }
            Step::Post {
                transition,
                comment,
            } => {
                info!(issue = %key, transition = %transition.name, "Posting transition");
                let mut effects = vec![Effect::PostTransition {
                    key,
                    transition_id: transition.id,
                    comment,
                }];
                effects.extend(self.change_mode(ModeEvent::Submitted));
                effects
            }
        }
    }

    // ========================================================================
    // Result messages
    // ========================================================================

    fn handle_message(&mut self, message: ApiMessage) -> Vec<Effect> {
        self.loading.finish(message.kind());
        if !matches!(message, ApiMessage::Failure { .. }) {
            self.clear_error_on_success(message.kind());
        }

        match message {
            ApiMessage::IssuesLoaded(issues) => {
                debug!(count = issues.len(), "Issues loaded");
                let issue_ids: Vec<String> = issues.iter().map(|i| i.id.clone()).collect();
                self.issues = issues;
                self.clamp_cursor();
                if issue_ids.is_empty() {
                    Vec::new()
                } else {
                    vec![Effect::FetchWorklogTotals { issue_ids }]
                }
            }
            ApiMessage::MyselfLoaded(user) => {
                debug!(user = %user.display_name, "Current user loaded");
                self.myself = Some(user);
                Vec::new()
            }
            ApiMessage::StatusesLoaded(statuses) => {
                debug!(count = statuses.len(), "Statuses loaded");
                self.status_categories = StatusCategories::from_statuses(&statuses);
                self.clamp_cursor();
                Vec::new()
            }
            ApiMessage::EpicChildrenLoaded { key, children } => {
                if !self.is_current(&key) {
                    warn!(issue = %key, "Ignoring stale epic children");
                    return Vec::new();
                }
                debug!(issue = %key, count = children.len(), "Epic children loaded");
                self.epic_children = Some(EpicChildren {
                    key,
                    issues: children,
                });
                Vec::new()
            }
            ApiMessage::DetailLoaded { key, detail } => {
                if !self.is_current(&key) {
                    warn!(issue = %key, "Ignoring stale issue detail");
                    return Vec::new();
                }
                self.entered(EffectKind::Detail);
                let issue_id = detail.id.clone();
                self.detail = Some(detail);
                let loaded = self
                    .selected_worklogs
                    .as_ref()
                    .is_some_and(|w| w.issue_id == issue_id);
                if loaded {
                    Vec::new()
                } else {
                    vec![Effect::FetchWorklogs { issue_id }]
                }
            }
            ApiMessage::TransitionsLoaded { key, transitions } => {
                if !self.is_current(&key) || self.mode.current != Mode::TransitionSelect {
                    warn!(issue = %key, "Ignoring stale transitions");
                    return Vec::new();
                }
                self.entered(EffectKind::Transitions);
                if transitions.is_empty() {
                    self.set_info("No transitions available");
                }
                let names = transitions.iter().map(|t| t.name.clone()).collect();
                self.transitions = transitions;
                if let Some(form) = self.form.as_mut() {
                    form.set_choices(names, None);
                }
                Vec::new()
            }
            ApiMessage::TransitionPosted { key } => {
                self.set_info(format!("{} status changed", key));
                self.refresh_after_change(key, true)
            }
            ApiMessage::AssigneeChanged { key } => {
                self.set_info(format!("{} assigned", key));
                self.refresh_after_change(key, true)
            }
            ApiMessage::DescriptionUpdated { key } => {
                self.set_info(format!("{} description updated", key));
                self.refresh_after_change(key, false)
            }
            ApiMessage::PriorityUpdated { key } => {
                self.set_info(format!("{} priority updated", key));
                self.refresh_after_change(key, false)
            }
            ApiMessage::CommentPosted { key } => {
                self.set_info(format!("Comment added to {}", key));
                self.refresh_after_change(key, false)
            }
            ApiMessage::LinkToggled { key } => {
                self.set_info(format!("{} links updated", key));
                self.refresh_after_change(key, false)
            }
            ApiMessage::UsersLoaded { key, users } => {
                if self.mode.current == Mode::UserSearch && self.is_current(&key) {
                    self.entered(EffectKind::Users);
                    if let Some(form) = self.form.as_mut() {
                        form.set_users(users.clone());
                    }
                }
                self.users.insert(key, users);
                Vec::new()
            }
            ApiMessage::PrioritiesLoaded(priorities) => {
                self.priorities = priorities;
                if self.mode.current == Mode::EditPriority {
                    self.entered(EffectKind::Priorities);
                    let names = self.priority_names();
                    let preselect = self.current_priority_index();
                    if let Some(form) = self.form.as_mut() {
                        form.set_choices(names, preselect);
                    }
                }
                Vec::new()
            }
            ApiMessage::EstimateUpdated { key, estimate } => self.estimate_saved(key, estimate),
            ApiMessage::WorklogsLoaded { issue_id, worklogs } => {
                self.worklog_totals
                    .insert(issue_id.clone(), total_seconds(&worklogs));
                let shown = self.detail.as_ref().is_some_and(|d| d.id == issue_id);
                if shown {
                    self.selected_worklogs = Some(SelectedWorklogs { issue_id, worklogs });
                } else {
                    debug!(issue_id = %issue_id, "Work-logs for an issue no longer shown");
                }
                Vec::new()
            }
            ApiMessage::WorklogTotalsLoaded(totals) => {
                debug!(count = totals.len(), "Work-log totals loaded");
                self.worklog_totals.extend(totals);
                Vec::new()
            }
            ApiMessage::WorklogPosted { key } => {
                self.set_info(format!("Work logged on {}", key));
                if !self.is_current(&key) {
                    return Vec::new();
                }
                match self.detail.as_ref() {
                    Some(detail) => vec![Effect::FetchWorklogs {
                        issue_id: detail.id.clone(),
                    }],
                    None => Vec::new(),
                }
            }
            ApiMessage::Failure {
                kind,
                subject,
                cause,
            } => self.handle_failure(kind, subject, cause),
        }
    }

    /// Re-fetch after a successful mutation of `key`.
    fn refresh_after_change(&mut self, key: String, list_changed: bool) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.is_current(&key) {
            effects.push(Effect::FetchDetail { key });
        }
        if list_changed {
            effects.push(Effect::FetchMyIssues);
        }
        effects
    }

    fn estimate_saved(&mut self, key: String, estimate: String) -> Vec<Effect> {
        if !self.is_current(&key) {
            warn!(issue = %key, "Ignoring stale estimate result");
            return Vec::new();
        }
        if let Some(detail) = self.detail.as_mut() {
            detail.original_estimate = Some(estimate);
        }
        if self.mode.current != Mode::RequireEstimate {
            return Vec::new();
        }
        match self.workflow.estimate_saved() {
            Some(step) => self.apply_step(key, step),
            None => self.change_mode(ModeEvent::Submitted),
        }
    }

    fn handle_failure(
        &mut self,
        kind: EffectKind,
        subject: Option<String>,
        cause: String,
    ) -> Vec<Effect> {
        warn!(?kind, subject = ?subject, %cause, "Operation failed");
        let message = format!("Failed to {}: {}", kind.label(), cause);

        let about_selection = match subject.as_deref() {
            Some(subject) => self.is_current(subject),
            None => true,
        };

        if kind == EffectKind::Estimate
            && self.mode.current == Mode::RequireEstimate
            && about_selection
        {
            if let Some(form) = self.form.as_mut() {
                form.set_error(cause);
            }
            self.set_error(kind, message);
            return Vec::new();
        }

        // Only the fetch that entered the mode can undo the entry.
        let mut effects = Vec::new();
        if self.entering == Some(kind) && about_selection {
            effects = self.change_mode(ModeEvent::EnterFailed);
        }
        self.set_error(kind, message);
        effects
    }
}

/// Modes that belong to the transition workflow.
fn in_workflow(mode: Mode) -> bool {
    matches!(
        mode,
        Mode::TransitionSelect | Mode::RequireEstimate | Mode::RequireCancelReason
    )
}
