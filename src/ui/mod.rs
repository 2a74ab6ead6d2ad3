//! User interface components and views.
//!
//! Rendering reads the [`App`] model and never changes it.

mod components;
mod views;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

pub use components::{Form, FormOutcome, FormValue, StatusMessage, TextInput, TextRule};

use crate::app::{App, Mode};
use crate::tasks::EffectKind;
use components::{render_status_bar, spinner_frame};

/// Key hints for the status bar.
fn hints(app: &App) -> &'static str {
    match app.mode() {
        Mode::List if app.is_filtering() => "[Enter] apply  [Esc] clear filter",
        Mode::List => {
            "[j/k] move  [Enter] open  [/] filter  [z] done  [s] open by key  [r] refresh  [q] quit"
        }
        Mode::Detail => {
            "[t] status  [a] assign  [d] description  [p] priority  [c] comment  [w] log work  [l] link  [e] epic  [Esc] back"
        }
        _ => "[Esc] cancel  [Ctrl+C] quit",
    }
}

/// The loading flag that matters for the active form.
fn form_loading(app: &App) -> bool {
    let kind = match app.mode() {
        Mode::TransitionSelect => EffectKind::Transitions,
        Mode::RequireEstimate => EffectKind::Estimate,
        Mode::UserSearch => EffectKind::Users,
        Mode::EditPriority => EffectKind::Priorities,
        _ => return false,
    };
    app.loading().is_loading(kind)
}

/// Render the whole screen.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(2)])
        .split(frame.area());

    let state = app.mode_state();
    let base = if state.current.is_editing() {
        state.parent
    } else {
        state.current
    };
    match base {
        Mode::Detail => views::detail::render(frame, chunks[0], app),
        _ => views::list::render(frame, chunks[0], app),
    }

    if let Some(form) = app.form() {
        let title = match (state.current, app.pending_transition()) {
            (Mode::RequireEstimate | Mode::RequireCancelReason, Some(t)) => {
                format!("{} ({})", state.current.title(), t.name)
            }
            (Mode::LinkIssueSearch, _) if state.parent == Mode::List => "Open Issue".to_string(),
            (Mode::LinkIssueSearch, _) => "Link / Unlink Issue".to_string(),
            (mode, _) => mode.title().to_string(),
        };
        form.render(frame, chunks[0], &title, form_loading(app));
    }

    let spinner = app.loading().any().then(|| spinner_frame(app.tick()));
    render_status_bar(frame, chunks[1], hints(app), app.status(), spinner);
}
