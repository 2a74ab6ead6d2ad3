//! Reusable UI components.

mod form;
mod input;
mod modal;
mod select;
mod status_bar;
mod user_picker;
mod worklog_form;

pub use form::{Form, FormOutcome, FormValue, TextRule};
pub use input::TextInput;
pub use status_bar::{render_status_bar, spinner_frame, StatusMessage};
