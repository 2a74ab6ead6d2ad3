//! Events fed to the application.
//!
//! Terminal input and ticks come from the [`EventHandler`]; results of
//! background work arrive as [`Event::Api`].

mod handler;

use crossterm::event::KeyEvent;

pub use handler::EventHandler;

use crate::tasks::ApiMessage;

/// Everything [`crate::app::App::update`] reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    Resize(u16, u16),
    /// No input within the tick rate.
    Tick,
    /// A background effect finished.
    Api(ApiMessage),
}
