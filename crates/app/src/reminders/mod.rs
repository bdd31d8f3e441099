//! Event reminders
//!
//! A periodic scan over upcoming events that emails each attendee at most
//! once per reminder window per UTC day.

mod scheduler;
mod store;
mod window;

pub use scheduler::*;
pub use store::*;
pub use window::*;
