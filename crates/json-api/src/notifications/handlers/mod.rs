//! Notification Handlers
//!
//! Every handler is scoped to the authenticated principal's inbox.

pub(crate) mod delete;
pub(crate) mod index;
pub(crate) mod read;
pub(crate) mod read_all;
