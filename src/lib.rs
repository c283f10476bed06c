//! This crate builds a personal week planner out of a read-only iCal feed and locally stored tasks.
//!
//! The feed is retrieved by the [`transport`] module, that falls back on CORS relays when a direct request fails.
//! Its events are then extracted by the [`ical`] module (which is tolerant to the non-conformant feeds met in the wild),
//! and the metadata that some feeds embed in event descriptions (teacher, class, subject, assignment type) is mined by the [`description`] module.
//!
//! User tasks are kept in a key-value [`store`](store::KeyValueStore). \
//! A [`Provider`] merges both sources into one unified schedule of [`UnifiedEvent`]s. \
//! It also handles the creation, update and deletion of user tasks, and the user edits of imported events.

pub mod error;
pub use error::{Error, Result};
pub mod config;
pub mod transport;

pub mod ical;
pub mod description;
pub mod event;
pub use event::ParsedEvent;
mod item;
pub use item::{ImportedEvent, UnifiedEvent};
mod task;
pub use task::{Attachment, EventOverride, NewTask, PomodoroState, TaskChanges, TaskUpdate, UserTask};

pub mod store;
pub mod settings;
pub mod provider;
pub use provider::Provider;

pub mod utils;
