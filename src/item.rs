//! Entries of the unified schedule (imported events and user tasks)

use serde::Serialize;
use chrono::{DateTime, Utc};

use crate::event::ParsedEvent;
use crate::task::{Attachment, EventOverride, PomodoroState, UserTask};
use crate::utils::iso_millis;


/// An entry of the unified schedule
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UnifiedEvent {
    Imported(ImportedEvent),
    Task(UserTask),
}

/// Returns `event.$property_name` or `task.$property_name`, depending on whether self is an imported event or a user task
macro_rules! synthetise_common_getter {
    ($property_name:ident, $return_type:ty) => {
        pub fn $property_name(&self) -> $return_type {
            match self {
                UnifiedEvent::Imported(e) => e.$property_name(),
                UnifiedEvent::Task(t) => t.$property_name(),
            }
        }
    }
}

impl UnifiedEvent {
    synthetise_common_getter!(id, &str);
    synthetise_common_getter!(summary, &str);
    synthetise_common_getter!(description, &str);
    synthetise_common_getter!(start, &DateTime<Utc>);
    synthetise_common_getter!(end, &DateTime<Utc>);
    synthetise_common_getter!(event_type, &str);
    synthetise_common_getter!(linked_deadline_id, Option<&str>);
    synthetise_common_getter!(parent_id, Option<&str>);
    synthetise_common_getter!(notes, &str);
    synthetise_common_getter!(attachments, &[Attachment]);
    synthetise_common_getter!(pomodoro, &PomodoroState);
    synthetise_common_getter!(created_at, &DateTime<Utc>);
    synthetise_common_getter!(updated_at, &DateTime<Utc>);

    /// The provenance tag: `true` for events of the feed, `false` for user tasks
    pub fn is_imported(&self) -> bool {
        match &self {
            UnifiedEvent::Imported(_) => true,
            _ => false,
        }
    }

    pub fn is_task(&self) -> bool {
        match &self {
            UnifiedEvent::Task(_) => true,
            _ => false,
        }
    }

    pub fn as_task(&self) -> Option<&UserTask> {
        match self {
            UnifiedEvent::Task(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_imported(&self) -> Option<&ImportedEvent> {
        match self {
            UnifiedEvent::Imported(e) => Some(e),
            _ => None,
        }
    }
}


/// An event of the feed, tagged for the unified schedule.
///
/// Imported events are re-derived on every load and are never stored.
/// The user can still edit them through an [`EventOverride`], which is applied here.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedEvent {
    #[serde(flatten)]
    event: ParsedEvent,

    is_imported: bool,
    is_deadline: bool,
    linked_deadline_id: Option<String>,
    parent_id: Option<String>,
    notes: String,
    attachments: Vec<Attachment>,
    pomodoro: PomodoroState,
    #[serde(with = "iso_millis")]
    created_at: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    updated_at: DateTime<Utc>,
}

impl ImportedEvent {
    /// Tag an event of the feed. Its creation and modification dates are its start date.
    pub fn new(event: ParsedEvent) -> Self {
        let start = event.start;
        Self {
            event,
            is_imported: true,
            is_deadline: true,
            linked_deadline_id: None,
            parent_id: None,
            notes: String::new(),
            attachments: Vec::new(),
            pomodoro: PomodoroState::default(),
            created_at: start,
            updated_at: start,
        }
    }

    /// Tag an event of the feed, and layer a user edit on top of it
    pub fn with_override(event: ParsedEvent, edit: &EventOverride) -> Self {
        let mut imported = Self::new(event);
        imported.apply_override(edit);
        imported
    }

    fn apply_override(&mut self, edit: &EventOverride) {
        let changes = &edit.changes;
        if let Some(summary) = &changes.summary { self.event.summary = summary.clone(); }
        if let Some(description) = &changes.description { self.event.description = description.clone(); }
        if let Some(start) = changes.start { self.event.start = start; }
        if let Some(end) = changes.end { self.event.end = end; }
        if let Some(event_type) = &changes.task_type { self.event.event_type = event_type.clone(); }
        if let Some(linked) = &changes.linked_deadline_id { self.linked_deadline_id = linked.clone(); }
        if let Some(parent) = &changes.parent_id { self.parent_id = parent.clone(); }
        if let Some(notes) = &changes.notes { self.notes = notes.clone(); }
        if let Some(attachments) = &changes.attachments { self.attachments = attachments.clone(); }
        if let Some(pomodoro) = &changes.pomodoro { self.pomodoro = pomodoro.clone(); }
        self.updated_at = edit.updated_at;
    }

    /// The underlying event of the feed
    pub fn event(&self) -> &ParsedEvent                { &self.event }

    pub fn id(&self) -> &str                           { &self.event.id }
    pub fn summary(&self) -> &str                      { &self.event.summary }
    pub fn description(&self) -> &str                  { &self.event.description }
    pub fn start(&self) -> &DateTime<Utc>              { &self.event.start }
    pub fn end(&self) -> &DateTime<Utc>                { &self.event.end }
    pub fn event_type(&self) -> &str                   { &self.event.event_type }
    pub fn teacher(&self) -> &str                      { &self.event.teacher }
    pub fn class(&self) -> &str                        { &self.event.class }
    pub fn subject(&self) -> &str                      { &self.event.subject }
    pub fn location(&self) -> &str                     { &self.event.location }
    pub fn is_deadline(&self) -> bool                  { self.is_deadline }
    pub fn linked_deadline_id(&self) -> Option<&str>   { self.linked_deadline_id.as_deref() }
    pub fn parent_id(&self) -> Option<&str>            { self.parent_id.as_deref() }
    pub fn notes(&self) -> &str                        { &self.notes }
    pub fn attachments(&self) -> &[Attachment]         { &self.attachments }
    pub fn pomodoro(&self) -> &PomodoroState           { &self.pomodoro }
    pub fn created_at(&self) -> &DateTime<Utc>         { &self.created_at }
    pub fn updated_at(&self) -> &DateTime<Utc>         { &self.updated_at }
}

impl From<ImportedEvent> for UnifiedEvent {
    fn from(event: ImportedEvent) -> Self {
        UnifiedEvent::Imported(event)
    }
}

impl From<UserTask> for UnifiedEvent {
    fn from(task: UserTask) -> Self {
        UnifiedEvent::Task(task)
    }
}
