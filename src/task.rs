//! User tasks, the locally owned part of the schedule

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use chrono::{DateTime, Utc};

use crate::utils::iso_millis;

/// The type given to tasks created without one
pub const DEFAULT_TASK_TYPE: &str = "task";

/// An attachment, kept as opaque JSON so that documents written by other front ends survive a load/save cycle
pub type Attachment = serde_json::Value;

/// The state of the pomodoro timer of a task. This crate only carries it around.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroState {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub sessions_completed: u32,
    #[serde(default, with = "iso_millis::option")]
    pub current_session_start: Option<DateTime<Utc>>,
}


/// A task created by the user
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTask {
    id: String,

    /// Always `false`. This is serialized so that the presentation layer can tell tasks and imported events apart.
    #[serde(default, skip_deserializing)]
    is_imported: bool,

    #[serde(default)]
    summary: String,
    #[serde(default)]
    description: String,
    #[serde(with = "iso_millis")]
    start: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    end: DateTime<Utc>,
    #[serde(rename = "type", default = "default_task_type")]
    task_type: String,

    /// The id of the deadline (usually an imported event) this task prepares
    #[serde(default)]
    linked_deadline_id: Option<String>,
    /// The id of the task this one is a subtask of
    #[serde(default)]
    parent_id: Option<String>,

    #[serde(default)]
    notes: String,
    #[serde(default)]
    attachments: Vec<Attachment>,
    #[serde(default)]
    pomodoro: PomodoroState,

    #[serde(with = "iso_millis")]
    created_at: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    updated_at: DateTime<Utc>,
}

fn default_task_type() -> String {
    String::from(DEFAULT_TASK_TYPE)
}

impl UserTask {
    /// Create a brand new task, with a new random id
    pub fn new(new_task: NewTask) -> Self {
        Self::new_with_id(crate::utils::random_id(), new_task, crate::utils::now())
    }

    /// Create a task with a given id, created at `now`. Missing fields get their default values.
    pub fn new_with_id(id: String, new_task: NewTask, now: DateTime<Utc>) -> Self {
        Self {
            id,
            is_imported: false,
            summary: new_task.summary.unwrap_or_default(),
            description: new_task.description.unwrap_or_default(),
            start: new_task.start.unwrap_or(now),
            end: new_task.end.unwrap_or(now),
            task_type: new_task.task_type.unwrap_or_else(default_task_type),
            linked_deadline_id: new_task.linked_deadline_id,
            parent_id: new_task.parent_id,
            notes: new_task.notes.unwrap_or_default(),
            attachments: new_task.attachments.unwrap_or_default(),
            pomodoro: new_task.pomodoro.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Read a task from the stored user data document, tolerating what older or foreign front ends wrote.
    ///
    /// Timestamps may use any format [`crate::ical::try_parse_ical_date`] understands.
    /// Missing (or unreadable) timestamps are derived from the others: `end` and `createdAt` default to `start`,
    /// `updatedAt` defaults to `createdAt`, and `start` defaults to the first available of `createdAt` and `updatedAt`.
    ///
    /// Returns an error only when the entry cannot make a task at all (no id, or no timestamp at all).
    pub fn from_stored_value(value: Value) -> std::result::Result<Self, String> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => return Err(format!("expected an object, found {}", other)),
        };

        match fields.get("id") {
            Some(Value::String(id)) if id.is_empty() == false => {},
            _ => return Err(String::from("missing id")),
        }

        let start = read_timestamp(&fields, "start");
        let end = read_timestamp(&fields, "end");
        let created_at = read_timestamp(&fields, "createdAt");
        let updated_at = read_timestamp(&fields, "updatedAt");

        let start = match start.or(created_at).or(updated_at) {
            Some(start) => start,
            None => return Err(String::from("no usable timestamp")),
        };
        let end = end.unwrap_or(start);
        let created_at = created_at.unwrap_or(start);
        let updated_at = updated_at.unwrap_or(created_at);

        for (key, dt) in &[("start", start), ("end", end), ("createdAt", created_at), ("updatedAt", updated_at)] {
            fields.insert(key.to_string(), Value::String(crate::ical::to_iso_string(dt)));
        }

        serde_json::from_value(Value::Object(fields)).map_err(|err| err.to_string())
    }

    pub fn id(&self) -> &str                           { &self.id }
    pub fn is_imported(&self) -> bool                  { self.is_imported }
    pub fn summary(&self) -> &str                      { &self.summary }
    pub fn description(&self) -> &str                  { &self.description }
    pub fn start(&self) -> &DateTime<Utc>              { &self.start }
    pub fn end(&self) -> &DateTime<Utc>                { &self.end }
    pub fn event_type(&self) -> &str                   { &self.task_type }
    pub fn linked_deadline_id(&self) -> Option<&str>   { self.linked_deadline_id.as_deref() }
    pub fn parent_id(&self) -> Option<&str>            { self.parent_id.as_deref() }
    pub fn notes(&self) -> &str                        { &self.notes }
    pub fn attachments(&self) -> &[Attachment]         { &self.attachments }
    pub fn pomodoro(&self) -> &PomodoroState           { &self.pomodoro }
    pub fn created_at(&self) -> &DateTime<Utc>         { &self.created_at }
    pub fn updated_at(&self) -> &DateTime<Utc>         { &self.updated_at }

    /// Whether this task is a direct subtask of `parent_id`
    pub fn is_child_of(&self, parent_id: &str) -> bool {
        self.parent_id.as_deref() == Some(parent_id)
    }

    /// Overwrite the fields that are set in `changes`, and mark this task as updated at `now`
    pub fn apply(&mut self, changes: &TaskChanges, now: DateTime<Utc>) {
        if let Some(summary) = &changes.summary { self.summary = summary.clone(); }
        if let Some(description) = &changes.description { self.description = description.clone(); }
        if let Some(start) = changes.start { self.start = start; }
        if let Some(end) = changes.end { self.end = end; }
        if let Some(task_type) = &changes.task_type { self.task_type = task_type.clone(); }
        if let Some(linked) = &changes.linked_deadline_id { self.linked_deadline_id = linked.clone(); }
        if let Some(parent) = &changes.parent_id { self.parent_id = parent.clone(); }
        if let Some(notes) = &changes.notes { self.notes = notes.clone(); }
        if let Some(attachments) = &changes.attachments { self.attachments = attachments.clone(); }
        if let Some(pomodoro) = &changes.pomodoro { self.pomodoro = pomodoro.clone(); }
        self.updated_at = now;
    }

    /// Link this task to a deadline, and mark it as updated at `now`
    pub fn set_linked_deadline(&mut self, deadline_id: Option<String>, now: DateTime<Utc>) {
        self.linked_deadline_id = deadline_id;
        self.updated_at = now;
    }
}

fn read_timestamp(fields: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    match fields.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => {
            let parsed = crate::ical::try_parse_ical_date(s.trim());
            if parsed.is_none() {
                log::warn!("Unreadable {} {:?} in a stored task, deriving it from the other timestamps", key, s);
            }
            parsed
        },
        Some(other) => {
            log::warn!("Unexpected {} {} in a stored task, deriving it from the other timestamps", key, other);
            None
        },
    }
}


/// The fields of a task to be created. Every missing field gets a default value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewTask {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub task_type: Option<String>,
    pub linked_deadline_id: Option<String>,
    pub parent_id: Option<String>,
    pub notes: Option<String>,
    pub attachments: Option<Vec<Attachment>>,
    pub pomodoro: Option<PomodoroState>,
}

impl NewTask {
    /// A new task with only a summary
    pub fn with_summary<S: ToString>(summary: S) -> Self {
        Self {
            summary: Some(summary.to_string()),
            ..Self::default()
        }
    }
}


/// A partial update. Only the fields that are `Some` are overwritten.
///
/// Nullable references are `Option<Option<_>>`: `None` leaves them as they are, `Some(None)` clears them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "iso_millis::option")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "iso_millis::option")]
    pub end: Option<DateTime<Utc>>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "crate::utils::double_option")]
    pub linked_deadline_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "crate::utils::double_option")]
    pub parent_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pomodoro: Option<PomodoroState>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Layer `other` on top of these changes: fields set in `other` win
    pub fn merge(&mut self, other: TaskChanges) {
        if other.summary.is_some() { self.summary = other.summary; }
        if other.description.is_some() { self.description = other.description; }
        if other.start.is_some() { self.start = other.start; }
        if other.end.is_some() { self.end = other.end; }
        if other.task_type.is_some() { self.task_type = other.task_type; }
        if other.linked_deadline_id.is_some() { self.linked_deadline_id = other.linked_deadline_id; }
        if other.parent_id.is_some() { self.parent_id = other.parent_id; }
        if other.notes.is_some() { self.notes = other.notes; }
        if other.attachments.is_some() { self.attachments = other.attachments; }
        if other.pomodoro.is_some() { self.pomodoro = other.pomodoro; }
    }
}

/// A partial update of an existing task
#[derive(Clone, Debug, PartialEq)]
pub struct TaskUpdate {
    pub id: String,
    pub changes: TaskChanges,
}

impl TaskUpdate {
    pub fn new<S: ToString>(id: S, changes: TaskChanges) -> Self {
        Self { id: id.to_string(), changes }
    }
}


/// A persisted edit of an imported event, layered onto the event every time the feed is loaded
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventOverride {
    #[serde(flatten)]
    pub changes: TaskChanges,
    /// When this override was last edited
    #[serde(with = "iso_millis")]
    pub updated_at: DateTime<Utc>,
}

impl EventOverride {
    pub fn new(changes: TaskChanges, updated_at: DateTime<Utc>) -> Self {
        Self { changes, updated_at }
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_defaults() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        let task = UserTask::new_with_id(String::from("id-abc"), NewTask::with_summary("Buy milk"), now);
        assert_eq!(task.summary(), "Buy milk");
        assert_eq!(task.description(), "");
        assert_eq!(task.start(), &now);
        assert_eq!(task.end(), &now);
        assert_eq!(task.event_type(), "task");
        assert_eq!(task.linked_deadline_id(), None);
        assert_eq!(task.pomodoro(), &PomodoroState::default());
        assert_eq!(task.created_at(), task.updated_at());
    }

    #[test]
    fn test_serialization() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        let task = UserTask::new_with_id(String::from("id-abc"), NewTask::with_summary("Buy milk"), now);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["isImported"], false);
        assert_eq!(json["type"], "task");
        assert_eq!(json["linkedDeadlineId"], serde_json::Value::Null);
        assert_eq!(json["createdAt"], "2024-01-15T09:30:00.000Z");
        assert_eq!(json["pomodoro"]["sessionsCompleted"], 0);
        assert_eq!(json["pomodoro"]["currentSessionStart"], serde_json::Value::Null);

        let back: UserTask = serde_json::from_value(json).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn test_stored_tasks_with_missing_timestamps() {
        let task = UserTask::from_stored_value(serde_json::json!({
            "id": "id-legacy01",
            "summary": "Keep me",
            "start": "2024-01-15T09:30:00.000Z",
        })).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        assert_eq!(task.summary(), "Keep me");
        assert_eq!(task.start(), &start);
        assert_eq!(task.end(), &start);
        assert_eq!(task.created_at(), &start);
        assert_eq!(task.updated_at(), &start);
        assert_eq!(task.event_type(), "task");

        // Other date formats, and an unreadable end
        let task = UserTask::from_stored_value(serde_json::json!({
            "id": "id-legacy02",
            "start": "20240115T093000Z",
            "end": "next week",
            "createdAt": "2024-01-14T08:00:00+01:00",
        })).unwrap();
        assert_eq!(task.start(), &start);
        assert_eq!(task.end(), &start);
        assert_eq!(task.created_at(), &Utc.with_ymd_and_hms(2024, 1, 14, 7, 0, 0).unwrap());
        assert_eq!(task.updated_at(), task.created_at());

        // Only a creation date
        let task = UserTask::from_stored_value(serde_json::json!({"id": "id-legacy03", "createdAt": "2024-01-15T09:30:00Z"})).unwrap();
        assert_eq!(task.start(), &start);
    }

    #[test]
    fn test_unusable_stored_tasks() {
        assert!(UserTask::from_stored_value(serde_json::json!({"summary": "No id", "start": "2024-01-15T09:30:00Z"})).is_err());
        assert!(UserTask::from_stored_value(serde_json::json!({"id": "", "start": "2024-01-15T09:30:00Z"})).is_err());
        assert!(UserTask::from_stored_value(serde_json::json!({"id": "id-nodate00"})).is_err());
        assert!(UserTask::from_stored_value(serde_json::json!({"id": "id-badfield", "start": "2024-01-15T09:30:00Z", "summary": 3})).is_err());
        assert!(UserTask::from_stored_value(serde_json::json!("id-string")).is_err());
    }

    #[test]
    fn test_apply_only_overwrites_provided_fields() {
        let created = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 1, 16, 9, 30, 0).unwrap();
        let mut task = UserTask::new_with_id(String::from("id-abc"), NewTask {
            summary: Some(String::from("Study")),
            parent_id: Some(String::from("id-parent")),
            ..NewTask::default()
        }, created);

        task.apply(&TaskChanges {
            notes: Some(String::from("chapter 3")),
            parent_id: Some(None),
            ..TaskChanges::default()
        }, later);

        assert_eq!(task.summary(), "Study");
        assert_eq!(task.notes(), "chapter 3");
        assert_eq!(task.parent_id(), None);
        assert_eq!(task.created_at(), &created);
        assert_eq!(task.updated_at(), &later);
    }

    #[test]
    fn test_changes_distinguish_null_from_missing() {
        let changes: TaskChanges = serde_json::from_str(r#"{"parentId": null, "summary": "x"}"#).unwrap();
        assert_eq!(changes.parent_id, Some(None));
        assert_eq!(changes.linked_deadline_id, None);

        let json = serde_json::to_value(&changes).unwrap();
        assert_eq!(json, serde_json::json!({"parentId": null, "summary": "x"}));
    }
}
