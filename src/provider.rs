//! This module merges the events of a feed and the locally stored user tasks into a single schedule

use std::path::{Path, PathBuf};

use url::Url;

use crate::error::Result;
use crate::item::{ImportedEvent, UnifiedEvent};
use crate::settings::Settings;
use crate::store::{KeyValueStore, TaskStore, UserData};
use crate::task::{EventOverride, NewTask, TaskChanges, TaskUpdate, UserTask};
use crate::transport::{Fetcher, TransportResolver};

/// A data source that combines a read-only iCal feed (reached through a [`TransportResolver`]) and the user tasks of a [`KeyValueStore`].
///
/// Imported events are re-derived from the feed on every load and are never stored.
/// Mutations only touch user tasks (and the overrides of imported events), and are written to the store right away.
/// Nothing is cached between calls: the store is the single source of truth for user data.
pub struct Provider<F: Fetcher, S: KeyValueStore> {
    /// The way to the feed
    resolver: TransportResolver<F>,
    /// The local persistence
    store: TaskStore<S>,
}

impl<F: Fetcher, S: KeyValueStore> Provider<F, S> {
    /// Create a provider.
    ///
    /// `resolver` usually wraps an [`HttpFetcher`](crate::transport::HttpFetcher), `store` is usually a [`FileStore`](crate::store::FileStore).
    pub fn new(resolver: TransportResolver<F>, store: S) -> Self {
        Self { resolver, store: TaskStore::new(store) }
    }

    /// Returns the way to the feed
    pub fn resolver(&self) -> &TransportResolver<F> { &self.resolver }
    /// Returns the local persistence
    pub fn task_store(&self) -> &TaskStore<S> { &self.store }

    /// Typed access to the preferences kept in the same store as the user data
    pub fn settings(&mut self) -> Settings<'_, S> {
        Settings::new(self.store.store_mut())
    }

    /// Fetch and parse the feed at `url`, and merge its events with the stored user tasks.
    ///
    /// Imported events come first (in feed order), followed by user tasks (in creation order). There is no deduplication.
    /// Fails when the feed cannot be retrieved or is not iCal data; an unreadable store is treated as empty.
    pub async fn load_unified_data(&self, url: &Url) -> Result<Vec<UnifiedEvent>> {
        log::info!("Loading unified data from {}", url);
        let parsed = crate::ical::parse_ical_feed(&self.resolver, url).await?;
        let user_data = self.store.load_user_data();

        let mut unified = Vec::with_capacity(parsed.len() + user_data.tasks.len());
        for event in parsed {
            let imported = match user_data.overrides.get(event.id()) {
                Some(edit) => ImportedEvent::with_override(event, edit),
                None => ImportedEvent::new(event),
            };
            unified.push(UnifiedEvent::Imported(imported));
        }
        let n_imported = unified.len();
        unified.extend(user_data.tasks.into_iter().map(UnifiedEvent::Task));

        log::info!("Loaded {} imported events and {} user tasks", n_imported, unified.len() - n_imported);
        Ok(unified)
    }

    /// The stored user tasks
    pub fn user_tasks(&self) -> Vec<UserTask> {
        self.store.load_user_data().tasks
    }

    /// Returns a single user task
    pub fn get_task(&self, id: &str) -> Option<UserTask> {
        self.user_tasks().into_iter().find(|t| t.id() == id)
    }

    /// The direct subtasks of a task
    pub fn children_of(&self, id: &str) -> Vec<UserTask> {
        self.user_tasks()
            .into_iter()
            .filter(|t| t.is_child_of(id))
            .collect()
    }

    /// Create a task, with a new id and default values for every field `new_task` omits.
    /// Returns the stored task.
    pub fn add_task(&mut self, new_task: NewTask) -> Result<UserTask> {
        let mut data = self.store.read_user_data()?;
        let task = UserTask::new(new_task);
        data.tasks.push(task.clone());
        self.store.save_user_data(&data)?;

        log::debug!("Added task {} ({:?})", task.id(), task.summary());
        Ok(task)
    }

    /// Overwrite the fields of a task that are set in `update`.
    ///
    /// Returns the updated task, or `None` (without touching the store) if there is no task with this id.
    pub fn update_task(&mut self, update: TaskUpdate) -> Result<Option<UserTask>> {
        let mut data = self.store.read_user_data()?;
        let updated = match data.tasks.iter_mut().find(|t| t.id() == update.id) {
            None => {
                log::debug!("No task {} to update", update.id);
                return Ok(None);
            },
            Some(task) => {
                task.apply(&update.changes, crate::utils::now());
                task.clone()
            },
        };

        self.store.save_user_data(&data)?;
        log::debug!("Updated task {}", update.id);
        Ok(Some(updated))
    }

    /// Delete a task and its direct subtasks.
    ///
    /// Grand-children are not deleted: their parent reference now dangles.
    /// Returns the number of deleted tasks.
    pub fn delete_task(&mut self, id: &str) -> Result<usize> {
        let mut data = self.store.read_user_data()?;
        let before = data.tasks.len();
        data.tasks.retain(|t| t.id() != id && t.is_child_of(id) == false);
        let n_deleted = before - data.tasks.len();

        self.store.save_user_data(&data)?;
        log::debug!("Deleted task {} ({} tasks removed)", id, n_deleted);
        Ok(n_deleted)
    }

    /// Link a task to a deadline (usually an imported event).
    ///
    /// Returns the updated task, or `None` (without touching the store) if there is no task with this id.
    pub fn link_task_to_deadline(&mut self, task_id: &str, deadline_id: &str) -> Result<Option<UserTask>> {
        let mut data = self.store.read_user_data()?;
        let linked = match data.tasks.iter_mut().find(|t| t.id() == task_id) {
            None => {
                log::debug!("No task {} to link to {}", task_id, deadline_id);
                return Ok(None);
            },
            Some(task) => {
                task.set_linked_deadline(Some(deadline_id.to_string()), crate::utils::now());
                task.clone()
            },
        };

        self.store.save_user_data(&data)?;
        log::debug!("Linked task {} to deadline {}", task_id, deadline_id);
        Ok(Some(linked))
    }

    /// Edit an imported event.
    ///
    /// The edit is stored as an override, layered onto the event every time the feed is loaded.
    /// Successive edits of the same event accumulate: fields set in `changes` win over the previous ones.
    /// Overrides of events that are no longer in the feed are kept, and simply not applied.
    pub fn override_imported_event(&mut self, event_id: &str, changes: TaskChanges) -> Result<()> {
        let mut data = self.store.read_user_data()?;
        let now = crate::utils::now();
        match data.overrides.get_mut(event_id) {
            Some(existing) => {
                existing.changes.merge(changes);
                existing.updated_at = now;
            },
            None => {
                data.overrides.insert(event_id.to_string(), EventOverride::new(changes, now));
            },
        }

        self.store.save_user_data(&data)?;
        log::debug!("Stored an override for imported event {}", event_id);
        Ok(())
    }

    /// Drop the user edits of an imported event. Returns whether there was any.
    pub fn clear_imported_override(&mut self, event_id: &str) -> Result<bool> {
        let mut data = self.store.read_user_data()?;
        if data.overrides.remove(event_id).is_none() {
            return Ok(false);
        }

        self.store.save_user_data(&data)?;
        log::debug!("Cleared the override of imported event {}", event_id);
        Ok(true)
    }

    /// Save an edited entry of the unified schedule, as the presentation layer sends it back.
    ///
    /// An imported event is saved as an override, a user task as an update (a no-op when the task does not exist).
    pub fn save_event(&mut self, event: &UnifiedEvent) -> Result<()> {
        let changes = TaskChanges {
            summary: Some(event.summary().to_string()),
            description: Some(event.description().to_string()),
            start: Some(*event.start()),
            end: Some(*event.end()),
            task_type: Some(event.event_type().to_string()),
            linked_deadline_id: Some(event.linked_deadline_id().map(String::from)),
            parent_id: Some(event.parent_id().map(String::from)),
            notes: Some(event.notes().to_string()),
            attachments: Some(event.attachments().to_vec()),
            pomodoro: Some(event.pomodoro().clone()),
        };

        match event {
            UnifiedEvent::Imported(imported) => self.override_imported_event(imported.id(), changes),
            UnifiedEvent::Task(task) => self.update_task(TaskUpdate::new(task.id(), changes)).map(|_| ()),
        }
    }

    /// The stored user data document, verbatim (`{}` when nothing is stored)
    pub fn export_user_data(&self) -> String {
        self.store.export_user_data()
    }

    /// Write the user data document to a file (`weekplanner-backup.json` by default)
    pub fn export_to_file(&self, path: Option<&Path>) -> Result<PathBuf> {
        self.store.export_to_file(path)
    }

    /// Replace the whole user data document. Fails on malformed JSON, in which case the previous data is kept.
    pub fn import_user_data(&mut self, json: &str) -> Result<()> {
        self.store.import_user_data(json)
    }

    pub fn import_from_file(&mut self, path: &Path) -> Result<()> {
        self.store.import_from_file(path)
    }

    /// An iCal document with one event per user task
    pub fn export_tasks_ics(&self) -> String {
        crate::ical::build_from(&self.user_tasks())
    }

    /// The whole stored user data document
    pub fn user_data(&self) -> UserData {
        self.store.load_user_data()
    }
}
