//! This module provides the local persistence of user tasks
//!
//! Persistence goes through a minimal key-value interface ([`KeyValueStore`]), so that the same data can live
//! in memory ([`MemoryStore`]), in a folder ([`FileStore`]), or anywhere a front end decides to put it.
//! The [`TaskStore`] reads and writes the user data document on top of it.

use std::collections::{BTreeMap, HashMap};
use std::error::Error as StdError;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::task::{Attachment, EventOverride, UserTask};

/// The key of the user data document (tasks, attachments and overrides)
pub const USER_DATA_KEY: &str = "weekplanner_user_data";

/// The default file name of a backup written by [`TaskStore::export_to_file`]
pub const DEFAULT_BACKUP_FILE_NAME: &str = "weekplanner-backup.json";

/// A string-keyed store of string values
pub trait KeyValueStore {
    /// Returns the value stored for `key`, or `None` if there is nothing stored for this key
    fn get(&self, key: &str) -> std::result::Result<Option<String>, Box<dyn StdError + Send + Sync>>;

    /// Store `value` for `key`, replacing any previous value.
    /// When this fails, the previous value must still be in place.
    fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), Box<dyn StdError + Send + Sync>>;
}


/// A [`KeyValueStore`] that lives in memory
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, Box<dyn StdError + Send + Sync>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), Box<dyn StdError + Send + Sync>> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}


/// A [`KeyValueStore`] that stores every key in its own file of a folder
#[derive(Clone, Debug, PartialEq)]
pub struct FileStore {
    folder: PathBuf,
}

impl FileStore {
    /// Use `folder` as a backing folder. It is created on the first write if needed.
    pub fn new(folder: &Path) -> Self {
        Self { folder: PathBuf::from(folder) }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// The file that holds the value of `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.folder.join(sanitize_filename::sanitize(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, Box<dyn StdError + Send + Sync>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(format!("Unable to read file {:?}: {}", path, err).into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), Box<dyn StdError + Send + Sync>> {
        std::fs::create_dir_all(&self.folder)?;

        // Write to a temporary file first, so that a failed write leaves the previous value intact
        let path = self.path_for(key);
        let mut temp_path = path.clone().into_os_string();
        temp_path.push(".tmp");
        let temp_path = PathBuf::from(temp_path);

        if let Err(err) = std::fs::write(&temp_path, value) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(format!("Unable to write file {:?}: {}", temp_path, err).into());
        }
        std::fs::rename(&temp_path, &path)?;
        Ok(())
    }
}


/// The document stored under [`USER_DATA_KEY`]
///
/// Entries this crate cannot read, and top-level fields it does not know about, are kept aside and written back untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserData {
    pub tasks: Vec<UserTask>,
    pub attachments: Vec<Attachment>,
    /// User edits of imported events, by event id
    pub overrides: BTreeMap<String, EventOverride>,

    unreadable_tasks: Vec<Value>,
    unreadable_overrides: BTreeMap<String, Value>,
    other_fields: Map<String, Value>,
}

impl UserData {
    /// Read a stored document. Unreadable entries are logged and kept aside.
    ///
    /// Returns an error when the document does not have the expected shape (e.g. `tasks` is not a list).
    pub fn from_json(value: Value) -> std::result::Result<Self, String> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            Value::Null => return Ok(Self::default()),
            other => return Err(format!("expected an object, found {}", other)),
        };

        let stored_tasks = match fields.remove("tasks") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(tasks)) => tasks,
            Some(other) => return Err(format!("`tasks` is not a list: {}", other)),
        };
        let attachments = match fields.remove("attachments") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(attachments)) => attachments,
            Some(other) => return Err(format!("`attachments` is not a list: {}", other)),
        };
        let stored_overrides = match fields.remove("overrides") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(overrides)) => overrides,
            Some(other) => return Err(format!("`overrides` is not an object: {}", other)),
        };

        let mut data = Self {
            attachments,
            other_fields: fields,
            ..Self::default()
        };

        for (index, stored) in stored_tasks.into_iter().enumerate() {
            match UserTask::from_stored_value(stored.clone()) {
                Ok(task) => data.tasks.push(task),
                Err(err) => {
                    log::warn!("Unable to read stored task #{} ({}), keeping it as is", index, err);
                    data.unreadable_tasks.push(stored);
                },
            }
        }

        for (event_id, stored) in stored_overrides {
            match serde_json::from_value::<EventOverride>(stored.clone()) {
                Ok(edit) => { data.overrides.insert(event_id, edit); },
                Err(err) => {
                    log::warn!("Unable to read the stored override of {} ({}), keeping it as is", event_id, err);
                    data.unreadable_overrides.insert(event_id, stored);
                },
            }
        }

        Ok(data)
    }

    /// The document to store
    pub fn to_json(&self) -> serde_json::Result<Value> {
        let mut fields = self.other_fields.clone();

        let mut tasks = Vec::with_capacity(self.tasks.len() + self.unreadable_tasks.len());
        for task in &self.tasks {
            tasks.push(serde_json::to_value(task)?);
        }
        tasks.extend(self.unreadable_tasks.iter().cloned());
        fields.insert(String::from("tasks"), Value::Array(tasks));
        fields.insert(String::from("attachments"), Value::Array(self.attachments.clone()));

        let mut overrides = Map::new();
        for (event_id, stored) in &self.unreadable_overrides {
            overrides.insert(event_id.clone(), stored.clone());
        }
        for (event_id, edit) in &self.overrides {
            overrides.insert(event_id.clone(), serde_json::to_value(edit)?);
        }
        if overrides.is_empty() == false {
            fields.insert(String::from("overrides"), Value::Object(overrides));
        }

        Ok(Value::Object(fields))
    }
}


/// Reads and writes the user data document of a [`KeyValueStore`]
#[derive(Debug)]
pub struct TaskStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> TaskStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S { &self.store }
    pub fn store_mut(&mut self) -> &mut S { &mut self.store }
    pub fn into_inner(self) -> S { self.store }

    /// Load the user data document, for reading.
    ///
    /// A missing document is an empty one. So is an unreadable or malformed one (a warning is logged).
    /// Within a readable document, unreadable tasks are skipped (see [`UserData::from_json`]).
    pub fn load_user_data(&self) -> UserData {
        match self.read_user_data() {
            Ok(data) => data,
            Err(err) => {
                log::warn!("{}, starting with empty data", err);
                UserData::default()
            },
        }
    }

    /// Load the user data document, before modifying and saving it back.
    ///
    /// A missing or malformed (not JSON) document is an empty one.
    /// However, when the store cannot be read, or when the document is JSON of an unexpected shape,
    /// this fails with [`Error::StoreRead`] rather than letting a save overwrite data this crate did not understand.
    pub fn read_user_data(&self) -> Result<UserData> {
        let read_error = |reason: String| Error::StoreRead { key: USER_DATA_KEY.to_string(), reason };

        let raw = match self.store.get(USER_DATA_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(UserData::default()),
            Err(err) => return Err(read_error(err.to_string())),
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("Error loading user data, starting with empty data: {}", err);
                return Ok(UserData::default());
            },
        };

        UserData::from_json(value).map_err(read_error)
    }

    /// Store the user data document, replacing the previous one
    pub fn save_user_data(&mut self, data: &UserData) -> Result<()> {
        let serialized = data.to_json()
            .map(|document| document.to_string())
            .map_err(|err| Error::StoreWrite { key: USER_DATA_KEY.to_string(), reason: err.to_string() })?;
        self.write(USER_DATA_KEY, &serialized)
    }

    /// The stored user data document, verbatim (or `{}` when nothing is stored)
    pub fn export_user_data(&self) -> String {
        match self.store.get(USER_DATA_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => String::from("{}"),
            Err(err) => {
                log::warn!("Unable to read {} from the store: {}", USER_DATA_KEY, err);
                String::from("{}")
            },
        }
    }

    /// Write the user data document to a file (`weekplanner-backup.json` in the current folder by default).
    /// Returns the path of the written file.
    pub fn export_to_file(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = match path {
            Some(p) => PathBuf::from(p),
            None => PathBuf::from(DEFAULT_BACKUP_FILE_NAME),
        };
        std::fs::write(&path, self.export_user_data())?;
        log::info!("User data exported to {:?}", path);
        Ok(path)
    }

    /// Replace the whole user data document with `json`.
    ///
    /// Only well-formedness is checked. On error, the previous document is kept.
    pub fn import_user_data(&mut self, json: &str) -> Result<()> {
        if let Err(err) = serde_json::from_str::<serde_json::Value>(json) {
            log::error!("Unable to import user data: {}", err);
            return Err(Error::Import(err.to_string()));
        }
        self.write(USER_DATA_KEY, json)?;
        log::info!("User data imported");
        Ok(())
    }

    /// Same as [`Self::import_user_data`], reading the document from a file
    pub fn import_from_file(&mut self, path: &Path) -> Result<()> {
        let json = std::fs::read_to_string(path)?;
        self.import_user_data(&json)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.store.set(key, value).map_err(|err| {
            log::error!("Unable to write {} to the store: {}", key, err);
            Error::StoreWrite { key: key.to_string(), reason: err.to_string() }
        })
    }
}
