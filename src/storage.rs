//! Caller-side persistence for uploaded inputs and the last generated
//! timetable. The generator never touches storage itself.

use crate::data::{FixedSlot, GenerationResult, SubjectRequirement, Teacher, TimetableInput};
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const TEACHERS_KEY: &str = "timetable_teachers";
pub const FIXED_SLOTS_KEY: &str = "timetable_fixed_slots";
pub const SUBJECT_MAPPINGS_KEY: &str = "timetable_subject_mappings";
pub const GENERATED_KEY: &str = "timetable_generated";
pub const LAST_GENERATION_KEY: &str = "timetable_last_generation";

const ALL_KEYS: [&str; 5] = [
    TEACHERS_KEY,
    FIXED_SLOTS_KEY,
    SUBJECT_MAPPINGS_KEY,
    GENERATED_KEY,
    LAST_GENERATION_KEY,
];

/// String values under fixed string keys.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Keeps each key in `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create data directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        fs::write(&path, value).with_context(|| format!("failed to write {}", path.display()))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Err(e) if e.kind() != ErrorKind::NotFound => {
                Err(e).with_context(|| format!("failed to remove {}", path.display()))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Everything the repository holds, as one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    #[serde(default)]
    pub teachers: Option<Vec<Teacher>>,
    #[serde(default)]
    pub fixed_slots: Option<Vec<FixedSlot>>,
    #[serde(default)]
    pub subject_mappings: Option<Vec<SubjectRequirement>>,
    #[serde(default)]
    pub generated_timetable: Option<GenerationResult>,
    #[serde(default)]
    pub last_generation: Option<DateTime<Utc>>,
}

/// Typed access to the stored inputs and last result.
pub struct TimetableRepository {
    store: Box<dyn KeyValueStore>,
}

impl TimetableRepository {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(key)? {
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .with_context(|| format!("stored value for {key} is not valid"))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        debug!("Saving {} ({} bytes)", key, raw.len());
        self.store.put(key, &raw)
    }

    pub fn save_teachers(&self, teachers: &[Teacher]) -> Result<()> {
        self.save(TEACHERS_KEY, &teachers)
    }

    pub fn teachers(&self) -> Result<Vec<Teacher>> {
        Ok(self.load(TEACHERS_KEY)?.unwrap_or_default())
    }

    pub fn save_fixed_slots(&self, slots: &[FixedSlot]) -> Result<()> {
        self.save(FIXED_SLOTS_KEY, &slots)
    }

    pub fn fixed_slots(&self) -> Result<Vec<FixedSlot>> {
        Ok(self.load(FIXED_SLOTS_KEY)?.unwrap_or_default())
    }

    pub fn save_subject_mappings(&self, mappings: &[SubjectRequirement]) -> Result<()> {
        self.save(SUBJECT_MAPPINGS_KEY, &mappings)
    }

    pub fn subject_mappings(&self) -> Result<Vec<SubjectRequirement>> {
        Ok(self.load(SUBJECT_MAPPINGS_KEY)?.unwrap_or_default())
    }

    /// The stored uploads as generator input.
    pub fn input(&self) -> Result<TimetableInput> {
        Ok(TimetableInput {
            teachers: self.teachers()?,
            fixed_slots: self.fixed_slots()?,
            subject_requirements: self.subject_mappings()?,
            ..Default::default()
        })
    }

    /// Stores `result` and stamps the generation time.
    pub fn save_result(&self, result: &GenerationResult) -> Result<DateTime<Utc>> {
        let generated_at = Utc::now();
        self.save(GENERATED_KEY, result)?;
        self.save(LAST_GENERATION_KEY, &generated_at)?;
        Ok(generated_at)
    }

    pub fn result(&self) -> Result<Option<GenerationResult>> {
        self.load(GENERATED_KEY)
    }

    pub fn last_generation(&self) -> Result<Option<DateTime<Utc>>> {
        self.load(LAST_GENERATION_KEY)
    }

    pub fn clear_all(&self) -> Result<()> {
        for key in ALL_KEYS {
            self.store.remove(key)?;
        }
        Ok(())
    }

    pub fn export_bundle(&self) -> Result<String> {
        let backup = Backup {
            teachers: Some(self.teachers()?),
            fixed_slots: Some(self.fixed_slots()?),
            subject_mappings: Some(self.subject_mappings()?),
            generated_timetable: self.result()?,
            last_generation: self.last_generation()?,
        };
        Ok(serde_json::to_string_pretty(&backup)?)
    }

    /// Restores whatever sections `json` carries; absent sections are left alone.
    pub fn import_bundle(&self, json: &str) -> Result<()> {
        let backup: Backup = serde_json::from_str(json).context("backup is not valid JSON")?;
        if let Some(teachers) = &backup.teachers {
            self.save_teachers(teachers)?;
        }
        if let Some(slots) = &backup.fixed_slots {
            self.save_fixed_slots(slots)?;
        }
        if let Some(mappings) = &backup.subject_mappings {
            self.save_subject_mappings(mappings)?;
        }
        if let Some(result) = &backup.generated_timetable {
            self.save(GENERATED_KEY, result)?;
            self.save(LAST_GENERATION_KEY, &backup.last_generation.unwrap_or_else(Utc::now))?;
        }
        Ok(())
    }
}
