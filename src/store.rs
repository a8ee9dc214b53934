//! In-memory record store backed by a directory of TOML files.
//!
//! The filesystem is the database. Each model is a directory under
//! `content/`, each record one file:
//!
//! ```text
//! content/
//! ├── page/
//! │   ├── 001-home.toml
//! │   └── 002-about.toml
//! ├── post/
//! │   ├── 001-hello.toml
//! │   └── draft-idea.toml
//! └── category/
//!     └── news.toml
//! ```
//!
//! Files are read in `NNN-` prefix order (see [`naming::entry_order`]), which
//! becomes the storage order queries return when no explicit ordering is
//! asked for. File names carry no meaning beyond that; the record's `id`
//! and `slug` live inside the file.
//!
//! ## Validation
//!
//! - Record ids are unique per model.
//! - Every locale-keyed table in a file must be listed in the `translatable`
//!   set of a content type using that model.
//!
//! ## Writes
//!
//! The store is mutated in memory by view counting, the scheduled-publish
//! sweep, and soft deletes. The sweep and soft deletes are written back to
//! the record's source file by editing only the affected keys, so anything
//! else a human put in the file survives.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::ContentTypeConfig;
use crate::naming;
use crate::record::{ContentRecord, SoftDelete, Status};
use crate::repository::{ContentRepository, Order, RecordQuery};

/// Directory under the site root holding one subdirectory per model.
pub const CONTENT_DIR: &str = "content";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("TOML parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),
    #[error("Duplicate id {0} in model '{1}'")]
    DuplicateId(u64, String),
    #[error("Field '{field}' of {model} #{id} is not translatable for this model")]
    UntranslatableField { model: String, id: u64, field: String },
    #[error("Unknown model '{0}'")]
    UnknownModel(String),
    #[error("No record {model} #{id}")]
    RecordNotFound { model: String, id: u64 },
    #[error("Content type '{0}' does not support soft deletes")]
    SoftDeleteDisabled(String),
}

#[derive(Debug, Clone)]
struct StoredRecord {
    record: ContentRecord,
    source: Option<PathBuf>,
}

/// Records grouped by model, in storage order.
#[derive(Debug, Default)]
pub struct ContentStore {
    models: RwLock<BTreeMap<String, Vec<StoredRecord>>>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a model known even if it has no records yet.
    pub fn register_model(&self, model: &str) {
        self.write().entry(model.to_string()).or_default();
    }

    /// Add a record held only in memory.
    pub fn insert(&self, record: ContentRecord) -> Result<(), StoreError> {
        self.insert_stored(StoredRecord {
            record,
            source: None,
        })
    }

    fn insert_stored(&self, stored: StoredRecord) -> Result<(), StoreError> {
        let mut models = self.write();
        let records = models.entry(stored.record.model.clone()).or_default();
        if records.iter().any(|r| r.record.id == stored.record.id) {
            return Err(StoreError::DuplicateId(
                stored.record.id,
                stored.record.model.clone(),
            ));
        }
        records.push(stored);
        Ok(())
    }

    /// Load every model used by `types` from `<root>/content/<model>/`.
    ///
    /// A model whose directory does not exist stays unknown, so requests
    /// for its content type report a configuration error.
    pub fn load(root: &Path, types: &[ContentTypeConfig]) -> Result<Self, StoreError> {
        let mut allowed: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for ct in types {
            allowed
                .entry(ct.model.as_str())
                .or_default()
                .extend(ct.translatable.iter().map(String::as_str));
        }

        let store = Self::new();
        for (model, fields) in &allowed {
            let dir = root.join(CONTENT_DIR).join(model);
            if !dir.is_dir() {
                tracing::debug!(model, dir = %dir.display(), "no content directory");
                continue;
            }
            store.register_model(model);
            for path in record_files(&dir)? {
                let record = parse_record(&path, model)?;
                if let Some(field) = record.fields.names().find(|f| !fields.contains(f)) {
                    return Err(StoreError::UntranslatableField {
                        model: model.to_string(),
                        id: record.id,
                        field: field.to_string(),
                    });
                }
                store.insert_stored(StoredRecord {
                    record,
                    source: Some(path),
                })?;
            }
        }
        Ok(store)
    }

    /// Known models with their record counts (trashed included).
    pub fn models(&self) -> Vec<(String, usize)> {
        self.read()
            .iter()
            .map(|(model, records)| (model.clone(), records.len()))
            .collect()
    }

    pub fn get(&self, model: &str, id: u64) -> Option<ContentRecord> {
        self.read()
            .get(model)?
            .iter()
            .find(|r| r.record.id == id)
            .map(|r| r.record.clone())
    }

    /// Publish every scheduled record whose `published_at` has passed,
    /// writing the new status back to its source file.
    ///
    /// Returns the records that changed.
    pub fn publish_due(&self, now: DateTime<Utc>) -> Result<Vec<ContentRecord>, StoreError> {
        let mut changed = Vec::new();
        let mut models = self.write();
        for stored in models.values_mut().flatten() {
            if stored.record.is_trashed() || !stored.record.publish_if_due(now) {
                continue;
            }
            if let Some(source) = &stored.source {
                write_back(source, &stored.record)?;
            }
            changed.push(stored.record.clone());
        }
        Ok(changed)
    }

    /// Tombstone a record of `content_type`.
    pub fn trash(
        &self,
        content_type: &ContentTypeConfig,
        id: u64,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if !content_type.soft_deletes {
            return Err(StoreError::SoftDeleteDisabled(content_type.key.clone()));
        }
        self.update(&content_type.model, id, |record| {
            record.soft_delete = SoftDelete {
                deleted_at: Some(now),
            };
        })
    }

    /// Clear a record's tombstone.
    pub fn restore(&self, content_type: &ContentTypeConfig, id: u64) -> Result<(), StoreError> {
        self.update(&content_type.model, id, |record| {
            record.soft_delete = SoftDelete::default();
        })
    }

    fn update(
        &self,
        model: &str,
        id: u64,
        change: impl FnOnce(&mut ContentRecord),
    ) -> Result<(), StoreError> {
        let mut models = self.write();
        let stored = find_mut(&mut models, model, id)?;
        change(&mut stored.record);
        if let Some(source) = &stored.source {
            write_back(source, &stored.record)?;
        }
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Vec<StoredRecord>>> {
        self.models.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Vec<StoredRecord>>> {
        self.models.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl ContentRepository for ContentStore {
    fn has_model(&self, model: &str) -> bool {
        self.read().contains_key(model)
    }

    fn query(&self, query: &RecordQuery) -> Result<Vec<ContentRecord>, StoreError> {
        let models = self.read();
        let records = models
            .get(&query.model)
            .ok_or_else(|| StoreError::UnknownModel(query.model.clone()))?;
        let mut matches: Vec<ContentRecord> = records
            .iter()
            .filter(|r| query.matches(&r.record))
            .map(|r| r.record.clone())
            .collect();
        match query.order {
            Order::Storage => {}
            Order::CreatedAsc => matches.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            Order::CreatedDesc => matches.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        Ok(matches)
    }

    fn increment_views(&self, model: &str, id: u64) -> Result<u64, StoreError> {
        let mut models = self.write();
        let stored = find_mut(&mut models, model, id)?;
        stored.record.views += 1;
        Ok(stored.record.views)
    }

    fn publish_due(&self, now: DateTime<Utc>) -> Result<Vec<ContentRecord>, StoreError> {
        ContentStore::publish_due(self, now)
    }
}

fn find_mut<'a>(
    models: &'a mut BTreeMap<String, Vec<StoredRecord>>,
    model: &str,
    id: u64,
) -> Result<&'a mut StoredRecord, StoreError> {
    models
        .get_mut(model)
        .ok_or_else(|| StoreError::UnknownModel(model.to_string()))?
        .iter_mut()
        .find(|r| r.record.id == id)
        .ok_or_else(|| StoreError::RecordNotFound {
            model: model.to_string(),
            id,
        })
}

/// `.toml` files under `dir`, in `NNN-` prefix order.
fn record_files(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .sort_by(|a, b| {
            naming::entry_order(&a.file_name().to_string_lossy())
                .cmp(&naming::entry_order(&b.file_name().to_string_lossy()))
        });
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|e| e == "toml")
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn parse_record(path: &Path, model: &str) -> Result<ContentRecord, StoreError> {
    let content = fs::read_to_string(path)?;
    let mut record: ContentRecord = toml::from_str(&content).map_err(|source| StoreError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    record.model = model.to_string();
    Ok(record)
}

/// Rewrite the lifecycle keys (`status`, `soft_delete`) of a record file.
fn write_back(path: &Path, record: &ContentRecord) -> Result<(), StoreError> {
    let content = fs::read_to_string(path)?;
    let mut value: toml::Value = toml::from_str(&content).map_err(|source| StoreError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    if let toml::Value::Table(table) = &mut value {
        table.insert(
            "status".to_string(),
            toml::Value::String(status_name(record.status).to_string()),
        );
        match record.soft_delete.deleted_at {
            Some(at) => {
                let mut tombstone = toml::map::Map::new();
                tombstone.insert("deleted_at".to_string(), toml::Value::String(at.to_rfc3339()));
                table.insert("soft_delete".to_string(), toml::Value::Table(tombstone));
            }
            None => {
                table.remove("soft_delete");
            }
        }
    }
    fs::write(path, toml::to_string_pretty(&value)?)?;
    Ok(())
}

fn status_name(status: Status) -> &'static str {
    match status {
        Status::Draft => "draft",
        Status::Scheduled => "scheduled",
        Status::Published => "published",
    }
}
