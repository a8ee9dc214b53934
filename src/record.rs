//! Content records and the capabilities composed into them.
//!
//! A [`ContentRecord`] is a plain struct. Behavior that a PHP-style CMS would
//! bolt on through model inheritance is attached by composition instead:
//!
//! - [`TranslatableFields`]: field name → [`Translatable`] (locale → value).
//!   Which fields a record may carry is decided per content type by the
//!   `translatable` list in `cms.toml`.
//! - [`SoftDelete`]: a tombstone timestamp. Trashed records stay in the
//!   store and can be restored, but no query sees them by default.
//!
//! ## On-disk shape
//!
//! ```toml
//! id = 2
//! status = "published"              # draft | scheduled | published
//! created_at = "2024-03-01T09:00:00Z"
//! published_at = "2024-03-01T09:00:00Z"
//! template = "landing"              # optional template override
//! terms = { categories = [1] }      # taxonomy key -> term ids
//!
//! [title]
//! en = "About us"
//! id = "Tentang kami"
//!
//! [slug]
//! en = "about"
//! id = "tentang"
//! ```
//!
//! Timestamps are RFC 3339 strings. A locale missing from a field table is
//! an absent translation and falls back to the default language.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Publication state of a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Draft,
    Scheduled,
    Published,
}

/// A single field's values keyed by locale.
///
/// `None`, a missing key, and a blank string all mean "not translated".
/// Admin forms save untouched fields as `""`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Translatable(BTreeMap<String, Option<String>>);

impl Translatable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, locale: &str, value: Option<&str>) -> Self {
        self.set(locale, value);
        self
    }

    pub fn set(&mut self, locale: &str, value: Option<&str>) {
        self.0.insert(locale.to_string(), value.map(str::to_string));
    }

    /// Value stored for exactly `locale`, if it is not blank.
    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0
            .get(locale)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.trim().is_empty())
    }

    /// Value for `locale`, falling back to `default_locale` when absent.
    pub fn translate(&self, locale: &str, default_locale: &str) -> Option<&str> {
        self.get(locale).or_else(|| self.get(default_locale))
    }

    /// Locales that carry a value.
    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.0
            .keys()
            .map(String::as_str)
            .filter(|locale| self.get(locale).is_some())
    }
}

/// Translatable capability: every locale-keyed field of a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslatableFields(BTreeMap<String, Translatable>);

impl TranslatableFields {
    pub fn field(&self, name: &str) -> Option<&Translatable> {
        self.0.get(name)
    }

    pub fn set_field(&mut self, name: &str, value: Translatable) {
        self.0.insert(name.to_string(), value);
    }

    pub fn translate(&self, name: &str, locale: &str, default_locale: &str) -> Option<&str> {
        self.field(name)
            .and_then(|f| f.translate(locale, default_locale))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Soft-delete capability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SoftDelete {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SoftDelete {
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }

    fn is_kept(&self) -> bool {
        !self.is_trashed()
    }
}

/// A page, post, taxonomy term, or any other configured record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: u64,
    /// Collection the record belongs to; set by the store, not the file.
    #[serde(skip)]
    pub model: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,
    /// Taxonomy key → ids of the terms this record belongs to.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub terms: BTreeMap<String, Vec<u64>>,
    #[serde(default)]
    pub views: u64,
    #[serde(default, skip_serializing_if = "SoftDelete::is_kept")]
    pub soft_delete: SoftDelete,
    #[serde(flatten)]
    pub fields: TranslatableFields,
}

impl ContentRecord {
    pub fn new(id: u64, model: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            model: model.to_string(),
            status: Status::Draft,
            published_at: None,
            created_at,
            template: None,
            parent_id: None,
            terms: BTreeMap::new(),
            views: 0,
            soft_delete: SoftDelete::default(),
            fields: TranslatableFields::default(),
        }
    }

    /// Translated value of `field`, with default-locale fallback.
    pub fn translate(&self, field: &str, locale: &str, default_locale: &str) -> Option<&str> {
        self.fields.translate(field, locale, default_locale)
    }

    /// Slug stored for exactly `locale`, without fallback.
    pub fn slug_in(&self, locale: &str) -> Option<&str> {
        self.fields.field("slug").and_then(|s| s.get(locale))
    }

    pub fn is_published(&self) -> bool {
        self.status == Status::Published
    }

    pub fn is_trashed(&self) -> bool {
        self.soft_delete.is_trashed()
    }

    pub fn belongs_to_term(&self, taxonomy: &str, term_id: u64) -> bool {
        self.terms
            .get(taxonomy)
            .is_some_and(|ids| ids.contains(&term_id))
    }

    /// Promote a scheduled record whose publication time has passed.
    ///
    /// Returns `true` if the status changed. Re-running is harmless.
    pub fn publish_if_due(&mut self, now: DateTime<Utc>) -> bool {
        match (self.status, self.published_at) {
            (Status::Scheduled, Some(at)) if at <= now => {
                self.status = Status::Published;
                true
            }
            _ => false,
        }
    }
}
