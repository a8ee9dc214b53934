//! Shared test utilities for the lingua-cms test suite.
//!
//! Provides record builders, on-disk fixture writers, and a ready-made
//! [`Cms`] over the fixture site in `fixtures/site/`.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let (_tmp, cms) = fixture_cms();
//! let response = respond(&cms, &get("/en/"));
//! assert_eq!(response.status, 200);
//!
//! let record = RecordBuilder::new(1, "page")
//!     .title("en", "About")
//!     .slug("en", "about")
//!     .published()
//!     .build();
//! ```

use chrono::{DateTime, TimeZone, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::cache::MemoryCache;
use crate::cms::Cms;
use crate::config::CmsConfig;
use crate::record::{ContentRecord, SoftDelete, Status, Translatable};
use crate::router::{CmsRequest, Response};
use crate::store::{CONTENT_DIR, ContentStore};
use crate::theme::Theme;

// =========================================================================
// Time
// =========================================================================

/// Fixed reference instant used across tests: 2024-01-01T00:00:00Z.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("valid timestamp")
}

// =========================================================================
// Records
// =========================================================================

/// Builder for in-memory records. Starts as a draft created at [`epoch`].
pub struct RecordBuilder {
    record: ContentRecord,
}

impl RecordBuilder {
    pub fn new(id: u64, model: &str) -> Self {
        Self {
            record: ContentRecord::new(id, model, epoch()),
        }
    }

    /// Set one locale of a translatable field; `None` stores an explicit null.
    pub fn field(mut self, name: &str, locale: &str, value: Option<&str>) -> Self {
        let mut field = self
            .record
            .fields
            .field(name)
            .cloned()
            .unwrap_or_else(Translatable::new);
        field.set(locale, value);
        self.record.fields.set_field(name, field);
        self
    }

    pub fn title(self, locale: &str, value: &str) -> Self {
        self.field("title", locale, Some(value))
    }

    pub fn slug(self, locale: &str, value: &str) -> Self {
        self.field("slug", locale, Some(value))
    }

    pub fn content(self, locale: &str, value: &str) -> Self {
        self.field("content", locale, Some(value))
    }

    pub fn excerpt(self, locale: &str, value: &str) -> Self {
        self.field("excerpt", locale, Some(value))
    }

    pub fn status(mut self, status: Status) -> Self {
        self.record.status = status;
        self
    }

    /// Published at [`epoch`].
    pub fn published(mut self) -> Self {
        self.record.status = Status::Published;
        self.record.published_at = Some(epoch());
        self
    }

    pub fn published_at(mut self, at: DateTime<Utc>) -> Self {
        self.record.published_at = Some(at);
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.record.created_at = at;
        self
    }

    pub fn template(mut self, name: &str) -> Self {
        self.record.template = Some(name.to_string());
        self
    }

    pub fn term(mut self, taxonomy: &str, term_id: u64) -> Self {
        self.record
            .terms
            .entry(taxonomy.to_string())
            .or_default()
            .push(term_id);
        self
    }

    pub fn trashed(mut self) -> Self {
        self.record.soft_delete = SoftDelete {
            deleted_at: Some(epoch()),
        };
        self
    }

    pub fn build(self) -> ContentRecord {
        self.record
    }
}

// =========================================================================
// On-disk fixtures
// =========================================================================

/// Write `content` to `<root>/content/<model>/<file>`.
pub fn write_raw(root: &Path, model: &str, file: &str, content: &str) -> PathBuf {
    let dir = root.join(CONTENT_DIR).join(model);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(file);
    fs::write(&path, content).unwrap();
    path
}

/// Write a minimal record whose `en` title and slug are both `slug`.
pub fn write_record(
    root: &Path,
    model: &str,
    file: &str,
    id: u64,
    slug: &str,
    status: &str,
) -> PathBuf {
    let content = format!(
        r#"id = {id}
status = "{status}"
created_at = "2024-01-01T00:00:00Z"

[title]
en = "{slug}"

[slug]
en = "{slug}"
"#
    );
    write_raw(root, model, file, &content)
}

/// Copy `fixtures/site/` to a temp directory and return it.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Whole-site fixtures
// =========================================================================

/// The fixture site, opened with an in-memory cache.
///
/// The temp dir must outlive the returned [`Cms`].
pub fn fixture_cms() -> (TempDir, Cms) {
    let tmp = setup_fixtures();
    let cms = Cms::open_in_memory(tmp.path()).unwrap();
    (tmp, cms)
}

/// A [`Cms`] over hand-built records, stock templates only.
pub fn memory_cms(config: CmsConfig, records: Vec<ContentRecord>) -> Cms {
    let store = ContentStore::new();
    for ct in config.content_types() {
        store.register_model(&ct.model);
    }
    for record in records {
        store.insert(record).unwrap();
    }
    Cms::new(
        config,
        Arc::new(store),
        Arc::new(MemoryCache::new()),
        Theme::empty(),
    )
}

/// Two-locale config (`en` default, `id`) over stock content models.
pub fn bilingual_config() -> CmsConfig {
    CmsConfig {
        language_available: vec!["en".to_string(), "id".to_string()],
        preview_token: Some("let-me-in".to_string()),
        ..CmsConfig::default()
    }
}

/// Anonymous GET for `target` (path plus optional query).
pub fn get(target: &str) -> CmsRequest {
    CmsRequest::parse(target, false)
}

/// Authenticated GET for `target`.
pub fn get_authenticated(target: &str) -> CmsRequest {
    CmsRequest::parse(target, true)
}

/// Body of a 200 response. Panics with the status and body otherwise.
pub fn ok_body(response: &Response) -> &str {
    assert_eq!(
        response.status, 200,
        "expected 200, got {}: {}",
        response.status, response.body
    );
    &response.body
}

/// Location of a redirect response. Panics if it is not `status`.
pub fn redirect_location(response: &Response, status: u16) -> &str {
    assert_eq!(
        response.status, status,
        "expected {status}, got {}: {}",
        response.status, response.body
    );
    response
        .location
        .as_deref()
        .unwrap_or_else(|| panic!("redirect without location"))
}
