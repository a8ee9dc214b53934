//! Content repository port.
//!
//! The resolution core asks for records through [`ContentRepository`] and
//! describes what it wants with a [`RecordQuery`]. The crate ships one
//! implementation, [`ContentStore`](crate::store::ContentStore); a database
//! backend would implement the same trait by translating the query into
//! SQL over JSON-keyed translatable columns.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::record::{ContentRecord, Status};
use crate::store::StoreError;

/// Sort order of query results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    /// Whatever order the backend stores records in.
    #[default]
    Storage,
    CreatedAsc,
    CreatedDesc,
}

/// Filter over one model's records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordQuery {
    pub model: String,
    /// Required status; `None` accepts every status.
    pub status: Option<Status>,
    /// `(locale, slug)`: the `slug` field must hold exactly this value under
    /// exactly this locale.
    pub slug: Option<(String, String)>,
    /// `(taxonomy key, term id)`: the record must belong to the term.
    pub term: Option<(String, u64)>,
    pub with_trashed: bool,
    pub order: Order,
}

impl RecordQuery {
    pub fn model(model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..Self::default()
        }
    }

    pub fn published(mut self) -> Self {
        self.status = Some(Status::Published);
        self
    }

    pub fn status(mut self, status: Option<Status>) -> Self {
        self.status = status;
        self
    }

    pub fn slug(mut self, locale: &str, slug: &str) -> Self {
        self.slug = Some((locale.to_string(), slug.to_string()));
        self
    }

    pub fn in_term(mut self, taxonomy: &str, term_id: u64) -> Self {
        self.term = Some((taxonomy.to_string(), term_id));
        self
    }

    pub fn with_trashed(mut self) -> Self {
        self.with_trashed = true;
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    /// Whether `record` passes every filter except `model` and ordering.
    pub fn matches(&self, record: &ContentRecord) -> bool {
        if !self.with_trashed && record.is_trashed() {
            return false;
        }
        if let Some(status) = self.status
            && record.status != status
        {
            return false;
        }
        if let Some((locale, slug)) = &self.slug
            && record.slug_in(locale) != Some(slug.as_str())
        {
            return false;
        }
        if let Some((taxonomy, term_id)) = &self.term
            && !record.belongs_to_term(taxonomy, *term_id)
        {
            return false;
        }
        true
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
    pub total: usize,
}

impl<T> Paginated<T> {
    /// Slice `all` into the requested page. Pages below 1 are treated as 1.
    pub fn from_vec(all: Vec<T>, page: u32, per_page: u32) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total = all.len();
        let skip = (page as usize - 1).saturating_mul(per_page as usize);
        let items = all.into_iter().skip(skip).take(per_page as usize).collect();
        Self {
            items,
            page,
            per_page,
            total,
        }
    }

    pub fn last_page(&self) -> u32 {
        let per_page = self.per_page.max(1) as usize;
        (self.total.div_ceil(per_page)).max(1) as u32
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.last_page()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

/// Record storage consumed by the locator and controllers.
pub trait ContentRepository: Send + Sync {
    /// Whether the backend knows the model at all.
    fn has_model(&self, model: &str) -> bool;

    /// Every record of `query.model` that matches, in `query.order`.
    fn query(&self, query: &RecordQuery) -> Result<Vec<ContentRecord>, StoreError>;

    /// First match, if any.
    fn first(&self, query: &RecordQuery) -> Result<Option<ContentRecord>, StoreError> {
        Ok(self.query(query)?.into_iter().next())
    }

    fn paginate(
        &self,
        query: &RecordQuery,
        page: u32,
        per_page: u32,
    ) -> Result<Paginated<ContentRecord>, StoreError> {
        Ok(Paginated::from_vec(self.query(query)?, page, per_page))
    }

    /// Bump a record's view counter, returning the new count.
    fn increment_views(&self, model: &str, id: u64) -> Result<u64, StoreError>;

    /// Promote scheduled records whose publication time is at or before
    /// `now`, returning the ones that changed.
    fn publish_due(&self, now: DateTime<Utc>) -> Result<Vec<ContentRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::RecordBuilder;

    #[test]
    fn query_matches_slug_under_exact_locale() {
        let record = RecordBuilder::new(1, "page")
            .slug("en", "about")
            .slug("id", "tentang")
            .build();
        assert!(RecordQuery::model("page").slug("id", "tentang").matches(&record));
        assert!(!RecordQuery::model("page").slug("id", "about").matches(&record));
    }

    #[test]
    fn query_status_filter() {
        let draft = RecordBuilder::new(1, "page").build();
        assert!(!RecordQuery::model("page").published().matches(&draft));
        assert!(RecordQuery::model("page").matches(&draft));
    }

    #[test]
    fn query_hides_trashed_unless_asked() {
        let trashed = RecordBuilder::new(1, "page").published().trashed().build();
        assert!(!RecordQuery::model("page").matches(&trashed));
        assert!(RecordQuery::model("page").with_trashed().matches(&trashed));
    }

    #[test]
    fn query_term_membership() {
        let post = RecordBuilder::new(1, "post").term("categories", 3).build();
        assert!(RecordQuery::model("post").in_term("categories", 3).matches(&post));
        assert!(!RecordQuery::model("post").in_term("categories", 4).matches(&post));
    }

    #[test]
    fn paginate_slices_and_counts() {
        let page = Paginated::from_vec((1..=7).collect::<Vec<u32>>(), 2, 3);
        assert_eq!(page.items, vec![4, 5, 6]);
        assert_eq!(page.total, 7);
        assert_eq!(page.last_page(), 3);
        assert!(page.has_previous());
        assert!(page.has_next());
    }

    #[test]
    fn paginate_past_end_is_empty() {
        let page = Paginated::from_vec(vec![1, 2], 5, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.last_page(), 1);
        assert!(!page.has_next());
    }

    #[test]
    fn paginate_page_zero_is_first_page() {
        let page = Paginated::from_vec(vec![1, 2, 3], 0, 2);
        assert_eq!(page.page, 1);
        assert_eq!(page.items, vec![1, 2]);
    }
}
