//! Content locator: (model, locale, slug) → record.
//!
//! Records are matched on the translated `slug` field under exactly the
//! requested locale. When nothing matches and the requested locale is not
//! the default one, the lookup is repeated with the slug interpreted as a
//! default-locale slug, so `/id/contact` finds a page that only has an
//! English slug.
//!
//! Publication gating is decided once per request by [`Visibility`]:
//! preview mode only lifts it for authenticated callers.

use crate::record::ContentRecord;
use crate::repository::{ContentRepository, RecordQuery};
use crate::router::{Redirect, Route};
use crate::store::StoreError;

/// Which statuses a lookup may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Published records only.
    Published,
    /// Any status: drafts and scheduled records included.
    Any,
}

impl Visibility {
    pub fn for_request(preview: bool, authenticated: bool) -> Self {
        if preview && authenticated {
            Visibility::Any
        } else {
            Visibility::Published
        }
    }

    fn apply(self, query: RecordQuery) -> RecordQuery {
        match self {
            Visibility::Published => query.published(),
            Visibility::Any => query,
        }
    }
}

pub struct ContentLocator<'a> {
    repo: &'a dyn ContentRepository,
    default_language: &'a str,
}

impl<'a> ContentLocator<'a> {
    pub fn new(repo: &'a dyn ContentRepository, default_language: &'a str) -> Self {
        Self {
            repo,
            default_language,
        }
    }

    /// First record of `model` whose slug matches, in storage order.
    ///
    /// Absence is `Ok(None)`; only backend failures are errors.
    pub fn find_content(
        &self,
        model: &str,
        locale: &str,
        slug: &str,
        visibility: Visibility,
    ) -> Result<Option<ContentRecord>, StoreError> {
        let base = visibility.apply(RecordQuery::model(model));
        if let Some(record) = self.repo.first(&base.clone().slug(locale, slug))? {
            return Ok(Some(record));
        }
        if locale == self.default_language {
            return Ok(None);
        }
        let found = self
            .repo
            .first(&base.slug(self.default_language, slug))?;
        if let Some(record) = &found {
            tracing::debug!(
                model,
                locale,
                slug,
                id = record.id,
                "matched via default-locale slug"
            );
        }
        Ok(found)
    }
}

/// Canonical-slug redirect for a located record.
///
/// Compares the record's slug in `lang` (falling back to the default locale)
/// with the slug literal from the URL. When they differ, returns a 301 to
/// the URL `route_for` builds from the canonical slug, carrying `query`
/// over unchanged.
pub fn localized_slug_redirect(
    record: &ContentRecord,
    lang: &str,
    default_language: &str,
    requested_slug: &str,
    query: &[(String, String)],
    route_for: impl FnOnce(&str) -> Route,
) -> Option<Redirect> {
    let canonical = record.translate("slug", lang, default_language)?;
    if canonical == requested_slug {
        return None;
    }
    let location = route_for(canonical).url(query);
    tracing::debug!(
        lang,
        requested = requested_slug,
        canonical,
        %location,
        "redirecting to localized slug"
    );
    Some(Redirect::permanent(location))
}
