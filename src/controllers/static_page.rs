//! `/{lang}/{page}`: static pages.
//!
//! 1. The front page under any of its slugs redirects to `/{lang}/`.
//! 2. A page found under a non-canonical slug redirects to its localized one.
//! 3. A miss is retried against `fallback_content_type` (posts, usually),
//!    rendered in place as that type's single page.
//! 4. Otherwise not found.

use crate::cms::{Cms, CmsError};
use crate::config::ContentTypeConfig;
use crate::locator::{Visibility, localized_slug_redirect};
use crate::naming;
use crate::record::ContentRecord;
use crate::router::{CmsRequest, Route};
use crate::templates::Candidates;
use crate::view::{PageItem, PageKind};

use super::{Outcome, PageDraft, finish, record_alternates, record_view, redirect_to, single, slug_for};

pub fn show(
    cms: &Cms,
    request: &CmsRequest,
    lang: &str,
    page_slug: &str,
) -> Result<Outcome, CmsError> {
    let pages = cms.static_type()?;
    cms.require_model(&pages)?;
    let visibility = cms.visibility(request);

    if is_front_page_slug(cms, &pages, lang, page_slug, visibility)? {
        return Ok(redirect_to(
            Route::Home {
                lang: lang.to_string(),
            },
            request,
        ));
    }

    let found = cms
        .locator()
        .find_content(&pages.model, lang, page_slug, visibility)?;
    if let Some(record) = found {
        let redirect = localized_slug_redirect(
            &record,
            lang,
            &cms.config().default_language,
            page_slug,
            &request.query,
            |slug| Route::StaticPage {
                lang: lang.to_string(),
                page_slug: slug.to_string(),
            },
        );
        if let Some(redirect) = redirect {
            return Ok(Outcome::Redirect(redirect));
        }
        return render(cms, request, lang, &pages, &record);
    }

    if let Some(outcome) = try_fallback_type(cms, request, lang, page_slug, visibility)? {
        return Ok(outcome);
    }
    Err(CmsError::NotFound(format!("page '{page_slug}'")))
}

/// The slug names the front page, literally or as its translation in `lang`.
fn is_front_page_slug(
    cms: &Cms,
    pages: &ContentTypeConfig,
    lang: &str,
    page_slug: &str,
    visibility: Visibility,
) -> Result<bool, CmsError> {
    let config = cms.config();
    if page_slug == config.front_page_slug {
        return Ok(true);
    }
    let front = cms.locator().find_content(
        &pages.model,
        &config.default_language,
        &config.front_page_slug,
        visibility,
    )?;
    Ok(front.is_some_and(|record| {
        record.translate("slug", lang, &config.default_language) == Some(page_slug)
    }))
}

fn try_fallback_type(
    cms: &Cms,
    request: &CmsRequest,
    lang: &str,
    page_slug: &str,
    visibility: Visibility,
) -> Result<Option<Outcome>, CmsError> {
    let Some(key) = cms.config().fallback_content_type.as_deref() else {
        return Ok(None);
    };
    let fallback = cms.content_type(key)?;
    if !fallback.has_single || !cms.repository().has_model(&fallback.model) {
        tracing::debug!(content_type = key, "fallback type cannot serve singles");
        return Ok(None);
    }
    let Some(record) = cms
        .locator()
        .find_content(&fallback.model, lang, page_slug, visibility)?
    else {
        return Ok(None);
    };
    tracing::debug!(
        content_type = key,
        slug = page_slug,
        id = record.id,
        "static page missing, serving fallback type"
    );
    single::render(cms, request, lang, &fallback, record).map(Some)
}

fn render(
    cms: &Cms,
    request: &CmsRequest,
    lang: &str,
    pages: &ContentTypeConfig,
    record: &ContentRecord,
) -> Result<Outcome, CmsError> {
    let slug = slug_for(cms, record, lang);
    let mut candidates = Candidates::new().push_override(record.template.as_deref());
    if let Some(slug) = &slug {
        candidates = candidates.push(format!(
            "templates.singles.{}",
            naming::template_segment(slug)
        ));
    }
    let candidates = candidates
        .push("templates.page")
        .push("templates.singles.default");

    finish(
        cms,
        request,
        PageDraft {
            kind: PageKind::Page,
            lang,
            content_type: pages,
            slug,
            candidates,
            item: PageItem::Record(record_view(cms, pages, record, lang)),
            listing: None,
            canonical: cms.record_route(pages, record, lang),
            alternates: record_alternates(cms, pages, record, lang),
        },
    )
}
