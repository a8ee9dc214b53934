//! `/{lang}/{type}`: paginated archive of a content type.
//!
//! The archive's title and description come from a static page whose slug
//! equals the type's URL slug, when one exists. Otherwise they are
//! synthesised from the type key. Entries are the type's published records,
//! newest first.

use crate::cms::{Cms, CmsError};
use crate::config::ContentTypeConfig;
use crate::locator::Visibility;
use crate::naming;
use crate::record::ContentRecord;
use crate::repository::{Order, RecordQuery};
use crate::router::{CmsRequest, Route};
use crate::templates::Candidates;
use crate::view::{ArchiveDescriptor, PageItem, PageKind};

use super::{Outcome, PageDraft, alternates, finish, listing, redirect_to};

pub fn show(
    cms: &Cms,
    request: &CmsRequest,
    lang: &str,
    type_slug: &str,
) -> Result<Outcome, CmsError> {
    let key = cms.index().original_content_type_key(type_slug);
    let content_type = cms.content_type(&key)?;
    if !content_type.has_archive {
        return Err(CmsError::NotFound(format!(
            "content type '{key}' has no archive"
        )));
    }
    let route = Route::Archive {
        lang: lang.to_string(),
        type_slug: content_type.slug.clone(),
    };
    if type_slug != content_type.slug {
        return Ok(redirect_to(route, request));
    }
    cms.require_model(&content_type)?;

    let per_page = content_type.page_size(cms.config().pagination_limit);
    let backing_page = backing_page(cms, lang, &content_type, cms.visibility(request))?;
    let descriptor = describe(cms, lang, &content_type, backing_page.as_ref(), per_page);

    let query = RecordQuery::model(&content_type.model)
        .published()
        .order(Order::CreatedDesc);
    let paginated = cms
        .repository()
        .paginate(&query, request.page(), per_page)?;

    let segment = naming::template_segment(&content_type.key);
    let candidates = Candidates::new()
        .push_override(content_type.archive_view.as_deref())
        .push_override(backing_page.as_ref().and_then(|p| p.template.as_deref()))
        .push(format!("templates.archives.{segment}"))
        .push("templates.archives.default");

    let listing = listing(cms, request, lang, &route, &content_type, paginated);
    let type_slug = content_type.slug.clone();
    finish(
        cms,
        request,
        PageDraft {
            kind: PageKind::Archive,
            lang,
            content_type: &content_type,
            slug: Some(type_slug.clone()),
            candidates,
            item: PageItem::Archive(descriptor),
            listing: Some(listing),
            canonical: route,
            alternates: alternates(cms, lang, |l| Route::Archive {
                lang: l.to_string(),
                type_slug: type_slug.clone(),
            }),
        },
    )
}

/// Static page sharing the archive's URL slug, if any.
fn backing_page(
    cms: &Cms,
    lang: &str,
    content_type: &ContentTypeConfig,
    visibility: Visibility,
) -> Result<Option<ContentRecord>, CmsError> {
    let Ok(pages) = cms.static_type() else {
        return Ok(None);
    };
    if !cms.repository().has_model(&pages.model) {
        return Ok(None);
    }
    Ok(cms
        .locator()
        .find_content(&pages.model, lang, &content_type.slug, visibility)?)
}

fn describe(
    cms: &Cms,
    lang: &str,
    content_type: &ContentTypeConfig,
    page: Option<&ContentRecord>,
    per_page: u32,
) -> ArchiveDescriptor {
    let default_language = &cms.config().default_language;
    let field = |name: &str| {
        page.and_then(|p| p.translate(name, lang, default_language))
            .map(str::to_string)
    };
    ArchiveDescriptor {
        title: field("title").unwrap_or_else(|| naming::humanize(&content_type.key)),
        description: field("excerpt"),
        post_type: content_type.key.clone(),
        config: content_type.clone(),
        per_page,
    }
}
