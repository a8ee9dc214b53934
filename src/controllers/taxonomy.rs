//! `/{lang}/{taxonomy}/{slug}`: a taxonomy term and the records filed
//! under it.
//!
//! Which content type the listing shows is the taxonomy's
//! `display_content_from` relation, resolved against its declared
//! relations when the configuration is loaded.

use crate::cms::{Cms, CmsError};
use crate::config::DEFAULT_DISPLAY_RELATION;
use crate::locator::localized_slug_redirect;
use crate::naming;
use crate::repository::{Order, RecordQuery};
use crate::router::{CmsRequest, Route};
use crate::templates::Candidates;
use crate::view::{PageItem, PageKind};

use super::{
    Outcome, PageDraft, finish, listing, record_alternates, record_view, redirect_to, slug_for,
};

pub fn show(
    cms: &Cms,
    request: &CmsRequest,
    lang: &str,
    type_slug: &str,
    slug: &str,
) -> Result<Outcome, CmsError> {
    let key = cms.index().original_content_type_key(type_slug);
    let taxonomy = cms.content_type(&key)?;
    if !taxonomy.is_taxonomy() {
        return Err(CmsError::NotFound(format!("'{key}' is not a taxonomy")));
    }
    cms.require_model(&taxonomy)?;

    let term = cms
        .locator()
        .find_content(&taxonomy.model, lang, slug, cms.visibility(request))?
        .ok_or_else(|| CmsError::NotFound(format!("{key} '{slug}'")))?;

    if type_slug != taxonomy.slug {
        return Ok(redirect_to(cms.record_route(&taxonomy, &term, lang), request));
    }
    let redirect = localized_slug_redirect(
        &term,
        lang,
        &cms.config().default_language,
        slug,
        &request.query,
        |canonical| Route::Taxonomy {
            lang: lang.to_string(),
            type_slug: taxonomy.slug.clone(),
            slug: canonical.to_string(),
        },
    );
    if let Some(redirect) = redirect {
        return Ok(Outcome::Redirect(redirect));
    }

    let relation = taxonomy
        .display_content_from
        .as_deref()
        .unwrap_or(DEFAULT_DISPLAY_RELATION);
    let related = cms.content_type(relation)?;
    cms.require_model(&related)?;

    let query = RecordQuery::model(&related.model)
        .published()
        .in_term(&taxonomy.key, term.id)
        .order(Order::CreatedDesc);
    let paginated = cms.repository().paginate(
        &query,
        request.page(),
        taxonomy.page_size(cms.config().pagination_limit),
    )?;

    let route = cms.record_route(&taxonomy, &term, lang);
    let listing = listing(cms, request, lang, &route, &related, paginated);

    let segment = naming::template_segment(&taxonomy.key);
    let term_slug = slug_for(cms, &term, lang);
    let mut candidates = Candidates::new().push_override(term.template.as_deref());
    if let Some(term_slug) = &term_slug {
        candidates = candidates.push(format!(
            "templates.taxonomies.{segment}-{}",
            naming::template_segment(term_slug)
        ));
    }
    let candidates = candidates
        .push(format!("templates.taxonomies.{segment}"))
        .push("templates.taxonomies.default")
        .push("templates.archives.default");

    finish(
        cms,
        request,
        PageDraft {
            kind: PageKind::Taxonomy,
            lang,
            content_type: &taxonomy,
            slug: term_slug,
            candidates,
            item: PageItem::Record(record_view(cms, &taxonomy, &term, lang)),
            listing: Some(listing),
            canonical: route,
            alternates: record_alternates(cms, &taxonomy, &term, lang),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CmsConfig;
    use crate::record::ContentRecord;
    use crate::test_helpers::*;
    use crate::view::ResolvedPage;
    use chrono::Duration;

    fn records() -> Vec<ContentRecord> {
        vec![
            RecordBuilder::new(1, "category")
                .title("en", "News")
                .title("id", "Berita")
                .slug("en", "news")
                .slug("id", "berita")
                .published()
                .build(),
            RecordBuilder::new(2, "category")
                .title("en", "Empty")
                .slug("en", "empty")
                .published()
                .build(),
            RecordBuilder::new(1, "post")
                .title("en", "Filed")
                .slug("en", "filed")
                .term("categories", 1)
                .created_at(epoch() + Duration::days(1))
                .published()
                .build(),
            RecordBuilder::new(2, "post")
                .title("en", "Newer filed")
                .slug("en", "newer-filed")
                .term("categories", 1)
                .created_at(epoch() + Duration::days(2))
                .published()
                .build(),
            RecordBuilder::new(3, "post")
                .title("en", "Elsewhere")
                .slug("en", "elsewhere")
                .term("tags", 1)
                .published()
                .build(),
            RecordBuilder::new(4, "post")
                .title("en", "Unpublished")
                .slug("en", "unpublished")
                .term("categories", 1)
                .build(),
        ]
    }

    fn page(outcome: Outcome) -> Box<ResolvedPage> {
        match outcome {
            Outcome::Page(page) => page,
            Outcome::Redirect(r) => panic!("unexpected redirect to {}", r.location),
        }
    }

    #[test]
    fn lists_related_published_records() {
        let cms = memory_cms(bilingual_config(), records());
        let page = page(show(&cms, &get("/en/categories/news"), "en", "categories", "news").unwrap());
        let titles: Vec<&str> = page.view_data.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Newer filed", "Filed"]);
        assert_eq!(page.item.title(), "News");
        assert_eq!(page.template.name, "templates.taxonomies.default");
        assert!(page.body_classes.contains("taxonomy-categories"));
        assert!(page.body_classes.contains("taxonomy-news"));
    }

    #[test]
    fn localized_term_slug_redirects() {
        let cms = memory_cms(bilingual_config(), records());
        match show(&cms, &get("/id/categories/news"), "id", "categories", "news").unwrap() {
            Outcome::Redirect(r) => assert_eq!(r.location, "/id/categories/berita"),
            Outcome::Page(_) => panic!("expected redirect"),
        }
    }

    #[test]
    fn unknown_term_is_not_found() {
        let cms = memory_cms(bilingual_config(), records());
        assert!(matches!(
            show(&cms, &get("/en/categories/nope"), "en", "categories", "nope"),
            Err(CmsError::NotFound(_))
        ));
    }

    #[test]
    fn term_without_entries_renders_empty_listing() {
        let cms = memory_cms(bilingual_config(), records());
        let page = page(show(&cms, &get("/en/categories/empty"), "en", "categories", "empty").unwrap());
        assert!(page.view_data.items.is_empty());
    }

    #[test]
    fn undeclared_display_relation_falls_back_to_posts() {
        let mut config: CmsConfig = bilingual_config();
        config
            .content_models
            .get_mut("categories")
            .unwrap()
            .display_content_from = Some("products".into());
        let cms = memory_cms(config, records());
        let page = page(show(&cms, &get("/en/categories/news"), "en", "categories", "news").unwrap());
        assert_eq!(page.view_data.items.len(), 2);
    }

    #[test]
    fn missing_related_model_is_configuration_error() {
        let store = crate::store::ContentStore::new();
        store.register_model("category");
        for record in records().into_iter().filter(|r| r.model == "category") {
            store.insert(record).unwrap();
        }
        let cms = Cms::new(
            bilingual_config(),
            std::sync::Arc::new(store),
            std::sync::Arc::new(crate::cache::MemoryCache::new()),
            crate::theme::Theme::empty(),
        );
        assert!(matches!(
            show(&cms, &get("/en/categories/news"), "en", "categories", "news"),
            Err(CmsError::Configuration(_))
        ));
    }
}
