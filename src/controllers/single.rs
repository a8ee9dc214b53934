//! `/{lang}/{type}/{slug}`: one record of a content type.

use crate::cms::{Cms, CmsError};
use crate::config::ContentTypeConfig;
use crate::locator::localized_slug_redirect;
use crate::naming;
use crate::record::ContentRecord;
use crate::router::{CmsRequest, Route};
use crate::templates::Candidates;
use crate::view::{PageItem, PageKind};

use super::{Outcome, PageDraft, finish, record_alternates, record_view, redirect_to, slug_for};

pub fn show(
    cms: &Cms,
    request: &CmsRequest,
    lang: &str,
    type_slug: &str,
    slug: &str,
) -> Result<Outcome, CmsError> {
    let key = cms.index().original_content_type_key(type_slug);
    if key == cms.config().static_page_slug {
        return Ok(redirect_to(
            Route::StaticPage {
                lang: lang.to_string(),
                page_slug: slug.to_string(),
            },
            request,
        ));
    }

    let content_type = cms.content_type(&key)?;
    if !content_type.has_single {
        return Err(CmsError::NotFound(format!(
            "content type '{key}' has no single pages"
        )));
    }
    cms.require_model(&content_type)?;

    let record = cms
        .locator()
        .find_content(&content_type.model, lang, slug, cms.visibility(request))?
        .ok_or_else(|| CmsError::NotFound(format!("{key} '{slug}'")))?;

    if type_slug != content_type.slug {
        return Ok(redirect_to(
            cms.record_route(&content_type, &record, lang),
            request,
        ));
    }
    let redirect = localized_slug_redirect(
        &record,
        lang,
        &cms.config().default_language,
        slug,
        &request.query,
        |canonical| Route::Single {
            lang: lang.to_string(),
            type_slug: content_type.slug.clone(),
            slug: canonical.to_string(),
        },
    );
    if let Some(redirect) = redirect {
        return Ok(Outcome::Redirect(redirect));
    }

    render(cms, request, lang, &content_type, record)
}

/// Count the view and render `record` as a single page of `content_type`.
pub(crate) fn render(
    cms: &Cms,
    request: &CmsRequest,
    lang: &str,
    content_type: &ContentTypeConfig,
    mut record: ContentRecord,
) -> Result<Outcome, CmsError> {
    if !request.authenticated {
        record.views = cms
            .repository()
            .increment_views(&content_type.model, record.id)?;
    }

    let key = naming::template_segment(&content_type.key);
    let slug = slug_for(cms, &record, lang);
    let mut candidates = Candidates::new().push_override(record.template.as_deref());
    if let Some(slug) = &slug {
        candidates = candidates.push(format!(
            "templates.singles.{key}-{}",
            naming::template_segment(slug)
        ));
    }
    let candidates = candidates
        .push(format!("templates.singles.{key}"))
        .push("templates.singles.default");

    finish(
        cms,
        request,
        PageDraft {
            kind: PageKind::Single,
            lang,
            content_type,
            slug,
            candidates,
            item: PageItem::Record(record_view(cms, content_type, &record, lang)),
            listing: None,
            canonical: cms.record_route(content_type, &record, lang),
            alternates: record_alternates(cms, content_type, &record, lang),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CmsConfig;
    use crate::test_helpers::*;
    use crate::theme::Theme;
    use crate::view::ResolvedPage;

    fn posts() -> Vec<ContentRecord> {
        vec![
            RecordBuilder::new(1, "post")
                .title("en", "Hello World")
                .title("id", "Halo Dunia")
                .slug("en", "hello-world")
                .slug("id", "halo-dunia")
                .published()
                .build(),
            RecordBuilder::new(2, "post")
                .title("en", "Unfinished")
                .slug("en", "unfinished")
                .build(),
        ]
    }

    fn blog_config() -> CmsConfig {
        let mut config = bilingual_config();
        config.content_models.get_mut("posts").unwrap().slug = Some("blog".into());
        config
    }

    fn page(outcome: Outcome) -> Box<ResolvedPage> {
        match outcome {
            Outcome::Page(page) => page,
            Outcome::Redirect(r) => panic!("unexpected redirect to {}", r.location),
        }
    }

    fn location(outcome: Outcome) -> String {
        match outcome {
            Outcome::Redirect(r) => r.location,
            Outcome::Page(page) => panic!("unexpected page {}", page.view_data.title),
        }
    }

    #[test]
    fn renders_single_with_article_seo() {
        let cms = memory_cms(bilingual_config(), posts());
        let page = page(show(&cms, &get("/id/posts/halo-dunia"), "id", "posts", "halo-dunia").unwrap());
        assert_eq!(page.view_data.title, "Halo Dunia");
        assert_eq!(page.seo.og_type, "article");
        assert_eq!(page.template.name, "templates.singles.default");
        let urls: Vec<&str> = page.seo.alternates.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["/en/posts/hello-world", "/id/posts/halo-dunia"]);
    }

    #[test]
    fn static_type_redirects_to_static_page_route() {
        let cms = memory_cms(bilingual_config(), posts());
        let outcome = show(&cms, &get("/en/pages/about?x=1"), "en", "pages", "about").unwrap();
        assert_eq!(location(outcome), "/en/about?x=1");
    }

    #[test]
    fn key_addressed_type_redirects_to_slug() {
        let cms = memory_cms(blog_config(), posts());
        let outcome = show(&cms, &get("/en/posts/hello-world"), "en", "posts", "hello-world").unwrap();
        assert_eq!(location(outcome), "/en/blog/hello-world");
    }

    #[test]
    fn localized_slug_redirect() {
        let cms = memory_cms(blog_config(), posts());
        let outcome = show(&cms, &get("/id/blog/hello-world"), "id", "blog", "hello-world").unwrap();
        assert_eq!(location(outcome), "/id/blog/halo-dunia");
    }

    #[test]
    fn drafts_are_not_found() {
        let cms = memory_cms(bilingual_config(), posts());
        assert!(matches!(
            show(&cms, &get("/en/posts/unfinished"), "en", "posts", "unfinished"),
            Err(CmsError::NotFound(_))
        ));
    }

    #[test]
    fn type_without_singles_is_not_found() {
        let mut config = bilingual_config();
        config.content_models.get_mut("posts").unwrap().has_single = false;
        let cms = memory_cms(config, posts());
        assert!(matches!(
            show(&cms, &get("/en/posts/hello-world"), "en", "posts", "hello-world"),
            Err(CmsError::NotFound(_))
        ));
    }

    #[test]
    fn views_counted_for_anonymous_only() {
        let cms = memory_cms(bilingual_config(), posts());
        let first = page(show(&cms, &get("/en/posts/hello-world"), "en", "posts", "hello-world").unwrap());
        let second = page(show(&cms, &get("/en/posts/hello-world"), "en", "posts", "hello-world").unwrap());
        let request = get_authenticated("/en/posts/hello-world");
        let third = page(show(&cms, &request, "en", "posts", "hello-world").unwrap());
        let views = |p: &ResolvedPage| match &p.item {
            PageItem::Record(r) => r.views,
            PageItem::Archive(_) => panic!("not a record"),
        };
        assert_eq!((views(&first), views(&second), views(&third)), (1, 2, 2));
    }

    #[test]
    fn slug_specific_template_preferred() {
        let theme = Theme::from_sources(&[
            ("templates/singles/posts-hello-world.html", "<h1>special {{ item.title }}</h1>"),
            ("templates/singles/posts.html", "<h1>posts</h1>"),
        ])
        .unwrap();
        let store = crate::store::ContentStore::new();
        store.register_model("post");
        for record in posts() {
            store.insert(record).unwrap();
        }
        let cms = Cms::new(
            bilingual_config(),
            std::sync::Arc::new(store),
            std::sync::Arc::new(crate::cache::MemoryCache::new()),
            theme,
        );
        let page = page(show(&cms, &get("/en/posts/hello-world"), "en", "posts", "hello-world").unwrap());
        assert_eq!(page.template.name, "templates.singles.posts-hello-world");
        assert_eq!(cms.render(&page).unwrap(), "<h1>special Hello World</h1>");
    }

    #[test]
    fn page_slug_template_does_not_style_posts() {
        // `singles/hello-world.html` is the static-page name for that slug.
        let theme = Theme::from_sources(&[
            ("templates/singles/hello-world.html", "<h1>page template</h1>"),
        ])
        .unwrap();
        let store = crate::store::ContentStore::new();
        store.register_model("post");
        for record in posts() {
            store.insert(record).unwrap();
        }
        let cms = Cms::new(
            bilingual_config(),
            std::sync::Arc::new(store),
            std::sync::Arc::new(crate::cache::MemoryCache::new()),
            theme,
        );
        let page = page(show(&cms, &get("/en/posts/hello-world"), "en", "posts", "hello-world").unwrap());
        assert_eq!(page.template.namespace, crate::templates::Namespace::Package);
        assert_eq!(page.template.name, "templates.singles.default");
    }
}
