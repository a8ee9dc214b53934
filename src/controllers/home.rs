//! `/{lang}/`: the front page.
//!
//! The front page is the static page whose default-locale slug is
//! `front_page_slug`. A site without one falls back to its earliest-created
//! published static page.

use crate::cms::{Cms, CmsError};
use crate::config::ContentTypeConfig;
use crate::naming;
use crate::record::ContentRecord;
use crate::repository::{Order, RecordQuery};
use crate::router::{CmsRequest, Route};
use crate::templates::Candidates;
use crate::view::{PageItem, PageKind};

use super::{Outcome, PageDraft, alternates, finish, record_view, slug_for};

pub fn show(cms: &Cms, request: &CmsRequest, lang: &str) -> Result<Outcome, CmsError> {
    let pages = cms.static_type()?;
    cms.require_model(&pages)?;
    let config = cms.config();

    let front = cms.locator().find_content(
        &pages.model,
        &config.default_language,
        &config.front_page_slug,
        cms.visibility(request),
    )?;
    let record = match front {
        Some(record) => record,
        None => earliest_static_page(cms, &pages)?,
    };

    let slug = slug_for(cms, &record, lang);
    let mut candidates = Candidates::new()
        .push_override(record.template.as_deref())
        .push("templates.home");
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
            kind: PageKind::Home,
            lang,
            content_type: &pages,
            slug,
            candidates,
            item: PageItem::Record(record_view(cms, &pages, &record, lang)),
            listing: None,
            canonical: Route::Home {
                lang: lang.to_string(),
            },
            alternates: alternates(cms, lang, |l| Route::Home {
                lang: l.to_string(),
            }),
        },
    )
}

fn earliest_static_page(cms: &Cms, pages: &ContentTypeConfig) -> Result<ContentRecord, CmsError> {
    let query = RecordQuery::model(&pages.model)
        .published()
        .order(Order::CreatedAsc);
    let record = cms.repository().first(&query)?.ok_or_else(|| {
        CmsError::NotFound("no published page to serve as the front page".to_string())
    })?;
    tracing::debug!(id = record.id, "front page missing, using earliest page");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::Namespace;
    use crate::test_helpers::*;
    use chrono::Duration;

    fn page(outcome: Outcome) -> Box<crate::view::ResolvedPage> {
        match outcome {
            Outcome::Page(page) => page,
            Outcome::Redirect(r) => panic!("unexpected redirect to {}", r.location),
        }
    }

    #[test]
    fn renders_front_page() {
        let home = RecordBuilder::new(1, "page")
            .title("en", "Home")
            .slug("en", "home")
            .published()
            .build();
        let cms = memory_cms(bilingual_config(), vec![home]);
        let page = page(show(&cms, &get("/en/"), "en").unwrap());
        assert_eq!(page.view_data.title, "Home");
        assert_eq!(page.template.namespace, Namespace::Package);
        assert_eq!(page.template.name, "templates.home");
        assert!(page.body_classes.contains("home-pages"));
        assert!(page.body_classes.contains("home-home"));
    }

    #[test]
    fn front_page_in_other_locale_uses_translation() {
        let home = RecordBuilder::new(1, "page")
            .title("en", "Home")
            .title("id", "Beranda")
            .slug("en", "home")
            .slug("id", "beranda")
            .published()
            .build();
        let cms = memory_cms(bilingual_config(), vec![home]);
        let page = page(show(&cms, &get("/id/"), "id").unwrap());
        assert_eq!(page.view_data.title, "Beranda");
        assert_eq!(page.seo.canonical, "/id/");
        assert_eq!(page.seo.alternates.len(), 2);
    }

    #[test]
    fn falls_back_to_earliest_published_page() {
        let later = RecordBuilder::new(1, "page")
            .title("en", "Later")
            .slug("en", "later")
            .created_at(epoch() + Duration::days(3))
            .published()
            .build();
        let earlier = RecordBuilder::new(2, "page")
            .title("en", "Earlier")
            .slug("en", "earlier")
            .created_at(epoch() + Duration::days(1))
            .published()
            .build();
        let earliest_draft = RecordBuilder::new(3, "page")
            .slug("en", "draft")
            .created_at(epoch())
            .build();
        let cms = memory_cms(bilingual_config(), vec![later, earlier, earliest_draft]);
        let page = page(show(&cms, &get("/en/"), "en").unwrap());
        assert_eq!(page.view_data.title, "Earlier");
    }

    #[test]
    fn no_pages_is_not_found() {
        let cms = memory_cms(bilingual_config(), vec![]);
        assert!(matches!(
            show(&cms, &get("/en/"), "en"),
            Err(CmsError::NotFound(_))
        ));
    }

    #[test]
    fn record_template_override_wins() {
        let home = RecordBuilder::new(1, "page")
            .title("en", "Home")
            .slug("en", "home")
            .template("page")
            .published()
            .build();
        let cms = memory_cms(bilingual_config(), vec![home]);
        let page = page(show(&cms, &get("/en/"), "en").unwrap());
        assert_eq!(page.template.name, "templates.page");
    }
}
