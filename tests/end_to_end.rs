//! Whole-site tests over `fixtures/site/`.
//!
//! Each test copies the fixture site into a temp directory, opens it the
//! way the binary does, and drives requests through the router.
//!
//! Run with: cargo test --test end_to_end

use lingua_cms::cms::Cms;
use lingua_cms::repository::ContentRepository;
use lingua_cms::router::{CmsRequest, Response, respond};
use lingua_cms::store::ContentStore;
use lingua_cms::{config, output};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn copy_dir_recursive(src: &Path, dst: &Path) {
    for entry in fs::read_dir(src).unwrap() {
        let entry = entry.unwrap();
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            fs::create_dir_all(&dst_path).unwrap();
            copy_dir_recursive(&src_path, &dst_path);
        } else {
            fs::copy(&src_path, &dst_path).unwrap();
        }
    }
}

fn site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path());
    tmp
}

fn get(cms: &Cms, target: &str) -> Response {
    respond(cms, &CmsRequest::parse(target, false))
}

fn get_authenticated(cms: &Cms, target: &str) -> Response {
    respond(cms, &CmsRequest::parse(target, true))
}

fn body(response: &Response) -> &str {
    assert_eq!(
        response.status, 200,
        "expected 200, got {}: {}",
        response.status, response.body
    );
    &response.body
}

fn location(response: &Response, status: u16) -> &str {
    assert_eq!(response.status, status, "unexpected status: {}", response.body);
    response.location.as_deref().unwrap()
}

// =========================================================================
// Routing
// =========================================================================

#[test]
fn root_redirects_to_default_language() {
    let tmp = site();
    let cms = Cms::open(tmp.path()).unwrap();
    assert_eq!(location(&get(&cms, "/"), 302), "/en/");
}

#[test]
fn unknown_language_is_not_found() {
    let tmp = site();
    let cms = Cms::open(tmp.path()).unwrap();
    let response = get(&cms, "/fr/");
    assert_eq!(response.status, 404);
    assert!(response.body.contains("Not found"));
}

// =========================================================================
// Home and static pages
// =========================================================================

#[test]
fn home_renders_front_page_per_language() {
    let tmp = site();
    let cms = Cms::open(tmp.path()).unwrap();

    let en = get(&cms, "/en/");
    let html = body(&en);
    assert!(html.contains("<h1>Home</h1>"));
    assert!(html.contains("Welcome to the <strong>test</strong> site."));
    assert!(html.contains(r#"<link rel="canonical" href="https://example.test/en/">"#));
    assert!(html.contains(r#"hreflang="id" href="https://example.test/id/""#));

    let id = get(&cms, "/id/");
    assert!(body(&id).contains("<h1>Beranda</h1>"));
}

#[test]
fn front_page_slug_redirects_home() {
    let tmp = site();
    let cms = Cms::open(tmp.path()).unwrap();
    assert_eq!(location(&get(&cms, "/en/home"), 301), "/en/");
    assert_eq!(location(&get(&cms, "/id/beranda"), 301), "/id/");
}

#[test]
fn theme_template_overrides_builtin() {
    let tmp = site();
    let cms = Cms::open(tmp.path()).unwrap();
    let response = get(&cms, "/en/about");
    let html = body(&response);
    assert!(html.contains(r#"<main class="custom-about">"#));
    assert!(html.contains("<h1>About</h1>"));
    assert!(html.contains("page-about"));
}

#[test]
fn translated_slug_uses_builtin_template() {
    let tmp = site();
    let cms = Cms::open(tmp.path()).unwrap();
    let response = get(&cms, "/id/tentang");
    let html = body(&response);
    assert!(html.contains("<h1>Tentang</h1>"));
    assert!(!html.contains("custom-about"));
}

#[test]
fn default_slug_in_other_language_redirects() {
    let tmp = site();
    let cms = Cms::open(tmp.path()).unwrap();
    assert_eq!(
        location(&get(&cms, "/id/about?utm=x"), 301),
        "/id/tentang?utm=x"
    );
}

#[test]
fn untranslated_page_falls_back_to_default_language() {
    let tmp = site();
    let cms = Cms::open(tmp.path()).unwrap();
    let response = get(&cms, "/id/contact");
    assert!(body(&response).contains("<h1>Contact</h1>"));
}

#[test]
fn blank_translation_is_not_a_slug() {
    let tmp = site();
    let cms = Cms::open(tmp.path()).unwrap();
    // contact carries `id = ""` for both title and slug.
    let response = get(&cms, "/id/contact");
    assert_eq!(response.location, None);
    let html = body(&response);
    assert!(html.contains("<h1>Contact</h1>"));
    assert!(html.contains(r#"href="https://example.test/id/contact""#));
}

#[test]
fn non_ascii_slugs_are_percent_encoded() {
    let tmp = site();
    let cms = Cms::open(tmp.path()).unwrap();
    assert!(body(&get(&cms, "/en/caf%C3%A9")).contains("<h1>Our Café</h1>"));
    assert!(body(&get(&cms, "/id/kaf%C3%A9-kita")).contains("<h1>Kafé Kita</h1>"));
    assert_eq!(
        location(&get(&cms, "/id/caf%C3%A9"), 301),
        "/id/kaf%C3%A9-kita"
    );
}

#[test]
fn draft_page_needs_authenticated_preview() {
    let tmp = site();
    let cms = Cms::open(tmp.path()).unwrap();
    assert_eq!(get(&cms, "/en/secret").status, 404);
    assert_eq!(get(&cms, "/en/secret?preview=true").status, 404);
    assert_eq!(get_authenticated(&cms, "/en/secret").status, 404);

    let response = get_authenticated(&cms, "/en/secret?preview=true");
    let html = body(&response);
    assert!(html.contains("<h1>Secret</h1>"));
    assert!(html.contains("preview-banner"));
}

#[test]
fn static_miss_serves_post() {
    let tmp = site();
    let cms = Cms::open(tmp.path()).unwrap();
    let response = get(&cms, "/id/halo-dunia");
    let html = body(&response);
    assert!(html.contains("<h1>Halo Dunia</h1>"));
    assert!(html.contains(r#"href="https://example.test/id/blog/halo-dunia""#));
}

// =========================================================================
// Posts
// =========================================================================

#[test]
fn archive_lists_published_posts_newest_first() {
    let tmp = site();
    let cms = Cms::open(tmp.path()).unwrap();
    let response = get(&cms, "/en/blog");
    let html = body(&response);
    // Backing page supplies the archive title
    assert!(html.contains("<h1>Journal</h1>"));
    let second = html.find("Second Post").unwrap();
    let first = html.find("Hello World").unwrap();
    assert!(second < first);
    assert!(html.contains(r#"href="/en/blog/hello-world""#));
    assert!(!html.contains("Upcoming"));
    assert!(!html.contains("Overdue"));
}

#[test]
fn archive_by_key_redirects_to_slug() {
    let tmp = site();
    let cms = Cms::open(tmp.path()).unwrap();
    assert_eq!(location(&get(&cms, "/en/posts?page=2"), 301), "/en/blog?page=2");
}

#[test]
fn single_post_and_its_redirects() {
    let tmp = site();
    let cms = Cms::open(tmp.path()).unwrap();
    let response = get(&cms, "/en/blog/hello-world");
    let html = body(&response);
    assert!(html.contains("<h1>Hello World</h1>"));
    assert!(html.contains(r#"content="article""#));

    assert_eq!(
        location(&get(&cms, "/en/posts/hello-world"), 301),
        "/en/blog/hello-world"
    );
    assert_eq!(
        location(&get(&cms, "/id/blog/hello-world"), 301),
        "/id/blog/halo-dunia"
    );
    assert_eq!(get(&cms, "/en/blog/upcoming").status, 404);
}

#[test]
fn views_count_anonymous_requests() {
    let tmp = site();
    let cms = Cms::open(tmp.path()).unwrap();
    get(&cms, "/en/blog/hello-world");
    get(&cms, "/en/blog/hello-world");
    get_authenticated(&cms, "/en/blog/hello-world");
    let posts = cms.content_type("posts").unwrap();
    let record = cms
        .locator()
        .find_content(&posts.model, "en", "hello-world", lingua_cms::locator::Visibility::Published)
        .unwrap()
        .unwrap();
    assert_eq!(record.views, 2);
}

// =========================================================================
// Taxonomies
// =========================================================================

#[test]
fn taxonomy_lists_filed_posts() {
    let tmp = site();
    let cms = Cms::open(tmp.path()).unwrap();
    let response = get(&cms, "/en/categories/news");
    let html = body(&response);
    assert!(html.contains("<h1>News</h1>"));
    assert!(html.contains("Hello World"));
    assert!(html.contains("Second Post"));
    assert!(html.contains("taxonomy-categories"));

    assert_eq!(
        location(&get(&cms, "/id/categories/news"), 301),
        "/id/categories/berita"
    );
}

#[test]
fn missing_taxonomy_model_is_not_found() {
    let tmp = site();
    let cms = Cms::open(tmp.path()).unwrap();
    // No content/tag directory in the fixture.
    assert_eq!(get(&cms, "/en/tags/rust").status, 404);
}

// =========================================================================
// Maintenance
// =========================================================================

#[test]
fn publish_sweep_makes_overdue_posts_visible() {
    let tmp = site();
    let config = config::load_config(tmp.path()).unwrap();
    let store = ContentStore::load(tmp.path(), &config.content_types()).unwrap();
    let changed = store.publish_due(chrono::Utc::now()).unwrap();
    let ids: Vec<u64> = changed.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![4]);
    assert_eq!(
        output::format_publish_output(&changed, "en"),
        vec!["post #4 Overdue", "Published 1 scheduled record"]
    );

    // Written back, so a fresh process sees it.
    let cms = Cms::open(tmp.path()).unwrap();
    assert!(body(&get(&cms, "/en/blog")).contains("Overdue"));
    assert!(cms.repository().has_model("post"));

    // Running again changes nothing.
    let again = ContentStore::load(tmp.path(), &config.content_types()).unwrap();
    assert!(again.publish_due(chrono::Utc::now()).unwrap().is_empty());
}

#[test]
fn config_change_invalidates_file_cache() {
    let tmp = site();
    let cms = Cms::open(tmp.path()).unwrap();
    assert_eq!(cms.index().original_content_type_key("blog"), "posts");
    let cache_path = tmp.path().join(&cms.config().cache.path);
    assert!(cache_path.exists());
    drop(cms);

    let cms_toml = tmp.path().join(config::CONFIG_FILENAME);
    let edited = fs::read_to_string(&cms_toml)
        .unwrap()
        .replace(r#"slug = "blog""#, r#"slug = "journal""#);
    fs::write(&cms_toml, edited).unwrap();

    let cms = Cms::open(tmp.path()).unwrap();
    assert_eq!(cms.index().original_content_type_key("journal"), "posts");
    assert_eq!(cms.index().original_content_type_key("blog"), "blog");
    assert!(body(&get(&cms, "/en/journal")).contains("Hello World"));
}

#[test]
fn check_output_describes_fixture() {
    let tmp = site();
    let cms = Cms::open(tmp.path()).unwrap();
    let lines = output::format_check_output(&cms).unwrap();
    assert_eq!(lines[0], "Lingua Test");
    assert!(lines.iter().any(|l| l == "003 posts → /{lang}/blog"));
}
