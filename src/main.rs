use clap::{Parser, Subcommand};
use lingua_cms::cache::{CacheStore, FileCache, hash_config};
use lingua_cms::cms::Cms;
use lingua_cms::router::{self, CmsRequest};
use lingua_cms::store::ContentStore;
use lingua_cms::{config, output, server};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lingua-cms")]
#[command(about = "Multi-language content router: slugs to records, records to templates")]
#[command(long_about = "\
Multi-language content router: slugs to records, records to templates

The site directory is the data source. Every content type declared in
cms.toml reads its records from content/<model>/, one TOML file per record.

Site structure:

  site/
  ├── cms.toml                     # Site config (optional, merged over defaults)
  ├── content/
  │   ├── page/                    # Static pages (/{lang}/{slug})
  │   │   ├── 001-home.toml        # Front page (slug = front_page_slug)
  │   │   └── 002-about.toml
  │   ├── post/                    # Posts (/{lang}/posts/{slug}, archive /{lang}/posts)
  │   └── category/                # Taxonomy terms (/{lang}/categories/{slug})
  └── theme/
      └── templates/
          ├── page.html            # Overrides the built-in templates.page
          └── singles/about.html   # Used for the page whose slug is \"about\"

Template resolution (first existing wins, theme before built-ins):
  Static page: record template → singles.{slug} → page → singles.default
  Single:      record template → singles.{type}-{slug} → singles.{type} → singles.default
  Archive:     archive_view → archives.{type} → archives.default
  Taxonomy:    term template → taxonomies.{type}-{slug} → taxonomies.{type}
               → taxonomies.default → archives.default

Run 'lingua-cms gen-config' to generate a documented cms.toml.")]
#[command(version)]
struct Cli {
    /// Site directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the site over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
        /// Seconds between scheduled-publish sweeps
        #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
        publish_every: u64,
    },
    /// Resolve one request path and print the response
    Render {
        /// Request path, optionally with a query string (e.g. /en/blog?page=2)
        path: String,
        /// Request drafts too (implies --authenticated)
        #[arg(long)]
        preview: bool,
        /// Treat the request as coming from an authenticated user
        #[arg(long)]
        authenticated: bool,
    },
    /// Validate the site and list its content types and templates
    Check,
    /// Drop the cached slug and content-type maps
    CacheClear,
    /// Publish scheduled records whose publication time has passed
    PublishScheduled,
    /// Print a stock cms.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Serve {
            addr,
            publish_every,
        } => {
            let cms = Arc::new(Cms::open(&cli.root)?);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(
                cms,
                addr,
                Duration::from_secs(publish_every),
            ))?;
        }
        Command::Render {
            path,
            preview,
            authenticated,
        } => {
            let cms = Cms::open_in_memory(&cli.root)?;
            let target = if preview {
                with_preview(&path)
            } else {
                path
            };
            let request = CmsRequest::parse(&target, authenticated || preview);
            let response = router::respond(&cms, &request);
            if let Some(location) = &response.location {
                println!("{} → {}", response.status, location);
            } else {
                print!("{}", response.body);
            }
            if response.status >= 400 {
                return Err(format!("{} responded {}", request.path, response.status).into());
            }
        }
        Command::Check => {
            println!("==> Checking {}", cli.root.display());
            let cms = Cms::open(&cli.root)?;
            output::print_check_output(&cms)?;
            println!("==> Site is valid");
        }
        Command::CacheClear => {
            let config = config::load_config(&cli.root)?;
            let path = cli.root.join(&config.cache.path);
            FileCache::open(&path, &hash_config(&config)).flush();
            output::print_cache_clear_output(&path);
        }
        Command::PublishScheduled => {
            let config = config::load_config(&cli.root)?;
            let store = ContentStore::load(&cli.root, &config.content_types())?;
            let changed = store.publish_due(chrono::Utc::now())?;
            output::print_publish_output(&changed, &config.default_language);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr, `info` unless `RUST_LOG` says otherwise.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn with_preview(path: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}preview=true")
}
