use anyhow::{Context, Result};
use clap::Parser;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use codehn::feed::{FeedKind, Story};
use codehn::{Config, Engine};

/// Get the config file path (~/.config/codehn/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("codehn")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "codehn",
    about = "Hacker News stories that link to GitHub or GitLab"
)]
struct Args {
    /// Feeds to show: top, new, show or best
    #[arg(value_name = "FEED", default_value = "top")]
    feeds: Vec<String>,

    /// Config file (defaults to ~/.config/codehn/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print pages as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Show at most N stories per feed
    #[arg(long, value_name = "N")]
    limit: Option<usize>,
}

fn render_text(kind: FeedKind, stories: &[Story]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ({} stories)", kind, stories.len());
    for (rank, story) in stories.iter().enumerate() {
        let item = &story.item;
        let _ = writeln!(out, "{:>3}. {} ({})", rank + 1, item.title, story.display_host);
        let _ = writeln!(
            out,
            "     {} points by {} {} | {} comments",
            item.score, item.by, story.age, item.descendants
        );
        let _ = writeln!(out, "     {}", item.url);
    }
    out
}

async fn load_page(engine: &Engine, tag: &str) -> Result<(FeedKind, Arc<[Story]>)> {
    let kind = FeedKind::resolve(tag);
    let page = engine
        .get_page(tag)
        .await
        .with_context(|| format!("could not get {} stories", kind))?;
    Ok((kind, page))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let engine = Engine::from_config(&config).context("Failed to create engine")?;
    let _sweeper = engine.start_sweeper();

    let mut pages = serde_json::Map::new();
    for tag in &args.feeds {
        let (kind, page) = load_page(&engine, tag).await?;
        let shown = &page[..args.limit.unwrap_or(page.len()).min(page.len())];

        if args.json {
            pages.insert(
                kind.to_string(),
                serde_json::to_value(shown).context("Failed to encode page")?,
            );
        } else {
            print!("{}", render_text(kind, shown));
        }
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&pages).context("Failed to encode pages")?
        );
    }

    Ok(())
}
