use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

use rssfetch::config::Config;
use rssfetch::{ConditionalFetchClient, EtagCache, Feed};

/// Get the default config file path (~/.config/rssfetch/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("rssfetch")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "rssfetch",
    version,
    about = "Fetch RSS feeds and update notices with conditional HTTP"
)]
struct Args {
    /// Config file (default: ~/.config/rssfetch/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one or more RSS 1.0 / 2.0 feeds and print their items
    Feed {
        #[arg(required = true)]
        urls: Vec<Url>,

        /// Print the normalized feeds as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch the update notice for a version
    Update {
        url: Url,

        /// Version to look up (sent as `ver`)
        #[arg(long, value_name = "VERSION")]
        current: String,

        /// Extra query parameter, repeatable
        #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },

    /// Fetch a JSON document and pretty-print it
    Json { url: Url },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let etags = Arc::new(EtagCache::new(config.http.etag_cache_capacity));
    let client = ConditionalFetchClient::with_cache(config.fetch_options(), etags)
        .context("Failed to build HTTP client")?;

    match args.command {
        Command::Feed { urls, json } => run_feed(&client, &urls, json).await,
        Command::Update {
            url,
            current,
            params,
        } => run_update(&client, &url, &current, &params).await,
        Command::Json { url } => run_json(&client, &url).await,
    }
}

async fn run_feed(client: &ConditionalFetchClient, urls: &[Url], json: bool) -> Result<()> {
    // Distinct resources, polled concurrently through one client
    let results = futures::future::join_all(urls.iter().map(|url| client.fetch_feed(url))).await;

    let mut failures = 0usize;
    for (url, result) in urls.iter().zip(results) {
        match result {
            Ok(Some(feed)) if json => {
                println!("{}", serde_json::to_string_pretty(&feed)?);
            }
            Ok(Some(feed)) => print_feed(&feed),
            Ok(None) => println!("{url}: nothing to show (not modified, unavailable, or not a feed)"),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Feed fetch failed");
                eprintln!("{url}: {e}");
                failures += 1;
            }
        }
    }

    if failures == urls.len() {
        anyhow::bail!("All {} feed fetches failed", failures);
    }
    Ok(())
}

fn print_feed(feed: &Feed) {
    println!("{} [{:?}]", feed.title, feed.format);
    if let Some(link) = &feed.link {
        println!("  {link}");
    }
    for item in &feed.items {
        let when = item
            .publish_time
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "----------------".to_string());
        println!("  {when}  {}", item.display_title());
    }
    println!("  {} items", feed.items.len());
}

async fn run_update(
    client: &ConditionalFetchClient,
    url: &Url,
    current: &str,
    params: &[(String, String)],
) -> Result<()> {
    match client
        .fetch_update_message(url, current, params)
        .await
        .context("Failed to fetch update notice")?
    {
        Some(message) => println!("{message}"),
        None => println!("No update notice for {current}"),
    }
    Ok(())
}

async fn run_json(client: &ConditionalFetchClient, url: &Url) -> Result<()> {
    match client
        .get_json::<serde_json::Value>(url)
        .await
        .context("Failed to fetch JSON")?
    {
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => println!("{url}: nothing to show"),
    }
    Ok(())
}
