use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, warn};

use jarvault::cache::Cache;
use jarvault::config::AppConfig;
use jarvault::java::JavaResolver;
use jarvault::providers::ProviderRegistry;
use jarvault::service::{BuildFilter, BuildSelector, JarsService, SearchOptions, VersionFilter};

mod logging;

#[derive(Parser)]
#[command(name = "jarvault")]
#[command(version, about = "Minecraft server and proxy jar metadata from every upstream")]
struct Cli {
    /// Drop cached lists touched by the command before answering
    #[arg(long, global = true)]
    refresh: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Write logs to a rolling file in the data directory instead of stderr
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every category
    Categories,
    /// Describe one category
    Category { id: String },
    /// List versions of a category, newest first
    Versions {
        category: String,
        /// Filter as key=value (type, stable, supported, java, after, before, min_year, max_year)
        #[arg(short, long = "filter", value_parser = parse_key_value)]
        filters: Vec<(String, String)>,
    },
    /// List builds of a version, highest number first
    Builds {
        category: String,
        /// Version id or `latest`
        version: String,
        /// Filter as key=value (stable, channel, after, before, min_year, max_year)
        #[arg(short, long = "filter", value_parser = parse_key_value)]
        filters: Vec<(String, String)>,
    },
    /// Show one build
    Build {
        category: String,
        version: String,
        /// Build number or `latest`
        build: String,
    },
    /// Show where a build's jar is downloaded from
    Download {
        category: String,
        version: String,
        build: String,
    },
    /// Show the newest stable version of a category
    Latest { category: String },
    /// Search versions across categories
    Search {
        #[arg(short, long)]
        query: Option<String>,
        #[arg(short, long = "filter", value_parser = parse_key_value)]
        filters: Vec<(String, String)>,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| format!("expected key=value, got `{}`", raw))
}

fn pairs(filters: &[(String, String)]) -> impl Iterator<Item = (&str, &str)> {
    filters.iter().map(|(k, v)| (k.as_str(), v.as_str()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init(cli.json_logs, cli.log_file)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    debug!("Configuration: {:?}", config);

    let cache = Cache::connect(&config.cache).await;
    let registry = ProviderRegistry::new(&config.providers)?;
    let java = Arc::new(JavaResolver::load(&config.java_config_path));
    let service = JarsService::new(registry, cache, java);

    if cli.refresh {
        refresh(&service, &cli.command).await?;
    }

    let result = execute(&service, cli.command).await;

    if let Err(e) = service.cache().close().await {
        warn!("Failed to close cache: {}", e);
    }
    result
}

async fn execute(service: &JarsService, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Categories => print_json(&service.categories()),
        Command::Category { id } => print_json(&service.category(&id)?),
        Command::Versions { category, filters } => {
            let filter = VersionFilter::from_pairs(pairs(&filters))?;
            print_json(&service.versions_filtered(&category, &filter).await?)
        }
        Command::Builds {
            category,
            version,
            filters,
        } => {
            let filter = BuildFilter::from_pairs(pairs(&filters))?;
            print_json(&service.builds_filtered(&category, &version, &filter).await?)
        }
        Command::Build {
            category,
            version,
            build,
        } => {
            let selector = BuildSelector::parse(&build)?;
            print_json(&service.build(&category, &version, selector).await?)
        }
        Command::Download {
            category,
            version,
            build,
        } => {
            let selector = BuildSelector::parse(&build)?;
            let download = service.download(&category, &version, selector).await?;
            println!("{}", download.file_name);
            println!("{}", download.upstream_url);
            if let Some(sha256) = download.sha256 {
                println!("sha256 {}", sha256);
            }
            Ok(())
        }
        Command::Latest { category } => print_json(&service.latest_version(&category).await?),
        Command::Search { query, filters } => {
            let query = query.map(|q| ("q".to_string(), q));
            let filters: Vec<(String, String)> = query.into_iter().chain(filters).collect();
            let options = SearchOptions::from_pairs(pairs(&filters))?;
            print_json(&service.search(&options).await)
        }
    }
}

async fn refresh(service: &JarsService, command: &Command) -> anyhow::Result<()> {
    match command {
        Command::Categories | Command::Category { .. } => {}
        Command::Versions { category, .. } | Command::Latest { category } => {
            service.invalidate(category, None).await?;
        }
        Command::Builds {
            category, version, ..
        }
        | Command::Build {
            category, version, ..
        }
        | Command::Download {
            category, version, ..
        } => {
            service.invalidate(category, None).await?;
            let version = service.resolve_version(category, version).await?;
            service.invalidate(category, Some(&version)).await?;
        }
        Command::Search { .. } => {
            for info in service.categories() {
                service.invalidate(info.id.as_str(), None).await?;
            }
        }
    }
    Ok(())
}
