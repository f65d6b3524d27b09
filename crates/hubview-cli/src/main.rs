//! Hubview - browse GitHub users from the terminal.
//!
//! Thin composition root over `hubview-core`: parses arguments, sets up
//! logging, builds a viewer and drives its controllers.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hubview_core::{AppConfig, Environment, GitHubViewer};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "hubview")]
#[command(about = "Browse GitHub users and their repositories")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Environment preset (development, staging, production)
    #[arg(long, env = "HUBVIEW_ENV", global = true)]
    env: Option<Environment>,

    /// GitHub API base URL
    #[arg(long, env = "HUBVIEW_API_BASE_URL", global = true)]
    api_base_url: Option<String>,

    /// Personal access token sent as `Authorization: token ...`
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Page cache database (defaults to the user cache directory)
    #[arg(long, global = true)]
    cache_db: Option<PathBuf>,

    /// Keep cached pages in memory only
    #[arg(long, global = true, conflicts_with = "cache_db")]
    no_cache: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Print state changes as they happen
    #[arg(long, global = true)]
    watch: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List users, one page at a time
    Users {
        /// Number of pages to load
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,
    },

    /// Show a user's profile and repositories
    User {
        /// GitHub login
        login: String,
    },

    /// Manage the page cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum CacheAction {
    /// Remove every cached page
    Clear,
    /// Remove expired pages
    Prune,
}

impl Args {
    fn app_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::for_environment(self.env.unwrap_or_default());

        if let Some(base) = &self.api_base_url {
            config = config.with_api_base_url(base)?;
        }

        Ok(config.with_token(self.token.clone()))
    }

    fn cache_path(&self) -> PathBuf {
        self.cache_db.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("hubview")
                .join("cache.sqlite")
        })
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logs go to stderr so that stdout only carries results.
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let config = args.app_config()?;
    info!(
        "Using {} against {}",
        config.environment,
        config.api_base()
    );

    let mut builder = GitHubViewer::builder(config);
    if !args.no_cache {
        let path = args.cache_path();
        debug!("Page cache at {}", path.display());
        builder = builder.with_sqlite_cache(path);
    }
    let viewer = builder.build().context("Failed to initialize viewer")?;

    let output = commands::Output {
        json: args.json,
        watch: args.watch,
    };

    match args.command {
        Command::Users { pages } => commands::list_users(&viewer, pages, output).await,
        Command::User { login } => commands::show_user(&viewer, &login, output).await,
        Command::Cache { action } => match action {
            CacheAction::Clear => commands::clear_cache(&viewer),
            CacheAction::Prune => commands::prune_cache(&viewer),
        },
    }
}
