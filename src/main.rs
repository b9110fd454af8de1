use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cliptube_server::auth::TokenIssuer;
use cliptube_server::config::{self, AppConfig};
use cliptube_server::media::{HttpMediaStore, InMemoryMediaStore, MediaStore};
use cliptube_server::server::{run_server, state::ServerState};
use cliptube_server::store::{DataStore, SqliteStore};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database file.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long)]
    pub port: Option<u16>,

    /// Base URL of the media host for video/thumbnail/avatar assets.
    /// Without it, assets are kept in process (dev only).
    #[clap(long)]
    pub media_url: Option<String>,

    /// Secret used to sign access and refresh tokens.
    #[clap(long)]
    pub token_secret: Option<String>,
}

impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_path: args.db_path.clone(),
            port: args.port,
            media_url: args.media_url.clone(),
            token_secret: args.token_secret.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  db_path: {:?}", app_config.db_path);
    info!("  port: {}", app_config.port);

    if !app_config.db_path.exists() {
        info!("Creating new database at {:?}", app_config.db_path);
    }
    let store: Arc<dyn DataStore> = Arc::new(SqliteStore::new(&app_config.db_path)?);

    let media: Arc<dyn MediaStore> = match &app_config.media_url {
        Some(url) => {
            info!("Using media host at {}", url);
            Arc::new(HttpMediaStore::new(url))
        }
        None => {
            warn!("No media host configured, uploaded assets will not survive a restart");
            Arc::new(InMemoryMediaStore::new())
        }
    };

    let tokens = TokenIssuer::new(
        &app_config.token_secret,
        app_config.access_ttl_minutes,
        app_config.refresh_ttl_days,
    );

    let state = ServerState::new(store, media, tokens);
    run_server(state, app_config.port).await
}
