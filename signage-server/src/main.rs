//! signage-server: descriptor delivery for digital-signage players.
//!
//! Players poll `GET /smil/<player_id>` and receive a SMIL descriptor
//! assembled from their stored configuration, the shared template and
//! their playlist. The same builds are available offline through the
//! `render` and `render-all` subcommands.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::{error, info};
use signage_descriptor::schedule;

mod logging;
mod render;
mod store;
mod web;

use store::Store;
use web::state::WebState;

const DEFAULT_CONFIG_FILE: &str = "signage-server.toml";
const DEFAULT_LISTEN: &str = "0.0.0.0:8080";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_RETENTION_DAYS: u64 = 7;
const DEFAULT_LOCALE: &str = "en";

/// signage-server - SMIL descriptor server for digital-signage players
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short = 'f', long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the template, players, playlists and locales
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory where log files are stored
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Number of days to keep log files
    #[arg(long, global = true)]
    log_retention_days: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve descriptors over HTTP.
    Serve {
        /// Address to listen on
        #[arg(short, long)]
        listen: Option<SocketAddr>,

        /// Pin the build date (YYYY-MM-DD) instead of using today
        #[arg(long)]
        now: Option<String>,
    },
    /// Build one player's descriptor and print it to stdout.
    Render {
        /// Player identifier
        #[arg(short, long)]
        player: String,

        /// Build date (YYYY-MM-DD), today if omitted
        #[arg(long)]
        now: Option<String>,
    },
    /// Build every player's descriptor into a directory.
    RenderAll {
        /// Output directory; files are named `<player_id>.smil`
        #[arg(short, long)]
        out: PathBuf,

        /// Build date (YYYY-MM-DD), today if omitted
        #[arg(long)]
        now: Option<String>,
    },
}

/// Configuration file format.
#[derive(Debug, serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    store: StoreSection,
    #[serde(default)]
    logging: LoggingSection,
    #[serde(default)]
    descriptor: DescriptorSection,
}

#[derive(Debug, serde::Deserialize, Default)]
struct ServerSection {
    listen: Option<String>,
}

#[derive(Debug, serde::Deserialize, Default)]
struct StoreSection {
    data_dir: Option<String>,
}

#[derive(Debug, serde::Deserialize, Default)]
struct LoggingSection {
    log_dir: Option<String>,
    retention_days: Option<u64>,
    level: Option<String>,
}

#[derive(Debug, serde::Deserialize, Default)]
struct DescriptorSection {
    default_locale: Option<String>,
}

fn load_config(path: &Path) -> Result<ConfigFile, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let config: ConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Effective settings: command line, then config file, then defaults.
#[derive(Debug)]
struct Settings {
    data_dir: PathBuf,
    log_dir: PathBuf,
    log_retention_days: u64,
    log_level: Option<String>,
    default_locale: String,
    listen: SocketAddr,
}

impl Settings {
    fn resolve(cli: &Cli, file: ConfigFile) -> Result<Self, Box<dyn std::error::Error>> {
        let listen_override = match &cli.command {
            Commands::Serve { listen, .. } => *listen,
            _ => None,
        };
        let listen = match listen_override {
            Some(addr) => addr,
            None => file
                .server
                .listen
                .as_deref()
                .unwrap_or(DEFAULT_LISTEN)
                .parse()
                .map_err(|e| format!("Invalid listen address: {}", e))?,
        };

        Ok(Self {
            data_dir: cli
                .data_dir
                .clone()
                .or_else(|| file.store.data_dir.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            log_dir: cli
                .log_dir
                .clone()
                .or_else(|| file.logging.log_dir.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            log_retention_days: cli
                .log_retention_days
                .or(file.logging.retention_days)
                .unwrap_or(DEFAULT_RETENTION_DAYS),
            log_level: file.logging.level,
            default_locale: file
                .descriptor
                .default_locale
                .unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            listen,
        })
    }
}

fn build_date(now: Option<&str>) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    match now {
        Some(value) => Ok(schedule::parse_now(value)?),
        None => Ok(render::today()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load config file: explicit path > auto-detect > default
    let config_path = cli.config.clone().or_else(|| {
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Some(default_path)
        } else {
            None
        }
    });
    let file_config = if let Some(config_path) = &config_path {
        match load_config(config_path) {
            Ok(c) => {
                eprintln!("Loaded config from: {}", config_path.display());
                c
            }
            Err(e) => {
                eprintln!("Failed to load config file: {}", e);
                return Err(e);
            }
        }
    } else {
        ConfigFile::default()
    };

    let settings = Settings::resolve(&cli, file_config)?;

    logging::init_logging(
        &settings.log_dir,
        settings.log_retention_days,
        cli.verbose,
        settings.log_level.as_deref(),
    )?;

    info!("Opening data directory: {:?}", settings.data_dir);
    let store = match Store::open(&settings.data_dir).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Failed to open data directory: {}", e);
            return Err(e.into());
        }
    };

    match cli.command {
        Commands::Serve { now, .. } => {
            let web_state = WebState::new(Arc::clone(&store), settings.default_locale.clone());
            if let Some(value) = now.as_deref() {
                let pinned = schedule::parse_now(value)?;
                info!("  Build date pinned to {}", pinned);
                *web_state.build_date.write().await = Some(pinned);
            }

            info!("signage-server starting...");
            info!("  Listen address: {}", settings.listen);
            info!("  Data directory: {:?}", settings.data_dir);
            info!("  Default locale: {}", settings.default_locale);
            info!("  Players: {}", store.player_ids().await?.len());

            web::start_web_server(settings.listen, Arc::new(web_state)).await?;
        }
        Commands::Render { player, now } => {
            let now = build_date(now.as_deref())?;
            let descriptor = render::render_player(&store, &player, now).await?;
            print!("{}", descriptor.text);
        }
        Commands::RenderAll { out, now } => {
            let now = build_date(now.as_deref())?;
            tokio::fs::create_dir_all(&out).await?;

            let results = render::render_all(Arc::clone(&store), now).await?;
            let total = results.len();
            let mut failed = 0usize;
            for (player_id, result) in results {
                match result {
                    Ok(descriptor) => {
                        let path = out.join(format!("{}.smil", player_id));
                        tokio::fs::write(&path, descriptor.text.as_bytes()).await?;
                        info!("Wrote {:?}", path);
                    }
                    Err(e) => {
                        error!("Player {}: {}", player_id, e);
                        failed += 1;
                    }
                }
            }

            info!("Rendered {} of {} player(s)", total - failed, total);
            if failed > 0 {
                return Err(format!("{} descriptor(s) failed to build", failed).into());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_config_file() {
        let cli = Cli::try_parse_from(["signage-server", "serve"]).unwrap();
        let settings = Settings::resolve(&cli, ConfigFile::default()).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(settings.log_dir, PathBuf::from(DEFAULT_LOG_DIR));
        assert_eq!(settings.log_retention_days, DEFAULT_RETENTION_DAYS);
        assert_eq!(settings.default_locale, "en");
        assert_eq!(settings.listen, DEFAULT_LISTEN.parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_command_line_overrides_config_file() {
        let file: ConfigFile = toml::from_str(
            r#"
[server]
listen = "127.0.0.1:9000"

[store]
data_dir = "/srv/signage"

[logging]
log_dir = "/var/log/signage"
retention_days = 30
level = "warn"

[descriptor]
default_locale = "de"
"#,
        )
        .unwrap();
        let cli = Cli::try_parse_from([
            "signage-server",
            "serve",
            "--listen",
            "127.0.0.1:9100",
            "--log-retention-days",
            "3",
        ])
        .unwrap();

        let settings = Settings::resolve(&cli, file).unwrap();
        assert_eq!(settings.listen, "127.0.0.1:9100".parse::<SocketAddr>().unwrap());
        assert_eq!(settings.log_retention_days, 3);
        assert_eq!(settings.data_dir, PathBuf::from("/srv/signage"));
        assert_eq!(settings.log_dir, PathBuf::from("/var/log/signage"));
        assert_eq!(settings.log_level.as_deref(), Some("warn"));
        assert_eq!(settings.default_locale, "de");
    }

    #[test]
    fn test_invalid_listen_address_in_config_file() {
        let file: ConfigFile = toml::from_str("[server]\nlisten = \"nowhere\"\n").unwrap();
        let cli = Cli::try_parse_from(["signage-server", "serve"]).unwrap();
        assert!(Settings::resolve(&cli, file).is_err());
    }

    #[test]
    fn test_render_subcommands_parse() {
        let cli = Cli::try_parse_from([
            "signage-server",
            "render",
            "--player",
            "lobby",
            "--now",
            "2024-05-16",
            "--data-dir",
            "fixtures",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("fixtures")));
        match cli.command {
            Commands::Render { player, now } => {
                assert_eq!(player, "lobby");
                assert_eq!(
                    build_date(now.as_deref()).unwrap(),
                    NaiveDate::from_ymd_opt(2024, 5, 16).unwrap()
                );
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["signage-server", "render-all", "--out", "out"]).unwrap();
        assert!(matches!(cli.command, Commands::RenderAll { .. }));
        assert!(build_date(Some("16/05/2024")).is_err());
    }
}
