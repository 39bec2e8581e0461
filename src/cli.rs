//! CLI interface for drivebook

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{self, Config};
use crate::models::package;

#[derive(Parser)]
#[command(name = "drivebook")]
#[command(about = "Driving-lesson marketplace API server", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Port to listen on (default from config: 3001)
        #[arg(short, long, env = "DRIVEBOOK_PORT")]
        port: Option<u16>,
        /// Host to bind to
        #[arg(long, env = "DRIVEBOOK_HOST")]
        host: Option<String>,
        /// SQLite database file, or `:memory:`
        #[arg(short, long, env = "DRIVEBOOK_DATABASE")]
        database: Option<PathBuf>,
        /// Allowed CORS origin
        #[arg(long)]
        cors_origin: Option<String>,
        /// Enable HTTPS
        #[arg(long, requires_all = ["cert", "key"])]
        https: bool,
        /// Path to SSL certificate
        #[arg(long)]
        cert: Option<PathBuf>,
        /// Path to SSL private key
        #[arg(long)]
        key: Option<PathBuf>,
    },
    /// Configure the server
    Config {
        /// Display current configuration
        #[arg(long)]
        show: bool,
        /// Store the chat assistant API key
        #[arg(long)]
        set_api_key: Option<String>,
        /// Remove the stored chat assistant API key
        #[arg(long)]
        delete_api_key: bool,
        /// Generate a new JWT secret (signs everyone out)
        #[arg(long)]
        rotate_jwt_secret: bool,
        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
    },
    /// List the lesson packages
    Packages,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, host, database, cors_origin, https, cert, key } => {
            let mut config = Config::load()?;
            if config.auth.jwt_secret.is_none() {
                config.ensure_jwt_secret();
                config.save()?;
            }

            // flags apply to this run only
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            if database.is_some() {
                config.server.database = database;
            }
            if cors_origin.is_some() {
                config.server.cors_origin = cors_origin;
            }
            config.assistant.api_key = crate::security::assistant_api_key();

            crate::server::start(config, https, cert, key).await?;
        }
        Commands::Config { show, set_api_key, delete_api_key, rotate_jwt_secret, reset } => {
            if let Some(key) = set_api_key {
                config::set_api_key(&key)?;
            } else if delete_api_key {
                config::delete_api_key()?;
            } else if rotate_jwt_secret {
                config::rotate_jwt_secret()?;
            } else if reset {
                config::reset_config()?;
            } else if show {
                config::show_config()?;
            } else {
                println!("Configuration options:");
                println!("  --show                 Display current configuration");
                println!("  --set-api-key <key>    Store the chat assistant API key");
                println!("  --delete-api-key       Remove the stored API key");
                println!("  --rotate-jwt-secret    Generate a new token signing secret");
                println!("  --reset                Reset configuration to defaults");
                println!();
                println!("Config file: {}", config::config_path()?.display());
            }
        }
        Commands::Packages => {
            println!("{:<4} {:<16} {:>7} {:>7} {:>9} {:>11}", "ID", "NAME", "LESSONS", "PRICE", "DISCOUNT", "PER LESSON");
            for listing in package::listings() {
                let p = listing.package;
                println!(
                    "{:<4} {:<16} {:>7} {:>7} {:>8}% {:>11.2}",
                    p.id,
                    p.name,
                    p.lessons,
                    format!("${}", p.price),
                    p.discount,
                    listing.per_lesson
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_flags_parse() {
        let cli = Cli::try_parse_from(["drivebook", "serve", "--port", "8080", "--database", ":memory:"]).unwrap();
        match cli.command {
            Commands::Serve { port, database, https, .. } => {
                assert_eq!(port, Some(8080));
                assert_eq!(database, Some(PathBuf::from(":memory:")));
                assert!(!https);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_https_needs_cert_and_key() {
        assert!(Cli::try_parse_from(["drivebook", "serve", "--https"]).is_err());
        assert!(Cli::try_parse_from(["drivebook", "serve", "--https", "--cert", "c.pem", "--key", "k.pem"]).is_ok());
    }
}
