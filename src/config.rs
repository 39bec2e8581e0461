//! Configuration management
//!
//! Server, authentication and chat-assistant settings, stored as TOML in the
//! platform config directory.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "drivebook";
const APPLICATION: &str = "drivebook";

/// Upper bound for minute-valued auth settings (one year)
const MAX_AUTH_MINUTES: i64 = 60 * 24 * 365;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    /// JWT authentication settings
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// SQLite file; defaults to `drivebook.db` in the data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
    /// Allowed CORS origin; any origin when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors_origin: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: None,
            cors_origin: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthConfig {
    /// JWT secret key (auto-generated if not set)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,
    /// Access token expiration (minutes)
    #[serde(default = "default_token_expiry")]
    pub access_token_expiry_minutes: i64,
    /// Maximum failed login attempts
    #[serde(default = "default_max_attempts")]
    pub max_login_attempts: u32,
    /// Lockout duration after failed attempts (minutes)
    #[serde(default = "default_lockout_duration")]
    pub lockout_duration_minutes: i64,
}

fn default_token_expiry() -> i64 {
    60
}

fn default_max_attempts() -> u32 {
    5
}

fn default_lockout_duration() -> i64 {
    30
}

impl AuthConfig {
    /// Reject durations that would not fit a timestamp
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_AUTH_MINUTES).contains(&self.access_token_expiry_minutes) {
            bail!(
                "access_token_expiry_minutes must be between 1 and {}",
                MAX_AUTH_MINUTES
            );
        }
        if !(0..=MAX_AUTH_MINUTES).contains(&self.lockout_duration_minutes) {
            bail!(
                "lockout_duration_minutes must be between 0 and {}",
                MAX_AUTH_MINUTES
            );
        }
        if self.max_login_attempts == 0 {
            bail!("max_login_attempts must be at least 1");
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            access_token_expiry_minutes: default_token_expiry(),
            max_login_attempts: default_max_attempts(),
            lockout_duration_minutes: default_lockout_duration(),
        }
    }
}

/// OpenAI-compatible chat endpoint used by the assistant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantConfig {
    /// API key is stored in keyring, this is just a reference
    #[serde(skip)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it on first use
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
            let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
            config.auth.validate().context("Invalid [auth] settings")?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent().context("Config path has no parent")?;
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;

        // holds the JWT secret
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set file permissions")?;
        }
        Ok(())
    }

    /// Return the JWT secret, generating one when absent. The caller saves.
    pub fn ensure_jwt_secret(&mut self) -> String {
        self.auth
            .jwt_secret
            .get_or_insert_with(crate::server::auth::generate_jwt_secret)
            .clone()
    }

    /// Configured database file, or the default in the data directory
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.server.database {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("drivebook.db")),
        }
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .context("Failed to get project directories")
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// Get the data directory path
pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Show current configuration
pub fn show_config() -> Result<()> {
    let config = Config::load()?;
    let database = config.database_path()?;

    println!("Configuration: {}", config_path()?.display());
    println!();
    println!("[server]");
    println!("  host          {}", config.server.host);
    println!("  port          {}", config.server.port);
    println!("  database      {}", database.display());
    println!("  cors origin   {}", config.server.cors_origin.as_deref().unwrap_or("any"));
    println!();
    println!("[auth]");
    println!(
        "  jwt secret    {}",
        if config.auth.jwt_secret.is_some() { "configured" } else { "not configured" }
    );
    println!("  token expiry  {} min", config.auth.access_token_expiry_minutes);
    println!(
        "  lockout       {} attempts, {} min",
        config.auth.max_login_attempts, config.auth.lockout_duration_minutes
    );
    println!();
    println!("[assistant]");
    println!("  base url      {}", config.assistant.base_url);
    println!("  model         {}", config.assistant.model);
    println!("  max tokens    {}", config.assistant.max_tokens);
    println!(
        "  api key       {}",
        if crate::security::assistant_api_key().is_some() { "set" } else { "not set" }
    );
    Ok(())
}

/// Set API key
pub fn set_api_key(key: &str) -> Result<()> {
    crate::security::keyring::set_api_key(key)?;
    println!("API key stored securely.");
    Ok(())
}

pub fn delete_api_key() -> Result<()> {
    crate::security::keyring::delete_api_key()?;
    println!("API key removed.");
    Ok(())
}

/// Replace the JWT secret, invalidating every issued token
pub fn rotate_jwt_secret() -> Result<()> {
    let mut config = Config::load()?;
    config.auth.jwt_secret = Some(crate::server::auth::generate_jwt_secret());
    config.save()?;
    println!("JWT secret rotated. Existing tokens are no longer valid.");
    Ok(())
}

/// Reset configuration to defaults
pub fn reset_config() -> Result<()> {
    Config::default().save()?;
    println!("Configuration reset to defaults.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("drivebook").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config, Config::default());
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.assistant.model, "gemini-1.5-flash");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 8080\n\n[auth]\nmax_login_attempts = 3\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.auth.max_login_attempts, 3);
        assert_eq!(config.auth.access_token_expiry_minutes, 60);
    }

    #[test]
    fn test_jwt_secret_generated_once_and_saved() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::load_from(&path).unwrap();
        let secret = config.ensure_jwt_secret();
        assert_eq!(config.ensure_jwt_secret(), secret);
        config.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.auth.jwt_secret.as_deref(), Some(secret.as_str()));
    }

    #[test]
    fn test_out_of_range_auth_minutes_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "[auth]\naccess_token_expiry_minutes = 9223372036854775807\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("access_token_expiry_minutes"));

        std::fs::write(&path, "[auth]\nlockout_duration_minutes = -5\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        std::fs::write(&path, "[auth]\nmax_login_attempts = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        std::fs::write(&path, "[auth]\naccess_token_expiry_minutes = 1440\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap().auth.access_token_expiry_minutes, 1440);
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_config_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.ensure_jwt_secret();
        config.save_to(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_explicit_database_path_wins() {
        let mut config = Config::default();
        config.server.database = Some(PathBuf::from("/tmp/lessons.db"));
        assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/lessons.db"));
    }
}
