//! Keyring integration for the assistant API key
//! Falls back to file storage if keyring is unavailable

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

const SERVICE_NAME: &str = "drivebook";
const API_KEY_USERNAME: &str = "assistant-api-key";
const API_KEY_FILE: &str = "assistant_api_key.txt";

/// Get the path for the fallback API key file
fn api_key_file_path() -> Result<PathBuf> {
    let path = crate::config::config_path()?;
    let dir = path.parent().context("Config path has no parent")?;
    fs::create_dir_all(dir).context("Failed to create config directory")?;
    Ok(dir.join(API_KEY_FILE))
}

/// Set API key - tries keyring first, falls back to file
pub fn set_api_key(key: &str) -> Result<()> {
    if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, API_KEY_USERNAME) {
        if entry.set_password(key).is_ok() {
            return Ok(());
        }
    }

    save_to_file(&api_key_file_path()?, key)?;
    tracing::info!("Keyring unavailable, API key stored in file");
    Ok(())
}

fn save_to_file(path: &std::path::Path, key: &str) -> Result<()> {
    fs::write(path, key).context("Failed to write API key file")?;

    // Set restrictive permissions on Unix
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .context("Failed to set file permissions")?;
    }

    Ok(())
}

fn read_from_file(path: &std::path::Path) -> Result<String> {
    let key = fs::read_to_string(path)
        .context("Failed to read API key. Run 'drivebook config --set-api-key YOUR_KEY' first.")?;
    Ok(key.trim().to_string())
}

/// Get API key - tries keyring first, falls back to file
pub fn get_api_key() -> Result<String> {
    if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, API_KEY_USERNAME) {
        if let Ok(key) = entry.get_password() {
            return Ok(key);
        }
    }

    read_from_file(&api_key_file_path()?)
}

/// Delete API key from both keyring and file
pub fn delete_api_key() -> Result<()> {
    if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, API_KEY_USERNAME) {
        let _ = entry.delete_credential();
    }

    let path = api_key_file_path()?;
    if path.exists() {
        fs::remove_file(&path).context("Failed to delete API key file")?;
    }
    Ok(())
}
