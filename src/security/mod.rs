//! Secret storage
//!
//! The assistant API key lives in the OS keyring with a private file as
//! fallback. `GEMINI_API_KEY` in the environment overrides both.

pub mod keyring;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// The assistant API key from the environment, keyring or key file
pub fn assistant_api_key() -> Option<String> {
    if let Some(key) = std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()) {
        return Some(key.trim().to_string());
    }
    keyring::get_api_key().ok().filter(|k| !k.is_empty())
}
