//! Locating the API key at startup.
//!
//! The key comes from, in order: an explicit value, the `CHATTERBOX_API_KEY`
//! environment variable, or a YAML secrets file:
//!
//! ```yaml
//! api_key: gsk_...
//! ```
//!
//! `GROQ_API_KEY` is accepted as an alias for `api_key` in the file.  Failing all three
//! is a [`Error::Configuration`] and the REPL refuses to start.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Environment variable consulted for the API key.
pub const API_KEY_ENV: &str = "CHATTERBOX_API_KEY";

/// Secrets file used when none is given.
pub const DEFAULT_SECRETS_PATH: &str = ".chatterbox/secrets.yaml";

/// Contents of the secrets file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Secrets {
    /// The completion API key.
    #[serde(default, alias = "GROQ_API_KEY")]
    pub api_key: Option<String>,
}

impl Secrets {
    /// Parse a secrets file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|err| Error::io(format!("failed to read {}", path.display()), err))?;
        Self::parse(&text)
    }

    /// Parse secrets from YAML text.  An empty document has no secrets.
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|err| {
            Error::serialization("failed to parse secrets file", Some(Box::new(err)))
        })
    }
}

/// Resolve the API key, reading the process environment.
pub fn resolve_api_key(explicit: Option<String>, secrets_path: Option<&Path>) -> Result<String> {
    resolve_api_key_from(explicit, std::env::var(API_KEY_ENV).ok(), secrets_path)
}

/// Resolve the API key from an explicit value, an environment value, or a file.
///
/// Blank values are treated as absent.  A missing default secrets file is not an error
/// by itself, but a missing file that was asked for explicitly is.
pub fn resolve_api_key_from(
    explicit: Option<String>,
    env_value: Option<String>,
    secrets_path: Option<&Path>,
) -> Result<String> {
    let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    if let Some(key) = present(explicit) {
        return Ok(key);
    }
    if let Some(key) = present(env_value) {
        tracing::debug!("using API key from {API_KEY_ENV}");
        return Ok(key);
    }

    let (path, required) = match secrets_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_SECRETS_PATH), false),
    };
    if !required && !path.exists() {
        return Err(missing_key(&path));
    }
    let secrets = Secrets::load(&path)?;
    match present(secrets.api_key) {
        Some(key) => {
            tracing::debug!(path = %path.display(), "using API key from secrets file");
            Ok(key)
        }
        None => Err(missing_key(&path)),
    }
}

fn missing_key(path: &Path) -> Error {
    Error::configuration(format!(
        "no API key: set {API_KEY_ENV} or add api_key to {}",
        path.display()
    ))
}
