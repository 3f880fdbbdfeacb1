//! Command handlers: one per CLI mode.

use std::path::Path;

use anyhow::{anyhow, Result};

use crate::{
    config::Config,
    languages::{LanguageDescriptor, Registry},
};

pub mod editor;
pub mod health;
pub mod languages;
pub mod run;

/// Pick the language for a session: explicit flag, then file extension, then
/// the configured default. Only an explicit unknown flag is an error.
pub fn resolve_language(
    registry: &Registry,
    flag: Option<&str>,
    file: Option<&Path>,
    cfg: &Config,
) -> Result<&'static LanguageDescriptor> {
    if let Some(key) = flag {
        let key = key.trim().to_ascii_lowercase();
        return registry.find(&key).ok_or_else(|| {
            anyhow!(
                "unsupported language '{}'. Supported: {}",
                key,
                registry.keys().join(", ")
            )
        });
    }
    if let Some(lang) = file.and_then(|p| registry.from_path(p)) {
        return Ok(lang);
    }
    Ok(registry.describe(&cfg.default_language()))
}
