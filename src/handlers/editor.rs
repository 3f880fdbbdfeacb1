//! Editor handler: opens the terminal editor.

use std::{fs, io, path::Path};

use anyhow::{Context, Result};
use is_terminal::IsTerminal;

use crate::{config::Config, languages::Registry, tui::run_editor};

pub async fn run(cfg: &Config, file: Option<&Path>, lang: Option<&str>) -> Result<()> {
    if !io::stdout().is_terminal() {
        eprintln!("Warning: the editor needs an interactive terminal.");
        eprintln!("Use --run FILE to execute a file without the editor.");
        return Err(anyhow::anyhow!("editor requires a proper terminal environment"));
    }

    let registry = Registry::builtin();
    let language = super::resolve_language(&registry, lang, file, cfg)?;
    let code = match file {
        Some(p) if p.exists() => Some(
            fs::read_to_string(p).with_context(|| format!("failed to read {}", p.display()))?,
        ),
        _ => None,
    };

    run_editor(cfg, registry, language, code).await
}
