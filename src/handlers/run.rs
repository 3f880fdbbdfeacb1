//! Headless mode: execute one file and print the result.

use std::{fs, path::Path, sync::Arc};

use anyhow::{Context, Result};
use is_terminal::IsTerminal;

use crate::{
    config::Config,
    execution::{ExecutionClient, ExecutionResult},
    languages::Registry,
    presentation::project,
    printer::ResultPrinter,
    session::Session,
};

/// Returns whether the service accepted and ran the program.
pub async fn run(cfg: &Config, file: &Path, lang: Option<&str>, stdin: &str) -> Result<bool> {
    let registry = Registry::builtin();
    let language = super::resolve_language(&registry, lang, Some(file), cfg)?;
    let code = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let client = ExecutionClient::from_config(cfg)?;
    tracing::info!(file = %file.display(), language = language.key, api = client.base_url(), "headless run");

    let mut session = Session::new(registry, Arc::new(client));
    session.set_stdin(stdin);
    let state = session.run(&code, language.key).await;

    let printer = ResultPrinter { color: std::io::stdout().is_terminal() };
    printer.print(&project(state));

    Ok(state.result.as_ref().is_some_and(ExecutionResult::is_success))
}
