mod cli;
mod config;
mod execution;
mod handlers;
mod languages;
mod logging;
mod presentation;
mod printer;
mod session;
mod tui;

use anyhow::Result;
use config::Config;
use logging::LogTarget;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // Load config; CLI overrides the service URL
    let mut cfg = Config::load();
    if let Some(url) = args.api_url.as_deref() {
        cfg.set("API_URL", url);
    }

    let log_file = cfg.log_file();
    let target = if args.is_editor() {
        LogTarget::File(&log_file)
    } else {
        LogTarget::Stderr
    };
    logging::init_logging(args.log_level, cfg.get("RUNPAD_LOG").as_deref(), target)?;

    if args.list_languages {
        handlers::languages::list();
        return Ok(());
    }
    if let Some(key) = &args.template {
        return handlers::languages::template(key);
    }
    if args.health {
        return handlers::health::run(&cfg).await;
    }
    if let Some(file) = &args.run {
        let succeeded = handlers::run::run(&cfg, file, args.lang.as_deref(), &args.stdin).await?;
        if !succeeded {
            std::process::exit(1);
        }
        return Ok(());
    }

    handlers::editor::run(&cfg, args.file.as_deref(), args.lang.as_deref()).await
}
