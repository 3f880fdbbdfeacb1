use anyhow::Result;
use owo_colors::OwoColorize;

use crate::{config::Config, execution::ExecutionClient};

pub async fn run(cfg: &Config) -> Result<()> {
    let client = ExecutionClient::from_config(cfg)?;
    let report = client.health().await?;

    let status = if report.status == "healthy" {
        format!("{}", report.status.green())
    } else {
        format!("{}", report.status.yellow())
    };
    println!("{}: {}", client.base_url(), status);
    for (name, value) in [("redis", &report.redis), ("database", &report.database), ("judge0", &report.judge0)] {
        if let Some(v) = value {
            println!("  {name}: {v}");
        }
    }
    Ok(())
}
