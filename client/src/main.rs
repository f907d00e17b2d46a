mod cli;

use anyhow::{bail, Result};
use clap::Parser;
use common::{config::coordinator_base_url, JobStatusView};
use reqwest::Client;

use crate::cli::{render_status, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let base_url = match cli.url {
        Some(url) => url,
        None => coordinator_base_url()?,
    };

    match cli.command {
        Commands::Health => {
            let url = format!("{}/health", base_url);
            let resp = client.get(&url).send().await?;
            if !resp.status().is_success() {
                bail!("el coordinador respondió {}", resp.status());
            }
            println!("{}: {}", base_url, resp.text().await?);
        }
        Commands::Status { json } => {
            let url = format!("{}/api/v1/status", base_url);
            let resp = client.get(&url).send().await?.error_for_status()?;
            let view: JobStatusView = resp.json().await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("{}", render_status(&view));
            }
        }
    }

    Ok(())
}
