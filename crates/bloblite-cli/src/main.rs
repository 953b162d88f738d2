mod cli;
mod logging;

use std::io::{Read, Write};
use std::process::ExitCode;

use anyhow::Context;
use bloblite::{BlobLiteClient, BlobLiteConfig, ETag};
use clap::Parser;
use tracing::debug;

use crate::cli::{Cli, Command};

/// Exit status when `load` finds no blob
const EXIT_NOT_FOUND: u8 = 2;

/// `--connection` wins, then `--config`, then the environment
fn resolve_config(cli: &Cli) -> anyhow::Result<BlobLiteConfig> {
    if let Some(connection) = &cli.connection {
        return Ok(BlobLiteConfig::new(connection.clone()));
    }
    if let Some(path) = &cli.config {
        return BlobLiteConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()));
    }
    BlobLiteConfig::from_env().context("no connection string given (use --connection or --config)")
}

fn read_content(text: Option<String>, file: Option<&std::path::Path>) -> anyhow::Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }

    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read content from stdin")?;
    Ok(buffer)
}

/// Execute one command, writing content to `out` and diagnostics to `err`
async fn run(
    command: Command,
    client: &BlobLiteClient,
    out: &mut impl Write,
    err: &mut impl Write,
) -> anyhow::Result<ExitCode> {
    match command {
        Command::Load {
            container,
            name,
            json,
        } => {
            let loaded = if json {
                client
                    .try_load_from_json::<serde_json::Value>(&container, &name)
                    .await?
                    .map(|result| result.map(|value| serde_json::to_string_pretty(&value)))
            } else {
                client
                    .try_load_plain_text(&container, &name)
                    .await?
                    .map(|result| result.map(Ok))
            };

            let Some(loaded) = loaded else {
                writeln!(err, "{container}/{name}: not found")?;
                return Ok(ExitCode::from(EXIT_NOT_FOUND));
            };

            let (content, etag) = loaded.into_parts();
            writeln!(out, "{}", content?)?;
            writeln!(err, "ETag: {etag}")?;
        }

        Command::Save {
            container,
            name,
            text,
            file,
            json,
            create_container,
            if_match,
        } => {
            let content = read_content(text, file.as_deref())?;
            let if_match = if_match.map(ETag::from);

            let saved = if json {
                let value: serde_json::Value =
                    serde_json::from_str(&content).context("content is not valid JSON")?;
                client
                    .try_save_as_json(&container, &name, &value, create_container, if_match.as_ref())
                    .await?
            } else {
                client
                    .try_save_plain_text(
                        &container,
                        &name,
                        &content,
                        create_container,
                        if_match.as_ref(),
                    )
                    .await?
            };

            writeln!(out, "{}", saved.etag())?;
        }

        Command::Delete { container, name } => {
            client.try_delete_blob(&container, &name).await?;
            writeln!(err, "Deleted {container}/{name}")?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.json_logs);

    let config = resolve_config(&cli)?;
    let client = BlobLiteClient::from_config(&config).context("failed to create blob client")?;
    debug!(?client, "Client ready");

    run(cli.command, &client, &mut std::io::stdout(), &mut std::io::stderr()).await
}
