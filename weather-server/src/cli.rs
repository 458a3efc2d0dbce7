use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use std::{path::PathBuf, sync::Arc};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use weather_core::{Config, ReqwestTransport, WeatherService, tool};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-server", version, about = "Serves the get_weather tool")]
pub struct Cli {
    /// Env file holding OPENWEATHERMAP_API_KEY and friends.
    #[arg(long, env = "WEATHER_ENV_FILE", global = true)]
    pub env_file: Option<PathBuf>,

    /// Query the weather provider with the city name as given.
    #[arg(long, global = true)]
    pub no_translate: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a single get_weather call and print its payload.
    Call {
        /// City name, in any language.
        city: String,
    },

    /// Read one JSON arguments object per stdin line and answer each on stdout.
    Serve,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let service = self.build_service()?;

        match self.command {
            Command::Call { city } => {
                let content = tool::invoke(&service, json!({ "city": city })).await?;
                println!("{}", content.text);
            }
            Command::Serve => serve(service).await?,
        }

        Ok(())
    }

    fn build_service(&self) -> Result<WeatherService> {
        let env_file = self
            .env_file
            .as_deref()
            .context("Missing env file path: pass --env-file <PATH> or set WEATHER_ENV_FILE")?;
        Config::load_env_file(env_file)?;

        let mut config = Config::from_env().context("Failed to read configuration")?;
        if self.no_translate {
            config = config.with_translation(false);
        }

        if !config.has_api_key() {
            tracing::warn!("OPENWEATHERMAP_API_KEY is not set, every call will report a configuration error");
        }
        tracing::info!(
            translation = config.translation_enabled,
            language = config.language.as_deref().unwrap_or("-"),
            "weather service ready"
        );

        Ok(WeatherService::new(
            Arc::new(config),
            Arc::new(ReqwestTransport::new()),
        ))
    }
}

/// Each line is handled on its own task; replies are written as they finish.
async fn serve(service: WeatherService) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = rx.recv().await {
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    tracing::info!(tool = tool::GET_WEATHER_TOOL, description = tool::GET_WEATHER_DESCRIPTION, "serving on stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }

        let service = service.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let reply = handle_line(&service, &line).await;
            let _ = tx.send(reply.to_string());
        });
    }

    drop(tx);
    writer.await.context("Output task panicked")??;
    Ok(())
}

async fn handle_line(service: &WeatherService, line: &str) -> Value {
    let arguments: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring malformed request line");
            return json!({ "error": format!("Malformed request: {err}") });
        }
    };

    match tool::invoke(service, arguments).await {
        Ok(content) => json!({ "content": [content] }),
        Err(err) => json!({ "error": err.to_string() }),
    }
}
