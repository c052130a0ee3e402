use anyhow::Context;
use clap::Parser;
use reingreso::cli::{self, Cli, Commands};
use reingreso::config::AppConfig;
use reingreso::logging::{init_logging, init_logging_simple};
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(&cli.config_dir)
        .with_context(|| format!("loading configuration from {}", cli.config_dir.display()))?;

    match cli.command {
        None => {
            init_logging(&config.logging);
            serve(config).await?;
        }
        Some(Commands::Serve { host, port, model }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            model.apply(&mut config);
            init_logging(&config.logging);
            serve(config).await?;
        }
        Some(Commands::Check { model }) => {
            init_logging_simple();
            model.apply(&mut config);
            cli::run_check(&config)?;
        }
        Some(Commands::Predict { input, model }) => {
            init_logging_simple();
            model.apply(&mut config);
            let result = cli::run_predict(&config, &input)?;
            println!("{}", serde_json::to_string(&result)?);
        }
    }

    Ok(())
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    if let Err(e) = cli::run_serve(config).await {
        error!("Startup failed: {}", e);
        return Err(e.into());
    }
    Ok(())
}
