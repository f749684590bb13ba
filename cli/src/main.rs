mod chat_runner;
mod config;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc::unbounded_channel;

use chatline_tui::AppConfig;
use chatline_tui::ComposerConfig;

use crate::config::ConfigStore;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Terminal chat for a hosted LLM endpoint, with single-file attachments"
)]
struct Cli {
    /// Model alias (from `[models]` in the config) or a full model identifier.
    #[arg(long, env = "CHATLINE_MODEL")]
    model: Option<String>,

    /// Inference endpoint URL; overrides the config file.
    #[arg(long, env = "CHATLINE_ENDPOINT")]
    endpoint: Option<String>,

    /// API key sent to the endpoint.
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Path to the config file (defaults to `~/.chatline/config.toml`).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging()?;

    let store = match cli.config {
        Some(path) => ConfigStore::new(path),
        None => ConfigStore::new_default()?,
    };
    let model = store.resolve_model(cli.model.as_deref())?;
    let endpoint = match cli.endpoint {
        Some(endpoint) => endpoint,
        None => store.endpoint()?,
    };

    let runner_config = chat_runner::ChatRunnerConfig {
        model_id: model.id.clone(),
        endpoint,
        max_tokens: store.max_tokens()?,
        api_key: cli.api_key,
    };
    tracing::info!("starting session with model {}", model.id);

    // The widget/host channel pair: submissions travel one way, replies and
    // errors the other.
    let (op_tx, op_rx) = unbounded_channel();
    let (event_tx, event_rx) = unbounded_channel();

    let runner = tokio::spawn(chat_runner::run_chat_runner(runner_config, op_rx, event_tx));

    let app_config = AppConfig {
        composer: ComposerConfig {
            placeholder: store.placeholder()?,
            disabled: false,
        },
        model_label: model.label,
    };
    chatline_tui::run_chat_app(app_config, op_tx, event_rx).await?;

    runner.await.context("chat runner")?;
    Ok(())
}

fn init_logging() -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    let Some(home) = dirs::home_dir() else {
        anyhow::bail!("cannot determine home directory for log path");
    };
    let log_dir = home.join(".chatline");
    std::fs::create_dir_all(&log_dir).context("create log directory")?;

    // Stdout belongs to the TUI; logs go to a file next to the config.
    let appender = tracing_appender::rolling::never(log_dir, "chatline.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = tracing_subscriber::EnvFilter::try_from_env("CHATLINE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}
