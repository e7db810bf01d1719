use anyhow::Result;
use clap::{Parser, Subcommand};
use kursbot::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for kursbot::AppCommand {
    fn from(cmd: Commands) -> kursbot::AppCommand {
        match cmd {
            Commands::Run => kursbot::AppCommand::Run,
            Commands::Rates => kursbot::AppCommand::Rates,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Run the Telegram bot (default)
    Run,
    /// Print today's rates and exit
    Rates,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Setup => setup(),
        cmd => kursbot::run_command(cmd.into(), cli.config_path.as_deref()).await,
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = kursbot::core::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
feed:
  base_url: "https://cdn.jsdelivr.net/gh/fawazahmed0/currency-api@1/latest/currencies"
  request_timeout_secs: 10

pairs:
  - [eur, usd]
  - [usd, rub]
  - [eur, rub]
  - [amd, rub]
  - [rub, amd]
  - [usd, amd]
  - [eur, amd]

labels:
  usd: "Доллар"
  eur: "Евро"
  rub: "Рубль"
  amd: "Драм"
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
