//! WeatherChat CLI
//!
//! Two entry points: `chat` talks to Gemini with the weather tools
//! registered, either interactively or for a single `--prompt` exchange;
//! `infer` runs one of the three tools directly and prints the raw result.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use weatherchat::config::WeatherChatConfig;
use weatherchat::dispatch::ChatSession;
use weatherchat::forecast::ForecastService;
use weatherchat::gemini::GeminiClient;
use weatherchat::WeatherChatError;

#[derive(Parser)]
#[command(
    name = "weatherchat",
    version,
    about = "Conversational weather assistant for Abidjan, Berlin, Toronto, and Kazan"
)]
struct Cli {
    /// Path to a configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chat with the assistant through the Gemini API
    Chat {
        /// Gemini API key; overrides config and environment
        #[arg(long)]
        api_key: Option<String>,

        /// Send a single prompt and print the reply instead of starting
        /// an interactive session
        #[arg(long)]
        prompt: Option<String>,
    },

    /// Run one of the forecast tools directly, without the LLM
    Infer {
        /// Which tool to run
        #[arg(long, value_enum, default_value = "nd")]
        model: InferModel,

        /// City name (abidjan, berlin, toronto, or kazan)
        #[arg(long)]
        city: String,

        /// Date in YYYY-MM-DD format; required for ff and rh
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InferModel {
    /// Next-day forecast (city only)
    Nd,
    /// Future-date forecast (city and date)
    Ff,
    /// Retrieve historical data (city and date)
    Rh,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = WeatherChatConfig::load_from_path(cli.config.clone())?;
    init_logging(&config, cli.verbose);

    debug!("Configuration loaded; models dir: {}", config.data.models_dir.display());

    match cli.command {
        Command::Chat { api_key, prompt } => run_chat(config, api_key, prompt).await,
        Command::Infer { model, city, date } => run_infer(&config, model, &city, date.as_deref()),
    }
}

fn init_logging(config: &WeatherChatConfig, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("weatherchat={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run_chat(
    mut config: WeatherChatConfig,
    api_key: Option<String>,
    prompt: Option<String>,
) -> Result<()> {
    if let Some(key) = api_key {
        config.gemini.api_key = Some(key);
    }

    let client = GeminiClient::new(&config.gemini)?;
    let service = ForecastService::new(&config.data);
    let mut session = ChatSession::new(client, service);

    if let Some(prompt) = prompt {
        let reply = session.send(&prompt).await?;
        println!("{reply}");
        return Ok(());
    }

    println!(
        "WeatherChat — ask about the weather in Abidjan, Berlin, Toronto, or Kazan.\n\
         Next-day forecasts, historical dates, and future dates are all supported.\n\
         Type 'exit' to quit."
    );

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        match session.send(line).await {
            Ok(reply) => println!("{reply}"),
            Err(e) => eprintln!("error: {e}"),
        }
    }

    Ok(())
}

fn run_infer(
    config: &WeatherChatConfig,
    model: InferModel,
    city: &str,
    date: Option<&str>,
) -> Result<()> {
    let service = ForecastService::new(&config.data);

    let require_date = || {
        date.ok_or_else(|| {
            WeatherChatError::validation("--date is required for this model")
        })
    };

    let json = match model {
        InferModel::Nd => service.next_day_forecast(city)?.to_json()?,
        InferModel::Ff => service
            .future_date_forecast(city, require_date()?)?
            .to_json()?,
        InferModel::Rh => service
            .historical_lookup(city, require_date()?)?
            .to_json()?,
    };

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
