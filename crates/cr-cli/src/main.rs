use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cr_core::CompanyQuery;
use cr_pipeline::{ClientRegistry, Phase, ResearchPipeline};
use cr_providers::{HostedProviderFactory, ProviderKind};
use cr_tools::{TavilyNewsSearch, WebPageFetcher};

mod config;
mod output;

use config::{Config, ConfigOverrides};
use output::OutputFormat;

/// Log level for tracing output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Most verbose: everything including cache keys
    Trace,
    /// Verbose: completion requests, cache hits, phase transitions
    Debug,
    /// Standard: stage completion and skipped results
    Info,
    /// Quiet: degraded stages and warnings
    Warn,
    /// Minimal: only errors
    Error,
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Parser)]
#[command(name = "company-research")]
#[command(author, version, about = "Research a company from its website and recent news", long_about = None)]
pub struct Cli {
    /// Name of the company to research
    #[arg(short = 'n', long, required_unless_present = "print_config")]
    pub company_name: Option<String>,

    /// Company website (scheme optional); the profile is skipped without it
    #[arg(short = 'u', long)]
    pub company_url: Option<String>,

    /// Config file (default: <config_dir>/company-research/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Completion service (overrides config)
    #[arg(long)]
    pub provider: Option<ProviderKind>,

    /// Base URL for the completion API (overrides config)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Model to use (overrides config)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Temperature (0.0-2.0)
    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// Maximum tokens to generate per completion
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Run the profile and news stages concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    /// Enable debug logging (shorthand for --log-level debug)
    #[arg(short, long)]
    pub debug: bool,

    /// Write logs to file (JSON-lines format)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            provider: self.provider,
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            parallel: self.parallel.then_some(true),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        LogLevel::Debug
    } else {
        cli.log_level
    };
    let filter = EnvFilter::new(log_level.as_filter());

    if let Some(log_path) = &cli.log_file {
        let file = std::fs::File::create(log_path)
            .with_context(|| format!("Failed to create log file: {:?}", log_path))?;
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::sync::Mutex::new(file)))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    // .env is optional
    let _ = dotenvy::dotenv();

    let config = Config::load(cli.config.as_deref(), &cli.overrides())?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    config.validate().context("Invalid configuration")?;

    let company_name = cli.company_name.as_deref().unwrap_or_default();
    let query = CompanyQuery::new(company_name, cli.company_url.as_deref())?;

    let pipeline = build_pipeline(&config)?;
    let pipeline = if atty::is(atty::Stream::Stderr) {
        pipeline.with_progress(Arc::new(|phase: Phase| eprintln!("[*] {}...", phase)))
    } else {
        pipeline
    };

    let report = pipeline.run(&query).await;

    println!("{}", output::render(&report, cli.format, chrono::Utc::now())?);
    Ok(())
}

/// Wire the concrete collaborators together. Every credential and setting
/// problem surfaces here, before any stage runs.
fn build_pipeline(config: &Config) -> Result<ResearchPipeline> {
    let mut factory = HostedProviderFactory::new(config.provider);
    if let Some(url) = &config.base_url {
        factory = factory.with_base_url(url);
    }

    let registry = ClientRegistry::new(Arc::new(factory));
    let client = registry.get_llm(&config.completion_config()?)?;

    let search = TavilyNewsSearch::with_timeout(config.resolve_search_api_key()?, config.search_timeout());
    let search = match &config.search.base_url {
        Some(url) => search.with_base_url(url),
        None => search,
    };

    let fetcher = WebPageFetcher::new(config.fetch_config());

    tracing::info!(
        provider = config.provider.as_str(),
        model = %config.model,
        parallel = config.parallel,
        "Pipeline ready"
    );

    Ok(ResearchPipeline::new(
        client,
        Arc::new(fetcher),
        Arc::new(search),
        &config.research_config(),
    ))
}
