use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use abr_auditlog::config::{DEFAULT_DATACENTER, DEFAULT_DAYS, DEFAULT_ENTRIES};
use abr_auditlog::{Client, Config, Datacenter, OutputFiles};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "abr-auditlog",
    version,
    about = "Export Admin By Request elevated applications to JSON and CSV"
)]
struct Cli {
    /// API key, also read from a .env file
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Data center to connect to (dc1 = EU, dc2 = US, ...)
    #[arg(long, env = "ABR_DATACENTER", default_value = DEFAULT_DATACENTER)]
    datacenter: Datacenter,

    /// Number of days to retrieve logs for
    #[arg(long, env = "ABR_DAYS", default_value_t = DEFAULT_DAYS)]
    days: u32,

    /// Number of entries to retrieve
    #[arg(long, env = "ABR_ENTRIES", default_value_t = DEFAULT_ENTRIES)]
    entries: u32,

    /// Directory for elevated_apps.json and elevated_apps.csv
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Add a timestamp to the file names instead of overwriting the last run
    #[arg(long, default_value_t = false)]
    timestamped: bool,

    #[arg(long, hide = true)]
    base_url: Option<url::Url>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!("Failed to load .env: {}", e);
        }
    }
    let cli = Cli::parse();

    tracing::info!("Starting the audit log processing script...");
    match export(cli).await {
        Ok(()) => {
            tracing::info!("Audit log processing script completed.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn export(cli: Cli) -> abr_auditlog::Result<()> {
    let config = Config::new(cli.api_key.as_deref())?
        .with_datacenter(cli.datacenter)
        .with_days(cli.days)
        .with_entries(cli.entries)
        .with_base_url(cli.base_url);

    let output = if cli.timestamped {
        OutputFiles::timestamped(&cli.output_dir, chrono::Local::now().naive_local())
    } else {
        OutputFiles::new(&cli.output_dir)
    };

    let client = Client::new(config)?;

    if let Some(report) = abr_auditlog::run(&client, &output).await? {
        tracing::info!(
            "Exported {} elevated applications from {} audit log records.",
            report.rows,
            report.records
        );
    }
    Ok(())
}
