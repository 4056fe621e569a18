mod prices;
mod report;

use clap::{Parser, Subcommand};
use mjprice_core::{compute_dial_setting, AppConfig, DoseLevel};
use mjprice_store::StoreClient;
use tracing_subscriber::EnvFilter;

use crate::prices::PricesCommands;
use crate::report::ReportCommands;

#[derive(Debug, Parser)]
#[command(name = "mjprice-cli")]
#[command(about = "Self-pay price comparison command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Browse published prices
    Prices {
        #[command(subcommand)]
        command: PricesCommands,
    },
    /// Convert a dose into dial clicks and uses per pen
    Dose {
        /// Labeled pen strength in mg (2.5, 5, 7.5, 10, 12.5 or 15)
        #[arg(long)]
        pen: f64,
        /// Dose per use in mg
        #[arg(long)]
        dose: f64,
    },
    /// Submit a report for review
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Prices { command }) => {
            let store = connect_store()?;
            prices::run(&store, command).await?;
        }
        Some(Commands::Dose { pen, dose }) => run_dose(pen, dose)?,
        Some(Commands::Report { command }) => {
            let store = connect_store()?;
            report::run(&store, command).await?;
        }
        None => println!("mjprice-cli ready; run with --help for commands"),
    }

    Ok(())
}

fn connect_store() -> anyhow::Result<StoreClient> {
    let config = mjprice_core::load_app_config()?;
    store_from_config(&config)
}

fn store_from_config(config: &AppConfig) -> anyhow::Result<StoreClient> {
    let store = StoreClient::new(
        &config.store_url,
        &config.store_api_key,
        config.store_request_timeout_secs,
    )?
    .with_retry(config.store_max_retries, config.store_retry_backoff_base_ms);
    Ok(store)
}

/// Prints the dial setting for `dose_mg` on a `pen_mg` pen. No network.
fn run_dose(pen_mg: f64, dose_mg: f64) -> anyhow::Result<()> {
    let pen = DoseLevel::try_from(pen_mg)?;
    let setting = compute_dial_setting(pen, dose_mg)?;

    if dose_mg > setting.dose_mg {
        println!("note: dose capped at the pen strength of {pen}");
    }
    println!(
        "{}",
        format_dial_setting(pen, setting.dose_mg, setting.clicks, setting.uses_per_pen)
    );
    Ok(())
}

fn format_dial_setting(pen: DoseLevel, dose_mg: f64, clicks: u32, uses: u64) -> String {
    format!("{pen} pen, {dose_mg} mg per use: dial {clicks} clicks, {uses} uses per pen")
}
