//! `prices` subcommands: read-only views over the published price table.

use clap::Subcommand;
use mjprice_core::{
    city_options, format_last_updated, format_price, DoseColumns, PriceRecord, RecordFilter, ALL,
};
use mjprice_store::StoreClient;

/// Sub-commands available under `prices`.
#[derive(Debug, Subcommand)]
pub enum PricesCommands {
    /// List prices, optionally filtered
    List {
        /// City code, or "all"
        #[arg(long, default_value = ALL)]
        city: String,
        /// Facility type code (clinic, hospital, pharmacy), or "all"
        #[arg(long = "type", default_value = ALL)]
        facility_type: String,
        /// Free-text search over name, district, city and type
        #[arg(long)]
        keyword: Option<String>,
        /// Show all six dose columns instead of 5 mg and 10 mg
        #[arg(long)]
        all_doses: bool,
        /// Print the matching records as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the city filter options present in the data
    Cities,
}

pub(crate) async fn run(store: &StoreClient, command: PricesCommands) -> anyhow::Result<()> {
    match command {
        PricesCommands::List {
            city,
            facility_type,
            keyword,
            all_doses,
            json,
        } => {
            let records = store.fetch_price_records().await?;
            let filter =
                RecordFilter::new(&city, &facility_type, keyword.as_deref().unwrap_or_default());
            let selected = filter.apply(&records);
            tracing::debug!(total = records.len(), matched = selected.len(), "filtered");

            if json {
                println!("{}", serde_json::to_string_pretty(&selected)?);
                return Ok(());
            }

            let columns = if all_doses {
                DoseColumns::All
            } else {
                DoseColumns::Common
            };
            if selected.is_empty() {
                println!("no prices match the given filters");
                return Ok(());
            }
            for line in render_table(&selected, columns) {
                println!("{line}");
            }
            println!("\n{} of {} records", selected.len(), records.len());
        }
        PricesCommands::Cities => {
            let records = store.fetch_price_records().await?;
            for city in city_options(&records) {
                println!("{city}");
            }
        }
    }
    Ok(())
}

/// Renders a header line plus one line per record.
pub(crate) fn render_table(records: &[&PriceRecord], columns: DoseColumns) -> Vec<String> {
    let levels = columns.levels();

    let mut header = format!("{:<8}{:<8}{:<6}{:<24}", "ID", "CITY", "TYPE", "CLINIC");
    for level in levels {
        header.push_str(&format!("{:>10}", level.label()));
    }
    header.push_str("  UPDATED");

    let mut lines = vec![header];
    for record in records {
        let clinic = truncate(record.clinic.as_deref().unwrap_or("-"), 22);
        let mut line = format!(
            "{:<8}{:<8}{:<6}{:<24}",
            record.id.to_string(),
            record.city_label(),
            record.type_label(),
            clinic
        );
        for &level in levels {
            let price = format_price(record.price_at(level));
            let cell = if price.is_empty() { "-".to_string() } else { price };
            line.push_str(&format!("{cell:>10}"));
        }
        let updated = format_last_updated(record.last_updated);
        line.push_str(&format!("  {}", if updated.is_empty() { "-" } else { &updated }));
        lines.push(line);
    }
    lines
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() > max_chars {
        format!("{}...", value.chars().take(max_chars - 3).collect::<String>())
    } else {
        value.to_string()
    }
}
