//! `report` subcommands: submit corrections, new prices and data errors for
//! review.

use chrono::Local;
use clap::Subcommand;
use mjprice_core::{
    CorrectionEdits, ErrorReport, ErrorReportInput, NewPriceReport, NewPriceReportInput,
    PriceCorrectionReport, RecordId,
};
use mjprice_store::StoreClient;

/// Sub-commands available under `report`.
#[derive(Debug, Subcommand)]
pub enum ReportCommands {
    /// Propose a correction to a published record (0 clears a price)
    Correction {
        /// Id of the record to correct
        #[arg(long)]
        id: String,
        #[arg(long)]
        district: Option<String>,
        #[arg(long = "price2-5")]
        price2_5: Option<u32>,
        #[arg(long)]
        price5: Option<u32>,
        #[arg(long = "price7-5")]
        price7_5: Option<u32>,
        #[arg(long)]
        price10: Option<u32>,
        #[arg(long = "price12-5")]
        price12_5: Option<u32>,
        #[arg(long)]
        price15: Option<u32>,
        /// Replacement note; pass an empty string to clear it
        #[arg(long)]
        note: Option<String>,
    },
    /// Report a price, possibly for a facility not yet listed
    Price {
        /// City code (e.g. taipei)
        #[arg(long)]
        city: String,
        /// Clinic, hospital or pharmacy name
        #[arg(long)]
        clinic: String,
        #[arg(long)]
        district: Option<String>,
        /// Facility type code (defaults to clinic)
        #[arg(long = "type")]
        facility_type: Option<String>,
        /// Price for a 5 mg pen (1000 to 13000)
        #[arg(long)]
        price5: Option<u32>,
        /// Price for a 10 mg pen (1000 to 16000)
        #[arg(long)]
        price10: Option<u32>,
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Report wrong data anywhere on the site
    Error {
        #[arg(long)]
        description: String,
        #[arg(long)]
        source_type: Option<String>,
        #[arg(long)]
        source_id: Option<String>,
        #[arg(long)]
        error_type: Option<String>,
        #[arg(long)]
        suggested_value: Option<String>,
        #[arg(long)]
        contact: Option<String>,
    },
}

pub(crate) async fn run(store: &StoreClient, command: ReportCommands) -> anyhow::Result<()> {
    match command {
        ReportCommands::Correction {
            id,
            district,
            price2_5,
            price5,
            price7_5,
            price10,
            price12_5,
            price15,
            note,
        } => {
            let id = RecordId(id);
            let target = store
                .fetch_price_record(&id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("price record '{id}' not found"))?;

            let edits = CorrectionEdits {
                district,
                price2_5mg: price2_5,
                price5mg: price5,
                price7_5mg: price7_5,
                price10mg: price10,
                price12_5mg: price12_5,
                price15mg: price15,
                note,
            };
            let report = PriceCorrectionReport::new(&target, &edits, Local::now().date_naive());
            store.submit_price_correction(&report).await?;
            println!("correction for record {id} submitted for review");
        }
        ReportCommands::Price {
            city,
            clinic,
            district,
            facility_type,
            price5,
            price10,
            note,
            email,
        } => {
            let report = NewPriceReport::try_from(NewPriceReportInput {
                city,
                district,
                clinic,
                facility_type,
                price5mg: price5,
                price10mg: price10,
                note,
                email,
            })?;
            store.submit_price_report(&report).await?;
            println!("price report for {} submitted for review", report.clinic);
        }
        ReportCommands::Error {
            description,
            source_type,
            source_id,
            error_type,
            suggested_value,
            contact,
        } => {
            let report = ErrorReport::try_from(ErrorReportInput {
                source_type,
                source_id: source_id.map(RecordId),
                error_type,
                description,
                suggested_value,
                contact,
            })?;
            store.submit_error_report(&report).await?;
            println!("error report submitted, thank you");
        }
    }
    Ok(())
}
