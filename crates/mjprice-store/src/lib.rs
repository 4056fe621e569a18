//! Client for the hosted price store: reads the published price table and
//! inserts visitor reports into the review tables.

mod client;
mod error;
mod retry;

pub use client::{
    StoreClient, ERROR_REPORTS_TABLE, PRICE_CORRECTIONS_TABLE, PRICE_RECORDS_TABLE,
    PRICE_REPORTS_TABLE,
};
pub use error::StoreError;
