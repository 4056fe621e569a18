//! HTTP client for the hosted price store's REST interface.
//!
//! Every request carries the public API key twice, as the `apikey` header and
//! as a bearer token. Reads are retried on transient failures; inserts are
//! sent once.

use std::time::Duration;

use mjprice_core::{ErrorReport, NewPriceReport, PriceCorrectionReport, PriceRecord, RecordId};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Serialize;

use crate::error::StoreError;
use crate::retry::retry_with_backoff;

/// Published price records.
pub const PRICE_RECORDS_TABLE: &str = "mounjaro_data";
/// Corrections to existing records, pending review.
pub const PRICE_CORRECTIONS_TABLE: &str = "mounjaro_reports";
/// Visitor-submitted new prices, pending review.
pub const PRICE_REPORTS_TABLE: &str = "price_reports";
pub const ERROR_REPORTS_TABLE: &str = "error_reports";

const REST_PATH: &str = "rest/v1/";
const RETURN_REPRESENTATION: &str = "return=representation";
const RETURN_MINIMAL: &str = "return=minimal";

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 500;

/// Client for the hosted price store.
///
/// Cheap to share behind an `Arc`; the inner `reqwest::Client` pools
/// connections.
pub struct StoreClient {
    client: Client,
    api_key: String,
    rest_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl StoreClient {
    /// Creates a client for the store at `base_url` (the project URL, without
    /// the REST path).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`StoreError::InvalidBaseUrl`] if `base_url`
    /// is not an absolute http(s) URL.
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("mjprice/0.1 (price-comparison)")
            .build()?;

        let invalid = |reason: String| StoreError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason,
        };

        // Exactly one trailing slash so joining keeps any path prefix.
        let normalised = format!("{}/", base_url.trim().trim_end_matches('/'));
        let base = Url::parse(&normalised).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", base.scheme())));
        }
        let rest_url = base.join(REST_PATH).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            rest_url,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Overrides the retry policy used for reads.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Fetches every published price record, in store order.
    ///
    /// A `null` or empty body is an empty list. Rows that cannot be read as a
    /// [`PriceRecord`] are skipped with a warning instead of failing the
    /// whole listing.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Http`] on network failure.
    /// - [`StoreError::Status`] if the store answers with a non-2xx status.
    /// - [`StoreError::Deserialize`] if the body is not a JSON array.
    pub async fn fetch_price_records(&self) -> Result<Vec<PriceRecord>, StoreError> {
        let url = self.table_url(PRICE_RECORDS_TABLE, &[("select", "*")]);
        let rows = self.get_rows(&url).await?;
        Ok(parse_records(rows))
    }

    /// Fetches a single published record by id, or `None` if it does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Same as [`StoreClient::fetch_price_records`].
    pub async fn fetch_price_record(
        &self,
        id: &RecordId,
    ) -> Result<Option<PriceRecord>, StoreError> {
        let filter = format!("eq.{id}");
        let url = self.table_url(PRICE_RECORDS_TABLE, &[("select", "*"), ("id", &filter)]);
        let rows = self.get_rows(&url).await?;
        Ok(parse_records(rows).into_iter().next())
    }

    /// Inserts a correction of an existing record for review.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] on network failure or
    /// [`StoreError::Status`] if the store rejects the row.
    pub async fn submit_price_correction(
        &self,
        report: &PriceCorrectionReport,
    ) -> Result<(), StoreError> {
        self.insert(PRICE_CORRECTIONS_TABLE, report, RETURN_REPRESENTATION)
            .await
    }

    /// Inserts a new price report for review.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] on network failure or
    /// [`StoreError::Status`] if the store rejects the row.
    pub async fn submit_price_report(&self, report: &NewPriceReport) -> Result<(), StoreError> {
        self.insert(PRICE_REPORTS_TABLE, report, RETURN_REPRESENTATION)
            .await
    }

    /// Inserts a data-error report.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] on network failure or
    /// [`StoreError::Status`] if the store rejects the row.
    pub async fn submit_error_report(&self, report: &ErrorReport) -> Result<(), StoreError> {
        self.insert(ERROR_REPORTS_TABLE, report, RETURN_MINIMAL).await
    }

    /// REST URL for `table` with the given query parameters, percent-encoded.
    fn table_url(&self, table: &str, query: &[(&str, &str)]) -> Url {
        let mut url = self.rest_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(table);
        }
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// GETs `url` with retries and reads the body as an array of rows.
    async fn get_rows(&self, url: &Url) -> Result<Vec<serde_json::Value>, StoreError> {
        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self.authorized(self.client.get(url)).send().await?;
                let response = check_status(response).await?;
                Ok(response.text().await?)
            }
        })
        .await?;

        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let rows: Option<Vec<serde_json::Value>> =
            serde_json::from_str(&body).map_err(|e| StoreError::Deserialize {
                context: url.path().to_owned(),
                source: e,
            })?;
        Ok(rows.unwrap_or_default())
    }

    async fn insert<T: Serialize + ?Sized>(
        &self,
        table: &str,
        row: &T,
        prefer: &str,
    ) -> Result<(), StoreError> {
        let url = self.table_url(table, &[]);
        let request = self
            .authorized(self.client.post(url))
            .header("Prefer", prefer)
            .json(row);
        let response = request.send().await?;
        check_status(response).await?;
        tracing::info!(table, "report inserted");
        Ok(())
    }
}

/// Passes 2xx responses through; anything else becomes
/// [`StoreError::Status`] carrying the response body.
async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

fn parse_records(rows: Vec<serde_json::Value>) -> Vec<PriceRecord> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<PriceRecord>(row) {
            Ok(record) => Some(record),
            Err(error) => {
                tracing::warn!(%error, "skipping malformed price record");
                None
            }
        })
        .collect()
}
