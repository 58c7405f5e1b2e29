//! HTTP API source.

use std::collections::BTreeMap;
use std::time::Duration;

use polars::prelude::DataFrame;
use reqwest::Url;
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::SourceError;
use crate::frame::frame_from_records;
use crate::json::select_records;
use crate::source::{BatchIter, DEFAULT_BATCH_SIZE, DataSource, already_extracted, buffered};

/// HTTP request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Issues one GET per extraction and partitions the returned record list.
#[derive(Debug, Clone)]
pub struct ApiSource {
    base_url: String,
    endpoint: String,
    headers: BTreeMap<String, String>,
    params: BTreeMap<String, String>,
    batch_size: usize,
    timeout: Duration,
    extracted: bool,
}

impl ApiSource {
    pub fn new(base_url: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            endpoint: endpoint.into(),
            headers: BTreeMap::new(),
            params: BTreeMap::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            timeout: DEFAULT_TIMEOUT,
            extracted: false,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full request URL including query parameters.
    pub fn url(&self) -> Result<Url, SourceError> {
        let raw = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        );
        Url::parse_with_params(&raw, &self.params).map_err(|err| SourceError::InvalidUrl {
            url: raw.clone(),
            message: err.to_string(),
        })
    }

    fn fetch(&self) -> Result<DataFrame, SourceError> {
        let url = self.url()?;
        let origin = url.to_string();
        let http_error = |source| SourceError::Http {
            url: origin.clone(),
            source,
        };

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(http_error)?;
        let mut request = client.get(url.clone());
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        info!(url = %origin, "fetching records");
        let response = request.send().map_err(http_error)?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().unwrap_or_default();
            return Err(SourceError::Status {
                url: origin,
                status,
                message,
            });
        }
        let payload: Value = response.json().map_err(http_error)?;
        let records = select_records(payload, &origin)?;
        debug!(url = %origin, records = records.len(), "api payload parsed");
        Ok(frame_from_records(&records)?)
    }
}

impl DataSource for ApiSource {
    fn extract(&mut self) -> BatchIter<'_> {
        if self.extracted {
            return already_extracted();
        }
        self.extracted = true;
        let this: &Self = self;
        buffered(move || this.fetch(), this.batch_size)
    }

    fn describe(&self) -> String {
        format!(
            "api {}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        )
    }
}
