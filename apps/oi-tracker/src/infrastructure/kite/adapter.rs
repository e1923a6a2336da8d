//! `QuoteSourcePort` implementation backed by Kite Connect.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::application::ports::{InstrumentQuote, QuoteSourceError, QuoteSourcePort};
use crate::domain::chain::InstrumentId;

use super::api_types::{LtpResponse, QuoteResponse};
use super::config::KiteConfig;
use super::error::KiteError;
use super::http_client::KiteHttpClient;

/// Quote source reading prices and open interest from Kite Connect.
#[derive(Debug, Clone)]
pub struct KiteQuoteSource {
    http: KiteHttpClient,
}

impl KiteQuoteSource {
    /// Create a new adapter.
    ///
    /// # Errors
    ///
    /// Returns `KiteError` if the HTTP client cannot be created.
    pub fn new(config: &KiteConfig) -> Result<Self, KiteError> {
        Ok(Self {
            http: KiteHttpClient::new(config)?,
        })
    }

    async fn fetch_ltp(&self, instrument: &str) -> Result<Decimal, KiteError> {
        let data: LtpResponse = self.http.get("/quote/ltp", &[("i", instrument)]).await?;
        data.get(instrument)
            .map(|entry| entry.last_price)
            .ok_or_else(|| KiteError::MissingInstrument(instrument.to_string()))
    }

    async fn fetch_quotes(
        &self,
        instruments: &[InstrumentId],
    ) -> Result<HashMap<InstrumentId, InstrumentQuote>, KiteError> {
        let query: Vec<(&str, &str)> = instruments.iter().map(|i| ("i", i.as_str())).collect();
        let data: QuoteResponse = self.http.get("/quote", &query).await?;

        data.iter()
            .map(|(instrument, entry)| {
                entry
                    .to_instrument_quote(instrument)
                    .map(|quote| (instrument.clone(), quote))
            })
            .collect()
    }
}

#[async_trait]
impl QuoteSourcePort for KiteQuoteSource {
    async fn last_price(&self, instrument: &str) -> Result<Decimal, QuoteSourceError> {
        let price = self.fetch_ltp(instrument).await?;
        tracing::debug!(instrument, price = %price, "Fetched last price");
        Ok(price)
    }

    async fn batch_quote(
        &self,
        instruments: &[InstrumentId],
    ) -> Result<HashMap<InstrumentId, InstrumentQuote>, QuoteSourceError> {
        if instruments.is_empty() {
            return Ok(HashMap::new());
        }

        let quotes = self.fetch_quotes(instruments).await?;
        tracing::debug!(
            requested = instruments.len(),
            received = quotes.len(),
            "Fetched batch quote"
        );
        Ok(quotes)
    }
}
