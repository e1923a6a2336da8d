//! Kite Connect REST response types.
//!
//! Every response is wrapped in `{"status": "...", "data": ...}`; errors carry
//! `message` and `error_type` instead of `data`.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;

use crate::application::ports::InstrumentQuote;

use super::error::KiteError;

// ============================================================================
// Envelope
// ============================================================================

/// Response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct KiteEnvelope<T> {
    /// `success` or `error`.
    pub status: String,
    /// Payload on success.
    pub data: Option<T>,
    /// Error message.
    pub message: Option<String>,
    /// Kite exception class.
    pub error_type: Option<String>,
}

impl<T> KiteEnvelope<T> {
    /// Extract the payload, turning an error envelope into `KiteError`.
    pub fn into_data(self) -> Result<T, KiteError> {
        if self.status != "success" {
            return Err(self.into_error());
        }
        self.data
            .ok_or_else(|| KiteError::JsonParse("success response without data".to_string()))
    }

    fn into_error(self) -> KiteError {
        let error_type = self.error_type.unwrap_or_else(|| "GeneralException".to_string());
        if error_type == "TokenException" {
            return KiteError::AuthenticationFailed;
        }
        KiteError::Api {
            error_type,
            message: self.message.unwrap_or_default(),
        }
    }
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct KiteErrorResponse {
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Kite exception class.
    pub error_type: Option<String>,
}

// ============================================================================
// Quote Payloads
// ============================================================================

/// `GET /quote/ltp` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct LtpEntry {
    /// Exchange instrument token.
    pub instrument_token: Option<u64>,
    /// Last traded price.
    pub last_price: Decimal,
}

/// `GET /quote/ltp` payload keyed by instrument.
pub type LtpResponse = HashMap<String, LtpEntry>;

/// `GET /quote` entry (only the fields the tracker reads).
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteEntry {
    /// Exchange instrument token.
    pub instrument_token: Option<u64>,
    /// Open interest.
    pub oi: Option<Decimal>,
}

/// `GET /quote` payload keyed by instrument.
pub type QuoteResponse = HashMap<String, QuoteEntry>;

impl QuoteEntry {
    /// Convert to the port's quote type.
    ///
    /// A missing `oi` field reads as zero open interest.
    pub fn to_instrument_quote(&self, instrument: &str) -> Result<InstrumentQuote, KiteError> {
        let open_interest = match self.oi {
            Some(oi) => non_negative(oi, instrument, "oi")?,
            None => 0,
        };
        Ok(InstrumentQuote::with_open_interest(open_interest))
    }
}

fn non_negative(value: Decimal, instrument: &str, field: &str) -> Result<u64, KiteError> {
    value.trunc().to_u64().ok_or_else(|| {
        KiteError::JsonParse(format!("{instrument}: {field} out of range ({value})"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ltp_envelope_parses() {
        let json = r#"{
            "status": "success",
            "data": {"NSE:NIFTY 50": {"instrument_token": 256265, "last_price": 25230.55}}
        }"#;
        let envelope: KiteEnvelope<LtpResponse> = serde_json::from_str(json).unwrap();
        let data = envelope.into_data().unwrap();

        assert_eq!(data["NSE:NIFTY 50"].last_price, Decimal::new(2_523_055, 2));
        assert_eq!(data["NSE:NIFTY 50"].instrument_token, Some(256_265));
    }

    #[test]
    fn quote_entry_reads_oi() {
        let json = r#"{"instrument_token": 1, "last_price": 112.5, "volume": 98000, "oi": 4567800}"#;
        let entry: QuoteEntry = serde_json::from_str(json).unwrap();
        let quote = entry.to_instrument_quote("X").unwrap();

        assert_eq!(quote.open_interest, 4_567_800);
    }

    #[test]
    fn quote_entry_accepts_float_oi() {
        let entry: QuoteEntry = serde_json::from_str(r#"{"oi": 1500.0}"#).unwrap();
        assert_eq!(entry.to_instrument_quote("X").unwrap().open_interest, 1_500);
    }

    #[test]
    fn quote_entry_missing_oi_is_zero() {
        let entry: QuoteEntry = serde_json::from_str(r#"{"last_price": 10}"#).unwrap();
        assert_eq!(entry.to_instrument_quote("X").unwrap().open_interest, 0);
    }

    #[test]
    fn quote_entry_negative_oi_rejected() {
        let entry: QuoteEntry = serde_json::from_str(r#"{"oi": -5}"#).unwrap();
        assert!(matches!(
            entry.to_instrument_quote("X"),
            Err(KiteError::JsonParse(_))
        ));
    }

    #[test]
    fn error_envelope_maps_to_api_error() {
        let json = r#"{"status": "error", "message": "Invalid instrument", "error_type": "InputException"}"#;
        let envelope: KiteEnvelope<QuoteResponse> = serde_json::from_str(json).unwrap();

        assert_eq!(
            envelope.into_data().unwrap_err(),
            KiteError::Api {
                error_type: "InputException".to_string(),
                message: "Invalid instrument".to_string(),
            }
        );
    }

    #[test]
    fn token_exception_maps_to_auth_failure() {
        let json = r#"{"status": "error", "message": "Incorrect api_key or access_token.", "error_type": "TokenException"}"#;
        let envelope: KiteEnvelope<QuoteResponse> = serde_json::from_str(json).unwrap();

        assert_eq!(envelope.into_data().unwrap_err(), KiteError::AuthenticationFailed);
    }
}
