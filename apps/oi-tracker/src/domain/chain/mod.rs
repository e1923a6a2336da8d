//! Option Chain Band
//!
//! Derives the band of option symbols to track from a reference price.
//!
//! # Design
//!
//! The at-the-money (ATM) anchor is the reference price rounded to the
//! nearest multiple of the strike step. Every strike in the closed interval
//! `[anchor - range, anchor + range]` contributes two symbols, a call (`CE`)
//! and a put (`PE`). Each symbol maps to a fully-qualified instrument
//! identifier built from the instrument prefix, the expiry token, the strike
//! and the side suffix:
//!
//! ```text
//! "25200CE"  ->  "NFO:NIFTY" + "26203" + "25200" + "CE"
//! ```
//!
//! Midpoints round half-to-even, so a price of `25225` with a step of `50`
//! anchors at `25200` while `25275` anchors at `25300`.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

// =============================================================================
// Types
// =============================================================================

/// A short display symbol (e.g. `25200CE`).
pub type Symbol = String;

/// A fully-qualified instrument identifier understood by the quote source
/// (e.g. `NFO:NIFTY2620325200CE`).
pub type InstrumentId = String;

/// Option side, rendered as the exchange suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionSide {
    /// Call option (`CE`).
    Call,
    /// Put option (`PE`).
    Put,
}

impl OptionSide {
    /// Both sides, call first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Call, Self::Put]
    }

    /// Exchange suffix for this side.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Call => "CE",
            Self::Put => "PE",
        }
    }
}

// =============================================================================
// Chain Specification
// =============================================================================

/// Static description of the strike band to track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSpec {
    instrument_prefix: String,
    expiry: String,
    range: i64,
    step: i64,
}

impl ChainSpec {
    /// Create a validated chain specification.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::InvalidConfiguration` if `step` is not positive
    /// or `range` is negative.
    pub fn new(
        instrument_prefix: impl Into<String>,
        expiry: impl Into<String>,
        range: i64,
        step: i64,
    ) -> Result<Self, ChainError> {
        if step <= 0 {
            return Err(ChainError::InvalidConfiguration(format!(
                "strike step must be positive, got {step}"
            )));
        }
        if range < 0 {
            return Err(ChainError::InvalidConfiguration(format!(
                "strike range must not be negative, got {range}"
            )));
        }

        Ok(Self {
            instrument_prefix: instrument_prefix.into(),
            expiry: expiry.into(),
            range,
            step,
        })
    }

    /// Instrument identifier prefix (e.g. `NFO:NIFTY`).
    #[must_use]
    pub fn instrument_prefix(&self) -> &str {
        &self.instrument_prefix
    }

    /// Expiry token.
    #[must_use]
    pub fn expiry(&self) -> &str {
        &self.expiry
    }

    /// Distance from the anchor to the outermost strikes.
    #[must_use]
    pub const fn range(&self) -> i64 {
        self.range
    }

    /// Distance between adjacent strikes.
    #[must_use]
    pub const fn step(&self) -> i64 {
        self.step
    }

    /// Round a reference price to the nearest multiple of the step.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::InvalidReferencePrice` if the price is not
    /// positive or the anchor does not fit in an `i64`.
    pub fn atm_anchor(&self, reference_price: Decimal) -> Result<i64, ChainError> {
        if reference_price <= Decimal::ZERO {
            return Err(ChainError::InvalidReferencePrice(reference_price));
        }

        let step = Decimal::from(self.step);
        (reference_price / step)
            .round()
            .checked_mul(step)
            .and_then(|anchor| anchor.to_i64())
            .ok_or(ChainError::InvalidReferencePrice(reference_price))
    }

    /// Strikes in `[anchor - range, anchor + range]`, ascending.
    ///
    /// Non-positive strikes are skipped.
    #[must_use]
    pub fn strikes(&self, anchor: i64) -> Vec<i64> {
        let low = anchor.saturating_sub(self.range);
        let high = anchor.saturating_add(self.range);

        let mut strikes = Vec::new();
        let mut strike = low;
        while strike <= high {
            if strike > 0 {
                strikes.push(strike);
            }
            match strike.checked_add(self.step) {
                Some(next) => strike = next,
                None => break,
            }
        }
        strikes
    }

    /// Display symbol for a strike and side.
    #[must_use]
    pub fn symbol(strike: i64, side: OptionSide) -> Symbol {
        format!("{strike}{}", side.suffix())
    }

    /// Instrument identifier for a strike and side.
    #[must_use]
    pub fn instrument(&self, strike: i64, side: OptionSide) -> InstrumentId {
        format!(
            "{}{}{strike}{}",
            self.instrument_prefix,
            self.expiry,
            side.suffix()
        )
    }
}

// =============================================================================
// Tracked Set
// =============================================================================

/// Immutable mapping from display symbol to instrument identifier.
///
/// Regeneration produces a fresh `TrackedSet`; an existing set is never
/// edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedSet {
    anchor: Option<i64>,
    entries: BTreeMap<Symbol, InstrumentId>,
}

impl TrackedSet {
    /// Create an empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            anchor: None,
            entries: BTreeMap::new(),
        }
    }

    /// ATM anchor this set was generated around, if any.
    #[must_use]
    pub const fn anchor(&self) -> Option<i64> {
        self.anchor
    }

    /// Number of tracked symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no symbols are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tracked symbols in lexical order.
    #[must_use]
    pub fn symbols(&self) -> Vec<Symbol> {
        self.entries.keys().cloned().collect()
    }

    /// Instrument identifiers, ordered by their symbol.
    #[must_use]
    pub fn instruments(&self) -> Vec<InstrumentId> {
        self.entries.values().cloned().collect()
    }

    /// Instrument identifier for a symbol.
    #[must_use]
    pub fn instrument(&self, symbol: &str) -> Option<&InstrumentId> {
        self.entries.get(symbol)
    }

    /// Iterate `(symbol, instrument)` pairs in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &InstrumentId)> {
        self.entries.iter()
    }
}

// =============================================================================
// Generation
// =============================================================================

/// Generate the tracked set around a reference price.
///
/// # Errors
///
/// Returns `ChainError::InvalidReferencePrice` if the reference price cannot
/// be anchored.
///
/// # Example
///
/// ```rust
/// use oi_tracker::domain::chain::{ChainSpec, generate};
/// use rust_decimal::Decimal;
///
/// let spec = ChainSpec::new("NFO:NIFTY", "26203", 500, 50).unwrap();
/// let set = generate(Decimal::from(25230), &spec).unwrap();
///
/// assert_eq!(set.anchor(), Some(25250));
/// assert_eq!(set.len(), 42);
/// assert_eq!(
///     set.instrument("24750CE").map(String::as_str),
///     Some("NFO:NIFTY2620324750CE")
/// );
/// ```
pub fn generate(reference_price: Decimal, spec: &ChainSpec) -> Result<TrackedSet, ChainError> {
    let anchor = spec.atm_anchor(reference_price)?;

    let mut entries = BTreeMap::new();
    for strike in spec.strikes(anchor) {
        for side in OptionSide::all() {
            entries.insert(
                ChainSpec::symbol(strike, *side),
                spec.instrument(strike, *side),
            );
        }
    }

    Ok(TrackedSet {
        anchor: Some(anchor),
        entries,
    })
}

// =============================================================================
// Errors
// =============================================================================

/// Chain generation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// Strike range or step is unusable.
    #[error("invalid chain configuration: {0}")]
    InvalidConfiguration(String),

    /// Reference price cannot be anchored to a strike.
    #[error("invalid reference price: {0}")]
    InvalidReferencePrice(Decimal),
}

// =============================================================================
// Tests
// =============================================================================
