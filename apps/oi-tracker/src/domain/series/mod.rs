//! Open-Interest Time Series
//!
//! In-memory, append-only series of open-interest observations keyed by
//! symbol.
//!
//! # Design
//!
//! The store holds one `Vec<Observation>` per symbol behind a single
//! `RwLock`. Writers take the lock only to push onto the tail; readers take
//! it only to clone a snapshot. A reader therefore sees each series as some
//! prefix of its eventual contents, never a partially written observation.
//!
//! `append_batch` applies all observations of one sampling iteration under a
//! single write lock, so a concurrent reader sees either none or all of
//! them.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Local, Timelike};
use parking_lot::RwLock;
use serde::ser::{Serialize, SerializeTuple, Serializer};

use crate::domain::chain::Symbol;

/// Display format for observation timestamps.
pub const TIME_FORMAT: &str = "%H:%M";

// =============================================================================
// Observation
// =============================================================================

/// A single sampled open-interest value.
///
/// Serializes as the pair `["HH:MM", value]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    at: DateTime<Local>,
    value: u64,
}

impl Observation {
    /// Create an observation, truncating the timestamp to the minute.
    #[must_use]
    pub fn new(at: DateTime<Local>, value: u64) -> Self {
        Self {
            at: truncate_to_minute(at),
            value,
        }
    }

    /// Create an observation stamped with the current local time.
    #[must_use]
    pub fn now(value: u64) -> Self {
        Self::new(Local::now(), value)
    }

    /// Minute-resolution timestamp.
    #[must_use]
    pub const fn at(&self) -> DateTime<Local> {
        self.at
    }

    /// Sampled open interest.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.value
    }

    /// Timestamp rendered as `HH:MM`.
    #[must_use]
    pub fn label(&self) -> String {
        self.at.format(TIME_FORMAT).to_string()
    }
}

impl Serialize for Observation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&self.label())?;
        pair.serialize_element(&self.value)?;
        pair.end()
    }
}

fn truncate_to_minute(at: DateTime<Local>) -> DateTime<Local> {
    at.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}

// =============================================================================
// Time-Series Store
// =============================================================================

/// Thread-safe store of per-symbol observation series.
///
/// Series are created lazily on first append and never truncated.
///
/// # Example
///
/// ```rust
/// use oi_tracker::domain::series::{Observation, TimeSeriesStore};
///
/// let store = TimeSeriesStore::new();
/// store.append("25200CE", Observation::now(1_200));
/// store.append("25200CE", Observation::now(1_350));
///
/// let series = store.get("25200CE");
/// assert_eq!(series.len(), 2);
/// assert_eq!(series[1].value(), 1_350);
///
/// assert!(store.get("UNKNOWN").is_empty());
/// ```
#[derive(Debug, Default)]
pub struct TimeSeriesStore {
    series: RwLock<HashMap<Symbol, Vec<Observation>>>,
}

impl TimeSeriesStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one observation to the tail of a symbol's series.
    pub fn append(&self, symbol: &str, observation: Observation) {
        let mut series = self.series.write();
        push(&mut series, symbol, observation);
    }

    /// Append a whole iteration's observations under one write lock.
    ///
    /// Returns the number of observations appended.
    pub fn append_batch<I>(&self, batch: I) -> usize
    where
        I: IntoIterator<Item = (Symbol, Observation)>,
    {
        let mut series = self.series.write();
        let mut appended = 0;
        for (symbol, observation) in batch {
            push(&mut series, &symbol, observation);
            appended += 1;
        }
        appended
    }

    /// Snapshot of a symbol's series (empty if never sampled).
    #[must_use]
    pub fn get(&self, symbol: &str) -> Vec<Observation> {
        self.series.read().get(symbol).cloned().unwrap_or_default()
    }

    /// Snapshots for several symbols taken under one read lock.
    ///
    /// Every requested symbol is present in the result; unknown symbols map
    /// to an empty series.
    #[must_use]
    pub fn get_many<'a, I>(&self, symbols: I) -> BTreeMap<Symbol, Vec<Observation>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let series = self.series.read();
        symbols
            .into_iter()
            .map(|symbol| {
                let snapshot = series.get(symbol).cloned().unwrap_or_default();
                (symbol.to_string(), snapshot)
            })
            .collect()
    }

    /// Symbols with at least one stored observation.
    #[must_use]
    pub fn keys(&self) -> BTreeSet<Symbol> {
        self.series
            .read()
            .iter()
            .filter(|(_, observations)| !observations.is_empty())
            .map(|(symbol, _)| symbol.clone())
            .collect()
    }

    /// Number of series in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.read().len()
    }

    /// Whether the store holds no series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.read().is_empty()
    }

    /// Total observations across all series.
    #[must_use]
    pub fn observation_count(&self) -> usize {
        self.series.read().values().map(Vec::len).sum()
    }
}

fn push(series: &mut HashMap<Symbol, Vec<Observation>>, symbol: &str, observation: Observation) {
    if let Some(existing) = series.get_mut(symbol) {
        existing.push(observation);
    } else {
        series.insert(symbol.to_string(), vec![observation]);
    }
}

// =============================================================================
// Tests
// =============================================================================
