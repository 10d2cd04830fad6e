use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;
use tracing::info;

static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{3}$").unwrap());

#[derive(Debug, Deserialize)]
struct RateRow {
    #[serde(rename = "Currency")]
    currency: String,
    #[serde(rename = "Rate")]
    rate: f64,
}

/// Currency-code → USD multiplier table, read-only after load.
#[derive(Debug, Clone)]
pub struct ExchangeRates {
    rates: HashMap<String, f64>,
}

impl ExchangeRates {
    /// Load a `Currency,Rate` CSV (with header). Any malformed row,
    /// non-positive rate, invalid code, or duplicate code is fatal.
    pub fn from_csv_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open rate table {}", path.display()))?;

        let mut rates = HashMap::new();
        for row in reader.deserialize() {
            let row: RateRow = row
                .with_context(|| format!("Malformed row in rate table {}", path.display()))?;
            if !CODE_RE.is_match(&row.currency) {
                bail!("invalid currency code {:?} in {}", row.currency, path.display());
            }
            if !row.rate.is_finite() || row.rate <= 0.0 {
                bail!(
                    "invalid rate {} for {} in {}",
                    row.rate,
                    row.currency,
                    path.display()
                );
            }
            if rates.insert(row.currency.clone(), row.rate).is_some() {
                bail!("duplicate currency {} in {}", row.currency, path.display());
            }
        }

        info!("Loaded {} exchange rates from {}", rates.len(), path.display());
        Ok(Self { rates })
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Rate for `code`, or an error naming the missing currency.
    pub fn require(&self, code: &str) -> Result<f64> {
        self.get(code)
            .with_context(|| format!("currency {} missing from rate table", code))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, f64)]) -> Self {
        Self {
            rates: pairs.iter().map(|(c, r)| (c.to_string(), *r)).collect(),
        }
    }
}

// ── Tests ──
