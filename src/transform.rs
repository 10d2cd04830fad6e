use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::extract::BankRecord;
use crate::rates::ExchangeRates;

/// A bank record with the derived currency columns. Field names are the
/// CSV/database column names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "MC_USD_Billion")]
    pub mc_usd_billion: f64,
    #[serde(rename = "MC_GBP_Billion")]
    pub mc_gbp_billion: f64,
    #[serde(rename = "MC_EUR_Billion")]
    pub mc_eur_billion: f64,
    #[serde(rename = "MC_INR_Billion")]
    pub mc_inr_billion: f64,
}

impl EnrichedRecord {
    /// Column order shared by the CSV file and the database table.
    pub const COLUMNS: [&'static str; 5] = [
        "Name",
        "MC_USD_Billion",
        "MC_GBP_Billion",
        "MC_EUR_Billion",
        "MC_INR_Billion",
    ];
}

/// Derive the GBP/EUR/INR columns from the USD column. Pure: the input
/// slice is left untouched. A missing required currency is fatal.
pub fn convert(records: &[BankRecord], rates: &ExchangeRates) -> Result<Vec<EnrichedRecord>> {
    let gbp = rates.require("GBP")?;
    let eur = rates.require("EUR")?;
    let inr = rates.require("INR")?;

    let enriched = records
        .iter()
        .map(|r| EnrichedRecord {
            name: r.name.clone(),
            mc_usd_billion: r.mc_usd_billion,
            mc_gbp_billion: round2(r.mc_usd_billion * gbp),
            mc_eur_billion: round2(r.mc_usd_billion * eur),
            mc_inr_billion: round2(r.mc_usd_billion * inr),
        })
        .collect::<Vec<_>>();

    info!("Converted {} records into 3 extra currencies", enriched.len());
    Ok(enriched)
}

/// Round half away from zero at two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rates() -> ExchangeRates {
        ExchangeRates::from_pairs(&[("GBP", 0.8), ("EUR", 0.9), ("INR", 90.0)])
    }

    fn bank(name: &str, usd: f64) -> BankRecord {
        BankRecord {
            name: name.to_string(),
            mc_usd_billion: usd,
        }
    }

    #[test]
    fn golden_values() {
        let records = [bank("BankA", 1234.50), bank("BankC", 10.00)];
        let out = convert(&records, &sample_rates()).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "BankA");
        assert_eq!(out[0].mc_gbp_billion, 987.60);
        assert_eq!(out[0].mc_eur_billion, 1111.05);
        assert_eq!(out[0].mc_inr_billion, 111105.00);
        assert_eq!(out[1].mc_gbp_billion, 8.00);
        assert_eq!(out[1].mc_eur_billion, 9.00);
        assert_eq!(out[1].mc_inr_billion, 900.00);
    }

    #[test]
    fn keeps_source_usd_value() {
        let records = [bank("BankA", 432.92)];
        let out = convert(&records, &sample_rates()).unwrap();
        assert_eq!(out[0].mc_usd_billion, 432.92);
    }

    #[test]
    fn output_length_matches_input() {
        let records: Vec<BankRecord> = (0..7).map(|i| bank("B", i as f64)).collect();
        let out = convert(&records, &sample_rates()).unwrap();
        assert_eq!(out.len(), records.len());
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let out = convert(&[], &sample_rates()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn missing_currency_is_fatal() {
        let rates = ExchangeRates::from_pairs(&[("GBP", 0.8), ("EUR", 0.9)]);
        let err = convert(&[bank("BankA", 1.0)], &rates).unwrap_err();
        assert!(err.to_string().contains("INR"));
    }

    #[test]
    fn rounds_to_two_decimals() {
        let rates = ExchangeRates::from_pairs(&[("GBP", 0.333), ("EUR", 0.9), ("INR", 90.0)]);
        let out = convert(&[bank("BankA", 10.0)], &rates).unwrap();
        assert_eq!(out[0].mc_gbp_billion, 3.33);
    }
}
