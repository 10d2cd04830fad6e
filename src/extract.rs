use anyhow::{bail, Context, Result};
use scraper::{Html, Selector};
use tracing::{info, warn};

use crate::config::MissingTablePolicy;
use crate::joblog::JobLog;

/// One row of the market-cap table: bank name plus market capitalization
/// in billions of USD, as printed on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct BankRecord {
    pub name: String,
    pub mc_usd_billion: f64,
}

/// Fetch the page and extract the market-cap table.
///
/// Row-level parse failures are logged and skipped; a page with no
/// matching table is handled according to `policy`.
pub async fn extract(
    url: &str,
    policy: MissingTablePolicy,
    log: &JobLog,
) -> Result<Vec<BankRecord>> {
    let html = fetch_document(url).await?;
    match parse_records(&html, log)? {
        Some(records) => Ok(records),
        None => match policy {
            MissingTablePolicy::Continue => Ok(Vec::new()),
            MissingTablePolicy::Fail => bail!("no market-cap table found at {}", url),
        },
    }
}

/// Fetch the document at `url`. Any network or HTTP error is fatal.
pub async fn fetch_document(url: &str) -> Result<String> {
    let client = reqwest::Client::new();
    let html = client
        .get(url)
        .send()
        .await
        .and_then(|resp| resp.error_for_status())
        .with_context(|| format!("Failed to fetch {}", url))?
        .text()
        .await
        .context("Failed to read response body")?;
    Ok(html)
}

/// Parse the first wikitable-sortable table into bank records, preserving
/// document row order. Returns `None` when no table matches (logged).
pub fn parse_records(html: &str, log: &JobLog) -> Result<Option<Vec<BankRecord>>> {
    let table_sel = Selector::parse("table").expect("table selector should parse");
    let target_sel =
        Selector::parse("table.wikitable.sortable").expect("target selector should parse");
    let row_sel = Selector::parse("tbody tr").expect("row selector should parse");
    let cell_sel = Selector::parse("td").expect("cell selector should parse");

    let document = Html::parse_document(html);
    info!(
        "{} tables on the page",
        document.select(&table_sel).count()
    );

    let table = match document.select(&target_sel).next() {
        Some(t) => t,
        None => {
            log.record("No table found on the webpage.")?;
            warn!("No table found on the webpage");
            return Ok(None);
        }
    };

    let mut records = Vec::new();
    for row in table.select(&row_sel) {
        let cells: Vec<_> = row.select(&cell_sel).collect();
        // Header rows carry <th> cells only and fall through here too.
        if cells.len() < 3 {
            continue;
        }

        let name = cell_text(&cells[1]);
        let raw = cell_text(&cells[2]);
        match parse_market_cap(&raw) {
            Ok(mc_usd_billion) => records.push(BankRecord {
                name,
                mc_usd_billion,
            }),
            Err(e) => {
                log.record(&format!("Error extracting data: {}", e))?;
                warn!("Skipping row for {:?}: {}", name, e);
            }
        }
    }

    info!("Extracted {} bank records", records.len());
    Ok(Some(records))
}

fn cell_text(cell: &scraper::ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Parse a market-cap cell: strip thousands separators, require a
/// non-negative finite number.
fn parse_market_cap(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .replace(',', "")
        .parse()
        .with_context(|| format!("could not parse market cap {:?}", raw))?;
    if !value.is_finite() || value < 0.0 {
        bail!("market cap {:?} is not a non-negative number", raw);
    }
    Ok(value)
}

// ── Tests ──
