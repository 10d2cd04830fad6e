use std::path::Path;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use tracing::info;

use crate::transform::EnrichedRecord;

static TABLE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

pub fn connect<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let path = path.as_ref();
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    Ok(conn)
}

/// Drop any existing `table` and repopulate it from `records`, all in one
/// transaction: readers never see a half-written table.
pub fn replace_table(conn: &Connection, table: &str, records: &[EnrichedRecord]) -> Result<()> {
    validate_table_name(table)?;

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {t};
         CREATE TABLE {t} (
             Name            TEXT NOT NULL,
             MC_USD_Billion  REAL NOT NULL,
             MC_GBP_Billion  REAL NOT NULL,
             MC_EUR_Billion  REAL NOT NULL,
             MC_INR_Billion  REAL NOT NULL
         );",
        t = table
    ))?;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {}
             (Name, MC_USD_Billion, MC_GBP_Billion, MC_EUR_Billion, MC_INR_Billion)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            table
        ))?;
        for r in records {
            stmt.execute(rusqlite::params![
                r.name,
                r.mc_usd_billion,
                r.mc_gbp_billion,
                r.mc_eur_billion,
                r.mc_inr_billion,
            ])?;
        }
    }
    tx.commit()?;

    info!("Loaded {} rows into table {}", records.len(), table);
    Ok(())
}

/// The three fixed report queries, in run order.
pub fn report_queries(table: &str) -> Result<[String; 3]> {
    validate_table_name(table)?;
    Ok([
        format!("SELECT * FROM {}", table),
        format!("SELECT AVG(MC_GBP_Billion) FROM {}", table),
        format!("SELECT Name FROM {} LIMIT 5", table),
    ])
}

/// Result of a read query: column names plus stringified rows.
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn run_query(conn: &Connection, sql: &str) -> Result<QueryOutput> {
    let mut stmt = conn
        .prepare(sql)
        .with_context(|| format!("Failed to prepare query: {}", sql))?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let ncols = columns.len();

    let mut out = Vec::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(ncols);
        for i in 0..ncols {
            cells.push(format_value(row.get_ref(i)?));
        }
        out.push(cells);
    }

    Ok(QueryOutput { columns, rows: out })
}

impl QueryOutput {
    /// Print as an aligned text table.
    pub fn print(&self) {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.len()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.len());
            }
        }

        let header = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = w))
            .collect::<Vec<_>>()
            .join(" | ");
        println!("{}", header);
        println!("{}", "-".repeat(header.len()));

        for row in &self.rows {
            let line = row
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<width$}", c, width = w))
                .collect::<Vec<_>>()
                .join(" | ");
            println!("{}", line);
        }
        println!("({} rows)", self.rows.len());
    }
}

fn format_value(value: ValueRef) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

/// Table names are interpolated into SQL, so keep them to identifiers.
fn validate_table_name(name: &str) -> Result<()> {
    if !TABLE_NAME_RE.is_match(name) {
        bail!("invalid table name {:?}", name);
    }
    Ok(())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, usd: f64) -> EnrichedRecord {
        EnrichedRecord {
            name: name.to_string(),
            mc_usd_billion: usd,
            mc_gbp_billion: usd * 0.8,
            mc_eur_billion: usd * 0.9,
            mc_inr_billion: usd * 90.0,
        }
    }

    fn memory_db() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn load_and_select_all() {
        let conn = memory_db();
        replace_table(&conn, "Largest_banks", &[record("BankA", 10.0)]).unwrap();

        let out = run_query(&conn, "SELECT * FROM Largest_banks").unwrap();
        assert_eq!(out.columns, EnrichedRecord::COLUMNS);
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0][0], "BankA");
        assert_eq!(out.rows[0][1], "10");
    }

    #[test]
    fn second_load_fully_replaces_first() {
        let conn = memory_db();
        replace_table(
            &conn,
            "Largest_banks",
            &[record("Old A", 1.0), record("Old B", 2.0)],
        )
        .unwrap();
        replace_table(&conn, "Largest_banks", &[record("New", 3.0)]).unwrap();

        let out = run_query(&conn, "SELECT Name FROM Largest_banks").unwrap();
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0][0], "New");
    }

    #[test]
    fn preserves_insertion_order() {
        let conn = memory_db();
        let records: Vec<EnrichedRecord> = ["C", "A", "B"].iter().map(|n| record(n, 1.0)).collect();
        replace_table(&conn, "Largest_banks", &records).unwrap();

        let out = run_query(&conn, "SELECT Name FROM Largest_banks").unwrap();
        let names: Vec<&str> = out.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(names, ["C", "A", "B"]);
    }

    #[test]
    fn average_query() {
        let conn = memory_db();
        replace_table(
            &conn,
            "Largest_banks",
            &[record("A", 10.0), record("B", 20.0)],
        )
        .unwrap();

        // GBP column is usd * 0.8, so the average of 8 and 16.
        let out = run_query(&conn, "SELECT AVG(MC_GBP_Billion) FROM Largest_banks").unwrap();
        assert_eq!(out.rows[0][0], "12");
    }

    #[test]
    fn limit_over_short_table_returns_all_rows() {
        let conn = memory_db();
        replace_table(&conn, "Largest_banks", &[record("A", 1.0), record("B", 2.0)]).unwrap();

        let out = run_query(&conn, "SELECT Name FROM Largest_banks LIMIT 5").unwrap();
        assert_eq!(out.rows.len(), 2);
    }

    #[test]
    fn empty_record_set_creates_empty_table() {
        let conn = memory_db();
        replace_table(&conn, "Largest_banks", &[]).unwrap();

        let out = run_query(&conn, "SELECT * FROM Largest_banks").unwrap();
        assert_eq!(out.columns, EnrichedRecord::COLUMNS);
        assert!(out.rows.is_empty());
    }

    #[test]
    fn query_against_missing_table_is_fatal() {
        let conn = memory_db();
        assert!(run_query(&conn, "SELECT * FROM nowhere").is_err());
    }

    #[test]
    fn rejects_non_identifier_table_names() {
        let conn = memory_db();
        let err = replace_table(&conn, "banks; DROP TABLE x", &[]).unwrap_err();
        assert!(err.to_string().contains("invalid table name"));
        assert!(report_queries("bad name").is_err());
    }

    #[test]
    fn report_queries_reference_the_table() {
        let queries = report_queries("Largest_banks").unwrap();
        assert_eq!(queries[0], "SELECT * FROM Largest_banks");
        assert!(queries[1].contains("AVG(MC_GBP_Billion)"));
        assert!(queries[2].ends_with("LIMIT 5"));
    }
}
