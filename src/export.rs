use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::transform::EnrichedRecord;

/// Write the enriched records to `path` as CSV, overwriting any existing
/// file. The header row comes from the record's serialized field names.
pub fn save_csv<P: AsRef<Path>>(records: &[EnrichedRecord], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;

    // serialize() only writes the header once it sees a record, so an
    // empty run needs the header written by hand.
    if records.is_empty() {
        writer.write_record(EnrichedRecord::COLUMNS)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write CSV file {}", path.display()))?;

    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

// ── Tests ──
