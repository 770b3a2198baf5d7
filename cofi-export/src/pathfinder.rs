//! pathfinder2 edge CSV ingestion
//!
//! Each row is `from,to,token_owner,capacity` with the capacity in hex.
//! The token owner only says whether the capacity repays existing debt or
//! extends new credit; it does not affect the amount, so rows for the same
//! `(from, to)` are summed regardless of token.

use crate::{Error, Result};
use capacity_core::{AccountId, Amount, AmountTable};
use num_traits::Num;
use std::io::Read;
use std::path::Path;

/// Columns per pathfinder2 row
pub const PATHFINDER2_COLUMNS: usize = 4;

/// Parse a hexadecimal capacity. The `0x` prefix is optional and a bare
/// `0x` reads as zero.
pub fn parse_capacity(text: &str) -> Result<Amount> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    if digits.is_empty() {
        return Ok(Amount::default());
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::Format(format!("invalid hex capacity {:?}", text)));
    }

    Amount::from_str_radix(digits, 16)
        .map_err(|e| Error::Format(format!("invalid hex capacity {:?}: {}", text, e)))
}

/// Read pathfinder2 edges, summing capacities per `(from, to)`
pub fn read_edges<R: Read>(reader: R) -> Result<AmountTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut table = AmountTable::new();
    let mut count = 0usize;

    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() != PATHFINDER2_COLUMNS {
            return Err(Error::Format(format!(
                "line {}: expected {} columns, found {}",
                line,
                PATHFINDER2_COLUMNS,
                record.len()
            )));
        }

        let capacity = parse_capacity(&record[3]).map_err(|e| match e {
            Error::Format(msg) => Error::Format(format!("line {}: {}", line, msg)),
            other => other,
        })?;
        table.accumulate(AccountId::new(&record[0]), AccountId::new(&record[1]), capacity);
        count += 1;
    }

    tracing::debug!(
        "Aggregated {} pathfinder2 rows into {} edges",
        count,
        table.edge_count()
    );
    Ok(table)
}

/// Read pathfinder2 edges from a file
pub fn read_edges_file(path: impl AsRef<Path>) -> Result<AmountTable> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let table = read_edges(std::io::BufReader::new(file))?;
    tracing::info!("Read {} edges from {}", table.edge_count(), path.display());
    Ok(table)
}
