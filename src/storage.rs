use crate::models::DataRecord;
use anyhow::Result;
use csv::WriterBuilder;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Reserved columns appended after the dimension columns.
const RESERVED: [&str; 4] = ["value", "period", "ei", "year"];

/// Save records as CSV with header.
///
/// Columns are the sorted union of all dimension labels followed by the
/// reserved columns; records missing a dimension get an empty cell.
pub fn save_csv<P: AsRef<Path>>(records: &[DataRecord], path: P) -> Result<()> {
    write_csv(records, File::create(path)?)
}

/// CSV writer backing [`save_csv`], usable with any sink.
pub fn write_csv<W: Write>(records: &[DataRecord], sink: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(sink);
    let labels: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.dimensions.keys().map(String::as_str))
        .collect();
    let mut header: Vec<&str> = labels.iter().copied().collect();
    header.extend(RESERVED);
    wtr.write_record(&header)?;
    for r in records {
        let mut row: Vec<String> = labels
            .iter()
            .map(|label| r.dimensions.get(*label).cloned().unwrap_or_default())
            .collect();
        row.push(r.value.to_string());
        row.push(r.period.clone());
        row.push(r.unit.clone());
        row.push(r.year.to_string());
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save records as a pretty JSON array (dimensions flattened beside the
/// reserved keys).
pub fn save_json<P: AsRef<Path>>(records: &[DataRecord], path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(records)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
