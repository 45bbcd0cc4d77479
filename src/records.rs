use crate::error::Result;
use crate::types::RawRecord;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Read a JSON array of records
pub fn read_records<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let records: Vec<RawRecord> = serde_json::from_reader(reader)?;
    debug!("Read {} raw records", records.len());
    Ok(records)
}

pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<RawRecord>> {
    let file = File::open(path)?;
    read_records(BufReader::new(file))
}
