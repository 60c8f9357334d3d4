use crate::error::Result;
use crate::models::ObservationRecord;
use std::fs::File;
use std::path::Path;

pub struct PartitionReader;

impl PartitionReader {
    /// Read every row of a partition file. A missing or zero-length file
    /// reads as an empty partition.
    pub fn read(path: &Path) -> Result<Vec<ObservationRecord>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(file);

        let mut records = Vec::new();
        for result in reader.deserialize() {
            records.push(result?);
        }

        Ok(records)
    }
}
