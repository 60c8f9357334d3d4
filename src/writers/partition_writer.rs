use crate::error::Result;
use crate::models::ObservationRecord;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

pub struct PartitionWriter;

impl PartitionWriter {
    /// Replace the partition at `path` with `records`.
    ///
    /// Rows go to a temporary file beside the target which is then renamed
    /// over it, so a failed write leaves the previous file in place. The
    /// header row is always written, even for an empty partition.
    pub fn write(records: &[ObservationRecord], path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut temp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(temp.as_file_mut());
            writer.write_record(ObservationRecord::FIELDS)?;
            for record in records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }
        temp.as_file_mut().sync_all()?;
        temp.persist(path)?;

        Ok(())
    }

    /// Create an empty partition file if none exists yet.
    pub fn touch(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        if !path.exists() {
            fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?
                .flush()?;
        }
        Ok(())
    }
}
