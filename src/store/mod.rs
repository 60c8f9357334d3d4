//! Day-partitioned, deduplicating observation store.
//!
//! Records accumulate in an in-memory working set scoped to the active
//! partition (today's UTC date at open time) and only reach disk on
//! [`PartitionedStore::flush`]. Every flush rewrites whole partition files
//! from deduplicated sets, keyed by `rawmetar`, with the first-seen row
//! winning. When the working set spans more than one day, each earlier day
//! is merged into its own file and the store moves on to the latest day.

pub mod summary;

pub use summary::PartitionSummary;

use crate::error::Result;
use crate::models::{ObservationRecord, PartitionKey};
use crate::readers::PartitionReader;
use crate::writers::PartitionWriter;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn, Span};

/// The partition file the working set belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePartition {
    pub key: PartitionKey,
    pub path: PathBuf,
}

impl ActivePartition {
    /// Resolve the file for `key` under `root`, creating it empty if absent.
    fn ensure(root: &Path, key: PartitionKey) -> Result<Self> {
        let path = key.path_under(root);
        PartitionWriter::touch(&path)?;
        Ok(Self { key, path })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushSummary {
    /// Active partition after the flush
    pub active: PartitionKey,
    /// Files rewritten, oldest first, with their row counts
    pub written: Vec<(PartitionKey, usize)>,
    /// Rows discarded from the working set as repeats
    pub duplicates_dropped: usize,
}

impl FlushSummary {
    pub fn spans_multiple_days(&self) -> bool {
        self.written.len() > 1
    }
}

pub struct PartitionedStore {
    target_dir: PathBuf,
    active: ActivePartition,
    working: Vec<ObservationRecord>,
    span: Span,
}

impl PartitionedStore {
    pub fn open(target_dir: impl Into<PathBuf>, span: Span) -> Result<Self> {
        Self::open_at(target_dir, Utc::now(), span)
    }

    /// Open with `now` deciding the active partition.
    pub fn open_at(target_dir: impl Into<PathBuf>, now: DateTime<Utc>, span: Span) -> Result<Self> {
        let target_dir = target_dir.into();
        let guard_span = span.clone();
        let _enter = guard_span.enter();

        fs::create_dir_all(&target_dir)?;
        let active = ActivePartition::ensure(&target_dir, PartitionKey::from_datetime(now))?;
        let working = PartitionReader::read(&active.path)?;

        info!(
            partition = %active.key,
            path = %active.path.display(),
            records = working.len(),
            "Loaded working set"
        );

        Ok(Self {
            target_dir,
            active,
            working,
            span,
        })
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn active(&self) -> &ActivePartition {
        &self.active
    }

    pub fn active_key(&self) -> PartitionKey {
        self.active.key
    }

    pub fn working(&self) -> &[ObservationRecord] {
        &self.working
    }

    pub fn len(&self) -> usize {
        self.working.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }

    /// Queue a record; nothing touches disk until [`flush`](Self::flush).
    pub fn append(&mut self, record: ObservationRecord) {
        self.working.push(record);
    }

    /// Persist the working set, reconciling any records that fall outside
    /// the active day.
    pub fn flush(&mut self) -> Result<FlushSummary> {
        let span = self.span.clone();
        let _enter = span.enter();

        let (unique, duplicates_dropped) = deduplicate(self.working.clone());
        if duplicates_dropped > 0 {
            debug!(duplicates_dropped, "Dropped repeated reports from working set");
        }
        self.working = unique;

        let mut by_day = partition_by_day(&self.working)?;
        // The active day always takes part so the working set never moves
        // to an earlier partition.
        by_day.entry(self.active.key).or_default();

        let days: Vec<PartitionKey> = by_day.keys().copied().collect();
        if days.len() > 1 {
            let dates: Vec<String> = days.iter().map(ToString::to_string).collect();
            warn!(
                days = days.len(),
                dates = ?dates,
                "Working set spans more than one day"
            );
        }

        let latest = days[days.len() - 1];
        let latest_records = by_day.remove(&latest).unwrap_or_default();

        let mut written = Vec::with_capacity(days.len());
        for (day, batch) in by_day {
            if batch.is_empty() {
                continue;
            }
            let count = self.merge_into_partition(day, batch)?;
            written.push((day, count));
        }

        self.transition_to(latest, latest_records)?;

        PartitionWriter::write(&self.working, &self.active.path)?;
        info!(
            partition = %self.active.key,
            records = self.working.len(),
            "Flushed active partition"
        );
        written.push((self.active.key, self.working.len()));

        Ok(FlushSummary {
            active: self.active.key,
            written,
            duplicates_dropped,
        })
    }

    /// Fold `batch` into the on-disk partition for `day`; existing rows win.
    fn merge_into_partition(&self, day: PartitionKey, batch: Vec<ObservationRecord>) -> Result<usize> {
        let path = day.path_under(&self.target_dir);
        let mut merged = PartitionReader::read(&path)?;
        let existing = merged.len();
        merged.extend(batch);

        let (merged, _) = deduplicate(merged);
        PartitionWriter::write(&merged, &path)?;

        info!(
            partition = %day,
            existing,
            added = merged.len().saturating_sub(existing),
            "Reconciled earlier partition"
        );
        Ok(merged.len())
    }

    /// Move to the partition for `key` together with the records that
    /// belong to it. Both fields change together or not at all.
    fn transition_to(&mut self, key: PartitionKey, records: Vec<ObservationRecord>) -> Result<()> {
        if key != self.active.key {
            let next = ActivePartition::ensure(&self.target_dir, key)?;
            info!(from = %self.active.key, to = %next.key, "Switching active partition");
            self.active = next;
        }
        self.working = records;
        Ok(())
    }
}

/// Keep the first record seen for each `rawmetar`; returns the survivors in
/// their original order and how many were discarded.
pub fn deduplicate(records: Vec<ObservationRecord>) -> (Vec<ObservationRecord>, usize) {
    let total = records.len();
    let mut seen = HashSet::with_capacity(total);
    let unique: Vec<ObservationRecord> = records
        .into_iter()
        .filter(|record| seen.insert(record.rawmetar.clone()))
        .collect();
    let dropped = total - unique.len();
    (unique, dropped)
}

fn partition_by_day(
    records: &[ObservationRecord],
) -> Result<BTreeMap<PartitionKey, Vec<ObservationRecord>>> {
    let mut by_day: BTreeMap<PartitionKey, Vec<ObservationRecord>> = BTreeMap::new();
    for record in records {
        by_day
            .entry(record.partition_key()?)
            .or_default()
            .push(record.clone());
    }
    Ok(by_day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::observation::tests::sample_record;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 10, day, hour, minute, 0).unwrap()
    }

    fn key(s: &str) -> PartitionKey {
        PartitionKey::parse(s).unwrap()
    }

    fn raw_reports(records: &[ObservationRecord]) -> Vec<&str> {
        records.iter().map(|r| r.rawmetar.as_str()).collect()
    }

    #[test]
    fn test_open_creates_empty_partition() -> Result<()> {
        let dir = TempDir::new()?;
        let store = PartitionedStore::open_at(dir.path(), at(18, 12, 0), Span::none())?;

        assert_eq!(store.active_key(), key("20231018"));
        assert_eq!(store.active().path, dir.path().join("2023/10/20231018.csv"));
        assert!(store.active().path.exists());
        assert!(store.is_empty());
        Ok(())
    }

    #[test]
    fn test_open_loads_existing_partition() -> Result<()> {
        let dir = TempDir::new()?;
        let path = key("20231018").path_under(dir.path());
        PartitionWriter::write(&[sample_record(at(18, 1, 0).timestamp(), "A")], &path)?;

        let store = PartitionedStore::open_at(dir.path(), at(18, 12, 0), Span::none())?;

        assert_eq!(raw_reports(store.working()), vec!["A"]);
        Ok(())
    }

    #[test]
    fn test_append_is_not_written_until_flush() -> Result<()> {
        let dir = TempDir::new()?;
        let mut store = PartitionedStore::open_at(dir.path(), at(18, 12, 0), Span::none())?;

        store.append(sample_record(at(18, 11, 0).timestamp(), "A"));
        assert!(PartitionReader::read(&store.active().path)?.is_empty());

        store.flush()?;
        assert_eq!(PartitionReader::read(&store.active().path)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_deduplicate_keeps_first_seen() {
        let first = sample_record(100, "SAME");
        let mut second = sample_record(200, "SAME");
        second.temperature_c = -5.0;

        let (unique, dropped) = deduplicate(vec![
            first.clone(),
            sample_record(150, "OTHER"),
            second,
        ]);

        assert_eq!(dropped, 1);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0], first);
        assert_eq!(unique[1].rawmetar, "OTHER");
    }

    #[test]
    fn test_flush_deduplicates_and_is_idempotent() -> Result<()> {
        let dir = TempDir::new()?;
        let mut store = PartitionedStore::open_at(dir.path(), at(18, 12, 0), Span::none())?;

        store.append(sample_record(at(18, 10, 0).timestamp(), "A"));
        store.append(sample_record(at(18, 10, 30).timestamp(), "B"));
        store.append(sample_record(at(18, 11, 0).timestamp(), "A"));

        let summary = store.flush()?;
        assert_eq!(summary.duplicates_dropped, 1);
        assert_eq!(summary.written, vec![(key("20231018"), 2)]);
        assert!(!summary.spans_multiple_days());
        let once = fs::read_to_string(&store.active().path)?;

        let summary = store.flush()?;
        assert_eq!(summary.duplicates_dropped, 0);
        let twice = fs::read_to_string(&store.active().path)?;

        assert_eq!(once, twice);
        let on_disk = PartitionReader::read(&store.active().path)?;
        assert_eq!(raw_reports(&on_disk), vec!["A", "B"]);
        assert_eq!(on_disk[0].timestamp, at(18, 10, 0).timestamp());
        Ok(())
    }

    #[test]
    fn test_cross_midnight_reconciliation() -> Result<()> {
        let dir = TempDir::new()?;
        let day_path = key("20231018").path_under(dir.path());

        let mut store = PartitionedStore::open_at(dir.path(), at(18, 23, 50), Span::none())?;
        // Another run wrote to the same day after this store opened
        PartitionWriter::write(&[sample_record(at(18, 22, 0).timestamp(), "EARLIER")], &day_path)?;

        store.append(sample_record(at(18, 23, 55).timestamp(), "D"));
        store.append(sample_record(at(19, 0, 5).timestamp(), "D+1"));

        let summary = store.flush()?;

        assert_eq!(summary.active, key("20231019"));
        assert_eq!(
            summary.written,
            vec![(key("20231018"), 2), (key("20231019"), 1)]
        );
        assert!(summary.spans_multiple_days());

        assert_eq!(
            raw_reports(&PartitionReader::read(&day_path)?),
            vec!["EARLIER", "D"]
        );
        let next_path = key("20231019").path_under(dir.path());
        assert_eq!(store.active().path, next_path);
        assert_eq!(raw_reports(&PartitionReader::read(&next_path)?), vec!["D+1"]);
        assert_eq!(raw_reports(store.working()), vec!["D+1"]);
        Ok(())
    }

    #[test]
    fn test_reconciliation_does_not_duplicate_existing_rows() -> Result<()> {
        let dir = TempDir::new()?;
        let day_path = key("20231018").path_under(dir.path());
        PartitionWriter::write(&[sample_record(at(18, 22, 0).timestamp(), "A")], &day_path)?;

        let mut store = PartitionedStore::open_at(dir.path(), at(18, 23, 0), Span::none())?;
        store.append(sample_record(at(18, 22, 0).timestamp(), "A"));
        store.append(sample_record(at(19, 0, 10).timestamp(), "B"));
        store.flush()?;

        assert_eq!(raw_reports(&PartitionReader::read(&day_path)?), vec!["A"]);
        Ok(())
    }

    #[test]
    fn test_every_earlier_day_is_reconciled() -> Result<()> {
        let dir = TempDir::new()?;
        let mut store = PartitionedStore::open_at(dir.path(), at(18, 12, 0), Span::none())?;

        store.append(sample_record(at(17, 23, 0).timestamp(), "D-1"));
        store.append(sample_record(at(18, 12, 0).timestamp(), "D"));
        store.append(sample_record(at(19, 0, 30).timestamp(), "D+1"));

        let summary = store.flush()?;

        assert_eq!(summary.active, key("20231019"));
        for (day, raw) in [("20231017", "D-1"), ("20231018", "D"), ("20231019", "D+1")] {
            let records = PartitionReader::read(&key(day).path_under(dir.path()))?;
            assert_eq!(raw_reports(&records), vec![raw], "partition {}", day);
        }
        Ok(())
    }

    #[test]
    fn test_late_batch_for_previous_day_keeps_active_day() -> Result<()> {
        let dir = TempDir::new()?;
        let mut store = PartitionedStore::open_at(dir.path(), at(18, 0, 5), Span::none())?;

        store.append(sample_record(at(17, 23, 50).timestamp(), "LATE"));
        let summary = store.flush()?;

        assert_eq!(summary.active, key("20231018"));
        assert_eq!(
            raw_reports(&PartitionReader::read(&key("20231017").path_under(dir.path()))?),
            vec!["LATE"]
        );
        assert!(PartitionReader::read(&store.active().path)?.is_empty());
        assert!(store.is_empty());
        Ok(())
    }

    #[test]
    fn test_empty_flush_writes_header_only() -> Result<()> {
        let dir = TempDir::new()?;
        let mut store = PartitionedStore::open_at(dir.path(), at(18, 12, 0), Span::none())?;

        let summary = store.flush()?;

        assert_eq!(summary.written, vec![(key("20231018"), 0)]);
        let content = fs::read_to_string(&store.active().path)?;
        assert_eq!(content.trim_end(), ObservationRecord::FIELDS.join(","));
        Ok(())
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_multi_day_flush_emits_warning() -> Result<()> {
        let dir = TempDir::new()?;
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || -> Result<()> {
            let mut store = PartitionedStore::open_at(dir.path(), at(18, 23, 0), Span::none())?;
            store.append(sample_record(at(18, 23, 30).timestamp(), "D"));
            store.flush()?;
            store.append(sample_record(at(18, 23, 40).timestamp(), "D2"));
            store.append(sample_record(at(19, 0, 30).timestamp(), "D+1"));
            store.flush()?;
            Ok(())
        })?;

        let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        let warnings: Vec<&str> = output.lines().filter(|l| l.contains("WARN")).collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("20231018"));
        assert!(warnings[0].contains("20231019"));
        Ok(())
    }
}
