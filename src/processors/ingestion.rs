use crate::decoder::MetarDecoder;
use crate::error::{IngestError, Result};
use crate::models::{ObservationRecord, Station, StationRegistry};
use crate::readers::ReportSource;
use crate::store::{FlushSummary, PartitionedStore};
use crate::utils::humidity::relative_humidity;
use crate::utils::progress::ProgressReporter;
use tracing::{debug, error, info, warn, Span};
use validator::Validate;

/// What became of one raw report
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    Accepted(ObservationRecord),
    /// Decoded, but required fields were absent
    Rejected { station_id: String, missing: Vec<&'static str> },
    /// The decoder could not read the text
    Undecodable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub undecodable: usize,
    pub flush: FlushSummary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The source reported a failure; the store was not touched
    FetchFailed,
    Completed(RunSummary),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }
}

pub struct IngestionPipeline<'a, D: MetarDecoder> {
    registry: &'a StationRegistry,
    decoder: D,
    span: Span,
}

impl<'a, D: MetarDecoder> IngestionPipeline<'a, D> {
    pub fn new(registry: &'a StationRegistry, decoder: D, span: Span) -> Self {
        Self {
            registry,
            decoder,
            span,
        }
    }

    /// Decode one raw report into a record, or `None` when it cannot be
    /// used. A station missing from the registry is an error.
    pub fn decode_report(&self, raw: &str) -> Result<Option<ObservationRecord>> {
        match self.process_report(raw)? {
            ReportOutcome::Accepted(record) => Ok(Some(record)),
            _ => Ok(None),
        }
    }

    pub fn process_report(&self, raw: &str) -> Result<ReportOutcome> {
        let _enter = self.span.enter();
        debug!(raw, "Parsing raw METAR");

        let decoded = match self.decoder.decode(raw) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(error = %e, "Dropping undecodable report");
                return Ok(ReportOutcome::Undecodable);
            }
        };

        let (time, temperature_c, dewpoint_c, pressure_mb, wind_direction, wind_speed) = match (
            decoded.time,
            decoded.temperature_c,
            decoded.dewpoint_c,
            decoded.pressure_mb,
            decoded.wind_direction_deg,
            decoded.wind_speed_kt,
        ) {
            (Some(time), Some(temp), Some(dewpt), Some(press), Some(dir), Some(speed)) => {
                (time, temp, dewpt, press, dir, speed)
            }
            _ => {
                let missing = decoded.missing_required();
                warn!(
                    station = %decoded.station_id,
                    missing = ?missing,
                    "METAR data invalid with missing fields"
                );
                return Ok(ReportOutcome::Rejected {
                    station_id: decoded.station_id,
                    missing,
                });
            }
        };

        let station = self.registry.lookup(&decoded.station_id)?;
        let humidity = relative_humidity(temperature_c, dewpoint_c);

        let record = ObservationRecord {
            timestamp: time.timestamp(),
            name: station.name.clone(),
            code: station.code4.clone(),
            lng: station.longitude,
            lat: station.latitude,
            ele: station.elevation.clone(),
            temperature_c,
            dewpoint_c,
            relativehumidity: humidity,
            pressure_mb,
            pressuresea_mb: decoded.sea_level_pressure_mb,
            winddirection_deg: wind_direction,
            windspeed_kt: wind_speed,
            windgust_kt: decoded.wind_gust_kt,
            rawmetar: raw.to_string(),
        };
        record.validate()?;

        debug!(
            station = %record.code,
            ts = record.timestamp,
            temp_c = record.temperature_c,
            pres_mb = record.pressure_mb,
            rh_pct = (record.relativehumidity * 100.0).round(),
            wind_deg = record.winddirection_deg.round(),
            wind_kt = record.windspeed_kt,
            "Decoded observation"
        );

        Ok(ReportOutcome::Accepted(record))
    }

    /// Fetch reports for `stations`, decode them into `store` and flush it.
    pub fn run<S: ReportSource>(
        &self,
        source: &S,
        stations: &[&Station],
        hours: u32,
        store: &mut PartitionedStore,
        progress: Option<&ProgressReporter>,
    ) -> Result<RunOutcome> {
        let reports = {
            let _enter = self.span.enter();
            match source.fetch(stations, hours) {
                Ok(reports) => reports,
                Err(e @ IngestError::FetchFailed(_)) => {
                    error!(error = %e, stations = stations.len(), hours, "Failed to fetch reports");
                    return Ok(RunOutcome::FetchFailed);
                }
                Err(e) => return Err(e),
            }
        };

        let mut accepted = 0;
        let mut rejected = 0;
        let mut undecodable = 0;

        for raw in &reports {
            match self.process_report(raw)? {
                ReportOutcome::Accepted(record) => {
                    store.append(record);
                    accepted += 1;
                }
                ReportOutcome::Rejected { .. } => rejected += 1,
                ReportOutcome::Undecodable => undecodable += 1,
            }
            if let Some(progress) = progress {
                progress.increment(1);
            }
        }

        let flush = store.flush()?;

        let _enter = self.span.enter();
        info!(
            fetched = reports.len(),
            accepted,
            rejected,
            undecodable,
            partition = %flush.active,
            "Ingestion pass complete"
        );

        Ok(RunOutcome::Completed(RunSummary {
            fetched: reports.len(),
            accepted,
            rejected,
            undecodable,
            flush,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::DecodedMetar;
    use crate::readers::PartitionReader;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Decoder returning canned results keyed by raw text.
    struct StubDecoder(HashMap<String, DecodedMetar>);

    impl MetarDecoder for StubDecoder {
        fn decode(&self, raw: &str) -> Result<DecodedMetar> {
            self.0
                .get(raw)
                .cloned()
                .ok_or_else(|| IngestError::decode(raw, "unknown"))
        }
    }

    struct StubSource(Result<Vec<String>>);

    impl ReportSource for StubSource {
        fn fetch(&self, _stations: &[&Station], _hours: u32) -> Result<Vec<String>> {
            match &self.0 {
                Ok(reports) => Ok(reports.clone()),
                Err(e) => Err(IngestError::FetchFailed(e.to_string())),
            }
        }
    }

    fn observed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 10, 18, 16, 51, 0).unwrap()
    }

    fn complete(station_id: &str) -> DecodedMetar {
        DecodedMetar {
            station_id: station_id.to_string(),
            time: Some(observed_at()),
            temperature_c: Some(20.0),
            dewpoint_c: Some(20.0),
            pressure_mb: Some(1013.2),
            sea_level_pressure_mb: None,
            wind_direction_deg: Some(270.0),
            wind_speed_kt: Some(12.0),
            wind_gust_kt: None,
        }
    }

    fn registry() -> StationRegistry {
        vec![Station::new(
            "NY".to_string(),
            "NEW YORK CITY".to_string(),
            "KNYC".to_string(),
            -73.983333,
            40.433333,
            "57".to_string(),
            String::new(),
        )]
        .into_iter()
        .collect()
    }

    fn stub(entries: Vec<(&str, DecodedMetar)>) -> StubDecoder {
        StubDecoder(
            entries
                .into_iter()
                .map(|(raw, decoded)| (raw.to_string(), decoded))
                .collect(),
        )
    }

    #[test]
    fn test_decode_report_builds_record() -> Result<()> {
        let registry = registry();
        let pipeline = IngestionPipeline::new(
            &registry,
            stub(vec![("KNYC RAW", complete("KNYC"))]),
            Span::none(),
        );

        let record = pipeline.decode_report("KNYC RAW")?.expect("record");

        assert_eq!(record.timestamp, observed_at().timestamp());
        assert_eq!(record.name, "NEW YORK CITY");
        assert_eq!(record.code, "KNYC");
        assert_eq!(record.ele, "57");
        assert!((record.relativehumidity - 1.0).abs() < 1e-12);
        assert_eq!(record.pressuresea_mb, None);
        assert_eq!(record.windgust_kt, None);
        assert_eq!(record.rawmetar, "KNYC RAW");
        Ok(())
    }

    #[test]
    fn test_missing_wind_speed_is_rejected_not_error() -> Result<()> {
        let registry = registry();
        let mut decoded = complete("KNYC");
        decoded.wind_speed_kt = None;
        let pipeline = IngestionPipeline::new(&registry, stub(vec![("RAW", decoded)]), Span::none());

        assert_eq!(pipeline.decode_report("RAW")?, None);
        assert_eq!(
            pipeline.process_report("RAW")?,
            ReportOutcome::Rejected {
                station_id: "KNYC".to_string(),
                missing: vec!["wind_speed"],
            }
        );
        Ok(())
    }

    #[derive(Clone, Default)]
    struct Capture(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_dropped_reports_are_logged_as_warnings() -> Result<()> {
        let registry = registry();
        let mut decoded = complete("KNYC");
        decoded.pressure_mb = None;
        let pipeline = IngestionPipeline::new(&registry, stub(vec![("RAW", decoded)]), Span::none());

        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || -> Result<()> {
            pipeline.process_report("RAW")?;
            pipeline.process_report("GARBAGE")?;
            Ok(())
        })?;

        let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        let warnings: Vec<&str> = output.lines().filter(|l| l.contains("WARN")).collect();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("pressure"));
        assert!(warnings[1].contains("undecodable"));
        Ok(())
    }

    #[test]
    fn test_optional_fields_may_be_absent() -> Result<()> {
        let registry = registry();
        let mut decoded = complete("KNYC");
        decoded.sea_level_pressure_mb = Some(1019.9);
        decoded.wind_gust_kt = Some(25.0);
        let pipeline = IngestionPipeline::new(&registry, stub(vec![("RAW", decoded)]), Span::none());

        let record = pipeline.decode_report("RAW")?.expect("record");
        assert_eq!(record.pressuresea_mb, Some(1019.9));
        assert_eq!(record.windgust_kt, Some(25.0));
        Ok(())
    }

    #[test]
    fn test_record_with_malformed_station_code_fails_validation() {
        let registry: StationRegistry = vec![Station::new(
            "NY".to_string(),
            "SHORT CODE".to_string(),
            "KX".to_string(),
            -73.983333,
            40.433333,
            "57".to_string(),
            String::new(),
        )]
        .into_iter()
        .collect();
        let pipeline =
            IngestionPipeline::new(&registry, stub(vec![("RAW", complete("KX"))]), Span::none());

        let result = pipeline.process_report("RAW");
        assert!(matches!(result, Err(IngestError::Validation(_))));
    }

    #[test]
    fn test_unknown_station_is_an_error() {
        let registry = registry();
        let pipeline =
            IngestionPipeline::new(&registry, stub(vec![("RAW", complete("KXYZ"))]), Span::none());

        assert!(matches!(
            pipeline.decode_report("RAW"),
            Err(IngestError::StationNotFound { .. })
        ));
    }

    #[test]
    fn test_undecodable_report_is_dropped() -> Result<()> {
        let registry = registry();
        let pipeline = IngestionPipeline::new(&registry, stub(vec![]), Span::none());

        assert_eq!(pipeline.process_report("garbage")?, ReportOutcome::Undecodable);
        Ok(())
    }

    #[test]
    fn test_run_appends_and_flushes() -> Result<()> {
        let dir = TempDir::new()?;
        let registry = registry();
        let mut incomplete = complete("KNYC");
        incomplete.temperature_c = None;
        let pipeline = IngestionPipeline::new(
            &registry,
            stub(vec![("A", complete("KNYC")), ("B", incomplete)]),
            Span::none(),
        );
        let mut store = PartitionedStore::open_at(dir.path(), observed_at(), Span::none())?;
        let source = StubSource(Ok(vec!["A".into(), "B".into(), "A".into(), "junk".into()]));
        let stations: Vec<&Station> = registry.iter().collect();

        let outcome = pipeline.run(&source, &stations, 0, &mut store, None)?;

        let summary = match outcome {
            RunOutcome::Completed(summary) => summary,
            RunOutcome::FetchFailed => panic!("fetch should succeed"),
        };
        assert_eq!(summary.fetched, 4);
        assert_eq!(summary.accepted, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.undecodable, 1);
        assert_eq!(summary.flush.duplicates_dropped, 1);
        assert_eq!(PartitionReader::read(&store.active().path)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_fetch_failure_leaves_store_untouched() -> Result<()> {
        let dir = TempDir::new()?;
        let registry = registry();
        let pipeline = IngestionPipeline::new(&registry, stub(vec![]), Span::none());
        let mut store = PartitionedStore::open_at(dir.path(), observed_at(), Span::none())?;
        let before = std::fs::read(&store.active().path)?;
        let source = StubSource(Err(IngestError::FetchFailed("503".into())));

        let outcome = pipeline.run(&source, &[], 0, &mut store, None)?;

        assert_eq!(outcome, RunOutcome::FetchFailed);
        assert!(!outcome.is_success());
        assert!(store.is_empty());
        assert_eq!(std::fs::read(&store.active().path)?, before);
        Ok(())
    }
}
