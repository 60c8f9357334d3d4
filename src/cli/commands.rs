use crate::cli::args::{Cli, Commands};
use crate::config::Settings;
use crate::decoder::TokenDecoder;
use crate::error::Result;
use crate::models::{PartitionKey, Station, StationRegistry};
use crate::processors::{IngestionPipeline, RunOutcome};
use crate::readers::{FileReportSource, StationReader};
use crate::store::{PartitionSummary, PartitionedStore};
use crate::utils::logging::init_logging;
use crate::utils::progress::ProgressReporter;
use std::process::ExitCode;
use tracing::info_span;

pub fn run(cli: Cli) -> Result<ExitCode> {
    let hours = match &cli.command {
        Commands::Ingest { hours, .. } => *hours,
        _ => None,
    };
    let settings = Settings::load(cli.config.as_deref())?.with_overrides(
        cli.target_dir,
        cli.stations_file,
        hours,
    )?;
    init_logging(&settings.log_level, cli.verbose)?;

    match cli.command {
        Commands::Ingest {
            reports, stations, ..
        } => {
            let registry = load_registry(&settings)?;
            let requested = select_stations(&registry, &stations)?;

            let mut store = PartitionedStore::open(
                &settings.target_dir,
                info_span!("store", dir = %settings.target_dir.display()),
            )?;
            let pipeline =
                IngestionPipeline::new(&registry, TokenDecoder::new(), info_span!("ingest"));
            let source = FileReportSource::new(&reports);

            let progress = ProgressReporter::new_spinner("Decoding reports", false);
            let outcome = pipeline.run(
                &source,
                &requested,
                settings.hours,
                &mut store,
                Some(&progress),
            )?;

            match outcome {
                RunOutcome::FetchFailed => {
                    progress.finish_with_message("Fetch failed");
                    println!("No reports read from {}", reports.display());
                    Ok(ExitCode::FAILURE)
                }
                RunOutcome::Completed(summary) => {
                    progress.finish_with_message(&format!(
                        "Decoded {} of {} reports",
                        summary.accepted, summary.fetched
                    ));
                    println!(
                        "Accepted {}, rejected {}, undecodable {}, duplicates dropped {}",
                        summary.accepted,
                        summary.rejected,
                        summary.undecodable,
                        summary.flush.duplicates_dropped
                    );
                    for (key, rows) in &summary.flush.written {
                        println!(
                            "  {} -> {} rows",
                            key.path_under(&settings.target_dir).display(),
                            rows
                        );
                    }
                    Ok(ExitCode::SUCCESS)
                }
            }
        }

        Commands::Stations { state } => {
            let registry = load_registry(&settings)?;
            let stations = registry.sorted(state.as_deref());

            for station in &stations {
                println!(
                    "{}  {:<2}  {:<16}  {:>8.4}  {:>9.4}  {:>5}",
                    station.code4,
                    station.state_code,
                    station.name,
                    station.latitude,
                    station.longitude,
                    station.elevation
                );
            }
            println!("{} stations", stations.len());
            Ok(ExitCode::SUCCESS)
        }

        Commands::Info { date } => {
            let key = PartitionKey::parse(&date)?;
            let summary = PartitionSummary::inspect(&settings.target_dir, key)?;

            println!("{}", summary.summary());
            if summary.is_consistent() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn load_registry(settings: &Settings) -> Result<StationRegistry> {
    StationReader::with_span(info_span!("registry")).load(&settings.stations_file)
}

fn select_stations<'a>(registry: &'a StationRegistry, codes: &[String]) -> Result<Vec<&'a Station>> {
    if codes.is_empty() {
        return Ok(registry.sorted(None));
    }
    codes
        .iter()
        .map(|code| registry.lookup(&code.to_uppercase()))
        .collect()
}
