pub mod ingestion;

pub use ingestion::{IngestionPipeline, ReportOutcome, RunOutcome, RunSummary};
