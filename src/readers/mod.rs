pub mod partition_reader;
pub mod report_source;
pub mod station_reader;

pub use partition_reader::PartitionReader;
pub use report_source::{FileReportSource, ReportSource};
pub use station_reader::{classify, LineClass, StationReader};
