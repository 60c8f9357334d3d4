pub mod observation;
pub mod partition;
pub mod station;

pub use observation::ObservationRecord;
pub use partition::PartitionKey;
pub use station::{Station, StationRegistry};
