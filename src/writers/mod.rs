pub mod partition_writer;

pub use partition_writer::PartitionWriter;
