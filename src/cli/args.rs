use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "metar-store")]
#[command(about = "Decode METAR reports into day-partitioned observation files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Settings file [default: ./metar-store.toml if present]")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Root directory of the partition files")]
    pub target_dir: Option<PathBuf>,

    #[arg(long, global = true, help = "Fixed-width station registry file")]
    pub stations_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode a batch of raw reports into today's partition
    Ingest {
        #[arg(short, long, help = "Text file with one raw METAR per line")]
        reports: PathBuf,

        #[arg(
            short,
            long = "station",
            help = "Station code to keep (repeatable) [default: every registry station]"
        )]
        stations: Vec<String>,

        #[arg(long, help = "Lookback window in hours")]
        hours: Option<u32>,
    },

    /// List stations in the registry
    Stations {
        #[arg(long, help = "Only stations with this state code")]
        state: Option<String>,
    },

    /// Summarise one partition file
    Info {
        #[arg(short, long, help = "Partition date as YYYYMMDD")]
        date: String,
    },
}
