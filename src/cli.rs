use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[clap(name = "csv-tool")]
#[clap(about = "Simple CSV filter and aggregator", long_about = None)]
pub struct Cli {
    /// Path to the CSV file (.json and .parquet are also accepted)
    #[clap(long, value_name = "PATH", value_parser)]
    pub file: PathBuf,

    /// Filter condition, e.g. "price>500"
    #[clap(long = "where", value_name = "CONDITION", value_parser)]
    pub condition: Option<String>,

    /// Aggregation, e.g. "price=avg"
    #[clap(long, value_name = "COLUMN=OP", value_parser)]
    pub aggregate: Option<String>,

    /// CSV field delimiter (single ASCII character)
    #[clap(long, default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// Output format
    #[clap(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(format!("delimiter must be a single ASCII character, got '{s}'")),
    }
}
