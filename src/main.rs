mod cli;
mod data;
mod error;
mod render;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, OutputFormat};
use data::aggregate::{aggregate, AggregateOutcome};
use data::filter::{filter_rows, parse_condition};
use data::loader::{load_file, LoadOptions};
use data::model::Dataset;
use error::CsvToolError;

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let result = run(&cli);
    match &result {
        Ok(output) => println!("{output}"),
        Err(e) => {
            println!("{}", report(e));
            log::debug!("{e:?}");
        }
    }
    ExitCode::from(exit_status(&result))
}

/// Load, filter, then either aggregate or render the remaining rows.
/// Returns the text to print on success.
fn run(cli: &Cli) -> Result<String> {
    let options = LoadOptions {
        delimiter: cli.delimiter,
    };
    let dataset = load_file(&cli.file, &options)?;
    log::info!("Loaded {} rows from {}", dataset.len(), cli.file.display());

    // An empty flag value behaves like an absent one.
    let condition = cli
        .condition
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(parse_condition)
        .transpose()?;
    let dataset = filter_rows(dataset, condition.as_ref())?;

    let expression = cli.aggregate.as_deref().filter(|a| !a.is_empty());
    let outcome = aggregate(&dataset, expression)?;
    render_output(&dataset, outcome, cli.format)
}

/// The no-data status is a plain line whatever the output format.
fn render_output(
    dataset: &Dataset,
    outcome: Option<AggregateOutcome>,
    format: OutputFormat,
) -> Result<String> {
    match outcome {
        Some(AggregateOutcome::Value(aggregation)) => {
            render::render_aggregation(&aggregation, format)
        }
        Some(AggregateOutcome::NoData(status)) => Ok(status.to_string()),
        None => render::render_rows(dataset, format),
    }
}

/// The single line printed for a failed run.
fn report(e: &anyhow::Error) -> String {
    match e.downcast_ref::<CsvToolError>() {
        Some(not_found @ CsvToolError::FileNotFound(_)) => not_found.to_string(),
        _ => format!("Error: {e:#}"),
    }
}

fn exit_status(result: &Result<String>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
