#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the census explorer.
//!
//! `census_explorer lookup 10001 --compare 2019` loads one ZIP code and
//! prints the dashboard as a table. Without a subcommand an interactive
//! menu is shown.
//!
//! Uses `indicatif-log-bridge` (via [`census_explorer_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod interactive;
mod lookup;
mod render;

use census_explorer_metric::default_catalog;
use census_explorer_metric_models::Period;
use clap::{Parser, Subcommand};

use crate::lookup::LookupOptions;

#[derive(Parser)]
#[command(name = "census_explorer", about = "ZIP code census dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the dashboard for one ZIP code
    Lookup {
        /// Five-digit ZIP code
        zip: String,

        /// Primary survey year (defaults to the latest)
        #[arg(long)]
        year: Option<String>,

        /// Comparison survey year
        #[arg(long)]
        compare: Option<String>,

        /// Only fetch core metrics
        #[arg(long)]
        core: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List the metric catalog by section
    Metrics,
    /// List the selectable survey years
    Periods,
    /// Start the API server
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = census_explorer_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Lookup {
            zip,
            year,
            compare,
            core,
            json,
        }) => {
            let options = LookupOptions {
                zip,
                year,
                compare,
                core,
                json,
            };
            lookup::run(&multi, &options).await?;
        }
        Some(Commands::Metrics) => print_metrics(),
        Some(Commands::Periods) => print_periods(),
        Some(Commands::Serve) => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(census_explorer_server::run_server())
            })
            .await??;
        }
        None => interactive::run(&multi).await?,
    }

    Ok(())
}

fn print_metrics() {
    for (category, metrics) in default_catalog().sections() {
        println!("{}", category.label());
        for metric in metrics {
            let core = if metric.core { " (core)" } else { "" };
            println!("  {:<12} {}{core}", metric.code, metric.label);
        }
    }
}

fn print_periods() {
    for period in Period::available() {
        let default = if period == Period::LATEST {
            " (default)"
        } else {
            ""
        };
        println!("{}{default}", period.label());
    }
}
