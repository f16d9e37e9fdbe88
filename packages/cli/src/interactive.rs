//! Menu-driven mode used when no subcommand is given.

use census_explorer_cli_utils::MultiProgress;
use census_explorer_geography_models::ZipCode;
use census_explorer_metric_models::Period;
use dialoguer::{Confirm, Input, Select};

use crate::lookup::{self, LookupOptions};

/// Top-level tool selection.
enum Tool {
    Lookup,
    Metrics,
    Periods,
    Server,
}

impl Tool {
    const ALL: &[Self] = &[Self::Lookup, Self::Metrics, Self::Periods, Self::Server];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Lookup => "Look up a ZIP code",
            Self::Metrics => "List metrics",
            Self::Periods => "List survey years",
            Self::Server => "Start server",
        }
    }
}

/// Shows the tool menu and runs the selection.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected tool fails.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Census Explorer");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Lookup => {
            let options = prompt_lookup()?;
            lookup::run(multi, &options).await?;
        }
        Tool::Metrics => super::print_metrics(),
        Tool::Periods => super::print_periods(),
        Tool::Server => {
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new()
                    .block_on(census_explorer_server::interactive::run())
            })
            .await??;
        }
    }

    Ok(())
}

fn prompt_lookup() -> Result<LookupOptions, dialoguer::Error> {
    let zip: String = Input::new()
        .with_prompt("ZIP code")
        .validate_with(|input: &String| {
            ZipCode::parse(input)
                .map(|_| ())
                .map_err(|_| "Please enter a valid 5-digit ZIP code")
        })
        .interact_text()?;

    let periods = Period::available();
    let labels: Vec<String> = periods.iter().map(|p| p.label()).collect();
    let primary = Select::new()
        .with_prompt("Survey year")
        .items(&labels)
        .default(0)
        .interact()?;

    let mut compare_labels = vec!["No comparison".to_string()];
    compare_labels.extend(labels);
    let compare = Select::new()
        .with_prompt("Compare with")
        .items(&compare_labels)
        .default(0)
        .interact()?;

    let core = Confirm::new()
        .with_prompt("Only fetch core metrics?")
        .default(false)
        .interact()?;

    Ok(LookupOptions {
        zip,
        year: Some(periods[primary].year().to_string()),
        compare: compare
            .checked_sub(1)
            .map(|i| periods[i].year().to_string()),
        core,
        json: false,
    })
}
