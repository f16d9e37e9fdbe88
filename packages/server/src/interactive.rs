//! Interactive mode for the server.
//!
//! Walks through the census-specific settings (credential, statistics API
//! base URL, how the dashboard reaches the data, metric subset) and the
//! listen address, exports them as the environment variables
//! [`super::run_server`] reads, then starts the server.

use census_explorer_metric_models::MetricSelection;
use census_explorer_source::census::DEFAULT_CENSUS_BASE_URL;
use dialoguer::{Confirm, Input, Password, Select};

/// Settings gathered by the prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSetup {
    pub api_key: Option<String>,
    pub census_base_url: String,
    /// Dashboard fetches go through this gateway instead of the API.
    pub gateway_url: Option<String>,
    pub selection: MetricSelection,
    pub bind_addr: String,
    pub port: u16,
}

impl ServerSetup {
    /// Environment variables to export, in the names `run_server` reads.
    /// Unset values are returned as empty strings so stale values from the
    /// shell are overridden.
    #[must_use]
    pub fn env_vars(&self) -> Vec<(&'static str, String)> {
        vec![
            ("CENSUS_API_KEY", self.api_key.clone().unwrap_or_default()),
            ("CENSUS_API_BASE_URL", self.census_base_url.clone()),
            ("CENSUS_GATEWAY_URL", self.gateway_url.clone().unwrap_or_default()),
            ("CENSUS_METRICS", self.selection.to_string()),
            ("BIND_ADDR", self.bind_addr.clone()),
            ("PORT", self.port.to_string()),
        ]
    }

    /// One line per setting for the confirmation screen. Never shows the
    /// key itself.
    #[must_use]
    pub fn summary(&self) -> Vec<String> {
        vec![
            format!(
                "Census API key: {}",
                if self.api_key.is_some() {
                    "set (/api/census enabled)"
                } else {
                    "none (/api/census answers 500, direct fetches are keyless)"
                }
            ),
            format!("Census API: {}", self.census_base_url),
            format!(
                "Dashboard data: {}",
                self.gateway_url
                    .as_deref()
                    .map_or_else(|| "direct".to_string(), |url| format!("via gateway {url}"))
            ),
            format!("Metrics: {}", self.selection),
            format!("Listen: {}:{}", self.bind_addr, self.port),
        ]
    }
}

enum KeySource {
    Environment,
    Enter,
    Keyless,
}

impl KeySource {
    const fn label(&self) -> &'static str {
        match self {
            Self::Environment => "Use CENSUS_API_KEY from the environment",
            Self::Enter => "Enter a key now",
            Self::Keyless => "Run without a key",
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn prompt_api_key() -> dialoguer::Result<Option<String>> {
    let sources: Vec<KeySource> = if env_value("CENSUS_API_KEY").is_some() {
        vec![KeySource::Environment, KeySource::Enter, KeySource::Keyless]
    } else {
        vec![KeySource::Enter, KeySource::Keyless]
    };
    let labels: Vec<&str> = sources.iter().map(KeySource::label).collect();
    let idx = Select::new()
        .with_prompt("Census API key")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(match sources[idx] {
        KeySource::Environment => env_value("CENSUS_API_KEY"),
        KeySource::Enter => Some(
            Password::new()
                .with_prompt("Key")
                .interact()?
                .trim()
                .to_string(),
        )
        .filter(|k| !k.is_empty()),
        KeySource::Keyless => None,
    })
}

fn prompt_setup() -> dialoguer::Result<ServerSetup> {
    let api_key = prompt_api_key()?;

    let census_base_url: String = Input::new()
        .with_prompt("Census API base URL")
        .default(
            env_value("CENSUS_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_CENSUS_BASE_URL.to_string()),
        )
        .validate_with(|input: &String| {
            if input.starts_with("http://") || input.starts_with("https://") {
                Ok(())
            } else {
                Err("URL must start with http:// or https://")
            }
        })
        .interact_text()?;

    let use_gateway = Select::new()
        .with_prompt("Dashboard data path")
        .items(&["Call the Census API directly", "Go through a proxy gateway"])
        .default(usize::from(env_value("CENSUS_GATEWAY_URL").is_some()))
        .interact()?
        == 1;
    let gateway_url = if use_gateway {
        let url: String = Input::new()
            .with_prompt("Gateway base URL")
            .default(
                env_value("CENSUS_GATEWAY_URL")
                    .unwrap_or_else(|| "http://127.0.0.1:8080/api".to_string()),
            )
            .interact_text()?;
        Some(url)
    } else {
        None
    };

    let selection = if Select::new()
        .with_prompt("Metrics to fetch")
        .items(&["All metrics", "Core metrics only"])
        .default(0)
        .interact()?
        == 1
    {
        MetricSelection::Core
    } else {
        MetricSelection::All
    };

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default("127.0.0.1".to_string())
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(8080)
        .interact_text()?;

    Ok(ServerSetup {
        api_key,
        census_base_url,
        gateway_url,
        selection,
        bind_addr,
        port,
    })
}

/// Runs the server in interactive mode, prompting for configuration.
///
/// # Errors
///
/// Returns an `std::io::Result` error if a prompt fails or the underlying
/// server fails to start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("Census Explorer Server");
    println!();

    let setup = prompt_setup().map_err(std::io::Error::other)?;

    println!();
    for line in setup.summary() {
        println!("  {line}");
    }

    if !Confirm::new()
        .with_prompt("Start server?")
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    // SAFETY: We are single-threaded at this point (before server starts) and
    // these variables are only read once during server initialisation.
    unsafe {
        for (name, value) in setup.env_vars() {
            std::env::set_var(name, value);
        }
    }

    super::run_server().await
}
