use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use dashboard_core::{
    Config, Coordinates, Dashboard, SearchOutcome, UnitSystem, render_dashboard,
};
use inquire::{Confirm, CustomType, InquireError, Password, PasswordDisplayMode, Select, Text};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dashboard", version, about = "Weather dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key, default units and home location.
    Configure,

    /// Show current weather and the 5-day forecast for a city.
    Show {
        /// City name, e.g. "London" or "Paris,FR".
        city: String,

        /// Unit system: metric or imperial. Defaults to the configured one.
        #[arg(long)]
        units: Option<UnitSystem>,
    },

    /// Show weather for the configured home location, or for explicit coordinates.
    Here {
        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,

        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,

        #[arg(long)]
        units: Option<UnitSystem>,
    },

    /// Interactive dashboard session.
    Session {
        #[arg(long)]
        units: Option<UnitSystem>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;
        tracing::debug!(base_url = %config.base_url, units = %config.units, "configuration loaded");

        match self.command {
            Command::Configure => configure(config),
            Command::Show { city, units } => {
                if let Some(units) = units {
                    config.units = units;
                }
                let dash = Dashboard::from_config(&config)?;
                let outcome = dash.search_by_name(&city).await;
                print_once(&dash, outcome)
            }
            Command::Here { lat, lon, units } => {
                if let (Some(latitude), Some(longitude)) = (lat, lon) {
                    config.location = Some(Coordinates { latitude, longitude });
                }
                if let Some(units) = units {
                    config.units = units;
                }
                let dash = Dashboard::from_config(&config)?;
                match dash.search_by_location().await {
                    SearchOutcome::Skipped => Err(anyhow!(
                        "No location available.\n\
                         Hint: pass --lat/--lon or run `weather-dashboard configure`."
                    )),
                    outcome => print_once(&dash, outcome),
                }
            }
            Command::Session { units } => {
                if let Some(units) = units {
                    config.units = units;
                }
                session(Dashboard::from_config(&config)?).await
            }
        }
    }
}

fn print_once(dash: &Dashboard, outcome: SearchOutcome) -> anyhow::Result<()> {
    let view = dash.snapshot();
    match outcome {
        SearchOutcome::Failed => Err(anyhow!(view.error().unwrap_or("Search failed.").to_string())),
        _ => {
            println!("{}", render_dashboard(&view));
            Ok(())
        }
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let keep_key = config.is_configured()
        && Confirm::new("Keep the existing API key?").with_default(true).prompt()?;
    if !keep_key {
        let api_key = Password::new("OpenWeather API key:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()?;
        config.set_api_key(api_key.trim().to_string());
    }

    config.units = Select::new("Default units:", vec![UnitSystem::Metric, UnitSystem::Imperial])
        .prompt()?;

    let set_home = Confirm::new("Set a home location for \"use my location\"?")
        .with_default(config.location.is_some())
        .prompt()?;
    config.location = if set_home {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please type a number, e.g. 51.5")
            .prompt()?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please type a number, e.g. -0.12")
            .prompt()?;
        Some(Coordinates { latitude, longitude })
    } else {
        None
    };

    config.save()?;
    let path = Config::config_file_path()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

const SESSION_HELP: &str = "Type a city, or :loc (my location), :units, :theme, :quit";

async fn session(dash: Dashboard) -> anyhow::Result<()> {
    println!("{SESSION_HELP}");

    loop {
        let view = dash.snapshot();
        let prompt = format!("[{} | {}] City:", view.units(), view.theme());

        let input = match Text::new(&prompt).prompt() {
            Ok(input) => input,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e).context("Failed to read input"),
        };

        match input.trim() {
            ":quit" | ":q" => break,
            ":help" | ":h" => {
                println!("{SESSION_HELP}");
                continue;
            }
            ":theme" => {
                let theme = dash.toggle_theme();
                println!("Switched to {theme} theme.");
                continue;
            }
            ":units" => {
                dash.toggle_unit_system().await;
            }
            ":loc" => {
                if dash.search_by_location().await == SearchOutcome::Skipped {
                    println!("No location configured. Run `weather-dashboard configure` first.");
                    continue;
                }
            }
            city => {
                dash.search_by_name(city).await;
            }
        }

        let rendered = render_dashboard(&dash.snapshot());
        if !rendered.is_empty() {
            println!("{rendered}");
        }
    }

    Ok(())
}
