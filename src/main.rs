use anyhow::{Result, anyhow};
use clap::Parser;

use wildweather::alerts::NewAlert;
use wildweather::app;
use wildweather::config::AppConfig;
use wildweather::logging;
use wildweather::pipeline::{PipelineState, WeatherPipeline, WeatherView};
use wildweather::saved_locations::UNAVAILABLE;
use wildweather::Coordinate;

mod cli;

use cli::{AlertsSubCommand, Cli, Command, PrefsSubCommand, SavedSubCommand};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from_path(cli.config.clone())?;
    logging::init(&config.logging, cli.verbose)?;

    if config.weather.api_key.is_none() {
        tracing::warn!("No weather API key configured; set WILDWEATHER_WEATHER__API_KEY");
    }

    let store = app::open_store(&config)?;
    let pipeline = app::build_pipeline(&config, store).await?;

    if let Some(units) = cli.units {
        pipeline.preferences().set_unit_mode(units).await?;
    }

    run(&pipeline, cli.cmd).await
}

async fn run(pipeline: &WeatherPipeline, cmd: Command) -> Result<()> {
    match cmd {
        Command::Current => {
            let loaded = pipeline.start().await;
            show(pipeline, loaded).await
        }
        Command::At { lat, lon } => {
            let loaded = pipeline.select_point(Coordinate::new(lat, lon)?).await;
            show(pipeline, loaded).await
        }
        Command::Search { query, select } => {
            let results = pipeline.search(&query).await;
            if results.is_empty() {
                println!("No places found for '{query}'");
                return Ok(());
            }
            for (i, result) in results.iter().enumerate() {
                println!("{:>2}. {}", i + 1, result.label());
            }

            match select {
                Some(n) => {
                    let result = n
                        .checked_sub(1)
                        .and_then(|i| results.get(i))
                        .ok_or_else(|| anyhow!("No result number {n}"))?;
                    let loaded = pipeline.select_search_result(result).await;
                    show(pipeline, loaded).await
                }
                None => Ok(()),
            }
        }
        Command::Saved(saved) => run_saved(pipeline, saved.cmd).await,
        Command::Alerts(alerts) => run_alerts(pipeline, alerts.cmd).await,
        Command::Prefs(prefs) => run_prefs(pipeline, prefs.cmd).await,
    }
}

async fn run_saved(pipeline: &WeatherPipeline, cmd: SavedSubCommand) -> Result<()> {
    let saved = pipeline.saved();
    match cmd {
        SavedSubCommand::List => {
            let unit_mode = pipeline.preferences().get().await.unit_mode;
            saved.refresh_all(unit_mode).await;
            let entries = saved.with_live_temperatures().await;
            if entries.is_empty() {
                println!("No saved locations");
            }
            for (location, reading) in entries {
                let temperature = reading.map_or_else(|| UNAVAILABLE.to_string(), |r| r.to_string());
                println!("{:<40} {}", location.name, temperature);
            }
        }
        SavedSubCommand::Add { name, lat, lon } => {
            if saved.save(&name, Coordinate::new(lat, lon)?).await? {
                println!("Saved '{name}'");
            } else {
                println!("'{name}' not saved (empty or already saved)");
            }
        }
        SavedSubCommand::AddCurrent => {
            pipeline.start().await?;
            if pipeline.save_active_location().await? {
                println!("Saved current location");
            } else {
                println!("Current location is already saved");
            }
        }
        SavedSubCommand::Show { name } => {
            let loaded = pipeline.select_saved(&name).await;
            show(pipeline, loaded).await?;
        }
        SavedSubCommand::Remove { name } => {
            if saved.remove(&name).await? {
                println!("Removed '{name}'");
            }
        }
        SavedSubCommand::Clear => {
            saved.clear().await?;
            println!("Cleared saved locations");
        }
    }
    Ok(())
}

async fn run_alerts(pipeline: &WeatherPipeline, cmd: AlertsSubCommand) -> Result<()> {
    match cmd {
        AlertsSubCommand::List => {
            let unit_mode = pipeline.preferences().get().await.unit_mode;
            for rule in pipeline.alerts().list().await {
                println!(
                    "{}  {}: {} {} {}{}{}",
                    rule.id,
                    rule.activity,
                    format!("{:?}", rule.metric).to_lowercase(),
                    format!("{:?}", rule.comparison).to_lowercase(),
                    rule.threshold,
                    rule.metric.unit_label(unit_mode),
                    if rule.enabled { "" } else { " (disabled)" }
                );
            }
        }
        AlertsSubCommand::Add {
            metric,
            comparison,
            threshold,
            activity,
        } => {
            let rule = pipeline
                .add_alert(NewAlert {
                    metric,
                    threshold,
                    comparison,
                    activity,
                })
                .await?;
            println!("Added alert {}", rule.id);
        }
        AlertsSubCommand::Remove { id } => {
            if !pipeline.remove_alert(id).await? {
                println!("No alert {id}");
            }
        }
        AlertsSubCommand::Toggle { id } => match pipeline.toggle_alert(id).await? {
            Some(enabled) => println!("Alert {id} {}", if enabled { "enabled" } else { "disabled" }),
            None => println!("No alert {id}"),
        },
    }
    Ok(())
}

async fn run_prefs(pipeline: &WeatherPipeline, cmd: PrefsSubCommand) -> Result<()> {
    match cmd {
        PrefsSubCommand::Show => {
            let prefs = pipeline.preferences().get().await;
            println!("units: {}\ntheme: {:?}", prefs.unit_mode, prefs.theme);
        }
        PrefsSubCommand::Units { mode } => {
            pipeline.set_unit_mode(mode).await?;
            println!("units: {mode}");
        }
        PrefsSubCommand::Theme { theme } => {
            pipeline.set_theme(theme).await?;
            println!("theme: {theme:?}");
        }
    }
    Ok(())
}

async fn show(pipeline: &WeatherPipeline, loaded: wildweather::Result<()>) -> Result<()> {
    match pipeline.state().await {
        PipelineState::Ready(view) => {
            print_view(&view);
            Ok(())
        }
        PipelineState::Failed { message, .. } => {
            if let Err(e) = loaded {
                tracing::debug!("Fetch error: {}", e);
            }
            Err(anyhow!(message))
        }
        PipelineState::Idle | PipelineState::Loading { .. } => {
            loaded?;
            Ok(())
        }
    }
}

fn print_view(view: &WeatherView) {
    let current = &view.report.current;
    let mode = view.report.unit_mode;

    println!("{}", view.headline);
    println!(
        "  {}  {} (feels like {})",
        current.condition.description,
        mode.format_temperature(current.temperature),
        mode.format_temperature(current.feels_like)
    );
    println!(
        "  wind {}  visibility {}  humidity {}{}  pressure {} {}  clouds {}{}",
        mode.format_wind_speed(current.wind_speed),
        mode.format_visibility(current.visibility_meters),
        current.humidity_pct,
        view.labels.percentage,
        current.pressure_hpa,
        view.labels.pressure,
        current.clouds_pct,
        view.labels.percentage
    );
    println!(
        "  sunrise {}  sunset {}",
        current.sunrise.with_timezone(&chrono::Local).format("%H:%M"),
        current.sunset.with_timezone(&chrono::Local).format("%H:%M")
    );
    println!("  {}", view.suggestion);

    if !view.hourly.is_empty() {
        println!();
        for sample in &view.hourly {
            println!(
                "  {}  {:>6}  {}",
                sample.dt.with_timezone(&chrono::Local).format("%a %H:%M"),
                mode.format_temperature(sample.temperature),
                sample.condition.description
            );
        }
    }

    println!();
    for day in &view.daily {
        println!(
            "  {} {:<7} {:>6}  {}",
            day.day_label,
            day.date_label,
            day.display_temperature(mode),
            day.representative.description
        );
    }

    if !view.triggered_alerts.is_empty() {
        println!();
        println!("  Alerts triggered: {:?}", view.triggered_alerts);
    }
}
