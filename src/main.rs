use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressState, ProgressStyle};
use std::time::Duration;
use tracing::Level;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod arguments;
mod commands;
mod errors;
mod helpers;

use arguments::{Cli, Commands, DiaryCommands, SettingsCommands};
use plant_triage_core::TriageController;

fn setup_logging(verbose: u8) -> Result<()> {
    let log_level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let indicatif_layer = IndicatifLayer::new()
        .with_progress_style(
            ProgressStyle::with_template(
                "{color_start}{span_child_prefix}{span_fields} -- {span_name} {wide_msg} {elapsed_subsec}{color_end}",
            )?
            .with_key("elapsed_subsec", helpers::progress::elapsed_subsec)
            .with_key(
                "color_start",
                |state: &ProgressState, writer: &mut dyn std::fmt::Write| {
                    let elapsed = state.elapsed();

                    // Gemini usually answers within 10s
                    if elapsed > Duration::from_secs(30) {
                        let _ = write!(writer, "\x1b[{}m", 1 + 30);
                    } else if elapsed > Duration::from_secs(10) {
                        let _ = write!(writer, "\x1b[{}m", 3 + 30);
                    }
                },
            )
            .with_key(
                "color_end",
                |state: &ProgressState, writer: &mut dyn std::fmt::Write| {
                    if state.elapsed() > Duration::from_secs(10) {
                        let _ = write!(writer, "\x1b[0m");
                    }
                },
            ),
        )
        .with_span_child_prefix_symbol("↳ ")
        .with_span_child_prefix_indent(" ");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(indicatif_layer.get_stderr_writer())
                .with_filter(Targets::default().with_default(Level::TRACE)),
        )
        .with(indicatif_layer)
        .with(
            Targets::default()
                .with_target("plant_triage", log_level)
                .with_target("plant_triage_core", log_level)
                .with_target("reqwest", LevelFilter::OFF)
                .with_target("hyper", LevelFilter::OFF)
                .with_target("sled", LevelFilter::OFF),
        )
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(args.verbose)?;

    let settings = args.settings()?;
    let data_dir = args.data_dir()?;
    tracing::debug!(data_dir = %data_dir.display(), model = %settings.model, "Starting");

    let mut controller = TriageController::open(&settings, &data_dir)?;

    match &args.command {
        Commands::Diagnose(options) => {
            commands::diagnose::diagnose(&mut controller, options).await?
        }
        Commands::Diary { command } => match command {
            DiaryCommands::List => commands::diary::list(controller.diary())?,
            DiaryCommands::Show { id, save_image } => {
                commands::diary::show(controller.diary(), id, save_image.as_deref())?
            }
        },
        Commands::Settings { command } => match command {
            SettingsCommands::Show => commands::settings::show(&controller, &settings),
            SettingsCommands::Theme { theme } => {
                commands::settings::theme(&mut controller, *theme)?
            }
            SettingsCommands::ApiKey { command } => {
                commands::settings::api_key(&mut controller, command)?
            }
            SettingsCommands::Reminders(options) => {
                commands::settings::reminders(&mut controller, options)?
            }
        },
    }

    Ok(())
}
