use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

use plant_triage_core::config::{Settings, default_data_dir};
use plant_triage_core::preferences::{AppTheme, REMINDER_INTERVALS};

use crate::errors::PathError;
use crate::helpers::fs::ensure_dir;

#[derive(Parser, Debug)]
#[command(author, version, about = "Quantitative plant health triage", long_about = None)]
pub struct Cli {
    /// Verbose mode (-v, -vv, -vvv, etc.)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Directory holding the diary and preferences
    #[arg(short, long, value_hint = ValueHint::DirPath, global = true)]
    data_dir: Option<PathBuf>,
    /// Path to the settings file
    #[arg(short, long, value_hint = ValueHint::FilePath, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn data_dir(&self) -> Result<PathBuf, PathError> {
        let path = match &self.data_dir {
            Some(p) => p.to_owned(),
            None => default_data_dir().map_err(|_| PathError::DataDir)?,
        };
        ensure_dir(&path)
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        Ok(Settings::load(self.config.as_deref())?)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Diagnose a plant from a photo file, a public image URL or the camera
    Diagnose(DiagnoseOptions),
    /// Browse past diagnoses
    Diary {
        #[command(subcommand)]
        command: DiaryCommands,
    },
    /// Show or change preferences
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct DiagnoseOptions {
    /// Image file of the plant
    #[arg(value_hint = ValueHint::FilePath)]
    pub image: Option<PathBuf>,
    /// Public URL of an image of the plant
    #[arg(long, value_hint = ValueHint::Url)]
    pub url: Option<String>,
    /// Take the photo with an attached camera, the first one unless an
    /// index is given
    #[arg(long, value_name = "INDEX", num_args = 0..=1, default_missing_value = "0")]
    pub camera: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum DiaryCommands {
    /// List all entries, newest first
    List,
    /// Show a single entry
    Show {
        id: String,
        /// Write the entry's photo to this file
        #[arg(long, value_hint = ValueHint::FilePath)]
        save_image: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Print the current preferences
    Show,
    /// Print or change the theme
    Theme {
        /// One of day, night, girly, boyish
        theme: Option<AppTheme>,
    },
    /// Manage the stored Gemini API key
    ApiKey {
        #[command(subcommand)]
        command: ApiKeyCommands,
    },
    /// Configure check-up reminders
    Reminders(ReminderOptions),
}

#[derive(Subcommand, Debug)]
pub enum ApiKeyCommands {
    /// Store a key, used when no environment variable is set
    Set { key: String },
    /// Remove the stored key
    Clear,
    /// Print where the key is taken from
    Status,
}

#[derive(Args, Debug)]
pub struct ReminderOptions {
    #[arg(long, conflicts_with = "disable")]
    pub enable: bool,
    #[arg(long)]
    pub disable: bool,
    /// Hours between check-ups
    #[arg(long, value_parser = parse_interval)]
    pub interval: Option<u32>,
}

fn parse_interval(value: &str) -> Result<u32, String> {
    let hours: u32 = value.parse().map_err(|e| format!("{e}"))?;
    if REMINDER_INTERVALS.contains(&hours) {
        Ok(hours)
    } else {
        Err(format!("interval must be one of {REMINDER_INTERVALS:?} hours"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_diagnose_requires_one_source() {
        assert!(Cli::try_parse_from(["plant-triage", "diagnose"]).is_err());
        assert!(
            Cli::try_parse_from(["plant-triage", "diagnose", "leaf.jpg", "--url", "http://x"])
                .is_err()
        );
        assert!(Cli::try_parse_from(["plant-triage", "diagnose", "leaf.jpg"]).is_ok());
    }

    #[test]
    fn test_camera_source() {
        let cli = Cli::try_parse_from(["plant-triage", "diagnose", "--camera"]).unwrap();
        match cli.command {
            Commands::Diagnose(options) => {
                assert_eq!(options.camera, Some(0));
                assert!(options.image.is_none() && options.url.is_none());
            }
            _ => panic!("unexpected command"),
        }

        let cli = Cli::try_parse_from(["plant-triage", "diagnose", "--camera", "2"]).unwrap();
        match cli.command {
            Commands::Diagnose(options) => assert_eq!(options.camera, Some(2)),
            _ => panic!("unexpected command"),
        }

        assert!(
            Cli::try_parse_from(["plant-triage", "diagnose", "leaf.jpg", "--camera"]).is_err()
        );
        assert!(
            Cli::try_parse_from(["plant-triage", "diagnose", "--camera", "--url", "http://x"])
                .is_err()
        );
    }

    #[test]
    fn test_theme_argument() {
        let cli = Cli::try_parse_from(["plant-triage", "settings", "theme", "night"]).unwrap();
        match cli.command {
            Commands::Settings {
                command: SettingsCommands::Theme { theme },
            } => assert_eq!(theme, Some(AppTheme::Night)),
            _ => panic!("unexpected command"),
        }
    }

    #[test]
    fn test_interval_must_be_offered() {
        assert_eq!(parse_interval("48"), Ok(48));
        assert!(parse_interval("36").is_err());
        assert!(parse_interval("soon").is_err());
    }
}
