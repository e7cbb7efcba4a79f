use chrono::Local;
use comfy_table::Cell;
use strum::IntoEnumIterator;

use plant_triage_core::credentials::CredentialSource;
use plant_triage_core::diagnosis::InferenceTransport;
use plant_triage_core::{AppTheme, NotificationPreference, Settings, TriageController};

use super::diagnose::table;
use crate::arguments::{ApiKeyCommands, ReminderOptions};

fn describe_source(source: Option<CredentialSource>) -> String {
    match source {
        Some(CredentialSource::Environment(name)) => format!("environment (${name})"),
        Some(CredentialSource::Stored) => "stored override".to_string(),
        None => "not configured".to_string(),
    }
}

fn describe_reminders<T: InferenceTransport>(controller: &TriageController<T>) -> String {
    let preference = controller.notifications();
    if !preference.enabled {
        return format!("off (every {}h when enabled)", preference.interval_hours);
    }
    match controller.next_reminder(Local::now()) {
        Some(due) => format!(
            "every {}h, next check-up {}",
            preference.interval_hours,
            due.format("%-m/%-d/%Y %H:%M")
        ),
        None => format!("every {}h", preference.interval_hours),
    }
}

pub(crate) fn show<T: InferenceTransport>(controller: &TriageController<T>, settings: &Settings) {
    let mut summary = table(&["Setting", "Value"]);
    summary.add_row(vec![Cell::new("Theme"), Cell::new(controller.theme())]);
    summary.add_row(vec![
        Cell::new("API key"),
        Cell::new(describe_source(controller.api_key_source())),
    ]);
    summary.add_row(vec![Cell::new("Reminders"), Cell::new(describe_reminders(controller))]);
    summary.add_row(vec![Cell::new("Model"), Cell::new(&settings.model)]);
    summary.add_row(vec![Cell::new("Endpoint"), Cell::new(&settings.endpoint)]);
    summary.add_row(vec![
        Cell::new("Request timeout"),
        Cell::new(format!("{}s", settings.request_timeout().as_secs())),
    ]);
    summary.add_row(vec![
        Cell::new("Diary entries"),
        Cell::new(controller.diary().len()),
    ]);
    println!("{summary}");
}

pub(crate) fn theme<T: InferenceTransport>(
    controller: &mut TriageController<T>,
    theme: Option<AppTheme>,
) -> anyhow::Result<()> {
    match theme {
        Some(theme) => {
            controller.set_theme(theme)?;
            println!("Theme set to {theme}");
        }
        None => {
            let current = controller.theme();
            for theme in AppTheme::iter() {
                let marker = if theme == current { "*" } else { " " };
                println!("{marker} {theme}");
            }
        }
    }
    Ok(())
}

pub(crate) fn api_key<T: InferenceTransport>(
    controller: &mut TriageController<T>,
    command: &ApiKeyCommands,
) -> anyhow::Result<()> {
    match command {
        ApiKeyCommands::Set { key } => {
            controller.set_api_key(key)?;
            println!("API key stored");
        }
        ApiKeyCommands::Clear => {
            controller.clear_api_key()?;
            println!("Stored API key removed");
        }
        ApiKeyCommands::Status => {}
    }
    println!("API key: {}", describe_source(controller.api_key_source()));
    Ok(())
}

pub(crate) fn reminders<T: InferenceTransport>(
    controller: &mut TriageController<T>,
    options: &ReminderOptions,
) -> anyhow::Result<()> {
    let current = controller.notifications();
    let enabled = match (options.enable, options.disable) {
        (true, _) => true,
        (_, true) => false,
        _ => current.enabled,
    };
    let interval = options.interval.unwrap_or(current.interval_hours);

    if enabled != current.enabled || interval != current.interval_hours {
        let preference = NotificationPreference::new(enabled, interval)
            .ok_or_else(|| anyhow::anyhow!("Unsupported reminder interval {interval}h"))?;
        controller.set_notifications(preference)?;
    }

    println!("Reminders: {}", describe_reminders(controller));
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_describe_source() {
        assert_eq!(describe_source(None), "not configured");
        assert_eq!(
            describe_source(Some(CredentialSource::Environment("GEMINI_API_KEY"))),
            "environment ($GEMINI_API_KEY)"
        );
        assert_eq!(describe_source(Some(CredentialSource::Stored)), "stored override");
    }
}
