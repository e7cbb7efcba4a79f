use anyhow::Context;
use comfy_table::*;
use console::{Emoji, style};

use plant_triage_core::camera::NativeCamera;
use plant_triage_core::diagnosis::{DiagnosisResult, HealthBand, InferenceTransport};
use plant_triage_core::errors::Recovery;
use plant_triage_core::{CancelToken, ResultView, TriageController, TriageOutcome};

use crate::arguments::DiagnoseOptions;
use crate::helpers::progress::create_spinner;

static BOOK: Emoji<'_, '_> = Emoji("📖  ", "");
static MICROSCOPE: Emoji<'_, '_> = Emoji("🔬  ", "");
static SEEDLING: Emoji<'_, '_> = Emoji("🌱  ", "");
static NO_ENTRY: Emoji<'_, '_> = Emoji("🚫  ", "");

pub(crate) fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset("││──╞═╪╡┆    ┬┴┌┐└┘")
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            header
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

pub(crate) fn score_cell(score: u8, band: HealthBand) -> Cell {
    let color = match band {
        HealthBand::Thriving => Color::Green,
        HealthBand::Stressed => Color::Yellow,
        HealthBand::Critical => Color::Red,
    };
    Cell::new(format!("{score}%")).fg(color)
}

fn print_diagnosis(diagnosis: &DiagnosisResult) {
    println!();
    println!(
        "{} {}",
        style(diagnosis.common_name.to_uppercase()).bold(),
        style(&diagnosis.scientific_name).italic().dim()
    );

    let mut summary = table(&["Health Index", "Band", "Diagnosis"]);
    summary.add_row(vec![
        score_cell(diagnosis.health_score, diagnosis.health_band()),
        Cell::new(format!("{:?}", diagnosis.health_band())),
        Cell::new(&diagnosis.diagnosis),
    ]);
    println!("{summary}");

    if !diagnosis.symptoms.is_empty() {
        println!("{}", style("Symptoms").bold());
        for symptom in &diagnosis.symptoms {
            println!("  • {symptom}");
        }
    }

    println!("{}", style("Quantitative analysis").bold());
    println!("  {}", diagnosis.mathematical_analysis);

    let mut metrics = table(&["Metric", "Value", "Max", "Normalized"]);
    for metric in &diagnosis.math_metrics {
        metrics.add_row(vec![
            Cell::new(&metric.label),
            Cell::new(format!("{} {}", metric.value, metric.unit)),
            Cell::new(metric.max),
            Cell::new(format!("{:.0}%", metric.normalized())),
        ]);
    }
    println!("{metrics}");

    if !diagnosis.care_instructions.is_empty() {
        let mut care = table(&["Action", "Frequency", "Details"]);
        for step in &diagnosis.care_instructions {
            care.add_row(vec![
                Cell::new(&step.action),
                Cell::new(&step.frequency),
                Cell::new(&step.description),
            ]);
        }
        println!("{care}");
    }

    let mut projection = table(&["Day", "Health", "Size"]);
    for point in &diagnosis.growth_projection {
        projection.add_row(vec![
            Cell::new(point.day),
            Cell::new(format!("{:.0}", point.health)),
            Cell::new(format!("{:.1}", point.size)),
        ]);
    }
    println!("{projection}");
}

fn print_rejection() {
    println!();
    println!("{}", style("NOT A PLANT").red().bold());
    println!(
        "The input specimen does not correlate with known botanical phenotypes. \
         It appears you have provided an image of something other than a plant."
    );
}

fn recovery_hint(recovery: Recovery) -> &'static str {
    match recovery {
        Recovery::OpenSettings => {
            "Set GEMINI_API_KEY or run `plant-triage settings api-key set <KEY>`."
        }
        Recovery::Retry => "Try again in a moment.",
        Recovery::RetryOrChooseSource => "Try again or choose another image.",
        Recovery::RetryOrUpload => "Try again or upload an image file instead.",
    }
}

pub(crate) async fn diagnose<T: InferenceTransport>(
    controller: &mut TriageController<T>,
    options: &DiagnoseOptions,
) -> anyhow::Result<()> {
    println!(
        "{} {}Reading plant diary...",
        style("[1/3]").bold().dim(),
        BOOK
    );
    match controller.diary().latest() {
        Some(entry) => tracing::info!(date = %entry.date, "Comparing against previous check-up"),
        None => tracing::info!("No previous check-up, running a baseline analysis"),
    }

    println!(
        "{} {}Analysing specimen...",
        style("[2/3]").bold().dim(),
        MICROSCOPE
    );
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    let pb = create_spinner("Running quantitative triage")?;
    let result = match (&options.image, &options.url, options.camera) {
        (Some(path), _, _) => controller.triage_file(path, &cancel).await,
        (None, Some(url), _) => controller.triage_url(url, &cancel).await,
        (None, None, Some(index)) => {
            let mut camera = NativeCamera::new(index);
            controller.triage_camera(&mut camera, &cancel).await
        }
        (None, None, None) => anyhow::bail!("No image source given"),
    };
    pb.finish_and_clear();

    let outcome: TriageOutcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!(
                "{} {}",
                style("Hint:").yellow().bold(),
                recovery_hint(e.recovery())
            );
            let message = e.user_message();
            return Err(e).context(message);
        }
    };

    match outcome.view {
        ResultView::Diagnosis => {
            println!(
                "{} {}Recording diary entry...",
                style("[3/3]").bold().dim(),
                SEEDLING
            );
            if let Some(entry) = &outcome.entry {
                tracing::info!(id = %entry.id, "Diary entry recorded");
            }
            print_diagnosis(&outcome.diagnosis);
        }
        ResultView::Rejection => {
            println!(
                "{} {}Nothing to record",
                style("[3/3]").bold().dim(),
                NO_ENTRY
            );
            print_rejection();
        }
    }

    Ok(())
}
